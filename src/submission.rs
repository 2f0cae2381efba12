//! Score submission and leaderboard query boundary
//!
//! The HTTP endpoint lives outside the core. These are the wire types (camelCase
//! JSON) and the traits an implementation has to provide. A failed submission
//! is never fatal: the sequencer treats it as "no ranking data".

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::progress::catalog::CosmeticId;

/// Default number of rows returned by a leaderboard query
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Body posted when a run beats the local best
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub identity: String,
    pub cohort: String,
    pub run_score: u64,
    pub cosmetic_id: CosmeticId,
}

/// Ranking flags returned by the endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmissionResponse {
    pub is_overall_best: bool,
    pub is_overall_top5: bool,
    pub is_section_top5: bool,
}

impl SubmissionResponse {
    /// Decode an HTTP reply; non-2xx statuses are errors
    pub fn from_http(status: u16, body: &str) -> Result<Self, SubmitError> {
        if !(200..300).contains(&status) {
            return Err(SubmitError::Status(status));
        }
        Ok(serde_json::from_str(body)?)
    }
}

/// Something that accepts score submissions
pub trait ScoreSubmitter {
    fn submit(&mut self, request: &SubmissionRequest) -> Result<SubmissionResponse, SubmitError>;
}

/// Leaderboard filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardQuery {
    pub cohort: Option<String>,
    pub limit: usize,
}

impl Default for LeaderboardQuery {
    fn default() -> Self {
        Self {
            cohort: None,
            limit: DEFAULT_LEADERBOARD_LIMIT,
        }
    }
}

/// One leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u64,
    pub cohort: String,
    pub cosmetic_id: CosmeticId,
}

/// Something that answers leaderboard queries (ordered best first)
pub trait LeaderboardService {
    fn query(&self, query: &LeaderboardQuery) -> Result<Vec<LeaderboardEntry>, SubmitError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let req = SubmissionRequest {
            identity: "ada".into(),
            cohort: "A1".into(),
            run_score: 42,
            cosmetic_id: CosmeticId::Karat24,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["runScore"], 42);
        assert_eq!(json["cosmeticId"], "24k");
        assert_eq!(json["identity"], "ada");
    }

    #[test]
    fn test_response_from_http() {
        let ok = SubmissionResponse::from_http(
            201,
            r#"{"isOverallBest":false,"isOverallTop5":true,"isSectionTop5":true}"#,
        )
        .unwrap();
        assert!(ok.is_overall_top5 && !ok.is_overall_best);

        assert!(matches!(
            SubmissionResponse::from_http(500, ""),
            Err(SubmitError::Status(500))
        ));
        assert!(matches!(
            SubmissionResponse::from_http(200, "<html>"),
            Err(SubmitError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_flags_default_false() {
        let resp = SubmissionResponse::from_http(200, "{}").unwrap();
        assert_eq!(resp, SubmissionResponse::default());
    }
}
