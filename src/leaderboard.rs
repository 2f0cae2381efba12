//! Local leaderboard
//!
//! In-process stand-in for the remote score service. Answers submissions with
//! the same ranking flags and serves leaderboard queries, so the headless demo
//! and tests can drive the whole progression without a network.

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, StoreError, read_or_default, write_value};
use crate::submission::{
    LeaderboardEntry, LeaderboardQuery, LeaderboardService, ScoreSubmitter, SubmissionRequest,
    SubmissionResponse, SubmitError,
};

/// Longest accepted display name (in characters)
pub const MAX_NAME_LEN: usize = 64;

/// Entries kept; lower scores fall off the end
pub const MAX_ENTRIES: usize = 100;

/// Ranks at or above this count as "top 5"
const TOP_RANK: usize = 5;

/// Score table, best first (ties keep submission order)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    const STORAGE_KEY: &'static str = "sniffy.leaderboard";

    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Rank a score would take (1-indexed), optionally within one cohort
    pub fn potential_rank(&self, score: u64, cohort: Option<&str>) -> usize {
        let ahead = self
            .entries
            .iter()
            .filter(|e| cohort.is_none_or(|c| e.cohort == c))
            .filter(|e| e.score >= score)
            .count();
        ahead + 1
    }

    /// Insert an entry; returns its overall rank (1-indexed), or None when
    /// the table is full and the score ranks below every kept entry
    pub fn add(&mut self, entry: LeaderboardEntry) -> Option<usize> {
        let pos = self
            .entries
            .iter()
            .position(|e| entry.score > e.score)
            .unwrap_or(self.entries.len());
        if pos >= MAX_ENTRIES {
            return None;
        }
        self.entries.insert(pos, entry);
        self.entries.truncate(MAX_ENTRIES);
        Some(pos + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        let mut board: Leaderboard = read_or_default(store, Self::STORAGE_KEY);
        board.entries.truncate(MAX_ENTRIES);
        log::info!("Loaded {} leaderboard entries", board.entries.len());
        board
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<(), StoreError> {
        write_value(store, Self::STORAGE_KEY, self)?;
        log::debug!("Leaderboard saved ({} entries)", self.entries.len());
        Ok(())
    }
}

fn truncate_name(name: &str) -> String {
    name.trim().chars().take(MAX_NAME_LEN).collect()
}

impl ScoreSubmitter for Leaderboard {
    fn submit(&mut self, request: &SubmissionRequest) -> Result<SubmissionResponse, SubmitError> {
        let name = truncate_name(&request.identity);
        if name.is_empty() {
            return Err(SubmitError::Status(400));
        }
        let overall = self.potential_rank(request.run_score, None);
        let section = self.potential_rank(request.run_score, Some(&request.cohort));
        let kept = self.add(LeaderboardEntry {
            name,
            score: request.run_score,
            cohort: request.cohort.clone(),
            cosmetic_id: request.cosmetic_id,
        });
        if kept.is_none() {
            log::debug!("Score {} below the kept table", request.run_score);
        }
        Ok(SubmissionResponse {
            is_overall_best: overall == 1,
            is_overall_top5: overall <= TOP_RANK,
            is_section_top5: section <= TOP_RANK,
        })
    }
}

impl LeaderboardService for Leaderboard {
    fn query(&self, query: &LeaderboardQuery) -> Result<Vec<LeaderboardEntry>, SubmitError> {
        Ok(self
            .entries
            .iter()
            .filter(|e| query.cohort.as_deref().is_none_or(|c| e.cohort == c))
            .take(query.limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::progress::CosmeticId;

    fn request(name: &str, cohort: &str, score: u64) -> SubmissionRequest {
        SubmissionRequest {
            identity: name.into(),
            cohort: cohort.into(),
            run_score: score,
            cosmetic_id: CosmeticId::Classic,
        }
    }

    #[test]
    fn test_first_submission_is_best() {
        let mut board = Leaderboard::new();
        let resp = board.submit(&request("ada", "A", 10)).unwrap();
        assert!(resp.is_overall_best && resp.is_overall_top5 && resp.is_section_top5);
        assert_eq!(board.top_score(), Some(10));
    }

    #[test]
    fn test_ties_do_not_take_the_top_spot() {
        let mut board = Leaderboard::new();
        board.submit(&request("ada", "A", 10)).unwrap();
        let resp = board.submit(&request("bob", "A", 10)).unwrap();
        assert!(!resp.is_overall_best);
        assert!(resp.is_overall_top5);
        assert_eq!(board.entries[0].name, "ada");
    }

    #[test]
    fn test_section_rank_is_per_cohort() {
        let mut board = Leaderboard::new();
        for i in 0..5 {
            board.submit(&request("x", "A", 100 + i)).unwrap();
        }
        let resp = board.submit(&request("late", "B", 50)).unwrap();
        assert!(!resp.is_overall_top5);
        assert!(resp.is_section_top5);
        let resp = board.submit(&request("late", "A", 50)).unwrap();
        assert!(!resp.is_section_top5);
    }

    #[test]
    fn test_query_filters_and_limits() {
        let mut board = Leaderboard::new();
        for i in 0..15 {
            let cohort = if i % 2 == 0 { "A" } else { "B" };
            board.submit(&request("p", cohort, i)).unwrap();
        }
        let all = board.query(&LeaderboardQuery::default()).unwrap();
        assert_eq!(all.len(), 10);
        assert!(all.windows(2).all(|w| w[0].score >= w[1].score));
        let only_b = board
            .query(&LeaderboardQuery {
                cohort: Some("B".into()),
                limit: 100,
            })
            .unwrap();
        assert_eq!(only_b.len(), 7);
        assert!(only_b.iter().all(|e| e.cohort == "B"));
    }

    #[test]
    fn test_name_truncated_and_required() {
        let mut board = Leaderboard::new();
        let long = "n".repeat(100);
        board.submit(&request(&long, "A", 1)).unwrap();
        assert_eq!(board.entries[0].name.chars().count(), MAX_NAME_LEN);
        assert!(matches!(
            board.submit(&request("   ", "A", 1)),
            Err(SubmitError::Status(400))
        ));
    }

    #[test]
    fn test_table_is_capped() {
        let mut board = Leaderboard::new();
        for score in 1..=(MAX_ENTRIES as u64 + 20) {
            board.submit(&request("ada", "A", score)).unwrap();
        }
        assert_eq!(board.entries.len(), MAX_ENTRIES);
        assert_eq!(board.top_score(), Some(MAX_ENTRIES as u64 + 20));
        assert_eq!(board.entries.last().map(|e| e.score), Some(21));

        let resp = board.submit(&request("bob", "A", 1)).unwrap();
        assert!(!resp.is_overall_top5);
        assert_eq!(board.entries.len(), MAX_ENTRIES);
        assert!(board.entries.iter().all(|e| e.name == "ada"));
    }

    #[test]
    fn test_save_and_load() {
        let mut store = MemoryStore::new();
        let mut board = Leaderboard::new();
        board.submit(&request("ada", "A", 42)).unwrap();
        board.save(&mut store).unwrap();
        let loaded = Leaderboard::load(&store);
        assert_eq!(loaded.entries, board.entries);
    }
}
