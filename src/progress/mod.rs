//! Post-run progression
//!
//! Everything that happens between a run ending and the menu coming back:
//! score submission, rank celebration, milestone rewards, the cumulative
//! progress bar, gated unlocks and the one-time collection-complete state.

pub mod animation;
pub mod catalog;
pub mod milestones;
pub mod sequencer;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::submission::SubmissionResponse;
use crate::tuning::ProgressTuning;

pub use animation::{AnimationStep, ProgressAnimation};
pub use catalog::{CatalogEntry, CosmeticId, RankPredicate, RewardCatalog};
pub use milestones::Milestone;
pub use sequencer::{
    ProgressBar, ProgressionSequencer, RevealView, RunSummary, SequenceContext, SequencerPhase,
    SequencerView,
};

/// Progress carried across runs (persisted)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CumulativeState {
    pub cumulative_score: u64,
    pub reached_run_milestones: BTreeSet<u64>,
    pub unlocked: BTreeSet<CosmeticId>,
    pub best_score: u64,
    pub collection_complete: bool,
    pub selected: CosmeticId,
}

impl Default for CumulativeState {
    fn default() -> Self {
        Self {
            cumulative_score: 0,
            reached_run_milestones: BTreeSet::new(),
            unlocked: BTreeSet::from([CosmeticId::Classic]),
            best_score: 0,
            collection_complete: false,
            selected: CosmeticId::Classic,
        }
    }
}

impl CumulativeState {
    /// Restore invariants after loading: Classic is always owned and the
    /// selection must be something owned
    pub fn normalize(&mut self) {
        self.unlocked.insert(CosmeticId::Classic);
        if !self.unlocked.contains(&self.selected) {
            self.selected = CosmeticId::Classic;
        }
    }

    #[inline]
    pub fn is_unlocked(&self, id: CosmeticId) -> bool {
        self.unlocked.contains(&id)
    }

    /// Unlock a cosmetic; returns false if it was already owned
    pub fn unlock(&mut self, id: CosmeticId) -> bool {
        self.unlocked.insert(id)
    }

    /// Step the selection through owned cosmetics, wrapping at either end
    pub fn cycle_selected(&mut self, forward: bool) -> CosmeticId {
        let owned: Vec<CosmeticId> = self.unlocked.iter().copied().collect();
        if owned.is_empty() {
            return self.selected;
        }
        let current = owned.iter().position(|id| *id == self.selected).unwrap_or(0);
        let next = if forward {
            (current + 1) % owned.len()
        } else {
            (current + owned.len() - 1) % owned.len()
        };
        self.selected = owned[next];
        self.selected
    }
}

/// Ranking tiers reported by the submission endpoint, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankTier {
    SectionTop5,
    OverallTop5,
    OverallBest,
}

impl RankTier {
    /// Highest tier the response qualifies for (only that one is celebrated)
    pub fn highest(response: &SubmissionResponse) -> Option<RankTier> {
        if response.is_overall_best {
            Some(RankTier::OverallBest)
        } else if response.is_overall_top5 {
            Some(RankTier::OverallTop5)
        } else if response.is_section_top5 {
            Some(RankTier::SectionTop5)
        } else {
            None
        }
    }

    pub fn duration_ms(&self, tuning: &ProgressTuning) -> f32 {
        match self {
            RankTier::SectionTop5 => tuning.celebration_section_ms,
            RankTier::OverallTop5 => tuning.celebration_top5_ms,
            RankTier::OverallBest => tuning.celebration_best_ms,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RankTier::SectionTop5 => "Top 5 in your section!",
            RankTier::OverallTop5 => "Top 5 overall!",
            RankTier::OverallBest => "New global best!",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_owns_classic() {
        let state = CumulativeState::default();
        assert!(state.is_unlocked(CosmeticId::Classic));
        assert_eq!(state.selected, CosmeticId::Classic);
        assert_eq!(state.cumulative_score, 0);
    }

    #[test]
    fn test_normalize_repairs_selection() {
        let mut state = CumulativeState {
            unlocked: BTreeSet::new(),
            selected: CosmeticId::Robo,
            ..Default::default()
        };
        state.normalize();
        assert!(state.is_unlocked(CosmeticId::Classic));
        assert_eq!(state.selected, CosmeticId::Classic);
    }

    #[test]
    fn test_cycle_wraps_both_ways() {
        let mut state = CumulativeState::default();
        state.unlock(CosmeticId::Midnight);
        state.unlock(CosmeticId::Karat24);
        assert_eq!(state.cycle_selected(true), CosmeticId::Karat24);
        assert_eq!(state.cycle_selected(true), CosmeticId::Midnight);
        assert_eq!(state.cycle_selected(true), CosmeticId::Classic);
        assert_eq!(state.cycle_selected(false), CosmeticId::Midnight);
    }

    #[test]
    fn test_cycle_single_item_stays() {
        let mut state = CumulativeState::default();
        assert_eq!(state.cycle_selected(true), CosmeticId::Classic);
        assert_eq!(state.cycle_selected(false), CosmeticId::Classic);
    }

    #[test]
    fn test_highest_tier() {
        let none = SubmissionResponse::default();
        assert_eq!(RankTier::highest(&none), None);
        let all = SubmissionResponse {
            is_overall_best: true,
            is_overall_top5: true,
            is_section_top5: true,
        };
        assert_eq!(RankTier::highest(&all), Some(RankTier::OverallBest));
        let section = SubmissionResponse {
            is_section_top5: true,
            ..Default::default()
        };
        assert_eq!(RankTier::highest(&section), Some(RankTier::SectionTop5));

        let tuning = ProgressTuning::default();
        assert!(
            RankTier::SectionTop5.duration_ms(&tuning) < RankTier::OverallBest.duration_ms(&tuning)
        );
    }
}
