//! Cosmetic reward catalog
//!
//! Regular entries unlock one at a time from loot boxes, in catalog order.
//! Gated entries only unlock when the submission endpoint reports the matching
//! rank; they never come out of a loot box.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::submission::SubmissionResponse;

/// Cosmetic identifier (persisted by key)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum CosmeticId {
    #[default]
    #[serde(rename = "classic")]
    Classic,
    #[serde(rename = "24k")]
    Karat24,
    #[serde(rename = "midnight")]
    Midnight,
    #[serde(rename = "bubblegum")]
    Bubblegum,
    #[serde(rename = "robo")]
    Robo,
    #[serde(rename = "laurel")]
    Laurel,
    #[serde(rename = "champion")]
    Champion,
    #[serde(rename = "crowned")]
    Crowned,
}

impl CosmeticId {
    pub fn key(&self) -> &'static str {
        match self {
            CosmeticId::Classic => "classic",
            CosmeticId::Karat24 => "24k",
            CosmeticId::Midnight => "midnight",
            CosmeticId::Bubblegum => "bubblegum",
            CosmeticId::Robo => "robo",
            CosmeticId::Laurel => "laurel",
            CosmeticId::Champion => "champion",
            CosmeticId::Crowned => "crowned",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "classic" => Some(CosmeticId::Classic),
            "24k" => Some(CosmeticId::Karat24),
            "midnight" => Some(CosmeticId::Midnight),
            "bubblegum" => Some(CosmeticId::Bubblegum),
            "robo" => Some(CosmeticId::Robo),
            "laurel" => Some(CosmeticId::Laurel),
            "champion" => Some(CosmeticId::Champion),
            "crowned" => Some(CosmeticId::Crowned),
            _ => None,
        }
    }
}

/// Rank a gated entry requires, checked against submission data only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankPredicate {
    SectionTop5,
    OverallTop5,
    OverallBest,
}

impl RankPredicate {
    pub fn is_met(&self, response: &SubmissionResponse) -> bool {
        match self {
            RankPredicate::SectionTop5 => response.is_section_top5,
            RankPredicate::OverallTop5 => response.is_overall_top5,
            RankPredicate::OverallBest => response.is_overall_best,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub id: CosmeticId,
    pub name: &'static str,
    pub unlock_message: &'static str,
    /// `Some` for achievement-gated entries
    pub gate: Option<RankPredicate>,
}

impl CatalogEntry {
    const fn regular(id: CosmeticId, name: &'static str, unlock_message: &'static str) -> Self {
        Self {
            id,
            name,
            unlock_message,
            gate: None,
        }
    }

    const fn gated(
        id: CosmeticId,
        name: &'static str,
        unlock_message: &'static str,
        gate: RankPredicate,
    ) -> Self {
        Self {
            id,
            name,
            unlock_message,
            gate: Some(gate),
        }
    }

    #[inline]
    pub fn is_gated(&self) -> bool {
        self.gate.is_some()
    }
}

const STANDARD_ENTRIES: [CatalogEntry; 8] = [
    CatalogEntry::regular(CosmeticId::Classic, "Classic", "The one and only Sniffy"),
    CatalogEntry::regular(CosmeticId::Karat24, "24 Karat Sniffy", "Unlocked: 24 Karat Sniffy"),
    CatalogEntry::regular(CosmeticId::Midnight, "Midnight Sniffy", "Unlocked: Midnight Sniffy"),
    CatalogEntry::regular(CosmeticId::Bubblegum, "Bubblegum Sniffy", "Unlocked: Bubblegum Sniffy"),
    CatalogEntry::regular(CosmeticId::Robo, "Robo Sniffy", "Unlocked: Robo Sniffy"),
    CatalogEntry::gated(
        CosmeticId::Laurel,
        "Laurel Sniffy",
        "Top 5 in your section! Laurel Sniffy unlocked",
        RankPredicate::SectionTop5,
    ),
    CatalogEntry::gated(
        CosmeticId::Champion,
        "Champion Sniffy",
        "Top 5 overall! Champion Sniffy unlocked",
        RankPredicate::OverallTop5,
    ),
    CatalogEntry::gated(
        CosmeticId::Crowned,
        "Crowned Sniffy",
        "Global best! Crowned Sniffy unlocked",
        RankPredicate::OverallBest,
    ),
];

/// Typed cosmetic catalog
#[derive(Debug, Clone, PartialEq)]
pub struct RewardCatalog {
    entries: Vec<CatalogEntry>,
}

impl Default for RewardCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl RewardCatalog {
    /// The shipped catalog
    pub fn standard() -> Self {
        Self::new(STANDARD_ENTRIES.to_vec())
    }

    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn entry(&self, id: CosmeticId) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn name(&self, id: CosmeticId) -> &'static str {
        self.entry(id).map(|e| e.name).unwrap_or("Unknown")
    }

    /// Next regular entry a loot box would unlock
    pub fn next_unlock(&self, unlocked: &BTreeSet<CosmeticId>) -> Option<CosmeticId> {
        self.entries
            .iter()
            .find(|e| !e.is_gated() && !unlocked.contains(&e.id))
            .map(|e| e.id)
    }

    /// Gated entries the response qualifies for that are still locked
    pub fn newly_qualified(
        &self,
        unlocked: &BTreeSet<CosmeticId>,
        response: &SubmissionResponse,
    ) -> Vec<CosmeticId> {
        self.entries
            .iter()
            .filter(|e| !unlocked.contains(&e.id))
            .filter(|e| e.gate.is_some_and(|gate| gate.is_met(response)))
            .map(|e| e.id)
            .collect()
    }

    /// Every regular entry is unlocked
    pub fn is_collection_complete(&self, unlocked: &BTreeSet<CosmeticId>) -> bool {
        self.entries
            .iter()
            .filter(|e| !e.is_gated())
            .all(|e| unlocked.contains(&e.id))
    }

    /// (unlocked, total) counts over regular entries
    pub fn regular_progress(&self, unlocked: &BTreeSet<CosmeticId>) -> (usize, usize) {
        let regular = self.entries.iter().filter(|e| !e.is_gated());
        let total = regular.clone().count();
        let have = regular.filter(|e| unlocked.contains(&e.id)).count();
        (have, total)
    }
}
