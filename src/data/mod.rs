//! Read-only reference tables
//!
//! Parties, prefectures, districts, proportional blocks and candidates are
//! static inputs to prompt building; [`EntityKey`] names the analysis targets
//! drawn from them. They are wrapped in a [`Catalog`] so the
//! pipeline can run against the built-in tables or a reduced set in tests.

mod candidates;
mod entity;
mod parties;
mod regions;

pub use candidates::{builtin_candidates, Candidate, CandidateStatus};
pub use entity::{EntityKey, EntityKind, NATIONAL_ID, NATIONAL_LABEL};
pub use parties::{builtin_parties, Party, INDEPENDENT_PARTY_ID, OTHER_PARTY_ID};
pub use regions::{builtin_blocks, builtin_prefectures, Area, Block, District, Prefecture};

/// Single-member district seats in the House of Representatives
pub const DISTRICT_SEATS: u32 = 289;

/// Proportional representation seats
pub const PROPORTIONAL_SEATS: u32 = 176;

/// Total seats
pub const TOTAL_SEATS: u32 = DISTRICT_SEATS + PROPORTIONAL_SEATS;

/// Seats needed for a majority
pub const MAJORITY_THRESHOLD: u32 = TOTAL_SEATS / 2 + 1;

/// Lookup tables consumed by the analysis pipeline
#[derive(Debug, Clone)]
pub struct Catalog {
    parties: Vec<Party>,
    prefectures: Vec<Prefecture>,
    blocks: Vec<Block>,
    candidates: Vec<Candidate>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    /// Create a catalog from explicit tables
    pub fn new(
        parties: Vec<Party>,
        prefectures: Vec<Prefecture>,
        blocks: Vec<Block>,
        candidates: Vec<Candidate>,
    ) -> Self {
        Self {
            parties,
            prefectures,
            blocks,
            candidates,
        }
    }

    /// The built-in tables for the 2026 election
    pub fn builtin() -> Self {
        Self::new(
            builtin_parties(),
            builtin_prefectures(),
            builtin_blocks(),
            builtin_candidates(),
        )
    }

    pub fn parties(&self) -> &[Party] {
        &self.parties
    }

    pub fn prefectures(&self) -> &[Prefecture] {
        &self.prefectures
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Look up a party, falling back to the catch-all "other" entry
    pub fn party(&self, id: &str) -> Option<&Party> {
        self.parties
            .iter()
            .find(|p| p.id == id)
            .or_else(|| self.parties.iter().find(|p| p.id == OTHER_PARTY_ID))
    }

    pub fn prefecture(&self, id: &str) -> Option<&Prefecture> {
        self.prefectures.iter().find(|p| p.id == id)
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// Prefecture ids in table order
    pub fn prefecture_ids(&self) -> Vec<String> {
        self.prefectures.iter().map(|p| p.id.clone()).collect()
    }

    /// Block ids in table order
    pub fn block_ids(&self) -> Vec<String> {
        self.blocks.iter().map(|b| b.id.clone()).collect()
    }

    /// Candidates standing in any district of the prefecture
    pub fn candidates_in(&self, prefecture_id: &str) -> Vec<&Candidate> {
        self.candidates
            .iter()
            .filter(|c| c.stands_in_prefecture(prefecture_id))
            .collect()
    }

    /// Prefectures voting in the block, in table order
    pub fn prefectures_in_block(&self, block_id: &str) -> Vec<&Prefecture> {
        self.prefectures
            .iter()
            .filter(|p| p.block_id == block_id)
            .collect()
    }
}
