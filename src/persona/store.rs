//! Optional query capability for principal stores.
//!
//! A store adapter that can filter records by attribute value implements
//! [`TierFilter`]; stores without range queries simply don't, and the
//! `with_tier_at_or_above` helpers are unavailable for them.

use super::{PersonaType, TierFloor};
use crate::error::TierGuardError;

pub trait TierFilter {
    type Query;

    /// Principals whose `attribute` holds any of `tiers`.
    fn where_tier_in(&self, attribute: &str, tiers: &[&str]) -> Self::Query;
}

impl PersonaType {
    /// All principals at `tier` or above.
    pub fn with_tier_at_or_above<S>(&self, store: &S, tier: &str) -> Result<S::Query, TierGuardError>
    where
        S: TierFilter + ?Sized,
    {
        let tiers = self.tiers()?.at_or_above_names(tier)?;
        Ok(store.where_tier_in(self.tier_attribute(), &tiers))
    }
}

impl TierFloor<'_> {
    pub fn filter<S>(&self, store: &S) -> Result<S::Query, TierGuardError>
    where
        S: TierFilter + ?Sized,
    {
        self.persona.with_tier_at_or_above(store, &self.tier)
    }
}
