use std::collections::{BTreeMap, BTreeSet};

use crate::error::TierGuardError;
use crate::persona::tier::TierSet;

/// Grant value meaning "every action" for its tier.
pub const WILDCARD: &str = "all";

/// Actions granted at one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionSet {
    All,
    Only(BTreeSet<String>),
}

impl ActionSet {
    pub fn covers(&self, action: &str) -> bool {
        match self {
            ActionSet::All => true,
            ActionSet::Only(actions) => actions.contains(action),
        }
    }
}

/// A list that is exactly `["all"]` is the wildcard; anything else is a
/// plain action list, even if `"all"` appears among other names.
impl<S: Into<String>> FromIterator<S> for ActionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let actions: Vec<String> = iter.into_iter().map(Into::into).collect();
        match actions.as_slice() {
            [only] if only == WILDCARD => ActionSet::All,
            _ => ActionSet::Only(actions.into_iter().collect()),
        }
    }
}

impl From<&str> for ActionSet {
    fn from(action: &str) -> Self {
        std::iter::once(action).collect()
    }
}

impl From<String> for ActionSet {
    fn from(action: String) -> Self {
        std::iter::once(action).collect()
    }
}

impl<S: Into<String>> From<Vec<S>> for ActionSet {
    fn from(actions: Vec<S>) -> Self {
        actions.into_iter().collect()
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for ActionSet {
    fn from(actions: [S; N]) -> Self {
        actions.into_iter().collect()
    }
}

/// Tier name to granted actions for one controller. Always replaced whole.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantTable {
    entries: BTreeMap<String, ActionSet>,
}

impl GrantTable {
    /// Normalize and validate grant entries against `tiers`.
    ///
    /// Every key outside the tier set is collected and reported in one error,
    /// in input order. A repeated key keeps its last value.
    pub fn build<I, K, V>(tiers: &TierSet, persona: &str, entries: I) -> Result<Self, TierGuardError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ActionSet>,
    {
        let mut table = BTreeMap::new();
        let mut extra: Vec<String> = Vec::new();

        for (tier, actions) in entries {
            let tier = tier.into();
            if !tiers.contains(&tier) && !extra.contains(&tier) {
                extra.push(tier.clone());
            }
            table.insert(tier, actions.into());
        }

        if !extra.is_empty() {
            return Err(TierGuardError::InvalidGrant {
                persona: persona.to_owned(),
                tiers: tiers.names().map(str::to_owned).collect(),
                extra,
            });
        }

        Ok(Self { entries: table })
    }

    pub fn get(&self, tier: &str) -> Option<&ActionSet> {
        self.entries.get(tier)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Granted tiers (sorted by name, not privilege).
    pub fn tiers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Lowest tier whose grant covers `action`, scanning upward from the
    /// least privileged tier. The first hit wins, wildcard or explicit.
    pub fn tier_for<'t>(&self, tiers: &'t TierSet, action: &str) -> Option<&'t str> {
        tiers
            .names()
            .find(|tier| self.entries.get(*tier).is_some_and(|set| set.covers(action)))
    }
}
