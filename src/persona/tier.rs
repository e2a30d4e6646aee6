use crate::error::TierGuardError;
use crate::naming::is_identifier;

/// Authorization tiers ordered by privilege level.
/// Definition order is the privilege order: index 0 is the lowest tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierSet {
    tiers: Vec<TierDef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TierDef {
    name: String,
    description: String,
}

impl TierSet {
    /// Build a tier set from `(name, description)` pairs, lowest privilege first.
    ///
    /// Names must be identifier-shaped and unique. At least one tier is required.
    pub fn define<I, N, D>(tiers: I) -> Result<Self, TierGuardError>
    where
        I: IntoIterator<Item = (N, D)>,
        N: Into<String>,
        D: Into<String>,
    {
        let mut defs: Vec<TierDef> = Vec::new();
        for (name, description) in tiers {
            let name = name.into();
            if !is_identifier(&name) {
                return Err(TierGuardError::config(format!(
                    "you must provide identifier tier names and string descriptions, \
                     e.g. trainee = \"Trainee - limited access\"; got tier name {name:?}"
                )));
            }
            if defs.iter().any(|d| d.name == name) {
                return Err(TierGuardError::config(format!(
                    "authorization tier {name} is defined more than once"
                )));
            }
            defs.push(TierDef {
                name,
                description: description.into(),
            });
        }

        if defs.is_empty() {
            return Err(TierGuardError::config(
                "you must define at least one authorization tier",
            ));
        }

        Ok(Self { tiers: defs })
    }

    /// Tier names, lowest privilege first.
    pub fn names(&self) -> impl ExactSizeIterator<Item = &str> + Clone {
        self.tiers.iter().map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tiers.iter().any(|t| t.name == name)
    }

    pub fn description(&self, name: &str) -> Option<&str> {
        self.tiers
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.description.as_str())
    }

    /// Zero-based privilege level of `name`.
    pub fn level_of(&self, name: &str) -> Result<usize, TierGuardError> {
        self.tiers
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| TierGuardError::InvalidTier(name.to_owned()))
    }

    /// `true` iff `current` sits at or above `target`. Unknown names on either
    /// side are an error, never a silent denial.
    pub fn at_or_above(&self, current: &str, target: &str) -> Result<bool, TierGuardError> {
        Ok(self.level_of(current)? >= self.level_of(target)?)
    }

    /// Tiers from `name` upward, e.g. for filtering stored principals.
    pub fn at_or_above_names(&self, name: &str) -> Result<Vec<&str>, TierGuardError> {
        let level = self.level_of(name)?;
        Ok(self.names().skip(level).collect())
    }

    /// Label-first `(description, name)` pairs for select boxes. This is a map
    /// inversion: a repeated description keeps its first position and maps to
    /// the last tier that carries it.
    pub fn collection(&self) -> Vec<(&str, &str)> {
        let mut out: Vec<(&str, &str)> = Vec::with_capacity(self.tiers.len());
        for tier in &self.tiers {
            match out.iter_mut().find(|(label, _)| *label == tier.description) {
                Some(entry) => entry.1 = &tier.name,
                None => out.push((&tier.description, &tier.name)),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staff_tiers() -> TierSet {
        TierSet::define([
            ("trainee", "Trainee - limited access"),
            ("staff", "Staff - regular access"),
            ("admin", "Admin - full access"),
        ])
        .unwrap()
    }

    #[test]
    fn tier_ordering() {
        let tiers = staff_tiers();
        assert_eq!(tiers.names().collect::<Vec<_>>(), ["trainee", "staff", "admin"]);
        assert_eq!(tiers.level_of("trainee").unwrap(), 0);
        assert_eq!(tiers.level_of("staff").unwrap(), 1);
        assert_eq!(tiers.level_of("admin").unwrap(), 2);
    }

    #[test]
    fn at_or_above_matches_index_order_for_every_pair() {
        let tiers = TierSet::define([("one", "1"), ("two", "2"), ("three", "3"), ("four", "4")]).unwrap();
        let names: Vec<&str> = tiers.names().collect();
        for (i, current) in names.iter().enumerate() {
            for (j, target) in names.iter().enumerate() {
                assert_eq!(tiers.at_or_above(current, target).unwrap(), i >= j, "{current} vs {target}");
            }
        }
    }

    #[test]
    fn unknown_tier_is_an_error_naming_the_value() {
        let tiers = staff_tiers();
        let err = tiers.level_of("legacy").unwrap_err();
        assert!(matches!(err, TierGuardError::InvalidTier(ref v) if v == "legacy"));
        assert_eq!(err.to_string(), "invalid authorization tier: legacy");

        assert!(tiers.at_or_above("legacy", "trainee").is_err());
        assert!(tiers.at_or_above("admin", "legacy").is_err());
    }

    #[test]
    fn rejects_non_identifier_names() {
        let err = TierSet::define([("super admin", "Super")]).unwrap_err().to_string();
        assert!(err.contains("\"super admin\""), "{err}");
    }

    #[test]
    fn rejects_duplicates_and_empty() {
        assert!(matches!(
            TierSet::define([("staff", "a"), ("staff", "b")]),
            Err(TierGuardError::Configuration(_))
        ));
        assert!(matches!(
            TierSet::define(Vec::<(String, String)>::new()),
            Err(TierGuardError::Configuration(_))
        ));
    }

    #[test]
    fn collection_is_label_first() {
        let tiers = staff_tiers();
        assert_eq!(
            tiers.collection(),
            [
                ("Trainee - limited access", "trainee"),
                ("Staff - regular access", "staff"),
                ("Admin - full access", "admin"),
            ]
        );
    }

    #[test]
    fn collection_collapses_repeated_labels() {
        let tiers = TierSet::define([("a", "Same"), ("b", "Other"), ("c", "Same")]).unwrap();
        assert_eq!(tiers.collection(), [("Same", "c"), ("Other", "b")]);
    }

    #[test]
    fn names_from_a_tier_upward() {
        let tiers = staff_tiers();
        assert_eq!(tiers.at_or_above_names("staff").unwrap(), ["staff", "admin"]);
        assert_eq!(tiers.at_or_above_names("trainee").unwrap(), ["trainee", "staff", "admin"]);
        assert!(tiers.at_or_above_names("owner").is_err());
    }
}
