pub mod store;
pub mod tier;

use std::fmt;

use tier::TierSet;

use crate::error::TierGuardError;
use crate::naming::{is_identifier, is_type_path, singular_route_key};

pub const DEFAULT_TIER_ATTRIBUTE: &str = "authorization_tier";

/// Any entity carrying a current tier value, typically a user record owned
/// by the host's persistence layer. Only read, never created or mutated here.
pub trait Persona: fmt::Debug {
    /// Name of the persona type this value is an instance of, e.g. `User`.
    fn persona_name(&self) -> &str;

    /// Read an attribute by name. `None` when the attribute does not exist
    /// or holds no value.
    fn attribute(&self, name: &str) -> Option<&str>;
}

/// A principal type and its tier configuration.
///
/// Tiers are defined exactly once; a type without tiers is not an
/// authorized persona and cannot be bound to a controller.
#[derive(Debug, Clone)]
pub struct PersonaType {
    name: String,
    route_key: String,
    tier_attribute: String,
    tiers: Option<TierSet>,
}

impl PersonaType {
    pub fn new(name: impl Into<String>) -> Result<Self, TierGuardError> {
        let name = name.into();
        if !is_type_path(&name) {
            return Err(TierGuardError::config(format!(
                "persona type name must be a type name such as \"User\", got {name:?}"
            )));
        }
        Ok(Self {
            route_key: singular_route_key(&name),
            name,
            tier_attribute: DEFAULT_TIER_ATTRIBUTE.to_owned(),
            tiers: None,
        })
    }

    /// Configure the tiers, lowest privilege first.
    pub fn define_tiers<I, N, D>(&mut self, tiers: I) -> Result<(), TierGuardError>
    where
        I: IntoIterator<Item = (N, D)>,
        N: Into<String>,
        D: Into<String>,
    {
        if self.tiers.is_some() {
            return Err(TierGuardError::config(
                "you can only define authorization tiers once",
            ));
        }
        let tiers = TierSet::define(tiers)?;
        tracing::info!(
            persona = %self.name,
            tiers = %tiers.names().collect::<Vec<_>>().join(","),
            "authorization tiers defined"
        );
        self.tiers = Some(tiers);
        Ok(())
    }

    /// Read tier values from `attribute` instead of `authorization_tier`.
    pub fn set_tier_attribute(&mut self, attribute: impl Into<String>) -> Result<(), TierGuardError> {
        let attribute = attribute.into();
        if !is_identifier(&attribute) {
            return Err(TierGuardError::config(format!(
                "authorization tier attribute name must be an identifier, got {attribute:?}"
            )));
        }
        self.tier_attribute = attribute;
        Ok(())
    }

    /// Override the singular key used to derive the default accessor name.
    pub fn set_route_key(&mut self, key: impl Into<String>) -> Result<(), TierGuardError> {
        let key = key.into();
        if !is_identifier(&key) {
            return Err(TierGuardError::config(format!(
                "route key must be an identifier, got {key:?}"
            )));
        }
        self.route_key = key;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn route_key(&self) -> &str {
        &self.route_key
    }

    pub fn tier_attribute(&self) -> &str {
        &self.tier_attribute
    }

    pub fn is_authorized_persona(&self) -> bool {
        self.tiers.is_some()
    }

    pub fn tiers(&self) -> Result<&TierSet, TierGuardError> {
        self.tiers.as_ref().ok_or_else(|| {
            TierGuardError::config(format!("{} has no authorization tiers defined", self.name))
        })
    }

    /// Accessor yielding the current principal when none is configured
    /// explicitly, e.g. `current_user`.
    pub fn default_accessor(&self) -> String {
        format!("current_{}", self.route_key)
    }

    /// The principal's current tier value, unvalidated.
    pub fn tier_of<'p>(&self, principal: &'p dyn Persona) -> Result<&'p str, TierGuardError> {
        principal
            .attribute(&self.tier_attribute)
            .ok_or_else(|| TierGuardError::InvalidTier(format!("<no {}>", self.tier_attribute)))
    }

    pub fn tier_at_or_above(&self, principal: &dyn Persona, target: &str) -> Result<bool, TierGuardError> {
        self.tiers()?.at_or_above(self.tier_of(principal)?, target)
    }

    /// Predicate for one tier, validated up front: `or_above("staff")` is the
    /// `staff_or_above` check.
    pub fn or_above(&self, tier: &str) -> Result<TierFloor<'_>, TierGuardError> {
        let level = self.tiers()?.level_of(tier)?;
        Ok(TierFloor {
            persona: self,
            tier: tier.to_owned(),
            level,
        })
    }
}

/// A fixed minimum tier for one persona type.
#[derive(Debug, Clone)]
pub struct TierFloor<'a> {
    persona: &'a PersonaType,
    tier: String,
    level: usize,
}

impl TierFloor<'_> {
    pub fn tier(&self) -> &str {
        &self.tier
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn admits(&self, principal: &dyn Persona) -> Result<bool, TierGuardError> {
        let current = self.persona.tier_of(principal)?;
        Ok(self.persona.tiers()?.level_of(current)? >= self.level)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Debug)]
    pub(crate) struct TestUser {
        pub(crate) persona: &'static str,
        pub(crate) attribute: &'static str,
        pub(crate) tier: Option<&'static str>,
    }

    impl TestUser {
        pub(crate) fn at(tier: &'static str) -> Self {
            Self {
                persona: "User",
                attribute: DEFAULT_TIER_ATTRIBUTE,
                tier: Some(tier),
            }
        }
    }

    impl Persona for TestUser {
        fn persona_name(&self) -> &str {
            self.persona
        }

        fn attribute(&self, name: &str) -> Option<&str> {
            (name == self.attribute).then_some(self.tier).flatten()
        }
    }

    pub(crate) fn user_type() -> PersonaType {
        let mut user = PersonaType::new("User").unwrap();
        user.define_tiers([
            ("trainee", "Trainee - limited access"),
            ("staff", "Staff - regular access"),
            ("admin", "Admin - full access"),
        ])
        .unwrap();
        user
    }

    #[test]
    fn tiers_can_only_be_defined_once() {
        let mut user = user_type();
        let err = user.define_tiers([("other", "Other")]).unwrap_err();
        assert_eq!(err.to_string(), "you can only define authorization tiers once");
        assert_eq!(user.tiers().unwrap().names().collect::<Vec<_>>(), ["trainee", "staff", "admin"]);
    }

    #[test]
    fn type_without_tiers_is_not_authorized_persona() {
        let plain = PersonaType::new("Visitor").unwrap();
        assert!(!plain.is_authorized_persona());
        assert!(matches!(plain.tiers(), Err(TierGuardError::Configuration(_))));
    }

    #[test]
    fn rejects_malformed_type_names() {
        assert!(PersonaType::new("user").is_err());
        assert!(PersonaType::new("").is_err());
        assert!(PersonaType::new("Admin::User").is_ok());
    }

    #[test]
    fn default_accessor_follows_route_key() {
        assert_eq!(user_type().default_accessor(), "current_user");
        assert_eq!(PersonaType::new("Admin::Staff").unwrap().default_accessor(), "current_admin_staff");

        let mut member = PersonaType::new("TeamMember").unwrap();
        member.set_route_key("member").unwrap();
        assert_eq!(member.default_accessor(), "current_member");
    }

    #[test]
    fn compares_principal_tiers() {
        let user = user_type();
        let staff = TestUser::at("staff");
        assert!(user.tier_at_or_above(&staff, "trainee").unwrap());
        assert!(user.tier_at_or_above(&staff, "staff").unwrap());
        assert!(!user.tier_at_or_above(&staff, "admin").unwrap());
    }

    #[test]
    fn unrecognized_principal_tier_surfaces_as_error() {
        let user = user_type();
        let legacy = TestUser::at("legacy");
        let err = user.tier_at_or_above(&legacy, "trainee").unwrap_err();
        assert!(matches!(err, TierGuardError::InvalidTier(ref v) if v == "legacy"));
    }

    #[test]
    fn missing_tier_attribute_is_invalid_tier() {
        let user = user_type();
        let blank = TestUser {
            tier: None,
            ..TestUser::at("staff")
        };
        assert!(matches!(
            user.tier_at_or_above(&blank, "trainee"),
            Err(TierGuardError::InvalidTier(_))
        ));
    }

    #[test]
    fn custom_tier_attribute() {
        let mut user = user_type();
        user.set_tier_attribute("role").unwrap();
        let principal = TestUser {
            attribute: "role",
            ..TestUser::at("admin")
        };
        assert!(user.tier_at_or_above(&principal, "admin").unwrap());
        assert!(user.set_tier_attribute("not valid").is_err());
    }

    #[test]
    fn tier_floor_predicates() {
        let user = user_type();
        let staff_or_above = user.or_above("staff").unwrap();
        assert_eq!(staff_or_above.level(), 1);
        assert!(!staff_or_above.admits(&TestUser::at("trainee")).unwrap());
        assert!(staff_or_above.admits(&TestUser::at("staff")).unwrap());
        assert!(staff_or_above.admits(&TestUser::at("admin")).unwrap());
        assert!(user.or_above("owner").is_err());
    }
}
