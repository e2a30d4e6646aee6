use thiserror::Error;

#[derive(Debug, Error)]
pub enum TierGuardError {
    #[error("{0}")]
    Configuration(String),

    #[error("invalid authorization tier: {0}")]
    InvalidTier(String),

    #[error(
        "invalid grant: {persona} has authorization tiers {} but received extra keys: {}",
        .tiers.join(", "),
        .extra.join(", ")
    )]
    InvalidGrant {
        persona: String,
        tiers: Vec<String>,
        extra: Vec<String>,
    },

    #[error("missing authorization grant for {controller}#{action}")]
    MissingGrant { controller: String, action: String },

    #[error("{value} is not a {expected}")]
    TypeMismatch { value: String, expected: String },

    #[error("policy load failed: {0}")]
    PolicyLoad(String),

    #[error("policy validation failed: {0}")]
    PolicyValidation(String),
}

impl TierGuardError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}
