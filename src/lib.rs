//! Tiered role-based access control.
//!
//! Privilege is a single ordered tier per principal (e.g. trainee < staff <
//! admin). Each controller grants its actions to tiers; a request is allowed
//! when the principal's tier is at or above the lowest tier granted the action.

pub mod config;
pub mod enforcement;
pub mod error;
pub mod gate;
pub mod persona;
pub mod view;

mod naming;

pub use config::PolicyConfig;
pub use enforcement::{ActionSet, Clearance, Controller, GrantTable, PolicyRegistry};
pub use error::TierGuardError;
pub use gate::{AuthorizationGate, HookRegistry, Outcome, Representation, RequestContext, ResponseSink};
pub use persona::store::TierFilter;
pub use persona::tier::TierSet;
pub use persona::{Persona, PersonaType};
