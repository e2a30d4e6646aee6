//! Authorization decisions: grant tables, tier resolution and the
//! at-or-above comparison for a controller's actions.
//!
//! Resolution scans tiers in ascending privilege order (lowest first) and
//! stops at the first tier whose grant covers the action, so the required
//! tier is always the least privileged sufficient one.

pub mod capability;
pub mod controller;
pub mod grant;
pub mod registry;

pub use capability::Clearance;
pub use controller::{Binding, Controller};
pub use grant::{ActionSet, GrantTable, WILDCARD};
pub use registry::PolicyRegistry;
