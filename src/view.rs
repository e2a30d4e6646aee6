use crate::enforcement::registry::PolicyRegistry;
use crate::error::TierGuardError;
use crate::persona::Persona;

/// Whether `principal` may perform `action` on the controller behind the
/// named `route`. For templates deciding whether to show a link or button.
pub fn authorized_to(
    registry: &PolicyRegistry,
    principal: &dyn Persona,
    action: &str,
    route: &str,
) -> Result<bool, TierGuardError> {
    let controller = registry
        .route(route)
        .ok_or_else(|| TierGuardError::config(format!("unable to determine route for {route}")))?;
    controller.authorized(principal, action)
}
