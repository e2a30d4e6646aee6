use std::collections::HashMap;
use std::sync::Arc;

use super::controller::Controller;
use super::grant::ActionSet;
use crate::error::TierGuardError;
use crate::gate::{AuthorizationGate, HookRegistry};
use crate::naming::is_type_path;
use crate::persona::PersonaType;

/// Persona types, controllers and named routes, keyed by name.
///
/// Built during application setup; decisions read it through shared
/// references afterwards. Grant tables stay replaceable through
/// [`PolicyRegistry::grant`].
#[derive(Debug, Default)]
pub struct PolicyRegistry {
    personas: HashMap<String, Arc<PersonaType>>,
    controllers: HashMap<String, Arc<Controller>>,
    routes: HashMap<String, Arc<Controller>>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_persona(&mut self, persona: PersonaType) -> Result<Arc<PersonaType>, TierGuardError> {
        if self.personas.contains_key(persona.name()) {
            return Err(TierGuardError::config(format!(
                "persona {} is already defined",
                persona.name()
            )));
        }
        let persona = Arc::new(persona);
        self.personas
            .insert(persona.name().to_owned(), Arc::clone(&persona));
        Ok(persona)
    }

    pub fn persona(&self, name: &str) -> Option<&Arc<PersonaType>> {
        self.personas.get(name)
    }

    /// Register a controller, optionally inheriting binding and grants from
    /// an already registered parent.
    pub fn register_controller(
        &mut self,
        name: &str,
        parent: Option<&str>,
    ) -> Result<Arc<Controller>, TierGuardError> {
        if name.trim().is_empty() {
            return Err(TierGuardError::config("controller name must not be empty"));
        }
        if self.controllers.contains_key(name) {
            return Err(TierGuardError::config(format!(
                "controller {name} is already registered"
            )));
        }
        let parent = parent.map(|p| self.controller(p).cloned()).transpose()?;
        let controller = Arc::new(Controller::new(name.to_owned(), parent));
        self.controllers
            .insert(name.to_owned(), Arc::clone(&controller));
        Ok(controller)
    }

    pub fn controller(&self, name: &str) -> Result<&Arc<Controller>, TierGuardError> {
        self.controllers
            .get(name)
            .ok_or_else(|| TierGuardError::config(format!("unknown controller {name}")))
    }

    pub fn controllers(&self) -> impl Iterator<Item = &Arc<Controller>> {
        self.controllers.values()
    }

    /// Bind `controller` to the persona type named `persona` and register its
    /// authorization gate as a before-action hook.
    pub fn authorize_persona<H>(
        &self,
        hooks: &mut H,
        controller: &str,
        persona: &str,
        accessor: Option<&str>,
    ) -> Result<(), TierGuardError>
    where
        H: HookRegistry + ?Sized,
    {
        let target = self.controller(controller)?;
        let bound_below = self
            .controllers
            .values()
            .any(|c| c.descends_from(target) && c.binding().is_some());
        if target.binding().is_some() || bound_below {
            return Err(TierGuardError::config("you can only configure authorization once"));
        }
        if !is_type_path(persona) {
            return Err(TierGuardError::config(format!(
                "persona must be a type name such as \"User\", got {persona:?}"
            )));
        }
        let persona_type = self
            .personas
            .get(persona)
            .cloned()
            .ok_or_else(|| TierGuardError::config(format!("{persona} must be an authorized persona")))?;

        target.bind(persona_type, accessor)?;
        hooks.before_action(controller, AuthorizationGate::new(Arc::clone(target)));
        Ok(())
    }

    /// Replace `controller`'s grant table.
    pub fn grant<I, K, V>(&self, controller: &str, entries: I) -> Result<(), TierGuardError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ActionSet>,
    {
        self.controller(controller)?.grant(entries)
    }

    /// Name a route so view code can ask about it, e.g. `post` -> `posts`.
    pub fn add_route(&mut self, route: &str, controller: &str) -> Result<(), TierGuardError> {
        if self.routes.contains_key(route) {
            return Err(TierGuardError::config(format!("route {route} is already registered")));
        }
        let target = Arc::clone(self.controller(controller)?);
        self.routes.insert(route.to_owned(), target);
        Ok(())
    }

    pub fn route(&self, route: &str) -> Option<&Arc<Controller>> {
        self.routes.get(route)
    }
}
