use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use super::capability::Clearance;
use super::grant::{ActionSet, GrantTable};
use crate::error::TierGuardError;
use crate::gate::RequestContext;
use crate::naming::is_identifier;
use crate::persona::{Persona, PersonaType};

/// Persona type and current-principal accessor a controller authorizes against.
#[derive(Debug, Clone)]
pub struct Binding {
    persona: Arc<PersonaType>,
    accessor: String,
}

impl Binding {
    pub fn persona(&self) -> &PersonaType {
        &self.persona
    }

    pub fn accessor(&self) -> &str {
        &self.accessor
    }
}

/// A resource controller's authorization state.
///
/// Binding is write-once. The grant table is copy-on-replace: `grant` swaps in
/// a whole new table, readers hold an `Arc` to whichever table was current when
/// they looked. Both are inherited from the nearest ancestor that has them.
#[derive(Debug)]
pub struct Controller {
    name: String,
    parent: Option<Arc<Controller>>,
    binding: OnceLock<Binding>,
    grants: RwLock<Option<Arc<GrantTable>>>,
}

impl Controller {
    pub(crate) fn new(name: String, parent: Option<Arc<Controller>>) -> Self {
        Self {
            name,
            parent,
            binding: OnceLock::new(),
            grants: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<Controller>> {
        self.parent.as_ref()
    }

    fn ancestry(&self) -> impl Iterator<Item = &Controller> {
        std::iter::successors(Some(self), |c| c.parent.as_deref())
    }

    /// `true` if `other` is a strict ancestor of this controller.
    pub fn descends_from(&self, other: &Controller) -> bool {
        self.ancestry().skip(1).any(|c| std::ptr::eq(c, other))
    }

    /// Effective binding: this controller's own, or the nearest ancestor's.
    pub fn binding(&self) -> Option<&Binding> {
        self.ancestry().find_map(|c| c.binding.get())
    }

    fn require_binding(&self) -> Result<&Binding, TierGuardError> {
        self.binding().ok_or_else(|| {
            TierGuardError::config(format!(
                "you must configure authorization for {}, e.g. `authorize_persona(\"{}\", \"User\", None)`",
                self.name, self.name
            ))
        })
    }

    /// Bind this controller to `persona`. The accessor defaults to
    /// `current_<route key>` when not supplied.
    pub(crate) fn bind(
        &self,
        persona: Arc<PersonaType>,
        accessor: Option<&str>,
    ) -> Result<&Binding, TierGuardError> {
        if self.binding().is_some() {
            return Err(TierGuardError::config("you can only configure authorization once"));
        }
        if let Some(accessor) = accessor.filter(|a| !is_identifier(a)) {
            return Err(TierGuardError::config(format!(
                "current principal accessor must be an identifier, got {accessor:?}"
            )));
        }
        if !persona.is_authorized_persona() {
            return Err(TierGuardError::config(format!(
                "{} must be an authorized persona with tiers defined",
                persona.name()
            )));
        }

        let accessor = accessor.map_or_else(|| persona.default_accessor(), str::to_owned);
        let binding = Binding { persona, accessor };
        self.binding
            .set(binding)
            .map_err(|_| TierGuardError::config("you can only configure authorization once"))?;

        let binding = self.require_binding()?;
        tracing::info!(
            controller = %self.name,
            persona = %binding.persona.name(),
            accessor = %binding.accessor,
            "authorization configured"
        );
        Ok(binding)
    }

    /// Replace this controller's entire grant table.
    ///
    /// Tiers missing from `entries` lose every grant they had before. On
    /// validation failure the previous table stays in place.
    pub fn grant<I, K, V>(&self, entries: I) -> Result<(), TierGuardError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ActionSet>,
    {
        let binding = self.require_binding()?;
        let persona = binding.persona();
        let table = GrantTable::build(persona.tiers()?, persona.name(), entries)?;

        tracing::info!(
            controller = %self.name,
            tiers = %table.tiers().collect::<Vec<_>>().join(","),
            "grant table replaced"
        );
        *self.grants.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(table));
        Ok(())
    }

    /// Effective grant table: this controller's own, or the nearest ancestor's.
    pub fn grants(&self) -> Arc<GrantTable> {
        self.ancestry()
            .find_map(|c| c.grants.read().unwrap_or_else(PoisonError::into_inner).clone())
            .unwrap_or_default()
    }

    /// Least privileged tier sufficient for `action`.
    pub fn authorized_tier(&self, action: &str) -> Result<String, TierGuardError> {
        let tiers = self.require_binding()?.persona().tiers()?;
        self.grants()
            .tier_for(tiers, action)
            .map(str::to_owned)
            .ok_or_else(|| TierGuardError::MissingGrant {
                controller: self.name.clone(),
                action: action.to_owned(),
            })
    }

    /// Decide for an explicit principal and action.
    pub fn authorized(&self, principal: &dyn Persona, action: &str) -> Result<bool, TierGuardError> {
        Ok(self.clearance(principal, action)?.is_some())
    }

    /// Decide for the request's current principal and action. An absent
    /// principal is a denial, not an error.
    pub fn authorized_request<R>(&self, request: &R) -> Result<bool, TierGuardError>
    where
        R: RequestContext + ?Sized,
    {
        Ok(self.request_clearance(request)?.is_some())
    }

    pub(crate) fn clearance(
        &self,
        principal: &dyn Persona,
        action: &str,
    ) -> Result<Option<Clearance>, TierGuardError> {
        let persona = self.require_binding()?.persona();
        if principal.persona_name() != persona.name() {
            return Err(TierGuardError::TypeMismatch {
                value: format!("{principal:?}"),
                expected: persona.name().to_owned(),
            });
        }

        let tier = self.authorized_tier(action)?;
        let allowed = persona.tier_at_or_above(principal, &tier)?;
        tracing::debug!(
            controller = %self.name,
            action,
            required = %tier,
            allowed,
            "authorization decision"
        );
        Ok(allowed.then(|| Clearance::new(&self.name, action, &tier)))
    }

    pub(crate) fn request_clearance<R>(&self, request: &R) -> Result<Option<Clearance>, TierGuardError>
    where
        R: RequestContext + ?Sized,
    {
        let accessor = match self.binding() {
            Some(binding) if is_identifier(binding.accessor()) => binding.accessor(),
            _ => {
                return Err(TierGuardError::config(format!(
                    "you must configure authorization for {} with a valid current principal accessor, \
                     e.g. `authorize_persona(\"{}\", \"User\", Some(\"current_user\"))`",
                    self.name, self.name
                )));
            }
        };

        let action = request.action();
        match request.current_principal(accessor) {
            Some(principal) => self.clearance(principal, action),
            None => {
                tracing::debug!(controller = %self.name, action, accessor, "no current principal");
                Ok(None)
            }
        }
    }
}
