use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::enforcement::grant::ActionSet;
use crate::enforcement::registry::PolicyRegistry;
use crate::error::TierGuardError;
use crate::gate::HookRegistry;
use crate::persona::PersonaType;

const MAX_POLICY_FILE_SIZE: u64 = 64 * 1024; // 64 KiB

// --- TOML deserialization structs (private, map 1:1 to TOML schema) ---

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyFile {
    #[serde(default)]
    personas: BTreeMap<String, PersonaConfig>,
    #[serde(default)]
    controllers: BTreeMap<String, ControllerConfig>,
    #[serde(default)]
    routes: BTreeMap<String, String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PersonaConfig {
    tiers: Vec<TierConfig>,
    tier_attribute: Option<String>,
    route_key: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TierConfig {
    name: String,
    description: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ControllerConfig {
    parent: Option<String>,
    persona: Option<String>,
    accessor: Option<String>,
    grants: Option<BTreeMap<String, GrantValue>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GrantValue {
    One(String),
    Many(Vec<String>),
}

impl GrantValue {
    fn into_actions(self) -> ActionSet {
        match self {
            GrantValue::One(action) => ActionSet::from(action),
            GrantValue::Many(actions) => ActionSet::from(actions),
        }
    }
}

/// Parsed policy file: persona tiers, controller bindings and grants, and
/// named routes. Turned into a live [`PolicyRegistry`] by [`PolicyConfig::build`].
pub struct PolicyConfig {
    file: PolicyFile,
}

impl std::fmt::Debug for PolicyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyConfig")
            .field("persona_count", &self.file.personas.len())
            .field("controller_count", &self.file.controllers.len())
            .field("route_count", &self.file.routes.len())
            .finish()
    }
}

impl FromStr for PolicyConfig {
    type Err = TierGuardError;

    /// Parse a policy from a TOML string.
    fn from_str(content: &str) -> Result<Self, TierGuardError> {
        let file: PolicyFile =
            toml::from_str(content).map_err(|e| TierGuardError::PolicyLoad(e.to_string()))?;
        Ok(Self { file })
    }
}

impl PolicyConfig {
    /// Load a policy from a TOML file. Checks file size before reading.
    pub fn load(path: &Path) -> Result<Self, TierGuardError> {
        let metadata = std::fs::metadata(path)
            .map_err(|e| TierGuardError::PolicyLoad(format!("cannot read {}: {e}", path.display())))?;

        if metadata.len() > MAX_POLICY_FILE_SIZE {
            return Err(TierGuardError::PolicyLoad(format!(
                "policy file exceeds {MAX_POLICY_FILE_SIZE} byte limit"
            )));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| TierGuardError::PolicyLoad(format!("cannot read {}: {e}", path.display())))?;

        content.parse()
    }

    /// Build the registry: personas first, then controllers parent-first,
    /// then bindings, then grants, then routes.
    pub fn build<H>(self, hooks: &mut H) -> Result<PolicyRegistry, TierGuardError>
    where
        H: HookRegistry + ?Sized,
    {
        let PolicyFile {
            personas,
            controllers,
            routes,
        } = self.file;
        let mut registry = PolicyRegistry::new();

        for (name, config) in personas {
            registry.define_persona(compile_persona(name, config)?)?;
        }

        // Parent-first registration order. Binding follows it so an ancestor
        // binds before any descendant can.
        let mut registered = Vec::new();
        for name in controllers.keys() {
            register(&mut registry, &controllers, name, &mut registered, &mut Vec::new())?;
        }

        for name in &registered {
            let Some(config) = controllers.get(name) else {
                continue;
            };
            if let Some(persona) = &config.persona {
                registry.authorize_persona(hooks, name, persona, config.accessor.as_deref())?;
            } else if config.accessor.is_some() {
                return Err(TierGuardError::PolicyValidation(format!(
                    "controller '{name}': accessor requires persona"
                )));
            }
        }

        for (name, config) in controllers {
            if let Some(grants) = config.grants {
                registry.grant(&name, grants.into_iter().map(|(tier, v)| (tier, v.into_actions())))?;
            }
        }

        for (route, controller) in routes {
            registry.add_route(&route, &controller)?;
        }

        Ok(registry)
    }
}

fn compile_persona(name: String, config: PersonaConfig) -> Result<PersonaType, TierGuardError> {
    let mut persona = PersonaType::new(name)?;
    if let Some(attribute) = config.tier_attribute {
        persona.set_tier_attribute(attribute)?;
    }
    if let Some(key) = config.route_key {
        persona.set_route_key(key)?;
    }
    persona.define_tiers(config.tiers.into_iter().map(|t| (t.name, t.description)))?;
    Ok(persona)
}

/// Register `name` after its ancestors. `path` tracks the chain being
/// resolved so that a parent cycle is reported instead of recursing forever.
fn register(
    registry: &mut PolicyRegistry,
    controllers: &BTreeMap<String, ControllerConfig>,
    name: &str,
    registered: &mut Vec<String>,
    path: &mut Vec<String>,
) -> Result<(), TierGuardError> {
    if registered.iter().any(|r| r == name) {
        return Ok(());
    }
    if path.iter().any(|p| p == name) {
        path.push(name.to_owned());
        return Err(TierGuardError::PolicyValidation(format!(
            "controller parent cycle: {}",
            path.join(" -> ")
        )));
    }

    let config = controllers.get(name).ok_or_else(|| {
        TierGuardError::PolicyValidation(format!(
            "controller '{}' has unknown parent '{name}'",
            path.last().map_or("", String::as_str)
        ))
    })?;

    path.push(name.to_owned());
    if let Some(parent) = &config.parent {
        register(registry, controllers, parent, registered, path)?;
    }
    path.pop();

    registry.register_controller(name, config.parent.as_deref())?;
    registered.push(name.to_owned());
    Ok(())
}
