use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use tierguard::{AuthorizationGate, Persona, PolicyConfig, PolicyRegistry};

/// Stand-in principal holding nothing but a tier value.
#[derive(Debug)]
struct Probe {
    persona: String,
    attribute: String,
    tier: String,
}

impl Persona for Probe {
    fn persona_name(&self) -> &str {
        &self.persona
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        (name == self.attribute).then_some(self.tier.as_str())
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os("TIERGUARD_POLICY"))
        .map(PathBuf::from)
        .context("usage: tierguard <policy.toml> (or set TIERGUARD_POLICY)")?;

    let mut hooks: Vec<AuthorizationGate> = Vec::new();
    let registry = PolicyConfig::load(&path)?.build(&mut hooks)?;
    tracing::info!(
        path = %path.display(),
        controllers = registry.controllers().count(),
        gates = hooks.len(),
        "policy loaded"
    );

    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("tierguard> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                editor.add_history_entry(line)?;
                if matches!(line, "quit" | "exit") {
                    break;
                }
                match check(&registry, line) {
                    Ok(verdict) => println!("{verdict}"),
                    Err(e) => println!("error: {e}"),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

/// `<controller> <action> <tier>` -> `allow (requires staff)`.
fn check(registry: &PolicyRegistry, line: &str) -> Result<String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let &[controller, action, tier] = parts.as_slice() else {
        bail!("expected: <controller> <action> <tier>");
    };

    let controller = registry.controller(controller)?;
    let persona = controller
        .binding()
        .with_context(|| format!("controller {} has no persona binding", controller.name()))?
        .persona();
    let required = controller.authorized_tier(action)?;

    let probe = Probe {
        persona: persona.name().to_owned(),
        attribute: persona.tier_attribute().to_owned(),
        tier: tier.to_owned(),
    };
    let verdict = if controller.authorized(&probe, action)? {
        "allow"
    } else {
        "deny"
    };
    Ok(format!("{verdict} (requires {required})"))
}
