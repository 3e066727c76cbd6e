use anyhow::{Result, anyhow};
use clap::Subcommand;
use console::style;
use serde_json::Value;

use super::Context;
use crate::settings::{self, SettingsMirror};
use crate::shell::{PlasmaShell, Shell};

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Validate a setting and apply it live
    Setup {
        /// Setting name, e.g. Fps
        name: String,
        /// New value
        value: String,
    },

    /// Print a setting's current value
    Get {
        /// Setting name
        name: String,
    },
}

pub fn run(command: SettingsCommand) -> Result<()> {
    let ctx = Context::load()?;
    execute(&ctx, &PlasmaShell, command)
}

fn execute(ctx: &Context, shell: &dyn Shell, command: SettingsCommand) -> Result<()> {
    let mirror = SettingsMirror::new(ctx.config.plasma_config(), shell);

    match command {
        SettingsCommand::Setup { name, value } => {
            mirror.setup(&name, &value)?;
            println!("{} {}={}", style("✓").green(), name, value);
            Ok(())
        }
        SettingsCommand::Get { name } => {
            println!("{}", get(ctx, &mirror, &name)?);
            Ok(())
        }
    }
}

/// Catalog settings come from the plasma config, anything else from the state file.
fn get(ctx: &Context, mirror: &SettingsMirror<'_>, name: &str) -> Result<String> {
    if settings::is_setting(name) {
        return mirror.read_one(name)?.ok_or_else(|| {
            anyhow!(
                "{} is not set in {}",
                name,
                mirror.config_path().display()
            )
        });
    }
    Ok(match ctx.store.get(name)? {
        Value::String(s) => s,
        other => other.to_string(),
    })
}
