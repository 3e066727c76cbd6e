use anyhow::{Context as _, Result};
use serde_json::Value;
use tracing::debug;

use super::Context;
use crate::settings::SettingsMirror;
use crate::shell::PlasmaShell;

/// Copy the plugin settings from the plasma config into the state file.
pub fn run() -> Result<()> {
    let ctx = Context::load()?;
    let shell = PlasmaShell;
    let mirror = SettingsMirror::new(ctx.config.plasma_config(), &shell);

    let count = pull(&ctx, &mirror)?;
    println!("Pulled {} settings from {}", count, mirror.config_path().display());
    Ok(())
}

fn pull(ctx: &Context, mirror: &SettingsMirror<'_>) -> Result<usize> {
    let found = mirror
        .read(None)
        .context("Failed to read Wallpaper Engine settings")?;
    let count = found.len();

    ctx.store.update(|doc| {
        for (name, value) in found {
            debug!(name = %name, value = %value, "pull:setting");
            doc.put(name, Value::String(value));
        }
        Ok(())
    })?;
    Ok(count)
}
