use anyhow::{Context as _, Result, anyhow};
use console::style;

use super::Context;
use crate::spinner;
use crate::wallpaper::scan_workshop;

/// Rebuild the wallpaper list from the workshop directory.
pub fn run() -> Result<()> {
    let ctx = Context::load()?;
    let doc = ctx.store.load()?;
    let workshop_dir = ctx.workshop_dir(&doc)?;
    if !workshop_dir.is_dir() {
        return Err(anyhow!(
            "Workshop directory not found: {}",
            workshop_dir.display()
        ));
    }

    let project_file = ctx.config.project_file();
    let report = spinner::with_spinner("Scanning workshop wallpapers", || {
        ctx.store
            .update(|doc| scan_workshop(doc, &workshop_dir, project_file))
            .with_context(|| format!("Failed to scan {}", workshop_dir.display()))
    })?;

    println!(
        "{} added, {} updated, {} skipped",
        style(report.added).green(),
        report.updated,
        report.skipped
    );
    Ok(())
}
