use anyhow::{Context as _, Result};
use tracing::{info, warn};

use super::Context;
use crate::settings::{self, STEAM_LIBRARY_PATH, SettingsMirror};
use crate::shell::PlasmaShell;
use crate::state::Document;

/// Settings restored by `undo`, in push order.
///
/// The steam library is left alone since it is not part of what a wallpaper
/// change touches.
pub fn undoable_settings() -> impl Iterator<Item = &'static str> {
    settings::setting_names()
        .iter()
        .copied()
        .filter(|name| *name != STEAM_LIBRARY_PATH)
}

/// Push the settings last pulled into the state file back to the shell.
pub fn run() -> Result<()> {
    let ctx = Context::load()?;
    let shell = PlasmaShell;
    let mirror = SettingsMirror::new(ctx.config.plasma_config(), &shell);
    let doc = ctx.store.load()?;

    let restored = restore(&doc, &mirror)?;
    println!("Restored {} settings", restored);
    Ok(())
}

fn restore(doc: &Document, mirror: &SettingsMirror<'_>) -> Result<usize> {
    let mut restored = 0;
    for name in undoable_settings() {
        let Ok(value) = doc.get_string(name) else {
            warn!(name, "undo:setting not in state file, skipping");
            continue;
        };
        mirror
            .setup(name, &value)
            .with_context(|| format!("Failed to restore {}", name))?;
        info!(name, value = %value, "undo:restored");
        restored += 1;
    }
    Ok(restored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::testing::RecordingShell;
    use serde_json::json;

    #[test]
    fn undoable_settings_skip_library_path() {
        let names: Vec<&str> = undoable_settings().collect();
        assert_eq!(names.len(), 7);
        assert!(!names.contains(&"SteamLibraryPath"));
    }

    #[test]
    fn restore_pushes_stored_values() {
        let shell = RecordingShell::default();
        let mirror = SettingsMirror::new("/nonexistent", &shell);
        let mut doc = Document::template();
        doc.put("Fps", json!("24"));
        doc.put("MuteAudio", json!("true"));
        doc.put("WallpaperWorkShopId", json!("1234"));

        assert_eq!(restore(&doc, &mirror).unwrap(), 3);
        let writes = shell.writes.borrow();
        assert_eq!(
            *writes,
            vec![
                ("Fps".to_string(), "24".to_string()),
                ("MuteAudio".to_string(), "true".to_string()),
                ("WallpaperWorkShopId".to_string(), "1234".to_string()),
            ]
        );
    }

    #[test]
    fn restore_stops_on_invalid_value() {
        let shell = RecordingShell::default();
        let mirror = SettingsMirror::new("/nonexistent", &shell);
        let mut doc = Document::template();
        doc.put("Fps", json!(500));

        assert!(restore(&doc, &mirror).is_err());
        assert!(shell.writes.borrow().is_empty());
    }
}
