pub mod pull;
pub mod settings;
pub mod undo;
pub mod update_list;
pub mod wallpaper;

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::Config;
use crate::settings::{SettingsMirror, WORKSHOP_ID};
use crate::state::{Document, StateStore};

/// Config and state shared by every command.
pub struct Context {
    pub config: Config,
    pub store: StateStore,
}

impl Context {
    /// Load the config and make sure a state document exists.
    pub fn load() -> Result<Self> {
        Self::with_config(Config::load()?)
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let store = StateStore::new(config.state_file());
        if store
            .init_if_missing()
            .with_context(|| format!("Failed to create {}", store.path().display()))?
        {
            println!("Created a new state file at {}", store.path().display());
            info!(path = %store.path().display(), "context:new state file");
        }
        Ok(Self { config, store })
    }

    pub fn workshop_dir(&self, doc: &Document) -> Result<PathBuf> {
        self.config.workshop_dir(doc.steam_library())
    }
}

/// Id of the wallpaper currently shown.
///
/// Read from the plasma config; `last_id` is used when the plasma config has
/// no plugin section or no id.
pub fn current_id(mirror: &SettingsMirror<'_>, doc: &Document) -> Result<String> {
    match mirror.read_one(WORKSHOP_ID) {
        Ok(Some(id)) => return Ok(id),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "current wallpaper id not readable from plasma config"),
    }
    doc.last_id()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("No wallpaper has been applied yet"))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Context;
    use crate::config::Config;
    use std::path::Path;

    /// Context with the state file, plasma config and steam library under `dir`.
    pub fn context(dir: &Path) -> Context {
        let config = Config {
            state_file: Some(dir.join("state.json")),
            plasma_config: Some(dir.join("plasma-org.kde.plasma.desktop-appletsrc")),
            steam_library: Some(dir.join("steam")),
            ..Default::default()
        };
        Context::with_config(config).unwrap()
    }

    pub const PLASMA_CONFIG: &str = "\
[Containments][1][Wallpaper][com.github.casout.wallpaperEngineKde][General]
Fps=24
SteamLibraryPath=file:///games/steam
Volume=80
WallpaperWorkShopId=222

";

    pub fn write_plasma_config(ctx: &Context, contents: &str) {
        std::fs::write(ctx.config.plasma_config(), contents).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{PLASMA_CONFIG, context, write_plasma_config};
    use super::*;
    use crate::shell::testing::RecordingShell;
    use serde_json::json;

    #[test]
    fn test_with_config_creates_state_file() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path());
        assert!(ctx.store.path().exists());
        assert_eq!(ctx.store.load().unwrap(), Document::template());
    }

    #[test]
    fn test_current_id_prefers_plasma_config() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path());
        write_plasma_config(&ctx, PLASMA_CONFIG);
        let shell = RecordingShell::default();
        let mirror = SettingsMirror::new(ctx.config.plasma_config(), &shell);

        let mut doc = Document::template();
        doc.push_history("111");
        assert_eq!(current_id(&mirror, &doc).unwrap(), "222");
    }

    #[test]
    fn test_current_id_falls_back_to_last_id() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path());
        let shell = RecordingShell::default();
        let mirror = SettingsMirror::new(ctx.config.plasma_config(), &shell);
        let mut doc = Document::template();

        // no plasma config at all
        assert!(current_id(&mirror, &doc).is_err());
        doc.push_history("111");
        assert_eq!(current_id(&mirror, &doc).unwrap(), "111");

        // section present but without an id
        write_plasma_config(
            &ctx,
            "[Containments][1][Wallpaper][com.github.casout.wallpaperEngineKde][General]\nFps=24\n\n",
        );
        let mirror = SettingsMirror::new(ctx.config.plasma_config(), &shell);
        assert_eq!(current_id(&mirror, &doc).unwrap(), "111");
    }

    #[test]
    fn test_workshop_dir_needs_pulled_library() {
        let tmp = tempfile::tempdir().unwrap();
        let mut ctx = context(tmp.path());
        ctx.config.steam_library = None;

        let mut doc = Document::template();
        let err = ctx.workshop_dir(&doc).unwrap_err();
        assert!(err.to_string().contains("Steam library is unknown"));

        doc.put("SteamLibraryPath", json!("/games/steam"));
        assert_eq!(
            ctx.workshop_dir(&doc).unwrap(),
            PathBuf::from("/games/steam/steamapps/workshop/content/431960")
        );
    }
}
