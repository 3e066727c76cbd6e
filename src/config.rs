use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Steam app id of Wallpaper Engine; its workshop items live under this id.
const DEFAULT_WORKSHOP_APP_ID: &str = "431960";
const DEFAULT_PROJECT_FILE: &str = "project.json";
const PLASMA_CONFIG_FILE: &str = "plasma-org.kde.plasma.desktop-appletsrc";

/// Written by `wengine init`; every option commented out.
const EXAMPLE_CONFIG: &str = r##"# wengine configuration
# All options below are commented out - uncomment to override defaults.

#-------------------------------------------------------------------------------
# Paths
#-------------------------------------------------------------------------------

# State document with the wallpaper list, mirrored settings and history.
# state_file: ~/.config/wengine/state.json

# Plasma applets config that holds the Wallpaper Engine plugin settings.
# plasma_config: ~/.config/plasma-org.kde.plasma.desktop-appletsrc

# Steam library root. Default: the SteamLibraryPath read by `wengine pull`.
# steam_library: ~/.local/share/Steam

#-------------------------------------------------------------------------------
# Workshop
#-------------------------------------------------------------------------------

# Steam app id of Wallpaper Engine.
# workshop_app_id: "431960"

# Manifest file inside each wallpaper directory.
# project_file: project.json

#-------------------------------------------------------------------------------
# Behavior
#-------------------------------------------------------------------------------

# Accent color applied when a wallpaper's scheme color is black.
# default_accent: "#3daee9"

# Include wallpapers rated "Mature" in `wengine wallpaper random`.
# show_mature: false
"##;

/// Configuration for wengine, read from ~/.config/wengine/config.yaml
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    /// Where the state document is kept. Default: ~/.config/wengine/state.json
    #[serde(default)]
    pub state_file: Option<PathBuf>,

    /// Plasma applets config holding the plugin settings.
    /// Default: ~/.config/plasma-org.kde.plasma.desktop-appletsrc
    #[serde(default)]
    pub plasma_config: Option<PathBuf>,

    /// Steam library root. When unset, the `SteamLibraryPath` mirrored by
    /// `wengine pull` is used.
    #[serde(default)]
    pub steam_library: Option<PathBuf>,

    /// Workshop app id. Default: 431960
    #[serde(default)]
    pub workshop_app_id: Option<String>,

    /// Manifest file name inside each wallpaper directory. Default: project.json
    #[serde(default)]
    pub project_file: Option<String>,

    /// Accent color used when a wallpaper's scheme color is black, e.g. "#3daee9"
    #[serde(default)]
    pub default_accent: Option<String>,

    /// Include wallpapers rated "Mature" in `wallpaper random` by default.
    #[serde(default)]
    pub show_mature: Option<bool>,
}

/// Expand a leading `~/` against the home directory.
fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = home::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

fn config_dir() -> PathBuf {
    home::home_dir()
        .map(|h| h.join(".config"))
        .unwrap_or_else(|| PathBuf::from(".config"))
}

impl Config {
    pub fn path() -> PathBuf {
        config_dir().join("wengine").join("config.yaml")
    }

    /// Load the config file, or defaults when it does not exist.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from_path(&Self::path()).map(Option::unwrap_or_default)
    }

    fn load_from_path(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        debug!(path = %path.display(), "config:reading file");
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Failed to parse config at {}: {}", path.display(), e))?;
        Ok(Some(config))
    }

    pub fn state_file(&self) -> PathBuf {
        self.state_file
            .as_deref()
            .map(expand_home)
            .unwrap_or_else(|| config_dir().join("wengine").join("state.json"))
    }

    pub fn plasma_config(&self) -> PathBuf {
        self.plasma_config
            .as_deref()
            .map(expand_home)
            .unwrap_or_else(|| config_dir().join(PLASMA_CONFIG_FILE))
    }

    pub fn workshop_app_id(&self) -> &str {
        self.workshop_app_id
            .as_deref()
            .unwrap_or(DEFAULT_WORKSHOP_APP_ID)
    }

    pub fn project_file(&self) -> &str {
        self.project_file.as_deref().unwrap_or(DEFAULT_PROJECT_FILE)
    }

    pub fn show_mature(&self) -> bool {
        self.show_mature.unwrap_or(false)
    }

    /// Directory holding one subdirectory per installed wallpaper.
    ///
    /// `mirrored_library` is the `SteamLibraryPath` from the state document; the
    /// config's `steam_library` takes precedence over it.
    pub fn workshop_dir(&self, mirrored_library: Option<&str>) -> anyhow::Result<PathBuf> {
        let library = self
            .steam_library
            .as_deref()
            .map(expand_home)
            .or_else(|| mirrored_library.map(|s| expand_home(Path::new(s))))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Steam library is unknown. Run 'wengine pull' or set steam_library in {}",
                    Self::path().display()
                )
            })?;
        Ok(library
            .join("steamapps")
            .join("workshop")
            .join("content")
            .join(self.workshop_app_id()))
    }

    /// Write a commented example config to ~/.config/wengine/config.yaml.
    pub fn init() -> anyhow::Result<()> {
        let config_path = Self::path();
        Self::init_at(&config_path)?;
        println!("✓ Created {}", config_path.display());
        Ok(())
    }

    fn init_at(config_path: &Path) -> anyhow::Result<()> {
        if config_path.exists() {
            return Err(anyhow::anyhow!(
                "{} already exists. Remove it first if you want to regenerate it.",
                config_path.display()
            ));
        }

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(config_path, EXAMPLE_CONFIG)?;
        Ok(())
    }
}
