//! Mirror of the Wallpaper Engine plugin settings stored in the plasma config.
//!
//! The plasma applets config is an INI-like file. The plugin's settings live
//! in one section introduced by a header line and terminated by a blank line:
//!
//! ```text
//! [Containments][1][Wallpaper][com.github.casout.wallpaperEngineKde][General]
//! Fps=30
//! WallpaperWorkShopId=1234567
//!
//! ```
//!
//! Reading is a two-phase scan: locate the header once, then walk forward from
//! it applying one matcher per setting until the blank line.

use std::cell::Cell;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::shell::Shell;

struct SettingSpec {
    name: &'static str,
    /// Group 1 captures the value.
    pattern: &'static str,
    validate: fn(&str) -> bool,
}

fn int_in(value: &str, min: i64, max: i64) -> bool {
    value
        .trim()
        .parse::<i64>()
        .is_ok_and(|n| (min..=max).contains(&n))
}

static CATALOG: [SettingSpec; 8] = [
    SettingSpec {
        name: "DisplayMode",
        pattern: r"^DisplayMode=(\d+)",
        validate: |v| int_in(v, 0, 19),
    },
    SettingSpec {
        name: "Fps",
        pattern: r"^Fps=(\d+)",
        validate: |v| int_in(v, 1, 60),
    },
    SettingSpec {
        name: "MuteAudio",
        pattern: r"^MuteAudio=(\w+)",
        validate: |v| matches!(v, "false" | "true"),
    },
    SettingSpec {
        name: "SortMode",
        pattern: r"^SortMode=(\d)",
        validate: |v| matches!(v, "1" | "2" | "3"),
    },
    SettingSpec {
        name: "SteamLibraryPath",
        pattern: r"^SteamLibraryPath(?:\[[^\]]*\])?=file://(.+)",
        validate: |_| true,
    },
    SettingSpec {
        name: "Volume",
        pattern: r"^Volume=(\d+)",
        validate: |v| int_in(v, 0, 100),
    },
    SettingSpec {
        name: "WallpaperSource",
        pattern: r"^WallpaperSource(?:\[[^\]]*\])?=(file://.+)",
        validate: |_| true,
    },
    SettingSpec {
        name: "WallpaperWorkShopId",
        pattern: r"^WallpaperWorkShopId=(\d+)",
        validate: |v| v.trim().parse::<i64>().is_ok(),
    },
];

/// Setting names in catalog order.
pub const SETTING_NAMES: [&str; 8] = [
    "DisplayMode",
    "Fps",
    "MuteAudio",
    "SortMode",
    "SteamLibraryPath",
    "Volume",
    "WallpaperSource",
    "WallpaperWorkShopId",
];

pub const WORKSHOP_ID: &str = "WallpaperWorkShopId";
pub const WALLPAPER_SOURCE: &str = "WallpaperSource";
pub const STEAM_LIBRARY_PATH: &str = "SteamLibraryPath";

static SECTION_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[.+\]\[Wallpaper\]\[com\.github\.casout\.wallpaperEngineKde\]\[General\]")
        .unwrap()
});

static MATCHERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    CATALOG
        .iter()
        .map(|spec| Regex::new(spec.pattern).unwrap())
        .collect()
});

fn catalog_index(name: &str) -> Option<usize> {
    CATALOG.iter().position(|spec| spec.name == name)
}

pub fn setting_names() -> &'static [&'static str] {
    &SETTING_NAMES
}

pub fn is_setting(name: &str) -> bool {
    catalog_index(name).is_some()
}

/// Check a value against the setting's validator. Unknown names never validate.
pub fn validate(name: &str, value: &str) -> bool {
    catalog_index(name).is_some_and(|i| (CATALOG[i].validate)(value))
}

/// Zero-based index of the first section header line, if any.
pub fn locate_section<R: BufRead>(reader: R) -> std::io::Result<Option<usize>> {
    for (i, line) in reader.lines().enumerate() {
        if SECTION_HEADER_RE.is_match(&line?) {
            return Ok(Some(i));
        }
    }
    Ok(None)
}

/// Collect `(name, value)` pairs from `start` up to the first blank line.
///
/// With `only`, just that catalog entry is tested; the window is the same.
pub fn scan_section<R: BufRead>(
    reader: R,
    start: usize,
    only: Option<&str>,
) -> Result<Vec<(String, String)>> {
    let indices: Vec<usize> = match only {
        Some(name) => {
            let i = catalog_index(name)
                .ok_or_else(|| EngineError::UnknownSetting(name.to_string()))?;
            vec![i]
        }
        None => (0..CATALOG.len()).collect(),
    };

    let mut found = Vec::new();
    for line in reader.lines().skip(start) {
        let line = line?;
        for &i in &indices {
            if let Some(caps) = MATCHERS[i].captures(&line) {
                found.push((CATALOG[i].name.to_string(), caps[1].to_string()));
            }
        }
        if line.trim().is_empty() {
            break;
        }
    }
    Ok(found)
}

/// Reads plugin settings from the plasma config and pushes new values to the shell.
pub struct SettingsMirror<'a> {
    config_path: PathBuf,
    shell: &'a dyn Shell,
    start_line: Cell<Option<usize>>,
}

impl<'a> SettingsMirror<'a> {
    pub fn new(config_path: impl Into<PathBuf>, shell: &'a dyn Shell) -> Self {
        Self {
            config_path: config_path.into(),
            shell,
            start_line: Cell::new(None),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Validate and push a setting to the shell.
    pub fn setup(&self, name: &str, value: &str) -> Result<()> {
        debug!(name, value, "settings:setup");
        if !is_setting(name) {
            return Err(EngineError::UnknownSetting(name.to_string()));
        }
        if !validate(name, value) {
            return Err(EngineError::InvalidValue {
                name: name.to_string(),
                value: value.to_string(),
            });
        }
        self.shell
            .write_config(name, value)
            .map_err(|e| EngineError::Shell(format!("{e:#}")))
    }

    /// Line where the plugin section starts. Looked up once per mirror.
    fn section_start(&self) -> Result<usize> {
        if let Some(line) = self.start_line.get() {
            return Ok(line);
        }
        let file = File::open(&self.config_path)?;
        let line = locate_section(BufReader::new(file))?
            .ok_or_else(|| EngineError::SectionNotFound(self.config_path.clone()))?;
        debug!(line, "settings:section located");
        self.start_line.set(Some(line));
        Ok(line)
    }

    /// Current values from the plasma config, all settings or just `name`.
    pub fn read(&self, name: Option<&str>) -> Result<Vec<(String, String)>> {
        if let Some(name) = name
            && !is_setting(name)
        {
            return Err(EngineError::UnknownSetting(name.to_string()));
        }
        let start = self.section_start()?;
        let file = File::open(&self.config_path)?;
        let found = scan_section(BufReader::new(file), start, name)?;
        debug!(?name, count = found.len(), "settings:read");
        Ok(found)
    }

    pub fn read_one(&self, name: &str) -> Result<Option<String>> {
        Ok(self.read(Some(name))?.into_iter().next().map(|(_, v)| v))
    }
}
