use std::path::PathBuf;

/// Failures raised by the state store, settings mirror and wallpaper pipeline.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Bad name or id: \"{0}\"")]
    BadNameOrId(String),

    #[error("Could not find wallpapers matching filters: {0}")]
    NoMatch(String),

    #[error("Wallpaper {id} is missing on disk: {}", path.display())]
    DanglingReference { id: String, path: PathBuf },

    /// Internal signal: the record was pruned because its directory is gone.
    #[error("Wallpaper {0} no longer exists and was removed from the list")]
    StaleReference(String),

    #[error("Unknown setting \"{0}\"")]
    UnknownSetting(String),

    #[error("Invalid value ({value}) for setting \"{name}\"")]
    InvalidValue { name: String, value: String },

    #[error("Wallpaper Engine settings are not found in {}", .0.display())]
    SectionNotFound(PathBuf),

    #[error("No wallpapers in the list. Run 'wengine update-list' first.")]
    EmptyCatalog,

    #[error("Key \"{0}\" does not exist in the state file")]
    UnknownKey(String),

    #[error("State file not found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("Shell command failed: {0}")]
    Shell(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
