use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::settings::{SettingsMirror, WALLPAPER_SOURCE, WORKSHOP_ID};
use crate::state::{Document, WallpaperRecord};

/// Value the plugin expects for `WallpaperSource`.
///
/// Built by concatenation: URI encoders escape non-ASCII file names, which
/// the plugin then fails to open.
pub fn source_uri(asset: &Path) -> String {
    format!("file://{}", asset.display())
}

/// Writes a resolved wallpaper to the shell and records it in the history.
pub struct Applier<'a> {
    workshop_dir: PathBuf,
    mirror: &'a SettingsMirror<'a>,
}

impl<'a> Applier<'a> {
    pub fn new(workshop_dir: impl Into<PathBuf>, mirror: &'a SettingsMirror<'a>) -> Self {
        Self {
            workshop_dir: workshop_dir.into(),
            mirror,
        }
    }

    pub fn wallpaper_dir(&self, id: &str) -> PathBuf {
        self.workshop_dir.join(id)
    }

    /// `<workshop>/<id>/<file>+<type>`, the form the plugin reads.
    pub fn asset_path(&self, id: &str, record: &WallpaperRecord) -> PathBuf {
        let tail = format!("{}+{}", record.file(), record.kind_str());
        self.wallpaper_dir(id).join(tail)
    }

    /// Apply the wallpaper `id`, which must already be resolved.
    ///
    /// If its directory is gone and `silent_delete` is set, the record is
    /// removed from `doc` and `StaleReference` is returned so the caller can
    /// pick another one.
    pub fn apply(&self, doc: &mut Document, id: &str, silent_delete: bool) -> Result<()> {
        debug!(id, silent_delete, "apply:start");
        let record = doc
            .record(id)
            .ok_or_else(|| EngineError::BadNameOrId(id.to_string()))?;

        let asset = self.asset_path(id, &record);
        if !self.wallpaper_dir(id).exists() {
            if silent_delete {
                warn!(id, path = %asset.display(), "apply:directory missing, pruning record");
                doc.remove(id)?;
                return Err(EngineError::StaleReference(id.to_string()));
            }
            return Err(EngineError::DanglingReference {
                id: id.to_string(),
                path: asset,
            });
        }

        self.mirror.setup(WORKSHOP_ID, id)?;
        self.mirror.setup(WALLPAPER_SOURCE, &source_uri(&asset))?;
        doc.push_history(id);
        info!(id, title = record.title(), "apply:done");
        Ok(())
    }
}
