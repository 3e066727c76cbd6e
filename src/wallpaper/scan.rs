use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::state::{Document, is_wallpaper_id};

/// Outcome of a workshop directory scan.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Read one manifest per wallpaper directory into `doc`.
///
/// Only directories named by a numeric workshop id are considered. A user's
/// `freq` on an existing record is kept across rescans.
pub fn scan_workshop(
    doc: &mut Document,
    workshop_dir: &Path,
    project_file: &str,
) -> Result<ScanReport> {
    debug!(dir = %workshop_dir.display(), project_file, "scan:start");
    let mut report = ScanReport::default();

    let mut entries: Vec<_> = fs::read_dir(workshop_dir)?.collect::<std::io::Result<_>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let name = entry.file_name().to_string_lossy().to_string();
        if !entry.path().is_dir() || !is_wallpaper_id(&name) {
            continue;
        }
        let manifest = entry.path().join(project_file);
        if !manifest.is_file() {
            debug!(id = %name, "scan:no manifest");
            report.skipped += 1;
            continue;
        }

        let mut data = match fs::read_to_string(&manifest)
            .map_err(|e| e.to_string())
            .and_then(|s| serde_json::from_str::<Value>(&s).map_err(|e| e.to_string()))
        {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                warn!(path = %manifest.display(), "scan:manifest is not an object");
                report.skipped += 1;
                continue;
            }
            Err(error) => {
                warn!(path = %manifest.display(), %error, "scan:unreadable manifest");
                report.skipped += 1;
                continue;
            }
        };

        match doc.record(&name) {
            Some(existing) => {
                if let Some(freq) = existing.raw().get("freq") {
                    data.insert("freq".into(), freq.clone());
                }
                report.updated += 1;
            }
            None => report.added += 1,
        }
        doc.put(name, Value::Object(data));
    }

    debug!(?report, "scan:done");
    Ok(report)
}
