//! Wallpaper resolution, random selection and application.

pub mod apply;
pub mod resolve;
pub mod scan;
pub mod select;

pub use apply::{Applier, source_uri};
pub use resolve::resolve;
pub use scan::{ScanReport, scan_workshop};
pub use select::{Filters, Picked, select_random};

use crate::error::{EngineError, Result};
use crate::state::{Document, WallpaperRecord};

/// Convert a manifest scheme color ("r g b" floats in 0..1) to `#rrggbb`.
pub fn accent_hex(record: &WallpaperRecord) -> Option<String> {
    let rgb = parse_scheme_color(record.scheme_color()?)?;
    Some(format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2]))
}

/// True when the scheme color is pure black, which wallpapers use as "unset".
pub fn accent_is_black(record: &WallpaperRecord) -> bool {
    record
        .scheme_color()
        .and_then(parse_scheme_color)
        .is_some_and(|rgb| rgb == [0, 0, 0])
}

fn parse_scheme_color(value: &str) -> Option<[u8; 3]> {
    let parts: Vec<f64> = value
        .split_whitespace()
        .map(|v| v.parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    if parts.len() != 3 {
        return None;
    }
    let channel = |v: f64| (v * 255.0).clamp(0.0, 255.0) as u8;
    Some([channel(parts[0]), channel(parts[1]), channel(parts[2])])
}

/// Resolve `token` against the catalog and apply it.
pub fn setup(
    doc: &mut Document,
    applier: &Applier<'_>,
    token: &str,
    fuzzy: bool,
) -> Result<Picked> {
    let catalog = doc.wallpapers()?;
    let id = resolve(token, &catalog, fuzzy)?;
    let title = catalog
        .get(&id)
        .map(|r| r.title().to_string())
        .ok_or_else(|| EngineError::BadNameOrId(token.to_string()))?;
    applier.apply(doc, &id, false)?;
    Ok(Picked { id, title })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsMirror;
    use crate::shell::testing::RecordingShell;
    use serde_json::{Value, json};

    fn record(value: Value) -> WallpaperRecord {
        match value {
            Value::Object(map) => WallpaperRecord::new(map),
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_accent_hex() {
        let rec = record(json!({"general": {"properties": {"schemecolor": {"value": "1 0.5 0"}}}}));
        assert_eq!(accent_hex(&rec), Some("#ff7f00".to_string()));
        assert!(!accent_is_black(&rec));
    }

    #[test]
    fn test_accent_black_and_missing() {
        let black = record(json!({"general": {"properties": {"schemecolor": {"value": "0 0 0"}}}}));
        assert_eq!(accent_hex(&black), Some("#000000".to_string()));
        assert!(accent_is_black(&black));

        let none = record(json!({"title": "plain"}));
        assert_eq!(accent_hex(&none), None);
        assert!(!accent_is_black(&none));
    }

    #[test]
    fn test_setup_by_title() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("1")).unwrap();
        let shell = RecordingShell::default();
        let mirror = SettingsMirror::new("/nonexistent", &shell);
        let applier = Applier::new(tmp.path(), &mirror);

        let mut doc = Document::template();
        doc.put("1", json!({"title": "Beach Sunset Loop", "type": "video", "file": "b.mp4"}));
        doc.put("2", json!({"title": "City Nights", "type": "video", "file": "c.mp4"}));

        let picked = setup(&mut doc, &applier, "Beach Sunset", true).unwrap();
        assert_eq!(picked.id, "1");
        assert_eq!(doc.last_id(), Some("1"));
    }

    #[test]
    fn test_setup_missing_directory_is_dangling() {
        let tmp = tempfile::tempdir().unwrap();
        let shell = RecordingShell::default();
        let mirror = SettingsMirror::new("/nonexistent", &shell);
        let applier = Applier::new(tmp.path(), &mirror);

        let mut doc = Document::template();
        doc.put("2", json!({"title": "City Nights", "type": "video", "file": "c.mp4"}));
        let err = setup(&mut doc, &applier, "2", true).unwrap_err();
        assert!(matches!(err, EngineError::DanglingReference { .. }));
        assert!(doc.record("2").is_some());
    }
}
