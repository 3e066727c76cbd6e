use std::fmt;

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use tracing::{debug, info};

use super::apply::Applier;
use crate::error::{EngineError, Result};
use crate::state::{Attr, ContentRating, Document, WallpaperRecord, WallpaperType};

/// Weight multiplier for ids still in the history ring.
pub const RECENT_PENALTY: f64 = 0.1;

/// Candidate filters: a record passes if it satisfies every non-empty one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    kinds: Vec<WallpaperType>,
    ratings: Vec<ContentRating>,
    rules: Vec<(String, Vec<String>)>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kinds(mut self, kinds: Vec<WallpaperType>) -> Self {
        self.kinds = kinds;
        self
    }

    pub fn with_ratings(mut self, ratings: Vec<ContentRating>) -> Self {
        self.ratings = ratings;
        self
    }

    /// Allow only records whose `attribute` (first element for lists) is in `allowed`.
    pub fn with(mut self, attribute: &str, allowed: Vec<String>) -> Self {
        self.rules.push((attribute.to_string(), allowed));
        self
    }

    pub fn matches(&self, record: &WallpaperRecord) -> bool {
        let kind_ok = self.kinds.is_empty()
            || record.kind().is_some_and(|kind| self.kinds.contains(&kind));
        let rating_ok = self.ratings.is_empty() || self.ratings.contains(&record.content_rating());

        kind_ok
            && rating_ok
            && self.rules.iter().all(|(attribute, allowed)| {
                let value = Attr::filter_key(record.attr(attribute).as_ref());
                allowed.contains(&value)
            })
    }
}

impl fmt::Display for Filters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.kinds.is_empty() {
            let kinds: Vec<String> = self.kinds.iter().map(ToString::to_string).collect();
            parts.push(format!("type={}", kinds.join(",")));
        }
        if !self.ratings.is_empty() {
            let ratings: Vec<&str> = self.ratings.iter().map(|r| r.as_str()).collect();
            parts.push(format!("contentrating={}", ratings.join(",")));
        }
        for (attribute, allowed) in &self.rules {
            parts.push(format!("{}={}", attribute, allowed.join(",")));
        }
        if parts.is_empty() {
            return f.write_str("(none)");
        }
        f.write_str(&parts.join(" "))
    }
}

/// The wallpaper chosen by [`select_random`].
#[derive(Debug, Clone, PartialEq)]
pub struct Picked {
    pub id: String,
    pub title: String,
}

/// Candidate ids and their sampling weights.
pub fn weighted_candidates(doc: &Document, filters: &Filters) -> Result<Vec<(String, f64)>> {
    let catalog = match doc.wallpapers() {
        Ok(catalog) => catalog,
        Err(EngineError::EmptyCatalog) => return Err(EngineError::NoMatch(filters.to_string())),
        Err(e) => return Err(e),
    };
    let history = doc.history();

    Ok(catalog
        .iter()
        .filter(|(_, record)| filters.matches(record))
        .map(|(id, record)| {
            let mut weight = record.freq();
            if history.iter().any(|h| h == id) {
                weight *= RECENT_PENALTY;
            }
            (id.to_string(), weight)
        })
        .collect())
}

/// Index drawn with probability proportional to its weight.
///
/// Negative and non-finite weights count as zero. When no weight is positive
/// the draw is uniform.
pub fn weighted_index<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }
    let usable = weights
        .iter()
        .map(|&w| if w.is_finite() && w > 0.0 { w } else { 0.0 });
    match WeightedIndex::<f64>::new(usable) {
        Ok(dist) => Some(dist.sample(rng)),
        Err(error) => {
            debug!(%error, "select:no usable weights, drawing uniformly");
            Some(rng.random_range(0..weights.len()))
        }
    }
}

/// Pick a random wallpaper matching `filters` and apply it.
///
/// Records whose directory has disappeared are pruned from `doc` and the draw
/// is repeated with the remaining candidates. Each retry removes one record, so
/// the loop ends after at most one pass over the catalog.
pub fn select_random<R: Rng + ?Sized>(
    doc: &mut Document,
    filters: &Filters,
    applier: &Applier<'_>,
    rng: &mut R,
) -> Result<Picked> {
    debug!(%filters, "select:start");
    let max_attempts = doc.wallpapers().map(|c| c.len()).unwrap_or(0) + 1;

    for attempt in 0..max_attempts {
        let candidates = weighted_candidates(doc, filters)?;
        let weights: Vec<f64> = candidates.iter().map(|(_, w)| *w).collect();
        let Some(index) = weighted_index(&weights, rng) else {
            return Err(EngineError::NoMatch(filters.to_string()));
        };
        let id = candidates[index].0.clone();
        debug!(attempt, id = %id, candidates = candidates.len(), "select:drawn");

        let title = doc
            .record(&id)
            .map(|r| r.title().to_string())
            .unwrap_or_default();
        match applier.apply(doc, &id, true) {
            Ok(()) => {
                info!(id = %id, title = %title, "select:applied");
                return Ok(Picked { id, title });
            }
            Err(EngineError::StaleReference(stale)) => {
                info!(id = %stale, "select:stale entry removed, drawing again");
            }
            Err(e) => return Err(e),
        }
    }

    Err(EngineError::NoMatch(filters.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsMirror;
    use crate::shell::testing::RecordingShell;
    use crate::state::StateStore;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::{Value, json};

    /// Every draw lands on the lowest value, so the first positive weight wins.
    struct ZeroRng;

    impl rand::RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(0);
        }
    }

    fn seeded(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => Document::from_map(map),
            _ => panic!("not an object"),
        }
    }

    fn record(value: Value) -> WallpaperRecord {
        match value {
            Value::Object(map) => WallpaperRecord::new(map),
            _ => panic!("not an object"),
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn library() -> Value {
        json!({
            "1": {"title": "Forest", "type": "scene", "contentrating": "Everyone", "tags": ["Nature"], "file": "scene.json"},
            "2": {"title": "Neon", "type": "video", "contentrating": "Mature", "tags": ["Anime", "Nature"], "file": "neon.mp4"},
            "3": {"title": "Clock", "type": "web", "file": "index.html"},
            "prev_ids": ["", "", "", ""],
            "last_id": ""
        })
    }

    #[test]
    fn test_filters_match_first_element_and_unspecified() {
        let d = doc(library());
        let filters = Filters::new()
            .with_ratings(vec![ContentRating::Everyone, ContentRating::Unspecified])
            .with("tags", strings(&["Nature"]));
        let ids: Vec<String> = weighted_candidates(&d, &filters)
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        // "3" has no tags, so its tag key is "Unspecified".
        assert_eq!(ids, vec!["1"]);
    }

    #[test]
    fn test_kind_filter_uses_typed_value() {
        let filters = Filters::new().with_kinds(vec![WallpaperType::Video]);
        assert!(filters.matches(&record(json!({"type": "Video"}))));
        assert!(filters.matches(&record(json!({"type": ["video", "scene"]}))));
        assert!(!filters.matches(&record(json!({"type": "scene"}))));
        assert!(!filters.matches(&record(json!({"type": "gif"}))));
        assert!(!filters.matches(&record(json!({}))));
    }

    #[test]
    fn test_rating_filter_treats_missing_as_unspecified() {
        let filters = Filters::new().with_ratings(vec![ContentRating::Unspecified]);
        assert!(filters.matches(&record(json!({}))));
        assert!(filters.matches(&record(json!({"contentrating": []}))));
        assert!(!filters.matches(&record(json!({"contentrating": "Mature"}))));
    }

    #[test]
    fn test_filters_display() {
        let filters = Filters::new()
            .with_kinds(vec![WallpaperType::Scene, WallpaperType::Web])
            .with_ratings(vec![ContentRating::Everyone])
            .with("tags", strings(&["Nature"]));
        assert_eq!(
            filters.to_string(),
            "type=scene,web contentrating=Everyone tags=Nature"
        );
        assert_eq!(Filters::new().to_string(), "(none)");
    }

    #[test]
    fn test_empty_filters_keep_everything() {
        let d = doc(library());
        let candidates = weighted_candidates(&d, &Filters::new()).unwrap();
        assert_eq!(candidates.len(), 3);
    }

    #[test]
    fn test_recent_ids_are_penalized() {
        let mut d = doc(library());
        d.put_nested("2", "freq", json!(2.0)).unwrap();
        d.push_history("1");
        let weights: Vec<(String, f64)> = weighted_candidates(&d, &Filters::new()).unwrap();
        assert_eq!(weights[0], ("1".to_string(), 0.1));
        assert_eq!(weights[1], ("2".to_string(), 2.0));
        assert_eq!(weights[2], ("3".to_string(), 1.0));
    }

    #[test]
    fn test_weighted_index_boundaries() {
        assert_eq!(weighted_index(&[], &mut ZeroRng), None);
        assert_eq!(weighted_index(&[1.0, 1.0], &mut ZeroRng), Some(0));
        assert_eq!(weighted_index(&[0.0, 3.0], &mut ZeroRng), Some(1));
        assert_eq!(weighted_index(&[-1.0, f64::NAN, 2.0], &mut ZeroRng), Some(2));
    }

    #[test]
    fn test_zero_weights_fall_back_to_uniform() {
        let mut rng = seeded(3);
        let mut seen = [0u32; 3];
        for _ in 0..3_000 {
            seen[weighted_index(&[0.0, 0.0, 0.0], &mut rng).unwrap()] += 1;
        }
        assert!(seen.iter().all(|&n| n > 800), "counts were {seen:?}");
    }

    #[test]
    fn test_recency_weighting_converges() {
        let d = doc(json!({
            "10": {"title": "A"},
            "20": {"title": "B"},
            "prev_ids": ["10"],
            "last_id": "10"
        }));
        let candidates = weighted_candidates(&d, &Filters::new()).unwrap();
        let weights: Vec<f64> = candidates.iter().map(|(_, w)| *w).collect();

        let mut rng = seeded(0x9E37_79B9_7F4A_7C15);
        let mut counts = [0u32; 2];
        for _ in 0..110_000 {
            counts[weighted_index(&weights, &mut rng).unwrap()] += 1;
        }
        let ratio = counts[1] as f64 / counts[0] as f64;
        assert!((8.5..11.5).contains(&ratio), "ratio was {ratio}");
    }

    #[test]
    fn test_select_random_respects_filters() {
        let tmp = tempfile::tempdir().unwrap();
        for id in ["1", "2", "3"] {
            std::fs::create_dir(tmp.path().join(id)).unwrap();
        }
        let shell = RecordingShell::default();
        let mirror = SettingsMirror::new("/nonexistent", &shell);
        let applier = Applier::new(tmp.path(), &mirror);
        let filters = Filters::new().with_kinds(vec![WallpaperType::Video]);

        let mut rng = seeded(42);
        for _ in 0..20 {
            let mut d = doc(library());
            let picked = select_random(&mut d, &filters, &applier, &mut rng).unwrap();
            assert_eq!(picked.id, "2");
            assert_eq!(picked.title, "Neon");
            assert_eq!(d.last_id(), Some("2"));
        }
    }

    #[test]
    fn test_select_random_no_match() {
        let tmp = tempfile::tempdir().unwrap();
        let shell = RecordingShell::default();
        let mirror = SettingsMirror::new("/nonexistent", &shell);
        let applier = Applier::new(tmp.path(), &mirror);
        let filters = Filters::new().with("tags", strings(&["Space"]));

        let mut d = doc(library());
        let err = select_random(&mut d, &filters, &applier, &mut seeded(7)).unwrap_err();
        assert!(matches!(err, EngineError::NoMatch(_)));
    }

    #[test]
    fn test_select_random_skips_stale_entries() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("3")).unwrap();
        let shell = RecordingShell::default();
        let mirror = SettingsMirror::new("/nonexistent", &shell);
        let applier = Applier::new(tmp.path(), &mirror);

        // Always draws the first remaining candidate: "1" and "2" are stale.
        let mut d = doc(library());
        let picked = select_random(&mut d, &Filters::new(), &applier, &mut ZeroRng).unwrap();
        assert_eq!(picked.id, "3");
        assert!(d.record("1").is_none());
        assert!(d.record("2").is_none());
        assert!(d.record("3").is_some());
        assert_eq!(shell.writes.borrow().len(), 2);
    }

    #[test]
    fn test_only_candidate_missing_on_disk_is_pruned() {
        let tmp = tempfile::tempdir().unwrap();
        let wallpaper_dir = tmp.path().join("workshop");
        std::fs::create_dir_all(wallpaper_dir.join("500")).unwrap();

        let store = StateStore::new(tmp.path().join("state.json"));
        store.init_if_missing().unwrap();
        store
            .put("500", json!({"title": "Lonely", "file": "scene.json", "type": "scene"}))
            .unwrap();
        std::fs::remove_dir(wallpaper_dir.join("500")).unwrap();

        let shell = RecordingShell::default();
        let mirror = SettingsMirror::new("/nonexistent", &shell);
        let applier = Applier::new(&wallpaper_dir, &mirror);

        let mut d = store.load().unwrap();
        let err = select_random(&mut d, &Filters::new(), &applier, &mut seeded(1)).unwrap_err();
        store.save(&d).unwrap();

        assert!(matches!(err, EngineError::NoMatch(_)));
        assert!(store.load().unwrap().record("500").is_none());
        assert!(shell.writes.borrow().is_empty());
    }
}
