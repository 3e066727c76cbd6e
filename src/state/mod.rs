//! Persistent state for wengine.
//!
//! A single JSON document holds the scanned wallpaper records, the settings
//! mirrored from the plasma config, and the history of applied wallpapers.

pub(crate) mod store;
mod types;

pub use store::{Catalog, Document, HISTORY_LEN, StateStore, is_wallpaper_id};
pub use types::{Attr, ContentRating, WallpaperRecord, WallpaperType};
