use std::fmt;

use serde_json::{Map, Value};

/// Preference weight used when a record carries no `freq`.
pub const DEFAULT_FREQ: f64 = 1.0;

/// A wallpaper attribute as stored in its manifest.
#[derive(Debug, Clone, PartialEq)]
pub enum Attr {
    Scalar(Value),
    Sequence(Vec<Value>),
    Tree(Map<String, Value>),
}

impl Attr {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Array(items) => Attr::Sequence(items.clone()),
            Value::Object(map) => Attr::Tree(map.clone()),
            other => Attr::Scalar(other.clone()),
        }
    }

    /// The string an attribute filter compares against.
    ///
    /// Sequences contribute their first element, scalars their string form.
    /// Strings are taken without JSON quoting.
    pub fn filter_key(attr: Option<&Attr>) -> String {
        match attr {
            None => ContentRating::Unspecified.as_str().to_string(),
            Some(Attr::Scalar(value)) => scalar_to_string(value),
            Some(Attr::Sequence(items)) => items
                .first()
                .map(scalar_to_string)
                .unwrap_or_else(|| ContentRating::Unspecified.as_str().to_string()),
            Some(Attr::Tree(map)) => Value::Object(map.clone()).to_string(),
        }
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallpaperType {
    Scene,
    Video,
    Web,
}

impl WallpaperType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "scene" => Some(Self::Scene),
            "video" => Some(Self::Video),
            "web" => Some(Self::Web),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scene => "scene",
            Self::Video => "video",
            Self::Web => "web",
        }
    }
}

impl fmt::Display for WallpaperType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRating {
    Everyone,
    Questionable,
    Mature,
    Unspecified,
}

impl ContentRating {
    pub fn parse(s: &str) -> Self {
        match s {
            "Everyone" => Self::Everyone,
            "Questionable" => Self::Questionable,
            "Mature" => Self::Mature,
            _ => Self::Unspecified,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Everyone => "Everyone",
            Self::Questionable => "Questionable",
            Self::Mature => "Mature",
            Self::Unspecified => "Unspecified",
        }
    }
}

/// One wallpaper entry, backed by the manifest object it was scanned from.
///
/// The raw object is kept intact so fields this tool does not know about
/// survive a save.
#[derive(Debug, Clone, PartialEq)]
pub struct WallpaperRecord {
    raw: Map<String, Value>,
}

impl WallpaperRecord {
    pub fn new(raw: Map<String, Value>) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    pub fn attr(&self, name: &str) -> Option<Attr> {
        self.raw.get(name).map(Attr::from_value)
    }

    pub fn title(&self) -> &str {
        self.raw.get("title").and_then(Value::as_str).unwrap_or("")
    }

    /// Typed `type`, normalized the same way as attribute filters.
    pub fn kind(&self) -> Option<WallpaperType> {
        WallpaperType::parse(&Attr::filter_key(self.attr("type").as_ref()))
    }

    /// The manifest `type` string, lowercased, even when it is not a known type.
    pub fn kind_str(&self) -> String {
        self.raw
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_lowercase()
    }

    /// Typed `contentrating`; absent or unknown ratings are `Unspecified`.
    pub fn content_rating(&self) -> ContentRating {
        ContentRating::parse(&Attr::filter_key(self.attr("contentrating").as_ref()))
    }

    pub fn file(&self) -> &str {
        self.raw.get("file").and_then(Value::as_str).unwrap_or("")
    }

    /// Preference weight; numbers and numeric strings are both accepted.
    pub fn freq(&self) -> f64 {
        match self.raw.get("freq") {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(DEFAULT_FREQ),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(DEFAULT_FREQ),
            _ => DEFAULT_FREQ,
        }
    }

    /// Raw "r g b" scheme color (floats in 0..1) from the manifest properties.
    pub fn scheme_color(&self) -> Option<&str> {
        self.raw
            .get("general")?
            .get("properties")?
            .get("schemecolor")?
            .get("value")?
            .as_str()
    }
}
