use std::collections::HashMap;

use tracing::debug;

use crate::error::{EngineError, Result};
use crate::state::Catalog;

/// Minimum similarity for a title to be considered in fuzzy mode.
const FUZZY_THRESHOLD: f64 = 0.5;
/// Minimum similarity in strict mode.
const STRICT_THRESHOLD: f64 = 0.95;

/// Upper bound on sequence similarity: `2 * M / T`, where `M` counts the
/// characters the two strings share as multisets and `T` is their total length.
pub fn quick_ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let mut available: HashMap<char, usize> = HashMap::new();
    for &c in b {
        *available.entry(c).or_default() += 1;
    }
    let mut matches = 0usize;
    for c in a {
        if let Some(n) = available.get_mut(c)
            && *n > 0
        {
            *n -= 1;
            matches += 1;
        }
    }
    2.0 * matches as f64 / total as f64
}

/// Length of the longest common substring.
pub fn longest_common_substring(a: &[char], b: &[char]) -> usize {
    let mut best = 0;
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb { prev[j] + 1 } else { 0 };
            best = best.max(cur[j + 1]);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    best
}

/// Caseless form of `s`: lowercase, plus the full case foldings lowercase misses.
fn fold(s: &str) -> Vec<char> {
    let mut out = Vec::with_capacity(s.len());
    for c in s.chars().flat_map(char::to_lowercase) {
        match c {
            'ß' => out.extend(['s', 's']),
            'ς' => out.push('σ'),
            'ſ' => out.push('s'),
            _ => out.push(c),
        }
    }
    out
}

/// Map a user token to exactly one wallpaper id.
///
/// An exact id always wins. Purely numeric tokens are treated as ids and never
/// compared against titles. Otherwise the title maximizing
/// `similarity * longest common substring` is chosen among those above the
/// threshold; the first one wins a tie.
pub fn resolve(token: &str, wallpapers: &Catalog, fuzzy: bool) -> Result<String> {
    debug!(token, fuzzy, candidates = wallpapers.len(), "resolve:start");

    if wallpapers.contains(token) {
        debug!(id = token, "resolve:exact id");
        return Ok(token.to_string());
    }

    if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) {
        return Err(EngineError::BadNameOrId(token.to_string()));
    }

    let threshold = if fuzzy {
        FUZZY_THRESHOLD
    } else {
        STRICT_THRESHOLD
    };
    let needle = fold(token);

    let mut best: Option<(&str, f64)> = None;
    for (id, record) in wallpapers.iter() {
        let title = fold(record.title());
        let ratio = quick_ratio(&needle, &title);
        if ratio <= threshold {
            continue;
        }
        let score = ratio * longest_common_substring(&needle, &title) as f64;
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((id, score));
        }
    }

    match best {
        Some((id, score)) => {
            debug!(id, score, "resolve:matched title");
            Ok(id.to_string())
        }
        None => Err(EngineError::BadNameOrId(token.to_string())),
    }
}
