use anyhow::{Context as _, Result, anyhow};
use clap::Subcommand;
use console::style;
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use super::{Context, current_id};
use crate::settings::SettingsMirror;
use crate::shell::{PlasmaShell, Shell};
use crate::state::{ContentRating, Document, WallpaperRecord, WallpaperType};
use crate::wallpaper::{self, Applier, Filters, select_random};

/// Preference weights set by `like` and `dislike`.
const LIKED_FREQ: f64 = 2.0;
const DISLIKED_FREQ: f64 = 0.5;

#[derive(Subcommand, Debug)]
pub enum WallpaperCommand {
    /// Set a wallpaper by workshop id or (fuzzy) title
    Setup {
        /// Workshop id or title
        name_or_id: String,

        /// Disable fuzzy matching when searching by title
        #[arg(long)]
        strict: bool,

        /// Apply the wallpaper's accent color to the Plasma color scheme
        #[arg(long)]
        apply_accent_color: bool,
    },

    /// Set a random wallpaper, favoring ones not shown recently
    Random {
        /// Types to choose from, e.g. "scene,video"
        #[arg(long = "type", value_delimiter = ',', value_parser = ["scene", "video", "web"])]
        kind: Vec<String>,

        /// Content ratings to choose from, e.g. "Everyone,Questionable"
        #[arg(
            long,
            value_delimiter = ',',
            value_parser = ["Everyone", "Questionable", "Mature", "Unspecified"]
        )]
        contentrating: Vec<String>,

        /// Tags to choose from, e.g. "Nature,Anime"
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Include wallpapers rated "Mature"
        #[arg(long)]
        nsfw: bool,

        /// Apply the wallpaper's accent color to the Plasma color scheme
        #[arg(long)]
        apply_accent_color: bool,
    },

    /// Print id and title of the current wallpaper
    Name,

    /// Print id of the current wallpaper
    Id,

    /// Print the accent color of the current wallpaper as #rrggbb
    Accent {
        /// Apply it to the Plasma color scheme
        #[arg(long)]
        apply_accent_color: bool,
    },

    /// Print everything known about the current wallpaper
    Get,

    /// Show the current wallpaper more often in `random`
    Like,

    /// Show the current wallpaper less often in `random`
    Dislike,
}

pub fn run(command: WallpaperCommand) -> Result<()> {
    let ctx = Context::load()?;
    execute(&ctx, &PlasmaShell, command)
}

fn execute(ctx: &Context, shell: &dyn Shell, command: WallpaperCommand) -> Result<()> {
    let mirror = SettingsMirror::new(ctx.config.plasma_config(), shell);

    match command {
        WallpaperCommand::Setup {
            name_or_id,
            strict,
            apply_accent_color,
        } => {
            let mut doc = ctx.store.load()?;
            let applier = Applier::new(ctx.workshop_dir(&doc)?, &mirror);
            let picked = wallpaper::setup(&mut doc, &applier, &name_or_id, !strict)?;
            ctx.store.save(&doc)?;
            println!("{} <{}> \"{}\"", style("✓").green(), picked.id, picked.title);
            if apply_accent_color {
                apply_accent(ctx, shell, &doc, &picked.id)?;
            }
            Ok(())
        }
        WallpaperCommand::Random {
            kind,
            contentrating,
            tags,
            nsfw,
            apply_accent_color,
        } => {
            let filters = build_filters(
                kind,
                contentrating,
                tags,
                nsfw || ctx.config.show_mature(),
            );
            let mut doc = ctx.store.load()?;
            let applier = Applier::new(ctx.workshop_dir(&doc)?, &mirror);
            let result = select_random(&mut doc, &filters, &applier, &mut rand::rng());
            // Records pruned along the way are persisted even if nothing matched.
            ctx.store.save(&doc)?;
            let picked = result?;
            println!("{} <{}> \"{}\"", style("✓").green(), picked.id, picked.title);
            if apply_accent_color {
                apply_accent(ctx, shell, &doc, &picked.id)?;
            }
            Ok(())
        }
        WallpaperCommand::Name => {
            let doc = ctx.store.load()?;
            let (id, record) = current_record(&mirror, &doc)?;
            println!("<{}> \"{}\"", id, record.title());
            Ok(())
        }
        WallpaperCommand::Id => {
            let doc = ctx.store.load()?;
            println!("{}", current_id(&mirror, &doc)?);
            Ok(())
        }
        WallpaperCommand::Accent { apply_accent_color } => {
            let doc = ctx.store.load()?;
            let (id, record) = current_record(&mirror, &doc)?;
            let hex = wallpaper::accent_hex(&record)
                .ok_or_else(|| anyhow!("This wallpaper doesn't have a scheme color"))?;
            println!("{hex}");
            if apply_accent_color {
                apply_accent(ctx, shell, &doc, &id)?;
            }
            Ok(())
        }
        WallpaperCommand::Get => {
            let doc = ctx.store.load()?;
            let (_, record) = current_record(&mirror, &doc)?;
            for line in format_properties(record.raw(), 0) {
                println!("{line}");
            }
            Ok(())
        }
        WallpaperCommand::Like => set_freq(ctx, &mirror, LIKED_FREQ),
        WallpaperCommand::Dislike => set_freq(ctx, &mirror, DISLIKED_FREQ),
    }
}

/// Filters for `random`.
///
/// Without an explicit content rating, "Mature" is only included when
/// `include_mature` is set.
pub fn build_filters(
    kind: Vec<String>,
    contentrating: Vec<String>,
    tags: Vec<String>,
    include_mature: bool,
) -> Filters {
    let kinds: Vec<WallpaperType> = kind.iter().filter_map(|k| WallpaperType::parse(k)).collect();

    let ratings = if !contentrating.is_empty() {
        contentrating.iter().map(|r| ContentRating::parse(r)).collect()
    } else {
        let mut ratings = vec![
            ContentRating::Everyone,
            ContentRating::Unspecified,
            ContentRating::Questionable,
        ];
        if include_mature {
            ratings.push(ContentRating::Mature);
        }
        ratings
    };

    let mut filters = Filters::new().with_kinds(kinds).with_ratings(ratings);
    if !tags.is_empty() {
        filters = filters.with("tags", tags);
    }
    filters
}

fn current_record(
    mirror: &SettingsMirror<'_>,
    doc: &Document,
) -> Result<(String, WallpaperRecord)> {
    let id = current_id(mirror, doc)?;
    let record = doc
        .record(&id)
        .ok_or_else(|| anyhow!("Could not find a wallpaper by id: {}", id))?;
    Ok((id, record))
}

fn set_freq(ctx: &Context, mirror: &SettingsMirror<'_>, freq: f64) -> Result<()> {
    let doc = ctx.store.load()?;
    let (id, record) = current_record(mirror, &doc)?;
    ctx.store
        .put_nested(&id, "freq", json!(freq))
        .with_context(|| format!("Failed to update wallpaper {}", id))?;
    info!(id = %id, freq, "wallpaper:freq updated");

    if freq > 1.0 {
        println!("I like this wallpaper! ({})", style(record.title()).bold());
    } else {
        println!("Show less of ({}) please", style(record.title()).bold());
    }
    Ok(())
}

/// Push the wallpaper's accent color to the Plasma color scheme.
fn apply_accent(ctx: &Context, shell: &dyn Shell, doc: &Document, id: &str) -> Result<()> {
    let record = doc
        .record(id)
        .ok_or_else(|| anyhow!("Could not find a wallpaper by id: {}", id))?;
    let hex = if wallpaper::accent_is_black(&record) {
        ctx.config.default_accent.clone().ok_or_else(|| {
            anyhow!("Scheme color is black and no default_accent is configured")
        })?
    } else {
        wallpaper::accent_hex(&record)
            .ok_or_else(|| anyhow!("This wallpaper doesn't have a scheme color"))?
    };
    debug!(id, hex = %hex, "wallpaper:apply accent");
    shell
        .execute("plasma-apply-colorscheme", &["--accent-color", hex.as_str()])
        .context("Failed to apply accent color")
}

/// `name="value"` lines, nested objects indented two spaces per level.
pub fn format_properties(map: &Map<String, Value>, level: usize) -> Vec<String> {
    let indent = "  ".repeat(level);
    let mut lines = Vec::new();
    for (name, value) in map {
        match value {
            Value::Object(inner) => {
                lines.push(format!("{indent}{name}:"));
                lines.extend(format_properties(inner, level + 1));
            }
            Value::String(s) => lines.push(format!("{indent}{name}=\"{s}\"")),
            other => lines.push(format!("{indent}{name}=\"{other}\"")),
        }
    }
    lines
}
