//! Command line control for the Wallpaper Engine plugin of KDE Plasma.
//!
//! The plugin keeps its settings in the Plasma applets config; `wengine`
//! reads them from there, writes them through plasmashell's scripting
//! interface and keeps its own wallpaper list in a JSON state file.

pub mod cli;
pub mod cmd;
pub mod command;
pub mod config;
pub mod error;
pub mod logger;
pub mod settings;
pub mod shell;
pub mod spinner;
pub mod state;
pub mod wallpaper;
