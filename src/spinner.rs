use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["◐", "◓", "◑", "◒", "●"])
        .template("{spinner:.cyan} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb
}

/// Run `op` behind a spinner and replace it with a ✔/✘ line when done.
pub fn with_spinner<T, F>(msg: &str, op: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let pb = create_spinner(msg);
    let result = op();
    let mark = if result.is_ok() { "✔" } else { "✘" };
    pb.finish_with_message(format!("{mark} {msg}"));
    result
}
