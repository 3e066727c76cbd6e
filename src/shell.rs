//! Live integration with the plasma shell.
//!
//! Settings are written through the `evaluateScript` D-Bus method of
//! plasmashell. Nothing is read back, so a write that the shell ignores is
//! not detected here.

use anyhow::Result;
use tracing::debug;

use crate::cmd::Cmd;

pub const PLUGIN_ID: &str = "com.github.casout.wallpaperEngineKde";

/// Write side of the desktop shell.
pub trait Shell {
    /// Set one key in the wallpaper plugin's General config group.
    fn write_config(&self, key: &str, value: &str) -> Result<()>;

    /// Run a helper program, e.g. `plasma-apply-colorscheme`.
    fn execute(&self, program: &str, args: &[&str]) -> Result<()>;
}

/// Escape a string for use inside a JavaScript double-quoted literal.
pub fn js_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

/// Script that selects the plugin on every desktop and writes one key.
pub fn write_config_script(key: &str, value: &str) -> String {
    format!(
        r#"for (d of desktops()) {{
    d.wallpaperPlugin = "{plugin}";
    d.currentConfigGroup = Array("Wallpaper", "{plugin}", "General");
    d.writeConfig("{key}", "{value}");
}}"#,
        plugin = PLUGIN_ID,
        key = js_escape(key),
        value = js_escape(value),
    )
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PlasmaShell;

impl Shell for PlasmaShell {
    fn write_config(&self, key: &str, value: &str) -> Result<()> {
        debug!(key, value, "shell:write_config");
        let script = format!("string:{}", write_config_script(key, value));
        Cmd::new("dbus-send")
            .args(&[
                "--session",
                "--dest=org.kde.plasmashell",
                "--type=method_call",
                "/PlasmaShell",
                "org.kde.PlasmaShell.evaluateScript",
            ])
            .arg(&script)
            .run()?;
        Ok(())
    }

    fn execute(&self, program: &str, args: &[&str]) -> Result<()> {
        debug!(program, args = ?args, "shell:execute");
        Cmd::new(program).args(args).run()?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Shell;
    use std::cell::RefCell;

    /// Records every call instead of talking to plasmashell.
    #[derive(Default)]
    pub struct RecordingShell {
        pub writes: RefCell<Vec<(String, String)>>,
        pub executed: RefCell<Vec<Vec<String>>>,
    }

    impl Shell for RecordingShell {
        fn write_config(&self, key: &str, value: &str) -> anyhow::Result<()> {
            self.writes
                .borrow_mut()
                .push((key.to_string(), value.to_string()));
            Ok(())
        }

        fn execute(&self, program: &str, args: &[&str]) -> anyhow::Result<()> {
            let mut call = vec![program.to_string()];
            call.extend(args.iter().map(|a| a.to_string()));
            self.executed.borrow_mut().push(call);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_escape_quotes_and_backslashes() {
        assert_eq!(js_escape(r#"a "b" \c"#), r#"a \"b\" \\c"#);
        assert_eq!(js_escape("plain/path"), "plain/path");
    }

    #[test]
    fn test_js_escape_keeps_non_ascii() {
        assert_eq!(js_escape("file:///壁紙/scene.json"), "file:///壁紙/scene.json");
    }

    #[test]
    fn test_write_config_script_targets_plugin() {
        let script = write_config_script("Fps", "30");
        assert!(script.contains(r#"d.wallpaperPlugin = "com.github.casout.wallpaperEngineKde";"#));
        assert!(script.contains(r#"d.writeConfig("Fps", "30");"#));
    }
}
