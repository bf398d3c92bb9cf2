//! # Output Configuration
//!
//! This module controls how the per-repository output sections look: whether
//! section headers and `ERROR:` lines are coloured, based on terminal
//! capabilities and user preferences.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! Styling only wraps a line in escape codes. It never splits, merges or
//! reorders lines.

use std::env;

use console::style;

/// Output configuration for controlling colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    /// Whether colors should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Resolve `--color` (`always`, `never`, `auto`) against the process
    /// environment and stdout.
    ///
    /// In `auto` mode colour is off when `NO_COLOR` is set (even empty),
    /// `CLICOLOR=0` or `TERM=dumb`, and otherwise follows whether stdout is
    /// a colour terminal. `CLICOLOR_FORCE` turns it on regardless of the
    /// terminal.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => auto_color(
                |key| env::var_os(key).map(|v| v.to_string_lossy().into_owned()),
                || console::Term::stdout().features().colors_supported(),
            ),
        };

        Self { use_color }
    }

    /// Create a configuration with colors always enabled.
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    pub fn without_color() -> Self {
        Self { use_color: false }
    }

    /// The header line that opens a repository's output section.
    pub fn header(&self, target: &str) -> String {
        let text = format!("------ {} ------", target);
        if self.use_color {
            style(text).cyan().bold().force_styling(true).to_string()
        } else {
            text
        }
    }

    /// The line reporting a failure inside a repository's output section.
    pub fn error(&self, reason: &str) -> String {
        if self.use_color {
            format!(
                "{} {}",
                style("ERROR:").red().bold().force_styling(true),
                reason
            )
        } else {
            format!("ERROR: {}", reason)
        }
    }
}

fn auto_color<E, T>(var: E, terminal: T) -> bool
where
    E: Fn(&str) -> Option<String>,
    T: FnOnce() -> bool,
{
    if var("NO_COLOR").is_some() {
        return false;
    }

    if var("CLICOLOR").as_deref() == Some("0") {
        return false;
    }

    if var("CLICOLOR_FORCE").is_some_and(|v| !v.is_empty() && v != "0") {
        return true;
    }

    var("TERM").as_deref() != Some("dumb") && terminal()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}
