//! Human and JSON rendering shared by every command
//!
//! Data goes to stdout; errors, warnings and progress go to stderr.

use comfy_table::presets::{ASCII_MARKDOWN, UTF8_FULL_CONDENSED};
use comfy_table::{ContentArrangement, Table};
use serde::Serialize;

use super::OutputConfig;

/// Writes command output according to the global flags
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
}

impl Formatter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    pub fn is_json(&self) -> bool {
        self.config.json
    }

    pub fn is_quiet(&self) -> bool {
        self.config.quiet
    }

    pub fn colors_enabled(&self) -> bool {
        !self.config.no_color && !self.config.json
    }

    pub fn success(&self, message: &str) {
        self.status(Level::Success, message);
    }

    /// Errors are printed to stderr even in quiet mode; JSON mode wraps
    /// them as `{"error": ...}`
    pub fn error(&self, message: &str) {
        if self.config.json {
            let body = serde_json::json!({ "error": message });
            eprintln!("{body}");
            return;
        }
        self.status(Level::Error, message);
    }

    pub fn warning(&self, message: &str) {
        self.status(Level::Warning, message);
    }

    fn status(&self, level: Level, message: &str) {
        if level != Level::Error && (self.config.quiet || self.config.json) {
            return;
        }
        let line = if self.colors_enabled() {
            format!("\x1b[{}m{}\x1b[0m {message}", level.color(), level.marker())
        } else {
            format!("{} {message}", level.marker())
        };
        match level {
            Level::Success => println!("{line}"),
            Level::Warning | Level::Error => eprintln!("{line}"),
        }
    }

    /// Pretty-printed JSON on stdout
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error serializing output: {e}"),
        }
    }

    pub fn println(&self, message: &str) {
        if self.config.quiet {
            return;
        }
        println!("{message}");
    }

    /// Print rows under a header line as a table
    pub fn table(&self, header: &[&str], rows: Vec<Vec<String>>) {
        if self.config.quiet {
            return;
        }
        println!("{}", self.render_table(header, rows));
    }

    fn render_table(&self, header: &[&str], rows: Vec<Vec<String>>) -> String {
        let mut table = Table::new();
        table
            .load_preset(if self.colors_enabled() {
                UTF8_FULL_CONDENSED
            } else {
                ASCII_MARKDOWN
            })
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(header.to_vec());
        for row in rows {
            table.add_row(row);
        }
        table.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Success,
    Warning,
    Error,
}

impl Level {
    fn marker(self) -> &'static str {
        match self {
            Level::Success => "✓",
            Level::Warning => "⚠",
            Level::Error => "✗",
        }
    }

    /// ANSI foreground color code
    fn color(self) -> u8 {
        match self {
            Level::Success => 32,
            Level::Warning => 33,
            Level::Error => 31,
        }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}
