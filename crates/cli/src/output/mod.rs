//! Terminal output: status lines, tables, JSON documents and transfer
//! progress

mod formatter;
mod progress;

pub use formatter::Formatter;
pub use progress::ProgressBar;

/// Rendering switches taken from the global flags
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Machine-readable JSON on stdout, no colors or progress
    pub json: bool,
    pub no_color: bool,
    pub no_progress: bool,
    /// Only errors are printed
    pub quiet: bool,
}
