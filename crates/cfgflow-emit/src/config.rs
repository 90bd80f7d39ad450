use crate::output::OutputFormat;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub format: OutputFormat,
    pub use_colors: bool,
    /// Append solver visit and update counts to each report.
    pub show_stats: bool,
    /// List every numbered instruction before its facts.
    pub show_instructions: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            use_colors: true,
            show_stats: false,
            show_instructions: false,
        }
    }
}

impl ReportConfig {
    pub fn plain() -> Self {
        Self {
            use_colors: false,
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }
}
