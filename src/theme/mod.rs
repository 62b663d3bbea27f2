//! Theme system for human-mode output.

use console::Style;

/// Visual theme for COPG CLI human-mode output.
///
/// Centralizes colors and styles for consistent rendering.
pub struct CopgTheme {
    // Status colors
    pub accent: Style,
    pub success: Style,
    pub error: Style,
    pub warning: Style,
    pub muted: Style,

    // Component styles
    pub header: Style,
    pub label: Style,
    pub value: Style,
    pub device_key: Style,
    pub package: Style,
    pub timestamp: Style,
}

impl Default for CopgTheme {
    fn default() -> Self {
        Self {
            accent: Style::new().blue().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warning: Style::new().yellow().bold(),
            muted: Style::new().dim(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold(),
            device_key: Style::new().magenta(),
            package: Style::new().green(),
            timestamp: Style::new().dim(),
        }
    }
}
