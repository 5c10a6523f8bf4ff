//! Color palette and shared styles for the dashboard.
//!
//! Colors follow the Tailwind CSS palette.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::BorderType;

use smartfarm_core::ThresholdStatus;
use smartfarm_types::{LiveStatus, Metric};

/// Border type used by every panel.
pub const BORDER_TYPE: BorderType = BorderType::Rounded;

/// Application theme with all UI colors.
#[derive(Debug, Clone, Copy)]
pub struct AppTheme {
    // Primary colors
    pub primary: Color,

    // Status colors
    pub success: Color,
    pub warning: Color,
    pub danger: Color,
    pub info: Color,

    // Text colors
    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_muted: Color,

    // Border colors
    pub border_active: Color,
    pub border_inactive: Color,

    // Background colors
    pub bg_header: Color,
}

impl Default for AppTheme {
    fn default() -> Self {
        Self::dark()
    }
}

impl AppTheme {
    /// Dark theme.
    #[must_use]
    pub const fn dark() -> Self {
        Self {
            primary: Color::Rgb(74, 222, 128), // green-400

            success: Color::Rgb(74, 222, 128), // green-400
            warning: Color::Rgb(251, 191, 36), // amber-400
            danger: Color::Rgb(248, 113, 113), // red-400
            info: Color::Rgb(96, 165, 250),    // blue-400

            text_primary: Color::Rgb(248, 250, 252), // slate-50
            text_secondary: Color::Rgb(148, 163, 184), // slate-400
            text_muted: Color::Rgb(100, 116, 139),   // slate-500

            border_active: Color::Rgb(74, 222, 128), // green-400
            border_inactive: Color::Rgb(71, 85, 105), // slate-600

            bg_header: Color::Rgb(30, 41, 59), // slate-800
        }
    }

    /// Line and bar color of a metric.
    #[must_use]
    pub const fn metric_color(&self, metric: Metric) -> Color {
        match metric {
            Metric::Temperature => Color::Rgb(248, 113, 113), // red-400
            Metric::Humidity => Color::Rgb(96, 165, 250),     // blue-400
            Metric::SoilMoisture => Color::Rgb(74, 222, 128), // green-400
            Metric::LightIntensity => Color::Rgb(250, 204, 21), // yellow-400
        }
    }

    /// Color of a threshold verdict.
    #[must_use]
    pub const fn threshold_color(&self, status: ThresholdStatus) -> Color {
        match status {
            ThresholdStatus::Good => self.success,
            ThresholdStatus::Warning => self.warning,
        }
    }

    /// Color of the live channel indicator.
    #[must_use]
    pub fn status_color(&self, status: &LiveStatus) -> Color {
        match status {
            LiveStatus::Connecting => self.info,
            LiveStatus::Ready => self.success,
            LiveStatus::NoData => self.text_muted,
            LiveStatus::Error(_) => self.danger,
        }
    }

    // Style helpers

    /// Style for active/focused borders.
    #[inline]
    #[must_use]
    pub fn border_active_style(&self) -> Style {
        Style::default().fg(self.border_active)
    }

    /// Style for inactive borders.
    #[inline]
    #[must_use]
    pub fn border_inactive_style(&self) -> Style {
        Style::default().fg(self.border_inactive)
    }

    /// Style for titles.
    #[inline]
    #[must_use]
    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for header/app bar.
    #[inline]
    #[must_use]
    pub fn header_style(&self) -> Style {
        Style::default().bg(self.bg_header)
    }

    /// Style for muted text.
    #[inline]
    #[must_use]
    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.text_muted)
    }
}
