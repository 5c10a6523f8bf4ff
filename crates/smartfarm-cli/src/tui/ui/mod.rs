//! Main UI layout and rendering for the dashboard.
//!
//! The layout consists of:
//!
//! - **Header**: title, data source, device and live status
//! - **Tab bar**: Data / Analytics tabs and the time-range selector
//! - **Main content**: the active tab, or the loading or error view
//! - **Status bar**: key hints and the clock
//!
//! Drawing reads [`App`] only; nothing here mutates state.

pub mod theme;

mod analytics;
mod data;

use chrono::Local;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap};

use smartfarm_core::Tab;
use smartfarm_types::{LiveStatus, TimeRange};

use super::app::App;
use theme::{AppTheme, BORDER_TYPE};

/// Draw the complete interface.
pub fn draw(frame: &mut Frame, app: &App) {
    let theme = AppTheme::dark();

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header bar
            Constraint::Length(3), // Tab bar
            Constraint::Min(1),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_header(frame, main_layout[0], app, &theme);

    let state = app.state();
    if let Some(message) = state.error_message() {
        // The error view replaces tabs and content entirely.
        let content = main_layout[1].union(main_layout[2]);
        draw_error_view(frame, content, message, &theme);
    } else if state.loading {
        draw_tab_bar(frame, main_layout[1], app, &theme);
        draw_loading_view(frame, main_layout[2], &theme);
    } else {
        draw_tab_bar(frame, main_layout[1], app, &theme);
        match state.tab {
            Tab::Data => data::draw_data_panel(frame, main_layout[2], app, &theme),
            Tab::Analytics => analytics::draw_analytics_panel(frame, main_layout[2], app, &theme),
        }
    }

    draw_status_bar(frame, main_layout[3], app, &theme);

    if app.show_help {
        draw_help_overlay(frame, &theme);
    }
}

/// Draw the header bar with title, source and live status.
fn draw_header(frame: &mut Frame, area: Rect, app: &App, theme: &AppTheme) {
    let status = &app.state().live.status;

    let mut spans = vec![
        Span::styled(
            " Smart Farm ",
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("v{} ", env!("CARGO_PKG_VERSION")),
            theme.muted_style(),
        ),
        Span::styled(
            format!(" {} ", app.device),
            Style::default().fg(theme.text_secondary),
        ),
        Span::styled(format!(" [{}] ", app.source_name), theme.muted_style()),
        Span::styled(
            format!(" * {} ", status_label(status)),
            Style::default()
                .fg(theme.status_color(status))
                .add_modifier(Modifier::BOLD),
        ),
    ];

    if let Some(updated) = app.state().live.last_updated {
        spans.push(Span::styled(
            format!(" updated {} ", crate::format::format_local(updated, app.offset)),
            theme.muted_style(),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).style(theme.header_style());
    frame.render_widget(header, area);
}

/// Header text for the live status. Error details belong to the error view.
fn status_label(status: &LiveStatus) -> String {
    match status {
        LiveStatus::Error(_) => "Error".to_string(),
        other => other.to_string(),
    }
}

/// Draw the tab bar with the range selector on the right.
fn draw_tab_bar(frame: &mut Frame, area: Rect, app: &App, theme: &AppTheme) {
    let state = app.state();

    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(36)])
        .split(area);

    let tab_titles: Vec<Line> = Tab::ALL
        .iter()
        .map(|tab| {
            let is_active = *tab == state.tab;
            let style = if is_active {
                Style::default()
                    .fg(theme.primary)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                theme.muted_style()
            };
            Line::from(Span::styled(format!(" {} ", tab.label()), style))
        })
        .collect();

    let tabs = Tabs::new(tab_titles)
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_type(BORDER_TYPE)
                .border_style(theme.border_inactive_style()),
        )
        .highlight_style(Style::default().fg(theme.primary))
        .divider(Span::styled(" | ", theme.muted_style()))
        .select(state.tab.index());
    frame.render_widget(tabs, layout[0]);

    let mut spans = Vec::new();
    for (i, range) in TimeRange::ALL.iter().enumerate() {
        let style = if *range == state.range {
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else {
            theme.muted_style()
        };
        spans.push(Span::styled(format!("{}", i + 1), theme.muted_style()));
        spans.push(Span::styled(format!(" {} ", range.label()), style));
        spans.push(Span::raw(" "));
    }
    if state.history_pending {
        spans.push(Span::styled("~", Style::default().fg(theme.info)));
    }

    let selector = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_type(BORDER_TYPE)
                .border_style(theme.border_inactive_style()),
        );
    frame.render_widget(selector, layout[1]);
}

/// Placeholder until the first live update arrives.
fn draw_loading_view(frame: &mut Frame, area: Rect, theme: &AppTheme) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Connecting to sensor feed...",
            Style::default().fg(theme.text_secondary),
        )),
        Line::from(""),
        Line::from(Span::styled(
            crate::format::LOADING,
            theme.muted_style(),
        )),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BORDER_TYPE)
        .border_style(theme.border_inactive_style());
    let view = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(view, area);
}

/// Full-screen error view with the Retry hint.
fn draw_error_view(frame: &mut Frame, area: Rect, message: &str, theme: &AppTheme) {
    let block = Block::default()
        .title(Span::styled(
            " Error ",
            Style::default()
                .fg(theme.danger)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_type(BORDER_TYPE)
        .border_style(Style::default().fg(theme.danger));

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(theme.text_primary),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "[r]",
                Style::default()
                    .fg(theme.primary)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" Retry", Style::default().fg(theme.text_secondary)),
            Span::styled("    ", Style::default()),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(theme.primary)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" Quit", Style::default().fg(theme.text_secondary)),
        ]),
    ];

    let view = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(view, area);
}

/// Key hints for the current state.
fn context_hints(app: &App) -> Vec<(&'static str, &'static str)> {
    if app.is_error() {
        return vec![("r", "retry"), ("q", "quit")];
    }
    vec![
        ("?", "help"),
        ("Tab", "switch tab"),
        ("1-5", "range"),
        ("r", "refresh"),
        ("q", "quit"),
    ]
}

/// Draw the status bar with key hints and the clock.
fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App, theme: &AppTheme) {
    let time_str = Local::now().format("%H:%M:%S").to_string();

    let mut spans = vec![Span::raw(" ")];
    if let Some(error) = app.state().last_history_error.as_deref()
        && !app.is_error()
    {
        spans.push(Span::styled(
            format!("History unavailable: {error}"),
            Style::default().fg(theme.warning),
        ));
    } else {
        for (i, (key, desc)) in context_hints(app).iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" | ", theme.muted_style()));
            }
            spans.push(Span::styled(
                *key,
                Style::default()
                    .fg(theme.primary)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(format!(" {desc}"), theme.muted_style()));
        }
    }

    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(10)])
        .split(area);

    frame.render_widget(Paragraph::new(Line::from(spans)), layout[0]);
    let clock = Paragraph::new(time_str)
        .style(theme.muted_style())
        .alignment(Alignment::Right);
    frame.render_widget(clock, layout[1]);
}

fn shortcut_line<'a>(key: &str, desc: &str, theme: &AppTheme) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{:>12} ", key), Style::default().fg(theme.warning)),
        Span::styled(desc.to_string(), Style::default().fg(theme.text_secondary)),
    ])
}

/// Draw the help overlay centered over everything else.
fn draw_help_overlay(frame: &mut Frame, theme: &AppTheme) {
    let area = frame.area();
    let width = 44.min(area.width.saturating_sub(2));
    let height = 16.min(area.height.saturating_sub(2));
    let x = (area.width.saturating_sub(width)) / 2;
    let y = (area.height.saturating_sub(height)) / 2;
    let help_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, help_area);

    let heading = |text: &'static str| {
        Line::from(Span::styled(
            text,
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        ))
    };

    let lines = vec![
        heading("--- Navigation ---"),
        shortcut_line("Tab/l", "Next tab", theme),
        shortcut_line("Shift+Tab/h", "Previous tab", theme),
        shortcut_line("1-5", "1h / 6h / 24h / 7d / 30d", theme),
        Line::from(""),
        heading("--- Data ---"),
        shortcut_line("r", "Refresh history", theme),
        shortcut_line("r (error)", "Retry from scratch", theme),
        Line::from(""),
        shortcut_line("?/Esc", "Close help", theme),
        shortcut_line("q", "Quit", theme),
    ];

    let help = Paragraph::new(lines).block(
        Block::default()
            .title(Span::styled(" Help ", theme.title_style()))
            .borders(Borders::ALL)
            .border_type(BORDER_TYPE)
            .border_style(theme.border_active_style()),
    );
    frame.render_widget(help, help_area);
}
