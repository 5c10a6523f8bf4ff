//! Analytics tab: distribution and average bars, threshold cards.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use smartfarm_core::{averages, distribution};
use smartfarm_types::Metric;

use super::theme::{AppTheme, BORDER_TYPE};
use crate::format::{format_range, format_value_with_unit};
use crate::tui::app::App;

/// Label column plus value column.
const BAR_OVERHEAD: u16 = 26;

/// Draw the Analytics tab.
pub(super) fn draw_analytics_panel(frame: &mut Frame, area: Rect, app: &App, theme: &AppTheme) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(8)])
        .split(area);

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(layout[0]);

    let state = app.state();
    let current = distribution(&state.live.values);
    draw_bars(
        frame,
        charts[0],
        " Current Distribution ",
        &current.bars(),
        theme,
    );

    let means = averages(&app.chart_points());
    draw_bars(
        frame,
        charts[1],
        &format!(" Averages ({}) ", state.range.label()),
        &means.bars(),
        theme,
    );

    draw_threshold_cards(frame, layout[1], app, theme);
}

/// Horizontal bars scaled relative to the largest value.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn bar_lines(bars: &[(&'static str, f64); 4], width: u16, theme: &AppTheme) -> Vec<Line<'static>> {
    let bar_budget = usize::from(width.saturating_sub(BAR_OVERHEAD));
    let max = bars.iter().map(|(_, v)| *v).fold(0.0f64, f64::max);

    Metric::ALL
        .iter()
        .zip(bars.iter())
        .map(|(metric, (label, value))| {
            let fraction = if max > 0.0 { value / max } else { 0.0 };
            let bar_width = (fraction * bar_budget as f64).round().max(0.0) as usize;
            let bar = "█".repeat(bar_width.min(bar_budget));
            Line::from(vec![
                Span::styled(
                    format!("  {label:<14} "),
                    Style::default().fg(theme.text_secondary),
                ),
                Span::styled(bar, Style::default().fg(theme.metric_color(*metric))),
                Span::styled(
                    format!(" {value:>7.1}"),
                    Style::default().fg(theme.text_primary),
                ),
            ])
        })
        .collect()
}

fn draw_bars(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    bars: &[(&'static str, f64); 4],
    theme: &AppTheme,
) {
    let block = Block::default()
        .title(Span::styled(title.to_string(), theme.title_style()))
        .borders(Borders::ALL)
        .border_type(BORDER_TYPE)
        .border_style(theme.border_active_style());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![Line::from("")];
    for line in bar_lines(bars, inner.width, theme) {
        lines.push(line);
        lines.push(Line::from(""));
    }
    frame.render_widget(Paragraph::new(lines), inner);
}

/// One card per metric: optimal range, current value and verdict.
fn draw_threshold_cards(frame: &mut Frame, area: Rect, app: &App, theme: &AppTheme) {
    let values = &app.state().live.values;
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    for ((metric, status), card) in app
        .thresholds
        .evaluate_all(values)
        .into_iter()
        .zip(cards.iter())
    {
        let color = theme.threshold_color(status);
        let lines = vec![
            Line::from(vec![
                Span::styled("Optimal ", theme.muted_style()),
                Span::styled(
                    format_range(&app.thresholds, metric),
                    Style::default().fg(theme.text_secondary),
                ),
            ]),
            Line::from(vec![
                Span::styled("Current ", theme.muted_style()),
                Span::styled(
                    format_value_with_unit(metric, values.get(metric)),
                    Style::default().fg(theme.text_primary),
                ),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                status.label(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
        ];

        let block = Block::default()
            .title(Span::styled(
                format!(" {} ", metric.label()),
                Style::default().fg(theme.metric_color(metric)),
            ))
            .borders(Borders::ALL)
            .border_type(BORDER_TYPE)
            .border_style(Style::default().fg(color));

        frame.render_widget(
            Paragraph::new(lines).alignment(Alignment::Center).block(block),
            *card,
        );
    }
}
