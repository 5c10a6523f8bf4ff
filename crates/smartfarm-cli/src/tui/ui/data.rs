//! Data tab: current-value cards, trend chart and the readings table.

use ratatui::prelude::*;
use ratatui::symbols::Marker;
use ratatui::widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table};

use smartfarm_core::analytics::LIGHT_SCALE;
use smartfarm_core::{ChartPoint, summarize};
use smartfarm_types::Metric;

use super::theme::{AppTheme, BORDER_TYPE};
use crate::format::{MISSING, format_local, format_value, format_value_with_unit};
use crate::tui::app::App;

/// Draw the Data tab.
pub(super) fn draw_data_panel(frame: &mut Frame, area: Rect, app: &App, theme: &AppTheme) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),      // Value cards
            Constraint::Percentage(55), // Trend chart
            Constraint::Min(6),         // Readings table
        ])
        .split(area);

    draw_value_cards(frame, layout[0], app, theme);
    draw_trend_chart(frame, layout[1], app, theme);
    draw_readings_table(frame, layout[2], app, theme);
}

/// One card per metric with the current value and its threshold verdict.
fn draw_value_cards(frame: &mut Frame, area: Rect, app: &App, theme: &AppTheme) {
    let values = &app.state().live.values;
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    for (metric, card) in Metric::ALL.into_iter().zip(cards.iter()) {
        let value = values.get(metric);
        let status = app.thresholds.evaluate(metric, value);
        let status_color = theme.threshold_color(status);

        let lines = vec![
            Line::from(Span::styled(
                format_value_with_unit(metric, value),
                Style::default()
                    .fg(theme.text_primary)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                status.label(),
                Style::default().fg(status_color),
            )),
        ];

        let block = Block::default()
            .title(Span::styled(
                format!(" {} ", metric.label()),
                Style::default().fg(theme.metric_color(metric)),
            ))
            .borders(Borders::ALL)
            .border_type(BORDER_TYPE)
            .border_style(Style::default().fg(status_color));

        frame.render_widget(
            Paragraph::new(lines).alignment(Alignment::Center).block(block),
            *card,
        );
    }
}

/// Plotted value of a point. Light shares the axis after scaling down.
fn plot_value(point: &ChartPoint, metric: Metric) -> f64 {
    match metric {
        Metric::LightIntensity => point.value(metric) / LIGHT_SCALE,
        _ => point.value(metric),
    }
}

fn legend(metric: Metric) -> String {
    match metric {
        Metric::LightIntensity => format!("{} (/100)", metric.short_label()),
        _ => metric.short_label().to_string(),
    }
}

/// Y-axis bounds: zero or below up to the largest value, with headroom.
fn y_bounds(series: &[(Metric, Vec<(f64, f64)>)]) -> [f64; 2] {
    let values = || series.iter().flat_map(|(_, data)| data.iter().map(|(_, y)| *y));
    let y_min = values().fold(0.0f64, f64::min) * 1.1;
    let y_max = (values().fold(0.0f64, f64::max) * 1.1).max(1.0);
    [y_min, y_max]
}

/// Line chart of every metric over the selected window.
fn draw_trend_chart(frame: &mut Frame, area: Rect, app: &App, theme: &AppTheme) {
    let state = app.state();
    let block = Block::default()
        .title(Span::styled(
            format!(" Trends ({}) ", state.range.label()),
            theme.title_style(),
        ))
        .borders(Borders::ALL)
        .border_type(BORDER_TYPE)
        .border_style(theme.border_active_style());

    let points = app.chart_points();
    if points.is_empty() {
        let text = if state.history_pending {
            "Loading history..."
        } else {
            "No readings in this window"
        };
        let msg = Paragraph::new(text)
            .style(theme.muted_style())
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(msg, area);
        return;
    }

    let series: Vec<(Metric, Vec<(f64, f64)>)> = Metric::ALL
        .into_iter()
        .map(|metric| {
            let data = points
                .iter()
                .enumerate()
                .map(|(i, p)| (i as f64, plot_value(p, metric)))
                .collect();
            (metric, data)
        })
        .collect();

    let datasets: Vec<Dataset> = series
        .iter()
        .map(|(metric, data)| {
            Dataset::default()
                .name(legend(*metric))
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(theme.metric_color(*metric)))
                .data(data)
        })
        .collect();

    let [y_min, y_max] = y_bounds(&series);
    let x_max = (points.len().saturating_sub(1) as f64).max(1.0);

    let first = points.first().map_or("", |p| p.label.as_str());
    let last = points.last().map_or("", |p| p.label.as_str());

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(theme.muted_style())
                .bounds([0.0, x_max])
                .labels(vec![Line::from(first.to_string()), Line::from(last.to_string())]),
        )
        .y_axis(
            Axis::default()
                .style(theme.muted_style())
                .bounds([y_min, y_max])
                .labels(vec![
                    Line::from(format!("{y_min:.0}")),
                    Line::from(format!("{:.0}", (y_min + y_max) / 2.0)),
                    Line::from(format!("{y_max:.0}")),
                ]),
        );

    frame.render_widget(chart, area);
}

/// Summary line for the readings table: mean and spread per metric.
fn summary_line(app: &App, theme: &AppTheme) -> Line<'static> {
    let series = &app.state().history;
    let mut spans = vec![Span::raw(" ")];
    for metric in Metric::ALL {
        let text = match summarize(series, metric) {
            Some(s) => format!(
                "{} {:.*} ({:.*}-{:.*})  ",
                metric.short_label(),
                metric.decimals(),
                s.mean,
                metric.decimals(),
                s.min,
                metric.decimals(),
                s.max,
            ),
            None => format!("{} {}  ", metric.short_label(), MISSING),
        };
        spans.push(Span::styled(text, Style::default().fg(theme.metric_color(metric))));
    }
    Line::from(spans)
}

/// Historical readings, newest first.
fn draw_readings_table(frame: &mut Frame, area: Rect, app: &App, theme: &AppTheme) {
    let series = &app.state().history;
    let block = Block::default()
        .title(Span::styled(
            format!(" Readings ({}) ", series.len()),
            theme.title_style(),
        ))
        .borders(Borders::ALL)
        .border_type(BORDER_TYPE)
        .border_style(theme.border_inactive_style());

    if series.is_empty() {
        let msg = Paragraph::new("No historical readings")
            .style(theme.muted_style())
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(msg, area);
        return;
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(2), Constraint::Length(1)])
        .split(inner);

    let header = Row::new(
        std::iter::once(Cell::from("Time")).chain(
            Metric::ALL
                .iter()
                .map(|m| Cell::from(format!("{} ({})", m.short_label(), m.unit()))),
        ),
    )
    .style(
        Style::default()
            .fg(theme.text_secondary)
            .add_modifier(Modifier::BOLD),
    );

    // Header takes one row.
    let visible = usize::from(layout[0].height.saturating_sub(1));
    let rows: Vec<Row> = series
        .readings()
        .iter()
        .rev()
        .take(visible)
        .map(|reading| {
            let cells = std::iter::once(Cell::from(format_local(reading.timestamp, app.offset)))
                .chain(
                    Metric::ALL
                        .iter()
                        .map(|m| Cell::from(format_value(*m, reading.values.get(*m)))),
                );
            Row::new(cells).style(Style::default().fg(theme.text_primary))
        })
        .collect();

    let widths = [
        Constraint::Length(20),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Min(12),
    ];
    let table = Table::new(rows, widths).header(header);
    frame.render_widget(table, layout[0]);
    frame.render_widget(Paragraph::new(summary_line(app, theme)), layout[1]);
}
