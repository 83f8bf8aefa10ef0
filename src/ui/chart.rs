use chrono::{DateTime, Utc};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    symbols::Marker,
    text::Line,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget},
};

use crate::model::price::PricePoint;

/// One line on a chart. `x` is Unix seconds.
#[derive(Debug, Clone)]
pub struct ChartSeries {
    pub name: String,
    pub points: Vec<(f64, f64)>,
    pub color: Color,
}

impl ChartSeries {
    pub fn new(name: impl Into<String>, points: Vec<(f64, f64)>, color: Color) -> Self {
        Self {
            name: name.into(),
            points,
            color,
        }
    }
}

pub fn unix_x(ts: DateTime<Utc>) -> f64 {
    ts.timestamp() as f64 + ts.timestamp_subsec_millis() as f64 / 1000.0
}

pub fn price_xy(points: &[PricePoint]) -> Vec<(f64, f64)> {
    points.iter().map(|p| (unix_x(p.timestamp), p.close)).collect()
}

/// Evenly thin `points` to at most `max_points`, always keeping both ends.
pub fn downsample(points: &[(f64, f64)], max_points: usize) -> Vec<(f64, f64)> {
    let max_points = max_points.max(2);
    if points.len() <= max_points {
        return points.to_vec();
    }
    let last = points.len() - 1;
    let step = last as f64 / (max_points - 1) as f64;
    (0..max_points)
        .map(|i| points[((i as f64 * step).round() as usize).min(last)])
        .collect()
}

fn time_label(x: f64) -> String {
    DateTime::from_timestamp(x as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn padded(min: f64, max: f64) -> [f64; 2] {
    let range = max - min;
    let pad = if range < 0.01 { 1.0 } else { range * 0.05 };
    [min - pad, max + pad]
}

pub struct LineChart<'a> {
    title: &'a str,
    series: &'a [ChartSeries],
    y_title: &'a str,
}

impl<'a> LineChart<'a> {
    pub fn new(title: &'a str, series: &'a [ChartSeries]) -> Self {
        Self {
            title,
            series,
            y_title: "Price (USD)",
        }
    }

    pub fn y_title(mut self, y_title: &'a str) -> Self {
        self.y_title = y_title;
        self
    }
}

impl Widget for LineChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(format!(" {} ", self.title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));

        let all = self.series.iter().flat_map(|s| s.points.iter());
        let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for &(x, y) in all {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
        if !x_min.is_finite() {
            Paragraph::new("No data.")
                .style(Style::default().fg(Color::DarkGray))
                .block(block)
                .render(area, buf);
            return;
        }
        if x_max - x_min < 1.0 {
            x_max = x_min + 1.0;
        }
        let y_bounds = padded(y_min, y_max);

        let datasets: Vec<Dataset> = self
            .series
            .iter()
            .map(|s| {
                Dataset::default()
                    .name(s.name.as_str())
                    .marker(Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(s.color))
                    .data(&s.points)
            })
            .collect();

        let label_style = Style::default().fg(Color::DarkGray);
        let x_axis = Axis::default()
            .title("Time")
            .style(label_style)
            .bounds([x_min, x_max])
            .labels(vec![
                Line::from(time_label(x_min)),
                Line::from(time_label(x_max)),
            ]);
        let y_axis = Axis::default()
            .title(self.y_title)
            .style(label_style)
            .bounds(y_bounds)
            .labels(vec![
                Line::from(format!("{:.1}", y_bounds[0])),
                Line::from(format!("{:.1}", y_bounds[1])),
            ]);

        Chart::new(datasets)
            .block(block)
            .x_axis(x_axis)
            .y_axis(y_axis)
            .render(area, buf);
    }
}
