use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs, Widget, Wrap},
};

use crate::forecast::{Horizon, MAX_HORIZON_MINUTES, MIN_HORIZON_MINUTES};
use crate::model::forecast::ForecastPoint;
use crate::model::price::PricePoint;

use super::Tab;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn panel_block(title: String) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
}

fn header_row(labels: &[&'static str]) -> Row<'static> {
    Row::new(labels.iter().map(|l| Cell::from(*l))).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )
}

pub struct TitleBar {
    pub tab: Tab,
}

impl Widget for TitleBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = Line::from(vec![
            Span::styled(
                " Bitcoin Price Forecast ",
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("| ", Style::default().fg(Color::DarkGray)),
        ]);
        let title_width = title.width() as u16;
        buf.set_line(area.x, area.y, &title, area.width);

        if area.width > title_width {
            let tabs_area = Rect {
                x: area.x + title_width,
                width: area.width - title_width,
                ..area
            };
            Tabs::new(Tab::ALL.iter().map(|t| t.title()))
                .select(self.tab.index())
                .style(Style::default().fg(Color::DarkGray))
                .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .render(tabs_area, buf);
        }
    }
}

pub struct StatusPanel<'a> {
    pub messages: &'a [String],
}

impl Widget for StatusPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines: Vec<Line> = self
            .messages
            .iter()
            .map(|m| Line::from(Span::styled(m.as_str(), Style::default().fg(Color::Green))))
            .collect();
        Paragraph::new(lines).render(area, buf);
    }
}

pub struct HorizonBar<'a> {
    pub horizon: Horizon,
    pub pending_input: &'a str,
}

impl Widget for HorizonBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans = vec![
            Span::styled(
                format!(
                    " Minutes to forecast ({}-{}): ",
                    MIN_HORIZON_MINUTES, MAX_HORIZON_MINUTES
                ),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(
                self.horizon.minutes().to_string(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
        ];
        if !self.pending_input.is_empty() {
            spans.push(Span::styled("  new: ", Style::default().fg(Color::DarkGray)));
            spans.push(Span::styled(
                format!("{}_", self.pending_input),
                Style::default().fg(Color::Yellow),
            ));
        }
        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}

pub struct SampleTable<'a> {
    rows: &'a [PricePoint],
}

impl<'a> SampleTable<'a> {
    pub fn new(rows: &'a [PricePoint]) -> Self {
        Self { rows }
    }
}

impl Widget for SampleTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let rows = self.rows.iter().map(|p| {
            Row::new(vec![
                Cell::from(p.timestamp.format(TIMESTAMP_FORMAT).to_string()),
                Cell::from(format!("{:.2}", p.close)),
            ])
        });
        Table::new(rows, [Constraint::Length(21), Constraint::Min(12)])
            .header(header_row(&["Timestamp", "Close"]))
            .block(panel_block(" Latest Price Data Sample ".to_string()))
            .render(area, buf);
    }
}

pub struct ForecastTable<'a> {
    rows: &'a [ForecastPoint],
    horizon: Horizon,
    scroll: usize,
}

impl<'a> ForecastTable<'a> {
    pub fn new(rows: &'a [ForecastPoint], horizon: Horizon) -> Self {
        Self {
            rows,
            horizon,
            scroll: 0,
        }
    }

    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }
}

impl Widget for ForecastTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let start = self.scroll.min(self.rows.len().saturating_sub(1));
        let rows = self.rows[start..].iter().map(|p| {
            Row::new(vec![
                Cell::from(p.timestamp.format(TIMESTAMP_FORMAT).to_string()),
                Cell::from(format!("{:.2}", p.predicted)),
                Cell::from(format!("{:.2}", p.lower_bound)),
                Cell::from(format!("{:.2}", p.upper_bound)),
            ])
        });
        let title = format!(
            " Forecast for next {} minutes ({} rows) ",
            self.horizon.minutes(),
            self.rows.len()
        );
        Table::new(
            rows,
            [
                Constraint::Length(21),
                Constraint::Length(14),
                Constraint::Length(14),
                Constraint::Length(14),
            ],
        )
        .header(header_row(&["Timestamp", "Predicted", "Lower", "Upper"]))
        .block(panel_block(title))
        .render(area, buf);
    }
}

/// Bordered one-message panel, used for errors and "no data" notices.
pub struct NoticePanel<'a> {
    pub title: &'a str,
    pub message: &'a str,
    pub color: Color,
}

impl Widget for NoticePanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(Span::styled(self.message, Style::default().fg(self.color)))
            .wrap(Wrap { trim: true })
            .block(panel_block(format!(" {} ", self.title)))
            .render(area, buf);
    }
}

pub struct KeybindBar {
    pub halted: bool,
}

impl Widget for KeybindBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let key = Style::default().fg(Color::Yellow);
        let text = Style::default().fg(Color::DarkGray);
        let line = if self.halted {
            Line::from(vec![
                Span::styled(" [Q]", key),
                Span::styled("uit", text),
            ])
        } else {
            Line::from(vec![
                Span::styled(" [Q]", key),
                Span::styled("uit  ", text),
                Span::styled("[+/-]", key),
                Span::styled(" horizon  ", text),
                Span::styled("[PgUp/PgDn]", key),
                Span::styled(" ±60  ", text),
                Span::styled("[0-9 Enter]", key),
                Span::styled(" set  ", text),
                Span::styled("[Tab]", key),
                Span::styled(" view  ", text),
                Span::styled("[j/k]", key),
                Span::styled(" scroll", text),
            ])
        };
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
