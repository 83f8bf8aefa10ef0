pub mod chart;
pub mod dashboard;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Color;
use ratatui::Frame;

use crate::error::AppError;
use crate::forecast::{ForecastOutcome, Horizon};
use crate::input::UiCommand;
use crate::model::forecast::ForecastPoint;
use crate::session::{DashboardView, FluctuationPanel, ForecastPanel, MODEL_LOADED_MESSAGE};

use chart::{downsample, price_xy, unix_x, ChartSeries, LineChart};
use dashboard::{
    ForecastTable, HorizonBar, KeybindBar, NoticePanel, SampleTable, StatusPanel, TitleBar,
};

const MAX_INPUT_DIGITS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Overview,
    Forecast,
    Fluctuations,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Overview, Tab::Forecast, Tab::Fluctuations];

    pub fn title(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Forecast => "Forecast Charts",
            Self::Fluctuations => "Price Fluctuations",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

pub struct AppState {
    pub horizon: Horizon,
    pub pending_input: String,
    pub tab: Tab,
    pub forecast_scroll: usize,
    pub chart_points: usize,
    pub view: Option<DashboardView>,
    /// Set when a run failed fatally; the session stops reacting to input.
    pub fatal: Option<String>,
}

impl AppState {
    pub fn new(horizon: Horizon, chart_points: usize) -> Self {
        Self {
            horizon,
            pending_input: String::new(),
            tab: Tab::Overview,
            forecast_scroll: 0,
            chart_points,
            view: None,
            fatal: None,
        }
    }

    pub fn is_halted(&self) -> bool {
        self.fatal.is_some()
    }

    pub fn set_run_result(&mut self, result: Result<DashboardView, AppError>) {
        match result {
            Ok(view) => {
                self.view = Some(view);
                self.fatal = None;
            }
            Err(e) => {
                self.view = None;
                self.fatal = Some(e.to_string());
            }
        }
        self.forecast_scroll = 0;
    }

    fn future_len(&self) -> usize {
        self.view
            .as_ref()
            .and_then(|v| v.forecast.outcome())
            .map(|o| o.future.len())
            .unwrap_or(0)
    }

    fn change_horizon(&mut self, next: Horizon) -> Option<Horizon> {
        self.pending_input.clear();
        if next == self.horizon {
            return None;
        }
        self.horizon = next;
        Some(next)
    }

    /// Returns the new horizon when the command requires a fresh run.
    pub fn apply(&mut self, cmd: UiCommand) -> Option<Horizon> {
        if self.is_halted() {
            return None;
        }
        match cmd {
            UiCommand::AdjustHorizon(delta) => self.change_horizon(self.horizon.offset(delta)),
            UiCommand::TypeDigit(d) => {
                if self.pending_input.len() < MAX_INPUT_DIGITS
                    && !(self.pending_input.is_empty() && d == 0)
                {
                    self.pending_input.push(char::from(b'0' + d));
                }
                None
            }
            UiCommand::EraseDigit => {
                self.pending_input.pop();
                None
            }
            UiCommand::SubmitHorizon => {
                let minutes: i64 = self.pending_input.parse().ok()?;
                self.change_horizon(Horizon::clamped(minutes))
            }
            UiCommand::CancelEdit => {
                self.pending_input.clear();
                None
            }
            UiCommand::NextTab => {
                self.tab = self.tab.next();
                None
            }
            UiCommand::PrevTab => {
                self.tab = self.tab.prev();
                None
            }
            UiCommand::ScrollDown => {
                let max_scroll = self.future_len().saturating_sub(1);
                self.forecast_scroll = (self.forecast_scroll + 1).min(max_scroll);
                None
            }
            UiCommand::ScrollUp => {
                self.forecast_scroll = self.forecast_scroll.saturating_sub(1);
                None
            }
            UiCommand::Quit => None,
        }
    }
}

pub fn render(frame: &mut Frame, state: &AppState) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // title + tabs
            Constraint::Length(3), // status messages
            Constraint::Length(1), // horizon input
            Constraint::Min(6),    // body
            Constraint::Length(1), // keybinds
        ])
        .split(frame.area());

    frame.render_widget(TitleBar { tab: state.tab }, outer[0]);
    frame.render_widget(
        KeybindBar {
            halted: state.is_halted(),
        },
        outer[4],
    );

    if let Some(message) = &state.fatal {
        frame.render_widget(
            NoticePanel {
                title: "Error",
                message,
                color: Color::Red,
            },
            outer[1].union(outer[3]),
        );
        return;
    }

    let Some(view) = &state.view else {
        frame.render_widget(
            NoticePanel {
                title: "Loading",
                message: "Loading price history and model...",
                color: Color::DarkGray,
            },
            outer[3],
        );
        return;
    };

    let mut messages = vec![view.row_count_message()];
    if let Some(dropped) = view.dropped_rows_message() {
        messages[0] = format!("{} {}", messages[0], dropped);
    }
    messages.push(MODEL_LOADED_MESSAGE.to_string());
    frame.render_widget(StatusPanel { messages: &messages }, outer[1]);

    frame.render_widget(
        HorizonBar {
            horizon: state.horizon,
            pending_input: &state.pending_input,
        },
        outer[2],
    );

    match state.tab {
        Tab::Overview => render_overview(frame, state, view, outer[3]),
        Tab::Forecast => render_forecast_charts(frame, state, view, outer[3]),
        Tab::Fluctuations => render_fluctuations(frame, state, view, outer[3]),
    }
}

fn render_forecast_error(frame: &mut Frame, message: &str, area: Rect) {
    frame.render_widget(
        NoticePanel {
            title: "Forecast",
            message,
            color: Color::Red,
        },
        area,
    );
}

fn render_overview(frame: &mut Frame, state: &AppState, view: &DashboardView, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(
                u16::try_from(view.sample.len())
                    .unwrap_or(u16::MAX)
                    .saturating_add(3),
            ),
            Constraint::Min(4),
        ])
        .split(area);

    frame.render_widget(SampleTable::new(&view.sample), rows[0]);

    match &view.forecast {
        ForecastPanel::Ready(outcome) => frame.render_widget(
            ForecastTable::new(&outcome.future, outcome.horizon).scroll(state.forecast_scroll),
            rows[1],
        ),
        ForecastPanel::Failed(message) => render_forecast_error(frame, message, rows[1]),
    }
}

fn overlay_series(
    view: &DashboardView,
    outcome: &ForecastOutcome,
    max_points: usize,
) -> Vec<ChartSeries> {
    let column = |f: fn(&ForecastPoint) -> f64| {
        let xy: Vec<(f64, f64)> = outcome
            .full
            .points
            .iter()
            .map(|p| (unix_x(p.timestamp), f(p)))
            .collect();
        downsample(&xy, max_points)
    };
    vec![
        ChartSeries::new(
            "observed",
            downsample(&price_xy(view.series.points()), max_points),
            Color::White,
        ),
        ChartSeries::new("lower", column(|p| p.lower_bound), Color::DarkGray),
        ChartSeries::new("upper", column(|p| p.upper_bound), Color::DarkGray),
        ChartSeries::new("predicted", column(|p| p.predicted), Color::Cyan),
    ]
}

fn render_forecast_charts(frame: &mut Frame, state: &AppState, view: &DashboardView, area: Rect) {
    let outcome = match &view.forecast {
        ForecastPanel::Ready(outcome) => outcome,
        ForecastPanel::Failed(message) => {
            render_forecast_error(frame, message, area);
            return;
        }
    };

    let halves = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let overlay = overlay_series(view, outcome, state.chart_points);
    frame.render_widget(LineChart::new("Forecast", &overlay), halves[0]);

    let components = &outcome.full.components;
    if components.is_empty() {
        return;
    }
    let slots = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Ratio(1, components.len() as u32);
            components.len()
        ])
        .split(halves[1]);
    for (component, slot) in components.iter().zip(slots.iter()) {
        let xy: Vec<(f64, f64)> = outcome
            .full
            .points
            .iter()
            .zip(component.values.iter())
            .map(|(p, v)| (unix_x(p.timestamp), *v))
            .collect();
        let series = [ChartSeries::new(
            component.name.clone(),
            downsample(&xy, state.chart_points),
            Color::Cyan,
        )];
        frame.render_widget(
            LineChart::new(&component.name, &series).y_title(&component.name),
            *slot,
        );
    }
}

fn render_fluctuations(frame: &mut Frame, state: &AppState, view: &DashboardView, area: Rect) {
    let count = view.fluctuations.len().max(1) as u32;
    let slots = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, count); count as usize])
        .split(area);

    for (panel, slot) in view.fluctuations.iter().zip(slots.iter()) {
        match panel {
            FluctuationPanel::Chart { window, points } => {
                let series = [ChartSeries::new(
                    "close",
                    downsample(&price_xy(points), state.chart_points),
                    Color::Cyan,
                )];
                frame.render_widget(LineChart::new(window.title(), &series), *slot);
            }
            FluctuationPanel::NoData { window } => frame.render_widget(
                NoticePanel {
                    title: window.title(),
                    message: window.empty_notice(),
                    color: Color::Yellow,
                },
                *slot,
            ),
        }
    }
}
