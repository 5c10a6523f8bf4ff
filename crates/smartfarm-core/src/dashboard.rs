//! Dashboard state container.
//!
//! [`Dashboard`] owns the session state and is the only thing that mutates
//! it. Every change goes through one of its transitions, and every
//! transition notifies the registered observers with the new state.
//!
//! Historical fetches are tracked with a generation counter: each request
//! gets a fresh number, and [`Dashboard::apply_history`] drops any response
//! whose number is not the latest issued. A slow response for a window the
//! user has already left can therefore never overwrite the current one.
//!
//! The live channel is tracked the same way with a session number that only
//! [`Dashboard::reset`] advances.
//!
//! # Example
//!
//! ```
//! use smartfarm_core::Dashboard;
//! use smartfarm_types::{HistoricalSeries, TimeRange};
//!
//! let mut dashboard = Dashboard::new(TimeRange::Day);
//! let first = dashboard.refresh_history();
//! let second = dashboard.select_range(TimeRange::Week);
//!
//! // The 24h response arrives after the 7d request was issued.
//! let stale = HistoricalSeries::empty(first.range);
//! assert!(!dashboard.apply_history(first.generation, Ok(stale)));
//! assert!(dashboard.apply_history(second.generation, Ok(HistoricalSeries::empty(second.range))));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use smartfarm_types::{HistoricalSeries, LiveEvent, LiveState, LiveStatus, TimeRange};

/// Dashboard view tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    /// Current values, thresholds, trend chart and history table.
    #[default]
    Data,
    /// Distribution and averages charts.
    Analytics,
}

impl Tab {
    /// All tabs in display order.
    pub const ALL: [Tab; 2] = [Tab::Data, Tab::Analytics];

    /// Tab title.
    pub fn label(self) -> &'static str {
        match self {
            Tab::Data => "Data",
            Tab::Analytics => "Analytics",
        }
    }

    /// Position in [`Tab::ALL`].
    pub fn index(self) -> usize {
        match self {
            Tab::Data => 0,
            Tab::Analytics => 1,
        }
    }

    /// The following tab, wrapping around.
    pub fn next(self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    /// The preceding tab, wrapping around.
    pub fn previous(self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A historical fetch the dashboard wants made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryRequest {
    /// Window to fetch.
    pub range: TimeRange,
    /// Tag to hand back to [`Dashboard::apply_history`].
    pub generation: u64,
}

/// Everything the renderer draws from.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    /// Latest reading and channel status.
    pub live: LiveState,
    /// Series for the selected window.
    pub history: HistoricalSeries,
    /// Selected tab.
    pub tab: Tab,
    /// Selected window.
    pub range: TimeRange,
    /// True until the first live event arrives.
    pub loading: bool,
    /// A historical fetch is in flight.
    pub history_pending: bool,
    /// Message of the last failed historical fetch, cleared on success.
    pub last_history_error: Option<String>,
}

impl DashboardState {
    fn initial(range: TimeRange) -> Self {
        Self {
            live: LiveState::default(),
            history: HistoricalSeries::empty(range),
            tab: Tab::default(),
            range,
            loading: true,
            history_pending: false,
            last_history_error: None,
        }
    }

    /// The message for the full-screen error view, if the live channel failed.
    pub fn error_message(&self) -> Option<&str> {
        match &self.live.status {
            LiveStatus::Error(message) => Some(message),
            _ => None,
        }
    }
}

type Observer = Box<dyn FnMut(&DashboardState) + Send>;

/// State container with discrete transitions and change observers.
pub struct Dashboard {
    state: DashboardState,
    generation: u64,
    session: u64,
    observers: Vec<Observer>,
}

impl fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dashboard")
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("session", &self.session)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(TimeRange::default())
    }
}

impl Dashboard {
    /// A fresh dashboard showing `range`.
    pub fn new(range: TimeRange) -> Self {
        Self {
            state: DashboardState::initial(range),
            generation: 0,
            session: 0,
            observers: Vec::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Generation of the latest issued historical request.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current live-subscription session.
    pub fn session(&self) -> u64 {
        self.session
    }

    /// Whether live events stamped with `session` belong to this session.
    pub fn is_current_session(&self, session: u64) -> bool {
        session == self.session
    }

    /// Register an observer called after every transition.
    pub fn on_change(&mut self, observer: impl FnMut(&DashboardState) + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn notify(&mut self) {
        for observer in &mut self.observers {
            observer(&self.state);
        }
    }

    fn issue_history(&mut self) -> HistoryRequest {
        self.generation += 1;
        self.state.history_pending = true;
        HistoryRequest {
            range: self.state.range,
            generation: self.generation,
        }
    }

    /// Apply a live event. Events are applied in arrival order.
    pub fn apply_live(&mut self, event: &LiveEvent) {
        self.state.live = self.state.live.apply(event);
        self.state.loading = false;
        debug!(status = %self.state.live.status, "Live state updated");
        self.notify();
    }

    /// The live channel could not be opened.
    pub fn subscription_failed(&mut self, message: &str) {
        self.apply_live(&LiveEvent::Failed(message.to_string()));
    }

    /// Select a window and request its history.
    ///
    /// Selecting the current window still issues a new request.
    pub fn select_range(&mut self, range: TimeRange) -> HistoryRequest {
        self.state.range = range;
        let request = self.issue_history();
        info!(range = %range, generation = request.generation, "Time range selected");
        self.notify();
        request
    }

    /// Request the current window again.
    pub fn refresh_history(&mut self) -> HistoryRequest {
        let request = self.issue_history();
        self.notify();
        request
    }

    /// Apply the outcome of a historical request.
    ///
    /// Returns `false` (and changes nothing) for a stale generation. A
    /// failure is recorded and logged but keeps the previous series and
    /// never touches the live state.
    pub fn apply_history(
        &mut self,
        generation: u64,
        result: std::result::Result<HistoricalSeries, String>,
    ) -> bool {
        if generation != self.generation {
            warn!(
                generation,
                latest = self.generation,
                "Dropping stale historical response"
            );
            return false;
        }

        self.state.history_pending = false;
        match result {
            Ok(series) => {
                self.state.history = series;
                self.state.last_history_error = None;
            }
            Err(message) => {
                warn!(range = %self.state.range, error = %message, "Keeping previous history");
                self.state.last_history_error = Some(message);
            }
        }
        self.notify();
        true
    }

    /// Show `tab`.
    pub fn select_tab(&mut self, tab: Tab) {
        if self.state.tab != tab {
            self.state.tab = tab;
            self.notify();
        }
    }

    /// Show the following tab.
    pub fn next_tab(&mut self) {
        self.select_tab(self.state.tab.next());
    }

    /// Show the preceding tab.
    pub fn previous_tab(&mut self) {
        self.select_tab(self.state.tab.previous());
    }

    /// Full reload: back to the initial state for the selected window.
    ///
    /// In-flight historical responses and live events of the previous
    /// session become stale. Returns the request for the reloaded window.
    pub fn reset(&mut self) -> HistoryRequest {
        self.session += 1;
        info!(session = self.session, "Reloading dashboard");
        self.state = DashboardState::initial(self.state.range);
        let request = self.issue_history();
        self.notify();
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartfarm_types::{Metric, Reading, SensorValue, SensorValues};
    use std::sync::{Arc, Mutex};
    use time::macros::datetime;

    fn update(temperature: f64) -> LiveEvent {
        LiveEvent::Update {
            values: SensorValues::missing().with(Metric::Temperature, temperature),
            status: LiveStatus::Ready,
            received_at: Some(datetime!(2024-01-01 00:00:00 UTC)),
        }
    }

    fn series(range: TimeRange, n: usize) -> HistoricalSeries {
        let readings = (0..n)
            .map(|i| {
                Reading::new(
                    datetime!(2024-01-01 00:00:00 UTC) + time::Duration::minutes(i as i64),
                    SensorValues::missing(),
                )
            })
            .collect();
        HistoricalSeries::new(range, readings)
    }

    #[test]
    fn test_initial_state() {
        let d = Dashboard::new(TimeRange::Day);
        let s = d.state();
        assert!(s.loading);
        assert_eq!(s.live.status, LiveStatus::Connecting);
        assert_eq!(s.live.values, SensorValues::loading());
        assert_eq!(s.tab, Tab::Data);
        assert!(s.history.is_empty());
        assert!(s.error_message().is_none());
    }

    #[test]
    fn test_live_update_clears_loading() {
        let mut d = Dashboard::default();
        d.apply_live(&update(21.3));
        assert!(!d.state().loading);
        assert_eq!(d.state().live.values.temperature, SensorValue::Numeric(21.3));
    }

    #[test]
    fn test_runtime_failure_keeps_values_and_recovers() {
        let mut d = Dashboard::default();
        d.apply_live(&update(21.3));
        d.apply_live(&LiveEvent::Failed("permission denied".into()));
        assert_eq!(d.state().error_message(), Some("permission denied"));
        assert_eq!(d.state().live.values.temperature, SensorValue::Numeric(21.3));

        d.apply_live(&update(22.0));
        assert!(d.state().error_message().is_none());
    }

    #[test]
    fn test_subscription_failed_shows_error() {
        let mut d = Dashboard::default();
        d.subscription_failed("Failed to initialize subscription: offline");
        assert!(!d.state().loading);
        assert!(d.state().error_message().unwrap().contains("offline"));
    }

    #[test]
    fn test_stale_history_dropped() {
        let mut d = Dashboard::new(TimeRange::Day);
        let old = d.refresh_history();
        let new = d.select_range(TimeRange::Week);
        assert!(new.generation > old.generation);

        assert!(d.apply_history(new.generation, Ok(series(TimeRange::Week, 3))));
        assert!(!d.apply_history(old.generation, Ok(series(TimeRange::Day, 9))));
        assert_eq!(d.state().history.range(), TimeRange::Week);
        assert_eq!(d.state().history.len(), 3);
    }

    #[test]
    fn test_history_failure_keeps_series() {
        let mut d = Dashboard::default();
        let first = d.refresh_history();
        d.apply_history(first.generation, Ok(series(TimeRange::Day, 2)));
        d.apply_live(&update(20.0));

        let second = d.refresh_history();
        assert!(d.state().history_pending);
        assert!(d.apply_history(second.generation, Err("timeout".into())));
        assert_eq!(d.state().history.len(), 2);
        assert_eq!(d.state().last_history_error.as_deref(), Some("timeout"));
        assert_eq!(d.state().live.status, LiveStatus::Ready);
        assert!(!d.state().history_pending);
    }

    #[test]
    fn test_tabs_wrap() {
        let mut d = Dashboard::default();
        d.next_tab();
        assert_eq!(d.state().tab, Tab::Analytics);
        d.next_tab();
        assert_eq!(d.state().tab, Tab::Data);
        d.previous_tab();
        assert_eq!(d.state().tab, Tab::Analytics);
    }

    #[test]
    fn test_reset_restores_initial_and_invalidates_in_flight() {
        let mut d = Dashboard::new(TimeRange::SixHours);
        let in_flight = d.refresh_history();
        d.subscription_failed("offline");
        d.select_tab(Tab::Analytics);

        let old_session = d.session();
        let reload = d.reset();
        assert_eq!(reload.range, TimeRange::SixHours);
        assert!(!d.is_current_session(old_session));
        assert!(d.is_current_session(d.session()));
        assert!(d.state().loading);
        assert_eq!(d.state().tab, Tab::Data);
        assert!(d.state().error_message().is_none());
        assert!(!d.apply_history(in_flight.generation, Ok(series(TimeRange::SixHours, 1))));
    }

    #[test]
    fn test_observers_notified_per_transition() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut d = Dashboard::default();
        d.on_change(move |state| sink.lock().unwrap().push(state.range));

        d.apply_live(&update(20.0));
        let req = d.select_range(TimeRange::OneHour);
        d.apply_history(req.generation - 1, Ok(series(TimeRange::Day, 1)));
        d.select_tab(Tab::Data);

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![TimeRange::Day, TimeRange::OneHour]);
    }
}
