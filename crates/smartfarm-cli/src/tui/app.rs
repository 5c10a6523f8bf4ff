//! Application state for the terminal dashboard.
//!
//! [`App`] wraps the [`Dashboard`] state container with the pieces only the
//! terminal needs: help overlay, quit flag and the redraw flag fed by the
//! dashboard's change observer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use time::UtcOffset;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use smartfarm_core::{
    ChartPoint, Dashboard, DashboardEvent, DashboardState, DevicePath, Thresholds, chart_series,
};
use smartfarm_types::TimeRange;

use crate::format::local_offset;

/// Main application state for the dashboard.
pub struct App {
    /// Session state and its transitions.
    pub dashboard: Dashboard,
    /// Optimal ranges for the threshold cards.
    pub thresholds: Thresholds,
    /// Receiver for events from the background worker.
    pub event_rx: mpsc::UnboundedReceiver<DashboardEvent>,
    /// Whether the help overlay is shown.
    pub show_help: bool,
    /// Whether the application should exit.
    pub should_quit: bool,
    /// Name of the data source, for the header.
    pub source_name: String,
    /// Monitored device path.
    pub device: DevicePath,
    /// Offset used for chart and table timestamps.
    pub offset: UtcOffset,
    dirty: Arc<AtomicBool>,
}

impl App {
    /// Create a new application state.
    pub fn new(
        source_name: impl Into<String>,
        device: DevicePath,
        range: TimeRange,
        thresholds: Thresholds,
        event_rx: mpsc::UnboundedReceiver<DashboardEvent>,
    ) -> Self {
        let dirty = Arc::new(AtomicBool::new(true));
        let mut dashboard = Dashboard::new(range);
        let flag = Arc::clone(&dirty);
        dashboard.on_change(move |_| flag.store(true, Ordering::Release));

        Self {
            dashboard,
            thresholds,
            event_rx,
            show_help: false,
            should_quit: false,
            source_name: source_name.into(),
            device,
            offset: local_offset(),
            dirty,
        }
    }

    /// Current dashboard state.
    pub fn state(&self) -> &DashboardState {
        self.dashboard.state()
    }

    /// Whether the full-screen error view is showing.
    pub fn is_error(&self) -> bool {
        self.state().error_message().is_some()
    }

    /// Returns `true` once after any change that needs a redraw.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    /// Request a redraw for a change outside the dashboard state.
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        self.mark_dirty();
    }

    /// Plot points for the current series.
    pub fn chart_points(&self) -> Vec<ChartPoint> {
        chart_series(&self.state().history, self.offset)
    }

    /// Apply an event from the background worker.
    ///
    /// Live events from a session before the last reload are dropped.
    pub fn handle_dashboard_event(&mut self, event: DashboardEvent) {
        match event {
            DashboardEvent::Live { session, event } => {
                if !self.dashboard.is_current_session(session) {
                    debug!(session, "Dropping live event of released subscription");
                    return;
                }
                self.dashboard.apply_live(&event);
            }
            DashboardEvent::SubscriptionFailed { session, message } => {
                if !self.dashboard.is_current_session(session) {
                    debug!(session, "Dropping failure of released subscription");
                    return;
                }
                warn!(error = %message, "Live subscription failed to start");
                self.dashboard.subscription_failed(&message);
            }
            DashboardEvent::History {
                generation,
                range,
                result,
            } => {
                let applied = self.dashboard.apply_history(generation, result);
                debug!(range = %range, generation, applied, "Historical response received");
            }
        }
    }
}
