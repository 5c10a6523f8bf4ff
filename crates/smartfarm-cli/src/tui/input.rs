//! Keyboard input handling for the dashboard.
//!
//! Keys are translated into [`Action`]s, and actions are applied to the
//! [`App`], yielding the [`Command`]s the background worker must run.
//!
//! # Key Bindings
//!
//! | Key       | Action                                  |
//! |-----------|-----------------------------------------|
//! | `q`       | Quit                                    |
//! | `Tab` / `l` | Next tab                              |
//! | `BackTab` / `h` | Previous tab                      |
//! | `1`-`5`   | Select 1h / 6h / 24h / 7d / 30d         |
//! | `r`       | Refresh history (Retry in error view)   |
//! | `?`       | Toggle help                             |
//! | `Esc`     | Close help                              |

use crossterm::event::KeyCode;

use smartfarm_core::Command;
use smartfarm_types::TimeRange;

use super::app::App;

/// User actions that can be triggered by keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Quit the application.
    Quit,
    /// Switch to the next tab.
    NextTab,
    /// Switch to the previous tab.
    PreviousTab,
    /// Select a historical window.
    SelectRange(TimeRange),
    /// Fetch the current window again.
    Refresh,
    /// Full reload from the error view.
    Retry,
    /// Toggle the help overlay.
    ToggleHelp,
    /// No action.
    None,
}

/// Map a key to an action.
///
/// The error view only offers Retry and Quit. While help is open, keys
/// other than `?`, `Esc` and `q` are ignored.
pub fn handle_key(key: KeyCode, in_error: bool, show_help: bool) -> Action {
    if show_help {
        return match key {
            KeyCode::Char('?') | KeyCode::Esc => Action::ToggleHelp,
            KeyCode::Char('q') => Action::Quit,
            _ => Action::None,
        };
    }

    if in_error {
        return match key {
            KeyCode::Char('r') | KeyCode::Enter => Action::Retry,
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('?') => Action::ToggleHelp,
            _ => Action::None,
        };
    }

    match key {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Tab | KeyCode::Char('l') => Action::NextTab,
        KeyCode::BackTab | KeyCode::Char('h') => Action::PreviousTab,
        KeyCode::Char(c @ '1'..='5') => {
            let index = (c as usize) - ('1' as usize);
            Action::SelectRange(TimeRange::ALL[index])
        }
        KeyCode::Char('r') => Action::Refresh,
        KeyCode::Char('?') => Action::ToggleHelp,
        _ => Action::None,
    }
}

/// Apply an action to the application state.
///
/// Returns the commands to send to the background worker, in order.
pub fn apply_action(app: &mut App, action: Action) -> Vec<Command> {
    match action {
        Action::Quit => {
            app.should_quit = true;
            Vec::new()
        }
        Action::NextTab => {
            app.dashboard.next_tab();
            Vec::new()
        }
        Action::PreviousTab => {
            app.dashboard.previous_tab();
            Vec::new()
        }
        Action::SelectRange(range) => {
            let request = app.dashboard.select_range(range);
            vec![
                Command::Subscribe {
                    session: app.dashboard.session(),
                },
                Command::FetchHistory(request),
            ]
        }
        Action::Refresh => vec![Command::FetchHistory(app.dashboard.refresh_history())],
        Action::Retry => {
            let request = app.dashboard.reset();
            vec![
                Command::Resubscribe {
                    session: app.dashboard.session(),
                },
                Command::FetchHistory(request),
            ]
        }
        Action::ToggleHelp => {
            app.toggle_help();
            Vec::new()
        }
        Action::None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartfarm_core::{DevicePath, Tab, Thresholds};
    use smartfarm_types::LiveStatus;
    use tokio::sync::mpsc;

    fn app() -> App {
        let (_tx, rx) = mpsc::unbounded_channel();
        App::new("mock", DevicePath::default(), TimeRange::Day, Thresholds::default(), rx)
    }

    #[test]
    fn test_number_keys_select_ranges() {
        let ranges: Vec<_> = ['1', '2', '3', '4', '5']
            .into_iter()
            .map(|c| handle_key(KeyCode::Char(c), false, false))
            .collect();
        assert_eq!(
            ranges,
            TimeRange::ALL.map(Action::SelectRange).to_vec()
        );
        assert_eq!(handle_key(KeyCode::Char('6'), false, false), Action::None);
    }

    #[test]
    fn test_tab_keys() {
        assert_eq!(handle_key(KeyCode::Tab, false, false), Action::NextTab);
        assert_eq!(handle_key(KeyCode::BackTab, false, false), Action::PreviousTab);
        assert_eq!(handle_key(KeyCode::Char('l'), false, false), Action::NextTab);
    }

    #[test]
    fn test_error_view_ignores_navigation() {
        assert_eq!(handle_key(KeyCode::Tab, true, false), Action::None);
        assert_eq!(handle_key(KeyCode::Char('2'), true, false), Action::None);
        assert_eq!(handle_key(KeyCode::Enter, true, false), Action::Retry);
        assert_eq!(handle_key(KeyCode::Char('q'), true, false), Action::Quit);
    }

    #[test]
    fn test_help_overlay_captures_keys() {
        assert_eq!(handle_key(KeyCode::Char('?'), false, false), Action::ToggleHelp);
        assert_eq!(handle_key(KeyCode::Esc, false, true), Action::ToggleHelp);
        assert_eq!(handle_key(KeyCode::Char('1'), false, true), Action::None);
        assert_eq!(handle_key(KeyCode::Char('q'), false, true), Action::Quit);
    }

    #[test]
    fn test_select_range_subscribes_and_fetches() {
        let mut app = app();
        let commands = apply_action(&mut app, Action::SelectRange(TimeRange::Week));

        assert_eq!(app.state().range, TimeRange::Week);
        assert!(app.state().history_pending);
        match commands.as_slice() {
            [Command::Subscribe { session: 0 }, Command::FetchHistory(request)] => {
                assert_eq!(request.range, TimeRange::Week);
                assert_eq!(request.generation, app.dashboard.generation());
            }
            other => panic!("unexpected commands: {other:?}"),
        }
    }

    #[test]
    fn test_reselecting_same_range_fetches_again() {
        let mut app = app();
        let first = apply_action(&mut app, Action::SelectRange(TimeRange::Day));
        let second = apply_action(&mut app, Action::SelectRange(TimeRange::Day));
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert_eq!(app.dashboard.generation(), 2);
    }

    #[test]
    fn test_retry_reloads_everything() {
        let mut app = app();
        app.dashboard.select_tab(Tab::Analytics);
        app.dashboard.subscription_failed("offline");
        assert!(app.is_error());

        let commands = apply_action(&mut app, Action::Retry);
        assert!(matches!(
            commands.as_slice(),
            [Command::Resubscribe { session: 1 }, Command::FetchHistory(_)]
        ));
        assert!(!app.is_error());
        assert!(app.state().loading);
        assert_eq!(app.state().live.status, LiveStatus::Connecting);
        assert_eq!(app.state().tab, Tab::Data);
        assert_eq!(app.state().range, TimeRange::Day);
    }

    #[test]
    fn test_tabs_cycle() {
        let mut app = app();
        assert!(apply_action(&mut app, Action::NextTab).is_empty());
        assert_eq!(app.state().tab, Tab::Analytics);
        apply_action(&mut app, Action::NextTab);
        assert_eq!(app.state().tab, Tab::Data);
        apply_action(&mut app, Action::PreviousTab);
        assert_eq!(app.state().tab, Tab::Analytics);
    }

    #[test]
    fn test_quit() {
        let mut app = app();
        assert!(apply_action(&mut app, Action::Quit).is_empty());
        assert!(app.should_quit);
    }
}
