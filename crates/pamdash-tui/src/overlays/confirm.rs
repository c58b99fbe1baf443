//! Confirmation prompt for destructive log operations.
//!
//! Clearing old logs asks once; clearing everything asks twice. The request is
//! only issued after the last step is accepted.

use crossterm::event::KeyCode;
use pamdash_core::api::ClearScope;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Paragraph, Wrap};

use super::OverlayUpdate;
use super::render_utils::{InputHint, OverlayConfig, render_overlay};
use crate::bindings::{Action, Bindings, Trigger};
use crate::common::{TaskKind, TaskMeta};
use crate::effects::UiEffect;
use crate::state::TuiState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmState {
    pub scope: ClearScope,
    step: usize,
}

/// Display data for the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmView {
    pub title: &'static str,
    pub prompt: &'static str,
    pub danger: bool,
}

impl ConfirmState {
    pub fn new(scope: ClearScope) -> Self {
        Self { scope, step: 0 }
    }

    /// Zero-based index of the question being asked.
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn view(&self) -> ConfirmView {
        let (title, prompt) = match (self.scope, self.step) {
            (ClearScope::Old, _) => (
                "Clear Old Logs",
                "Clear old log entries? This action cannot be undone.",
            ),
            (ClearScope::All, 0) => (
                "Clear All Logs",
                "\u{26a0}\u{fe0f} DANGER: Clear ALL logs? This will permanently delete all event history!",
            ),
            (ClearScope::All, _) => (
                "Clear All Logs",
                "Are you absolutely sure? This cannot be undone!",
            ),
        };
        ConfirmView {
            title,
            prompt,
            danger: self.scope == ClearScope::All,
        }
    }

    /// Advances on yes; closes on no. The last yes reserves the task and
    /// emits the request.
    pub fn handle_action(&mut self, tui: &mut TuiState, action: Action) -> OverlayUpdate {
        match action {
            Action::ConfirmYes => {
                self.step += 1;
                if self.step < self.scope.confirmations() {
                    return OverlayUpdate::stay();
                }
                let meta = TaskMeta::ClearLogs { scope: self.scope };
                let Some(task) = tui.begin_task(TaskKind::ClearLogs, meta) else {
                    tracing::debug!("clear already in progress");
                    return OverlayUpdate::close();
                };
                OverlayUpdate::close().with_ui_effects(vec![UiEffect::ClearLogs {
                    task,
                    scope: self.scope,
                }])
            }
            Action::ConfirmNo => OverlayUpdate::close(),
            _ => OverlayUpdate::stay(),
        }
    }
}

/// Draws the prompt and binds its keys and buttons.
pub fn render(frame: &mut Frame, area: Rect, view: &ConfirmView, bindings: &mut Bindings) {
    let border_color = if view.danger {
        Color::Red
    } else {
        Color::Yellow
    };
    let hints = [InputHint::new("y", "Yes"), InputHint::new("n", "No")];
    let layout = render_overlay(
        frame,
        area,
        &OverlayConfig {
            title: view.title,
            border_color,
            width: 60,
            height: 7,
            hints: &hints,
        },
    );

    let prompt = Paragraph::new(Line::styled(view.prompt, Style::default().fg(Color::White)))
        .wrap(Wrap { trim: true });
    frame.render_widget(prompt, layout.body);

    for (trigger, action) in [
        (Trigger::char('y'), Action::ConfirmYes),
        (Trigger::key(KeyCode::Enter), Action::ConfirmYes),
        (Trigger::char('n'), Action::ConfirmNo),
        (Trigger::key(KeyCode::Esc), Action::ConfirmNo),
    ] {
        bindings.bind(trigger, action);
    }
    let actions = [Action::ConfirmYes, Action::ConfirmNo];
    for (region, action) in layout.hint_regions.into_iter().zip(actions) {
        bindings.bind(Trigger::Region(region), action);
    }
}

#[cfg(test)]
mod tests {
    use pamdash_core::config::Config;

    use super::*;
    use crate::overlays::OverlayTransition;
    use crate::state::Route;

    fn tui() -> TuiState {
        TuiState::new(Config::default(), Route::default())
    }

    #[test]
    fn test_clear_all_needs_two_confirmations() {
        let mut tui = tui();
        let mut state = ConfirmState::new(ClearScope::All);

        let first = state.handle_action(&mut tui, Action::ConfirmYes);
        assert!(matches!(first.transition, OverlayTransition::Stay));
        assert!(first.effects.is_empty());
        assert_eq!(
            state.view().prompt,
            "Are you absolutely sure? This cannot be undone!"
        );

        let second = state.handle_action(&mut tui, Action::ConfirmYes);
        assert!(matches!(second.transition, OverlayTransition::Close));
        assert!(matches!(
            second.effects.as_slice(),
            [UiEffect::ClearLogs {
                scope: ClearScope::All,
                ..
            }]
        ));
    }

    #[test]
    fn test_clear_old_needs_one_confirmation() {
        let mut tui = tui();
        let mut state = ConfirmState::new(ClearScope::Old);
        let update = state.handle_action(&mut tui, Action::ConfirmYes);
        assert!(matches!(update.transition, OverlayTransition::Close));
        assert_eq!(update.effects.len(), 1);
    }

    #[test]
    fn test_declining_sends_nothing() {
        let mut tui = tui();
        let mut state = ConfirmState::new(ClearScope::All);
        state.handle_action(&mut tui, Action::ConfirmYes);
        let update = state.handle_action(&mut tui, Action::ConfirmNo);
        assert!(matches!(update.transition, OverlayTransition::Close));
        assert!(update.effects.is_empty());
        assert!(!tui.tasks.state(TaskKind::ClearLogs).is_running());
    }
}
