//! Overlay modules for the TUI.
//!
//! Overlays are modal UI components that temporarily take over input. While
//! one is open, the draw binds only the overlay's keys and regions, so page
//! shortcuts cannot fire underneath it.
//!
//! ## Module Structure
//!
//! - `confirm.rs`: One- or two-step confirmation for clearing logs
//! - `render_utils.rs`: Shared rendering utilities for overlays

pub mod confirm;
pub mod render_utils;

pub use confirm::{ConfirmState, ConfirmView};

use crate::bindings::Action;
use crate::effects::UiEffect;
use crate::state::AppState;

// ============================================================================
// OverlayTransition / OverlayUpdate
// ============================================================================

/// Transition returned by overlay handlers.
#[derive(Debug)]
pub enum OverlayTransition {
    Stay,
    Close,
}

/// Update returned by overlay handlers.
#[derive(Debug)]
pub struct OverlayUpdate {
    pub transition: OverlayTransition,
    pub effects: Vec<UiEffect>,
}

impl OverlayUpdate {
    fn new(transition: OverlayTransition) -> Self {
        Self {
            transition,
            effects: Vec::new(),
        }
    }

    pub fn stay() -> Self {
        Self::new(OverlayTransition::Stay)
    }

    pub fn close() -> Self {
        Self::new(OverlayTransition::Close)
    }

    #[must_use]
    pub fn with_ui_effects(mut self, effects: Vec<UiEffect>) -> Self {
        self.effects = effects;
        self
    }
}

// ============================================================================
// Overlay
// ============================================================================

#[derive(Debug)]
pub enum Overlay {
    Confirm(ConfirmState),
}

/// Display data for the open overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayView {
    Confirm(ConfirmView),
}

impl Overlay {
    pub fn view(&self) -> OverlayView {
        match self {
            Overlay::Confirm(state) => OverlayView::Confirm(state.view()),
        }
    }
}

/// Routes an action to the open overlay and applies its transition.
///
/// Returns `None` when no overlay is open.
pub fn handle_overlay_action(app: &mut AppState, action: Action) -> Option<Vec<UiEffect>> {
    let overlay = app.overlay.as_mut()?;
    let update = match overlay {
        Overlay::Confirm(state) => state.handle_action(&mut app.tui, action),
    };
    if matches!(update.transition, OverlayTransition::Close) {
        app.overlay = None;
    }
    Some(update.effects)
}
