//! Input binding table.
//!
//! Every draw produces a fresh `Bindings` describing which keys and screen
//! regions are live for the frame just rendered. The runtime swaps the whole
//! table in after each draw, so stale regions from a previous frame can never
//! fire.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Position, Rect};

use crate::state::Page;

/// Something the user can press or click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Key { code: KeyCode, modifiers: KeyModifiers },
    /// Left click inside the area.
    Region(Rect),
    /// Any printable character (used by text editors).
    Text,
}

impl Trigger {
    pub fn key(code: KeyCode) -> Self {
        Trigger::Key {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(c: char) -> Self {
        Trigger::Key {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn char(c: char) -> Self {
        Self::key(KeyCode::Char(c))
    }
}

/// What a trigger does once resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Navigate(Page),
    TogglePause,
    ManualRefresh,
    Quit,
    Scroll(i16),
    FocusNext,
    FocusPrev,
    FormActivate,
    FormCycle { forward: bool },
    FormClick(usize),
    SaveAll,
    EditCommit,
    EditCancel,
    EditBackspace,
    InsertChar,
    ConfirmYes,
    ConfirmNo,
}

/// Table of live triggers for the current frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    entries: Vec<(Trigger, Action)>,
}

impl Bindings {
    /// Binds a trigger. Binding the same trigger again replaces its action.
    pub fn bind(&mut self, trigger: Trigger, action: Action) {
        if let Some(entry) = self.entries.iter_mut().find(|(t, _)| *t == trigger) {
            entry.1 = action;
        } else {
            self.entries.push((trigger, action));
        }
    }

    /// Resolves a key press. Text triggers only match printable characters
    /// without Ctrl or Alt.
    pub fn resolve_key(&self, key: &KeyEvent) -> Option<Action> {
        // Shift is implied by the character itself.
        let modifiers = key.modifiers.difference(KeyModifiers::SHIFT);
        let exact = self.entries.iter().find_map(|(trigger, action)| match trigger {
            Trigger::Key {
                code,
                modifiers: bound,
            } if *code == key.code && *bound == modifiers => Some(*action),
            _ => None,
        });
        if exact.is_some() {
            return exact;
        }

        let printable = matches!(key.code, KeyCode::Char(c) if !c.is_control())
            && !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        if !printable {
            return None;
        }
        self.entries
            .iter()
            .find(|(trigger, _)| *trigger == Trigger::Text)
            .map(|(_, action)| *action)
    }

    /// Resolves a click. Later regions win, so overlays drawn last take
    /// precedence over the page beneath them.
    pub fn resolve_click(&self, column: u16, row: u16) -> Option<Action> {
        let position = Position::new(column, row);
        self.entries
            .iter()
            .rev()
            .find_map(|(trigger, action)| match trigger {
                Trigger::Region(area) if area.contains(position) => Some(*action),
                _ => None,
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Trigger, Action)> {
        self.entries.iter()
    }
}
