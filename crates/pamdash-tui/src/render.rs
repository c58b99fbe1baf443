//! Drawing functions for the TUI.
//!
//! `draw` takes a `View` (never `AppState`), draws every widget and returns
//! the binding table for the frame it just drew. Each call starts from an empty
//! table, so triggers never accumulate across redraws.

use crossterm::event::KeyCode;
use pamdash_core::health::{ComponentHealth, HealthStatus};
use pamdash_core::risk::RiskLevel;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::bindings::{Action, Bindings, Trigger};
use crate::common::{sanitize_for_display, truncate_with_ellipsis};
use crate::overlays::{OverlayView, confirm};
use crate::settings_form::{FormRowView, Row as FormRow};
use crate::toasts::ToastLevel;
use crate::view::{
    AlertsView, Body, DashboardView, EventRow, FormView, Header, RefreshControls, RiskBadge,
    SessionsView, SettingsBody, SidebarItem, ToastView, View,
};

const SIDEBAR_WIDTH: u16 = 18;
const HEADER_HEIGHT: u16 = 3;
const TOAST_WIDTH: u16 = 44;
const TOAST_HEIGHT: u16 = 3;
const FORM_LABEL_WIDTH: usize = 28;
const ACCENT: Color = Color::Cyan;

const SETTINGS_NOTICE: &str = "Auto-refresh Paused: Data updates are paused while you configure settings. Use \"Manual Refresh\" to update data if needed.";

/// Draws the view and returns the bindings for this frame.
pub fn draw(view: &View, frame: &mut Frame) -> Bindings {
    let mut bindings = Bindings::default();
    let area = frame.area();

    let [sidebar, main] =
        Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)]).areas(area);
    let [header, body] =
        Layout::vertical([Constraint::Length(HEADER_HEIGHT), Constraint::Min(0)]).areas(main);

    let sidebar_regions = render_sidebar(frame, sidebar, &view.sidebar);
    let header_button = render_header(frame, header, &view.header);
    let form_regions = render_body(frame, body, view);
    render_toasts(frame, area, &view.toasts);

    if let Some(OverlayView::Confirm(confirm_view)) = &view.overlay {
        // Modal: only the prompt's own triggers are live.
        confirm::render(frame, area, confirm_view, &mut bindings);
        return bindings;
    }

    bindings.bind(Trigger::ctrl('c'), Action::Quit);
    if view.editing {
        bind_editor(&mut bindings);
        return bindings;
    }

    bindings.bind(Trigger::char('q'), Action::Quit);
    bindings.bind(Trigger::char('r'), Action::ManualRefresh);
    for (item, region) in view.sidebar.iter().zip(sidebar_regions) {
        bindings.bind(Trigger::char(item.page.hotkey()), Action::Navigate(item.page));
        bindings.bind(Trigger::Region(region), Action::Navigate(item.page));
    }
    match view.header.controls {
        RefreshControls::Live { .. } => {
            bindings.bind(Trigger::char('p'), Action::TogglePause);
            if let Some(region) = header_button {
                bindings.bind(Trigger::Region(region), Action::TogglePause);
            }
        }
        RefreshControls::SettingsHold => {
            if let Some(region) = header_button {
                bindings.bind(Trigger::Region(region), Action::ManualRefresh);
            }
        }
    }

    match &view.body {
        Body::Settings(SettingsBody::Form(_)) => {
            bind_form(&mut bindings);
            for (index, region) in form_regions {
                bindings.bind(Trigger::Region(region), Action::FormClick(index));
            }
        }
        Body::Settings(_) => {}
        _ => bind_scroll(&mut bindings),
    }
    bindings
}

fn bind_editor(bindings: &mut Bindings) {
    bindings.bind(Trigger::key(KeyCode::Esc), Action::EditCancel);
    bindings.bind(Trigger::key(KeyCode::Enter), Action::EditCommit);
    bindings.bind(Trigger::key(KeyCode::Backspace), Action::EditBackspace);
    bindings.bind(Trigger::Text, Action::InsertChar);
}

fn bind_form(bindings: &mut Bindings) {
    for (trigger, action) in [
        (Trigger::key(KeyCode::Down), Action::FocusNext),
        (Trigger::key(KeyCode::Tab), Action::FocusNext),
        (Trigger::char('j'), Action::FocusNext),
        (Trigger::key(KeyCode::Up), Action::FocusPrev),
        (Trigger::key(KeyCode::BackTab), Action::FocusPrev),
        (Trigger::char('k'), Action::FocusPrev),
        (Trigger::key(KeyCode::Enter), Action::FormActivate),
        (Trigger::char(' '), Action::FormActivate),
        (Trigger::key(KeyCode::Left), Action::FormCycle { forward: false }),
        (Trigger::key(KeyCode::Right), Action::FormCycle { forward: true }),
        (Trigger::ctrl('s'), Action::SaveAll),
    ] {
        bindings.bind(trigger, action);
    }
}

fn bind_scroll(bindings: &mut Bindings) {
    for (trigger, action) in [
        (Trigger::key(KeyCode::Down), Action::Scroll(1)),
        (Trigger::char('j'), Action::Scroll(1)),
        (Trigger::key(KeyCode::Up), Action::Scroll(-1)),
        (Trigger::char('k'), Action::Scroll(-1)),
        (Trigger::key(KeyCode::PageDown), Action::Scroll(10)),
        (Trigger::key(KeyCode::PageUp), Action::Scroll(-10)),
    ] {
        bindings.bind(trigger, action);
    }
}

// ============================================================================
// Chrome
// ============================================================================

/// Returns one clickable region per sidebar item.
fn render_sidebar(frame: &mut Frame, area: Rect, items: &[SidebarItem]) -> Vec<Rect> {
    let block = Block::default()
        .borders(Borders::RIGHT)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(
        Paragraph::new(Line::styled(
            " PAM Monitor",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
        Rect::new(inner.x, inner.y, inner.width, inner.height.min(1)),
    );

    let mut regions = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let y = inner.y + 2 + (i as u16) * 2;
        if y >= inner.y + inner.height {
            break;
        }
        let region = Rect::new(inner.x, y, inner.width, 1);
        let style = if item.active {
            Style::default()
                .fg(Color::Black)
                .bg(ACCENT)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let text = format!(" {} {}", item.page.hotkey(), item.page.label());
        frame.render_widget(Paragraph::new(Line::styled(text, style)), region);
        regions.push(region);
    }
    regions
}

/// Returns the region of the header button, if it fit.
fn render_header(frame: &mut Frame, area: Rect, header: &Header) -> Option<Rect> {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let (status, button) = match header.controls {
        RefreshControls::Live { paused: false } => (
            Span::styled("\u{25cf} Live", Style::default().fg(Color::Green)),
            "[p] Pause",
        ),
        RefreshControls::Live { paused: true } => (
            Span::styled("\u{25cb} Paused", Style::default().fg(Color::Yellow)),
            "[p] Resume",
        ),
        RefreshControls::SettingsHold => (
            Span::styled("Auto-refresh paused", Style::default().fg(Color::Yellow)),
            "[r] Manual Refresh",
        ),
    };
    let status_width = status.width() as u16 + 2;
    let button_width = button.width() as u16 + 1;

    let [title_area, status_area, button_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(status_width),
        Constraint::Length(button_width),
    ])
    .areas(Rect::new(inner.x + 1, inner.y, inner.width.saturating_sub(1), inner.height.min(1)));

    frame.render_widget(
        Paragraph::new(Line::styled(
            header.title.as_str(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        title_area,
    );
    frame.render_widget(Paragraph::new(Line::from(status)), status_area);
    frame.render_widget(
        Paragraph::new(Line::styled(
            button,
            Style::default().fg(Color::Black).bg(Color::Gray),
        )),
        button_area,
    );

    (button_area.width > 0 && button_area.height > 0).then_some(button_area)
}

fn render_toasts(frame: &mut Frame, area: Rect, toasts: &[ToastView]) {
    let width = TOAST_WIDTH.min(area.width);
    let x = area.x + area.width.saturating_sub(width + 1);
    // Newest on top.
    for (i, toast) in toasts.iter().rev().enumerate() {
        let y = area.y + 1 + (i as u16) * TOAST_HEIGHT;
        if y + TOAST_HEIGHT > area.y + area.height {
            break;
        }
        let toast_area = Rect::new(x, y, width, TOAST_HEIGHT);
        let color = toast_color(toast.level);
        let message = truncate_with_ellipsis(
            &sanitize_for_display(&toast.message),
            width.saturating_sub(4) as usize,
        );
        frame.render_widget(Clear, toast_area);
        frame.render_widget(
            Paragraph::new(Line::styled(message, Style::default().fg(color))).block(
                Block::bordered().border_style(Style::default().fg(color)),
            ),
            toast_area,
        );
    }
}

// ============================================================================
// Pages
// ============================================================================

/// Draws the page body. Returns clickable form rows as `(row index, region)`.
fn render_body(frame: &mut Frame, area: Rect, view: &View) -> Vec<(usize, Rect)> {
    let area = Rect::new(
        area.x + 1,
        area.y,
        area.width.saturating_sub(2),
        area.height,
    );
    match &view.body {
        Body::Dashboard(dashboard) => render_dashboard(frame, area, dashboard, view.scroll),
        Body::Sessions(sessions) => render_sessions(frame, area, sessions, view.scroll),
        Body::Alerts(alerts) => render_alerts(frame, area, alerts, view.scroll),
        Body::Settings(settings) => return render_settings(frame, area, settings),
        Body::NotFound(name) => render_not_found(frame, area, name),
    }
    Vec::new()
}

fn render_dashboard(frame: &mut Frame, area: Rect, view: &DashboardView, scroll: u16) {
    let [cards, lists] =
        Layout::vertical([Constraint::Length(4), Constraint::Min(0)]).areas(area);

    let card_areas: [Rect; 4] = Layout::horizontal([Constraint::Ratio(1, 4); 4]).areas(cards);
    let summary = &view.summary;
    let figures = [
        ("Active Sessions", summary.active_sessions.to_string(), Color::White),
        ("Critical Alerts", summary.critical_alerts.to_string(), Color::Red),
        ("Total Anomalies", summary.total_anomalies.to_string(), Color::White),
        ("System Health", summary.system_health.to_string(), Color::Green),
    ];
    for ((label, value, color), card) in figures.into_iter().zip(card_areas) {
        let text = Text::from(vec![
            Line::styled(label, Style::default().fg(Color::Gray)),
            Line::styled(value, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        ]);
        frame.render_widget(
            Paragraph::new(text).block(
                Block::bordered().border_style(Style::default().fg(Color::DarkGray)),
            ),
            card,
        );
    }

    let [left, right] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(lists);

    let high_risk = if view.high_risk.is_empty() {
        Text::from(Line::styled(
            "No high-risk alerts found.",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        event_list(&view.high_risk)
    };
    frame.render_widget(
        Paragraph::new(high_risk)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0))
            .block(section_block("Recent High-Risk Alerts")),
        left,
    );

    let total = format!("{} total events", view.events.len());
    frame.render_widget(
        Paragraph::new(event_list(&view.events))
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0))
            .block(
                section_block("Full Event Log").title_top(
                    Line::styled(format!(" {total} "), Style::default().fg(Color::Gray))
                        .right_aligned(),
                ),
            ),
        right,
    );
}

fn event_list(rows: &[EventRow]) -> Text<'_> {
    if rows.is_empty() {
        return Text::from(Line::styled(
            "No events to display.",
            Style::default().fg(Color::DarkGray),
        ));
    }
    let mut lines = Vec::new();
    for row in rows {
        lines.push(Line::from(vec![
            Span::styled(
                row.heading(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            badge_span(row.badge),
        ]));
        lines.push(Line::styled(
            row.description,
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        ));
        lines.push(Line::styled(
            row.time.clone(),
            Style::default().fg(Color::DarkGray),
        ));
        if let Some(details) = &row.details {
            lines.push(Line::styled(
                sanitize_for_display(details),
                Style::default().fg(Color::Gray),
            ));
        }
        lines.push(Line::default());
    }
    Text::from(lines)
}

fn render_sessions(frame: &mut Frame, area: Rect, view: &SessionsView, scroll: u16) {
    if view.rows.is_empty() {
        frame.render_widget(
            Paragraph::new("No active sessions.")
                .alignment(Alignment::Center)
                .block(section_block("Active Sessions")),
            area,
        );
        return;
    }
    let rows = view.rows.iter().skip(scroll as usize).map(|row| {
        let strike_style = if row.has_strikes {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        Row::new(vec![
            Cell::from(row.email.clone()).style(Style::default().fg(Color::White)),
            Cell::from(row.role.clone()),
            Cell::from(row.login_time.clone()),
            Cell::from(row.strikes.clone()).style(strike_style),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Percentage(35),
            Constraint::Percentage(20),
            Constraint::Percentage(25),
            Constraint::Percentage(20),
        ],
    )
    .header(table_header(&["User Email", "Role", "Login Time", "Critical Strikes"]))
    .block(section_block("Active Sessions"));
    frame.render_widget(table, area);
}

fn render_alerts(frame: &mut Frame, area: Rect, view: &AlertsView, scroll: u16) {
    let rows = view.rows.iter().skip(scroll as usize).map(|row| {
        Row::new(vec![
            Cell::from(row.time.clone()),
            Cell::from(row.role.clone()).style(Style::default().fg(Color::White)),
            Cell::from(row.action.clone()).style(Style::default().fg(ACCENT)),
            Cell::from(Line::from(badge_span(row.badge))),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Length(20),
            Constraint::Percentage(30),
            Constraint::Percentage(35),
            Constraint::Min(14),
        ],
    )
    .header(table_header(&["Time", "User Role", "Action", "Risk Score"]))
    .block(section_block("All Events"));
    frame.render_widget(table, area);
}

fn render_not_found(frame: &mut Frame, area: Rect, name: &str) {
    let text = Text::from(vec![
        Line::styled(
            format!("Page not found: {}", sanitize_for_display(name)),
            Style::default().fg(Color::Red),
        ),
        Line::styled(
            "Press 1-4 to choose a page.",
            Style::default().fg(Color::Gray),
        ),
    ]);
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::bordered()),
        area,
    );
}

// ============================================================================
// Settings
// ============================================================================

fn render_settings(frame: &mut Frame, area: Rect, body: &SettingsBody) -> Vec<(usize, Rect)> {
    let [notice, rest] =
        Layout::vertical([Constraint::Length(4), Constraint::Min(0)]).areas(area);
    frame.render_widget(
        Paragraph::new(SETTINGS_NOTICE)
            .style(Style::default().fg(Color::Yellow))
            .wrap(Wrap { trim: true })
            .block(Block::bordered().border_style(Style::default().fg(Color::Yellow))),
        notice,
    );

    match body {
        SettingsBody::Loading => {
            frame.render_widget(
                Paragraph::new("Loading system configuration...")
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(Color::Gray)),
                rest,
            );
            Vec::new()
        }
        SettingsBody::Failed(error) => {
            let text = Text::from(vec![
                Line::styled(
                    "Failed to load settings",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
                Line::styled(sanitize_for_display(error), Style::default().fg(Color::Gray)),
                Line::styled(
                    "Leave and reopen this page to retry.",
                    Style::default().fg(Color::DarkGray),
                ),
            ]);
            frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), rest);
            Vec::new()
        }
        SettingsBody::Form(form) => render_form(frame, rest, form),
    }
}

fn render_form(frame: &mut Frame, area: Rect, form: &FormView) -> Vec<(usize, Rect)> {
    let side_width = if form.health.is_some() { 32 } else { 0 };
    let [rows_area, side] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(side_width)]).areas(area);
    let [rows_area, status] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(rows_area);

    let height = rows_area.height as usize;
    let focus = form.rows.iter().position(|row| row.focused).unwrap_or(0);
    // Keep the focused row on screen.
    let offset = (focus + 1).saturating_sub(height);

    let mut regions = Vec::new();
    for (index, row) in form.rows.iter().enumerate().skip(offset).take(height) {
        let y = rows_area.y + (index - offset) as u16;
        let region = Rect::new(rows_area.x, y, rows_area.width, 1);
        let line = form_line(row, rows_area.width as usize);
        frame.render_widget(Paragraph::new(line), region);
        if row.row.is_focusable() {
            regions.push((index, region));
        }
    }

    let busy = if form.busy.is_empty() {
        Line::styled(
            "Enter edit/press \u{2022} \u{2190}\u{2192} change \u{2022} Ctrl+S save all",
            Style::default().fg(Color::DarkGray),
        )
    } else {
        Line::styled(
            format!("{}...", form.busy.join(", ")),
            Style::default().fg(Color::Yellow),
        )
    };
    frame.render_widget(Paragraph::new(busy), status);

    if let Some(health) = &form.health {
        render_health(frame, side, health);
    }
    regions
}

fn form_line(row: &FormRowView, width: usize) -> Line<'static> {
    let marker = if row.focused { "\u{25b8} " } else { "  " };
    let focus_style = if row.focused {
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    match row.row {
        FormRow::Section(_) => Line::styled(
            row.label.clone(),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        ),
        FormRow::Button(_) => {
            let style = if row.focused {
                Style::default().fg(Color::Black).bg(ACCENT)
            } else {
                Style::default().fg(Color::White).bg(Color::DarkGray)
            };
            Line::from(vec![
                Span::raw(marker),
                Span::styled(format!(" {} ", row.label), style),
            ])
        }
        FormRow::Field(_) => {
            let label = format!("{:<FORM_LABEL_WIDTH$}", row.label);
            let value_width = width.saturating_sub(FORM_LABEL_WIDTH + 4);
            let mut value = truncate_with_ellipsis(&sanitize_for_display(&row.value), value_width);
            if row.editing {
                value.push('\u{2588}');
            }
            let value_style = if row.editing {
                Style::default().fg(Color::White).bg(Color::DarkGray)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(vec![
                Span::styled(marker, focus_style),
                Span::styled(label, focus_style),
                Span::styled(value, value_style),
            ])
        }
    }
}

fn render_health(frame: &mut Frame, area: Rect, health: &[ComponentHealth]) {
    let lines: Vec<Line> = health
        .iter()
        .map(|component| {
            let color = match component.level {
                HealthStatus::Healthy => Color::Green,
                HealthStatus::Warning => Color::Yellow,
                HealthStatus::Unhealthy => Color::Red,
                HealthStatus::Unknown => Color::DarkGray,
            };
            Line::from(vec![
                Span::styled("\u{25cf} ", Style::default().fg(color)),
                Span::styled(
                    format!("{:<12}", component.label),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(component.status.clone(), Style::default().fg(color)),
            ])
        })
        .collect();
    frame.render_widget(
        Paragraph::new(lines).block(section_block("System Health")),
        area,
    );
}

// ============================================================================
// Helpers
// ============================================================================

fn section_block(title: &str) -> Block<'_> {
    Block::bordered()
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ))
}

fn table_header(titles: &[&'static str]) -> Row<'static> {
    Row::new(titles.iter().map(|title| Cell::from(title.to_uppercase())))
        .style(Style::default().fg(Color::Gray).bg(Color::DarkGray))
}

pub fn risk_color(level: RiskLevel) -> Color {
    match level {
        RiskLevel::Critical => Color::Red,
        RiskLevel::High => Color::LightRed,
        RiskLevel::Medium => Color::Yellow,
        RiskLevel::Low => Color::Gray,
    }
}

fn badge_span(badge: RiskBadge) -> Span<'static> {
    Span::styled(
        format!(" {} ", badge.text()),
        Style::default()
            .fg(risk_color(badge.level))
            .add_modifier(Modifier::BOLD),
    )
}

fn toast_color(level: ToastLevel) -> Color {
    match level {
        ToastLevel::Success => Color::Green,
        ToastLevel::Error => Color::Red,
        ToastLevel::Info => Color::Blue,
        ToastLevel::Warning => Color::Yellow,
    }
}
