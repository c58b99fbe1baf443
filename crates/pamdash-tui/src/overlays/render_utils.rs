use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use unicode_width::UnicodeWidthStr;

/// Calculates the area for an overlay, centered within `area`.
pub fn calculate_overlay_area(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));

    let overlay_x = area.x + (area.width.saturating_sub(width)) / 2;
    let overlay_y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(overlay_x, overlay_y, width, height)
}

/// Renders the base container for an overlay (clears background, draws border and title).
pub fn render_overlay_container(frame: &mut Frame, area: Rect, title: &str, border_color: Color) {
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {title} "))
        .title_style(
            Style::default()
                .fg(border_color)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(block, area);
}

/// Input configuration for an overlay.
pub struct OverlayConfig<'a> {
    pub title: &'a str,
    pub border_color: Color,
    pub width: u16,
    pub height: u16,
    pub hints: &'a [InputHint<'a>],
}

/// Layout rectangles for an overlay.
pub struct OverlayLayout {
    pub popup: Rect,
    pub body: Rect,
    /// Screen area of each hint, in the order given.
    pub hint_regions: Vec<Rect>,
}

/// Render a standard overlay container and return its layout.
pub fn render_overlay(frame: &mut Frame, area: Rect, config: &OverlayConfig<'_>) -> OverlayLayout {
    let popup = calculate_overlay_area(area, config.width, config.height);
    render_overlay_container(frame, popup, config.title, config.border_color);

    let inner = Rect::new(
        popup.x + 1,
        popup.y + 1,
        popup.width.saturating_sub(2),
        popup.height.saturating_sub(2),
    );

    let hint_regions = if config.hints.is_empty() {
        Vec::new()
    } else {
        render_hints(frame, inner, config.hints, config.border_color)
    };

    let footer_height = u16::from(!config.hints.is_empty());
    let body_height = inner.height.saturating_sub(footer_height);
    let body = Rect::new(inner.x, inner.y, inner.width, body_height);

    OverlayLayout {
        popup,
        body,
        hint_regions,
    }
}

/// Helper struct for keyboard hints.
pub struct InputHint<'a> {
    pub key: &'a str,
    pub action: &'a str,
}

impl<'a> InputHint<'a> {
    pub fn new(key: &'a str, action: &'a str) -> Self {
        Self { key, action }
    }

    fn width(&self) -> u16 {
        (self.key.width() + 1 + self.action.width()) as u16
    }
}

const HINT_SEPARATOR: &str = " • ";

/// Renders a centered line of keyboard hints on the last row of `area` and
/// returns the clickable region of each hint.
pub fn render_hints(
    frame: &mut Frame,
    area: Rect,
    hints: &[InputHint],
    highlight_color: Color,
) -> Vec<Rect> {
    let hints_y = area.y + area.height.saturating_sub(1);
    let hints_area = Rect::new(area.x, hints_y, area.width, 1);

    let mut spans = Vec::new();
    for (i, hint) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(
                HINT_SEPARATOR,
                Style::default().fg(Color::DarkGray),
            ));
        }
        spans.push(Span::styled(hint.key, Style::default().fg(highlight_color)));
        spans.push(Span::styled(
            format!(" {}", hint.action),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let line = Line::from(spans);
    let total = line.width() as u16;
    let para = Paragraph::new(line).alignment(Alignment::Center);
    frame.render_widget(para, hints_area);

    // Mirror the centering Paragraph applies so regions match the glyphs.
    let separator = HINT_SEPARATOR.width() as u16;
    let mut x = hints_area.x + hints_area.width.saturating_sub(total) / 2;
    let right = hints_area.x + hints_area.width;
    let mut regions = Vec::with_capacity(hints.len());
    for hint in hints {
        let width = hint.width().min(right.saturating_sub(x));
        regions.push(Rect::new(x, hints_y, width, 1));
        x = x.saturating_add(hint.width() + separator).min(right);
    }
    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_area_is_centered_and_clamped() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(
            calculate_overlay_area(area, 60, 7),
            Rect::new(20, 16, 60, 7)
        );
        let small = Rect::new(0, 0, 30, 6);
        let popup = calculate_overlay_area(small, 60, 7);
        assert_eq!(popup.width, 26);
        assert_eq!(popup.height, 4);
    }
}
