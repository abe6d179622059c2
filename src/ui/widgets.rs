use ratatui::prelude::*;
use ratatui::widgets::*;

pub const FIELD_BG: Color = Color::Rgb(10, 10, 20);
pub const KEY_COLOR: Color = Color::Rgb(80, 200, 255);

/// Rounded border with a bold coloured title, shared by every game screen.
pub fn game_block(title: &str, color: Color) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
        .title(format!(" {title} "))
        .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
}

/// Splits a game's inner area into status bar, field and help bar.
pub fn game_layout(inner: Rect) -> (Rect, Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(4),
            Constraint::Length(1),
        ])
        .split(inner);
    (chunks[0], chunks[1], chunks[2])
}

/// Status bar items joined by dim separators.
pub fn status_line(items: Vec<Span<'static>>) -> Line<'static> {
    let mut spans = vec![Span::raw(" ")];
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" │ ", Style::default().fg(Color::DarkGray)));
        }
        spans.push(item);
    }
    Line::from(spans)
}

pub fn score_span(label: &str, value: impl std::fmt::Display) -> Span<'static> {
    Span::styled(
        format!("{label}: {value}"),
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )
}

pub fn best_span(value: impl std::fmt::Display) -> Span<'static> {
    Span::styled(format!("🏆 Best: {value}"), Style::default().fg(Color::Cyan))
}

pub fn info_span(text: String, color: Color) -> Span<'static> {
    Span::styled(text, Style::default().fg(color))
}

/// `key label │ key label ...` help bar.
pub fn help_line(keys: &[(&str, &str)]) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, (key, label)) in keys.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("│ ", Style::default().fg(Color::Rgb(60, 60, 60))));
        }
        spans.push(Span::styled(format!(" {key} "), Style::default().fg(KEY_COLOR)));
        spans.push(Span::styled(format!("{label} "), Style::default().fg(Color::DarkGray)));
    }
    Line::from(spans)
}

/// Highlighted one-line message such as GAME OVER or PAUSED.
pub fn banner_line(text: &str, color: Color, hint: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {text} "), Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(hint.to_string(), Style::default().fg(Color::Gray)),
    ])
}

/// A `w` x `h` rectangle centred in `area`, shrunk to fit.
pub fn centered(area: Rect, w: u16, h: u16) -> Rect {
    let w = w.min(area.width);
    let h = h.min(area.height);
    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (area.height - h) / 2,
        w,
        h,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_fits_inside_area() {
        let area = Rect::new(2, 3, 20, 10);
        let r = centered(area, 10, 4);
        assert_eq!(r, Rect::new(7, 6, 10, 4));
        let clipped = centered(area, 40, 40);
        assert_eq!(clipped, area);
    }

    #[test]
    fn help_line_separates_entries() {
        let line = help_line(&[("←→", "Move"), ("R", "Restart")]);
        assert_eq!(line.spans.len(), 5);
    }
}
