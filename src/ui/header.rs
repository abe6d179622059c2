use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::app::Session;

/// One-line bar above the running game.
pub fn render_header(frame: &mut Frame, session: &Session, area: Rect) {
    let kind = session.kind;
    let dim = Style::default().fg(Color::Rgb(60, 60, 80));
    let mut spans = vec![
        Span::styled(" 🕹 minicade ", Style::default().fg(Color::Rgb(200, 120, 255)).add_modifier(Modifier::BOLD)),
        Span::styled("│ ", dim),
        Span::raw(format!("{} ", kind.icon())),
        Span::styled(kind.title(), Style::default().fg(kind.color()).add_modifier(Modifier::BOLD)),
    ];
    if kind.score_key().is_some() {
        let best = session.game.best().map_or("-".to_string(), |b| b.to_string());
        spans.push(Span::styled(" │ ", dim));
        spans.push(Span::styled(format!("best {best}"), Style::default().fg(Color::Rgb(255, 220, 80))));
    }
    spans.push(Span::styled(" │ ", dim));
    spans.push(Span::styled("Esc", Style::default().fg(Color::Rgb(80, 200, 255)).add_modifier(Modifier::BOLD)));
    spans.push(Span::styled(" menu", Style::default().fg(Color::Rgb(120, 120, 140))));

    let bar = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::Rgb(60, 150, 200))),
    );
    frame.render_widget(bar, area);
}
