use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::app::{App, TILE_COLS};
use crate::games::GameKind;

const BANNER: &str = r#"
 ╔══════════════════════════════════════════════════════════════════════╗
 ║  ███╗   ███╗ ██╗ ███╗   ██╗ ██╗  ██████╗  █████╗  ██████╗  ███████╗  ║
 ║  ████╗ ████║ ██║ ████╗  ██║ ██║ ██╔════╝ ██╔══██╗ ██╔══██╗ ██╔════╝  ║
 ║  ██╔████╔██║ ██║ ██╔██╗ ██║ ██║ ██║      ███████║ ██║  ██║ █████╗    ║
 ║  ██║╚██╔╝██║ ██║ ██║╚██╗██║ ██║ ██║      ██╔══██║ ██║  ██║ ██╔══╝    ║
 ║  ██║ ╚═╝ ██║ ██║ ██║ ╚████║ ██║ ╚██████╗ ██║  ██║ ██████╔╝ ███████╗  ║
 ║  ╚═╝     ╚═╝ ╚═╝ ╚═╝  ╚═══╝ ╚═╝  ╚═════╝ ╚═╝  ╚═╝ ╚═════╝  ╚══════╝  ║
 ╚══════════════════════════════════════════════════════════════════════╝"#;

const KEY: Color = Color::Rgb(80, 200, 255);
const LABEL: Color = Color::Rgb(140, 140, 140);
const GOLD: Color = Color::Rgb(255, 220, 80);

fn dim(color: Color) -> Color {
    match color {
        Color::Rgb(r, g, b) => Color::Rgb(r / 2, g / 2, b / 2),
        other => other,
    }
}

fn render_game_tile(frame: &mut Frame, area: Rect, kind: GameKind, selected: bool) {
    let border_color = if selected { GOLD } else { dim(kind.color()) };
    let border_type = if selected { BorderType::Double } else { BorderType::Rounded };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(Style::default().fg(border_color));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let name_color = if selected { Color::White } else { kind.color() };
    let mut lines = vec![Line::from(vec![
        Span::raw(format!("{} ", kind.icon())),
        Span::styled(kind.title(), Style::default().fg(name_color).add_modifier(Modifier::BOLD)),
    ])];

    let desc_color = if selected { Color::Rgb(180, 180, 200) } else { Color::Rgb(120, 120, 140) };
    for desc_line in kind.blurb().split('\n') {
        lines.push(Line::styled(desc_line, Style::default().fg(desc_color)));
    }

    if selected {
        lines.push(Line::styled(
            "▶ Enter to play",
            Style::default().fg(GOLD).add_modifier(Modifier::BOLD),
        ));
    }

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn game_controls(kind: GameKind) -> &'static [(&'static str, &'static str)] {
    match kind {
        GameKind::TicTacToe => &[("←↑↓→", "Move cursor"), ("Space", "Place mark"), ("1-9", "Place in cell"), ("Click", "Place mark")],
        GameKind::Snake => &[("←↑↓→", "Steer"), ("P", "Pause")],
        GameKind::CarRacing => &[("← / → / A D", "Change lane"), ("P", "Pause")],
        GameKind::Pong => &[("← / → / A D", "Move paddle"), ("P", "Pause")],
        GameKind::Memory => &[("←↑↓→", "Move cursor"), ("Space / Click", "Flip card")],
        GameKind::Breakout => &[("← / → / A D", "Move paddle"), ("P", "Pause")],
        GameKind::Tetris => &[("← / →", "Move"), ("↑", "Rotate"), ("↓", "Soft drop"), ("Space", "Hard drop"), ("P", "Pause")],
        GameKind::Minesweeper => &[("←↑↓→", "Move cursor"), ("Space / Click", "Reveal"), ("F / Right-click", "Flag")],
        GameKind::Game2048 => &[("←↑↓→", "Slide tiles")],
        GameKind::FlappyBird => &[("Space / ↑ / Click", "Flap")],
        GameKind::SpaceInvaders => &[("← / →", "Move cannon"), ("Space / ↑", "Fire"), ("P", "Pause")],
        GameKind::Wordle => &[("A-Z", "Type letter"), ("Backspace", "Erase"), ("Enter", "Submit guess"), ("Ctrl+R", "New word")],
        GameKind::Dino => &[("Space / ↑", "Jump")],
        GameKind::ConnectFour => &[("← / →", "Pick column"), ("Space / ↓", "Drop disc"), ("1-7 / Click", "Drop in column")],
        GameKind::Simon => &[("Enter", "Start"), ("1-4 / Click", "Press pad"), ("↑ → ← ↓", "Green Red Yellow Blue")],
        GameKind::WhackAMole => &[("Enter", "Start round"), ("1-9 / Click", "Whack hole")],
    }
}

fn key_line(key: &str, label: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("    {key:<20} "), Style::default().fg(KEY)),
        Span::styled(label.to_string(), Style::default().fg(LABEL)),
    ])
}

fn section(title: &str) -> Line<'static> {
    Line::styled(format!("  {title}"), Style::default().fg(GOLD).add_modifier(Modifier::BOLD))
}

pub fn render_home(frame: &mut Frame, area: Rect, app: &mut App) {
    let rows = GameKind::ALL.len().div_ceil(TILE_COLS);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9),                  // banner
            Constraint::Length(1),                  // subtitle
            Constraint::Length(rows as u16 * 6 + 2), // tiles
            Constraint::Min(8),                     // controls
            Constraint::Length(1),                  // footer
        ])
        .split(area);

    let banner = Paragraph::new(BANNER)
        .style(Style::default().fg(Color::Rgb(80, 200, 255)))
        .alignment(Alignment::Center);
    frame.render_widget(banner, chunks[0]);

    let subtitle = Paragraph::new(Line::styled(
        "⚡ Sixteen games, one terminal ⚡",
        Style::default().fg(GOLD).add_modifier(Modifier::BOLD | Modifier::ITALIC),
    ))
    .alignment(Alignment::Center);
    frame.render_widget(subtitle, chunks[1]);

    let games_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(60, 150, 200)))
        .title(" 🎮 Games │ ↑↓←→ select, Enter or click to play ")
        .title_style(Style::default().fg(Color::Rgb(200, 120, 255)).add_modifier(Modifier::BOLD));
    let games_inner = games_block.inner(chunks[2]);
    frame.render_widget(games_block, chunks[2]);

    let tile_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, rows as u32); rows])
        .split(games_inner);

    app.tile_areas.clear();
    for (row, row_area) in tile_rows.iter().enumerate() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, TILE_COLS as u32); TILE_COLS])
            .split(*row_area);
        for (col, tile_area) in cols.iter().enumerate() {
            let i = row * TILE_COLS + col;
            let Some(&kind) = GameKind::ALL.get(i) else {
                continue;
            };
            render_game_tile(frame, *tile_area, kind, app.selected == i);
            app.tile_areas.push((*tile_area, kind));
        }
    }

    let ctrl_cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[3]);

    let navigation = Paragraph::new(vec![
        section("🔧 Menu"),
        key_line("↑ ↓ ← →", "Select game"),
        key_line("Enter / Click", "Play selected"),
        key_line("H", "Best scores"),
        key_line("q / Ctrl+C", "Quit"),
        Line::from(""),
        section("🎮 In game"),
        key_line("Esc", "Back to menu"),
        key_line("R / Ctrl+R / F5", "Restart"),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Rgb(60, 150, 200)))
            .title(" ⌨ Controls ")
            .title_style(Style::default().fg(Color::Rgb(200, 120, 255)).add_modifier(Modifier::BOLD)),
    );
    frame.render_widget(navigation, ctrl_cols[0]);

    let kind = GameKind::ALL[app.selected % GameKind::ALL.len()];
    let mut lines = vec![section(&format!("{} {}", kind.icon(), kind.title()))];
    lines.extend(game_controls(kind).iter().map(|(key, label)| key_line(key, label)));
    let game_ctrl = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(dim(kind.color())))
            .title(format!(" 🎮 {} ", kind.title()))
            .title_style(Style::default().fg(kind.color()).add_modifier(Modifier::BOLD)),
    );
    frame.render_widget(game_ctrl, ctrl_cols[1]);

    let footer = Paragraph::new(Line::from(vec![
        Span::styled("🦀 ", Style::default().fg(Color::Rgb(255, 100, 50))),
        Span::styled(concat!("v", env!("CARGO_PKG_VERSION")), Style::default().fg(Color::Rgb(80, 80, 100))),
        Span::styled("  │  ", Style::default().fg(Color::Rgb(40, 40, 60))),
        Span::styled("H", Style::default().fg(GOLD).add_modifier(Modifier::BOLD)),
        Span::styled(" Best scores", Style::default().fg(Color::Rgb(100, 100, 130))),
    ]))
    .alignment(Alignment::Center);
    frame.render_widget(footer, chunks[4]);

    if app.show_scores {
        render_best_overlay(frame, area, app);
    }
}

fn render_best_overlay(frame: &mut Frame, area: Rect, app: &App) {
    let overlay_w = 46u16.min(area.width.saturating_sub(4));
    let overlay_h = (GameKind::ALL.len() as u16 + 6).min(area.height.saturating_sub(2));
    let x = area.x + area.width.saturating_sub(overlay_w) / 2;
    let y = area.y + area.height.saturating_sub(overlay_h) / 2;
    let overlay_area = Rect::new(x, y, overlay_w, overlay_h);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::Rgb(255, 200, 80)))
        .title(" 🏆 Best Scores ")
        .title_style(Style::default().fg(GOLD).add_modifier(Modifier::BOLD))
        .style(Style::default().bg(Color::Rgb(15, 15, 25)));
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let mut lines = vec![Line::from("")];
    for kind in GameKind::ALL {
        let value = match (kind.score_key(), app.stored_best(kind)) {
            (None, _) => Span::styled("session tally only", Style::default().fg(Color::Rgb(60, 60, 80))),
            (Some(_), None) => Span::styled("-", Style::default().fg(Color::Rgb(60, 60, 80))),
            (Some(_), Some(best)) => {
                Span::styled(best.to_string(), Style::default().fg(Color::Rgb(255, 215, 0)).add_modifier(Modifier::BOLD))
            }
        };
        lines.push(Line::from(vec![
            Span::raw(format!("  {} ", kind.icon())),
            Span::styled(format!("{:<16}", kind.title()), Style::default().fg(kind.color()).add_modifier(Modifier::BOLD)),
            value,
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  Press ", Style::default().fg(Color::Rgb(80, 80, 100))),
        Span::styled("H", Style::default().fg(GOLD).add_modifier(Modifier::BOLD)),
        Span::styled(" to close", Style::default().fg(Color::Rgb(80, 80, 100))),
    ]));

    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(Color::Rgb(15, 15, 25))), inner);
}

#[cfg(test)]
mod tests {
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use super::*;
    use crate::games::GameContext;
    use crate::store::MemoryStore;

    #[test]
    fn render_records_one_area_per_game() {
        let mut app = App::new(GameContext::new(MemoryStore::shared()));
        let mut terminal = Terminal::new(TestBackend::new(120, 60)).unwrap();
        terminal.draw(|frame| render_home(frame, frame.area(), &mut app)).unwrap();

        assert_eq!(app.tile_areas.len(), GameKind::ALL.len());
        let (first, kind) = app.tile_areas[0];
        assert_eq!(kind, GameKind::TicTacToe);
        assert!(first.width > 0 && first.height > 0);
    }

    #[test]
    fn overlay_renders_over_the_grid() {
        let store = MemoryStore::shared();
        let mut app = App::new(GameContext::new(store));
        app.show_scores = true;
        let mut terminal = Terminal::new(TestBackend::new(120, 60)).unwrap();
        terminal.draw(|frame| render_home(frame, frame.area(), &mut app)).unwrap();
        let text: String = terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("session tally only"));
    }
}
