use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::clock::Schedule;
use crate::games::Game;
use crate::grid::Grid;
use crate::input::{cell_at, Intent};
use crate::ui::canvas::Canvas;
use crate::ui::widgets::{self, FIELD_BG};

const CELL_W: u16 = 7;
const CELL_H: u16 = 3;

/// Every winning index triple on the row-major 3x3 board.
#[rustfmt::skip]
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2], [3, 4, 5], [6, 7, 8],
    [0, 3, 6], [1, 4, 7], [2, 5, 8],
    [0, 4, 8], [2, 4, 6],
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    fn other(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    fn symbol(self) -> char {
        match self {
            Mark::X => 'X',
            Mark::O => 'O',
        }
    }

    fn color(self) -> Color {
        match self {
            Mark::X => Color::Rgb(239, 68, 68),
            Mark::O => Color::Rgb(59, 130, 246),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Win(Mark),
    Draw,
}

/// The mark holding any complete line, checked in `LINES` order.
pub fn winner(cells: &[Option<Mark>]) -> Option<Mark> {
    LINES.iter().find_map(|&[a, b, c]| match (cells[a], cells[b], cells[c]) {
        (Some(x), Some(y), Some(z)) if x == y && y == z => Some(x),
        _ => None,
    })
}

pub struct TicTacToe {
    board: Grid<Option<Mark>>,
    current: Mark,
    outcome: Option<Outcome>,
    cursor: (usize, usize),
    x_wins: u32,
    o_wins: u32,
    draws: u32,
    board_area: Rect,
}

impl TicTacToe {
    pub fn new() -> Self {
        Self {
            board: Grid::new(3, 3, None),
            current: Mark::X,
            outcome: None,
            cursor: (1, 1),
            x_wins: 0,
            o_wins: 0,
            draws: 0,
            board_area: Rect::default(),
        }
    }

    #[cfg(test)]
    pub fn current(&self) -> Mark {
        self.current
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Places the current mark. Occupied cells and finished games are ignored.
    pub fn play(&mut self, r: usize, c: usize) -> bool {
        if self.outcome.is_some() || !matches!(self.board.get(r, c), Some(None)) {
            return false;
        }
        self.board.set(r, c, Some(self.current));
        if let Some(mark) = winner(self.board.cells()) {
            self.outcome = Some(Outcome::Win(mark));
            match mark {
                Mark::X => self.x_wins += 1,
                Mark::O => self.o_wins += 1,
            }
            tracing::debug!(winner = ?mark, "tic-tac-toe won");
        } else if self.board.cells().iter().all(Option::is_some) {
            self.outcome = Some(Outcome::Draw);
            self.draws += 1;
        } else {
            self.current = self.current.other();
        }
        true
    }

    fn move_cursor(&mut self, dr: isize, dc: isize) {
        let r = (self.cursor.0 as isize + dr).clamp(0, 2) as usize;
        let c = (self.cursor.1 as isize + dc).clamp(0, 2) as usize;
        self.cursor = (r, c);
    }

    fn render_board(&self) -> Canvas {
        let w = CELL_W as usize * 3;
        let h = CELL_H as usize * 3;
        let mut canvas = Canvas::new(w, h, Style::default().bg(FIELD_BG));
        let winning: Vec<usize> = LINES
            .iter()
            .find(|&&[a, b, c]| {
                let cells = self.board.cells();
                cells[a].is_some() && cells[a] == cells[b] && cells[b] == cells[c]
            })
            .map(|l| l.to_vec())
            .unwrap_or_default();

        for ((r, c), cell) in self.board.iter() {
            let x0 = c as i32 * CELL_W as i32;
            let y0 = r as i32 * CELL_H as i32;
            let selected = self.cursor == (r, c) && self.outcome.is_none();
            let bg = if winning.contains(&(r * 3 + c)) {
                Color::Rgb(60, 90, 40)
            } else if selected {
                Color::Rgb(50, 50, 80)
            } else if (r + c) % 2 == 0 {
                Color::Rgb(28, 28, 44)
            } else {
                Color::Rgb(20, 20, 34)
            };
            canvas.fill(x0, y0, x0 + CELL_W as i32, y0 + CELL_H as i32, ' ', Style::default().bg(bg));
            if let Some(mark) = cell {
                let style = Style::default().fg(mark.color()).bg(bg).add_modifier(Modifier::BOLD);
                canvas.put(x0 + CELL_W as i32 / 2, y0 + 1, mark.symbol(), style);
            } else {
                let style = Style::default().fg(Color::Rgb(70, 70, 90)).bg(bg);
                let digit = char::from(b'1' + (r * 3 + c) as u8);
                canvas.put(x0 + CELL_W as i32 / 2, y0 + 1, digit, style);
            }
        }
        canvas
    }
}

impl Game for TicTacToe {
    fn schedule(&self) -> Schedule {
        Schedule::TurnBased
    }

    fn handle_input(&mut self, intent: Intent) {
        if self.outcome.is_some() {
            if matches!(intent, Intent::Confirm | Intent::Action) {
                self.reset();
            }
            return;
        }
        match intent {
            Intent::Left => self.move_cursor(0, -1),
            Intent::Right => self.move_cursor(0, 1),
            Intent::Up => self.move_cursor(-1, 0),
            Intent::Down => self.move_cursor(1, 0),
            Intent::Action | Intent::Confirm => {
                let (r, c) = self.cursor;
                self.play(r, c);
            }
            Intent::Digit(d @ 1..=9) => {
                let i = (d - 1) as usize;
                self.play(i / 3, i % 3);
            }
            Intent::Click { column, row } => {
                if let Some((r, c)) = cell_at(self.board_area, CELL_W, CELL_H, 3, 3, column, row) {
                    self.cursor = (r, c);
                    self.play(r, c);
                }
            }
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = widgets::game_block("❌ Tic-Tac-Toe ⭕", Color::Rgb(99, 102, 241));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let (status_area, field, help_area) = widgets::game_layout(inner);

        let turn = match self.outcome {
            Some(Outcome::Win(m)) => widgets::info_span(format!("Player {} wins!", m.symbol()), m.color()),
            Some(Outcome::Draw) => widgets::info_span("It's a draw!".to_string(), Color::Yellow),
            None => widgets::info_span(format!("Player {}'s turn", self.current.symbol()), self.current.color()),
        };
        let status = widgets::status_line(vec![
            turn,
            widgets::info_span(format!("X {}", self.x_wins), Mark::X.color()),
            widgets::info_span(format!("O {}", self.o_wins), Mark::O.color()),
            widgets::info_span(format!("Draws {}", self.draws), Color::Gray),
        ]);
        frame.render_widget(Paragraph::new(status), status_area);

        self.board_area = widgets::centered(field, CELL_W * 3, CELL_H * 3);
        frame.render_widget(Paragraph::new(self.render_board().into_lines()), self.board_area);

        let help = if self.outcome.is_some() {
            widgets::banner_line("GAME OVER", Color::Yellow, "ENTER new round │ Esc menu")
        } else {
            widgets::help_line(&[("←↑↓→", "Move"), ("SPACE", "Place"), ("1-9", "Cell"), ("R", "Restart"), ("Esc", "Menu")])
        };
        frame.render_widget(Paragraph::new(help), help_area);
    }

    fn stop(&mut self) {}

    fn reset(&mut self) {
        self.board.fill(None);
        self.current = Mark::X;
        self.outcome = None;
        self.cursor = (1, 1);
    }

    fn score(&self) -> u32 {
        0
    }

    fn best(&self) -> Option<u32> {
        None
    }

    fn is_game_over(&self) -> bool {
        self.outcome.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_row_wins() {
        use Mark::*;
        let board = [Some(X), Some(X), Some(X), None, Some(O), Some(O), None, None, None];
        assert_eq!(winner(&board), Some(X));
    }

    #[test]
    fn empty_board_has_no_winner() {
        assert_eq!(winner(&[None; 9]), None);
    }

    #[test]
    fn players_alternate_and_occupied_cells_are_ignored() {
        let mut game = TicTacToe::new();
        assert!(game.play(0, 0));
        assert_eq!(game.current(), Mark::O);
        assert!(!game.play(0, 0));
        assert_eq!(game.current(), Mark::O);
    }

    #[test]
    fn winning_move_ends_the_round_without_switching() {
        let mut game = TicTacToe::new();
        for (r, c) in [(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)] {
            game.play(r, c);
        }
        assert_eq!(game.outcome(), Some(Outcome::Win(Mark::X)));
        assert_eq!(game.current(), Mark::X);
        assert!(!game.play(2, 2));
    }

    #[test]
    fn full_board_without_line_is_a_draw() {
        let mut game = TicTacToe::new();
        // X O X / X O O / O X X
        for (r, c) in [(0, 0), (0, 1), (0, 2), (1, 1), (1, 0), (1, 2), (2, 1), (2, 0), (2, 2)] {
            game.play(r, c);
        }
        assert_eq!(game.outcome(), Some(Outcome::Draw));
    }

    #[test]
    fn reset_keeps_the_tally() {
        let mut game = TicTacToe::new();
        for (r, c) in [(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)] {
            game.play(r, c);
        }
        game.reset();
        assert_eq!(game.x_wins, 1);
        assert_eq!(game.outcome(), None);
        assert_eq!(game.current(), Mark::X);
    }
}
