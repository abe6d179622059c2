use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::clock::Schedule;
use crate::games::Game;
use crate::grid::Grid;
use crate::input::{cell_at, Intent};
use crate::ui::canvas::Canvas;
use crate::ui::widgets::{self, FIELD_BG};

pub const ROWS: usize = 6;
pub const COLS: usize = 7;
const CELL_W: u16 = 5;
const CELL_H: u16 = 2;
/// Horizontal, vertical and both diagonals.
const AXES: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disc {
    Red,
    Yellow,
}

impl Disc {
    fn other(self) -> Disc {
        match self {
            Disc::Red => Disc::Yellow,
            Disc::Yellow => Disc::Red,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Disc::Red => "Red",
            Disc::Yellow => "Yellow",
        }
    }

    fn color(self) -> Color {
        match self {
            Disc::Red => Color::Rgb(239, 68, 68),
            Disc::Yellow => Color::Rgb(234, 179, 8),
        }
    }
}

/// Length of the run of `disc` through `(r, c)` along `(dr, dc)`, counting
/// both ways from the cell.
fn run_length(board: &Grid<Option<Disc>>, r: usize, c: usize, (dr, dc): (isize, isize), disc: Disc) -> usize {
    let mut count = 1;
    for sign in [1, -1] {
        let (mut rr, mut cc) = (r as isize + dr * sign, c as isize + dc * sign);
        while board.within_bounds(rr, cc) && board[(rr as usize, cc as usize)] == Some(disc) {
            count += 1;
            rr += dr * sign;
            cc += dc * sign;
        }
    }
    count
}

/// True if the disc at `(r, c)` completes four in a row on any axis.
pub fn wins_at(board: &Grid<Option<Disc>>, r: usize, c: usize) -> bool {
    let Some(disc) = board[(r, c)] else {
        return false;
    };
    AXES.iter().any(|&axis| run_length(board, r, c, axis, disc) >= 4)
}

pub struct ConnectFour {
    board: Grid<Option<Disc>>,
    current: Disc,
    winner: Option<Disc>,
    draw: bool,
    cursor: usize,
    red_wins: u32,
    yellow_wins: u32,
    board_area: Rect,
}

impl ConnectFour {
    pub fn new() -> Self {
        Self {
            board: Grid::new(ROWS, COLS, None),
            current: Disc::Red,
            winner: None,
            draw: false,
            cursor: COLS / 2,
            red_wins: 0,
            yellow_wins: 0,
            board_area: Rect::default(),
        }
    }

    #[cfg(test)]
    pub fn current(&self) -> Disc {
        self.current
    }

    #[cfg(test)]
    pub fn winner(&self) -> Option<Disc> {
        self.winner
    }

    #[cfg(test)]
    pub fn board(&self) -> &Grid<Option<Disc>> {
        &self.board
    }

    /// Drops the current disc into `col`. Returns the landing row, or `None`
    /// when the column is full, out of range or the game has ended; the turn
    /// does not pass in that case.
    pub fn drop_disc(&mut self, col: usize) -> Option<usize> {
        if self.winner.is_some() || self.draw || col >= COLS {
            return None;
        }
        let row = (0..ROWS).rev().find(|&r| self.board[(r, col)].is_none())?;
        self.board.set(row, col, Some(self.current));

        if wins_at(&self.board, row, col) {
            self.winner = Some(self.current);
            match self.current {
                Disc::Red => self.red_wins += 1,
                Disc::Yellow => self.yellow_wins += 1,
            }
            tracing::debug!(winner = self.current.name(), "connect four won");
        } else if self.board.row(0).iter().all(Option::is_some) {
            self.draw = true;
        } else {
            self.current = self.current.other();
        }
        Some(row)
    }

    fn render_board(&self) -> Canvas {
        let w = CELL_W as usize * COLS;
        let h = CELL_H as usize * ROWS + 1;
        let frame_bg = Color::Rgb(30, 64, 175);
        let mut canvas = Canvas::new(w, h, Style::default().bg(FIELD_BG));

        // drop indicator above the board
        if self.winner.is_none() && !self.draw {
            let x = self.cursor as i32 * CELL_W as i32 + CELL_W as i32 / 2;
            canvas.put(x, 0, '▼', Style::default().fg(self.current.color()).bg(FIELD_BG));
        }
        for ((r, c), cell) in self.board.iter() {
            let x0 = c as i32 * CELL_W as i32;
            let y0 = 1 + r as i32 * CELL_H as i32;
            let bg = if c == self.cursor { Color::Rgb(37, 80, 200) } else { frame_bg };
            canvas.fill(x0, y0, x0 + CELL_W as i32, y0 + CELL_H as i32, ' ', Style::default().bg(bg));
            let (glyph, fg) = match cell {
                Some(d) => ("███", d.color()),
                None => ("▒▒▒", Color::Rgb(15, 23, 42)),
            };
            canvas.text(x0 + 1, y0, glyph, Style::default().fg(fg).bg(bg));
        }
        canvas
    }
}

impl Game for ConnectFour {
    fn schedule(&self) -> Schedule {
        Schedule::TurnBased
    }

    fn handle_input(&mut self, intent: Intent) {
        if self.winner.is_some() || self.draw {
            if matches!(intent, Intent::Confirm | Intent::Action) {
                self.reset();
            }
            return;
        }
        match intent {
            Intent::Left => self.cursor = self.cursor.saturating_sub(1),
            Intent::Right => self.cursor = (self.cursor + 1).min(COLS - 1),
            Intent::Down | Intent::Action | Intent::Confirm => {
                self.drop_disc(self.cursor);
            }
            Intent::Digit(d @ 1..=7) => {
                self.cursor = (d - 1) as usize;
                self.drop_disc(self.cursor);
            }
            Intent::Click { column, row } => {
                // any cell of a column (or the indicator row) drops into it
                let area = Rect { y: self.board_area.y + 1, ..self.board_area };
                let row = row.max(area.y);
                if let Some((_, c)) = cell_at(area, CELL_W, CELL_H, ROWS, COLS, column, row) {
                    self.cursor = c;
                    self.drop_disc(c);
                }
            }
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = widgets::game_block("🔴 Connect Four 🟡", Color::Rgb(234, 179, 8));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let (status_area, field, help_area) = widgets::game_layout(inner);

        let turn = if let Some(w) = self.winner {
            widgets::info_span(format!("{} wins!", w.name()), w.color())
        } else if self.draw {
            widgets::info_span("It's a draw!".to_string(), Color::Gray)
        } else {
            widgets::info_span(format!("{}'s turn", self.current.name()), self.current.color())
        };
        let status = widgets::status_line(vec![
            turn,
            widgets::info_span(format!("Red {}", self.red_wins), Disc::Red.color()),
            widgets::info_span(format!("Yellow {}", self.yellow_wins), Disc::Yellow.color()),
        ]);
        frame.render_widget(Paragraph::new(status), status_area);

        self.board_area = widgets::centered(field, CELL_W * COLS as u16, CELL_H * ROWS as u16 + 1);
        frame.render_widget(Paragraph::new(self.render_board().into_lines()), self.board_area);

        let help = if self.winner.is_some() || self.draw {
            widgets::banner_line("GAME OVER", Color::Yellow, "ENTER new round │ Esc menu")
        } else {
            widgets::help_line(&[("←→", "Column"), ("SPACE/↓", "Drop"), ("1-7", "Column"), ("R", "Restart"), ("Esc", "Menu")])
        };
        frame.render_widget(Paragraph::new(help), help_area);
    }

    fn stop(&mut self) {}

    fn reset(&mut self) {
        self.board.fill(None);
        self.current = Disc::Red;
        self.winner = None;
        self.draw = false;
        self.cursor = COLS / 2;
    }

    fn score(&self) -> u32 {
        0
    }

    fn best(&self) -> Option<u32> {
        None
    }

    fn is_game_over(&self) -> bool {
        self.winner.is_some() || self.draw
    }
}
