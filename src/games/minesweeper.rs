use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::clock::Schedule;
use crate::config::MinesweeperConfig;
use crate::games::{Game, GameContext};
use crate::grid::Grid;
use crate::input::{cell_at, Intent};
use crate::store::{BestScore, Order};
use crate::ui::canvas::Canvas;
use crate::ui::widgets::{self, FIELD_BG};

const MINE: i8 = -1;
const CELL_W: u16 = 3;
const CELL_H: u16 = 1;
const SECOND: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// No reveal yet; mines are not placed.
    Fresh,
    Playing,
    Won,
    Lost,
}

/// Mine layout plus the revealed and flagged overlays, all the same size.
pub struct Board {
    mines: usize,
    layout: Grid<i8>,
    revealed: Grid<bool>,
    flagged: Grid<bool>,
    status: Status,
}

impl Board {
    pub fn new(config: MinesweeperConfig) -> Self {
        let MinesweeperConfig { rows, cols, mines } = config;
        Self {
            mines,
            layout: Grid::new(rows, cols, 0),
            revealed: Grid::new(rows, cols, false),
            flagged: Grid::new(rows, cols, false),
            status: Status::Fresh,
        }
    }

    pub fn rows(&self) -> usize {
        self.layout.rows()
    }

    pub fn cols(&self) -> usize {
        self.layout.cols()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    #[cfg(test)]
    pub fn is_mine(&self, r: usize, c: usize) -> bool {
        self.layout.get(r, c) == Some(&MINE)
    }

    pub fn value(&self, r: usize, c: usize) -> i8 {
        self.layout[(r, c)]
    }

    pub fn is_revealed(&self, r: usize, c: usize) -> bool {
        self.revealed[(r, c)]
    }

    pub fn is_flagged(&self, r: usize, c: usize) -> bool {
        self.flagged[(r, c)]
    }

    pub fn flags(&self) -> usize {
        self.flagged.cells().iter().filter(|&&f| f).count()
    }

    /// Mines left to find as the counter shows it (may go negative).
    pub fn mines_left(&self) -> i64 {
        self.mines as i64 - self.flags() as i64
    }

    fn is_over(&self) -> bool {
        matches!(self.status, Status::Won | Status::Lost)
    }

    /// Scatters mines uniformly outside the 3x3 block around `(r0, c0)` and
    /// fills in the neighbour counts.
    pub fn place_mines(&mut self, r0: usize, c0: usize, rng: &mut StdRng) {
        let candidates = self
            .layout
            .iter()
            .map(|(pos, _)| pos)
            .filter(|&(r, c)| r.abs_diff(r0) > 1 || c.abs_diff(c0) > 1);
        for (r, c) in candidates.choose_multiple(rng, self.mines) {
            self.layout.set(r, c, MINE);
        }
        for r in 0..self.rows() {
            for c in 0..self.cols() {
                if self.layout[(r, c)] != MINE {
                    let count = self.layout.neighbours(r, c).filter(|&(nr, nc)| self.layout[(nr, nc)] == MINE).count();
                    self.layout.set(r, c, count as i8);
                }
            }
        }
        self.status = Status::Playing;
    }

    /// Reveals a cell, flooding outward through zero cells. Flagged or
    /// already revealed cells, and finished games, are left alone.
    pub fn reveal(&mut self, r: usize, c: usize, rng: &mut StdRng) {
        if self.is_over() || r >= self.rows() || c >= self.cols() || self.flagged[(r, c)] || self.revealed[(r, c)] {
            return;
        }
        if self.status == Status::Fresh {
            self.place_mines(r, c, rng);
        }

        let mut stack = vec![(r, c)];
        while let Some((r, c)) = stack.pop() {
            if self.revealed[(r, c)] || self.flagged[(r, c)] {
                continue;
            }
            self.revealed[(r, c)] = true;
            match self.layout[(r, c)] {
                MINE => {
                    self.status = Status::Lost;
                    self.revealed.fill(true);
                    return;
                }
                0 => stack.extend(self.layout.neighbours(r, c)),
                _ => {}
            }
        }

        let hidden_safe = self
            .layout
            .iter()
            .any(|((r, c), &v)| v != MINE && !self.revealed[(r, c)]);
        if !hidden_safe {
            self.status = Status::Won;
        }
    }

    pub fn toggle_flag(&mut self, r: usize, c: usize) {
        if self.is_over() || r >= self.rows() || c >= self.cols() || self.revealed[(r, c)] {
            return;
        }
        let flagged = &mut self.flagged[(r, c)];
        *flagged = !*flagged;
    }
}

fn number_color(n: i8) -> Color {
    match n {
        1 => Color::Rgb(59, 130, 246),
        2 => Color::Rgb(34, 197, 94),
        3 => Color::Rgb(239, 68, 68),
        4 => Color::Rgb(139, 92, 246),
        5 => Color::Rgb(220, 38, 38),
        6 => Color::Rgb(6, 182, 212),
        7 => Color::Rgb(200, 200, 200),
        _ => Color::Rgb(107, 114, 128),
    }
}

pub struct Minesweeper {
    config: MinesweeperConfig,
    board: Board,
    seconds: u32,
    /// Time since the last counted second. Only accrues after the first reveal.
    ticking: Duration,
    cursor: (usize, usize),
    best: BestScore,
    rng: StdRng,
    board_area: Rect,
}

impl Minesweeper {
    pub fn new(ctx: &GameContext) -> Self {
        let config = ctx.minesweeper;
        Self {
            config,
            board: Board::new(config),
            seconds: 0,
            ticking: Duration::ZERO,
            cursor: (config.rows / 2, config.cols / 2),
            best: BestScore::load(ctx.store.clone(), "minesweeperBest", Order::LowerIsBetter),
            rng: ctx.rng(),
            board_area: Rect::default(),
        }
    }

    pub fn reveal(&mut self, r: usize, c: usize) {
        self.board.reveal(r, c, &mut self.rng);
        match self.board.status() {
            Status::Won => {
                tracing::info!(seconds = self.seconds, "minefield cleared");
                self.best.submit(self.seconds);
            }
            Status::Lost => tracing::debug!(row = r, col = c, "stepped on a mine"),
            _ => {}
        }
    }

    fn move_cursor(&mut self, dr: isize, dc: isize) {
        let r = (self.cursor.0 as isize + dr).clamp(0, self.board.rows() as isize - 1);
        let c = (self.cursor.1 as isize + dc).clamp(0, self.board.cols() as isize - 1);
        self.cursor = (r as usize, c as usize);
    }

    fn render_board(&self) -> Canvas {
        let (rows, cols) = (self.board.rows(), self.board.cols());
        let mut canvas = Canvas::new(cols * CELL_W as usize, rows * CELL_H as usize, Style::default().bg(FIELD_BG));
        let playing = !matches!(self.board.status(), Status::Won | Status::Lost);
        for r in 0..rows {
            for c in 0..cols {
                let x = (c * CELL_W as usize) as i32;
                let y = r as i32;
                let selected = playing && self.cursor == (r, c);
                let (text, fg, bg) = if self.board.is_revealed(r, c) {
                    let bg = Color::Rgb(203, 213, 225);
                    match self.board.value(r, c) {
                        MINE => (" * ".to_string(), Color::Rgb(20, 20, 20), Color::Rgb(239, 68, 68)),
                        0 => ("   ".to_string(), Color::Black, bg),
                        n => (format!(" {n} "), number_color(n), bg),
                    }
                } else if self.board.is_flagged(r, c) {
                    (" F ".to_string(), Color::Rgb(239, 68, 68), Color::Rgb(71, 85, 105))
                } else {
                    let bg = if (r + c) % 2 == 0 { Color::Rgb(71, 85, 105) } else { Color::Rgb(64, 77, 96) };
                    ("   ".to_string(), Color::White, bg)
                };
                let bg = if selected { Color::Rgb(250, 204, 21) } else { bg };
                canvas.text(x, y, &text, Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD));
            }
        }
        canvas
    }
}

impl Game for Minesweeper {
    fn schedule(&self) -> Schedule {
        Schedule::Frame
    }

    /// Only drives the seconds counter; the board changes on input alone.
    fn update(&mut self, dt: Duration) {
        if self.board.status() != Status::Playing {
            return;
        }
        self.ticking += dt;
        while self.ticking >= SECOND {
            self.ticking -= SECOND;
            self.seconds += 1;
        }
    }

    fn handle_input(&mut self, intent: Intent) {
        let (rows, cols) = (self.board.rows(), self.board.cols());
        match intent {
            Intent::Left => self.move_cursor(0, -1),
            Intent::Right => self.move_cursor(0, 1),
            Intent::Up => self.move_cursor(-1, 0),
            Intent::Down => self.move_cursor(1, 0),
            Intent::Confirm if self.is_game_over() => self.reset(),
            Intent::Action | Intent::Confirm => {
                let (r, c) = self.cursor;
                self.reveal(r, c);
            }
            Intent::Flag => {
                let (r, c) = self.cursor;
                self.board.toggle_flag(r, c);
            }
            Intent::Click { column, row } => {
                if let Some((r, c)) = cell_at(self.board_area, CELL_W, CELL_H, rows, cols, column, row) {
                    self.cursor = (r, c);
                    self.reveal(r, c);
                }
            }
            Intent::AltClick { column, row } => {
                if let Some((r, c)) = cell_at(self.board_area, CELL_W, CELL_H, rows, cols, column, row) {
                    self.cursor = (r, c);
                    self.board.toggle_flag(r, c);
                }
            }
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = widgets::game_block("💣 Minesweeper", Color::Rgb(148, 163, 184));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let (status_area, field, help_area) = widgets::game_layout(inner);

        let best = self.best.value().map_or("-".to_string(), |s| format!("{s}s"));
        let status = widgets::status_line(vec![
            widgets::info_span(format!("💣 {}", self.board.mines_left()), Color::Red),
            widgets::info_span(format!("⏱ {}s", self.seconds), Color::Yellow),
            widgets::best_span(best),
        ]);
        frame.render_widget(Paragraph::new(status), status_area);

        let w = self.board.cols() as u16 * CELL_W;
        let h = self.board.rows() as u16 * CELL_H;
        self.board_area = widgets::centered(field, w, h);
        frame.render_widget(Paragraph::new(self.render_board().into_lines()), self.board_area);

        let help = match self.board.status() {
            Status::Won => widgets::banner_line("YOU WIN!", Color::Green, &format!("Cleared in {}s │ ENTER new game", self.seconds)),
            Status::Lost => widgets::banner_line("BOOM!", Color::Red, "ENTER new game │ Esc menu"),
            _ => widgets::help_line(&[
                ("←↑↓→", "Move"),
                ("SPACE/click", "Reveal"),
                ("F/right-click", "Flag"),
                ("R", "New"),
                ("Esc", "Menu"),
            ]),
        };
        frame.render_widget(Paragraph::new(help), help_area);
    }

    fn stop(&mut self) {}

    fn reset(&mut self) {
        self.board = Board::new(self.config);
        self.seconds = 0;
        self.ticking = Duration::ZERO;
        self.cursor = (self.config.rows / 2, self.config.cols / 2);
    }

    /// Elapsed seconds.
    fn score(&self) -> u32 {
        self.seconds
    }

    fn best(&self) -> Option<u32> {
        self.best.value()
    }

    fn is_game_over(&self) -> bool {
        matches!(self.board.status(), Status::Won | Status::Lost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn config() -> MinesweeperConfig {
        MinesweeperConfig::default()
    }

    /// Board with mines exactly at `mines`, past the first-reveal placement.
    fn rigged(rows: usize, cols: usize, mines: &[(usize, usize)]) -> Board {
        let mut board = Board::new(MinesweeperConfig { rows, cols, mines: mines.len() });
        for &(r, c) in mines {
            board.layout.set(r, c, MINE);
        }
        for r in 0..rows {
            for c in 0..cols {
                if board.layout[(r, c)] != MINE {
                    let n = board.layout.neighbours(r, c).filter(|&(a, b)| board.layout[(a, b)] == MINE).count();
                    board.layout.set(r, c, n as i8);
                }
            }
        }
        board.status = Status::Playing;
        board
    }

    #[test]
    fn flood_reveals_zero_region_and_its_border() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut board = rigged(4, 4, &[(3, 3)]);
        board.reveal(0, 0, &mut rng);
        for r in 0..4 {
            for c in 0..4 {
                assert_eq!(board.is_revealed(r, c), (r, c) != (3, 3), "({r},{c})");
            }
        }
        assert_eq!(board.status(), Status::Won);
    }

    #[test]
    fn flood_stops_at_flags() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut board = rigged(4, 4, &[(3, 3)]);
        board.toggle_flag(0, 3);
        board.reveal(0, 0, &mut rng);
        assert!(!board.is_revealed(0, 3));
        assert_eq!(board.status(), Status::Playing);
    }

    #[test]
    fn revealing_a_mine_loses_and_exposes_everything() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut board = rigged(4, 4, &[(2, 2)]);
        board.reveal(2, 2, &mut rng);
        assert_eq!(board.status(), Status::Lost);
        assert!(board.revealed.cells().iter().all(|&r| r));
        board.toggle_flag(0, 0);
        assert_eq!(board.flags(), 0);
    }

    #[test]
    fn flagged_cells_cannot_be_revealed() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut board = rigged(4, 4, &[(2, 2)]);
        board.toggle_flag(2, 2);
        board.reveal(2, 2, &mut rng);
        assert_eq!(board.status(), Status::Playing);
        assert_eq!(board.mines_left(), 0);
        board.toggle_flag(2, 2);
        assert_eq!(board.mines_left(), 1);
    }

    #[test]
    fn timer_runs_only_while_playing() {
        let mut ctx = GameContext::new(MemoryStore::shared());
        ctx.seed = Some(5);
        let mut game = Minesweeper::new(&ctx);
        game.update(Duration::from_secs(1));
        assert_eq!(game.score(), 0);
        game.reveal(4, 4);
        if !game.is_game_over() {
            game.update(Duration::from_secs(1));
            assert_eq!(game.score(), 1);
        }
    }

    #[test]
    fn first_second_counts_from_the_opening_reveal() {
        let mut ctx = GameContext::new(MemoryStore::shared());
        ctx.seed = Some(5);
        // dense enough that the opening reveal cannot clear the board
        ctx.minesweeper = MinesweeperConfig { rows: 9, cols: 9, mines: 70 };
        let mut game = Minesweeper::new(&ctx);
        game.update(Duration::from_millis(700));
        game.reveal(8, 8);
        assert_eq!(game.board.status(), Status::Playing);
        game.update(Duration::from_millis(999));
        assert_eq!(game.score(), 0);
        game.update(Duration::from_millis(1));
        assert_eq!(game.score(), 1);
        game.update(Duration::from_millis(2500));
        assert_eq!(game.score(), 3);
    }

    proptest! {
        #[test]
        fn first_reveal_is_always_safe(seed in any::<u64>(), r in 0usize..9, c in 0usize..9) {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut board = Board::new(config());
            board.reveal(r, c, &mut rng);
            prop_assert!(board.status() != Status::Lost);
            let mines = board.layout.cells().iter().filter(|&&v| v == MINE).count();
            prop_assert_eq!(mines, 10);
            for dr in -1isize..=1 {
                for dc in -1isize..=1 {
                    let (nr, nc) = (r as isize + dr, c as isize + dc);
                    if board.layout.within_bounds(nr, nc) {
                        prop_assert!(!board.is_mine(nr as usize, nc as usize));
                    }
                }
            }
            // the opening cell is a zero, so its whole neighbourhood is open
            prop_assert_eq!(board.value(r, c), 0);
            for (nr, nc) in board.layout.neighbours(r, c) {
                prop_assert!(board.is_revealed(nr, nc));
            }
        }

        #[test]
        fn flood_fill_reveals_the_closure_of_zero_cells(seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut board = Board::new(config());
            board.reveal(4, 4, &mut rng);
            if board.status() == Status::Playing {
                // every revealed zero has all neighbours revealed, and no
                // revealed cell is a mine
                for ((r, c), &v) in board.layout.iter() {
                    if board.is_revealed(r, c) {
                        prop_assert!(v != MINE);
                        if v == 0 {
                            for (nr, nc) in board.layout.neighbours(r, c) {
                                prop_assert!(board.is_revealed(nr, nc));
                            }
                        }
                    }
                }
            }
        }
    }
}
