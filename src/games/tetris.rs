use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::clock::Schedule;
use crate::games::{Game, GameContext};
use crate::grid::Grid;
use crate::input::Intent;
use crate::store::{BestScore, Order};
use crate::ui::canvas::Canvas;
use crate::ui::widgets::{self, FIELD_BG};

pub const ROWS: usize = 20;
pub const COLS: usize = 10;
const BASE_DROP: Duration = Duration::from_millis(1000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PieceKind {
    I,
    O,
    T,
    L,
    J,
    S,
    Z,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::L,
        PieceKind::J,
        PieceKind::S,
        PieceKind::Z,
    ];

    pub fn shape(self) -> Shape {
        let rows: &[&[u8]] = match self {
            PieceKind::I => &[&[1, 1, 1, 1]],
            PieceKind::O => &[&[1, 1], &[1, 1]],
            PieceKind::T => &[&[0, 1, 0], &[1, 1, 1]],
            PieceKind::L => &[&[1, 0, 0], &[1, 1, 1]],
            PieceKind::J => &[&[0, 0, 1], &[1, 1, 1]],
            PieceKind::S => &[&[0, 1, 1], &[1, 1, 0]],
            PieceKind::Z => &[&[1, 1, 0], &[0, 1, 1]],
        };
        rows.iter().map(|r| r.iter().map(|&v| v == 1).collect()).collect()
    }

    pub fn color(self) -> Color {
        match self {
            PieceKind::I => Color::Rgb(0, 245, 255),
            PieceKind::O => Color::Rgb(255, 235, 59),
            PieceKind::T => Color::Rgb(156, 39, 176),
            PieceKind::L => Color::Rgb(255, 152, 0),
            PieceKind::J => Color::Rgb(33, 150, 243),
            PieceKind::S => Color::Rgb(76, 175, 80),
            PieceKind::Z => Color::Rgb(244, 67, 54),
        }
    }
}

/// Occupancy matrix of a piece, row-major.
pub type Shape = Vec<Vec<bool>>;
pub type Board = Grid<Option<PieceKind>>;

#[derive(Clone, Debug, PartialEq)]
pub struct Piece {
    pub kind: PieceKind,
    pub shape: Shape,
    pub x: i32,
    pub y: i32,
}

impl Piece {
    pub fn spawn(kind: PieceKind) -> Self {
        Self {
            kind,
            shape: kind.shape(),
            x: COLS as i32 / 2 - 1,
            y: 0,
        }
    }

    /// Board coordinates `(x, y)` the piece occupies at row offset `dy`.
    fn cells(&self, dy: i32) -> impl Iterator<Item = (i32, i32)> + '_ {
        shape_cells(&self.shape, self.x, self.y + dy)
    }
}

fn shape_cells(shape: &Shape, x: i32, y: i32) -> impl Iterator<Item = (i32, i32)> + '_ {
    shape.iter().enumerate().flat_map(move |(dy, row)| {
        row.iter()
            .enumerate()
            .filter(|(_, filled)| **filled)
            .map(move |(dx, _)| (x + dx as i32, y + dy as i32))
    })
}

/// Rotates 90 degrees clockwise: column `i`, read bottom to top, becomes
/// row `i`.
pub fn rotate(shape: &Shape) -> Shape {
    let width = shape.first().map_or(0, Vec::len);
    (0..width)
        .map(|i| shape.iter().rev().map(|row| row[i]).collect())
        .collect()
}

/// True if `shape` anchored at `(x, y)` leaves the side walls, reaches the
/// floor, or overlaps a locked cell. Rows above the board are never occupied.
pub fn collides(board: &Board, shape: &Shape, x: i32, y: i32) -> bool {
    for (dy, row) in shape.iter().enumerate() {
        for (dx, &filled) in row.iter().enumerate() {
            if !filled {
                continue;
            }
            let (cx, cy) = (x + dx as i32, y + dy as i32);
            if cx < 0 || cx >= board.cols() as i32 || cy >= board.rows() as i32 {
                return true;
            }
            if cy >= 0 && board[(cy as usize, cx as usize)].is_some() {
                return true;
            }
        }
    }
    false
}

/// Removes every full row, scanning upward and re-checking the same index
/// after a removal. Returns the number of rows cleared.
pub fn clear_lines(board: &mut Board) -> u32 {
    let mut cleared = 0;
    let mut r = board.rows();
    while r > 0 {
        let row = r - 1;
        if board.row(row).iter().all(Option::is_some) {
            board.drop_row(row, None);
            cleared += 1;
        } else {
            r -= 1;
        }
    }
    cleared
}

pub struct Tetris {
    board: Board,
    piece: Piece,
    next: PieceKind,
    score: u32,
    lines: u32,
    level: u32,
    drop_counter: Duration,
    over: bool,
    paused: bool,
    best: BestScore,
    rng: StdRng,
}

impl Tetris {
    pub fn new(ctx: &GameContext) -> Self {
        let mut rng = ctx.rng();
        let first = Self::random_kind(&mut rng);
        let next = Self::random_kind(&mut rng);
        Self {
            board: Grid::new(ROWS, COLS, None),
            piece: Piece::spawn(first),
            next,
            score: 0,
            lines: 0,
            level: 1,
            drop_counter: Duration::ZERO,
            over: false,
            paused: false,
            best: BestScore::load(ctx.store.clone(), "tetrisBest", Order::HigherIsBetter),
            rng,
        }
    }

    fn random_kind(rng: &mut StdRng) -> PieceKind {
        PieceKind::ALL[rng.gen_range(0..PieceKind::ALL.len())]
    }

    #[cfg(test)]
    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn drop_interval(&self) -> Duration {
        BASE_DROP / self.level
    }

    fn fits(&self, dx: i32, dy: i32) -> bool {
        !collides(&self.board, &self.piece.shape, self.piece.x + dx, self.piece.y + dy)
    }

    fn shift(&mut self, dx: i32) {
        if self.fits(dx, 0) {
            self.piece.x += dx;
        }
    }

    /// Rotation is rejected outright when the rotated footprint collides.
    pub fn rotate_piece(&mut self) -> bool {
        let rotated = rotate(&self.piece.shape);
        if collides(&self.board, &rotated, self.piece.x, self.piece.y) {
            return false;
        }
        self.piece.shape = rotated;
        true
    }

    /// Moves the piece down one row, locking it if it cannot. Returns whether it moved.
    fn step_down(&mut self) -> bool {
        if self.fits(0, 1) {
            self.piece.y += 1;
            true
        } else {
            self.lock();
            false
        }
    }

    fn hard_drop(&mut self) {
        while self.fits(0, 1) {
            self.piece.y += 1;
            self.score += 2;
        }
        self.lock();
    }

    fn lock(&mut self) {
        let cells: Vec<(i32, i32)> = self.piece.cells(0).collect();
        for (x, y) in cells {
            if y >= 0 {
                self.board.set(y as usize, x as usize, Some(self.piece.kind));
            }
        }
        let cleared = clear_lines(&mut self.board);
        if cleared > 0 {
            self.lines += cleared;
            self.score += cleared * 100 * self.level;
            self.level = self.lines / 10 + 1;
            tracing::debug!(cleared, lines = self.lines, level = self.level, "lines cleared");
        }
        self.spawn_next();
    }

    fn spawn_next(&mut self) {
        self.piece = Piece::spawn(self.next);
        self.next = Self::random_kind(&mut self.rng);
        if !self.fits(0, 0) {
            self.over = true;
            self.best.submit(self.score);
            tracing::info!(score = self.score, lines = self.lines, "tetris over");
        }
    }

    fn render_board(&self) -> Canvas {
        // two characters per cell keeps blocks roughly square
        let mut canvas = Canvas::new(COLS * 2, ROWS, Style::default().bg(FIELD_BG));
        for ((r, c), cell) in self.board.iter() {
            let x = c as i32 * 2;
            match cell {
                Some(kind) => canvas.text(x, r as i32, "██", Style::default().fg(kind.color()).bg(FIELD_BG)),
                None => canvas.text(x, r as i32, " ·", Style::default().fg(Color::Rgb(40, 40, 60)).bg(FIELD_BG)),
            }
        }
        if !self.over {
            let mut ghost_y = self.piece.y;
            while !collides(&self.board, &self.piece.shape, self.piece.x, ghost_y + 1) {
                ghost_y += 1;
            }
            let ghost = Style::default().fg(Color::Rgb(70, 70, 90)).bg(FIELD_BG);
            for (x, y) in self.piece.cells(ghost_y - self.piece.y) {
                canvas.text(x * 2, y, "░░", ghost);
            }
            let style = Style::default().fg(self.piece.kind.color()).bg(FIELD_BG);
            for (x, y) in self.piece.cells(0) {
                canvas.text(x * 2, y, "██", style);
            }
        }
        canvas
    }

    fn render_side(&self) -> Vec<Line<'static>> {
        let label = Style::default().fg(Color::Gray);
        let value = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
        let mut lines = vec![
            Line::from(Span::styled("NEXT", label)),
            Line::from(""),
        ];
        let color = self.next.color();
        for row in self.next.shape() {
            let text: String = row.iter().map(|&f| if f { "██" } else { "  " }).collect();
            lines.push(Line::from(Span::styled(text, Style::default().fg(color))));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(vec![Span::styled("Lines ", label), Span::styled(self.lines.to_string(), value)]));
        lines.push(Line::from(vec![Span::styled("Level ", label), Span::styled(self.level.to_string(), value)]));
        lines
    }
}

impl Game for Tetris {
    fn schedule(&self) -> Schedule {
        Schedule::Frame
    }

    fn update(&mut self, dt: Duration) {
        if self.over || self.paused {
            return;
        }
        self.drop_counter += dt;
        if self.drop_counter > self.drop_interval() {
            self.step_down();
            self.drop_counter = Duration::ZERO;
        }
    }

    fn handle_input(&mut self, intent: Intent) {
        if self.over {
            if intent == Intent::Confirm {
                self.reset();
            }
            return;
        }
        if intent == Intent::Pause {
            self.paused = !self.paused;
            return;
        }
        if self.paused {
            return;
        }
        match intent {
            Intent::Left => self.shift(-1),
            Intent::Right => self.shift(1),
            Intent::Down => {
                if self.step_down() {
                    self.score += 1;
                }
            }
            Intent::Up => {
                self.rotate_piece();
            }
            Intent::Action => self.hard_drop(),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = widgets::game_block("🟪 Tetris", PieceKind::T.color());
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let (status_area, field, help_area) = widgets::game_layout(inner);

        let status = widgets::status_line(vec![
            widgets::score_span("Score", self.score),
            widgets::info_span(format!("Level {}", self.level), Color::Green),
            widgets::best_span(self.best.shown()),
        ]);
        frame.render_widget(Paragraph::new(status), status_area);

        let board_w = COLS as u16 * 2;
        let side_w = 12;
        let play = widgets::centered(field, board_w + 2 + side_w, ROWS as u16);
        let board_area = Rect { width: board_w.min(play.width), ..play };
        let side_area = Rect {
            x: play.x + board_w + 2,
            width: play.width.saturating_sub(board_w + 2),
            ..play
        };
        frame.render_widget(Paragraph::new(self.render_board().into_lines()), board_area);
        frame.render_widget(Paragraph::new(self.render_side()), side_area);

        let help = if self.over {
            widgets::banner_line("GAME OVER", Color::Red, "ENTER play again │ Esc menu")
        } else if self.paused {
            widgets::banner_line("PAUSED", Color::Yellow, "P resume")
        } else {
            widgets::help_line(&[("←→", "Move"), ("↑", "Rotate"), ("↓", "Soft"), ("SPACE", "Hard drop"), ("P", "Pause"), ("Esc", "Menu")])
        };
        frame.render_widget(Paragraph::new(help), help_area);
    }

    fn stop(&mut self) {
        self.drop_counter = Duration::ZERO;
        self.best.submit(self.score);
    }

    fn reset(&mut self) {
        self.best.submit(self.score);
        self.board.fill(None);
        self.score = 0;
        self.lines = 0;
        self.level = 1;
        self.drop_counter = Duration::ZERO;
        self.over = false;
        self.paused = false;
        self.piece = Piece::spawn(Self::random_kind(&mut self.rng));
        self.next = Self::random_kind(&mut self.rng);
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn best(&self) -> Option<u32> {
        self.best.value()
    }

    fn is_game_over(&self) -> bool {
        self.over
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use proptest::prelude::*;

    fn tetris() -> Tetris {
        let mut ctx = GameContext::new(MemoryStore::shared());
        ctx.seed = Some(9);
        Tetris::new(&ctx)
    }

    fn occupied(shape: &Shape) -> usize {
        shape.iter().flatten().filter(|&&f| f).count()
    }

    #[test]
    fn rotation_turns_clockwise() {
        let t = PieceKind::T.shape();
        let once = rotate(&t);
        assert_eq!(once.len(), 3);
        assert_eq!(once[0].len(), 2);
        assert_eq!(occupied(&once), 4);
        let full = rotate(&rotate(&rotate(&once)));
        assert_eq!(full, t);
    }

    #[test]
    fn colliding_rotation_keeps_shape_for_every_piece() {
        for kind in PieceKind::ALL {
            let mut game = tetris();
            game.piece = Piece::spawn(kind);
            // wall off everything except the piece's own footprint
            let own: Vec<(i32, i32)> = game.piece.cells(0).collect();
            for r in 0..ROWS {
                for c in 0..COLS {
                    if !own.contains(&(c as i32, r as i32)) {
                        game.board.set(r, c, Some(PieceKind::O));
                    }
                }
            }
            let before = game.piece.shape.clone();
            let rotated = rotate(&before);
            if rotated == before {
                // O is rotation-invariant and always fits its own footprint
                assert!(game.rotate_piece());
            } else {
                assert!(!game.rotate_piece(), "{kind:?}");
            }
            assert_eq!(game.piece.shape, before, "{kind:?}");
        }
    }

    #[test]
    fn rotation_against_the_right_wall_is_rejected() {
        let mut game = tetris();
        game.piece = Piece::spawn(PieceKind::I);
        game.rotate_piece();
        // vertical I hugging the right wall
        game.piece.x = COLS as i32 - 1;
        game.piece.y = 5;
        let before = game.piece.shape.clone();
        assert!(!game.rotate_piece());
        assert_eq!(game.piece.shape, before);
    }

    #[test]
    fn collision_ignores_rows_above_the_board() {
        let board: Board = Grid::new(ROWS, COLS, None);
        let shape = PieceKind::O.shape();
        assert!(!collides(&board, &shape, 0, -1));
        assert!(collides(&board, &shape, -1, 0));
        assert!(collides(&board, &shape, COLS as i32 - 1, 0));
        assert!(collides(&board, &shape, 0, ROWS as i32 - 1));
    }

    #[test]
    fn clear_lines_handles_adjacent_full_rows() {
        let mut board: Board = Grid::new(ROWS, COLS, None);
        for r in [ROWS - 1, ROWS - 2] {
            board.set_row(r, &[Some(PieceKind::I); COLS]);
        }
        board.set(ROWS - 3, 4, Some(PieceKind::T));
        assert_eq!(clear_lines(&mut board), 2);
        assert_eq!(board.rows(), ROWS);
        assert_eq!(board.cols(), COLS);
        assert_eq!(board[(ROWS - 1, 4)], Some(PieceKind::T));
        assert!(board.row(0).iter().all(Option::is_none));
        assert!(board.row(1).iter().all(Option::is_none));
    }

    #[test]
    fn locking_scores_by_level() {
        let mut game = tetris();
        let mut row = [Some(PieceKind::Z); COLS];
        row[0] = None;
        row[1] = None;
        row[2] = None;
        row[3] = None;
        game.board.set_row(ROWS - 1, &row);
        game.piece = Piece::spawn(PieceKind::I);
        game.piece.x = 0;
        game.level = 2;
        game.hard_drop();
        assert_eq!(game.lines, 1);
        assert_eq!(game.score, (ROWS as u32 - 1) * 2 + 200);
        assert_eq!(game.level(), 1);
    }

    #[test]
    fn gravity_waits_for_the_level_interval() {
        let mut game = tetris();
        let y = game.piece.y;
        game.update(Duration::from_millis(900));
        assert_eq!(game.piece.y, y);
        game.update(Duration::from_millis(200));
        assert_eq!(game.piece.y, y + 1);
    }

    #[test]
    fn leaving_mid_game_keeps_the_best() {
        let store = MemoryStore::shared();
        let mut game = Tetris::new(&GameContext::new(store.clone()));
        game.score = 300;
        game.stop();
        assert_eq!(game.best(), Some(300));
        assert_eq!(store.get("tetrisBest").as_deref(), Some("300"));
    }

    #[test]
    fn soft_drop_scores_only_when_the_piece_moves() {
        let mut game = tetris();
        game.handle_input(Intent::Down);
        assert_eq!(game.score(), 1);

        // piece resting on the floor, spawn rows blocked: the soft drop locks and tops out
        while game.fits(0, 1) {
            game.piece.y += 1;
        }
        for c in 1..COLS {
            game.board.set(0, c, Some(PieceKind::O));
            game.board.set(1, c, Some(PieceKind::O));
        }
        game.score = 40;
        game.handle_input(Intent::Down);
        assert!(game.is_game_over());
        assert_eq!(game.score(), 40);
        assert_eq!(game.best(), Some(40));
    }

    #[test]
    fn blocked_spawn_is_game_over() {
        let mut game = tetris();
        for c in 0..COLS {
            game.board.set(0, c, Some(PieceKind::O));
            game.board.set(1, c, Some(PieceKind::O));
        }
        game.spawn_next();
        assert!(game.is_game_over());
    }

    proptest! {
        #[test]
        fn clearing_never_changes_dimensions(fill in prop::collection::vec(any::<bool>(), ROWS * COLS)) {
            let rows: Vec<Vec<Option<PieceKind>>> = fill
                .chunks(COLS)
                .map(|chunk| chunk.iter().map(|&f| f.then_some(PieceKind::S)).collect())
                .collect();
            let mut board = Grid::from_rows(rows).unwrap();
            let before = board.cells().iter().filter(|c| c.is_some()).count();
            let cleared = clear_lines(&mut board) as usize;
            prop_assert_eq!(board.rows(), ROWS);
            prop_assert_eq!(board.cols(), COLS);
            let after = board.cells().iter().filter(|c| c.is_some()).count();
            prop_assert_eq!(after, before - cleared * COLS);
            for r in 0..ROWS {
                prop_assert!(!board.row(r).iter().all(Option::is_some));
            }
        }
    }
}
