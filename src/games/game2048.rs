use rand::rngs::StdRng;
use rand::seq::SliceRandom;
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

const SIZE: usize = 4;
const TARGET: u32 = 2048;
const CELL_W: u16 = 7;
const CELL_H: u16 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction2048 {
    Left,
    Right,
    Up,
    Down,
}

/// Slides one row toward index 0, merging equal neighbours once each.
/// Returns the new row (same length) and the points gained.
pub fn slide_row(row: &[u32]) -> (Vec<u32>, u32) {
    let mut tiles: Vec<u32> = row.iter().copied().filter(|&v| v != 0).collect();
    let mut gained = 0;
    let mut j = 0;
    while j + 1 < tiles.len() {
        if tiles[j] == tiles[j + 1] {
            tiles[j] *= 2;
            gained += tiles[j];
            tiles.remove(j + 1);
        }
        j += 1;
    }
    tiles.resize(row.len(), 0);
    (tiles, gained)
}

fn slide_rows(grid: &Grid<u32>, reversed: bool) -> (Grid<u32>, u32) {
    let mut out = grid.clone();
    let mut gained = 0;
    for r in 0..grid.rows() {
        let mut row = grid.row(r).to_vec();
        if reversed {
            row.reverse();
        }
        let (mut slid, g) = slide_row(&row);
        if reversed {
            slid.reverse();
        }
        out.set_row(r, &slid);
        gained += g;
    }
    (out, gained)
}

/// Applies a move to `grid`. Up and down reuse the row logic on the
/// transposed board.
pub fn shift(grid: &Grid<u32>, dir: Direction2048) -> (Grid<u32>, u32) {
    match dir {
        Direction2048::Left => slide_rows(grid, false),
        Direction2048::Right => slide_rows(grid, true),
        Direction2048::Up => {
            let (g, pts) = slide_rows(&grid.transpose(), false);
            (g.transpose(), pts)
        }
        Direction2048::Down => {
            let (g, pts) = slide_rows(&grid.transpose(), true);
            (g.transpose(), pts)
        }
    }
}

/// Any empty cell or any equal orthogonal neighbours.
pub fn can_move(grid: &Grid<u32>) -> bool {
    grid.iter().any(|((r, c), &v)| {
        v == 0
            || grid.get(r, c + 1) == Some(&v)
            || grid.get(r + 1, c) == Some(&v)
    })
}

fn tile_color(value: u32) -> (Color, Color) {
    let bg = match value {
        0 => Color::Rgb(50, 46, 42),
        2 => Color::Rgb(238, 228, 218),
        4 => Color::Rgb(237, 224, 200),
        8 => Color::Rgb(242, 177, 121),
        16 => Color::Rgb(245, 149, 99),
        32 => Color::Rgb(246, 124, 95),
        64 => Color::Rgb(246, 94, 59),
        128 => Color::Rgb(237, 207, 114),
        256 => Color::Rgb(237, 204, 97),
        512 => Color::Rgb(237, 200, 80),
        1024 => Color::Rgb(237, 197, 63),
        2048 => Color::Rgb(237, 194, 46),
        _ => Color::Rgb(60, 58, 50),
    };
    let fg = if value <= 4 { Color::Rgb(119, 110, 101) } else { Color::Rgb(249, 246, 242) };
    (bg, fg)
}

pub struct Game2048 {
    grid: Grid<u32>,
    score: u32,
    won: bool,
    over: bool,
    best: BestScore,
    rng: StdRng,
}

impl Game2048 {
    pub fn new(ctx: &GameContext) -> Self {
        let mut game = Self {
            grid: Grid::new(SIZE, SIZE, 0),
            score: 0,
            won: false,
            over: false,
            best: BestScore::load(ctx.store.clone(), "best2048", Order::HigherIsBetter),
            rng: ctx.rng(),
        };
        game.add_random_tile();
        game.add_random_tile();
        game
    }

    #[cfg(test)]
    pub fn grid(&self) -> &Grid<u32> {
        &self.grid
    }

    fn add_random_tile(&mut self) -> bool {
        let empty: Vec<(usize, usize)> = self
            .grid
            .iter()
            .filter(|(_, v)| **v == 0)
            .map(|(pos, _)| pos)
            .collect();
        let Some(&(r, c)) = empty.choose(&mut self.rng) else {
            return false;
        };
        let value = if self.rng.gen::<f64>() < 0.9 { 2 } else { 4 };
        self.grid.set(r, c, value)
    }

    /// Performs a move. Returns `false` (and spawns nothing) when the grid
    /// would not change.
    pub fn make_move(&mut self, dir: Direction2048) -> bool {
        if self.over {
            return false;
        }
        let (next, gained) = shift(&self.grid, dir);
        if next == self.grid {
            return false;
        }
        self.grid = next;
        self.score += gained;
        if !self.won && self.grid.cells().contains(&TARGET) {
            self.won = true;
            tracing::info!(score = self.score, "reached 2048");
        }
        self.add_random_tile();
        if !can_move(&self.grid) {
            self.over = true;
            self.best.submit(self.score);
        }
        true
    }

    fn render_grid(&self) -> Canvas {
        let w = CELL_W as usize * SIZE;
        let h = CELL_H as usize * SIZE;
        let mut canvas = Canvas::new(w, h, Style::default().bg(FIELD_BG));
        self.grid.for_each_cell(|r, c, &v| {
            let (bg, fg) = tile_color(v);
            let x0 = c as i32 * CELL_W as i32;
            let y0 = r as i32 * CELL_H as i32;
            // one-column gutter on the right keeps tiles apart
            canvas.fill(x0, y0, x0 + CELL_W as i32 - 1, y0 + CELL_H as i32, ' ', Style::default().bg(bg));
            if v != 0 {
                let label = v.to_string();
                let x = x0 + (CELL_W as i32 - 1 - label.len() as i32) / 2;
                canvas.text(x, y0 + 1, &label, Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD));
            }
        });
        canvas
    }
}

impl Game for Game2048 {
    fn schedule(&self) -> Schedule {
        Schedule::TurnBased
    }

    fn handle_input(&mut self, intent: Intent) {
        let dir = match intent {
            Intent::Left => Direction2048::Left,
            Intent::Right => Direction2048::Right,
            Intent::Up => Direction2048::Up,
            Intent::Down => Direction2048::Down,
            Intent::Confirm if self.over => return self.reset(),
            _ => return,
        };
        self.make_move(dir);
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = widgets::game_block("🔢 2048", Color::Rgb(237, 194, 46));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let (status_area, field, help_area) = widgets::game_layout(inner);

        let mut items = vec![
            widgets::score_span("Score", self.score),
            widgets::best_span(self.best.shown().max(self.score)),
        ];
        if self.won {
            items.push(widgets::info_span("2048 reached!".to_string(), Color::Green));
        }
        frame.render_widget(Paragraph::new(widgets::status_line(items)), status_area);

        let board = widgets::centered(field, CELL_W * SIZE as u16, CELL_H * SIZE as u16);
        frame.render_widget(Paragraph::new(self.render_grid().into_lines()), board);

        let help = if self.over {
            let text = if self.won { "YOU WIN!" } else { "GAME OVER" };
            widgets::banner_line(text, Color::Red, "ENTER new game │ Esc menu")
        } else {
            widgets::help_line(&[("←↑↓→", "Slide"), ("R", "New game"), ("Esc", "Menu")])
        };
        frame.render_widget(Paragraph::new(help), help_area);
    }

    fn stop(&mut self) {
        self.best.submit(self.score);
    }

    fn reset(&mut self) {
        self.best.submit(self.score);
        self.grid.fill(0);
        self.score = 0;
        self.won = false;
        self.over = false;
        self.add_random_tile();
        self.add_random_tile();
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
    use crate::store::{MemoryStore, ScoreStore};
    use proptest::prelude::*;

    fn game_with(rows: Vec<Vec<u32>>) -> Game2048 {
        let mut ctx = GameContext::new(MemoryStore::shared());
        ctx.seed = Some(42);
        let mut game = Game2048::new(&ctx);
        game.grid = Grid::from_rows(rows).unwrap();
        game
    }

    #[test]
    fn slide_merges_each_tile_once() {
        assert_eq!(slide_row(&[2, 2, 2, 2]), (vec![4, 4, 0, 0], 8));
        assert_eq!(slide_row(&[2, 2, 4, 0]), (vec![4, 4, 0, 0], 4));
        assert_eq!(slide_row(&[0, 4, 0, 4]), (vec![8, 0, 0, 0], 8));
        assert_eq!(slide_row(&[2, 4, 8, 16]), (vec![2, 4, 8, 16], 0));
    }

    #[test]
    fn right_and_down_mirror_left_and_up() {
        let grid = Grid::from_rows(vec![
            vec![2, 2, 0, 4],
            vec![0, 0, 0, 0],
            vec![2, 0, 0, 0],
            vec![0, 0, 0, 0],
        ])
        .unwrap();
        let (right, _) = shift(&grid, Direction2048::Right);
        assert_eq!(right.row(0), &[0, 0, 4, 4]);
        let (down, pts) = shift(&grid, Direction2048::Down);
        assert_eq!(down.row(3), &[4, 2, 0, 4]);
        assert_eq!(pts, 4);
    }

    #[test]
    fn blocked_move_is_a_no_op() {
        let rows = vec![
            vec![2, 4, 8, 16],
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
        ];
        let mut game = game_with(rows);
        let before = game.grid().clone();
        assert!(!game.make_move(Direction2048::Left));
        assert!(!game.make_move(Direction2048::Up));
        assert_eq!(game.grid(), &before);
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn effective_move_spawns_exactly_one_tile() {
        let mut game = game_with(vec![
            vec![0, 0, 0, 2],
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 2],
        ]);
        assert!(game.make_move(Direction2048::Up));
        let non_zero = game.grid().cells().iter().filter(|&&v| v != 0).count();
        assert_eq!(non_zero, 2);
        assert_eq!(game.grid()[(0, 3)], 4);
        assert_eq!(game.score(), 4);
    }

    #[test]
    fn stuck_board_is_game_over() {
        let grid = Grid::from_rows(vec![
            vec![2, 4, 2, 4],
            vec![4, 2, 4, 2],
            vec![2, 4, 2, 4],
            vec![4, 2, 4, 2],
        ])
        .unwrap();
        assert!(!can_move(&grid));
    }

    #[test]
    fn reaching_2048_keeps_playing() {
        let mut game = game_with(vec![
            vec![1024, 1024, 0, 0],
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
        ]);
        assert!(game.make_move(Direction2048::Left));
        assert!(game.won);
        assert!(!game.is_game_over());
        assert!(game.make_move(Direction2048::Right));
    }

    #[test]
    fn best_is_written_at_game_end() {
        let store = MemoryStore::shared();
        let mut ctx = GameContext::new(store.clone());
        ctx.seed = Some(1);
        let mut game = Game2048::new(&ctx);
        game.score = 64;
        game.stop();
        assert_eq!(store.get("best2048").as_deref(), Some("64"));
    }

    fn arb_grid() -> impl Strategy<Value = Vec<Vec<u32>>> {
        let tile = prop_oneof![Just(0u32), Just(2), Just(4), Just(8), Just(16)];
        prop::collection::vec(prop::collection::vec(tile, SIZE), SIZE)
    }

    proptest! {
        #[test]
        fn effective_move_adds_one_tile_and_conserves_sum(rows in arb_grid(), d in 0..4usize) {
            let dir = [Direction2048::Left, Direction2048::Right, Direction2048::Up, Direction2048::Down][d];
            let mut game = game_with(rows);
            let before = game.grid().clone();
            let sum_before: u32 = before.cells().iter().sum();
            let tiles_before = before.cells().iter().filter(|&&v| v != 0).count();
            let (after_shift, _) = shift(&before, dir);
            let merges = tiles_before - after_shift.cells().iter().filter(|&&v| v != 0).count();

            if game.make_move(dir) {
                let sum_after: u32 = game.grid().cells().iter().sum();
                let spawned = sum_after - sum_before;
                prop_assert!(spawned == 2 || spawned == 4);
                let tiles_after = game.grid().cells().iter().filter(|&&v| v != 0).count();
                prop_assert_eq!(tiles_after, tiles_before - merges + 1);
            } else {
                prop_assert_eq!(game.grid(), &before);
            }
        }
    }
}
