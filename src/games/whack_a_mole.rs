use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::clock::Schedule;
use crate::games::{Game, GameContext};
use crate::input::{cell_at, Intent};
use crate::store::{BestScore, Order};
use crate::ui::canvas::Canvas;
use crate::ui::widgets::{self, FIELD_BG};

const HOLES: usize = 9;
const ROUND: Duration = Duration::from_secs(30);
const SPAWN_EVERY: Duration = Duration::from_millis(800);
const STAY_UP: Duration = Duration::from_millis(600);
const HIT_POINTS: u32 = 10;
const HOLE_W: u16 = 10;
const HOLE_H: u16 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Ready,
    Playing,
    Over,
}

pub struct WhackAMole {
    phase: Phase,
    time_left: Duration,
    spawn_timer: Duration,
    /// Visible mole and how long it stays up.
    mole: Option<(usize, Duration)>,
    /// Hole of the last spawn; cleared by a hit.
    last: Option<usize>,
    /// Hole that was just hit, for a short flash.
    bonk: Option<(usize, Duration)>,
    score: u32,
    board_area: Rect,
    best: BestScore,
    rng: StdRng,
}

impl WhackAMole {
    pub fn new(ctx: &GameContext) -> Self {
        Self {
            phase: Phase::Ready,
            time_left: ROUND,
            spawn_timer: Duration::ZERO,
            mole: None,
            last: None,
            bonk: None,
            score: 0,
            board_area: Rect::default(),
            best: BestScore::load(ctx.store.clone(), "moleHigh", Order::HigherIsBetter),
            rng: ctx.rng(),
        }
    }

    fn begin(&mut self) {
        self.phase = Phase::Playing;
        self.time_left = ROUND;
        self.spawn_timer = Duration::ZERO;
        self.score = 0;
        self.mole = None;
        self.last = None;
        self.bonk = None;
        self.spawn();
    }

    fn spawn(&mut self) {
        let hole = loop {
            let candidate = self.rng.gen_range(0..HOLES);
            if Some(candidate) != self.last {
                break candidate;
            }
        };
        self.last = Some(hole);
        self.mole = Some((hole, STAY_UP));
    }

    pub fn whack(&mut self, hole: usize) -> bool {
        if self.phase != Phase::Playing {
            return false;
        }
        match self.mole {
            Some((up, _)) if up == hole => {
                self.mole = None;
                self.last = None;
                self.bonk = Some((hole, Duration::from_millis(150)));
                self.score += HIT_POINTS;
                true
            }
            _ => false,
        }
    }

    fn end(&mut self) {
        self.phase = Phase::Over;
        self.mole = None;
        self.best.submit(self.score);
        tracing::debug!(score = self.score, "whack-a-mole round over");
    }

    fn advance(&mut self, dt: Duration) {
        if self.phase != Phase::Playing {
            return;
        }
        self.bonk = self.bonk.and_then(|(h, left)| left.checked_sub(dt).filter(|d| !d.is_zero()).map(|d| (h, d)));
        self.mole = self.mole.and_then(|(h, left)| left.checked_sub(dt).filter(|d| !d.is_zero()).map(|d| (h, d)));

        self.time_left = self.time_left.saturating_sub(dt);
        if self.time_left.is_zero() {
            self.end();
            return;
        }
        self.spawn_timer += dt;
        while self.spawn_timer >= SPAWN_EVERY {
            self.spawn_timer -= SPAWN_EVERY;
            self.spawn();
        }
    }

    fn seconds_left(&self) -> u64 {
        let ms = self.time_left.as_millis() as u64;
        ms.div_ceil(1000)
    }

    fn render_holes(&self) -> Canvas {
        let mut canvas = Canvas::new(HOLE_W as usize * 3, HOLE_H as usize * 3, Style::default().bg(FIELD_BG));
        let dirt = Color::Rgb(101, 67, 33);
        for i in 0..HOLES {
            let x0 = (i % 3) as i32 * HOLE_W as i32;
            let y0 = (i / 3) as i32 * HOLE_H as i32;
            let mid = x0 + HOLE_W as i32 / 2;
            let grass = Style::default().bg(Color::Rgb(40, 90, 40));
            canvas.fill(x0 + 1, y0, x0 + HOLE_W as i32 - 1, y0 + HOLE_H as i32 - 1, ' ', grass);
            let hole = Style::default().fg(Color::Rgb(20, 12, 5)).bg(Color::Rgb(40, 90, 40));
            canvas.text(mid - 3, y0 + 2, "▄████▄", hole);

            let up = matches!(self.mole, Some((h, _)) if h == i);
            let hit = matches!(self.bonk, Some((h, _)) if h == i);
            if up {
                let mole = Style::default().fg(Color::Rgb(190, 140, 90)).bg(Color::Rgb(40, 90, 40)).add_modifier(Modifier::BOLD);
                canvas.text(mid - 2, y0, "▗▄▄▖", mole);
                canvas.text(mid - 2, y0 + 1, "●ᴥ●", mole.bg(dirt));
            } else if hit {
                let star = Style::default().fg(Color::Yellow).bg(Color::Rgb(40, 90, 40)).add_modifier(Modifier::BOLD);
                canvas.text(mid - 2, y0 + 1, "✶+10", star);
            }
            let label = Style::default().fg(Color::Rgb(160, 200, 160)).bg(Color::Rgb(40, 90, 40));
            canvas.put(x0 + 1, y0, char::from(b'1' + i as u8), label);
        }
        canvas
    }
}

impl Game for WhackAMole {
    fn schedule(&self) -> Schedule {
        Schedule::Frame
    }

    fn update(&mut self, dt: Duration) {
        self.advance(dt);
    }

    fn handle_input(&mut self, intent: Intent) {
        match (self.phase, intent) {
            (Phase::Ready | Phase::Over, Intent::Confirm | Intent::Action) => self.begin(),
            (Phase::Playing, Intent::Digit(d @ 1..=9)) => {
                self.whack(d as usize - 1);
            }
            (Phase::Playing, Intent::Click { column, row }) => {
                if let Some((r, c)) = cell_at(self.board_area, HOLE_W, HOLE_H, 3, 3, column, row) {
                    self.whack(r * 3 + c);
                }
            }
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = widgets::game_block("🔨 Whack-a-Mole", Color::Rgb(190, 140, 90));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let (status_area, field, help_area) = widgets::game_layout(inner);

        let clock_color = if self.seconds_left() <= 5 { Color::Red } else { Color::White };
        let status = widgets::status_line(vec![
            widgets::score_span("Score", self.score),
            widgets::info_span(format!("⏱ {}s", self.seconds_left()), clock_color),
            widgets::best_span(self.best.shown()),
        ]);
        frame.render_widget(Paragraph::new(status), status_area);

        self.board_area = widgets::centered(field, HOLE_W * 3, HOLE_H * 3);
        frame.render_widget(Paragraph::new(self.render_holes().into_lines()), self.board_area);

        let help = match self.phase {
            Phase::Ready => widgets::banner_line("Ready?", Color::Yellow, "ENTER start │ 1-9 or click to whack"),
            Phase::Over => widgets::banner_line(
                "TIME'S UP",
                Color::Red,
                &format!("Score {} │ ENTER play again │ Esc menu", self.score),
            ),
            Phase::Playing => widgets::help_line(&[("1-9/Click", "Whack"), ("R", "Restart"), ("Esc", "Menu")]),
        };
        frame.render_widget(Paragraph::new(help), help_area);
    }

    fn stop(&mut self) {
        self.mole = None;
        self.bonk = None;
        self.best.submit(self.score);
    }

    fn reset(&mut self) {
        self.stop();
        self.phase = Phase::Ready;
        self.time_left = ROUND;
        self.spawn_timer = Duration::ZERO;
        self.last = None;
        self.score = 0;
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn best(&self) -> Option<u32> {
        self.best.value()
    }

    fn is_game_over(&self) -> bool {
        self.phase == Phase::Over
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use proptest::prelude::*;

    fn mole(seed: u64) -> WhackAMole {
        let mut ctx = GameContext::new(MemoryStore::shared());
        ctx.seed = Some(seed);
        WhackAMole::new(&ctx)
    }

    #[test]
    fn start_shows_a_mole_that_hides_again() {
        let mut game = mole(1);
        assert!(game.mole.is_none());
        game.handle_input(Intent::Confirm);
        assert!(game.mole.is_some());
        game.update(Duration::from_millis(600));
        assert!(game.mole.is_none());
        game.update(Duration::from_millis(200));
        assert!(game.mole.is_some());
    }

    #[test]
    fn hit_scores_once() {
        let mut game = mole(2);
        game.handle_input(Intent::Confirm);
        let (hole, _) = game.mole.unwrap();
        assert!(game.whack(hole));
        assert!(!game.whack(hole));
        assert_eq!(game.score(), HIT_POINTS);
        assert!(!game.whack((hole + 1) % HOLES));
    }

    #[test]
    fn round_ends_after_thirty_seconds() {
        let mut game = mole(3);
        game.handle_input(Intent::Confirm);
        game.score = 40;
        for _ in 0..299 {
            game.update(Duration::from_millis(100));
        }
        assert!(!game.is_game_over());
        assert_eq!(game.seconds_left(), 1);
        game.update(Duration::from_millis(100));
        assert!(game.is_game_over());
        assert_eq!(game.best(), Some(40));
        assert!(!game.whack(0));
    }

    proptest! {
        #[test]
        fn consecutive_spawns_change_hole(seed in any::<u64>()) {
            let mut game = mole(seed);
            game.handle_input(Intent::Confirm);
            for _ in 0..20 {
                let before = game.last;
                game.spawn();
                prop_assert_ne!(game.last, before);
            }
        }
    }
}
