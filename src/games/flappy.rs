use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::clock::{frames, Schedule};
use crate::games::{Game, GameContext};
use crate::input::Intent;
use crate::store::{BestScore, Order};
use crate::ui::canvas::{Canvas, Viewport};
use crate::ui::widgets;

const WIDTH: f32 = 400.0;
const HEIGHT: f32 = 500.0;
const BIRD_X: f32 = 80.0;
const BIRD_SIZE: f32 = 30.0;
const GRAVITY: f32 = 0.5;
const FLAP: f32 = -8.0;
const PIPE_W: f32 = 60.0;
const PIPE_GAP: f32 = 150.0;
const PIPE_SPEED: f32 = 3.0;
/// A new pipe enters once the newest one is this far from the right edge.
const PIPE_SPACING: f32 = 200.0;
const SKY: Color = Color::Rgb(135, 206, 235);
const PIPE: Color = Color::Rgb(34, 139, 34);

#[derive(Clone, Copy, Debug, PartialEq)]
struct Pipe {
    x: f32,
    gap_y: f32,
    scored: bool,
}

impl Pipe {
    fn hits(&self, bird_y: f32) -> bool {
        let overlaps_x = BIRD_X + BIRD_SIZE > self.x && BIRD_X < self.x + PIPE_W;
        overlaps_x && (bird_y < self.gap_y || bird_y + BIRD_SIZE > self.gap_y + PIPE_GAP)
    }
}

pub struct FlappyBird {
    y: f32,
    velocity: f32,
    pipes: Vec<Pipe>,
    started: bool,
    score: u32,
    over: bool,
    best: BestScore,
    rng: StdRng,
}

impl FlappyBird {
    pub fn new(ctx: &GameContext) -> Self {
        Self {
            y: 250.0,
            velocity: 0.0,
            pipes: Vec::new(),
            started: false,
            score: 0,
            over: false,
            best: BestScore::load(ctx.store.clone(), "flappyBest", Order::HigherIsBetter),
            rng: ctx.rng(),
        }
    }

    fn flap(&mut self) {
        if self.over {
            self.reset();
            return;
        }
        self.started = true;
        self.velocity = FLAP;
    }

    fn add_pipe(&mut self) {
        let gap_y = self.rng.gen_range(50.0..HEIGHT - PIPE_GAP - 50.0);
        self.pipes.push(Pipe { x: WIDTH, gap_y, scored: false });
    }

    fn crash(&mut self) {
        self.over = true;
        self.best.submit(self.score);
        tracing::debug!(score = self.score, "flappy crashed");
    }

    /// Integrates one frame of `dt`; per-frame constants scale with it.
    pub fn step(&mut self, dt: Duration) {
        if !self.started || self.over {
            return;
        }
        let f = frames(dt);
        self.velocity += GRAVITY * f;
        self.y += self.velocity * f;
        if self.y + BIRD_SIZE > HEIGHT || self.y < 0.0 {
            self.crash();
            return;
        }

        if self.pipes.last().map_or(true, |p| p.x < WIDTH - PIPE_SPACING) {
            self.add_pipe();
        }
        for pipe in &mut self.pipes {
            pipe.x -= PIPE_SPEED * f;
        }
        if self.pipes.iter().any(|p| p.hits(self.y)) {
            self.crash();
            return;
        }
        for pipe in self.pipes.iter_mut().filter(|p| !p.scored && p.x + PIPE_W < BIRD_X) {
            pipe.scored = true;
            self.score += 1;
        }
        self.pipes.retain(|p| p.x + PIPE_W >= 0.0);
    }

    fn render_field(&self, w: usize, h: usize) -> Canvas {
        let sky = Style::default().bg(SKY);
        let mut canvas = Canvas::new(w, h, sky);
        let vp = Viewport::new(WIDTH, HEIGHT, w, h);

        let pipe = Style::default().fg(PIPE).bg(SKY);
        let lip = Style::default().fg(Color::Rgb(50, 205, 50)).bg(SKY);
        for p in &self.pipes {
            let (x0, _, x1, top) = vp.rect(p.x, 0.0, PIPE_W, p.gap_y);
            canvas.fill(x0, 0, x1, top, '█', pipe);
            canvas.fill(x0 - 1, top - 1, x1 + 1, top, '▄', lip);
            let (_, bottom, _, _) = vp.rect(p.x, p.gap_y + PIPE_GAP, PIPE_W, 1.0);
            canvas.fill(x0, bottom, x1, h as i32, '█', pipe);
            canvas.fill(x0 - 1, bottom, x1 + 1, bottom + 1, '▀', lip);
        }

        let ground = vp.y(HEIGHT - 20.0);
        canvas.fill(0, ground, w as i32, h as i32, '▓', Style::default().fg(Color::Rgb(139, 69, 19)).bg(Color::Rgb(110, 55, 15)));

        let (bx0, by0, bx1, _) = vp.rect(BIRD_X, self.y, BIRD_SIZE, BIRD_SIZE);
        let body = Style::default().fg(Color::Rgb(255, 215, 0)).bg(SKY).add_modifier(Modifier::BOLD);
        let glyph = if self.velocity < 0.0 { '▲' } else { '▼' };
        canvas.fill(bx0, by0, bx1.max(bx0 + 2), by0 + 1, '●', body);
        canvas.put(bx1.max(bx0 + 2), by0, glyph, Style::default().fg(Color::Rgb(255, 99, 71)).bg(SKY));
        canvas
    }
}

impl Game for FlappyBird {
    fn schedule(&self) -> Schedule {
        Schedule::Frame
    }

    fn update(&mut self, dt: Duration) {
        self.step(dt);
    }

    fn handle_input(&mut self, intent: Intent) {
        if matches!(intent, Intent::Action | Intent::Up | Intent::Confirm | Intent::Click { .. }) {
            self.flap();
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = widgets::game_block("🐦 Flappy Bird", Color::Rgb(255, 215, 0));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let (status_area, field, help_area) = widgets::game_layout(inner);

        let status = widgets::status_line(vec![
            widgets::score_span("Score", self.score),
            widgets::best_span(self.best.shown()),
        ]);
        frame.render_widget(Paragraph::new(status), status_area);

        let h = field.height;
        let sky = widgets::centered(field, (h as f32 * 2.0 * WIDTH / HEIGHT) as u16, h);
        let lines = self.render_field(sky.width as usize, sky.height as usize).into_lines();
        frame.render_widget(Paragraph::new(lines), sky);

        let help = if self.over {
            widgets::banner_line("GAME OVER", Color::Red, &format!("Score {} │ Space to try again", self.score))
        } else if !self.started {
            widgets::banner_line("GET READY", Color::Yellow, "Space / click to flap")
        } else {
            widgets::help_line(&[("Space/↑/Click", "Flap"), ("R", "Restart"), ("Esc", "Menu")])
        };
        frame.render_widget(Paragraph::new(help), help_area);
    }

    fn stop(&mut self) {
        self.best.submit(self.score);
    }

    fn reset(&mut self) {
        self.best.submit(self.score);
        self.y = 250.0;
        self.velocity = 0.0;
        self.pipes.clear();
        self.started = false;
        self.score = 0;
        self.over = false;
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

    const FRAME: Duration = Duration::from_micros(16_667);

    fn flappy(store: crate::store::SharedStore) -> FlappyBird {
        let mut ctx = GameContext::new(store);
        ctx.seed = Some(9);
        FlappyBird::new(&ctx)
    }

    #[test]
    fn waits_for_the_first_flap() {
        let mut game = flappy(MemoryStore::shared());
        game.step(FRAME);
        assert_eq!(game.y, 250.0);
        assert!(game.pipes.is_empty());
        game.handle_input(Intent::Action);
        game.step(FRAME);
        assert!(game.y < 250.0);
        assert_eq!(game.pipes.len(), 1);
    }

    #[test]
    fn gravity_pulls_the_bird_to_the_floor() {
        let mut game = flappy(MemoryStore::shared());
        game.handle_input(Intent::Action);
        game.pipes.push(Pipe { x: -1000.0, gap_y: 100.0, scored: true });
        for _ in 0..200 {
            game.step(FRAME);
        }
        assert!(game.is_game_over());
    }

    #[test]
    fn slower_frames_cover_the_same_distance() {
        let mut fast = flappy(MemoryStore::shared());
        let mut slow = flappy(MemoryStore::shared());
        fast.handle_input(Intent::Action);
        slow.handle_input(Intent::Action);
        fast.step(FRAME);
        fast.step(FRAME);
        slow.step(FRAME * 2);
        assert!((fast.pipes[0].x - slow.pipes[0].x).abs() < 0.01);
    }

    #[test]
    fn passing_a_pipe_scores_once() {
        let store = MemoryStore::shared();
        let mut game = flappy(store.clone());
        game.handle_input(Intent::Action);
        game.pipes.push(Pipe { x: BIRD_X - PIPE_W + 1.0, gap_y: 200.0, scored: false });
        game.y = 240.0;
        game.velocity = -0.5;
        game.step(FRAME);
        assert_eq!(game.score(), 1);
        game.step(FRAME);
        assert_eq!(game.score(), 1);
        game.stop();
        assert_eq!(store.get("flappyBest").as_deref(), Some("1"));
    }

    #[test]
    fn pipe_contact_crashes() {
        let mut game = flappy(MemoryStore::shared());
        game.handle_input(Intent::Action);
        game.pipes.push(Pipe { x: BIRD_X + 5.0, gap_y: 400.0, scored: false });
        game.step(FRAME);
        assert!(game.is_game_over());
        game.handle_input(Intent::Action);
        assert!(!game.is_game_over());
        assert!(!game.started);
    }
}
