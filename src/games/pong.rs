use std::time::Duration;

use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::clock::Schedule;
use crate::games::{Game, GameContext};
use crate::input::{HeldAxis, Intent};
use crate::store::{BestScore, Order};
use crate::ui::canvas::{Canvas, Viewport};
use crate::ui::widgets::{self, FIELD_BG};

pub const WIDTH: f32 = 450.0;
pub const HEIGHT: f32 = 500.0;
const STEP: Duration = Duration::from_millis(16);
pub const PADDLE_SPEED: f32 = 7.0;

/// Paddle along the bottom edge, shared with Breakout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Paddle {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Paddle {
    pub fn new() -> Self {
        Self { x: 200.0, y: 450.0, w: 100.0, h: 15.0 }
    }

    pub fn steer(&mut self, dir: i8, field_w: f32) {
        if dir < 0 && self.x > 0.0 {
            self.x -= PADDLE_SPEED;
        }
        if dir > 0 && self.x < field_w - self.w {
            self.x += PADDLE_SPEED;
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
    pub r: f32,
}

impl Ball {
    /// Moves one step and bounces off the side walls and ceiling.
    pub fn advance(&mut self, field_w: f32) {
        self.x += self.dx;
        self.y += self.dy;
        if self.x - self.r <= 0.0 {
            self.dx = self.dx.abs();
        } else if self.x + self.r >= field_w {
            self.dx = -self.dx.abs();
        }
        if self.y - self.r <= 0.0 {
            self.dy = self.dy.abs();
        }
    }

    /// Falling ball touching the top of the paddle.
    pub fn meets(&self, paddle: &Paddle) -> bool {
        self.dy > 0.0 && self.y + self.r >= paddle.y && self.x >= paddle.x && self.x <= paddle.x + paddle.w
    }
}

pub fn draw_paddle(canvas: &mut Canvas, vp: &Viewport, paddle: &Paddle) {
    let (x0, y0, x1, y1) = vp.rect(paddle.x, paddle.y, paddle.w, paddle.h);
    canvas.fill(x0, y0, x1, y1, '▀', Style::default().fg(Color::Rgb(59, 130, 246)).bg(FIELD_BG));
}

pub fn draw_ball(canvas: &mut Canvas, vp: &Viewport, ball: &Ball) {
    canvas.put(vp.x(ball.x), vp.y(ball.y), '●', Style::default().fg(Color::White).bg(FIELD_BG).add_modifier(Modifier::BOLD));
}

pub struct Pong {
    paddle: Paddle,
    ball: Ball,
    steer: HeldAxis,
    score: u32,
    over: bool,
    paused: bool,
    best: BestScore,
}

impl Pong {
    pub fn new(ctx: &GameContext) -> Self {
        Self {
            paddle: Paddle::new(),
            ball: Self::serve(),
            steer: HeldAxis::default(),
            score: 0,
            over: false,
            paused: false,
            best: BestScore::load(ctx.store.clone(), "pongBest", Order::HigherIsBetter),
        }
    }

    fn serve() -> Ball {
        Ball { x: 225.0, y: 225.0, dx: 3.0, dy: 3.0, r: 10.0 }
    }

    pub fn step(&mut self, dt: Duration) {
        if self.over || self.paused {
            return;
        }
        let dir = self.steer.step(dt);
        self.paddle.steer(dir, WIDTH);
        self.ball.advance(WIDTH);

        if self.ball.meets(&self.paddle) {
            self.ball.dy = -self.ball.dy.abs();
            self.score += 1;
        }
        if self.ball.y > HEIGHT {
            self.over = true;
            self.best.submit(self.score);
            tracing::debug!(score = self.score, "pong ball lost");
        }
    }

    fn render_field(&self, w: usize, h: usize) -> Canvas {
        let mut canvas = Canvas::new(w, h, Style::default().bg(FIELD_BG));
        let vp = Viewport::new(WIDTH, HEIGHT, w, h);
        let mid = vp.x(WIDTH / 2.0);
        for y in (0..h as i32).step_by(2) {
            canvas.put(mid, y, '╎', Style::default().fg(Color::Rgb(70, 70, 90)).bg(FIELD_BG));
        }
        draw_paddle(&mut canvas, &vp, &self.paddle);
        draw_ball(&mut canvas, &vp, &self.ball);
        canvas
    }
}

impl Game for Pong {
    fn schedule(&self) -> Schedule {
        Schedule::Fixed(STEP)
    }

    fn update(&mut self, dt: Duration) {
        self.step(dt);
    }

    fn handle_input(&mut self, intent: Intent) {
        if self.over {
            if matches!(intent, Intent::Confirm | Intent::Action) {
                self.reset();
            }
            return;
        }
        if intent == Intent::Pause {
            self.paused = !self.paused;
            return;
        }
        self.steer.handle(intent);
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = widgets::game_block("🏓 Pong", Color::Rgb(226, 232, 240));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let (status_area, field, help_area) = widgets::game_layout(inner);

        let status = widgets::status_line(vec![
            widgets::score_span("Rallies", self.score),
            widgets::best_span(self.best.shown()),
        ]);
        frame.render_widget(Paragraph::new(status), status_area);

        let h = field.height;
        let court = widgets::centered(field, (h as f32 * 2.0 * WIDTH / HEIGHT) as u16, h);
        let lines = self.render_field(court.width as usize, court.height as usize).into_lines();
        frame.render_widget(Paragraph::new(lines), court);

        let help = if self.over {
            widgets::banner_line("GAME OVER", Color::Red, &format!("Score {} │ ENTER play again │ Esc menu", self.score))
        } else if self.paused {
            widgets::banner_line("PAUSED", Color::Yellow, "P resume")
        } else {
            widgets::help_line(&[("←→/A D", "Paddle"), ("P", "Pause"), ("R", "Restart"), ("Esc", "Menu")])
        };
        frame.render_widget(Paragraph::new(help), help_area);
    }

    fn stop(&mut self) {
        self.steer.clear();
        self.best.submit(self.score);
    }

    fn reset(&mut self) {
        self.best.submit(self.score);
        self.paddle = Paddle::new();
        self.ball = Self::serve();
        self.steer.clear();
        self.score = 0;
        self.over = false;
        self.paused = false;
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

    fn pong() -> Pong {
        Pong::new(&GameContext::new(MemoryStore::shared()))
    }

    #[test]
    fn walls_reflect() {
        let mut ball = Ball { x: 12.0, y: 100.0, dx: -3.0, dy: 3.0, r: 10.0 };
        ball.advance(WIDTH);
        assert!(ball.dx > 0.0);
        let mut ball = Ball { x: 100.0, y: 12.0, dx: 3.0, dy: -3.0, r: 10.0 };
        ball.advance(WIDTH);
        assert!(ball.dy > 0.0);
    }

    #[test]
    fn paddle_return_scores_once() {
        let mut game = pong();
        game.ball = Ball { x: 250.0, y: 438.0, dx: 3.0, dy: 3.0, r: 10.0 };
        game.step(STEP);
        assert_eq!(game.score(), 1);
        assert!(game.ball.dy < 0.0);
        game.step(STEP);
        assert_eq!(game.score(), 1);
    }

    #[test]
    fn missed_ball_ends_the_game() {
        let mut game = pong();
        game.ball = Ball { x: 20.0, y: 498.0, dx: 0.0, dy: 3.0, r: 10.0 };
        game.step(STEP);
        assert!(game.is_game_over());
        game.step(STEP);
        assert!(game.is_game_over());
    }

    #[test]
    fn paddle_stops_at_the_edge() {
        let mut paddle = Paddle { x: WIDTH - 100.0, ..Paddle::new() };
        paddle.steer(1, WIDTH);
        assert_eq!(paddle.x, WIDTH - 100.0);
    }
}
