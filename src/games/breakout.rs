use std::time::Duration;

use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::clock::Schedule;
use crate::games::pong::{draw_ball, draw_paddle, Ball, Paddle};
use crate::games::{Game, GameContext};
use crate::input::{HeldAxis, Intent};
use crate::store::{BestScore, Order};
use crate::ui::canvas::{Canvas, Viewport};
use crate::ui::widgets::{self, FIELD_BG};

const WIDTH: f32 = 450.0;
const HEIGHT: f32 = 500.0;
const STEP: Duration = Duration::from_millis(16);
const BRICK_ROWS: usize = 5;
const BRICK_COLS: usize = 8;
const BRICK_W: f32 = 50.0;
const BRICK_H: f32 = 20.0;
const BRICK_PAD: f32 = 5.0;
const OFFSET_TOP: f32 = 50.0;
const OFFSET_LEFT: f32 = 25.0;
const BRICK_POINTS: u32 = 10;

const ROW_COLORS: [Color; BRICK_ROWS] = [
    Color::Rgb(220, 50, 50),
    Color::Rgb(220, 130, 30),
    Color::Rgb(220, 200, 30),
    Color::Rgb(50, 200, 50),
    Color::Rgb(50, 130, 220),
];

#[derive(Clone, Debug)]
struct Brick {
    x: f32,
    y: f32,
    row: usize,
    alive: bool,
}

impl Brick {
    fn touches(&self, ball: &Ball) -> bool {
        ball.x + ball.r >= self.x
            && ball.x - ball.r <= self.x + BRICK_W
            && ball.y + ball.r >= self.y
            && ball.y - ball.r <= self.y + BRICK_H
    }
}

fn wall() -> Vec<Brick> {
    let mut bricks = Vec::with_capacity(BRICK_ROWS * BRICK_COLS);
    for row in 0..BRICK_ROWS {
        for col in 0..BRICK_COLS {
            bricks.push(Brick {
                x: col as f32 * (BRICK_W + BRICK_PAD) + OFFSET_LEFT,
                y: row as f32 * (BRICK_H + BRICK_PAD) + OFFSET_TOP,
                row,
                alive: true,
            });
        }
    }
    bricks
}

pub struct Breakout {
    paddle: Paddle,
    ball: Ball,
    bricks: Vec<Brick>,
    steer: HeldAxis,
    score: u32,
    over: bool,
    won: bool,
    paused: bool,
    best: BestScore,
}

impl Breakout {
    pub fn new(ctx: &GameContext) -> Self {
        Self {
            paddle: Paddle::new(),
            ball: Self::serve(),
            bricks: wall(),
            steer: HeldAxis::default(),
            score: 0,
            over: false,
            won: false,
            paused: false,
            best: BestScore::load(ctx.store.clone(), "breakoutBest", Order::HigherIsBetter),
        }
    }

    fn serve() -> Ball {
        Ball { x: 225.0, y: 300.0, dx: 4.0, dy: -4.0, r: 8.0 }
    }

    fn bricks_left(&self) -> usize {
        self.bricks.iter().filter(|b| b.alive).count()
    }

    fn finish(&mut self, won: bool) {
        self.over = true;
        self.won = won;
        self.best.submit(self.score);
        tracing::debug!(score = self.score, won, "breakout finished");
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
        }

        // one brick per step, so a ball grazing two bricks reflects once
        if let Some(brick) = self.bricks.iter_mut().find(|b| b.alive && b.touches(&self.ball)) {
            brick.alive = false;
            self.ball.dy = -self.ball.dy;
            self.score += BRICK_POINTS;
        }

        if self.bricks_left() == 0 {
            self.finish(true);
        } else if self.ball.y > HEIGHT {
            self.finish(false);
        }
    }

    fn render_field(&self, w: usize, h: usize) -> Canvas {
        let bg = Style::default().bg(FIELD_BG);
        let mut canvas = Canvas::new(w, h, bg);
        let vp = Viewport::new(WIDTH, HEIGHT, w, h);

        for brick in self.bricks.iter().filter(|b| b.alive) {
            let (x0, y0, x1, _) = vp.rect(brick.x, brick.y, BRICK_W, BRICK_H);
            let style = Style::default().fg(ROW_COLORS[brick.row]).bg(FIELD_BG);
            for x in x0..x1 {
                let ch = if x == x0 {
                    '▐'
                } else if x + 1 == x1 {
                    '▌'
                } else {
                    '█'
                };
                canvas.put(x, y0, ch, style);
            }
        }
        draw_paddle(&mut canvas, &vp, &self.paddle);
        if !self.over {
            // faint trail two steps behind the ball
            let tx = vp.x(self.ball.x - self.ball.dx * 2.0);
            let ty = vp.y(self.ball.y - self.ball.dy * 2.0);
            if (tx, ty) != (vp.x(self.ball.x), vp.y(self.ball.y)) {
                canvas.put(tx, ty, '·', Style::default().fg(Color::Rgb(100, 100, 120)).bg(FIELD_BG));
            }
        }
        draw_ball(&mut canvas, &vp, &self.ball);
        canvas
    }
}

impl Game for Breakout {
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
        if !self.paused {
            self.steer.handle(intent);
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = widgets::game_block("🧱 Breakout", Color::Rgb(220, 80, 80));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let (status_area, field, help_area) = widgets::game_layout(inner);

        let status = widgets::status_line(vec![
            widgets::score_span("Score", self.score),
            widgets::best_span(self.best.shown()),
            widgets::info_span(format!("Bricks: {}/{}", self.bricks_left(), BRICK_ROWS * BRICK_COLS), Color::Green),
        ]);
        frame.render_widget(Paragraph::new(status), status_area);

        let h = field.height;
        let court = widgets::centered(field, (h as f32 * 2.0 * WIDTH / HEIGHT) as u16, h);
        let lines = self.render_field(court.width as usize, court.height as usize).into_lines();
        frame.render_widget(Paragraph::new(lines), court);

        let help = if self.won {
            widgets::banner_line("🎉 YOU WIN!", Color::Green, &format!("Score: {} │ ENTER play again", self.score))
        } else if self.over {
            widgets::banner_line("💀 GAME OVER!", Color::Red, "ENTER restart │ Esc menu")
        } else if self.paused {
            widgets::banner_line("⏸ PAUSED", Color::Yellow, "P resume")
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
        self.bricks = wall();
        self.steer.clear();
        self.score = 0;
        self.over = false;
        self.won = false;
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

    fn breakout() -> Breakout {
        Breakout::new(&GameContext::new(MemoryStore::shared()))
    }

    #[test]
    fn wall_has_forty_bricks_inside_the_field() {
        let bricks = wall();
        assert_eq!(bricks.len(), 40);
        assert!(bricks.iter().all(|b| b.x + BRICK_W <= WIDTH));
    }

    #[test]
    fn brick_hit_scores_and_reflects() {
        let mut game = breakout();
        // just under the bottom row of bricks, heading up
        game.ball = Ball { x: 50.0, y: 165.0 + 8.0 + 3.0, dx: 0.0, dy: -4.0, r: 8.0 };
        game.step(STEP);
        assert_eq!(game.score(), BRICK_POINTS);
        assert!(game.ball.dy > 0.0);
        assert_eq!(game.bricks_left(), 39);
    }

    #[test]
    fn clearing_every_brick_wins() {
        let mut game = breakout();
        for brick in game.bricks.iter_mut().skip(1) {
            brick.alive = false;
        }
        let first = game.bricks[0].clone();
        game.ball = Ball { x: first.x + 10.0, y: first.y + BRICK_H + 10.0, dx: 0.0, dy: -4.0, r: 8.0 };
        game.step(STEP);
        assert!(game.is_game_over());
        assert!(game.won);
    }

    #[test]
    fn dropped_ball_loses() {
        let mut game = breakout();
        game.ball = Ball { x: 10.0, y: HEIGHT - 1.0, dx: 0.0, dy: 4.0, r: 8.0 };
        game.step(STEP);
        assert!(game.is_game_over());
        assert!(!game.won);
    }
}
