use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::clock::Schedule;
use crate::games::{Game, GameContext};
use crate::input::{HeldAxis, Intent};
use crate::store::{BestScore, Order};
use crate::ui::canvas::{Canvas, Viewport};
use crate::ui::widgets;

const WIDTH: f32 = 450.0;
const HEIGHT: f32 = 500.0;
const STEP: Duration = Duration::from_millis(16);
const SPAWN_EVERY: Duration = Duration::from_millis(2000);
const CAR_W: f32 = 50.0;
const CAR_H: f32 = 80.0;
const CAR_SPEED: f32 = 5.0;
const TRAFFIC_SPEED: f32 = 3.0;
const ROAD: Color = Color::Rgb(51, 51, 51);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Body {
    pub fn overlaps(&self, other: &Body) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }
}

fn lane_x(lane: usize) -> f32 {
    let lane_w = WIDTH / 3.0;
    lane_w * lane as f32 + lane_w / 2.0 - CAR_W / 2.0
}

pub struct CarRacing {
    car: Body,
    traffic: Vec<Body>,
    steer: HeldAxis,
    spawn_timer: Duration,
    road_offset: f32,
    score: u32,
    over: bool,
    paused: bool,
    best: BestScore,
    rng: StdRng,
}

impl CarRacing {
    pub fn new(ctx: &GameContext) -> Self {
        Self {
            car: Body { x: 200.0, y: 350.0, w: CAR_W, h: CAR_H },
            traffic: Vec::new(),
            steer: HeldAxis::default(),
            spawn_timer: Duration::ZERO,
            road_offset: 0.0,
            score: 0,
            over: false,
            paused: false,
            best: BestScore::load(ctx.store.clone(), "carBest", Order::HigherIsBetter),
            rng: ctx.rng(),
        }
    }

    fn spawn(&mut self) {
        let lane = self.rng.gen_range(0..3);
        self.traffic.push(Body { x: lane_x(lane), y: -50.0, w: CAR_W, h: CAR_H });
    }

    /// One fixed step: steer, scroll traffic, score passed cars, collide.
    pub fn step(&mut self, dt: Duration) {
        if self.over || self.paused {
            return;
        }
        match self.steer.step(dt) {
            -1 if self.car.x > 0.0 => self.car.x -= CAR_SPEED,
            1 if self.car.x < WIDTH - self.car.w => self.car.x += CAR_SPEED,
            _ => {}
        }

        self.spawn_timer += dt;
        while self.spawn_timer >= SPAWN_EVERY {
            self.spawn_timer -= SPAWN_EVERY;
            self.spawn();
        }

        for body in &mut self.traffic {
            body.y += TRAFFIC_SPEED;
        }
        let before = self.traffic.len();
        self.traffic.retain(|b| b.y <= HEIGHT);
        self.score += (before - self.traffic.len()) as u32;
        self.road_offset = (self.road_offset + TRAFFIC_SPEED) % 60.0;

        if self.traffic.iter().any(|b| b.overlaps(&self.car)) {
            self.over = true;
            self.best.submit(self.score);
            tracing::debug!(score = self.score, "car crashed");
        }
    }

    fn render_field(&self, w: usize, h: usize) -> Canvas {
        let mut canvas = Canvas::new(w, h, Style::default().bg(ROAD));
        let vp = Viewport::new(WIDTH, HEIGHT, w, h);
        let stripe = Style::default().fg(Color::White).bg(ROAD);
        for lane in 1..3 {
            let x = vp.x(WIDTH / 3.0 * lane as f32);
            let mut y = -60.0 + self.road_offset;
            while y < HEIGHT {
                let (_, y0, _, y1) = vp.rect(0.0, y, 1.0, 30.0);
                for cy in y0..y1 {
                    canvas.put(x, cy, '┆', stripe);
                }
                y += 60.0;
            }
        }
        for body in &self.traffic {
            let (x0, y0, x1, y1) = vp.rect(body.x, body.y, body.w, body.h);
            canvas.fill(x0, y0, x1, y1, '█', Style::default().fg(Color::Rgb(239, 68, 68)).bg(ROAD));
        }
        let (x0, y0, x1, y1) = vp.rect(self.car.x, self.car.y, self.car.w, self.car.h);
        canvas.fill(x0, y0, x1, y1, '█', Style::default().fg(Color::Rgb(59, 130, 246)).bg(ROAD));
        canvas
    }
}

impl Game for CarRacing {
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
        let block = widgets::game_block("🏎 Car Racing", Color::Rgb(59, 130, 246));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let (status_area, field, help_area) = widgets::game_layout(inner);

        let status = widgets::status_line(vec![
            widgets::score_span("Score", self.score),
            widgets::best_span(self.best.shown()),
        ]);
        frame.render_widget(Paragraph::new(status), status_area);

        // keep the road's 9:10 shape with double-width cells
        let h = field.height;
        let w = (h as f32 * 2.0 * WIDTH / HEIGHT) as u16;
        let road = widgets::centered(field, w, h);
        let lines = self.render_field(road.width as usize, road.height as usize).into_lines();
        frame.render_widget(Paragraph::new(lines), road);

        let help = if self.over {
            widgets::banner_line("CRASH!", Color::Red, &format!("Score {} │ ENTER drive again │ Esc menu", self.score))
        } else if self.paused {
            widgets::banner_line("PAUSED", Color::Yellow, "P resume")
        } else {
            widgets::help_line(&[("←→/A D", "Steer"), ("P", "Pause"), ("R", "Restart"), ("Esc", "Menu")])
        };
        frame.render_widget(Paragraph::new(help), help_area);
    }

    fn stop(&mut self) {
        self.steer.clear();
        self.best.submit(self.score);
    }

    fn reset(&mut self) {
        self.best.submit(self.score);
        self.car = Body { x: 200.0, y: 350.0, w: CAR_W, h: CAR_H };
        self.traffic.clear();
        self.steer.clear();
        self.spawn_timer = Duration::ZERO;
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

    fn game() -> CarRacing {
        let mut ctx = GameContext::new(MemoryStore::shared());
        ctx.seed = Some(4);
        CarRacing::new(&ctx)
    }

    #[test]
    fn traffic_spawns_every_two_seconds() {
        let mut g = game();
        for _ in 0..124 {
            g.step(STEP);
        }
        assert!(g.traffic.is_empty());
        g.step(STEP);
        assert_eq!(g.traffic.len(), 1);
    }

    #[test]
    fn passing_a_car_scores() {
        let mut g = game();
        g.car.x = lane_x(0);
        g.traffic.push(Body { x: lane_x(2), y: HEIGHT - 1.0, w: CAR_W, h: CAR_H });
        g.step(STEP);
        assert_eq!(g.score(), 1);
        assert!(!g.is_game_over());
    }

    #[test]
    fn overlap_crashes() {
        let mut g = game();
        g.traffic.push(Body { x: g.car.x, y: g.car.y - CAR_H, w: CAR_W, h: CAR_H });
        g.step(STEP);
        assert!(g.is_game_over());
    }

    #[test]
    fn held_steering_moves_then_expires() {
        let mut g = game();
        let x = g.car.x;
        g.handle_input(Intent::Left);
        g.step(STEP);
        assert_eq!(g.car.x, x - CAR_SPEED);
        for _ in 0..30 {
            g.step(STEP);
        }
        let settled = g.car.x;
        g.step(STEP);
        assert_eq!(g.car.x, settled);
    }

    #[test]
    fn car_stays_on_the_road() {
        let mut g = game();
        g.car.x = 0.0;
        g.handle_input(Intent::Left);
        g.step(STEP);
        assert_eq!(g.car.x, 0.0);
    }
}
