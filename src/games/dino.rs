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

const WIDTH: f32 = 600.0;
/// Field height drawn on screen; tall enough for the dino standing on the ground.
const VIEW_H: f32 = 220.0;
const GROUND_Y: f32 = 160.0;
const DINO_X: f32 = 50.0;
const DINO_W: f32 = 40.0;
const DINO_H: f32 = 50.0;
const GRAVITY: f32 = 0.8;
const JUMP: f32 = -15.0;
const START_SPEED: f32 = 8.0;
const SPEEDUP_EVERY: u32 = 500;
const PADDING: f32 = 5.0;
const BIRD_CHANCE: f64 = 0.3;
/// Frames per displayed point.
const FRAMES_PER_POINT: f32 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Cactus,
    Bird,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Obstacle {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    kind: Kind,
}

pub struct Dino {
    y: f32,
    velocity: f32,
    jumping: bool,
    obstacles: Vec<Obstacle>,
    /// Distance the newest obstacle must travel before the next spawns.
    next_gap: f32,
    speed: f32,
    /// Frames survived; the displayed score is a fifth of this.
    ticks: f32,
    started: bool,
    over: bool,
    ground_offset: f32,
    best: BestScore,
    rng: StdRng,
}

impl Dino {
    pub fn new(ctx: &GameContext) -> Self {
        Self {
            y: GROUND_Y,
            velocity: 0.0,
            jumping: false,
            obstacles: Vec::new(),
            next_gap: 300.0,
            speed: START_SPEED,
            ticks: 0.0,
            started: false,
            over: false,
            ground_offset: 0.0,
            best: BestScore::load(ctx.store.clone(), "dinoHigh", Order::HigherIsBetter),
            rng: ctx.rng(),
        }
    }

    fn jump(&mut self) {
        if self.over {
            self.reset();
            return;
        }
        self.started = true;
        if !self.jumping {
            self.velocity = JUMP;
            self.jumping = true;
        }
    }

    fn spawn(&mut self) {
        let obstacle = if self.rng.gen_bool(BIRD_CHANCE) {
            Obstacle { x: WIDTH, y: GROUND_Y - 30.0 - self.rng.gen_range(0.0..40.0), w: 40.0, h: 30.0, kind: Kind::Bird }
        } else {
            Obstacle {
                x: WIDTH,
                y: GROUND_Y,
                w: self.rng.gen_range(20.0..40.0),
                h: self.rng.gen_range(40.0..60.0),
                kind: Kind::Cactus,
            }
        };
        self.obstacles.push(obstacle);
        self.next_gap = self.rng.gen_range(300.0..500.0);
    }

    fn hits(&self, o: &Obstacle) -> bool {
        DINO_X + PADDING < o.x + o.w
            && DINO_X + DINO_W - PADDING > o.x
            && self.y + PADDING < o.y + o.h
            && self.y + DINO_H - PADDING > o.y
    }

    fn points(&self) -> u32 {
        (self.ticks / FRAMES_PER_POINT) as u32
    }

    pub fn step(&mut self, dt: Duration) {
        if !self.started || self.over {
            return;
        }
        let f = frames(dt);
        self.velocity += GRAVITY * f;
        self.y += self.velocity * f;
        if self.y >= GROUND_Y {
            self.y = GROUND_Y;
            self.velocity = 0.0;
            self.jumping = false;
        }

        if self.obstacles.last().map_or(true, |o| o.x < WIDTH - self.next_gap) {
            self.spawn();
        }
        let dx = self.speed * f;
        for o in &mut self.obstacles {
            o.x -= dx;
        }
        self.ground_offset = (self.ground_offset + dx) % WIDTH;
        if self.obstacles.iter().any(|o| self.hits(o)) {
            self.over = true;
            self.best.submit(self.points());
            tracing::debug!(score = self.points(), speed = self.speed, "dino hit an obstacle");
            return;
        }
        self.obstacles.retain(|o| o.x + o.w >= 0.0);

        let before = self.ticks as u32 / SPEEDUP_EVERY;
        self.ticks += f;
        let after = self.ticks as u32 / SPEEDUP_EVERY;
        self.speed += 0.5 * (after - before) as f32;
    }

    fn render_field(&self, w: usize, h: usize) -> Canvas {
        let sky = Color::Rgb(20, 20, 35);
        let mut canvas = Canvas::new(w, h, Style::default().bg(sky));
        let vp = Viewport::new(WIDTH, VIEW_H, w, h);
        let ground = vp.y(GROUND_Y + DINO_H);

        let scroll = vp.x(self.ground_offset) as usize;
        let line = Style::default().fg(Color::Rgb(140, 120, 100)).bg(sky);
        for x in 0..w {
            let ch = match (x + scroll) % 8 {
                0 => '▪',
                4 => '·',
                _ => '━',
            };
            canvas.put(x as i32, ground, ch, line);
        }

        for o in &self.obstacles {
            let (x0, y0, x1, _) = vp.rect(o.x, o.y, o.w, o.h);
            match o.kind {
                Kind::Cactus => {
                    let style = Style::default().fg(Color::Rgb(40, 160, 40)).bg(sky);
                    for y in y0..ground {
                        for x in x0..x1.max(x0 + 1) {
                            let ch = if y == y0 { '▲' } else if x == x0 || x + 1 == x1 { '║' } else { '█' };
                            canvas.put(x, y, ch, style);
                        }
                    }
                }
                Kind::Bird => {
                    let wings = if (self.ticks as u32 / 8) % 2 == 0 { "/▬\\" } else { "\\▬/" };
                    let style = Style::default().fg(Color::Rgb(220, 80, 80)).bg(sky).add_modifier(Modifier::BOLD);
                    canvas.text(x0, y0, wings, style);
                }
            }
        }

        let (dx0, dy0, _, _) = vp.rect(DINO_X, self.y, DINO_W, DINO_H);
        let dino = Style::default().fg(Color::Rgb(200, 200, 200)).bg(sky).add_modifier(Modifier::BOLD);
        canvas.text(dx0 + 1, dy0, "▄█▀", dino);
        for y in dy0 + 1..ground {
            canvas.text(dx0, y, "██", dino);
        }
        canvas
    }
}

impl Game for Dino {
    fn schedule(&self) -> Schedule {
        Schedule::Frame
    }

    fn update(&mut self, dt: Duration) {
        self.step(dt);
    }

    fn handle_input(&mut self, intent: Intent) {
        if matches!(intent, Intent::Action | Intent::Up | Intent::Confirm | Intent::Click { .. }) {
            self.jump();
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = widgets::game_block("🦖 Dino Runner", Color::Rgb(140, 200, 120));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let (status_area, field, help_area) = widgets::game_layout(inner);

        let status = widgets::status_line(vec![
            widgets::score_span("Score", self.points()),
            widgets::best_span(self.best.shown()),
            widgets::info_span(format!("Speed {:.1}", self.speed), Color::Magenta),
        ]);
        frame.render_widget(Paragraph::new(status), status_area);

        // wide strip: width first, then height from the aspect ratio
        let w = field.width;
        let h = ((w as f32 * VIEW_H / WIDTH / 2.0) as u16).min(field.height);
        let strip = widgets::centered(field, w, h);
        let lines = self.render_field(strip.width as usize, strip.height as usize).into_lines();
        frame.render_widget(Paragraph::new(lines), strip);

        let help = if self.over {
            widgets::banner_line("GAME OVER", Color::Red, &format!("Score {} │ Space to run again", self.points()))
        } else if !self.started {
            widgets::banner_line("Press Space to start!", Color::Yellow, "Space/↑ jump")
        } else {
            widgets::help_line(&[("Space/↑", "Jump"), ("R", "Restart"), ("Esc", "Menu")])
        };
        frame.render_widget(Paragraph::new(help), help_area);
    }

    fn stop(&mut self) {
        self.best.submit(self.points());
    }

    fn reset(&mut self) {
        self.best.submit(self.points());
        self.y = GROUND_Y;
        self.velocity = 0.0;
        self.jumping = false;
        self.obstacles.clear();
        self.next_gap = 300.0;
        self.speed = START_SPEED;
        self.ticks = 0.0;
        self.started = false;
        self.over = false;
    }

    fn score(&self) -> u32 {
        self.points()
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

    const FRAME: Duration = Duration::from_micros(16_667);

    fn dino() -> Dino {
        let mut ctx = GameContext::new(MemoryStore::shared());
        ctx.seed = Some(5);
        Dino::new(&ctx)
    }

    fn cactus_at(x: f32) -> Obstacle {
        Obstacle { x, y: GROUND_Y, w: 30.0, h: 50.0, kind: Kind::Cactus }
    }

    #[test]
    fn jump_lands_back_on_the_ground() {
        let mut game = dino();
        game.handle_input(Intent::Action);
        game.obstacles.push(cactus_at(10_000.0));
        game.step(FRAME);
        assert!(game.y < GROUND_Y);
        // no double jump mid-air
        let v = game.velocity;
        game.handle_input(Intent::Action);
        assert_eq!(game.velocity, v);
        for _ in 0..60 {
            game.step(FRAME);
        }
        assert_eq!(game.y, GROUND_Y);
        assert!(!game.jumping);
    }

    #[test]
    fn running_into_a_cactus_ends_the_game() {
        let mut game = dino();
        game.started = true;
        game.obstacles.push(cactus_at(DINO_X + 20.0));
        game.step(FRAME);
        assert!(game.is_game_over());
    }

    #[test]
    fn padding_forgives_a_graze() {
        let mut game = dino();
        game.started = true;
        // leading edge ends 3 px into the dino box after moving 8
        game.obstacles.push(Obstacle { x: DINO_X - 30.0 + 3.0 + START_SPEED, ..cactus_at(0.0) });
        game.step(FRAME);
        assert!(!game.is_game_over());
    }

    #[test]
    fn score_is_a_fifth_of_frames_and_speed_ramps() {
        let mut game = dino();
        game.started = true;
        game.ticks = 499.5;
        game.obstacles.push(cactus_at(10_000.0));
        game.step(FRAME);
        assert_eq!(game.score(), 100);
        assert_eq!(game.speed, START_SPEED + 0.5);
    }

    #[test]
    fn jump_after_game_over_resets() {
        let mut game = dino();
        game.started = true;
        game.ticks = 50.0;
        game.over = true;
        game.handle_input(Intent::Action);
        assert!(!game.is_game_over());
        assert_eq!(game.score(), 0);
        assert_eq!(game.best(), Some(10));
    }
}
