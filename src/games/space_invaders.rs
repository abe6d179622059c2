use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::clock::{frames, Schedule};
use crate::games::{Game, GameContext};
use crate::input::{HeldAxis, Intent};
use crate::store::{BestScore, Order};
use crate::ui::canvas::{Canvas, Viewport};
use crate::ui::widgets;

const WIDTH: f32 = 500.0;
const HEIGHT: f32 = 400.0;
const PLAYER_SPEED: f32 = 8.0;
const PLAYER_BULLET_SPEED: f32 = 8.0;
const ENEMY_BULLET_SPEED: f32 = 5.0;
const ENEMY_FIRE_CHANCE: f32 = 0.02;
const ENEMY_DROP: f32 = 20.0;
const ENEMY_SIZE: f32 = 35.0;
const ROWS: usize = 4;
const COLS: usize = 8;
const LIVES: u32 = 3;
const SPACE: Color = Color::Rgb(10, 10, 10);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AlienKind {
    Squid,
    Crab,
    Saucer,
    Ghost,
}

impl AlienKind {
    const BY_ROW: [AlienKind; ROWS] = [AlienKind::Squid, AlienKind::Crab, AlienKind::Saucer, AlienKind::Ghost];

    fn points(self) -> u32 {
        match self {
            AlienKind::Squid => 40,
            AlienKind::Crab => 30,
            AlienKind::Saucer => 20,
            AlienKind::Ghost => 10,
        }
    }

    fn sprite(self, frame: bool) -> &'static str {
        match (self, frame) {
            (AlienKind::Squid, true) => "▞▀▚",
            (AlienKind::Squid, false) => "▚▀▞",
            (AlienKind::Crab, true) => "╓█╖",
            (AlienKind::Crab, false) => "╙█╜",
            (AlienKind::Saucer, _) => "◖■◗",
            (AlienKind::Ghost, true) => "▟▀▙",
            (AlienKind::Ghost, false) => "▛▄▜",
        }
    }

    fn color(self) -> Color {
        match self {
            AlienKind::Squid => Color::Rgb(255, 80, 80),
            AlienKind::Crab => Color::Rgb(80, 255, 150),
            AlienKind::Saucer => Color::Rgb(200, 180, 255),
            AlienKind::Ghost => Color::Rgb(255, 220, 120),
        }
    }
}

/// Axis-aligned box in field pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Rect2 {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

impl Rect2 {
    fn hits(&self, other: &Rect2) -> bool {
        self.x < other.x + other.w && self.x + self.w > other.x && self.y < other.y + other.h && self.y + self.h > other.y
    }
}

#[derive(Clone, Copy, Debug)]
struct Alien {
    body: Rect2,
    kind: AlienKind,
}

/// Bullets are stored by their centre-top point.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Bullet {
    x: f32,
    y: f32,
}

impl Bullet {
    fn body(&self) -> Rect2 {
        Rect2 { x: self.x - 2.0, y: self.y, w: 4.0, h: 10.0 }
    }
}

fn formation() -> Vec<Alien> {
    let mut aliens = Vec::with_capacity(ROWS * COLS);
    for (row, kind) in AlienKind::BY_ROW.iter().enumerate() {
        for col in 0..COLS {
            aliens.push(Alien {
                body: Rect2 { x: col as f32 * 55.0 + 40.0, y: row as f32 * 40.0 + 40.0, w: ENEMY_SIZE, h: ENEMY_SIZE },
                kind: *kind,
            });
        }
    }
    aliens
}

fn player_start() -> Rect2 {
    Rect2 { x: 225.0, y: 360.0, w: 50.0, h: 20.0 }
}

pub struct SpaceInvaders {
    player: Rect2,
    steer: HeldAxis,
    bullets: Vec<Bullet>,
    enemy_bullets: Vec<Bullet>,
    aliens: Vec<Alien>,
    direction: f32,
    speed: f32,
    wave: u32,
    lives: u32,
    score: u32,
    over: bool,
    paused: bool,
    elapsed: f32,
    best: BestScore,
    rng: StdRng,
}

impl SpaceInvaders {
    pub fn new(ctx: &GameContext) -> Self {
        Self {
            player: player_start(),
            steer: HeldAxis::default(),
            bullets: Vec::new(),
            enemy_bullets: Vec::new(),
            aliens: formation(),
            direction: 1.0,
            speed: 1.0,
            wave: 1,
            lives: LIVES,
            score: 0,
            over: false,
            paused: false,
            elapsed: 0.0,
            best: BestScore::load(ctx.store.clone(), "spaceinvadersBest", Order::HigherIsBetter),
            rng: ctx.rng(),
        }
    }

    fn shoot(&mut self) {
        self.bullets.push(Bullet { x: self.player.x + self.player.w / 2.0, y: self.player.y });
    }

    fn finish(&mut self, reason: &str) {
        self.over = true;
        self.best.submit(self.score);
        tracing::debug!(score = self.score, wave = self.wave, reason, "invaders game over");
    }

    pub fn step(&mut self, dt: Duration) {
        if self.over || self.paused {
            return;
        }
        let f = frames(dt);
        self.elapsed += f;

        match self.steer.step(dt) {
            -1 if self.player.x > 0.0 => self.player.x = (self.player.x - PLAYER_SPEED * f).max(0.0),
            1 if self.player.x + self.player.w < WIDTH => {
                self.player.x = (self.player.x + PLAYER_SPEED * f).min(WIDTH - self.player.w)
            }
            _ => {}
        }

        for bullet in &mut self.bullets {
            bullet.y -= PLAYER_BULLET_SPEED * f;
        }
        self.bullets.retain(|b| b.y >= 0.0);

        self.move_enemy_bullets(f);
        if self.over {
            return;
        }
        self.move_formation(f);
        if self.over {
            return;
        }
        self.enemy_fire(f);
        self.resolve_hits();

        if self.aliens.is_empty() {
            self.aliens = formation();
            self.speed += 0.5;
            self.wave += 1;
            tracing::debug!(wave = self.wave, speed = self.speed, "wave cleared");
        }
    }

    fn move_enemy_bullets(&mut self, f: f32) {
        let player = self.player;
        let before = self.enemy_bullets.len();
        for bullet in &mut self.enemy_bullets {
            bullet.y += ENEMY_BULLET_SPEED * f;
        }
        self.enemy_bullets.retain(|b| !b.body().hits(&player));
        let hits = (before - self.enemy_bullets.len()) as u32;
        self.enemy_bullets.retain(|b| b.y <= HEIGHT);
        if hits > 0 {
            self.lives = self.lives.saturating_sub(hits);
            if self.lives == 0 {
                self.finish("no lives");
            }
        }
    }

    fn move_formation(&mut self, f: f32) {
        let dx = self.speed * self.direction * f;
        let mut at_wall = false;
        for alien in &mut self.aliens {
            alien.body.x += dx;
            if alien.body.x <= 0.0 || alien.body.x + alien.body.w >= WIDTH {
                at_wall = true;
            }
        }
        if !at_wall {
            return;
        }
        self.direction = -self.direction;
        let player_y = self.player.y;
        let mut landed = false;
        for alien in &mut self.aliens {
            alien.body.y += ENEMY_DROP;
            landed |= alien.body.y + alien.body.h >= player_y;
        }
        if landed {
            self.finish("invaded");
        }
    }

    fn enemy_fire(&mut self, f: f32) {
        let chance = (ENEMY_FIRE_CHANCE * f).clamp(0.0, 1.0) as f64;
        if !self.rng.gen_bool(chance) {
            return;
        }
        if let Some(shooter) = self.aliens.choose(&mut self.rng) {
            let b = shooter.body;
            self.enemy_bullets.push(Bullet { x: b.x + b.w / 2.0, y: b.y + b.h });
        }
    }

    /// Each bullet takes out at most one alien.
    fn resolve_hits(&mut self) {
        let mut i = 0;
        while i < self.bullets.len() {
            let shot = self.bullets[i].body();
            if let Some(j) = self.aliens.iter().rposition(|a| shot.hits(&a.body)) {
                let alien = self.aliens.remove(j);
                self.score += alien.kind.points();
                self.bullets.remove(i);
            } else {
                i += 1;
            }
        }
    }

    fn render_field(&self, w: usize, h: usize) -> Canvas {
        let bg = Style::default().bg(SPACE);
        let mut canvas = Canvas::new(w, h, bg);
        let vp = Viewport::new(WIDTH, HEIGHT, w, h);

        let star = Style::default().fg(Color::Rgb(120, 120, 140)).bg(SPACE);
        for i in 0..50 {
            let x = (i * 73) % WIDTH as i32;
            let y = (i * 47) % HEIGHT as i32;
            canvas.put(vp.x(x as f32), vp.y(y as f32), '·', star);
        }

        let anim = (self.elapsed as u32 / 30) % 2 == 0;
        for alien in &self.aliens {
            let b = alien.body;
            let sprite = alien.kind.sprite(anim);
            let cx = vp.x(b.x + b.w / 2.0) - 1;
            canvas.text(cx, vp.y(b.y + b.h / 2.0), sprite, Style::default().fg(alien.kind.color()).bg(SPACE));
        }

        let shot = Style::default().fg(Color::Rgb(0, 255, 0)).bg(SPACE);
        for b in &self.bullets {
            canvas.put(vp.x(b.x), vp.y(b.y), '│', shot);
        }
        let enemy_shot = Style::default().fg(Color::Rgb(255, 0, 0)).bg(SPACE);
        for b in &self.enemy_bullets {
            canvas.put(vp.x(b.x), vp.y(b.y), '┇', enemy_shot);
        }

        let (x0, y0, x1, y1) = vp.rect(self.player.x, self.player.y, self.player.w, self.player.h);
        let ship = Style::default().fg(Color::Rgb(0, 255, 0)).bg(SPACE);
        let mid = (x0 + x1) / 2;
        canvas.put(mid, y0, '▲', ship);
        canvas.fill(x0, y0 + 1, x1, y1.max(y0 + 2), '▀', ship);
        canvas
    }
}

impl Game for SpaceInvaders {
    fn schedule(&self) -> Schedule {
        Schedule::Frame
    }

    fn update(&mut self, dt: Duration) {
        self.step(dt);
    }

    fn handle_input(&mut self, intent: Intent) {
        if self.over {
            if matches!(intent, Intent::Confirm) {
                self.reset();
            }
            return;
        }
        match intent {
            Intent::Pause => self.paused = !self.paused,
            Intent::Action | Intent::Up if !self.paused => self.shoot(),
            other if !self.paused => {
                self.steer.handle(other);
            }
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = widgets::game_block("👾 Space Invaders", Color::Rgb(80, 255, 150));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let (status_area, field, help_area) = widgets::game_layout(inner);

        let status = widgets::status_line(vec![
            widgets::score_span("Score", self.score),
            widgets::info_span("❤".repeat(self.lives as usize), Color::Red),
            widgets::info_span(format!("Wave {}", self.wave), Color::Magenta),
            widgets::best_span(self.best.shown()),
        ]);
        frame.render_widget(Paragraph::new(status), status_area);

        let h = field.height;
        let arena = widgets::centered(field, (h as f32 * 2.0 * WIDTH / HEIGHT) as u16, h);
        let lines = self.render_field(arena.width as usize, arena.height as usize).into_lines();
        frame.render_widget(Paragraph::new(lines), arena);

        let help = if self.over {
            widgets::banner_line("GAME OVER", Color::Red, &format!("Final score {} │ ENTER new game │ Esc menu", self.score))
        } else if self.paused {
            widgets::banner_line("PAUSED", Color::Yellow, "P resume")
        } else {
            widgets::help_line(&[("←→", "Move"), ("Space", "Fire"), ("P", "Pause"), ("R", "Restart"), ("Esc", "Menu")])
        };
        frame.render_widget(Paragraph::new(help), help_area);
    }

    fn stop(&mut self) {
        self.steer.clear();
        self.best.submit(self.score);
    }

    fn reset(&mut self) {
        self.best.submit(self.score);
        self.player = player_start();
        self.steer.clear();
        self.bullets.clear();
        self.enemy_bullets.clear();
        self.aliens = formation();
        self.direction = 1.0;
        self.speed = 1.0;
        self.wave = 1;
        self.lives = LIVES;
        self.score = 0;
        self.over = false;
        self.paused = false;
        self.elapsed = 0.0;
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
