use std::collections::VecDeque;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::clock::Schedule;
use crate::games::{Game, GameContext};
use crate::input::Intent;
use crate::store::{BestScore, Order};
use crate::ui::canvas::Canvas;
use crate::ui::widgets::{self, FIELD_BG};

const TILES: i32 = 20;
const STEP: Duration = Duration::from_millis(150);
const START: (i32, i32) = (10, 10);

pub struct Snake {
    body: VecDeque<(i32, i32)>,
    food: (i32, i32),
    dir: (i32, i32),
    /// Direction applied at the next step; validated against `dir` so two
    /// quick presses cannot reverse the snake into itself.
    queued: (i32, i32),
    score: u32,
    over: bool,
    paused: bool,
    best: BestScore,
    rng: StdRng,
}

impl Snake {
    pub fn new(ctx: &GameContext) -> Self {
        let mut game = Self {
            body: VecDeque::from([START]),
            food: (15, 15),
            dir: (0, 0),
            queued: (0, 0),
            score: 0,
            over: false,
            paused: false,
            best: BestScore::load(ctx.store.clone(), "snakeBest", Order::HigherIsBetter),
            rng: ctx.rng(),
        };
        game.place_food();
        game
    }

    fn place_food(&mut self) {
        if self.body.len() >= (TILES * TILES) as usize {
            return;
        }
        loop {
            let food = (self.rng.gen_range(0..TILES), self.rng.gen_range(0..TILES));
            if !self.body.contains(&food) {
                self.food = food;
                return;
            }
        }
    }

    fn steer(&mut self, dir: (i32, i32)) {
        // reversing straight back is ignored
        if self.dir != (-dir.0, -dir.1) {
            self.queued = dir;
        }
    }

    /// One movement step.
    pub fn step(&mut self) {
        if self.over || self.paused {
            return;
        }
        self.dir = self.queued;
        if self.dir == (0, 0) {
            return;
        }
        let Some(&(hx, hy)) = self.body.front() else {
            return;
        };
        let head = (hx + self.dir.0, hy + self.dir.1);
        let hits_wall = head.0 < 0 || head.0 >= TILES || head.1 < 0 || head.1 >= TILES;
        if hits_wall || self.body.contains(&head) {
            self.over = true;
            self.best.submit(self.score);
            tracing::debug!(score = self.score, length = self.body.len(), "snake crashed");
            return;
        }
        self.body.push_front(head);
        if head == self.food {
            self.score += 1;
            self.place_food();
        } else {
            self.body.pop_back();
        }
    }

    fn render_field(&self) -> Canvas {
        let bg = Style::default().bg(FIELD_BG);
        let mut canvas = Canvas::new(TILES as usize * 2, TILES as usize, bg);
        for y in 0..TILES {
            for x in 0..TILES {
                if (x + y) % 2 == 0 {
                    canvas.text(x * 2, y, "  ", Style::default().bg(Color::Rgb(14, 16, 26)));
                }
            }
        }
        canvas.text(self.food.0 * 2, self.food.1, "██", Style::default().fg(Color::Rgb(239, 68, 68)));
        for (i, &(x, y)) in self.body.iter().enumerate() {
            let color = if i == 0 { Color::Rgb(34, 197, 94) } else { Color::Rgb(74, 222, 128) };
            canvas.text(x * 2, y, "██", Style::default().fg(color));
        }
        canvas
    }
}

impl Game for Snake {
    fn schedule(&self) -> Schedule {
        Schedule::Fixed(STEP)
    }

    fn update(&mut self, _dt: Duration) {
        self.step();
    }

    fn handle_input(&mut self, intent: Intent) {
        if self.over {
            if matches!(intent, Intent::Confirm | Intent::Action) {
                self.reset();
            }
            return;
        }
        match intent {
            Intent::Up => self.steer((0, -1)),
            Intent::Down => self.steer((0, 1)),
            Intent::Left => self.steer((-1, 0)),
            Intent::Right => self.steer((1, 0)),
            Intent::Pause => self.paused = !self.paused,
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = widgets::game_block("🐍 Snake", Color::Rgb(74, 222, 128));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let (status_area, field, help_area) = widgets::game_layout(inner);

        let status = widgets::status_line(vec![
            widgets::score_span("Score", self.score),
            widgets::info_span(format!("Length {}", self.body.len()), Color::Green),
            widgets::best_span(self.best.shown()),
        ]);
        frame.render_widget(Paragraph::new(status), status_area);

        let board = widgets::centered(field, TILES as u16 * 2, TILES as u16);
        frame.render_widget(Paragraph::new(self.render_field().into_lines()), board);

        let help = if self.over {
            widgets::banner_line("GAME OVER", Color::Red, &format!("Score {} │ ENTER play again │ Esc menu", self.score))
        } else if self.paused {
            widgets::banner_line("PAUSED", Color::Yellow, "P resume")
        } else if self.dir == (0, 0) {
            widgets::help_line(&[("←↑↓→", "Start moving"), ("P", "Pause"), ("Esc", "Menu")])
        } else {
            widgets::help_line(&[("←↑↓→", "Steer"), ("P", "Pause"), ("R", "Restart"), ("Esc", "Menu")])
        };
        frame.render_widget(Paragraph::new(help), help_area);
    }

    fn stop(&mut self) {
        self.best.submit(self.score);
    }

    fn reset(&mut self) {
        self.best.submit(self.score);
        self.body = VecDeque::from([START]);
        self.dir = (0, 0);
        self.queued = (0, 0);
        self.score = 0;
        self.over = false;
        self.paused = false;
        self.place_food();
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

    fn snake() -> Snake {
        let mut ctx = GameContext::new(MemoryStore::shared());
        ctx.seed = Some(11);
        Snake::new(&ctx)
    }

    #[test]
    fn stays_still_until_steered() {
        let mut game = snake();
        game.update(STEP);
        assert_eq!(game.body.front(), Some(&START));
        game.handle_input(Intent::Right);
        game.update(STEP);
        assert_eq!(game.body.front(), Some(&(11, 10)));
    }

    #[test]
    fn eating_grows_and_scores() {
        let mut game = snake();
        game.food = (11, 10);
        game.handle_input(Intent::Right);
        game.step();
        assert_eq!(game.score(), 1);
        assert_eq!(game.body.len(), 2);
        assert!(!game.body.contains(&game.food));
    }

    #[test]
    fn cannot_reverse_into_itself() {
        let mut game = snake();
        game.food = (0, 0);
        game.body = VecDeque::from([(10, 10), (9, 10), (8, 10)]);
        game.handle_input(Intent::Right);
        game.step();
        // up then left within one step must not turn straight back
        game.handle_input(Intent::Up);
        game.handle_input(Intent::Left);
        game.step();
        assert!(!game.is_game_over());
        assert_eq!(game.body.front(), Some(&(11, 9)));
    }

    #[test]
    fn wall_ends_the_game() {
        let mut game = snake();
        game.food = (0, 0);
        game.body = VecDeque::from([(TILES - 1, 5)]);
        game.handle_input(Intent::Right);
        game.step();
        assert!(game.is_game_over());
    }
}
