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

const LEAD_IN: Duration = Duration::from_millis(500);
const STEP: Duration = Duration::from_millis(600);
const FLASH: Duration = Duration::from_millis(400);
const PRESS_FLASH: Duration = Duration::from_millis(200);
const NEXT_LEVEL: Duration = Duration::from_millis(1000);
const PAD_W: u16 = 14;
const PAD_H: u16 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pad {
    Green,
    Red,
    Yellow,
    Blue,
}

impl Pad {
    const ALL: [Pad; 4] = [Pad::Green, Pad::Red, Pad::Yellow, Pad::Blue];

    fn color(self, lit: bool) -> Color {
        match (self, lit) {
            (Pad::Green, false) => Color::Rgb(0, 100, 40),
            (Pad::Green, true) => Color::Rgb(60, 255, 120),
            (Pad::Red, false) => Color::Rgb(120, 20, 20),
            (Pad::Red, true) => Color::Rgb(255, 80, 80),
            (Pad::Yellow, false) => Color::Rgb(130, 110, 0),
            (Pad::Yellow, true) => Color::Rgb(255, 240, 80),
            (Pad::Blue, false) => Color::Rgb(20, 40, 130),
            (Pad::Blue, true) => Color::Rgb(90, 150, 255),
        }
    }

    /// Quadrant as `(row, col)`: green and red on top.
    fn cell(self) -> (usize, usize) {
        match self {
            Pad::Green => (0, 0),
            Pad::Red => (0, 1),
            Pad::Yellow => (1, 0),
            Pad::Blue => (1, 1),
        }
    }

    fn from_cell(r: usize, c: usize) -> Pad {
        Pad::ALL[(r * 2 + c) % 4]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// Waiting for the first start.
    Idle,
    /// Pause before the sequence plays back.
    LeadIn(Duration),
    /// Playing the sequence back; time since the first flash.
    Showing(Duration),
    /// Player repeats the sequence.
    Input,
    /// Sequence repeated; next level after the pause.
    Correct(Duration),
    Over,
}

pub struct Simon {
    sequence: Vec<Pad>,
    entered: usize,
    level: u32,
    phase: Phase,
    pressed: Option<(Pad, Duration)>,
    board_area: Rect,
    best: BestScore,
    rng: StdRng,
}

impl Simon {
    pub fn new(ctx: &GameContext) -> Self {
        Self {
            sequence: Vec::new(),
            entered: 0,
            level: 0,
            phase: Phase::Idle,
            pressed: None,
            board_area: Rect::default(),
            best: BestScore::load(ctx.store.clone(), "simonHigh", Order::HigherIsBetter),
            rng: ctx.rng(),
        }
    }

    fn begin(&mut self) {
        self.sequence.clear();
        self.level = 0;
        self.next_level();
    }

    fn next_level(&mut self) {
        self.level += 1;
        self.entered = 0;
        self.sequence.push(Pad::ALL[self.rng.gen_range(0..Pad::ALL.len())]);
        self.phase = Phase::LeadIn(LEAD_IN);
    }

    /// Pad lit by the playback at this moment.
    fn lit(&self) -> Option<Pad> {
        if let Some((pad, _)) = self.pressed {
            return Some(pad);
        }
        let Phase::Showing(t) = self.phase else {
            return None;
        };
        let index = (t.as_millis() / STEP.as_millis()) as usize;
        let into = t.saturating_sub(STEP * index as u32);
        (into < FLASH).then(|| self.sequence.get(index).copied()).flatten()
    }

    pub fn press(&mut self, pad: Pad) {
        if self.phase != Phase::Input {
            return;
        }
        self.pressed = Some((pad, PRESS_FLASH));
        if self.sequence.get(self.entered) != Some(&pad) {
            self.phase = Phase::Over;
            self.best.submit(self.level);
            tracing::debug!(level = self.level, "simon sequence broken");
            return;
        }
        self.entered += 1;
        if self.entered == self.sequence.len() {
            self.phase = Phase::Correct(NEXT_LEVEL);
        }
    }

    fn advance(&mut self, dt: Duration) {
        if let Some((pad, left)) = self.pressed {
            self.pressed = left.checked_sub(dt).filter(|d| !d.is_zero()).map(|d| (pad, d));
        }
        match self.phase {
            Phase::LeadIn(left) => {
                self.phase = match left.checked_sub(dt).filter(|d| !d.is_zero()) {
                    Some(rest) => Phase::LeadIn(rest),
                    None => Phase::Showing(Duration::ZERO),
                }
            }
            Phase::Showing(t) => {
                let t = t + dt;
                self.phase = if t >= STEP * self.sequence.len() as u32 { Phase::Input } else { Phase::Showing(t) };
            }
            Phase::Correct(left) => match left.checked_sub(dt).filter(|d| !d.is_zero()) {
                Some(rest) => self.phase = Phase::Correct(rest),
                None => self.next_level(),
            },
            Phase::Idle | Phase::Input | Phase::Over => {}
        }
    }

    fn message(&self) -> (&'static str, Color) {
        match self.phase {
            Phase::Idle => ("Press ENTER to start", Color::Yellow),
            Phase::LeadIn(_) | Phase::Showing(_) => ("Watch the pattern...", Color::Cyan),
            Phase::Input => ("Your turn!", Color::Green),
            Phase::Correct(_) => ("Correct! 🎉", Color::Green),
            Phase::Over => ("Game over", Color::Red),
        }
    }

    fn render_pads(&self) -> Canvas {
        let mut canvas = Canvas::new(PAD_W as usize * 2, PAD_H as usize * 2, Style::default().bg(FIELD_BG));
        let lit = self.lit();
        for (i, pad) in Pad::ALL.iter().enumerate() {
            let (r, c) = pad.cell();
            let x0 = c as i32 * PAD_W as i32;
            let y0 = r as i32 * PAD_H as i32;
            let on = lit == Some(*pad) || (self.phase == Phase::Over && self.pressed.is_some());
            let style = Style::default().bg(pad.color(on));
            canvas.fill(x0 + 1, y0, x0 + PAD_W as i32 - 1, y0 + PAD_H as i32 - 1, ' ', style);
            let label = Style::default().fg(Color::Black).bg(pad.color(on)).add_modifier(Modifier::BOLD);
            canvas.put(x0 + PAD_W as i32 / 2, y0 + PAD_H as i32 / 2 - 1, char::from(b'1' + i as u8), label);
        }
        canvas
    }
}

impl Game for Simon {
    fn schedule(&self) -> Schedule {
        Schedule::Frame
    }

    fn update(&mut self, dt: Duration) {
        self.advance(dt);
    }

    fn handle_input(&mut self, intent: Intent) {
        match (self.phase, intent) {
            (Phase::Idle | Phase::Over, Intent::Confirm | Intent::Action) => self.begin(),
            (_, Intent::Digit(d @ 1..=4)) => self.press(Pad::ALL[d as usize - 1]),
            (_, Intent::Up) => self.press(Pad::Green),
            (_, Intent::Right) => self.press(Pad::Red),
            (_, Intent::Left) => self.press(Pad::Yellow),
            (_, Intent::Down) => self.press(Pad::Blue),
            (_, Intent::Click { column, row }) => {
                if let Some((r, c)) = cell_at(self.board_area, PAD_W, PAD_H, 2, 2, column, row) {
                    self.press(Pad::from_cell(r, c));
                }
            }
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = widgets::game_block("🎵 Simon Says", Color::Rgb(60, 255, 120));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let (status_area, field, help_area) = widgets::game_layout(inner);

        let (msg, color) = self.message();
        let status = widgets::status_line(vec![
            widgets::score_span("Level", self.level),
            widgets::best_span(self.best.shown()),
            widgets::info_span(msg.to_string(), color),
        ]);
        frame.render_widget(Paragraph::new(status), status_area);

        self.board_area = widgets::centered(field, PAD_W * 2, PAD_H * 2);
        frame.render_widget(Paragraph::new(self.render_pads().into_lines()), self.board_area);

        let help = if self.phase == Phase::Over {
            widgets::banner_line(
                "GAME OVER",
                Color::Red,
                &format!("You reached level {} │ ENTER play again │ Esc menu", self.level),
            )
        } else {
            widgets::help_line(&[("1-4/Click", "Press"), ("↑→←↓", "G R Y B"), ("ENTER", "Start"), ("Esc", "Menu")])
        };
        frame.render_widget(Paragraph::new(help), help_area);
    }

    fn stop(&mut self) {
        self.pressed = None;
        if self.phase != Phase::Idle {
            self.best.submit(self.level);
        }
    }

    fn reset(&mut self) {
        self.stop();
        self.sequence.clear();
        self.entered = 0;
        self.level = 0;
        self.phase = Phase::Idle;
    }

    fn score(&self) -> u32 {
        self.level
    }

    fn best(&self) -> Option<u32> {
        self.best.value()
    }

    fn is_game_over(&self) -> bool {
        self.phase == Phase::Over
    }
}
