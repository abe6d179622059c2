use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::clock::Schedule;
use crate::games::{Game, GameContext};
use crate::grid::Grid;
use crate::input::{cell_at, Intent};
use crate::store::{BestScore, Order};
use crate::ui::canvas::Canvas;
use crate::ui::widgets::{self, FIELD_BG};

const SIDE: usize = 4;
const PAIRS: usize = 8;
const CELL_W: u16 = 8;
const CELL_H: u16 = 3;
/// How long a mismatched pair stays face up.
const REVEAL: Duration = Duration::from_millis(1000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fruit {
    Apple,
    Banana,
    Grape,
    Orange,
    Strawberry,
    Melon,
    Kiwi,
    Peach,
}

impl Fruit {
    const ALL: [Fruit; PAIRS] = [
        Fruit::Apple,
        Fruit::Banana,
        Fruit::Grape,
        Fruit::Orange,
        Fruit::Strawberry,
        Fruit::Melon,
        Fruit::Kiwi,
        Fruit::Peach,
    ];

    fn glyph(self) -> char {
        match self {
            Fruit::Apple => '●',
            Fruit::Banana => '☽',
            Fruit::Grape => '⁂',
            Fruit::Orange => '◉',
            Fruit::Strawberry => '♥',
            Fruit::Melon => '◐',
            Fruit::Kiwi => '✿',
            Fruit::Peach => '♣',
        }
    }

    fn color(self) -> Color {
        match self {
            Fruit::Apple => Color::Rgb(220, 40, 40),
            Fruit::Banana => Color::Rgb(250, 220, 60),
            Fruit::Grape => Color::Rgb(150, 70, 200),
            Fruit::Orange => Color::Rgb(255, 150, 30),
            Fruit::Strawberry => Color::Rgb(255, 70, 120),
            Fruit::Melon => Color::Rgb(70, 200, 90),
            Fruit::Kiwi => Color::Rgb(140, 180, 60),
            Fruit::Peach => Color::Rgb(255, 190, 150),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Card {
    fruit: Fruit,
    flipped: bool,
    matched: bool,
}

fn shuffled_deck(rng: &mut StdRng) -> Grid<Card> {
    let mut fruits: Vec<Fruit> = Fruit::ALL.iter().chain(Fruit::ALL.iter()).copied().collect();
    fruits.shuffle(rng);
    let mut deck = Grid::new(SIDE, SIDE, Card { fruit: Fruit::Apple, flipped: false, matched: false });
    for (i, fruit) in fruits.into_iter().enumerate() {
        deck.set(i / SIDE, i % SIDE, Card { fruit, flipped: false, matched: false });
    }
    deck
}

pub struct Memory {
    cards: Grid<Card>,
    /// Face-up cards awaiting the match check, in flip order.
    face_up: Vec<(usize, usize)>,
    check_in: Option<Duration>,
    matched: usize,
    moves: u32,
    cursor: (usize, usize),
    board_area: Rect,
    best: BestScore,
    rng: StdRng,
}

impl Memory {
    pub fn new(ctx: &GameContext) -> Self {
        let mut rng = ctx.rng();
        Self {
            cards: shuffled_deck(&mut rng),
            face_up: Vec::with_capacity(2),
            check_in: None,
            matched: 0,
            moves: 0,
            cursor: (0, 0),
            board_area: Rect::default(),
            best: BestScore::load(ctx.store.clone(), "memoryBest", Order::LowerIsBetter),
            rng,
        }
    }

    fn won(&self) -> bool {
        self.matched == PAIRS
    }

    /// Turns a card face up. Ignored for open or matched cards and while a
    /// pair is waiting to be checked.
    pub fn flip(&mut self, r: usize, c: usize) -> bool {
        if self.face_up.len() == 2 {
            return false;
        }
        let Some(card) = self.cards.get_mut(r, c) else {
            return false;
        };
        if card.flipped || card.matched {
            return false;
        }
        card.flipped = true;
        self.face_up.push((r, c));
        if self.face_up.len() == 2 {
            self.moves += 1;
            self.check_in = Some(REVEAL);
        }
        true
    }

    fn check_match(&mut self) {
        let [a, b] = match self.face_up[..] {
            [a, b] => [a, b],
            _ => return,
        };
        self.face_up.clear();
        if self.cards[a].fruit == self.cards[b].fruit {
            self.cards[a].matched = true;
            self.cards[b].matched = true;
            self.matched += 1;
            if self.won() {
                self.best.submit(self.moves);
                tracing::debug!(moves = self.moves, "memory solved");
            }
        } else {
            self.cards[a].flipped = false;
            self.cards[b].flipped = false;
        }
    }

    fn move_cursor(&mut self, dr: isize, dc: isize) {
        let r = (self.cursor.0 as isize + dr).clamp(0, SIDE as isize - 1);
        let c = (self.cursor.1 as isize + dc).clamp(0, SIDE as isize - 1);
        self.cursor = (r as usize, c as usize);
    }

    fn render_board(&self) -> Canvas {
        let mut canvas = Canvas::new(CELL_W as usize * SIDE, CELL_H as usize * SIDE, Style::default().bg(FIELD_BG));
        for ((r, c), card) in self.cards.iter() {
            let x0 = c as i32 * CELL_W as i32 + 1;
            let y0 = r as i32 * CELL_H as i32;
            let (x1, y1) = (x0 + CELL_W as i32 - 2, y0 + CELL_H as i32 - 1);
            let selected = self.cursor == (r, c) && !self.won();
            let bg = match (card.matched, card.flipped) {
                (true, _) => Color::Rgb(30, 70, 40),
                (false, true) => Color::Rgb(60, 60, 90),
                _ if selected => Color::Rgb(80, 80, 140),
                _ => Color::Rgb(45, 45, 70),
            };
            canvas.fill(x0, y0, x1, y1, ' ', Style::default().bg(bg));
            let mid = (x0 + x1) / 2;
            if card.flipped || card.matched {
                let style = Style::default().fg(card.fruit.color()).bg(bg).add_modifier(Modifier::BOLD);
                canvas.put(mid, y0 + 1, card.fruit.glyph(), style);
            } else {
                canvas.put(mid, y0 + 1, '?', Style::default().fg(Color::Rgb(150, 150, 190)).bg(bg));
            }
            if selected {
                let mark = Style::default().fg(Color::Yellow).bg(bg);
                canvas.put(x0, y0 + 1, '▸', mark);
            }
        }
        canvas
    }
}

impl Game for Memory {
    fn schedule(&self) -> Schedule {
        Schedule::Frame
    }

    fn update(&mut self, dt: Duration) {
        let Some(left) = self.check_in else {
            return;
        };
        match left.checked_sub(dt) {
            Some(rest) if !rest.is_zero() => self.check_in = Some(rest),
            _ => {
                self.check_in = None;
                self.check_match();
            }
        }
    }

    fn handle_input(&mut self, intent: Intent) {
        if self.won() {
            if matches!(intent, Intent::Confirm | Intent::Action) {
                self.reset();
            }
            return;
        }
        match intent {
            Intent::Left => self.move_cursor(0, -1),
            Intent::Right => self.move_cursor(0, 1),
            Intent::Up => self.move_cursor(-1, 0),
            Intent::Down => self.move_cursor(1, 0),
            Intent::Action | Intent::Confirm => {
                let (r, c) = self.cursor;
                self.flip(r, c);
            }
            Intent::Click { column, row } => {
                if let Some((r, c)) = cell_at(self.board_area, CELL_W, CELL_H, SIDE, SIDE, column, row) {
                    self.cursor = (r, c);
                    self.flip(r, c);
                }
            }
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = widgets::game_block("🃏 Memory", Color::Rgb(236, 72, 153));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let (status_area, field, help_area) = widgets::game_layout(inner);

        let best = self.best.value().map_or("-".to_string(), |b| b.to_string());
        let status = widgets::status_line(vec![
            widgets::score_span("Moves", self.moves),
            widgets::info_span(format!("Matched {}/{}", self.matched, PAIRS), Color::Green),
            widgets::best_span(best),
        ]);
        frame.render_widget(Paragraph::new(status), status_area);

        self.board_area = widgets::centered(field, CELL_W * SIDE as u16, CELL_H * SIDE as u16);
        frame.render_widget(Paragraph::new(self.render_board().into_lines()), self.board_area);

        let help = if self.won() {
            widgets::banner_line("🎉 YOU WIN!", Color::Green, &format!("Solved in {} moves │ ENTER new game", self.moves))
        } else {
            widgets::help_line(&[("←↑↓→", "Move"), ("SPACE/Click", "Flip"), ("R", "Restart"), ("Esc", "Menu")])
        };
        frame.render_widget(Paragraph::new(help), help_area);
    }

    fn stop(&mut self) {
        self.check_in = None;
    }

    fn reset(&mut self) {
        self.cards = shuffled_deck(&mut self.rng);
        self.face_up.clear();
        self.check_in = None;
        self.matched = 0;
        self.moves = 0;
        self.cursor = (0, 0);
    }

    fn score(&self) -> u32 {
        self.moves
    }

    fn best(&self) -> Option<u32> {
        self.best.value()
    }

    fn is_game_over(&self) -> bool {
        self.won()
    }
}
