use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::clock::Schedule;
use crate::games::{Game, GameContext};
use crate::input::Intent;
use crate::store::{BestScore, Order};
use crate::ui::widgets::{self, FIELD_BG};

pub const WORD_LEN: usize = 5;
pub const MAX_GUESSES: usize = 6;

pub const WORDS: [&str; 30] = [
    "APPLE", "BRAIN", "CRANE", "DREAM", "EARTH", "FLAME", "GRAPE", "HOUSE", "IVORY", "JOLLY",
    "KARMA", "LEMON", "MAGIC", "NOBLE", "OCEAN", "PIANO", "QUEST", "ROVER", "STORM", "TIGER",
    "UNITY", "VIVID", "WITCH", "XENON", "YOUTH", "ZEBRA", "BLOCK", "CHASE", "DANCE", "EAGLE",
];

const KEY_ROWS: [&str; 3] = ["QWERTYUIOP", "ASDFGHJKL", "ZXCVBNM"];
const INTRO: &str = "Guess the 5-letter word!";

/// Ordered so that `max` is the upgrade rule for the keyboard summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LetterState {
    Absent,
    Present,
    Correct,
}

impl LetterState {
    fn color(self) -> Color {
        match self {
            LetterState::Correct => Color::Rgb(106, 170, 100),
            LetterState::Present => Color::Rgb(201, 180, 88),
            LetterState::Absent => Color::Rgb(58, 58, 60),
        }
    }
}

/// Scores every letter of `guess` against `target`.
///
/// A letter that is not an exact match is `Present` only while the target
/// still has an unaccounted copy of it: exact matches of that letter anywhere
/// in the guess, plus earlier non-exact copies, must stay below the target's
/// count.
pub fn score_guess(guess: &[u8; WORD_LEN], target: &[u8; WORD_LEN]) -> [LetterState; WORD_LEN] {
    let mut states = [LetterState::Absent; WORD_LEN];
    for (i, &letter) in guess.iter().enumerate() {
        if target[i] == letter {
            states[i] = LetterState::Correct;
            continue;
        }
        let in_target = target.iter().filter(|&&t| t == letter).count();
        let exact = (0..WORD_LEN).filter(|&j| guess[j] == letter && target[j] == letter).count();
        let earlier = (0..i).filter(|&j| guess[j] == letter && target[j] != letter).count();
        if in_target > 0 && earlier + exact < in_target {
            states[i] = LetterState::Present;
        }
    }
    states
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KeyCap {
    Letter(char),
    Enter,
    Back,
}

pub struct Wordle {
    target: [u8; WORD_LEN],
    guesses: Vec<([u8; WORD_LEN], [LetterState; WORD_LEN])>,
    current: String,
    key_states: HashMap<char, LetterState>,
    message: String,
    won: bool,
    over: bool,
    best: BestScore,
    rng: StdRng,
    key_hits: Vec<(Rect, KeyCap)>,
}

impl Wordle {
    pub fn new(ctx: &GameContext) -> Self {
        let mut rng = ctx.rng();
        let target = Self::pick(&mut rng);
        Self {
            target,
            guesses: Vec::new(),
            current: String::new(),
            key_states: HashMap::new(),
            message: INTRO.to_string(),
            won: false,
            over: false,
            best: BestScore::load(ctx.store.clone(), "wordleBest", Order::LowerIsBetter),
            rng,
            key_hits: Vec::new(),
        }
    }

    fn pick(rng: &mut StdRng) -> [u8; WORD_LEN] {
        let word = WORDS.choose(rng).copied().unwrap_or("CRANE");
        let mut target = [0u8; WORD_LEN];
        target.copy_from_slice(word.as_bytes());
        target
    }

    #[cfg(test)]
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn key_state(&self, letter: char) -> Option<LetterState> {
        self.key_states.get(&letter).copied()
    }

    pub fn type_letter(&mut self, letter: char) {
        if self.over || !letter.is_ascii_alphabetic() || self.current.len() >= WORD_LEN {
            return;
        }
        self.current.push(letter.to_ascii_uppercase());
    }

    pub fn erase(&mut self) {
        if !self.over {
            self.current.pop();
        }
    }

    /// Scores the typed row. Anything but five letters only sets a message.
    pub fn submit(&mut self) {
        if self.over {
            return;
        }
        let Ok(guess) = <[u8; WORD_LEN]>::try_from(self.current.as_bytes()) else {
            self.message = "Word must be 5 letters!".to_string();
            return;
        };
        let states = score_guess(&guess, &self.target);
        for (&b, &state) in guess.iter().zip(states.iter()) {
            let entry = self.key_states.entry(char::from(b)).or_insert(state);
            *entry = (*entry).max(state);
        }
        self.guesses.push((guess, states));
        self.current.clear();

        if guess == self.target {
            self.won = true;
            self.over = true;
            self.message = "🎉 Congratulations! You won!".to_string();
            self.best.submit(self.guesses.len() as u32);
            tracing::info!(guesses = self.guesses.len(), "word guessed");
        } else if self.guesses.len() >= MAX_GUESSES {
            self.over = true;
            self.message = format!("Game Over! The word was {}", String::from_utf8_lossy(&self.target));
        } else {
            self.message = INTRO.to_string();
        }
    }

    fn press(&mut self, cap: KeyCap) {
        match cap {
            KeyCap::Letter(c) => self.type_letter(c),
            KeyCap::Enter => self.submit(),
            KeyCap::Back => self.erase(),
        }
    }

    fn grid_lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for i in 0..MAX_GUESSES {
            let mut spans = Vec::new();
            for j in 0..WORD_LEN {
                let (ch, bg) = if let Some((guess, states)) = self.guesses.get(i) {
                    (char::from(guess[j]), states[j].color())
                } else if i == self.guesses.len() {
                    (self.current.chars().nth(j).unwrap_or(' '), Color::Rgb(30, 30, 40))
                } else {
                    (' ', Color::Rgb(30, 30, 40))
                };
                spans.push(Span::styled(
                    format!(" {ch} "),
                    Style::default().fg(Color::White).bg(bg).add_modifier(Modifier::BOLD),
                ));
                spans.push(Span::styled(" ", Style::default().bg(FIELD_BG)));
            }
            lines.push(Line::from(spans));
            lines.push(Line::from(""));
        }
        lines
    }

    /// Draws the on-screen keyboard and records each key's rect for clicks.
    fn render_keyboard(&mut self, frame: &mut Frame, area: Rect) {
        self.key_hits.clear();
        let mut rows: Vec<Vec<(KeyCap, String)>> = KEY_ROWS
            .iter()
            .map(|row| row.chars().map(|c| (KeyCap::Letter(c), format!(" {c} "))).collect())
            .collect();
        rows[2].insert(0, (KeyCap::Enter, " ENTER ".to_string()));
        rows[2].push((KeyCap::Back, " ⌫ ".to_string()));

        for (i, row) in rows.into_iter().enumerate() {
            let y = area.y + i as u16 * 2;
            if y >= area.y + area.height {
                break;
            }
            let width: u16 = row.iter().map(|(_, label)| label.chars().count() as u16 + 1).sum();
            let mut x = area.x + area.width.saturating_sub(width) / 2;
            let mut spans = Vec::new();
            for (cap, label) in row {
                let w = label.chars().count() as u16;
                let bg = match cap {
                    KeyCap::Letter(c) => self.key_state(c).map_or(Color::Rgb(129, 131, 132), LetterState::color),
                    _ => Color::Rgb(100, 100, 110),
                };
                spans.push(Span::styled(label, Style::default().fg(Color::White).bg(bg).add_modifier(Modifier::BOLD)));
                spans.push(Span::raw(" "));
                self.key_hits.push((Rect::new(x, y, w, 1), cap));
                x += w + 1;
            }
            let row_area = Rect::new(area.x, y, area.width, 1);
            frame.render_widget(Paragraph::new(Line::from(spans)).alignment(Alignment::Center), row_area);
        }
    }
}

impl Game for Wordle {
    fn schedule(&self) -> Schedule {
        Schedule::TurnBased
    }

    fn handle_input(&mut self, intent: Intent) {
        match intent {
            Intent::Confirm if self.over => self.reset(),
            Intent::Confirm => self.submit(),
            Intent::Erase => self.erase(),
            Intent::Letter(c) => self.type_letter(c),
            Intent::Click { column, row } => {
                let hit = self
                    .key_hits
                    .iter()
                    .find(|(rect, _)| rect.contains(Position::new(column, row)))
                    .map(|&(_, cap)| cap);
                if let Some(cap) = hit {
                    self.press(cap);
                }
            }
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = widgets::game_block("📝 Word Guess", LetterState::Correct.color());
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let (status_area, field, help_area) = widgets::game_layout(inner);

        let best = self.best.value().map_or("-".to_string(), |g| format!("{g} guesses"));
        let status = widgets::status_line(vec![
            widgets::info_span(self.message.clone(), if self.won { Color::Green } else { Color::White }),
            widgets::info_span(format!("Guess {}/{}", (self.guesses.len() + 1).min(MAX_GUESSES), MAX_GUESSES), Color::Yellow),
            widgets::best_span(best),
        ]);
        frame.render_widget(Paragraph::new(status), status_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(MAX_GUESSES as u16 * 2), Constraint::Min(5)])
            .split(field);
        let grid_area = widgets::centered(chunks[0], WORD_LEN as u16 * 4, MAX_GUESSES as u16 * 2);
        frame.render_widget(Paragraph::new(self.grid_lines()), grid_area);
        self.render_keyboard(frame, chunks[1]);

        let help = if self.over {
            widgets::banner_line(if self.won { "SOLVED" } else { "GAME OVER" }, Color::Yellow, "ENTER new word │ Esc menu")
        } else {
            widgets::help_line(&[("A-Z", "Type"), ("⌫", "Erase"), ("ENTER", "Guess"), ("Ctrl+R", "New word"), ("Esc", "Menu")])
        };
        frame.render_widget(Paragraph::new(help), help_area);
    }

    fn stop(&mut self) {}

    fn reset(&mut self) {
        self.target = Self::pick(&mut self.rng);
        self.guesses.clear();
        self.current.clear();
        self.key_states.clear();
        self.message = INTRO.to_string();
        self.won = false;
        self.over = false;
    }

    /// Guesses used so far.
    fn score(&self) -> u32 {
        self.guesses.len() as u32
    }

    fn best(&self) -> Option<u32> {
        self.best.value()
    }

    fn is_game_over(&self) -> bool {
        self.over
    }

    fn wants_text(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use super::LetterState::*;

    fn word(s: &str) -> [u8; WORD_LEN] {
        s.as_bytes().try_into().unwrap()
    }

    fn wordle(target: &str) -> Wordle {
        let mut ctx = GameContext::new(MemoryStore::shared());
        ctx.seed = Some(2);
        let mut game = Wordle::new(&ctx);
        game.target = word(target);
        game
    }

    fn guess(game: &mut Wordle, s: &str) {
        for c in s.chars() {
            game.type_letter(c);
        }
        game.submit();
    }

    #[test]
    fn duplicate_letters_never_exceed_the_target_count() {
        let states = score_guess(&word("SPEED"), &word("ERASE"));
        assert_eq!(states, [Present, Absent, Present, Present, Absent]);
        let marked_e = states.iter().enumerate().filter(|&(i, s)| b"SPEED"[i] == b'E' && *s != Absent).count();
        assert_eq!(marked_e, 2);
    }

    #[test]
    fn exact_matches_use_up_copies_first() {
        assert_eq!(score_guess(&word("EEEEE"), &word("ERASE")), [Correct, Absent, Absent, Absent, Correct]);
        assert_eq!(score_guess(&word("LEVEL"), &word("HELLO")), [Present, Correct, Absent, Absent, Present]);
    }

    #[test]
    fn exact_word_is_all_correct() {
        assert_eq!(score_guess(&word("CRANE"), &word("CRANE")), [Correct; WORD_LEN]);
    }

    #[test]
    fn short_guess_only_sets_a_message() {
        let mut game = wordle("CRANE");
        guess(&mut game, "CRA");
        assert_eq!(game.score(), 0);
        assert_eq!(game.message(), "Word must be 5 letters!");
        assert_eq!(game.current, "CRA");
    }

    #[test]
    fn typing_stops_at_five_letters() {
        let mut game = wordle("CRANE");
        for c in "ABCDEFG".chars() {
            game.type_letter(c);
        }
        assert_eq!(game.current, "ABCDE");
        game.erase();
        assert_eq!(game.current, "ABCD");
    }

    #[test]
    fn keyboard_states_only_upgrade() {
        let mut game = wordle("EARTH");
        guess(&mut game, "HOUSE");
        assert_eq!(game.key_state('H'), Some(Present));
        guess(&mut game, "DEPTH");
        assert_eq!(game.key_state('H'), Some(Correct));
        guess(&mut game, "HOUSE");
        assert_eq!(game.key_state('H'), Some(Correct));
        assert_eq!(game.key_state('O'), Some(Absent));
    }

    #[test]
    fn win_records_fewest_guesses() {
        let store = MemoryStore::shared();
        let mut ctx = GameContext::new(store.clone());
        ctx.seed = Some(2);
        let mut game = Wordle::new(&ctx);
        game.target = word("OCEAN");
        guess(&mut game, "CRANE");
        guess(&mut game, "OCEAN");
        assert!(game.is_game_over());
        assert_eq!(game.best(), Some(2));
        guess(&mut game, "APPLE");
        assert_eq!(game.score(), 2);
    }

    #[test]
    fn six_misses_reveal_the_word() {
        let mut game = wordle("OCEAN");
        for _ in 0..MAX_GUESSES {
            guess(&mut game, "CRANE");
        }
        assert!(game.is_game_over());
        assert!(game.message().contains("OCEAN"));
    }

    #[test]
    fn every_word_is_five_ascii_capitals() {
        for w in WORDS {
            assert_eq!(w.len(), WORD_LEN);
            assert!(w.bytes().all(|b| b.is_ascii_uppercase()));
        }
    }
}
