pub mod breakout;
pub mod car_racing;
pub mod connect4;
pub mod dino;
pub mod flappy;
pub mod game2048;
pub mod memory;
pub mod minesweeper;
pub mod pong;
pub mod simon;
pub mod snake;
pub mod space_invaders;
pub mod tetris;
pub mod tictactoe;
pub mod whack_a_mole;
pub mod wordle;

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::prelude::*;

use crate::clock::Schedule;
use crate::config::MinesweeperConfig;
use crate::input::Intent;
use crate::store::SharedStore;

/// Lifecycle every game instance follows.
///
/// The host calls `start` once, then `update` as the game's `schedule`
/// dictates, `handle_input` per intent and `render` per frame, and finally
/// `stop` before the instance is dropped. `stop` may come at any point and
/// any number of times.
pub trait Game {
    fn schedule(&self) -> Schedule;
    fn start(&mut self) {}
    fn update(&mut self, _dt: Duration) {}
    fn handle_input(&mut self, intent: Intent);
    fn render(&mut self, frame: &mut Frame, area: Rect);
    fn stop(&mut self);
    fn reset(&mut self);
    fn score(&self) -> u32;
    fn best(&self) -> Option<u32>;
    fn is_game_over(&self) -> bool;
    /// Letters are input for this game rather than commands.
    fn wants_text(&self) -> bool {
        false
    }
}

/// What a game needs from the host at construction.
#[derive(Clone)]
pub struct GameContext {
    pub store: SharedStore,
    pub seed: Option<u64>,
    pub minesweeper: MinesweeperConfig,
}

impl GameContext {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            seed: None,
            minesweeper: MinesweeperConfig::default(),
        }
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameKind {
    TicTacToe,
    Snake,
    CarRacing,
    Pong,
    Memory,
    Breakout,
    Tetris,
    Minesweeper,
    Game2048,
    FlappyBird,
    SpaceInvaders,
    Wordle,
    Dino,
    ConnectFour,
    Simon,
    WhackAMole,
}

impl GameKind {
    pub const ALL: [GameKind; 16] = [
        GameKind::TicTacToe,
        GameKind::Snake,
        GameKind::CarRacing,
        GameKind::Pong,
        GameKind::Memory,
        GameKind::Breakout,
        GameKind::Tetris,
        GameKind::Minesweeper,
        GameKind::Game2048,
        GameKind::FlappyBird,
        GameKind::SpaceInvaders,
        GameKind::Wordle,
        GameKind::Dino,
        GameKind::ConnectFour,
        GameKind::Simon,
        GameKind::WhackAMole,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            GameKind::TicTacToe => "Tic-Tac-Toe",
            GameKind::Snake => "Snake",
            GameKind::CarRacing => "Car Racing",
            GameKind::Pong => "Pong",
            GameKind::Memory => "Memory",
            GameKind::Breakout => "Breakout",
            GameKind::Tetris => "Tetris",
            GameKind::Minesweeper => "Minesweeper",
            GameKind::Game2048 => "2048",
            GameKind::FlappyBird => "Flappy Bird",
            GameKind::SpaceInvaders => "Space Invaders",
            GameKind::Wordle => "Word Guess",
            GameKind::Dino => "Dino Runner",
            GameKind::ConnectFour => "Connect Four",
            GameKind::Simon => "Simon Says",
            GameKind::WhackAMole => "Whack-a-Mole",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            GameKind::TicTacToe => "❌",
            GameKind::Snake => "🐍",
            GameKind::CarRacing => "🏎",
            GameKind::Pong => "🏓",
            GameKind::Memory => "🃏",
            GameKind::Breakout => "🧱",
            GameKind::Tetris => "🟪",
            GameKind::Minesweeper => "💣",
            GameKind::Game2048 => "🔢",
            GameKind::FlappyBird => "🐦",
            GameKind::SpaceInvaders => "👾",
            GameKind::Wordle => "📝",
            GameKind::Dino => "🦖",
            GameKind::ConnectFour => "🔴",
            GameKind::Simon => "🎨",
            GameKind::WhackAMole => "🔨",
        }
    }

    pub fn blurb(&self) -> &'static str {
        match self {
            GameKind::TicTacToe => "Three in a row,\ntwo players",
            GameKind::Snake => "Eat, grow, and\ndon't bite yourself",
            GameKind::CarRacing => "Dodge traffic\nacross three lanes",
            GameKind::Pong => "Keep the ball\nin play",
            GameKind::Memory => "Find all the\nfruit pairs",
            GameKind::Breakout => "Smash every\nbrick",
            GameKind::Tetris => "Stack and clear\nlines",
            GameKind::Minesweeper => "Clear the field\nwithout a boom",
            GameKind::Game2048 => "Merge tiles\nto 2048",
            GameKind::FlappyBird => "Flap through\nthe pipes",
            GameKind::SpaceInvaders => "Defend against\nthe invaders",
            GameKind::Wordle => "Guess the word\nin six tries",
            GameKind::Dino => "Jump the cacti,\ndodge the birds",
            GameKind::ConnectFour => "Four in a row,\ntwo players",
            GameKind::Simon => "Repeat the\ncolour sequence",
            GameKind::WhackAMole => "30 seconds of\nmole bonking",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            GameKind::TicTacToe => Color::Rgb(99, 102, 241),
            GameKind::Snake => Color::Rgb(74, 222, 128),
            GameKind::CarRacing => Color::Rgb(59, 130, 246),
            GameKind::Pong => Color::Rgb(226, 232, 240),
            GameKind::Memory => Color::Rgb(244, 114, 182),
            GameKind::Breakout => Color::Rgb(239, 68, 68),
            GameKind::Tetris => Color::Rgb(156, 39, 176),
            GameKind::Minesweeper => Color::Rgb(148, 163, 184),
            GameKind::Game2048 => Color::Rgb(237, 194, 46),
            GameKind::FlappyBird => Color::Rgb(255, 215, 0),
            GameKind::SpaceInvaders => Color::Rgb(0, 255, 0),
            GameKind::Wordle => Color::Rgb(106, 170, 100),
            GameKind::Dino => Color::Rgb(200, 120, 255),
            GameKind::ConnectFour => Color::Rgb(234, 179, 8),
            GameKind::Simon => Color::Rgb(139, 92, 246),
            GameKind::WhackAMole => Color::Rgb(180, 120, 60),
        }
    }

    /// Name used on the command line (`--game`).
    pub fn slug(&self) -> &'static str {
        match self {
            GameKind::TicTacToe => "tictactoe",
            GameKind::Snake => "snake",
            GameKind::CarRacing => "car",
            GameKind::Pong => "pong",
            GameKind::Memory => "memory",
            GameKind::Breakout => "breakout",
            GameKind::Tetris => "tetris",
            GameKind::Minesweeper => "minesweeper",
            GameKind::Game2048 => "2048",
            GameKind::FlappyBird => "flappybird",
            GameKind::SpaceInvaders => "spaceinvaders",
            GameKind::Wordle => "wordle",
            GameKind::Dino => "dino",
            GameKind::ConnectFour => "connect4",
            GameKind::Simon => "simon",
            GameKind::WhackAMole => "whackamole",
        }
    }

    pub fn from_slug(slug: &str) -> Option<GameKind> {
        let slug = slug.to_ascii_lowercase();
        Self::ALL.into_iter().find(|k| k.slug() == slug)
    }

    /// Persistence key of the game's best score. Hot-seat games have none.
    pub fn score_key(&self) -> Option<&'static str> {
        Some(match self {
            GameKind::TicTacToe | GameKind::ConnectFour => return None,
            GameKind::Snake => "snakeBest",
            GameKind::CarRacing => "carBest",
            GameKind::Pong => "pongBest",
            GameKind::Memory => "memoryBest",
            GameKind::Breakout => "breakoutBest",
            GameKind::Tetris => "tetrisBest",
            GameKind::Minesweeper => "minesweeperBest",
            GameKind::Game2048 => "best2048",
            GameKind::FlappyBird => "flappyBest",
            GameKind::SpaceInvaders => "spaceinvadersBest",
            GameKind::Wordle => "wordleBest",
            GameKind::Dino => "dinoHigh",
            GameKind::Simon => "simonHigh",
            GameKind::WhackAMole => "moleHigh",
        })
    }

    pub fn create(&self, ctx: &GameContext) -> Box<dyn Game> {
        match self {
            GameKind::TicTacToe => Box::new(tictactoe::TicTacToe::new()),
            GameKind::Snake => Box::new(snake::Snake::new(ctx)),
            GameKind::CarRacing => Box::new(car_racing::CarRacing::new(ctx)),
            GameKind::Pong => Box::new(pong::Pong::new(ctx)),
            GameKind::Memory => Box::new(memory::Memory::new(ctx)),
            GameKind::Breakout => Box::new(breakout::Breakout::new(ctx)),
            GameKind::Tetris => Box::new(tetris::Tetris::new(ctx)),
            GameKind::Minesweeper => Box::new(minesweeper::Minesweeper::new(ctx)),
            GameKind::Game2048 => Box::new(game2048::Game2048::new(ctx)),
            GameKind::FlappyBird => Box::new(flappy::FlappyBird::new(ctx)),
            GameKind::SpaceInvaders => Box::new(space_invaders::SpaceInvaders::new(ctx)),
            GameKind::Wordle => Box::new(wordle::Wordle::new(ctx)),
            GameKind::Dino => Box::new(dino::Dino::new(ctx)),
            GameKind::ConnectFour => Box::new(connect4::ConnectFour::new()),
            GameKind::Simon => Box::new(simon::Simon::new(ctx)),
            GameKind::WhackAMole => Box::new(whack_a_mole::WhackAMole::new(ctx)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn slugs_round_trip() {
        for kind in GameKind::ALL {
            assert_eq!(GameKind::from_slug(kind.slug()), Some(kind));
        }
        assert_eq!(GameKind::from_slug("nope"), None);
    }

    #[test]
    fn score_keys_are_unique() {
        let mut keys: Vec<_> = GameKind::ALL.iter().filter_map(|k| k.score_key()).collect();
        let n = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), n);
    }

    #[test]
    fn every_game_survives_a_double_stop() {
        let mut ctx = GameContext::new(MemoryStore::shared());
        ctx.seed = Some(1);
        for kind in GameKind::ALL {
            let mut game = kind.create(&ctx);
            game.stop();
            game.start();
            game.update(Duration::from_millis(16));
            game.stop();
            game.stop();
        }
    }

    #[test]
    fn every_game_starts_with_zero_score() {
        let mut ctx = GameContext::new(MemoryStore::shared());
        ctx.seed = Some(3);
        for kind in GameKind::ALL {
            let game = kind.create(&ctx);
            assert_eq!(game.score(), 0, "{}", kind.title());
            assert!(!game.is_game_over(), "{}", kind.title());
        }
    }
}
