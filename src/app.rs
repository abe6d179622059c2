use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent};
use ratatui::layout::{Position, Rect};

use crate::clock::GameClock;
use crate::games::{Game, GameContext, GameKind};
use crate::input::{self, Intent};

/// Tiles per row on the home screen.
pub const TILE_COLS: usize = 4;

/// The running game and the clock that drives it.
pub struct Session {
    pub kind: GameKind,
    pub game: Box<dyn Game>,
    pub clock: GameClock,
}

impl Session {
    fn launch(kind: GameKind, ctx: &GameContext, now: Instant) -> Self {
        let mut game = kind.create(ctx);
        let mut clock = GameClock::new(game.schedule());
        game.start();
        clock.start(now);
        Self { kind, game, clock }
    }

    /// Cancels the clock before the game is told to stop, so nothing can
    /// step it afterwards.
    fn stop(&mut self) {
        self.clock.stop();
        self.game.stop();
    }
}

pub struct App {
    pub should_quit: bool,
    pub selected: usize,
    pub show_scores: bool,
    /// Tile rectangles from the last home render, for mouse hits.
    pub tile_areas: Vec<(Rect, GameKind)>,
    ctx: GameContext,
    session: Option<Session>,
}

impl App {
    pub fn new(ctx: GameContext) -> Self {
        Self {
            should_quit: false,
            selected: 0,
            show_scores: false,
            tile_areas: Vec::new(),
            ctx,
            session: None,
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    /// Persisted best for `kind`, read straight from the store.
    pub fn stored_best(&self, kind: GameKind) -> Option<u32> {
        let key = kind.score_key()?;
        self.ctx.store.get(key).and_then(|v| v.trim().parse().ok())
    }

    /// Replaces any running session with a fresh instance of `kind`.
    pub fn launch(&mut self, kind: GameKind, now: Instant) {
        self.exit_game();
        tracing::info!(game = kind.slug(), "launching");
        self.session = Some(Session::launch(kind, &self.ctx, now));
        if let Some(i) = GameKind::ALL.iter().position(|k| *k == kind) {
            self.selected = i;
        }
    }

    pub fn exit_game(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.stop();
            tracing::info!(game = session.kind.slug(), score = session.game.score(), "stopped");
        }
    }

    fn restart(&mut self, now: Instant) {
        if let Some(kind) = self.session.as_ref().map(|s| s.kind) {
            tracing::info!(game = kind.slug(), "restart");
            self.launch(kind, now);
        }
    }

    pub fn on_tick(&mut self, now: Instant) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        for dt in session.clock.advance(now) {
            session.game.update(dt);
        }
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Instant) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        match self.session.as_ref() {
            Some(session) => {
                let text = session.game.wants_text();
                if let Some(intent) = input::route_key(key, text) {
                    self.on_intent(intent, now);
                }
            }
            None if key.kind != KeyEventKind::Release => self.on_home_key(key, now),
            None => {}
        }
    }

    pub fn on_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        let Some(intent) = input::route_mouse(mouse) else {
            return;
        };
        if self.session.is_some() {
            self.on_intent(intent, now);
            return;
        }
        if let Intent::Click { column, row } = intent {
            let hit = self.tile_areas.iter().find(|(r, _)| r.contains(Position::new(column, row)));
            if let Some(&(_, kind)) = hit {
                self.launch(kind, now);
            }
        }
    }

    fn on_intent(&mut self, intent: Intent, now: Instant) {
        match intent {
            Intent::Back => self.exit_game(),
            Intent::Restart => self.restart(now),
            other => {
                if let Some(session) = self.session.as_mut() {
                    session.game.handle_input(other);
                }
            }
        }
    }

    fn on_home_key(&mut self, key: KeyEvent, now: Instant) {
        let n = GameKind::ALL.len();
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Char('h') | KeyCode::Char('H') => self.show_scores = !self.show_scores,
            KeyCode::Esc if self.show_scores => self.show_scores = false,
            KeyCode::Right => self.selected = (self.selected + 1) % n,
            KeyCode::Left => self.selected = (self.selected + n - 1) % n,
            KeyCode::Down => self.selected = (self.selected + TILE_COLS) % n,
            KeyCode::Up => self.selected = (self.selected + n - TILE_COLS) % n,
            KeyCode::Enter | KeyCode::Char(' ') => {
                let kind = GameKind::ALL[self.selected];
                self.launch(kind, now);
            }
            _ => {}
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.exit_game();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::store::MemoryStore;

    fn app() -> App {
        let mut ctx = GameContext::new(MemoryStore::shared());
        ctx.seed = Some(2);
        App::new(ctx)
    }

    fn press(app: &mut App, code: KeyCode, now: Instant) {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE), now);
    }

    #[test]
    fn home_selection_wraps_across_the_grid() {
        let mut app = app();
        let now = Instant::now();
        press(&mut app, KeyCode::Left, now);
        assert_eq!(app.selected, GameKind::ALL.len() - 1);
        press(&mut app, KeyCode::Down, now);
        assert_eq!(app.selected, TILE_COLS - 1);
        press(&mut app, KeyCode::Up, now);
        assert_eq!(app.selected, GameKind::ALL.len() - 1);
    }

    #[test]
    fn enter_launches_and_escape_returns_home() {
        let mut app = app();
        let now = Instant::now();
        press(&mut app, KeyCode::Right, now);
        press(&mut app, KeyCode::Enter, now);
        assert_eq!(app.session().map(|s| s.kind), Some(GameKind::Snake));
        assert!(app.session().is_some_and(|s| s.clock.is_running()));
        press(&mut app, KeyCode::Esc, now);
        assert!(app.session().is_none());
        assert!(!app.should_quit);
    }

    #[test]
    fn q_quits_only_from_home() {
        let mut app = app();
        let now = Instant::now();
        app.launch(GameKind::Wordle, now);
        press(&mut app, KeyCode::Char('q'), now);
        assert!(!app.should_quit);
        app.exit_game();
        press(&mut app, KeyCode::Char('q'), now);
        assert!(app.should_quit);
    }

    #[test]
    fn ctrl_c_quits_from_a_game() {
        let mut app = app();
        let now = Instant::now();
        app.launch(GameKind::Tetris, now);
        app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), now);
        assert!(app.should_quit);
    }

    #[test]
    fn ticks_step_a_fixed_game() {
        let mut app = app();
        let start = Instant::now();
        app.launch(GameKind::Snake, start);
        press(&mut app, KeyCode::Right, start);
        app.on_tick(start + Duration::from_millis(320));
        let session = app.session().map(|s| s.clock.pending());
        assert_eq!(session, Some(Duration::from_millis(20)));
    }

    #[test]
    fn restart_replaces_the_instance() {
        let mut app = app();
        let now = Instant::now();
        app.launch(GameKind::TicTacToe, now);
        press(&mut app, KeyCode::Char(' '), now);
        press(&mut app, KeyCode::Char('r'), now);
        let session = app.session().map(|s| (s.kind, s.game.is_game_over()));
        assert_eq!(session, Some((GameKind::TicTacToe, false)));
    }

    #[test]
    fn launching_another_game_stops_the_first() {
        let mut app = app();
        let now = Instant::now();
        app.launch(GameKind::Pong, now);
        app.launch(GameKind::Dino, now);
        assert_eq!(app.session().map(|s| s.kind), Some(GameKind::Dino));
        assert_eq!(app.selected, 12);
    }

    #[test]
    fn home_reads_bests_from_the_shared_store() {
        let app = app();
        app.ctx.store.set("snakeBest", " 42\n");
        assert_eq!(app.stored_best(GameKind::Snake), Some(42));
        app.ctx.store.set("snakeBest", "junk");
        assert_eq!(app.stored_best(GameKind::Snake), None);
        assert_eq!(app.stored_best(GameKind::TicTacToe), None);
    }
}
