use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

/// A device-independent action for the active game.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    Left,
    Right,
    Up,
    Down,
    /// Space.
    Action,
    /// Enter.
    Confirm,
    /// Backspace.
    Erase,
    Letter(char),
    Digit(u8),
    Flag,
    Pause,
    Restart,
    Back,
    /// Arrow key released (only on terminals that report releases).
    Release(Steer),
    Click { column: u16, row: u16 },
    AltClick { column: u16, row: u16 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Steer {
    Left,
    Right,
}

/// Maps a key event to an intent. With `text_mode` set, letters are always
/// delivered as `Letter` so word games can type R, P and F.
pub fn route_key(key: KeyEvent, text_mode: bool) -> Option<Intent> {
    if key.kind == KeyEventKind::Release {
        return match key.code {
            KeyCode::Left => Some(Intent::Release(Steer::Left)),
            KeyCode::Right => Some(Intent::Release(Steer::Right)),
            _ => None,
        };
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let intent = match key.code {
        KeyCode::Char('r') | KeyCode::Char('R') if ctrl => Intent::Restart,
        _ if ctrl => return None,
        KeyCode::F(5) => Intent::Restart,
        KeyCode::Left => Intent::Left,
        KeyCode::Right => Intent::Right,
        KeyCode::Up => Intent::Up,
        KeyCode::Down => Intent::Down,
        KeyCode::Char(' ') => Intent::Action,
        KeyCode::Enter => Intent::Confirm,
        KeyCode::Backspace => Intent::Erase,
        KeyCode::Esc => Intent::Back,
        KeyCode::Char(c) if c.is_ascii_digit() => Intent::Digit(c as u8 - b'0'),
        KeyCode::Char(c) if c.is_ascii_alphabetic() => {
            let c = c.to_ascii_uppercase();
            match c {
                _ if text_mode => Intent::Letter(c),
                'R' => Intent::Restart,
                'P' => Intent::Pause,
                'F' => Intent::Flag,
                // WASD-style steering used by the paddle and car games
                'A' => Intent::Left,
                'D' => Intent::Right,
                _ => Intent::Letter(c),
            }
        }
        _ => return None,
    };
    Some(intent)
}

pub fn route_mouse(mouse: MouseEvent) -> Option<Intent> {
    let (column, row) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(Intent::Click { column, row }),
        MouseEventKind::Down(MouseButton::Right) => Some(Intent::AltClick { column, row }),
        _ => None,
    }
}

/// Maps a terminal position inside `area` to a `(row, col)` cell of a board
/// drawn as `rows` x `cols` cells of `cell_w` x `cell_h` characters.
pub fn cell_at(area: Rect, cell_w: u16, cell_h: u16, rows: usize, cols: usize, column: u16, row: u16) -> Option<(usize, usize)> {
    if cell_w == 0 || cell_h == 0 || column < area.x || row < area.y {
        return None;
    }
    let c = ((column - area.x) / cell_w) as usize;
    let r = ((row - area.y) / cell_h) as usize;
    (r < rows && c < cols).then_some((r, c))
}

/// How long one arrow press keeps steering. Terminal key-repeat refreshes it
/// well within this window, so a held key reads as continuous movement.
pub const HOLD_WINDOW: Duration = Duration::from_millis(180);

/// Left/right "key held" state rebuilt from press events.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeldAxis {
    dir: i8,
    remaining: Duration,
}

impl HeldAxis {
    pub fn press(&mut self, steer: Steer) {
        self.dir = match steer {
            Steer::Left => -1,
            Steer::Right => 1,
        };
        self.remaining = HOLD_WINDOW;
    }

    pub fn release(&mut self, steer: Steer) {
        let dir = match steer {
            Steer::Left => -1,
            Steer::Right => 1,
        };
        if self.dir == dir {
            self.clear();
        }
    }

    pub fn clear(&mut self) {
        self.dir = 0;
        self.remaining = Duration::ZERO;
    }

    /// Current direction (-1, 0, 1), then ages the hold by `dt`.
    pub fn step(&mut self, dt: Duration) -> i8 {
        if self.remaining.is_zero() {
            self.dir = 0;
            return 0;
        }
        let dir = self.dir;
        self.remaining = self.remaining.saturating_sub(dt);
        dir
    }

    /// Applies a steering intent; returns `true` if it was one.
    pub fn handle(&mut self, intent: Intent) -> bool {
        match intent {
            Intent::Left => self.press(Steer::Left),
            Intent::Right => self.press(Steer::Right),
            Intent::Release(s) => self.release(s),
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn letters_become_commands_outside_text_mode() {
        assert_eq!(route_key(key(KeyCode::Char('r')), false), Some(Intent::Restart));
        assert_eq!(route_key(key(KeyCode::Char('p')), false), Some(Intent::Pause));
        assert_eq!(route_key(key(KeyCode::Char('f')), false), Some(Intent::Flag));
        assert_eq!(route_key(key(KeyCode::Char('a')), false), Some(Intent::Left));
        assert_eq!(route_key(key(KeyCode::Char('x')), false), Some(Intent::Letter('X')));
    }

    #[test]
    fn text_mode_keeps_letters() {
        assert_eq!(route_key(key(KeyCode::Char('r')), true), Some(Intent::Letter('R')));
        assert_eq!(route_key(key(KeyCode::Char('a')), true), Some(Intent::Letter('A')));
        let ctrl_r = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL);
        assert_eq!(route_key(ctrl_r, true), Some(Intent::Restart));
    }

    #[test]
    fn digits_and_specials() {
        assert_eq!(route_key(key(KeyCode::Char('7')), false), Some(Intent::Digit(7)));
        assert_eq!(route_key(key(KeyCode::Enter), true), Some(Intent::Confirm));
        assert_eq!(route_key(key(KeyCode::Backspace), true), Some(Intent::Erase));
        assert_eq!(route_key(key(KeyCode::Tab), false), None);
    }

    #[test]
    fn cell_at_maps_inside_board_only() {
        let area = Rect::new(10, 5, 12, 6);
        assert_eq!(cell_at(area, 4, 2, 3, 3, 10, 5), Some((0, 0)));
        assert_eq!(cell_at(area, 4, 2, 3, 3, 21, 10), Some((2, 2)));
        assert_eq!(cell_at(area, 4, 2, 3, 3, 9, 5), None);
        assert_eq!(cell_at(area, 4, 2, 3, 3, 22, 5), None);
    }

    #[test]
    fn held_axis_expires_without_repeat() {
        let mut axis = HeldAxis::default();
        axis.press(Steer::Right);
        assert_eq!(axis.step(Duration::from_millis(100)), 1);
        assert_eq!(axis.step(Duration::from_millis(100)), 1);
        assert_eq!(axis.step(Duration::from_millis(16)), 0);
    }

    #[test]
    fn release_only_clears_matching_direction() {
        let mut axis = HeldAxis::default();
        axis.press(Steer::Left);
        axis.release(Steer::Right);
        assert_eq!(axis.step(Duration::from_millis(16)), -1);
        axis.release(Steer::Left);
        assert_eq!(axis.step(Duration::from_millis(16)), 0);
    }
}
