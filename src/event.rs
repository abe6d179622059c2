use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, KeyEvent, MouseEvent, MouseEventKind};

pub enum Event {
    /// Press, repeat or (where the terminal reports it) release.
    Key(KeyEvent),
    Mouse(MouseEvent),
    Tick,
}

/// Reads terminal events on a background thread and emits a `Tick` whenever
/// a poll period passes quietly.
pub struct EventHandler {
    rx: mpsc::Receiver<Event>,
}

impl EventHandler {
    pub fn new(tick_rate_ms: u64) -> Self {
        let (tx, rx) = mpsc::channel();
        let tick_rate = Duration::from_millis(tick_rate_ms);

        thread::spawn(move || loop {
            let event = if event::poll(tick_rate).unwrap_or(false) {
                match event::read() {
                    Ok(event::Event::Key(key)) => Some(Event::Key(key)),
                    // moves and drags would flood the channel
                    Ok(event::Event::Mouse(mouse)) if matches!(mouse.kind, MouseEventKind::Down(_)) => {
                        Some(Event::Mouse(mouse))
                    }
                    Ok(_) => None,
                    Err(e) => {
                        tracing::warn!(error = %e, "terminal read failed");
                        None
                    }
                }
            } else {
                Some(Event::Tick)
            };
            if let Some(event) = event {
                if tx.send(event).is_err() {
                    return;
                }
            }
        });

        Self { rx }
    }

    pub fn next(&self) -> Result<Event> {
        self.rx.recv().context("event thread stopped")
    }
}
