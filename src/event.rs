use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent};

use crate::gateway::{GenerationError, GenerationRequest};

pub enum AppEvent {
    Key(KeyEvent),
    /// Bracketed paste, delivered as one string.
    Paste(String),
    Tick,
    Resize(#[allow(dead_code)] u16, #[allow(dead_code)] u16),
    /// A generation worker finished.
    Generated {
        request: GenerationRequest,
        result: Result<String, GenerationError>,
    },
}

pub struct EventHandler {
    rx: mpsc::Receiver<AppEvent>,
    tx: mpsc::Sender<AppEvent>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let input_tx = tx.clone();

        thread::spawn(move || {
            loop {
                let event = if event::poll(tick_rate).unwrap_or(false) {
                    match event::read() {
                        Ok(Event::Key(key)) => AppEvent::Key(key),
                        Ok(Event::Paste(text)) => AppEvent::Paste(text),
                        Ok(Event::Resize(w, h)) => AppEvent::Resize(w, h),
                        _ => continue,
                    }
                } else {
                    AppEvent::Tick
                };
                if input_tx.send(event).is_err() {
                    return;
                }
            }
        });

        Self { rx, tx }
    }

    /// Handle for background workers to post results into the loop.
    pub fn sender(&self) -> mpsc::Sender<AppEvent> {
        self.tx.clone()
    }

    pub fn next(&self) -> anyhow::Result<AppEvent> {
        Ok(self.rx.recv()?)
    }
}
