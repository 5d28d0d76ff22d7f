use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, MouseEvent};
use tokio::sync::{mpsc, watch};

use crate::auth::session::SessionInfo;
use crate::error::{FetchError, Result};
use crate::graphql::query::ProfileNodeConnection;
use crate::tree::node::FolderKey;

/// Application events.
#[derive(Debug)]
pub enum Event {
    /// A key press event.
    Key(KeyEvent),
    /// A mouse event.
    Mouse(MouseEvent),
    /// A periodic tick for rendering.
    Tick,
    /// Terminal resize event.
    #[allow(dead_code)]
    Resize(u16, u16),
    /// The page cache changed for a watched folder.
    CacheUpdate {
        key: FolderKey,
        page: ProfileNodeConnection,
    },
    /// A children fetch for `key` finished.
    FetchComplete {
        key: FolderKey,
        result: std::result::Result<(), FetchError>,
    },
    /// A sign-in attempt finished.
    SignInComplete(std::result::Result<(), FetchError>),
    /// The session appeared or went away (including forced sign-outs).
    SessionChanged { logged_in: bool },
}

/// Async event handler that polls crossterm events and forwards them via a channel.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    /// Create a new EventHandler with the given tick rate.
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();

        tokio::spawn(async move {
            loop {
                if event::poll(tick_rate).unwrap_or(false) {
                    match event::read() {
                        Ok(CrosstermEvent::Key(key)) => {
                            if event_tx.send(Event::Key(key)).is_err() {
                                break;
                            }
                        }
                        Ok(CrosstermEvent::Mouse(mouse)) => {
                            if event_tx.send(Event::Mouse(mouse)).is_err() {
                                break;
                            }
                        }
                        Ok(CrosstermEvent::Resize(w, h)) => {
                            if event_tx.send(Event::Resize(w, h)).is_err() {
                                break;
                            }
                        }
                        _ => {}
                    }
                } else if event_tx.send(Event::Tick).is_err() {
                    break;
                }
            }
        });

        Self { rx, tx }
    }

    /// Get a sender clone for background tasks to report back on.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Receive the next event (blocks until available).
    pub async fn next(&mut self) -> Result<Event> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| crate::error::AppError::Terminal("Event channel closed".into()))
    }
}

/// Forward session transitions into the event loop.
///
/// Only edges between signed-in and signed-out are reported; token
/// refreshes are not.
pub fn forward_session_changes(
    mut session_rx: watch::Receiver<Option<SessionInfo>>,
    event_tx: mpsc::UnboundedSender<Event>,
) {
    tokio::spawn(async move {
        let mut logged_in = session_rx.borrow_and_update().is_some();
        while session_rx.changed().await.is_ok() {
            let now = session_rx.borrow_and_update().is_some();
            if now != logged_in {
                logged_in = now;
                if event_tx.send(Event::SessionChanged { logged_in }).is_err() {
                    break;
                }
            }
        }
    });
}
