//! Terminal input merged with the top view's refresh timer.

use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A key press. Releases and repeats are dropped at the source.
    Key(KeyEvent),
    /// Time to poll the queries again.
    Refresh,
    /// Nothing changed in the data, but the screen must be drawn again.
    Redraw,
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    _task: tokio::task::JoinHandle<()>,
}

impl EventHandler {
    /// `refresh_every` is the polling period in wall time.
    pub fn new(refresh_every: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(pump(tx, refresh_every));
        Self { rx, _task: task }
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

fn translate(evt: CrosstermEvent) -> Option<Event> {
    match evt {
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
        CrosstermEvent::Resize(_, _) | CrosstermEvent::FocusGained => Some(Event::Redraw),
        _ => None,
    }
}

async fn pump(tx: mpsc::UnboundedSender<Event>, period: Duration) {
    let mut input = EventStream::new();
    let mut refresh = tokio::time::interval(period);
    // Missed ticks are dropped, not replayed.
    refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let event = tokio::select! {
            next = input.next() => match next {
                Some(Ok(evt)) => match translate(evt) {
                    Some(event) => event,
                    None => continue,
                },
                Some(Err(_)) | None => break,
            },
            _ = refresh.tick() => Event::Refresh,
        };
        if tx.send(event).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEventState, KeyModifiers};

    fn key(kind: KeyEventKind) -> CrosstermEvent {
        CrosstermEvent::Key(KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn only_presses_get_through() {
        assert!(matches!(translate(key(KeyEventKind::Press)), Some(Event::Key(_))));
        assert_eq!(translate(key(KeyEventKind::Release)), None);
        assert_eq!(translate(key(KeyEventKind::Repeat)), None);
    }

    #[test]
    fn resize_and_focus_redraw() {
        assert_eq!(translate(CrosstermEvent::Resize(80, 24)), Some(Event::Redraw));
        assert_eq!(translate(CrosstermEvent::FocusGained), Some(Event::Redraw));
        assert_eq!(translate(CrosstermEvent::FocusLost), None);
    }
}
