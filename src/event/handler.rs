use crossterm::event::{self, KeyEvent, KeyEventKind};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Resize,
    /// Redraw tick
    Tick,
    /// Time to re-read the installer state
    PollInstaller,
}

/// Pumps terminal input and timers from a dedicated thread into the UI loop.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    _tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration, poll_interval: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();

        std::thread::spawn(move || {
            let mut last_poll = Instant::now();
            loop {
                if last_poll.elapsed() >= poll_interval {
                    last_poll = Instant::now();
                    if event_tx.send(Event::PollInstaller).is_err() {
                        break;
                    }
                }

                if event::poll(tick_rate).unwrap_or(false) {
                    let sent = match event::read() {
                        Ok(event::Event::Key(key)) if key.kind == KeyEventKind::Press => {
                            event_tx.send(Event::Key(key))
                        }
                        Ok(event::Event::Resize(_, _)) => event_tx.send(Event::Resize),
                        _ => Ok(()),
                    };
                    if sent.is_err() {
                        break;
                    }
                } else if event_tx.send(Event::Tick).is_err() {
                    break;
                }
            }
        });

        Self { rx, _tx: tx }
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}
