//! Session task.
//!
//! Owns the session controller and serializes every mutation through one
//! select loop. Fetches run concurrently; their completions come back through
//! the same loop and are checked against the latest load ticket.

use crate::error::LoadError;
use crate::model::{Card, InfoEvent, LoadStatus, Mode, SessionEvent};
use crate::session::{LoadOutcome, LoadStart, LoadTicket, SessionController, Toggle};
use crate::source::{fetch_with_timeout, CardSource};
use anyhow::Result;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Commands emitted by UI layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    SwitchMode(Mode),
    Draw,
    Show(usize),
    ToggleSelect(usize),
    Reshuffle,
    ToggleImages,
    Quit,
}

type FetchDone = (LoadTicket, Result<Vec<Card>, LoadError>);

fn start_fetch(
    source: &Arc<dyn CardSource>,
    ticket: LoadTicket,
    timeout: Duration,
    event_tx: &UnboundedSender<SessionEvent>,
) -> BoxFuture<'static, FetchDone> {
    let _ = event_tx.send(SessionEvent::Info(InfoEvent::FetchStarted {
        key: ticket.key().to_string(),
    }));
    let source = source.clone();
    Box::pin(async move {
        let res = fetch_with_timeout(source.as_ref(), ticket.key(), timeout).await;
        (ticket, res)
    })
}

fn publish(session: &SessionController, event_tx: &UnboundedSender<SessionEvent>) {
    let _ = event_tx.send(SessionEvent::Snapshot(Box::new(session.snapshot())));
}

/// Run the session until `Quit` arrives or the command channel closes.
///
/// `initial` is entered immediately. Fetches still in flight on exit are
/// dropped. Returns the controller so callers can inspect the final state.
pub async fn run_controller(
    mut session: SessionController,
    source: Arc<dyn CardSource>,
    initial: Mode,
    event_tx: UnboundedSender<SessionEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<SessionController> {
    let timeout = session.config().fetch_timeout;
    // Overlapping loads are allowed; the ticket check in `complete_load`
    // decides which completion may touch the pool.
    let mut inflight: FuturesUnordered<BoxFuture<'static, FetchDone>> = FuturesUnordered::new();

    let start = session.switch_mode(initial);
    if let LoadStart::Fetch(ticket) = start {
        inflight.push(start_fetch(&source, ticket, timeout, &event_tx));
    }
    publish(&session, &event_tx);

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else {
                    break;
                };
                tracing::debug!(?cmd, "ui command");
                match cmd {
                    UiCommand::Quit => break,
                    UiCommand::SwitchMode(mode) => match session.switch_mode(mode) {
                        LoadStart::Cached => {
                            let key = session.config().source_for(session.mode()).to_string();
                            let _ = event_tx.send(SessionEvent::Info(InfoEvent::CacheHit { key }));
                        }
                        LoadStart::Fetch(ticket) => {
                            inflight.push(start_fetch(&source, ticket, timeout, &event_tx));
                        }
                    },
                    UiCommand::Draw => {
                        if let Some(card) = session.draw_random() {
                            let _ = event_tx.send(SessionEvent::Drawn { card });
                        }
                    }
                    UiCommand::Show(index) => {
                        session.show_card(index);
                    }
                    UiCommand::ToggleSelect(index) => {
                        if session.pick(index) == Some(Toggle::Full) {
                            let _ = event_tx.send(SessionEvent::Info(InfoEvent::SpreadFull));
                        }
                    }
                    UiCommand::Reshuffle => {
                        if session.mode().is_divination() {
                            session.reset_spread();
                        }
                    }
                    UiCommand::ToggleImages => {
                        let shown = session.toggle_images();
                        let msg = if shown { "Images shown" } else { "Images hidden" };
                        let _ = event_tx.send(SessionEvent::Info(InfoEvent::Message(msg.into())));
                    }
                }
                publish(&session, &event_tx);
            }
            Some((ticket, res)) = inflight.next(), if !inflight.is_empty() => {
                let key = ticket.key().to_string();
                match session.complete_load(ticket, res) {
                    LoadOutcome::Applied { .. } => {}
                    LoadOutcome::Failed => {
                        if let LoadStatus::Failed { kind, error, .. } = session.status() {
                            let _ = event_tx.send(SessionEvent::Info(InfoEvent::LoadFailed {
                                key,
                                kind: *kind,
                                error: error.clone(),
                            }));
                        }
                    }
                    LoadOutcome::Stale => {
                        let _ = event_tx.send(SessionEvent::Info(InfoEvent::StaleDiscarded { key }));
                    }
                }
                publish(&session, &event_tx);
            }
        }
    }

    Ok(session)
}
