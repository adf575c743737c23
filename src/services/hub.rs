//! Hub — the single task that owns canvas state and fans out events.
//!
//! DESIGN
//! ======
//! Every connection forwards its actions to one bounded command queue. The
//! hub task drains it one command at a time, runs the `Dispatcher`, encodes
//! each resulting event into a `Frame` once and pushes it to the per-client
//! queues selected by the delivery audience. One writer, one queue: every
//! participant observes accepted draws in the same relative order.
//!
//! ERROR HANDLING
//! ==============
//! `try_send` never blocks the hub. A client whose queue is full has missed
//! a frame and can no longer mirror history, so it is evicted: its queue is
//! dropped (the socket task sees the close and exits) and it is disconnected
//! here, so the others see it leave. A reconnect starts from a fresh snapshot.

use std::collections::{HashMap, VecDeque};

use serde::Serialize;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use super::dispatch::{Action, CanvasStats, Delivery, Dispatcher, Event};
use crate::config::Config;
use crate::frame::{Data, Frame};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug)]
pub enum HubCommand {
    Connect { session_id: Uuid, tx: mpsc::Sender<Frame> },
    /// A parsed action. `request` is kept to correlate a rejection.
    Act { session_id: Uuid, action: Action, request: Frame },
    Disconnect { session_id: Uuid },
    Reset,
    Stats { reply: oneshot::Sender<CanvasStats> },
}

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("canvas hub has shut down")]
    Closed,
}

impl crate::frame::ErrorCode for HubError {
    fn error_code(&self) -> &'static str {
        "E_HUB_CLOSED"
    }

    fn retryable(&self) -> bool {
        true
    }
}

/// Cloneable sender side of the hub queue.
#[derive(Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    async fn send(&self, command: HubCommand) -> Result<(), HubError> {
        self.tx.send(command).await.map_err(|_| HubError::Closed)
    }

    /// Register a connection and its outbound queue.
    ///
    /// # Errors
    ///
    /// Returns `HubError::Closed` if the hub task has stopped.
    pub async fn connect(&self, session_id: Uuid, tx: mpsc::Sender<Frame>) -> Result<(), HubError> {
        self.send(HubCommand::Connect { session_id, tx }).await
    }

    /// Submit an action on behalf of a connection.
    ///
    /// # Errors
    ///
    /// Returns `HubError::Closed` if the hub task has stopped.
    pub async fn act(&self, session_id: Uuid, action: Action, request: Frame) -> Result<(), HubError> {
        self.send(HubCommand::Act { session_id, action, request }).await
    }

    /// Announce that a connection has gone away.
    ///
    /// # Errors
    ///
    /// Returns `HubError::Closed` if the hub task has stopped.
    pub async fn disconnect(&self, session_id: Uuid) -> Result<(), HubError> {
        self.send(HubCommand::Disconnect { session_id }).await
    }

    /// Clear the canvas for every participant.
    ///
    /// # Errors
    ///
    /// Returns `HubError::Closed` if the hub task has stopped.
    pub async fn reset(&self) -> Result<(), HubError> {
        self.send(HubCommand::Reset).await
    }

    /// Read current counters, serialized with all other commands.
    ///
    /// # Errors
    ///
    /// Returns `HubError::Closed` if the hub task has stopped.
    pub async fn stats(&self) -> Result<CanvasStats, HubError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Stats { reply }).await?;
        rx.await.map_err(|_| HubError::Closed)
    }
}

// =============================================================================
// HUB TASK
// =============================================================================

struct Hub {
    dispatcher: Dispatcher,
    clients: HashMap<Uuid, mpsc::Sender<Frame>>,
    background: String,
}

/// Spawn the hub task. It runs until every `HubHandle` is dropped.
#[must_use]
pub fn spawn_hub(config: &Config) -> (HubHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<HubCommand>(config.hub_queue_capacity);
    let mut hub = Hub {
        dispatcher: Dispatcher::new(config.undo_sync),
        clients: HashMap::new(),
        background: config.background.clone(),
    };

    let task = tokio::spawn(async move {
        while let Some(command) = rx.recv().await {
            hub.handle(command);
        }
        info!("canvas hub stopped");
    });

    (HubHandle { tx }, task)
}

impl Hub {
    fn handle(&mut self, command: HubCommand) {
        match command {
            HubCommand::Connect { session_id, tx } => match self.dispatcher.connect(session_id) {
                Ok(deliveries) => {
                    self.clients.insert(session_id, tx);
                    info!(%session_id, clients = self.clients.len(), "participant connected");
                    self.deliver(deliveries, Vec::new());
                }
                Err(e) => {
                    warn!(%session_id, error = %e, "connect rejected");
                    let _ = tx.try_send(Frame::request("session:connected", Data::new()).error_from(&e));
                }
            },
            HubCommand::Act { session_id, action, request } => {
                if matches!(action, Action::CursorMove { .. }) {
                    trace!(%session_id, "cursor move");
                } else {
                    debug!(%session_id, syscall = %request.syscall, "action");
                }
                match self.dispatcher.handle(session_id, action) {
                    Ok(deliveries) => self.deliver(deliveries, Vec::new()),
                    Err(e) => {
                        warn!(%session_id, syscall = %request.syscall, error = %e, "action rejected");
                        let Some(tx) = self.clients.get(&session_id) else {
                            return;
                        };
                        if push(session_id, tx, request.error_from(&e)) == Push::Full {
                            self.deliver(Vec::new(), vec![session_id]);
                        }
                    }
                }
            }
            HubCommand::Disconnect { session_id } => {
                // Drop the queue first so "all" means all remaining.
                let known = self.clients.remove(&session_id).is_some();
                let deliveries = self.dispatcher.disconnect(session_id);
                if known {
                    info!(%session_id, clients = self.clients.len(), "participant disconnected");
                }
                self.deliver(deliveries, Vec::new());
            }
            HubCommand::Reset => {
                info!(strokes = self.dispatcher.stats().strokes, "canvas reset");
                let deliveries = self.dispatcher.reset();
                self.deliver(deliveries, Vec::new());
            }
            HubCommand::Stats { reply } => {
                let _ = reply.send(self.dispatcher.stats());
            }
        }
    }

    /// Fan deliveries out in order. Clients that overflow are evicted before
    /// the next delivery, and their departure is queued behind the rest.
    fn deliver(&mut self, deliveries: Vec<Delivery>, mut evicted: Vec<Uuid>) {
        let mut queue = VecDeque::from(deliveries);
        loop {
            for session_id in evicted.drain(..) {
                if self.clients.remove(&session_id).is_some() {
                    warn!(%session_id, clients = self.clients.len(), "client queue full; evicting");
                    queue.extend(self.dispatcher.disconnect(session_id));
                }
            }
            let Some(delivery) = queue.pop_front() else {
                return;
            };
            let frame = event_frame(&delivery.event, &self.background);
            for (&session_id, tx) in &self.clients {
                if delivery.audience.includes(session_id) && push(session_id, tx, frame.clone()) == Push::Full {
                    evicted.push(session_id);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Push {
    Sent,
    Full,
    Closed,
}

/// Non-blocking enqueue.
fn push(session_id: Uuid, tx: &mpsc::Sender<Frame>, frame: Frame) -> Push {
    match tx.try_send(frame) {
        Ok(()) => Push::Sent,
        Err(TrySendError::Full(frame)) => {
            debug!(%session_id, syscall = %frame.syscall, "client queue full");
            Push::Full
        }
        Err(TrySendError::Closed(_)) => {
            debug!(%session_id, "client queue closed; awaiting disconnect");
            Push::Closed
        }
    }
}

// =============================================================================
// ENCODING
// =============================================================================

fn to_json(value: &impl Serialize) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        warn!(error = %e, "event payload failed to serialize; sending null");
        serde_json::Value::Null
    })
}

/// Encode a dispatcher event as its wire frame.
pub fn event_frame(event: &Event, background: &str) -> Frame {
    match event {
        Event::Welcome(p) => Frame::request("session:connected", Data::new())
            .with_data("session_id", p.session_id.to_string())
            .with_data("name", p.name.clone())
            .with_data("color", p.color.clone())
            .with_data("background", background),
        Event::HistorySnapshot(strokes) => {
            Frame::request("history:snapshot", Data::new()).with_data("strokes", to_json(strokes))
        }
        Event::Draw(segment) => Frame::request("stroke:draw", Data::new())
            .with_from(segment.owner_id)
            .with_data("stroke", to_json(segment)),
        Event::Undone { id, owner_id } => Frame::request("stroke:undo", Data::new())
            .with_from(*owner_id)
            .with_data("id", id.to_string())
            .with_data("owner_id", owner_id.to_string()),
        Event::ClearAll => Frame::request("canvas:clear", Data::new()),
        Event::Presence(participants) => {
            Frame::request("presence:update", Data::new()).with_data("participants", to_json(participants))
        }
        Event::Cursor(update) => Frame::request("cursor:moved", Data::new())
            .with_from(update.owner_id)
            .with_data("x", update.x)
            .with_data("y", update.y)
            .with_data("owner_id", update.owner_id.to_string())
            .with_data("name", update.name.clone())
            .with_data("color", update.color.clone()),
        Event::ParticipantLeft(session_id) => {
            Frame::request("presence:left", Data::new()).with_data("session_id", session_id.to_string())
        }
    }
}

#[cfg(test)]
#[path = "hub_test.rs"]
mod tests;
