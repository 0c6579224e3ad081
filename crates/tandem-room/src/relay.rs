//! Relay actor: the single task that owns the [`Dispatcher`].
//!
//! Connection handlers and the janitor talk to it through a cloneable
//! [`RelayHandle`]. Commands from one connection are sent in order by that
//! connection's reader, so per-connection ordering is kept end to end.

use tandem_protocol::ClientMessage;
use tandem_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::{Clock, Dispatcher, PeerSender, RelayConfig, RoomError, SystemClock};

/// Commands sent to the relay actor through its channel.
pub(crate) enum RelayCommand {
    /// A connection finished its handshake.
    Open {
        conn: ConnectionId,
        sender: PeerSender,
    },

    /// A decoded frame from a connection.
    Message {
        conn: ConnectionId,
        msg: ClientMessage,
    },

    /// A connection's socket is gone.
    Closed { conn: ConnectionId },

    /// Run one janitor pass.
    Sweep,

    /// Report how many rooms are held.
    RoomCount { reply: oneshot::Sender<usize> },

    /// Close everything and stop. Replies with the number of rooms dropped.
    Shutdown { reply: oneshot::Sender<usize> },
}

/// Handle to the running relay actor.
///
/// Cheap to clone; it wraps an `mpsc::Sender`.
#[derive(Clone)]
pub struct RelayHandle {
    sender: mpsc::Sender<RelayCommand>,
}

impl RelayHandle {
    /// Registers a connection and its outbound channel.
    pub async fn open(&self, conn: ConnectionId, sender: PeerSender) -> Result<(), RoomError> {
        self.send(RelayCommand::Open { conn, sender }).await
    }

    /// Delivers a frame from `conn` (fire-and-forget).
    pub async fn message(&self, conn: ConnectionId, msg: ClientMessage) -> Result<(), RoomError> {
        self.send(RelayCommand::Message { conn, msg }).await
    }

    /// Reports that `conn` has gone away.
    pub async fn closed(&self, conn: ConnectionId) -> Result<(), RoomError> {
        self.send(RelayCommand::Closed { conn }).await
    }

    /// Asks the relay to evict idle, expired rooms.
    pub async fn sweep(&self) -> Result<(), RoomError> {
        self.send(RelayCommand::Sweep).await
    }

    /// Number of rooms currently held, including empty ones awaiting eviction.
    pub async fn room_count(&self) -> Result<usize, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RelayCommand::RoomCount { reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable)
    }

    /// Closes every connection, drops every room and stops the actor.
    pub async fn shutdown(&self) -> Result<usize, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RelayCommand::Shutdown { reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable)
    }

    async fn send(&self, cmd: RelayCommand) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::Unavailable)
    }
}

struct RelayActor<K: Clock> {
    dispatcher: Dispatcher<K>,
    receiver: mpsc::Receiver<RelayCommand>,
}

impl<K: Clock> RelayActor<K> {
    async fn run(mut self) {
        tracing::info!("relay actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RelayCommand::Open { conn, sender } => self.dispatcher.open(conn, sender),
                RelayCommand::Message { conn, msg } => self.dispatcher.handle(conn, msg),
                RelayCommand::Closed { conn } => self.dispatcher.close(conn),
                RelayCommand::Sweep => {
                    let evicted = self.dispatcher.sweep(Instant::now());
                    tracing::debug!(
                        evicted,
                        remaining = self.dispatcher.registry().len(),
                        "sweep complete"
                    );
                }
                RelayCommand::RoomCount { reply } => {
                    let _ = reply.send(self.dispatcher.registry().len());
                }
                RelayCommand::Shutdown { reply } => {
                    let rooms = self.dispatcher.drain();
                    let _ = reply.send(rooms);
                    break;
                }
            }
        }

        tracing::info!("relay actor stopped");
    }
}

/// Spawns the relay actor using the system clock.
pub fn spawn_relay(config: RelayConfig) -> RelayHandle {
    spawn_relay_with_clock(config, SystemClock)
}

/// Spawns the relay actor with a custom wall clock.
pub fn spawn_relay_with_clock<K: Clock>(config: RelayConfig, clock: K) -> RelayHandle {
    let config = config.validated();
    let (sender, receiver) = mpsc::channel(config.channel_size);
    let actor = RelayActor {
        dispatcher: Dispatcher::new(config, clock),
        receiver,
    };
    tokio::spawn(actor.run());
    RelayHandle { sender }
}
