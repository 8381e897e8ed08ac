//! The connection manager: owns the one live connection to the match
//! server.
//!
//! It is responsible for:
//! - Opening a connection and sending the first command once it is open
//! - Encoding outbound commands and decoding inbound frames
//! - Reporting lifecycle events (opened, message, error, closed)
//! - Closing the connection when the session ends
//!
//! It never looks at game semantics. What an event *means* is the state
//! machine's business.
//!
//! # Event delivery
//!
//! Each connection runs in its own Tokio task. The task reports what
//! happens through an mpsc channel as [`ConnectionEvent`]s tagged with
//! the [`ConnectionId`] that produced them. The manager keeps exactly
//! one registered id; [`ConnectionManager::accept`] drops events from any
//! other id, so a torn-down connection can never reach the state
//! machine.
//!
//! ```text
//! open() ──spawn──→ [task: connect → Opened → send initial → loop { recv | send | shutdown }]
//!                                 │
//!                          ConnectionEvent ──mpsc──→ accept() ──→ state machine
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dropline_protocol::{
    ClientCommand, Codec, ProtocolError, ServerEvent, decode_event, encode_command,
};
use dropline_transport::{Connection, ConnectionId, Connector, TransportError};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};

use crate::SessionError;

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Something that happened on a connection.
#[derive(Debug)]
pub struct ConnectionEvent {
    /// Which connection produced the event.
    pub connection: ConnectionId,
    pub kind: ConnectionEventKind,
}

/// The lifecycle callbacks of a connection, as data.
#[derive(Debug)]
pub enum ConnectionEventKind {
    /// The connection is open. The initial command goes out right after.
    Opened,
    /// A decoded, validated server event.
    Message(ServerEvent),
    /// A frame arrived but could not be decoded. Non-fatal.
    Malformed(ProtocolError),
    /// Opening, sending or receiving failed. Always followed by `Closed`.
    TransportError(TransportError),
    /// The connection is gone (remote close or failure). Sent once.
    Closed,
}

/// How far a registered connection has got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The task is still connecting.
    Connecting,
    /// `Opened` has been accepted; commands can be sent.
    Open,
}

/// The registered connection.
struct ActiveConnection {
    id: ConnectionId,
    readiness: Readiness,
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    shutdown: oneshot::Sender<()>,
}

/// Owns at most one live connection.
///
/// Generic over the [`Connector`] (WebSocket in production, in-memory in
/// tests) and the [`Codec`].
pub struct ConnectionManager<K: Connector, C: Codec> {
    connector: Arc<K>,
    codec: Arc<C>,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    active: Option<ActiveConnection>,
}

impl<K: Connector, C: Codec> ConnectionManager<K, C> {
    /// Creates a manager that reports every connection's events to
    /// `events`.
    pub fn new(connector: K, codec: C, events: mpsc::UnboundedSender<ConnectionEvent>) -> Self {
        Self {
            connector: Arc::new(connector),
            codec: Arc::new(codec),
            events,
            active: None,
        }
    }

    /// Opens a connection to `url` and sends `initial` as soon as it is
    /// open.
    ///
    /// Any previously registered connection is closed first, so there is
    /// never more than one live handle.
    ///
    /// # Errors
    /// - [`SessionError::NoRuntime`]: called outside a Tokio runtime
    /// - [`SessionError::Protocol`]: `initial` can't be encoded
    ///
    /// On error the current connection is left as it was. Connection
    /// failures are reported asynchronously as events.
    pub fn open(&mut self, url: &str, initial: &ClientCommand) -> Result<ConnectionId, SessionError> {
        let runtime = Handle::try_current().map_err(|_| SessionError::NoRuntime)?;
        let initial_frame = encode_command(self.codec.as_ref(), initial)?;
        self.close();

        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        runtime.spawn(drive(
            Arc::clone(&self.connector),
            Arc::clone(&self.codec),
            url.to_string(),
            id,
            initial_frame,
            outbound_rx,
            shutdown_rx,
            self.events.clone(),
        ));

        tracing::info!(%id, url, initial = initial.kind(), "opening connection");
        self.active = Some(ActiveConnection {
            id,
            readiness: Readiness::Connecting,
            outbound: outbound_tx,
            shutdown: shutdown_tx,
        });
        Ok(id)
    }

    /// Encodes and sends a command on the open connection.
    ///
    /// Nothing is buffered: sending before the connection is open fails.
    ///
    /// # Errors
    /// - [`SessionError::NotConnected`]: no connection, or its task ended
    /// - [`SessionError::NotReady`]: still connecting
    /// - [`SessionError::Protocol`]: the command couldn't be encoded
    pub fn send(&self, command: &ClientCommand) -> Result<(), SessionError> {
        let active = self.active.as_ref().ok_or(SessionError::NotConnected)?;
        if active.readiness != Readiness::Open {
            return Err(SessionError::NotReady(active.id));
        }
        let frame = encode_command(self.codec.as_ref(), command)?;
        active
            .outbound
            .send(frame)
            .map_err(|_| SessionError::NotConnected)?;
        tracing::debug!(id = %active.id, command = command.kind(), "command sent");
        Ok(())
    }

    /// Closes and unregisters the current connection.
    ///
    /// Idempotent: returns `false` (and does nothing) when there is no
    /// connection. Events the old connection already queued are dropped
    /// by [`accept`](Self::accept).
    pub fn close(&mut self) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };
        // The task may already be gone; then there's nothing to close.
        let _ = active.shutdown.send(());
        tracing::info!(id = %active.id, "connection closed locally");
        true
    }

    /// Filters an incoming event and updates readiness.
    ///
    /// Returns `None` for events from connections that are no longer
    /// registered. A `Closed` event unregisters the connection.
    pub fn accept(&mut self, event: ConnectionEvent) -> Option<ConnectionEventKind> {
        let Some(active) = self.active.as_mut().filter(|a| a.id == event.connection) else {
            tracing::debug!(id = %event.connection, "dropping event from stale connection");
            return None;
        };

        match event.kind {
            ConnectionEventKind::Opened => active.readiness = Readiness::Open,
            ConnectionEventKind::Closed => self.active = None,
            _ => {}
        }
        Some(event.kind)
    }

    /// The registered connection, if any.
    pub fn current(&self) -> Option<ConnectionId> {
        self.active.as_ref().map(|a| a.id)
    }

    /// Readiness of the registered connection, if any.
    pub fn readiness(&self) -> Option<Readiness> {
        self.active.as_ref().map(|a| a.readiness)
    }

    /// Returns `true` once the registered connection is open.
    pub fn is_open(&self) -> bool {
        self.readiness() == Some(Readiness::Open)
    }
}

impl<K: Connector, C: Codec> Drop for ConnectionManager<K, C> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Runs one connection from connect to close.
#[allow(clippy::too_many_arguments)]
async fn drive<K: Connector, C: Codec>(
    connector: Arc<K>,
    codec: Arc<C>,
    url: String,
    id: ConnectionId,
    initial: Vec<u8>,
    mut outbound: mpsc::UnboundedReceiver<Vec<u8>>,
    mut shutdown: oneshot::Receiver<()>,
    events: mpsc::UnboundedSender<ConnectionEvent>,
) {
    let emit = |kind: ConnectionEventKind| {
        // The receiver only goes away when the whole client does.
        let _ = events.send(ConnectionEvent { connection: id, kind });
    };
    let fail = |error: TransportError| {
        tracing::warn!(%id, error = %error, "connection failed");
        emit(ConnectionEventKind::TransportError(error));
        emit(ConnectionEventKind::Closed);
    };

    let conn = tokio::select! {
        biased;
        _ = &mut shutdown => return,
        result = connector.connect(&url) => match result {
            Ok(conn) => conn,
            Err(e) => return fail(e),
        },
    };

    tracing::info!(%id, "connection open");
    emit(ConnectionEventKind::Opened);
    if let Err(e) = conn.send(&initial).await {
        return fail(e);
    }

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                if let Err(e) = conn.close().await {
                    tracing::debug!(%id, error = %e, "close handshake failed");
                }
                return;
            }
            Some(frame) = outbound.recv() => {
                if let Err(e) = conn.send(&frame).await {
                    return fail(e);
                }
            }
            result = conn.recv() => match result {
                Ok(Some(data)) => match decode_event(codec.as_ref(), &data) {
                    Ok(event) => {
                        tracing::debug!(%id, event = event.kind(), "event received");
                        emit(ConnectionEventKind::Message(event));
                    }
                    Err(e) => {
                        tracing::warn!(%id, error = %e, "ignoring malformed message");
                        emit(ConnectionEventKind::Malformed(e));
                    }
                },
                Ok(None) => {
                    tracing::info!(%id, "connection closed by server");
                    emit(ConnectionEventKind::Closed);
                    return;
                }
                Err(e) => return fail(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dropline_protocol::{GameMode, JsonCodec};

    /// A connector whose connections never finish opening.
    struct StalledConnector;

    struct StalledConnection;

    impl Connector for StalledConnector {
        type Connection = StalledConnection;

        async fn connect(&self, _url: &str) -> Result<StalledConnection, TransportError> {
            std::future::pending::<Result<StalledConnection, TransportError>>().await
        }
    }

    impl Connection for StalledConnection {
        async fn send(&self, _data: &[u8]) -> Result<(), TransportError> {
            Ok(())
        }

        async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
            std::future::pending::<Result<Option<Vec<u8>>, TransportError>>().await
        }

        async fn close(&self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    const URL: &str = "ws://localhost:8000/ws";

    fn manager() -> (
        ConnectionManager<StalledConnector, JsonCodec>,
        mpsc::UnboundedReceiver<ConnectionEvent>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ConnectionManager::new(StalledConnector, JsonCodec, tx), rx)
    }

    fn create_ai() -> ClientCommand {
        ClientCommand::CreateRoom { mode: GameMode::Ai }
    }

    fn event(connection: ConnectionId, kind: ConnectionEventKind) -> ConnectionEvent {
        ConnectionEvent { connection, kind }
    }

    #[test]
    fn test_new_manager_has_no_connection() {
        let (m, _rx) = manager();
        assert_eq!(m.current(), None);
        assert_eq!(m.readiness(), None);
        assert!(!m.is_open());
    }

    #[test]
    fn test_send_without_connection_fails() {
        let (m, _rx) = manager();
        let result = m.send(&create_ai());
        assert!(matches!(result, Err(SessionError::NotConnected)));
    }

    #[test]
    fn test_close_is_idempotent() {
        let (mut m, _rx) = manager();
        assert!(!m.close());
        assert!(!m.close());
        assert_eq!(m.current(), None);
    }

    #[test]
    fn test_open_outside_runtime_fails() {
        let (mut m, _rx) = manager();
        let result = m.open(URL, &create_ai());
        assert!(matches!(result, Err(SessionError::NoRuntime)));
        assert_eq!(m.current(), None);
    }

    #[tokio::test]
    async fn test_send_before_open_is_not_ready() {
        let (mut m, _rx) = manager();
        let id = m.open(URL, &create_ai()).unwrap();
        assert_eq!(m.readiness(), Some(Readiness::Connecting));

        let result = m.send(&create_ai());
        assert!(matches!(result, Err(SessionError::NotReady(not_ready)) if not_ready == id));
    }

    #[tokio::test]
    async fn test_opened_event_makes_connection_sendable() {
        let (mut m, _rx) = manager();
        let id = m.open(URL, &create_ai()).unwrap();

        let kind = m.accept(event(id, ConnectionEventKind::Opened));
        assert!(matches!(kind, Some(ConnectionEventKind::Opened)));
        assert!(m.is_open());
        assert!(m.send(&create_ai()).is_ok());
    }

    #[tokio::test]
    async fn test_close_twice_after_open() {
        let (mut m, _rx) = manager();
        m.open(URL, &create_ai()).unwrap();

        assert!(m.close());
        assert!(!m.close());
        assert_eq!(m.current(), None);
        assert!(matches!(m.send(&create_ai()), Err(SessionError::NotConnected)));
    }

    #[tokio::test]
    async fn test_second_open_replaces_first() {
        let (mut m, _rx) = manager();
        let first = m.open(URL, &create_ai()).unwrap();
        let second = m.open(URL, &create_ai()).unwrap();

        assert_ne!(first, second);
        assert_eq!(m.current(), Some(second));
        assert_eq!(m.readiness(), Some(Readiness::Connecting));

        // The first handle is unregistered: its events no longer count.
        assert!(m.accept(event(first, ConnectionEventKind::Opened)).is_none());
        assert!(m.accept(event(first, ConnectionEventKind::Closed)).is_none());
        assert_eq!(m.current(), Some(second));
        assert!(!m.is_open());
    }

    #[tokio::test]
    async fn test_closed_event_unregisters() {
        let (mut m, _rx) = manager();
        let id = m.open(URL, &create_ai()).unwrap();

        let kind = m.accept(event(id, ConnectionEventKind::Closed));
        assert!(matches!(kind, Some(ConnectionEventKind::Closed)));
        assert_eq!(m.current(), None);
        // Nothing left to close.
        assert!(!m.close());
    }

    #[tokio::test]
    async fn test_events_after_local_close_are_dropped() {
        let (mut m, _rx) = manager();
        let id = m.open(URL, &create_ai()).unwrap();
        m.close();

        assert!(m.accept(event(id, ConnectionEventKind::Opened)).is_none());
        assert!(!m.is_open());
    }
}
