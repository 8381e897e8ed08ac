//! `Client` builder and event loop.
//!
//! This is the entry point for running a Dropline client. It ties the
//! layers together: transport → protocol → session, and hands
//! [`SessionSnapshot`]s to whatever renders them.

use std::time::Duration;

use dropline_protocol::{Codec, JsonCodec};
use dropline_session::{
    ClientConfig, ConnectionEvent, Intent, SessionSnapshot, SessionStateMachine,
};
use dropline_transport::{Connector, WebSocketConnector};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use crate::DroplineError;

/// Builder for configuring a [`Client`].
///
/// # Example
///
/// ```rust,no_run
/// use dropline::prelude::*;
///
/// # fn main() -> Result<(), DroplineError> {
/// let client = Client::builder()
///     .server_url("ws://localhost:8000/ws")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the match server's WebSocket URL.
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config = self.config.with_server_url(url);
        self
    }

    /// Sets how long to show "Room not found" before returning to the
    /// multiplayer menu.
    pub fn recovery_delay(mut self, delay: Duration) -> Self {
        self.config = self.config.with_recovery_delay(delay);
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds a client that talks JSON over WebSocket.
    ///
    /// # Errors
    /// Returns [`DroplineError::Session`] if the configuration is invalid.
    pub fn build(self) -> Result<Client, DroplineError> {
        self.build_with(WebSocketConnector, JsonCodec)
    }

    /// Builds a client on a custom connector and codec.
    ///
    /// # Errors
    /// Returns [`DroplineError::Session`] if the configuration is invalid.
    pub fn build_with<K: Connector, C: Codec>(
        self,
        connector: K,
        codec: C,
    ) -> Result<Client<K, C>, DroplineError> {
        self.config.validate()?;
        tracing::debug!(server_url = %self.config.server_url, "client configured");

        let (events_tx, events) = mpsc::unbounded_channel();
        Ok(Client {
            machine: SessionStateMachine::new(connector, codec, self.config, events_tx),
            events,
        })
    }
}

/// A Dropline client.
///
/// Drive it either step by step ([`dispatch`](Self::dispatch) and
/// [`pump`](Self::pump)) or hand it to [`run`](Self::run).
pub struct Client<K: Connector = WebSocketConnector, C: Codec = JsonCodec> {
    machine: SessionStateMachine<K, C>,
    events: mpsc::UnboundedReceiver<ConnectionEvent>,
}

impl Client {
    /// Creates a new builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

impl<K: Connector, C: Codec> Client<K, C> {
    /// Applies a user intent.
    ///
    /// Starting a game spawns the connection on the current Tokio
    /// runtime. Without one, the status shows the connection error and
    /// the screen stays where it was.
    pub fn dispatch(&mut self, intent: Intent) {
        self.machine.handle_intent(intent);
    }

    /// Current view state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.machine.snapshot()
    }

    /// The underlying state machine.
    pub fn machine(&self) -> &SessionStateMachine<K, C> {
        &self.machine
    }

    /// Waits for the next background input (a connection event or the
    /// recovery deadline) and applies it.
    pub async fn pump(&mut self) {
        let recovery = self.machine.recovery_deadline();
        tokio::select! {
            Some(event) = self.events.recv() => self.machine.handle_connection_event(event),
            () = wait_until(recovery) => {
                self.machine.fire_recovery();
            }
        }
    }

    /// Runs the client loop.
    ///
    /// Applies intents as they arrive, alongside connection events and
    /// the recovery deadline, and publishes a snapshot to `view` whenever
    /// something visible changed. Returns once `intents` is closed, after
    /// leaving any game in progress.
    pub async fn run(
        mut self,
        mut intents: mpsc::Receiver<Intent>,
        view: watch::Sender<SessionSnapshot>,
    ) {
        tracing::info!("Dropline client running");
        view.send_replace(self.machine.snapshot());

        loop {
            let recovery = self.machine.recovery_deadline();
            let done = tokio::select! {
                intent = intents.recv() => match intent {
                    Some(intent) => {
                        self.machine.handle_intent(intent);
                        false
                    }
                    None => {
                        self.machine.handle_intent(Intent::LeaveGame);
                        true
                    }
                },
                Some(event) = self.events.recv() => {
                    self.machine.handle_connection_event(event);
                    false
                }
                () = wait_until(recovery) => {
                    self.machine.fire_recovery();
                    false
                }
            };

            let next = self.machine.snapshot();
            view.send_if_modified(|current| {
                if *current == next {
                    return false;
                }
                *current = next;
                true
            });

            if done {
                tracing::info!("intent channel closed, client stopped");
                return;
            }
        }
    }
}

/// Sleeps until `deadline`, or forever when there is none.
async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dropline_session::Screen;

    #[test]
    fn test_builder_defaults() {
        let client = Client::builder().build().unwrap();
        let config = client.machine().config();
        assert_eq!(config.server_url, ClientConfig::DEFAULT_SERVER_URL);
        assert_eq!(config.recovery_delay, ClientConfig::DEFAULT_RECOVERY_DELAY);
    }

    #[test]
    fn test_builder_overrides() {
        let client = Client::builder()
            .server_url("wss://games.example.com/ws")
            .recovery_delay(Duration::from_millis(250))
            .build()
            .unwrap();
        let config = client.machine().config();
        assert_eq!(config.server_url, "wss://games.example.com/ws");
        assert_eq!(config.recovery_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_builder_rejects_bad_url() {
        let result = Client::builder().server_url("http://localhost:8000").build();
        assert!(matches!(result, Err(DroplineError::Session(_))));
    }

    #[test]
    fn test_dispatch_without_network() {
        let mut client = Client::builder().build().unwrap();
        client.dispatch(Intent::GoToMultiplayerMenu);
        assert_eq!(client.snapshot().screen, Screen::MultiplayerMenu);
        client.dispatch(Intent::LeaveGame);
        assert_eq!(client.snapshot(), SessionSnapshot::default());
    }

    #[test]
    fn test_dispatch_start_outside_runtime_does_not_panic() {
        let mut client = Client::builder().build().unwrap();
        client.dispatch(Intent::StartAi);
        let snap = client.snapshot();
        assert_eq!(snap.status, dropline_session::text::CONNECTION_ERROR);
        assert_eq!(snap.screen, Screen::Menu);
    }
}
