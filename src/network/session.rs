//! Client Session
//!
//! Owns the world view for one connection and ties it to the transport:
//! login lifecycle, inbound message dispatch, the per-frame simulation
//! driver, and rate-limited position reports. Events go out on a broadcast
//! channel to whatever renders the world.

use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{interval, Instant, MissedTickBehavior};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::game::actor::ActorId;
use crate::game::clock::SimulationClock;
use crate::game::events::SimEvent;
use crate::game::input::{InputFrame, EDGE_FLAGS};
use crate::game::map::TileMap;
use crate::game::state::GameState;
use crate::game::tick::{tick, TickConfig};
use crate::network::protocol::{AuthResponse, ClientMessage, ProtocolError, ServerMessage};
use crate::network::sync::{apply_roster, apply_snapshot, PositionReporter, Snapshot};
use crate::network::transport::{Transport, TransportError};

/// Event channel depth; slow subscribers miss the oldest events.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Operation needs a logged-in player.
    #[error("not logged in")]
    NotLoggedIn,

    /// The transport is not open.
    #[error("transport unavailable")]
    TransportUnavailable,

    /// Message could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Transport refused the frame.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Where the session is in the login lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    /// No player.
    LoggedOut,
    /// Waiting for `login_response` or `reconnect_response`.
    Pending {
        /// Whether this is a reconnect with stored credentials
        reconnect: bool,
    },
    /// Playing as `player_id`.
    LoggedIn {
        /// Assigned id
        player_id: ActorId,
        /// Confirmed name
        username: Option<String>,
    },
}

/// One client connection's simulation and sync state.
pub struct ClientSession<T: Transport> {
    state: GameState,
    transport: T,
    config: ClientConfig,
    tick_config: TickConfig,
    clock: SimulationClock,
    reporter: PositionReporter,
    login: LoginState,
    /// Press flags not yet seen by a simulation step.
    pending_edges: u8,
    event_tx: broadcast::Sender<SimEvent>,
}

impl<T: Transport> ClientSession<T> {
    /// Create a session over a map and a transport.
    pub fn new(map: TileMap, transport: T, config: ClientConfig) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: GameState::new(map),
            transport,
            tick_config: config.tick_config(),
            clock: SimulationClock::new(config.step_mode),
            reporter: PositionReporter::new(config.report_interval().as_secs_f64()),
            config,
            login: LoginState::LoggedOut,
            pending_edges: 0,
            event_tx,
        }
    }

    /// Subscribe to simulation events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<SimEvent> {
        self.event_tx.subscribe()
    }

    /// World view.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// World view, mutably.
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    /// Login lifecycle state.
    pub fn login_state(&self) -> &LoginState {
        &self.login
    }

    /// Configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    // =========================================================================
    // LOGIN LIFECYCLE
    // =========================================================================

    /// Ask for a new session.
    pub fn login(&mut self, username: &str) -> Result<(), SessionError> {
        self.send(&ClientMessage::Login { username: username.to_string() })?;
        self.login = LoginState::Pending { reconnect: false };
        Ok(())
    }

    /// Resume a previous session with stored credentials.
    pub fn reconnect(&mut self, player_id: &str, username: &str) -> Result<(), SessionError> {
        self.send(&ClientMessage::Reconnect {
            player_id: player_id.to_string(),
            username: username.to_string(),
        })?;
        self.login = LoginState::Pending { reconnect: true };
        Ok(())
    }

    /// End the session. The local player is dropped even if the logout
    /// message cannot be sent.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        let LoginState::LoggedIn { player_id, .. } = &self.login else {
            return Err(SessionError::NotLoggedIn);
        };
        let msg = ClientMessage::Logout { player_id: player_id.to_string() };
        let sent = self.send(&msg);

        self.state.clear_local();
        self.reporter.reset();
        self.login = LoginState::LoggedOut;
        self.state.push_event(SimEvent::LoggedOut);
        info!("Logged out");
        self.publish();
        sent
    }

    fn handle_auth(&mut self, resp: AuthResponse, reconnect: bool) {
        match (resp.success, resp.player_id) {
            (true, Some(id)) => {
                let player_id = ActorId::from(id);
                self.state.spawn_local(&player_id, self.config.spawn);
                self.reporter.reset();
                info!(player = %player_id, reconnect, "Logged in");
                self.state.push_event(SimEvent::LoggedIn {
                    player_id: player_id.clone(),
                    username: resp.username.clone(),
                });
                self.login = LoginState::LoggedIn { player_id, username: resp.username };
            }
            (true, None) => {
                warn!(reconnect, "Auth response without player id");
                self.login = LoginState::LoggedOut;
                self.state.push_event(SimEvent::LoginFailed {
                    message: Some("missing player id".to_string()),
                });
            }
            (false, _) if reconnect => {
                info!(message = ?resp.message, "Reconnect refused, credentials rejected");
                self.login = LoginState::LoggedOut;
                self.state.push_event(SimEvent::CredentialsRejected { message: resp.message });
            }
            (false, _) => {
                info!(message = ?resp.message, "Login refused");
                self.login = LoginState::LoggedOut;
                self.state.push_event(SimEvent::LoginFailed { message: resp.message });
            }
        }
    }

    // =========================================================================
    // INBOUND
    // =========================================================================

    /// Decode and apply one inbound text frame. Bad frames are logged and
    /// dropped without touching the world; the error is returned for callers
    /// that want to count them.
    pub fn handle_text(&mut self, text: &str) -> Result<(), ProtocolError> {
        let result = ServerMessage::from_json(text).and_then(|msg| self.handle_message(msg));
        match &result {
            Ok(()) => {}
            Err(ProtocolError::UnknownType(kind)) => {
                warn!(%kind, "Ignoring message of unknown type");
            }
            Err(e) => {
                warn!(error = %e, "Dropping inbound message");
            }
        }
        result
    }

    /// Apply one decoded inbound message.
    pub fn handle_message(&mut self, msg: ServerMessage) -> Result<(), ProtocolError> {
        match msg {
            ServerMessage::LoginResponse(resp) => self.handle_auth(resp, false),
            ServerMessage::ReconnectResponse(resp) => self.handle_auth(resp, true),
            ServerMessage::PlayerList { players } => {
                let roster = players
                    .into_iter()
                    .map(|(id, name)| (ActorId::from(id), name))
                    .collect();
                apply_roster(&mut self.state, roster);
            }
            ServerMessage::State(raw) => {
                let snapshot = Snapshot::try_from(raw)?;
                apply_snapshot(&mut self.state, &snapshot);
            }
        }
        self.publish();
        Ok(())
    }

    // =========================================================================
    // FRAME DRIVER
    // =========================================================================

    /// Advance by one rendered frame: run however many simulation steps the
    /// clock asks for, send the requests they raise, then report the local
    /// position if due. Returns the events produced.
    pub fn frame(&mut self, frame_dt: f64, input: InputFrame) -> Vec<SimEvent> {
        self.pending_edges |= input.flags & EDGE_FLAGS;
        let held = input.held_only();

        let mut events = Vec::new();
        for dt in self.clock.advance(frame_dt) {
            let step_input = held.with(std::mem::take(&mut self.pending_edges));
            let result = tick(&mut self.state, step_input, dt, &self.tick_config);

            for request in result.requests {
                if let Err(e) = self.send(&request.into()) {
                    debug!(error = %e, ?request, "Dropped action request");
                }
            }
            events.extend(result.events);
        }

        self.report_position();
        events.extend(self.state.take_events());
        self.broadcast(&events);
        events
    }

    fn report_position(&mut self) {
        if !matches!(self.login, LoginState::LoggedIn { .. }) {
            return;
        }
        let Some(position) = self.state.actors.local().map(|a| a.position) else {
            return;
        };
        let now = self.state.elapsed;
        if !self.reporter.is_due(now, position) {
            return;
        }
        match self.send(&ClientMessage::Position { x: position.x, y: position.y }) {
            Ok(()) => self.reporter.mark_sent(now, position),
            Err(e) => debug!(error = %e, "Position report skipped"),
        }
    }

    // =========================================================================
    // PLUMBING
    // =========================================================================

    fn send(&mut self, msg: &ClientMessage) -> Result<(), SessionError> {
        if !self.transport.is_open() {
            return Err(SessionError::TransportUnavailable);
        }
        let text = msg.to_json()?;
        self.transport.send_text(text)?;
        Ok(())
    }

    /// Drain queued events to subscribers.
    fn publish(&mut self) {
        let events = self.state.take_events();
        self.broadcast(&events);
    }

    fn broadcast(&self, events: &[SimEvent]) {
        for event in events {
            // No subscribers is fine.
            let _ = self.event_tx.send(event.clone());
        }
    }
}

/// Drive a session until its inbound stream closes: inbound frames are
/// applied as they arrive, and the simulation advances on a fixed frame
/// interval using the latest input.
#[instrument(skip_all, fields(endpoint = %session.config().endpoint))]
pub async fn run_client<T: Transport>(
    session: &mut ClientSession<T>,
    mut incoming: mpsc::Receiver<String>,
    input: watch::Receiver<InputFrame>,
) {
    let mut frames = interval(session.config().frame_period());
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_frame = Instant::now();

    loop {
        tokio::select! {
            text = incoming.recv() => match text {
                Some(text) => {
                    let _ = session.handle_text(&text);
                }
                None => {
                    info!("Inbound stream closed");
                    break;
                }
            },
            _ = frames.tick() => {
                let now = Instant::now();
                let dt = now.duration_since(last_frame).as_secs_f64();
                last_frame = now;
                let frame_input = *input.borrow();
                session.frame(dt, frame_input);
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
