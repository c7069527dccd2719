//! Network Layer
//!
//! Wire protocol, snapshot reconciliation, and the client session that ties
//! the local simulation to a server connection. Nothing in `game/` depends on
//! this module.

pub mod protocol;
pub mod sync;
pub mod transport;
pub mod session;

pub use protocol::{AuthResponse, ClientMessage, ProtocolError, ServerMessage, StateMessage};
pub use sync::{apply_roster, apply_snapshot, HunterSnapshot, PositionReporter, Snapshot};
pub use transport::{connect, ChannelTransport, Connection, Transport, TransportError};
pub use session::{run_client, ClientSession, LoginState, SessionError};
