//! netchat-signaling – TCP-Chat-Server
//!
//! Dieser Crate implementiert den Session- und Routing-Dienst fuer
//! Netchat. Er verwaltet TCP-Verbindungen, vergibt eindeutige Namen und
//! verteilt Nachrichten an alle oder ausgewaehlte Teilnehmer.
//!
//! ## Architektur
//!
//! ```text
//! TCP Listener (SignalingServer)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |  Zustand: Unregistriert -> Registriert -> Deregistriert
//!     |
//!     v
//! MessageDispatcher
//!     |
//!     +-- AuthHandler  (Register, Liveness, Deregister)
//!     +-- ChatHandler  (MessageToAll, MessageToSelected, Ping)
//!
//! Registry – Sessions, Namensvergabe, Fan-out ueber Send-Queues
//! ```

pub mod broadcast;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod server_state;
pub mod session;
pub mod tcp;

// Bequeme Re-Exporte
pub use broadcast::SessionSender;
pub use connection::ClientConnection;
pub use dispatcher::{MessageDispatcher, Steuerung};
pub use error::{RegistrierungsFehler, SignalingError, SignalingResult};
pub use registry::Registry;
pub use server_state::{SignalingConfig, SignalingState};
pub use session::{Session, SessionZustand};
pub use tcp::SignalingServer;
