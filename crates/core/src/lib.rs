//! netchat-core – Gemeinsame Typen und Ereignisse
//!
//! Dieses Crate stellt die Bausteine bereit, die Protokoll, Server-Kern und
//! Client-Kern gemeinsam nutzen.

pub mod event;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use event::{ChatEvent, Empfaenger};
pub use types::{ClientId, ConnectionId};
