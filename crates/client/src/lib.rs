//! netchat-client – Client-Kern fuer den Netchat-Server
//!
//! Baut die TCP-Verbindung auf, meldet die eigene Identitaet und setzt
//! eingehende Frames in `ClientEvent`s um. Eine Oberflaeche konsumiert nur
//! den Event-Kanal und ruft die Kommandos von `ChatClient` auf.

pub mod connection;
pub mod error;
pub mod event;

pub use connection::ChatClient;
pub use error::{ClientError, ClientResult};
pub use event::ClientEvent;
