//! netchat-protocol – Netzwerkprotokoll-Definitionen
//!
//! Dieses Crate definiert die Kommando-Tags, die typisierten Frames und den
//! Codec fuer das laengen-praefixierte Wire-Format zwischen Client und Server.

pub mod command;
pub mod frame;
pub mod wire;

pub use command::{Command, ErrorCode};
pub use frame::Frame;
pub use wire::FrameCodec;
