//! Handler fuer alle Client-Kommandos
//!
//! Jeder Handler ist fuer eine Gruppe von Kommandos zustaendig und hat
//! Zugriff auf den gemeinsamen SignalingState.

pub mod auth_handler;
pub mod chat_handler;
