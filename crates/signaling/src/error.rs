//! Fehlertypen fuer den Signaling-Service

use netchat_core::types::ConnectionId;
use netchat_protocol::ErrorCode;
use thiserror::Error;

/// Grund fuer eine abgelehnte Registrierung
///
/// Die Reihenfolge der Varianten entspricht der Pruefreihenfolge in
/// `Registry::registrieren`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistrierungsFehler {
    /// Ein registrierter Client traegt bereits diese Identitaet
    #[error("Identitaet bereits angemeldet")]
    IdentitaetVergeben,

    /// Name hat falsche Laenge oder unerlaubte Zeichen
    #[error("Name ungueltig")]
    NameUngueltig,

    /// Name ist reserviert
    #[error("Name reserviert")]
    NameReserviert,

    /// Name ist bereits vergeben
    #[error("Name bereits vergeben")]
    NameVergeben,
}

impl RegistrierungsFehler {
    /// Fehler-Code, der dem Client gesendet wird
    pub fn error_code(self) -> ErrorCode {
        match self {
            Self::IdentitaetVergeben => ErrorCode::IdentityTaken,
            Self::NameUngueltig => ErrorCode::NameInvalid,
            Self::NameReserviert => ErrorCode::NameReserved,
            Self::NameVergeben => ErrorCode::NameUsed,
        }
    }
}

/// Fehlertyp fuer den Signaling-Service
#[derive(Debug, Error)]
pub enum SignalingError {
    /// IO-Fehler (TCP, Socket)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Registrierung abgelehnt
    #[error("Registrierung abgelehnt: {0}")]
    Registrierung(#[from] RegistrierungsFehler),

    /// Verbindung ist nicht (mehr) in der Registry
    #[error("Unbekannte Verbindung: {0}")]
    UnbekannteVerbindung(ConnectionId),

    /// Registrierungsanfrage einer bereits registrierten Verbindung
    #[error("Verbindung {0} ist bereits registriert")]
    BereitsRegistriert(ConnectionId),
}

/// Result-Typ fuer den Signaling-Service
pub type SignalingResult<T> = Result<T, SignalingError>;
