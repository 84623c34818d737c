//! Kommando-Tags des netchat-Protokolls
//!
//! Jedes Frame traegt nach dem Laengen-Feld genau ein Byte, das den
//! Nachrichtentyp bestimmt. Die Menge ist geschlossen; unbekannte Bytes
//! werden vom Codec als `Frame::Unbekannt` gemeldet.

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// Alle bekannten Kommando-Bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// C->S: id, name
    RegisterRequest = 1,
    /// S->C: komma-getrennte `"name id"`-Liste
    RegisteredClients = 2,
    /// S->C: id, name
    ClientJoined = 3,
    /// S->C: id, name
    ClientLeft = 4,
    /// Beide Richtungen, Feldlayout richtungsabhaengig
    MessageToAll = 5,
    /// Beide Richtungen, Feldlayout richtungsabhaengig
    MessageToSelected = 6,
    /// S->C: text
    ServerBroadcast = 7,
    /// S->C: text
    ServerPrivate = 8,
    /// S->C: wird nie gesendet, nur dekodiert
    RegistrationSuccess = 9,
    /// S->C: Server wird gestoppt
    DisconnectAll = 10,
    /// C->S
    DeregisterRequest = 11,
    /// S->C: Server hat den Client abgemeldet
    Deregistered = 14,
    /// C->S
    Ping = 15,
    /// C->S: id
    LivenessAnnounce = 16,
    ErrIdentityTaken = 201,
    ErrNameInvalid = 202,
    ErrNameUsed = 203,
    ErrNameReserved = 204,
}

impl Command {
    /// Gibt das Byte auf dem Draht zurueck
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Ordnet ein Byte dem Kommando zu
    pub fn aus_code(code: u8) -> Option<Self> {
        let command = match code {
            1 => Self::RegisterRequest,
            2 => Self::RegisteredClients,
            3 => Self::ClientJoined,
            4 => Self::ClientLeft,
            5 => Self::MessageToAll,
            6 => Self::MessageToSelected,
            7 => Self::ServerBroadcast,
            8 => Self::ServerPrivate,
            9 => Self::RegistrationSuccess,
            10 => Self::DisconnectAll,
            11 => Self::DeregisterRequest,
            14 => Self::Deregistered,
            15 => Self::Ping,
            16 => Self::LivenessAnnounce,
            201 => Self::ErrIdentityTaken,
            202 => Self::ErrNameInvalid,
            203 => Self::ErrNameUsed,
            204 => Self::ErrNameReserved,
            _ => return None,
        };
        Some(command)
    }

    /// Darf ein noch nicht registrierter Client dieses Kommando senden?
    ///
    /// Alles andere wird vor der Registrierung stillschweigend verworfen.
    pub fn vor_registrierung_erlaubt(self) -> bool {
        matches!(
            self,
            Self::RegisterRequest | Self::LivenessAnnounce | Self::Ping
        )
    }
}

impl TryFrom<u8> for Command {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::aus_code(code).ok_or(code)
    }
}

// ---------------------------------------------------------------------------
// Fehler-Codes
// ---------------------------------------------------------------------------

/// Gruende fuer eine abgelehnte Registrierung (Kommandos 201–204)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Ein registrierter Client traegt bereits diese Identitaet
    IdentityTaken,
    /// Name verletzt Laenge oder Zeichensatz
    NameInvalid,
    /// Name ist bereits (case-insensitiv) vergeben
    NameUsed,
    /// Name steht auf der Liste reservierter Namen
    NameReserved,
}

impl ErrorCode {
    /// Kommando-Byte, unter dem der Fehler gesendet wird
    pub fn command(self) -> Command {
        match self {
            Self::IdentityTaken => Command::ErrIdentityTaken,
            Self::NameInvalid => Command::ErrNameInvalid,
            Self::NameUsed => Command::ErrNameUsed,
            Self::NameReserved => Command::ErrNameReserved,
        }
    }

    /// Umkehrung von [`ErrorCode::command`]
    pub fn aus_command(command: Command) -> Option<Self> {
        match command {
            Command::ErrIdentityTaken => Some(Self::IdentityTaken),
            Command::ErrNameInvalid => Some(Self::NameInvalid),
            Command::ErrNameUsed => Some(Self::NameUsed),
            Command::ErrNameReserved => Some(Self::NameReserved),
            _ => None,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::IdentityTaken => "Identitaet bereits angemeldet",
            Self::NameInvalid => "Name ungueltig",
            Self::NameUsed => "Name bereits vergeben",
            Self::NameReserved => "Name reserviert",
        };
        f.write_str(text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alle_codes_umkehrbar() {
        for code in 0..=u8::MAX {
            if let Some(command) = Command::aus_code(code) {
                assert_eq!(command.code(), code);
            }
        }
    }

    #[test]
    fn unbekannte_codes() {
        for code in [0u8, 12, 13, 17, 100, 200, 205, 255] {
            assert_eq!(Command::try_from(code), Err(code));
        }
    }

    #[test]
    fn nur_drei_kommandos_vor_registrierung() {
        let erlaubt: Vec<Command> = (0..=u8::MAX)
            .filter_map(Command::aus_code)
            .filter(|c| c.vor_registrierung_erlaubt())
            .collect();
        assert_eq!(
            erlaubt,
            vec![
                Command::RegisterRequest,
                Command::Ping,
                Command::LivenessAnnounce
            ]
        );
    }

    #[test]
    fn fehler_codes_auf_201_bis_204() {
        assert_eq!(ErrorCode::IdentityTaken.command().code(), 201);
        assert_eq!(ErrorCode::NameInvalid.command().code(), 202);
        assert_eq!(ErrorCode::NameUsed.command().code(), 203);
        assert_eq!(ErrorCode::NameReserved.command().code(), 204);

        for code in [
            ErrorCode::IdentityTaken,
            ErrorCode::NameInvalid,
            ErrorCode::NameUsed,
            ErrorCode::NameReserved,
        ] {
            assert_eq!(ErrorCode::aus_command(code.command()), Some(code));
        }
        assert_eq!(ErrorCode::aus_command(Command::Ping), None);
    }
}
