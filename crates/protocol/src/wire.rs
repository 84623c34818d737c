//! Wire-Format fuer TCP-Verbindungen
//!
//! Frame-basiertes Protokoll: Length(u16 big-endian) + Kommando-Byte + Felder.
//!
//! ## Frame-Format
//!
//! ```text
//! +--------+--------+---------+----...----+
//! | Laenge (u16 BE) | Kommando| Felder     |
//! +--------+--------+---------+----...----+
//! ```
//!
//! Die Laenge zaehlt Kommando-Byte und Felder, nicht die 2 Laengen-Bytes.
//!
//! ## String-Felder
//!
//! ```text
//! +----+----+----+----+----...----+
//! | Bytes (u32 BE)    | UTF-16BE   |
//! +----+----+----+----+----...----+
//! ```
//!
//! `0xFFFF_FFFF` steht fuer einen Null-String und wird als `""` gelesen.
//! Listen werden komma-getrennt in einem einzigen String uebertragen.

use bytes::{Buf, BufMut, BytesMut};
use netchat_core::types::ClientId;
use std::io;
use tokio_util::codec::{Decoder, Encoder};

use crate::command::{Command, ErrorCode};
use crate::frame::{liste_teilen, liste_verbinden, Frame};

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Groesse des Laengen-Felds in Bytes
pub const LENGTH_FIELD_SIZE: usize = 2;

/// Maximale Groesse von Kommando + Feldern (durch das u16-Laengenfeld begrenzt)
pub const MAX_FRAME_BODY: usize = u16::MAX as usize;

/// Markierung fuer einen Null-String
const NULL_STRING: u32 = 0xFFFF_FFFF;

// ---------------------------------------------------------------------------
// Richtung
// ---------------------------------------------------------------------------

/// Auf welcher Seite der Verbindung ein Codec arbeitet
///
/// Bestimmt das Feldlayout, mit dem die Kommandos 5 und 6 dekodiert werden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Richtung {
    /// Server: dekodiert Client->Server-Layouts
    Server,
    /// Client: dekodiert Server->Client-Layouts
    Client,
}

// ---------------------------------------------------------------------------
// FrameCodec
// ---------------------------------------------------------------------------

/// tokio-util Codec fuer das netchat-Frame-Format
///
/// Implementiert `Encoder<Frame>` und `Decoder` fuer nahtlose Integration
/// mit `tokio_util::codec::Framed`. Teilweise angekommene Frames bleiben im
/// Lese-Buffer von `Framed`, bis sie vollstaendig sind.
///
/// # Beispiel
///
/// ```rust,no_run
/// use tokio_util::codec::Framed;
/// use netchat_protocol::wire::FrameCodec;
///
/// // let stream = TcpStream::connect(...).await?;
/// // let framed = Framed::new(stream, FrameCodec::client());
/// ```
#[derive(Debug, Clone)]
pub struct FrameCodec {
    richtung: Richtung,
}

impl FrameCodec {
    /// Codec fuer die Server-Seite einer Verbindung
    pub fn server() -> Self {
        Self {
            richtung: Richtung::Server,
        }
    }

    /// Codec fuer die Client-Seite einer Verbindung
    pub fn client() -> Self {
        Self {
            richtung: Richtung::Client,
        }
    }

    /// Dekodiert Kommando und Felder eines vollstaendigen Frame-Rumpfs
    fn frame_lesen(&self, rumpf: &[u8]) -> Frame {
        let mut leser = FeldLeser::neu(&rumpf[1..]);
        let code = rumpf[0];

        let Some(command) = Command::aus_code(code) else {
            return Frame::Unbekannt { code };
        };

        match command {
            Command::RegisterRequest => Frame::RegisterRequest {
                client_id: leser.client_id(),
                name: leser.string(),
            },
            Command::RegisteredClients => Frame::RegisteredClients {
                eintraege: leser.liste(),
            },
            Command::ClientJoined => Frame::ClientJoined {
                client_id: leser.client_id(),
                name: leser.string(),
            },
            Command::ClientLeft => Frame::ClientLeft {
                client_id: leser.client_id(),
                name: leser.string(),
            },
            Command::MessageToAll => match self.richtung {
                Richtung::Server => Frame::MessageToAllRequest {
                    text: leser.string(),
                },
                Richtung::Client => Frame::MessageToAll {
                    absender_id: leser.client_id(),
                    absender_name: leser.string(),
                    text: leser.string(),
                },
            },
            Command::MessageToSelected => match self.richtung {
                Richtung::Server => Frame::MessageToSelectedRequest {
                    empfaenger: leser.liste(),
                    text: leser.string(),
                },
                Richtung::Client => Frame::MessageToSelected {
                    empfaenger: leser.liste(),
                    absender_id: leser.client_id(),
                    absender_name: leser.string(),
                    text: leser.string(),
                },
            },
            Command::ServerBroadcast => Frame::ServerBroadcast {
                text: leser.string(),
            },
            Command::ServerPrivate => Frame::ServerPrivate {
                text: leser.string(),
            },
            Command::RegistrationSuccess => Frame::RegistrationSuccess,
            Command::DisconnectAll => Frame::DisconnectAll,
            Command::DeregisterRequest => Frame::DeregisterRequest,
            Command::Deregistered => Frame::Deregistered,
            Command::Ping => Frame::Ping,
            Command::LivenessAnnounce => Frame::LivenessAnnounce {
                client_id: leser.client_id(),
            },
            Command::ErrIdentityTaken
            | Command::ErrNameInvalid
            | Command::ErrNameUsed
            | Command::ErrNameReserved => match ErrorCode::aus_command(command) {
                Some(fehler) => Frame::Error(fehler),
                None => Frame::Unbekannt { code },
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Decoder-Implementierung
// ---------------------------------------------------------------------------

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            // Warte auf mindestens 2 Bytes fuer das Laengen-Feld
            if src.len() < LENGTH_FIELD_SIZE {
                return Ok(None);
            }

            // Laenge lesen (big-endian u16) ohne den Buffer zu veraendern
            let length = u16::from_be_bytes([src[0], src[1]]) as usize;

            // Pruefen ob der vollstaendige Frame bereits im Buffer ist
            let total_size = LENGTH_FIELD_SIZE + length;
            if src.len() < total_size {
                // Speicher vorbelegen um Reallocations zu vermeiden
                src.reserve(total_size - src.len());
                return Ok(None);
            }

            src.advance(LENGTH_FIELD_SIZE);
            let rumpf = src.split_to(length);

            // Frame ohne Kommando-Byte: nichts zu melden, weiterlesen
            if rumpf.is_empty() {
                continue;
            }

            return Ok(Some(self.frame_lesen(&rumpf)));
        }
    }
}

// ---------------------------------------------------------------------------
// Encoder-Implementierung
// ---------------------------------------------------------------------------

impl Encoder<Frame> for FrameCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let rumpf = rumpf_kodieren(&item);

        // Groesse pruefen
        if rumpf.len() > MAX_FRAME_BODY {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Frame zu gross: {} Bytes (Maximum: {} Bytes)",
                    rumpf.len(),
                    MAX_FRAME_BODY
                ),
            ));
        }

        // Laengen-Feld + Rumpf schreiben
        dst.reserve(LENGTH_FIELD_SIZE + rumpf.len());
        dst.put_u16(rumpf.len() as u16);
        dst.put_slice(&rumpf);

        Ok(())
    }
}

/// Prueft ob ein Frame kodiert in das u16-Laengenfeld passt
///
/// Der Server haengt Absender-Id und Name an weitergeleitete Nachrichten;
/// eine gerade noch gueltige Anfrage kann dadurch zu gross werden.
pub fn passt_in_frame(frame: &Frame) -> bool {
    rumpf_kodieren(frame).len() <= MAX_FRAME_BODY
}

fn rumpf_kodieren(frame: &Frame) -> BytesMut {
    let mut rumpf = BytesMut::new();
    rumpf.put_u8(frame.code());
    felder_schreiben(frame, &mut rumpf);
    rumpf
}

fn felder_schreiben(frame: &Frame, dst: &mut BytesMut) {
    match frame {
        Frame::RegisterRequest { client_id, name }
        | Frame::ClientJoined { client_id, name }
        | Frame::ClientLeft { client_id, name } => {
            string_schreiben(dst, client_id.as_str());
            string_schreiben(dst, name);
        }
        Frame::RegisteredClients { eintraege } => {
            string_schreiben(dst, &liste_verbinden(eintraege));
        }
        Frame::MessageToAllRequest { text }
        | Frame::ServerBroadcast { text }
        | Frame::ServerPrivate { text } => {
            string_schreiben(dst, text);
        }
        Frame::MessageToAll {
            absender_id,
            absender_name,
            text,
        } => {
            string_schreiben(dst, absender_id.as_str());
            string_schreiben(dst, absender_name);
            string_schreiben(dst, text);
        }
        Frame::MessageToSelectedRequest { empfaenger, text } => {
            string_schreiben(dst, &liste_verbinden(empfaenger));
            string_schreiben(dst, text);
        }
        Frame::MessageToSelected {
            empfaenger,
            absender_id,
            absender_name,
            text,
        } => {
            string_schreiben(dst, &liste_verbinden(empfaenger));
            string_schreiben(dst, absender_id.as_str());
            string_schreiben(dst, absender_name);
            string_schreiben(dst, text);
        }
        Frame::LivenessAnnounce { client_id } => {
            string_schreiben(dst, client_id.as_str());
        }
        Frame::RegistrationSuccess
        | Frame::DisconnectAll
        | Frame::DeregisterRequest
        | Frame::Deregistered
        | Frame::Ping
        | Frame::Error(_)
        | Frame::Unbekannt { .. } => {}
    }
}

// ---------------------------------------------------------------------------
// String-Kodierung
// ---------------------------------------------------------------------------

/// Schreibt einen String als u32-Bytelaenge + UTF-16BE
fn string_schreiben(dst: &mut BytesMut, text: &str) {
    let einheiten: Vec<u16> = text.encode_utf16().collect();
    dst.put_u32((einheiten.len() * 2) as u32);
    for einheit in einheiten {
        dst.put_u16(einheit);
    }
}

/// Nachsichtiger Leser fuer die Felder eines vollstaendigen Frames
///
/// Fehlende oder abgeschnittene Felder ergeben leere Strings, der Rest des
/// Frames wird dann ignoriert.
struct FeldLeser<'a> {
    daten: &'a [u8],
}

impl<'a> FeldLeser<'a> {
    fn neu(daten: &'a [u8]) -> Self {
        Self { daten }
    }

    fn string(&mut self) -> String {
        if self.daten.len() < 4 {
            self.daten = &[];
            return String::new();
        }
        let laenge = self.daten.get_u32();
        if laenge == NULL_STRING {
            return String::new();
        }

        let laenge = laenge as usize;
        if laenge > self.daten.len() {
            self.daten = &[];
            return String::new();
        }

        let (bytes, rest) = self.daten.split_at(laenge);
        self.daten = rest;

        let einheiten: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|paar| u16::from_be_bytes([paar[0], paar[1]]))
            .collect();
        String::from_utf16_lossy(&einheiten)
    }

    fn client_id(&mut self) -> ClientId {
        ClientId::from(self.string())
    }

    fn liste(&mut self) -> Vec<String> {
        liste_teilen(&self.string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
