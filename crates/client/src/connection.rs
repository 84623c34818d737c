//! Client-seitige TCP-Verbindung zum Netchat-Server
//!
//! Nutzt den FrameCodec aus netchat-protocol in Client-Richtung. Ein
//! Lese-Task setzt eingehende Frames in `ClientEvent`s um; Kommandos
//! schreiben ueber die geteilte Sende-Haelfte.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use netchat_core::{ClientId, Empfaenger};
use netchat_protocol::{Frame, FrameCodec};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_util::codec::Framed;

use crate::error::{ClientError, ClientResult};
use crate::event::ClientEvent;

/// Zeitlimit fuer den Verbindungsaufbau
pub const VERBINDUNGS_TIMEOUT: Duration = Duration::from_secs(3);

const EVENT_KANAL_GROESSE: usize = 256;

type SendeHaelfte = SplitSink<Framed<TcpStream, FrameCodec>, Frame>;
type LeseHaelfte = SplitStream<Framed<TcpStream, FrameCodec>>;

/// Verbindung zum Netchat-Server
pub struct ChatClient {
    sender: Arc<Mutex<SendeHaelfte>>,
    client_id: ClientId,
    verbunden: Arc<AtomicBool>,
}

impl ChatClient {
    /// Baut die TCP-Verbindung auf und meldet die eigene Identitaet
    ///
    /// Gibt den Client und den Kanal zurueck, ueber den alle Ereignisse
    /// eintreffen. Der Kanal endet nach `ClientEvent::Getrennt`.
    pub async fn verbinden(
        host: &str,
        port: u16,
    ) -> ClientResult<(Self, mpsc::Receiver<ClientEvent>)> {
        let adresse = format!("{}:{}", host, port);
        tracing::info!("Verbinde mit {}", adresse);

        let stream = tokio::time::timeout(VERBINDUNGS_TIMEOUT, TcpStream::connect(&adresse))
            .await
            .map_err(|_| ClientError::Timeout(adresse.clone()))??;
        stream.set_nodelay(true)?;
        tracing::info!("TCP-Verbindung hergestellt zu {}", adresse);

        let (sender, empfaenger) = Framed::new(stream, FrameCodec::client()).split();
        let client = Self {
            sender: Arc::new(Mutex::new(sender)),
            client_id: ClientId::generieren(),
            verbunden: Arc::new(AtomicBool::new(true)),
        };

        let (event_tx, event_rx) = mpsc::channel(EVENT_KANAL_GROESSE);
        tokio::spawn(lesen(
            empfaenger,
            Arc::clone(&client.sender),
            Arc::clone(&client.verbunden),
            client.client_id.clone(),
            event_tx,
        ));

        client
            .frame_senden(Frame::LivenessAnnounce {
                client_id: client.client_id.clone(),
            })
            .await?;

        Ok((client, event_rx))
    }

    /// Eigene Identitaet (`{uuid}`)
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    pub fn ist_verbunden(&self) -> bool {
        self.verbunden.load(Ordering::Acquire)
    }

    /// Beansprucht einen Anzeigenamen
    pub async fn registrieren(&self, name: &str) -> ClientResult<()> {
        self.frame_senden(Frame::RegisterRequest {
            client_id: self.client_id.clone(),
            name: name.to_string(),
        })
        .await
    }

    /// Meldet sich ab, ohne die Verbindung zu trennen
    pub async fn deregistrieren(&self) -> ClientResult<()> {
        self.frame_senden(Frame::DeregisterRequest).await
    }

    pub async fn an_alle_senden(&self, text: &str) -> ClientResult<()> {
        self.frame_senden(Frame::MessageToAllRequest {
            text: text.to_string(),
        })
        .await
    }

    /// Sendet an ausgewaehlte Teilnehmer (`"name id"` oder nur `id`)
    pub async fn an_ausgewaehlte_senden(&self, text: &str, empfaenger: Vec<String>) -> ClientResult<()> {
        self.frame_senden(Frame::MessageToSelectedRequest {
            empfaenger,
            text: text.to_string(),
        })
        .await
    }

    /// Sendet an den angegebenen Empfaengerkreis
    pub async fn senden(&self, text: &str, empfaenger: Empfaenger) -> ClientResult<()> {
        match empfaenger {
            Empfaenger::Alle => self.an_alle_senden(text).await,
            Empfaenger::Ausgewaehlt(liste) => self.an_ausgewaehlte_senden(text, liste).await,
        }
    }

    /// Lebenszeichen; der Server antwortet mit `ServerNachricht("pong")`
    pub async fn ping(&self) -> ClientResult<()> {
        self.frame_senden(Frame::Ping).await
    }

    /// Schliesst die Sende-Haelfte; der Lese-Task endet mit `Getrennt`
    pub async fn trennen(&self) -> ClientResult<()> {
        if !self.verbunden.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        tracing::info!("Verbindung wird getrennt");
        self.sender.lock().await.close().await?;
        Ok(())
    }

    async fn frame_senden(&self, frame: Frame) -> ClientResult<()> {
        if !self.ist_verbunden() {
            return Err(ClientError::NichtVerbunden);
        }
        self.sender.lock().await.send(frame).await?;
        Ok(())
    }
}

/// Lese-Task: Frames vom Server in Ereignisse umsetzen
async fn lesen(
    mut empfaenger: LeseHaelfte,
    sender: Arc<Mutex<SendeHaelfte>>,
    verbunden: Arc<AtomicBool>,
    client_id: ClientId,
    event_tx: mpsc::Sender<ClientEvent>,
) {
    let grund = loop {
        match empfaenger.next().await {
            Some(Ok(frame)) => {
                let Some(event) = ClientEvent::aus_frame(frame, &client_id) else {
                    continue;
                };
                let schliessen = event.beendet_verbindung();
                if event_tx.send(event).await.is_err() {
                    break "Event-Kanal geschlossen".to_string();
                }
                if schliessen {
                    break "vom Server beendet".to_string();
                }
            }
            Some(Err(e)) => {
                tracing::warn!(fehler = %e, "Frame-Lesefehler");
                break format!("Lesefehler: {}", e);
            }
            None => break "Verbindung vom Server getrennt".to_string(),
        }
    };

    if verbunden.swap(false, Ordering::AcqRel) {
        let _ = sender.lock().await.close().await;
    }
    tracing::info!(grund = %grund, "Verbindung beendet");
    let _ = event_tx.send(ClientEvent::Getrennt { grund }).await;
}
