//! Integration-Tests fuer den Client-Kern gegen einen echten Server (Loopback)

use netchat_client::{ChatClient, ClientError, ClientEvent};
use netchat_core::Empfaenger;
use netchat_protocol::ErrorCode;
use netchat_signaling::{SignalingConfig, SignalingServer, SignalingState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

struct TestServer {
    state: Arc<SignalingState>,
    port: u16,
    shutdown_tx: watch::Sender<bool>,
}

async fn server() -> TestServer {
    let state = SignalingState::neu(SignalingConfig::default());
    let server = SignalingServer::binden(Arc::clone(&state), "127.0.0.1:0".parse().unwrap())
        .await
        .expect("Bind fehlgeschlagen");
    let port = server.lokale_adresse().unwrap().port();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(server.starten(shutdown_rx));
    TestServer {
        state,
        port,
        shutdown_tx,
    }
}

async fn naechstes(rx: &mut mpsc::Receiver<ClientEvent>) -> ClientEvent {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("Timeout beim Warten auf Ereignis")
        .expect("Event-Kanal beendet")
}

#[tokio::test]
async fn registrieren_und_nachricht_mit_echo() {
    let s = server().await;
    let (alice, mut rx_a) = ChatClient::verbinden("127.0.0.1", s.port).await.unwrap();
    let (bob, mut rx_b) = ChatClient::verbinden("127.0.0.1", s.port).await.unwrap();

    alice.registrieren("alice").await.unwrap();
    assert_eq!(naechstes(&mut rx_a).await, ClientEvent::Verzeichnis(vec![]));

    bob.registrieren("bobby").await.unwrap();
    assert_eq!(
        naechstes(&mut rx_b).await,
        ClientEvent::Verzeichnis(vec![("alice".to_string(), alice.client_id().clone())])
    );
    assert_eq!(
        naechstes(&mut rx_a).await,
        ClientEvent::PeerBeigetreten {
            client_id: bob.client_id().clone(),
            name: "bobby".into()
        }
    );

    alice.senden("hallo", Empfaenger::Alle).await.unwrap();

    match naechstes(&mut rx_a).await {
        ClientEvent::Nachricht { text, eigene, .. } => {
            assert_eq!(text, "hallo");
            assert!(eigene);
        }
        andere => panic!("Nachricht erwartet, war {:?}", andere),
    }
    match naechstes(&mut rx_b).await {
        ClientEvent::Nachricht {
            text,
            eigene,
            absender_name,
            ..
        } => {
            assert_eq!(text, "hallo");
            assert_eq!(absender_name, "alice");
            assert!(!eigene);
        }
        andere => panic!("Nachricht erwartet, war {:?}", andere),
    }
}

#[tokio::test]
async fn private_nachricht_an_auswahl() {
    let s = server().await;
    let (alice, mut rx_a) = ChatClient::verbinden("127.0.0.1", s.port).await.unwrap();
    let (bob, mut rx_b) = ChatClient::verbinden("127.0.0.1", s.port).await.unwrap();
    let (carol, mut rx_c) = ChatClient::verbinden("127.0.0.1", s.port).await.unwrap();

    alice.registrieren("alice").await.unwrap();
    naechstes(&mut rx_a).await;
    bob.registrieren("bobby").await.unwrap();
    naechstes(&mut rx_b).await;
    naechstes(&mut rx_a).await;
    carol.registrieren("carol").await.unwrap();
    naechstes(&mut rx_c).await;
    naechstes(&mut rx_a).await;
    naechstes(&mut rx_b).await;

    let eintrag = format!("bobby {}", bob.client_id());
    alice
        .an_ausgewaehlte_senden("psst", vec![eintrag.clone()])
        .await
        .unwrap();

    for rx in [&mut rx_a, &mut rx_b] {
        match naechstes(rx).await {
            ClientEvent::Nachricht {
                text, empfaenger, ..
            } => {
                assert_eq!(text, "psst");
                assert_eq!(empfaenger, Some(vec![eintrag.clone()]));
            }
            andere => panic!("Nachricht erwartet, war {:?}", andere),
        }
    }

    // Carol erhaelt nur ihr eigenes Pong
    carol.ping().await.unwrap();
    assert_eq!(
        naechstes(&mut rx_c).await,
        ClientEvent::ServerNachricht {
            text: "pong".into(),
            privat: true
        }
    );
}

#[tokio::test]
async fn abgelehnte_registrierung_trennt() {
    let s = server().await;
    let (client, mut rx) = ChatClient::verbinden("127.0.0.1", s.port).await.unwrap();

    client.registrieren("client").await.unwrap();
    assert_eq!(
        naechstes(&mut rx).await,
        ClientEvent::RegistrierungAbgelehnt(ErrorCode::NameReserved)
    );
    assert!(matches!(naechstes(&mut rx).await, ClientEvent::Getrennt { .. }));
    assert!(!client.ist_verbunden());
    assert!(matches!(
        client.ping().await,
        Err(ClientError::NichtVerbunden)
    ));
}

#[tokio::test]
async fn abmelden_durch_server_und_shutdown() {
    let s = server().await;
    let (client, mut rx) = ChatClient::verbinden("127.0.0.1", s.port).await.unwrap();
    client.registrieren("alice").await.unwrap();
    naechstes(&mut rx).await;

    s.state.registry.alle_deregistrieren();
    assert_eq!(naechstes(&mut rx).await, ClientEvent::Deregistriert);

    s.state.registry.server_nachricht("Wartung", &[]);
    // Abgemeldete Clients erhalten keine Broadcasts mehr
    client.ping().await.unwrap();
    assert_eq!(
        naechstes(&mut rx).await,
        ClientEvent::ServerNachricht {
            text: "pong".into(),
            privat: true
        }
    );

    s.state.herunterfahren(&s.shutdown_tx);
    assert_eq!(naechstes(&mut rx).await, ClientEvent::ServerGestoppt);
    assert!(matches!(naechstes(&mut rx).await, ClientEvent::Getrennt { .. }));
}

#[tokio::test]
async fn trennen_meldet_verlassen() {
    let s = server().await;
    let (alice, mut rx_a) = ChatClient::verbinden("127.0.0.1", s.port).await.unwrap();
    let (bob, mut rx_b) = ChatClient::verbinden("127.0.0.1", s.port).await.unwrap();
    alice.registrieren("alice").await.unwrap();
    naechstes(&mut rx_a).await;
    bob.registrieren("bobby").await.unwrap();
    naechstes(&mut rx_b).await;
    naechstes(&mut rx_a).await;

    bob.trennen().await.unwrap();
    assert!(matches!(naechstes(&mut rx_b).await, ClientEvent::Getrennt { .. }));
    assert_eq!(
        naechstes(&mut rx_a).await,
        ClientEvent::PeerVerlassen {
            client_id: bob.client_id().clone(),
            name: "bobby".into()
        }
    );
}

#[tokio::test]
async fn verbindung_abgelehnt_ist_io_fehler() {
    // Freien Port ermitteln und wieder freigeben
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let ergebnis = ChatClient::verbinden("127.0.0.1", port).await;
    assert!(matches!(ergebnis, Err(ClientError::Io(_))));
}

#[tokio::test]
async fn identitaet_wird_gemeldet() {
    let s = server().await;
    let (client, mut rx) = ChatClient::verbinden("127.0.0.1", s.port).await.unwrap();
    assert!(!client.client_id().ist_unbekannt());

    client.registrieren("alice").await.unwrap();
    naechstes(&mut rx).await;
    assert_eq!(
        s.state.registry.verzeichnis(None),
        vec![format!("alice {}", client.client_id())]
    );
}
