//! WebSocket client connection to the analysis server.
//!
//! One long-lived task pumps control messages out through whatever sink the
//! current connection provides; the connect loop reads inbound messages and
//! forwards them to the event loop. Losing the connection is reported as a
//! `Connection(false)` event and retried after a fixed delay.

use anyhow::Result;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use tv_common::Control;
use tv_engine::PlayerEvent;

use crate::protocol;
use crate::tagging::SessionTagger;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Transport configuration
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub url: String,
    pub reconnect_delay: Duration,
}

/// State shared between the reader and the outbound pump.
#[derive(Default)]
struct Link {
    sink: tokio::sync::Mutex<Option<SplitSink<WsStream, Message>>>,
    tagger: parking_lot::Mutex<SessionTagger>,
}

/// Why a connection's read loop returned.
enum ReadEnd {
    Closed,
    /// The event loop is gone; stop the transport.
    Shutdown,
}

/// Connect, read, and reconnect until the event loop hangs up.
pub async fn run(
    config: TransportConfig,
    events: mpsc::Sender<PlayerEvent>,
    outbound: mpsc::UnboundedReceiver<Control>,
) -> Result<()> {
    let link = Arc::new(Link::default());
    let pump = tokio::spawn(pump_outbound(link.clone(), outbound));

    loop {
        match connect_async(config.url.as_str()).await {
            Ok((ws, _response)) => {
                info!("Transport: connected to {}", config.url);
                let (write, read) = ws.split();
                *link.sink.lock().await = Some(write);
                {
                    let mut tagger = link.tagger.lock();
                    tagger.on_reconnect();
                    debug!("Transport: inbound session {}", tagger.current());
                }

                if events.send(PlayerEvent::Connection(true)).await.is_err() {
                    break;
                }

                let end = read_messages(&link, read, &events).await;
                *link.sink.lock().await = None;

                match end {
                    Ok(ReadEnd::Shutdown) => break,
                    Ok(ReadEnd::Closed) => info!("Transport: connection closed by server"),
                    Err(e) => warn!("Transport: connection error: {}", e),
                }

                if events.send(PlayerEvent::Connection(false)).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!("Transport: cannot reach {}: {}", config.url, e),
        }

        if events.is_closed() {
            break;
        }
        debug!("Transport: retrying in {:?}", config.reconnect_delay);
        tokio::time::sleep(config.reconnect_delay).await;
    }

    pump.abort();
    info!("Transport: stopped");
    Ok(())
}

async fn read_messages(
    link: &Link,
    mut read: SplitStream<WsStream>,
    events: &mpsc::Sender<PlayerEvent>,
) -> Result<ReadEnd> {
    while let Some(msg) = read.next().await {
        match msg? {
            Message::Text(text) => {
                let decoded = {
                    let mut tagger = link.tagger.lock();
                    protocol::decode(&text, &mut tagger)
                };
                match decoded {
                    Ok(inbound) => {
                        if events.send(PlayerEvent::Inbound(inbound)).await.is_err() {
                            return Ok(ReadEnd::Shutdown);
                        }
                    }
                    Err(e) => warn!("Transport: rejected message: {}", e),
                }
            }
            Message::Binary(data) => {
                warn!("Transport: ignoring {} byte binary message", data.len());
            }
            Message::Close(frame) => {
                debug!("Transport: close frame {:?}", frame);
                return Ok(ReadEnd::Closed);
            }
            // Pings are answered by tungstenite itself.
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
        }
    }

    Ok(ReadEnd::Closed)
}

/// Send control messages for as long as the event loop produces them.
/// While disconnected they are dropped; after a reconnect the engine's
/// next tick asks for frames again.
async fn pump_outbound(link: Arc<Link>, mut outbound: mpsc::UnboundedReceiver<Control>) {
    while let Some(control) = outbound.recv().await {
        let text = match protocol::encode(&control) {
            Ok(text) => text,
            Err(e) => {
                warn!("Transport: cannot encode {:?}: {}", control, e);
                continue;
            }
        };

        let mut sink = link.sink.lock().await;
        let Some(write) = sink.as_mut() else {
            warn!("Transport: not connected, dropping {:?}", control);
            continue;
        };

        // Tag before sending so a fast reply is already attributed.
        link.tagger.lock().on_outbound(&control);
        debug!("Transport: -> {}", text);
        if let Err(e) = write.send(Message::Text(text)).await {
            warn!("Transport: send failed: {}", e);
        }
    }
}
