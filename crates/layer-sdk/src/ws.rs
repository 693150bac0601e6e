//! Websocket transport over `tokio-tungstenite`.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use crate::error::SdkError;
use crate::socket::{SocketConnection, SocketConnector, SocketEndpoint, SocketEvent};

/// Opens sockets as background tasks on the current tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

enum Command {
    Text(String),
    Close,
}

struct WsConnection {
    commands: mpsc::UnboundedSender<Command>,
}

impl SocketConnection for WsConnection {
    fn send_text(&self, text: String) -> Result<(), SdkError> {
        self.commands
            .send(Command::Text(text))
            .map_err(|_| SdkError::Connection("websocket is closed".into()))
    }

    fn close(&self) {
        let _ = self.commands.send(Command::Close);
    }
}

impl SocketConnector for WsConnector {
    fn open(
        &self,
        endpoint: &SocketEndpoint,
        events: mpsc::UnboundedSender<SocketEvent>,
    ) -> Result<Box<dyn SocketConnection>, SdkError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SdkError::Connection(format!("no tokio runtime: {e}")))?;

        let mut request = endpoint.url.as_str().into_client_request()?;
        let protocol = HeaderValue::from_str(&endpoint.protocol)
            .map_err(|e| SdkError::Connection(format!("invalid subprotocol: {e}")))?;
        request.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, protocol);

        let (commands, rx) = mpsc::unbounded_channel();
        runtime.spawn(run(request, rx, events));

        Ok(Box::new(WsConnection { commands }))
    }
}

async fn run(
    request: Request,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<SocketEvent>,
) {
    let stream = match tokio_tungstenite::connect_async(request).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            warn!(error = %e, "websocket handshake failed");
            let _ = events.send(SocketEvent::Error(e.to_string()));
            let _ = events.send(SocketEvent::Closed);
            return;
        }
    };
    let _ = events.send(SocketEvent::Opened);

    let (mut sink, mut source) = stream.split();
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Text(text)) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        warn!(error = %e, "websocket send failed");
                        let _ = events.send(SocketEvent::Error(e.to_string()));
                        break;
                    }
                }
                // Every handle dropped counts as a close request.
                Some(Command::Close) | None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(SocketEvent::Message(text));
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "websocket receive failed");
                    let _ = events.send(SocketEvent::Error(e.to_string()));
                    break;
                }
            },
        }
    }

    debug!("websocket closed");
    let _ = events.send(SocketEvent::Closed);
}
