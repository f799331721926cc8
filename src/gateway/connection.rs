//! Per-connection message loop.
//!
//! Frames are read one at a time, but each query runs on its own task.
//! Replies flow through a single writer task, so they are emitted in
//! completion order rather than request order.

use std::fmt::Display;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{Instrument, debug, info, instrument, warn};
use uuid::Uuid;

use super::protocol::ServerMessage;
use crate::cache::CacheBackend;
use crate::embedding::EmbeddingClient;
use crate::query::{ErrorCode, QueryProcessor};

/// Replies buffered per connection before in-flight tasks wait on the writer.
const OUTBOUND_BUFFER: usize = 64;

/// Transport-neutral inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Text(String),
    Binary(Vec<u8>),
    Close,
    /// Ping/pong and other control frames.
    Control,
}

impl From<Message> for Inbound {
    fn from(message: Message) -> Self {
        match message {
            Message::Text(text) => Inbound::Text(text.as_str().to_owned()),
            Message::Binary(bytes) => Inbound::Binary(bytes.to_vec()),
            Message::Close(_) => Inbound::Close,
            Message::Ping(_) | Message::Pong(_) => Inbound::Control,
        }
    }
}

/// Runs the message protocol for one client.
pub struct ConnectionHandler<E, C>
where
    E: EmbeddingClient + 'static,
    C: CacheBackend + 'static,
{
    processor: Arc<QueryProcessor<E, C>>,
    limiter: Option<Arc<Semaphore>>,
}

impl<E, C> Clone for ConnectionHandler<E, C>
where
    E: EmbeddingClient + 'static,
    C: CacheBackend + 'static,
{
    fn clone(&self) -> Self {
        Self {
            processor: Arc::clone(&self.processor),
            limiter: self.limiter.clone(),
        }
    }
}

impl<E, C> ConnectionHandler<E, C>
where
    E: EmbeddingClient + 'static,
    C: CacheBackend + 'static,
{
    /// `limiter` caps in-flight queries across every connection sharing it.
    pub fn new(processor: Arc<QueryProcessor<E, C>>, limiter: Option<Arc<Semaphore>>) -> Self {
        Self { processor, limiter }
    }

    /// Drives an axum WebSocket until the client goes away.
    pub async fn serve_socket(self, socket: WebSocket) {
        let (sink, stream) = socket.split();
        let outbound =
            sink.with(|text: String| async move { Ok::<_, axum::Error>(Message::Text(text.into())) });
        let inbound = stream.map(|frame| frame.map(Inbound::from));
        self.run(inbound, Box::pin(outbound)).await;
    }

    /// Drives any frame stream / text sink pair.
    ///
    /// Returns after the inbound stream ends and every in-flight query has
    /// finished. Replies to a closed sink are dropped.
    #[instrument(skip_all, fields(conn_id = %Uuid::new_v4()))]
    pub async fn run<S, O, SE>(&self, mut inbound: S, mut outbound: O)
    where
        S: Stream<Item = Result<Inbound, SE>> + Unpin + Send,
        SE: Display + Send,
        O: Sink<String> + Unpin + Send + 'static,
        O::Error: Display,
    {
        info!("Client connected");

        let (tx, mut rx) = mpsc::channel::<String>(OUTBOUND_BUFFER);
        let writer = tokio::spawn(
            async move {
                while let Some(frame) = rx.recv().await {
                    if let Err(e) = outbound.send(frame).await {
                        debug!(error = %e, "Socket closed, dropping pending replies");
                        break;
                    }
                }
                let _ = outbound.close().await;
            }
            .in_current_span(),
        );

        if tx.send(ServerMessage::welcome().to_json()).await.is_err() {
            warn!("Writer stopped before welcome was sent");
        }

        let mut in_flight = JoinSet::new();
        let mut received = 0u64;
        while let Some(frame) = inbound.next().await {
            while in_flight.try_join_next().is_some() {}

            let text = match frame {
                Ok(Inbound::Text(text)) => text,
                Ok(Inbound::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(_) => {
                        let reply = ServerMessage::error(ErrorCode::InvalidJson).to_json();
                        if tx.send(reply).await.is_err() {
                            break;
                        }
                        continue;
                    }
                },
                Ok(Inbound::Control) => continue,
                Ok(Inbound::Close) => break,
                Err(e) => {
                    debug!(error = %e, "Read error, closing connection");
                    break;
                }
            };
            received += 1;

            let permit = match &self.limiter {
                Some(limiter) => match Arc::clone(limiter).acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => break,
                },
                None => None,
            };

            let processor = Arc::clone(&self.processor);
            let tx = tx.clone();
            in_flight.spawn(
                async move {
                    let outcome = processor.process_raw(&text).await;
                    let reply = ServerMessage::from(outcome.result).to_json();
                    drop(permit);
                    if tx.send(reply).await.is_err() {
                        debug!("Connection gone, reply dropped");
                    }
                }
                .in_current_span(),
            );
        }

        drop(tx);
        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Query task failed");
            }
        }
        if let Err(e) = writer.await {
            warn!(error = %e, "Writer task failed");
        }
        info!(messages = received, "Client disconnected");
    }
}
