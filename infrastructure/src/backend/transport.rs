//! Streaming chat transport over HTTP + SSE

use super::client::BackendClient;
use super::sse::forward_events;
use async_trait::async_trait;
use nurture_application::{ChatTransport, StreamHandle, TransportError};
use nurture_domain::OutgoingEnvelope;
use tokio::sync::mpsc;
use tracing::{debug, info};

const STREAM_PATH: &str = "/api/chat/stream";

/// Channel capacity between the reader task and the consumer
const EVENT_BUFFER: usize = 64;

/// [`ChatTransport`] that POSTs the envelope and reads the SSE reply.
///
/// A reader task is spawned per exchange; it ends at the first terminal
/// frame or when the consumer drops the [`StreamHandle`].
pub struct HttpChatTransport {
    client: BackendClient,
}

impl HttpChatTransport {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn open_stream(&self, envelope: &OutgoingEnvelope) -> Result<StreamHandle, TransportError> {
        let url = self.client.url(STREAM_PATH);
        info!(
            "Opening chat stream ({} history entries, routing: {:?})",
            envelope.conversation_history.len(),
            envelope.routing_hint
        );

        let request = self
            .client
            .http()
            .post(&url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(envelope);
        let response = self
            .client
            .send(request)
            .await
            .map_err(TransportError::from)?;

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        tokio::spawn(async move {
            forward_events(response.bytes_stream(), tx).await;
            debug!("Chat stream reader finished");
        });
        Ok(StreamHandle::new(rx))
    }
}
