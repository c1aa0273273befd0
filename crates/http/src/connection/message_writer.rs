use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::{Instant, timeout_at};
use tokio_util::codec::Encoder;
use tracing::trace;

use crate::codec::MessageEncoder;
use crate::deadline_after;
use crate::protocol::{OutgoingMessage, SendError};

/// Buffers encoded messages and writes them to the underlying stream under a deadline.
#[derive(Debug)]
pub struct MessageWriter<W> {
    writer: W,
    buffer: BytesMut,
    encoder: MessageEncoder,
}

impl<W> MessageWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: W) -> Self {
        Self::with_capacity(writer, 8 * 1024)
    }

    pub fn with_capacity(writer: W, buffer_size: usize) -> Self {
        Self { writer, buffer: BytesMut::with_capacity(buffer_size), encoder: MessageEncoder::new() }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    #[inline]
    pub fn write(&mut self, item: OutgoingMessage<'_>) -> Result<(), SendError> {
        self.encoder.encode(item, &mut self.buffer)
    }

    /// Writes everything buffered and flushes the stream, failing with
    /// [`SendError::DeadlineExceeded`] when `deadline` passes first.
    ///
    /// The buffer is emptied whether or not the write succeeds.
    pub async fn flush(&mut self, deadline: Option<Instant>) -> Result<(), SendError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let buffer = self.buffer.split();
        trace!(len = buffer.len(), "writing message");
        let write = async {
            self.writer.write_all(&buffer).await?;
            self.writer.flush().await
        };

        match deadline {
            Some(deadline) => timeout_at(deadline, write).await.map_err(|_elapsed| SendError::DeadlineExceeded)??,
            None => write.await?,
        }
        Ok(())
    }

    /// Encodes `item` and writes it out within `timeout`, a zero timeout waits forever.
    pub async fn send(&mut self, item: OutgoingMessage<'_>, timeout: Duration) -> Result<(), SendError> {
        self.write(item)?;
        self.flush(deadline_after(timeout)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Headers;

    #[tokio::test]
    async fn send_writes_encoded_bytes() {
        let mut writer = MessageWriter::new(Vec::new());
        let headers: Headers = [("host", "a")].into_iter().collect();

        writer.send(OutgoingMessage::new("GET / HTTP/1.1", &headers, None), Duration::from_secs(1)).await.unwrap();

        assert_eq!(writer.into_inner(), b"GET / HTTP/1.1\r\nhost: a\r\n\r\n");
    }

    #[tokio::test]
    async fn empty_start_line_writes_nothing() {
        let mut writer = MessageWriter::new(Vec::new());

        let result = writer.send(OutgoingMessage::new("", &Headers::new(), None), Duration::ZERO).await;

        assert!(matches!(result, Err(SendError::EmptyStartLine)));
        assert!(writer.into_inner().is_empty());
    }

    #[tokio::test]
    async fn stalled_peer_hits_deadline() {
        // nobody reads the other half, so the 16 byte pipe fills up
        let (client, _server) = tokio::io::duplex(16);
        let mut writer = MessageWriter::new(client);
        let body = vec![b'x'; 1024];

        let headers = Headers::new();
        let message = OutgoingMessage::new("HTTP/1.1 200 OK", &headers, Some(body.as_slice()));
        let result = writer.send(message, Duration::from_millis(50)).await;

        assert!(matches!(result, Err(SendError::DeadlineExceeded)));
    }
}
