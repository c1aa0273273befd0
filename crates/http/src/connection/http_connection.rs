use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::codec::{MessageReader, ReadOptions};
use crate::connection::MessageWriter;
use crate::handler::Handler;
use crate::protocol::{DEFAULT_TIMEOUT, HttpError, ParseError, Request, Response};

/// An HTTP connection that reads requests, hands them to a [`Handler`] and writes the
/// responses back, one exchange at a time.
///
/// Each request read and each response write is bounded by the connection timeout.
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
#[derive(Debug)]
pub struct HttpConnection<R, W> {
    reader: R,
    writer: MessageWriter<W>,
    timeout: Duration,
    remote_addr: Option<SocketAddr>,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer: MessageWriter::new(writer), timeout: DEFAULT_TIMEOUT, remote_addr: None }
    }

    /// Sets the per message timeout, zero disables it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Serves requests until the peer closes the stream or `shutdown` is cancelled.
    ///
    /// Read and write failures end the loop with the error; the caller closes the stream.
    pub async fn process<H>(mut self, handler: Arc<H>, shutdown: CancellationToken) -> Result<(), HttpError>
    where
        H: Handler,
    {
        let mut reader = MessageReader::new(&mut self.reader, ReadOptions::new());

        loop {
            reader.set_options(ReadOptions::with_timeout(self.timeout).cancel_on(shutdown.clone()));
            let raw = match reader.read_next().await {
                Ok(raw) => raw,
                Err(ParseError::Closed) => {
                    info!("peer closed, connection shutdown");
                    return Ok(());
                }
                Err(ParseError::Canceled) => {
                    info!("shutdown requested, connection shutdown");
                    return Ok(());
                }
                Err(e) => {
                    error!(cause = %e, "can't receive next request");
                    return Err(e.into());
                }
            };

            let mut request = match Request::try_from(raw) {
                Ok(request) => request,
                Err(e) => {
                    warn!(cause = %e, "bad request");
                    let response = Response::with_status(StatusCode::BAD_REQUEST);
                    send(&mut self.writer, &response, self.timeout).await?;
                    return Err(e.into());
                }
            };
            if let Some(addr) = self.remote_addr {
                request.set_remote_addr(addr);
            }
            debug!(
                method = %request.method(),
                uri = %request.uri(),
                read_time = ?request.read_time(),
                "received request"
            );

            let response = match handler.call(request).await {
                Ok(response) => response,
                Err(e) => {
                    let e: Box<dyn Error + Send + Sync> = e.into();
                    error!(cause = %e, "handle request error");
                    Response::with_status(StatusCode::INTERNAL_SERVER_ERROR)
                }
            };
            send(&mut self.writer, &response, self.timeout).await?;
        }
    }
}

async fn send<W>(writer: &mut MessageWriter<W>, response: &Response, timeout: Duration) -> Result<(), HttpError>
where
    W: AsyncWrite + Unpin,
{
    let start_line = response.start_line();
    writer.send(response.outgoing(&start_line), timeout).await.map_err(|e| {
        error!(cause = %e, "can't send response");
        e.into()
    })
}
