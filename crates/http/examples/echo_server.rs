use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use micro_h1::connection::HttpConnection;
use micro_h1::handler::make_handler;
use micro_h1::protocol::{Request, Response};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!(port = 8080, "start listening");
    let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
        Ok(tcp_listener) => tcp_listener,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return;
        }
    };

    let handler = Arc::new(make_handler(echo));
    let shutdown = CancellationToken::new();

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("ctrl-c received, stop serving");
                shutdown.cancel();
            }
        }
    });

    loop {
        let (tcp_stream, remote_addr) = tokio::select! {
            accepted = tcp_listener.accept() => match accepted {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            },
            () = shutdown.cancelled() => break,
        };

        let handler = handler.clone();
        let shutdown = shutdown.clone();

        tokio::spawn(async move {
            let (reader, writer) = tcp_stream.into_split();
            let connection =
                HttpConnection::new(reader, writer).with_timeout(Duration::from_secs(30)).with_remote_addr(remote_addr);
            match connection.process(handler, shutdown).await {
                Ok(()) => info!(%remote_addr, "finished process, connection shutdown"),
                Err(e) => error!(%remote_addr, cause = %e, "service has error, connection shutdown"),
            }
        });
    }
}

/// Echoes the request body back, along with who asked and how long reading took.
async fn echo(request: Request) -> Result<Response, std::io::Error> {
    info!(
        method = %request.method(),
        path = request.request_target(),
        remote_addr = request.remote_addr().as_deref().unwrap_or("-"),
        read_time = ?request.read_time(),
        "receiving request"
    );

    let mut response = Response::with_status(StatusCode::OK);
    response.add_header("server", "micro-h1");
    match request.body() {
        Some(body) => {
            if let Some(content_type) = request.header("content-type") {
                response.add_header("content-type", content_type);
            }
            response.set_body(body.clone());
        }
        None => {
            response.add_header("content-type", "text/plain").set_body("Hello World!\r\n");
        }
    }
    Ok(response)
}
