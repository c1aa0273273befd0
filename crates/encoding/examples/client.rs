use std::env;
use std::time::Duration;

use http::Method;
use micro_h1::protocol::{Request, Response};
use micro_h1_encoding::Decompressor;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let url = env::args().nth(1).unwrap_or_else(|| "http://127.0.0.1:8080/".to_string());
    match fetch(&url).await {
        Ok(response) => {
            info!(status = %response.status(), headers = response.headers().len(), "received response");
            if let Some(body) = response.body() {
                println!("{}", String::from_utf8_lossy(body));
            }
        }
        Err(e) => error!(%url, cause = %e, "request failed"),
    }
}

async fn fetch(url: &str) -> Result<Response, Box<dyn std::error::Error + Send + Sync>> {
    let mut request = Request::new(Method::GET, url)?;
    request.add_header("accept-encoding", "gzip, deflate, br").set_timeout(Duration::from_secs(10));

    let authority = request.uri().authority().map(|a| a.as_str().to_string()).ok_or("url has no host")?;
    let addr = if request.uri().port().is_some() { authority } else { format!("{authority}:80") };

    let mut stream = TcpStream::connect(addr).await?;
    let mut response = request.send(&mut stream, &CancellationToken::new()).await?;
    response.decode_content(&Decompressor)?;
    Ok(response)
}
