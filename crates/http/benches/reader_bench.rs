use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use indoc::indoc;
use micro_h1::codec::{MessageReader, ReadOptions, encode_message};
use micro_h1::protocol::{Headers, OutgoingMessage, Request};
use tokio::runtime::Runtime;

const SIMPLE_REQUEST: &[u8] = b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n";

const CHUNKED_RESPONSE: &str = indoc! {"
HTTP/1.1 200 OK\r
Content-Type: text/plain\r
Transfer-Encoding: chunked\r
\r
4\r
Wiki\r
6\r
pedia \r
E\r
in \r
\r
chunks.\r
0\r
\r
"};

fn bench_reader(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();

    c.bench_function("read_simple_request", |b| {
        b.to_async(&runtime).iter(|| async {
            let mut io = SIMPLE_REQUEST;
            black_box(Request::read(&mut io, ReadOptions::new()).await.unwrap());
        });
    });

    c.bench_function("read_chunked_response", |b| {
        b.to_async(&runtime).iter(|| async {
            let mut io = CHUNKED_RESPONSE.as_bytes();
            black_box(MessageReader::new(&mut io, ReadOptions::new()).read().await.unwrap());
        });
    });
}

fn bench_encoder(c: &mut Criterion) {
    let headers: Headers = [("content-type", "text/plain"), ("server", "micro-h1")].into_iter().collect();
    let body = b"Hello World!";

    c.bench_function("encode_simple_response", |b| {
        b.iter(|| {
            black_box(encode_message(OutgoingMessage::new("HTTP/1.1 200 OK", &headers, Some(&body[..]))).unwrap());
        });
    });
}

criterion_group!(benches, bench_reader, bench_encoder);
criterion_main!(benches);
