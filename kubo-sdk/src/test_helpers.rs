// ABOUTME: Test helper utilities for mocking the node RPC API
// ABOUTME: Provides mockito-based servers, raw chunked responses with trailers, and event log bodies

#[cfg(test)]
use mockito::{Server, ServerGuard};
#[cfg(test)]
use serde_json::json;
#[cfg(test)]
use tokio::io::{AsyncReadExt, AsyncWriteExt};
#[cfg(test)]
use tokio::net::TcpListener;

#[cfg(test)]
pub async fn mock_node_server() -> ServerGuard {
    Server::new_async().await
}

/// Serve `response` verbatim to the first connection and return the server's URL.
/// Used for chunked trailers, which mockito can't send.
#[cfg(test)]
pub async fn raw_node_server(response: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }

        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
    });

    format!("http://{}", addr)
}

/// A chunked 200 response declaring the stream error trailer, the way the node
/// streams `cat` and `log/tail`
#[cfg(test)]
pub fn chunked_response(chunks: &[&str], stream_error: Option<&str>) -> String {
    let mut response = String::from(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: text/plain\r\n\
         Transfer-Encoding: chunked\r\n\
         Trailer: X-Stream-Error\r\n\r\n",
    );
    for chunk in chunks {
        response.push_str(&format!("{:x}\r\n{}\r\n", chunk.len(), chunk));
    }
    response.push_str("0\r\n");
    if let Some(message) = stream_error {
        response.push_str(&format!("X-Stream-Error: {}\r\n", message));
    }
    response.push_str("\r\n");
    response
}

/// Build a log tail body from `(event, key)` pairs, one JSON object per line
#[cfg(test)]
pub fn log_lines(events: &[(&str, Option<&str>)]) -> String {
    events
        .iter()
        .map(|(event, key)| {
            let mut line = json!({
                "event": event,
                "system": "dht",
                "time": "2024-01-01T00:00:00.000000000Z",
            });
            if let Some(key) = key {
                line["key"] = json!(key);
            }
            format!("{}\n", line)
        })
        .collect()
}
