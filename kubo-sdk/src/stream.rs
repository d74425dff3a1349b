// ABOUTME: Streaming readers over node response bodies
// ABOUTME: LogTail splits the event log into lines; ContentStream reads content prefixes and remainders

use crate::constants::headers;
use crate::error::KuboError;
use bytes::Bytes;
use futures_util::{stream, Stream, StreamExt};
use http::HeaderMap;
use http_body_util::BodyExt;
use std::pin::Pin;

/// Body chunks as delivered by the node, with transport errors already mapped
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, KuboError>> + Send>>;

/// Error the node reported in the trailers of a response that had already started
fn trailer_error(trailers: &HeaderMap) -> Option<String> {
    trailers
        .get(headers::STREAM_ERROR)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .filter(|message| !message.is_empty())
}

/// Data frames of the response body. A stream error trailer ends the stream with
/// [`KuboError::Read`] instead of a clean end-of-body.
fn body_stream(response: reqwest::Response) -> ByteStream {
    let response: http::Response<reqwest::Body> = response.into();
    let body = response.into_body();

    Box::pin(stream::unfold(Some(body), |body| async move {
        let mut body = body?;
        loop {
            let frame = match body.frame().await? {
                Ok(frame) => frame,
                Err(e) => return Some((Err(KuboError::Read(e.to_string())), None)),
            };

            match frame.into_data() {
                Ok(data) if data.is_empty() => continue,
                Ok(data) => return Some((Ok(data), Some(body))),
                Err(frame) => {
                    if let Some(message) = frame.trailers_ref().and_then(trailer_error) {
                        return Some((Err(KuboError::Read(message)), None));
                    }
                }
            }
        }
    }))
}

fn chunk_stream<I>(chunks: I) -> ByteStream
where
    I: IntoIterator<Item = Result<Bytes, KuboError>>,
    I::IntoIter: Send + 'static,
{
    Box::pin(stream::iter(chunks))
}

/// Live event log of the node, one JSON object per line.
///
/// The log never ends on its own: end-of-body is reported as
/// [`KuboError::StreamClosed`] and there is no reconnect.
pub struct LogTail {
    inner: ByteStream,
    buffer: Vec<u8>,
    scanned: usize,
    lines_read: u64,
}

impl LogTail {
    pub fn new(inner: ByteStream) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            scanned: 0,
            lines_read: 0,
        }
    }

    pub fn from_response(response: reqwest::Response) -> Self {
        Self::new(body_stream(response))
    }

    pub fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Result<Bytes, KuboError>>,
        I::IntoIter: Send + 'static,
    {
        Self::new(chunk_stream(chunks))
    }

    /// Wait for the next complete line, without its trailing newline.
    ///
    /// A partial line left in the buffer when the body ends is discarded.
    pub async fn next_line(&mut self) -> Result<Vec<u8>, KuboError> {
        loop {
            if let Some(offset) = self.buffer[self.scanned..].iter().position(|&b| b == b'\n') {
                let end = self.scanned + offset;
                let mut line: Vec<u8> = self.buffer.drain(..=end).collect();
                line.pop();
                self.scanned = 0;
                self.lines_read += 1;
                return Ok(line);
            }
            self.scanned = self.buffer.len();

            match self.inner.next().await {
                Some(Ok(chunk)) => self.buffer.extend_from_slice(&chunk),
                Some(Err(err)) => return Err(err),
                None => {
                    if !self.buffer.is_empty() {
                        log::debug!(
                            "Discarding {} bytes of unterminated log line",
                            self.buffer.len()
                        );
                    }
                    return Err(KuboError::StreamClosed);
                }
            }
        }
    }

    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }
}

/// Content body of one identifier.
///
/// Reads never consume more than they return, so a prefix read leaves the rest of
/// the body untouched for a later `read_to_end` or `drain`.
pub struct ContentStream {
    inner: ByteStream,
    pending: Bytes,
}

impl ContentStream {
    pub fn new(inner: ByteStream) -> Self {
        Self {
            inner,
            pending: Bytes::new(),
        }
    }

    pub fn from_response(response: reqwest::Response) -> Self {
        Self::new(body_stream(response))
    }

    pub fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Result<Bytes, KuboError>>,
        I::IntoIter: Send + 'static,
    {
        Self::new(chunk_stream(chunks))
    }

    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::from_chunks(vec![Ok(data.into())])
    }

    async fn next_chunk(&mut self) -> Option<Result<Bytes, KuboError>> {
        if !self.pending.is_empty() {
            return Some(Ok(std::mem::take(&mut self.pending)));
        }
        self.inner.next().await
    }

    /// Read until `len` bytes are collected or the body ends.
    ///
    /// The result is shorter than `len` only when the body was shorter.
    pub async fn read_prefix(&mut self, len: usize) -> Result<Vec<u8>, KuboError> {
        let mut prefix = Vec::with_capacity(len);

        while prefix.len() < len {
            let Some(chunk) = self.next_chunk().await else {
                break;
            };
            let mut chunk = chunk?;
            let wanted = len - prefix.len();
            if chunk.len() > wanted {
                self.pending = chunk.split_off(wanted);
            }
            prefix.extend_from_slice(&chunk);
        }

        Ok(prefix)
    }

    /// Read everything left in the body
    pub async fn read_to_end(&mut self) -> Result<Vec<u8>, KuboError> {
        let mut data = Vec::new();
        while let Some(chunk) = self.next_chunk().await {
            data.extend_from_slice(&chunk?);
        }
        Ok(data)
    }

    /// Discard the rest of the body, returning how many bytes were thrown away.
    /// Errors end the drain quietly.
    pub async fn drain(&mut self) -> u64 {
        let mut discarded = 0u64;
        while let Some(chunk) = self.next_chunk().await {
            match chunk {
                Ok(chunk) => discarded += chunk.len() as u64,
                Err(err) => {
                    log::trace!("Stopped draining content stream: {}", err);
                    break;
                }
            }
        }
        discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_trailer_error() {
        let mut trailers = HeaderMap::new();
        assert_eq!(trailer_error(&trailers), None);

        trailers.insert(headers::STREAM_ERROR, HeaderValue::from_static(""));
        assert_eq!(trailer_error(&trailers), None);

        trailers.insert(
            headers::STREAM_ERROR,
            HeaderValue::from_static("context canceled"),
        );
        assert_eq!(trailer_error(&trailers), Some("context canceled".to_string()));
    }

    fn ok(data: &'static [u8]) -> Result<Bytes, KuboError> {
        Ok(Bytes::from_static(data))
    }

    #[tokio::test]
    async fn test_log_tail_splits_lines_across_chunks() {
        let mut tail = LogTail::from_chunks(vec![
            ok(b"{\"event\":\"a\"}\n{\"eve"),
            ok(b"nt\":\"b\"}\n"),
            ok(b"{\"event\":\"c\"}\n"),
        ]);

        assert_eq!(tail.next_line().await.unwrap(), b"{\"event\":\"a\"}");
        assert_eq!(tail.next_line().await.unwrap(), b"{\"event\":\"b\"}");
        assert_eq!(tail.next_line().await.unwrap(), b"{\"event\":\"c\"}");
        assert!(matches!(
            tail.next_line().await,
            Err(KuboError::StreamClosed)
        ));
        assert_eq!(tail.lines_read(), 3);
    }

    #[tokio::test]
    async fn test_log_tail_drops_partial_line_at_eof() {
        let mut tail = LogTail::from_chunks(vec![ok(b"{\"event\":\"a\"}\n{\"event\":")]);

        assert!(tail.next_line().await.is_ok());
        assert!(matches!(
            tail.next_line().await,
            Err(KuboError::StreamClosed)
        ));
    }

    #[tokio::test]
    async fn test_log_tail_surfaces_read_error() {
        let mut tail = LogTail::from_chunks(vec![
            ok(b"{\"event\":\"a\"}\n"),
            Err(KuboError::Read("connection reset".to_string())),
        ]);

        assert!(tail.next_line().await.is_ok());
        let err = tail.next_line().await.unwrap_err();
        assert!(matches!(err, KuboError::Read(_)));
    }

    #[tokio::test]
    async fn test_read_prefix_keeps_remainder() {
        let mut content =
            ContentStream::from_chunks(vec![ok(b"abc"), ok(b"defgh"), ok(b"ijk")]);

        assert_eq!(content.read_prefix(5).await.unwrap(), b"abcde");
        assert_eq!(content.read_to_end().await.unwrap(), b"fghijk");
    }

    #[tokio::test]
    async fn test_read_prefix_short_body() {
        let mut content = ContentStream::from_bytes(&b"tiny"[..]);
        assert_eq!(content.read_prefix(261).await.unwrap(), b"tiny");
    }

    #[tokio::test]
    async fn test_read_prefix_error() {
        let mut content = ContentStream::from_chunks(vec![
            ok(b"abc"),
            Err(KuboError::Read("reset".to_string())),
        ]);
        assert!(content.read_prefix(10).await.is_err());
    }

    #[tokio::test]
    async fn test_drain_stops_at_errors() {
        let mut content = ContentStream::from_chunks(vec![
            ok(b"header"),
            ok(b"body"),
            Err(KuboError::Read("reset".to_string())),
            ok(b"never reached"),
        ]);

        assert_eq!(content.read_prefix(6).await.unwrap(), b"header");
        assert_eq!(content.drain().await, 4);
    }
}
