// ABOUTME: Provider announcement watcher driving the node's event log
// ABOUTME: Extracts announced identifiers and feeds them to the dispatch queue; any stream or parse failure is fatal

use crate::constants::events::PROVIDER_ANNOUNCEMENT;
use kubo_sdk::{ContentId, KuboError, LogTail};
use serde::Deserialize;
use std::convert::Infallible;
use thiserror::Error;
use tokio::sync::mpsc;

/// One line of the event log. Only `event` and `key` are interpreted.
#[derive(Debug, Deserialize)]
pub struct LogEvent {
    pub event: String,
    #[serde(default)]
    key: Option<serde_json::Value>,
}

impl LogEvent {
    pub fn is_provider_announcement(&self) -> bool {
        self.event == PROVIDER_ANNOUNCEMENT
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_ref().and_then(serde_json::Value::as_str)
    }
}

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("event log failed")]
    Stream(#[from] KuboError),

    #[error("malformed event log line {line:?}")]
    MalformedEvent {
        line: String,
        source: serde_json::Error,
    },

    #[error("handleAddProvider event without a string key: {line:?}")]
    MissingKey { line: String },

    #[error("dispatch queue closed")]
    DispatchClosed,
}

/// Parse one log line, returning the announced identifier if it is a provider announcement
pub fn parse_announcement(line: &[u8]) -> Result<Option<ContentId>, WatchError> {
    let event: LogEvent =
        serde_json::from_slice(line).map_err(|source| WatchError::MalformedEvent {
            line: String::from_utf8_lossy(line).into_owned(),
            source,
        })?;

    if !event.is_provider_announcement() {
        return Ok(None);
    }

    match event.key() {
        Some(key) => Ok(Some(ContentId::from(key))),
        None => Err(WatchError::MissingKey {
            line: String::from_utf8_lossy(line).into_owned(),
        }),
    }
}

/// Forward every announced identifier on `queue` until the log fails.
///
/// Waits whenever the queue is full. Only returns on error.
pub async fn watch_providers(
    tail: &mut LogTail,
    queue: &mpsc::Sender<ContentId>,
) -> Result<Infallible, WatchError> {
    loop {
        let line = tail.next_line().await?;

        if let Some(id) = parse_announcement(&line)? {
            log::trace!("Provider announced {}", id);
            queue
                .send(id)
                .await
                .map_err(|_| WatchError::DispatchClosed)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn tail_of(lines: &[&str]) -> LogTail {
        let body: String = lines.iter().map(|line| format!("{}\n", line)).collect();
        LogTail::from_chunks(vec![Ok(Bytes::from(body))])
    }

    fn drain(rx: &mut mpsc::Receiver<ContentId>) -> Vec<String> {
        let mut ids = Vec::new();
        while let Ok(id) = rx.try_recv() {
            ids.push(id.into_inner());
        }
        ids
    }

    #[test]
    fn test_parse_announcement() {
        let id = parse_announcement(
            br#"{"event":"handleAddProvider","key":"QmA","system":"dht","time":"now"}"#,
        )
        .unwrap();
        assert_eq!(id, Some(ContentId::from("QmA")));
    }

    #[test]
    fn test_other_events_are_ignored() {
        assert_eq!(
            parse_announcement(br#"{"event":"bootstrapping","key":{"nested":true}}"#).unwrap(),
            None
        );
        assert_eq!(
            parse_announcement(br#"{"event":"handleFindPeer"}"#).unwrap(),
            None
        );
    }

    #[test]
    fn test_malformed_line_is_an_error() {
        assert!(matches!(
            parse_announcement(b"not json"),
            Err(WatchError::MalformedEvent { .. })
        ));
        assert!(matches!(
            parse_announcement(br#"{"system":"dht"}"#),
            Err(WatchError::MalformedEvent { .. })
        ));
        assert!(matches!(
            parse_announcement(br#"{"event":42}"#),
            Err(WatchError::MalformedEvent { .. })
        ));
    }

    #[test]
    fn test_announcement_without_key_is_an_error() {
        assert!(matches!(
            parse_announcement(br#"{"event":"handleAddProvider"}"#),
            Err(WatchError::MissingKey { .. })
        ));
        assert!(matches!(
            parse_announcement(br#"{"event":"handleAddProvider","key":7}"#),
            Err(WatchError::MissingKey { .. })
        ));
    }

    #[test]
    fn test_error_chain_names_each_cause_once() {
        let err = anyhow::Error::new(WatchError::from(KuboError::StreamClosed));
        assert_eq!(
            format!("{:#}", err),
            "event log failed: Stream closed by the node"
        );

        let cause = serde_json::from_slice::<serde_json::Value>(b"{oops")
            .unwrap_err()
            .to_string();
        let err = anyhow::Error::new(parse_announcement(b"{oops").unwrap_err());
        let rendered = format!("{:#}", err);
        assert!(rendered.starts_with("malformed event log line \"{oops\": "));
        assert_eq!(rendered.matches(cause.as_str()).count(), 1);
    }

    #[tokio::test]
    async fn test_stream_end_is_fatal_after_forwarding_seen_lines() {
        let mut tail = tail_of(&[
            r#"{"event":"handleAddProvider","key":"QmA"}"#,
            r#"{"event":"dht"}"#,
            r#"{"event":"handleAddProvider","key":"QmB"}"#,
            r#"{"event":"handleAddProvider","key":"QmA"}"#,
        ]);
        let (tx, mut rx) = mpsc::channel(16);

        let err = watch_providers(&mut tail, &tx).await.unwrap_err();

        assert!(matches!(err, WatchError::Stream(KuboError::StreamClosed)));
        assert_eq!(drain(&mut rx), vec!["QmA", "QmB", "QmA"]);
        assert_eq!(tail.lines_read(), 4);
    }

    #[tokio::test]
    async fn test_missing_key_stops_before_dispatch() {
        let mut tail = tail_of(&[
            r#"{"event":"handleAddProvider","key":"QmA"}"#,
            r#"{"event":"handleAddProvider"}"#,
            r#"{"event":"handleAddProvider","key":"QmB"}"#,
        ]);
        let (tx, mut rx) = mpsc::channel(16);

        let err = watch_providers(&mut tail, &tx).await.unwrap_err();

        assert!(matches!(err, WatchError::MissingKey { .. }));
        assert_eq!(drain(&mut rx), vec!["QmA"]);
    }

    #[tokio::test]
    async fn test_closed_queue_is_fatal() {
        let mut tail = tail_of(&[r#"{"event":"handleAddProvider","key":"QmA"}"#]);
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        assert!(matches!(
            watch_providers(&mut tail, &tx).await,
            Err(WatchError::DispatchClosed)
        ));
    }
}
