// ABOUTME: Error types for the Kubo SDK with user-facing messages
// ABOUTME: Separates transport, status, and mid-stream failures of the node RPC API

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KuboError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Unexpected response status code: {0}")]
    UnexpectedStatus(u16),

    #[error("Read error: {0}")]
    Read(String),

    #[error("Stream closed by the node")]
    StreamClosed,

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

impl KuboError {
    pub fn help_text(&self) -> Option<&'static str> {
        match self {
            KuboError::Connection(_) => {
                Some("Is the node running? Start it with: ipfs daemon")
            }
            KuboError::UnexpectedStatus(405) => {
                Some("The node rejected the request method; check the API address")
            }
            KuboError::InvalidUrl(_) => Some("Use an address like http://127.0.0.1:5001"),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for KuboError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            KuboError::UnexpectedStatus(status.as_u16())
        } else if err.is_body() || err.is_decode() {
            KuboError::Read(err.to_string())
        } else {
            KuboError::Connection(err.to_string())
        }
    }
}

impl From<url::ParseError> for KuboError {
    fn from(err: url::ParseError) -> Self {
        KuboError::InvalidUrl(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            KuboError::UnexpectedStatus(500).to_string(),
            "Unexpected response status code: 500"
        );
        assert_eq!(
            KuboError::StreamClosed.to_string(),
            "Stream closed by the node"
        );
        assert_eq!(
            KuboError::Connection("Connection refused".to_string()).to_string(),
            "Connection error: Connection refused"
        );
    }

    #[test]
    fn test_help_text() {
        assert!(
            KuboError::Connection("refused".to_string())
                .help_text()
                .unwrap()
                .contains("ipfs daemon")
        );
        assert!(KuboError::UnexpectedStatus(405).help_text().is_some());
        assert_eq!(KuboError::UnexpectedStatus(500).help_text(), None);
        assert_eq!(KuboError::StreamClosed.help_text(), None);
    }

    #[test]
    fn test_from_url_parse_error() {
        let err: KuboError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, KuboError::InvalidUrl(_)));
    }
}
