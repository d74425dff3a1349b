// ABOUTME: Kubo SDK providing an async client for a node's RPC API
// ABOUTME: Includes reachability checks, live log tailing, and streamed content fetches

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use url::Url;

pub mod constants;
pub mod content_id;
pub mod error;
pub mod source;
pub mod stream;
pub mod test_helpers;

pub use content_id::ContentId;
pub use error::KuboError;
pub use source::ContentSource;
pub use stream::{ByteStream, ContentStream, LogTail};

pub type Result<T> = std::result::Result<T, KuboError>;

use constants::{endpoints, timeouts};

#[derive(Debug, Clone)]
pub struct KuboClient {
    client: reqwest::Client,
    base_url: Url,
}

impl KuboClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| KuboError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(KuboError::InvalidUrl(format!(
                "{}: scheme must be http or https",
                base_url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(constants::USER_AGENT));

        // No overall timeout: the log tail stays open for the life of the process
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(timeouts::CONNECT_TIMEOUT)
            .build()
            .map_err(|e| KuboError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Issue an RPC call and reject non-success statuses, draining their body first
    async fn call(&self, url: Url) -> Result<reqwest::Response> {
        log::debug!("POST {}", url);

        let response = self
            .client
            .post(url.clone())
            .send()
            .await
            .map_err(|e| KuboError::Connection(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let _ = response.bytes().await;
            return Err(KuboError::UnexpectedStatus(status.as_u16()));
        }

        Ok(response)
    }

    /// Whether the node answers identity requests
    pub async fn is_up(&self) -> bool {
        let url = match self.endpoint(endpoints::ID) {
            Ok(url) => url,
            Err(_) => return false,
        };

        match self.call(url).await {
            Ok(response) => {
                let _ = response.bytes().await;
                true
            }
            Err(e) => {
                log::debug!("Node reachability check failed: {}", e);
                false
            }
        }
    }

    /// Connect to the node's live event log
    pub async fn log_tail(&self) -> Result<LogTail> {
        let response = self.call(self.endpoint(endpoints::LOG_TAIL)?).await?;
        log::debug!("Connected to event log at {}", self.base_url);
        Ok(LogTail::from_response(response))
    }

    /// Open the content body of `id`
    pub async fn cat(&self, id: &ContentId) -> Result<ContentStream> {
        let mut url = self.endpoint(endpoints::CAT)?;
        url.query_pairs_mut()
            .append_pair(endpoints::ARG, id.as_str());

        let response = self.call(url).await?;
        Ok(ContentStream::from_response(response))
    }
}

#[async_trait]
impl ContentSource for KuboClient {
    async fn cat(&self, id: &ContentId) -> Result<ContentStream> {
        KuboClient::cat(self, id).await
    }

    async fn is_up(&self) -> bool {
        KuboClient::is_up(self).await
    }
}
