// ABOUTME: Centralized constants for the Kubo SDK
// ABOUTME: Contains the default API address, RPC endpoint paths, stream error trailer, and connection timeouts

/// Node RPC addresses
pub mod urls {
    /// Default address of a local node's RPC API
    pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5001";
}

/// RPC endpoint paths, relative to the API address
pub mod endpoints {
    /// Node identity; answers whenever the daemon is up
    pub const ID: &str = "/api/v0/id";

    /// Continuous newline-delimited JSON event log
    pub const LOG_TAIL: &str = "/api/v0/log/tail";

    /// Raw content of an identifier
    pub const CAT: &str = "/api/v0/cat";

    /// Query parameter naming the identifier for `cat`
    pub const ARG: &str = "arg";
}

/// Response headers
pub mod headers {
    /// Trailer the node sets when a streamed response fails after its 200 status
    pub const STREAM_ERROR: &str = "x-stream-error";
}

/// HTTP timeouts
pub mod timeouts {
    use std::time::Duration;

    /// Time allowed to establish a connection. Reads have no timeout since the
    /// log tail never ends.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
}

pub const USER_AGENT: &str = concat!("kubo-peek/", env!("CARGO_PKG_VERSION"));
