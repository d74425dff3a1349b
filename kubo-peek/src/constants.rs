// ABOUTME: Centralized constants for kubo-peek
// ABOUTME: Contains the header window, queue sizing, event names, config file locations, and log defaults

/// Content probing
pub mod probe {
    /// Bytes of content needed before a signature match is attempted. The
    /// furthest signature checked is tar's, whose magic starts at offset 257.
    pub const HEADER_SIZE: usize = 261;
}

/// Dispatch queue between the log watcher and the deduplicator
pub mod dispatch {
    /// Pending identifiers buffered before the watcher waits
    pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;
}

/// Event log vocabulary
pub mod events {
    /// Emitted when the node learns that a peer provides some content
    pub const PROVIDER_ANNOUNCEMENT: &str = "handleAddProvider";
}

/// Configuration file locations
pub mod config_files {
    /// Per-project config in the working directory
    pub const PROJECT_FILE: &str = "kubo-peek.toml";

    /// Directory under the user's config home
    pub const APP_DIR: &str = "kubo-peek";

    pub const FILE_NAME: &str = "config.toml";
}

/// Logging defaults
pub mod logging {
    use log::LevelFilter;

    /// Filter applied when RUST_LOG is unset
    pub const DEFAULT_FILTER: &str = "info";

    /// Level for identifiers abandoned on expected, per-identifier failures
    pub const DEFAULT_ABANDON_LEVEL: LevelFilter = LevelFilter::Debug;
}
