// ABOUTME: Library exports for kubo-peek modules for testing and external use
// ABOUTME: Makes the pipeline stages available to integration tests and the binary

pub mod classify;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod image_protocols;
pub mod pipeline;
pub mod probe;
pub mod watcher;
