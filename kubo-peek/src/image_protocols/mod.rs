// ABOUTME: Image protocol implementations for terminal inline image display
// ABOUTME: Renders escape sequences and writes them to the terminal as whole units

pub trait ImageProtocol: Send + Sync {
    /// Render image data as a terminal escape sequence, labelled with `name`
    fn render_image(&self, data: &[u8], name: &str) -> String;
}

pub mod iterm2;
pub mod sink;

pub use iterm2::ITerm2Protocol;
pub use sink::{ImageSink, TerminalSink};
