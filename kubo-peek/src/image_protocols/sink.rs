// ABOUTME: Display sinks that receive fully fetched images
// ABOUTME: TerminalSink writes each rendered escape sequence atomically so concurrent renders never interleave

use super::{ITerm2Protocol, ImageProtocol};
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

pub trait ImageSink: Send + Sync {
    /// Display `data` under the label `name`
    fn emit(&self, name: &str, data: &[u8]) -> io::Result<()>;
}

pub struct TerminalSink<W: Write + Send = io::Stdout> {
    protocol: Box<dyn ImageProtocol>,
    out: Mutex<W>,
}

impl TerminalSink<io::Stdout> {
    /// iTerm2 sequences on standard output
    pub fn stdout() -> Self {
        Self::new(Box::new(ITerm2Protocol), io::stdout())
    }
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(protocol: Box<dyn ImageProtocol>, out: W) -> Self {
        Self {
            protocol,
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> ImageSink for TerminalSink<W> {
    fn emit(&self, name: &str, data: &[u8]) -> io::Result<()> {
        let rendered = self.protocol.render_image(data, name);

        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        out.write_all(rendered.as_bytes())?;
        out.flush()
    }
}
