// ABOUTME: Per-identifier probe that fetches a header, classifies it, and renders images
// ABOUTME: Every failure is local to one identifier and ends in a logged abandonment, never a pipeline error

use crate::classify::{ClassifyError, FileType, SignatureClassifier};
use crate::constants::{logging::DEFAULT_ABANDON_LEVEL, probe::HEADER_SIZE};
use crate::image_protocols::ImageSink;
use kubo_sdk::{ContentId, ContentSource, KuboError};
use log::{Level, LevelFilter};
use std::sync::Arc;
use thiserror::Error;

/// Why an identifier was given up on
#[derive(Debug, Error)]
pub enum Abandoned {
    #[error("couldn't cat: {0}")]
    Fetch(KuboError),

    #[error("couldn't read header: {0}")]
    HeaderRead(KuboError),

    #[error("expected {expected} header bytes, read {read}")]
    ShortHeader { expected: usize, read: usize },

    #[error("couldn't match file type: {0}")]
    Classify(ClassifyError),

    #[error("unknown file type")]
    UnknownFormat,

    #[error("couldn't read data: {0}")]
    BodyRead(KuboError),

    #[error("couldn't display image: {0}")]
    Display(std::io::Error),
}

#[derive(Debug)]
pub enum Outcome {
    /// An image, shown in full
    Rendered { file_type: FileType, size: usize },
    /// A recognized format that is not an image; nothing past the header was used
    Identified { file_type: FileType },
    Abandoned(Abandoned),
}

/// Probe configuration shared read-only by every identifier's task
#[derive(Clone)]
pub struct Prober {
    source: Arc<dyn ContentSource>,
    classifier: Arc<dyn SignatureClassifier>,
    sink: Arc<dyn ImageSink>,
    abandon_level: LevelFilter,
}

impl Prober {
    pub fn new(
        source: Arc<dyn ContentSource>,
        classifier: Arc<dyn SignatureClassifier>,
        sink: Arc<dyn ImageSink>,
    ) -> Self {
        Self {
            source,
            classifier,
            sink,
            abandon_level: DEFAULT_ABANDON_LEVEL,
        }
    }

    /// Level used to log expected per-identifier failures; `Off` silences them
    pub fn with_abandon_level(mut self, level: LevelFilter) -> Self {
        self.abandon_level = level;
        self
    }

    /// Level `outcome` is logged at, or `None` if it isn't logged.
    ///
    /// Classifier and display failures always warn. Other abandonments use the
    /// configured abandon level. Recognized formats are already logged by the probe.
    pub fn log_level(&self, outcome: &Outcome) -> Option<Level> {
        match outcome {
            Outcome::Abandoned(Abandoned::Classify(_) | Abandoned::Display(_)) => {
                Some(Level::Warn)
            }
            Outcome::Abandoned(_) => self.abandon_level.to_level(),
            Outcome::Rendered { .. } => Some(Level::Debug),
            Outcome::Identified { .. } => None,
        }
    }

    /// Probe `id` and log how it ended
    pub async fn run(&self, id: ContentId) {
        let outcome = self.probe(&id).await;
        let Some(level) = self.log_level(&outcome) else {
            return;
        };

        match outcome {
            Outcome::Abandoned(reason) => log::log!(level, "{}: {}", id, reason),
            Outcome::Rendered { size, .. } => log::log!(level, "{}: rendered {} bytes", id, size),
            Outcome::Identified { .. } => {}
        }
    }

    /// Fetch, classify, and for images render `id`.
    ///
    /// The header must be exactly [`HEADER_SIZE`] bytes before classification is
    /// tried. Any body left unread on an early exit is drained.
    pub async fn probe(&self, id: &ContentId) -> Outcome {
        let mut content = match self.source.cat(id).await {
            Ok(content) => content,
            Err(e) => return Outcome::Abandoned(Abandoned::Fetch(e)),
        };

        let header = match content.read_prefix(HEADER_SIZE).await {
            Ok(header) => header,
            Err(e) => {
                content.drain().await;
                return Outcome::Abandoned(Abandoned::HeaderRead(e));
            }
        };

        if header.len() != HEADER_SIZE {
            content.drain().await;
            return Outcome::Abandoned(Abandoned::ShortHeader {
                expected: HEADER_SIZE,
                read: header.len(),
            });
        }

        let file_type = match self.classifier.classify(&header) {
            Ok(Some(file_type)) => file_type,
            Ok(None) => {
                content.drain().await;
                return Outcome::Abandoned(Abandoned::UnknownFormat);
            }
            Err(e) => {
                content.drain().await;
                return Outcome::Abandoned(Abandoned::Classify(e));
            }
        };

        log::info!("{} {}", id, file_type.extension);

        if !file_type.is_image {
            content.drain().await;
            return Outcome::Identified { file_type };
        }

        let mut data = header;
        match content.read_to_end().await {
            Ok(rest) => data.extend_from_slice(&rest),
            Err(e) => return Outcome::Abandoned(Abandoned::BodyRead(e)),
        }

        if let Err(e) = self.sink.emit(id.as_str(), &data) {
            return Outcome::Abandoned(Abandoned::Display(e));
        }

        Outcome::Rendered {
            file_type,
            size: data.len(),
        }
    }
}
