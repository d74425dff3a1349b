// ABOUTME: Binary signature classification of content headers
// ABOUTME: Maps a fixed-size byte prefix to a file type and whether it is a displayable image

use crate::constants::probe::HEADER_SIZE;
use image::ImageFormat;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileType {
    pub extension: &'static str,
    pub mime: &'static str,
    pub is_image: bool,
}

impl FileType {
    const fn image(extension: &'static str, mime: &'static str) -> Self {
        Self {
            extension,
            mime,
            is_image: true,
        }
    }

    const fn other(extension: &'static str, mime: &'static str) -> Self {
        Self {
            extension,
            mime,
            is_image: false,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.extension, self.mime)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("header is {len} bytes, classification needs {required}")]
    HeaderTooShort { len: usize, required: usize },
}

pub trait SignatureClassifier: Send + Sync {
    /// Identify the format of `header`; `Ok(None)` means no known signature matched
    fn classify(&self, header: &[u8]) -> Result<Option<FileType>, ClassifyError>;

    fn is_image(&self, header: &[u8]) -> bool {
        matches!(self.classify(header), Ok(Some(file_type)) if file_type.is_image)
    }
}

/// A signature is a set of byte patterns at fixed offsets, all of which must match
struct Signature {
    parts: &'static [(usize, &'static [u8])],
    file_type: FileType,
}

impl Signature {
    fn matches(&self, header: &[u8]) -> bool {
        self.parts.iter().all(|(offset, magic)| {
            header
                .get(*offset..offset + magic.len())
                .is_some_and(|window| window == *magic)
        })
    }
}

const OTHER_SIGNATURES: &[Signature] = &[
    Signature {
        parts: &[(0, b"%PDF")],
        file_type: FileType::other("pdf", "application/pdf"),
    },
    Signature {
        parts: &[(0, b"PK\x03\x04")],
        file_type: FileType::other("zip", "application/zip"),
    },
    Signature {
        parts: &[(0, &[0x1F, 0x8B, 0x08])],
        file_type: FileType::other("gz", "application/gzip"),
    },
    Signature {
        parts: &[(0, b"BZh")],
        file_type: FileType::other("bz2", "application/x-bzip2"),
    },
    Signature {
        parts: &[(0, &[0xFD, b'7', b'z', b'X', b'Z', 0x00])],
        file_type: FileType::other("xz", "application/x-xz"),
    },
    Signature {
        parts: &[(0, &[b'7', b'z', 0xBC, 0xAF, 0x27, 0x1C])],
        file_type: FileType::other("7z", "application/x-7z-compressed"),
    },
    Signature {
        parts: &[(0, b"Rar!\x1A\x07")],
        file_type: FileType::other("rar", "application/vnd.rar"),
    },
    // The header window ends one byte short of the full `ustar` magic
    Signature {
        parts: &[(257, b"usta")],
        file_type: FileType::other("tar", "application/x-tar"),
    },
    Signature {
        parts: &[(0, b"\x7FELF")],
        file_type: FileType::other("elf", "application/x-executable"),
    },
    Signature {
        parts: &[(0, b"MZ")],
        file_type: FileType::other("exe", "application/vnd.microsoft.portable-executable"),
    },
    Signature {
        parts: &[(0, b"\0asm")],
        file_type: FileType::other("wasm", "application/wasm"),
    },
    Signature {
        parts: &[(0, b"SQLite format 3\0")],
        file_type: FileType::other("sqlite", "application/vnd.sqlite3"),
    },
    Signature {
        parts: &[(0, b"{\\rtf")],
        file_type: FileType::other("rtf", "application/rtf"),
    },
    Signature {
        parts: &[(0, b"%!")],
        file_type: FileType::other("ps", "application/postscript"),
    },
    Signature {
        parts: &[(0, b"ID3")],
        file_type: FileType::other("mp3", "audio/mpeg"),
    },
    Signature {
        parts: &[(0, b"fLaC")],
        file_type: FileType::other("flac", "audio/x-flac"),
    },
    Signature {
        parts: &[(0, b"OggS")],
        file_type: FileType::other("ogg", "audio/ogg"),
    },
    Signature {
        parts: &[(0, b"RIFF"), (8, b"WAVE")],
        file_type: FileType::other("wav", "audio/x-wav"),
    },
    Signature {
        parts: &[(0, b"RIFF"), (8, b"AVI ")],
        file_type: FileType::other("avi", "video/x-msvideo"),
    },
    Signature {
        parts: &[(0, &[0x1A, 0x45, 0xDF, 0xA3])],
        file_type: FileType::other("mkv", "video/x-matroska"),
    },
    Signature {
        parts: &[(4, b"ftyp")],
        file_type: FileType::other("mp4", "video/mp4"),
    },
];

/// Default classifier: image magic bytes first, then a table of common
/// archive, document, executable, and media signatures.
#[derive(Debug, Default, Clone, Copy)]
pub struct SignatureTable;

impl SignatureTable {
    pub fn new() -> Self {
        Self
    }

    /// Image formats an inline-image terminal can display
    fn image_type(header: &[u8]) -> Option<FileType> {
        let file_type = match image::guess_format(header).ok()? {
            ImageFormat::Png => FileType::image("png", "image/png"),
            ImageFormat::Jpeg => FileType::image("jpg", "image/jpeg"),
            ImageFormat::Gif => FileType::image("gif", "image/gif"),
            ImageFormat::WebP => FileType::image("webp", "image/webp"),
            ImageFormat::Tiff => FileType::image("tif", "image/tiff"),
            ImageFormat::Bmp => FileType::image("bmp", "image/bmp"),
            ImageFormat::Ico => FileType::image("ico", "image/vnd.microsoft.icon"),
            ImageFormat::Avif => FileType::image("avif", "image/avif"),
            _ => return None,
        };
        Some(file_type)
    }

    fn other_type(header: &[u8]) -> Option<FileType> {
        OTHER_SIGNATURES
            .iter()
            .find(|signature| signature.matches(header))
            .map(|signature| signature.file_type)
    }
}

impl SignatureClassifier for SignatureTable {
    fn classify(&self, header: &[u8]) -> Result<Option<FileType>, ClassifyError> {
        if header.len() < HEADER_SIZE {
            return Err(ClassifyError::HeaderTooShort {
                len: header.len(),
                required: HEADER_SIZE,
            });
        }

        Ok(Self::image_type(header).or_else(|| Self::other_type(header)))
    }
}
