//! Canonical file and folder entities

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;

use crate::error::ShelfResult;

/// Byte stream type
pub type ByteStream = Pin<Box<dyn Stream<Item = ShelfResult<Bytes>> + Send>>;

/// Content classification of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Unknown,
    Folder,
    Office,
    Video,
    Audio,
    Text,
    Image,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Unknown => "unknown",
            FileType::Folder => "folder",
            FileType::Office => "office",
            FileType::Video => "video",
            FileType::Audio => "audio",
            FileType::Text => "text",
            FileType::Image => "image",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for one entry, produced fresh by every stat or list call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub name: String,
    /// Bytes; always 0 for folders
    pub size: u64,
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub updated_at: Option<DateTime<Utc>>,
    /// Name of the driver that produced this entry
    pub driver: String,
}

impl File {
    pub fn folder(name: impl Into<String>, updated_at: Option<DateTime<Utc>>, driver: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            file_type: FileType::Folder,
            updated_at,
            driver: driver.into(),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Folder
    }
}

/// Upload payload: a named byte stream and the folder it should land in.
///
/// The driver takes ownership on upload and consumes the body fully, even
/// when the upload fails.
pub struct FileStream {
    /// Target folder, relative to the account root
    pub path: String,
    pub name: String,
    /// Declared length; a body that disagrees fails the upload
    pub size: Option<u64>,
    pub body: ByteStream,
}

impl FileStream {
    pub fn new(path: impl Into<String>, name: impl Into<String>, body: ByteStream) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            size: None,
            body,
        }
    }

    /// Single-chunk stream over an in-memory buffer
    pub fn from_bytes(path: impl Into<String>, name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let size = data.len() as u64;
        let mut stream = Self::new(path, name, Box::pin(futures::stream::once(async move { Ok(data) })));
        stream.size = Some(size);
        stream
    }

    /// Root-relative path of the file this stream will create
    pub fn target(&self) -> String {
        format!("{}/{}", self.path, self.name)
    }
}

impl fmt::Debug for FileStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStream")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}
