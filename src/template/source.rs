//! Content sources for templates, images and fragments

use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::config::TemplateConfig;
use crate::error::TemplateError;

/// Where content comes from
///
/// Exactly one input is carried by construction, so callers never pass both
/// inline content and a file at once.
pub enum Source<'a> {
    /// Content already in memory
    Inline(Cow<'a, [u8]>),
    /// A file on disk; for images without a MIME type the path is linked, not read
    Path(PathBuf),
    /// An open reader, consumed up to the configured size limit
    Stream(Box<dyn Read + 'a>),
}

impl fmt::Debug for Source<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Inline(bytes) => f.debug_tuple("Inline").field(&bytes.len()).finish(),
            Source::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Source::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl<'a> Source<'a> {
    /// Inline bytes
    pub fn inline(bytes: impl Into<Cow<'a, [u8]>>) -> Self {
        Source::Inline(bytes.into())
    }

    /// Inline markup text
    pub fn text(text: &'a str) -> Self {
        Source::Inline(Cow::Borrowed(text.as_bytes()))
    }

    /// A file path
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Source::Path(path.into())
    }

    /// Any reader
    pub fn stream(reader: impl Read + 'a) -> Self {
        Source::Stream(Box::new(reader))
    }

    /// Read the full content, bounded by `config.max_source_bytes`
    pub(crate) fn read_bytes(self, config: &TemplateConfig) -> Result<Cow<'a, [u8]>, TemplateError> {
        let limit = config.max_source_bytes;
        match self {
            Source::Inline(bytes) => {
                if bytes.len() as u64 > limit {
                    return Err(TemplateError::SourceTooLarge { limit });
                }
                Ok(bytes)
            }
            Source::Path(path) => {
                let path = config.resolve_path(&path);
                read_file(&path, limit).map(Cow::Owned)
            }
            Source::Stream(reader) => read_limited(reader, limit).map(Cow::Owned),
        }
    }

    /// Read the full content as UTF-8 text
    pub(crate) fn read_text(self, config: &TemplateConfig) -> Result<Cow<'a, str>, TemplateError> {
        match self.read_bytes(config)? {
            Cow::Borrowed(bytes) => std::str::from_utf8(bytes)
                .map(Cow::Borrowed)
                .map_err(|_| TemplateError::Encoding { context: "source" }),
            Cow::Owned(bytes) => String::from_utf8(bytes)
                .map(Cow::Owned)
                .map_err(|_| TemplateError::Encoding { context: "source" }),
        }
    }
}

impl<'a> From<&'a str> for Source<'a> {
    fn from(text: &'a str) -> Self {
        Source::text(text)
    }
}

impl<'a> From<&'a [u8]> for Source<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Source::Inline(Cow::Borrowed(bytes))
    }
}

impl From<Vec<u8>> for Source<'_> {
    fn from(bytes: Vec<u8>) -> Self {
        Source::Inline(Cow::Owned(bytes))
    }
}

impl From<PathBuf> for Source<'_> {
    fn from(path: PathBuf) -> Self {
        Source::Path(path)
    }
}

impl<'a> From<&'a Path> for Source<'a> {
    fn from(path: &'a Path) -> Self {
        Source::Path(path.to_path_buf())
    }
}

fn read_file(path: &Path, limit: u64) -> Result<Vec<u8>, TemplateError> {
    let file = File::open(path).map_err(|source| TemplateError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    read_limited(file, limit).map_err(|err| match err {
        TemplateError::Io(source) => TemplateError::ReadFile {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

fn read_limited<R: Read>(reader: R, limit: u64) -> Result<Vec<u8>, TemplateError> {
    let mut buf = Vec::new();
    reader.take(limit.saturating_add(1)).read_to_end(&mut buf)?;
    if buf.len() as u64 > limit {
        return Err(TemplateError::SourceTooLarge { limit });
    }
    Ok(buf)
}
