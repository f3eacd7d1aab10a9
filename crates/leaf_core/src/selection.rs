//! Selected image file and its on-screen preview.

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

const OCTET_STREAM: &str = "application/octet-stream";

/// Longest edge of the decoded preview texture.
pub const PREVIEW_MAX_EDGE: u32 = 512;

/// Image chosen by the user, held entirely in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedImage {
    pub name: String,
    pub mime: String,
    pub bytes: Arc<[u8]>,
}

impl fmt::Debug for SelectedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedImage")
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl SelectedImage {
    /// Reads a picked or dropped file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self::from_bytes(name, None, bytes))
    }

    /// Wraps bytes handed over by a drop source. An empty or missing `mime`
    /// is inferred from the file name, then from the content.
    pub fn from_bytes(
        name: impl Into<String>,
        mime: Option<&str>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        let name = name.into();
        let bytes = bytes.into();
        let mime = match mime.map(str::trim) {
            Some(m) if !m.is_empty() => m.to_string(),
            _ => infer_mime(&name, &bytes).to_string(),
        };
        Self { name, mime, bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn infer_mime(name: &str, bytes: &[u8]) -> &'static str {
    ImageFormat::from_path(name)
        .or_else(|_| image::guess_format(bytes))
        .map(|f| f.to_mime_type())
        .unwrap_or(OCTET_STREAM)
}

/// Returns the first of several chosen files; the rest are ignored.
pub fn pick_first<T>(items: impl IntoIterator<Item = T>) -> Option<T> {
    let mut iter = items.into_iter();
    let first = iter.next()?;
    let extra = iter.count();
    if extra > 0 {
        tracing::debug!("{extra} extra file(s) ignored; only the first is used");
    }
    Some(first)
}

/// Decoded preview: the data URI of the original bytes plus a downscaled
/// RGBA buffer ready for upload as a texture.
#[derive(Clone, PartialEq, Eq)]
pub struct Preview {
    pub data_uri: String,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl fmt::Debug for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preview")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("data_uri_len", &self.data_uri.len())
            .finish()
    }
}

impl Preview {
    pub fn decode(image: &SelectedImage) -> Result<Self> {
        let decoded = image::load_from_memory(&image.bytes)
            .with_context(|| format!("failed to decode preview for {}", image.name))?;
        let fitted = if decoded.width() > PREVIEW_MAX_EDGE || decoded.height() > PREVIEW_MAX_EDGE {
            decoded.thumbnail(PREVIEW_MAX_EDGE, PREVIEW_MAX_EDGE)
        } else {
            decoded
        };
        let rgba = fitted.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            data_uri: data_uri(&image.mime, &image.bytes),
            width,
            height,
            rgba: rgba.into_raw(),
        })
    }

    pub fn size(&self) -> [usize; 2] {
        [self.width as usize, self.height as usize]
    }
}

/// `data:<mime>;base64,<payload>` for the given bytes.
pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}
