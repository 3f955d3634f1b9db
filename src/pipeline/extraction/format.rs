use std::io::Read;
use std::path::Path;

use super::BackendFailure;

/// Broad document categories the backends route on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Image,
    Unsupported,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
            Self::Unsupported => "unsupported",
        }
    }
}

/// Detect the document kind from magic bytes (NOT file extensions).
/// Magic bytes don't lie — extensions can be wrong.
pub fn detect_kind(path: &Path) -> Result<DocumentKind, BackendFailure> {
    let mut file = std::fs::File::open(path)
        .map_err(|e| BackendFailure::Failed(format!("cannot open {}: {e}", path.display())))?;
    let mut header = [0u8; 8];
    let bytes_read = file
        .read(&mut header)
        .map_err(|e| BackendFailure::Failed(format!("cannot read {}: {e}", path.display())))?;

    let kind = match &header[..bytes_read.min(8)] {
        // PDF: starts with %PDF
        [0x25, 0x50, 0x44, 0x46, ..] => DocumentKind::Pdf,
        // JPEG: starts with FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => DocumentKind::Image,
        // PNG: starts with 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => DocumentKind::Image,
        // GIF: starts with GIF8
        [0x47, 0x49, 0x46, 0x38, ..] => DocumentKind::Image,
        _ => DocumentKind::Unsupported,
    };

    Ok(kind)
}
