//! Format detection from hints, falling back to magic bytes.

use crate::hints::StreamInfo;

/// Formats the engine can route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Format {
    PlainText,
    Markdown,
    Html,
    Json,
    Pdf,
    Docx,
    Pptx,
    Xlsx,
    /// Raster image, with its MIME type.
    Image(&'static str),
    /// Anything else, with a human-readable description.
    Unknown(String),
}

impl Format {
    /// Formats Azure Document Intelligence `prebuilt-layout` accepts.
    pub fn is_ocr_eligible(&self) -> bool {
        match self {
            Format::Pdf | Format::Docx | Format::Pptx | Format::Xlsx | Format::Html => true,
            Format::Image(mime) => matches!(
                *mime,
                "image/jpeg" | "image/png" | "image/bmp" | "image/tiff"
            ),
            _ => false,
        }
    }
}

static IMAGE_TYPES: [(&str, &str); 6] = [
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".png", "image/png"),
    (".gif", "image/gif"),
    (".bmp", "image/bmp"),
    (".tiff", "image/tiff"),
];

/// Decide the format of `bytes`.
///
/// The caller's hints are consulted on their own first, then the hints
/// derived from the source (file name, `Content-Type`), then the content.
/// Within one set of hints the MIME type is checked before the extension.
pub fn detect_format(caller: Option<&StreamInfo>, derived: &StreamInfo, bytes: &[u8]) -> Format {
    if let Some(f) = caller.and_then(from_hints) {
        return f;
    }
    if let Some(f) = from_hints(derived) {
        return f;
    }
    sniff(bytes).unwrap_or_else(|| {
        let described = caller
            .into_iter()
            .chain(std::iter::once(derived))
            .find_map(|i| i.essence().or_else(|| i.extension.clone()));
        Format::Unknown(described.unwrap_or_else(|| "unrecognised content".to_string()))
    })
}

fn from_hints(info: &StreamInfo) -> Option<Format> {
    info.essence()
        .as_deref()
        .and_then(from_mime)
        .or_else(|| info.extension.as_deref().and_then(from_extension))
}

fn from_mime(mime: &str) -> Option<Format> {
    let f = match mime {
        "text/plain" => Format::PlainText,
        "text/markdown" | "text/x-markdown" => Format::Markdown,
        "text/html" | "application/xhtml+xml" => Format::Html,
        "application/json" => Format::Json,
        "application/pdf" | "application/x-pdf" => Format::Pdf,
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => Format::Docx,
        "application/vnd.openxmlformats-officedocument.presentationml.presentation" => {
            Format::Pptx
        }
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => Format::Xlsx,
        "image/jpg" => Format::Image("image/jpeg"),
        other => {
            let (_, mime) = IMAGE_TYPES.iter().find(|(_, m)| *m == other)?;
            Format::Image(*mime)
        }
    };
    Some(f)
}

fn from_extension(ext: &str) -> Option<Format> {
    let f = match ext {
        ".txt" | ".text" | ".log" => Format::PlainText,
        ".md" | ".markdown" => Format::Markdown,
        ".html" | ".htm" => Format::Html,
        ".json" | ".jsonl" => Format::Json,
        ".pdf" => Format::Pdf,
        ".docx" => Format::Docx,
        ".pptx" => Format::Pptx,
        ".xlsx" => Format::Xlsx,
        ".tif" => Format::Image("image/tiff"),
        other => {
            let (_, mime) = IMAGE_TYPES.iter().find(|(e, _)| *e == other)?;
            Format::Image(*mime)
        }
    };
    Some(f)
}

fn sniff(bytes: &[u8]) -> Option<Format> {
    match infer::get(bytes) {
        Some(kind) => {
            let mime = kind.mime_type();
            from_mime(mime).or_else(|| match mime {
                m if m.starts_with("text/") => sniff_text(bytes),
                m => Some(Format::Unknown(m.to_string())),
            })
        }
        None => sniff_text(bytes),
    }
}

fn sniff_text(bytes: &[u8]) -> Option<Format> {
    let head = &bytes[..bytes.len().min(1024)];
    let text = match std::str::from_utf8(head) {
        Ok(t) => t,
        // A multi-byte character may straddle the cut.
        Err(e) if e.error_len().is_none() => std::str::from_utf8(&head[..e.valid_up_to()]).ok()?,
        Err(_) => return None,
    };
    let trimmed = text.trim_start_matches('\u{FEFF}').trim_start();
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("<!doctype html") || lower.starts_with("<html") {
        Some(Format::Html)
    } else if trimmed.starts_with('{') || trimmed.starts_with('[') {
        Some(Format::Json)
    } else {
        Some(Format::PlainText)
    }
}
