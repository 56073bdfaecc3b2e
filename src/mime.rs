//! MIME type detection.

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

pub trait MimeTypeDetector: Send + Sync {
    /// Detect from a content sample, falling back to the path.
    fn detect(&self, path: &str, sample: &[u8]) -> String;

    fn detect_from_path(&self, path: &str) -> String;
}

/// Magic-number sniffing with an extension table as fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMimeDetector;

const MAGIC: &[(&[u8], &str)] = &[
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"%PDF-", "application/pdf"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1f\x8b", "application/gzip"),
];

const EXTENSIONS: &[(&str, &str)] = &[
    ("txt", "text/plain; charset=utf-8"),
    ("html", "text/html; charset=utf-8"),
    ("htm", "text/html; charset=utf-8"),
    ("css", "text/css; charset=utf-8"),
    ("csv", "text/csv; charset=utf-8"),
    ("md", "text/markdown; charset=utf-8"),
    ("js", "text/javascript; charset=utf-8"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("yaml", "application/yaml"),
    ("yml", "application/yaml"),
    ("toml", "application/toml"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("tar", "application/x-tar"),
    ("wasm", "application/wasm"),
];

impl DefaultMimeDetector {
    pub fn new() -> Self {
        Self
    }

    fn sniff(sample: &[u8]) -> Option<&'static str> {
        if sample.len() >= 12 && &sample[..4] == b"RIFF" && &sample[8..12] == b"WEBP" {
            return Some("image/webp");
        }
        MAGIC
            .iter()
            .find(|(magic, _)| sample.starts_with(magic))
            .map(|(_, mime)| *mime)
    }
}

impl MimeTypeDetector for DefaultMimeDetector {
    fn detect(&self, path: &str, sample: &[u8]) -> String {
        if let Some(mime) = Self::sniff(sample) {
            return mime.to_string();
        }
        let by_path = self.detect_from_path(path);
        if by_path != DEFAULT_MIME_TYPE {
            return by_path;
        }
        if !sample.is_empty() && std::str::from_utf8(sample).is_ok() {
            return "text/plain; charset=utf-8".to_string();
        }
        by_path
    }

    fn detect_from_path(&self, path: &str) -> String {
        let name = path.rsplit('/').next().unwrap_or(path);
        let Some((_, ext)) = name.rsplit_once('.') else {
            return DEFAULT_MIME_TYPE.to_string();
        };
        let ext = ext.to_ascii_lowercase();
        EXTENSIONS
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, mime)| mime.to_string())
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string())
    }
}
