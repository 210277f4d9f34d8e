//! Attachment payload descriptors.

use serde::{Deserialize, Serialize};

/// A binary payload shipped alongside an event.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name presented to the delivery side
    pub filename: String,

    /// Raw payload bytes
    pub bytes: Vec<u8>,

    /// MIME type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Elide payload bytes from Debug output; dumps of large attachments are noise.
impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("filename", &self.filename)
            .field("bytes", &format_args!("[{} bytes]", self.bytes.len()))
            .field("content_type", &self.content_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_length() {
        let att = Attachment::new("log.txt", vec![1, 2, 3]);
        assert_eq!(att.len(), 3);
        assert!(!att.is_empty());
    }

    #[test]
    fn debug_elides_bytes() {
        let att = Attachment::new("log.txt", vec![0; 1024]).with_content_type("text/plain");
        let dbg = format!("{att:?}");
        assert!(dbg.contains("[1024 bytes]"));
        assert!(!dbg.contains("0, 0, 0"));
    }
}
