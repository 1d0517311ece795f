//! Emitted sprite artifacts.

/// One named sprite handed to the output sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteAsset {
    name: String,
    content: String,
}

impl SpriteAsset {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Output file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Byte length of the document.
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Raw document bytes.
    pub fn source(&self) -> &[u8] {
        self.content.as_bytes()
    }
}
