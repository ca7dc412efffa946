//! Text currently shown on the sign.

use heapless::String;

use crate::request::REQUEST_BUFFER_BYTES;

/// Decoded messages never outgrow the request bytes they came from.
pub const MESSAGE_CAPACITY: usize = REQUEST_BUFFER_BYTES;

pub type MessageText = String<MESSAGE_CAPACITY>;

/// Text did not fit in [`MESSAGE_CAPACITY`] bytes.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct CapacityError;

/// Immutable message snapshot handed to a scroll run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DisplayMessage {
    text: MessageText,
    glyph_count: usize,
}

impl Default for DisplayMessage {
    fn default() -> Self {
        Self::new(MessageText::new())
    }
}

impl DisplayMessage {
    pub fn new(text: MessageText) -> Self {
        // One trailing blank cell so the last glyph fully leaves the panel.
        let glyph_count = text.chars().count() + 1;
        Self { text, glyph_count }
    }

    pub fn try_from_str(text: &str) -> Result<Self, CapacityError> {
        let mut owned = MessageText::new();
        owned.push_str(text).map_err(|_| CapacityError)?;
        Ok(Self::new(owned))
    }

    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    /// Character count plus one, used for the scroll extent.
    pub fn glyph_count(&self) -> usize {
        self.glyph_count
    }
}
