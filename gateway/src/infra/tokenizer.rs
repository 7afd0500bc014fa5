//! Infrastructure implementations of the `TokenCounter` port.

use tiktoken_rs::CoreBPE;

use crate::application::ports::TokenCounter;

/// Counts tokens with the `o200k_base` encoding.
pub struct TiktokenCounter {
    bpe: CoreBPE,
}

impl TiktokenCounter {
    /// Load the encoding tables.
    ///
    /// # Errors
    ///
    /// Returns an error when the encoding cannot be constructed.
    pub fn o200k() -> anyhow::Result<Self> {
        let bpe = tiktoken_rs::o200k_base()?;
        Ok(Self { bpe })
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> Option<usize> {
        Some(self.bpe.encode_with_special_tokens(text).len())
    }
}

/// Degraded-mode counter: every count is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableCounter;

impl TokenCounter for UnavailableCounter {
    fn count(&self, _text: &str) -> Option<usize> {
        None
    }
}
