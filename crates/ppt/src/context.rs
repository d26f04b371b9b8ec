//! Decode options and the per-call decode context.

use deckread_core::{Error, FontTable, HyperlinkTable, PictureTable, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Caller-facing decode configuration.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    cancel: Option<Arc<AtomicBool>>,
    lossy_utf16: bool,
}

impl DecodeOptions {
    /// Default options: no cancellation, correct UTF-16 decoding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort with [`Error::Cancelled`] once `flag` is set.
    ///
    /// The flag is polled once per slide and once per shape container.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Keep only the low byte of every UTF-16 code unit, as very old
    /// readers of this format did. Off by default.
    pub fn with_lossy_utf16(mut self, lossy: bool) -> Self {
        self.lossy_utf16 = lossy;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// State accumulated during one decode call.
///
/// Owned by the top-level call and passed down explicitly; the tables move
/// into the resulting presentation when decoding finishes.
#[derive(Debug)]
pub(crate) struct DecodeContext<'o> {
    pub options: &'o DecodeOptions,
    pub fonts: FontTable,
    pub hyperlinks: HyperlinkTable,
    pub pictures: PictureTable,
}

impl<'o> DecodeContext<'o> {
    pub fn new(options: &'o DecodeOptions) -> Self {
        Self {
            options,
            fonts: FontTable::new(),
            hyperlinks: HyperlinkTable::new(),
            pictures: PictureTable::new(),
        }
    }

    pub fn check_cancelled(&self) -> Result<()> {
        if self.options.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    /// Decode UTF-16 code units according to the configured mode.
    pub fn decode_units(&self, units: &[u16]) -> String {
        if self.options.lossy_utf16 {
            units.iter().map(|&u| char::from(u as u8)).collect()
        } else {
            String::from_utf16_lossy(units)
        }
    }

    /// Decode little-endian UTF-16 bytes, stopping at the first NUL.
    pub fn decode_utf16_bytes(&self, bytes: &[u8]) -> String {
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
            .take_while(|&u| u != 0)
            .collect();
        self.decode_units(&units)
    }
}
