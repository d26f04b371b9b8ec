//! Legacy PPT (OLE/CFB) decoder.
//!
//! Reads the binary record tree of the `PowerPoint Document` stream and
//! rebuilds slides, shapes, formatted text, hyperlinks and pictures as a
//! [`deckread_core::Presentation`].
//!
//! ```no_run
//! use deckread_ppt::PptParser;
//!
//! let file = std::fs::File::open("deck.ppt")?;
//! let presentation = PptParser::new().parse(file)?;
//! for slide in &presentation.slides {
//!     println!("{:?}", slide.text_lines());
//! }
//! # Ok::<(), deckread_core::Error>(())
//! ```

pub mod context;
pub mod cursor;
pub mod parser;
pub mod persist;
pub mod pictures;
pub mod properties;
pub mod record;
pub mod shapes;
pub mod text;

mod builder;
mod document;
mod slide;

#[cfg(test)]
mod test_support;

pub use context::DecodeOptions;
pub use parser::{PptParser, PptStreams};
