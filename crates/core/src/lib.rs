//! Core document model and error types for decoding legacy binary
//! PowerPoint presentations.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    Alignment, Bounds, Bullet, BulletKind, Color, FontTable, Hyperlink, HyperlinkTable,
    Paragraph, PictureData, PictureFormat, PictureTable, PlaceholderType, Presentation, Rgb, Run,
    RunHyperlink, Shadow, Shape, ShapeKind, Slide, SlideFlags, SlideLayout, SlideSize,
    TextInsets,
};
