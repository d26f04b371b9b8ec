//! Domain types for a decoded presentation.
//!
//! Everything here is built by one decode call and is not mutated afterwards.
//! Coordinates and sizes are in the file's native units (master units,
//! 576 per inch) unless stated otherwise.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A decoded presentation with the tables shared by its slides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    /// Slide size from the document atom.
    pub slide_size: SlideSize,

    /// Slides in presentation order.
    pub slides: Vec<Slide>,

    /// Fonts referenced by typeface index from character runs.
    pub fonts: FontTable,

    /// External hyperlinks keyed by hyperlink ID.
    pub hyperlinks: HyperlinkTable,

    /// Images referenced by 1-based index from picture shapes.
    pub pictures: PictureTable,
}

impl Presentation {
    /// Create an empty presentation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slide to the presentation.
    pub fn add_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    /// Get the image bound to a picture shape.
    pub fn picture_for(&self, shape: &Shape) -> Option<&PictureData> {
        match &shape.kind {
            ShapeKind::Picture { blob_index, .. } => self.pictures.resolve(*blob_index),
            _ => None,
        }
    }
}

/// Slide dimensions in master units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideSize {
    pub width: i32,
    pub height: i32,
}

/// Ordered font names, looked up by position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontTable {
    names: Vec<String>,
}

impl FontTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a font at the next positional index.
    pub fn push(&mut self, name: impl Into<String>) {
        self.names.push(name.into());
    }

    /// Look up a font by typeface index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// An external hyperlink from the document's object list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hyperlink {
    /// Text shown for the link.
    pub friendly_name: String,

    /// Target URL.
    pub target: String,

    /// In-document location (slide anchor), if any.
    pub location: Option<String>,
}

/// External hyperlinks keyed by their hyperlink ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HyperlinkTable {
    links: BTreeMap<u32, Hyperlink>,
}

impl HyperlinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a hyperlink, replacing any earlier entry with the same ID.
    pub fn insert(&mut self, id: u32, link: Hyperlink) {
        self.links.insert(id, link);
    }

    pub fn get(&self, id: u32) -> Option<&Hyperlink> {
        self.links.get(&id)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Hyperlink)> {
        self.links.iter().map(|(id, link)| (*id, link))
    }
}

/// Encoding of an embedded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PictureFormat {
    Jpeg,
    Png,
}

impl PictureFormat {
    /// Conventional file extension for the format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

/// Raw encoded image bytes, passed through undecoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PictureData {
    pub format: PictureFormat,
    pub data: Vec<u8>,
}

/// Images in Pictures-stream order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PictureTable {
    pictures: Vec<PictureData>,
}

impl PictureTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, picture: PictureData) {
        self.pictures.push(picture);
    }

    /// Resolve a 1-based blob index. Index 0 never resolves.
    pub fn resolve(&self, blob_index: u32) -> Option<&PictureData> {
        let index = usize::try_from(blob_index).ok()?.checked_sub(1)?;
        self.pictures.get(index)
    }

    pub fn len(&self) -> usize {
        self.pictures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pictures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PictureData> {
        self.pictures.iter()
    }
}

/// A single slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    /// Layout code from the slide atom.
    pub layout: SlideLayout,

    /// Placeholder types declared by the layout, in slot order.
    pub placeholders: [PlaceholderType; 8],

    /// Which master properties the slide follows.
    pub flags: SlideFlags,

    /// The slide's eight scheme colors. Not yet applied to shapes.
    pub color_scheme: [Rgb; 8],

    /// Shapes in drawing order.
    pub shapes: Vec<Shape>,
}

impl Slide {
    /// Create an empty slide with the given layout.
    pub fn new(layout: SlideLayout) -> Self {
        Self {
            layout,
            placeholders: [PlaceholderType::None; 8],
            flags: SlideFlags::default(),
            color_scheme: [Rgb::default(); 8],
            shapes: Vec::new(),
        }
    }

    /// Add a shape to this slide.
    pub fn add_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    /// Plain text of every text shape, one entry per paragraph.
    pub fn text_lines(&self) -> Vec<String> {
        self.shapes
            .iter()
            .filter_map(|shape| match &shape.kind {
                ShapeKind::RichText { paragraphs, .. } => Some(paragraphs),
                _ => None,
            })
            .flatten()
            .map(Paragraph::text)
            .collect()
    }
}

/// Slide flag word bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideFlags {
    pub follow_master_objects: bool,
    pub follow_master_scheme: bool,
    pub follow_master_background: bool,
}

/// Slide layout codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlideLayout {
    TitleSlide,
    TitleBody,
    MasterTitle,
    MasterSlide,
    MasterNotes,
    NotesTitleBody,
    Handout,
    TitleOnly,
    TwoColumns,
    TwoRows,
    ColumnTwoRows,
    TwoRowsColumn,
    TwoColumnsRow,
    FourObjects,
    BigObject,
    Blank,
    VerticalTitleBody,
    VerticalTwoRows,
}

impl SlideLayout {
    /// Map a geometry code to a layout. Codes outside the closed set are `None`.
    pub fn from_u32(value: u32) -> Option<Self> {
        Some(match value {
            0x00 => Self::TitleSlide,
            0x01 => Self::TitleBody,
            0x02 => Self::MasterTitle,
            0x03 => Self::MasterSlide,
            0x04 => Self::MasterNotes,
            0x05 => Self::NotesTitleBody,
            0x06 => Self::Handout,
            0x07 => Self::TitleOnly,
            0x08 => Self::TwoColumns,
            0x09 => Self::TwoRows,
            0x0A => Self::ColumnTwoRows,
            0x0B => Self::TwoRowsColumn,
            0x0D => Self::TwoColumnsRow,
            0x0E => Self::FourObjects,
            0x0F => Self::BigObject,
            0x10 => Self::Blank,
            0x11 => Self::VerticalTitleBody,
            0x12 => Self::VerticalTwoRows,
            _ => return None,
        })
    }
}

/// Placeholder types that can occupy a layout slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaceholderType {
    None,
    MasterTitle,
    MasterBody,
    MasterCenterTitle,
    MasterSubtitle,
    MasterNotesSlideImage,
    MasterNotesBody,
    MasterDate,
    MasterSlideNumber,
    MasterFooter,
    MasterHeader,
    NotesSlideImage,
    NotesBody,
    Title,
    Body,
    CenterTitle,
    Subtitle,
    VerticalTitle,
    VerticalBody,
    Object,
    Graph,
    Table,
    ClipArt,
    OrgChart,
    Media,
    VerticalObject,
    Picture,
}

impl PlaceholderType {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0x00 => Self::None,
            0x01 => Self::MasterTitle,
            0x02 => Self::MasterBody,
            0x03 => Self::MasterCenterTitle,
            0x04 => Self::MasterSubtitle,
            0x05 => Self::MasterNotesSlideImage,
            0x06 => Self::MasterNotesBody,
            0x07 => Self::MasterDate,
            0x08 => Self::MasterSlideNumber,
            0x09 => Self::MasterFooter,
            0x0A => Self::MasterHeader,
            0x0B => Self::NotesSlideImage,
            0x0C => Self::NotesBody,
            0x0D => Self::Title,
            0x0E => Self::Body,
            0x0F => Self::CenterTitle,
            0x10 => Self::Subtitle,
            0x11 => Self::VerticalTitle,
            0x12 => Self::VerticalBody,
            0x13 => Self::Object,
            0x14 => Self::Graph,
            0x15 => Self::Table,
            0x16 => Self::ClipArt,
            0x17 => Self::OrgChart,
            0x18 => Self::Media,
            0x19 => Self::VerticalObject,
            0x1A => Self::Picture,
            _ => return None,
        })
    }
}

/// An 8-bit-per-channel RGB triple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// A color as stored in the file: literal or a slot in the slide's scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Color {
    Rgb(Rgb),
    Scheme(u8),
}

/// A shape's position and size on its slide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub offset_x: i32,
    pub offset_y: i32,
    pub width: i32,
    pub height: i32,
}

/// A shape placed on a slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Zero when the shape has no client anchor.
    pub bounds: Bounds,

    pub kind: ShapeKind,
}

/// The output shape variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    /// An image bound to the picture table by 1-based index.
    Picture {
        blob_index: u32,
        shadow: Option<Shadow>,
    },

    /// A text box.
    RichText {
        paragraphs: Vec<Paragraph>,
        insets: TextInsets,
        fill: Option<Color>,
    },

    /// A straight line. Width is in EMUs (12700 per point).
    Line { color: Color, width: u32 },
}

/// Drop shadow derived from the shadow offsets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    /// Offset length in EMUs.
    pub distance: f64,

    /// Offset direction in degrees, clockwise from the positive x axis.
    pub direction: f64,

    pub color: Option<Color>,
}

/// Distances between a text box's edges and its text, in EMUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextInsets {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Default for TextInsets {
    fn default() -> Self {
        // 0.1" horizontally, 0.05" vertically.
        Self {
            left: 91440,
            top: 45720,
            right: 91440,
            bottom: 45720,
        }
    }
}

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
    Distributed,
    ThaiDistributed,
    JustifyLow,
}

impl Alignment {
    pub fn from_u16(value: u16) -> Option<Self> {
        Some(match value {
            0 => Self::Left,
            1 => Self::Center,
            2 => Self::Right,
            3 => Self::Justify,
            4 => Self::Distributed,
            5 => Self::ThaiDistributed,
            6 => Self::JustifyLow,
            _ => return None,
        })
    }
}

/// A paragraph bullet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub kind: BulletKind,
    pub character: char,
    pub font: Option<String>,
    /// Percentage of the text size when positive, points when negative.
    pub size: Option<i16>,
    pub color: Option<Color>,
}

/// How a bullet is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulletKind {
    /// No bullet is drawn.
    None,
    /// A single character bullet.
    Character,
}

/// One paragraph of a text box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub alignment: Alignment,

    /// Nesting level inferred from left-margin transitions.
    pub level: i32,

    pub bullet: Bullet,

    /// Percentage when positive, master units when negative.
    pub line_spacing: Option<i16>,
    pub space_before: Option<i16>,
    pub space_after: Option<i16>,

    pub runs: Vec<Run>,
}

impl Paragraph {
    /// Concatenated text of all runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}

/// A run of uniformly formatted text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    pub font_name: Option<String>,
    /// Size in points.
    pub font_size: Option<u16>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Option<Color>,
    pub hyperlink: Option<RunHyperlink>,
}

impl Run {
    /// Create an unformatted run.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// A hyperlink bound to a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunHyperlink {
    pub id: u32,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picture_table_is_one_based() {
        let mut table = PictureTable::new();
        table.push(PictureData {
            format: PictureFormat::Png,
            data: vec![0x89, b'P'],
        });
        table.push(PictureData {
            format: PictureFormat::Jpeg,
            data: vec![0xFF, 0xD8],
        });

        assert!(table.resolve(0).is_none());
        assert_eq!(table.resolve(1).unwrap().format, PictureFormat::Png);
        assert_eq!(table.resolve(2).unwrap().format, PictureFormat::Jpeg);
        assert!(table.resolve(3).is_none());
    }

    #[test]
    fn test_layout_codes() {
        assert_eq!(SlideLayout::from_u32(0), Some(SlideLayout::TitleSlide));
        assert_eq!(SlideLayout::from_u32(0x10), Some(SlideLayout::Blank));
        assert_eq!(SlideLayout::from_u32(0x0C), None);
        assert_eq!(SlideLayout::from_u32(0x13), None);
        assert_eq!(PlaceholderType::from_u8(0x0D), Some(PlaceholderType::Title));
        assert_eq!(PlaceholderType::from_u8(0x1B), None);
    }

    #[test]
    fn test_slide_text_lines() {
        let mut slide = Slide::new(SlideLayout::TitleBody);
        slide.add_shape(Shape {
            bounds: Bounds::default(),
            kind: ShapeKind::RichText {
                paragraphs: vec![Paragraph {
                    alignment: Alignment::Center,
                    level: 0,
                    bullet: Bullet {
                        kind: BulletKind::None,
                        character: '\u{2022}',
                        font: None,
                        size: None,
                        color: None,
                    },
                    line_spacing: None,
                    space_before: None,
                    space_after: None,
                    runs: vec![Run::new("Amazing "), Run::new("grace")],
                }],
                insets: TextInsets::default(),
                fill: None,
            },
        });
        slide.add_shape(Shape {
            bounds: Bounds::default(),
            kind: ShapeKind::Line {
                color: Color::Rgb(Rgb::BLACK),
                width: 9525,
            },
        });

        assert_eq!(slide.text_lines(), vec!["Amazing grace".to_string()]);
    }

    #[test]
    fn test_presentation_serializes() {
        let mut presentation = Presentation::new();
        presentation.fonts.push("Arial");
        presentation.hyperlinks.insert(
            3,
            Hyperlink {
                friendly_name: "Example".into(),
                target: "https://example.com/".into(),
                location: None,
            },
        );
        presentation.add_slide(Slide::new(SlideLayout::Blank));

        let json = serde_json::to_string(&presentation).unwrap();
        let back: Presentation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, presentation);
        assert_eq!(back.fonts.get(0), Some("Arial"));
    }
}
