//! Text record decoding: text atoms, style runs and hyperlink ranges.
//!
//! Text appears in two places: inside a shape's client text box, and in the
//! document's slide list (outline text), which a text box then references by
//! index. Both are sequences of the same records, so one [`TextCollector`]
//! consumes them and yields [`TextBlock`]s.
//!
//! ## StyleTextPropAtom
//!
//! The atom holds paragraph runs followed by character runs. Each run covers
//! `char_count` characters and carries a bitmask; every set bit is followed
//! by a field of fixed width, in a fixed order. Both run lists must cover
//! exactly the text length plus one (the implicit final paragraph mark).

use crate::cursor::Cursor;
use crate::record::{record_types as rt, RecordHeader, RecordSignature};
use deckread_core::{Color, Result, Rgb};

/// Paragraph property mask bits.
mod pf {
    pub const HAS_BULLET: u32 = 0x0000_0001;
    pub const BULLET_HAS_FONT: u32 = 0x0000_0002;
    pub const BULLET_HAS_COLOR: u32 = 0x0000_0004;
    pub const BULLET_HAS_SIZE: u32 = 0x0000_0008;
    pub const BULLET_FONT: u32 = 0x0000_0010;
    pub const BULLET_COLOR: u32 = 0x0000_0020;
    pub const BULLET_SIZE: u32 = 0x0000_0040;
    pub const BULLET_CHAR: u32 = 0x0000_0080;
    pub const LEFT_MARGIN: u32 = 0x0000_0100;
    pub const INDENT: u32 = 0x0000_0400;
    pub const ALIGN: u32 = 0x0000_0800;
    pub const LINE_SPACING: u32 = 0x0000_1000;
    pub const SPACE_BEFORE: u32 = 0x0000_2000;
    pub const SPACE_AFTER: u32 = 0x0000_4000;
    pub const DEFAULT_TAB_SIZE: u32 = 0x0000_8000;
    pub const FONT_ALIGN: u32 = 0x0001_0000;
    pub const CHAR_WRAP: u32 = 0x0002_0000;
    pub const WORD_WRAP: u32 = 0x0004_0000;
    pub const OVERFLOW: u32 = 0x0008_0000;
    pub const TAB_STOPS: u32 = 0x0010_0000;
    pub const TEXT_DIRECTION: u32 = 0x0020_0000;

    pub const BULLET_FLAGS: u32 = HAS_BULLET | BULLET_HAS_FONT | BULLET_HAS_COLOR | BULLET_HAS_SIZE;
    pub const WRAP_FLAGS: u32 = CHAR_WRAP | WORD_WRAP | OVERFLOW;
}

/// Character property mask bits.
mod cf {
    /// Any of bold/italic/underline/shadow/fehint/kumi/emboss/style.
    pub const STYLE: u32 = 0x0000_FFFF;
    pub const TYPEFACE: u32 = 0x0001_0000;
    pub const SIZE: u32 = 0x0002_0000;
    pub const COLOR: u32 = 0x0004_0000;
    pub const POSITION: u32 = 0x0008_0000;
    pub const PP10_EXT: u32 = 0x0010_0000;
    pub const OLD_EA_TYPEFACE: u32 = 0x0020_0000;
    pub const ANSI_TYPEFACE: u32 = 0x0040_0000;
    pub const SYMBOL_TYPEFACE: u32 = 0x0080_0000;
    pub const NEW_EA_TYPEFACE: u32 = 0x0100_0000;
    pub const CS_TYPEFACE: u32 = 0x0200_0000;
    pub const PP11_EXT: u32 = 0x0400_0000;
}

/// Bits of the character style word.
pub mod font_style {
    pub const BOLD: u16 = 0x0001;
    pub const ITALIC: u16 = 0x0002;
    pub const UNDERLINE: u16 = 0x0004;
    pub const SHADOW: u16 = 0x0010;
    pub const EMBOSS: u16 = 0x0200;
}

/// Bits of the paragraph bullet-flags word.
pub mod bullet_flags {
    pub const HAS_BULLET: u16 = 0x0001;
}

/// Index value of a ColorIndexStruct whose RGB bytes are literal.
const COLOR_INDEX_RGB: u8 = 0xFE;
const COLOR_INDEX_UNDEFINED: u8 = 0xFF;

/// InteractiveInfoAtom action that follows an external hyperlink.
const ACTION_HYPERLINK: u8 = 4;

const INTERACTIVE_INFO_ATOM: RecordSignature =
    RecordSignature::new("InteractiveInfoAtom", 0, rt::RT_INTERACTIVE_INFO_ATOM).with_length(0x10);

/// Text types from TextHeaderAtom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextType {
    Title,
    Body,
    Notes,
    NotUsed,
    Other,
    CenterBody,
    CenterTitle,
    HalfBody,
    QuarterBody,
}

impl TextType {
    pub fn from_u32(value: u32) -> Option<Self> {
        Some(match value {
            0 => TextType::Title,
            1 => TextType::Body,
            2 => TextType::Notes,
            3 => TextType::NotUsed,
            4 => TextType::Other,
            5 => TextType::CenterBody,
            6 => TextType::CenterTitle,
            7 => TextType::HalfBody,
            8 => TextType::QuarterBody,
            _ => return None,
        })
    }
}

/// Read a 4-byte ColorIndexStruct.
pub(crate) fn read_color_index(cursor: &mut Cursor<'_>) -> Result<Option<Color>> {
    let [red, green, blue, index] = cursor.read_array::<4>()?;
    match index {
        COLOR_INDEX_RGB => Ok(Some(Color::Rgb(Rgb::new(red, green, blue)))),
        COLOR_INDEX_UNDEFINED => Ok(None),
        0..=7 => Ok(Some(Color::Scheme(index))),
        other => Err(cursor.format_error(format!("invalid color index 0x{:02X}", other))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabStop {
    pub position: i16,
    pub kind: u16,
}

/// Paragraph-level formatting; `None` means "not set by this run".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParagraphProps {
    pub bullet_flags: Option<u16>,
    pub bullet_char: Option<u16>,
    pub bullet_font: Option<u16>,
    pub bullet_size: Option<i16>,
    pub bullet_color: Option<Color>,
    pub alignment: Option<u16>,
    pub line_spacing: Option<i16>,
    pub space_before: Option<i16>,
    pub space_after: Option<i16>,
    pub left_margin: Option<i16>,
    pub indent: Option<i16>,
    pub default_tab_size: Option<u16>,
    pub tab_stops: Vec<TabStop>,
    pub font_align: Option<u16>,
    pub wrap_flags: Option<u16>,
    pub text_direction: Option<u16>,
}

impl ParagraphProps {
    /// Decode the fields selected by `masks`, in wire order.
    pub fn parse(cursor: &mut Cursor<'_>, masks: u32) -> Result<Self> {
        let mut props = Self::default();
        if masks & pf::BULLET_FLAGS != 0 {
            props.bullet_flags = Some(cursor.read_u16()?);
        }
        if masks & pf::BULLET_CHAR != 0 {
            props.bullet_char = Some(cursor.read_u16()?);
        }
        if masks & pf::BULLET_FONT != 0 {
            props.bullet_font = Some(cursor.read_u16()?);
        }
        if masks & pf::BULLET_SIZE != 0 {
            props.bullet_size = Some(cursor.read_i16()?);
        }
        if masks & pf::BULLET_COLOR != 0 {
            props.bullet_color = read_color_index(cursor)?;
        }
        if masks & pf::ALIGN != 0 {
            props.alignment = Some(cursor.read_u16()?);
        }
        if masks & pf::LINE_SPACING != 0 {
            props.line_spacing = Some(cursor.read_i16()?);
        }
        if masks & pf::SPACE_BEFORE != 0 {
            props.space_before = Some(cursor.read_i16()?);
        }
        if masks & pf::SPACE_AFTER != 0 {
            props.space_after = Some(cursor.read_i16()?);
        }
        if masks & pf::LEFT_MARGIN != 0 {
            props.left_margin = Some(cursor.read_i16()?);
        }
        if masks & pf::INDENT != 0 {
            props.indent = Some(cursor.read_i16()?);
        }
        if masks & pf::DEFAULT_TAB_SIZE != 0 {
            props.default_tab_size = Some(cursor.read_u16()?);
        }
        if masks & pf::TAB_STOPS != 0 {
            let count = cursor.read_u16()?;
            props.tab_stops = (0..count)
                .map(|_| {
                    Ok(TabStop {
                        position: cursor.read_i16()?,
                        kind: cursor.read_u16()?,
                    })
                })
                .collect::<Result<_>>()?;
        }
        if masks & pf::FONT_ALIGN != 0 {
            props.font_align = Some(cursor.read_u16()?);
        }
        if masks & pf::WRAP_FLAGS != 0 {
            props.wrap_flags = Some(cursor.read_u16()?);
        }
        if masks & pf::TEXT_DIRECTION != 0 {
            props.text_direction = Some(cursor.read_u16()?);
        }
        Ok(props)
    }

    pub fn has_bullet(&self) -> bool {
        self.bullet_flags
            .is_some_and(|flags| flags & bullet_flags::HAS_BULLET != 0)
    }
}

/// Character-level formatting; `None` means "not set by this run".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharacterProps {
    pub style: Option<u16>,
    pub typeface: Option<u16>,
    pub size: Option<u16>,
    pub color: Option<Color>,
    pub position: Option<i16>,
}

impl CharacterProps {
    /// Decode the fields selected by `masks`, in wire order.
    pub fn parse(cursor: &mut Cursor<'_>, masks: u32) -> Result<Self> {
        let mut props = Self::default();
        if masks & cf::STYLE != 0 {
            props.style = Some(cursor.read_u16()?);
        }
        if masks & cf::TYPEFACE != 0 {
            props.typeface = Some(cursor.read_u16()?);
        }
        // East Asian, ANSI and symbol typefaces are not modeled.
        for mask in [cf::OLD_EA_TYPEFACE, cf::ANSI_TYPEFACE, cf::SYMBOL_TYPEFACE] {
            if masks & mask != 0 {
                cursor.skip(2)?;
            }
        }
        if masks & cf::SIZE != 0 {
            props.size = Some(cursor.read_u16()?);
        }
        if masks & cf::COLOR != 0 {
            props.color = read_color_index(cursor)?;
        }
        if masks & cf::POSITION != 0 {
            props.position = Some(cursor.read_i16()?);
        }
        if masks & cf::PP10_EXT != 0 {
            cursor.skip(4)?;
        }
        for mask in [cf::NEW_EA_TYPEFACE, cf::CS_TYPEFACE] {
            if masks & mask != 0 {
                cursor.skip(2)?;
            }
        }
        if masks & cf::PP11_EXT != 0 {
            cursor.skip(4)?;
        }
        Ok(props)
    }

    pub fn has_style(&self, bit: u16) -> bool {
        self.style.is_some_and(|style| style & bit != 0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphRun {
    pub char_count: u32,
    pub indent_level: u16,
    pub props: ParagraphProps,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CharacterRun {
    pub char_count: u32,
    pub props: CharacterProps,
}

/// Decode a StyleTextPropAtom payload for text of `text_len` code units.
pub fn parse_style_text_prop(
    cursor: &mut Cursor<'_>,
    text_len: usize,
) -> Result<(Vec<ParagraphRun>, Vec<CharacterRun>)> {
    let target = text_len as u64 + 1;

    let mut paragraph_runs = Vec::new();
    let mut covered = 0u64;
    while covered < target {
        let char_count = cursor.read_u32()?;
        let indent_level = cursor.read_u16()?;
        let masks = cursor.read_u32()?;
        let props = ParagraphProps::parse(cursor, masks)?;
        covered += u64::from(char_count);
        paragraph_runs.push(ParagraphRun {
            char_count,
            indent_level,
            props,
        });
    }
    if covered != target {
        return Err(cursor.format_error(format!(
            "paragraph runs cover {} characters, text needs {}",
            covered, target
        )));
    }

    let mut character_runs = Vec::new();
    let mut covered = 0u64;
    while covered < target {
        let char_count = cursor.read_u32()?;
        let masks = cursor.read_u32()?;
        let props = CharacterProps::parse(cursor, masks)?;
        covered += u64::from(char_count);
        character_runs.push(CharacterRun { char_count, props });
    }
    if covered != target {
        return Err(cursor.format_error(format!(
            "character runs cover {} characters, text needs {}",
            covered, target
        )));
    }

    Ok((paragraph_runs, character_runs))
}

/// A character range bound to an external hyperlink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkRange {
    pub start: u32,
    pub end: u32,
    pub hyperlink_id: u32,
}

/// One text body: the text and its formatting runs.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub text_type: TextType,
    /// UTF-16 code units; `\r` separates paragraphs.
    pub units: Vec<u16>,
    /// `None` when the block had no StyleTextPropAtom.
    pub style: Option<(Vec<ParagraphRun>, Vec<CharacterRun>)>,
    pub links: Vec<LinkRange>,
}

impl TextBlock {
    fn new(text_type: TextType) -> Self {
        Self {
            text_type,
            units: Vec::new(),
            style: None,
            links: Vec::new(),
        }
    }
}

/// The record kinds that may appear in a run of text records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextRecord {
    Header,
    Chars,
    Bytes,
    StyleProps,
    MasterProps,
    Ruler,
    Bookmark,
    SpecialInfo,
    InteractiveInfo,
    InteractiveRange,
    OutlineRef,
    MetaCharacter,
}

impl TextRecord {
    fn from_type(rec_type: u16) -> Option<Self> {
        Some(match rec_type {
            rt::RT_TEXT_HEADER_ATOM => Self::Header,
            rt::RT_TEXT_CHARS_ATOM => Self::Chars,
            rt::RT_TEXT_BYTES_ATOM => Self::Bytes,
            rt::RT_STYLE_TEXT_PROP_ATOM => Self::StyleProps,
            rt::RT_MASTER_TEXT_PROP_ATOM => Self::MasterProps,
            rt::RT_TEXT_RULER_ATOM => Self::Ruler,
            rt::RT_TEXT_BOOKMARK_ATOM => Self::Bookmark,
            rt::RT_TEXT_SPECIAL_INFO_ATOM => Self::SpecialInfo,
            rt::RT_INTERACTIVE_INFO => Self::InteractiveInfo,
            rt::RT_TEXT_INTERACTIVE_INFO_ATOM => Self::InteractiveRange,
            rt::RT_OUTLINE_TEXT_REF_ATOM => Self::OutlineRef,
            rt::RT_SLIDE_NUMBER_META_CHAR_ATOM
            | rt::RT_DATE_TIME_META_CHAR_ATOM
            | rt::RT_GENERIC_DATE_META_CHAR_ATOM
            | rt::RT_HEADER_META_CHAR_ATOM
            | rt::RT_FOOTER_META_CHAR_ATOM
            | rt::RT_RTF_DATE_TIME_META_CHAR_ATOM => Self::MetaCharacter,
            _ => return None,
        })
    }
}

/// An InteractiveInfo waiting for its TextInteractiveInfoAtom.
#[derive(Debug, Clone, Copy)]
struct PendingAction {
    instance: u16,
    hyperlink_id: Option<u32>,
}

/// Accumulates text records into blocks.
#[derive(Debug, Default)]
pub struct TextCollector {
    blocks: Vec<TextBlock>,
    /// Hyperlink ranges seen before any inline block (outline references).
    links: Vec<LinkRange>,
    outline_ref: Option<i32>,
    pending: Option<PendingAction>,
}

impl TextCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `rec_type` is one of the records this collector consumes.
    pub fn accepts(rec_type: u16) -> bool {
        TextRecord::from_type(rec_type).is_some()
    }

    /// Consume one record. `body` covers exactly its payload.
    pub fn push(&mut self, header: &RecordHeader, mut body: Cursor<'_>) -> Result<()> {
        let Some(kind) = TextRecord::from_type(header.rec_type) else {
            return Err(body.not_implemented(format!(
                "text record type 0x{:04X}",
                header.rec_type
            )));
        };

        match kind {
            TextRecord::Header => {
                let value = body.read_u32()?;
                let text_type = TextType::from_u32(value)
                    .ok_or_else(|| body.format_error(format!("unknown text type {}", value)))?;
                log::trace!("Text block of type {:?}", text_type);
                self.blocks.push(TextBlock::new(text_type));
            }
            TextRecord::Chars => {
                let bytes = body.rest();
                if bytes.len() % 2 != 0 {
                    return Err(body.format_error("odd length for UTF-16 text"));
                }
                let units = bytes
                    .chunks_exact(2)
                    .map(|c| u16::from_le_bytes([c[0], c[1]]))
                    .collect();
                self.current(&body)?.units = units;
            }
            TextRecord::Bytes => {
                // Low bytes of UTF-16 code units whose high byte is zero.
                let units = body.rest().iter().map(|&b| u16::from(b)).collect();
                self.current(&body)?.units = units;
            }
            TextRecord::StyleProps => {
                let text_len = self.current(&body)?.units.len();
                let style = parse_style_text_prop(&mut body, text_len)?;
                let padding = body.rest().len();
                if padding > 0 {
                    log::trace!("{} padding bytes after text runs", padding);
                }
                self.current(&body)?.style = Some(style);
            }
            TextRecord::InteractiveInfo => {
                let mut atom = body.record(&INTERACTIVE_INFO_ATOM)?;
                let _sound_id = atom.read_u32()?;
                let hyperlink_id = atom.read_u32()?;
                let action = atom.read_u8()?;
                atom.rest();
                // A macro name may follow the atom.
                body.rest();
                self.pending = Some(PendingAction {
                    instance: header.instance,
                    hyperlink_id: (action == ACTION_HYPERLINK).then_some(hyperlink_id),
                });
            }
            TextRecord::InteractiveRange => {
                let start = body.read_u32()?;
                let end = body.read_u32()?;
                let pending = self.pending.take().ok_or_else(|| {
                    body.format_error("text range without a preceding InteractiveInfo")
                })?;
                if pending.instance != header.instance {
                    return Err(body.format_error("text range does not match its InteractiveInfo"));
                }
                body.finish()?;
                // Only mouse-click hyperlinks are bound to runs.
                if let (0, Some(hyperlink_id)) = (pending.instance, pending.hyperlink_id) {
                    let range = LinkRange {
                        start,
                        end,
                        hyperlink_id,
                    };
                    match self.blocks.last_mut() {
                        Some(block) if self.outline_ref.is_none() => block.links.push(range),
                        _ => self.links.push(range),
                    }
                }
            }
            TextRecord::OutlineRef => {
                self.outline_ref = Some(body.read_i32()?);
                body.finish()?;
            }
            TextRecord::MasterProps
            | TextRecord::Ruler
            | TextRecord::Bookmark
            | TextRecord::SpecialInfo
            | TextRecord::MetaCharacter => {
                log::trace!("Skipping text record 0x{:04X}", header.rec_type);
            }
        }
        Ok(())
    }

    fn current(&mut self, at: &Cursor<'_>) -> Result<&mut TextBlock> {
        match self.blocks.last_mut() {
            Some(block) => Ok(block),
            None => Err(at.format_error("text record before any TextHeaderAtom")),
        }
    }

    /// All inline blocks, in order.
    pub fn into_blocks(self) -> Vec<TextBlock> {
        self.blocks
    }

    /// Resolve a client text box's contents to at most one block.
    ///
    /// `outline` holds the slide's outline text blocks, referenced by an
    /// OutlineTextRefAtom index.
    pub fn into_single(self, at: &Cursor<'_>, outline: &[TextBlock]) -> Result<Option<TextBlock>> {
        if let Some(index) = self.outline_ref {
            if !self.blocks.is_empty() {
                return Err(at.format_error("text box has both inline and outline text"));
            }
            let mut block = usize::try_from(index)
                .ok()
                .and_then(|i| outline.get(i))
                .cloned()
                .ok_or_else(|| {
                    at.format_error(format!(
                        "outline text reference {} out of range ({} blocks)",
                        index,
                        outline.len()
                    ))
                })?;
            block.links.extend(self.links);
            return Ok(Some(block));
        }

        let mut blocks = self.blocks.into_iter();
        let block = blocks.next();
        if blocks.next().is_some() {
            return Err(at.format_error("text box holds more than one text block"));
        }
        Ok(block)
    }
}

/// Decode every child of a client text box container.
pub fn decode_client_textbox(
    mut cursor: Cursor<'_>,
    outline: &[TextBlock],
) -> Result<Option<TextBlock>> {
    let mut collector = TextCollector::new();
    while !cursor.is_empty() {
        let header = cursor.read_header()?;
        let body = cursor.body(&header, "textRecord")?;
        collector.push(&header, body)?;
    }
    collector.into_single(&cursor, outline)
}
