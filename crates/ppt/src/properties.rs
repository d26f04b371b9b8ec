//! Shape property tables (OfficeArtFOPT).
//!
//! A table is `count` 6-byte entries followed by the payloads of its complex
//! entries, in entry order. Only the handful of properties the shape model
//! needs are mapped; every other ID must be one MS-ODRAW defines or the
//! table is rejected.

use crate::cursor::Cursor;
use deckread_core::{Color, Result, Rgb};
use std::ops::RangeInclusive;

const PROPERTY_ID_MASK: u16 = 0x3FFF;
/// The last ID of every set holds that set's packed boolean properties.
const BOOLEAN_PROPERTIES: u16 = 0x003F;
const IS_BLIP: u16 = 0x4000;
const IS_COMPLEX: u16 = 0x8000;

/// OfficeArtCOLORREF flag: the red byte is a color-scheme index.
const COLOR_REF_SCHEME_INDEX: u8 = 0x08;

/// Line style boolean bits (property 0x1FF).
const LINE_F_LINE: u32 = 1 << 3;
const LINE_F_USE_F_LINE: u32 = 1 << 19;

/// Properties mapped onto the shape model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeProperty {
    TextLeft,
    TextTop,
    TextRight,
    TextBottom,
    BlipToDisplay,
    FillColor,
    LineColor,
    LineWidth,
    LineStyleBooleans,
    ShadowColor,
    ShadowOffsetX,
    ShadowOffsetY,
}

impl ShapeProperty {
    pub fn from_id(id: u16) -> Option<Self> {
        Some(match id {
            0x0081 => Self::TextLeft,
            0x0082 => Self::TextTop,
            0x0083 => Self::TextRight,
            0x0084 => Self::TextBottom,
            0x0104 => Self::BlipToDisplay,
            0x0181 => Self::FillColor,
            0x01C0 => Self::LineColor,
            0x01CB => Self::LineWidth,
            0x01FF => Self::LineStyleBooleans,
            0x0201 => Self::ShadowColor,
            0x0205 => Self::ShadowOffsetX,
            0x0206 => Self::ShadowOffsetY,
            _ => return None,
        })
    }
}

/// MS-ODRAW property sets, each a block of 64 IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertySet {
    Transform,
    Protection,
    Text,
    GeometryText,
    Blip,
    Geometry,
    Fill,
    Line,
    Shadow,
    Perspective,
    ThreeDObject,
    ThreeDStyle,
    Shape,
    Callout,
    GroupShape,
    Diagram,
    LeftLineStyle,
    TopLineStyle,
    RightLineStyle,
    BottomLineStyle,
    WebComponent,
    Ink,
    Signature,
}

impl PropertySet {
    pub fn of(id: u16) -> Option<Self> {
        Some(match id >> 6 {
            0x00 => Self::Transform,
            0x01 => Self::Protection,
            0x02 => Self::Text,
            0x03 => Self::GeometryText,
            0x04 => Self::Blip,
            0x05 => Self::Geometry,
            0x06 => Self::Fill,
            0x07 => Self::Line,
            0x08 => Self::Shadow,
            0x09 => Self::Perspective,
            0x0A => Self::ThreeDObject,
            0x0B => Self::ThreeDStyle,
            0x0C => Self::Shape,
            0x0D => Self::Callout,
            0x0E => Self::GroupShape,
            0x14 => Self::Diagram,
            0x15 => Self::LeftLineStyle,
            0x16 => Self::TopLineStyle,
            0x17 => Self::RightLineStyle,
            0x18 => Self::BottomLineStyle,
            0x1A => Self::WebComponent,
            0x1C => Self::Ink,
            0x1E => Self::Signature,
            _ => return None,
        })
    }

    /// IDs of the set's non-boolean properties.
    fn defined_ids(self) -> RangeInclusive<u16> {
        match self {
            Self::Transform => 0x0004..=0x0004,
            Self::Protection => 0x0077..=0x007E,
            Self::Text => 0x0080..=0x008B,
            Self::GeometryText => 0x00C0..=0x00C6,
            Self::Blip => 0x0100..=0x0120,
            Self::Geometry => 0x0140..=0x0159,
            Self::Fill => 0x0180..=0x01A7,
            Self::Line => 0x01C0..=0x01E7,
            Self::Shadow => 0x0200..=0x021B,
            Self::Perspective => 0x0240..=0x024B,
            Self::ThreeDObject => 0x0280..=0x0293,
            Self::ThreeDStyle => 0x02C0..=0x02D5,
            Self::Shape => 0x0301..=0x0316,
            Self::Callout => 0x0340..=0x0348,
            Self::GroupShape => 0x0380..=0x03A9,
            Self::Diagram => 0x0500..=0x0508,
            Self::LeftLineStyle => 0x0540..=0x0567,
            Self::TopLineStyle => 0x0580..=0x05A7,
            Self::RightLineStyle => 0x05C0..=0x05E7,
            Self::BottomLineStyle => 0x0600..=0x0627,
            Self::WebComponent => 0x0680..=0x0682,
            Self::Ink => 0x0700..=0x0701,
            Self::Signature => 0x0780..=0x078A,
        }
    }

    /// Whether `id`, already known to be in this set, is a defined property.
    pub fn defines(self, id: u16) -> bool {
        id & BOOLEAN_PROPERTIES == BOOLEAN_PROPERTIES || self.defined_ids().contains(&id)
    }
}

/// Decode an OfficeArtCOLORREF.
pub fn color_ref(value: u32) -> Color {
    let [red, green, blue, flags] = value.to_le_bytes();
    if flags & COLOR_REF_SCHEME_INDEX != 0 {
        Color::Scheme(red)
    } else {
        Color::Rgb(Rgb::new(red, green, blue))
    }
}

/// The mapped values of one shape's primary property table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeProperties {
    pub text_left: Option<i32>,
    pub text_top: Option<i32>,
    pub text_right: Option<i32>,
    pub text_bottom: Option<i32>,
    /// 1-based index into the picture table.
    pub blip_index: Option<u32>,
    pub fill_color: Option<Color>,
    pub line_color: Option<Color>,
    pub line_width: Option<u32>,
    pub line_booleans: Option<u32>,
    pub shadow_color: Option<Color>,
    pub shadow_offset_x: Option<i32>,
    pub shadow_offset_y: Option<i32>,
}

impl ShapeProperties {
    /// Decode a table of `count` entries; `cursor` covers the whole payload.
    pub fn parse(mut cursor: Cursor<'_>, count: u16) -> Result<Self> {
        let mut props = Self::default();
        let mut complex_lengths = Vec::new();

        for _ in 0..count {
            let word = cursor.read_u16()?;
            let value = cursor.read_u32()?;
            let id = word & PROPERTY_ID_MASK;

            if word & IS_COMPLEX != 0 {
                complex_lengths.push(value);
            }

            match ShapeProperty::from_id(id) {
                Some(property) => props.set(property, value),
                None => {
                    let Some(set) = PropertySet::of(id).filter(|set| set.defines(id)) else {
                        return Err(cursor.not_implemented(format!("shape property 0x{:04X}", id)));
                    };
                    log::trace!(
                        "Ignoring {:?} property 0x{:04X}{}",
                        set,
                        id,
                        if word & IS_BLIP != 0 { " (blip)" } else { "" }
                    );
                }
            }
        }

        for len in complex_lengths {
            cursor.skip(len as usize)?;
        }
        cursor.finish()?;

        Ok(props)
    }

    fn set(&mut self, property: ShapeProperty, value: u32) {
        match property {
            ShapeProperty::TextLeft => self.text_left = Some(value as i32),
            ShapeProperty::TextTop => self.text_top = Some(value as i32),
            ShapeProperty::TextRight => self.text_right = Some(value as i32),
            ShapeProperty::TextBottom => self.text_bottom = Some(value as i32),
            ShapeProperty::BlipToDisplay => self.blip_index = Some(value),
            ShapeProperty::FillColor => self.fill_color = Some(color_ref(value)),
            ShapeProperty::LineColor => self.line_color = Some(color_ref(value)),
            ShapeProperty::LineWidth => self.line_width = Some(value),
            ShapeProperty::LineStyleBooleans => self.line_booleans = Some(value),
            ShapeProperty::ShadowColor => self.shadow_color = Some(color_ref(value)),
            ShapeProperty::ShadowOffsetX => self.shadow_offset_x = Some(value as i32),
            ShapeProperty::ShadowOffsetY => self.shadow_offset_y = Some(value as i32),
        }
    }

    /// Whether the line style booleans switch the line on.
    pub fn is_line(&self) -> bool {
        self.line_booleans.is_some_and(|flags| {
            flags & LINE_F_LINE != 0 && flags & LINE_F_USE_F_LINE != 0
        })
    }

    pub fn has_shadow(&self) -> bool {
        self.shadow_offset_x.is_some() || self.shadow_offset_y.is_some()
    }
}
