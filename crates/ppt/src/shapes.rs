//! Shape tree decoding (OfficeArtSpgrContainer / OfficeArtSpContainer).
//!
//! A group container holds a flat sequence of shape containers and nested
//! group containers. Each shape container is a fixed order of optional
//! sub-records; presence is decided by peeking the next header, so a missing
//! sub-record never moves the cursor.

use crate::context::DecodeContext;
use crate::cursor::Cursor;
use crate::properties::ShapeProperties;
use crate::record::{office_art_types as oa, RecordSignature};
use crate::text::{self, TextBlock};
use deckread_core::{Bounds, Result};

const GROUP_SHAPE: RecordSignature = RecordSignature::container("groupShape", oa::SPGR_CONTAINER);
const SHAPE: RecordSignature = RecordSignature::container("shape", oa::SP_CONTAINER);

const SHAPE_GROUP: RecordSignature =
    RecordSignature::new("shapeGroup", 1, oa::FSPGR).with_length(16);
const SHAPE_PROP: RecordSignature = RecordSignature::new("shapeProp", 2, oa::FSP).with_length(8);
const DELETED_SHAPE: RecordSignature =
    RecordSignature::new("deletedShape", 0, oa::FPSPL).with_length(4);
const PRIMARY_OPTIONS: RecordSignature =
    RecordSignature::new("shapePrimaryOptions", 3, oa::FOPT);
const SECONDARY_OPTIONS: RecordSignature =
    RecordSignature::new("shapeSecondaryOptions", 3, oa::SECONDARY_FOPT);
const TERTIARY_OPTIONS: RecordSignature =
    RecordSignature::new("shapeTertiaryOptions", 3, oa::TERTIARY_FOPT);
const CHILD_ANCHOR: RecordSignature =
    RecordSignature::new("childAnchor", 0, oa::CHILD_ANCHOR).with_length(16);
const CLIENT_ANCHOR: RecordSignature = RecordSignature::new("clientAnchor", 0, oa::CLIENT_ANCHOR);
const CLIENT_DATA: RecordSignature = RecordSignature::container("clientData", oa::CLIENT_DATA);
const CLIENT_TEXTBOX: RecordSignature =
    RecordSignature::container("clientTextbox", oa::CLIENT_TEXTBOX);

/// Deepest group nesting accepted; the top-level group is depth 1.
pub const MAX_GROUP_DEPTH: usize = 64;

/// OfficeArtFSP flag word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShapeFlags(u32);

impl ShapeFlags {
    pub const GROUP: u32 = 0x0001;
    pub const CHILD: u32 = 0x0002;
    pub const PATRIARCH: u32 = 0x0004;
    pub const DELETED: u32 = 0x0008;
    pub const CONNECTOR: u32 = 0x0100;
    pub const BACKGROUND: u32 = 0x0400;

    pub fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn is_group(&self) -> bool {
        self.0 & Self::GROUP != 0
    }

    pub fn is_child(&self) -> bool {
        self.0 & Self::CHILD != 0
    }

    pub fn is_patriarch(&self) -> bool {
        self.0 & Self::PATRIARCH != 0
    }

    pub fn is_deleted(&self) -> bool {
        self.0 & Self::DELETED != 0
    }

    pub fn is_connector(&self) -> bool {
        self.0 & Self::CONNECTOR != 0
    }

    pub fn is_background(&self) -> bool {
        self.0 & Self::BACKGROUND != 0
    }
}

/// One decoded shape container, before it is mapped onto the output model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeRecord {
    /// Structural path of the shape container, used to locate build errors.
    pub path: String,
    /// MSOSPT shape type from the FSP instance.
    pub shape_type: u16,
    pub spid: u32,
    pub flags: ShapeFlags,
    pub properties: ShapeProperties,
    pub anchor: Option<Bounds>,
    pub text: Option<TextBlock>,
}

impl ShapeRecord {
    /// Group markers, deleted and background shapes produce no output.
    pub fn is_emitted(&self) -> bool {
        !(self.flags.is_group()
            || self.flags.is_patriarch()
            || self.flags.is_deleted()
            || self.flags.is_background())
    }
}

/// Decode a group container's children into `out`, depth first.
pub(crate) fn decode_group(
    cursor: Cursor<'_>,
    ctx: &DecodeContext<'_>,
    outline: &[TextBlock],
    out: &mut Vec<ShapeRecord>,
) -> Result<()> {
    decode_nested_group(cursor, ctx, outline, out, 1)
}

fn decode_nested_group(
    mut cursor: Cursor<'_>,
    ctx: &DecodeContext<'_>,
    outline: &[TextBlock],
    out: &mut Vec<ShapeRecord>,
    depth: usize,
) -> Result<()> {
    if depth > MAX_GROUP_DEPTH {
        return Err(cursor.format_error(format!("group nesting exceeds {}", MAX_GROUP_DEPTH)));
    }

    while !cursor.is_empty() {
        if let Some(group) = cursor.try_record(&GROUP_SHAPE)? {
            decode_nested_group(group, ctx, outline, out, depth + 1)?;
        } else if let Some(shape) = cursor.try_record(&SHAPE)? {
            ctx.check_cancelled()?;
            out.push(decode_shape(shape, outline)?);
        } else {
            let header = cursor.read_header()?;
            return Err(cursor.not_implemented(format!(
                "group child record 0x{:04X}",
                header.rec_type
            )));
        }
    }
    Ok(())
}

/// Decode one shape container.
pub(crate) fn decode_shape(mut cursor: Cursor<'_>, outline: &[TextBlock]) -> Result<ShapeRecord> {
    let mut shape = ShapeRecord {
        path: cursor.path(),
        ..Default::default()
    };

    if let Some(mut group) = cursor.try_record(&SHAPE_GROUP)? {
        // Group coordinate space; children are placed by client anchors.
        group.skip(16)?;
    }

    if let Some((header, mut fsp)) = cursor.try_record_with_header(&SHAPE_PROP)? {
        shape.shape_type = header.instance;
        shape.spid = fsp.read_u32()?;
        shape.flags = ShapeFlags::new(fsp.read_u32()?);
    }

    if cursor.try_record(&DELETED_SHAPE)?.is_some() {
        log::trace!("Shape {} carries a deleted-shape reference", shape.spid);
    }

    if let Some((header, body)) = cursor.try_record_with_header(&PRIMARY_OPTIONS)? {
        shape.properties = ShapeProperties::parse(body, header.instance)?;
    }

    skip_extra_options(&mut cursor)?;

    if let Some(mut anchor) = cursor.try_record(&CHILD_ANCHOR)? {
        anchor.skip(16)?;
    }

    if let Some(anchor) = cursor.try_record(&CLIENT_ANCHOR)? {
        shape.anchor = Some(client_anchor(anchor)?);
    }

    if cursor.try_record(&CLIENT_DATA)?.is_some() {
        log::trace!("Skipping client data of shape {}", shape.spid);
    }

    if let Some(textbox) = cursor.try_record(&CLIENT_TEXTBOX)? {
        shape.text = text::decode_client_textbox(textbox, outline)?;
    }

    skip_extra_options(&mut cursor)?;

    if let Some(header) = cursor.peek_header() {
        return Err(cursor.not_implemented(format!(
            "shape sub-record 0x{:04X}",
            header.rec_type
        )));
    }
    cursor.finish()?;

    Ok(shape)
}

/// Secondary and tertiary property tables are not interpreted.
fn skip_extra_options(cursor: &mut Cursor<'_>) -> Result<()> {
    if cursor.try_record(&SECONDARY_OPTIONS)?.is_some() {
        log::trace!("Skipping secondary shape options");
    }
    if cursor.try_record(&TERTIARY_OPTIONS)?.is_some() {
        log::trace!("Skipping tertiary shape options");
    }
    Ok(())
}

/// Decode a client anchor: 4 x i16 or 4 x i32, top/left/right/bottom.
fn client_anchor(mut anchor: Cursor<'_>) -> Result<Bounds> {
    let (top, left, right, bottom) = match anchor.remaining() {
        8 => (
            i32::from(anchor.read_i16()?),
            i32::from(anchor.read_i16()?),
            i32::from(anchor.read_i16()?),
            i32::from(anchor.read_i16()?),
        ),
        16 => (
            anchor.read_i32()?,
            anchor.read_i32()?,
            anchor.read_i32()?,
            anchor.read_i32()?,
        ),
        other => {
            return Err(anchor.format_error(format!("unexpected anchor length {}", other)));
        }
    };

    let width = right.checked_sub(left).ok_or_else(|| {
        anchor.format_error(format!("anchor width {} - {} overflows", right, left))
    })?;
    let height = bottom.checked_sub(top).ok_or_else(|| {
        anchor.format_error(format!("anchor height {} - {} overflows", bottom, top))
    })?;
    anchor.finish()?;

    Ok(Bounds {
        offset_x: left,
        offset_y: top,
        width,
        height,
    })
}
