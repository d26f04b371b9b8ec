//! Slide container decoding.
//!
//! A Slide record's children come in a fixed order; each step checks the
//! next header against the record it expects and reports the step by name
//! when it does not match.

use crate::builder;
use crate::context::DecodeContext;
use crate::cursor::Cursor;
use crate::record::{office_art_types as oa, record_types as rt, RecordSignature};
use crate::shapes;
use crate::text::TextBlock;
use deckread_core::{PlaceholderType, Result, Rgb, Slide, SlideFlags, SlideLayout};

pub(crate) const SLIDE: RecordSignature =
    RecordSignature::container("Slide", rt::RT_SLIDE).with_instance(0);
const SLIDE_ATOM: RecordSignature = RecordSignature::new("slideAtom", 2, rt::RT_SLIDE_ATOM)
    .with_instance(0)
    .with_length(0x18);
const SLIDE_SHOW_INFO: RecordSignature =
    RecordSignature::new("slideShowSlideInfoAtom", 0, rt::RT_SLIDE_SHOW_SLIDE_INFO_ATOM)
        .with_length(0x10);
const HEADERS_FOOTERS: RecordSignature =
    RecordSignature::container("perSlideHFContainer", rt::RT_HEADERS_FOOTERS);
const DRAWING: RecordSignature =
    RecordSignature::container("drawing", rt::RT_DRAWING).with_instance(0);
const DG_CONTAINER: RecordSignature = RecordSignature::container("OfficeArtDg", oa::DG_CONTAINER);
const FDG: RecordSignature = RecordSignature::new("drawingData", 0, oa::FDG).with_length(8);
const FRIT_CONTAINER: RecordSignature =
    RecordSignature::container("regroupItems", oa::FRIT_CONTAINER);
const GROUP_SHAPE: RecordSignature =
    RecordSignature::container("groupShape", oa::SPGR_CONTAINER);
const COLOR_SCHEME: RecordSignature =
    RecordSignature::new("slideSchemeColorSchemeAtom", 0, rt::RT_COLOR_SCHEME_ATOM)
        .with_instance(1)
        .with_length(0x20);
const SLIDE_NAME: RecordSignature =
    RecordSignature::new("slideNameAtom", 0, rt::RT_CSTRING).with_instance(3);
const PROG_TAGS: RecordSignature =
    RecordSignature::container("slideProgTagsContainer", rt::RT_PROG_TAGS);

const SLIDE_FLAG_MASTER_OBJECTS: u16 = 0x0001;
const SLIDE_FLAG_MASTER_SCHEME: u16 = 0x0002;
const SLIDE_FLAG_MASTER_BACKGROUND: u16 = 0x0004;

/// Round-trip atoms written by later versions, kept for fidelity only.
fn is_round_trip_record(rec_type: u16) -> bool {
    matches!(
        rec_type,
        rt::RT_ROUND_TRIP_THEME12_ATOM
            | rt::RT_ROUND_TRIP_COLOR_MAPPING12_ATOM
            | rt::RT_ROUND_TRIP_COMPOSITE_MASTER_ID12_ATOM
            | rt::RT_ROUND_TRIP_CONTENT_MASTER_ID12_ATOM
            | rt::RT_ROUND_TRIP_ANIMATION_ATOM12
            | rt::RT_ROUND_TRIP_ANIMATION_HASH_ATOM12
            | rt::RT_ROUND_TRIP_SLIDE_SYNC_INFO12
    )
}

/// Decode the Slide record at `offset` of the Document stream.
///
/// `outline` holds the slide's outline text blocks from the slide list.
pub(crate) fn decode_slide(
    document: &[u8],
    offset: u32,
    outline: &[TextBlock],
    ctx: &DecodeContext<'_>,
) -> Result<Slide> {
    ctx.check_cancelled()?;
    let (_, mut cursor) = Cursor::record_at(document, offset as usize, &SLIDE)?;

    let mut slide = decode_slide_atom(cursor.record(&SLIDE_ATOM)?)?;

    if cursor.try_record(&SLIDE_SHOW_INFO)?.is_some() {
        log::trace!("Skipping slide show info");
    }
    if cursor.try_record(&HEADERS_FOOTERS)?.is_some() {
        log::trace!("Skipping per-slide headers and footers");
    }

    let drawing = cursor.record(&DRAWING)?;
    for record in decode_drawing(drawing, outline, ctx)? {
        if let Some(shape) = builder::build_shape(&record, ctx)? {
            slide.add_shape(shape);
        }
    }

    let mut scheme = cursor.record(&COLOR_SCHEME)?;
    for entry in slide.color_scheme.iter_mut() {
        let [red, green, blue, _] = scheme.read_array::<4>()?;
        *entry = Rgb::new(red, green, blue);
    }

    while !cursor.is_empty() {
        if cursor.try_record(&SLIDE_NAME)?.is_some() || cursor.try_record(&PROG_TAGS)?.is_some() {
            continue;
        }
        let Some(header) = cursor.peek_header() else {
            break;
        };
        if !is_round_trip_record(header.rec_type) {
            return Err(cursor.not_implemented(format!(
                "slide record 0x{:04X}",
                header.rec_type
            )));
        }
        cursor.skip_record("roundTrip")?;
        log::trace!("Skipping round-trip record 0x{:04X}", header.rec_type);
    }
    cursor.finish()?;

    log::debug!(
        "Slide at {}: {:?}, {} shapes",
        offset,
        slide.layout,
        slide.shapes.len()
    );
    Ok(slide)
}

fn decode_slide_atom(mut atom: Cursor<'_>) -> Result<Slide> {
    let geom = atom.read_u32()?;
    let layout = SlideLayout::from_u32(geom)
        .ok_or_else(|| atom.format_error(format!("unknown slide layout {}", geom)))?;
    let mut slide = Slide::new(layout);

    let codes = atom.read_array::<8>()?;
    for (slot, code) in slide.placeholders.iter_mut().zip(codes) {
        *slot = PlaceholderType::from_u8(code)
            .ok_or_else(|| atom.format_error(format!("unknown placeholder type 0x{:02X}", code)))?;
    }

    let _master_id_ref = atom.read_u32()?;
    let _notes_id_ref = atom.read_u32()?;
    let flags = atom.read_u16()?;
    atom.skip(2)?;

    slide.flags = SlideFlags {
        follow_master_objects: flags & SLIDE_FLAG_MASTER_OBJECTS != 0,
        follow_master_scheme: flags & SLIDE_FLAG_MASTER_SCHEME != 0,
        follow_master_background: flags & SLIDE_FLAG_MASTER_BACKGROUND != 0,
    };
    Ok(slide)
}

/// Walk Drawing > OfficeArtDg down to the top-level group and decode it.
fn decode_drawing(
    mut drawing: Cursor<'_>,
    outline: &[TextBlock],
    ctx: &DecodeContext<'_>,
) -> Result<Vec<shapes::ShapeRecord>> {
    let mut dg = drawing.record(&DG_CONTAINER)?;
    drawing.finish()?;

    let mut fdg = dg.record(&FDG)?;
    let shape_count = fdg.read_u32()?;
    let last_spid = fdg.read_u32()?;
    log::trace!("Drawing declares {} shapes, last spid {}", shape_count, last_spid);

    if dg.try_record(&FRIT_CONTAINER)?.is_some() {
        log::trace!("Skipping regroup items");
    }

    let mut records = Vec::new();
    let group = dg.record(&GROUP_SHAPE)?;
    shapes::decode_group(group, ctx, outline, &mut records)?;

    // Background shape and connector rules.
    while !dg.is_empty() {
        let header = dg.read_header()?;
        match header.rec_type {
            oa::SP_CONTAINER | oa::SOLVER_CONTAINER => {
                dg.body(&header, "drawingTrailer")?;
                log::trace!("Skipping drawing child 0x{:04X}", header.rec_type);
            }
            other => {
                return Err(dg.not_implemented(format!("drawing child 0x{:04X}", other)));
            }
        }
    }

    Ok(records)
}
