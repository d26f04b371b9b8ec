//! Document container decoding.
//!
//! The Document record holds the document-wide tables: slide size, external
//! hyperlinks, the font collection, and the slide list that orders slides
//! and carries their outline text.

use crate::context::DecodeContext;
use crate::cursor::Cursor;
use crate::record::{record_types as rt, RecordSignature};
use crate::text::{TextBlock, TextCollector};
use deckread_core::{Hyperlink, Result, SlideSize};

const DOCUMENT: RecordSignature =
    RecordSignature::container("Document", rt::RT_DOCUMENT).with_instance(0);
const DOCUMENT_ATOM: RecordSignature =
    RecordSignature::new("documentAtom", 1, rt::RT_DOCUMENT_ATOM)
        .with_instance(0)
        .with_length(0x28);

const EX_OBJ_LIST: RecordSignature =
    RecordSignature::container("exObjList", rt::RT_EXTERNAL_OBJECT_LIST).with_instance(0);
const EX_OBJ_LIST_ATOM: RecordSignature =
    RecordSignature::new("exObjListAtom", 0, rt::RT_EXTERNAL_OBJECT_LIST_ATOM)
        .with_instance(0)
        .with_length(4);
const EX_HYPERLINK: RecordSignature =
    RecordSignature::container("exHyperlink", rt::RT_EXTERNAL_HYPERLINK).with_instance(0);
const EX_HYPERLINK_ATOM: RecordSignature =
    RecordSignature::new("exHyperlinkAtom", 0, rt::RT_EXTERNAL_HYPERLINK_ATOM)
        .with_instance(0)
        .with_length(4);
const FRIENDLY_NAME: RecordSignature =
    RecordSignature::new("friendlyNameAtom", 0, rt::RT_CSTRING).with_instance(0);
const TARGET: RecordSignature = RecordSignature::new("targetAtom", 0, rt::RT_CSTRING).with_instance(1);
const LOCATION: RecordSignature =
    RecordSignature::new("locationAtom", 0, rt::RT_CSTRING).with_instance(3);

const ENVIRONMENT: RecordSignature =
    RecordSignature::container("documentTextInfo", rt::RT_ENVIRONMENT).with_instance(0);
const FONT_COLLECTION: RecordSignature =
    RecordSignature::container("fontCollection", rt::RT_FONT_COLLECTION).with_instance(0);
const FONT_ENTITY_ATOM: RecordSignature =
    RecordSignature::new("fontEntityAtom", 0, rt::RT_FONT_ENTITY_ATOM).with_length(0x44);
const FONT_EMBED_DATA: RecordSignature =
    RecordSignature::new("fontEmbedDataBlob", 0, rt::RT_FONT_EMBED_DATA_BLOB);

const SLIDE_LIST: RecordSignature =
    RecordSignature::container("slideList", rt::RT_SLIDE_LIST_WITH_TEXT).with_instance(0);
const SLIDE_PERSIST_ATOM: RecordSignature =
    RecordSignature::new("slidePersistAtom", 0, rt::RT_SLIDE_PERSIST_ATOM)
        .with_instance(0)
        .with_length(0x14);

/// Font names are 32 UTF-16 code units, NUL-padded.
const FONT_NAME_BYTES: usize = 64;
const MAX_EMBEDDED_FONTS: usize = 4;

/// One slide list entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideEntry {
    pub persist_id: u32,
    pub slide_id: u32,
    /// Outline text blocks, referenced by OutlineTextRefAtom index.
    pub outline: Vec<TextBlock>,
}

/// The parts of the Document record the slides depend on.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    pub slide_size: SlideSize,
    /// `None` when the document has no slide list.
    pub slides: Option<Vec<SlideEntry>>,
}

/// Decode the Document record at `offset`, filling the context's font and
/// hyperlink tables.
pub(crate) fn decode_document(
    document: &[u8],
    offset: u32,
    ctx: &mut DecodeContext<'_>,
) -> Result<DocumentRecord> {
    let (_, mut cursor) = Cursor::record_at(document, offset as usize, &DOCUMENT)?;

    let mut atom = cursor.record(&DOCUMENT_ATOM)?;
    let slide_size = SlideSize {
        width: atom.read_i32()?,
        height: atom.read_i32()?,
    };
    // Notes size, zoom ratios, persist references and flags are not needed.
    atom.rest();

    if let Some(list) = cursor.try_record(&EX_OBJ_LIST)? {
        decode_external_objects(list, ctx)?;
    }

    if let Some(environment) = cursor.try_record(&ENVIRONMENT)? {
        decode_environment(environment, ctx)?;
    }

    let mut slides = None;
    while !cursor.is_empty() {
        if let Some(list) = cursor.try_record(&SLIDE_LIST)? {
            slides = Some(decode_slide_list(list)?);
            continue;
        }
        let header = cursor.skip_record("documentChild")?;
        log::trace!("Skipping document child 0x{:04X}", header.rec_type);
    }

    log::debug!(
        "Document: {}x{}, {} fonts, {} hyperlinks, {} listed slides",
        slide_size.width,
        slide_size.height,
        ctx.fonts.len(),
        ctx.hyperlinks.len(),
        slides.as_ref().map_or(0, Vec::len)
    );

    Ok(DocumentRecord { slide_size, slides })
}

fn decode_external_objects(mut list: Cursor<'_>, ctx: &mut DecodeContext<'_>) -> Result<()> {
    let mut atom = list.record(&EX_OBJ_LIST_ATOM)?;
    let _id_seed = atom.read_u32()?;

    while !list.is_empty() {
        let Some(link) = list.try_record(&EX_HYPERLINK)? else {
            let header = list.read_header()?;
            return Err(list.not_implemented(format!(
                "external object 0x{:04X}",
                header.rec_type
            )));
        };
        let (id, hyperlink) = decode_hyperlink(link, ctx)?;
        ctx.hyperlinks.insert(id, hyperlink);
    }
    Ok(())
}

fn decode_hyperlink(mut link: Cursor<'_>, ctx: &DecodeContext<'_>) -> Result<(u32, Hyperlink)> {
    let id = link.record(&EX_HYPERLINK_ATOM)?.read_u32()?;

    let mut string = |sig: &RecordSignature| -> Result<Option<String>> {
        Ok(link
            .try_record(sig)?
            .map(|mut body| ctx.decode_utf16_bytes(body.rest())))
    };
    let hyperlink = Hyperlink {
        friendly_name: string(&FRIENDLY_NAME)?.unwrap_or_default(),
        target: string(&TARGET)?.unwrap_or_default(),
        location: string(&LOCATION)?,
    };
    link.finish()?;

    Ok((id, hyperlink))
}

fn decode_environment(mut environment: Cursor<'_>, ctx: &mut DecodeContext<'_>) -> Result<()> {
    while !environment.is_empty() {
        if let Some(fonts) = environment.try_record(&FONT_COLLECTION)? {
            decode_fonts(fonts, ctx)?;
            continue;
        }
        let header = environment.skip_record("environmentChild")?;
        log::trace!("Skipping environment child 0x{:04X}", header.rec_type);
    }
    Ok(())
}

fn decode_fonts(mut fonts: Cursor<'_>, ctx: &mut DecodeContext<'_>) -> Result<()> {
    while !fonts.is_empty() {
        let mut entity = fonts.record(&FONT_ENTITY_ATOM)?;
        let name = ctx.decode_utf16_bytes(entity.read_bytes(FONT_NAME_BYTES)?);
        // Charset, clip/quality flags, pitch and family.
        entity.skip(4)?;
        entity.finish()?;

        let mut embedded = 0;
        while embedded < MAX_EMBEDDED_FONTS && fonts.try_record(&FONT_EMBED_DATA)?.is_some() {
            embedded += 1;
        }
        if embedded > 0 {
            log::trace!("Font '{}' has {} embedded variants", name, embedded);
        }

        ctx.fonts.push(name);
    }
    Ok(())
}

fn decode_slide_list(mut list: Cursor<'_>) -> Result<Vec<SlideEntry>> {
    let mut entries = Vec::new();
    let mut current: Option<(u32, u32, TextCollector)> = None;

    while !list.is_empty() {
        if let Some(mut atom) = list.try_record(&SLIDE_PERSIST_ATOM)? {
            let persist_id = atom.read_u32()?;
            let _flags = atom.read_u32()?;
            let _number_texts = atom.read_i32()?;
            let slide_id = atom.read_u32()?;
            atom.skip(4)?;

            if let Some((persist_id, slide_id, text)) = current.take() {
                entries.push(SlideEntry {
                    persist_id,
                    slide_id,
                    outline: text.into_blocks(),
                });
            }
            current = Some((persist_id, slide_id, TextCollector::new()));
            continue;
        }

        let header = list.read_header()?;
        if !TextCollector::accepts(header.rec_type) {
            return Err(list.not_implemented(format!(
                "slide list record 0x{:04X}",
                header.rec_type
            )));
        }
        let body = list.body(&header, "textRecord")?;
        let Some((_, _, text)) = current.as_mut() else {
            return Err(body.format_error("text before the first SlidePersistAtom"));
        };
        text.push(&header, body)?;
    }

    if let Some((persist_id, slide_id, text)) = current {
        entries.push(SlideEntry {
            persist_id,
            slide_id,
            outline: text.into_blocks(),
        });
    }
    Ok(entries)
}
