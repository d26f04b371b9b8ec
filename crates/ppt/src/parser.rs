//! PPT file parser implementation.
//!
//! Opens the OLE/CFB container, pulls out the PowerPoint streams and runs the
//! record decoder over them. Everything past stream extraction works on
//! in-memory buffers via [`PptParser::decode_streams`].
//!
//! ## Decode order
//!
//! 1. Pictures stream → picture table (absent stream means no pictures)
//! 2. Current User → UserEditAtom → persist directory
//! 3. Document record → slide size, hyperlinks, fonts, slide list
//! 4. Each slide, in slide-list order

use crate::context::{DecodeContext, DecodeOptions};
use crate::cursor::Cursor;
use crate::document::{self, SlideEntry};
use crate::persist::PersistDirectory;
use crate::pictures;
use crate::slide;
use cfb::CompoundFile;
use deckread_core::{Error, Presentation, Result};
use std::io::{Read, Seek};

const DOCUMENT_STREAM: &str = "/PowerPoint Document";
const CURRENT_USER_STREAM: &str = "/Current User";
const PICTURES_STREAM: &str = "/Pictures";

/// The raw streams the decoder consumes.
#[derive(Debug, Clone, Default)]
pub struct PptStreams {
    pub document: Vec<u8>,
    pub current_user: Vec<u8>,
    pub pictures: Option<Vec<u8>>,
}

/// Parser for legacy PPT (OLE/CFB) files.
#[derive(Debug, Clone, Default)]
pub struct PptParser {
    options: DecodeOptions,
}

impl PptParser {
    /// Create a new PPT parser with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with explicit decode options.
    pub fn with_options(options: DecodeOptions) -> Self {
        Self { options }
    }

    /// Parse a PPT file from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R) -> Result<Presentation> {
        let mut cfb = CompoundFile::open(reader)
            .map_err(|e| Error::CfbError(format!("Failed to open CFB container: {}", e)))?;

        let streams = PptStreams {
            document: read_stream(&mut cfb, DOCUMENT_STREAM)?
                .ok_or_else(|| Error::MissingStream("PowerPoint Document".to_string()))?,
            current_user: read_stream(&mut cfb, CURRENT_USER_STREAM)?
                .ok_or_else(|| Error::MissingStream("Current User".to_string()))?,
            pictures: read_stream(&mut cfb, PICTURES_STREAM)?,
        };

        log::debug!(
            "Read streams: document={} bytes, current user={} bytes, pictures={:?} bytes",
            streams.document.len(),
            streams.current_user.len(),
            streams.pictures.as_ref().map(Vec::len)
        );

        self.decode_streams(&streams)
    }

    /// Decode already-extracted streams.
    pub fn decode_streams(&self, streams: &PptStreams) -> Result<Presentation> {
        let mut ctx = DecodeContext::new(&self.options);

        if let Some(data) = &streams.pictures {
            ctx.pictures = pictures::decode_pictures(data)?;
        }

        let (edit, directory) = PersistDirectory::resolve(&streams.current_user, &streams.document)?;
        let document_offset = directory.require(edit.doc_persist_id_ref, "Document")?;
        let doc = document::decode_document(&streams.document, document_offset, &mut ctx)?;

        let entries = match doc.slides {
            Some(entries) => entries,
            None => discover_slides(&streams.document, &directory),
        };

        let mut presentation = Presentation::new();
        presentation.slide_size = doc.slide_size;
        for entry in &entries {
            let offset = directory.require(entry.persist_id, "Slide")?;
            log::debug!(
                "Decoding slide {} (persist ID {}) at offset {}",
                entry.slide_id,
                entry.persist_id,
                offset
            );
            let slide = slide::decode_slide(&streams.document, offset, &entry.outline, &ctx)?;
            presentation.add_slide(slide);
        }

        if presentation.slides.is_empty() {
            log::warn!("Presentation contains no slides");
        }

        presentation.fonts = ctx.fonts;
        presentation.hyperlinks = ctx.hyperlinks;
        presentation.pictures = ctx.pictures;
        Ok(presentation)
    }
}

/// Without a slide list, every persist entry that points at a Slide
/// container is a slide, in ascending persist-ID order.
fn discover_slides(document: &[u8], directory: &PersistDirectory) -> Vec<SlideEntry> {
    let entries: Vec<SlideEntry> = directory
        .iter()
        .filter(|&(_, offset)| {
            Cursor::at(document, offset as usize, "Slide")
                .is_ok_and(|cursor| cursor.peek_matches(&slide::SLIDE))
        })
        .map(|(persist_id, _)| SlideEntry {
            persist_id,
            slide_id: 0,
            outline: Vec::new(),
        })
        .collect();
    log::debug!("No slide list; found {} slides by scanning", entries.len());
    entries
}

/// Read a whole stream, or `None` when the container has no such stream.
fn read_stream<R: Read + Seek>(cfb: &mut CompoundFile<R>, path: &str) -> Result<Option<Vec<u8>>> {
    let exists = cfb
        .walk()
        .any(|entry| entry.is_stream() && entry.path().to_string_lossy() == path);
    if !exists {
        return Ok(None);
    }

    let mut stream = cfb
        .open_stream(path)
        .map_err(|e| Error::CfbError(format!("Failed to open {} stream: {}", path, e)))?;

    let mut data = Vec::new();
    stream.read_to_end(&mut data)?;
    Ok(Some(data))
}
