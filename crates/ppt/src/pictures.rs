//! Pictures stream decoding.
//!
//! The stream is a plain sequence of OfficeArt blip records. Each JPEG or PNG
//! blip carries one or two 16-byte UIDs (selected by its instance), a tag
//! byte, and then the image bytes, which are passed through untouched.

use crate::cursor::Cursor;
use crate::record::{office_art_types as oa, RecordHeader};
use deckread_core::{PictureData, PictureFormat, PictureTable, Result};

const UID_LEN: usize = 16;

/// OfficeArt blip record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlipKind {
    Emf,
    Wmf,
    Pict,
    Jpeg,
    Png,
    Dib,
    Tiff,
    JpegCmyk,
    /// A BLIP store entry rather than a blip.
    StoreEntry,
}

impl BlipKind {
    pub fn from_type(rec_type: u16) -> Option<Self> {
        Some(match rec_type {
            oa::BLIP_EMF => Self::Emf,
            oa::BLIP_WMF => Self::Wmf,
            oa::BLIP_PICT => Self::Pict,
            oa::BLIP_JPEG => Self::Jpeg,
            oa::BLIP_PNG => Self::Png,
            oa::BLIP_DIB => Self::Dib,
            oa::BLIP_TIFF => Self::Tiff,
            oa::BLIP_JPEG_CMYK => Self::JpegCmyk,
            oa::FBSE => Self::StoreEntry,
            _ => return None,
        })
    }

    /// Number of UIDs for a supported `kind`/`instance` pair.
    fn uid_count(self, instance: u16) -> Option<usize> {
        match (self, instance) {
            (Self::Jpeg, 0x46A | 0x6E2) | (Self::Png, 0x6E0) => Some(1),
            (Self::Jpeg, 0x46B | 0x6E3) | (Self::Png, 0x6E1) => Some(2),
            _ => None,
        }
    }
}

/// Decode every blip in the Pictures stream, in stream order.
pub fn decode_pictures(stream: &[u8]) -> Result<PictureTable> {
    let mut cursor = Cursor::new(stream, "Pictures");
    let mut table = PictureTable::new();

    while !cursor.is_empty() {
        let header = cursor.read_header()?;
        let body = cursor.body(&header, "blip")?;
        table.push(decode_blip(&header, body)?);
    }

    log::debug!("Decoded {} pictures", table.len());
    Ok(table)
}

fn decode_blip(header: &RecordHeader, mut body: Cursor<'_>) -> Result<PictureData> {
    let kind = BlipKind::from_type(header.rec_type).ok_or_else(|| {
        body.format_error(format!("unknown blip record type 0x{:04X}", header.rec_type))
    })?;

    let format = match kind {
        BlipKind::Jpeg => PictureFormat::Jpeg,
        BlipKind::Png => PictureFormat::Png,
        other => return Err(body.not_implemented(format!("{:?} blip", other))),
    };

    let uids = kind.uid_count(header.instance).ok_or_else(|| {
        body.format_error(format!(
            "unexpected {:?} blip instance 0x{:03X}",
            kind, header.instance
        ))
    })?;

    body.skip(uids * UID_LEN)?;
    let _tag = body.read_u8()?;
    let data = body.rest().to_vec();

    Ok(PictureData { format, data })
}
