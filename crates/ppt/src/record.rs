//! Record header decoding and expected-signature matching.
//!
//! Every record in the PowerPoint Document, Current User and Pictures streams
//! starts with the same 8-byte header:
//! - 2 bytes: recVer (low 4 bits) + recInstance (high 12 bits)
//! - 2 bytes: recType
//! - 4 bytes: recLen (payload length, header excluded)

/// Size of a record header in bytes.
pub const HEADER_LEN: usize = 8;

/// Version value marking a container record.
pub const CONTAINER_VERSION: u8 = 0x0F;

/// Record type constants for the PowerPoint binary format.
pub mod record_types {
    pub const RT_DOCUMENT: u16 = 0x03E8;
    pub const RT_DOCUMENT_ATOM: u16 = 0x03E9;
    pub const RT_END_DOCUMENT_ATOM: u16 = 0x03EA;
    pub const RT_SLIDE: u16 = 0x03EE;
    pub const RT_SLIDE_ATOM: u16 = 0x03EF;
    pub const RT_ENVIRONMENT: u16 = 0x03F2;
    pub const RT_SLIDE_PERSIST_ATOM: u16 = 0x03F3;
    pub const RT_SLIDE_SHOW_SLIDE_INFO_ATOM: u16 = 0x03F9;
    pub const RT_EXTERNAL_OBJECT_LIST: u16 = 0x0409;
    pub const RT_EXTERNAL_OBJECT_LIST_ATOM: u16 = 0x040A;
    pub const RT_DRAWING: u16 = 0x040C;
    pub const RT_ROUND_TRIP_THEME12_ATOM: u16 = 0x040E;
    pub const RT_ROUND_TRIP_COLOR_MAPPING12_ATOM: u16 = 0x040F;
    pub const RT_ROUND_TRIP_COMPOSITE_MASTER_ID12_ATOM: u16 = 0x041D;
    pub const RT_ROUND_TRIP_CONTENT_MASTER_ID12_ATOM: u16 = 0x0422;
    pub const RT_COLOR_SCHEME_ATOM: u16 = 0x07F0;
    pub const RT_FONT_COLLECTION: u16 = 0x07D5;
    pub const RT_OUTLINE_TEXT_REF_ATOM: u16 = 0x0F9E;
    pub const RT_TEXT_HEADER_ATOM: u16 = 0x0F9F;
    pub const RT_TEXT_CHARS_ATOM: u16 = 0x0FA0;
    pub const RT_STYLE_TEXT_PROP_ATOM: u16 = 0x0FA1;
    pub const RT_MASTER_TEXT_PROP_ATOM: u16 = 0x0FA2;
    pub const RT_TEXT_RULER_ATOM: u16 = 0x0FA6;
    pub const RT_TEXT_BOOKMARK_ATOM: u16 = 0x0FA7;
    pub const RT_TEXT_BYTES_ATOM: u16 = 0x0FA8;
    pub const RT_TEXT_SPECIAL_INFO_ATOM: u16 = 0x0FAA;
    pub const RT_FONT_ENTITY_ATOM: u16 = 0x0FB7;
    pub const RT_FONT_EMBED_DATA_BLOB: u16 = 0x0FB8;
    pub const RT_CSTRING: u16 = 0x0FBA;
    pub const RT_EXTERNAL_HYPERLINK_ATOM: u16 = 0x0FD3;
    pub const RT_EXTERNAL_HYPERLINK: u16 = 0x0FD7;
    pub const RT_SLIDE_NUMBER_META_CHAR_ATOM: u16 = 0x0FD8;
    pub const RT_HEADERS_FOOTERS: u16 = 0x0FD9;
    pub const RT_TEXT_INTERACTIVE_INFO_ATOM: u16 = 0x0FDF;
    pub const RT_SLIDE_LIST_WITH_TEXT: u16 = 0x0FF0;
    pub const RT_INTERACTIVE_INFO: u16 = 0x0FF2;
    pub const RT_INTERACTIVE_INFO_ATOM: u16 = 0x0FF3;
    pub const RT_USER_EDIT_ATOM: u16 = 0x0FF5;
    pub const RT_CURRENT_USER_ATOM: u16 = 0x0FF6;
    pub const RT_DATE_TIME_META_CHAR_ATOM: u16 = 0x0FF7;
    pub const RT_GENERIC_DATE_META_CHAR_ATOM: u16 = 0x0FF8;
    pub const RT_HEADER_META_CHAR_ATOM: u16 = 0x0FF9;
    pub const RT_FOOTER_META_CHAR_ATOM: u16 = 0x0FFA;
    pub const RT_RTF_DATE_TIME_META_CHAR_ATOM: u16 = 0x1015;
    pub const RT_PROG_TAGS: u16 = 0x1388;
    pub const RT_PERSIST_DIRECTORY_ATOM: u16 = 0x1772;
    pub const RT_ROUND_TRIP_ANIMATION_ATOM12: u16 = 0x2B0B;
    pub const RT_ROUND_TRIP_ANIMATION_HASH_ATOM12: u16 = 0x2B0D;
    pub const RT_ROUND_TRIP_SLIDE_SYNC_INFO12: u16 = 0x3714;
}

/// OfficeArt (drawing layer) record types.
pub mod office_art_types {
    pub const DG_CONTAINER: u16 = 0xF002;
    pub const SPGR_CONTAINER: u16 = 0xF003;
    pub const SP_CONTAINER: u16 = 0xF004;
    pub const SOLVER_CONTAINER: u16 = 0xF005;
    pub const FBSE: u16 = 0xF007;
    pub const FDG: u16 = 0xF008;
    pub const FSPGR: u16 = 0xF009;
    pub const FSP: u16 = 0xF00A;
    pub const FOPT: u16 = 0xF00B;
    pub const CLIENT_TEXTBOX: u16 = 0xF00D;
    pub const CHILD_ANCHOR: u16 = 0xF00F;
    pub const CLIENT_ANCHOR: u16 = 0xF010;
    pub const CLIENT_DATA: u16 = 0xF011;
    pub const BLIP_EMF: u16 = 0xF01A;
    pub const BLIP_WMF: u16 = 0xF01B;
    pub const BLIP_PICT: u16 = 0xF01C;
    pub const BLIP_JPEG: u16 = 0xF01D;
    pub const BLIP_PNG: u16 = 0xF01E;
    pub const BLIP_DIB: u16 = 0xF01F;
    pub const FRIT_CONTAINER: u16 = 0xF118;
    pub const FPSPL: u16 = 0xF11D;
    pub const SECONDARY_FOPT: u16 = 0xF121;
    pub const TERTIARY_FOPT: u16 = 0xF122;
    pub const BLIP_TIFF: u16 = 0xF029;
    pub const BLIP_JPEG_CMYK: u16 = 0xF02A;
}

/// One decoded record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub version: u8,
    pub instance: u16,
    pub rec_type: u16,
    pub rec_len: u32,
}

impl RecordHeader {
    /// Decode a header from its 8 wire bytes.
    pub fn from_bytes(bytes: [u8; HEADER_LEN]) -> Self {
        let ver_instance = u16::from_le_bytes([bytes[0], bytes[1]]);
        Self {
            version: (ver_instance & 0x000F) as u8,
            instance: ver_instance >> 4,
            rec_type: u16::from_le_bytes([bytes[2], bytes[3]]),
            rec_len: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    /// Whether the record's payload is a sequence of child records.
    pub fn is_container(&self) -> bool {
        self.version == CONTAINER_VERSION
    }
}

/// The constants a record header is expected to carry at some position.
///
/// `instance` and `length` are only checked when set. Type, version and
/// instance decide whether an optional record is present; a present record
/// with the wrong length is an error rather than an absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSignature {
    pub name: &'static str,
    pub version: u8,
    pub rec_type: u16,
    pub instance: Option<u16>,
    pub length: Option<u32>,
}

impl RecordSignature {
    pub const fn new(name: &'static str, version: u8, rec_type: u16) -> Self {
        Self {
            name,
            version,
            rec_type,
            instance: None,
            length: None,
        }
    }

    /// A container signature (version 0xF).
    pub const fn container(name: &'static str, rec_type: u16) -> Self {
        Self::new(name, CONTAINER_VERSION, rec_type)
    }

    pub const fn with_instance(mut self, instance: u16) -> Self {
        self.instance = Some(instance);
        self
    }

    pub const fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Whether `header` is an occurrence of this record (length not considered).
    pub fn identifies(&self, header: &RecordHeader) -> bool {
        header.rec_type == self.rec_type
            && header.version == self.version
            && self.instance.map_or(true, |i| i == header.instance)
    }

    /// Describe the first field of `header` that violates this signature.
    pub fn mismatch(&self, header: &RecordHeader) -> Option<String> {
        if header.rec_type != self.rec_type {
            return Some(format!(
                "expected record type 0x{:04X}, found 0x{:04X}",
                self.rec_type, header.rec_type
            ));
        }
        if header.version != self.version {
            return Some(format!(
                "expected version 0x{:X}, found 0x{:X}",
                self.version, header.version
            ));
        }
        if let Some(instance) = self.instance {
            if header.instance != instance {
                return Some(format!(
                    "expected instance 0x{:03X}, found 0x{:03X}",
                    instance, header.instance
                ));
            }
        }
        if let Some(length) = self.length {
            if header.rec_len != length {
                return Some(format!(
                    "expected length 0x{:X}, found 0x{:X}",
                    length, header.rec_len
                ));
            }
        }
        None
    }
}
