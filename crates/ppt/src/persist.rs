//! Current-user, user-edit and persist-directory decoding.
//!
//! The Current User stream points at the most recent UserEditAtom in the
//! PowerPoint Document stream; that atom points at the PersistDirectoryAtom
//! mapping persist IDs to byte offsets. Only this most recent snapshot is
//! resolved; earlier edits reachable through `offset_last_edit` are ignored.

use crate::cursor::Cursor;
use crate::record::{record_types as rt, RecordSignature};
use deckread_core::{Error, Result};
use std::collections::BTreeMap;

/// Header token of an unencrypted presentation.
const HEADER_TOKEN: u32 = 0xE391_C05F;

/// Header token of an encrypted presentation.
const ENCRYPTED_HEADER_TOKEN: u32 = 0xF3D1_C4DF;

const CURRENT_USER_SIZE: u32 = 0x14;
const DOC_FILE_VERSION: u16 = 0x03F4;
const MAJOR_VERSION: u8 = 3;
const MINOR_VERSION: u8 = 0;
const DOC_PERSIST_ID_REF: u32 = 1;

const CURRENT_USER_ATOM: RecordSignature =
    RecordSignature::new("CurrentUserAtom", 0, rt::RT_CURRENT_USER_ATOM).with_instance(0);
const USER_EDIT_ATOM: RecordSignature =
    RecordSignature::new("UserEditAtom", 0, rt::RT_USER_EDIT_ATOM).with_instance(0);
const PERSIST_DIRECTORY_ATOM: RecordSignature =
    RecordSignature::new("PersistDirectoryAtom", 0, rt::RT_PERSIST_DIRECTORY_ATOM)
        .with_instance(0);

/// Contents of the Current User stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUserAtom {
    /// Offset of the current UserEditAtom in the Document stream.
    pub offset_to_current_edit: u32,
    /// ANSI name of the last user to save the file.
    pub user_name: String,
}

impl CurrentUserAtom {
    pub fn parse(stream: &[u8]) -> Result<Self> {
        let mut root = Cursor::new(stream, "CurrentUser");
        let mut atom = root.record(&CURRENT_USER_ATOM)?;

        let size = atom.read_u32()?;
        if size != CURRENT_USER_SIZE {
            return Err(atom.format_error(format!("unexpected size field 0x{:X}", size)));
        }

        let header_token = atom.read_u32()?;
        match header_token {
            HEADER_TOKEN => {}
            ENCRYPTED_HEADER_TOKEN => {
                return Err(atom.not_implemented("encrypted presentations"));
            }
            other => {
                return Err(atom.format_error(format!("invalid header token 0x{:08X}", other)));
            }
        }

        let offset_to_current_edit = atom.read_u32()?;
        let user_name_len = atom.read_u16()?;
        let doc_file_version = atom.read_u16()?;
        let major = atom.read_u8()?;
        let minor = atom.read_u8()?;
        atom.skip(2)?;
        if doc_file_version != DOC_FILE_VERSION || major != MAJOR_VERSION || minor != MINOR_VERSION
        {
            return Err(atom.format_error(format!(
                "unsupported file version 0x{:04X} {}.{}",
                doc_file_version, major, minor
            )));
        }

        // Latin-1 user name; the release version and Unicode copy that
        // follow are not needed.
        let name_bytes = atom.read_bytes(usize::from(user_name_len))?;
        let user_name = name_bytes.iter().map(|&b| char::from(b)).collect();
        atom.rest();

        Ok(Self {
            offset_to_current_edit,
            user_name,
        })
    }
}

/// The UserEditAtom of the snapshot being decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEditAtom {
    pub last_slide_id_ref: u32,
    pub offset_last_edit: u32,
    pub offset_persist_directory: u32,
    pub doc_persist_id_ref: u32,
    pub persist_id_seed: u32,
    pub last_view: u16,
}

impl UserEditAtom {
    pub fn parse(document: &[u8], offset: u32) -> Result<Self> {
        let mut root = Cursor::at(document, offset as usize, "UserEdit")?;
        let (header, mut atom) = root.record_with_header(&USER_EDIT_ATOM)?;
        if header.rec_len != 0x1C && header.rec_len != 0x20 {
            return Err(atom.format_error(format!("unexpected length 0x{:X}", header.rec_len)));
        }

        let last_slide_id_ref = atom.read_u32()?;
        let _version = atom.read_u16()?;
        let minor = atom.read_u8()?;
        let major = atom.read_u8()?;
        if minor != MINOR_VERSION || major != MAJOR_VERSION {
            return Err(atom.format_error(format!("unsupported version {}.{}", major, minor)));
        }
        let offset_last_edit = atom.read_u32()?;
        let offset_persist_directory = atom.read_u32()?;
        let doc_persist_id_ref = atom.read_u32()?;
        if doc_persist_id_ref != DOC_PERSIST_ID_REF {
            return Err(atom.format_error(format!(
                "docPersistIdRef must be 1, found {}",
                doc_persist_id_ref
            )));
        }
        let persist_id_seed = atom.read_u32()?;
        let last_view = atom.read_u16()?;
        atom.skip(2)?;
        // Optional encryptSessionPersistIdRef.
        atom.rest();

        Ok(Self {
            last_slide_id_ref,
            offset_last_edit,
            offset_persist_directory,
            doc_persist_id_ref,
            persist_id_seed,
            last_view,
        })
    }
}

/// Persist ID to Document-stream offset map for one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistDirectory {
    entries: BTreeMap<u32, u32>,
}

impl PersistDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `offsets` to `start_id`, `start_id + 1`, ...; later groups
    /// overwrite IDs written by earlier ones.
    pub fn insert_group(&mut self, start_id: u32, offsets: &[u32]) {
        for (id, &offset) in (start_id..).zip(offsets) {
            self.entries.insert(id, offset);
        }
    }

    /// Parse the PersistDirectoryAtom at `offset`.
    pub fn parse(document: &[u8], offset: u32) -> Result<Self> {
        let mut root = Cursor::at(document, offset as usize, "PersistDirectory")?;
        let mut atom = root.record(&PERSIST_DIRECTORY_ATOM)?;

        let mut directory = Self::new();
        while !atom.is_empty() {
            let word = atom.read_u32()?;
            let start_id = word & 0x000F_FFFF;
            let count = (word >> 20) as usize;
            let offsets = (0..count)
                .map(|_| atom.read_u32())
                .collect::<Result<Vec<_>>>()?;
            directory.insert_group(start_id, &offsets);
        }
        atom.finish()?;

        Ok(directory)
    }

    /// Follow Current User → UserEditAtom → PersistDirectoryAtom.
    pub fn resolve(current_user: &[u8], document: &[u8]) -> Result<(UserEditAtom, Self)> {
        let user = CurrentUserAtom::parse(current_user)?;
        let edit = UserEditAtom::parse(document, user.offset_to_current_edit)?;
        let directory = Self::parse(document, edit.offset_persist_directory)?;

        log::debug!(
            "Resolved snapshot: user='{}', edit at {}, {} persist entries",
            user.user_name,
            user.offset_to_current_edit,
            directory.len()
        );

        Ok((edit, directory))
    }

    pub fn get(&self, persist_id: u32) -> Option<u32> {
        self.entries.get(&persist_id).copied()
    }

    /// Offset of `persist_id`, or a format error naming `what`.
    pub fn require(&self, persist_id: u32, what: &str) -> Result<u32> {
        self.get(persist_id).ok_or_else(|| {
            Error::format(
                "PersistDirectory",
                format!("{} persist ID {} has no directory entry", what, persist_id),
            )
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending persist-ID order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.entries.iter().map(|(&id, &offset)| (id, offset))
    }
}
