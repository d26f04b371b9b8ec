//! Builders for synthetic streams used by the unit tests.

use crate::record::office_art_types as oa;
use crate::record::record_types as rt;

/// Serialize one record.
pub fn record(version: u8, instance: u16, rec_type: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + payload.len());
    let ver_instance = (instance << 4) | u16::from(version & 0x0F);
    out.extend_from_slice(&ver_instance.to_le_bytes());
    out.extend_from_slice(&rec_type.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Serialize a container (version 0xF) from already serialized children.
pub fn container(instance: u16, rec_type: u16, children: &[Vec<u8>]) -> Vec<u8> {
    record(0x0F, instance, rec_type, &children.concat())
}

pub fn utf16(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

pub fn cstring(instance: u16, text: &str) -> Vec<u8> {
    record(0, instance, rt::RT_CSTRING, &utf16(text))
}

/// A TextHeaderAtom + TextCharsAtom pair.
pub fn text_chars(text_type: u32, text: &str) -> Vec<Vec<u8>> {
    vec![
        record(0, 0, rt::RT_TEXT_HEADER_ATOM, &text_type.to_le_bytes()),
        record(0, 0, rt::RT_TEXT_CHARS_ATOM, &utf16(text)),
    ]
}

/// Serialize one paragraph run: count, indent level, masks, fields.
pub fn pf_run(char_count: u32, masks: u32, fields: &[u8]) -> Vec<u8> {
    let mut out = char_count.to_le_bytes().to_vec();
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&masks.to_le_bytes());
    out.extend_from_slice(fields);
    out
}

/// Serialize one character run: count, masks, fields.
pub fn cf_run(char_count: u32, masks: u32, fields: &[u8]) -> Vec<u8> {
    let mut out = char_count.to_le_bytes().to_vec();
    out.extend_from_slice(&masks.to_le_bytes());
    out.extend_from_slice(fields);
    out
}

pub fn style_text_prop(paragraph_runs: &[Vec<u8>], character_runs: &[Vec<u8>]) -> Vec<u8> {
    let mut payload = paragraph_runs.concat();
    payload.extend(character_runs.concat());
    record(0, 0, rt::RT_STYLE_TEXT_PROP_ATOM, &payload)
}

/// A shape property table from `(id, is_blob, is_complex, value)` tuples and
/// trailing complex payloads.
pub fn fopt(props: &[(u16, bool, bool, u32)], complex: &[u8]) -> Vec<u8> {
    let mut payload = Vec::new();
    for &(id, blob, cplx, value) in props {
        let mut word = id;
        if blob {
            word |= 0x4000;
        }
        if cplx {
            word |= 0x8000;
        }
        payload.extend_from_slice(&word.to_le_bytes());
        payload.extend_from_slice(&value.to_le_bytes());
    }
    payload.extend_from_slice(complex);
    record(3, props.len() as u16, oa::FOPT, &payload)
}

pub fn fsp(shape_type: u16, spid: u32, flags: u32) -> Vec<u8> {
    let mut payload = spid.to_le_bytes().to_vec();
    payload.extend_from_slice(&flags.to_le_bytes());
    record(2, shape_type, oa::FSP, &payload)
}

/// Compact 16-bit client anchor: top, left, right, bottom.
pub fn small_anchor(top: i16, left: i16, right: i16, bottom: i16) -> Vec<u8> {
    let payload: Vec<u8> = [top, left, right, bottom]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    record(0, 0, oa::CLIENT_ANCHOR, &payload)
}

pub fn sp_container(children: &[Vec<u8>]) -> Vec<u8> {
    container(0, oa::SP_CONTAINER, children)
}

/// The group-marker shape that opens every group container.
pub fn group_marker() -> Vec<u8> {
    sp_container(&[
        record(1, 0, oa::FSPGR, &[0u8; 16]),
        fsp(0, 1024, 0x0005),
    ])
}

/// A Drawing container holding one top-level group with `shapes`.
pub fn drawing(shapes: &[Vec<u8>]) -> Vec<u8> {
    let mut group = vec![group_marker()];
    group.extend_from_slice(shapes);
    let mut fdg = 1u32.to_le_bytes().to_vec();
    fdg.extend_from_slice(&1024u32.to_le_bytes());
    container(
        0,
        rt::RT_DRAWING,
        &[container(
            0,
            oa::DG_CONTAINER,
            &[
                record(0, 1, oa::FDG, &fdg),
                container(0, oa::SPGR_CONTAINER, &group),
            ],
        )],
    )
}

pub fn slide_atom(layout: u32) -> Vec<u8> {
    let mut payload = layout.to_le_bytes().to_vec();
    payload.extend_from_slice(&[0x0D, 0x0E, 0, 0, 0, 0, 0, 0]);
    payload.extend_from_slice(&0x8000_0000u32.to_le_bytes());
    payload.extend_from_slice(&0u32.to_le_bytes());
    payload.extend_from_slice(&0x0007u16.to_le_bytes());
    payload.extend_from_slice(&0u16.to_le_bytes());
    record(2, 0, rt::RT_SLIDE_ATOM, &payload)
}

pub fn color_scheme() -> Vec<u8> {
    let payload: Vec<u8> = (0u8..8).flat_map(|i| [i, i * 2, i * 3, 0]).collect();
    record(0, 1, rt::RT_COLOR_SCHEME_ATOM, &payload)
}

/// A complete Slide container around `shapes`.
pub fn slide(shapes: &[Vec<u8>]) -> Vec<u8> {
    container(
        0,
        rt::RT_SLIDE,
        &[slide_atom(1), drawing(shapes), color_scheme()],
    )
}

pub fn document_atom() -> Vec<u8> {
    let mut payload = vec![0u8; 0x28];
    payload[0..4].copy_from_slice(&5760i32.to_le_bytes());
    payload[4..8].copy_from_slice(&4320i32.to_le_bytes());
    record(1, 0, rt::RT_DOCUMENT_ATOM, &payload)
}

pub fn font_entity(index: u16, name: &str) -> Vec<u8> {
    let mut payload = utf16(name);
    payload.resize(64, 0);
    payload.extend_from_slice(&[0, 0, 0, 0]);
    record(0, index, rt::RT_FONT_ENTITY_ATOM, &payload)
}

pub fn environment(fonts: &[&str]) -> Vec<u8> {
    let entities: Vec<Vec<u8>> = fonts
        .iter()
        .enumerate()
        .map(|(i, name)| font_entity(i as u16, name))
        .collect();
    container(
        0,
        rt::RT_ENVIRONMENT,
        &[container(0, rt::RT_FONT_COLLECTION, &entities)],
    )
}

pub fn user_edit_atom(offset_persist_directory: u32) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&256u32.to_le_bytes()); // lastSlideIdRef
    payload.extend_from_slice(&0u16.to_le_bytes()); // version
    payload.push(0); // minorVersion
    payload.push(3); // majorVersion
    payload.extend_from_slice(&0u32.to_le_bytes()); // offsetLastEdit
    payload.extend_from_slice(&offset_persist_directory.to_le_bytes());
    payload.extend_from_slice(&1u32.to_le_bytes()); // docPersistIdRef
    payload.extend_from_slice(&3u32.to_le_bytes()); // persistIdSeed
    payload.extend_from_slice(&1u16.to_le_bytes()); // lastView
    payload.extend_from_slice(&0u16.to_le_bytes());
    record(0, 0, rt::RT_USER_EDIT_ATOM, &payload)
}

/// A PersistDirectoryAtom from `(start_id, offsets)` groups.
pub fn persist_directory(groups: &[(u32, Vec<u32>)]) -> Vec<u8> {
    let mut payload = Vec::new();
    for (start, offsets) in groups {
        let word = start | ((offsets.len() as u32) << 20);
        payload.extend_from_slice(&word.to_le_bytes());
        for offset in offsets {
            payload.extend_from_slice(&offset.to_le_bytes());
        }
    }
    record(0, 0, rt::RT_PERSIST_DIRECTORY_ATOM, &payload)
}

pub fn current_user(offset_to_current_edit: u32, header_token: u32) -> Vec<u8> {
    let user = b"tester";
    let mut payload = Vec::new();
    payload.extend_from_slice(&0x14u32.to_le_bytes());
    payload.extend_from_slice(&header_token.to_le_bytes());
    payload.extend_from_slice(&offset_to_current_edit.to_le_bytes());
    payload.extend_from_slice(&(user.len() as u16).to_le_bytes());
    payload.extend_from_slice(&0x03F4u16.to_le_bytes());
    payload.push(3);
    payload.push(0);
    payload.extend_from_slice(&0u16.to_le_bytes());
    payload.extend_from_slice(user);
    payload.extend_from_slice(&8u32.to_le_bytes());
    record(0, 0, rt::RT_CURRENT_USER_ATOM, &payload)
}

/// Lay out a Document stream: each record in order, followed by the
/// persist directory and the user edit. Persist IDs are assigned 1, 2, ...
/// to `records` in order. Returns (document stream, current user stream).
pub fn build_streams(records: &[Vec<u8>]) -> (Vec<u8>, Vec<u8>) {
    let mut stream = Vec::new();
    let mut offsets = Vec::new();
    for rec in records {
        offsets.push(stream.len() as u32);
        stream.extend_from_slice(rec);
    }
    let persist_offset = stream.len() as u32;
    stream.extend(persist_directory(&[(1, offsets)]));
    let edit_offset = stream.len() as u32;
    stream.extend(user_edit_atom(persist_offset));
    (stream, current_user(edit_offset, 0xE391_C05F))
}
