//! Bounded, peekable byte cursor.
//!
//! A [`Cursor`] covers exactly one container's payload. Child records are
//! handed out as new cursors over their own declared range, so no decoder can
//! read past the end of the container it was given. Speculative reads use
//! [`Cursor::peek_header`]: nothing advances until the caller commits with
//! [`Cursor::expect`] or [`Cursor::try_record`].

use crate::record::{RecordHeader, RecordSignature, HEADER_LEN};
use deckread_core::{Error, Result};

#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    /// Bytes of this container only.
    data: &'a [u8],
    /// Absolute stream offset of `data[0]`.
    base: usize,
    pos: usize,
    path: Vec<&'static str>,
}

impl<'a> Cursor<'a> {
    /// A cursor over a whole stream.
    pub fn new(data: &'a [u8], root: &'static str) -> Self {
        Self {
            data,
            base: 0,
            pos: 0,
            path: vec![root],
        }
    }

    /// A cursor over `data[offset..]`, for records located by absolute offset.
    pub fn at(data: &'a [u8], offset: usize, root: &'static str) -> Result<Self> {
        if offset > data.len() {
            return Err(Error::Decode {
                path: root.to_string(),
                offset,
                needed: 0,
                available: 0,
            });
        }
        Ok(Self {
            data: &data[offset..],
            base: offset,
            pos: 0,
            path: vec![root],
        })
    }

    /// The record at `offset` in `data`, validated against `sig`.
    ///
    /// The returned payload cursor's path starts at `sig.name`, so errors
    /// inside a slide read `Slide > drawing > ...`.
    pub fn record_at(
        data: &'a [u8],
        offset: usize,
        sig: &RecordSignature,
    ) -> Result<(RecordHeader, Cursor<'a>)> {
        let mut outer = Self::at(data, offset, sig.name)?;
        let Some(header) = outer.peek_header() else {
            return Err(outer.format_error(format!(
                "no record header at offset {}, {} bytes left in stream",
                offset,
                outer.remaining()
            )));
        };
        if let Some(reason) = sig.mismatch(&header) {
            return Err(outer.format_error(reason));
        }
        outer.skip(HEADER_LEN)?;

        let len = header.rec_len as usize;
        if len > outer.remaining() {
            return Err(outer.format_error(format!(
                "declared length {} exceeds the {} bytes left in the stream",
                len,
                outer.remaining()
            )));
        }
        let base = outer.position();
        let data = outer.take(len)?;
        Ok((
            header,
            Cursor {
                data,
                base,
                pos: 0,
                path: vec![sig.name],
            },
        ))
    }

    /// The structural path of this cursor, e.g. `Slide > drawing`.
    pub fn path(&self) -> String {
        self.path.join(" > ")
    }

    /// Path with one more segment appended.
    pub fn path_with(&self, segment: &str) -> String {
        format!("{} > {}", self.path(), segment)
    }

    /// Absolute stream offset of the next byte.
    pub fn position(&self) -> usize {
        self.base + self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn format_error(&self, message: impl Into<String>) -> Error {
        Error::format(self.path(), message)
    }

    pub fn not_implemented(&self, feature: impl Into<String>) -> Error {
        Error::not_implemented(self.path(), feature)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::Decode {
                path: self.path(),
                offset: self.position(),
                needed: len,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.take(len)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    /// Consume everything left in this container.
    pub fn rest(&mut self) -> &'a [u8] {
        let bytes = &self.data[self.pos..];
        self.pos = self.data.len();
        bytes
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    /// Decode the next header without advancing.
    ///
    /// Returns `None` when fewer than 8 bytes remain; a non-empty tail that
    /// is too short for a header is reported later by [`Cursor::finish`].
    pub fn peek_header(&self) -> Option<RecordHeader> {
        if self.remaining() < HEADER_LEN {
            return None;
        }
        let mut bytes = [0u8; HEADER_LEN];
        bytes.copy_from_slice(&self.data[self.pos..self.pos + HEADER_LEN]);
        Some(RecordHeader::from_bytes(bytes))
    }

    /// Whether the next record is an occurrence of `sig`.
    pub fn peek_matches(&self, sig: &RecordSignature) -> bool {
        self.peek_header().is_some_and(|h| sig.identifies(&h))
    }

    /// Read the next header unconditionally.
    pub fn read_header(&mut self) -> Result<RecordHeader> {
        Ok(RecordHeader::from_bytes(self.read_array()?))
    }

    /// Read the next header and require it to match `sig` exactly.
    pub fn expect(&mut self, sig: &RecordSignature) -> Result<RecordHeader> {
        let Some(header) = self.peek_header() else {
            return Err(Error::format(
                self.path_with(sig.name),
                format!(
                    "expected record header, {} bytes left in container",
                    self.remaining()
                ),
            ));
        };
        if let Some(reason) = sig.mismatch(&header) {
            return Err(Error::format(self.path_with(sig.name), reason));
        }
        self.skip(HEADER_LEN)?;
        Ok(header)
    }

    /// Split the next `header.rec_len` bytes off as a child cursor.
    ///
    /// A declared length that overruns this container is a format error:
    /// the child would drive the parent's remaining length negative.
    pub fn body(&mut self, header: &RecordHeader, name: &'static str) -> Result<Cursor<'a>> {
        let len = header.rec_len as usize;
        if len > self.remaining() {
            return Err(Error::format(
                self.path_with(name),
                format!(
                    "declared length {} exceeds the {} bytes left in the enclosing container",
                    len,
                    self.remaining()
                ),
            ));
        }
        let base = self.position();
        let data = self.take(len)?;
        let mut path = self.path.clone();
        path.push(name);
        Ok(Cursor {
            data,
            base,
            pos: 0,
            path,
        })
    }

    /// Expect `sig` and return a cursor over its payload.
    pub fn record(&mut self, sig: &RecordSignature) -> Result<Cursor<'a>> {
        let header = self.expect(sig)?;
        self.body(&header, sig.name)
    }

    /// Like [`Cursor::record`] but also returns the header.
    pub fn record_with_header(
        &mut self,
        sig: &RecordSignature,
    ) -> Result<(RecordHeader, Cursor<'a>)> {
        let header = self.expect(sig)?;
        let body = self.body(&header, sig.name)?;
        Ok((header, body))
    }

    /// If the next record is an occurrence of `sig`, consume it and return
    /// its payload cursor; otherwise leave the cursor untouched.
    pub fn try_record(&mut self, sig: &RecordSignature) -> Result<Option<Cursor<'a>>> {
        if !self.peek_matches(sig) {
            return Ok(None);
        }
        self.record(sig).map(Some)
    }

    /// Like [`Cursor::try_record`] but also returns the header.
    pub fn try_record_with_header(
        &mut self,
        sig: &RecordSignature,
    ) -> Result<Option<(RecordHeader, Cursor<'a>)>> {
        if !self.peek_matches(sig) {
            return Ok(None);
        }
        self.record_with_header(sig).map(Some)
    }

    /// Consume the next record whatever it is.
    pub fn skip_record(&mut self, name: &'static str) -> Result<RecordHeader> {
        let header = self.read_header()?;
        self.body(&header, name)?;
        Ok(header)
    }

    /// Require that this container has been consumed exactly.
    pub fn finish(self) -> Result<()> {
        if self.remaining() != 0 {
            return Err(self.format_error(format!(
                "{} bytes left unconsumed at end of container",
                self.remaining()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;

    const ATOM: RecordSignature = RecordSignature::new("Atom", 0, 0x0FA0);

    #[test]
    fn test_reads_are_bounded() {
        let data = [1u8, 0, 2, 0, 0, 0];
        let mut cursor = Cursor::new(&data, "Test");
        assert_eq!(cursor.read_u16().unwrap(), 1);
        assert_eq!(cursor.read_u32().unwrap(), 2);
        let err = cursor.read_u8().unwrap_err();
        assert!(err.is_decode());
        assert_eq!(err.path(), Some("Test"));
    }

    #[test]
    fn test_peek_does_not_advance() {
        let data = record(0, 0, 0x0FA0, b"ab");
        let mut cursor = Cursor::new(&data, "Test");
        let other = RecordSignature::new("Other", 0, 0x0FA8);

        assert!(cursor.try_record(&other).unwrap().is_none());
        assert_eq!(cursor.position(), 0);

        let mut body = cursor.try_record(&ATOM).unwrap().unwrap();
        assert_eq!(body.read_bytes(2).unwrap(), b"ab");
        assert_eq!(body.path(), "Test > Atom");
        assert_eq!(body.position(), 10);
        body.finish().unwrap();
        cursor.finish().unwrap();
    }

    #[test]
    fn test_child_cannot_read_past_declared_length() {
        let mut data = record(0, 0, 0x0FA0, b"ab");
        data.extend_from_slice(b"cd");
        let mut cursor = Cursor::new(&data, "Test");
        let mut body = cursor.record(&ATOM).unwrap();
        assert!(body.read_u32().unwrap_err().is_decode());
        assert_eq!(cursor.remaining(), 2);
    }

    #[test]
    fn test_overrunning_length_is_format_error() {
        let mut data = record(0, 0, 0x0FA0, b"abcd");
        data.truncate(data.len() - 1);
        let mut cursor = Cursor::new(&data, "Test");
        let err = cursor.record(&ATOM).unwrap_err();
        assert!(err.is_format());
        assert_eq!(err.path(), Some("Test > Atom"));
    }

    #[test]
    fn test_expect_names_the_step() {
        let data = record(0, 0, 0x0FA8, b"");
        let mut cursor = Cursor::new(&data, "Slide");
        let err = cursor.expect(&ATOM).unwrap_err();
        assert_eq!(err.path(), Some("Slide > Atom"));
    }

    #[test]
    fn test_finish_rejects_leftovers() {
        let data = [0u8; 3];
        let cursor = Cursor::new(&data, "Test");
        assert!(cursor.finish().unwrap_err().is_format());
    }

    #[test]
    fn test_at_offset() {
        let data = [0u8, 0, 7, 0];
        let mut cursor = Cursor::at(&data, 2, "Test").unwrap();
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.read_u16().unwrap(), 7);
        assert!(Cursor::at(&data, 5, "Test").unwrap_err().is_decode());
    }

    #[test]
    fn test_record_at_offset() {
        let mut data = vec![0xEE; 3];
        data.extend(record(0, 0, 0x0FA0, b"xy"));
        let (header, mut body) = Cursor::record_at(&data, 3, &ATOM).unwrap();
        assert_eq!(header.rec_len, 2);
        assert_eq!(body.path(), "Atom");
        assert_eq!(body.position(), 11);
        assert_eq!(body.read_bytes(2).unwrap(), b"xy");

        let err = Cursor::record_at(&data, 0, &ATOM).unwrap_err();
        assert!(err.is_format());
        assert_eq!(err.path(), Some("Atom"));

        data.truncate(data.len() - 1);
        assert!(Cursor::record_at(&data, 3, &ATOM).unwrap_err().is_format());
    }
}
