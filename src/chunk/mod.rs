//! RIFF chunk primitives: fourcc tags, tagged-length headers and
//! placeholder length patching.
//!
//! # Layout
//!
//! Every chunk is `fourcc (4 B) | length (u32 LE) | payload`.  Container
//! chunks (`RIFF`, `LIST`) start their payload with a second fourcc, the
//! sub-type signature.  Lengths count payload bytes only and are never
//! padded to even size here.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::error::{Result, SfError};

/// Byte size of a chunk header (`fourcc` + length).
pub const CHUNK_HEADER_SIZE: u64 = 8;

// ── FourCC ────────────────────────────────────────────────────────────────────

/// Four-character chunk tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const RIFF: FourCC = FourCC(*b"RIFF");
    pub const LIST: FourCC = FourCC(*b"LIST");
    pub const SFBK: FourCC = FourCC(*b"sfbk");

    // LIST signatures
    pub const INFO: FourCC = FourCC(*b"INFO");
    pub const SDTA: FourCC = FourCC(*b"sdta");
    pub const PDTA: FourCC = FourCC(*b"pdta");

    // INFO
    pub const IFIL: FourCC = FourCC(*b"ifil");
    pub const IVER: FourCC = FourCC(*b"iver");
    pub const INAM: FourCC = FourCC(*b"INAM");
    pub const ISNG: FourCC = FourCC(*b"isng");
    pub const IPRD: FourCC = FourCC(*b"IPRD");
    pub const IENG: FourCC = FourCC(*b"IENG");
    pub const ISFT: FourCC = FourCC(*b"ISFT");
    pub const ICRD: FourCC = FourCC(*b"ICRD");
    pub const ICMT: FourCC = FourCC(*b"ICMT");
    pub const ICOP: FourCC = FourCC(*b"ICOP");
    pub const IROM: FourCC = FourCC(*b"irom");

    // sdta
    pub const SMPL: FourCC = FourCC(*b"smpl");
    pub const SM24: FourCC = FourCC(*b"sm24");

    // pdta
    pub const PHDR: FourCC = FourCC(*b"phdr");
    pub const PBAG: FourCC = FourCC(*b"pbag");
    pub const PMOD: FourCC = FourCC(*b"pmod");
    pub const PGEN: FourCC = FourCC(*b"pgen");
    pub const INST: FourCC = FourCC(*b"inst");
    pub const IBAG: FourCC = FourCC(*b"ibag");
    pub const IMOD: FourCC = FourCC(*b"imod");
    pub const IGEN: FourCC = FourCC(*b"igen");
    pub const SHDR: FourCC = FourCC(*b"shdr");

    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut tag = [0u8; 4];
        reader.read_exact(&mut tag)?;
        Ok(FourCC(tag))
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.0)
    }

    /// Read a tag and fail with a structural error unless it equals `self`.
    pub fn expect<R: Read>(self, reader: R) -> Result<()> {
        let found = FourCC::read(reader)?;
        if found != self {
            return Err(SfError::structural(format!("expected '{self}', found '{found}'")));
        }
        Ok(())
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC(\"{self}\")")
    }
}

// ── ChunkHeader ──────────────────────────────────────────────────────────────

/// Tag plus declared payload length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub id:  FourCC,
    pub len: u32,
}

impl ChunkHeader {
    /// Read-tagged-length: tag and little-endian length in one step.
    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let id = FourCC::read(&mut reader)?;
        let len = reader.read_u32::<LittleEndian>()?;
        Ok(Self { id, len })
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        self.id.write(&mut writer)?;
        writer.write_u32::<LittleEndian>(self.len)
    }
}

// ── Length patching ──────────────────────────────────────────────────────────

/// A chunk whose length field is still a placeholder.
///
/// Created by [`begin_chunk`]; [`OpenChunk::finish`] seeks back, writes the
/// real payload length and restores the cursor past the payload.
#[must_use = "an open chunk keeps a zero length until finished"]
#[derive(Debug)]
pub struct OpenChunk {
    id:      FourCC,
    len_pos: u64,
}

/// Write `id` and a zero length placeholder.
pub fn begin_chunk<W: Write + Seek>(writer: &mut W, id: FourCC) -> io::Result<OpenChunk> {
    id.write(&mut *writer)?;
    let len_pos = writer.stream_position()?;
    writer.write_u32::<LittleEndian>(0)?;
    Ok(OpenChunk { id, len_pos })
}

/// Write a container header (`RIFF`/`LIST`) followed by its signature.
pub fn begin_container<W: Write + Seek>(
    writer:    &mut W,
    id:        FourCC,
    signature: FourCC,
) -> io::Result<OpenChunk> {
    let open = begin_chunk(writer, id)?;
    signature.write(&mut *writer)?;
    Ok(open)
}

impl OpenChunk {
    pub fn id(&self) -> FourCC {
        self.id
    }

    /// Patch the placeholder with the payload length and return it.
    pub fn finish<W: Write + Seek>(self, writer: &mut W) -> Result<u32> {
        let end = writer.stream_position()?;
        let len = u32::try_from(end - self.len_pos - 4).map_err(|_| {
            SfError::structural(format!("chunk '{}' exceeds 4 GiB", self.id))
        })?;
        writer.seek(SeekFrom::Start(self.len_pos))?;
        writer.write_u32::<LittleEndian>(len)?;
        writer.seek(SeekFrom::Start(end))?;
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn header_reads_little_endian_length() {
        let bytes = [b'p', b'h', b'd', b'r', 0x4c, 0x00, 0x00, 0x00];
        let header = ChunkHeader::read(Cursor::new(&bytes)).unwrap();
        assert_eq!(header.id, FourCC::PHDR);
        assert_eq!(header.len, 76);
    }

    #[test]
    fn expect_rejects_wrong_signature() {
        let err = FourCC::SFBK.expect(Cursor::new(b"sfbx")).unwrap_err();
        assert!(matches!(err, SfError::Structural(_)));
    }

    #[test]
    fn truncated_header_is_io_error() {
        let err = ChunkHeader::read(Cursor::new(b"RIF")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn display_masks_unprintable_bytes() {
        assert_eq!(FourCC([b'a', 0, b'c', 0xff]).to_string(), "a?c?");
    }

    #[test]
    fn nested_chunks_are_patched() {
        let mut out = Cursor::new(Vec::new());
        let riff = begin_container(&mut out, FourCC::RIFF, FourCC::SFBK).unwrap();
        let smpl = begin_chunk(&mut out, FourCC::SMPL).unwrap();
        out.write_all(&[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(smpl.finish(&mut out).unwrap(), 6);
        assert_eq!(riff.finish(&mut out).unwrap(), 4 + 8 + 6);

        let bytes = out.into_inner();
        assert_eq!(bytes.len(), 8 + 4 + 8 + 6);
        assert_eq!(&bytes[4..8], &18u32.to_le_bytes());
        assert_eq!(&bytes[16..20], &6u32.to_le_bytes());
        assert_eq!(&bytes[20..], &[1, 2, 3, 4, 5, 6]);
    }
}
