//! Fixed-width `pdta` and `INFO` record codecs.
//!
//! # Record sizes
//!
//! | Table | Size | Layout |
//! |---|---|---|
//! | `phdr` | 38 | name[20], preset u16, bank u16, bag start u16, library u32, genre u32, morphology u32 |
//! | `inst` | 22 | name[20], bag start u16 |
//! | `pbag`/`ibag` | 4 | generator start u16, modulator start u16 |
//! | `pmod`/`imod` | 10 | see [`Modulator`](crate::modulator::Modulator) |
//! | `pgen`/`igen` | 4 | see [`Generator`](crate::generator::Generator) |
//! | `shdr` | 46 | name[20], start, end, loop start, loop end, rate (u32 each), pitch u8, correction i8, link u16, type u16 |
//!
//! Every table ends with a terminal record.  Header and bag tables keep it
//! when decoded (the linker needs its index); generator and modulator
//! tables are checked against the exact size implied by the bags.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::io::{self, Cursor, Read, Write};

use crate::chunk::FourCC;
use crate::error::{Result, SfError};

/// Byte length of every fixed name field.
pub const NAME_LEN: usize = 20;

/// A fixed-width little-endian record.
pub trait Record: Sized {
    const SIZE: usize;
    fn read<R: Read>(reader: R) -> io::Result<Self>;
    fn write<W: Write>(&self, writer: W) -> io::Result<()>;
}

// ── Table decoding ───────────────────────────────────────────────────────────

/// Decode a header, bag or sample table, terminal record included.
///
/// The payload must be a whole, non-zero number of records.
pub fn decode_table<T: Record>(section: FourCC, payload: &[u8]) -> Result<Vec<T>> {
    if payload.len() % T::SIZE != 0 {
        return Err(SfError::structural(format!(
            "'{section}' length {} is not a multiple of {}",
            payload.len(),
            T::SIZE
        )));
    }
    if payload.is_empty() {
        return Err(SfError::structural(format!("'{section}' too short: terminal record missing")));
    }
    read_records(payload, payload.len() / T::SIZE)
}

/// Decode exactly `count` records followed by one terminal record.
///
/// Any other payload length is a size mismatch.  The terminal record is
/// consumed and dropped.
pub fn decode_exact<T: Record>(section: FourCC, payload: &[u8], count: usize) -> Result<Vec<T>> {
    let expected = (count + 1) * T::SIZE;
    if payload.len() != expected {
        return Err(SfError::SizeMismatch {
            section,
            expected: expected as u64,
            actual:   payload.len() as u64,
        });
    }
    read_records(payload, count)
}

fn read_records<T: Record>(payload: &[u8], count: usize) -> Result<Vec<T>> {
    let mut cursor = Cursor::new(payload);
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(T::read(&mut cursor)?);
    }
    Ok(out)
}

// ── Text ─────────────────────────────────────────────────────────────────────

/// Free text or a fixed-width name, kept as the raw bytes read.
///
/// Older banks carry Latin-1 and other 8-bit names; those bytes are written
/// back unchanged.  `Display` and serialization decode them lossily.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Text(Vec<u8>);

impl Text {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<String> for Text {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<Vec<u8>> for Text {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl PartialEq<str> for Text {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for Text {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.to_str_lossy())
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.to_str_lossy(), f)
    }
}

impl Serialize for Text {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_str_lossy())
    }
}

/// Bytes up to the first NUL; the end of the buffer acts as a forced NUL.
pub fn decode_text(bytes: &[u8]) -> Text {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    Text(bytes[..end].to_vec())
}

/// NUL-terminated text padded with a second NUL to even length.
pub fn encode_text(text: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + 2);
    out.extend_from_slice(text);
    out.push(0);
    if out.len() % 2 != 0 {
        out.push(0);
    }
    out
}

pub fn read_name<R: Read>(mut reader: R) -> io::Result<Text> {
    let mut buf = [0u8; NAME_LEN];
    reader.read_exact(&mut buf)?;
    Ok(decode_text(&buf))
}

/// Zero-padded 20-byte name.  UTF-8 names are truncated on a character
/// boundary, anything else at the byte limit.
pub fn write_name<W: Write>(mut writer: W, name: &Text) -> io::Result<()> {
    let bytes = name.as_bytes();
    let mut end = bytes.len().min(NAME_LEN);
    if let Ok(s) = std::str::from_utf8(bytes) {
        while !s.is_char_boundary(end) {
            end -= 1;
        }
    }
    let mut buf = [0u8; NAME_LEN];
    buf[..end].copy_from_slice(&bytes[..end]);
    writer.write_all(&buf)
}

// ── Version ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
}

impl Version {
    pub const SF2_01: Version = Version { major: 2, minor: 1 };
}

impl Default for Version {
    fn default() -> Self {
        Version::SF2_01
    }
}

impl Record for Version {
    const SIZE: usize = 4;

    fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        Ok(Self {
            major: reader.read_u16::<LittleEndian>()?,
            minor: reader.read_u16::<LittleEndian>()?,
        })
    }

    fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(self.major)?;
        writer.write_u16::<LittleEndian>(self.minor)
    }
}

// ── Preset header ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PresetHeader {
    pub name:       Text,
    pub preset:     u16,
    pub bank:       u16,
    pub bag_start:  u16,
    pub library:    u32,
    pub genre:      u32,
    pub morphology: u32,
}

impl Record for PresetHeader {
    const SIZE: usize = 38;

    fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        Ok(Self {
            name:       read_name(&mut reader)?,
            preset:     reader.read_u16::<LittleEndian>()?,
            bank:       reader.read_u16::<LittleEndian>()?,
            bag_start:  reader.read_u16::<LittleEndian>()?,
            library:    reader.read_u32::<LittleEndian>()?,
            genre:      reader.read_u32::<LittleEndian>()?,
            morphology: reader.read_u32::<LittleEndian>()?,
        })
    }

    fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        write_name(&mut writer, &self.name)?;
        writer.write_u16::<LittleEndian>(self.preset)?;
        writer.write_u16::<LittleEndian>(self.bank)?;
        writer.write_u16::<LittleEndian>(self.bag_start)?;
        writer.write_u32::<LittleEndian>(self.library)?;
        writer.write_u32::<LittleEndian>(self.genre)?;
        writer.write_u32::<LittleEndian>(self.morphology)
    }
}

// ── Instrument header ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstrumentHeader {
    pub name:      Text,
    pub bag_start: u16,
}

impl Record for InstrumentHeader {
    const SIZE: usize = 22;

    fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        Ok(Self {
            name:      read_name(&mut reader)?,
            bag_start: reader.read_u16::<LittleEndian>()?,
        })
    }

    fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        write_name(&mut writer, &self.name)?;
        writer.write_u16::<LittleEndian>(self.bag_start)
    }
}

// ── Bag ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bag {
    pub gen_start: u16,
    pub mod_start: u16,
}

impl Record for Bag {
    const SIZE: usize = 4;

    fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        Ok(Self {
            gen_start: reader.read_u16::<LittleEndian>()?,
            mod_start: reader.read_u16::<LittleEndian>()?,
        })
    }

    fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(self.gen_start)?;
        writer.write_u16::<LittleEndian>(self.mod_start)
    }
}

// ── Sample header ────────────────────────────────────────────────────────────

/// On-disk sample header.  Loop points are absolute frame positions here.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SampleHeader {
    pub name:             Text,
    pub start:            u32,
    pub end:              u32,
    pub loop_start:       u32,
    pub loop_end:         u32,
    pub sample_rate:      u32,
    pub original_pitch:   u8,
    pub pitch_correction: i8,
    pub sample_link:      u16,
    pub sample_type:      u16,
}

impl Record for SampleHeader {
    const SIZE: usize = 46;

    fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        Ok(Self {
            name:             read_name(&mut reader)?,
            start:            reader.read_u32::<LittleEndian>()?,
            end:              reader.read_u32::<LittleEndian>()?,
            loop_start:       reader.read_u32::<LittleEndian>()?,
            loop_end:         reader.read_u32::<LittleEndian>()?,
            sample_rate:      reader.read_u32::<LittleEndian>()?,
            original_pitch:   reader.read_u8()?,
            pitch_correction: reader.read_i8()?,
            sample_link:      reader.read_u16::<LittleEndian>()?,
            sample_type:      reader.read_u16::<LittleEndian>()?,
        })
    }

    fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        write_name(&mut writer, &self.name)?;
        writer.write_u32::<LittleEndian>(self.start)?;
        writer.write_u32::<LittleEndian>(self.end)?;
        writer.write_u32::<LittleEndian>(self.loop_start)?;
        writer.write_u32::<LittleEndian>(self.loop_end)?;
        writer.write_u32::<LittleEndian>(self.sample_rate)?;
        writer.write_u8(self.original_pitch)?;
        writer.write_i8(self.pitch_correction)?;
        writer.write_u16::<LittleEndian>(self.sample_link)?;
        writer.write_u16::<LittleEndian>(self.sample_type)
    }
}
