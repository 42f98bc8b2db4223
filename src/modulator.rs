//! `pmod`/`imod` records: source, destination generator, amount, amount
//! source, transform.  Ten bytes each, all little-endian `u16` but the
//! signed amount.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use std::io::{self, Read, Write};

use crate::generator::GeneratorKind;
use crate::records::Record;

/// 16-bit modulator source tag.
///
/// Bits 0-6 controller index, bit 7 MIDI CC flag, bit 8 direction,
/// bit 9 polarity, bits 10-15 curve type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct ModSource(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveType {
    Linear,
    Concave,
    Convex,
    Switch,
    Other(u8),
}

impl ModSource {
    pub fn index(self) -> u8 {
        (self.0 & 0x7f) as u8
    }

    /// `true` when [`index`](Self::index) is a MIDI continuous controller
    /// number rather than a general controller.
    pub fn is_midi_cc(self) -> bool {
        self.0 & 0x80 != 0
    }

    /// `true` for max-to-min direction.
    pub fn is_negative(self) -> bool {
        self.0 & 0x100 != 0
    }

    pub fn is_bipolar(self) -> bool {
        self.0 & 0x200 != 0
    }

    pub fn curve(self) -> CurveType {
        match (self.0 >> 10) as u8 {
            0 => CurveType::Linear,
            1 => CurveType::Concave,
            2 => CurveType::Convex,
            3 => CurveType::Switch,
            other => CurveType::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Transform {
    Linear,
    AbsoluteValue,
    Other(u16),
}

impl From<u16> for Transform {
    fn from(tag: u16) -> Self {
        match tag {
            0 => Transform::Linear,
            2 => Transform::AbsoluteValue,
            other => Transform::Other(other),
        }
    }
}

impl From<Transform> for u16 {
    fn from(t: Transform) -> u16 {
        match t {
            Transform::Linear => 0,
            Transform::AbsoluteValue => 2,
            Transform::Other(tag) => tag,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Modulator {
    pub src:       ModSource,
    pub dst:       GeneratorKind,
    pub amount:    i16,
    pub amt_src:   ModSource,
    pub transform: Transform,
}

impl Modulator {
    /// All-zero record closing a modulator table.
    pub fn terminal() -> Self {
        Self {
            src:       ModSource(0),
            dst:       GeneratorKind::from(0),
            amount:    0,
            amt_src:   ModSource(0),
            transform: Transform::Linear,
        }
    }
}

impl Record for Modulator {
    const SIZE: usize = 10;

    fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        Ok(Self {
            src:       ModSource(reader.read_u16::<LittleEndian>()?),
            dst:       GeneratorKind::from(reader.read_u16::<LittleEndian>()?),
            amount:    reader.read_i16::<LittleEndian>()?,
            amt_src:   ModSource(reader.read_u16::<LittleEndian>()?),
            transform: Transform::from(reader.read_u16::<LittleEndian>()?),
        })
    }

    fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(self.src.0)?;
        writer.write_u16::<LittleEndian>(self.dst.into())?;
        writer.write_i16::<LittleEndian>(self.amount)?;
        writer.write_u16::<LittleEndian>(self.amt_src.0)?;
        writer.write_u16::<LittleEndian>(self.transform.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn decodes_default_velocity_to_attenuation() {
        // SF2 default modulator: note-on velocity, negative, concave -> attenuation 960 cB
        let bytes = [0x02, 0x05, 48, 0, 0xc0, 0x03, 0, 0, 0, 0];
        let m = Modulator::read(Cursor::new(bytes)).unwrap();
        assert_eq!(m.src.index(), 2);
        assert!(!m.src.is_midi_cc());
        assert!(m.src.is_negative());
        assert!(!m.src.is_bipolar());
        assert_eq!(m.src.curve(), CurveType::Concave);
        assert_eq!(m.dst, GeneratorKind::InitialAttenuation);
        assert_eq!(m.amount, 960);
        assert_eq!(m.transform, Transform::Linear);

        let mut out = Vec::new();
        m.write(&mut out).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn terminal_is_all_zero() {
        let mut out = Vec::new();
        Modulator::terminal().write(&mut out).unwrap();
        assert_eq!(out, [0u8; 10]);
    }
}
