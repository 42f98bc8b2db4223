//! Generator operators and their typed amounts.
//!
//! A generator record is `kind (u16) | amount (2 B)`.  How the two amount
//! bytes are read depends only on the kind:
//!
//! | Kinds | Amount |
//! |---|---|
//! | key range, velocity range | `{lo: u8, hi: u8}` |
//! | instrument, sample id | `u16` index |
//! | everything else | `i16` |
//!
//! All three share the same two on-disk bytes, so re-encoding is bit-exact
//! whatever the kind.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use std::io::{self, Read, Write};

use crate::records::Record;

// ── GeneratorKind ────────────────────────────────────────────────────────────

macro_rules! generator_kinds {
    ($($name:ident = $tag:literal,)+) => {
        /// Generator operator.  Unused and reserved operator numbers, and
        /// numbers beyond the 2.04 table, are kept as `Other`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum GeneratorKind {
            $($name,)+
            Other(u16),
        }

        impl From<u16> for GeneratorKind {
            fn from(tag: u16) -> Self {
                match tag {
                    $($tag => GeneratorKind::$name,)+
                    other => GeneratorKind::Other(other),
                }
            }
        }

        impl From<GeneratorKind> for u16 {
            fn from(kind: GeneratorKind) -> u16 {
                match kind {
                    $(GeneratorKind::$name => $tag,)+
                    GeneratorKind::Other(tag) => tag,
                }
            }
        }
    };
}

generator_kinds! {
    StartAddrsOffset           = 0,
    EndAddrsOffset             = 1,
    StartloopAddrsOffset       = 2,
    EndloopAddrsOffset         = 3,
    StartAddrsCoarseOffset     = 4,
    ModLfoToPitch              = 5,
    VibLfoToPitch              = 6,
    ModEnvToPitch              = 7,
    InitialFilterFc            = 8,
    InitialFilterQ             = 9,
    ModLfoToFilterFc           = 10,
    ModEnvToFilterFc           = 11,
    EndAddrsCoarseOffset       = 12,
    ModLfoToVolume             = 13,
    ChorusEffectsSend          = 15,
    ReverbEffectsSend          = 16,
    Pan                        = 17,
    DelayModLfo                = 21,
    FreqModLfo                 = 22,
    DelayVibLfo                = 23,
    FreqVibLfo                 = 24,
    DelayModEnv                = 25,
    AttackModEnv               = 26,
    HoldModEnv                 = 27,
    DecayModEnv                = 28,
    SustainModEnv              = 29,
    ReleaseModEnv              = 30,
    KeynumToModEnvHold         = 31,
    KeynumToModEnvDecay        = 32,
    DelayVolEnv                = 33,
    AttackVolEnv               = 34,
    HoldVolEnv                 = 35,
    DecayVolEnv                = 36,
    SustainVolEnv              = 37,
    ReleaseVolEnv              = 38,
    KeynumToVolEnvHold         = 39,
    KeynumToVolEnvDecay        = 40,
    Instrument                 = 41,
    KeyRange                   = 43,
    VelRange                   = 44,
    StartloopAddrsCoarseOffset = 45,
    Keynum                     = 46,
    Velocity                   = 47,
    InitialAttenuation         = 48,
    EndloopAddrsCoarseOffset   = 50,
    CoarseTune                 = 51,
    FineTune                   = 52,
    SampleId                   = 53,
    SampleModes                = 54,
    ScaleTuning                = 56,
    ExclusiveClass             = 57,
    OverridingRootKey          = 58,
    EndOper                    = 60,
}

/// How a generator's two amount bytes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountKind {
    Range,
    Index,
    Signed,
}

impl GeneratorKind {
    pub fn amount_kind(self) -> AmountKind {
        match self {
            GeneratorKind::KeyRange | GeneratorKind::VelRange => AmountKind::Range,
            GeneratorKind::Instrument | GeneratorKind::SampleId => AmountKind::Index,
            _ => AmountKind::Signed,
        }
    }
}

// ── Amount ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Amount {
    Range { lo: u8, hi: u8 },
    Index(u16),
    Signed(i16),
}

impl Amount {
    pub fn from_le_bytes(kind: GeneratorKind, bytes: [u8; 2]) -> Self {
        match kind.amount_kind() {
            AmountKind::Range  => Amount::Range { lo: bytes[0], hi: bytes[1] },
            AmountKind::Index  => Amount::Index(u16::from_le_bytes(bytes)),
            AmountKind::Signed => Amount::Signed(i16::from_le_bytes(bytes)),
        }
    }

    pub fn to_le_bytes(self) -> [u8; 2] {
        match self {
            Amount::Range { lo, hi } => [lo, hi],
            Amount::Index(v)         => v.to_le_bytes(),
            Amount::Signed(v)        => v.to_le_bytes(),
        }
    }

    pub fn as_index(self) -> Option<u16> {
        match self {
            Amount::Index(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_range(self) -> Option<(u8, u8)> {
        match self {
            Amount::Range { lo, hi } => Some((lo, hi)),
            _ => None,
        }
    }

    pub fn as_signed(self) -> Option<i16> {
        match self {
            Amount::Signed(v) => Some(v),
            _ => None,
        }
    }
}

// ── Generator ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Generator {
    pub kind:   GeneratorKind,
    pub amount: Amount,
}

impl Generator {
    /// Build a generator, re-reading the amount bytes the way `kind` dictates.
    pub fn new(kind: GeneratorKind, amount: Amount) -> Self {
        Self { kind, amount: Amount::from_le_bytes(kind, amount.to_le_bytes()) }
    }

    pub fn instrument(index: u16) -> Self {
        Self { kind: GeneratorKind::Instrument, amount: Amount::Index(index) }
    }

    pub fn sample(index: u16) -> Self {
        Self { kind: GeneratorKind::SampleId, amount: Amount::Index(index) }
    }

    pub fn key_range(lo: u8, hi: u8) -> Self {
        Self { kind: GeneratorKind::KeyRange, amount: Amount::Range { lo, hi } }
    }

    pub fn vel_range(lo: u8, hi: u8) -> Self {
        Self { kind: GeneratorKind::VelRange, amount: Amount::Range { lo, hi } }
    }

    pub fn signed(kind: GeneratorKind, value: i16) -> Self {
        Self::new(kind, Amount::Signed(value))
    }

    /// All-zero record closing a generator table.
    pub fn terminal() -> Self {
        Self { kind: GeneratorKind::StartAddrsOffset, amount: Amount::Signed(0) }
    }
}

impl Record for Generator {
    const SIZE: usize = 4;

    fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let kind = GeneratorKind::from(reader.read_u16::<LittleEndian>()?);
        let mut bytes = [0u8; 2];
        reader.read_exact(&mut bytes)?;
        Ok(Self { kind, amount: Amount::from_le_bytes(kind, bytes) })
    }

    fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(self.kind.into())?;
        writer.write_all(&self.amount.to_le_bytes())
    }
}
