//! Owned SoundFont entity graph.
//!
//! `SoundFont` owns three arenas (presets, instruments, samples).  Zones are
//! owned by exactly one preset or instrument; generators and modulators by
//! exactly one zone.  Links between entities (a preset zone naming an
//! instrument, an instrument zone naming a sample) are plain indices into
//! the arenas, carried by generator amounts.
//!
//! Every sequence keeps the order the records were read in, which is also
//! the order they are written back in.

use serde::Serialize;
use std::path::PathBuf;

use crate::generator::{Generator, GeneratorKind};
use crate::modulator::Modulator;
use crate::records::{SampleHeader, Text, Version};

// ── Root ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
pub struct SoundFont {
    /// `ifil` tag.
    pub version:     Version,
    /// `iver` tag, present only when the bank names a sample ROM version.
    pub rom_version: Option<Version>,
    pub info:        Info,
    pub presets:     Vec<Preset>,
    pub instruments: Vec<Instrument>,
    pub samples:     Vec<Sample>,
    /// Where the `smpl` payload sits in the stream the bank was read from.
    pub sample_data: Option<SampleDataRef>,
    /// File the bank was opened from, used by the default sample source.
    #[serde(skip)]
    pub path:        Option<PathBuf>,
}

/// `INFO` free-text metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Info {
    pub name:      Option<Text>,
    pub engine:    Option<Text>,
    pub product:   Option<Text>,
    pub creator:   Option<Text>,
    pub tools:     Option<Text>,
    pub date:      Option<Text>,
    pub comment:   Option<Text>,
    pub copyright: Option<Text>,
    pub rom_name:  Option<Text>,
}

/// Absolute offset and byte length of the `smpl` chunk payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SampleDataRef {
    pub offset: u64,
    pub len:    u32,
}

/// Entity totals, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Summary {
    pub presets:       usize,
    pub instruments:   usize,
    pub samples:       usize,
    pub preset_zones:  usize,
    pub inst_zones:    usize,
    pub generators:    usize,
    pub modulators:    usize,
    pub sample_frames: u64,
}

impl SoundFont {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> Summary {
        let pz = self.presets.iter().flat_map(|p| &p.zones);
        let iz = self.instruments.iter().flat_map(|i| &i.zones);
        let zones: Vec<&Zone> = pz.clone().chain(iz.clone()).collect();
        Summary {
            presets:       self.presets.len(),
            instruments:   self.instruments.len(),
            samples:       self.samples.len(),
            preset_zones:  pz.count(),
            inst_zones:    iz.count(),
            generators:    zones.iter().map(|z| z.generators.len()).sum(),
            modulators:    zones.iter().map(|z| z.modulators.len()).sum(),
            sample_frames: self.samples.iter().map(|s| s.frames() as u64).sum(),
        }
    }

    pub fn find_preset(&self, bank: u16, preset: u16) -> Option<&Preset> {
        self.presets.iter().find(|p| p.bank == bank && p.preset == preset)
    }

    /// Presets at the given arena indices; out-of-range indices are skipped.
    pub fn preset_subset(&self, indices: &[usize]) -> Vec<&Preset> {
        indices.iter().filter_map(|&i| self.presets.get(i)).collect()
    }
}

// ── Presets and instruments ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Preset {
    pub name:       Text,
    pub preset:     u16,
    pub bank:       u16,
    pub library:    u32,
    pub genre:      u32,
    pub morphology: u32,
    pub zones:      Vec<Zone>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Instrument {
    pub name:  Text,
    pub zones: Vec<Zone>,
}

/// Generators and modulators scoping one preset or instrument region.
/// Generator order is evaluation order and is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Zone {
    pub generators: Vec<Generator>,
    pub modulators: Vec<Modulator>,
}

impl Zone {
    pub fn with_generators(generators: Vec<Generator>) -> Self {
        Self { generators, modulators: Vec::new() }
    }

    pub fn generator(&self, kind: GeneratorKind) -> Option<&Generator> {
        self.generators.iter().find(|g| g.kind == kind)
    }

    /// Instrument index named by a preset zone.
    pub fn instrument(&self) -> Option<u16> {
        self.generator(GeneratorKind::Instrument).and_then(|g| g.amount.as_index())
    }

    /// Sample index named by an instrument zone.
    pub fn sample_id(&self) -> Option<u16> {
        self.generator(GeneratorKind::SampleId).and_then(|g| g.amount.as_index())
    }

    pub fn key_range(&self) -> Option<(u8, u8)> {
        self.generator(GeneratorKind::KeyRange).and_then(|g| g.amount.as_range())
    }

    pub fn vel_range(&self) -> Option<(u8, u8)> {
        self.generator(GeneratorKind::VelRange).and_then(|g| g.amount.as_range())
    }
}

// ── Samples ──────────────────────────────────────────────────────────────────

/// `sfSampleLink` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SampleType(pub u16);

impl SampleType {
    pub const MONO:   u16 = 0x0001;
    pub const RIGHT:  u16 = 0x0002;
    pub const LEFT:   u16 = 0x0004;
    pub const LINKED: u16 = 0x0008;
    pub const ROM:    u16 = 0x8000;

    pub fn is_mono(self)   -> bool { self.0 & Self::MONO != 0 }
    pub fn is_right(self)  -> bool { self.0 & Self::RIGHT != 0 }
    pub fn is_left(self)   -> bool { self.0 & Self::LEFT != 0 }
    pub fn is_linked(self) -> bool { self.0 & Self::LINKED != 0 }
    pub fn is_rom(self)    -> bool { self.0 & Self::ROM != 0 }
}

/// Sample descriptor.  `start`/`end` are frame positions in the source
/// `smpl` data; loop points are stored relative to `start`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Sample {
    pub name:             Text,
    pub start:            u32,
    pub end:              u32,
    pub loop_start:       u32,
    pub loop_end:         u32,
    pub sample_rate:      u32,
    pub original_pitch:   u8,
    pub pitch_correction: i8,
    pub sample_link:      u16,
    pub sample_type:      SampleType,
}

impl Sample {
    /// Rebase absolute loop points onto `start`.  Wrapping keeps malformed
    /// loops (before `start`) lossless.
    pub fn from_header(h: SampleHeader) -> Self {
        Self {
            loop_start:       h.loop_start.wrapping_sub(h.start),
            loop_end:         h.loop_end.wrapping_sub(h.start),
            name:             h.name,
            start:            h.start,
            end:              h.end,
            sample_rate:      h.sample_rate,
            original_pitch:   h.original_pitch,
            pitch_correction: h.pitch_correction,
            sample_link:      h.sample_link,
            sample_type:      SampleType(h.sample_type),
        }
    }

    /// On-disk header for this sample placed at `start..end` in the output.
    pub fn to_header(&self, start: u32, end: u32) -> SampleHeader {
        SampleHeader {
            name:             self.name.clone(),
            start,
            end,
            loop_start:       start.wrapping_add(self.loop_start),
            loop_end:         start.wrapping_add(self.loop_end),
            sample_rate:      self.sample_rate,
            original_pitch:   self.original_pitch,
            pitch_correction: self.pitch_correction,
            sample_link:      self.sample_link,
            sample_type:      self.sample_type.0,
        }
    }

    /// `end > start`; samples failing this are written as empty.
    pub fn has_data(&self) -> bool {
        self.end > self.start
    }

    pub fn frames(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_points_are_relative_in_memory() {
        let header = SampleHeader {
            start: 1000,
            end: 3000,
            loop_start: 1400,
            loop_end: 2900,
            ..Default::default()
        };
        let sample = Sample::from_header(header.clone());
        assert_eq!(sample.loop_start, 400);
        assert_eq!(sample.loop_end, 1900);
        assert_eq!(sample.to_header(1000, 3000), header);

        let moved = sample.to_header(0, 2000);
        assert_eq!((moved.loop_start, moved.loop_end), (400, 1900));
    }

    #[test]
    fn loop_before_start_survives() {
        let header = SampleHeader { start: 50, end: 60, loop_start: 10, ..Default::default() };
        let sample = Sample::from_header(header.clone());
        assert_eq!(sample.to_header(50, 60).loop_start, 10);
    }

    #[test]
    fn zone_lookups() {
        let zone = Zone::with_generators(vec![
            Generator::key_range(0, 64),
            Generator::signed(GeneratorKind::Pan, -200),
            Generator::instrument(3),
        ]);
        assert_eq!(zone.key_range(), Some((0, 64)));
        assert_eq!(zone.instrument(), Some(3));
        assert_eq!(zone.sample_id(), None);
        assert_eq!(zone.vel_range(), None);
    }

    #[test]
    fn summary_counts_everything() {
        let mut sf = SoundFont::new();
        sf.presets.push(Preset {
            zones: vec![Zone::with_generators(vec![Generator::instrument(0)])],
            ..Default::default()
        });
        sf.instruments.push(Instrument {
            name:  "Inst".into(),
            zones: vec![Zone::default(), Zone::with_generators(vec![Generator::sample(0)])],
        });
        sf.samples.push(Sample { start: 10, end: 110, ..Default::default() });

        let s = sf.summary();
        assert_eq!((s.presets, s.instruments, s.samples), (1, 1, 1));
        assert_eq!((s.preset_zones, s.inst_zones), (1, 2));
        assert_eq!(s.generators, 2);
        assert_eq!(s.sample_frames, 100);
    }
}
