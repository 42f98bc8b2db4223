//! SoundFont encoder.
//!
//! Mirrors the reader: `RIFF('sfbk')` holding `LIST(INFO)`, `LIST(sdta)`
//! and `LIST(pdta)`.  Container and `smpl` lengths are written as
//! placeholders and patched once their payload is out.  Every index table
//! (`phdr`/`inst` bag starts, bag generator/modulator starts) is re-derived
//! from the live model, and every sample is placed where its frames were
//! actually written, so presets, instruments and samples may have been
//! dropped or reordered since decoding.
//!
//! The model itself is never modified.

use std::fs::{self, File};
use std::io::{BufWriter, Seek, Write};
use std::iter;
use std::path::Path;

use crate::chunk::{begin_chunk, begin_container, ChunkHeader, FourCC};
use crate::error::{Result, SfError};
use crate::generator::Generator;
use crate::linker::{flatten_zones, FlatZones, Side};
use crate::model::SoundFont;
use crate::modulator::Modulator;
use crate::records::{
    encode_text, InstrumentHeader, PresetHeader, Record, SampleHeader, Text, Version,
};
use crate::sample::{copy_sample, SampleSource};

// ── Options ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// `ifil` tag to write; `None` keeps the bank's recorded version.
    pub file_version:   Option<Version>,
    /// Name terminal records `EOP`/`EOI`/`EOS` instead of leaving them blank.
    pub terminal_names: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            file_version:   None,
            terminal_names: true,
        }
    }
}

impl EncodeOptions {
    fn terminal_name(&self, name: &str) -> Text {
        if self.terminal_names { Text::from(name) } else { Text::default() }
    }
}

/// Totals of one encode run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeReport {
    pub bytes:   u64,
    pub samples: usize,
    pub frames:  u64,
}

// ── Encode ───────────────────────────────────────────────────────────────────

/// Encode `sf` at the writer's current position, pulling PCM from `source`.
pub fn encode<W, S>(
    sf:     &SoundFont,
    writer: &mut W,
    source: &mut S,
    opts:   &EncodeOptions,
) -> Result<EncodeReport>
where
    W: Write + Seek,
    S: SampleSource + ?Sized,
{
    // Index derivation can fail on 16-bit overflow; do it before any output.
    let preset_zones = flatten_zones(Side::Preset, sf.presets.iter().map(|p| p.zones.as_slice()))?;
    let inst_zones = flatten_zones(Side::Instrument, sf.instruments.iter().map(|i| i.zones.as_slice()))?;

    let origin = writer.stream_position()?;
    let riff = begin_container(writer, FourCC::RIFF, FourCC::SFBK)?;

    let info = begin_container(writer, FourCC::LIST, FourCC::INFO)?;
    write_info(writer, sf, opts)?;
    info.finish(writer)?;

    let sdta = begin_container(writer, FourCC::LIST, FourCC::SDTA)?;
    let placements = write_smpl(writer, sf, source)?;
    sdta.finish(writer)?;

    let pdta = begin_container(writer, FourCC::LIST, FourCC::PDTA)?;
    write_presets(writer, sf, &preset_zones, opts)?;
    write_zone_tables(writer, Side::Preset, &preset_zones)?;
    write_instruments(writer, sf, &inst_zones, opts)?;
    write_zone_tables(writer, Side::Instrument, &inst_zones)?;
    write_samples(writer, sf, &placements, opts)?;
    pdta.finish(writer)?;

    riff.finish(writer)?;

    let report = EncodeReport {
        bytes:   writer.stream_position()? - origin,
        samples: placements.len(),
        frames:  placements.last().map(|&(_, end)| end as u64).unwrap_or(0),
    };
    log::info!(
        "encoded bank: {} bytes, {} presets, {} instruments, {} samples ({} frames)",
        report.bytes,
        sf.presets.len(),
        sf.instruments.len(),
        report.samples,
        report.frames,
    );
    Ok(report)
}

impl SoundFont {
    pub fn write_to<W, S>(&self, writer: &mut W, source: &mut S) -> Result<EncodeReport>
    where
        W: Write + Seek,
        S: SampleSource + ?Sized,
    {
        encode(self, writer, source, &EncodeOptions::default())
    }

    /// Encode to a new file at `path`.  Saving over the file this bank was
    /// opened from is refused, since creating the output would truncate the
    /// sample data still to be copied; write elsewhere and rename instead.
    pub fn save<P, S>(&self, path: P, source: &mut S, opts: &EncodeOptions) -> Result<EncodeReport>
    where
        P: AsRef<Path>,
        S: SampleSource + ?Sized,
    {
        let path = path.as_ref();
        if let Some(opened) = &self.path {
            if same_file(opened, path) {
                return Err(SfError::structural(format!(
                    "refusing to overwrite '{}', the file samples are read from",
                    path.display()
                )));
            }
        }
        let mut writer = BufWriter::new(File::create(path)?);
        let report = encode(self, &mut writer, source, opts)?;
        writer.flush()?;
        Ok(report)
    }
}

// ── Sections ─────────────────────────────────────────────────────────────────

fn write_chunk<W: Write>(writer: &mut W, id: FourCC, payload: &[u8]) -> Result<()> {
    let len = u32::try_from(payload.len())
        .map_err(|_| SfError::structural(format!("'{id}' exceeds 4 GiB")))?;
    ChunkHeader { id, len }.write(&mut *writer)?;
    writer.write_all(payload)?;
    Ok(())
}

/// Write a record table; `records` already ends with its terminal.
fn write_table<W: Write, T: Record>(writer: &mut W, id: FourCC, records: &[T]) -> Result<()> {
    let len = u32::try_from(records.len() * T::SIZE)
        .map_err(|_| SfError::structural(format!("'{id}' exceeds 4 GiB")))?;
    ChunkHeader { id, len }.write(&mut *writer)?;
    for r in records {
        r.write(&mut *writer)?;
    }
    Ok(())
}

fn write_info<W: Write>(writer: &mut W, sf: &SoundFont, opts: &EncodeOptions) -> Result<()> {
    let version = opts.file_version.unwrap_or(sf.version);
    write_table(writer, FourCC::IFIL, &[version])?;

    let info = &sf.info;
    let texts = [
        (FourCC::INAM, &info.name),
        (FourCC::ISNG, &info.engine),
        (FourCC::IPRD, &info.product),
        (FourCC::IENG, &info.creator),
        (FourCC::ISFT, &info.tools),
        (FourCC::ICRD, &info.date),
        (FourCC::ICMT, &info.comment),
        (FourCC::ICOP, &info.copyright),
        (FourCC::IROM, &info.rom_name),
    ];
    for (id, text) in texts {
        if let Some(text) = text {
            write_chunk(writer, id, &encode_text(text.as_bytes()))?;
        }
    }

    if let Some(rom_version) = sf.rom_version {
        write_table(writer, FourCC::IVER, &[rom_version])?;
    }
    Ok(())
}

/// Copy every sample into a fresh `smpl` chunk and return where each one
/// landed, as `(start, end)` frame positions.
fn write_smpl<W, S>(writer: &mut W, sf: &SoundFont, source: &mut S) -> Result<Vec<(u32, u32)>>
where
    W: Write + Seek,
    S: SampleSource + ?Sized,
{
    let smpl = begin_chunk(writer, FourCC::SMPL)?;
    let mut placements = Vec::with_capacity(sf.samples.len());
    let mut cursor = 0u32;
    for sample in &sf.samples {
        let frames = copy_sample(writer, sample, source)?;
        let start = cursor;
        cursor = cursor
            .checked_add(frames)
            .ok_or_else(|| SfError::structural("sample data exceeds 2^32 frames"))?;
        placements.push((start, cursor));
    }
    let len = smpl.finish(writer)?;
    log::debug!("wrote {} samples, {len} bytes of PCM", placements.len());
    Ok(placements)
}

fn write_presets<W: Write>(
    writer: &mut W,
    sf:     &SoundFont,
    flat:   &FlatZones<'_>,
    opts:   &EncodeOptions,
) -> Result<()> {
    let mut headers: Vec<PresetHeader> = sf
        .presets
        .iter()
        .zip(&flat.starts)
        .map(|(p, &bag_start)| PresetHeader {
            name:       p.name.clone(),
            preset:     p.preset,
            bank:       p.bank,
            bag_start,
            library:    p.library,
            genre:      p.genre,
            morphology: p.morphology,
        })
        .collect();
    headers.push(PresetHeader {
        name:      opts.terminal_name("EOP"),
        bag_start: terminal_start(&flat.starts),
        ..Default::default()
    });
    write_table(writer, FourCC::PHDR, &headers)
}

fn write_instruments<W: Write>(
    writer: &mut W,
    sf:     &SoundFont,
    flat:   &FlatZones<'_>,
    opts:   &EncodeOptions,
) -> Result<()> {
    let mut headers: Vec<InstrumentHeader> = sf
        .instruments
        .iter()
        .zip(&flat.starts)
        .map(|(i, &bag_start)| InstrumentHeader { name: i.name.clone(), bag_start })
        .collect();
    headers.push(InstrumentHeader {
        name:      opts.terminal_name("EOI"),
        bag_start: terminal_start(&flat.starts),
    });
    write_table(writer, FourCC::INST, &headers)
}

/// Bag, modulator and generator tables of one side, in on-disk order.
fn write_zone_tables<W: Write>(writer: &mut W, side: Side, flat: &FlatZones<'_>) -> Result<()> {
    write_table(writer, side.bags(), &flat.bags)?;

    let mods: Vec<Modulator> = flat
        .modulators
        .iter()
        .map(|&&m| m)
        .chain(iter::once(Modulator::terminal()))
        .collect();
    write_table(writer, side.mods(), &mods)?;

    let gens: Vec<Generator> = flat
        .generators
        .iter()
        .map(|&&g| g)
        .chain(iter::once(Generator::terminal()))
        .collect();
    write_table(writer, side.gens(), &gens)
}

fn write_samples<W: Write>(
    writer:     &mut W,
    sf:         &SoundFont,
    placements: &[(u32, u32)],
    opts:       &EncodeOptions,
) -> Result<()> {
    let mut headers: Vec<SampleHeader> = sf
        .samples
        .iter()
        .zip(placements)
        .map(|(s, &(start, end))| s.to_header(start, end))
        .collect();
    headers.push(SampleHeader { name: opts.terminal_name("EOS"), ..Default::default() });
    write_table(writer, FourCC::SHDR, &headers)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn terminal_start(starts: &[u16]) -> u16 {
    starts.last().copied().unwrap_or(0)
}
