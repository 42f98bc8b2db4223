//! SoundFont decoder.
//!
//! Walks `RIFF('sfbk')` → `LIST(INFO|sdta|pdta)` → leaf chunks, dispatching
//! each leaf by tag.  `pdta` tables are buffered as they arrive and linked
//! in one pass once the whole container has been read, so the relative
//! order of the nine tables does not matter.  Sample PCM is never loaded:
//! only the position and length of the `smpl` payload are recorded.
//!
//! Unknown leaf tags are fatal; nothing is skipped.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::chunk::{ChunkHeader, FourCC, CHUNK_HEADER_SIZE};
use crate::error::{Result, SfError};
use crate::linker::{link_zones, Side};
use crate::model::{Info, Instrument, Preset, Sample, SampleDataRef, SoundFont};
use crate::records::{
    decode_table, decode_text, Bag, InstrumentHeader, PresetHeader, Record, SampleHeader, Text,
    Version,
};

/// Decode a complete bank from `reader`, positioned at the `RIFF` header.
pub fn decode<R: Read + Seek>(reader: &mut R) -> Result<SoundFont> {
    let origin = reader.stream_position()?;
    let stream_end = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(origin))?;

    let riff = ChunkHeader::read(&mut *reader)?;
    if riff.id != FourCC::RIFF {
        return Err(SfError::structural(format!("expected 'RIFF', found '{}'", riff.id)));
    }
    FourCC::SFBK.expect(&mut *reader)?;

    let mut sections = Sections::new(stream_end);
    let mut remaining = consume(FourCC::RIFF, riff.len as u64, 4)?;
    while remaining > 0 {
        let list = ChunkHeader::read(&mut *reader)?;
        remaining = consume(FourCC::RIFF, remaining, list.len as u64 + CHUNK_HEADER_SIZE)?;
        if list.id != FourCC::LIST {
            return Err(SfError::structural(format!("expected 'LIST', found '{}'", list.id)));
        }

        let signature = FourCC::read(&mut *reader)?;
        if ![FourCC::INFO, FourCC::SDTA, FourCC::PDTA].contains(&signature) {
            return Err(SfError::structural(format!("unexpected LIST signature '{signature}'")));
        }
        log::debug!("LIST '{signature}' ({} bytes)", list.len);

        let mut list_remaining = consume(signature, list.len as u64, 4)?;
        while list_remaining > 0 {
            let leaf = ChunkHeader::read(&mut *reader)?;
            list_remaining = consume(signature, list_remaining, leaf.len as u64 + CHUNK_HEADER_SIZE)?;
            sections.read_section(reader, signature, leaf)?;
        }
    }

    let sf = sections.finish()?;
    let s = sf.summary();
    log::info!(
        "decoded bank: {} presets, {} instruments, {} samples, {} generators, {} modulators",
        s.presets,
        s.instruments,
        s.samples,
        s.generators,
        s.modulators,
    );
    Ok(sf)
}

/// Subtract a child's size from its container's remaining length.
fn consume(container: FourCC, remaining: u64, size: u64) -> Result<u64> {
    remaining.checked_sub(size).ok_or_else(|| {
        SfError::structural(format!("chunk of {size} bytes overruns its '{container}' container"))
    })
}

impl SoundFont {
    /// Open and decode a bank file.  The path is kept for the default
    /// file-backed sample source.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = BufReader::new(File::open(path)?);
        let mut sf = decode(&mut reader)?;
        sf.path = Some(path.to_owned());
        Ok(sf)
    }

    pub fn read_from<R: Read + Seek>(mut reader: R) -> Result<Self> {
        decode(&mut reader)
    }
}

// ── Section buffer ───────────────────────────────────────────────────────────

/// Everything read so far; `pdta` tables wait here until linking.
struct Sections {
    stream_end: u64,
    seen:       HashSet<FourCC>,
    sf:         SoundFont,
    phdr:       Option<Vec<PresetHeader>>,
    pbag:       Option<Vec<Bag>>,
    pmod:       Option<Vec<u8>>,
    pgen:       Option<Vec<u8>>,
    inst:       Option<Vec<InstrumentHeader>>,
    ibag:       Option<Vec<Bag>>,
    imod:       Option<Vec<u8>>,
    igen:       Option<Vec<u8>>,
    shdr:       Option<Vec<SampleHeader>>,
}

impl Sections {
    fn new(stream_end: u64) -> Self {
        Self {
            stream_end,
            seen: HashSet::new(),
            sf:   SoundFont::new(),
            phdr: None,
            pbag: None,
            pmod: None,
            pgen: None,
            inst: None,
            ibag: None,
            imod: None,
            igen: None,
            shdr: None,
        }
    }

    fn read_section<R: Read + Seek>(
        &mut self,
        reader: &mut R,
        list:   FourCC,
        header: ChunkHeader,
    ) -> Result<()> {
        let ChunkHeader { id, len } = header;
        log::debug!("section '{id}' ({len} bytes)");

        let home = home_list(id).ok_or(SfError::UnknownSection(id))?;
        if home != list {
            return Err(SfError::structural(format!("'{id}' belongs in LIST '{home}', found in '{list}'")));
        }
        if !self.seen.insert(id) {
            return Err(SfError::structural(format!("duplicate '{id}' chunk")));
        }

        match id {
            FourCC::IFIL => self.sf.version = self.read_version(reader, header)?,
            FourCC::IVER => self.sf.rom_version = Some(self.read_version(reader, header)?),

            FourCC::INAM | FourCC::ISNG | FourCC::IPRD | FourCC::IENG | FourCC::ISFT
            | FourCC::ICRD | FourCC::ICMT | FourCC::ICOP | FourCC::IROM => {
                let text = decode_text(&self.payload(reader, len)?);
                *info_field(&mut self.sf.info, id) = Some(text);
            }

            FourCC::SMPL => {
                let offset = reader.stream_position()?;
                self.skip(reader, len)?;
                self.sf.sample_data = Some(SampleDataRef { offset, len });
            }
            FourCC::SM24 => {
                log::warn!("ignoring {len} bytes of 24-bit sample extension data");
                self.skip(reader, len)?;
            }

            FourCC::PHDR => self.phdr = Some(decode_table(id, &self.payload(reader, len)?)?),
            FourCC::INST => self.inst = Some(decode_table(id, &self.payload(reader, len)?)?),
            FourCC::SHDR => self.shdr = Some(decode_table(id, &self.payload(reader, len)?)?),
            FourCC::PBAG => self.pbag = Some(decode_table(id, &self.payload(reader, len)?)?),
            FourCC::IBAG => self.ibag = Some(decode_table(id, &self.payload(reader, len)?)?),

            // Generator and modulator amounts are decoded once the bags say
            // how many records to expect.
            FourCC::PMOD => self.pmod = Some(self.payload(reader, len)?),
            FourCC::PGEN => self.pgen = Some(self.payload(reader, len)?),
            FourCC::IMOD => self.imod = Some(self.payload(reader, len)?),
            FourCC::IGEN => self.igen = Some(self.payload(reader, len)?),

            other => return Err(SfError::UnknownSection(other)),
        }
        Ok(())
    }

    fn read_version<R: Read + Seek>(&self, reader: &mut R, header: ChunkHeader) -> Result<Version> {
        if header.len as usize != Version::SIZE {
            return Err(SfError::structural(format!(
                "'{}' must be {} bytes, found {}",
                header.id,
                Version::SIZE,
                header.len
            )));
        }
        Ok(Version::read(&mut *reader)?)
    }

    fn check_available<R: Seek>(&self, reader: &mut R, len: u32) -> Result<()> {
        let pos = reader.stream_position()?;
        if pos + len as u64 > self.stream_end {
            return Err(SfError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("chunk of {len} bytes at offset {pos} runs past end of stream"),
            )));
        }
        Ok(())
    }

    fn payload<R: Read + Seek>(&self, reader: &mut R, len: u32) -> Result<Vec<u8>> {
        self.check_available(reader, len)?;
        let mut buf = vec![0u8; len as usize];
        reader.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn skip<R: Read + Seek>(&self, reader: &mut R, len: u32) -> Result<()> {
        self.check_available(reader, len)?;
        reader.seek(SeekFrom::Current(len as i64))?;
        Ok(())
    }

    /// Second pass: link buffered tables into the owned graph.
    fn finish(self) -> Result<SoundFont> {
        let mut sf = self.sf;

        let phdr = require(self.phdr, FourCC::PHDR)?;
        let pbag = require(self.pbag, FourCC::PBAG)?;
        let pmod = require(self.pmod, FourCC::PMOD)?;
        let pgen = require(self.pgen, FourCC::PGEN)?;
        let inst = require(self.inst, FourCC::INST)?;
        let ibag = require(self.ibag, FourCC::IBAG)?;
        let imod = require(self.imod, FourCC::IMOD)?;
        let igen = require(self.igen, FourCC::IGEN)?;
        let mut shdr = require(self.shdr, FourCC::SHDR)?;

        let starts: Vec<u16> = phdr.iter().map(|h| h.bag_start).collect();
        let zones = link_zones(Side::Preset, &starts, &pbag, &pgen, &pmod)?;
        // zip stops before the terminal header
        sf.presets = phdr
            .into_iter()
            .zip(zones)
            .map(|(h, zones)| Preset {
                name:       h.name,
                preset:     h.preset,
                bank:       h.bank,
                library:    h.library,
                genre:      h.genre,
                morphology: h.morphology,
                zones,
            })
            .collect();

        let starts: Vec<u16> = inst.iter().map(|h| h.bag_start).collect();
        let zones = link_zones(Side::Instrument, &starts, &ibag, &igen, &imod)?;
        sf.instruments = inst
            .into_iter()
            .zip(zones)
            .map(|(h, zones)| Instrument { name: h.name, zones })
            .collect();

        shdr.pop();
        sf.samples = shdr.into_iter().map(Sample::from_header).collect();

        Ok(sf)
    }
}

fn info_field(info: &mut Info, id: FourCC) -> &mut Option<Text> {
    match id {
        FourCC::INAM => &mut info.name,
        FourCC::ISNG => &mut info.engine,
        FourCC::IPRD => &mut info.product,
        FourCC::IENG => &mut info.creator,
        FourCC::ISFT => &mut info.tools,
        FourCC::ICRD => &mut info.date,
        FourCC::ICMT => &mut info.comment,
        FourCC::ICOP => &mut info.copyright,
        _ => &mut info.rom_name,
    }
}

/// The LIST a leaf chunk must appear in, or `None` for an unknown tag.
fn home_list(id: FourCC) -> Option<FourCC> {
    match id {
        FourCC::IFIL | FourCC::IVER | FourCC::INAM | FourCC::ISNG | FourCC::IPRD
        | FourCC::IENG | FourCC::ISFT | FourCC::ICRD | FourCC::ICMT | FourCC::ICOP
        | FourCC::IROM => Some(FourCC::INFO),
        FourCC::SMPL | FourCC::SM24 => Some(FourCC::SDTA),
        FourCC::PHDR | FourCC::PBAG | FourCC::PMOD | FourCC::PGEN | FourCC::INST
        | FourCC::IBAG | FourCC::IMOD | FourCC::IGEN | FourCC::SHDR => Some(FourCC::PDTA),
        _ => None,
    }
}

fn require<T>(slot: Option<T>, id: FourCC) -> Result<T> {
    slot.ok_or_else(|| SfError::structural(format!("missing '{id}' table")))
}
