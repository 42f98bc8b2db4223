//! Raw PCM retrieval for sample re-copying during encode.
//!
//! The writer never reads PCM from the model; it asks a [`SampleSource`]
//! passed in by the caller.  The default source,
//! [`SoundFont::sample_source`], opens a second read-only handle on the
//! file the bank was decoded from, so the original reader does not have to
//! stay open.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{Result, SfError};
use crate::model::{Sample, SampleDataRef, SoundFont};

/// Bytes per frame of 16-bit mono PCM.
pub const FRAME_SIZE: u64 = 2;

/// Supplies signed 16-bit mono frames for a sample.
pub trait SampleSource {
    /// Fill `frames` with PCM starting at `sample.start`.
    fn read_frames(&mut self, sample: &Sample, frames: &mut [i16]) -> Result<()>;

    /// Total frames the source holds, when known.
    fn frame_limit(&self) -> Option<u64> {
        None
    }
}

/// Any closure with the right shape is a source.
impl<F> SampleSource for F
where
    F: FnMut(&Sample, &mut [i16]) -> Result<()>,
{
    fn read_frames(&mut self, sample: &Sample, frames: &mut [i16]) -> Result<()> {
        self(sample, frames)
    }
}

// ── Stream-backed source ─────────────────────────────────────────────────────

/// Reads frames from a `smpl` payload at a known offset in a seekable stream.
pub struct StreamSampleSource<R> {
    reader: R,
    data:   SampleDataRef,
}

pub type FileSampleSource = StreamSampleSource<BufReader<File>>;

impl<R: Read + Seek> StreamSampleSource<R> {
    pub fn new(reader: R, data: SampleDataRef) -> Self {
        Self { reader, data }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl FileSampleSource {
    pub fn open<P: AsRef<Path>>(path: P, data: SampleDataRef) -> Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?), data))
    }
}

impl<R: Read + Seek> SampleSource for StreamSampleSource<R> {
    fn read_frames(&mut self, sample: &Sample, frames: &mut [i16]) -> Result<()> {
        let first = sample.start as u64 * FRAME_SIZE;
        let last = first + frames.len() as u64 * FRAME_SIZE;
        if last > self.data.len as u64 {
            return Err(SfError::structural(format!(
                "sample '{}' spans bytes {first}..{last} of a {}-byte smpl chunk",
                sample.name, self.data.len
            )));
        }
        self.reader.seek(SeekFrom::Start(self.data.offset + first))?;
        self.reader.read_i16_into::<LittleEndian>(frames)?;
        Ok(())
    }

    fn frame_limit(&self) -> Option<u64> {
        Some(self.data.len as u64 / FRAME_SIZE)
    }
}

impl SoundFont {
    /// Default source: reopen the file this bank was decoded from.
    pub fn sample_source(&self) -> Result<FileSampleSource> {
        let path = self.path.as_ref().ok_or_else(|| {
            SfError::structural("bank was not opened from a file; supply a sample source")
        })?;
        let data = self
            .sample_data
            .ok_or_else(|| SfError::structural("bank has no 'smpl' chunk"))?;
        FileSampleSource::open(path, data)
    }
}

// ── Copy ─────────────────────────────────────────────────────────────────────

/// Copy one sample's frames from `source` to `writer` and return the frame
/// count written.  Samples with `end <= start` are skipped and count as 0.
///
/// The one transient buffer holds this sample only, and is not allocated
/// when the sample ends past the source's known frame limit.
pub fn copy_sample<W, S>(writer: &mut W, sample: &Sample, source: &mut S) -> Result<u32>
where
    W: Write,
    S: SampleSource + ?Sized,
{
    if !sample.has_data() {
        log::warn!(
            "sample '{}' has end {} <= start {}; writing it empty",
            sample.name,
            sample.end,
            sample.start
        );
        return Ok(0);
    }

    if let Some(limit) = source.frame_limit() {
        if sample.end as u64 > limit {
            return Err(SfError::structural(format!(
                "sample '{}' ends at frame {}, past the {limit} frames of sample data",
                sample.name, sample.end
            )));
        }
    }

    let count = sample.frames();
    let mut frames = vec![0i16; count as usize];
    source.read_frames(sample, &mut frames)?;
    for &f in &frames {
        writer.write_i16::<LittleEndian>(f)?;
    }
    Ok(count)
}
