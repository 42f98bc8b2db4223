//! SoundFont 2 bank codec.
//!
//! ```no_run
//! use sfbank::{SoundFont, EncodeOptions};
//!
//! let sf = SoundFont::open("piano.sf2")?;
//! for p in &sf.presets {
//!     println!("{:03}:{:03} {}", p.bank, p.preset, p.name);
//! }
//! let mut source = sf.sample_source()?;
//! sf.save("piano-copy.sf2", &mut source, &EncodeOptions::default())?;
//! # Ok::<(), sfbank::SfError>(())
//! ```

pub mod error;
pub mod chunk;
pub mod records;
pub mod generator;
pub mod modulator;
pub mod linker;
pub mod model;
pub mod reader;
pub mod writer;
pub mod sample;
pub mod reach;

pub use error::{Result, SfError};
pub use chunk::FourCC;
pub use generator::{Amount, Generator, GeneratorKind};
pub use modulator::{ModSource, Modulator, Transform};
pub use model::{Info, Instrument, Preset, Sample, SampleDataRef, SampleType, SoundFont, Zone};
pub use records::{Text, Version};
pub use reader::decode;
pub use writer::{encode, EncodeOptions, EncodeReport};
pub use sample::{copy_sample, FileSampleSource, SampleSource, StreamSampleSource};
pub use reach::{instrument_referenced, sample_referenced, unreferenced_instruments, unreferenced_samples};
