//! Read-only reachability queries for external pruning policy.
//!
//! The queries take the candidate presets as a parameter instead of reading
//! the whole bank, so a caller can ask "what would still be referenced if
//! these presets were deleted" without mutating anything.

use crate::model::{Instrument, Preset, SoundFont};

/// Does any zone of `presets` name instrument `instrument`?
pub fn instrument_referenced(presets: &[&Preset], instrument: u16) -> bool {
    presets
        .iter()
        .flat_map(|p| &p.zones)
        .any(|z| z.instrument() == Some(instrument))
}

/// Is sample `sample` named by a zone of an instrument that `presets`
/// reference?
pub fn sample_referenced(presets: &[&Preset], instruments: &[Instrument], sample: u16) -> bool {
    instruments
        .iter()
        .enumerate()
        .filter(|&(i, _)| u16::try_from(i).is_ok_and(|i| instrument_referenced(presets, i)))
        .flat_map(|(_, inst)| &inst.zones)
        .any(|z| z.sample_id() == Some(sample))
}

/// Indices of instruments no preset of `sf` references.
pub fn unreferenced_instruments(sf: &SoundFont) -> Vec<usize> {
    let presets: Vec<&Preset> = sf.presets.iter().collect();
    (0..sf.instruments.len())
        .filter(|&i| !u16::try_from(i).is_ok_and(|i| instrument_referenced(&presets, i)))
        .collect()
}

/// Indices of samples unreachable from any preset of `sf`.
pub fn unreferenced_samples(sf: &SoundFont) -> Vec<usize> {
    let presets: Vec<&Preset> = sf.presets.iter().collect();
    (0..sf.samples.len())
        .filter(|&s| {
            !u16::try_from(s).is_ok_and(|s| sample_referenced(&presets, &sf.instruments, s))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::Generator;
    use crate::model::{Sample, Zone};

    fn preset(name: &str, instruments: &[u16]) -> Preset {
        Preset {
            name:  name.into(),
            zones: instruments
                .iter()
                .map(|&i| Zone::with_generators(vec![Generator::key_range(0, 127), Generator::instrument(i)]))
                .collect(),
            ..Default::default()
        }
    }

    fn instrument(samples: &[u16]) -> Instrument {
        Instrument {
            name:  "inst".into(),
            zones: samples.iter().map(|&s| Zone::with_generators(vec![Generator::sample(s)])).collect(),
        }
    }

    #[test]
    fn instrument_reference_depends_on_subset() {
        let a = preset("A", &[3]);
        let b = preset("B", &[1]);
        assert!(instrument_referenced(&[&a, &b], 3));
        assert!(!instrument_referenced(&[&b], 3));
        assert!(!instrument_referenced(&[], 3));
    }

    #[test]
    fn sample_reference_goes_through_instruments() {
        let a = preset("A", &[1]);
        let instruments = vec![instrument(&[0]), instrument(&[2, 4])];
        assert!(sample_referenced(&[&a], &instruments, 4));
        // instrument 0 names sample 0 but no preset uses instrument 0
        assert!(!sample_referenced(&[&a], &instruments, 0));
    }

    #[test]
    fn whole_bank_leftovers() {
        let mut sf = SoundFont::new();
        sf.presets.push(preset("A", &[1]));
        sf.instruments = vec![instrument(&[0]), instrument(&[2])];
        sf.samples = vec![Sample::default(); 3];
        assert_eq!(unreferenced_instruments(&sf), vec![0]);
        assert_eq!(unreferenced_samples(&sf), vec![0, 1]);
    }
}
