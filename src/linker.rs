//! Index-delta linking between the flat `pdta` tables and the owned model.
//!
//! Presets (and instruments) own zones only through a start index into the
//! bag table; bags own generators and modulators only through start
//! indices into those tables.  Each table carries one terminal record whose
//! index bounds the last real entry, so entry `i` owns
//! `starts[i]..starts[i + 1]`.
//!
//! The same algorithm runs four times per bank: presets to zones,
//! instruments to zones, zones to generators, zones to modulators.
//! [`flatten_zones`] is its exact inverse and is used by the writer.

use std::ops::Range;

use crate::chunk::FourCC;
use crate::error::{Result, SfError};
use crate::generator::Generator;
use crate::modulator::Modulator;
use crate::model::Zone;
use crate::records::{decode_exact, Bag, Record};

/// Which of the two parallel index spaces a table set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Preset,
    Instrument,
}

impl Side {
    pub fn headers(self) -> FourCC {
        match self {
            Side::Preset     => FourCC::PHDR,
            Side::Instrument => FourCC::INST,
        }
    }

    pub fn bags(self) -> FourCC {
        match self {
            Side::Preset     => FourCC::PBAG,
            Side::Instrument => FourCC::IBAG,
        }
    }

    pub fn mods(self) -> FourCC {
        match self {
            Side::Preset     => FourCC::PMOD,
            Side::Instrument => FourCC::IMOD,
        }
    }

    pub fn gens(self) -> FourCC {
        match self {
            Side::Preset     => FourCC::PGEN,
            Side::Instrument => FourCC::IGEN,
        }
    }
}

// ── Index deltas ─────────────────────────────────────────────────────────────

/// Child ranges for `starts.len() - 1` entries.  The last start belongs to
/// the terminal record.  Fewer than two starts means no real entries.
pub fn child_ranges(section: FourCC, starts: &[u16]) -> Result<Vec<Range<usize>>> {
    starts
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let (previous, index) = (pair[0], pair[1]);
            if index < previous {
                return Err(SfError::Ordering { section, record: i + 1, index, previous });
            }
            Ok(previous as usize..index as usize)
        })
        .collect()
}

/// Child count of each real entry: `starts[i + 1] - starts[i]`.
pub fn child_counts(section: FourCC, starts: &[u16]) -> Result<Vec<usize>> {
    Ok(child_ranges(section, starts)?.into_iter().map(|r| r.len()).collect())
}

/// Running start indices for the given child counts, terminal included.
pub fn derive_starts<I>(section: FourCC, counts: I) -> Result<Vec<u16>>
where
    I: IntoIterator<Item = usize>,
{
    let counts = counts.into_iter();
    let mut starts = Vec::with_capacity(counts.size_hint().0 + 1);
    let mut total = 0usize;
    starts.push(0);
    for n in counts {
        total += n;
        let index = u16::try_from(total).map_err(|_| {
            SfError::structural(format!("'{section}' needs {total} entries, beyond the 16-bit index limit"))
        })?;
        starts.push(index);
    }
    Ok(starts)
}

// ── Decode side ──────────────────────────────────────────────────────────────

/// Build the zone lists of every preset (or instrument) of one side.
///
/// * `starts`   — bag start of every header, terminal included
/// * `bags`     — bag table, terminal included
/// * `gen_data` — raw generator table payload
/// * `mod_data` — raw modulator table payload
pub fn link_zones(
    side:     Side,
    starts:   &[u16],
    bags:     &[Bag],
    gen_data: &[u8],
    mod_data: &[u8],
) -> Result<Vec<Vec<Zone>>> {
    let zone_ranges = child_ranges(side.headers(), starts)?;

    let zone_total = starts.last().copied().unwrap_or(0) as usize;
    if bags.len() != zone_total + 1 {
        return Err(SfError::SizeMismatch {
            section:  side.bags(),
            expected: ((zone_total + 1) * Bag::SIZE) as u64,
            actual:   (bags.len() * Bag::SIZE) as u64,
        });
    }

    let gen_starts: Vec<u16> = bags.iter().map(|b| b.gen_start).collect();
    let mod_starts: Vec<u16> = bags.iter().map(|b| b.mod_start).collect();
    let gen_ranges = child_ranges(side.bags(), &gen_starts)?;
    let mod_ranges = child_ranges(side.bags(), &mod_starts)?;

    let gen_total = gen_starts.last().copied().unwrap_or(0) as usize;
    let mod_total = mod_starts.last().copied().unwrap_or(0) as usize;
    let generators: Vec<Generator> = decode_exact(side.gens(), gen_data, gen_total)?;
    let modulators: Vec<Modulator> = decode_exact(side.mods(), mod_data, mod_total)?;

    log::debug!(
        "linked {}: {} owners, {} zones, {} generators, {} modulators",
        side.headers(),
        zone_ranges.len(),
        zone_total,
        gen_total,
        mod_total,
    );

    Ok(zone_ranges
        .into_iter()
        .map(|zones| {
            zones
                .map(|bag| Zone {
                    generators: generators[gen_ranges[bag].clone()].to_vec(),
                    modulators: modulators[mod_ranges[bag].clone()].to_vec(),
                })
                .collect()
        })
        .collect())
}

// ── Encode side ──────────────────────────────────────────────────────────────

/// Flat tables re-derived from the live model for one side.
#[derive(Debug)]
pub struct FlatZones<'a> {
    /// Bag start of every header, terminal included.
    pub starts:     Vec<u16>,
    /// Bag table, terminal included.
    pub bags:       Vec<Bag>,
    /// Generators in zone order, terminal excluded.
    pub generators: Vec<&'a Generator>,
    /// Modulators in zone order, terminal excluded.
    pub modulators: Vec<&'a Modulator>,
}

/// Walk owners and their zones accumulating running zone, generator and
/// modulator totals; the final totals become the terminal indices.
pub fn flatten_zones<'a, I>(side: Side, owners: I) -> Result<FlatZones<'a>>
where
    I: IntoIterator<Item = &'a [Zone]>,
{
    let owners: Vec<&'a [Zone]> = owners.into_iter().collect();
    let starts = derive_starts(side.headers(), owners.iter().map(|z| z.len()))?;

    let zones: Vec<&'a Zone> = owners.iter().flat_map(|z| z.iter()).collect();
    let gen_starts = derive_starts(side.gens(), zones.iter().map(|z| z.generators.len()))?;
    let mod_starts = derive_starts(side.mods(), zones.iter().map(|z| z.modulators.len()))?;

    let bags = gen_starts
        .into_iter()
        .zip(mod_starts)
        .map(|(gen_start, mod_start)| Bag { gen_start, mod_start })
        .collect();

    Ok(FlatZones {
        starts,
        bags,
        generators: zones.iter().flat_map(|z| z.generators.iter()).collect(),
        modulators: zones.iter().flat_map(|z| z.modulators.iter()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GeneratorKind;
    use proptest::prelude::*;

    fn encode<T: Record>(records: &[T]) -> Vec<u8> {
        let mut out = Vec::new();
        for r in records {
            r.write(&mut out).unwrap();
        }
        out
    }

    #[test]
    fn counts_from_deltas() {
        assert_eq!(child_counts(FourCC::PHDR, &[0, 2, 5]).unwrap(), vec![2, 3]);
        assert_eq!(child_counts(FourCC::PHDR, &[0]).unwrap(), Vec::<usize>::new());
        assert_eq!(child_counts(FourCC::PHDR, &[]).unwrap(), Vec::<usize>::new());
    }

    #[test]
    fn decreasing_index_is_ordering_error() {
        let err = child_counts(FourCC::IBAG, &[0, 4, 3, 6]).unwrap_err();
        match err {
            SfError::Ordering { section, record, index, previous } => {
                assert_eq!(section, FourCC::IBAG);
                assert_eq!(record, 2);
                assert_eq!((index, previous), (3, 4));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn derive_starts_overflows_past_u16() {
        let err = derive_starts(FourCC::PGEN, [40_000, 30_000]).unwrap_err();
        assert!(matches!(err, SfError::Structural(_)));
    }

    #[test]
    fn links_two_level_deltas() {
        // preset 0 owns zones 0..1, preset 1 owns zones 1..3
        let bags = [
            Bag { gen_start: 0, mod_start: 0 },
            Bag { gen_start: 1, mod_start: 0 },
            Bag { gen_start: 1, mod_start: 1 },
            Bag { gen_start: 3, mod_start: 1 },
        ];
        let gens = encode(&[
            Generator::instrument(0),
            Generator::key_range(0, 60),
            Generator::instrument(1),
            Generator::terminal(),
        ]);
        let mut mod_records = vec![crate::modulator::Modulator::terminal(); 2];
        mod_records[0].dst = GeneratorKind::Pan;
        mod_records[0].amount = 500;
        let mods = encode(&mod_records);

        let zones = link_zones(Side::Preset, &[0, 1, 3], &bags, &gens, &mods).unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].len(), 1);
        assert_eq!(zones[1].len(), 2);
        assert_eq!(zones[0][0].instrument(), Some(0));
        assert!(zones[1][0].generators.is_empty());
        assert_eq!(zones[1][0].modulators[0].amount, 500);
        assert_eq!(zones[1][1].generators.len(), 2);
        assert_eq!(zones[1][1].instrument(), Some(1));
    }

    #[test]
    fn bag_count_must_match_zone_total() {
        let bags = [Bag::default(), Bag::default()];
        let err = link_zones(Side::Instrument, &[0, 2], &bags, &[0; 4], &[0; 10]).unwrap_err();
        assert!(matches!(err, SfError::SizeMismatch { section, .. } if section == FourCC::IBAG));
    }

    #[test]
    fn generator_table_without_terminal_is_size_mismatch() {
        let bags = [Bag { gen_start: 0, mod_start: 0 }, Bag { gen_start: 1, mod_start: 0 }];
        let gens = encode(&[Generator::sample(0)]);
        let err = link_zones(Side::Instrument, &[0, 1], &bags, &gens, &[0; 10]).unwrap_err();
        assert!(matches!(err, SfError::SizeMismatch { section, .. } if section == FourCC::IGEN));
    }

    #[test]
    fn flatten_appends_terminal_totals() {
        let a = vec![
            Zone::with_generators(vec![Generator::instrument(0)]),
            Zone::with_generators(vec![Generator::key_range(0, 10), Generator::instrument(1)]),
        ];
        let b = vec![Zone::default()];
        let flat = flatten_zones(Side::Preset, [a.as_slice(), b.as_slice()]).unwrap();
        assert_eq!(flat.starts, vec![0, 2, 3]);
        assert_eq!(
            flat.bags.iter().map(|b| b.gen_start).collect::<Vec<_>>(),
            vec![0, 1, 3, 3]
        );
        assert_eq!(flat.generators.len(), 3);
        assert!(flat.modulators.is_empty());
    }

    proptest! {
        #[test]
        fn derive_then_count_is_identity(counts in proptest::collection::vec(0usize..50, 0..40)) {
            let starts = derive_starts(FourCC::PBAG, counts.iter().copied()).unwrap();
            prop_assert_eq!(starts.len(), counts.len() + 1);
            prop_assert_eq!(child_counts(FourCC::PBAG, &starts).unwrap(), counts);
        }

        #[test]
        fn any_decrease_is_rejected(
            mut starts in proptest::collection::vec(0u16..1000, 2..30),
            at in any::<prop::sample::Index>(),
        ) {
            starts.sort_unstable();
            let i = at.index(starts.len() - 1) + 1;
            prop_assume!(starts[i - 1] > 0);
            starts[i] = starts[i - 1] - 1;
            let is_ordering_error = matches!(
                child_counts(FourCC::PHDR, &starts),
                Err(SfError::Ordering { .. })
            );
            prop_assert!(is_ordering_error);
        }
    }
}
