//! Hand-assembled SoundFont byte images for the integration tests.
#![allow(dead_code)]

use std::io::Write;
use tempfile::NamedTempFile;

pub fn chunk(id: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = id.to_vec();
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

pub fn container(id: &[u8; 4], signature: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    let mut payload = signature.to_vec();
    for c in children {
        payload.extend_from_slice(c);
    }
    chunk(id, &payload)
}

fn name(s: impl AsRef<[u8]>) -> [u8; 20] {
    let s = s.as_ref();
    let mut out = [0u8; 20];
    out[..s.len()].copy_from_slice(s);
    out
}

// ── Records ──────────────────────────────────────────────────────────────────

pub fn phdr(n: impl AsRef<[u8]>, preset: u16, bank: u16, bag: u16) -> Vec<u8> {
    let mut out = name(n).to_vec();
    out.extend_from_slice(&preset.to_le_bytes());
    out.extend_from_slice(&bank.to_le_bytes());
    out.extend_from_slice(&bag.to_le_bytes());
    out.extend_from_slice(&[0u8; 12]); // library, genre, morphology
    out
}

pub fn inst(n: impl AsRef<[u8]>, bag: u16) -> Vec<u8> {
    let mut out = name(n).to_vec();
    out.extend_from_slice(&bag.to_le_bytes());
    out
}

pub fn bag(gen_start: u16, mod_start: u16) -> Vec<u8> {
    [gen_start.to_le_bytes(), mod_start.to_le_bytes()].concat()
}

pub fn gen(op: u16, amount: [u8; 2]) -> Vec<u8> {
    [op.to_le_bytes(), amount].concat()
}

pub fn gen_signed(op: u16, amount: i16) -> Vec<u8> {
    gen(op, amount.to_le_bytes())
}

pub fn modulator(src: u16, dst: u16, amount: i16, amt_src: u16, transform: u16) -> Vec<u8> {
    [
        src.to_le_bytes(),
        dst.to_le_bytes(),
        amount.to_le_bytes(),
        amt_src.to_le_bytes(),
        transform.to_le_bytes(),
    ]
    .concat()
}

pub struct Shdr<'a> {
    pub name:       &'a str,
    pub start:      u32,
    pub end:        u32,
    pub loop_start: u32,
    pub loop_end:   u32,
    pub rate:       u32,
    pub pitch:      u8,
    pub correction: i8,
    pub link:       u16,
    pub kind:       u16,
}

impl Shdr<'_> {
    pub fn bytes(&self) -> Vec<u8> {
        let mut out = name(self.name).to_vec();
        for v in [self.start, self.end, self.loop_start, self.loop_end, self.rate] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out.push(self.pitch);
        out.push(self.correction as u8);
        out.extend_from_slice(&self.link.to_le_bytes());
        out.extend_from_slice(&self.kind.to_le_bytes());
        out
    }

    pub fn terminal() -> Vec<u8> {
        let mut out = name("EOS").to_vec();
        out.extend_from_slice(&[0u8; 26]);
        out
    }
}

// ── Tables ───────────────────────────────────────────────────────────────────

/// The nine `pdta` tables, each a list of records terminal included.
#[derive(Clone, Default)]
pub struct Pdta {
    pub phdr: Vec<Vec<u8>>,
    pub pbag: Vec<Vec<u8>>,
    pub pmod: Vec<Vec<u8>>,
    pub pgen: Vec<Vec<u8>>,
    pub inst: Vec<Vec<u8>>,
    pub ibag: Vec<Vec<u8>>,
    pub imod: Vec<Vec<u8>>,
    pub igen: Vec<Vec<u8>>,
    pub shdr: Vec<Vec<u8>>,
}

impl Pdta {
    /// Tables of a bank with no presets, instruments or samples.
    pub fn empty() -> Self {
        Self {
            phdr: vec![phdr("EOP", 0, 0, 0)],
            pbag: vec![bag(0, 0)],
            pmod: vec![vec![0u8; 10]],
            pgen: vec![vec![0u8; 4]],
            inst: vec![inst("EOI", 0)],
            ibag: vec![bag(0, 0)],
            imod: vec![vec![0u8; 10]],
            igen: vec![vec![0u8; 4]],
            shdr: vec![Shdr::terminal()],
        }
    }

    /// Chunks in writing order.
    pub fn chunks(&self) -> Vec<Vec<u8>> {
        [
            (b"phdr", &self.phdr),
            (b"pbag", &self.pbag),
            (b"pmod", &self.pmod),
            (b"pgen", &self.pgen),
            (b"inst", &self.inst),
            (b"ibag", &self.ibag),
            (b"imod", &self.imod),
            (b"igen", &self.igen),
            (b"shdr", &self.shdr),
        ]
        .into_iter()
        .map(|(id, records)| chunk(id, &records.concat()))
        .collect()
    }
}

pub fn bank(info: Vec<Vec<u8>>, smpl: &[u8], pdta: &Pdta) -> Vec<u8> {
    container(b"RIFF", b"sfbk", &[
        container(b"LIST", b"INFO", &info),
        container(b"LIST", b"sdta", &[chunk(b"smpl", smpl)]),
        container(b"LIST", b"pdta", &pdta.chunks()),
    ])
}

pub fn pcm(frames: u32) -> Vec<u8> {
    (0..frames)
        .flat_map(|i| (i as i16).wrapping_mul(37).to_le_bytes())
        .collect()
}

pub fn temp_file(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

/// Frame count of the `smpl` chunk in [`canonical_bank`].
pub const CANONICAL_FRAMES: u32 = 1700;

/// A small bank laid out exactly the way the encoder writes one, so decoding
/// and re-encoding it must reproduce it byte for byte.
///
/// * preset "Piano" (0:0): one zone, key range 0-127, instrument 0
/// * preset "Strings" (0:48): global zone with pan and one modulator, then
///   a zone naming instrument 1
/// * instruments "PianoInst" (sample 0), "StringInst" (vel range, sample 1)
///   and "Orphan" (sample 2, no preset uses it)
/// * samples A 0..1000, B 1000..1600 looping 1400..1500, C 1600..1700
pub fn canonical_bank() -> Vec<u8> {
    let info = vec![
        chunk(b"ifil", &[2, 0, 1, 0]),
        chunk(b"INAM", b"Minimal\0"),
        chunk(b"ISFT", b"sfbank\0\0"),
    ];

    let pdta = Pdta {
        phdr: vec![phdr("Piano", 0, 0, 0), phdr("Strings", 48, 0, 1), phdr("EOP", 0, 0, 3)],
        pbag: vec![bag(0, 0), bag(2, 0), bag(3, 1), bag(4, 1)],
        pmod: vec![modulator(0x0502, 17, 50, 0, 0), vec![0u8; 10]],
        pgen: vec![gen(43, [0, 127]), gen(41, 0u16.to_le_bytes()), gen_signed(17, -200),
                   gen(41, 1u16.to_le_bytes()), vec![0u8; 4]],
        inst: vec![inst("PianoInst", 0), inst("StringInst", 1), inst("Orphan", 2), inst("EOI", 3)],
        ibag: vec![bag(0, 0), bag(1, 0), bag(3, 0), bag(4, 0)],
        imod: vec![vec![0u8; 10]],
        igen: vec![gen(53, 0u16.to_le_bytes()), gen(44, [0, 100]), gen(53, 1u16.to_le_bytes()),
                   gen(53, 2u16.to_le_bytes()), vec![0u8; 4]],
        shdr: vec![
            Shdr { name: "A", start: 0, end: 1000, loop_start: 200, loop_end: 800,
                   rate: 44100, pitch: 60, correction: 0, link: 0, kind: 1 }.bytes(),
            Shdr { name: "B", start: 1000, end: 1600, loop_start: 1400, loop_end: 1500,
                   rate: 22050, pitch: 69, correction: -5, link: 0, kind: 1 }.bytes(),
            Shdr { name: "C", start: 1600, end: 1700, loop_start: 1610, loop_end: 1690,
                   rate: 44100, pitch: 72, correction: 0, link: 0, kind: 1 }.bytes(),
            Shdr::terminal(),
        ],
    };

    bank(info, &pcm(CANONICAL_FRAMES), &pdta)
}

/// Minimal INFO list for banks that only exercise `pdta`.
pub fn plain_info() -> Vec<Vec<u8>> {
    vec![chunk(b"ifil", &[2, 0, 1, 0])]
}
