//! Shared fixtures for integration tests.
//!
//! [`MovFixture`] writes a small but structurally faithful QuickTime file:
//! a 24-byte `ftyp`, an `mdat` whose chunks are separated by filler, and a
//! `moov` carrying `mvhd`, `stsz` and `co64` nested the way a recorder writes
//! them.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// 2023-12-31T05:20:00Z in seconds since 1904-01-01.
pub const CREATION_TIME_RAW: u32 = 3_786_844_800;
pub const CREATION_TIMESTAMP: i64 = 1_704_000_000;

const FILLER: u8 = 0xEE;

pub struct MovFixture {
    frame_sizes: Vec<u32>,
    samples_per_chunk: usize,
    gap: usize,
    extended_mdat: bool,
    creation_time: u32,
    file_name: String,
}

/// A built file plus what a reader should find in it.
pub struct BuiltMov {
    pub bytes: Vec<u8>,
    pub frames: Vec<Vec<u8>>,
    pub offsets: Vec<u64>,
    pub mdat_size: u64,
    pub moov_size: u64,
    pub file_name: String,
}

impl BuiltMov {
    pub fn write_to(&self, dir: &Path) -> PathBuf {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes).expect("failed to write fixture");
        path
    }

    pub fn frame_count(&self) -> u32 {
        self.frames.len() as u32
    }
}

impl MovFixture {
    pub fn new(frame_sizes: Vec<u32>) -> Self {
        Self {
            frame_sizes,
            samples_per_chunk: 5,
            gap: 7,
            extended_mdat: false,
            creation_time: CREATION_TIME_RAW,
            file_name: "CAMHDA301-20231231T052000Z.mov".to_string(),
        }
    }

    /// `count` frames of varying size.
    pub fn with_frames(count: usize) -> Self {
        Self::new((0..count).map(|i| 40 + (i as u32 * 13) % 60).collect())
    }

    pub fn samples_per_chunk(mut self, run: usize) -> Self {
        self.samples_per_chunk = run;
        self
    }

    pub fn extended_mdat(mut self) -> Self {
        self.extended_mdat = true;
        self
    }

    pub fn creation_time(mut self, raw: u32) -> Self {
        self.creation_time = raw;
        self
    }

    pub fn file_name(mut self, name: &str) -> Self {
        self.file_name = name.to_string();
        self
    }

    pub fn build(&self) -> BuiltMov {
        let frames: Vec<Vec<u8>> = self
            .frame_sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| frame_payload(i, size as usize))
            .collect();

        let mdat_header_len = if self.extended_mdat { 16 } else { 8 };
        let mdat_start = 24usize;

        let mut payload = Vec::new();
        let mut chunk_offsets = Vec::new();
        let mut offsets = Vec::new();
        for chunk in frames.chunks(self.samples_per_chunk) {
            payload.extend(std::iter::repeat(FILLER).take(self.gap));
            chunk_offsets.push((mdat_start + mdat_header_len + payload.len()) as u64);
            for frame in chunk {
                offsets.push((mdat_start + mdat_header_len + payload.len()) as u64);
                payload.extend_from_slice(frame);
            }
        }
        payload.extend(std::iter::repeat(FILLER).take(self.gap));

        let mut bytes = ftyp();

        let mdat_size = (mdat_header_len + payload.len()) as u64;
        if self.extended_mdat {
            bytes.extend_from_slice(&1u32.to_be_bytes());
            bytes.extend_from_slice(b"mdat");
            bytes.extend_from_slice(&mdat_size.to_be_bytes());
        } else {
            bytes.extend_from_slice(&(mdat_size as u32).to_be_bytes());
            bytes.extend_from_slice(b"mdat");
        }
        bytes.extend_from_slice(&payload);

        let moov = moov(self.creation_time, &self.frame_sizes, &chunk_offsets);
        let moov_size = moov.len() as u64;
        bytes.extend_from_slice(&moov);

        BuiltMov {
            bytes,
            frames,
            offsets,
            mdat_size,
            moov_size,
            file_name: self.file_name.clone(),
        }
    }
}

/// Deterministic, frame-specific content.
pub fn frame_payload(index: usize, size: usize) -> Vec<u8> {
    (0..size)
        .map(|j| ((index * 31 + j * 7) % 251) as u8)
        .collect()
}

fn atom(tag: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 8);
    out.extend_from_slice(&((body.len() + 8) as u32).to_be_bytes());
    out.extend_from_slice(tag);
    out.extend_from_slice(body);
    out
}

fn ftyp() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(b"qt  ");
    body.extend_from_slice(&0x0200u32.to_be_bytes());
    body.extend_from_slice(b"qt  ");
    body.extend_from_slice(&[0u8; 4]);
    atom(b"ftyp", &body)
}

fn moov(creation_time: u32, sizes: &[u32], chunk_offsets: &[u64]) -> Vec<u8> {
    // mvhd: version/flags, creation, modification, timescale, duration, rest zero.
    let mut mvhd = Vec::new();
    mvhd.extend_from_slice(&[0u8; 4]);
    mvhd.extend_from_slice(&creation_time.to_be_bytes());
    mvhd.extend_from_slice(&creation_time.to_be_bytes());
    mvhd.extend_from_slice(&60_000u32.to_be_bytes());
    mvhd.extend_from_slice(&(sizes.len() as u32 * 1001).to_be_bytes());
    mvhd.extend_from_slice(&[0u8; 80]);

    let mut stsz = Vec::new();
    stsz.extend_from_slice(&[0u8; 4]);
    stsz.extend_from_slice(&0u32.to_be_bytes());
    stsz.extend_from_slice(&(sizes.len() as u32).to_be_bytes());
    for size in sizes {
        stsz.extend_from_slice(&size.to_be_bytes());
    }

    let mut co64 = Vec::new();
    co64.extend_from_slice(&[0u8; 4]);
    co64.extend_from_slice(&(chunk_offsets.len() as u32).to_be_bytes());
    for offset in chunk_offsets {
        co64.extend_from_slice(&offset.to_be_bytes());
    }

    let mut tables = atom(b"stsz", &stsz);
    tables.extend(atom(b"co64", &co64));
    let stbl = atom(b"stbl", &tables);
    let minf = atom(b"minf", &stbl);
    let mdia = atom(b"mdia", &minf);

    let mut body = atom(b"mvhd", &mvhd);
    body.extend(atom(b"trak", &mdia));
    atom(b"moov", &body)
}
