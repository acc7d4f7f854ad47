//! Minimal MRC2014 reader.
//!
//! Reads the fixed 1024-byte header, skips the extended header, and decodes
//! the data block into `f32` samples. Only the fields the preview pipeline
//! needs are surfaced:
//!
//! | Word | Offset | Field |
//! |---|---|---|
//! | 1–3 | 0 | `nx`, `ny`, `nz` (columns, rows, sections) |
//! | 4 | 12 | `mode` (sample type) |
//! | 8–10 | 28 | `mx`, `my`, `mz` (sampling along each axis) |
//! | 11–13 | 40 | `cella` (cell dimensions in ångström) |
//! | 23 | 88 | `ispg` (space group; 401–630 marks a volume stack) |
//! | 24 | 92 | `nsymbt` (extended header length) |
//! | 53 | 208 | map id, must be `"MAP "` |
//! | 54 | 212 | machine stamp (byte order) |
//!
//! Supported modes: 0 (i8), 1 (i16), 2 (f32), 6 (u16), 12 (f16). Complex and
//! packed 4-bit modes are rejected.

use crate::types::Samples;
use std::path::Path;
use thiserror::Error;

pub const HEADER_LEN: usize = 1024;

const MAP_ID: &[u8; 4] = b"MAP ";
const MAP_ID_OFFSET: usize = 208;
const MACHINE_STAMP_OFFSET: usize = 212;
const VOLUME_STACK_SPACEGROUPS: std::ops::RangeInclusive<i32> = 401..=630;

#[derive(Error, Debug)]
pub enum MrcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("file is {0} bytes, shorter than the {HEADER_LEN}-byte MRC header")]
    TooShort(usize),
    #[error("map ID string not found - not an MRC file, or file is corrupt")]
    MissingMapId,
    #[error("invalid dimensions nx={nx} ny={ny} nz={nz}")]
    InvalidDimensions { nx: i32, ny: i32, nz: i32 },
    #[error("unsupported MRC mode {0}")]
    UnsupportedMode(i32),
    #[error("truncated data block: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },
    #[error("invalid header field {field}: {value}")]
    InvalidHeaderField { field: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

/// Sample encoding of the data block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Int8,
    Int16,
    Float32,
    UInt16,
    Float16,
}

impl Mode {
    pub fn from_code(code: i32) -> Result<Self, MrcError> {
        match code {
            0 => Ok(Mode::Int8),
            1 => Ok(Mode::Int16),
            2 => Ok(Mode::Float32),
            6 => Ok(Mode::UInt16),
            12 => Ok(Mode::Float16),
            other => Err(MrcError::UnsupportedMode(other)),
        }
    }

    pub fn bytes_per_sample(self) -> usize {
        match self {
            Mode::Int8 => 1,
            Mode::Int16 | Mode::UInt16 | Mode::Float16 => 2,
            Mode::Float32 => 4,
        }
    }
}

/// Cell dimensions in ångström.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellDimensions {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MrcHeader {
    pub nx: i32,
    pub ny: i32,
    pub nz: i32,
    pub mode: i32,
    pub mx: i32,
    pub my: i32,
    pub mz: i32,
    pub cella: CellDimensions,
    pub ispg: i32,
    pub nsymbt: i32,
    pub byte_order: ByteOrder,
}

impl MrcHeader {
    /// Native array shape, slowest axis first.
    ///
    /// - volume stack space groups → `[nz / mz, mz, ny, nx]`
    /// - `ispg == 0` with a single section → `[ny, nx]`
    /// - everything else → `[nz, ny, nx]`
    pub fn data_shape(&self) -> Result<Vec<usize>, MrcError> {
        let (nx, ny, nz) = self.dimensions()?;
        if VOLUME_STACK_SPACEGROUPS.contains(&self.ispg) {
            if self.mz <= 0 || nz % self.mz as usize != 0 {
                return Err(MrcError::InvalidHeaderField {
                    field: "mz",
                    value: self.mz.to_string(),
                });
            }
            let mz = self.mz as usize;
            Ok(vec![nz / mz, mz, ny, nx])
        } else if self.ispg == 0 && nz == 1 {
            Ok(vec![ny, nx])
        } else {
            Ok(vec![nz, ny, nx])
        }
    }

    fn dimensions(&self) -> Result<(usize, usize, usize), MrcError> {
        if self.nx <= 0 || self.ny <= 0 || self.nz <= 0 {
            return Err(MrcError::InvalidDimensions {
                nx: self.nx,
                ny: self.ny,
                nz: self.nz,
            });
        }
        Ok((self.nx as usize, self.ny as usize, self.nz as usize))
    }
}

/// A parsed MRC file: header plus decoded samples.
#[derive(Debug, Clone, PartialEq)]
pub struct MrcFile {
    pub header: MrcHeader,
    pub samples: Samples,
}

/// Read and decode an MRC file from disk.
pub fn read_mrc(path: &Path) -> Result<MrcFile, MrcError> {
    let bytes = std::fs::read(path)?;
    parse_mrc(&bytes)
}

/// Decode an MRC file held in memory.
pub fn parse_mrc(bytes: &[u8]) -> Result<MrcFile, MrcError> {
    let header = parse_header(bytes)?;
    let mode = Mode::from_code(header.mode)?;
    let shape = header.data_shape()?;

    let count = shape
        .iter()
        .try_fold(1usize, |acc, &n| acc.checked_mul(n))
        .ok_or(MrcError::InvalidDimensions {
            nx: header.nx,
            ny: header.ny,
            nz: header.nz,
        })?;
    let expected = count
        .checked_mul(mode.bytes_per_sample())
        .ok_or(MrcError::InvalidDimensions {
            nx: header.nx,
            ny: header.ny,
            nz: header.nz,
        })?;

    if header.nsymbt < 0 {
        return Err(MrcError::InvalidHeaderField {
            field: "nsymbt",
            value: header.nsymbt.to_string(),
        });
    }
    let start = HEADER_LEN + header.nsymbt as usize;
    let available = bytes.len().saturating_sub(start);
    if available < expected {
        return Err(MrcError::Truncated {
            expected,
            found: available,
        });
    }

    let data = decode_samples(&bytes[start..start + expected], mode, header.byte_order);
    Ok(MrcFile {
        header,
        samples: Samples { shape, data },
    })
}

/// Parse the fixed-size header.
pub fn parse_header(bytes: &[u8]) -> Result<MrcHeader, MrcError> {
    if bytes.len() < HEADER_LEN {
        return Err(MrcError::TooShort(bytes.len()));
    }
    if &bytes[MAP_ID_OFFSET..MAP_ID_OFFSET + 4] != MAP_ID {
        return Err(MrcError::MissingMapId);
    }

    let order = detect_byte_order(bytes);
    let int = |word: usize| read_i32(bytes, word * 4, order);
    let float = |word: usize| read_f32(bytes, word * 4, order);

    Ok(MrcHeader {
        nx: int(0),
        ny: int(1),
        nz: int(2),
        mode: int(3),
        mx: int(7),
        my: int(8),
        mz: int(9),
        cella: CellDimensions {
            x: float(10),
            y: float(11),
            z: float(12),
        },
        ispg: int(22),
        nsymbt: int(23),
        byte_order: order,
    })
}

/// Byte order from the machine stamp.
///
/// `0x44` in the first stamp byte is little endian, `0x11` big endian. Files
/// written by older tools sometimes carry a zeroed stamp; for those the order
/// whose `mode` word decodes to a known mode wins, little endian by default.
fn detect_byte_order(bytes: &[u8]) -> ByteOrder {
    match bytes[MACHINE_STAMP_OFFSET] {
        0x44 => ByteOrder::Little,
        0x11 => ByteOrder::Big,
        _ => {
            let plausible = |code: i32| matches!(code, 0..=4 | 6 | 12 | 101);
            if !plausible(read_i32(bytes, 12, ByteOrder::Little))
                && plausible(read_i32(bytes, 12, ByteOrder::Big))
            {
                ByteOrder::Big
            } else {
                ByteOrder::Little
            }
        }
    }
}

fn word(bytes: &[u8], offset: usize) -> [u8; 4] {
    [
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ]
}

fn read_i32(bytes: &[u8], offset: usize, order: ByteOrder) -> i32 {
    match order {
        ByteOrder::Little => i32::from_le_bytes(word(bytes, offset)),
        ByteOrder::Big => i32::from_be_bytes(word(bytes, offset)),
    }
}

fn read_f32(bytes: &[u8], offset: usize, order: ByteOrder) -> f32 {
    match order {
        ByteOrder::Little => f32::from_le_bytes(word(bytes, offset)),
        ByteOrder::Big => f32::from_be_bytes(word(bytes, offset)),
    }
}

fn read_u16(pair: &[u8], order: ByteOrder) -> u16 {
    match order {
        ByteOrder::Little => u16::from_le_bytes([pair[0], pair[1]]),
        ByteOrder::Big => u16::from_be_bytes([pair[0], pair[1]]),
    }
}

/// Widen every sample of the data block to `f32`.
fn decode_samples(data: &[u8], mode: Mode, order: ByteOrder) -> Vec<f32> {
    match mode {
        Mode::Int8 => data.iter().map(|&b| b as i8 as f32).collect(),
        Mode::Int16 => data
            .chunks_exact(2)
            .map(|c| read_u16(c, order) as i16 as f32)
            .collect(),
        Mode::UInt16 => data
            .chunks_exact(2)
            .map(|c| read_u16(c, order) as f32)
            .collect(),
        Mode::Float16 => data
            .chunks_exact(2)
            .map(|c| f16_to_f32(read_u16(c, order)))
            .collect(),
        Mode::Float32 => data
            .chunks_exact(4)
            .map(|c| read_f32(c, 0, order))
            .collect(),
    }
}

/// IEEE 754 binary16 → binary32.
fn f16_to_f32(bits: u16) -> f32 {
    let sign = ((bits >> 15) & 0x1) as u32;
    let exponent = ((bits >> 10) & 0x1f) as u32;
    let fraction = (bits & 0x3ff) as u32;

    let out = match (exponent, fraction) {
        (0, 0) => sign << 31,
        (0, _) => {
            // Subnormal: value = fraction * 2^-24
            let magnitude = fraction as f32 * f32::powi(2.0, -24);
            return if sign == 1 { -magnitude } else { magnitude };
        }
        (0x1f, 0) => (sign << 31) | 0x7f80_0000,
        (0x1f, _) => (sign << 31) | 0x7fc0_0000 | (fraction << 13),
        _ => (sign << 31) | ((exponent + 112) << 23) | (fraction << 13),
    };
    f32::from_bits(out)
}
