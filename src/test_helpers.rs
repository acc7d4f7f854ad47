//! Shared test utilities: synthetic MRC files.
//!
//! ```rust
//! use crate::test_helpers::MrcBuilder;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let path = tmp.path().join("stack.mrc");
//! MrcBuilder::new(64, 48, 3).cell(64.0, 48.0, 3.0).write(&path);
//! ```

use crate::imaging::mrc_parser::HEADER_LEN;
use std::path::Path;

/// Builds the bytes of an MRC2014 file.
///
/// Defaults: mode 2 (f32), little endian, `mx/my/mz` equal to the dimensions,
/// `cella` equal to the dimensions (1 Å per pixel), space group 0, no
/// extended header, samples ramping `0, 1, 2, ...` modulo 251.
pub struct MrcBuilder {
    nx: i32,
    ny: i32,
    nz: i32,
    dims_override: Option<(i32, i32, i32)>,
    mode: i32,
    cella: [f32; 3],
    sampling: [i32; 3],
    ispg: i32,
    extended: usize,
    big_endian: bool,
    samples: Option<Vec<f32>>,
    raw_data: Option<Vec<u8>>,
}

impl MrcBuilder {
    pub fn new(nx: i32, ny: i32, nz: i32) -> Self {
        Self {
            nx,
            ny,
            nz,
            dims_override: None,
            mode: 2,
            cella: [nx as f32, ny as f32, nz as f32],
            sampling: [nx, ny, nz],
            ispg: 0,
            extended: 0,
            big_endian: false,
            samples: None,
            raw_data: None,
        }
    }

    pub fn mode(mut self, mode: i32) -> Self {
        self.mode = mode;
        self
    }

    pub fn cell(mut self, x: f32, y: f32, z: f32) -> Self {
        self.cella = [x, y, z];
        self
    }

    pub fn sampling(mut self, mx: i32, my: i32, mz: i32) -> Self {
        self.sampling = [mx, my, mz];
        self
    }

    pub fn spacegroup(mut self, ispg: i32) -> Self {
        self.ispg = ispg;
        self
    }

    pub fn extended_header(mut self, len: usize) -> Self {
        self.extended = len;
        self
    }

    pub fn big_endian(mut self) -> Self {
        self.big_endian = true;
        self
    }

    /// Header dimensions that differ from the generated data block.
    pub fn dims_override(mut self, nx: i32, ny: i32, nz: i32) -> Self {
        self.dims_override = Some((nx, ny, nz));
        self
    }

    /// Sample values, encoded according to the mode.
    pub fn samples(mut self, samples: Vec<f32>) -> Self {
        self.samples = Some(samples);
        self
    }

    /// Data block bytes written verbatim.
    pub fn raw_data(mut self, data: Vec<u8>) -> Self {
        self.raw_data = Some(data);
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut header = vec![0u8; HEADER_LEN];
        let (nx, ny, nz) = self.dims_override.unwrap_or((self.nx, self.ny, self.nz));

        let ints = [
            (0, nx),
            (1, ny),
            (2, nz),
            (3, self.mode),
            (7, self.sampling[0]),
            (8, self.sampling[1]),
            (9, self.sampling[2]),
            (22, self.ispg),
            (23, self.extended as i32),
        ];
        for (word, value) in ints {
            let bytes = if self.big_endian {
                value.to_be_bytes()
            } else {
                value.to_le_bytes()
            };
            header[word * 4..word * 4 + 4].copy_from_slice(&bytes);
        }
        for (i, value) in self.cella.iter().enumerate() {
            let bytes = if self.big_endian {
                value.to_be_bytes()
            } else {
                value.to_le_bytes()
            };
            header[40 + i * 4..44 + i * 4].copy_from_slice(&bytes);
        }
        header[208..212].copy_from_slice(b"MAP ");
        let stamp: [u8; 4] = if self.big_endian {
            [0x11, 0x11, 0x00, 0x00]
        } else {
            [0x44, 0x44, 0x00, 0x00]
        };
        header[212..216].copy_from_slice(&stamp);

        let mut bytes = header;
        bytes.extend(std::iter::repeat_n(0u8, self.extended));
        bytes.extend(self.data_block());
        bytes
    }

    pub fn write(&self, path: &Path) {
        std::fs::write(path, self.to_bytes()).unwrap();
    }

    fn data_block(&self) -> Vec<u8> {
        if let Some(raw) = &self.raw_data {
            return raw.clone();
        }
        let count = (self.nx * self.ny * self.nz) as usize;
        let samples = self
            .samples
            .clone()
            .unwrap_or_else(|| (0..count).map(|i| (i % 251) as f32).collect());

        let be = self.big_endian;
        samples
            .iter()
            .flat_map(|&v| -> Vec<u8> {
                match self.mode {
                    0 => vec![v as i8 as u8],
                    1 => {
                        let v = v as i16;
                        (if be { v.to_be_bytes() } else { v.to_le_bytes() }).to_vec()
                    }
                    6 => {
                        let v = v as u16;
                        (if be { v.to_be_bytes() } else { v.to_le_bytes() }).to_vec()
                    }
                    _ => (if be { v.to_be_bytes() } else { v.to_le_bytes() }).to_vec(),
                }
            })
            .collect()
    }
}
