//! Synthetic MRC files for integration tests.

use std::path::Path;

/// Write a little-endian mode-2 (f32) MRC file.
///
/// `cell_x` is the x extent in ångström; the pixel size is `cell_x / nx` Å.
/// `ispg` 0 with `nz == 1` reads as a 2D image, `nz > 1` as a stack.
pub fn write_mrc(path: &Path, nx: i32, ny: i32, nz: i32, cell_x: f32, ispg: i32) {
    let mut bytes = vec![0u8; 1024];
    let put_i32 = |bytes: &mut Vec<u8>, word: usize, v: i32| {
        bytes[word * 4..word * 4 + 4].copy_from_slice(&v.to_le_bytes());
    };
    let put_f32 = |bytes: &mut Vec<u8>, word: usize, v: f32| {
        bytes[word * 4..word * 4 + 4].copy_from_slice(&v.to_le_bytes());
    };

    put_i32(&mut bytes, 0, nx);
    put_i32(&mut bytes, 1, ny);
    put_i32(&mut bytes, 2, nz);
    put_i32(&mut bytes, 3, 2);
    put_i32(&mut bytes, 7, nx);
    put_i32(&mut bytes, 8, ny);
    put_i32(&mut bytes, 9, nz);
    put_f32(&mut bytes, 10, cell_x);
    put_f32(&mut bytes, 11, cell_x / nx as f32 * ny as f32);
    put_f32(&mut bytes, 12, nz as f32);
    put_i32(&mut bytes, 22, ispg);
    bytes[208..212].copy_from_slice(b"MAP ");
    bytes[212..216].copy_from_slice(&[0x44, 0x44, 0x00, 0x00]);

    // Diagonal gradient with a per-section offset
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                let v = (x + y) as f32 + z as f32 * 10.0;
                bytes.extend_from_slice(&v.to_le_bytes());
            }
        }
    }
    std::fs::write(path, bytes).unwrap();
}
