use std::io::Write;
use std::path::{Path, PathBuf};

use antsreg::Session;
use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;

const HEADER_SIZE: usize = 348;
const VOX_OFFSET: usize = 352;

const DT_UINT8: i16 = 2;
const DT_FLOAT32: i16 = 16;

/// Builds an uncompressed single-file NIfTI-1 header for `dim`.
fn nifti_header(dim: &[usize], datatype: i16, bitpix: i16) -> Vec<u8> {
    assert!((1..=7).contains(&dim.len()), "NIfTI supports 1 to 7 dimensions");

    let mut header = vec![0u8; VOX_OFFSET];
    header[0..4].copy_from_slice(&(HEADER_SIZE as i32).to_le_bytes());

    let mut dims = [1i16; 8];
    dims[0] = dim.len() as i16;
    for (slot, &size) in dims[1..].iter_mut().zip(dim) {
        *slot = size as i16;
    }
    for (i, value) in dims.iter().enumerate() {
        let offset = 40 + i * 2;
        header[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }

    header[70..72].copy_from_slice(&datatype.to_le_bytes());
    header[72..74].copy_from_slice(&bitpix.to_le_bytes());

    // qfac and unit voxel spacing
    for i in 0..8 {
        let offset = 76 + i * 4;
        header[offset..offset + 4].copy_from_slice(&1.0f32.to_le_bytes());
    }

    header[108..112].copy_from_slice(&(VOX_OFFSET as f32).to_le_bytes());
    header[112..116].copy_from_slice(&1.0f32.to_le_bytes());
    header[344..348].copy_from_slice(b"n+1\0");
    // bytes 348..352 are the zeroed extension flag
    header
}

fn nifti_f32_bytes(dim: &[usize], data: &[f32]) -> Vec<u8> {
    assert_eq!(dim.iter().product::<usize>(), data.len());
    let mut bytes = nifti_header(dim, DT_FLOAT32, 32);
    for value in data {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Writes a float32 `.nii` file. `data` is in file order (x fastest).
pub fn write_nifti_f32(path: &Path, dim: &[usize], data: &[f32]) -> anyhow::Result<()> {
    std::fs::write(path, nifti_f32_bytes(dim, data))?;
    Ok(())
}

/// Writes a gzip-compressed float32 `.nii.gz` file.
pub fn write_nifti_f32_gz(path: &Path, dim: &[usize], data: &[f32]) -> anyhow::Result<()> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&nifti_f32_bytes(dim, data))?;
    std::fs::write(path, encoder.finish()?)?;
    Ok(())
}

/// Writes a uint8 `.nii` file. `data` is in file order (x fastest).
pub fn write_nifti_u8(path: &Path, dim: &[usize], data: &[u8]) -> anyhow::Result<()> {
    assert_eq!(dim.iter().product::<usize>(), data.len());
    let mut bytes = nifti_header(dim, DT_UINT8, 8);
    bytes.extend_from_slice(data);
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Writes a float32 volume into `dir` and returns its path.
pub fn volume_file(dir: &TempDir, name: &str, dim: &[usize], data: &[f32]) -> PathBuf {
    let path = dir.path().join(name);
    write_nifti_f32(&path, dim, data).expect("Failed to write test volume");
    path
}

/// `value(x, y, z)` laid out in file order for a `width x height x depth` volume.
pub fn volume_data(
    (width, height, depth): (usize, usize, usize),
    value: impl Fn(usize, usize, usize) -> f32,
) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height * depth);
    for z in 0..depth {
        for y in 0..height {
            for x in 0..width {
                data.push(value(x, y, z));
            }
        }
    }
    data
}

pub const FIXED: &str = "/data/fixed.nii.gz";
pub const MOVING: &str = "/data/moving.nii.gz";

/// Session with one fixed and the given moving images.
pub fn make_session(moving: &[&str]) -> Session {
    let mut session = Session::new();
    session.set_fixed_image(FIXED);
    session.add_moving_images(moving.iter().copied());
    session
}
