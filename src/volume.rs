//! NIfTI volumes and axial slice extraction.

use std::path::Path;

use image::{GrayImage, Luma};
use ndarray::{Array3, ArrayD, Axis, Ix3, IxDyn};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// How voxel intensities are turned into 8-bit gray levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IntensityMapping {
    /// Saturating cast: values below 0 become 0, above 255 become 255.
    #[default]
    Clamp,
    /// Stretch the volume's min..max range onto 0..255.
    MinMax,
}

impl IntensityMapping {
    pub const ALL: [IntensityMapping; 2] = [IntensityMapping::Clamp, IntensityMapping::MinMax];
}

impl std::fmt::Display for IntensityMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntensityMapping::Clamp => write!(f, "Clamp to 0-255"),
            IntensityMapping::MinMax => write!(f, "Stretch min-max"),
        }
    }
}

/// Whether `path` is named like a NIfTI file (`.nii` or `.nii.gz`).
pub fn is_nifti_path(path: &Path) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    let name = name.to_string_lossy().to_ascii_lowercase();
    name.ends_with(".nii") || name.ends_with(".nii.gz")
}

/// A scalar volume indexed `[x, y, z]`.
#[derive(Clone)]
pub struct Volume {
    voxels: Array3<f32>,
    min: f32,
    max: f32,
}

impl std::fmt::Debug for Volume {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Volume")
            .field("dim", &self.dim())
            .field("min", &self.min)
            .field("max", &self.max)
            .finish()
    }
}

impl Volume {
    /// Read a `.nii` or `.nii.gz` file.
    ///
    /// Volumes with more than three dimensions keep the first index of every
    /// trailing axis; 2D images become a volume of depth 1.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let start = std::time::Instant::now();

        let nifti_error = |source| Error::Nifti {
            path: path.to_path_buf(),
            source,
        };
        let object = ReaderOptions::new().read_file(path).map_err(nifti_error)?;
        let array = object
            .into_volume()
            .into_ndarray::<f32>()
            .map_err(nifti_error)?;

        let shape = array.shape().to_vec();
        let data: Vec<f32> = array.iter().copied().collect();
        let mut voxels = ArrayD::from_shape_vec(IxDyn(&shape), data)?;

        while voxels.ndim() > 3 {
            voxels = voxels.index_axis_move(Axis(3), 0);
        }
        let voxels = match voxels.ndim() {
            3 => voxels,
            2 => voxels.insert_axis(Axis(2)),
            _ => {
                return Err(Error::UnsupportedShape {
                    path: path.to_path_buf(),
                    shape,
                });
            }
        };
        let volume = Self::from_array(voxels.into_dimensionality::<Ix3>()?);

        log::info!(
            "Loaded {} in {:?} - size {:?}",
            path.display(),
            start.elapsed(),
            volume.dim()
        );
        Ok(volume)
    }

    pub fn from_array(voxels: Array3<f32>) -> Self {
        let (min, max) = voxels
            .iter()
            .filter(|v| !v.is_nan())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        Self { voxels, min, max }
    }

    /// `(width, height, depth)`
    pub fn dim(&self) -> (usize, usize, usize) {
        self.voxels.dim()
    }

    pub fn depth(&self) -> usize {
        self.voxels.dim().2
    }

    pub fn voxels(&self) -> &Array3<f32> {
        &self.voxels
    }

    /// Axial slice `z` as an image of `width x height` where pixel `(x, y)`
    /// is voxel `[x, y, z]`.
    pub fn slice(&self, z: usize, mapping: IntensityMapping) -> Result<GrayImage> {
        let (width, height, depth) = self.voxels.dim();
        if z >= depth {
            return Err(Error::SliceOutOfRange { z, depth });
        }

        let plane = self.voxels.index_axis(Axis(2), z);
        Ok(GrayImage::from_fn(width as u32, height as u32, |x, y| {
            Luma([self.gray_level(plane[[x as usize, y as usize]], mapping)])
        }))
    }

    fn gray_level(&self, value: f32, mapping: IntensityMapping) -> u8 {
        match mapping {
            // float-to-int `as` saturates and maps NaN to 0
            IntensityMapping::Clamp => value as u8,
            IntensityMapping::MinMax => {
                let range = self.max - self.min;
                if range > 0.0 && range.is_finite() {
                    ((value - self.min) / range * 255.0).round() as u8
                } else {
                    0
                }
            }
        }
    }
}
