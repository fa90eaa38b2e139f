use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors raised while preparing, running or previewing a registration.
#[derive(Error, Debug)]
pub enum Error {
    #[error("No fixed image selected")]
    MissingFixedImage,

    #[error("No moving image selected")]
    MissingMovingImage,

    #[error("Channel {index} is out of range ({len} channels loaded)")]
    ChannelOutOfRange { index: usize, len: usize },

    #[error("Failed to read NIfTI volume {path:?}")]
    Nifti {
        path: PathBuf,
        #[source]
        source: nifti::NiftiError,
    },

    #[error("Volume {path:?} has unsupported shape {shape:?}")]
    UnsupportedShape { path: PathBuf, shape: Vec<usize> },

    #[error("Invalid volume layout")]
    Layout(#[from] ndarray::ShapeError),

    #[error("Slice {z} is out of range (depth {depth})")]
    SliceOutOfRange { z: usize, depth: usize },

    #[error("Image sizes differ: {left:?} vs {right:?}")]
    SizeMismatch {
        left: (u32, u32),
        right: (u32, u32),
    },

    #[error("Failed to start {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}")]
    ToolFailed { status: ExitStatus, command: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
