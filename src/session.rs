use std::path::{Path, PathBuf};

use crate::errors::{Error, Result};

/// Image paths taking part in one registration.
///
/// Several moving images can be loaded as channels of the same subject;
/// only the registration channel is handed to the external tool.
#[derive(Debug, Clone, Default)]
pub struct Session {
    fixed_image: Option<PathBuf>,
    moving_images: Vec<PathBuf>,
    warped_images: Vec<PathBuf>,
    registration_channel: usize,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fixed_image(&self) -> Option<&Path> {
        self.fixed_image.as_deref()
    }

    pub fn set_fixed_image(&mut self, path: impl Into<PathBuf>) {
        self.fixed_image = Some(path.into());
    }

    pub fn moving_images(&self) -> &[PathBuf] {
        &self.moving_images
    }

    pub fn warped_images(&self) -> &[PathBuf] {
        &self.warped_images
    }

    pub fn registration_channel(&self) -> usize {
        self.registration_channel
    }

    /// Append moving images, skipping paths already loaded.
    /// Returns the number of paths actually added.
    pub fn add_moving_images<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        append_unique(&mut self.moving_images, paths)
    }

    /// Remove a moving channel. The registration channel falls back to 0.
    pub fn remove_moving_image(&mut self, index: usize) -> Result<PathBuf> {
        let len = self.moving_images.len();
        if index >= len {
            return Err(Error::ChannelOutOfRange { index, len });
        }
        let removed = self.moving_images.remove(index);
        self.registration_channel = 0;
        Ok(removed)
    }

    pub fn set_registration_channel(&mut self, index: usize) -> Result<()> {
        let len = self.moving_images.len();
        if index >= len {
            return Err(Error::ChannelOutOfRange { index, len });
        }
        self.registration_channel = index;
        Ok(())
    }

    /// Apply the "use this channel for registration" checkbox for the
    /// displayed channel and return the state the checkbox should show.
    ///
    /// Unchecking hands registration to the first other channel; with fewer
    /// than two channels there is nothing to hand over and the box stays checked.
    pub fn toggle_registration_channel(&mut self, displayed: usize, use_channel: bool) -> bool {
        if use_channel {
            if displayed < self.moving_images.len() {
                self.registration_channel = displayed;
            }
            return true;
        }

        if self.moving_images.len() >= 2 {
            if let Some(other) = (0..self.moving_images.len()).find(|&i| i != displayed) {
                self.registration_channel = other;
            }
            false
        } else {
            true
        }
    }

    /// The moving image handed to the tool.
    pub fn registration_moving_image(&self) -> Option<&Path> {
        self.moving_images
            .get(self.registration_channel)
            .map(PathBuf::as_path)
    }

    pub fn add_warped_images<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        append_unique(&mut self.warped_images, paths)
    }

    pub fn remove_warped_image(&mut self, index: usize) -> Result<PathBuf> {
        let len = self.warped_images.len();
        if index >= len {
            return Err(Error::ChannelOutOfRange { index, len });
        }
        Ok(self.warped_images.remove(index))
    }

    /// Replace the warped list with the output of a finished registration.
    pub fn set_registration_result(&mut self, warped: PathBuf) {
        self.warped_images = vec![warped];
    }

    /// Where the tool writes the warped registration channel:
    /// `<fixed dir>/<moving stem>_warped_to_<fixed stem>.nii.gz`.
    pub fn warped_output_path(&self) -> Option<PathBuf> {
        let fixed = self.fixed_image()?;
        let moving = self.registration_moving_image()?;
        Some(warped_output_path(fixed, moving))
    }
}

pub fn warped_output_path(fixed: &Path, moving: &Path) -> PathBuf {
    let directory = fixed.parent().unwrap_or_else(|| Path::new(""));
    let fixed_stem = fixed.file_stem().unwrap_or_default().to_string_lossy();
    let moving_stem = moving.file_stem().unwrap_or_default().to_string_lossy();
    directory.join(format!("{moving_stem}_warped_to_{fixed_stem}.nii.gz"))
}

fn append_unique<I, P>(list: &mut Vec<PathBuf>, paths: I) -> usize
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    let mut added = 0;
    for path in paths {
        let path = path.into();
        if !list.contains(&path) {
            list.push(path);
            added += 1;
        }
    }
    added
}
