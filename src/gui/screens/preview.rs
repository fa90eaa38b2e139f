use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use iced::{
    Alignment::Center,
    ContentFit, Element, Length, Task,
    widget::{
        button, column, container, image as iced_image, pick_list, row, slider, text, toggler,
    },
};
use image::RgbImage;
use rfd::AsyncFileDialog;

use crate::gui::{
    AppState,
    screens::{Screen, ScreenMessage},
};
use crate::render;
use crate::volume::{IntensityMapping, Volume, is_nifti_path};

const NIFTI_FILTER: &str = "NIfTI Files";
const NIFTI_EXTENSIONS: &[&str] = &["nii", "gz"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Fixed,
    Moving,
    Warped,
}

/// Entry of a channel picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub index: usize,
    pub path: PathBuf,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.index, file_name(&self.path))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

fn channels(paths: &[PathBuf]) -> Vec<Channel> {
    paths
        .iter()
        .enumerate()
        .map(|(index, path)| Channel {
            index,
            path: path.clone(),
        })
        .collect()
}

#[derive(Debug, Clone)]
pub enum PreviewMessage {
    PickFixed,
    PickMoving,
    PickWarped,
    FixedPicked(Option<PathBuf>),
    MovingPicked(Vec<PathBuf>),
    WarpedPicked(Vec<PathBuf>),
    Loaded(Pane, PathBuf, Result<Arc<Volume>, String>),
    FixedSliceChanged(u32),
    MovingSliceChanged(u32),
    AlphaChanged(f32),
    MappingChanged(IntensityMapping),
    MovingChannelSelected(Channel),
    WarpedChannelSelected(Channel),
    RegistrationChannelToggled(bool),
    RemoveMoving,
    RemoveWarped,
}

/// Fixed, moving and warped-over-fixed slices side by side.
///
/// The fixed and warped panes share one slice index since the warped image
/// lives in the fixed image's space.
#[derive(Debug, Clone)]
pub struct PreviewScreen {
    fixed: Option<Arc<Volume>>,
    moving: Option<Arc<Volume>>,
    warped: Option<Arc<Volume>>,
    /// Fixed image being loaded; results for any other path are dropped.
    pending_fixed: Option<PathBuf>,
    fixed_z: usize,
    moving_z: usize,
    moving_channel: usize,
    warped_channel: usize,
    use_for_registration: bool,
    fixed_view: Option<iced_image::Handle>,
    moving_view: Option<iced_image::Handle>,
    warped_view: Option<iced_image::Handle>,
}

impl Default for PreviewScreen {
    fn default() -> Self {
        Self {
            fixed: None,
            moving: None,
            warped: None,
            pending_fixed: None,
            fixed_z: 0,
            moving_z: 0,
            moving_channel: 0,
            warped_channel: 0,
            use_for_registration: true,
            fixed_view: None,
            moving_view: None,
            warped_view: None,
        }
    }
}

type PreviewTask = Task<ScreenMessage<PreviewScreen>>;

impl Screen for PreviewScreen {
    type Message = PreviewMessage;
    type ParentMessage = Infallible;

    fn view<'a>(&'a self, state: &'a AppState) -> Element<'a, ScreenMessage<Self>> {
        let session = &state.session;
        let fixed_depth = self.fixed.as_ref().map(|v| v.depth());
        let shared_depth = fixed_depth.or(self.warped.as_ref().map(|v| v.depth()));

        let fixed_pane = column![
            button("Fixed Image ▼").on_press(PreviewMessage::PickFixed),
            image_pane(self.fixed_view.as_ref()),
            slice_slider(self.fixed_z, fixed_depth, PreviewMessage::FixedSliceChanged),
            text(session.fixed_image().map(file_name).unwrap_or_default()).size(12),
        ]
        .spacing(8);

        let moving_channels = channels(session.moving_images());
        let selected_moving = moving_channels.get(self.moving_channel).cloned();
        let has_moving = !moving_channels.is_empty();
        let moving_pane = column![
            button("Moving Image ▼").on_press(PreviewMessage::PickMoving),
            image_pane(self.moving_view.as_ref()),
            slice_slider(
                self.moving_z,
                self.moving.as_ref().map(|v| v.depth()),
                PreviewMessage::MovingSliceChanged
            ),
            row![
                text("Channel: "),
                pick_list(
                    moving_channels,
                    selected_moving,
                    PreviewMessage::MovingChannelSelected
                )
                .width(Length::Fill),
                button("Remove")
                    .on_press_maybe(has_moving.then_some(PreviewMessage::RemoveMoving)),
            ]
            .spacing(5)
            .align_y(Center),
            toggler(self.use_for_registration)
                .label("Use this channel for registration")
                .on_toggle(PreviewMessage::RegistrationChannelToggled),
        ]
        .spacing(8);

        let warped_channels = channels(session.warped_images());
        let selected_warped = warped_channels.get(self.warped_channel).cloned();
        let has_warped = !warped_channels.is_empty();
        let warped_pane = column![
            button("Warped Moving Image ▼").on_press(PreviewMessage::PickWarped),
            image_pane(self.warped_view.as_ref()),
            slice_slider(self.fixed_z, shared_depth, PreviewMessage::FixedSliceChanged),
            row![
                text("Channel: "),
                pick_list(
                    warped_channels,
                    selected_warped,
                    PreviewMessage::WarpedChannelSelected
                )
                .width(Length::Fill),
                button("Remove")
                    .on_press_maybe(has_warped.then_some(PreviewMessage::RemoveWarped)),
            ]
            .spacing(5)
            .align_y(Center),
            row![
                text("Alpha: "),
                slider(
                    0.0..=1.0,
                    state.settings.overlay_alpha,
                    PreviewMessage::AlphaChanged
                )
                .step(0.01),
            ]
            .spacing(5)
            .align_y(Center),
        ]
        .spacing(8);

        let display_options = row![
            text("Intensity: "),
            pick_list(
                IntensityMapping::ALL,
                Some(state.settings.intensity_mapping),
                PreviewMessage::MappingChanged
            ),
        ]
        .spacing(5)
        .align_y(Center);

        let content: Element<'a, PreviewMessage> = column![
            row![
                fixed_pane.width(Length::FillPortion(1)),
                moving_pane.width(Length::FillPortion(1)),
                warped_pane.width(Length::FillPortion(1)),
            ]
            .spacing(10)
            .height(Length::Fill),
            display_options,
        ]
        .spacing(10)
        .into();

        content.map(ScreenMessage::ScreenMessage)
    }

    fn update(&mut self, message: Self::Message, state: &mut AppState) -> PreviewTask {
        match message {
            PreviewMessage::PickFixed => Task::perform(
                AsyncFileDialog::new()
                    .set_title("Select fixed image")
                    .add_filter(NIFTI_FILTER, NIFTI_EXTENSIONS)
                    .pick_file(),
                |handle| {
                    ScreenMessage::ScreenMessage(PreviewMessage::FixedPicked(
                        handle.map(|data| data.path().to_path_buf()),
                    ))
                },
            ),
            PreviewMessage::PickMoving => Task::perform(
                AsyncFileDialog::new()
                    .set_title("Select moving image(s)")
                    .add_filter(NIFTI_FILTER, NIFTI_EXTENSIONS)
                    .pick_files(),
                |handles| {
                    ScreenMessage::ScreenMessage(PreviewMessage::MovingPicked(paths_of(handles)))
                },
            ),
            PreviewMessage::PickWarped => Task::perform(
                AsyncFileDialog::new()
                    .set_title("Select warped image(s)")
                    .add_filter(NIFTI_FILTER, NIFTI_EXTENSIONS)
                    .pick_files(),
                |handles| {
                    ScreenMessage::ScreenMessage(PreviewMessage::WarpedPicked(paths_of(handles)))
                },
            ),
            PreviewMessage::FixedPicked(Some(path)) => {
                if nifti_only(vec![path.clone()], state).is_empty() {
                    return Task::none();
                }
                self.pending_fixed = Some(path.clone());
                load(Pane::Fixed, path)
            }
            PreviewMessage::FixedPicked(None) => Task::none(),
            PreviewMessage::MovingPicked(paths) => {
                let paths = nifti_only(paths, state);
                if state.session.add_moving_images(paths) == 0 {
                    return Task::none();
                }
                let count = state.session.moving_images().len();
                self.moving_channel = count - 1;
                self.use_for_registration =
                    count == 1 || self.moving_channel == state.session.registration_channel();
                self.load_moving(state)
            }
            PreviewMessage::WarpedPicked(paths) => {
                let paths = nifti_only(paths, state);
                if state.session.add_warped_images(paths) == 0 {
                    return Task::none();
                }
                self.warped_channel = state.session.warped_images().len() - 1;
                self.load_warped(state)
            }
            PreviewMessage::Loaded(pane, path, result) => {
                self.handle_loaded(pane, path, result, state);
                Task::none()
            }
            PreviewMessage::FixedSliceChanged(z) => {
                self.fixed_z = z as usize;
                self.refresh_fixed(state);
                self.refresh_warped(state);
                Task::none()
            }
            PreviewMessage::MovingSliceChanged(z) => {
                self.moving_z = z as usize;
                self.refresh_moving(state);
                Task::none()
            }
            PreviewMessage::AlphaChanged(alpha) => {
                state.settings.overlay_alpha = alpha;
                self.refresh_warped(state);
                Task::none()
            }
            PreviewMessage::MappingChanged(mapping) => {
                state.settings.intensity_mapping = mapping;
                self.refresh_all(state);
                Task::none()
            }
            PreviewMessage::MovingChannelSelected(channel) => {
                self.moving_channel = channel.index;
                self.use_for_registration = channel.index == state.session.registration_channel();
                self.load_moving(state)
            }
            PreviewMessage::WarpedChannelSelected(channel) => {
                self.warped_channel = channel.index;
                self.load_warped(state)
            }
            PreviewMessage::RegistrationChannelToggled(use_channel) => {
                self.use_for_registration = state
                    .session
                    .toggle_registration_channel(self.moving_channel, use_channel);
                Task::none()
            }
            PreviewMessage::RemoveMoving => {
                if let Err(e) = state.session.remove_moving_image(self.moving_channel) {
                    log::warn!("{}", e);
                    return Task::none();
                }
                self.moving_channel = 0;
                if state.session.moving_images().is_empty() {
                    self.moving = None;
                    self.moving_view = None;
                    self.moving_z = 0;
                    self.use_for_registration = true;
                    return Task::none();
                }
                self.use_for_registration = state
                    .session
                    .toggle_registration_channel(0, self.use_for_registration);
                self.load_moving(state)
            }
            PreviewMessage::RemoveWarped => {
                if let Err(e) = state.session.remove_warped_image(self.warped_channel) {
                    log::warn!("{}", e);
                    return Task::none();
                }
                self.warped_channel = 0;
                if state.session.warped_images().is_empty() {
                    self.warped = None;
                    self.warped_view = None;
                    return Task::none();
                }
                self.load_warped(state)
            }
        }
    }
}

impl PreviewScreen {
    /// Load images given on the command line.
    pub fn open_initial(
        &mut self,
        state: &mut AppState,
        fixed_image: Option<PathBuf>,
        moving_images: Vec<PathBuf>,
    ) -> PreviewTask {
        let fixed = self.update(PreviewMessage::FixedPicked(fixed_image), state);
        let moving = self.update(PreviewMessage::MovingPicked(moving_images), state);
        Task::batch([fixed, moving])
    }

    /// Show the newest warped image after a registration finished.
    pub fn show_registration_result(&mut self, state: &AppState) -> PreviewTask {
        self.warped_channel = state.session.warped_images().len().saturating_sub(1);
        self.load_warped(state)
    }

    /// Re-render every pane, e.g. after display settings were reset.
    pub fn refresh_all(&mut self, state: &AppState) {
        self.refresh_fixed(state);
        self.refresh_moving(state);
        self.refresh_warped(state);
    }

    fn load_moving(&self, state: &AppState) -> PreviewTask {
        match state.session.moving_images().get(self.moving_channel) {
            Some(path) => load(Pane::Moving, path.clone()),
            None => Task::none(),
        }
    }

    fn load_warped(&self, state: &AppState) -> PreviewTask {
        match state.session.warped_images().get(self.warped_channel) {
            Some(path) => load(Pane::Warped, path.clone()),
            None => Task::none(),
        }
    }

    fn handle_loaded(
        &mut self,
        pane: Pane,
        path: PathBuf,
        result: Result<Arc<Volume>, String>,
        state: &mut AppState,
    ) {
        match pane {
            Pane::Fixed => {
                // a newer pick supersedes this result
                if self.pending_fixed.as_ref() != Some(&path) {
                    log::debug!("Ignoring stale fixed image {}", path.display());
                    return;
                }
                self.pending_fixed = None;
                match result {
                    Ok(volume) => {
                        self.fixed_z = render::slice_index_for_depth(self.fixed_z, volume.depth());
                        self.fixed = Some(volume);
                        state.session.set_fixed_image(path.clone());
                        state.set_status(format!("Fixed image: {}", path.display()));
                        self.refresh_fixed(state);
                        self.refresh_warped(state);
                    }
                    Err(e) => {
                        log::error!("{}", e);
                        state.set_status(format!("Failed to load {}", path.display()));
                    }
                }
            }
            Pane::Moving => {
                // a newer channel selection supersedes this result
                if state.session.moving_images().get(self.moving_channel) != Some(&path) {
                    return;
                }
                match result {
                    Ok(volume) => {
                        self.moving_z =
                            render::slice_index_for_depth(self.moving_z, volume.depth());
                        self.moving = Some(volume);
                    }
                    Err(e) => {
                        log::error!("{}", e);
                        state.set_status(format!("Failed to load {}", path.display()));
                        self.moving = None;
                    }
                }
                self.refresh_moving(state);
            }
            Pane::Warped => {
                if state.session.warped_images().get(self.warped_channel) != Some(&path) {
                    return;
                }
                match result {
                    Ok(volume) => self.warped = Some(volume),
                    Err(e) => {
                        // blank pane; the registration output may simply be missing
                        log::warn!("{}", e);
                        self.warped = None;
                    }
                }
                self.refresh_warped(state);
            }
        }
    }

    fn refresh_fixed(&mut self, state: &AppState) {
        let mapping = state.settings.intensity_mapping;
        self.fixed_view = self
            .fixed
            .as_ref()
            .and_then(|volume| gray_view(volume, self.fixed_z, mapping));
    }

    fn refresh_moving(&mut self, state: &AppState) {
        let mapping = state.settings.intensity_mapping;
        self.moving_view = self
            .moving
            .as_ref()
            .and_then(|volume| gray_view(volume, self.moving_z, mapping));
    }

    fn refresh_warped(&mut self, state: &AppState) {
        let mapping = state.settings.intensity_mapping;
        let alpha = state.settings.overlay_alpha;
        self.warped_view = self.warped.as_ref().and_then(|warped| {
            let fixed = self.fixed.as_deref();
            render::warped_view(fixed, warped, self.fixed_z, mapping, alpha)
                .map(|image| handle(&image))
        });
    }
}

fn paths_of(handles: Option<Vec<rfd::FileHandle>>) -> Vec<PathBuf> {
    handles
        .unwrap_or_default()
        .iter()
        .map(|handle| handle.path().to_path_buf())
        .collect()
}

/// Drops paths not named like NIfTI files; the ".gz" filter lets any gzip through.
fn nifti_only(paths: Vec<PathBuf>, state: &mut AppState) -> Vec<PathBuf> {
    let (nifti, other): (Vec<_>, Vec<_>) = paths.into_iter().partition(|p| is_nifti_path(p));
    for path in &other {
        log::warn!("Not a NIfTI file (.nii or .nii.gz): {}", path.display());
        state.set_status(format!("Skipped {}: not a NIfTI file", path.display()));
    }
    nifti
}

fn load(pane: Pane, path: PathBuf) -> PreviewTask {
    Task::perform(load_volume(path), move |(path, result)| {
        ScreenMessage::ScreenMessage(PreviewMessage::Loaded(pane, path, result))
    })
}

async fn load_volume(path: PathBuf) -> (PathBuf, Result<Arc<Volume>, String>) {
    let target = path.clone();
    let result = match tokio::task::spawn_blocking(move || Volume::load(&target)).await {
        Ok(Ok(volume)) => Ok(Arc::new(volume)),
        Ok(Err(e)) => Err(format!("{:#}", anyhow::Error::from(e))),
        Err(e) => Err(e.to_string()),
    };
    (path, result)
}

fn gray_view(volume: &Volume, z: usize, mapping: IntensityMapping) -> Option<iced_image::Handle> {
    volume
        .slice(z, mapping)
        .ok()
        .map(|slice| handle(&render::gray_to_rgb(&slice)))
}

fn handle(image: &RgbImage) -> iced_image::Handle {
    iced_image::Handle::from_rgba(image.width(), image.height(), render::to_rgba(image))
}

fn image_pane<'a>(view: Option<&iced_image::Handle>) -> Element<'a, PreviewMessage> {
    let content: Element<'a, PreviewMessage> = match view {
        Some(handle) => iced_image(handle.clone())
            .content_fit(ContentFit::Contain)
            .filter_method(iced_image::FilterMethod::Nearest)
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
        None => text("No image").into(),
    };
    container(content)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}

fn slice_slider<'a>(
    z: usize,
    depth: Option<usize>,
    on_change: fn(u32) -> PreviewMessage,
) -> Element<'a, PreviewMessage> {
    let max = depth.unwrap_or(1).saturating_sub(1) as u32;
    let z = (z as u32).min(max);
    row![
        slider(0..=max, z, on_change).width(Length::Fill),
        text(format!("{} / {}", z, max)).size(12),
    ]
    .spacing(5)
    .align_y(Center)
    .into()
}

#[cfg(test)]
mod tests {
    use ndarray::Array3;

    use super::*;
    use crate::settings::Settings;

    fn pick(screen: &mut PreviewScreen, state: &mut AppState, path: &str) {
        let _ = screen.update(PreviewMessage::FixedPicked(Some(PathBuf::from(path))), state);
    }

    fn loaded(path: &str, depth: usize) -> PreviewMessage {
        let volume = Volume::from_array(Array3::zeros((2, 2, depth)));
        PreviewMessage::Loaded(Pane::Fixed, PathBuf::from(path), Ok(Arc::new(volume)))
    }

    #[test]
    fn test_stale_fixed_image_is_ignored() {
        let mut state = AppState::new(Settings::default(), None);
        let mut screen = PreviewScreen::default();

        pick(&mut screen, &mut state, "/data/first.nii");
        pick(&mut screen, &mut state, "/data/second.nii");
        let _ = screen.update(loaded("/data/second.nii", 3), &mut state);
        let _ = screen.update(loaded("/data/first.nii", 5), &mut state);

        assert_eq!(state.session.fixed_image(), Some(Path::new("/data/second.nii")));
        assert_eq!(screen.fixed.as_ref().map(|v| v.depth()), Some(3));
    }

    #[test]
    fn test_fixed_slice_resets_when_new_image_is_shallower() {
        let mut state = AppState::new(Settings::default(), None);
        let mut screen = PreviewScreen::default();
        screen.fixed_z = 4;

        pick(&mut screen, &mut state, "/data/fixed.nii");
        let _ = screen.update(loaded("/data/fixed.nii", 3), &mut state);

        assert_eq!(screen.fixed_z, 0);
        assert!(screen.fixed_view.is_some());
    }

    #[test]
    fn test_non_nifti_picks_are_skipped() {
        let mut state = AppState::new(Settings::default(), None);
        let mut screen = PreviewScreen::default();

        pick(&mut screen, &mut state, "/data/archive.tar.gz");
        let _ = screen.update(
            PreviewMessage::MovingPicked(vec![
                PathBuf::from("/data/notes.gz"),
                PathBuf::from("/data/t1.nii.gz"),
            ]),
            &mut state,
        );

        assert_eq!(screen.pending_fixed, None);
        assert_eq!(state.session.moving_images(), [PathBuf::from("/data/t1.nii.gz")]);
    }
}
