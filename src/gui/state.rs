use std::path::PathBuf;

use crate::command::RegistrationCommand;
use crate::errors::Result;
use crate::session::Session;
use crate::settings::Settings;

const OUTPUT_LIMIT: usize = 2000;

/// What the GUI starts with.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub fixed_image: Option<PathBuf>,
    pub moving_images: Vec<PathBuf>,
    pub settings: Settings,
    /// Where "Save" writes the settings; the user config dir when `None`.
    pub settings_path: Option<PathBuf>,
}

#[derive(Debug)]
pub struct AppState {
    pub session: Session,
    pub settings: Settings,
    pub settings_path: Option<PathBuf>,
    pub running: bool,
    pub output: Vec<String>,
    pub status: String,
}

impl AppState {
    pub fn new(settings: Settings, settings_path: Option<PathBuf>) -> Self {
        Self {
            session: Session::new(),
            settings,
            settings_path,
            running: false,
            output: Vec::new(),
            status: "Ready".to_string(),
        }
    }

    /// The command for the current session and parameters.
    pub fn command(&self) -> Result<RegistrationCommand> {
        RegistrationCommand::build(
            &self.session,
            &self.settings.params,
            &self.settings.ants_registration,
        )
    }

    pub fn push_output(&mut self, line: String) {
        if self.output.len() == OUTPUT_LIMIT {
            self.output.remove(0);
        }
        self.output.push(line);
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }
}
