use std::path::PathBuf;

use crate::gui::screens::{
    Page, ScreenMessage, command::CommandScreen, parameters::ParametersScreen,
    preview::PreviewScreen,
};

#[derive(Debug, Clone)]
pub enum Message {
    Navigate(Page),
    Preview(ScreenMessage<PreviewScreen>),
    Parameters(ScreenMessage<ParametersScreen>),
    Command(ScreenMessage<CommandScreen>),
    Register,
    RegistrationOutput(String),
    RegistrationFinished(Result<PathBuf, String>),
}
