pub mod command;
pub mod parameters;
pub mod preview;

use iced::{Element, Task};

use crate::gui::AppState;

#[derive(Debug, Clone)]
pub enum ScreenMessage<S: Screen> {
    ScreenMessage(S::Message),
    ParentMessage(S::ParentMessage),
}

/// A page of the application. Screens keep their own UI state and read or
/// modify the shared [`AppState`].
pub trait Screen: Sized {
    type Message: std::fmt::Debug + Clone;
    type ParentMessage: std::fmt::Debug + Clone;
    fn view<'a>(&'a self, state: &'a AppState) -> Element<'a, ScreenMessage<Self>>;
    fn update(&mut self, message: Self::Message, state: &mut AppState)
    -> Task<ScreenMessage<Self>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Preview,
    Parameters,
    Command,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Preview, Page::Parameters, Page::Command];

    pub fn title(self) -> &'static str {
        match self {
            Page::Preview => "Preview",
            Page::Parameters => "Parameters",
            Page::Command => "Shell command",
        }
    }
}
