use iced::{
    Element, Length, Task, Theme,
    widget::{Column, button, column, text, toggler},
};

use super::{AppState, LaunchOptions, Message};
use crate::gui::screens::{
    Page, Screen, ScreenMessage,
    command::{CommandParentMessage, CommandScreen},
    parameters::{ParametersMessage, ParametersScreen},
    preview::PreviewScreen,
};
use crate::gui::widgets::{layout, nav_entry};
use crate::params::StageKind;
use crate::runner::{RegistrationJob, RegistrationRunner};

pub struct RegistrationApp {
    state: AppState,
    page: Page,
    preview: PreviewScreen,
    parameters: ParametersScreen,
    command: CommandScreen,
}

impl RegistrationApp {
    pub fn new(options: LaunchOptions) -> (Self, Task<Message>) {
        let mut app = Self {
            state: AppState::new(options.settings, options.settings_path),
            page: Page::default(),
            preview: PreviewScreen::default(),
            parameters: ParametersScreen,
            command: CommandScreen,
        };
        let task = app
            .preview
            .open_initial(&mut app.state, options.fixed_image, options.moving_images)
            .map(Message::Preview);
        (app, task)
    }

    pub fn title(&self) -> String {
        if self.state.running {
            "antsreg - registering...".to_string()
        } else {
            "antsreg".to_string()
        }
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Navigate(page) => {
                self.page = page;
                Task::none()
            }
            Message::Preview(ScreenMessage::ScreenMessage(msg)) => self
                .preview
                .update(msg, &mut self.state)
                .map(Message::Preview),
            Message::Preview(ScreenMessage::ParentMessage(never)) => match never {},
            Message::Parameters(ScreenMessage::ScreenMessage(msg)) => self
                .parameters
                .update(msg, &mut self.state)
                .map(Message::Parameters),
            Message::Parameters(ScreenMessage::ParentMessage(never)) => match never {},
            Message::Command(ScreenMessage::ScreenMessage(msg)) => self
                .command
                .update(msg, &mut self.state)
                .map(Message::Command),
            Message::Command(ScreenMessage::ParentMessage(CommandParentMessage::RunRequested))
            | Message::Register => self.start_registration(),
            Message::RegistrationOutput(line) => {
                self.state.push_output(line);
                Task::none()
            }
            Message::RegistrationFinished(Ok(warped_image)) => {
                self.state.running = false;
                self.state
                    .set_status(format!("Registration finished: {}", warped_image.display()));
                self.state.session.set_registration_result(warped_image);
                self.preview
                    .show_registration_result(&self.state)
                    .map(Message::Preview)
            }
            Message::RegistrationFinished(Err(e)) => {
                self.state.running = false;
                log::error!("Registration failed: {}", e);
                self.state.set_status(format!("Registration failed: {}", e));
                Task::none()
            }
        }
    }

    fn start_registration(&mut self) -> Task<Message> {
        if self.state.running {
            log::warn!("A registration is already running");
            return Task::none();
        }

        let job = match RegistrationJob::prepare(
            &self.state.session,
            &self.state.settings.params,
            &self.state.settings.ants_registration,
        ) {
            Ok(job) => job,
            Err(e) => {
                self.state.set_status(e.to_string());
                return Task::none();
            }
        };

        for issue in self.state.settings.params.validate() {
            log::warn!("{}", issue);
        }

        self.state.running = true;
        self.state.output.clear();
        self.state.set_status("Registration running...");

        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        let lines = iced::futures::stream::unfold(receiver, |mut receiver| async move {
            receiver.recv().await.map(|line| (line, receiver))
        });

        Task::batch([
            Task::run(lines, Message::RegistrationOutput),
            Task::perform(
                async move {
                    let runner = RegistrationRunner::new().with_output(sender);
                    job.run(&runner)
                        .await
                        .map_err(|e| format!("{:#}", anyhow::Error::from(e)))
                },
                Message::RegistrationFinished,
            ),
        ])
    }

    pub fn view(&self) -> Element<'_, Message> {
        let main_content = match self.page {
            Page::Preview => self.preview.view(&self.state).map(Message::Preview),
            Page::Parameters => self.parameters.view(&self.state).map(Message::Parameters),
            Page::Command => self.command.view(&self.state).map(Message::Command),
        };

        layout(self.sidebar(), main_content)
    }

    fn sidebar(&self) -> Element<'_, Message> {
        let pages = Column::with_children(
            Page::ALL
                .into_iter()
                .map(|page| nav_entry(page, self.page, Message::Navigate(page))),
        )
        .spacing(4);

        let params = &self.state.settings.params;
        let stages = Column::with_children(StageKind::ALL.into_iter().map(|kind| {
            toggler(params.stage(kind).enabled)
                .label(kind.to_string())
                .on_toggle(move |enabled| {
                    Message::Parameters(ScreenMessage::ScreenMessage(
                        ParametersMessage::StageToggled(kind, enabled),
                    ))
                })
                .into()
        }))
        .spacing(6);

        let register = button(text("Register").width(Length::Fill).center())
            .width(Length::Fill)
            .on_press_maybe((!self.state.running).then_some(Message::Register));

        column![
            text("antsreg").size(24),
            pages,
            text("Stages").size(16),
            stages,
            register,
            text(self.state.status.as_str()).size(12),
        ]
        .spacing(12)
        .into()
    }
}

/// Open the main window and block until it is closed.
pub fn run(options: LaunchOptions) -> iced::Result {
    iced::application(
        move || RegistrationApp::new(options.clone()),
        RegistrationApp::update,
        RegistrationApp::view,
    )
    .title(RegistrationApp::title)
    .theme(RegistrationApp::theme)
    .window_size((1400.0, 900.0))
    .run()
}
