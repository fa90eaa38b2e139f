use iced::{
    Element, Font, Length, Task,
    widget::{Column, button, column, container, row, scrollable, text},
};
use iced_widget::container::bordered_box;

use crate::gui::{
    AppState,
    screens::{Screen, ScreenMessage},
};
use crate::logger;

#[derive(Debug, Clone)]
pub enum CommandMessage {
    Copy,
    ClearOutput,
    ClearLog,
    Run,
}

#[derive(Debug, Clone)]
pub enum CommandParentMessage {
    RunRequested,
}

/// The generated command line, its problems and the tool output.
#[derive(Debug, Clone, Default)]
pub struct CommandScreen;

impl Screen for CommandScreen {
    type Message = CommandMessage;
    type ParentMessage = CommandParentMessage;

    fn view<'a>(&'a self, state: &'a AppState) -> Element<'a, ScreenMessage<Self>> {
        let (command_text, can_run) = match state.command() {
            Ok(command) => (command.to_shell_string(), !state.running),
            Err(e) => (e.to_string(), false),
        };

        let command_box = container(text(command_text).font(Font::MONOSPACE).size(13))
            .padding(10)
            .width(Length::Fill)
            .style(bordered_box);

        let issues = state.settings.params.validate();
        let issues: Element<'a, CommandMessage> = if issues.is_empty() {
            text("Parameters look fine").size(13).into()
        } else {
            Column::with_children(
                issues
                    .into_iter()
                    .map(|issue| text(format!("⚠ {}", issue)).size(13).into()),
            )
            .spacing(2)
            .into()
        };

        let actions = row![
            button("Copy").on_press(CommandMessage::Copy),
            button(if state.running { "Running..." } else { "Run" })
                .on_press_maybe(can_run.then_some(CommandMessage::Run)),
        ]
        .spacing(10);

        let output = text_pane(
            "antsRegistration output",
            &state.output,
            CommandMessage::ClearOutput,
        );
        let log = text_pane("Log", &logger::captured_lines(), CommandMessage::ClearLog);

        let content: Element<'a, CommandMessage> = column![
            command_box,
            issues,
            actions,
            row![output, log].spacing(10).height(Length::Fill),
        ]
        .spacing(10)
        .into();

        content.map(ScreenMessage::ScreenMessage)
    }

    fn update(
        &mut self,
        message: Self::Message,
        state: &mut AppState,
    ) -> Task<ScreenMessage<Self>> {
        match message {
            CommandMessage::Copy => match state.command() {
                Ok(command) => {
                    state.set_status("Command copied to clipboard");
                    iced::clipboard::write(command.to_shell_string())
                }
                Err(e) => {
                    state.set_status(e.to_string());
                    Task::none()
                }
            },
            CommandMessage::ClearOutput => {
                state.output.clear();
                Task::none()
            }
            CommandMessage::ClearLog => {
                logger::clear_captured();
                Task::none()
            }
            CommandMessage::Run => {
                Task::done(ScreenMessage::ParentMessage(CommandParentMessage::RunRequested))
            }
        }
    }
}

fn text_pane<'a>(
    title: &'a str,
    lines: &[String],
    on_clear: CommandMessage,
) -> Element<'a, CommandMessage> {
    let body = Column::with_children(
        lines
            .iter()
            .map(|line| text(line.clone()).font(Font::MONOSPACE).size(12).into()),
    );

    container(
        column![
            row![
                text(title).size(16).width(Length::Fill),
                button("Clear").on_press(on_clear),
            ],
            scrollable(body)
                .anchor_bottom()
                .width(Length::Fill)
                .height(Length::Fill),
        ]
        .spacing(6),
    )
    .padding(10)
    .width(Length::FillPortion(1))
    .height(Length::Fill)
    .style(bordered_box)
    .into()
}
