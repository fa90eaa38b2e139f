use std::convert::Infallible;

use iced::{
    Element, Length, Task,
    widget::{Column, button, column, pick_list, row, scrollable, text_input, toggler},
};

use crate::gui::{
    AppState,
    screens::{Screen, ScreenMessage},
    widgets::{INPUT_WIDTH, form_row, group},
};
use crate::params::{
    InitialMovingTransform, Metric, MetricField, RegistrationParams, SamplingStrategy,
    StageField, StageKind,
};
use crate::settings::{default_settings_path, save_settings_to};

#[derive(Debug, Clone)]
pub enum ParametersMessage {
    PrefixChanged(String),
    InitialTransformChanged(InitialMovingTransform),
    ProgramChanged(String),
    StageToggled(StageKind, bool),
    StageFieldChanged(StageKind, StageField, String),
    MetricChanged(StageKind, Metric),
    MetricFieldChanged(StageKind, MetricField, String),
    SamplingStrategyChanged(StageKind, SamplingStrategy),
    Save,
    ResetToDefaults,
}

/// Form over every registration parameter.
#[derive(Debug, Clone, Default)]
pub struct ParametersScreen;

impl Screen for ParametersScreen {
    type Message = ParametersMessage;
    type ParentMessage = Infallible;

    fn view<'a>(&'a self, state: &'a AppState) -> Element<'a, ScreenMessage<Self>> {
        let params = &state.settings.params;

        let general = group(
            "General",
            column![
                form_row(
                    "Transform prefix",
                    text_input("warp_", &params.prefix)
                        .on_input(ParametersMessage::PrefixChanged)
                        .width(Length::Fixed(INPUT_WIDTH)),
                ),
                form_row(
                    "Initial moving transform",
                    pick_list(
                        InitialMovingTransform::ALL,
                        Some(params.initial_moving_transform),
                        ParametersMessage::InitialTransformChanged,
                    )
                    .width(Length::Fixed(INPUT_WIDTH)),
                ),
                form_row(
                    "antsRegistration program",
                    text_input("antsRegistration", &state.settings.ants_registration)
                        .on_input(ParametersMessage::ProgramChanged)
                        .width(Length::Fixed(INPUT_WIDTH)),
                ),
            ]
            .spacing(6),
        );

        let mut content = Column::new().spacing(12).push(general);
        for kind in StageKind::ALL {
            content = content.push(stage_group(kind, params));
        }

        let actions = row![
            button("Save").on_press(ParametersMessage::Save),
            button("Reset to defaults").on_press(ParametersMessage::ResetToDefaults),
        ]
        .spacing(10);

        let page: Element<'a, ParametersMessage> = column![
            scrollable(content.padding(iced::Padding {
                right: 15.0,
                ..iced::Padding::ZERO
            }))
            .height(Length::Fill),
            actions,
        ]
        .spacing(10)
        .into();

        page.map(ScreenMessage::ScreenMessage)
    }

    fn update(
        &mut self,
        message: Self::Message,
        state: &mut AppState,
    ) -> Task<ScreenMessage<Self>> {
        let params = &mut state.settings.params;
        match message {
            ParametersMessage::PrefixChanged(prefix) => params.prefix = prefix,
            ParametersMessage::InitialTransformChanged(transform) => {
                params.initial_moving_transform = transform
            }
            ParametersMessage::ProgramChanged(program) => {
                state.settings.ants_registration = program
            }
            ParametersMessage::StageToggled(kind, enabled) => {
                params.stage_mut(kind).enabled = enabled
            }
            ParametersMessage::StageFieldChanged(kind, field, value) => {
                if !params.stage_mut(kind).set_field(field, value) {
                    log::warn!("{} has no {:?} field", kind.transform(), field);
                }
            }
            ParametersMessage::MetricChanged(kind, metric) => {
                params.stage_mut(kind).metric = metric
            }
            ParametersMessage::MetricFieldChanged(kind, field, value) => {
                let stage = params.stage_mut(kind);
                if !stage.set_metric_field(field, value) {
                    log::warn!("{} has no {:?} field", stage.metric, field);
                }
            }
            ParametersMessage::SamplingStrategyChanged(kind, strategy) => {
                params.stage_mut(kind).set_sampling_strategy(strategy)
            }
            ParametersMessage::Save => {
                let path = state
                    .settings_path
                    .clone()
                    .unwrap_or_else(default_settings_path);
                match save_settings_to(&state.settings, &path) {
                    Ok(()) => state.set_status(format!("Settings saved to {}", path.display())),
                    Err(e) => {
                        log::error!("{:#}", e);
                        state.set_status("Failed to save settings");
                    }
                }
            }
            ParametersMessage::ResetToDefaults => {
                *params = RegistrationParams::default();
                state.set_status("Parameters reset to defaults");
            }
        }
        Task::none()
    }
}

fn stage_group<'a>(
    kind: StageKind,
    params: &'a RegistrationParams,
) -> Element<'a, ParametersMessage> {
    let stage = params.stage(kind);

    let mut fields = Column::new().spacing(6).push(
        toggler(stage.enabled)
            .label("Enabled")
            .on_toggle(move |enabled| ParametersMessage::StageToggled(kind, enabled)),
    );

    for &field in kind.fields() {
        let value = stage.field(field).unwrap_or_default();
        fields = fields.push(form_row(
            field.label(),
            text_input(field.label(), value)
                .on_input(move |v| ParametersMessage::StageFieldChanged(kind, field, v))
                .width(Length::Fixed(INPUT_WIDTH)),
        ));
    }

    fields = fields.push(form_row(
        "Metric",
        pick_list(Metric::ALL, Some(stage.metric), move |metric| {
            ParametersMessage::MetricChanged(kind, metric)
        })
        .width(Length::Fixed(INPUT_WIDTH)),
    ));

    let mut metric_fields = Column::new().spacing(6);
    for &field in stage.metric.fields() {
        let value = stage.metric_field(field).unwrap_or_default();
        metric_fields = metric_fields.push(form_row(
            field.label(),
            text_input(field.label(), value)
                .on_input(move |v| ParametersMessage::MetricFieldChanged(kind, field, v))
                .width(Length::Fixed(INPUT_WIDTH)),
        ));
    }
    metric_fields = metric_fields.push(form_row(
        "Sampling strategy",
        pick_list(
            SamplingStrategy::ALL,
            Some(stage.sampling_strategy()),
            move |strategy| ParametersMessage::SamplingStrategyChanged(kind, strategy),
        )
        .width(Length::Fixed(INPUT_WIDTH)),
    ));

    fields = fields.push(group(format!("{} parameters", stage.metric), metric_fields));

    group(kind.to_string(), fields)
}
