//! Integration tests for building the antsRegistration command line.
//!
//! Tests cover:
//! - The full command for default parameters
//! - Disabled stages, metric switching and the registration channel
//! - Shell escaping of paths with spaces
//! - Missing inputs

mod common;

use antsreg::params::{MetricField, StageField};
use antsreg::{InitialMovingTransform, ParamIssue};

use common::*;

const DEFAULT_COMMAND: &str = "antsRegistration -v 1 -d 3 \
-o [warp_,/data/moving.nii_warped_to_fixed.nii.nii.gz] -n Linear \
-r [/data/fixed.nii.gz,/data/moving.nii.gz,0] \
-t Translation[0.1] -m MI[/data/fixed.nii.gz,/data/moving.nii.gz,1,32,Regular,0.25] \
-c [200x200x200x0,1e-8,10] -f 12x8x4x2 -s 4x3x2x1 \
-t Rigid[0.1] -m MI[/data/fixed.nii.gz,/data/moving.nii.gz,1,32,Regular,0.25] \
-c [200x200x200x0,1e-8,10] -f 12x8x4x2 -s 4x3x2x1 \
-t Affine[0.1] -m MI[/data/fixed.nii.gz,/data/moving.nii.gz,1,32,Regular,0.25] \
-c [200x200x200x0,1e-8,10] -f 12x8x4x2 -s 4x3x2x1 \
-t SyN[0.1,6,0] -m CC[/data/fixed.nii.gz,/data/moving.nii.gz,1,2,None,0.25] \
-c [200x200x200x200x10,1e-7,10] -f 12x8x4x2x1 -s 4x3x2x1x0";

fn has_arg(command: &RegistrationCommand, expected: &str) -> bool {
    command.args().iter().any(|arg| arg == expected)
}

fn build(session: &Session, params: &RegistrationParams) -> RegistrationCommand {
    RegistrationCommand::build(session, params, "antsRegistration")
        .expect("Failed to build command")
}

#[test]
fn test_default_command() {
    let session = make_session(&[MOVING]);
    let command = build(&session, &RegistrationParams::default());

    assert_eq!(command.to_shell_string(), DEFAULT_COMMAND);
    assert_eq!(command.to_string(), DEFAULT_COMMAND);
    assert_eq!(command.program(), "antsRegistration");
    assert_eq!(&command.args()[..4], ["-v", "1", "-d", "3"]);
}

#[test]
fn test_disabled_stages_are_omitted() {
    let session = make_session(&[MOVING]);
    let mut params = RegistrationParams::default();
    params.translation.enabled = false;
    params.syn.enabled = false;

    let command = build(&session, &params).to_shell_string();

    assert!(!command.contains("Translation["));
    assert!(!command.contains("SyN["));
    assert!(command.contains("-t Rigid[0.1]"));
    assert!(command.contains("-t Affine[0.1]"));
    assert_eq!(command.matches(" -t ").count(), 2);
}

#[test]
fn test_no_stage_enabled_still_builds() {
    let session = make_session(&[MOVING]);
    let mut params = RegistrationParams::default();
    for kind in StageKind::ALL {
        params.stage_mut(kind).enabled = false;
    }

    let command = build(&session, &params);

    assert!(!command.args().iter().any(|arg| arg == "-t"));
    assert!(params.validate().contains(&ParamIssue::NoStageEnabled));
}

#[test]
fn test_metric_switch_changes_metric_argument() {
    let session = make_session(&[MOVING]);
    let mut params = RegistrationParams::default();
    params.rigid.metric = Metric::CrossCorrelation;
    params.syn.metric = Metric::MutualInformation;

    let command = build(&session, &params).to_shell_string();

    assert!(command.contains(
        "-t Rigid[0.1] -m CC[/data/fixed.nii.gz,/data/moving.nii.gz,1,2,None,0.25]"
    ));
    assert!(command.contains(
        "-t SyN[0.1,6,0] -m MI[/data/fixed.nii.gz,/data/moving.nii.gz,1,32,Regular,0.25]"
    ));
}

#[test]
fn test_edited_fields_flow_into_command() {
    let session = make_session(&[MOVING]);
    let mut params = RegistrationParams::default();
    params.prefix = "out_".to_string();
    params.initial_moving_transform = InitialMovingTransform::ImageOrigins;
    params.affine.set_field(StageField::GradientStep, "0.25".to_string());
    params.affine.set_field(StageField::NumIterations, "100x50".to_string());
    params.affine.set_metric_field(MetricField::NumBins, "64".to_string());
    params.affine.set_sampling_strategy(SamplingStrategy::Random);
    params.syn.set_field(StageField::TotalFieldVariance, "3".to_string());

    let command = build(&session, &params).to_shell_string();

    assert!(command.contains("-o [out_,"));
    assert!(command.contains("/data/moving.nii.gz,2]"));
    assert!(command.contains("-t Affine[0.25]"));
    assert!(command.contains("MI[/data/fixed.nii.gz,/data/moving.nii.gz,1,64,Random,0.25]"));
    assert!(command.contains("-c [100x50,1e-8,10]"));
    assert!(command.contains("-t SyN[0.1,6,3]"));
}

#[test]
fn test_registration_channel_selects_moving_image() -> anyhow::Result<()> {
    let mut session = make_session(&["/data/t1.nii", "/data/t2.nii"]);
    session.set_registration_channel(1)?;

    let command = build(&session, &RegistrationParams::default());

    assert!(has_arg(&command, "[/data/fixed.nii.gz,/data/t2.nii,0]"));
    assert!(has_arg(&command, "[warp_,/data/t2_warped_to_fixed.nii.nii.gz]"));
    assert!(
        !command
            .args()
            .iter()
            .any(|arg| arg.to_string_lossy().contains("t1.nii"))
    );
    Ok(())
}

#[test]
fn test_spaces_are_escaped_only_in_shell_string() {
    let mut session = Session::new();
    session.set_fixed_image("/my data/fixed.nii");
    session.add_moving_images(["/my data/moving.nii"]);

    let command = build(&session, &RegistrationParams::default());

    assert!(has_arg(&command, "[/my data/fixed.nii,/my data/moving.nii,0]"));
    let shell = command.to_shell_string();
    assert!(shell.contains("-r [/my\\ data/fixed.nii,/my\\ data/moving.nii,0]"));
    assert!(!shell.contains("/my data"));
}

#[test]
fn test_custom_program_is_escaped() {
    let session = make_session(&[MOVING]);
    let command = RegistrationCommand::build(
        &session,
        &RegistrationParams::default(),
        "/opt/ANTs bin/antsRegistration",
    )
    .expect("Failed to build command");

    assert_eq!(command.program(), "/opt/ANTs bin/antsRegistration");
    assert!(
        command
            .to_shell_string()
            .starts_with("/opt/ANTs\\ bin/antsRegistration -v 1")
    );
}

#[cfg(unix)]
#[test]
fn test_non_utf8_paths_reach_the_process_unchanged() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    use std::path::Path;

    let moving = Path::new(OsStr::from_bytes(b"/data/caf\xe9.nii"));
    let mut session = Session::new();
    session.set_fixed_image(FIXED);
    session.add_moving_images([moving]);

    let command = build(&session, &RegistrationParams::default());

    let initial = command
        .args()
        .iter()
        .find(|arg| arg.as_bytes().starts_with(b"[/data/fixed.nii.gz,"))
        .expect("Missing -r argument");
    assert_eq!(initial.as_bytes(), b"[/data/fixed.nii.gz,/data/caf\xe9.nii,0]");
    assert!(command.to_shell_string().contains("/data/caf\u{FFFD}.nii"));
}

#[test]
fn test_syn_without_field_variance_uses_defaults() {
    let session = make_session(&[MOVING]);
    let mut params = RegistrationParams::default();
    params.syn.field_variance = None;

    let command = build(&session, &params).to_shell_string();

    assert!(command.contains("-t SyN[0.1,6,0]"));
}

#[test]
fn test_missing_inputs() {
    let params = RegistrationParams::default();

    let mut session = Session::new();
    session.add_moving_images([MOVING]);
    let result = RegistrationCommand::build(&session, &params, "antsRegistration");
    assert!(matches!(result, Err(Error::MissingFixedImage)));

    let session = make_session(&[]);
    let result = RegistrationCommand::build(&session, &params, "antsRegistration");
    assert!(matches!(result, Err(Error::MissingMovingImage)));
}

#[test]
fn test_validation_reports_problems() {
    let mut params = RegistrationParams::default();
    assert!(params.validate().is_empty());

    params.prefix = "  ".to_string();
    params.rigid.shrink_factors = "8x4".to_string();
    params.syn.set_metric_field(MetricField::Radius, String::new());

    let issues = params.validate();
    assert!(issues.contains(&ParamIssue::EmptyPrefix));
    assert!(issues.contains(&ParamIssue::LevelMismatch {
        stage: StageKind::Rigid,
        iterations: 4,
        shrink_factors: 2,
        sigmas: 4,
    }));
    assert!(issues.contains(&ParamIssue::EmptyField {
        stage: StageKind::SyN,
        field: "Radius",
    }));

    // disabled stages are not checked
    params.rigid.enabled = false;
    assert!(!params.validate().iter().any(|issue| matches!(
        issue,
        ParamIssue::LevelMismatch {
            stage: StageKind::Rigid,
            ..
        }
    )));
}

#[test]
fn test_stage_fields_follow_stage_kind() {
    let mut params = RegistrationParams::default();

    assert!(!params.rigid.set_field(StageField::UpdateFieldVariance, "1".to_string()));
    assert_eq!(params.rigid.field(StageField::UpdateFieldVariance), None);
    assert_eq!(params.syn.field(StageField::UpdateFieldVariance), Some("6"));

    // metric fields act on the selected metric only
    assert_eq!(params.syn.metric_field(MetricField::NumBins), None);
    params.syn.metric = Metric::MutualInformation;
    assert_eq!(params.syn.metric_field(MetricField::NumBins), Some("32"));
    assert_eq!(params.syn.sampling_strategy(), SamplingStrategy::Regular);
}
