use std::ffi::{OsStr, OsString};

use crate::errors::{Error, Result};
use crate::params::{FieldVariance, Metric, RegistrationParams, StageKind, StageParams};
use crate::session::Session;

pub const DEFAULT_PROGRAM: &str = "antsRegistration";

/// One `antsRegistration` invocation.
///
/// Arguments are kept split so they can be passed to the process directly;
/// [`RegistrationCommand::to_shell_string`] renders the copyable form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationCommand {
    program: String,
    args: Vec<OsString>,
}

impl RegistrationCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Build the command for the session's fixed image and registration channel.
    pub fn build(session: &Session, params: &RegistrationParams, program: &str) -> Result<Self> {
        let fixed = session.fixed_image().ok_or(Error::MissingFixedImage)?;
        let moving = session
            .registration_moving_image()
            .ok_or(Error::MissingMovingImage)?;
        let warped = session
            .warped_output_path()
            .ok_or(Error::MissingMovingImage)?;
        let (fixed, moving) = (fixed.as_os_str(), moving.as_os_str());

        let mut args: Vec<OsString> = ["-v", "1", "-d", "3", "-o"].map(OsString::from).to_vec();
        args.push(bracketed("", &[OsStr::new(&params.prefix), warped.as_os_str()]));
        args.extend(["-n", "Linear", "-r"].map(OsString::from));
        let code = params.initial_moving_transform.code().to_string();
        args.push(bracketed("", &[fixed, moving, OsStr::new(&code)]));

        for (kind, stage) in params.enabled_stages() {
            push_stage(&mut args, kind, stage, fixed, moving);
        }

        Ok(Self::new(program, args))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments exactly as handed to the process.
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Shell-ready rendering with spaces escaped as `\ `. Paths that are not
    /// valid UTF-8 are shown lossily.
    pub fn to_shell_string(&self) -> String {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().map(|arg| arg.to_string_lossy().into_owned()))
            .map(|part| part.replace(' ', "\\ "))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl std::fmt::Display for RegistrationCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_shell_string())
    }
}

/// `name[a,b,...]`
fn bracketed(name: &str, parts: &[&OsStr]) -> OsString {
    let mut arg = OsString::from(name);
    arg.push("[");
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            arg.push(",");
        }
        arg.push(part);
    }
    arg.push("]");
    arg
}

fn push_stage(
    args: &mut Vec<OsString>,
    kind: StageKind,
    stage: &StageParams,
    fixed: &OsStr,
    moving: &OsStr,
) {
    args.push("-t".into());
    args.push(match kind {
        StageKind::SyN => {
            let default_variance = FieldVariance::default();
            let variance = stage.field_variance.as_ref().unwrap_or(&default_variance);
            format!(
                "{}[{},{},{}]",
                kind.transform(),
                stage.gradient_step,
                variance.update,
                variance.total
            )
            .into()
        }
        _ => format!("{}[{}]", kind.transform(), stage.gradient_step).into(),
    });

    let (metric_weight, shape, sampling_strategy, sampling_percentage) = match stage.metric {
        Metric::CrossCorrelation => {
            let cc = &stage.cross_correlation;
            (&cc.metric_weight, &cc.radius, cc.sampling_strategy, &cc.sampling_percentage)
        }
        Metric::MutualInformation => {
            let mi = &stage.mutual_information;
            (&mi.metric_weight, &mi.num_bins, mi.sampling_strategy, &mi.sampling_percentage)
        }
    };
    let sampling_strategy = sampling_strategy.to_string();
    args.push("-m".into());
    args.push(bracketed(
        stage.metric.flag(),
        &[
            fixed,
            moving,
            OsStr::new(metric_weight),
            OsStr::new(shape),
            OsStr::new(&sampling_strategy),
            OsStr::new(sampling_percentage),
        ],
    ));

    args.push("-c".into());
    args.push(
        format!(
            "[{},{},{}]",
            stage.num_iterations, stage.convergence_threshold, stage.convergence_window_size
        )
        .into(),
    );

    args.push("-f".into());
    args.push(stage.shrink_factors.clone().into());
    args.push("-s".into());
    args.push(stage.gaussian_sigma.clone().into());
}
