use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;

use crate::command::RegistrationCommand;
use crate::errors::{Error, Result};
use crate::params::RegistrationParams;
use crate::session::Session;

const LOG_TARGET: &str = "antsRegistration";

/// Runs the external registration tool and streams its output.
#[derive(Debug, Clone, Default)]
pub struct RegistrationRunner {
    output: Option<UnboundedSender<String>>,
}

impl RegistrationRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward every output line to `sender` in addition to the log.
    pub fn with_output(mut self, sender: UnboundedSender<String>) -> Self {
        self.output = Some(sender);
        self
    }

    /// Run `command` to completion. A non-zero exit status is an error.
    pub async fn run(&self, command: &RegistrationCommand) -> Result<ExitStatus> {
        log::info!("Running: {}", command.to_shell_string());

        let mut child = Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| Error::Spawn {
                program: command.program().to_string(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (out, err) = tokio::join!(
            pump(stdout, log::Level::Info, self.output.as_ref()),
            pump(stderr, log::Level::Warn, self.output.as_ref()),
        );
        out?;
        err?;

        let status = child.wait().await?;
        if !status.success() {
            return Err(Error::ToolFailed {
                status,
                command: command.to_shell_string(),
            });
        }

        log::info!("{} finished: {}", command.program(), status);
        Ok(status)
    }
}

async fn pump<R>(
    reader: Option<R>,
    level: log::Level,
    output: Option<&UnboundedSender<String>>,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return Ok(());
    };

    // split on raw bytes: the tool may print non-UTF-8 text
    let mut segments = BufReader::new(reader).split(b'\n');
    while let Some(segment) = segments.next_segment().await? {
        let line = String::from_utf8_lossy(&segment)
            .trim_end_matches('\r')
            .to_string();
        log::log!(target: LOG_TARGET, level, "{}", line);
        if let Some(sender) = output {
            // receiver gone means nobody is watching; keep draining
            let _ = sender.send(line);
        }
    }
    Ok(())
}

/// A prepared registration: the command plus the warped image it produces.
#[derive(Debug, Clone)]
pub struct RegistrationJob {
    pub command: RegistrationCommand,
    pub warped_image: PathBuf,
}

impl RegistrationJob {
    pub fn prepare(session: &Session, params: &RegistrationParams, program: &str) -> Result<Self> {
        let command = RegistrationCommand::build(session, params, program)?;
        let warped_image = session
            .warped_output_path()
            .ok_or(Error::MissingMovingImage)?;
        Ok(Self {
            command,
            warped_image,
        })
    }

    /// Run the job and return the path of the warped image.
    pub async fn run(self, runner: &RegistrationRunner) -> Result<PathBuf> {
        runner.run(&self.command).await?;
        // TODO: warp the remaining moving channels with antsApplyTransforms
        Ok(self.warped_image)
    }
}

/// Build and run a registration for `session`, then make its warped image the
/// session's only warped image.
pub async fn register(
    session: &mut Session,
    params: &RegistrationParams,
    program: &str,
    runner: &RegistrationRunner,
) -> Result<PathBuf> {
    let warped_image = RegistrationJob::prepare(session, params, program)?
        .run(runner)
        .await?;
    session.set_registration_result(warped_image.clone());
    Ok(warped_image)
}
