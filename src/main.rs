use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use antsreg::logger::CapturingLogger;
use antsreg::settings::{Settings, load_settings, load_settings_from};
use antsreg::{
    IntensityMapping, RegistrationCommand, RegistrationRunner, Session, Volume, register, render,
};

#[derive(Parser)]
#[command(name = "antsreg")]
#[command(about = "Set up, run and inspect antsRegistration image registrations")]
struct Cli {
    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// antsRegistration executable, overrides the settings file
    #[arg(long, global = true, value_name = "PROGRAM")]
    ants: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    open: OpenArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Images preloaded into the GUI.
#[derive(Args)]
struct OpenArgs {
    /// Fixed (reference) image
    #[arg(long, value_name = "NIFTI")]
    fixed: Option<PathBuf>,

    /// Moving image channel(s)
    #[arg(long, value_name = "NIFTI", num_args = 1..)]
    moving: Vec<PathBuf>,
}

#[derive(Args)]
struct RegistrationArgs {
    /// Fixed (reference) image
    #[arg(long, value_name = "NIFTI")]
    fixed: PathBuf,

    /// Moving image channel(s)
    #[arg(long, value_name = "NIFTI", num_args = 1.., required = true)]
    moving: Vec<PathBuf>,

    /// Index of the moving channel used for registration
    #[arg(long, default_value_t = 0)]
    channel: usize,
}

impl RegistrationArgs {
    fn session(&self) -> anyhow::Result<Session> {
        let mut session = Session::new();
        session.set_fixed_image(&self.fixed);
        session.add_moving_images(self.moving.iter().cloned());
        session.set_registration_channel(self.channel)?;
        Ok(session)
    }
}

#[derive(Args)]
struct OverlayArgs {
    /// Fixed (reference) image
    #[arg(long, value_name = "NIFTI")]
    fixed: PathBuf,

    /// Warped moving image
    #[arg(long, value_name = "NIFTI")]
    warped: PathBuf,

    /// Slice index (defaults to the middle slice)
    #[arg(long)]
    slice: Option<usize>,

    /// Opacity of the warped image, 0 to 1 (defaults to the saved setting)
    #[arg(long)]
    alpha: Option<f32>,

    /// Stretch each volume's min..max to 0..255 instead of clamping
    #[arg(long)]
    min_max: bool,

    /// Output PNG
    #[arg(short, long, value_name = "PNG")]
    out: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the antsRegistration command line
    Command(RegistrationArgs),
    /// Run the registration without the GUI
    Run(RegistrationArgs),
    /// Render the warped image over the fixed image for one slice
    Overlay(OverlayArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "antsreg=debug,antsRegistration=info"
    } else {
        "antsreg=info,antsRegistration=info"
    };
    CapturingLogger::init(filter).context("Failed to install logger")?;

    let mut settings = match &cli.settings {
        Some(path) => load_settings_from(path),
        None => load_settings(),
    };
    if let Some(ants) = cli.ants {
        settings.ants_registration = ants;
    }

    match cli.command {
        None => launch_gui(cli.open, settings, cli.settings),
        Some(Commands::Command(args)) => print_command(&args, &settings),
        Some(Commands::Run(args)) => run_headless(&args, &settings),
        Some(Commands::Overlay(args)) => render_overlay(&args, &settings),
    }
}

#[cfg(feature = "gui")]
fn launch_gui(
    open: OpenArgs,
    settings: Settings,
    settings_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    antsreg::gui::run(antsreg::gui::LaunchOptions {
        fixed_image: open.fixed,
        moving_images: open.moving,
        settings,
        settings_path,
    })
    .context("GUI exited with an error")
}

#[cfg(not(feature = "gui"))]
fn launch_gui(
    _open: OpenArgs,
    _settings: Settings,
    _settings_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    anyhow::bail!("Built without the `gui` feature; use one of the subcommands")
}

fn print_command(args: &RegistrationArgs, settings: &Settings) -> anyhow::Result<()> {
    let session = args.session()?;
    let command =
        RegistrationCommand::build(&session, &settings.params, &settings.ants_registration)?;

    for issue in settings.params.validate() {
        log::warn!("{}", issue);
    }
    println!("{}", command.to_shell_string());
    Ok(())
}

fn run_headless(args: &RegistrationArgs, settings: &Settings) -> anyhow::Result<()> {
    let mut session = args.session()?;
    for issue in settings.params.validate() {
        log::warn!("{}", issue);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let warped = runtime.block_on(register(
        &mut session,
        &settings.params,
        &settings.ants_registration,
        &RegistrationRunner::new(),
    ))?;

    println!("{}", warped.display());
    Ok(())
}

fn render_overlay(args: &OverlayArgs, settings: &Settings) -> anyhow::Result<()> {
    let mapping = if args.min_max {
        IntensityMapping::MinMax
    } else {
        settings.intensity_mapping
    };
    let alpha = args.alpha.unwrap_or(settings.overlay_alpha);

    let fixed = Volume::load(&args.fixed)
        .with_context(|| format!("Failed to load fixed image {}", args.fixed.display()))?;
    let warped = Volume::load(&args.warped)
        .with_context(|| format!("Failed to load warped image {}", args.warped.display()))?;

    let z = args.slice.unwrap_or(fixed.depth() / 2);
    let image = render::overlay(&fixed.slice(z, mapping)?, &warped.slice(z, mapping)?, alpha)?;

    image
        .save(&args.out)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;
    log::info!("Slice {} written to {}", z, args.out.display());
    Ok(())
}
