pub mod command;
pub mod errors;
pub mod logger;
pub mod params;
pub mod render;
pub mod runner;
pub mod session;
pub mod settings;
pub mod volume;

pub use command::RegistrationCommand;
pub use errors::{Error, Result};
pub use params::{
    InitialMovingTransform, Metric, MetricField, ParamIssue, RegistrationParams,
    SamplingStrategy, StageField, StageKind, StageParams,
};
pub use runner::{RegistrationJob, RegistrationRunner, register};
pub use session::Session;
pub use settings::Settings;
pub use volume::{IntensityMapping, Volume, is_nifti_path};

#[cfg(feature = "gui")]
pub mod gui;
