mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from antsreg for tests
pub use antsreg::{
    Error, IntensityMapping, Metric, RegistrationCommand, RegistrationParams, SamplingStrategy,
    Session, StageKind, Volume,
};
