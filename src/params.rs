//! Registration parameters as edited in the GUI and serialised into the
//! `antsRegistration` command line.
//!
//! Numeric values are kept as the strings the user typed; the external tool
//! is the only thing that interprets them.

use serde::{Deserialize, Serialize};

/// How the moving image is initially aligned to the fixed image (`-r`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InitialMovingTransform {
    #[default]
    GeometricCenter,
    ImageIntensities,
    ImageOrigins,
}

impl InitialMovingTransform {
    pub const ALL: [InitialMovingTransform; 3] = [
        InitialMovingTransform::GeometricCenter,
        InitialMovingTransform::ImageIntensities,
        InitialMovingTransform::ImageOrigins,
    ];

    /// Numeric code understood by `antsRegistration -r [fixed,moving,code]`.
    pub fn code(self) -> u8 {
        match self {
            InitialMovingTransform::GeometricCenter => 0,
            InitialMovingTransform::ImageIntensities => 1,
            InitialMovingTransform::ImageOrigins => 2,
        }
    }
}

impl std::fmt::Display for InitialMovingTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InitialMovingTransform::GeometricCenter => write!(f, "Geometric Center"),
            InitialMovingTransform::ImageIntensities => write!(f, "Image Intensities"),
            InitialMovingTransform::ImageOrigins => write!(f, "Image Origins"),
        }
    }
}

/// Similarity metric used by a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    CrossCorrelation,
    MutualInformation,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::CrossCorrelation, Metric::MutualInformation];

    /// Metric name on the command line.
    pub fn flag(self) -> &'static str {
        match self {
            Metric::CrossCorrelation => "CC",
            Metric::MutualInformation => "MI",
        }
    }

    /// Editable text fields of this metric, in form order.
    pub fn fields(self) -> &'static [MetricField] {
        match self {
            Metric::CrossCorrelation => &[
                MetricField::MetricWeight,
                MetricField::Radius,
                MetricField::SamplingPercentage,
            ],
            Metric::MutualInformation => &[
                MetricField::MetricWeight,
                MetricField::NumBins,
                MetricField::SamplingPercentage,
            ],
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::CrossCorrelation => write!(f, "Cross-Correlation"),
            Metric::MutualInformation => write!(f, "Mutual Information"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplingStrategy {
    None,
    Regular,
    Random,
}

impl SamplingStrategy {
    pub const ALL: [SamplingStrategy; 3] = [
        SamplingStrategy::None,
        SamplingStrategy::Regular,
        SamplingStrategy::Random,
    ];
}

impl std::fmt::Display for SamplingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SamplingStrategy::None => write!(f, "None"),
            SamplingStrategy::Regular => write!(f, "Regular"),
            SamplingStrategy::Random => write!(f, "Random"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossCorrelationParams {
    pub metric_weight: String,
    pub radius: String,
    pub sampling_strategy: SamplingStrategy,
    pub sampling_percentage: String,
}

impl Default for CrossCorrelationParams {
    fn default() -> Self {
        Self {
            metric_weight: "1".to_string(),
            radius: "2".to_string(),
            sampling_strategy: SamplingStrategy::None,
            sampling_percentage: "0.25".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutualInformationParams {
    pub metric_weight: String,
    pub num_bins: String,
    pub sampling_strategy: SamplingStrategy,
    pub sampling_percentage: String,
}

impl Default for MutualInformationParams {
    fn default() -> Self {
        Self {
            metric_weight: "1".to_string(),
            num_bins: "32".to_string(),
            sampling_strategy: SamplingStrategy::Regular,
            sampling_percentage: "0.25".to_string(),
        }
    }
}

/// Text fields of a metric block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricField {
    MetricWeight,
    Radius,
    NumBins,
    SamplingPercentage,
}

impl MetricField {
    pub fn label(self) -> &'static str {
        match self {
            MetricField::MetricWeight => "Metric weight",
            MetricField::Radius => "Radius",
            MetricField::NumBins => "Number of bins",
            MetricField::SamplingPercentage => "Sampling percentage",
        }
    }
}

/// Transform stages in the order they are handed to the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Translation,
    Rigid,
    Affine,
    SyN,
}

impl StageKind {
    pub const ALL: [StageKind; 4] = [
        StageKind::Translation,
        StageKind::Rigid,
        StageKind::Affine,
        StageKind::SyN,
    ];

    /// Transform name on the command line.
    pub fn transform(self) -> &'static str {
        match self {
            StageKind::Translation => "Translation",
            StageKind::Rigid => "Rigid",
            StageKind::Affine => "Affine",
            StageKind::SyN => "SyN",
        }
    }

    pub fn fields(self) -> &'static [StageField] {
        match self {
            StageKind::SyN => &[
                StageField::GradientStep,
                StageField::UpdateFieldVariance,
                StageField::TotalFieldVariance,
                StageField::NumIterations,
                StageField::ConvergenceThreshold,
                StageField::ConvergenceWindowSize,
                StageField::ShrinkFactors,
                StageField::GaussianSigma,
            ],
            _ => &[
                StageField::GradientStep,
                StageField::NumIterations,
                StageField::ConvergenceThreshold,
                StageField::ConvergenceWindowSize,
                StageField::ShrinkFactors,
                StageField::GaussianSigma,
            ],
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageKind::Translation => write!(f, "Translation"),
            StageKind::Rigid => write!(f, "Rigid transform"),
            StageKind::Affine => write!(f, "Affine transform"),
            StageKind::SyN => write!(f, "SyN transform"),
        }
    }
}

/// Text fields of a stage block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageField {
    GradientStep,
    UpdateFieldVariance,
    TotalFieldVariance,
    NumIterations,
    ConvergenceThreshold,
    ConvergenceWindowSize,
    ShrinkFactors,
    GaussianSigma,
}

impl StageField {
    pub fn label(self) -> &'static str {
        match self {
            StageField::GradientStep => "Gradient step",
            StageField::UpdateFieldVariance => "Update field variance",
            StageField::TotalFieldVariance => "Total field variance",
            StageField::NumIterations => "Number of iterations",
            StageField::ConvergenceThreshold => "Convergence threshold",
            StageField::ConvergenceWindowSize => "Convergence window size",
            StageField::ShrinkFactors => "Shrink factors",
            StageField::GaussianSigma => "Gaussian smoothing sigma",
        }
    }
}

/// SyN regularisation: `SyN[step, update variance, total variance]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldVariance {
    pub update: String,
    pub total: String,
}

impl Default for FieldVariance {
    fn default() -> Self {
        Self {
            update: "6".to_string(),
            total: "0".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageParams {
    pub enabled: bool,
    pub gradient_step: String,
    /// Only present for SyN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_variance: Option<FieldVariance>,
    pub metric: Metric,
    pub num_iterations: String,
    pub convergence_threshold: String,
    pub convergence_window_size: String,
    pub shrink_factors: String,
    pub gaussian_sigma: String,
    #[serde(default)]
    pub cross_correlation: CrossCorrelationParams,
    #[serde(default)]
    pub mutual_information: MutualInformationParams,
}

impl StageParams {
    /// Defaults shared by the translation, rigid and affine stages.
    pub fn linear() -> Self {
        Self {
            enabled: true,
            gradient_step: "0.1".to_string(),
            field_variance: None,
            metric: Metric::MutualInformation,
            num_iterations: "200x200x200x0".to_string(),
            convergence_threshold: "1e-8".to_string(),
            convergence_window_size: "10".to_string(),
            shrink_factors: "12x8x4x2".to_string(),
            gaussian_sigma: "4x3x2x1".to_string(),
            cross_correlation: CrossCorrelationParams::default(),
            mutual_information: MutualInformationParams::default(),
        }
    }

    pub fn syn() -> Self {
        Self {
            enabled: true,
            gradient_step: "0.1".to_string(),
            field_variance: Some(FieldVariance::default()),
            metric: Metric::CrossCorrelation,
            num_iterations: "200x200x200x200x10".to_string(),
            convergence_threshold: "1e-7".to_string(),
            convergence_window_size: "10".to_string(),
            shrink_factors: "12x8x4x2x1".to_string(),
            gaussian_sigma: "4x3x2x1x0".to_string(),
            cross_correlation: CrossCorrelationParams::default(),
            mutual_information: MutualInformationParams::default(),
        }
    }

    pub fn field(&self, field: StageField) -> Option<&str> {
        let value = match field {
            StageField::GradientStep => &self.gradient_step,
            StageField::UpdateFieldVariance => &self.field_variance.as_ref()?.update,
            StageField::TotalFieldVariance => &self.field_variance.as_ref()?.total,
            StageField::NumIterations => &self.num_iterations,
            StageField::ConvergenceThreshold => &self.convergence_threshold,
            StageField::ConvergenceWindowSize => &self.convergence_window_size,
            StageField::ShrinkFactors => &self.shrink_factors,
            StageField::GaussianSigma => &self.gaussian_sigma,
        };
        Some(value.as_str())
    }

    /// Returns false when the field does not exist on this stage.
    pub fn set_field(&mut self, field: StageField, value: String) -> bool {
        let slot = match field {
            StageField::GradientStep => &mut self.gradient_step,
            StageField::UpdateFieldVariance => match self.field_variance.as_mut() {
                Some(variance) => &mut variance.update,
                None => return false,
            },
            StageField::TotalFieldVariance => match self.field_variance.as_mut() {
                Some(variance) => &mut variance.total,
                None => return false,
            },
            StageField::NumIterations => &mut self.num_iterations,
            StageField::ConvergenceThreshold => &mut self.convergence_threshold,
            StageField::ConvergenceWindowSize => &mut self.convergence_window_size,
            StageField::ShrinkFactors => &mut self.shrink_factors,
            StageField::GaussianSigma => &mut self.gaussian_sigma,
        };
        *slot = value;
        true
    }

    /// Value of a field of the currently selected metric.
    pub fn metric_field(&self, field: MetricField) -> Option<&str> {
        let value = match (self.metric, field) {
            (Metric::CrossCorrelation, MetricField::MetricWeight) => {
                &self.cross_correlation.metric_weight
            }
            (Metric::CrossCorrelation, MetricField::Radius) => &self.cross_correlation.radius,
            (Metric::CrossCorrelation, MetricField::SamplingPercentage) => {
                &self.cross_correlation.sampling_percentage
            }
            (Metric::MutualInformation, MetricField::MetricWeight) => {
                &self.mutual_information.metric_weight
            }
            (Metric::MutualInformation, MetricField::NumBins) => &self.mutual_information.num_bins,
            (Metric::MutualInformation, MetricField::SamplingPercentage) => {
                &self.mutual_information.sampling_percentage
            }
            _ => return None,
        };
        Some(value.as_str())
    }

    pub fn set_metric_field(&mut self, field: MetricField, value: String) -> bool {
        let slot = match (self.metric, field) {
            (Metric::CrossCorrelation, MetricField::MetricWeight) => {
                &mut self.cross_correlation.metric_weight
            }
            (Metric::CrossCorrelation, MetricField::Radius) => &mut self.cross_correlation.radius,
            (Metric::CrossCorrelation, MetricField::SamplingPercentage) => {
                &mut self.cross_correlation.sampling_percentage
            }
            (Metric::MutualInformation, MetricField::MetricWeight) => {
                &mut self.mutual_information.metric_weight
            }
            (Metric::MutualInformation, MetricField::NumBins) => {
                &mut self.mutual_information.num_bins
            }
            (Metric::MutualInformation, MetricField::SamplingPercentage) => {
                &mut self.mutual_information.sampling_percentage
            }
            _ => return false,
        };
        *slot = value;
        true
    }

    pub fn sampling_strategy(&self) -> SamplingStrategy {
        match self.metric {
            Metric::CrossCorrelation => self.cross_correlation.sampling_strategy,
            Metric::MutualInformation => self.mutual_information.sampling_strategy,
        }
    }

    pub fn set_sampling_strategy(&mut self, strategy: SamplingStrategy) {
        match self.metric {
            Metric::CrossCorrelation => self.cross_correlation.sampling_strategy = strategy,
            Metric::MutualInformation => self.mutual_information.sampling_strategy = strategy,
        }
    }
}

/// Non-fatal problems with the current parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamIssue {
    NoStageEnabled,
    EmptyPrefix,
    EmptyField {
        stage: StageKind,
        field: &'static str,
    },
    LevelMismatch {
        stage: StageKind,
        iterations: usize,
        shrink_factors: usize,
        sigmas: usize,
    },
}

impl std::fmt::Display for ParamIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamIssue::NoStageEnabled => write!(f, "No transform stage is enabled"),
            ParamIssue::EmptyPrefix => write!(f, "Transform prefix is empty"),
            ParamIssue::EmptyField { stage, field } => {
                write!(f, "{}: {} is empty", stage.transform(), field)
            }
            ParamIssue::LevelMismatch {
                stage,
                iterations,
                shrink_factors,
                sigmas,
            } => write!(
                f,
                "{}: {} iteration levels, {} shrink factors, {} smoothing sigmas",
                stage.transform(),
                iterations,
                shrink_factors,
                sigmas
            ),
        }
    }
}

fn level_count(schedule: &str) -> usize {
    schedule.split('x').count()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationParams {
    /// Output transform prefix (`-o [prefix,warped]`).
    pub prefix: String,
    pub initial_moving_transform: InitialMovingTransform,
    pub translation: StageParams,
    pub rigid: StageParams,
    pub affine: StageParams,
    pub syn: StageParams,
}

impl Default for RegistrationParams {
    fn default() -> Self {
        Self {
            prefix: "warp_".to_string(),
            initial_moving_transform: InitialMovingTransform::default(),
            translation: StageParams::linear(),
            rigid: StageParams::linear(),
            affine: StageParams::linear(),
            syn: StageParams::syn(),
        }
    }
}

impl RegistrationParams {
    pub fn stage(&self, kind: StageKind) -> &StageParams {
        match kind {
            StageKind::Translation => &self.translation,
            StageKind::Rigid => &self.rigid,
            StageKind::Affine => &self.affine,
            StageKind::SyN => &self.syn,
        }
    }

    pub fn stage_mut(&mut self, kind: StageKind) -> &mut StageParams {
        match kind {
            StageKind::Translation => &mut self.translation,
            StageKind::Rigid => &mut self.rigid,
            StageKind::Affine => &mut self.affine,
            StageKind::SyN => &mut self.syn,
        }
    }

    /// Restore values a hand-edited settings file may have left out.
    pub fn fill_missing_fields(&mut self) {
        self.syn
            .field_variance
            .get_or_insert_with(FieldVariance::default);
    }

    /// Enabled stages in command-line order.
    pub fn enabled_stages(&self) -> impl Iterator<Item = (StageKind, &StageParams)> {
        StageKind::ALL
            .into_iter()
            .map(|kind| (kind, self.stage(kind)))
            .filter(|(_, stage)| stage.enabled)
    }

    pub fn validate(&self) -> Vec<ParamIssue> {
        let mut issues = Vec::new();

        if self.prefix.trim().is_empty() {
            issues.push(ParamIssue::EmptyPrefix);
        }
        if self.enabled_stages().next().is_none() {
            issues.push(ParamIssue::NoStageEnabled);
        }

        for (kind, stage) in self.enabled_stages() {
            for &field in kind.fields() {
                if stage.field(field).is_some_and(|v| v.trim().is_empty()) {
                    issues.push(ParamIssue::EmptyField {
                        stage: kind,
                        field: field.label(),
                    });
                }
            }
            for &field in stage.metric.fields() {
                if stage.metric_field(field).is_some_and(|v| v.trim().is_empty()) {
                    issues.push(ParamIssue::EmptyField {
                        stage: kind,
                        field: field.label(),
                    });
                }
            }

            let iterations = level_count(&stage.num_iterations);
            let shrink_factors = level_count(&stage.shrink_factors);
            let sigmas = level_count(&stage.gaussian_sigma);
            if iterations != shrink_factors || shrink_factors != sigmas {
                issues.push(ParamIssue::LevelMismatch {
                    stage: kind,
                    iterations,
                    shrink_factors,
                    sigmas,
                });
            }
        }

        issues
    }
}
