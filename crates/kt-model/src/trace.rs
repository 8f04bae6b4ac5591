//! Trace entity: configuration, diagnostics and computed channels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use kt_core::TraceId;

use crate::channel::Channels;
use crate::error::ConfigError;
use crate::scheme::{Inertia, Integration, Interpolation};
use crate::store::Entity;

/// Upper bound on the number of integration steps of a single trace.
pub const MAX_STEPS: usize = 10_000_000;

/// Handle of an importable source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceFile {
    path: PathBuf,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name shown in pickers.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

impl fmt::Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Editable fields of a trace. `Results` stands for diagnostics plus channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceField {
    Name,
    File,
    Integration,
    Interpolation,
    Inertia,
    Mass,
    MinX,
    MaxX,
    InitV,
    Step,
    Results,
}

impl TraceField {
    pub const EDITABLE: [TraceField; 10] = [
        Self::Name,
        Self::File,
        Self::Integration,
        Self::Interpolation,
        Self::Inertia,
        Self::Mass,
        Self::MinX,
        Self::MaxX,
        Self::InitV,
        Self::Step,
    ];
}

impl fmt::Display for TraceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Name => "name",
            Self::File => "source file",
            Self::Integration => "integration scheme",
            Self::Interpolation => "interpolation scheme",
            Self::Inertia => "inertia model",
            Self::Mass => "mass",
            Self::MinX => "domain start",
            Self::MaxX => "domain end",
            Self::InitV => "initial velocity",
            Self::Step => "step size",
            Self::Results => "results",
        })
    }
}

/// User configuration of a trace. Every field may be unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceConfig {
    pub name: String,
    #[serde(default)]
    pub file: Option<SourceFile>,
    #[serde(default)]
    pub integration: Option<Integration>,
    #[serde(default)]
    pub interpolation: Option<Interpolation>,
    #[serde(default)]
    pub inertia: Option<Inertia>,
    #[serde(default)]
    pub mass: Option<f64>,
    #[serde(default)]
    pub min_x: Option<f64>,
    #[serde(default)]
    pub max_x: Option<f64>,
    #[serde(default)]
    pub init_v: Option<f64>,
    #[serde(default)]
    pub step: Option<f64>,
}

impl TraceConfig {
    /// Fresh configuration: default schemes, no numeric entries yet.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: None,
            integration: Some(Integration::default()),
            interpolation: Some(Interpolation::default()),
            inertia: Some(Inertia::default()),
            mass: None,
            min_x: None,
            max_x: None,
            init_v: None,
            step: None,
        }
    }

    /// Check that the configuration can be computed and resolve every field.
    ///
    /// Fails on the first missing field, in form order.
    pub fn validate(&self) -> Result<ResolvedConfig, ConfigError> {
        let integration = self.integration.ok_or(ConfigError::Missing {
            field: TraceField::Integration,
        })?;
        let interpolation = self.interpolation.ok_or(ConfigError::Missing {
            field: TraceField::Interpolation,
        })?;
        let inertia = self.inertia.ok_or(ConfigError::Missing {
            field: TraceField::Inertia,
        })?;
        let mass = required(self.mass, TraceField::Mass)?;
        let min_x = required(self.min_x, TraceField::MinX)?;
        let max_x = required(self.max_x, TraceField::MaxX)?;
        let init_v = required(self.init_v, TraceField::InitV)?;
        let step = required(self.step, TraceField::Step)?;

        if mass <= 0.0 {
            return Err(ConfigError::OutOfDomain {
                field: TraceField::Mass,
                reason: "must be positive",
            });
        }
        if step <= 0.0 {
            return Err(ConfigError::OutOfDomain {
                field: TraceField::Step,
                reason: "must be positive",
            });
        }
        if min_x >= max_x {
            return Err(ConfigError::EmptyDomain { min_x, max_x });
        }

        let resolved = ResolvedConfig {
            file: self.file.clone(),
            integration,
            interpolation,
            inertia,
            mass,
            min_x,
            max_x,
            init_v,
            step,
        };
        let steps = (max_x - min_x) / step;
        if steps > MAX_STEPS as f64 {
            return Err(ConfigError::TooManySteps {
                step,
                steps,
                limit: MAX_STEPS,
            });
        }
        Ok(resolved)
    }
}

fn required(value: Option<f64>, field: TraceField) -> Result<f64, ConfigError> {
    let value = value.ok_or(ConfigError::Missing { field })?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite { field, value })
    }
}

/// Fully specified configuration, produced by [`TraceConfig::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub file: Option<SourceFile>,
    pub integration: Integration,
    pub interpolation: Interpolation,
    pub inertia: Inertia,
    pub mass: f64,
    pub min_x: f64,
    pub max_x: f64,
    pub init_v: f64,
    pub step: f64,
}

impl ResolvedConfig {
    pub fn span(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Number of integration steps across the domain.
    ///
    /// A span that is a whole number of steps (within 1e-9) takes exactly that
    /// many; otherwise one extra, shortened step lands on `max_x`. The initial
    /// sample is not a step.
    pub fn step_count(&self) -> usize {
        let raw = self.span() / self.step;
        let nearest = raw.round();
        let n = if (raw - nearest).abs() <= 1e-9 * nearest.max(1.0) {
            nearest
        } else {
            raw.ceil()
        };
        (n as usize).max(1)
    }
}

/// Outcome of one integration run, as returned by the numeric engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceOutcome {
    pub interpolation_label: String,
    pub integration_label: String,
    pub step_size: f64,
    pub iterations: usize,
    pub total_time: f64,
    pub compute_time: f64,
    /// Signed, `E_end - E_start` in joules.
    pub energy_difference: f64,
    pub channels: Channels,
}

/// Read-only diagnostics of the last successful computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceDiagnostics {
    pub interpolation_label: String,
    pub integration_label: String,
    pub step_size: f64,
    pub iterations: usize,
    pub total_time: f64,
    pub compute_time: f64,
    pub energy_difference: f64,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Trace {
    id: TraceId,
    config: TraceConfig,
    diagnostics: Option<TraceDiagnostics>,
    channels: Channels,
}

impl Entity for Trace {
    type Id = TraceId;

    fn id(&self) -> TraceId {
        self.id
    }
}

macro_rules! setter {
    ($(#[$meta:meta])* $fn:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        /// Returns true when the value changed.
        pub fn $fn(&mut self, value: $ty) -> bool {
            if self.config.$field == value {
                return false;
            }
            self.config.$field = value;
            true
        }
    };
}

impl Trace {
    pub fn new(id: TraceId, name: impl Into<String>) -> Self {
        Self::with_config(id, TraceConfig::named(name))
    }

    pub fn with_config(id: TraceId, config: TraceConfig) -> Self {
        Self {
            id,
            config,
            diagnostics: None,
            channels: Channels::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> Option<&TraceDiagnostics> {
        self.diagnostics.as_ref()
    }

    pub fn channels(&self) -> &Channels {
        &self.channels
    }

    pub fn has_results(&self) -> bool {
        !self.channels.is_empty()
    }

    /// Returns true when the value changed.
    pub fn set_name(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.config.name == name {
            return false;
        }
        self.config.name = name;
        true
    }

    setter!(set_file, file, Option<SourceFile>);
    setter!(set_integration, integration, Option<Integration>);
    setter!(set_interpolation, interpolation, Option<Interpolation>);
    setter!(set_inertia, inertia, Option<Inertia>);
    setter!(set_mass, mass, Option<f64>);
    setter!(set_min_x, min_x, Option<f64>);
    setter!(set_max_x, max_x, Option<f64>);
    setter!(set_init_v, init_v, Option<f64>);
    setter!(set_step, step, Option<f64>);

    /// Replace diagnostics and channels with a finished computation.
    ///
    /// This is the only place computed data is written.
    pub fn apply_outcome(&mut self, outcome: TraceOutcome, computed_at: DateTime<Utc>) {
        let TraceOutcome {
            interpolation_label,
            integration_label,
            step_size,
            iterations,
            total_time,
            compute_time,
            energy_difference,
            channels,
        } = outcome;
        self.diagnostics = Some(TraceDiagnostics {
            interpolation_label,
            integration_label,
            step_size,
            iterations,
            total_time,
            compute_time,
            energy_difference,
            computed_at,
        });
        self.channels = channels;
    }

    pub fn clear_results(&mut self) {
        self.diagnostics = None;
        self.channels.clear();
    }
}
