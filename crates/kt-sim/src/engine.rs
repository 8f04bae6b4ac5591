//! Trace integration: configuration in, channels and diagnostics out.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use kt_core::Stopwatch;
use kt_model::{Channel, Channels, Choice, ConfigError, ResolvedConfig, TraceConfig, TraceOutcome};
use tracing::debug;

use crate::body::{BodyState, Observation, RollingBody};
use crate::error::{SimError, SimResult};
use crate::integrator::step_with;
use crate::profile::Profile;
use crate::track::TrackLoader;

/// Standard gravity, m/s².
pub const GRAVITY: f64 = 9.81;

/// Shared flag a running integration polls once per step.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Integrate a trace configuration to completion.
pub fn integrate(config: &TraceConfig, tracks: &dyn TrackLoader) -> SimResult<TraceOutcome> {
    integrate_with_cancel(config, tracks, &CancelToken::new())
}

/// Integrate a trace configuration, giving up with [`SimError::Cancelled`]
/// as soon as `cancel` is raised. A cancelled run yields nothing.
pub fn integrate_with_cancel(
    config: &TraceConfig,
    tracks: &dyn TrackLoader,
    cancel: &CancelToken,
) -> SimResult<TraceOutcome> {
    let resolved = config.validate()?;
    let profile = build_profile(&resolved, tracks)?;
    let body = RollingBody::new(
        profile,
        resolved.mass,
        resolved.inertia.factor(),
        GRAVITY,
    );
    run(&resolved, body, cancel)
}

fn build_profile(config: &ResolvedConfig, tracks: &dyn TrackLoader) -> SimResult<Profile> {
    let Some(file) = &config.file else {
        return Ok(Profile::Flat);
    };
    let source_error = |err: SimError| ConfigError::Source {
        path: file.path().to_path_buf(),
        message: err.to_string(),
    };
    let samples = tracks.load(file).map_err(source_error)?;
    let profile = Profile::build(&samples, config.interpolation).map_err(source_error)?;
    Ok(profile)
}

fn run(
    config: &ResolvedConfig,
    mut body: RollingBody,
    cancel: &CancelToken,
) -> SimResult<TraceOutcome> {
    let stopwatch = Stopwatch::start();
    let steps = config.step_count();
    debug!(
        steps,
        step = config.step,
        scheme = config.integration.key(),
        track = body.profile().label(),
        "integrating trace"
    );

    let mut recorder = Recorder::with_capacity(steps + 1);
    let mut state = BodyState {
        x: body.profile().start_x(),
        v: config.init_v,
    };
    recorder.push(body.observe(config.min_x, &state));

    for i in 0..steps {
        if cancel.is_cancelled() {
            debug!(completed = i, "integration cancelled");
            return Err(SimError::Cancelled);
        }
        let t = config.min_x + i as f64 * config.step;
        let (t_next, dt) = if i + 1 == steps {
            (config.max_x, config.max_x - t)
        } else {
            (config.min_x + (i + 1) as f64 * config.step, config.step)
        };
        state = step_with(config.integration, &mut body, t, &state, dt)?;
        if !state.x.is_finite() || !state.v.is_finite() {
            return Err(SimError::NonPhysical {
                what: "state left the finite range",
            });
        }
        recorder.push(body.observe(t_next, &state));
    }

    let energy_difference = recorder.energy_difference();
    let compute_time = stopwatch.elapsed_s();
    debug!(steps, compute_time, energy_difference, "integration finished");

    Ok(TraceOutcome {
        interpolation_label: body.profile().label().to_string(),
        integration_label: config.integration.label().to_string(),
        step_size: config.step,
        iterations: steps,
        total_time: config.span(),
        compute_time,
        energy_difference,
        channels: recorder.into_channels(),
    })
}

/// Column-wise storage for observations.
struct Recorder {
    columns: [Vec<f64>; 9],
}

impl Recorder {
    const ORDER: [Channel; 9] = [
        Channel::Time,
        Channel::Position,
        Channel::Height,
        Channel::Velocity,
        Channel::Acceleration,
        Channel::Force,
        Channel::KineticEnergy,
        Channel::PotentialEnergy,
        Channel::Energy,
    ];

    /// Upper bound on samples reserved per column before the run starts.
    /// Longer runs grow as they go.
    const RESERVE_LIMIT: usize = 1 << 16;

    fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(Self::RESERVE_LIMIT);
        Self {
            columns: std::array::from_fn(|_| Vec::with_capacity(capacity)),
        }
    }

    fn push(&mut self, obs: Observation) {
        let row = [
            obs.time,
            obs.position,
            obs.height,
            obs.velocity,
            obs.acceleration,
            obs.force,
            obs.kinetic_energy,
            obs.potential_energy,
            obs.energy(),
        ];
        for (column, value) in self.columns.iter_mut().zip(row) {
            column.push(value);
        }
    }

    fn energy_difference(&self) -> f64 {
        let energy = &self.columns[8];
        match (energy.first(), energy.last()) {
            (Some(start), Some(end)) => end - start,
            _ => 0.0,
        }
    }

    fn into_channels(self) -> Channels {
        Self::ORDER.into_iter().zip(self.columns).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{MemoryTracks, NoTracks, Sample};
    use kt_model::{Integration, SourceFile, TraceField};

    fn flat(min_x: f64, max_x: f64, step: f64) -> TraceConfig {
        TraceConfig {
            mass: Some(1.0),
            min_x: Some(min_x),
            max_x: Some(max_x),
            init_v: Some(2.0),
            step: Some(step),
            ..TraceConfig::named("flat")
        }
    }

    #[test]
    fn uneven_span_shortens_last_step() {
        let outcome = integrate(&flat(0.0, 1.0, 0.3), &NoTracks).unwrap();
        assert_eq!(outcome.iterations, 4);
        let time = outcome.channels.get(Channel::Time);
        assert_eq!(time.len(), 5);
        assert_eq!(*time.last().unwrap(), 1.0);
        // constant speed on flat ground
        let position = outcome.channels.get(Channel::Position);
        assert!((position.last().unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(outcome.interpolation_label, "Flat");
        assert_eq!(outcome.energy_difference, 0.0);
    }

    #[test]
    fn missing_field_is_a_config_error() {
        let mut config = flat(0.0, 1.0, 0.1);
        config.step = None;
        let err = integrate(&config, &NoTracks).unwrap_err();
        assert_eq!(
            err,
            SimError::Config(ConfigError::Missing {
                field: TraceField::Step
            })
        );
    }

    #[test]
    fn unknown_track_is_a_config_error() {
        let mut config = flat(0.0, 1.0, 0.1);
        config.file = Some(SourceFile::new("missing.txt"));
        let err = integrate(&config, &MemoryTracks::new()).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn long_runs_do_not_reserve_every_sample() {
        let recorder = Recorder::with_capacity(kt_model::MAX_STEPS + 1);
        for column in &recorder.columns {
            assert!(column.capacity() <= Recorder::RESERVE_LIMIT);
        }
        let short = Recorder::with_capacity(11);
        assert!(short.columns.iter().all(|c| c.capacity() >= 11));
    }

    #[test]
    fn cancelled_run_yields_nothing() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = integrate_with_cancel(&flat(0.0, 1.0, 0.1), &NoTracks, &cancel).unwrap_err();
        assert_eq!(err, SimError::Cancelled);
    }

    #[test]
    fn starts_at_first_sample() {
        let mut tracks = MemoryTracks::new();
        tracks.insert("hill.txt", vec![Sample::new(3.0, 1.0), Sample::new(5.0, 0.0)]);
        let mut config = flat(0.0, 0.5, 0.1);
        config.file = Some(SourceFile::new("hill.txt"));
        config.integration = Some(Integration::Euler);

        let outcome = integrate(&config, &tracks).unwrap();
        assert_eq!(outcome.channels.get(Channel::Position)[0], 3.0);
        assert_eq!(outcome.channels.get(Channel::Height)[0], 1.0);
        assert_eq!(outcome.integration_label, "Euler");
    }
}
