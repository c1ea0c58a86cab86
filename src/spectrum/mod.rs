//! The spectrum session: state machine, per-frame pipeline, particle state.
//!
//! One `Spectrum` per playback request; sessions are never reset or reused.
//! All mutation happens from two places that never overlap: the decode
//! completion (before the first RUNNING frame) and the frame loop.

mod bars;
mod geometry;
mod particles;
mod render;

pub use geometry::Geometry;
pub use particles::{Particle, ParticleSystem};

use std::sync::{Arc, Mutex};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};

use crate::audio::{AudioEnvironment, AudioGraph};
use crate::config::Config;
use crate::render::DrawSurface;
use crate::timing::{FpsTracker, FrameHandle, FrameScheduler};

/// Session lifecycle. Only ever advances; DECODING is left for RUNNING on
/// decode success or FAILED (terminal) on decode rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectrumState {
    Idle,
    Decoding,
    Running,
    Failed,
}

type StateObserver = Box<dyn FnMut(SpectrumState) + Send>;

pub type SharedSpectrum = Arc<Mutex<Spectrum>>;

pub struct Spectrum {
    state: SpectrumState,
    config: Config,
    geometry: Geometry,
    particles: ParticleSystem,
    tick: u64,
    fps: FpsTracker,
    frame_handle: Option<FrameHandle>,
    observer: Option<StateObserver>,
    audio: Option<AudioGraph>,
    freq_data: Vec<u8>,
    rng: StdRng,
}

impl Spectrum {
    pub fn new(config: Config) -> Self {
        Self {
            state: SpectrumState::Idle,
            config,
            geometry: Geometry::default(),
            particles: ParticleSystem::new(),
            tick: 0,
            fps: FpsTracker::new(),
            frame_handle: None,
            observer: None,
            audio: None,
            freq_data: Vec::new(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn state(&self) -> SpectrumState {
        self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn fps(&self) -> f64 {
        self.fps.fps()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Register the state-change observer. Invoked once per transition;
    /// having none is fine.
    pub fn set_observer(&mut self, observer: impl FnMut(SpectrumState) + Send + 'static) {
        self.observer = Some(Box::new(observer));
    }

    fn set_state(&mut self, state: SpectrumState) {
        self.state = state;
        if let Some(observer) = self.observer.as_mut() {
            observer(state);
        }
    }

    fn begin_decoding(&mut self) {
        debug_assert_eq!(self.state, SpectrumState::Idle);
        self.set_state(SpectrumState::Decoding);
    }

    fn start_running(&mut self, graph: AudioGraph) {
        debug_assert_eq!(self.state, SpectrumState::Decoding);
        self.freq_data = vec![0; graph.frequency_bin_count()];
        self.audio = Some(graph);
        self.set_state(SpectrumState::Running);
    }

    fn mark_failed(&mut self) {
        debug_assert_eq!(self.state, SpectrumState::Decoding);
        self.set_state(SpectrumState::Failed);
    }

    /// Recompute the derived layout; call whenever the drawing surface is
    /// (re)sized.
    pub fn recompute_geometry(&mut self, width: f32, height: f32) {
        self.geometry = Geometry::compute(
            width,
            height,
            &self.config.bars,
            self.config.display.centre_y_override,
        );
    }

    /// Remember the handle of the frame request just issued, so `stop` can
    /// cancel it.
    pub fn frame_scheduled(&mut self, handle: FrameHandle) {
        self.frame_handle = Some(handle);
    }

    /// Cancel the pending frame request, ending the self-sustaining frame
    /// chain. The session itself is simply discarded afterwards.
    pub fn stop(&mut self, scheduler: &mut dyn FrameScheduler) {
        if let Some(handle) = self.frame_handle.take() {
            scheduler.cancel_frame(handle);
        }
    }

    /// Whether the underlying source has played past its end.
    pub fn playback_finished(&self, now: Instant) -> bool {
        self.audio.as_ref().is_some_and(|graph| graph.finished(now))
    }

    /// One full frame: sample, aggregate, clear, the three passes, epilogue.
    /// Precondition: the session is RUNNING; called earlier it draws nothing.
    pub fn render_frame(&mut self, surface: &mut dyn DrawSurface, now: Instant) {
        let Some(audio) = self.audio.as_mut() else {
            return;
        };
        audio.read_byte_frequency_data(now, &mut self.freq_data);
        let bars = bars::aggregate(
            &self.freq_data,
            self.geometry.bar_count,
            self.config.bars.sound_min,
            self.config.bars.multiplier,
        );

        surface.clear_rect(
            0.0,
            0.0,
            self.geometry.real_canvas_width,
            self.geometry.canvas_height,
        );
        render::bar_pass(surface, &self.config, &self.geometry, &bars);
        render::lighting_pass(surface, &self.config, &self.geometry, &bars);
        render::particle_pass(
            surface,
            &self.config,
            &self.geometry,
            &mut self.particles,
            self.tick,
            &mut self.rng,
        );

        if self.config.display.show_fps {
            self.fps.update(now);
        }
        self.tick += 1;
    }
}

/// Start a playback session: returns immediately with the session in
/// DECODING, advancing to RUNNING (audio graph attached) once the decode
/// completes on the blocking pool, or to FAILED if the buffer is rejected.
pub fn play(env: &AudioEnvironment, config: Config, encoded: Vec<u8>) -> SharedSpectrum {
    let spectrum = Arc::new(Mutex::new(Spectrum::new(config)));
    spectrum.lock().unwrap().begin_decoding();

    let env = env.clone();
    let session = Arc::clone(&spectrum);
    tokio::task::spawn_blocking(move || match env.decode(&encoded) {
        Ok(audio) => {
            info!(duration = ?audio.duration, sample_rate = audio.sample_rate, "audio decoded");
            let mut spectrum = session.lock().unwrap();
            let graph = AudioGraph::connect(audio, &spectrum.config.analysis, Instant::now());
            spectrum.start_running(graph);
        }
        Err(e) => {
            error!("{}", e);
            session.lock().unwrap().mark_failed();
        }
    });

    spectrum
}
