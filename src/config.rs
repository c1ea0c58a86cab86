use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::color::Rgba;

/// Full tunable bag for one visualizer session.
///
/// Set once at session creation and read-only afterwards; mutating it after
/// playback reaches RUNNING is not guarded against and not supported.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub analysis: AnalysisConfig,
    pub bars: BarsConfig,
    pub glow: GlowConfig,
    pub particles: ParticlesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Target frame rate for the scheduler.
    pub target_fps: u32,
    /// Track and display a smoothed frames-per-second estimate.
    pub show_fps: bool,
    /// Override the vertical centre line (default: canvas height / 2).
    pub centre_y_override: Option<f32>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            show_fps: false,
            centre_y_override: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// FFT size; the analyser exposes fft_size / 2 frequency bins.
    pub fft_size: usize,
    /// Per-bin exponential smoothing (0.0 = none, towards 1.0 = sluggish).
    pub smoothing: f32,
    /// Magnitudes at or below this level map to byte value 0.
    pub min_db: f32,
    /// Magnitudes at or above this level map to byte value 255.
    pub max_db: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            smoothing: 0.8,
            min_db: -100.0,
            max_db: -30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BarsConfig {
    /// Horizontal slot width of one bar.
    pub bar_width: f32,
    /// Gap between adjacent bar slots.
    pub bar_gap: f32,
    /// Width of the filled rectangle inside the slot.
    pub actual_bar_width: f32,
    /// Floor value for a bar so silent bands still show a sliver.
    pub sound_min: f32,
    /// Scales the averaged bin magnitude per bar.
    pub multiplier: f32,
    /// Draw bars downward from the centre line instead of upward.
    pub flip_bars: bool,
    /// Minimum side margin; extra canvas width is split around it to centre
    /// the bar field.
    pub min_margin: f32,
}

impl BarsConfig {
    pub fn total_bar_width(&self) -> f32 {
        self.bar_width + self.bar_gap
    }
}

impl Default for BarsConfig {
    fn default() -> Self {
        Self {
            bar_width: 3.0,
            bar_gap: 2.0,
            actual_bar_width: 3.0,
            sound_min: 2.0,
            multiplier: 1.0,
            flip_bars: false,
            min_margin: 50.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlowConfig {
    /// Shadow color behind every bar.
    pub glow_color: Rgba,
    /// Shadow blur radius behind every bar.
    pub glow_radius: f32,
    pub primary_start: Rgba,
    pub primary_end: Rgba,
    /// Gradient offset where the primary glow reaches its end color.
    pub primary_color_stop: f32,
    pub secondary_start: Rgba,
    pub secondary_end: Rgba,
    pub secondary_color_stop: f32,
    /// Glow rectangle width as a multiple of bar_width.
    pub lighting_scale_x: f32,
    /// Glow rectangle height as a multiple of the bar value.
    pub lighting_scale_y: f32,
    /// Mirrored glow on the side without bars. Disable when that side is not
    /// visible; it roughly halves the lighting-pass work.
    pub draw_secondary_glow: bool,
}

impl Default for GlowConfig {
    fn default() -> Self {
        Self {
            glow_color: Rgba::from_rgb8(0x42, 0xb6, 0xff),
            glow_radius: 10.0,
            primary_start: Rgba::from_rgb8(100, 100, 100).with_opacity(0.5),
            primary_end: Rgba::from_rgb8(50, 50, 50).with_opacity(0.0),
            primary_color_stop: 1.0,
            secondary_start: Rgba::WHITE.with_opacity(0.3),
            secondary_end: Rgba::from_rgb8(50, 50, 50).with_opacity(0.0),
            secondary_color_stop: 0.2,
            lighting_scale_x: 10.0,
            lighting_scale_y: 10.0,
            draw_secondary_glow: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticlesConfig {
    /// Fill and shadow color; the particle's own opacity is applied on top.
    pub glow_color: Rgba,
    /// Upper bound for the random per-particle shadow blur.
    pub max_glow_radius: f32,
    /// Spawn every N-th frame (0 disables spawning).
    pub spawn_increment: u64,
    /// Particles spawned per spawn event (0 disables particles).
    pub per_run_spawn: u32,
    pub movement_speed: f32,
    pub speed_divisor: f32,
    /// Per-frame drift is capped at this many units.
    pub max_diff: f32,
    /// Side length of the particle square.
    pub box_size: f32,
    /// Opacity lost per frame; a fresh particle lives ~1/this frames.
    pub opacity_reduction_speed: f32,
    /// Drift particles downward from the centre line instead of upward.
    pub flip_particles: bool,
}

impl Default for ParticlesConfig {
    fn default() -> Self {
        Self {
            glow_color: Rgba::WHITE,
            max_glow_radius: 10.0,
            spawn_increment: 1,
            per_run_spawn: 4,
            movement_speed: 2.0,
            speed_divisor: 20.0,
            max_diff: 5.0,
            box_size: 2.0,
            opacity_reduction_speed: 0.01,
            flip_particles: false,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get the default XDG config path (~/.config/specglow/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("specglow").join("config.toml"))
    }

    /// Load config from the default XDG path if it exists
    /// Returns None if file doesn't exist, logs warning on parse errors
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            match Self::load(&path) {
                Ok(config) => Some(config),
                Err(e) => {
                    eprintln!(
                        "Warning: Failed to parse config at {}: {}\nUsing defaults.",
                        path.display(),
                        e
                    );
                    None
                }
            }
        } else {
            None
        }
    }

    /// Initialize default config file at XDG path, returns the path
    pub fn init_default_config() -> Result<PathBuf> {
        let path = Self::default_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = Self::generate_config_template();
        std::fs::write(&path, template)?;

        Ok(path)
    }

    /// Generate a commented TOML config template
    pub fn generate_config_template() -> String {
        r##"# specglow configuration
# This file is auto-generated. Edit as needed.

[display]
# Target frame rate
target_fps = 60
# Show a smoothed FPS estimate in the status line
show_fps = false
# Override the vertical centre line in pixels (default: canvas height / 2)
# centre_y_override = 120.0

[analysis]
# FFT size; the analyser exposes fft_size / 2 frequency bins
fft_size = 2048
# Per-bin exponential smoothing (0.0 = none)
smoothing = 0.8
# Decibel range mapped onto byte magnitudes 0..255
min_db = -100.0
max_db = -30.0

[bars]
# Slot width and gap of one bar (layout), and the filled width inside it
bar_width = 3.0
bar_gap = 2.0
actual_bar_width = 3.0
# Floor value so silent bands still show a sliver
sound_min = 2.0
# Scales the averaged magnitude per bar
multiplier = 1.0
# Draw bars downward from the centre line
flip_bars = false
# Minimum side margin around the bar field
min_margin = 50.0

[glow]
# Shadow behind every bar
glow_color = "#42b6ff"
glow_radius = 10.0
# Radial gradient of the primary (bar-side) glow
primary_start = "rgba(100, 100, 100, 0.5)"
primary_end = "rgba(50, 50, 50, 0)"
primary_color_stop = 1.0
# Radial gradient of the mirrored secondary glow
secondary_start = "rgba(255, 255, 255, 0.3)"
secondary_end = "rgba(50, 50, 50, 0)"
secondary_color_stop = 0.2
# Glow rectangle size relative to bar width / bar value
lighting_scale_x = 10.0
lighting_scale_y = 10.0
# Disable when the mirrored side is not visible (big performance win)
draw_secondary_glow = true

[particles]
glow_color = "#ffffff"
max_glow_radius = 10.0
# Spawn every N-th frame; particles spawned per event (0 disables)
spawn_increment = 1
per_run_spawn = 4
# Drift: y += min(max_diff, y * movement_speed / speed_divisor)
movement_speed = 2.0
speed_divisor = 20.0
max_diff = 5.0
box_size = 2.0
# Opacity lost per frame
opacity_reduction_speed = 0.01
# Drift downward instead of upward
flip_particles = false
"##
        .to_string()
    }

    /// Merge CLI arguments into config (CLI takes priority)
    pub fn merge_args(&mut self, args: &crate::Args) {
        if let Some(fps) = args.target_fps {
            self.display.target_fps = fps;
        }
        if args.fps {
            self.display.show_fps = true;
        }
        if let Some(width) = args.bar_width {
            self.bars.bar_width = width;
            self.bars.actual_bar_width = width;
        }
        if let Some(gap) = args.bar_gap {
            self.bars.bar_gap = gap;
        }
        if let Some(multiplier) = args.multiplier {
            self.bars.multiplier = multiplier;
        }
        if args.flip_bars {
            self.bars.flip_bars = true;
        }
        if args.flip_particles {
            self.particles.flip_particles = true;
        }
        if args.no_secondary_glow {
            self.glow.draw_secondary_glow = false;
        }
        if let Some(count) = args.particles {
            self.particles.per_run_spawn = count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_parses_to_defaults() {
        let parsed: Config = toml::from_str(&Config::generate_config_template()).unwrap();
        let defaults = Config::default();
        assert_eq!(parsed.bars.bar_width, defaults.bars.bar_width);
        assert_eq!(parsed.particles.per_run_spawn, defaults.particles.per_run_spawn);
        assert_eq!(parsed.glow.glow_color, defaults.glow.glow_color);
        assert_eq!(parsed.glow.secondary_color_stop, defaults.glow.secondary_color_stop);
        assert_eq!(parsed.display.target_fps, defaults.display.target_fps);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert_eq!(parsed.bars.total_bar_width(), 5.0);
        assert_eq!(parsed.analysis.fft_size, 2048);
        assert!(parsed.display.centre_y_override.is_none());
    }

    #[test]
    fn partial_section_overrides() {
        let parsed: Config = toml::from_str("[bars]\nbar_width = 4.0\n").unwrap();
        assert_eq!(parsed.bars.bar_width, 4.0);
        // untouched fields keep their defaults
        assert_eq!(parsed.bars.bar_gap, 2.0);
    }
}
