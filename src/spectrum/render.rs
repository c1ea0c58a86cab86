//! The three per-frame render passes.
//!
//! Fixed compositing order: bars, then glow/lighting, then particles. Every
//! pass wraps its drawing-surface configuration in save/restore so fill
//! style, shadow and composite mode never leak into the next pass.

use rand::Rng;

use crate::color::Rgba;
use crate::config::Config;
use crate::render::{CompositeMode, DrawSurface, RadialGradient};

use super::geometry::Geometry;
use super::particles::ParticleSystem;

fn translate_to_bar(surface: &mut dyn DrawSurface, config: &Config, geom: &Geometry, index: usize) {
    surface.reset_transform();
    surface.translate(
        geom.padding_left + index as f32 * config.bars.total_bar_width(),
        geom.centre_y,
    );
}

pub(super) fn bar_pass(
    surface: &mut dyn DrawSurface,
    config: &Config,
    geom: &Geometry,
    bars: &[f32],
) {
    surface.save();
    surface.set_shadow(config.glow.glow_radius, config.glow.glow_color, 0.0);
    surface.set_fill_color(Rgba::WHITE);
    for (i, &value) in bars.iter().enumerate() {
        translate_to_bar(surface, config, geom, i);
        let real_value = if config.bars.flip_bars { -value } else { value };
        surface.fill_rect(
            config.bars.bar_width,
            0.0,
            config.bars.actual_bar_width,
            real_value,
        );
    }
    surface.restore();
}

pub(super) fn lighting_pass(
    surface: &mut dyn DrawSurface,
    config: &Config,
    geom: &Geometry,
    bars: &[f32],
) {
    let glow = &config.glow;
    surface.save();
    surface.set_composite_mode(CompositeMode::Lighter);
    for (i, &value) in bars.iter().enumerate() {
        translate_to_bar(surface, config, geom, i);
        let real_value = if config.bars.flip_bars { -value } else { value };
        let width = config.bars.bar_width * glow.lighting_scale_x;
        let half_width = width / 2.0;

        surface.set_fill_gradient(
            RadialGradient::new(value)
                .with_stop(0.0, glow.primary_start)
                .with_stop(glow.primary_color_stop, glow.primary_end),
        );
        surface.fill_rect(-half_width, 0.0, width, real_value * glow.lighting_scale_y);

        if glow.draw_secondary_glow {
            surface.set_fill_gradient(
                RadialGradient::new(value)
                    .with_stop(0.0, glow.secondary_start)
                    .with_stop(glow.secondary_color_stop, glow.secondary_end),
            );
            surface.fill_rect(-half_width, 0.0, width, -real_value * glow.lighting_scale_y);
        }
    }
    surface.restore();
}

pub(super) fn particle_pass(
    surface: &mut dyn DrawSurface,
    config: &Config,
    geom: &Geometry,
    particles: &mut ParticleSystem,
    tick: u64,
    rng: &mut impl Rng,
) {
    let cfg = &config.particles;
    // A surface narrower than the margins has no bar field to spawn over.
    let has_spawn_span = geom.canvas_width > 0.0;
    if has_spawn_span && cfg.spawn_increment > 0 && tick % cfg.spawn_increment == 0 {
        for _ in 0..cfg.per_run_spawn {
            let x = rng.gen_range(geom.padding_left..geom.canvas_width + geom.padding_right);
            let glow_radius = rng.gen_range(0.0..=cfg.max_glow_radius);
            particles.spawn(x, glow_radius);
        }
    }

    surface.save();
    let glow_color = cfg.glow_color;
    let flip = cfg.flip_particles;
    let box_size = cfg.box_size;
    let centre_y = geom.centre_y;
    particles.update(cfg, geom.canvas_height, |particle| {
        let color = glow_color.with_opacity(particle.opacity);
        surface.set_shadow(particle.glow_radius, color, 0.0);
        surface.set_fill_color(color);
        let real_y = if flip {
            centre_y + particle.y
        } else {
            centre_y - particle.y
        };
        surface.fill_rect(particle.x, real_y, box_size, box_size);
    });
    surface.restore();
}
