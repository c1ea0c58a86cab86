use crate::config::ParticlesConfig;

/// Spawn height above the centre line.
const SPAWN_Y: f32 = 2.0;

/// Ephemeral glow point drifting away from the centre line.
///
/// `y` is a signed distance from the vertical centre; the renderer decides
/// which direction that maps to on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub opacity: f32,
    pub glow_radius: f32,
}

/// Owns the full particle lifecycle: spawn, per-frame drift, opacity decay
/// and pruning. Nothing else holds particle references.
#[derive(Default)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn spawn(&mut self, x: f32, glow_radius: f32) {
        self.particles.push(Particle {
            x,
            y: SPAWN_Y,
            opacity: 1.0,
            glow_radius,
        });
    }

    /// One simulation step with the draw fused in. Per particle, in order:
    /// bounds/opacity check (prune with no draw), then drift
    /// `y += min(max_diff, y * speed / divisor)` — barely moving near the
    /// centre, accelerating with distance — then the fixed opacity
    /// decrement, then `draw`.
    ///
    /// Iterates in reverse with `swap_remove`; relative order is not
    /// meaningful across frames, particles are indistinguishable by index.
    pub fn update(
        &mut self,
        config: &ParticlesConfig,
        canvas_height: f32,
        mut draw: impl FnMut(&Particle),
    ) {
        let mut i = self.particles.len();
        while i > 0 {
            i -= 1;
            let p = &mut self.particles[i];
            if p.y <= -canvas_height || p.y >= canvas_height || p.opacity <= 0.0 {
                self.particles.swap_remove(i);
                continue;
            }
            p.y += (p.y * config.movement_speed / config.speed_divisor).min(config.max_diff);
            p.opacity -= config.opacity_reduction_speed;
            draw(&self.particles[i]);
        }
    }
}
