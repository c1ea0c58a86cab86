use crate::color::Rgba;

/// How a fill is composited onto the pixels already on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeMode {
    /// Ordinary alpha blending.
    #[default]
    SourceOver,
    /// Additive blending, used by the lighting pass.
    Lighter,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Rgba,
}

/// Radial gradient centred on the local origin of the current transform.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    pub radius: f32,
    pub stops: Vec<ColorStop>,
}

impl RadialGradient {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            stops: Vec::new(),
        }
    }

    pub fn with_stop(mut self, offset: f32, color: Rgba) -> Self {
        self.stops.push(ColorStop { offset, color });
        self
    }

    /// Color at `distance` from the centre. Canvas stop semantics: the first
    /// stop's color holds before its offset, the last stop's color holds
    /// beyond its offset.
    pub fn sample(&self, distance: f32) -> Rgba {
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return Rgba::TRANSPARENT;
        };
        let t = if self.radius > 0.0 {
            (distance / self.radius).clamp(0.0, 1.0)
        } else {
            1.0
        };
        if t <= first.offset {
            return first.color;
        }
        if t >= last.offset {
            return last.color;
        }
        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.offset {
                let span = b.offset - a.offset;
                let local = if span > 0.0 { (t - a.offset) / span } else { 1.0 };
                return a.color.lerp(b.color, local);
            }
        }
        last.color
    }
}

/// 2D immediate-mode drawing surface, the narrow seam the render passes draw
/// through. Mirrors the subset of a canvas-style context the visualizer
/// needs: rect fills, scoped save/restore of drawing state, translation,
/// radial gradient fills, shadow glow and composite-mode selection.
pub trait DrawSurface {
    fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32);
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32);

    /// Push the full drawing state (fill style, shadow, composite mode,
    /// transform). Restored by the matching `restore`.
    fn save(&mut self);
    fn restore(&mut self);

    fn reset_transform(&mut self);
    fn translate(&mut self, dx: f32, dy: f32);

    fn set_fill_color(&mut self, color: Rgba);
    fn set_fill_gradient(&mut self, gradient: RadialGradient);
    fn set_shadow(&mut self, blur: f32, color: Rgba, offset_y: f32);
    fn set_composite_mode(&mut self, mode: CompositeMode);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_holds_first_and_last_stop_colors() {
        let grad = RadialGradient::new(10.0)
            .with_stop(0.2, Rgba::WHITE)
            .with_stop(0.8, Rgba::TRANSPARENT);
        assert_eq!(grad.sample(0.0), Rgba::WHITE);
        assert_eq!(grad.sample(1.0), Rgba::WHITE); // 1.0/10.0 = t 0.1, before first stop
        assert_eq!(grad.sample(9.0), Rgba::TRANSPARENT);
        assert_eq!(grad.sample(100.0), Rgba::TRANSPARENT);
    }

    #[test]
    fn sample_interpolates_between_stops() {
        let grad = RadialGradient::new(1.0)
            .with_stop(0.0, Rgba::new(1.0, 0.0, 0.0, 1.0))
            .with_stop(1.0, Rgba::new(1.0, 0.0, 0.0, 0.0));
        let mid = grad.sample(0.5);
        assert!((mid.a - 0.5).abs() < 1e-3);
    }

    #[test]
    fn zero_radius_collapses_to_the_end_color() {
        let grad = RadialGradient::new(0.0)
            .with_stop(0.0, Rgba::WHITE)
            .with_stop(1.0, Rgba::TRANSPARENT);
        assert_eq!(grad.sample(5.0), Rgba::TRANSPARENT);
    }

    #[test]
    fn empty_gradient_is_transparent() {
        assert_eq!(RadialGradient::new(5.0).sample(1.0), Rgba::TRANSPARENT);
    }
}
