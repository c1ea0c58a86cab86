use crate::color::Rgba;

use super::surface::{CompositeMode, DrawSurface, RadialGradient};

#[derive(Clone)]
enum Paint {
    Solid(Rgba),
    Radial(RadialGradient),
}

#[derive(Clone)]
struct GfxState {
    paint: Paint,
    shadow_blur: f32,
    shadow_color: Rgba,
    shadow_offset_y: f32,
    composite: CompositeMode,
    translate: (f32, f32),
}

impl Default for GfxState {
    fn default() -> Self {
        Self {
            paint: Paint::Solid(Rgba::new(0.0, 0.0, 0.0, 1.0)),
            shadow_blur: 0.0,
            shadow_color: Rgba::TRANSPARENT,
            shadow_offset_y: 0.0,
            composite: CompositeMode::SourceOver,
            translate: (0.0, 0.0),
        }
    }
}

#[derive(Clone, Copy)]
struct Rect {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
}

impl Rect {
    /// Canvas fillRect semantics: negative extents grow left/up.
    fn normalized(x: f32, y: f32, w: f32, h: f32) -> Self {
        let (x0, x1) = if w < 0.0 { (x + w, x) } else { (x, x + w) };
        let (y0, y1) = if h < 0.0 { (y + h, y) } else { (y, y + h) };
        Self { x0, y0, x1, y1 }
    }

    fn contains(&self, cx: f32, cy: f32) -> bool {
        cx >= self.x0 && cx < self.x1 && cy >= self.y0 && cy < self.y1
    }

    /// Distance from a point to the rect edge, 0.0 inside.
    fn distance(&self, cx: f32, cy: f32) -> f32 {
        let dx = (self.x0 - cx).max(cx - self.x1).max(0.0);
        let dy = (self.y0 - cy).max(cy - self.y1).max(0.0);
        (dx * dx + dy * dy).sqrt()
    }
}

/// Software rasterizer behind the [`DrawSurface`] seam.
///
/// Straight-alpha pixel buffer with source-over and additive ("lighter")
/// compositing, radial gradient fills and an approximate shadow glow: a
/// radial falloff halo around the filled rect rather than a true gaussian
/// blur, which is indistinguishable at terminal cell resolution.
pub struct PixelSurface {
    width: usize,
    height: usize,
    pixels: Vec<Rgba>,
    state: GfxState,
    stack: Vec<GfxState>,
}

impl PixelSurface {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba::TRANSPARENT; width * height],
            state: GfxState::default(),
            stack: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Drop the buffer contents and adopt the new size.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels = vec![Rgba::TRANSPARENT; width * height];
    }

    pub fn pixel(&self, x: usize, y: usize) -> Rgba {
        if x >= self.width || y >= self.height {
            return Rgba::TRANSPARENT;
        }
        self.pixels[y * self.width + x]
    }

    fn blend(&mut self, x: i64, y: i64, src: Rgba) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let sa = src.a.clamp(0.0, 1.0);
        if sa <= 0.0 {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        let dst = self.pixels[idx];
        let da = dst.a.clamp(0.0, 1.0);

        self.pixels[idx] = match self.state.composite {
            CompositeMode::SourceOver => {
                let a = sa + da * (1.0 - sa);
                if a <= 0.0 {
                    Rgba::TRANSPARENT
                } else {
                    Rgba::new(
                        (src.r * sa + dst.r * da * (1.0 - sa)) / a,
                        (src.g * sa + dst.g * da * (1.0 - sa)) / a,
                        (src.b * sa + dst.b * da * (1.0 - sa)) / a,
                        a,
                    )
                }
            }
            CompositeMode::Lighter => {
                let a = (sa + da).min(1.0);
                Rgba::new(
                    (src.r * sa + dst.r * da).min(1.0) / a,
                    (src.g * sa + dst.g * da).min(1.0) / a,
                    (src.b * sa + dst.b * da).min(1.0) / a,
                    a,
                )
            }
        };
    }

    fn for_each_pixel_center(rect: Rect, mut f: impl FnMut(i64, i64, f32, f32)) {
        let px0 = rect.x0.floor() as i64;
        let px1 = rect.x1.ceil() as i64;
        let py0 = rect.y0.floor() as i64;
        let py1 = rect.y1.ceil() as i64;
        for py in py0..py1 {
            for px in px0..px1 {
                f(px, py, px as f32 + 0.5, py as f32 + 0.5);
            }
        }
    }

    fn draw_shadow(&mut self, rect: Rect) {
        let blur = self.state.shadow_blur;
        let color = self.state.shadow_color;
        if blur <= 0.0 || color.a <= 0.0 {
            return;
        }
        let shadow_rect = Rect {
            y0: rect.y0 + self.state.shadow_offset_y,
            y1: rect.y1 + self.state.shadow_offset_y,
            ..rect
        };
        let halo = Rect {
            x0: shadow_rect.x0 - blur,
            y0: shadow_rect.y0 - blur,
            x1: shadow_rect.x1 + blur,
            y1: shadow_rect.y1 + blur,
        };
        let mut ops = Vec::new();
        Self::for_each_pixel_center(halo, |px, py, cx, cy| {
            let d = shadow_rect.distance(cx, cy);
            if d > 0.0 && d < blur {
                let falloff = 1.0 - d / blur;
                ops.push((px, py, color.with_opacity(color.a * falloff)));
            }
        });
        for (px, py, c) in ops {
            self.blend(px, py, c);
        }
    }
}

impl DrawSurface for PixelSurface {
    fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let (tx, ty) = self.state.translate;
        let rect = Rect::normalized(tx + x, ty + y, w, h);
        let mut cleared = Vec::new();
        Self::for_each_pixel_center(rect, |px, py, cx, cy| {
            if rect.contains(cx, cy) {
                cleared.push((px, py));
            }
        });
        for (px, py) in cleared {
            if px >= 0 && py >= 0 && (px as usize) < self.width && (py as usize) < self.height {
                self.pixels[py as usize * self.width + px as usize] = Rgba::TRANSPARENT;
            }
        }
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let (tx, ty) = self.state.translate;
        let rect = Rect::normalized(tx + x, ty + y, w, h);
        self.draw_shadow(rect);

        let paint = self.state.paint.clone();
        let mut ops = Vec::new();
        Self::for_each_pixel_center(rect, |px, py, cx, cy| {
            if !rect.contains(cx, cy) {
                return;
            }
            let color = match &paint {
                Paint::Solid(c) => *c,
                Paint::Radial(g) => {
                    let dx = cx - tx;
                    let dy = cy - ty;
                    g.sample((dx * dx + dy * dy).sqrt())
                }
            };
            ops.push((px, py, color));
        });
        for (px, py, c) in ops {
            self.blend(px, py, c);
        }
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn reset_transform(&mut self) {
        self.state.translate = (0.0, 0.0);
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.state.translate.0 += dx;
        self.state.translate.1 += dy;
    }

    fn set_fill_color(&mut self, color: Rgba) {
        self.state.paint = Paint::Solid(color);
    }

    fn set_fill_gradient(&mut self, gradient: RadialGradient) {
        self.state.paint = Paint::Radial(gradient);
    }

    fn set_shadow(&mut self, blur: f32, color: Rgba, offset_y: f32) {
        self.state.shadow_blur = blur;
        self.state.shadow_color = color;
        self.state.shadow_offset_y = offset_y;
    }

    fn set_composite_mode(&mut self, mode: CompositeMode) {
        self.state.composite = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_fill_covers_exactly_the_rect() {
        let mut s = PixelSurface::new(8, 8);
        s.set_fill_color(Rgba::WHITE);
        s.fill_rect(2.0, 2.0, 2.0, 2.0);
        assert_eq!(s.pixel(2, 2), Rgba::WHITE);
        assert_eq!(s.pixel(3, 3), Rgba::WHITE);
        assert_eq!(s.pixel(1, 2), Rgba::TRANSPARENT);
        assert_eq!(s.pixel(4, 2), Rgba::TRANSPARENT);
    }

    #[test]
    fn negative_height_grows_upward() {
        let mut s = PixelSurface::new(4, 8);
        s.set_fill_color(Rgba::WHITE);
        s.fill_rect(0.0, 6.0, 1.0, -3.0);
        assert_eq!(s.pixel(0, 3), Rgba::WHITE);
        assert_eq!(s.pixel(0, 5), Rgba::WHITE);
        assert_eq!(s.pixel(0, 6), Rgba::TRANSPARENT);
    }

    #[test]
    fn clear_rect_resets_pixels() {
        let mut s = PixelSurface::new(4, 4);
        s.set_fill_color(Rgba::WHITE);
        s.fill_rect(0.0, 0.0, 4.0, 4.0);
        s.clear_rect(0.0, 0.0, 4.0, 4.0);
        assert_eq!(s.pixel(2, 2), Rgba::TRANSPARENT);
    }

    #[test]
    fn lighter_compositing_adds_up() {
        let mut s = PixelSurface::new(2, 2);
        s.set_composite_mode(CompositeMode::Lighter);
        s.set_fill_color(Rgba::new(0.25, 0.25, 0.25, 1.0));
        s.fill_rect(0.0, 0.0, 2.0, 2.0);
        s.fill_rect(0.0, 0.0, 2.0, 2.0);
        let p = s.pixel(0, 0);
        assert!((p.r - 0.5).abs() < 1e-5);
    }

    #[test]
    fn save_restore_scopes_state() {
        let mut s = PixelSurface::new(4, 4);
        s.set_fill_color(Rgba::new(1.0, 0.0, 0.0, 1.0));
        s.save();
        s.set_fill_color(Rgba::new(0.0, 0.0, 1.0, 1.0));
        s.translate(1.0, 1.0);
        s.restore();
        s.fill_rect(0.0, 0.0, 1.0, 1.0);
        // red fill at the untranslated origin: both restored
        assert_eq!(s.pixel(0, 0).to_rgb8(), (255, 0, 0));
        assert_eq!(s.pixel(1, 1), Rgba::TRANSPARENT);
    }

    #[test]
    fn translate_offsets_fills() {
        let mut s = PixelSurface::new(4, 4);
        s.set_fill_color(Rgba::WHITE);
        s.translate(2.0, 0.0);
        s.fill_rect(0.0, 0.0, 1.0, 1.0);
        assert_eq!(s.pixel(2, 0), Rgba::WHITE);
        s.reset_transform();
        s.fill_rect(0.0, 1.0, 1.0, 1.0);
        assert_eq!(s.pixel(0, 1), Rgba::WHITE);
    }

    #[test]
    fn gradient_fill_fades_from_the_origin() {
        let mut s = PixelSurface::new(16, 16);
        s.translate(8.0, 8.0);
        s.set_fill_gradient(
            RadialGradient::new(8.0)
                .with_stop(0.0, Rgba::WHITE)
                .with_stop(1.0, Rgba::WHITE.with_opacity(0.0)),
        );
        s.fill_rect(-8.0, -8.0, 16.0, 16.0);
        let centre = s.pixel(8, 8);
        let edge = s.pixel(15, 8);
        assert!(centre.a > 0.9);
        assert!(edge.a < centre.a);
    }

    #[test]
    fn shadow_halo_reaches_outside_the_rect() {
        let mut s = PixelSurface::new(12, 12);
        s.set_shadow(4.0, Rgba::WHITE, 0.0);
        s.set_fill_color(Rgba::WHITE);
        s.fill_rect(4.0, 4.0, 2.0, 2.0);
        // one pixel outside the rect edge picks up glow
        assert!(s.pixel(6, 5).a > 0.0);
        // well past the blur radius stays clean
        assert_eq!(s.pixel(11, 11), Rgba::TRANSPARENT);
    }

    #[test]
    fn resize_clears_the_buffer() {
        let mut s = PixelSurface::new(2, 2);
        s.set_fill_color(Rgba::WHITE);
        s.fill_rect(0.0, 0.0, 2.0, 2.0);
        s.resize(3, 3);
        assert_eq!(s.width(), 3);
        assert_eq!(s.pixel(0, 0), Rgba::TRANSPARENT);
    }
}
