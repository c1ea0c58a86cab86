use crate::config::BarsConfig;

/// Layout derived from the drawing-surface size, recomputed on every resize.
///
/// `canvas_width` is the usable width between the paddings; the paddings
/// split the leftover of `real_canvas_width mod total_bar_width` evenly on
/// top of a fixed minimum margin, centring the bar field.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Geometry {
    pub real_canvas_width: f32,
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub centre_x: f32,
    pub centre_y: f32,
    pub padding_left: f32,
    pub padding_right: f32,
    pub bar_count: usize,
}

impl Geometry {
    pub fn compute(
        width: f32,
        height: f32,
        bars: &BarsConfig,
        centre_y_override: Option<f32>,
    ) -> Self {
        let total = bars.total_bar_width();
        let centre_y = centre_y_override.unwrap_or((height / 2.0).floor());
        let centre_x = (width / 2.0).floor();

        let extra_padding = if total > 0.0 { width % total } else { 0.0 };
        let padding_left = (extra_padding / 2.0).floor() + bars.min_margin;
        let padding_right = padding_left;
        let canvas_width = width - padding_left - padding_right;
        let bar_count = if total > 0.0 && canvas_width > 0.0 {
            (canvas_width / total).floor() as usize
        } else {
            0
        };

        Self {
            real_canvas_width: width,
            canvas_width,
            canvas_height: height,
            centre_x,
            centre_y,
            padding_left,
            padding_right,
            bar_count,
        }
    }
}
