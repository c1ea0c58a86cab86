mod pixels;
mod surface;

pub use pixels::PixelSurface;
pub use surface::{ColorStop, CompositeMode, DrawSurface, RadialGradient};
