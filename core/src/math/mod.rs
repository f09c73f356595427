pub mod geo;
pub mod palette;
pub mod stats;

pub use geo::{Coordinate, Position, Projection};
pub use palette::{ColorMapper, Rgb};
pub use stats::Extent;
