use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Rainbow scale over a dose-rate range: the maximum maps to red, the
/// minimum to blue, passing through yellow, green and cyan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMapper {
    pub min: f64,
    pub max: f64,
    pub logarithmic: bool,
}

impl ColorMapper {
    pub fn new(min: f64, max: f64, logarithmic: bool) -> Self {
        Self {
            min,
            max,
            logarithmic,
        }
    }

    pub fn color_for(&self, value: f64) -> Rgb {
        color_for(self.min, self.max, value, self.logarithmic)
    }
}

/// Maps `value` within [min, max] to one of five rainbow segments.
///
/// A value of exactly zero is drawn green. In logarithmic mode all three
/// inputs must be positive. The position within the range is clamped to
/// [0, 1], and a non-finite position (empty range, log of zero) counts as
/// the minimum. A zero `min` in logarithmic mode therefore draws every
/// nonzero value blue; `Session::color_mapper` raises it to the smallest
/// positive dose rate first.
pub fn color_for(min: f64, max: f64, value: f64, use_log: bool) -> Rgb {
    if value == 0.0 {
        return Rgb::GREEN;
    }

    let (min, max, value) = if use_log {
        (min.ln(), max.ln(), value.ln())
    } else {
        (min, max, value)
    };

    let mut f = (value - min) / (max - min);
    if !f.is_finite() {
        f = 0.0;
    }
    let f = f.clamp(0.0, 1.0);

    let a = (1.0 - f) / 0.25;
    let segment = a.floor();
    let blend = (255.0 * (a - segment)).floor() as u8;

    match segment as u8 {
        0 => Rgb::new(255, blend, 0),
        1 => Rgb::new(255 - blend, 255, 0),
        2 => Rgb::new(0, 255, blend),
        3 => Rgb::new(0, 255 - blend, 255),
        _ => Rgb::BLUE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_green_regardless_of_range() {
        assert_eq!(color_for(0.0, 100.0, 0.0, false), Rgb::GREEN);
        assert_eq!(color_for(5.0, 7.0, 0.0, true), Rgb::GREEN);
    }

    #[test]
    fn range_ends_map_to_red_and_blue() {
        assert_eq!(color_for(0.0, 100.0, 100.0, false), Rgb::RED);
        assert_eq!(color_for(1.0, 100.0, 1.0, false), Rgb::BLUE);
    }

    #[test]
    fn segments_follow_the_rainbow() {
        // f = 0.625, a = 1.5
        assert_eq!(color_for(0.0, 100.0, 62.5, false), Rgb::new(128, 255, 0));
        // f = 0.375, a = 2.5
        assert_eq!(color_for(0.0, 100.0, 37.5, false), Rgb::new(0, 255, 127));
        // f = 0.25, a = 3.0
        assert_eq!(color_for(0.0, 100.0, 25.0, false), Rgb::new(0, 255, 255));
        // f = 0.875, a = 0.5
        assert_eq!(color_for(0.0, 100.0, 87.5, false), Rgb::new(255, 127, 0));
        // f = 0.125, a = 3.5
        assert_eq!(color_for(0.0, 100.0, 12.5, false), Rgb::new(0, 128, 255));
    }

    #[test]
    fn logarithmic_scale_uses_natural_logs() {
        let value = 10f64.powf(1.5);
        assert_eq!(color_for(1.0, 10_000.0, value, true), Rgb::new(0, 255, 127));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        assert_eq!(color_for(10.0, 20.0, 25.0, false), Rgb::RED);
        assert_eq!(color_for(10.0, 20.0, 5.0, false), Rgb::BLUE);
        assert_eq!(color_for(3.0, 3.0, 3.0, false), Rgb::BLUE);
        assert_eq!(color_for(-1.0, 2.0, 1.0, true), Rgb::BLUE);
    }

    #[test]
    fn mapper_carries_the_scale() {
        let mapper = ColorMapper::new(0.0, 100.0, false);
        assert_eq!(mapper.color_for(37.5), Rgb::new(0, 255, 127));
    }
}
