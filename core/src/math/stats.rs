use serde::{Deserialize, Serialize};

/// Running minimum and maximum of one scalar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

impl Extent {
    pub fn seed(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    pub fn include(&mut self, value: f64) {
        if self.min > value {
            self.min = value;
        }
        if self.max < value {
            self.max = value;
        }
    }

    pub fn half(&self) -> f64 {
        (self.max - self.min) / 2.0
    }

    pub fn middle(&self) -> f64 {
        self.min + self.half()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_tracks_min_and_max() {
        let mut extent = Extent::seed(3.0);
        for value in [1.0, 7.0, 3.0, -2.0] {
            extent.include(value);
        }
        assert_eq!(extent, Extent { min: -2.0, max: 7.0 });
        assert_eq!(extent.half(), 4.5);
        assert_eq!(extent.middle(), 2.5);
    }

    #[test]
    fn default_extent_is_zero() {
        let extent = Extent::default();
        assert_eq!(extent.half(), 0.0);
        assert_eq!(extent.middle(), 0.0);
    }
}
