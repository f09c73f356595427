use crate::dose::DoserateComputer;
use crate::prelude::GammaResult;
use crate::records::{Detector, Spectrum};

pub const DEFAULT_DOSERATE_FACTOR: f64 = 1.0;

/// Energy-weighted count rate between the discriminators, scaled by a
/// calibration factor:
///
/// `factor * sum(counts[ch] * energy(ch) for ch in LLD..=ULD) / livetime_s`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuiltinDoserate {
    factor: f64,
}

impl BuiltinDoserate {
    pub fn new(factor: f64) -> Self {
        Self { factor }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }
}

impl Default for BuiltinDoserate {
    fn default() -> Self {
        Self::new(DEFAULT_DOSERATE_FACTOR)
    }
}

impl DoserateComputer for BuiltinDoserate {
    fn name(&self) -> &str {
        "builtin"
    }

    fn compute(&self, detector: &Detector, spectrum: &Spectrum) -> GammaResult<f64> {
        let livetime = spectrum.livetime_seconds();
        if livetime <= 0.0 {
            return Ok(0.0);
        }

        let lower = detector.lld.max(0) as usize;
        let deposited: f64 = spectrum
            .channels()
            .iter()
            .enumerate()
            .skip(lower)
            .take_while(|(channel, _)| (*channel as i64) <= detector.uld)
            .map(|(channel, &count)| count as f64 * detector.energy(channel as i64))
            .sum();

        Ok(self.factor * deposited / livetime)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::math::geo::Coordinate;
    use crate::records::SpectrumRecord;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    pub(crate) fn detector() -> Detector {
        Detector::parse(&json!({
            "TypeName": "Osprey",
            "CurrentHV": 775,
            "CurrentNumChannels": 6,
            "Serialnumber": "09012345",
            "CurrentCoarseGain": 2.0,
            "CurrentFineGain": 1.0,
            "CurrentLivetime": 1000000,
            "CurrentLLD": 1,
            "CurrentULD": 3,
            "EnergyCurveCoefficients": [0.0, 10.0]
        }))
        .unwrap()
    }

    pub(crate) fn spectrum(channels: Vec<u32>, livetime: i64) -> Spectrum {
        let record = SpectrumRecord {
            session_name: "fixture".into(),
            session_index: 0,
            gps_time_start: Utc.with_ymd_and_hms(2017, 5, 3, 12, 0, 0).unwrap(),
            realtime: livetime,
            livetime,
            coordinate: Coordinate::new(59.9, 10.7, 100.0),
            num_channels: None,
            channels,
        };
        Spectrum::from_record(0, record).unwrap()
    }

    #[test]
    fn builtin_sums_between_discriminators() {
        let engine = BuiltinDoserate::new(0.5);
        // channels 1..=3 contribute 2*10 + 3*20 + 4*30 = 200 keV over 2 s
        let spectrum = spectrum(vec![100, 2, 3, 4, 100, 100], 2_000_000);
        assert_eq!(engine.compute(&detector(), &spectrum).unwrap(), 50.0);
    }

    #[test]
    fn builtin_stops_at_histogram_end() {
        let engine = BuiltinDoserate::default();
        let spectrum = spectrum(vec![0, 1], 1_000_000);
        assert_eq!(engine.compute(&detector(), &spectrum).unwrap(), 10.0);
    }

    #[test]
    fn zero_livetime_yields_zero() {
        let engine = BuiltinDoserate::default();
        let spectrum = spectrum(vec![5, 5, 5, 5], 0);
        assert_eq!(engine.compute(&detector(), &spectrum).unwrap(), 0.0);
    }
}
