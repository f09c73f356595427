//! Detector calibration parsed from legacy (PascalCase) or revised
//! (snake_case) JSON records.

use crate::prelude::{GammaError, GammaResult};
use crate::records::fields::FieldReader;
use serde::Serialize;
use serde_json::Value;

/// Fewest and most energy-curve coefficients `energy` will evaluate.
pub const MIN_COEFFICIENTS: usize = 2;
pub const MAX_COEFFICIENTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DetectorSchema {
    Legacy,
    Revised,
}

struct SchemaKeys {
    type_name: &'static str,
    hv: &'static str,
    num_channels: &'static str,
    serial_number: &'static str,
    coarse_gain: &'static str,
    fine_gain: &'static str,
    livetime: &'static str,
    lld: &'static str,
    uld: &'static str,
    coefficients: &'static str,
}

const LEGACY_KEYS: SchemaKeys = SchemaKeys {
    type_name: "TypeName",
    hv: "CurrentHV",
    num_channels: "CurrentNumChannels",
    serial_number: "Serialnumber",
    coarse_gain: "CurrentCoarseGain",
    fine_gain: "CurrentFineGain",
    livetime: "CurrentLivetime",
    lld: "CurrentLLD",
    uld: "CurrentULD",
    coefficients: "EnergyCurveCoefficients",
};

const REVISED_KEYS: SchemaKeys = SchemaKeys {
    type_name: "type_name",
    hv: "hv",
    num_channels: "num_channels",
    serial_number: "serialnumber",
    coarse_gain: "coarse_gain",
    fine_gain: "fine_gain",
    livetime: "livetime",
    lld: "lld",
    uld: "uld",
    coefficients: "energy_curve_coefficients",
};

impl DetectorSchema {
    fn keys(self) -> &'static SchemaKeys {
        match self {
            DetectorSchema::Legacy => &LEGACY_KEYS,
            DetectorSchema::Revised => &REVISED_KEYS,
        }
    }
}

/// Fields only present in the revised schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectorExtension {
    pub min_hv: i64,
    pub max_hv: i64,
    pub max_num_channels: i64,
    pub plugin_name: String,
    pub script: String,
}

/// Detector calibration owned by a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detector {
    pub type_name: String,
    pub serial_number: String,
    pub hv: i64,
    pub num_channels: i64,
    pub coarse_gain: f64,
    pub fine_gain: f64,
    pub livetime: i64,
    pub lld: i64,
    pub uld: i64,
    pub energy_curve_coefficients: Vec<f64>,
    pub extension: Option<DetectorExtension>,
}

impl Detector {
    /// Parses a detector record. The presence of `TypeName` selects the
    /// legacy schema, anything else is read as the revised schema.
    pub fn parse(record: &Value) -> GammaResult<Self> {
        let reader = FieldReader::new(record, "detector")?;
        let schema = if reader.contains(LEGACY_KEYS.type_name) {
            DetectorSchema::Legacy
        } else {
            DetectorSchema::Revised
        };
        let keys = schema.keys();

        let type_name = reader.string(keys.type_name)?;
        let hv = reader.int(keys.hv)?;
        let (min_hv, max_hv) = match schema {
            DetectorSchema::Revised => (Some(reader.int("min_hv")?), Some(reader.int("max_hv")?)),
            DetectorSchema::Legacy => (None, None),
        };
        let num_channels = reader.int(keys.num_channels)?;
        let max_num_channels = match schema {
            DetectorSchema::Revised => Some(reader.int("max_num_channels")?),
            DetectorSchema::Legacy => None,
        };
        let serial_number = reader.string(keys.serial_number)?;
        let coarse_gain = reader.float(keys.coarse_gain)?;
        let fine_gain = reader.float(keys.fine_gain)?;
        let livetime = reader.int(keys.livetime)?;
        let lld = reader.int(keys.lld)?;
        let uld = reader.int(keys.uld)?;
        let energy_curve_coefficients = reader.float_list(keys.coefficients)?;

        let extension = match (min_hv, max_hv, max_num_channels) {
            (Some(min_hv), Some(max_hv), Some(max_num_channels)) => Some(DetectorExtension {
                min_hv,
                max_hv,
                max_num_channels,
                plugin_name: reader.string("plugin_name")?,
                script: reader.string("script")?,
            }),
            _ => None,
        };

        Ok(Self {
            type_name,
            serial_number,
            hv,
            num_channels,
            coarse_gain,
            fine_gain,
            livetime,
            lld,
            uld,
            energy_curve_coefficients,
            extension,
        })
    }

    pub fn schema(&self) -> DetectorSchema {
        if self.extension.is_some() {
            DetectorSchema::Revised
        } else {
            DetectorSchema::Legacy
        }
    }

    /// Energy for `channel` from the calibration polynomial. Returns 0.0 when
    /// the coefficient count is outside [2, 5] or the channel is negative.
    pub fn energy(&self, channel: i64) -> f64 {
        let count = self.energy_curve_coefficients.len();
        if !(MIN_COEFFICIENTS..=MAX_COEFFICIENTS).contains(&count) || channel < 0 {
            return 0.0;
        }

        let channel = channel as f64;
        self.energy_curve_coefficients
            .iter()
            .enumerate()
            .map(|(power, coefficient)| coefficient * channel.powi(power as i32))
            .sum()
    }

    /// Serializes back into the schema the detector was parsed from.
    pub fn to_json(&self) -> GammaResult<Value> {
        let record = match &self.extension {
            None => serde_json::to_value(LegacyRecord::from(self)),
            Some(extension) => serde_json::to_value(RevisedRecord::new(self, extension)),
        };
        record.map_err(|err| GammaError::invalid_field("detector", err.to_string()))
    }
}

#[derive(Serialize)]
struct LegacyRecord<'a> {
    #[serde(rename = "TypeName")]
    type_name: &'a str,
    #[serde(rename = "CurrentHV")]
    hv: i64,
    #[serde(rename = "CurrentNumChannels")]
    num_channels: i64,
    #[serde(rename = "Serialnumber")]
    serial_number: &'a str,
    #[serde(rename = "CurrentCoarseGain")]
    coarse_gain: f64,
    #[serde(rename = "CurrentFineGain")]
    fine_gain: f64,
    #[serde(rename = "CurrentLivetime")]
    livetime: i64,
    #[serde(rename = "CurrentLLD")]
    lld: i64,
    #[serde(rename = "CurrentULD")]
    uld: i64,
    #[serde(rename = "EnergyCurveCoefficients")]
    energy_curve_coefficients: &'a [f64],
}

impl<'a> From<&'a Detector> for LegacyRecord<'a> {
    fn from(detector: &'a Detector) -> Self {
        Self {
            type_name: &detector.type_name,
            hv: detector.hv,
            num_channels: detector.num_channels,
            serial_number: &detector.serial_number,
            coarse_gain: detector.coarse_gain,
            fine_gain: detector.fine_gain,
            livetime: detector.livetime,
            lld: detector.lld,
            uld: detector.uld,
            energy_curve_coefficients: &detector.energy_curve_coefficients,
        }
    }
}

#[derive(Serialize)]
struct RevisedRecord<'a> {
    type_name: &'a str,
    hv: i64,
    min_hv: i64,
    max_hv: i64,
    num_channels: i64,
    max_num_channels: i64,
    #[serde(rename = "serialnumber")]
    serial_number: &'a str,
    coarse_gain: f64,
    fine_gain: f64,
    livetime: i64,
    lld: i64,
    uld: i64,
    energy_curve_coefficients: &'a [f64],
    plugin_name: &'a str,
    script: &'a str,
}

impl<'a> RevisedRecord<'a> {
    fn new(detector: &'a Detector, extension: &'a DetectorExtension) -> Self {
        Self {
            type_name: &detector.type_name,
            hv: detector.hv,
            min_hv: extension.min_hv,
            max_hv: extension.max_hv,
            num_channels: detector.num_channels,
            max_num_channels: extension.max_num_channels,
            serial_number: &detector.serial_number,
            coarse_gain: detector.coarse_gain,
            fine_gain: detector.fine_gain,
            livetime: detector.livetime,
            lld: detector.lld,
            uld: detector.uld,
            energy_curve_coefficients: &detector.energy_curve_coefficients,
            plugin_name: &extension.plugin_name,
            script: &extension.script,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy_record() -> Value {
        json!({
            "TypeName": "Osprey",
            "CurrentHV": 775,
            "CurrentNumChannels": 1024,
            "Serialnumber": "09012345",
            "CurrentCoarseGain": 1.0,
            "CurrentFineGain": 1.25,
            "CurrentLivetime": 2000000,
            "CurrentLLD": 3,
            "CurrentULD": 110,
            "EnergyCurveCoefficients": [-2.5, 2.8, 0.0001]
        })
    }

    fn revised_record() -> Value {
        json!({
            "type_name": "Osprey",
            "hv": 775,
            "min_hv": 0,
            "max_hv": 1300,
            "num_channels": 1024,
            "max_num_channels": 2048,
            "serialnumber": "09012345",
            "coarse_gain": 2.0,
            "fine_gain": 1.0015,
            "livetime": 2000000,
            "lld": 3,
            "uld": 110,
            "energy_curve_coefficients": [1.0, 2.0],
            "plugin_name": "osprey",
            "script": "osprey_nai.lua"
        })
    }

    fn with_coefficients(coefficients: Vec<f64>) -> Detector {
        let mut detector = Detector::parse(&legacy_record()).unwrap();
        detector.energy_curve_coefficients = coefficients;
        detector
    }

    #[test]
    fn legacy_record_parses() {
        let detector = Detector::parse(&legacy_record()).unwrap();
        assert_eq!(detector.schema(), DetectorSchema::Legacy);
        assert_eq!(detector.type_name, "Osprey");
        assert_eq!(detector.hv, 775);
        assert_eq!(detector.num_channels, 1024);
        assert_eq!(detector.fine_gain, 1.25);
        assert_eq!(detector.energy_curve_coefficients.len(), 3);
        assert!(detector.extension.is_none());
    }

    #[test]
    fn revised_record_parses_extension() {
        let detector = Detector::parse(&revised_record()).unwrap();
        assert_eq!(detector.schema(), DetectorSchema::Revised);
        let extension = detector.extension.as_ref().unwrap();
        assert_eq!(extension.max_hv, 1300);
        assert_eq!(extension.max_num_channels, 2048);
        assert_eq!(extension.script, "osprey_nai.lua");
    }

    #[test]
    fn missing_key_is_reported_by_name() {
        let mut record = legacy_record();
        record.as_object_mut().unwrap().remove("CurrentULD");
        match Detector::parse(&record) {
            Err(GammaError::MissingField(key)) => assert_eq!(key, "CurrentULD"),
            other => panic!("unexpected {:?}", other),
        }

        let mut record = revised_record();
        record.as_object_mut().unwrap().remove("plugin_name");
        match Detector::parse(&record) {
            Err(GammaError::MissingField(key)) => assert_eq!(key, "plugin_name"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn energy_evaluates_the_polynomial() {
        let detector = with_coefficients(vec![1.0, 2.0]);
        assert_eq!(detector.energy(3), 7.0);

        let detector = with_coefficients(vec![1.0, 2.0, 0.5]);
        assert_eq!(detector.energy(4), 1.0 + 8.0 + 8.0);
    }

    #[test]
    fn energy_degrades_to_zero() {
        let detector = with_coefficients(vec![1.0, 2.0]);
        assert_eq!(detector.energy(-1), 0.0);

        let detector = with_coefficients(vec![1.0; 6]);
        assert_eq!(detector.energy(3), 0.0);

        let detector = with_coefficients(vec![1.0]);
        assert_eq!(detector.energy(3), 0.0);
    }

    #[test]
    fn serialization_preserves_every_field() {
        for record in [legacy_record(), revised_record()] {
            let detector = Detector::parse(&record).unwrap();
            let written = detector.to_json().unwrap();
            assert_eq!(Detector::parse(&written).unwrap(), detector);
            assert_eq!(written, record);
        }
    }
}
