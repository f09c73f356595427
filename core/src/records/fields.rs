use crate::prelude::{GammaError, GammaResult};
use serde_json::{Map, Value};

/// Typed access to required keys of a JSON object.
pub struct FieldReader<'a> {
    object: &'a Map<String, Value>,
}

impl<'a> FieldReader<'a> {
    pub fn new(value: &'a Value, what: &str) -> GammaResult<Self> {
        value
            .as_object()
            .map(|object| Self { object })
            .ok_or_else(|| GammaError::invalid_field(what, "expected a JSON object"))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.object.contains_key(key)
    }

    fn required(&self, key: &str) -> GammaResult<&'a Value> {
        self.object
            .get(key)
            .ok_or_else(|| GammaError::MissingField(key.to_string()))
    }

    pub fn string(&self, key: &str) -> GammaResult<String> {
        as_string(key, self.required(key)?)
    }

    pub fn int(&self, key: &str) -> GammaResult<i64> {
        as_int(key, self.required(key)?)
    }

    pub fn float(&self, key: &str) -> GammaResult<f64> {
        as_float(key, self.required(key)?)
    }

    pub fn float_list(&self, key: &str) -> GammaResult<Vec<f64>> {
        let values = self
            .required(key)?
            .as_array()
            .ok_or_else(|| GammaError::invalid_field(key, "expected an array"))?;
        values.iter().map(|value| as_float(key, value)).collect()
    }
}

fn as_string(key: &str, value: &Value) -> GammaResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| GammaError::invalid_field(key, "expected a string"))
}

fn as_int(key: &str, value: &Value) -> GammaResult<i64> {
    value
        .as_i64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|number| number.fract() == 0.0)
                .map(|number| number as i64)
        })
        .ok_or_else(|| GammaError::invalid_field(key, "expected an integer"))
}

fn as_float(key: &str, value: &Value) -> GammaResult<f64> {
    value
        .as_f64()
        .ok_or_else(|| GammaError::invalid_field(key, "expected a number"))
}
