//! Lua-backed dose-rate engine.
//!
//! A script must define a global function
//! `calculate_doserate(detector, channels, spectrum)` returning a number.
//! `detector` carries the calibration fields, `channels` is the histogram as
//! a sequence (channel 0 at index 1) and `spectrum` carries timing in
//! seconds and the geodetic position.

use crate::dose::DoserateComputer;
use crate::prelude::{GammaError, GammaResult};
use crate::records::{Detector, Spectrum};
use mlua::{Function, Lua, Table};
use std::fs;
use std::path::{Path, PathBuf};

pub const DOSERATE_FUNCTION: &str = "calculate_doserate";

/// One interpreter per session. Not shared across threads.
pub struct ScriptDoserate {
    lua: Lua,
    path: PathBuf,
}

impl ScriptDoserate {
    pub fn load(path: impl AsRef<Path>) -> GammaResult<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|err| GammaError::ScriptLoad {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        Self::from_source(path, &source)
    }

    /// Runs `source` once and checks that it defines the dose-rate function.
    /// `path` only names the script in errors and tracebacks.
    pub fn from_source(path: impl AsRef<Path>, source: &str) -> GammaResult<Self> {
        let path = path.as_ref().to_path_buf();
        let load_error = |reason: String| GammaError::ScriptLoad {
            path: path.clone(),
            reason,
        };

        let lua = Lua::new();
        lua.load(source)
            .set_name(path.display().to_string())
            .exec()
            .map_err(|err| load_error(err.to_string()))?;
        lua.globals()
            .get::<_, Function>(DOSERATE_FUNCTION)
            .map_err(|_| load_error(format!("no global function `{}`", DOSERATE_FUNCTION)))?;

        Ok(Self { lua, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn detector_table<'lua>(lua: &'lua Lua, detector: &Detector) -> mlua::Result<Table<'lua>> {
    let table = lua.create_table()?;
    table.set("type_name", detector.type_name.as_str())?;
    table.set("serialnumber", detector.serial_number.as_str())?;
    table.set("hv", detector.hv)?;
    table.set("num_channels", detector.num_channels)?;
    table.set("coarse_gain", detector.coarse_gain)?;
    table.set("fine_gain", detector.fine_gain)?;
    table.set("livetime", detector.livetime)?;
    table.set("lld", detector.lld)?;
    table.set("uld", detector.uld)?;
    table.set(
        "energy_curve_coefficients",
        lua.create_sequence_from(detector.energy_curve_coefficients.iter().copied())?,
    )?;
    if let Some(extension) = &detector.extension {
        table.set("min_hv", extension.min_hv)?;
        table.set("max_hv", extension.max_hv)?;
        table.set("max_num_channels", extension.max_num_channels)?;
        table.set("plugin_name", extension.plugin_name.as_str())?;
        table.set("script", extension.script.as_str())?;
    }
    Ok(table)
}

fn spectrum_table<'lua>(lua: &'lua Lua, spectrum: &Spectrum) -> mlua::Result<Table<'lua>> {
    let table = lua.create_table()?;
    table.set("session_name", spectrum.session_name())?;
    table.set("session_index", spectrum.session_index())?;
    table.set("livetime", spectrum.livetime_seconds())?;
    table.set("realtime", spectrum.realtime_seconds())?;
    table.set("latitude", spectrum.coordinate().latitude)?;
    table.set("longitude", spectrum.coordinate().longitude)?;
    table.set("altitude", spectrum.coordinate().altitude)?;
    Ok(table)
}

impl DoserateComputer for ScriptDoserate {
    fn name(&self) -> &str {
        "script"
    }

    fn compute(&self, detector: &Detector, spectrum: &Spectrum) -> GammaResult<f64> {
        let evaluation_error = |err: mlua::Error| GammaError::ScriptEvaluation {
            index: spectrum.index(),
            reason: err.to_string(),
        };

        let function: Function = self
            .lua
            .globals()
            .get(DOSERATE_FUNCTION)
            .map_err(evaluation_error)?;
        let detector = detector_table(&self.lua, detector).map_err(evaluation_error)?;
        let channels = self
            .lua
            .create_sequence_from(spectrum.channels().iter().copied())
            .map_err(evaluation_error)?;
        let info = spectrum_table(&self.lua, spectrum).map_err(evaluation_error)?;

        function
            .call::<_, f64>((detector, channels, info))
            .map_err(evaluation_error)
    }
}
