use crate::scene::model::SceneModel;
use anyhow::Context;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Writes the scenes as one JSON document, to `output` or to stdout.
pub fn write_scenes(scenes: &[SceneModel], output: Option<&Path>) -> anyhow::Result<()> {
    let document = serde_json::to_string_pretty(scenes).context("serializing scenes")?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            fs::write(path, document).with_context(|| format!("writing {}", path.display()))?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", document).context("writing scenes to stdout")?;
        }
    }
    Ok(())
}

pub fn summary(scene: &SceneModel) -> String {
    format!(
        "{} -> spectra {}, doserate {:.4e}..{:.4e}, center ({:.6}, {:.6}, {:.1} m)",
        scene.session,
        scene.points.len(),
        scene.stats.doserate.min,
        scene.stats.doserate.max,
        scene.stats.center_coordinate.latitude,
        scene.stats.center_coordinate.longitude,
        scene.stats.center_coordinate.altitude
    )
}
