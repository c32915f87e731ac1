use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Parameters for [`crate::extract_colorblind_safe_palette`].
///
/// Missing fields take their defaults when loaded from JSON, so a config
/// file only needs the values it changes:
///
/// ```json
/// { "n_colors": 8, "outdir": "out" }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteOptions {
    /// Number of colors to extract.
    pub n_colors: usize,
    /// Minimum ΔE two simulated colors must be apart to count as distinct.
    pub delta_e_thresh: f64,
    /// Longest side, in pixels, the image is shrunk to before clustering.
    /// `0` disables shrinking.
    pub resize: u32,
    /// Render the image + palette figure.
    pub plot: bool,
    /// Write the table and (when plotting) the figure next to the input.
    pub save: bool,
    /// Where to write outputs instead of the input image's directory.
    pub outdir: Option<PathBuf>,
}

impl Default for PaletteOptions {
    fn default() -> Self {
        Self {
            n_colors: 5,
            delta_e_thresh: 10.,
            resize: 400,
            plot: true,
            save: true,
            outdir: None,
        }
    }
}

impl PaletteOptions {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Parsing config {}", path.display()))
    }

    /// Options that only compute, without printing files or a figure.
    pub fn quiet(n_colors: usize) -> Self {
        Self {
            n_colors,
            plot: false,
            save: false,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let opts: PaletteOptions =
            serde_json::from_str(r#"{ "n_colors": 8, "plot": false }"#).unwrap();
        assert_eq!(opts.n_colors, 8);
        assert!(!opts.plot);
        assert_eq!(opts.delta_e_thresh, 10.);
        assert_eq!(opts.resize, 400);
        assert!(opts.save);
        assert_eq!(opts.outdir, None);
    }

    #[test]
    fn config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let opts = PaletteOptions {
            outdir: Some(PathBuf::from("palettes")),
            ..PaletteOptions::quiet(3)
        };
        std::fs::write(&path, serde_json::to_string_pretty(&opts).unwrap()).unwrap();

        assert_eq!(PaletteOptions::from_json_file(&path).unwrap(), opts);
        assert!(PaletteOptions::from_json_file(&dir.path().join("missing.json")).is_err());
    }
}
