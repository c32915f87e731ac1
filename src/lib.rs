//! Pull the dominant colors out of an image and check whether they stay
//! distinguishable for viewers with protanopia, deuteranopia or tritanopia.
//!
//! ```no_run
//! use cb_palette::{PaletteOptions, extract_colorblind_safe_palette};
//!
//! let palette = extract_colorblind_safe_palette("data/flower.jpg", &PaletteOptions {
//!     n_colors: 8,
//!     ..Default::default()
//! })?;
//! for entry in &palette {
//!     println!("{} {}", entry.hex, entry.colorblind_safe);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```
#![allow(clippy::uninlined_format_args)]
use std::path::Path;

use anyhow::Context;
use log::{debug, info};
use serde::{Deserialize, Serialize};

pub mod deficiency;
pub mod k_means;
pub mod loader;
pub mod options;
pub mod plot;
pub mod report;

pub use deficiency::DeficiencyModel;
pub use options::PaletteOptions;

use k_means::Point;

/// One extracted color.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaletteEntry {
    /// `#RRGGBB`, uppercase.
    pub hex: String,
    pub rgb: [u8; 3],
    /// Share of the image's pixels, in percent, rounded to one decimal.
    pub frequency: f64,
    pub colorblind_safe: bool,
}

impl PaletteEntry {
    pub fn new(rgb: [u8; 3], frequency: f64, colorblind_safe: bool) -> Self {
        Self {
            hex: to_hex(rgb),
            rgb,
            frequency: round_tenth(frequency),
            colorblind_safe,
        }
    }

    /// Entry for a cluster centroid; channels are truncated, not rounded.
    pub fn from_centroid(centroid: Point, frequency: f64, colorblind_safe: bool) -> Self {
        let rgb = centroid.map(|c| (c * 255.).clamp(0., 255.) as u8);
        Self::new(rgb, frequency, colorblind_safe)
    }
}

pub fn to_hex([r, g, b]: [u8; 3]) -> String {
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}

/// Exact halves go to the even digit: 12.25 becomes 12.2.
fn round_tenth(x: f64) -> f64 {
    (x * 10.).round_ties_even() / 10.
}

/// Zips centroids, frequencies and safety flags into entries, most frequent
/// first. Equal frequencies keep cluster order.
pub fn palette_entries(centroids: &[Point], frequencies: &[f64], flags: &[bool]) -> Vec<PaletteEntry> {
    let mut entries = centroids
        .iter()
        .zip(frequencies)
        .zip(flags)
        .map(|((c, f), safe)| PaletteEntry::from_centroid(*c, *f, *safe))
        .collect::<Vec<_>>();
    entries.sort_by(|a, b| b.frequency.total_cmp(&a.frequency));
    entries
}

/// Extracts `options.n_colors` dominant colors from the image at
/// `image_path`, flags the ones that collide with another under a simulated
/// deficiency, prints the summary table and, depending on `options`, writes
/// `<stem>_palette.txt` and `<stem>_palette.png`.
///
/// The table is written before the figure; a failure while saving the figure
/// leaves the table on disk.
pub fn extract_colorblind_safe_palette(
    image_path: impl AsRef<Path>,
    options: &PaletteOptions,
) -> anyhow::Result<Vec<PaletteEntry>> {
    let image_path = image_path.as_ref();
    anyhow::ensure!(options.n_colors > 0, "n_colors must be at least 1");

    let image = loader::load_image(image_path, options.resize)?;
    info!(
        "Loaded {} ({}x{})",
        image_path.display(),
        image.width(),
        image.height()
    );

    let pixels = loader::normalized_pixels(&image);
    let clustering = k_means::k_means(options.n_colors, &pixels).context("Clustering colors")?;

    let flags = deficiency::colorblind_safe_flags(&clustering.centroids, options.delta_e_thresh);
    for model in DeficiencyModel::ALL {
        if let Some(d) = deficiency::min_delta_e(&clustering.centroids, model) {
            debug!("closest pair under {}: ΔE {:.2}", model, d);
        }
    }

    let entries = palette_entries(&clustering.centroids, &clustering.frequencies(), &flags);

    let lines = report::table_lines(&entries, options.n_colors, image_path);
    println!("{}", report::console_table(&lines));

    let paths = report::OutputPaths::new(image_path, options.outdir.as_deref())?;
    if options.save {
        if let Some(dir) = paths.text.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Making dir {}", dir.display()))?;
        }
        report::write_table(&paths.text, &report::format_table(&lines))?;
        info!("Table saved to {}", paths.text.display());
    }

    if options.plot {
        let figure = plot::render_figure(&image, &entries);
        if options.save {
            plot::save_figure(&figure, &paths.figure)?;
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_uppercase_and_padded() {
        assert_eq!(to_hex([255, 0, 10]), "#FF000A");
        assert_eq!(to_hex([0, 0, 0]), "#000000");
    }

    #[test]
    fn centroid_channels_truncate() {
        let entry = PaletteEntry::from_centroid([1., 0.999, 0.5], 12.345, true);
        assert_eq!(entry.rgb, [255, 254, 127]);
        assert_eq!(entry.hex, "#FFFE7F");
        assert_eq!(entry.frequency, 12.3);
    }

    #[test]
    fn frequency_halves_round_to_even() {
        assert_eq!(round_tenth(12.25), 12.2);
        assert_eq!(round_tenth(0.25), 0.2);
        assert_eq!(round_tenth(0.35), 0.4);
        assert_eq!(round_tenth(33.333), 33.3);

        let entry = PaletteEntry::new([0, 0, 0], 49. / 400. * 100., true);
        assert_eq!(entry.frequency, 12.2);
    }

    #[test]
    fn entries_sorted_by_frequency() {
        let centroids = [[0., 0., 0.], [1., 1., 1.], [1., 0., 0.]];
        let entries = palette_entries(&centroids, &[20., 50., 30.], &[true, false, true]);
        let freqs = entries.iter().map(|e| e.frequency).collect::<Vec<_>>();
        assert_eq!(freqs, vec![50., 30., 20.]);
        assert_eq!(entries[0].hex, "#FFFFFF");
        assert!(!entries[0].colorblind_safe);
    }

    #[test]
    fn entries_serialize_with_named_fields() {
        let json = serde_json::to_value(PaletteEntry::new([1, 2, 3], 4.0, false)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "hex": "#010203",
                "rgb": [1, 2, 3],
                "frequency": 4.0,
                "colorblind_safe": false
            })
        );
    }
}
