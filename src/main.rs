#![allow(clippy::uninlined_format_args)]
use std::path::PathBuf;

use cb_palette::{PaletteOptions, extract_colorblind_safe_palette};
use clap::Parser;
use log::info;

/// Extract the dominant colors of an image and check them for color-blind
/// safety.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    image: PathBuf,

    /// JSON file with default options; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of colors to extract
    #[arg(short, long)]
    n_colors: Option<usize>,

    /// Minimum ΔE between simulated colors
    #[arg(short = 't', long)]
    delta_e_thresh: Option<f64>,

    /// Longest side to shrink the image to before clustering (0 = never)
    #[arg(long)]
    resize: Option<u32>,

    /// Skip rendering the figure
    #[arg(long)]
    no_plot: bool,

    /// Don't write the table or figure to disk
    #[arg(long)]
    no_save: bool,

    /// Directory for the outputs (default: next to the image)
    #[arg(short, long)]
    outdir: Option<PathBuf>,

    /// Also print the palette as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn options(&self) -> anyhow::Result<PaletteOptions> {
        let mut options = match &self.config {
            Some(path) => PaletteOptions::from_json_file(path)?,
            None => PaletteOptions::default(),
        };

        if let Some(n) = self.n_colors {
            options.n_colors = n;
        }
        if let Some(t) = self.delta_e_thresh {
            options.delta_e_thresh = t;
        }
        if let Some(r) = self.resize {
            options.resize = r;
        }
        if self.no_plot {
            options.plot = false;
        }
        if self.no_save {
            options.save = false;
        }
        if self.outdir.is_some() {
            options.outdir.clone_from(&self.outdir);
        }

        Ok(options)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let options = args.options()?;
    info!("Options: {:?}", options);

    let palette = extract_colorblind_safe_palette(&args.image, &options)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&palette)?);
    }

    Ok(())
}
