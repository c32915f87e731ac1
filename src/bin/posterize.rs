use std::path::PathBuf;

use cb_palette::{
    k_means::{self, closest},
    loader,
};
use clap::Parser;
use image::Rgb;
use log::info;

/// Repaint an image using only its extracted dominant colors.
#[derive(Parser, Debug)]
struct Args {
    image: PathBuf,

    #[arg(short, long, default_value_t = 4)]
    n_colors: usize,

    /// Longest side to shrink the image to before clustering (0 = never)
    #[arg(long, default_value_t = 400)]
    resize: u32,

    #[arg(short, long, default_value = "out.png")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut image = loader::load_image(&args.image, args.resize)?;
    let pixels = loader::normalized_pixels(&image);
    let clustering = k_means::k_means(args.n_colors, &pixels)?;
    info!("Centroids: {:?}", clustering.centroids);

    let palette = clustering
        .centroids
        .iter()
        .map(|c| c.map(|x| (x * 255.).round().clamp(0., 255.) as u8))
        .collect::<Vec<_>>();

    for (px, p) in image.pixels_mut().zip(&pixels) {
        *px = Rgb(palette[closest(*p, &clustering.centroids)]);
    }

    image.save(&args.output)?;
    info!("Saved {}", args.output.display());

    Ok(())
}
