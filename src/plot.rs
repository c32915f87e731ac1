//! Side-by-side figure of the analysed image and its extracted palette.
//!
//! Layout is in inches and point sizes, rasterised at [`DPI`]: the image on
//! the left at three quarters of the width, a column of swatches on the right
//! labelled with their hex code and a ✓/✗ safety mark.

use std::path::Path;

use anyhow::Context;
use image::{Rgb, RgbImage, imageops::FilterType};
use imageproc::{
    drawing::{draw_filled_rect_mut, draw_hollow_rect_mut},
    rect::Rect,
};
use log::info;

use crate::PaletteEntry;

pub const DPI: u32 = 300;
const FIG_WIDTH_IN: f64 = 8.;
const FIG_HEIGHT_IN: f64 = 5.;

const IMAGE_TITLE: &str = "INPUT IMAGE";
const PALETTE_TITLE: &str = "EXTRACTED PALETTE";
const IMAGE_TITLE_PT: f64 = 30.;
const PALETTE_TITLE_PT: f64 = 15.;
const LABEL_PT: f64 = 9.;

/// Fraction of each palette slot taken up by its bar.
const BAR_HEIGHT: f64 = 0.8;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

fn inches(x: f64) -> u32 {
    (x * DPI as f64).round() as u32
}

/// Glyph cell scale that makes text roughly `pt` points tall.
fn glyph_scale(pt: f64) -> u32 {
    let px = pt / 72. * DPI as f64;
    ((px / GLYPH_HEIGHT as f64).round() as u32).max(1)
}

fn text_width(text: &str, scale: u32) -> u32 {
    let n = text.chars().count() as u32;
    if n == 0 {
        return 0;
    }
    (n * (GLYPH_WIDTH + 1) - 1) * scale
}

fn draw_text(canvas: &mut RgbImage, text: &str, x: i32, y: i32, scale: u32, color: Rgb<u8>) {
    let advance = ((GLYPH_WIDTH + 1) * scale) as i32;
    for (i, ch) in text.chars().enumerate() {
        let Some(rows) = glyph(ch) else { continue };
        let gx = x + i as i32 * advance;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if ((*bits >> (GLYPH_WIDTH - 1 - col)) & 1) != 0 {
                    let rect = Rect::at(gx + (col * scale) as i32, y + (row as u32 * scale) as i32)
                        .of_size(scale, scale);
                    draw_filled_rect_mut(canvas, rect, color);
                }
            }
        }
    }
}

/// Draws `text` centred on `cx`, shrinking it if it would be wider than
/// `max_width`.
fn draw_text_centered(
    canvas: &mut RgbImage,
    text: &str,
    cx: i32,
    top: i32,
    scale: u32,
    max_width: u32,
    color: Rgb<u8>,
) {
    let mut scale = scale;
    while scale > 1 && text_width(text, scale) > max_width {
        scale -= 1;
    }
    let x = cx - text_width(text, scale) as i32 / 2;
    draw_text(canvas, text, x, top, scale, color);
}

/// Bounding box of everything that is not background, grown by `pad`.
fn crop_to_content(canvas: &RgbImage, pad: u32) -> RgbImage {
    let (w, h) = canvas.dimensions();
    let (mut x0, mut y0, mut x1, mut y1) = (w, h, 0, 0);
    for (x, y, px) in canvas.enumerate_pixels() {
        if *px != WHITE {
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);
        }
    }
    if x0 > x1 {
        return canvas.clone();
    }

    let x0 = x0.saturating_sub(pad);
    let y0 = y0.saturating_sub(pad);
    let x1 = (x1 + pad).min(w - 1);
    let y1 = (y1 + pad).min(h - 1);
    image::imageops::crop_imm(canvas, x0, y0, x1 - x0 + 1, y1 - y0 + 1).to_image()
}

/// Renders the two-panel figure; entries are drawn top to bottom in order.
pub fn render_figure(image: &RgbImage, entries: &[PaletteEntry]) -> RgbImage {
    let (width, height) = (inches(FIG_WIDTH_IN), inches(FIG_HEIGHT_IN));
    let mut canvas = RgbImage::from_pixel(width, height, WHITE);

    let margin = inches(0.15);
    let gap = inches(0.2);
    let image_title_scale = glyph_scale(IMAGE_TITLE_PT);
    let title_band = image_title_scale * GLYPH_HEIGHT + inches(0.1);

    let panel_top = margin + title_band;
    let panel_h = height - panel_top - margin;
    let usable_w = width - 2 * margin - gap;
    let left_w = usable_w * 3 / 4;
    let right_w = usable_w - left_w;
    let left_x = margin;
    let right_x = margin + left_w + gap;

    // image panel, aspect preserved
    let (iw, ih) = image.dimensions();
    if iw > 0 && ih > 0 {
        let s = (left_w as f64 / iw as f64).min(panel_h as f64 / ih as f64);
        let (sw, sh) = (
            ((iw as f64 * s) as u32).max(1),
            ((ih as f64 * s) as u32).max(1),
        );
        let scaled = image::imageops::resize(image, sw, sh, FilterType::Nearest);
        let x = left_x + (left_w - sw) / 2;
        let y = panel_top + (panel_h - sh) / 2;
        image::imageops::overlay(&mut canvas, &scaled, x as i64, y as i64);
    }
    draw_text_centered(
        &mut canvas,
        IMAGE_TITLE,
        (left_x + left_w / 2) as i32,
        margin as i32,
        image_title_scale,
        left_w,
        BLACK,
    );

    // palette panel
    let palette_title_scale = glyph_scale(PALETTE_TITLE_PT);
    draw_text_centered(
        &mut canvas,
        PALETTE_TITLE,
        (right_x + right_w / 2) as i32,
        (panel_top - palette_title_scale * GLYPH_HEIGHT - inches(0.05)) as i32,
        palette_title_scale,
        right_w,
        BLACK,
    );
    draw_hollow_rect_mut(
        &mut canvas,
        Rect::at(right_x as i32, panel_top as i32).of_size(right_w, panel_h),
        BLACK,
    );

    if !entries.is_empty() {
        let slot = panel_h as f64 / entries.len() as f64;
        let bar_h = ((slot * BAR_HEIGHT) as u32).max(5);
        let inset = inches(0.03);
        let bar_w = right_w.saturating_sub(2 * inset).max(5);
        let label_scale = glyph_scale(LABEL_PT);

        for (i, entry) in entries.iter().enumerate() {
            let cy = panel_top as f64 + slot * (i as f64 + 0.5);
            let top = (cy - bar_h as f64 / 2.) as i32;
            let left = (right_x + inset) as i32;

            draw_filled_rect_mut(
                &mut canvas,
                Rect::at(left, top).of_size(bar_w, bar_h),
                BLACK,
            );
            draw_filled_rect_mut(
                &mut canvas,
                Rect::at(left + 2, top + 2).of_size(bar_w - 4, bar_h - 4),
                Rgb(entry.rgb),
            );

            let label = format!(
                "{} {}",
                entry.hex,
                if entry.colorblind_safe { '✓' } else { '✗' }
            );
            let text_top = cy as i32 - (label_scale * GLYPH_HEIGHT) as i32 / 2;
            draw_text_centered(
                &mut canvas,
                &label,
                left + bar_w as i32 / 2,
                text_top,
                label_scale,
                bar_w,
                WHITE,
            );
        }
    }

    crop_to_content(&canvas, inches(0.1))
}

pub fn save_figure(figure: &RgbImage, path: &Path) -> anyhow::Result<()> {
    figure
        .save(path)
        .with_context(|| format!("Saving figure: {}", path.display()))?;
    info!("Figure saved to {}", path.display());
    Ok(())
}

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;

/// 5×7 bitmaps, one row per byte, most significant of the low five bits on
/// the left. Covers hex codes, the titles and the safety marks.
fn glyph(ch: char) -> Option<[u8; 7]> {
    let rows = match ch.to_ascii_uppercase() {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '#' => [0x0A, 0x0A, 0x1F, 0x0A, 0x1F, 0x0A, 0x0A],
        '✓' => [0x00, 0x01, 0x02, 0x02, 0x14, 0x08, 0x00],
        '✗' => [0x00, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x00],
        _ => return None,
    };
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(rgb: [u8; 3], safe: bool) -> PaletteEntry {
        PaletteEntry::new(rgb, 50., safe)
    }

    #[test]
    fn every_label_character_has_a_glyph() {
        for ch in "#0123456789ABCDEF✓✗".chars() {
            assert!(glyph(ch).is_some(), "{ch}");
        }
        for ch in IMAGE_TITLE.chars().chain(PALETTE_TITLE.chars()) {
            assert!(ch == ' ' || glyph(ch).is_some(), "{ch}");
        }
    }

    #[test]
    fn text_width_counts_spacing() {
        assert_eq!(text_width("", 3), 0);
        assert_eq!(text_width("A", 2), 10);
        assert_eq!(text_width("AB", 1), 11);
    }

    #[test]
    fn crop_keeps_content_and_padding() {
        let mut canvas = RgbImage::from_pixel(100, 100, WHITE);
        canvas.put_pixel(40, 50, BLACK);
        canvas.put_pixel(60, 55, BLACK);
        let cropped = crop_to_content(&canvas, 5);
        assert_eq!(cropped.dimensions(), (31, 16));
        assert_eq!(cropped.get_pixel(5, 5), &BLACK);
    }

    #[test]
    fn figure_shows_image_and_swatches() {
        let image = RgbImage::from_fn(40, 20, |x, _| {
            if x < 20 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) }
        });
        let entries = [entry([12, 200, 90], true), entry([250, 180, 20], false)];
        let figure = render_figure(&image, &entries);

        let (w, h) = figure.dimensions();
        assert!(w <= inches(FIG_WIDTH_IN) && h <= inches(FIG_HEIGHT_IN));
        assert!(w > inches(FIG_WIDTH_IN) / 2);

        let has = |c: [u8; 3]| figure.pixels().any(|p| p.0 == c);
        assert!(has([255, 0, 0]));
        assert!(has([0, 0, 255]));
        assert!(has([12, 200, 90]));
        assert!(has([250, 180, 20]));
    }

    #[test]
    fn empty_palette_still_renders() {
        let image = RgbImage::from_pixel(10, 10, Rgb([90, 90, 90]));
        let figure = render_figure(&image, &[]);
        assert!(figure.pixels().any(|p| p.0 == [90, 90, 90]));
    }
}
