use std::fmt;

use palette::{FromColor, Lab, Srgb, white_point::D65};
use serde::{Deserialize, Serialize};

use crate::k_means::Point;

pub type Matrix = [[f64; 3]; 3];

/// Red-blind: reds and greens collapse onto the same olive tones.
const PROTANOPIA: Matrix = [
    [0.56667, 0.43333, 0.0],
    [0.55833, 0.44167, 0.0],
    [0.0, 0.24167, 0.75833],
];

/// Green-blind, the most common form: orange, green and yellow run together.
const DEUTERANOPIA: Matrix = [
    [0.625, 0.375, 0.0],
    [0.70, 0.30, 0.0],
    [0.0, 0.30, 0.70],
];

/// Blue-blind: blue against yellow is lost.
const TRITANOPIA: Matrix = [
    [0.95, 0.05, 0.0],
    [0.0, 0.43333, 0.56667],
    [0.0, 0.475, 0.525],
];

/// A color-vision deficiency, approximated as a linear map on RGB.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeficiencyModel {
    Protanopia,
    Deuteranopia,
    Tritanopia,
}

impl DeficiencyModel {
    /// Every model, in the order colors are checked against them.
    pub const ALL: [DeficiencyModel; 3] = [
        DeficiencyModel::Protanopia,
        DeficiencyModel::Deuteranopia,
        DeficiencyModel::Tritanopia,
    ];

    pub const fn matrix(self) -> &'static Matrix {
        match self {
            DeficiencyModel::Protanopia => &PROTANOPIA,
            DeficiencyModel::Deuteranopia => &DEUTERANOPIA,
            DeficiencyModel::Tritanopia => &TRITANOPIA,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            DeficiencyModel::Protanopia => "protanopia",
            DeficiencyModel::Deuteranopia => "deuteranopia",
            DeficiencyModel::Tritanopia => "tritanopia",
        }
    }

    /// How `rgb` appears under this deficiency, clipped back into `[0, 1]`.
    pub fn simulate(self, rgb: Point) -> Point {
        let m = self.matrix();
        let mut out = [0.; 3];
        for (row, o) in m.iter().zip(out.iter_mut()) {
            *o = (row[0] * rgb[0] + row[1] * rgb[1] + row[2] * rgb[2]).clamp(0., 1.);
        }
        out
    }

    /// Simulated colors converted to L*a*b*, in input order.
    pub fn simulated_lab(self, colors: &[Point]) -> Vec<[f64; 3]> {
        colors.iter().map(|c| to_lab(self.simulate(*c))).collect()
    }
}

impl fmt::Display for DeficiencyModel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// CIE L*a*b* (D65) of an sRGB color with channels in `[0, 1]`.
pub fn to_lab([r, g, b]: Point) -> [f64; 3] {
    let lab = Lab::<D65, f64>::from_color(Srgb::new(r, g, b));
    [lab.l, lab.a, lab.b]
}

/// CIE76 color difference.
pub fn delta_e(a: [f64; 3], b: [f64; 3]) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
}

/// Flags each color as safe unless, under some deficiency model, it lands
/// within `threshold` ΔE of another color in the set.
///
/// A color stops being checked at the first collision found, scanning the
/// models in [`DeficiencyModel::ALL`] order and the other colors by index.
pub fn colorblind_safe_flags(colors: &[Point], threshold: f64) -> Vec<bool> {
    let simulated = DeficiencyModel::ALL
        .iter()
        .map(|model| model.simulated_lab(colors))
        .collect::<Vec<_>>();

    (0..colors.len())
        .map(|i| {
            !simulated.iter().any(|labs| {
                labs.iter()
                    .enumerate()
                    .any(|(j, lab)| i != j && delta_e(labs[i], *lab) < threshold)
            })
        })
        .collect()
}

/// Smallest pairwise ΔE between distinct entries under `model`, or `None`
/// with fewer than two colors.
pub fn min_delta_e(colors: &[Point], model: DeficiencyModel) -> Option<f64> {
    let labs = model.simulated_lab(colors);
    let mut min: Option<f64> = None;
    for i in 0..labs.len() {
        for j in (i + 1)..labs.len() {
            let d = delta_e(labs[i], labs[j]);
            min = Some(min.map_or(d, |m| m.min(d)));
        }
    }
    min
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Point = [1., 0., 0.];
    const BLUE: Point = [0., 0., 1.];

    fn green(g: u8) -> Point {
        [0., g as f64 / 255., 0.]
    }

    #[test]
    fn simulation_clips_to_unit_range() {
        for model in DeficiencyModel::ALL {
            let out = model.simulate([1., 1., 1.]);
            assert!(out.iter().all(|c| (0. ..=1.).contains(c)), "{model}: {out:?}");
        }
        assert_eq!(DeficiencyModel::Deuteranopia.simulate(RED), [0.625, 0.70, 0.]);
    }

    #[test]
    fn lab_of_white_and_black() {
        let white = to_lab([1., 1., 1.]);
        assert!((white[0] - 100.).abs() < 0.1);
        assert!(white[1].abs() < 0.1 && white[2].abs() < 0.1);

        let black = to_lab([0., 0., 0.]);
        assert!(black[0].abs() < 1e-9);
    }

    #[test]
    fn red_and_blue_are_safe() {
        assert_eq!(colorblind_safe_flags(&[RED, BLUE], 10.), vec![true, true]);
    }

    #[test]
    fn near_identical_greens_are_unsafe() {
        let colors = [green(150), green(155)];
        assert!(min_delta_e(&colors, DeficiencyModel::Deuteranopia).unwrap() < 5.);
        assert_eq!(colorblind_safe_flags(&colors, 5.), vec![false, false]);
    }

    #[test]
    fn only_the_colliding_pair_is_flagged() {
        let colors = [green(150), green(152), BLUE];
        assert_eq!(colorblind_safe_flags(&colors, 10.), vec![false, false, true]);
    }

    #[test]
    fn red_green_collapse_under_protanopia() {
        // distinct to a typical viewer, but a known protan confusion pair
        let red = [0.9, 0.3, 0.2];
        let green = [0.5, 0.823, 0.];
        assert!(delta_e(to_lab(red), to_lab(green)) > 20.);
        assert!(min_delta_e(&[red, green], DeficiencyModel::Protanopia).unwrap() < 10.);
        assert_eq!(colorblind_safe_flags(&[red, green], 10.), vec![false, false]);
    }

    #[test]
    fn single_color_is_safe() {
        assert_eq!(colorblind_safe_flags(&[RED], 10.), vec![true]);
        assert_eq!(min_delta_e(&[RED], DeficiencyModel::Tritanopia), None);
    }
}
