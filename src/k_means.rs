use std::collections::BTreeMap;

use anyhow::ensure;
use log::debug;
use rand::{Rng, SeedableRng, rngs::StdRng};

/// A color with each channel in `[0, 1]`.
pub type Point = [f64; 3];

pub const SEED: u64 = 42;
pub const N_INIT: usize = 10;
pub const MAX_ITER: usize = 300;

/// Relative to the mean channel variance of the data.
const TOLERANCE: f64 = 1e-4;

pub fn dist_sq(p1: Point, p2: Point) -> f64 {
    (p1[0] - p2[0]).powi(2) + (p1[1] - p2[1]).powi(2) + (p1[2] - p2[2]).powi(2)
}

/// Index of the centroid nearest to `p1`. Ties go to the lowest index.
pub fn closest(p1: Point, points: &[Point]) -> usize {
    let mut min_dist = f64::INFINITY;
    let mut min_i = 0;

    for (i, p2) in points.iter().enumerate() {
        let d = dist_sq(p1, *p2);
        if d < min_dist {
            min_dist = d;
            min_i = i;
        }
    }

    min_i
}

/// Pixels collapsed into their distinct colors, each weighted by how many
/// pixels share it.
#[derive(Clone, Debug, Default)]
pub struct ColorCounts {
    pub colors: Vec<Point>,
    pub counts: Vec<u64>,
}

impl ColorCounts {
    pub fn from_pixels(pixels: &[Point]) -> Self {
        // keyed on the bit pattern so the order is stable between runs
        let mut map = BTreeMap::<[u64; 3], u64>::new();
        for p in pixels {
            *map.entry(p.map(f64::to_bits)).or_default() += 1;
        }

        let (colors, counts) = map
            .into_iter()
            .map(|(bits, count)| (bits.map(f64::from_bits), count))
            .unzip();

        Self { colors, counts }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    fn mean_variance(&self) -> f64 {
        let total = self.total() as f64;
        let mut mean = [0.; 3];
        for (c, &w) in self.colors.iter().zip(&self.counts) {
            for ch in 0..3 {
                mean[ch] += c[ch] * w as f64;
            }
        }
        let mean = mean.map(|m| m / total);

        let mut var = 0.;
        for (c, &w) in self.colors.iter().zip(&self.counts) {
            var += dist_sq(*c, mean) * w as f64;
        }
        var / total / 3.
    }
}

/// Outcome of one clustering: `centroids[i]` was assigned `counts[i]` pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Clustering {
    pub centroids: Vec<Point>,
    pub counts: Vec<u64>,
    /// Weighted sum of squared distances from each pixel to its centroid.
    pub inertia: f64,
    pub iterations: usize,
}

impl Clustering {
    /// Share of pixels per cluster, in percent.
    pub fn frequencies(&self) -> Vec<f64> {
        let total: u64 = self.counts.iter().sum();
        if total == 0 {
            return vec![0.; self.counts.len()];
        }
        self.counts
            .iter()
            .map(|&c| c as f64 / total as f64 * 100.)
            .collect()
    }
}

/// Weighted mean of each cluster's colors.
///
/// A cluster left without colors takes over the colors lying farthest from
/// their current centroid, one per empty cluster, which are removed from the
/// cluster they were in. When every color already sits on a centroid there is
/// nothing to take and the empty cluster keeps its previous centroid.
fn calculate_centroids(data: &ColorCounts, labels: &[usize], centroids: &[Point]) -> Vec<Point> {
    let k = centroids.len();
    let mut sums = vec![[0.; 3]; k];
    let mut weights = vec![0u64; k];

    for ((p, &w), &l) in data.colors.iter().zip(&data.counts).zip(labels) {
        for ch in 0..3 {
            sums[l][ch] += p[ch] * w as f64;
        }
        weights[l] += w;
    }

    let empty = (0..k).filter(|&j| weights[j] == 0).collect::<Vec<_>>();
    if !empty.is_empty() {
        let mut far = data
            .colors
            .iter()
            .zip(labels)
            .enumerate()
            .map(|(i, (p, &l))| (i, dist_sq(*p, centroids[l])))
            .filter(|(_, d)| *d > 0.)
            .collect::<Vec<_>>();
        far.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        for (&j, &(i, _)) in empty.iter().zip(&far) {
            let (p, w, old) = (data.colors[i], data.counts[i], labels[i]);
            for ch in 0..3 {
                sums[old][ch] -= p[ch] * w as f64;
                sums[j][ch] = p[ch] * w as f64;
            }
            weights[old] -= w;
            weights[j] = w;
        }
    }

    (0..k)
        .map(|j| {
            if weights[j] == 0 {
                centroids[j]
            } else {
                sums[j].map(|s| s / weights[j] as f64)
            }
        })
        .collect()
}

/// Picks the index whose cumulative weight first exceeds `target`.
fn pick_weighted(weights: impl Iterator<Item = f64>, target: f64) -> usize {
    let mut acc = 0.;
    let mut last = 0;
    for (i, w) in weights.enumerate() {
        if w <= 0. {
            continue;
        }
        acc += w;
        last = i;
        if acc > target {
            return i;
        }
    }
    last
}

/// k-means++ seeding: each new centroid is drawn with probability
/// proportional to its squared distance from the nearest chosen one.
fn init_centroids(data: &ColorCounts, k: usize, rng: &mut StdRng) -> Vec<Point> {
    let weights = data.counts.iter().map(|&c| c as f64).collect::<Vec<_>>();
    let total = data.total() as f64;

    let first = pick_weighted(weights.iter().copied(), rng.random::<f64>() * total);
    let mut centroids = vec![data.colors[first]];
    let mut nearest = data
        .colors
        .iter()
        .map(|c| dist_sq(*c, data.colors[first]))
        .collect::<Vec<_>>();

    while centroids.len() < k {
        let potential: f64 = nearest.iter().zip(&weights).map(|(d, w)| d * w).sum();

        // every distinct color is already a centroid, duplicates are all that is left
        let next = if potential > 0. {
            pick_weighted(
                nearest.iter().zip(&weights).map(|(d, w)| d * w),
                rng.random::<f64>() * potential,
            )
        } else {
            pick_weighted(weights.iter().copied(), rng.random::<f64>() * total)
        };

        let centroid = data.colors[next];
        for (d, c) in nearest.iter_mut().zip(&data.colors) {
            *d = d.min(dist_sq(*c, centroid));
        }
        centroids.push(centroid);
    }

    centroids
}

fn lloyd(data: &ColorCounts, mut centroids: Vec<Point>, tolerance: f64) -> Clustering {
    let k = centroids.len();
    let mut labels = vec![usize::MAX; data.len()];
    let mut iterations = 0;

    while iterations < MAX_ITER {
        iterations += 1;

        let mut changed = false;
        for (label, point) in labels.iter_mut().zip(&data.colors) {
            let next = closest(*point, &centroids);
            if *label != next {
                *label = next;
                changed = true;
            }
        }

        if !changed {
            break;
        }

        let new_centroids = calculate_centroids(data, &labels, &centroids);

        let shift: f64 = centroids
            .iter()
            .zip(&new_centroids)
            .map(|(a, b)| dist_sq(*a, *b))
            .sum();
        centroids = new_centroids;

        if shift <= tolerance {
            break;
        }
    }

    let mut counts = vec![0u64; k];
    let mut inertia = 0.;
    for (point, &w) in data.colors.iter().zip(&data.counts) {
        let j = closest(*point, &centroids);
        counts[j] += w;
        inertia += dist_sq(*point, centroids[j]) * w as f64;
    }

    Clustering {
        centroids,
        counts,
        inertia,
        iterations,
    }
}

/// Clusters `points` into exactly `k` colors with the fixed seed and
/// [`N_INIT`] restarts.
pub fn k_means(k: usize, points: &[Point]) -> anyhow::Result<Clustering> {
    k_means_seeded(k, points, SEED, N_INIT)
}

/// Runs `n_init` seeded k-means++/Lloyd passes and keeps the one with the
/// lowest inertia. Clusters that end up empty are still returned, with a
/// count of zero.
pub fn k_means_seeded(
    k: usize,
    points: &[Point],
    seed: u64,
    n_init: usize,
) -> anyhow::Result<Clustering> {
    ensure!(k > 0, "cluster count must be at least 1");
    ensure!(!points.is_empty(), "no pixels to cluster");
    ensure!(n_init > 0, "need at least one initialisation");

    let data = ColorCounts::from_pixels(points);
    let tolerance = TOLERANCE * data.mean_variance();
    let mut rng = StdRng::seed_from_u64(seed);

    debug!(
        "clustering {} pixels ({} distinct colors) into {} clusters",
        points.len(),
        data.len(),
        k
    );

    let mut best: Option<Clustering> = None;
    for run in 0..n_init {
        let centroids = init_centroids(&data, k, &mut rng);
        let clustering = lloyd(&data, centroids, tolerance);
        debug!(
            "run {}: inertia {:.6} after {} iterations",
            run, clustering.inertia, clustering.iterations
        );

        if best
            .as_ref()
            .is_none_or(|b| clustering.inertia < b.inertia)
        {
            best = Some(clustering);
        }
    }

    best.ok_or_else(|| anyhow::anyhow!("k-means produced no result"))
}
