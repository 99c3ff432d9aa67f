//! Robust planar homography estimation
//!
//! RANSAC over 4-point direct-linear-transform solutions. Used to verify
//! that a set of descriptor matches forms a geometrically consistent
//! configuration rather than coincidental similarity.

use super::features::XorShift64;

pub type Homography = [[f64; 3]; 3];

/// Best model found by RANSAC plus its inlier mask.
#[derive(Debug, Clone)]
pub struct HomographyFit {
    pub matrix: Homography,
    pub inliers: Vec<bool>,
    pub inlier_count: usize,
}

const MIN_POINTS: usize = 4;

/// Triangles with less than this area (in square pixels) make a sample
/// degenerate.
const COLLINEARITY_EPS: f64 = 1.0;

/// Pivots below this mean the linear system has no stable solution.
const PIVOT_EPS: f64 = 1e-9;

/// Estimate a homography mapping `src` points onto `dst` points.
///
/// Returns `None` when there are fewer than four correspondences or no
/// sampled model reaches four inliers within `reproj_threshold` pixels.
pub fn find_homography(
    src: &[(f64, f64)],
    dst: &[(f64, f64)],
    reproj_threshold: f64,
    iterations: usize,
    seed: u64,
) -> Option<HomographyFit> {
    if src.len() != dst.len() || src.len() < MIN_POINTS {
        return None;
    }

    let n = src.len();
    let mut rng = XorShift64::new(seed);
    let mut best: Option<HomographyFit> = None;

    for _ in 0..iterations {
        let sample = pick_sample(&mut rng, n);
        let s = [src[sample[0]], src[sample[1]], src[sample[2]], src[sample[3]]];
        let d = [dst[sample[0]], dst[sample[1]], dst[sample[2]], dst[sample[3]]];
        if sample_degenerate(&s) || sample_degenerate(&d) {
            continue;
        }
        let Some(h) = homography_from_four(&s, &d) else {
            continue;
        };

        let mut inliers = vec![false; n];
        let mut count = 0;
        for i in 0..n {
            if let Some((px, py)) = project(&h, src[i]) {
                let err = (px - dst[i].0).hypot(py - dst[i].1);
                if err <= reproj_threshold {
                    inliers[i] = true;
                    count += 1;
                }
            }
        }

        if count >= MIN_POINTS && best.as_ref().is_none_or(|b| count > b.inlier_count) {
            best = Some(HomographyFit {
                matrix: h,
                inliers,
                inlier_count: count,
            });
        }
    }

    best
}

/// Apply a homography to a point. `None` when the point maps to infinity.
pub fn project(h: &Homography, p: (f64, f64)) -> Option<(f64, f64)> {
    let w = h[2][0] * p.0 + h[2][1] * p.1 + h[2][2];
    if w.abs() < 1e-12 {
        return None;
    }
    let x = (h[0][0] * p.0 + h[0][1] * p.1 + h[0][2]) / w;
    let y = (h[1][0] * p.0 + h[1][1] * p.1 + h[1][2]) / w;
    Some((x, y))
}

fn pick_sample(rng: &mut XorShift64, n: usize) -> [usize; 4] {
    let mut sample = [0usize; 4];
    let mut filled = 0;
    while filled < 4 {
        let candidate = rng.next_below(n);
        if !sample[..filled].contains(&candidate) {
            sample[filled] = candidate;
            filled += 1;
        }
    }
    sample
}

/// A 4-point sample is degenerate when any three points are (nearly)
/// collinear, which includes duplicate points.
fn sample_degenerate(pts: &[(f64, f64); 4]) -> bool {
    for i in 0..2 {
        for j in (i + 1)..3 {
            for k in (j + 1)..4 {
                let (ax, ay) = pts[i];
                let (bx, by) = pts[j];
                let (cx, cy) = pts[k];
                let area = ((bx - ax) * (cy - ay) - (cx - ax) * (by - ay)).abs();
                if area < COLLINEARITY_EPS {
                    return true;
                }
            }
        }
    }
    false
}

/// Exact homography through four correspondences, with h33 fixed to 1.
fn homography_from_four(src: &[(f64, f64); 4], dst: &[(f64, f64); 4]) -> Option<Homography> {
    let mut system = [[0.0f64; 9]; 8];
    for k in 0..4 {
        let (x, y) = src[k];
        let (u, v) = dst[k];
        system[2 * k] = [x, y, 1.0, 0.0, 0.0, 0.0, -u * x, -u * y, u];
        system[2 * k + 1] = [0.0, 0.0, 0.0, x, y, 1.0, -v * x, -v * y, v];
    }
    let h = solve_linear(system)?;
    Some([
        [h[0], h[1], h[2]],
        [h[3], h[4], h[5]],
        [h[6], h[7], 1.0],
    ])
}

/// Gaussian elimination with partial pivoting on an 8x8 augmented system.
fn solve_linear(mut a: [[f64; 9]; 8]) -> Option<[f64; 8]> {
    for col in 0..8 {
        let mut pivot_row = col;
        for row in (col + 1)..8 {
            if a[row][col].abs() > a[pivot_row][col].abs() {
                pivot_row = row;
            }
        }
        if a[pivot_row][col].abs() < PIVOT_EPS {
            return None;
        }
        a.swap(col, pivot_row);

        for row in (col + 1)..8 {
            let factor = a[row][col] / a[col][col];
            for idx in col..9 {
                a[row][idx] -= factor * a[col][idx];
            }
        }
    }

    let mut solution = [0.0f64; 8];
    for row in (0..8).rev() {
        let mut acc = a[row][8];
        for col in (row + 1)..8 {
            acc -= a[row][col] * solution[col];
        }
        solution[row] = acc / a[row][row];
    }
    Some(solution)
}
