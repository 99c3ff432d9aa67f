//! Keypoint extraction and binary descriptor matching
//!
//! FAST-9 corners (via imageproc) with intensity-centroid orientation and
//! steered 256-bit binary descriptors sampled from a fixed pseudo-random
//! pattern. Matching is brute-force Hamming distance with cross-check.

use super::config::DetectorConfig;
use image::GrayImage;
use imageproc::corners::corners_fast9;
use imageproc::filter::gaussian_blur_f32;
use std::sync::OnceLock;

/// Number of bits in a descriptor.
pub const DESCRIPTOR_BITS: usize = 256;

/// Radius of the circular patch used for orientation moments.
const PATCH_RADIUS: i32 = 15;

/// Maximum offset in the sampling pattern; rotation preserves it.
const PATTERN_RADIUS: i32 = 13;

/// Keypoints closer than this to the border are discarded so that the
/// rotated sampling pattern and the orientation patch stay in bounds.
const BORDER_MARGIN: u32 = 16;

/// Sigma of the pre-descriptor smoothing pass.
const BLUR_SIGMA: f32 = 2.0;

#[derive(Debug, Clone, Copy)]
pub struct Keypoint {
    pub x: u32,
    pub y: u32,
    pub score: f32,
    /// Patch orientation in radians
    pub angle: f32,
}

/// 256-bit binary feature signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    bits: [u64; DESCRIPTOR_BITS / 64],
}

impl Descriptor {
    #[cfg(test)]
    pub(crate) fn from_raw_bits(bits: [u64; DESCRIPTOR_BITS / 64]) -> Self {
        Self { bits }
    }

    pub fn hamming_distance(&self, other: &Self) -> u32 {
        self.bits
            .iter()
            .zip(other.bits.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }
}

/// Keypoints and descriptors extracted from one image.
#[derive(Debug, Clone, Default)]
pub struct ImageFeatures {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl ImageFeatures {
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// Deterministic xorshift generator used for the sampling pattern and for
/// RANSAC sample selection, keeping detection reproducible.
pub(crate) struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 0xDEAD_BEEF } else { seed },
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    pub fn next_below(&mut self, bound: usize) -> usize {
        (self.next_u64() % bound as u64) as usize
    }
}

/// Fixed intensity-comparison pairs, generated once.
fn sampling_pattern() -> &'static [(i32, i32, i32, i32)] {
    static PATTERN: OnceLock<Vec<(i32, i32, i32, i32)>> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let mut rng = XorShift64::new(0x9E37_79B9_7F4A_7C15);
        let mut pairs = Vec::with_capacity(DESCRIPTOR_BITS);
        while pairs.len() < DESCRIPTOR_BITS {
            let p0 = random_disc_point(&mut rng);
            let p1 = random_disc_point(&mut rng);
            if p0 != p1 {
                pairs.push((p0.0, p0.1, p1.0, p1.1));
            }
        }
        pairs
    })
}

fn random_disc_point(rng: &mut XorShift64) -> (i32, i32) {
    let side = (2 * PATTERN_RADIUS + 1) as usize;
    loop {
        let x = rng.next_below(side) as i32 - PATTERN_RADIUS;
        let y = rng.next_below(side) as i32 - PATTERN_RADIUS;
        if x * x + y * y <= PATTERN_RADIUS * PATTERN_RADIUS {
            return (x, y);
        }
    }
}

/// Extract oriented keypoints and binary descriptors from a grayscale image.
///
/// Images too small to host the sampling patch yield no features; callers
/// treat an empty set as not-found rather than an error.
pub fn extract_features(image: &GrayImage, config: &DetectorConfig) -> ImageFeatures {
    let (width, height) = image.dimensions();
    if width <= 2 * BORDER_MARGIN || height <= 2 * BORDER_MARGIN {
        return ImageFeatures::default();
    }

    let mut corners = corners_fast9(image, config.fast_threshold);
    corners.retain(|c| {
        c.x >= BORDER_MARGIN
            && c.y >= BORDER_MARGIN
            && c.x < width - BORDER_MARGIN
            && c.y < height - BORDER_MARGIN
    });
    corners.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    corners.truncate(config.max_features);

    let blurred = gaussian_blur_f32(image, BLUR_SIGMA);

    let mut keypoints = Vec::with_capacity(corners.len());
    let mut descriptors = Vec::with_capacity(corners.len());
    for corner in &corners {
        let angle = orientation(image, corner.x, corner.y);
        keypoints.push(Keypoint {
            x: corner.x,
            y: corner.y,
            score: corner.score,
            angle,
        });
        descriptors.push(describe(&blurred, corner.x, corner.y, angle));
    }

    ImageFeatures {
        keypoints,
        descriptors,
    }
}

/// Intensity-centroid orientation of the circular patch around (x, y).
fn orientation(image: &GrayImage, x: u32, y: u32) -> f32 {
    let mut m01: i64 = 0;
    let mut m10: i64 = 0;
    for dy in -PATCH_RADIUS..=PATCH_RADIUS {
        for dx in -PATCH_RADIUS..=PATCH_RADIUS {
            if dx * dx + dy * dy > PATCH_RADIUS * PATCH_RADIUS {
                continue;
            }
            let px = image.get_pixel((x as i32 + dx) as u32, (y as i32 + dy) as u32)[0] as i64;
            m10 += dx as i64 * px;
            m01 += dy as i64 * px;
        }
    }
    (m01 as f32).atan2(m10 as f32)
}

fn describe(blurred: &GrayImage, x: u32, y: u32, angle: f32) -> Descriptor {
    let (sin, cos) = angle.sin_cos();
    let mut bits = [0u64; DESCRIPTOR_BITS / 64];
    for (i, &(x0, y0, x1, y1)) in sampling_pattern().iter().enumerate() {
        let a = rotated_pixel(blurred, x, y, x0, y0, sin, cos);
        let b = rotated_pixel(blurred, x, y, x1, y1, sin, cos);
        if a < b {
            bits[i / 64] |= 1u64 << (i % 64);
        }
    }
    Descriptor { bits }
}

fn rotated_pixel(image: &GrayImage, cx: u32, cy: u32, dx: i32, dy: i32, sin: f32, cos: f32) -> u8 {
    let rx = (cos * dx as f32 - sin * dy as f32).round() as i32;
    let ry = (sin * dx as f32 + cos * dy as f32).round() as i32;
    image.get_pixel((cx as i32 + rx) as u32, (cy as i32 + ry) as u32)[0]
}

/// An accepted correspondence between a query and a train descriptor.
#[derive(Debug, Clone, Copy)]
pub struct DescriptorMatch {
    pub query_idx: usize,
    pub train_idx: usize,
    pub distance: u32,
}

/// Brute-force Hamming matching with cross-check.
///
/// A pair is accepted only when each descriptor is the other's nearest
/// neighbour. Results are sorted by distance ascending.
pub fn match_descriptors(query: &[Descriptor], train: &[Descriptor]) -> Vec<DescriptorMatch> {
    if query.is_empty() || train.is_empty() {
        return Vec::new();
    }

    let mut best_for_query = vec![(0usize, u32::MAX); query.len()];
    let mut best_for_train = vec![(0usize, u32::MAX); train.len()];

    for (i, q) in query.iter().enumerate() {
        for (j, t) in train.iter().enumerate() {
            let d = q.hamming_distance(t);
            if d < best_for_query[i].1 {
                best_for_query[i] = (j, d);
            }
            if d < best_for_train[j].1 {
                best_for_train[j] = (i, d);
            }
        }
    }

    let mut matches = Vec::new();
    for (i, &(j, d)) in best_for_query.iter().enumerate() {
        if d != u32::MAX && best_for_train[j].0 == i {
            matches.push(DescriptorMatch {
                query_idx: i,
                train_idx: j,
                distance: d,
            });
        }
    }
    matches.sort_by_key(|m| m.distance);
    matches
}
