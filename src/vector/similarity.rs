//! Vector Similarity Functions
//!
//! SIMD-accelerated cosine similarity. The wide kernel walks the vectors in
//! 8-lane chunks with a scalar loop over the tail; the scalar kernel is the
//! portable reference. Both agree up to floating-point accumulation order.

use wide::f32x8;

use crate::config::KernelChoice;
use crate::error::{check_dimension, Result};

/// Below this magnitude product the similarity is defined as 0.0
pub const MAGNITUDE_EPSILON: f32 = 1e-8;

/// Lane width of the wide kernel
pub const LANES: usize = 8;

/// Concrete similarity kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kernel {
    Scalar,
    Wide,
}

impl Kernel {
    /// Resolve a configured choice to a kernel.
    ///
    /// `wide` picks AVX2/SSE2/NEON at compile time and degrades to scalar
    /// lanes on other targets, so `Auto` always resolves to `Wide`.
    pub fn select(choice: KernelChoice) -> Self {
        match choice {
            KernelChoice::Auto | KernelChoice::Wide => Kernel::Wide,
            KernelChoice::Scalar => Kernel::Scalar,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Kernel::Scalar => "scalar",
            Kernel::Wide => "wide-f32x8",
        }
    }

    /// Cosine similarity without length validation.
    ///
    /// Callers must have checked `a.len() == b.len()`.
    #[inline]
    pub fn cosine(self, a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

        let (dot, norm_a, norm_b) = match self {
            Kernel::Scalar => accumulate_scalar(a, b),
            Kernel::Wide => accumulate_wide(a, b),
        };

        if dot.is_finite() && norm_a.is_finite() && norm_b.is_finite() {
            finish(dot as f64, norm_a as f64, norm_b as f64)
        } else {
            // f32 sums overflow once a norm passes ~1.8e19
            let (dot, norm_a, norm_b) = accumulate_f64(a, b);
            finish(dot, norm_a, norm_b)
        }
    }
}

/// Quotient of the accumulated sums, 0.0 for near-zero magnitude or any
/// non-finite result (inf or NaN components).
#[inline]
fn finish(dot: f64, norm_a: f64, norm_b: f64) -> f32 {
    let magnitude = norm_a.sqrt() * norm_b.sqrt();
    // Also catches a NaN magnitude
    if !(magnitude > MAGNITUDE_EPSILON as f64) {
        return 0.0;
    }
    let cosine = dot / magnitude;
    if cosine.is_finite() {
        cosine as f32
    } else {
        0.0
    }
}

/// Returns (dot, |a|^2, |b|^2) summed in f64
fn accumulate_f64(a: &[f32], b: &[f32]) -> (f64, f64, f64) {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    (dot, norm_a, norm_b)
}

impl Default for Kernel {
    fn default() -> Self {
        Kernel::select(KernelChoice::Auto)
    }
}

/// Returns (dot, |a|^2, |b|^2)
#[inline]
fn accumulate_scalar(a: &[f32], b: &[f32]) -> (f32, f32, f32) {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    (dot, norm_a, norm_b)
}

#[inline(always)]
fn load(chunk: &[f32]) -> f32x8 {
    let mut lanes = [0.0f32; LANES];
    lanes.copy_from_slice(chunk);
    f32x8::from(lanes)
}

/// Returns (dot, |a|^2, |b|^2)
#[inline]
fn accumulate_wide(a: &[f32], b: &[f32]) -> (f32, f32, f32) {
    let chunks_a = a.chunks_exact(LANES);
    let chunks_b = b.chunks_exact(LANES);
    let remainder_a = chunks_a.remainder();
    let remainder_b = chunks_b.remainder();

    let mut sum_dot = f32x8::ZERO;
    let mut sum_a = f32x8::ZERO;
    let mut sum_b = f32x8::ZERO;

    for (ca, cb) in chunks_a.zip(chunks_b) {
        let va = load(ca);
        let vb = load(cb);
        sum_dot = va.mul_add(vb, sum_dot);
        sum_a = va.mul_add(va, sum_a);
        sum_b = vb.mul_add(vb, sum_b);
    }

    let mut dot = sum_dot.reduce_add();
    let mut norm_a = sum_a.reduce_add();
    let mut norm_b = sum_b.reduce_add();

    // Tail shorter than one chunk
    for (x, y) in remainder_a.iter().zip(remainder_b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    (dot, norm_a, norm_b)
}

/// Compute dot product of two vectors
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let chunks_a = a.chunks_exact(LANES);
    let chunks_b = b.chunks_exact(LANES);
    let remainder_a = chunks_a.remainder();
    let remainder_b = chunks_b.remainder();

    let mut sum = f32x8::ZERO;
    for (ca, cb) in chunks_a.zip(chunks_b) {
        sum = load(ca).mul_add(load(cb), sum);
    }

    let mut total = sum.reduce_add();
    for (x, y) in remainder_a.iter().zip(remainder_b) {
        total += x * y;
    }
    total
}

/// Euclidean norm of a vector
#[inline]
pub fn magnitude(v: &[f32]) -> f32 {
    dot_product(v, v).sqrt()
}

/// Compute cosine similarity between two vectors
///
/// Returns a value in [-1, 1], or exactly 0.0 when either vector has
/// near-zero magnitude. Fails when the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dimension(a.len(), b.len())?;
    Ok(Kernel::default().cosine(a, b))
}
