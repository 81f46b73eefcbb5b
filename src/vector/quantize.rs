//! Scalar Quantization
//!
//! Min/max int8 quantization for storage-size analysis. Each value maps to
//! `round((v - min) * 255 / (max - min)) - 128`.

/// int8 codes plus the parameters needed to decode them
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedVector {
    pub codes: Vec<i8>,
    /// Smallest input value
    pub min: f32,
    /// Codes per unit of input. 0.0 for constant or empty input.
    pub scale: f32,
}

impl QuantizedVector {
    /// Approximate reconstruction, `(q + 128) / scale + min`.
    ///
    /// A constant vector decodes to `min` everywhere.
    pub fn dequantize(&self) -> Vec<f32> {
        if self.scale == 0.0 {
            return vec![self.min; self.codes.len()];
        }
        self.codes
            .iter()
            .map(|&q| (q as f32 + 128.0) / self.scale + self.min)
            .collect()
    }

    /// Width of one quantization step in input units
    pub fn step(&self) -> f32 {
        if self.scale == 0.0 {
            0.0
        } else {
            1.0 / self.scale
        }
    }

    /// Bytes needed for the codes
    pub fn byte_size(&self) -> usize {
        self.codes.len() * std::mem::size_of::<i8>()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Quantize a float vector to int8 codes.
///
/// Constant input (zero range) yields all-zero codes. Non-finite values are
/// not checked and produce meaningless codes.
pub fn quantize(vector: &[f32]) -> Vec<i8> {
    quantize_with_params(vector).codes
}

/// Quantize and keep the decode parameters
pub fn quantize_with_params(vector: &[f32]) -> QuantizedVector {
    let Some((min, max)) = min_max(vector) else {
        return QuantizedVector {
            codes: Vec::new(),
            min: 0.0,
            scale: 0.0,
        };
    };

    let range = max - min;
    if range <= 0.0 || !range.is_finite() {
        return QuantizedVector {
            codes: vec![0; vector.len()],
            min,
            scale: 0.0,
        };
    }

    let scale = 255.0 / range;
    let codes = vector
        .iter()
        .map(|&v| {
            let code = ((v - min) * scale).round() - 128.0;
            code.clamp(i8::MIN as f32, i8::MAX as f32) as i8
        })
        .collect();

    QuantizedVector { codes, min, scale }
}

fn min_max(vector: &[f32]) -> Option<(f32, f32)> {
    let first = *vector.first()?;
    Some(
        vector
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}
