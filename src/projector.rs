//! Feasible-set projector (C4, §4.4).
//!
//! Projects the current spatial plane onto the box of DCT coefficients whose
//! orthonormally-scaled value lies within half a quantization step of the
//! stored integer coefficient.

use crate::consts::DCTSIZE2;
use crate::layout::{r#box, unbox};
use crate::plane::Plane;
use crate::transform::{alpha, dct_batch, idct_batch};

/// Per-plane auxiliary state for repeated projection calls: the feasible
/// interval bounds (computed once) and a scratch buffer reused across every
/// call to avoid reallocating on each solver iteration.
///
/// This plays the role the reference implementation's
/// `compute_projection_aux` plays for its FFTW plans: acquired once per plane
/// solve, reused across iterations, dropped at the end of the solve.
pub struct Projector {
    q_min: Vec<f32>,
    q_max: Vec<f32>,
    temp: Vec<f32>,
}

impl Projector {
    /// Compute the per-coefficient feasible interval `[q_min, q_max]` for a
    /// plane, in block-contiguous layout (§4.4 "Initialization").
    pub fn new(plane: &Plane) -> Self {
        let n = plane.coef.len();
        let mut q_min = vec![0.0f32; n];
        let mut q_max = vec![0.0f32; n];

        for (block_idx, (min_block, max_block)) in
            q_min.chunks_exact_mut(DCTSIZE2).zip(q_max.chunks_exact_mut(DCTSIZE2)).enumerate()
        {
            let coef_block = &plane.coef[block_idx * DCTSIZE2..(block_idx + 1) * DCTSIZE2];
            for j in 0..DCTSIZE2 {
                let u = j % 8;
                let v = j / 8;
                let scale = alpha(u) * alpha(v);
                let q = plane.quant[j] as f32;
                let c = coef_block[j] as f32;
                max_block[j] = (c + 0.5) * q / scale;
                min_block[j] = (c - 0.5) * q / scale;
            }
        }

        Projector { q_min, q_max, temp: vec![0.0f32; n] }
    }

    /// Project `plane.spatial` onto the feasible set in place.
    ///
    /// After this call, every block's scaled DCT coefficient lies within
    /// `[q_min, q_max]` (up to floating point rounding in the transform).
    pub fn project(&mut self, plane: &mut Plane) {
        let (w, h) = (plane.w, plane.h);
        r#box(&plane.spatial, &mut self.temp, w, h);

        dct_batch(&mut self.temp);

        for ((t, lo), hi) in self.temp.iter_mut().zip(self.q_min.iter()).zip(self.q_max.iter()) {
            *t = t.clamp(*lo, *hi);
        }

        idct_batch(&mut self.temp);

        unbox(&self.temp, &mut plane.spatial, w, h);
    }
}
