//! Objective & gradient step (C5) and per-plane solver (C6), §4.5/§4.6.

use crate::consts::{DEFAULT_ITERATIONS, DEFAULT_WEIGHT};
use crate::plane::Plane;
use crate::projector::Projector;

/// One projected-subgradient-descent step on `plane.spatial`.
///
/// Computes the TV + `alpha_eff`*TV2 subgradient and descends by it in
/// place, returning the current objective value `(TV + alpha_eff*TV2) /
/// (alpha_eff + 1)` so callers can track convergence if they want to.
///
/// `alpha_eff = weight / sqrt(2)` scales the second-order term relative to
/// the first-order one; when it is exactly zero the second-order pass is
/// skipped entirely (matching the reference implementation's `alpha != 0.`
/// guard, which also used to skip allocating the two derivative buffers).
pub fn step(plane: &mut Plane, weight: f32, step_size: f32) -> f32 {
    let w = plane.w;
    let h = plane.h;
    let fdata = &plane.spatial;
    let alpha_eff = weight / (4.0f32 / 2.0).sqrt();

    let mut grad = vec![0.0f32; w * h];
    let mut fdata_x = if alpha_eff != 0.0 { vec![0.0f32; w * h] } else { Vec::new() };
    let mut fdata_y = if alpha_eff != 0.0 { vec![0.0f32; w * h] } else { Vec::new() };

    let mut tv = 0.0f32;
    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            let g_x = if x >= w - 1 { 0.0 } else { fdata[i + 1] - fdata[i] };
            let g_y = if y >= h - 1 { 0.0 } else { fdata[i + w] - fdata[i] };
            let g_norm = (g_x * g_x + g_y * g_y).sqrt();
            tv += g_norm;

            if g_norm != 0.0 {
                grad[i] += -(g_x + g_y) / g_norm;
                if x < w - 1 {
                    grad[i + 1] += g_x / g_norm;
                }
                if y < h - 1 {
                    grad[i + w] += g_y / g_norm;
                }
            }

            if alpha_eff != 0.0 {
                fdata_x[i] = g_x;
                fdata_y[i] = g_y;
            }
        }
    }

    let mut tv2 = 0.0f32;
    if alpha_eff != 0.0 {
        for y in 0..h {
            for x in 0..w {
                let i = y * w + x;
                let g_xx = if x == 0 { 0.0 } else { fdata_x[i] - fdata_x[i - 1] };
                let g_yx = if x == 0 { 0.0 } else { fdata_y[i] - fdata_y[i - 1] };
                let g_xy = if y == 0 { 0.0 } else { fdata_x[i] - fdata_x[i - w] };
                let g_yy = if y == 0 { 0.0 } else { fdata_y[i] - fdata_y[i - w] };
                let g2_norm = (g_xx * g_xx + g_yx * g_yx + g_xy * g_xy + g_yy * g_yy).sqrt();
                tv2 += g2_norm;

                if g2_norm != 0.0 {
                    grad[i] += alpha_eff * (-(2.0 * g_xx + g_xy + g_yx + 2.0 * g_yy) / g2_norm);
                    if x > 0 {
                        grad[i - 1] += alpha_eff * ((g_yx + g_xx) / g2_norm);
                    }
                    if x < w - 1 {
                        grad[i + 1] += alpha_eff * ((g_xx + g_xy) / g2_norm);
                    }
                    if y > 0 {
                        grad[i - w] += alpha_eff * ((g_yy + g_xy) / g2_norm);
                    }
                    if y < h - 1 {
                        grad[i + w] += alpha_eff * ((g_yy + g_yx) / g2_norm);
                    }
                    if x < w - 1 && y > 0 {
                        grad[i + 1 - w] += alpha_eff * (-g_xy / g2_norm);
                    }
                    if x > 0 && y < h - 1 {
                        grad[i - 1 + w] += alpha_eff * (-g_yx / g2_norm);
                    }
                }
            }
        }
    }

    let fdata = &mut plane.spatial;
    for i in 0..fdata.len() {
        fdata[i] -= step_size * (grad[i] / (alpha_eff + 1.0));
    }

    (tv + alpha_eff * tv2) / (alpha_eff + 1.0)
}

/// Run the fixed-iteration projected subgradient descent solve on one plane
/// (C6): alternates [`Projector::project`] and [`step`] for `iterations`
/// rounds, using a step size of `1/sqrt(iterations+1)` on every round (the
/// reference implementation recomputes this once and holds it fixed across
/// the whole solve rather than decaying it per-iteration).
pub fn solve_plane(plane: &mut Plane, iterations: usize, weight: f32) {
    let mut projector = Projector::new(plane);
    let step_size = 1.0 / ((iterations + 1) as f32).sqrt();
    for _ in 0..iterations {
        projector.project(plane);
        step(plane, weight, step_size);
    }
}

/// [`solve_plane`] with the pipeline's default iteration count and weight.
pub fn solve_plane_default(plane: &mut Plane) {
    solve_plane(plane, DEFAULT_ITERATIONS, DEFAULT_WEIGHT);
}
