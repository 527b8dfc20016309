//! Dense Lucas-Kanade optical flow.
//!
//! For every pixel the spatial gradients of the previous frame and the
//! temporal gradient between frames are accumulated over a square window,
//! and the 2x2 normal equations are solved in closed form. Pixels whose
//! structure tensor is near-singular (flat regions, straight edges) get a
//! zero vector.

use crate::frame::{FlowField, Frame};

/// Determinant below which a pixel's flow is left at zero.
const MIN_DETERMINANT: f32 = 1e-3;

/// Dense flow estimator.
#[derive(Debug, Clone, Copy)]
pub struct LucasKanade {
    radius: u32,
}

impl LucasKanade {
    /// Create an estimator with a `window` x `window` integration area.
    ///
    /// Even windows are widened by one so the window stays centred.
    pub fn new(window: u32) -> Self {
        Self {
            radius: window.max(1) / 2,
        }
    }

    /// Side of the integration window in pixels.
    pub fn window(&self) -> u32 {
        self.radius * 2 + 1
    }

    /// Estimate the flow that carries `previous` onto `current`.
    ///
    /// Both frames must share dimensions.
    pub fn estimate(&self, previous: &Frame, current: &Frame) -> FlowField {
        let (w, h) = current.dimensions();
        debug_assert_eq!(previous.dimensions(), (w, h));
        let (wu, hu) = (w as usize, h as usize);
        let n = wu * hu;

        let prev = previous.as_raw();
        let cur = current.as_raw();
        let sample =
            |buf: &[u8], x: usize, y: usize| buf.get(y * wu + x).copied().unwrap_or(0) as f32;

        let mut ixx = vec![0.0f32; n];
        let mut ixy = vec![0.0f32; n];
        let mut iyy = vec![0.0f32; n];
        let mut ixt = vec![0.0f32; n];
        let mut iyt = vec![0.0f32; n];

        for y in 0..hu {
            let (up, down) = (y.saturating_sub(1), (y + 1).min(hu - 1));
            for x in 0..wu {
                let (left, right) = (x.saturating_sub(1), (x + 1).min(wu - 1));
                let ix =
                    (sample(prev, right, y) - sample(prev, left, y)) / (right - left).max(1) as f32;
                let iy =
                    (sample(prev, x, down) - sample(prev, x, up)) / (down - up).max(1) as f32;
                let it = sample(cur, x, y) - sample(prev, x, y);

                let i = y * wu + x;
                ixx[i] = ix * ix;
                ixy[i] = ix * iy;
                iyy[i] = iy * iy;
                ixt[i] = ix * it;
                iyt[i] = iy * it;
            }
        }

        let r = self.radius as usize;
        let sxx = box_sum(&ixx, wu, hu, r);
        let sxy = box_sum(&ixy, wu, hu, r);
        let syy = box_sum(&iyy, wu, hu, r);
        let sxt = box_sum(&ixt, wu, hu, r);
        let syt = box_sum(&iyt, wu, hu, r);

        let mut vx = vec![0.0f32; n];
        let mut vy = vec![0.0f32; n];
        for i in 0..n {
            let det = sxx[i] * syy[i] - sxy[i] * sxy[i];
            if det.abs() < MIN_DETERMINANT {
                continue;
            }
            vx[i] = (-syy[i] * sxt[i] + sxy[i] * syt[i]) / det;
            vy[i] = (sxy[i] * sxt[i] - sxx[i] * syt[i]) / det;
        }

        FlowField::from_parts(w, h, vx, vy)
    }
}

/// Sum of each pixel's `(2r+1)^2` neighbourhood, truncated at the borders.
fn box_sum(plane: &[f32], w: usize, h: usize, r: usize) -> Vec<f32> {
    let mut rows = vec![0.0f32; plane.len()];
    let mut prefix = vec![0.0f32; w.max(h) + 1];

    for y in 0..h {
        let row = &plane[y * w..(y + 1) * w];
        for x in 0..w {
            prefix[x + 1] = prefix[x] + row[x];
        }
        for x in 0..w {
            let lo = x.saturating_sub(r);
            let hi = (x + r + 1).min(w);
            rows[y * w + x] = prefix[hi] - prefix[lo];
        }
    }

    let mut out = vec![0.0f32; plane.len()];
    for x in 0..w {
        for y in 0..h {
            prefix[y + 1] = prefix[y] + rows[y * w + x];
        }
        for y in 0..h {
            let lo = y.saturating_sub(r);
            let hi = (y + r + 1).min(h);
            out[y * w + x] = prefix[hi] - prefix[lo];
        }
    }
    out
}
