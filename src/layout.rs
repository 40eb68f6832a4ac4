//! Conversion between block-contiguous and planar (row-major) layouts (C2).
//!
//! Mirrors the reference implementation's `box`/`unbox`: both require `w` and
//! `h` to be multiples of 8, operate on caller-owned buffers of identical
//! size, and perform no allocation.

use crate::consts::DCTSIZE;

/// Convert a block-contiguous buffer into row-major planar layout.
///
/// `src[(by*(w/8)+bx)*64 + v*8+u]` is written to `dst[(by*8+v)*w + (bx*8+u)]`.
///
/// # Panics
/// Panics (via slice indexing) if `w` or `h` is not a multiple of 8, or if
/// `src`/`dst` are shorter than `w*h`.
pub fn unbox(src: &[f32], dst: &mut [f32], w: usize, h: usize) {
    debug_assert_eq!(w % DCTSIZE, 0);
    debug_assert_eq!(h % DCTSIZE, 0);
    debug_assert_eq!(src.len(), w * h);
    debug_assert_eq!(dst.len(), w * h);

    let blocks_w = w / DCTSIZE;
    let blocks_h = h / DCTSIZE;
    let mut i = 0;
    for block_y in 0..blocks_h {
        for block_x in 0..blocks_w {
            for in_y in 0..DCTSIZE {
                let row = (block_y * DCTSIZE + in_y) * w + block_x * DCTSIZE;
                dst[row..row + DCTSIZE].copy_from_slice(&src[i..i + DCTSIZE]);
                i += DCTSIZE;
            }
        }
    }
}

/// Convert a row-major planar buffer into block-contiguous layout.
///
/// The exact inverse of [`unbox`].
pub fn r#box(src: &[f32], dst: &mut [f32], w: usize, h: usize) {
    debug_assert_eq!(w % DCTSIZE, 0);
    debug_assert_eq!(h % DCTSIZE, 0);
    debug_assert_eq!(src.len(), w * h);
    debug_assert_eq!(dst.len(), w * h);

    let blocks_w = w / DCTSIZE;
    let blocks_h = h / DCTSIZE;
    let mut i = 0;
    for block_y in 0..blocks_h {
        for block_x in 0..blocks_w {
            for in_y in 0..DCTSIZE {
                let row = (block_y * DCTSIZE + in_y) * w + block_x * DCTSIZE;
                dst[i..i + DCTSIZE].copy_from_slice(&src[row..row + DCTSIZE]);
                i += DCTSIZE;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequential(len: usize) -> Vec<f32> {
        (0..len).map(|i| i as f32).collect()
    }

    #[test]
    fn test_unbox_box_roundtrip() {
        let (w, h) = (16, 24);
        let input = sequential(w * h);

        let mut planar = vec![0.0f32; w * h];
        unbox(&input, &mut planar, w, h);

        let mut back = vec![0.0f32; w * h];
        r#box(&planar, &mut back, w, h);

        assert_eq!(input, back);
    }

    #[test]
    fn test_box_unbox_roundtrip() {
        let (w, h) = (24, 8);
        let input = sequential(w * h);

        let mut boxed = vec![0.0f32; w * h];
        r#box(&input, &mut boxed, w, h);

        let mut back = vec![0.0f32; w * h];
        unbox(&boxed, &mut back, w, h);

        assert_eq!(input, back);
    }

    #[test]
    fn test_single_block_is_identity() {
        let input = sequential(64);
        let mut planar = vec![0.0f32; 64];
        unbox(&input, &mut planar, 8, 8);
        assert_eq!(input, planar);
    }

    proptest::proptest! {
        // Property 1 (§8): unbox . box and box . unbox are both the identity
        // on any block-aligned buffer, for any block grid size.
        #[test]
        fn prop_unbox_box_is_identity(
            blocks_w in 1usize..6,
            blocks_h in 1usize..6,
            seed in proptest::collection::vec(-1000.0f32..1000.0, 1),
        ) {
            let w = blocks_w * DCTSIZE;
            let h = blocks_h * DCTSIZE;
            let base = seed[0];
            let input: Vec<f32> = (0..w * h).map(|i| base + i as f32).collect();

            let mut planar = vec![0.0f32; w * h];
            unbox(&input, &mut planar, w, h);
            let mut back = vec![0.0f32; w * h];
            r#box(&planar, &mut back, w, h);
            prop_assert_eq!(&input, &back);

            let mut boxed = vec![0.0f32; w * h];
            r#box(&input, &mut boxed, w, h);
            let mut back2 = vec![0.0f32; w * h];
            unbox(&boxed, &mut back2, w, h);
            prop_assert_eq!(&input, &back2);
        }
    }

    #[test]
    fn test_two_by_two_blocks_layout() {
        // 16x16 = four 8x8 blocks. Block (1,0) (top-right) should land at
        // planar columns 8..16, rows 0..8.
        let w = 16;
        let h = 16;
        let mut blocked = vec![0.0f32; w * h];
        // Fill block index 1 (top-right) with the value 7.0.
        for v in blocked[64..128].iter_mut() {
            *v = 7.0;
        }
        let mut planar = vec![0.0f32; w * h];
        unbox(&blocked, &mut planar, w, h);

        for y in 0..8 {
            for x in 8..16 {
                assert_eq!(planar[y * w + x], 7.0);
            }
        }
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(planar[y * w + x], 0.0);
            }
        }
    }
}
