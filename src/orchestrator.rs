//! Pipeline orchestrator (C8, §4.8): drives the whole JPEG-to-PNG conversion.

use std::io::Write;
use std::time::Instant;

use crate::color;
use crate::consts::{DEFAULT_ITERATIONS, DEFAULT_WEIGHT};
use crate::error::Result;
use crate::jpeg_input;
use crate::png_output;
use crate::solver::solve_plane;

/// Prints `<phase>: <n> ms` to stdout on drop, mirroring the original's
/// `START_TIMER`/`STOP_TIMER` macros (here built on [`std::time::Instant`]
/// instead of `clock()`).
struct Stopwatch {
    label: &'static str,
    start: Instant,
}

impl Stopwatch {
    fn start(label: &'static str) -> Self {
        Stopwatch { label, start: Instant::now() }
    }
}

impl Drop for Stopwatch {
    fn drop(&mut self) {
        println!("{}: {} ms", self.label, self.start.elapsed().as_millis());
    }
}

/// Convert JPEG bytes into PNG bytes written to `out`, reducing block
/// artifacts via TV-regularized DCT coefficient recovery (C1-C7 in sequence).
///
/// `iterations`/`weight` override the per-plane solver's defaults; pass
/// [`DEFAULT_ITERATIONS`]/[`DEFAULT_WEIGHT`] for the standard behavior.
pub fn run<W: Write>(jpeg_bytes: &[u8], out: W, iterations: usize, weight: f32) -> Result<()> {
    println!("reading jpeg");
    let mut image = {
        let _t = Stopwatch::start("read");
        jpeg_input::decode(jpeg_bytes)?
    };

    {
        let _t = Stopwatch::start("solve");
        for plane in image.planes.iter_mut() {
            solve_plane(plane, iterations, weight);
        }
    }

    // Luma samples are stored zero-centered (an artifact of the orthonormal
    // DCT scaling); shift back to the usual 0..255 range before upsampling
    // and color conversion. Chroma is left as-is since color::to_rgb
    // re-centers it around 128 itself.
    for v in image.planes[0].spatial.iter_mut() {
        *v += 128.0;
    }

    let rgb = {
        let _t = Stopwatch::start("color");
        color::to_rgb(&image)
    };

    {
        let _t = Stopwatch::start("write png");
        png_output::write_rgb(out, &rgb, image.width, image.height)?;
    }

    Ok(())
}

/// [`run`] with the pipeline's default iteration count and weight.
pub fn run_default<W: Write>(jpeg_bytes: &[u8], out: W) -> Result<()> {
    run(jpeg_bytes, out, DEFAULT_ITERATIONS, DEFAULT_WEIGHT)
}
