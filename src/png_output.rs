//! PNG emission (§0.4): writes an 8-bit RGB, non-interlaced PNG.

use std::io::Write;

use crate::error::Result;

/// Write an interleaved RGB byte buffer (`width*height*3` bytes, top-to-bottom
/// rows) as a PNG to `writer`.
///
/// No color profile is embedded; sRGB is assumed by the consumer, per §6.
pub fn write_rgb<W: Write>(writer: W, rgb: &[u8], width: usize, height: usize) -> Result<()> {
    debug_assert_eq!(rgb.len(), width * height * 3);

    let mut encoder = png::Encoder::new(writer, width as u32, height as u32);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(rgb)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_rgb_roundtrips_through_png_decoder() {
        let (w, h) = (4usize, 3usize);
        let mut rgb = vec![0u8; w * h * 3];
        for (i, px) in rgb.chunks_exact_mut(3).enumerate() {
            px[0] = i as u8;
            px[1] = (i * 2) as u8;
            px[2] = (i * 3) as u8;
        }

        let mut buf = Vec::new();
        write_rgb(&mut buf, &rgb, w, h).unwrap();

        let decoder = png::Decoder::new(buf.as_slice());
        let mut reader = decoder.read_info().unwrap();
        let mut out = vec![0u8; reader.output_buffer_size()];
        let info = reader.next_frame(&mut out).unwrap();
        assert_eq!(info.width as usize, w);
        assert_eq!(info.height as usize, h);
        assert_eq!(info.color_type, png::ColorType::Rgb);
        assert_eq!(&out[..info.buffer_size()], rgb.as_slice());
    }

    #[test]
    fn test_write_rgb_single_pixel() {
        let rgb = vec![10u8, 20, 30];
        let mut buf = Vec::new();
        write_rgb(&mut buf, &rgb, 1, 1).unwrap();
        assert!(!buf.is_empty());
        assert_eq!(&buf[1..4], b"PNG");
    }
}
