//! Raster charts for the PDF report. Labels are not drawn here; the report
//! prints a legend next to each chart.

use image::{ImageFormat, Rgb, RgbImage};
use std::f64::consts::PI;
use std::io::{Seek, Write};

use crate::error::Error;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const GREEN: Rgb<u8> = Rgb([76, 175, 80]);
pub const RED: Rgb<u8> = Rgb([229, 57, 53]);
pub const BLUE: Rgb<u8> = Rgb([30, 136, 229]);
const AXIS: Rgb<u8> = Rgb([66, 66, 66]);

/// Pie chart of `slices` (value, color), starting at twelve o'clock and going
/// clockwise. An all-zero input gives an empty disc outline.
pub fn pie(size: u32, slices: &[(f64, Rgb<u8>)]) -> RgbImage {
    let mut img = RgbImage::from_pixel(size, size, WHITE);
    let total: f64 = slices.iter().map(|(v, _)| v.max(0.0)).sum();
    let center = size as f64 / 2.0;
    let radius = center - 2.0;
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let dx = x as f64 + 0.5 - center;
        let dy = y as f64 + 0.5 - center;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist > radius {
            continue;
        }
        if total <= 0.0 || dist > radius - 1.0 {
            if dist > radius - 1.0 {
                *pixel = AXIS;
            }
            continue;
        }
        // 0 at twelve o'clock, growing clockwise.
        let angle = (dx.atan2(-dy) + 2.0 * PI) % (2.0 * PI);
        let position = angle / (2.0 * PI) * total;
        let mut acc = 0.0;
        for (value, color) in slices {
            acc += value.max(0.0);
            if position < acc {
                *pixel = *color;
                break;
            }
        }
    }
    img
}

/// Vertical bars scaled to `max`, evenly spaced, with a base line.
pub fn bars(width: u32, height: u32, values: &[f64], max: f64, color: Rgb<u8>) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, WHITE);
    let margin = 10;
    let base = height.saturating_sub(margin);
    for x in margin..width.saturating_sub(margin) {
        img.put_pixel(x, base, AXIS);
    }
    if values.is_empty() || max <= 0.0 {
        return img;
    }
    let usable = width.saturating_sub(2 * margin) as f64;
    let slot = usable / values.len() as f64;
    let bar_width = (slot * 0.6).max(1.0);
    let top_room = base.saturating_sub(margin) as f64;
    for (i, value) in values.iter().enumerate() {
        let bar_height = (value.clamp(0.0, max) / max * top_room).round() as u32;
        let left = margin as f64 + i as f64 * slot + (slot - bar_width) / 2.0;
        let (x0, x1) = (left.round() as u32, (left + bar_width).round() as u32);
        for x in x0..x1.min(width) {
            for y in base.saturating_sub(bar_height)..base {
                img.put_pixel(x, y, color);
            }
        }
    }
    img
}

pub fn write_png<W: Write + Seek>(img: &RgbImage, out: &mut W) -> Result<(), Error> {
    img.write_to(out, ImageFormat::Png)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_pie_split() {
        let img = pie(100, &[(3.0, GREEN), (1.0, RED)]);
        // Clockwise from the top: right and bottom-left are in the first 75%, top-left in the rest.
        assert_eq!(*img.get_pixel(75, 50), GREEN);
        assert_eq!(*img.get_pixel(25, 75), GREEN);
        assert_eq!(*img.get_pixel(25, 25), RED);
        assert_eq!(*img.get_pixel(0, 0), WHITE);
    }

    #[test]
    fn test_empty_pie() {
        let img = pie(40, &[(0.0, GREEN), (0.0, RED)]);
        assert_eq!(*img.get_pixel(20, 20), WHITE);
    }

    #[test]
    fn test_bars_scale() {
        let img = bars(120, 100, &[1.0, 0.5], 1.0, BLUE);
        let base = 90;
        // First bar reaches the top margin, second stops half way.
        assert_eq!(*img.get_pixel(35, 11), BLUE);
        assert_eq!(*img.get_pixel(85, 11), WHITE);
        assert_eq!(*img.get_pixel(85, base - 10), BLUE);
        assert_eq!(*img.get_pixel(60, base), AXIS);
    }

    #[test]
    fn test_png_encoding() {
        let mut out = std::io::Cursor::new(Vec::new());
        write_png(&pie(20, &[(1.0, GREEN)]), &mut out).unwrap();
        assert_eq!(&out.get_ref()[1..4], b"PNG");
    }
}
