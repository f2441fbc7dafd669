use crate::extract::{ClippedFeature, Geom};

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;

use std::io::{Error, ErrorKind, Result};
use std::path::Path;

pub const IMG_WIDTH: u32 = 4096;
pub const IMG_HEIGHT: u32 = 4096;

const BACKGROUND_COLOR: Rgb<u8> = Rgb([0xDD, 0xDD, 0xDD]);

/// Unpacks a 5-6-5 code ("0xF972") to full channels, replicating the top
/// bits into the low ones so full intensities saturate. Unparseable codes
/// render in the sentinel pink.
pub fn color565_to_rgb(code: &str) -> Rgb<u8> {
    let c = u16::from_str_radix(code.trim_start_matches("0x"), 16).unwrap_or(0xF972);
    let mut r = ((c >> 8) & 0xF8) as u8;
    r |= r >> 5;
    let mut g = ((c >> 3) & 0xFC) as u8;
    g |= g >> 6;
    let mut b = ((c << 3) & 0xF8) as u8;
    b |= b >> 5;
    Rgb([r, g, b])
}

/// Block local pixel position, y flipped: the image origin is top left,
/// the planar origin bottom left.
fn to_pixel(x: f64, y: f64, min_x: i64, min_y: i64) -> (f32, f32) {
    (
        (x - min_x as f64) as f32,
        (IMG_HEIGHT as f64 - (y - min_y as f64)) as f32,
    )
}

fn draw_thick_line(
    img: &mut RgbImage,
    start: (f32, f32),
    end: (f32, f32),
    color: Rgb<u8>,
    width: i32,
) {
    draw_line_segment_mut(img, start, end, color);
    if width <= 1 {
        return;
    }
    // a filled circle stamped along the segment fakes the stroke width
    let radius = width / 2;
    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    let len = (dx * dx + dy * dy).sqrt();
    let steps = i32::max(1, (len / i32::max(radius, 1) as f32).ceil() as i32);
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        draw_filled_circle_mut(
            img,
            ((start.0 + dx * t) as i32, (start.1 + dy * t) as i32),
            radius,
            color,
        );
    }
}

fn draw_feature(img: &mut RgbImage, feat: &ClippedFeature, min_x: i64, min_y: i64) {
    let color = color565_to_rgb(&feat.color);
    match &feat.geometry {
        Geom::Polygon(p) => {
            let mut points: Vec<Point<i32>> = p
                .exterior()
                .0
                .iter()
                .map(|c| {
                    let (px, py) = to_pixel(c.x, c.y, min_x, min_y);
                    Point::new(px.round() as i32, py.round() as i32)
                })
                .collect();
            // open the ring back up, the rasterizer closes it itself
            while points.len() > 1 && points.last() == points.first() {
                points.pop();
            }
            points.dedup();
            if points.len() >= 3 {
                draw_polygon_mut(img, &points, color);
            }
        }
        Geom::Line(l) => {
            let width = match feat.width {
                Some(w) => i32::max(w.round() as i32, 1),
                None => 1,
            };
            for seg in l.0.windows(2) {
                let start = to_pixel(seg[0].x, seg[0].y, min_x, min_y);
                let end = to_pixel(seg[1].x, seg[1].y, min_x, min_y);
                draw_thick_line(img, start, end, color, width);
            }
        }
    }
}

/// Paints one block's clipped features onto a fresh canvas and writes the
/// png. Diagnostic only, nothing reads these back.
pub fn render_block(
    file_name: &Path,
    polygons: &[ClippedFeature],
    lines: &[ClippedFeature],
    min_x: i64,
    min_y: i64,
) -> Result<()> {
    let mut img = RgbImage::from_pixel(IMG_WIDTH, IMG_HEIGHT, BACKGROUND_COLOR);
    for p in polygons {
        draw_feature(&mut img, p, min_x, min_y);
    }
    for l in lines {
        draw_feature(&mut img, l, min_x, min_y);
    }
    match img.save(file_name) {
        Ok(()) => Ok(()),
        Err(e) => Err(Error::new(ErrorKind::Other, e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color565() {
        assert_eq!(color565_to_rgb("0xFFFF"), Rgb([255, 255, 255]));
        assert_eq!(color565_to_rgb("0x0000"), Rgb([0, 0, 0]));
        assert_eq!(color565_to_rgb("0xF800"), Rgb([255, 0, 0]));
        assert_eq!(color565_to_rgb("0x07E0"), Rgb([0, 255, 0]));
        assert_eq!(color565_to_rgb("0x001F"), Rgb([0, 0, 255]));
    }

    #[test]
    fn test_color565_bad_code_is_sentinel() {
        assert_eq!(color565_to_rgb("xyz"), color565_to_rgb("0xF972"));
    }
}
