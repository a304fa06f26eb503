use std::path::Path;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use super::model::{BoundingBox, DetectionResult};
use crate::artifact::write_atomically;
use crate::error::CoreResult;

const BOX_COLOR: [u8; 3] = [255, 64, 0];
const BOX_THICKNESS: i32 = 3;

/// Draw every detection outline onto the source image and save it to
/// `destination`, encoded after the destination's extension.
pub fn draw_detections(result: &DetectionResult, destination: &Path) -> CoreResult<()> {
    let format = ImageFormat::from_path(destination)?;
    let mut canvas = image::open(result.source_image_path())?.to_rgb8();

    for bbox in result.boxes() {
        draw_box(&mut canvas, bbox);
    }

    let rendered = DynamicImage::ImageRgb8(canvas);
    write_atomically(destination, |w| {
        rendered.write_to(w, format)?;
        Ok(())
    })
}

fn draw_box(canvas: &mut RgbImage, bbox: &BoundingBox) {
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
    if w == 0 || h == 0 {
        return;
    }

    let x_min = (bbox.x1.floor() as i32).clamp(0, w - 1);
    let y_min = (bbox.y1.floor() as i32).clamp(0, h - 1);
    let x_max = (bbox.x2.ceil() as i32).clamp(0, w - 1);
    let y_max = (bbox.y2.ceil() as i32).clamp(0, h - 1);

    for inset in 0..BOX_THICKNESS {
        let (left, top) = (x_min + inset, y_min + inset);
        let (right, bottom) = (x_max - inset, y_max - inset);
        if left >= right || top >= bottom {
            break;
        }
        let rect = Rect::at(left, top).of_size((right - left + 1) as u32, (bottom - top + 1) as u32);
        draw_hollow_rect_mut(canvas, rect, Rgb(BOX_COLOR));
    }
}
