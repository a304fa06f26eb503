use crate::error::{CoreError, CoreResult};
use crate::inference::BoundingBox;

/// Corrosion coverage of an image, in percent.
///
/// Sums the raw area of every box and divides by the image area. Boxes are
/// neither clipped to the image nor de-duplicated, so overlapping boxes count
/// their intersection twice and the result may exceed 100.
pub fn compute_percentage(
    boxes: &[BoundingBox],
    image_width: i64,
    image_height: i64,
) -> CoreResult<f64> {
    if image_width <= 0 || image_height <= 0 {
        return Err(CoreError::InvalidDimensions {
            width: image_width,
            height: image_height,
        });
    }

    if boxes.is_empty() {
        return Ok(0.0);
    }

    let covered: f64 = boxes.iter().map(BoundingBox::area).sum();
    let total = image_width as f64 * image_height as f64;

    Ok(covered / total * 100.0)
}
