use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Axis-aligned detection box in source-image pixel coordinates.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub class_id: u32,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2, confidence: 1.0, class_id: 0 }
    }

    pub fn with_score(mut self, confidence: f32, class_id: u32) -> Self {
        self.confidence = confidence;
        self.class_id = class_id;
        self
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Raw area, never clipped.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    fn clamped(self, width: f64, height: f64) -> Option<Self> {
        let clamped = Self {
            x1: self.x1.clamp(0.0, width),
            y1: self.y1.clamp(0.0, height),
            x2: self.x2.clamp(0.0, width),
            y2: self.y2.clamp(0.0, height),
            ..self
        };
        (clamped.x1 < clamped.x2 && clamped.y1 < clamped.y2).then_some(clamped)
    }
}

/// Output of one inference call on one image.
///
/// Boxes are clamped into `[0, width] x [0, height]` on construction and
/// boxes left without area are dropped. Unknown dimensions (0x0) keep the
/// boxes as given.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    source_image_path: PathBuf,
    image_width: u32,
    image_height: u32,
    boxes: Vec<BoundingBox>,
}

impl DetectionResult {
    pub fn new(
        source_image_path: impl Into<PathBuf>,
        image_width: u32,
        image_height: u32,
        boxes: Vec<BoundingBox>,
    ) -> Self {
        let boxes = if image_width == 0 || image_height == 0 {
            boxes
        } else {
            boxes
                .into_iter()
                .filter_map(|b| b.clamped(image_width as f64, image_height as f64))
                .collect()
        };

        Self {
            source_image_path: source_image_path.into(),
            image_width,
            image_height,
            boxes,
        }
    }

    pub fn empty(source_image_path: impl Into<PathBuf>, image_width: u32, image_height: u32) -> Self {
        Self::new(source_image_path, image_width, image_height, Vec::new())
    }

    pub fn source_image_path(&self) -> &Path {
        &self.source_image_path
    }

    pub fn image_width(&self) -> u32 {
        self.image_width
    }

    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    pub fn boxes(&self) -> &[BoundingBox] {
        &self.boxes
    }

    pub fn summarize(&self, corrosion_percentage: f64) -> DetectionSummary {
        DetectionSummary {
            boxes: self.boxes.clone(),
            corrosion_percentage,
        }
    }
}

/// Serializable part of a detection that gets persisted as `detection_data`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DetectionSummary {
    pub boxes: Vec<BoundingBox>,
    pub corrosion_percentage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boxes_are_clamped_into_the_image() {
        let result = DetectionResult::new(
            "a.jpg",
            100,
            50,
            vec![BoundingBox::new(-10.0, -5.0, 40.0, 80.0)],
        );

        assert_eq!(result.boxes(), &[BoundingBox::new(0.0, 0.0, 40.0, 50.0)]);
    }

    #[test]
    fn boxes_without_area_after_clamping_are_dropped() {
        let result = DetectionResult::new(
            "a.jpg",
            100,
            100,
            vec![
                BoundingBox::new(120.0, 10.0, 150.0, 20.0),
                BoundingBox::new(10.0, 10.0, 10.0, 20.0),
                BoundingBox::new(10.0, 10.0, 20.0, 20.0),
            ],
        );

        assert_eq!(result.boxes().len(), 1);
        assert_eq!(result.boxes()[0].area(), 100.0);
    }

    #[test]
    fn unknown_dimensions_keep_boxes_verbatim() {
        let raw = BoundingBox::new(-1.0, -1.0, 500.0, 500.0);
        let result = DetectionResult::new("a.jpg", 0, 0, vec![raw]);

        assert_eq!(result.boxes(), &[raw]);
    }

    #[test]
    fn summary_carries_boxes_and_percentage() {
        let result = DetectionResult::new("a.jpg", 10, 10, vec![BoundingBox::new(0.0, 0.0, 5.0, 2.0)]);
        let summary = result.summarize(10.0);
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["corrosion_percentage"], 10.0);
        assert_eq!(json["boxes"][0]["x2"], 5.0);
    }
}
