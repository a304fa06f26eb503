use serde::{Deserialize, Serialize};

use super::model::BoundingBox;

/// Post-processing knobs for a YOLO-style detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoloParams {
    pub input_size: u32,
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            conf_threshold: 0.25,
            iou_threshold: 0.45,
            max_detections: 100,
        }
    }
}

/// Decode a `[1, 4 + classes, anchors]` output head into boxes in source
/// pixels. Each anchor column is `cx, cy, w, h` in model-input pixels
/// followed by one score per class.
pub fn decode_output(
    data: &[f32],
    channels: usize,
    anchors: usize,
    scale_x: f32,
    scale_y: f32,
    params: &YoloParams,
) -> Vec<BoundingBox> {
    if channels <= 4 || data.len() < channels * anchors {
        return Vec::new();
    }

    let at = |c: usize, i: usize| data[c * anchors + i];
    let mut candidates = Vec::new();

    for i in 0..anchors {
        let (class_id, score) = (4..channels)
            .map(|c| (c - 4, at(c, i)))
            .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

        if score < params.conf_threshold {
            continue;
        }

        let (cx, cy, w, h) = (at(0, i), at(1, i), at(2, i), at(3, i));
        let x1 = (cx - w / 2.0) * scale_x;
        let y1 = (cy - h / 2.0) * scale_y;
        let x2 = (cx + w / 2.0) * scale_x;
        let y2 = (cy + h / 2.0) * scale_y;

        candidates.push(
            BoundingBox::new(x1 as f64, y1 as f64, x2 as f64, y2 as f64)
                .with_score(score, class_id as u32),
        );
    }

    non_max_suppression(candidates, params.iou_threshold, params.max_detections)
}

/// Greedy, class-agnostic NMS keeping the highest-confidence boxes first.
pub fn non_max_suppression(
    mut boxes: Vec<BoundingBox>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<BoundingBox> {
    boxes.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<BoundingBox> = Vec::new();
    for candidate in boxes {
        if kept.len() >= max_detections {
            break;
        }
        if kept.iter().all(|k| iou(k, &candidate) <= iou_threshold as f64) {
            kept.push(candidate);
        }
    }
    kept
}

pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f64 {
    let ix = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
    let iy = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
    let inter = ix * iy;
    let union = a.area() + b.area() - inter;
    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Lay out anchors column-major the way the model emits them.
    fn head(anchors: &[[f32; 5]]) -> Vec<f32> {
        let n = anchors.len();
        let mut data = vec![0.0; 5 * n];
        for (i, a) in anchors.iter().enumerate() {
            for c in 0..5 {
                data[c * n + i] = a[c];
            }
        }
        data
    }

    #[test]
    fn iou_of_identical_and_disjoint_boxes() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(iou(&a, &a), 1.0);
        assert_eq!(iou(&a, &b), 0.0);
    }

    #[test]
    fn nms_drops_overlapping_lower_scores() {
        let boxes = vec![
            BoundingBox::new(0.0, 0.0, 10.0, 10.0).with_score(0.6, 0),
            BoundingBox::new(1.0, 1.0, 10.0, 10.0).with_score(0.9, 0),
            BoundingBox::new(50.0, 50.0, 60.0, 60.0).with_score(0.3, 0),
        ];

        let kept = non_max_suppression(boxes, 0.45, 10);

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].confidence, 0.9);
        assert_eq!(kept[1].confidence, 0.3);
    }

    #[test]
    fn nms_respects_max_detections() {
        let boxes = (0..5)
            .map(|i| {
                let x = i as f64 * 20.0;
                BoundingBox::new(x, 0.0, x + 10.0, 10.0).with_score(0.5, 0)
            })
            .collect();

        assert_eq!(non_max_suppression(boxes, 0.45, 3).len(), 3);
    }

    #[test]
    fn decode_filters_by_confidence_and_rescales() {
        let data = head(&[
            [320.0, 320.0, 64.0, 32.0, 0.8],
            [100.0, 100.0, 10.0, 10.0, 0.1],
        ]);
        let params = YoloParams::default();

        let boxes = decode_output(&data, 5, 2, 2.0, 0.5, &params);

        assert_eq!(boxes.len(), 1);
        let b = boxes[0];
        assert_eq!((b.x1, b.x2), (576.0, 704.0));
        assert_eq!((b.y1, b.y2), (152.0, 168.0));
        assert_eq!(b.class_id, 0);
    }

    #[test]
    fn decode_rejects_malformed_heads() {
        let params = YoloParams::default();
        assert!(decode_output(&[1.0, 2.0], 5, 2, 1.0, 1.0, &params).is_empty());
        assert!(decode_output(&[0.0; 8], 4, 2, 1.0, 1.0, &params).is_empty());
    }
}
