use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detections::DetectionRecord;
use crate::media::ImageRecord;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DashboardPoint {
    pub image_id: String,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub corrosion_percentage: f64,
}

/// Aggregate view over every image that has been analyzed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DashboardSummary {
    pub total_detections: usize,
    pub average_corrosion: f64,
    pub maximum_corrosion: f64,
    /// Ordered by upload time, oldest first
    pub series: Vec<DashboardPoint>,
}

/// Join images with their most recent detection and summarize.
/// Images without a detection are left out.
pub fn summarize(images: &[ImageRecord], detections: &[DetectionRecord]) -> DashboardSummary {
    let mut latest: HashMap<&str, &DetectionRecord> = HashMap::new();
    for d in detections {
        let entry = latest.entry(d.image_id.as_str()).or_insert(d);
        if d.created_at >= entry.created_at {
            *entry = d;
        }
    }

    let mut series: Vec<DashboardPoint> = images
        .iter()
        .filter_map(|image| {
            latest.get(image.id.as_str()).map(|d| DashboardPoint {
                image_id: image.id.clone(),
                filename: image.filename.clone(),
                uploaded_at: image.uploaded_at,
                corrosion_percentage: d.corrosion_percentage,
            })
        })
        .collect();
    series.sort_by(|a, b| a.uploaded_at.cmp(&b.uploaded_at));

    let total = series.len();
    let (average, maximum) = if total == 0 {
        (0.0, 0.0)
    } else {
        let sum: f64 = series.iter().map(|p| p.corrosion_percentage).sum();
        let max = series
            .iter()
            .map(|p| p.corrosion_percentage)
            .fold(f64::MIN, f64::max);
        (sum / total as f64, max)
    };

    DashboardSummary {
        total_detections: total,
        average_corrosion: average,
        maximum_corrosion: maximum,
        series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::DetectionSummary;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn image(id: &str, uploaded: i64) -> ImageRecord {
        ImageRecord {
            id: id.to_string(),
            filename: format!("{}.jpg", id),
            original_url: format!("/uploads/{}.jpg", id),
            processed_url: None,
            uploaded_at: at(uploaded),
        }
    }

    fn detection(image_id: &str, pct: f64, created: i64) -> DetectionRecord {
        DetectionRecord {
            id: format!("{}-{}", image_id, created),
            image_id: image_id.to_string(),
            corrosion_percentage: pct,
            detection_data: DetectionSummary { boxes: Vec::new(), corrosion_percentage: pct },
            created_at: at(created),
        }
    }

    #[test]
    fn empty_history_has_zero_statistics() {
        let summary = summarize(&[], &[]);
        assert_eq!(summary.total_detections, 0);
        assert_eq!(summary.average_corrosion, 0.0);
        assert_eq!(summary.maximum_corrosion, 0.0);
        assert!(summary.series.is_empty());
    }

    #[test]
    fn statistics_use_latest_detection_per_image() {
        let images = [image("b", 200), image("a", 100), image("c", 300)];
        let detections = [
            detection("a", 10.0, 110),
            detection("a", 30.0, 120),
            detection("b", 20.0, 210),
        ];

        let summary = summarize(&images, &detections);

        assert_eq!(summary.total_detections, 2);
        assert!((summary.average_corrosion - 25.0).abs() < 1e-9);
        assert_eq!(summary.maximum_corrosion, 30.0);
        let order: Vec<&str> = summary.series.iter().map(|p| p.image_id.as_str()).collect();
        assert_eq!(order, vec!["a", "b"]);
        assert_eq!(summary.series[0].corrosion_percentage, 30.0);
    }
}
