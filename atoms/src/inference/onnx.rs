use std::path::Path;
use std::sync::Mutex;

use image::imageops::FilterType;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use tracing::{debug, info};

use super::detector::Detector;
use super::model::DetectionResult;
use super::yolo::{decode_output, YoloParams};
use crate::error::{CoreError, CoreResult};

/// YOLO detector running an ONNX export of the corrosion model.
pub struct OnnxDetector {
    session: Mutex<Session>,
    params: YoloParams,
}

impl OnnxDetector {
    pub fn load(model_path: &Path, params: YoloParams) -> CoreResult<Self> {
        if !model_path.is_file() {
            return Err(CoreError::ModelLoad(format!(
                "model file {} does not exist",
                model_path.display()
            )));
        }

        let session = Session::builder()
            .and_then(|b| b.with_intra_threads(4))
            .and_then(|b| b.commit_from_file(model_path))
            .map_err(|e| CoreError::ModelLoad(format!("{}: {}", model_path.display(), e)))?;

        info!("ONNX Runtime session created for {}", model_path.display());

        Ok(Self {
            session: Mutex::new(session),
            params,
        })
    }

    fn input_tensor(&self, image_path: &Path) -> CoreResult<(Array4<f32>, u32, u32)> {
        let source = image::open(image_path)?.to_rgb8();
        let (width, height) = source.dimensions();
        let size = self.params.input_size;

        let resized = image::imageops::resize(&source, size, size, FilterType::Triangle);
        let size = size as usize;
        let mut input = Array4::<f32>::zeros((1, 3, size, size));
        for (x, y, pixel) in resized.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            input[[0, 0, y, x]] = pixel[0] as f32 / 255.0;
            input[[0, 1, y, x]] = pixel[1] as f32 / 255.0;
            input[[0, 2, y, x]] = pixel[2] as f32 / 255.0;
        }

        Ok((input, width, height))
    }
}

impl Detector for OnnxDetector {
    fn detect(&self, image_path: &Path) -> CoreResult<DetectionResult> {
        if !image_path.is_file() {
            return Err(CoreError::NotFound(image_path.display().to_string()));
        }

        let (input, width, height) = self.input_tensor(image_path)?;
        let infer_err = |e: ort::Error| CoreError::Inference(e.to_string());

        let mut session = self
            .session
            .lock()
            .map_err(|_| CoreError::Inference("session lock poisoned".to_string()))?;
        let tensor = TensorRef::from_array_view(&input).map_err(infer_err)?;
        let outputs = session.run(ort::inputs![tensor]).map_err(infer_err)?;
        let (shape, data) = outputs[0].try_extract_tensor::<f32>().map_err(infer_err)?;

        if shape.len() != 3 {
            return Err(CoreError::Inference(format!("unexpected output shape {:?}", shape)));
        }
        let (channels, anchors) = (shape[1] as usize, shape[2] as usize);
        debug!("model output: {} channels x {} anchors", channels, anchors);

        let size = self.params.input_size as f32;
        let boxes = decode_output(
            data,
            channels,
            anchors,
            width as f32 / size,
            height as f32 / size,
            &self.params,
        );

        Ok(DetectionResult::new(image_path, width, height, boxes))
    }
}
