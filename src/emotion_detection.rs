//! Face finding and emotion classification on camera frames.
//!
//! Faces are located with an `OpenCV` Haar cascade; the largest face is
//! cropped, converted to a square grayscale patch and classified by an
//! `ONNX` emotion model (FER+ layout by default: `[1, 1, 64, 64]` input,
//! one logit per label).

use crate::{
    constants::{EMOTION_INPUT_SIZE, MIN_FACE_SIZE},
    inference::{InferenceAdapter, RawDetection},
    Error, Result,
};
use log::{debug, info};
use ndarray::{Array4, CowArray};
use opencv::core::{Mat, Rect, Size, Vector, CV_32F};
use opencv::imgproc::{self, InterpolationFlags};
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;
use ort::{Environment, Session, Value};
use std::path::Path;
use std::sync::Arc;

/// Output order of the FER+ emotion model
pub const FERPLUS_LABELS: [&str; 8] = [
    "neutral",
    "happiness",
    "surprise",
    "sadness",
    "anger",
    "disgust",
    "fear",
    "contempt",
];

/// Haar cascade tuning
#[derive(Debug, Clone, Copy)]
pub struct CascadeParams {
    pub scale_factor: f64,
    pub min_neighbors: i32,
    pub min_face_size: i32,
}

impl Default for CascadeParams {
    fn default() -> Self {
        Self {
            scale_factor: 1.1,
            min_neighbors: 5,
            min_face_size: MIN_FACE_SIZE,
        }
    }
}

/// Emotion classifier backed by `ONNX` Runtime
pub struct OnnxEmotionDetector {
    session: Session,
    cascade: CascadeClassifier,
    cascade_params: CascadeParams,
    labels: Vec<String>,
    input_size: i32,
    /// Multiplier applied to raw 0..255 pixel values before inference
    pixel_scale: f64,
}

impl OnnxEmotionDetector {
    /// Load the classifier and the face cascade
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The ONNX model file cannot be loaded
    /// - The cascade file is missing or empty
    /// - The label list is empty
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(model_path: P, cascade_path: Q, labels: Vec<String>) -> Result<Self> {
        if labels.is_empty() {
            return Err(Error::ModelError("Emotion label list is empty".to_string()));
        }
        info!(
            "Initializing emotion detector with model: {}",
            model_path.as_ref().display()
        );

        let environment = Arc::new(
            Environment::builder()
                .with_name("emotion_detector")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        let cascade_path = cascade_path.as_ref();
        let cascade_str = cascade_path
            .to_str()
            .ok_or_else(|| Error::InvalidInput(format!("Non UTF-8 cascade path: {}", cascade_path.display())))?;
        let cascade = CascadeClassifier::new(cascade_str)?;
        if cascade.empty()? {
            return Err(Error::ModelError(format!(
                "Face cascade could not be loaded from {}",
                cascade_path.display()
            )));
        }

        Ok(Self {
            session,
            cascade,
            cascade_params: CascadeParams::default(),
            labels,
            input_size: EMOTION_INPUT_SIZE,
            pixel_scale: 1.0,
        })
    }

    /// Load with the FER+ label order
    pub fn ferplus<P: AsRef<Path>, Q: AsRef<Path>>(model_path: P, cascade_path: Q) -> Result<Self> {
        Self::new(
            model_path,
            cascade_path,
            FERPLUS_LABELS.iter().map(|l| (*l).to_string()).collect(),
        )
    }

    #[must_use]
    pub fn with_cascade_params(mut self, params: CascadeParams) -> Self {
        self.cascade_params = params;
        self
    }

    #[must_use]
    pub fn with_input_size(mut self, input_size: i32) -> Self {
        self.input_size = input_size;
        self
    }

    #[must_use]
    pub fn with_pixel_scale(mut self, pixel_scale: f64) -> Self {
        self.pixel_scale = pixel_scale;
        self
    }

    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Locate faces in a BGR frame, returned as bounding boxes
    pub fn find_faces(&mut self, frame: &Mat) -> Result<Vec<Rect>> {
        let mut gray = Mat::default();
        imgproc::cvt_color(frame, &mut gray, imgproc::COLOR_BGR2GRAY, 0)?;
        let mut equalized = Mat::default();
        imgproc::equalize_hist(&gray, &mut equalized)?;

        let mut faces = Vector::<Rect>::new();
        let min_size = self.cascade_params.min_face_size;
        self.cascade.detect_multi_scale(
            &equalized,
            &mut faces,
            self.cascade_params.scale_factor,
            self.cascade_params.min_neighbors,
            0,
            Size::new(min_size, min_size),
            Size::default(),
        )?;
        Ok(faces.to_vec())
    }

    /// Classify the largest face in a BGR frame
    pub fn classify(&mut self, frame: &Mat) -> Result<Option<RawDetection>> {
        let faces = self.find_faces(frame)?;
        let Some(face) = largest_face(&faces) else {
            debug!("No face in frame");
            return Ok(None);
        };

        let input = self.preprocess(frame, face)?;
        let logits = self.forward(input)?;
        if logits.len() != self.labels.len() {
            return Err(Error::ModelOutputError(format!(
                "Model produced {} scores for {} labels",
                logits.len(),
                self.labels.len()
            )));
        }

        let probabilities = softmax(&logits);
        let (best, confidence) = argmax(&probabilities)
            .ok_or_else(|| Error::ModelOutputError("Empty model output".to_string()))?;

        Ok(Some(RawDetection {
            label: self.labels[best].clone(),
            confidence,
            scores: self.labels.iter().cloned().zip(probabilities).collect(),
        }))
    }

    /// Crop, grayscale and resize a face into a `[1, 1, size, size]` tensor
    #[allow(clippy::cast_sign_loss)] // input size is positive
    fn preprocess(&self, frame: &Mat, face: Rect) -> Result<Array4<f32>> {
        let face_roi = Mat::roi(frame, face)?;
        let face_mat = face_roi.try_clone()?;

        let mut gray = Mat::default();
        imgproc::cvt_color(&face_mat, &mut gray, imgproc::COLOR_BGR2GRAY, 0)?;

        let mut resized = Mat::default();
        imgproc::resize(
            &gray,
            &mut resized,
            Size::new(self.input_size, self.input_size),
            0.0,
            0.0,
            InterpolationFlags::INTER_LINEAR as i32,
        )?;

        let mut float_image = Mat::default();
        resized.convert_to(&mut float_image, CV_32F, self.pixel_scale, 0.0)?;

        let size = self.input_size as usize;
        let mut data = Vec::with_capacity(size * size);
        for row in 0..self.input_size {
            for col in 0..self.input_size {
                data.push(*float_image.at_2d::<f32>(row, col)?);
            }
        }

        Array4::from_shape_vec((1, 1, size, size), data)
            .map_err(|e| Error::ModelOutputError(format!("Failed to create input tensor: {e}")))
    }

    fn forward(&self, input: Array4<f32>) -> Result<Vec<f32>> {
        let cow_array = CowArray::from(input.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;

        let outputs = self.session.run(vec![input_tensor])?;
        let logits = outputs
            .into_iter()
            .next()
            .ok_or_else(|| Error::ModelOutputError("No output from model".to_string()))?;

        let tensor = logits.try_extract::<f32>()?;
        let view = tensor.view();
        let values = view
            .as_slice()
            .ok_or_else(|| Error::ModelOutputError("Failed to get output data".to_string()))?;
        Ok(values.to_vec())
    }
}

impl InferenceAdapter for OnnxEmotionDetector {
    type Frame = Mat;

    fn infer(&mut self, frame: &Mat) -> Result<Option<RawDetection>> {
        if frame.empty() {
            return Ok(None);
        }
        self.classify(frame)
    }

    fn name(&self) -> &str {
        "OnnxEmotionDetector"
    }
}

/// Face with the largest area, if any
#[must_use]
pub fn largest_face(faces: &[Rect]) -> Option<Rect> {
    faces.iter().copied().max_by_key(|r| i64::from(r.width) * i64::from(r.height))
}

/// Numerically stable softmax
#[must_use]
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        exps.into_iter().map(|e| e / sum).collect()
    } else {
        vec![0.0; logits.len()]
    }
}

/// Index and value of the largest element
#[must_use]
pub fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, v)| match best {
            Some((_, bv)) if bv >= v => best,
            _ => Some((i, v)),
        })
}
