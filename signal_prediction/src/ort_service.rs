use crate::{
    config::ModelSettings,
    decision::{decide, ClassProbabilities},
    model_service::ModelService,
    preprocess,
};
use ndarray::{Array, Ix4};
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use signal_proto::{SceneFrame, SignalDecision};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use thiserror::Error;
use tonic::{async_trait, Status};

#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("onnx runtime error: {0}")]
    Runtime(#[from] ort::Error),
    #[error("model has no output tensor")]
    MissingOutput,
}

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("session mutex poisoned")]
    SessionPoisoned,
    #[error("failed to build input tensor: {0}")]
    InputTensor(ort::Error),
    #[error("model forward pass failed: {0}")]
    Forward(ort::Error),
    #[error("failed to extract output tensor: {0}")]
    OutputTensor(ort::Error),
    #[error("invalid output tensor shape: {0}")]
    OutputShape(#[from] ndarray::ShapeError),
}

#[derive(Clone)]
pub struct OrtModelService {
    sessions: Arc<Vec<Arc<Mutex<Session>>>>,
    counter: Arc<AtomicUsize>,
    output_name: String,
}

impl OrtModelService {
    pub fn new(model_settings: &ModelSettings) -> Result<Self, ModelLoadError> {
        ort::init().commit()?;

        let num_instances = model_settings.num_instances;
        let mut sessions = Vec::with_capacity(num_instances);
        for _ in 0..num_instances {
            let session = Session::builder()?
                .with_optimization_level(GraphOptimizationLevel::Level3)?
                .commit_from_file(model_settings.get_model_path())?;
            sessions.push(session);
        }

        // The exported classifier names its single output arbitrarily, so
        // take it from session metadata instead of hardcoding.
        let output_name = sessions
            .first()
            .and_then(|session| session.outputs.first())
            .map(|output| output.name.clone())
            .ok_or(ModelLoadError::MissingOutput)?;

        let sessions = sessions
            .into_iter()
            .map(|session| Arc::new(Mutex::new(session)))
            .collect();

        tracing::info!("Created {} ONNX sessions", num_instances);

        Ok(Self {
            sessions: Arc::new(sessions),
            counter: Arc::new(AtomicUsize::new(0)),
            output_name,
        })
    }

    pub fn run_inference(
        &self,
        input: &Array<f32, Ix4>,
    ) -> Result<ndarray::ArrayD<f32>, InferenceError> {
        let index = self.counter.fetch_add(1, Ordering::SeqCst) % self.sessions.len();
        let session_arc = &self.sessions[index];
        let mut session = session_arc
            .lock()
            .map_err(|_| InferenceError::SessionPoisoned)?;

        tracing::debug!("Handling request with session {}", index);
        let owned_buffer;
        let input_view = if input.view().is_standard_layout() {
            input.view()
        } else {
            owned_buffer = input.to_owned();
            owned_buffer.view()
        };

        let tensor_ref =
            TensorRef::from_array_view(input_view).map_err(InferenceError::InputTensor)?;

        let input_tensor = ort::inputs![tensor_ref];

        let outputs = session
            .run(input_tensor)
            .map_err(InferenceError::Forward)?;

        let (shape, data) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(InferenceError::OutputTensor)?;

        let ix = shape.to_ixdyn();
        let array = ndarray::ArrayD::from_shape_vec(ix, data.to_vec())?;

        Ok(array)
    }
}

#[async_trait]
impl ModelService for OrtModelService {
    async fn classify(&self, frame: SceneFrame) -> Result<SignalDecision, Status> {
        let image = preprocess::decode_image(&frame.image_data)
            .map_err(|e| Status::invalid_argument(format!("image decoding error: {}", e)))?;
        let input = preprocess::preprocess(
            &image,
            preprocess::INPUT_HEIGHT,
            preprocess::INPUT_WIDTH,
        );

        let outputs = self
            .run_inference(&input)
            .map_err(|e| Status::internal(e.to_string()))?;

        let scores: Vec<f32> = outputs.iter().copied().collect();
        let probabilities = ClassProbabilities::from_scores(scores).map_err(Status::internal)?;
        let (traffic_state, confidence) = probabilities.top();
        let decision = decide(traffic_state, confidence);

        let display_image = preprocess::encode_display_png(&image)
            .map_err(|e| Status::internal(format!("display image encoding error: {}", e)))?;

        Ok(SignalDecision {
            traffic_state: decision.traffic_state.as_label().to_string(),
            confidence: decision.confidence,
            timing_seconds: decision.timing_seconds,
            is_emergency: decision.is_emergency,
            alert_message: decision
                .traffic_state
                .alert_message()
                .unwrap_or_default()
                .to_string(),
            display_image,
            timestamp: frame.timestamp,
        })
    }
}
