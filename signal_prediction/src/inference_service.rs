use crate::{decision::STATES, model_service::ModelService};
use signal_proto::{
    traffic_signal_service_server::TrafficSignalService, Empty, SceneFrame, SignalDecision,
    TrafficClassLabels,
};
use std::sync::Arc;
use tonic::{async_trait, Request, Response, Status};

#[derive(Debug, Clone)]
pub struct InferenceService<M: ModelService> {
    model_service: Arc<M>,
}

impl<M: ModelService> InferenceService<M> {
    pub fn new(model_service: M) -> Self {
        Self {
            model_service: Arc::new(model_service),
        }
    }
}

#[async_trait]
impl<M: ModelService> TrafficSignalService for InferenceService<M> {
    async fn classify(
        &self,
        request: Request<SceneFrame>,
    ) -> Result<Response<SignalDecision>, Status> {
        let frame = request.into_inner();
        let model_service = self.model_service.clone();
        let decision = model_service.classify(frame).await?;

        tracing::debug!(
            "Classified scene as {} (confidence {:.3}): timing {}s, emergency={}",
            decision.traffic_state,
            decision.confidence,
            decision.timing_seconds,
            decision.is_emergency
        );

        Ok(Response::new(decision))
    }

    async fn get_traffic_class_labels(
        &self,
        _request: Request<Empty>,
    ) -> Result<Response<TrafficClassLabels>, Status> {
        let class_labels = STATES
            .iter()
            .map(|state| state.as_label().to_string())
            .collect();

        Ok(Response::new(TrafficClassLabels { class_labels }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct MockModelService {}

    #[async_trait]
    impl ModelService for MockModelService {
        async fn classify(&self, frame: SceneFrame) -> Result<SignalDecision, Status> {
            Ok(SignalDecision {
                traffic_state: "accident".to_string(),
                confidence: 0.85,
                timing_seconds: 76,
                is_emergency: true,
                alert_message: "Accident detected, emergency services should be notified"
                    .to_string(),
                display_image: Vec::new(),
                timestamp: frame.timestamp,
            })
        }
    }

    #[tokio::test]
    async fn test_classify() -> Result<(), Box<dyn std::error::Error>> {
        let inference_service = InferenceService::new(MockModelService {});

        let frame = SceneFrame {
            image_data: vec![0; 100],
            timestamp: 12345,
        };

        let request = Request::new(frame);
        let response = inference_service.classify(request).await?;

        let decision = response.into_inner();
        assert_eq!(decision.traffic_state, "accident");
        assert_eq!(decision.confidence, 0.85);
        assert_eq!(decision.timing_seconds, 76);
        assert!(decision.is_emergency);
        assert_eq!(decision.timestamp, 12345);

        Ok(())
    }

    #[tokio::test]
    async fn test_class_labels_keep_classifier_order() -> Result<(), Box<dyn std::error::Error>> {
        let inference_service = InferenceService::new(MockModelService {});

        let response = inference_service
            .get_traffic_class_labels(Request::new(Empty {}))
            .await?;

        let labels = response.into_inner().class_labels;
        assert_eq!(
            labels,
            vec!["accident", "dense_traffic", "fire", "sparse_traffic"]
        );

        Ok(())
    }
}
