use signal_proto::{SceneFrame, SignalDecision};
use tonic::{async_trait, Status};

#[async_trait]
pub trait ModelService: Send + Sync + Clone + 'static {
    async fn classify(&self, frame: SceneFrame) -> Result<SignalDecision, Status>;
}
