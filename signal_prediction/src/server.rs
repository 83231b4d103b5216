use crate::{
    config::Settings, inference_service::InferenceService, model_service::ModelService,
    ort_service::OrtModelService,
};
use signal_proto::traffic_signal_service_server::TrafficSignalServiceServer;
use tokio::signal;
use tonic::transport::server::Router;
use tonic::transport::Server;

pub struct GrpcServer {
    router: Router,
    addr: String,
}

impl GrpcServer {
    pub async fn new<M: ModelService>(model_service: M, addr: &str) -> Self {
        let inference_service = InferenceService::new(model_service);
        let reflection_service = tonic_reflection::server::Builder::configure()
            .register_encoded_file_descriptor_set(signal_proto::FILE_DESCRIPTOR_SET)
            .build_v1alpha()
            .unwrap();

        let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
        health_reporter
            .set_serving::<TrafficSignalServiceServer<InferenceService<M>>>()
            .await;

        let router = Server::builder()
            .add_service(TrafficSignalServiceServer::new(inference_service))
            .add_service(reflection_service)
            .add_service(health_service);

        Self {
            router,
            addr: addr.to_string(),
        }
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = self.addr.parse().expect("failed to parse address");

        tracing::info!("Inference service listening on {}", self.addr);

        let shutdown = async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown")
        };

        self.router.serve_with_shutdown(addr, shutdown).await?;
        Ok(())
    }
}

pub async fn start_server(config: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let ort_model_service =
        OrtModelService::new(&config.model).expect("failed to instantiate ort model service");

    let addr = config.server.get_address();
    let grpc_server = GrpcServer::new(ort_model_service, &addr).await;
    tracing::info!("Listening on {}", &addr);

    grpc_server.run().await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
