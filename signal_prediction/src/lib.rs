mod decision;
mod inference_service;
mod model_service;
mod ort_service;
mod preprocess;
mod server;

pub mod config;

pub use server::start_server;
