pub mod aggregator;
pub mod batch;
pub mod classifier;
pub mod config;
pub mod error;
pub mod export;
pub mod format;
pub mod prediction;
pub mod predictor;
pub mod store;
pub mod transcoder;
pub mod upload;
