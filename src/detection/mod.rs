pub mod engine;
pub mod service;
pub mod types;

pub use engine::DetectionEngine;
pub use service::DetectionService;
pub use types::{CloneState, ComponentRecord, DetectionOutcome, DetectionResult, Request};
