pub mod aggregate;
pub mod config;
pub mod dispatch;
pub mod emit;
pub mod errors;
pub mod extract;
pub mod fingerprint;
pub mod inputs;
pub mod model;
pub mod pipeline;
pub mod reconcile;
pub mod report;
pub mod store;
pub mod task_id;
