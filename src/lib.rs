pub mod cli;
pub mod engine;
pub mod error;
pub mod layout;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod report;
pub mod storage;
pub mod text_summary;
