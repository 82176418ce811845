pub mod config;
pub mod domain;
pub mod ingest;
pub mod llm;
pub mod notify;
pub mod outfit;
pub mod pipeline;
pub mod time;
