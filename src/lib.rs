pub mod banner;
pub mod config;
pub mod consts;
pub mod engine;
pub mod events;
pub mod generator;
pub mod ingest;
pub mod logging;
pub mod prompts;
pub mod server;
pub mod spinner;
pub mod storage;
