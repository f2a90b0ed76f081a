pub mod analyzer;
pub mod config;
pub mod model;
pub mod observer;
pub mod pipeline;
pub mod provider;
pub mod storage;
pub mod strategy;
pub mod tracker;
pub mod utils;
