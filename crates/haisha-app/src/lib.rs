//! Application service layer - run pipeline, config, export

pub mod app;
pub mod config;
pub mod export;
pub mod repository;
