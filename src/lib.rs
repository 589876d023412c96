pub mod app;
pub mod common;
pub mod config;
pub mod convert;
pub mod rules;
pub mod subscription;
