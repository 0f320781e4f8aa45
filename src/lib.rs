pub mod config;
pub mod db;
pub mod error;
pub mod geometry;
pub mod loader;
pub mod models;
pub mod normalize;
pub mod project;
pub mod storage;
