// src/lib.rs

//! Penpals feed library: fetch, clean, cache and search r/penpals posts.

pub mod error;
pub mod export;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;
