pub mod models;
pub mod recommendations;
pub mod scoring;
