pub mod config;
pub mod photo;
