pub mod background;
pub mod bridge;
pub mod cli;
pub mod config;
pub mod detect;
pub mod error;
pub mod ghapi;
pub mod lcdb;
pub mod models;
pub mod signal;
pub mod srs;
pub mod sync;
