pub mod carousel;
pub mod config;
pub mod error;
pub mod favorites;
pub mod models;
pub mod plans;
pub mod session;
pub mod storage;
