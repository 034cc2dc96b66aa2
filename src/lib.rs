pub mod models;
pub mod services;
pub mod storage;
pub mod store;
