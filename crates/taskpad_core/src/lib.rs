pub mod config;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod notify;
pub mod schedule;
pub mod storage;
pub mod task_api;
