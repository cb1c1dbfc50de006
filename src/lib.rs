// Library for the daemon, the report binary, and tests

pub mod analysis;
pub mod capture;
pub mod config;
pub mod hardware;
pub mod models;
pub mod report_worker;
pub mod routes;
pub mod sample_store;
pub mod sampler;
pub mod version;
