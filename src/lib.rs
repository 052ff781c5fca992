pub mod config;
pub mod discovery;
pub mod eligibility;
pub mod model;
pub mod ownership;
pub mod render;
pub mod report;
pub mod snapshot;
