pub mod report;
pub mod version;
