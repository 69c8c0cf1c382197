pub mod config;
pub mod driver;
pub mod pages;
pub mod report;
pub mod runner;

// Re-export common items
pub use report::generate_report;
pub use runner::{run_suite, SuiteOptions};
