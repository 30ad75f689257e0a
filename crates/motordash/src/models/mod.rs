pub mod report;

pub use report::{QueryReport, ReportCommandFailure, json_schema};
