//! Report file storage.

pub mod file_report_store;

pub use file_report_store::FileReportStore;
