mod error;
mod format;
mod writer;

pub use error::ReportError;
pub use format::{escape_cell, format_report};
pub use writer::{report_file_name, write_report};

pub type Result<T> = std::result::Result<T, ReportError>;
