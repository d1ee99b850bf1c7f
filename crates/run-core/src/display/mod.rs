pub mod format;
pub mod progress;
pub mod table;

pub use format::OutputFormat;
pub use progress::ProgressSpinner;
pub use table::{TableDisplay, TableRow, format_time};
