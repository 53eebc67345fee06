// Report module - console rendering and file reports

pub mod header;
pub mod highlight;
pub mod json;
pub mod progress;
pub mod summary;
pub mod traceback;

pub use header::print_header;
pub use json::JsonReporter;
pub use progress::{RedrawThrottle, collection_line};
pub use summary::{StatsColor, StatsLine, SummaryRenderer, build_stats_line, group_warnings};
pub use traceback::TracebackRenderer;
