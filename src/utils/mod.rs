pub mod paths;

pub use paths::PathUtils;

/// `1 item`, `2 items`
pub fn pluralize(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
