// "collecting ..." progress line and its redraw throttle

use std::time::{Duration, Instant};

use crate::state::CollectionStats;
use crate::utils::pluralize;

/// Decides whether a progress redraw is due.
#[derive(Debug, Clone)]
pub struct RedrawThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl RedrawThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }

    /// True when a redraw should happen now. `force` and `always` bypass the
    /// interval; the first redraw is never delayed.
    pub fn should_render(&mut self, now: Instant, force: bool, always: bool) -> bool {
        let due = match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.interval,
        };
        if force || always || due {
            self.last = Some(now);
            true
        } else {
            false
        }
    }
}

/// Text of the collection progress line.
pub fn collection_line(stats: &CollectionStats, finished: bool) -> String {
    if !finished {
        let mut line = format!("collecting ... {}", pluralize(stats.collected, "item"));
        if stats.errors > 0 {
            line.push_str(&format!(" / {}", pluralize(stats.errors, "error")));
        }
        return line;
    }

    let mut line = if stats.collected == 0 {
        String::from("no tests collected")
    } else if stats.deselected >= stats.collected {
        format!("no tests collected ({} deselected)", stats.deselected)
    } else if stats.deselected > 0 {
        format!(
            "{}/{} tests collected ({} deselected)",
            stats.selected(),
            stats.collected,
            stats.deselected
        )
    } else {
        format!("{} collected", pluralize(stats.collected, "test"))
    };

    if stats.errors > 0 {
        line.push_str(&format!(", {}", pluralize(stats.errors, "error")));
    }
    if stats.skipped > 0 {
        line.push_str(&format!(", {} skipped", stats.skipped));
    }
    if stats.xfailed > 0 {
        line.push_str(&format!(", {} xfailed", stats.xfailed));
    }
    line
}
