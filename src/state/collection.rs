// Collection-phase records

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

use crate::hooks::events::Marker;
use crate::state::ErrorInfo;

/// Counters for the collection phase. Only ever incremented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    pub errors: usize,
    pub skipped: usize,
    pub xfailed: usize,
    pub deselected: usize,
    pub collected: usize,
    pub ignored: usize,
}

impl CollectionStats {
    /// Items that survive deselection
    pub fn selected(&self) -> usize {
        self.collected.saturating_sub(self.deselected)
    }
}

/// Why an item will be skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkipInfo {
    pub reason: String,
    pub markers: Vec<String>,
}

impl SkipInfo {
    pub fn from_marker(marker: &Marker, markers: Vec<String>) -> Self {
        let reason = marker
            .reason
            .clone()
            .unwrap_or_else(|| match marker.name.as_str() {
                "skipif" => String::from("condition: true"),
                _ => String::from("unconditional skip"),
            });
        Self { reason, markers }
    }
}

/// Why an item is expected to fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XfailInfo {
    pub reason: String,
    pub raises: Option<String>,
    pub run: bool,
    pub strict: bool,
    pub markers: Vec<String>,
}

impl XfailInfo {
    pub fn from_marker(marker: &Marker, markers: Vec<String>) -> Self {
        Self {
            reason: marker.reason.clone().unwrap_or_default(),
            raises: marker.raises.clone(),
            run: marker.run.unwrap_or(true),
            strict: marker.strict.unwrap_or(false),
            markers,
        }
    }
}

/// Everything learned while collecting.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionRecord {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub stats: CollectionStats,
    /// Module display name -> first error, in insertion order
    errors: Vec<(String, ErrorInfo)>,
    pub skip: HashMap<String, Vec<SkipInfo>>,
    pub xfail: HashMap<String, Vec<XfailInfo>>,
}

impl CollectionRecord {
    pub fn new(session_id: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.into(),
            started_at,
            finished_at: None,
            stats: CollectionStats::default(),
            errors: Vec::new(),
            skip: HashMap::new(),
            xfail: HashMap::new(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn selected(&self) -> usize {
        self.stats.selected()
    }

    fn writable(&self, what: &str) -> bool {
        if self.is_finished() {
            warn!("Ignoring {} after collection finished", what);
            return false;
        }
        true
    }

    /// Count one collected item and its skip/xfail annotations.
    ///
    /// Every active `skip`/`skipif`/`xfail` marker adds its own entry, so an
    /// item with two skip markers counts twice towards `skipped`.
    pub fn add_item(&mut self, node_id: &str, markers: &[Marker]) {
        if !self.writable("collected item") {
            return;
        }
        self.stats.collected += 1;

        let names: Vec<String> = markers.iter().map(|m| m.name.clone()).collect();
        for marker in markers.iter().filter(|m| m.is_active()) {
            match marker.name.as_str() {
                "skip" | "skipif" => {
                    self.skip
                        .entry(node_id.to_string())
                        .or_default()
                        .push(SkipInfo::from_marker(marker, names.clone()));
                    self.stats.skipped += 1;
                }
                "xfail" => {
                    self.xfail
                        .entry(node_id.to_string())
                        .or_default()
                        .push(XfailInfo::from_marker(marker, names.clone()));
                    self.stats.xfailed += 1;
                }
                _ => {}
            }
        }
    }

    pub fn add_deselected(&mut self, count: usize) {
        if self.writable("deselected items") {
            self.stats.deselected += count;
        }
    }

    pub fn add_ignored(&mut self) {
        if self.writable("ignored path") {
            self.stats.ignored += 1;
        }
    }

    /// Record a module error. The error is always counted; only the first
    /// error per module keeps its details.
    pub fn add_error(&mut self, module: &str, info: ErrorInfo) {
        if !self.writable("collection error") {
            return;
        }
        self.stats.errors += 1;
        if !self.errors.iter().any(|(name, _)| name == module) {
            self.errors.push((module.to_string(), info));
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = (&str, &ErrorInfo)> {
        self.errors.iter().map(|(name, info)| (name.as_str(), info))
    }

    pub fn error_for(&self, module: &str) -> Option<&ErrorInfo> {
        self.errors
            .iter()
            .find(|(name, _)| name == module)
            .map(|(_, info)| info)
    }

    pub fn finish(&mut self, at: DateTime<Utc>) {
        if self.finished_at.is_none() {
            self.finished_at = Some(at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CollectionRecord {
        CollectionRecord::new("s1", Utc::now())
    }

    #[test]
    fn test_selected_is_derived() {
        let mut rec = record();
        for i in 0..10 {
            rec.add_item(&format!("t.py::test_{}", i), &[]);
        }
        rec.add_deselected(2);
        assert_eq!(rec.stats.collected, 10);
        assert_eq!(rec.selected(), 8);
    }

    #[test]
    fn test_two_skip_markers_add_two_entries() {
        let mut rec = record();
        let markers = vec![
            Marker::named("skip").with_reason("not on CI"),
            Marker::named("skipif").with_condition(true).with_reason("old libc"),
        ];
        rec.add_item("t.py::test_a", &markers);

        assert_eq!(rec.skip["t.py::test_a"].len(), 2);
        assert_eq!(rec.stats.skipped, 2);
        assert_eq!(rec.skip["t.py::test_a"][0].reason, "not on CI");
        assert_eq!(
            rec.skip["t.py::test_a"][1].markers,
            vec!["skip".to_string(), "skipif".to_string()]
        );
    }

    #[test]
    fn test_false_condition_is_not_counted() {
        let mut rec = record();
        rec.add_item(
            "t.py::test_a",
            &[Marker::named("skipif").with_condition(false)],
        );
        assert_eq!(rec.stats.skipped, 0);
        assert!(!rec.skip.contains_key("t.py::test_a"));
    }

    #[test]
    fn test_xfail_defaults() {
        let mut rec = record();
        rec.add_item("t.py::test_b", &[Marker::named("xfail")]);
        let info = &rec.xfail["t.py::test_b"][0];
        assert!(info.run);
        assert!(!info.strict);
        assert_eq!(rec.stats.xfailed, 1);
    }

    #[test]
    fn test_frozen_after_finish() {
        let mut rec = record();
        rec.add_item("t.py::test_a", &[]);
        rec.finish(Utc::now());
        rec.add_item("t.py::test_b", &[]);
        rec.add_deselected(1);
        assert_eq!(rec.stats.collected, 1);
        assert_eq!(rec.stats.deselected, 0);
    }
}
