// Captured warnings

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::hooks::events::WarningMessage;

/// A warning observed during the run. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WarningRecord {
    /// Hex SHA-256 of the message text; the grouping key in summaries
    pub hash: String,
    pub message_lines: Vec<String>,
    pub node_id: String,
    pub category: String,
    pub filename: String,
    pub lineno: u32,
    pub when: String,
}

impl WarningRecord {
    pub fn from_message(msg: &WarningMessage) -> Self {
        Self {
            hash: content_hash(&msg.message),
            message_lines: msg.message.lines().map(str::to_string).collect(),
            node_id: msg.node_id.clone(),
            category: msg.category.clone(),
            filename: msg.filename.clone(),
            lineno: msg.lineno,
            when: msg.when.clone(),
        }
    }

    /// Where the warning came from: the node id, or `file:line` for
    /// warnings raised outside of a test
    pub fn location(&self) -> String {
        if !self.node_id.is_empty() {
            self.node_id.clone()
        } else if !self.filename.is_empty() {
            format!("{}:{}", self.filename, self.lineno)
        } else {
            String::from("<unknown>")
        }
    }
}

pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_text_same_hash() {
        let a = WarningRecord::from_message(&WarningMessage::new("deprecated", "a.py::t1"));
        let b = WarningRecord::from_message(&WarningMessage::new("deprecated", "b.py::t2"));
        assert_eq!(a.hash, b.hash);
        assert_eq!(a.hash.len(), 64);
    }

    #[test]
    fn test_location_fallbacks() {
        let mut msg = WarningMessage::new("x", "");
        msg.filename = "conftest.py".to_string();
        msg.lineno = 7;
        assert_eq!(WarningRecord::from_message(&msg).location(), "conftest.py:7");
        msg.filename.clear();
        assert_eq!(WarningRecord::from_message(&msg).location(), "<unknown>");
    }

    #[test]
    fn test_multiline_message() {
        let rec = WarningRecord::from_message(&WarningMessage::new("line one\nline two", "t"));
        assert_eq!(rec.message_lines, vec!["line one", "line two"]);
    }
}
