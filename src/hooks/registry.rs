// Names of plugins worth mentioning in the header

/// Registration service for plugin names.
///
/// Passed by reference to whatever contributes a name: the hook bus adds
/// every plugin it registers, the tracer adds the host's own plugins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginRegistry {
    names: Vec<String>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name once; returns false when it was already known
    pub fn add(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.names.push(name);
        true
    }

    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.add(name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent_and_ordered() {
        let mut registry = PluginRegistry::new();
        assert!(registry.add("b"));
        assert!(registry.add("a"));
        assert!(!registry.add("b"));
        registry.extend(["c", "a"]);
        assert_eq!(registry.names(), ["b", "a", "c"]);
    }

    #[test]
    fn test_registries_are_independent() {
        let mut first = PluginRegistry::new();
        first.add("x");
        let second = PluginRegistry::new();
        assert!(second.is_empty());
    }
}
