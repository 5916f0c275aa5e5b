//! Identifier allocation for generated code.

use std::collections::HashSet;

/// Hands out identifiers that do not collide with names already in use.
///
/// A taken name gets a numeric suffix: `Foo`, `Foo_2`, `Foo_3`, ...
#[derive(Debug, Clone, Default)]
pub struct IdentifierAllocator {
    taken: HashSet<String>,
}

impl IdentifierAllocator {
    pub fn new<I, S>(taken: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            taken: taken.into_iter().map(Into::into).collect(),
        }
    }

    /// Reserve and return `want`, or the first free suffixed variant of it.
    pub fn allocate(&mut self, want: &str) -> String {
        let mut id = want.to_string();
        let mut i = 2;
        while self.taken.contains(&id) {
            id = format!("{}_{}", want, i);
            i += 1;
        }
        self.taken.insert(id.clone());
        id
    }

    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_name_is_returned_as_is() {
        let mut alloc = IdentifierAllocator::new(["ctx"]);
        assert_eq!(alloc.allocate("Foo"), "Foo");
        assert!(alloc.is_taken("Foo"));
    }

    #[test]
    fn test_suffixes_on_collision() {
        let mut alloc = IdentifierAllocator::new(["Foo"]);
        assert_eq!(alloc.allocate("Foo"), "Foo_2");
        assert_eq!(alloc.allocate("Foo"), "Foo_3");
    }

    #[test]
    fn test_skips_taken_suffixes() {
        let mut alloc = IdentifierAllocator::new(vec!["m".to_string(), "m_2".to_string()]);
        assert_eq!(alloc.allocate("m"), "m_3");
        assert_eq!(alloc.allocate("m_2"), "m_2_2");
    }
}
