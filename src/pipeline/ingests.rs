// Ingest registry: datasets produced by ingest steps, keyed by step name
use indexmap::IndexMap;

/// Named datasets accumulated as ingest steps run, in ingestion order.
///
/// Steps only ever see a shared reference; the engine is the single writer.
#[derive(Debug, Clone)]
pub struct Ingests<D> {
    entries: IndexMap<String, D>,
}

impl<D> Ingests<D> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Store a dataset, replacing (last write wins) any previous one of the same name
    pub(crate) fn insert(&mut self, name: impl Into<String>, data: D) -> Option<D> {
        self.entries.insert(name.into(), data)
    }

    pub fn get(&self, name: &str) -> Option<&D> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &D)> {
        self.entries.iter().map(|(name, data)| (name.as_str(), data))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<D> Default for Ingests<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_preserves_order() {
        let mut ingests = Ingests::new();
        ingests.insert("orders", 1);
        ingests.insert("customers", 2);
        ingests.insert("regions", 3);

        assert_eq!(ingests.len(), 3);
        assert_eq!(
            ingests.names().collect::<Vec<_>>(),
            vec!["orders", "customers", "regions"]
        );
        assert_eq!(ingests.get("customers"), Some(&2));
        assert!(!ingests.contains("missing"));
        assert_eq!(
            ingests.iter().collect::<Vec<_>>(),
            vec![("orders", &1), ("customers", &2), ("regions", &3)]
        );
    }

    #[test]
    fn test_last_write_wins() {
        let mut ingests = Ingests::new();
        assert_eq!(ingests.insert("a", 1), None);
        assert_eq!(ingests.insert("a", 5), Some(1));
        assert_eq!(ingests.get("a"), Some(&5));
        assert_eq!(ingests.len(), 1);
    }
}
