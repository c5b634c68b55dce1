/// Named payloads of a container, in archive order.
///
/// Produced by [`read_entries`](super::read_entries) and consumed by
/// [`write_entries`](super::write_entries). Names are unique: the first
/// occurrence of a name wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerEntries {
    entries: Vec<(String, Vec<u8>)>,
}

impl ContainerEntries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. Returns `false` (and keeps the existing payload) when the
    /// name is already present.
    pub fn insert(&mut self, name: impl Into<String>, data: Vec<u8>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.entries.push((name, data));
        true
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries.iter().map(|(n, d)| (n.as_str(), d.as_slice()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[(String, Vec<u8>)] {
        &self.entries
    }
}

impl From<Vec<(String, Vec<u8>)>> for ContainerEntries {
    fn from(pairs: Vec<(String, Vec<u8>)>) -> Self {
        let mut entries = Self::new();
        for (name, data) in pairs {
            entries.insert(name, data);
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_name_wins() {
        let mut entries = ContainerEntries::new();
        assert!(entries.insert("data.json", b"one".to_vec()));
        assert!(!entries.insert("data.json", b"two".to_vec()));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries.get("data.json"), Some(&b"one"[..]));
    }

    #[test]
    fn keeps_insertion_order() {
        let entries = ContainerEntries::from(vec![
            ("b".to_string(), vec![2]),
            ("a".to_string(), vec![1]),
        ]);
        assert_eq!(entries.names().collect::<Vec<_>>(), vec!["b", "a"]);
    }
}
