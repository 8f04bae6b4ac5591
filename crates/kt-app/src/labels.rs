//! Label lists shown for the trace list, graph list and trace picker.

/// Ordered `(handle, label)` entries of a list widget.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView<I> {
    entries: Vec<(I, String)>,
}

impl<I> Default for ListView<I> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<I: Copy + PartialEq> ListView<I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every entry.
    pub fn rebuild(&mut self, entries: impl IntoIterator<Item = (I, String)>) {
        self.entries = entries.into_iter().collect();
    }

    /// Update one entry's label in place. Returns false when `id` is not listed.
    pub fn refresh(&mut self, id: I, label: &str) -> bool {
        match self.entries.iter_mut().find(|(entry, _)| *entry == id) {
            Some((_, text)) => {
                if text != label {
                    label.clone_into(text);
                }
                true
            }
            None => false,
        }
    }

    pub fn label(&self, id: I) -> Option<&str> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == id)
            .map(|(_, label)| label.as_str())
    }

    pub fn position(&self, id: I) -> Option<usize> {
        self.entries.iter().position(|(entry, _)| *entry == id)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|(_, label)| label.as_str()).collect()
    }

    pub fn ids(&self) -> Vec<I> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_touches_one_entry() {
        let mut view = ListView::new();
        view.rebuild([(1u32, "a".to_string()), (2, "b".to_string())]);
        assert!(view.refresh(2, "bee"));
        assert_eq!(view.labels(), vec!["a", "bee"]);
        assert!(!view.refresh(3, "c"));
        assert_eq!(view.position(2), Some(1));
    }
}
