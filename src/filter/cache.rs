use std::collections::HashMap;

use crate::domain::ClassificationMap;

/// Last known AI decision per title. Lives for one settings generation.
#[derive(Debug, Default)]
pub struct ClassificationCache {
    decisions: HashMap<String, bool>,
}

impl ClassificationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, title: &str) -> Option<bool> {
        self.decisions.get(title).copied()
    }

    /// Overwrites existing entries: the most recent response wins.
    pub fn extend(&mut self, results: &ClassificationMap) {
        for (title, hide) in results {
            self.decisions.insert(title.clone(), *hide);
        }
    }

    pub fn clear(&mut self) {
        self.decisions.clear();
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_response_overwrites_earlier_decision() {
        let mut cache = ClassificationCache::new();
        cache.extend(&ClassificationMap::from([("a".to_string(), true)]));
        cache.extend(&ClassificationMap::from([
            ("a".to_string(), false),
            ("b".to_string(), true),
        ]));
        assert_eq!(cache.get("a"), Some(false));
        assert_eq!(cache.get("b"), Some(true));
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("b"), None);
    }
}
