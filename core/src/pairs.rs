use std::collections::{btree_map::Entry, BTreeMap};

use crate::error::{Error, Result};

/// An unordered pair of element labels.
///
/// Since (A, B) and (B, A) describe the same pair, the labels are stored in sorted order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementPair(String, String);

impl ElementPair {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        let (first, second) = (first.into(), second.into());
        if first <= second {
            Self(first, second)
        } else {
            Self(second, first)
        }
    }

    pub fn first(&self) -> &str {
        &self.0
    }

    pub fn second(&self) -> &str {
        &self.1
    }
}

impl std::fmt::Display for ElementPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.0, self.1)
    }
}

/// Results keyed by element pair and structure label.
#[derive(Clone, Debug, PartialEq)]
pub struct PairResults<T> {
    entries: BTreeMap<(ElementPair, String), T>,
}

impl<T> Default for PairResults<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> PairResults<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails if the pair already has a result for `structure`.
    pub fn insert(&mut self, pair: ElementPair, structure: impl Into<String>, value: T) -> Result<()> {
        match self.entries.entry((pair, structure.into())) {
            Entry::Occupied(entry) => {
                let (pair, structure) = entry.key();
                Err(Error::DuplicateEntry(
                    pair.0.clone(),
                    pair.1.clone(),
                    structure.clone(),
                ))
            }
            Entry::Vacant(entry) => {
                entry.insert(value);
                Ok(())
            }
        }
    }

    pub fn get(&self, pair: &ElementPair, structure: &str) -> Option<&T> {
        self.entries.get(&(pair.clone(), structure.to_owned()))
    }

    /// The (structure, result) entries of one pair, ordered by structure.
    pub fn for_pair<'a>(&'a self, pair: &'a ElementPair) -> impl Iterator<Item = (&'a str, &'a T)> {
        self.entries
            .iter()
            .filter(move |((key, _), _)| key == pair)
            .map(|((_, structure), value)| (structure.as_str(), value))
    }

    /// Every distinct pair, in order.
    pub fn pairs(&self) -> Vec<&ElementPair> {
        let mut pairs = self.entries.keys().map(|(pair, _)| pair).collect::<Vec<_>>();
        pairs.dedup();
        pairs
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ElementPair, &str, &T)> {
        self.entries
            .iter()
            .map(|((pair, structure), value)| (pair, structure.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Union of two result sets. Fails on the first (pair, structure) present in both.
    pub fn merge(mut self, other: Self) -> Result<Self> {
        for ((pair, structure), value) in other.entries {
            self.insert(pair, structure, value)?;
        }
        Ok(self)
    }
}
