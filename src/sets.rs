//! Set algebra over insertion-ordered sets.
//!
//! `OrderedSet` keeps elements in first-insertion order so that generated
//! variants come out in declaration order, while equality ignores order.
//! Elements may themselves be sets: membership and equality recurse through
//! `PartialEq`, so `OrderedSet<OrderedSet<String>>` compares structurally.

use std::fmt;

/// A set of field names.
pub type FieldSet = OrderedSet<String>;

/// A set of field-name sets.
pub type FieldSets = OrderedSet<FieldSet>;

/// Insertion-ordered set with order-insensitive equality.
#[derive(Clone)]
pub struct OrderedSet<T> {
    items: Vec<T>,
}

impl<T> OrderedSet<T> {
    /// Create an empty set.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    /// Elements in insertion order.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T: PartialEq> OrderedSet<T> {
    /// Membership test. Set-valued elements are compared structurally.
    pub fn contains(&self, item: &T) -> bool {
        self.items.iter().any(|existing| existing == item)
    }

    /// Insert `item` unless an equal element is already present.
    ///
    /// Returns true when the set grew.
    pub fn insert(&mut self, item: T) -> bool {
        if self.contains(&item) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Remove `item` if present. Returns true when the set shrank.
    pub fn remove(&mut self, item: &T) -> bool {
        let before = self.items.len();
        self.items.retain(|existing| existing != item);
        self.items.len() != before
    }

    /// Keep only the elements matching `keep`.
    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.items.retain(keep);
    }

    /// Every element of `self` is in `other`.
    pub fn is_subset(&self, other: &Self) -> bool {
        self.items.iter().all(|item| other.contains(item))
    }

    /// Every element of `other` is in `self`.
    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }
}

impl<T: PartialEq + Clone> OrderedSet<T> {
    /// Pure insert: returns a copy of the set with `item` added.
    pub fn with(&self, item: T) -> Self {
        let mut next = self.clone();
        next.insert(item);
        next
    }

    /// Elements of either set, `self`'s first.
    pub fn union(&self, other: &Self) -> Self {
        let mut result = self.clone();
        for item in &other.items {
            result.insert(item.clone());
        }
        result
    }

    /// Elements of `self` not in `other`.
    pub fn difference(&self, other: &Self) -> Self {
        self.items
            .iter()
            .filter(|item| !other.contains(item))
            .cloned()
            .collect()
    }

    /// Elements present in both sets, in `self`'s order.
    pub fn intersection(&self, other: &Self) -> Self {
        self.items
            .iter()
            .filter(|item| other.contains(item))
            .cloned()
            .collect()
    }
}

impl<T: PartialEq> PartialEq for OrderedSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items.len() == other.items.len() && self.is_subset(other)
    }
}

impl<T: Eq> Eq for OrderedSet<T> {}

impl<T> Default for OrderedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for OrderedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.items.iter()).finish()
    }
}

impl<T: PartialEq> FromIterator<T> for OrderedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<T: PartialEq> Extend<T> for OrderedSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}

impl<T> IntoIterator for OrderedSet<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a OrderedSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Build a field set from string slices.
pub fn field_set<'a>(names: impl IntoIterator<Item = &'a str>) -> FieldSet {
    names.into_iter().map(str::to_string).collect()
}
