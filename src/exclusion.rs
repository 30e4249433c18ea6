//! Mutual-exclusion resolution for `nand` and `xor` peer relations.
//!
//! Relations are turned into per-field dependency sets ("if this field is
//! present, each of these sets must be absent"), closed transitively, and
//! folded into maximal combinations of mutually exclusive fields. Each
//! combination becomes one axis of the variant cross product.

use tracing::warn;

use crate::sets::{FieldSet, FieldSets};
use crate::types::ExclusionMode;

/// A declared peer relation.
#[derive(Debug, Clone, PartialEq)]
pub struct Exclusion {
    pub mode: ExclusionMode,
    pub peers: Vec<String>,
}

impl Exclusion {
    pub fn new<'a>(mode: ExclusionMode, peers: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            mode,
            peers: peers.into_iter().map(str::to_string).collect(),
        }
    }

    fn peer_set(&self) -> FieldSet {
        self.peers.iter().cloned().collect()
    }
}

/// Field name to the sets of fields that may not accompany it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dependencies {
    entries: Vec<(String, FieldSets)>,
}

impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dependencies declared by a single relation.
    ///
    /// `nand` lists each other peer on its own; `xor` lists all other peers
    /// as one joint set.
    pub fn from_relation(relation: &Exclusion) -> Self {
        let peers = relation.peer_set();
        let mut deps = Self::new();
        for peer in &peers {
            let others = peers.difference(&FieldSet::from_iter([peer.clone()]));
            let sets: FieldSets = match relation.mode {
                ExclusionMode::Nand => others
                    .into_iter()
                    .map(|other| FieldSet::from_iter([other]))
                    .collect(),
                ExclusionMode::Xor => FieldSets::from_iter([others]),
            };
            deps.entries.push((peer.clone(), sets));
        }
        deps
    }

    pub fn get(&self, field: &str) -> Option<&FieldSets> {
        self.entries
            .iter()
            .find(|(key, _)| key == field)
            .map(|(_, sets)| sets)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldSets)> {
        self.entries.iter().map(|(key, sets)| (key, sets))
    }

    /// Union of two dependency maps; shared keys union their sets.
    pub fn join(&self, other: &Self) -> Self {
        let mut joined = self.clone();
        for (key, sets) in &other.entries {
            match joined.entries.iter_mut().find(|(existing, _)| existing == key) {
                Some((_, existing)) => existing.extend(sets.iter().cloned()),
                None => joined.entries.push((key.clone(), sets.clone())),
            }
        }
        joined
    }

    /// Transitive closure: each set absorbs the dependencies of its members.
    pub fn closure(&self) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|(key, _)| (key.clone(), self.expand(key)))
            .collect();
        Self { entries }
    }

    /// Dependency sets of `key`, each grown by every field its members reach.
    ///
    /// The walk never passes through `key` and visits each field once, so
    /// cycles terminate and the cost stays polynomial in the field count.
    fn expand(&self, key: &str) -> FieldSets {
        let mut result = FieldSets::new();
        let Some(direct) = self.get(key) else {
            return result;
        };
        for set in direct {
            let mut grown = set.clone();
            let mut visited = FieldSet::from_iter([key.to_string()]);
            let mut pending: Vec<&String> = set.iter().rev().collect();
            while let Some(member) = pending.pop() {
                if !visited.insert(member.clone()) {
                    continue;
                }
                for reached in self.get(member).into_iter().flatten().flatten() {
                    if reached != key {
                        grown.insert(reached.clone());
                    }
                    if !visited.contains(reached) {
                        pending.push(reached);
                    }
                }
            }
            result.insert(grown);
        }
        result
    }
}

/// Maximal combinations of fields that exclude each other.
///
/// Each closed dependency `key -> set` yields the combination `{key} ∪ set`.
/// A combination contained in one already recorded is skipped; recorded
/// combinations contained in a new one are replaced by it.
pub fn not_allowed_combinations(closure: &Dependencies) -> FieldSets {
    let mut combinations = FieldSets::new();
    for (key, sets) in closure.iter() {
        for set in sets {
            let combination = FieldSet::from_iter([key.clone()]).union(set);
            if combinations.iter().any(|c| combination.is_subset(c)) {
                continue;
            }
            combinations.retain(|c| !c.is_subset(&combination));
            combinations.insert(combination);
        }
    }
    combinations
}

/// One way to satisfy an exclusion combination.
#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionOption {
    /// Peer that stays.
    pub keep: String,
    /// Whether the kept peer must be present.
    pub required: bool,
    /// Fields dropped from the variant.
    pub remove: FieldSet,
}

/// A combination of mutually exclusive fields and the options covering it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionAxis {
    pub combination: FieldSet,
    pub options: Vec<ExclusionOption>,
}

/// Resolve declared relations into independent axes.
///
/// Options of an axis follow the peers of the first relation declared
/// within its combination, last peer first. A kept peer is required when
/// any `xor` relation names it.
pub fn resolve_exclusions(relations: &[Exclusion]) -> Vec<ExclusionAxis> {
    for (i, left) in relations.iter().enumerate() {
        for right in &relations[i + 1..] {
            let shared = left.peer_set().intersection(&right.peer_set());
            if shared.len() > 1 {
                warn!(
                    shared = ?shared,
                    "relations share more than one peer; generated variants may not be exclusive"
                );
            }
        }
    }

    let deps = relations
        .iter()
        .map(Dependencies::from_relation)
        .fold(Dependencies::new(), |acc, deps| acc.join(&deps));
    let combinations = not_allowed_combinations(&deps.closure());

    combinations
        .into_iter()
        .filter_map(|combination| {
            let first = relations
                .iter()
                .find(|relation| relation.peers.iter().any(|p| combination.contains(p)))?;
            let options = first
                .peers
                .iter()
                .rev()
                .map(|peer| ExclusionOption {
                    keep: peer.clone(),
                    required: relations.iter().any(|relation| {
                        relation.mode == ExclusionMode::Xor && relation.peers.contains(peer)
                    }),
                    remove: combination.difference(&FieldSet::from_iter([peer.clone()])),
                })
                .collect();
            Some(ExclusionAxis {
                combination,
                options,
            })
        })
        .collect()
}
