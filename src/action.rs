//! Action set registry.
//!
//! Each resource kind maps its permission levels to the action tokens they
//! grant. Levels are kept in ascending order. A [`Cascade`] computes every
//! level's set as the union of its own actions and those of all lower levels,
//! and can fold in another kind's sets for containment (a folder level also
//! grants the matching dashboard level). The resulting [`ActionSets`] is
//! immutable: lookups never allocate or mutate.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::permission::Level;

/// A set of opaque action tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionSet(BTreeSet<String>);

impl ActionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, action: impl Into<String>) -> bool {
        self.0.insert(action.into())
    }

    pub fn contains(&self, action: &str) -> bool {
        self.0.contains(action)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_subset(&self, other: &ActionSet) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Add every action of `other` to this set.
    pub fn extend_from(&mut self, other: &ActionSet) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ActionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for ActionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        write!(f, "[{}]", joined.join(", "))
    }
}

/// The closed set of action tokens a configuration may reference.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary(BTreeSet<String>);

impl Vocabulary {
    pub fn contains(&self, action: &str) -> bool {
        self.0.contains(action)
    }
}

impl<S: Into<String>> FromIterator<S> for Vocabulary {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Permission level to action set map for one resource kind, lowest level first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSets {
    levels: Vec<(String, ActionSet)>,
}

impl ActionSets {
    /// Record the given sets exactly as supplied, without cascading.
    pub fn explicit<N, I>(levels: I) -> Result<Self>
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, ActionSet)>,
    {
        let mut out: Vec<(String, ActionSet)> = Vec::new();
        for (name, set) in levels {
            let name = name.into();
            if name.is_empty() {
                return Err(Error::Config("permission level name must not be empty".into()));
            }
            if out.iter().any(|(n, _)| *n == name) {
                return Err(Error::Config(format!("duplicate permission level {name:?}")));
            }
            out.push((name, set));
        }
        if out.is_empty() {
            return Err(Error::Config("at least one permission level is required".into()));
        }
        Ok(Self { levels: out })
    }

    /// Start a cascading definition.
    pub fn cascade() -> Cascade {
        Cascade::default()
    }

    /// Action set for `level`, if the level is configured.
    pub fn resolve(&self, level: &str) -> Option<&ActionSet> {
        self.levels
            .iter()
            .find(|(name, _)| name == level)
            .map(|(_, set)| set)
    }

    /// Level whose action set is exactly `actions`.
    pub fn map_actions(&self, actions: &ActionSet) -> Option<&str> {
        self.levels
            .iter()
            .find(|(_, set)| set == actions)
            .map(|(name, _)| name.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.levels.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ActionSet)> {
        self.levels.iter().map(|(name, set)| (name.as_str(), set))
    }

    pub fn lowest(&self) -> (&str, &ActionSet) {
        let (name, set) = &self.levels[0];
        (name, set)
    }

    pub fn highest(&self) -> (&str, &ActionSet) {
        let (name, set) = &self.levels[self.levels.len() - 1];
        (name, set)
    }

    /// Reject any action token outside `vocabulary`.
    pub fn check_vocabulary(&self, vocabulary: &Vocabulary) -> Result<()> {
        for (name, set) in &self.levels {
            if let Some(unknown) = set.iter().find(|a| !vocabulary.contains(a)) {
                return Err(Error::Config(format!(
                    "level {name:?} references unknown action {unknown:?}"
                )));
            }
        }
        Ok(())
    }

    /// Reject a map where some level does not include the level below it.
    pub fn check_monotonic(&self) -> Result<()> {
        for pair in self.levels.windows(2) {
            let (lower, lower_set) = &pair[0];
            let (higher, higher_set) = &pair[1];
            if !lower_set.is_subset(higher_set) {
                let missing: ActionSet = lower_set
                    .iter()
                    .filter(|a| !higher_set.contains(a))
                    .collect();
                return Err(Error::Config(format!(
                    "level {higher:?} does not include {lower:?}: missing {missing}"
                )));
            }
        }
        Ok(())
    }
}

/// Builder for cascading level maps.
#[derive(Debug, Default)]
pub struct Cascade {
    levels: Vec<(String, ActionSet)>,
    includes: Vec<ActionSets>,
    last_ordinal: Option<u8>,
    misordered: Option<String>,
}

impl Cascade {
    /// Append a level above all previously added ones.
    pub fn level<N, I, S>(mut self, name: N, actions: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.levels.push((name.into(), actions.into_iter().collect()));
        self
    }

    /// Append the standard level `L`. Typed levels must come in ascending
    /// ordinal order; `build` fails otherwise.
    pub fn typed<L, I, S>(mut self, actions: I) -> Self
    where
        L: Level,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ascending = self.last_ordinal.is_none_or(|last| L::ORDINAL > last);
        if !ascending && self.misordered.is_none() {
            self.misordered = Some(L::NAME.to_string());
        }
        self.last_ordinal = Some(L::ORDINAL);
        self.level(L::NAME, actions)
    }

    /// Fold each same-named level of `other` into this kind's levels.
    pub fn include(mut self, other: &ActionSets) -> Self {
        self.includes.push(other.clone());
        self
    }

    pub fn build(self) -> Result<ActionSets> {
        if let Some(name) = self.misordered {
            return Err(Error::Config(format!(
                "level {name:?} is not above the level before it"
            )));
        }
        let mut acc = ActionSet::new();
        let mut cascaded = Vec::with_capacity(self.levels.len());
        for (name, own) in self.levels {
            acc.extend_from(&own);
            let mut set = acc.clone();
            for other in &self.includes {
                let included = other.resolve(&name).ok_or_else(|| {
                    Error::Config(format!("included kind has no level {name:?}"))
                })?;
                set.extend_from(included);
            }
            cascaded.push((name, set));
        }
        ActionSets::explicit(cascaded)
    }
}
