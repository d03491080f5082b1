//! Replaceable containers.
//!
//! Every list or map in a Scheduler document carries a `replace` flag next to
//! its payload. When set, the payload replaces whatever an ancestor document
//! declared; otherwise the two are combined.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::jobs::{Periodic, Postsubmit, Presubmit};
use crate::plugins::ExternalPlugin;
use crate::policy::ContextPolicy;

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}

/// A list payload plus a replace flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize",
    deserialize = "T: Deserialize<'de>"
))]
pub struct ReplaceableSlice<T> {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<T>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub replace: bool,
}

impl<T> Default for ReplaceableSlice<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            replace: false,
        }
    }
}

impl<T> ReplaceableSlice<T> {
    /// A non-replacing container holding `entries`.
    pub fn of(entries: Vec<T>) -> Self {
        Self {
            entries,
            replace: false,
        }
    }

    /// A container that replaces anything inherited.
    pub fn replacing(entries: Vec<T>) -> Self {
        Self {
            entries,
            replace: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A keyed payload plus a replace flag. Keys are kept sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "V: Serialize",
    deserialize = "V: Deserialize<'de>"
))]
pub struct ReplaceableMap<V> {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub entries: BTreeMap<String, V>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub replace: bool,
}

impl<V> Default for ReplaceableMap<V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            replace: false,
        }
    }
}

impl<V> ReplaceableMap<V> {
    pub fn of(entries: BTreeMap<String, V>) -> Self {
        Self {
            entries,
            replace: false,
        }
    }

    pub fn replacing(entries: BTreeMap<String, V>) -> Self {
        Self {
            entries,
            replace: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub type ReplaceableSliceOfStrings = ReplaceableSlice<String>;
pub type ReplaceableSliceOfExternalPlugins = ReplaceableSlice<ExternalPlugin>;
pub type ReplaceableMapOfStringString = ReplaceableMap<String>;
pub type ReplaceableMapOfStringContextPolicy = ReplaceableMap<ContextPolicy>;

/// Presubmit jobs; merged by job name.
pub type Presubmits = ReplaceableSlice<Presubmit>;

/// Postsubmit jobs; merged by job name.
pub type Postsubmits = ReplaceableSlice<Postsubmit>;

/// Periodic jobs; merged by job name.
pub type Periodics = ReplaceableSlice<Periodic>;

/// Convenience for building string lists in tests and reverse projection.
pub fn strings<I, S>(items: I) -> ReplaceableSliceOfStrings
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ReplaceableSlice::of(items.into_iter().map(Into::into).collect())
}
