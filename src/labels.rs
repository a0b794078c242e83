//! Label sets: which streams make up each series of a query result.
//!
//! Older callers identify streams with a plain list of ids. Every query
//! operation accepts either shape as [`Labels`] and immediately normalizes it
//! into a [`LabelSet`], which is the only shape the encoder ever sees.
//!
//! # Example
//!
//! ```
//! use nntsc_client::{LabelSet, Labels};
//!
//! let labels: LabelSet = Labels::from(vec![5, 9]).normalize();
//! assert_eq!(labels.get("5"), Some(&[5][..]));
//! assert_eq!(labels.get("9"), Some(&[9][..]));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Mapping from a label to the stream ids aggregated under it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet(BTreeMap<String, Vec<i64>>);

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// One label per stream, named after the stream id.
    pub fn from_streams(streams: &[i64]) -> Self {
        streams
            .iter()
            .map(|&id| (id.to_string(), vec![id]))
            .collect()
    }

    /// Add (or replace) a label.
    pub fn insert(&mut self, label: impl Into<String>, streams: Vec<i64>) -> Option<Vec<i64>> {
        self.0.insert(label.into(), streams)
    }

    pub fn get(&self, label: &str) -> Option<&[i64]> {
        self.0.get(label).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[i64])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<i64>> {
        self.0
    }
}

impl FromIterator<(String, Vec<i64>)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (String, Vec<i64>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, Vec<i64>>> for LabelSet {
    fn from(map: BTreeMap<String, Vec<i64>>) -> Self {
        Self(map)
    }
}

/// Label input as callers supply it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Labels {
    /// Legacy form: a plain list of stream ids.
    Streams(Vec<i64>),
    /// Explicit label set.
    Set(LabelSet),
}

impl Labels {
    /// Collapse either form into a [`LabelSet`].
    pub fn normalize(self) -> LabelSet {
        match self {
            Labels::Streams(streams) => LabelSet::from_streams(&streams),
            Labels::Set(set) => set,
        }
    }
}

impl From<Vec<i64>> for Labels {
    fn from(streams: Vec<i64>) -> Self {
        Labels::Streams(streams)
    }
}

impl From<&[i64]> for Labels {
    fn from(streams: &[i64]) -> Self {
        Labels::Streams(streams.to_vec())
    }
}

impl From<LabelSet> for Labels {
    fn from(set: LabelSet) -> Self {
        Labels::Set(set)
    }
}

impl From<BTreeMap<String, Vec<i64>>> for Labels {
    fn from(map: BTreeMap<String, Vec<i64>>) -> Self {
        Labels::Set(LabelSet::from(map))
    }
}

impl From<Labels> for LabelSet {
    fn from(labels: Labels) -> Self {
        labels.normalize()
    }
}
