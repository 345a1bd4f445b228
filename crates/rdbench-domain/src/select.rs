//! Series selection: which layers of a test become summary series, and
//! which anchors a test is compared against.

use rdbench_types::{AnchorListDefinition, AnchorMatching, AnchorPair, LayerId, SeriesKey};
use std::collections::{BTreeMap, BTreeSet};

/// Chooses the layers of a test that are exposed as their own series.
pub trait LayerSelector {
    fn select(&self, test: &str) -> Vec<LayerId>;
}

/// Every test contributes only its TOTAL series.
#[derive(Debug, Default, Clone, Copy)]
pub struct TotalOnly;

impl LayerSelector for TotalOnly {
    fn select(&self, _test: &str) -> Vec<LayerId> {
        vec![LayerId::Total]
    }
}

/// Explicit per-test layer lists; unlisted tests fall back to TOTAL.
#[derive(Debug, Default, Clone)]
pub struct FixedLayerSelector {
    layers: BTreeMap<String, Vec<LayerId>>,
}

impl FixedLayerSelector {
    pub fn new(layers: BTreeMap<String, Vec<LayerId>>) -> Self {
        Self { layers }
    }
}

impl From<BTreeMap<String, BTreeSet<LayerId>>> for FixedLayerSelector {
    fn from(layers: BTreeMap<String, BTreeSet<LayerId>>) -> Self {
        Self::new(
            layers
                .into_iter()
                .map(|(test, set)| (test, set.into_iter().collect()))
                .collect(),
        )
    }
}

impl LayerSelector for FixedLayerSelector {
    fn select(&self, test: &str) -> Vec<LayerId> {
        self.layers
            .get(test)
            .cloned()
            .unwrap_or_else(|| vec![LayerId::Total])
    }
}

/// Resolves the anchors of a test; `None` requests an absolute column.
pub trait AnchorResolver {
    fn resolve(&self, test: &str) -> Vec<Option<SeriesKey>>;
}

#[derive(Debug, Default, Clone)]
pub struct FixedAnchorResolver {
    anchors: BTreeMap<String, Vec<Option<SeriesKey>>>,
}

impl FixedAnchorResolver {
    pub fn new(anchors: BTreeMap<String, Vec<Option<SeriesKey>>>) -> Self {
        Self { anchors }
    }
}

impl AnchorResolver for FixedAnchorResolver {
    fn resolve(&self, test: &str) -> Vec<Option<SeriesKey>> {
        self.anchors.get(test).cloned().unwrap_or_default()
    }
}

/// Matches anchors by name: a candidate anchors `test` when it contains
/// every selected separator-split token of the test name.
#[derive(Debug, Clone)]
pub struct SubstringAnchorResolver {
    candidates: Vec<String>,
    separator: String,
    tokens: Vec<usize>,
    include_absolute: bool,
    anchor_layers: Vec<LayerId>,
}

impl SubstringAnchorResolver {
    pub fn new(candidates: Vec<String>, separator: impl Into<String>, tokens: Vec<usize>) -> Self {
        Self {
            candidates,
            separator: separator.into(),
            tokens,
            include_absolute: false,
            anchor_layers: vec![LayerId::Total],
        }
    }

    pub fn with_absolute(mut self, include: bool) -> Self {
        self.include_absolute = include;
        self
    }

    pub fn with_anchor_layers(mut self, layers: Vec<LayerId>) -> Self {
        if !layers.is_empty() {
            self.anchor_layers = layers;
        }
        self
    }

    fn selected_tokens<'a>(&self, test: &'a str) -> Option<Vec<&'a str>> {
        let parts: Vec<&str> = test.split(self.separator.as_str()).collect();
        if self.tokens.is_empty() {
            return Some(parts);
        }
        self.tokens.iter().map(|i| parts.get(*i).copied()).collect()
    }
}

impl From<&AnchorMatching> for SubstringAnchorResolver {
    fn from(m: &AnchorMatching) -> Self {
        SubstringAnchorResolver::new(m.candidates.clone(), m.separator.clone(), m.tokens.clone())
            .with_absolute(m.include_absolute)
            .with_anchor_layers(m.anchor_layers.clone())
    }
}

impl AnchorResolver for SubstringAnchorResolver {
    fn resolve(&self, test: &str) -> Vec<Option<SeriesKey>> {
        let mut out = Vec::new();
        if self.include_absolute {
            out.push(None);
        }

        // A token index past the end of the name matches nothing.
        let Some(tokens) = self.selected_tokens(test) else {
            return out;
        };

        for candidate in &self.candidates {
            if candidate == test || !tokens.iter().all(|t| candidate.contains(t)) {
                continue;
            }
            for layer in &self.anchor_layers {
                out.push(Some(SeriesKey::new(candidate.clone(), *layer)));
            }
        }
        out
    }
}

/// Turn a resolver into the explicit pair list an anchor list carries.
/// Tests that resolve to no anchors contribute no columns.
pub fn expand_anchor_pairs(tests: &[String], resolver: &dyn AnchorResolver) -> Vec<AnchorPair> {
    let mut pairs = Vec::new();
    for test in tests {
        let key = SeriesKey::parse(test);
        for anchor in resolver.resolve(test) {
            pairs.push(AnchorPair {
                test: key.clone(),
                anchor,
            });
        }
    }
    pairs
}

/// Expand every `matching` block of an anchor list into explicit pairs
/// (appended after the pairs given literally).
pub fn resolve_anchor_matching(def: &mut AnchorListDefinition) {
    for sub in def.subs_mut() {
        if let Some(matching) = sub.matching.take() {
            let resolver = SubstringAnchorResolver::from(&matching);
            sub.pairs
                .extend(expand_anchor_pairs(&matching.tests, &resolver));
        }
    }
}
