//! Domain logic for rdbench.
//!
//! This crate is intentionally I/O-free: it reshapes and combines
//! measurements, it never computes report metrics.

pub mod combine;
pub mod normalize;
pub mod select;

pub use combine::{CombinationPlan, average_combine, layer_combine};
pub use normalize::normalize;
pub use select::{
    AnchorResolver, FixedAnchorResolver, FixedLayerSelector, LayerSelector,
    SubstringAnchorResolver, TotalOnly, expand_anchor_pairs, resolve_anchor_matching,
};

use rdbench_types::{LayerId, LiteralError, NamingError, ResultSet};
use std::collections::BTreeSet;
use std::fmt::Debug;

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("ragged results in test {test:?}, sequence {sequence:?}: {detail}")]
    RaggedResults {
        test: String,
        sequence: String,
        detail: String,
    },

    #[error("incompatible result sets for {name:?}: {detail}")]
    IncompatibleResultSets { name: String, detail: String },

    #[error("test {test:?}, sequence {sequence:?}: quality point {key:?} is not a literal")]
    UnparsableQualityPoint {
        test: String,
        sequence: String,
        key: String,
        #[source]
        source: LiteralError,
    },

    #[error("combination {0:?} has no member tests")]
    EmptyCombination(String),

    #[error("combination {combination:?} references unknown test {test:?}")]
    UnknownTest { combination: String, test: String },

    #[error("test {0:?} is defined more than once")]
    DuplicateTest(String),

    #[error(transparent)]
    InvalidName(#[from] NamingError),
}

/// Check that every sequence carries the same quality points and every
/// quality point the same layers, TOTAL included.
pub fn validate_shape<K>(test: &str, results: &ResultSet<K>) -> Result<(), DomainError>
where
    K: Ord + Clone + Debug,
{
    let Some(first) = results.sequences.first() else {
        return Ok(());
    };
    let keys: BTreeSet<&K> = first.points.keys().collect();
    let layers: BTreeSet<LayerId> = first
        .points
        .values()
        .next()
        .map(|l| l.keys().copied().collect())
        .unwrap_or_default();

    for seq in &results.sequences {
        let ragged = |detail: String| DomainError::RaggedResults {
            test: test.to_string(),
            sequence: seq.name.clone(),
            detail,
        };

        if seq.points.is_empty() {
            return Err(ragged("no quality points".to_string()));
        }

        let seq_keys: BTreeSet<&K> = seq.points.keys().collect();
        if seq_keys != keys {
            return Err(ragged(format!(
                "quality points {seq_keys:?} differ from {keys:?}"
            )));
        }

        for (key, point_layers) in &seq.points {
            let point: BTreeSet<LayerId> = point_layers.keys().copied().collect();
            if point != layers {
                return Err(ragged(format!(
                    "quality point {key:?} has layers {point:?}, expected {layers:?}"
                )));
            }
            if !point.contains(&LayerId::Total) {
                return Err(ragged(format!(
                    "quality point {key:?} has no total layer"
                )));
            }
        }
    }

    Ok(())
}
