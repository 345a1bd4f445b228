//! Quality-point normalization.

use crate::{DomainError, validate_shape};
use rdbench_types::{
    Accumulation, NormalizedRun, QualityLabels, QualityValue, ResultSet, SequenceResults, TestRun,
};
use std::collections::BTreeMap;

/// Re-key every sequence of `run` by canonical ascending index.
///
/// Keys are ordered by their literal value (`7 < 22 < 100`, numbers before
/// tuples); ties keep input order. The original key of each index is kept
/// in the returned labels. Fails without partial output on a ragged result
/// set or a key that is not a literal.
pub fn normalize(run: TestRun) -> Result<NormalizedRun, DomainError> {
    validate_shape(&run.name, &run.results)?;

    let mut labels = QualityLabels::new();
    let mut sequences = Vec::with_capacity(run.results.sequences.len());

    for seq in run.results.sequences {
        let mut keyed = Vec::with_capacity(seq.points.len());
        for (key, layers) in seq.points {
            let value = QualityValue::parse(&key).map_err(|source| {
                DomainError::UnparsableQualityPoint {
                    test: run.name.clone(),
                    sequence: seq.name.clone(),
                    key: key.clone(),
                    source,
                }
            })?;
            keyed.push((value, key, layers));
        }
        keyed.sort_by(|a, b| a.0.cmp(&b.0));

        let mut points = BTreeMap::new();
        let mut seq_labels = BTreeMap::new();
        for (index, (_, key, layers)) in keyed.into_iter().enumerate() {
            points.insert(index, layers);
            seq_labels.insert(index, key);
        }

        labels.insert(seq.name.clone(), seq_labels);
        sequences.push(SequenceResults {
            name: seq.name,
            points,
        });
    }

    Ok(NormalizedRun {
        name: run.name,
        scale: run.scale,
        input_names: run.input_names,
        results: ResultSet { sequences },
        labels,
        accumulation: Accumulation::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use rdbench_types::LayerId;

    #[test]
    fn sorts_numerically_and_records_labels() {
        let run = raw_run(
            "A",
            &["s1"],
            &[("32", 3.0), ("7", 1.0), ("22", 2.0), ("100", 4.0)],
        );
        let n = normalize(run).unwrap();

        let labels: Vec<&str> = n.labels["s1"].values().map(String::as_str).collect();
        assert_eq!(labels, vec!["7", "22", "32", "100"]);

        let bits: Vec<f64> = (0..4)
            .map(|i| n.results.get("s1", &i, LayerId::Total).unwrap().bits)
            .collect();
        assert_eq!(bits, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(n.header_label(1), Some("22"));
    }

    #[test]
    fn tuple_keys_sort_lexicographically() {
        let run = raw_run("S", &["s1"], &[("(27, 30)", 2.0), ("(22, 25)", 1.0)]);
        let n = normalize(run).unwrap();
        assert_eq!(n.labels["s1"][&0], "(22, 25)");
        assert_eq!(n.labels["s1"][&1], "(27, 30)");
    }

    #[test]
    fn unparsable_key_is_fatal() {
        let run = raw_run("A", &["s1"], &[("22", 1.0), ("high", 2.0)]);
        let err = normalize(run).unwrap_err();
        assert!(matches!(
            err,
            DomainError::UnparsableQualityPoint { ref key, .. } if key == "high"
        ));
    }

    #[test]
    fn ragged_input_is_fatal() {
        let mut run = raw_run("A", &["s1", "s2"], &[("22", 1.0), ("27", 2.0)]);
        run.results.sequences[0].points.remove("22");
        assert!(matches!(
            normalize(run),
            Err(DomainError::RaggedResults { .. })
        ));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn normalizing_canonical_keys_is_identity(n in 1usize..12, seqs in 1usize..4) {
                let keys: Vec<String> = (0..n).map(|i| i.to_string()).collect();
                let points: Vec<(&str, f64)> = keys
                    .iter()
                    .enumerate()
                    .map(|(i, k)| (k.as_str(), 100.0 * (i + 1) as f64))
                    .collect();
                let names: Vec<String> = (0..seqs).map(|i| format!("seq{i}")).collect();
                let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();

                let run = raw_run("A", &name_refs, &points);
                let out = normalize(run.clone()).unwrap();

                for seq in &run.results.sequences {
                    for i in 0..n {
                        prop_assert_eq!(&out.labels[&seq.name][&i], &i.to_string());
                        prop_assert_eq!(
                            out.results.get(&seq.name, &i, LayerId::Total),
                            run.results.get(&seq.name, &i.to_string(), LayerId::Total)
                        );
                    }
                }
            }

            #[test]
            fn labels_are_ascending(values in prop::collection::btree_set(-50i64..100, 1..10)) {
                let keys: Vec<String> = values.iter().rev().map(|v| v.to_string()).collect();
                let points: Vec<(&str, f64)> = keys.iter().map(|k| (k.as_str(), 1.0)).collect();
                let out = normalize(raw_run("A", &["s"], &points)).unwrap();

                let parsed: Vec<i64> = out.labels["s"].values().map(|l| l.parse().unwrap()).collect();
                let mut sorted = parsed.clone();
                sorted.sort();
                prop_assert_eq!(parsed, sorted);
            }
        }
    }
}
