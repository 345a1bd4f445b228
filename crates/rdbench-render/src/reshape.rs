//! Reshaping laid-out references into summary series.

use crate::{MetricRefs, ReferenceMap, TestRefs};
use rdbench_domain::LayerSelector;
use rdbench_types::{LayerId, SeriesKey};
use std::collections::BTreeMap;
use tracing::debug;

/// Series → sequence → references.
pub type Flattened = BTreeMap<SeriesKey, BTreeMap<String, MetricRefs>>;

/// Sequence → series → references.
pub type BySequence = BTreeMap<String, BTreeMap<SeriesKey, MetricRefs>>;

/// One series per selected (test, layer).
///
/// A test with at most two layer entries (TOTAL plus a single layer) is
/// treated as unlayered and exposes only its TOTAL data under the bare
/// test name. Selected layers the test does not have are skipped.
pub fn flatten(refs: &ReferenceMap, selector: &dyn LayerSelector) -> Flattened {
    let mut out = Flattened::new();
    for (test, test_refs) in refs {
        let available = test_refs.layer_ids();
        if available.len() <= 2 {
            insert_series(&mut out, SeriesKey::total(test.as_str()), test_refs, LayerId::Total);
            continue;
        }
        for layer in selector.select(test) {
            if !available.contains(&layer) {
                debug!(test = %test, %layer, "layer not present, series skipped");
                continue;
            }
            insert_series(&mut out, SeriesKey::new(test.as_str(), layer), test_refs, layer);
        }
    }
    out
}

fn insert_series(out: &mut Flattened, key: SeriesKey, test_refs: &TestRefs, layer: LayerId) {
    let per_sequence: BTreeMap<String, MetricRefs> = test_refs
        .sequences
        .iter()
        .filter_map(|s| s.layers.get(&layer).map(|r| (s.name.clone(), r.clone())))
        .collect();
    if !per_sequence.is_empty() {
        out.insert(key, per_sequence);
    }
}

/// Swap the two outer key levels; every `(a, b, v)` triple is preserved.
pub fn flip<A, B, V>(map: &BTreeMap<A, BTreeMap<B, V>>) -> BTreeMap<B, BTreeMap<A, V>>
where
    A: Ord + Clone,
    B: Ord + Clone,
    V: Clone,
{
    let mut out: BTreeMap<B, BTreeMap<A, V>> = BTreeMap::new();
    for (a, inner) in map {
        for (b, v) in inner {
            out.entry(b.clone())
                .or_default()
                .insert(a.clone(), v.clone());
        }
    }
    out
}

/// Sequences in `order` that have data, then the rest in key order.
pub fn sequence_order<'a, V>(order: &'a [String], by_sequence: &'a BTreeMap<String, V>) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::new();
    for name in order.iter().chain(by_sequence.keys()) {
        if by_sequence.contains_key(name) && !out.contains(&name.as_str()) {
            out.push(name.as_str());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{layered, normalized};
    use crate::layout::layout_test_sheet;
    use proptest::prelude::*;
    use rdbench_domain::{FixedLayerSelector, TotalOnly};
    use rdbench_types::NormalizedRun;
    use rdbench_workbook::Worksheet;

    fn laid_out(runs: &[NormalizedRun]) -> ReferenceMap {
        runs.iter()
            .map(|run| {
                let mut sheet = Worksheet::new(run.name.as_str());
                (run.name.clone(), layout_test_sheet(&mut sheet, run, &[]))
            })
            .collect()
    }

    fn names(flat: &Flattened) -> Vec<String> {
        flat.keys().map(SeriesKey::series_name).collect()
    }

    #[test]
    fn unlayered_tests_flatten_to_bare_names() {
        let refs = laid_out(&[
            normalized("A", &["s1"], &[1.0, 2.0], 40.0),
            normalized("B", &["s1"], &[1.0, 2.0], 40.0),
        ]);
        let flat = flatten(&refs, &TotalOnly);
        assert_eq!(names(&flat), vec!["A", "B"]);
        let seqs: Vec<&String> = flat[&SeriesKey::total("A")].keys().collect();
        assert_eq!(seqs, vec!["Average", "s1"]);
    }

    #[test]
    fn selected_layers_become_suffixed_series() {
        let refs = laid_out(&[layered("L", &["s1"], 2)]);
        let selector = FixedLayerSelector::new(BTreeMap::from([(
            "L".to_string(),
            vec![LayerId::Total, LayerId::Layer(1), LayerId::Layer(7)],
        )]));
        let flat = flatten(&refs, &selector);
        assert_eq!(names(&flat), vec!["L", "L_layer1"]);

        let l1 = &flat[&SeriesKey::new("L", LayerId::Layer(1))]["s1"];
        // s1 block starts at row 7 (Average occupies 4..6); layer 1 is row 9.
        assert_eq!(l1.bits[0].a1(), "C9");
    }

    #[test]
    fn single_layer_runs_collapse_to_total() {
        let refs = laid_out(&[layered("L", &["s1"], 1)]);
        let selector = FixedLayerSelector::new(BTreeMap::from([(
            "L".to_string(),
            vec![LayerId::Layer(0)],
        )]));
        let flat = flatten(&refs, &selector);
        assert_eq!(names(&flat), vec!["L"]);
        assert_eq!(flat[&SeriesKey::total("L")]["s1"].bits[0].a1(), "C6");
    }

    #[test]
    fn flip_groups_by_sequence() {
        let refs = laid_out(&[
            normalized("A", &["s1", "s2"], &[1.0], 40.0),
            normalized("B", &["s2"], &[1.0], 40.0),
        ]);
        let by_seq = flip(&flatten(&refs, &TotalOnly));
        assert_eq!(by_seq["s1"].len(), 1);
        assert_eq!(by_seq["s2"].len(), 2);
        assert_eq!(by_seq["Average"].len(), 2);
    }

    #[test]
    fn sequence_order_prefers_caller_order() {
        let by_seq: BTreeMap<String, ()> = ["Average", "a", "b", "c"]
            .into_iter()
            .map(|s| (s.to_string(), ()))
            .collect();
        let order = vec!["Average".to_string(), "c".to_string(), "zzz".to_string()];
        assert_eq!(sequence_order(&order, &by_seq), vec!["Average", "c", "a", "b"]);
    }

    fn nested() -> impl Strategy<Value = BTreeMap<u8, BTreeMap<u8, u16>>> {
        prop::collection::btree_map(
            any::<u8>(),
            prop::collection::btree_map(any::<u8>(), any::<u16>(), 1..6),
            0..6,
        )
    }

    proptest! {
        #[test]
        fn flip_preserves_triples(map in nested()) {
            let flipped = flip(&map);
            let before: usize = map.values().map(BTreeMap::len).sum();
            let after: usize = flipped.values().map(BTreeMap::len).sum();
            prop_assert_eq!(before, after);
            for (a, inner) in &map {
                for (b, v) in inner {
                    prop_assert_eq!(flipped[b].get(a), Some(v));
                }
            }
            prop_assert_eq!(flip(&flipped), map);
        }
    }
}
