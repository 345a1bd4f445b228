//! Series and combination naming conventions.

use crate::LayerId;

/// `"<test>_layer<L>"` names layer `L` of a test as its own series.
pub const LAYER_SEPARATOR: &str = "_layer";

/// Joins the members of an average-combined run.
pub const COMBI_SEPARATOR: &str = "+";

/// Joins the members of a layer-combined run.
pub const LAYER_COMBI_SEPARATOR: &str = "_";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamingError {
    #[error("test name {0:?} is empty")]
    EmptyTestName(String),

    #[error("test name {name:?} ends in the reserved layer suffix ({separator}<n>)")]
    ReservedLayerSuffix {
        name: String,
        separator: &'static str,
    },
}

/// The TOTAL layer is addressed by the bare test name.
pub fn make_sheet_layer(test: &str, layer: LayerId) -> String {
    match layer {
        LayerId::Total => test.to_string(),
        LayerId::Layer(l) => format!("{test}{LAYER_SEPARATOR}{l}"),
    }
}

/// Inverse of [`make_sheet_layer`]. Names without a numeric layer suffix
/// resolve to the TOTAL layer.
pub fn parse_sheet_layer(name: &str) -> (String, LayerId) {
    if let Some((test, suffix)) = name.rsplit_once(LAYER_SEPARATOR)
        && !suffix.is_empty()
        && suffix.bytes().all(|b| b.is_ascii_digit())
        && let Ok(l) = suffix.parse::<u32>()
    {
        return (test.to_string(), LayerId::Layer(l));
    }
    (name.to_string(), LayerId::Total)
}

pub fn make_combi_name<S: AsRef<str>>(names: &[S]) -> String {
    join(names, COMBI_SEPARATOR)
}

pub fn parse_combi_name(name: &str) -> Vec<String> {
    name.split(COMBI_SEPARATOR).map(str::to_string).collect()
}

pub fn make_layer_combi_name<S: AsRef<str>>(names: &[S]) -> String {
    join(names, LAYER_COMBI_SEPARATOR)
}

pub fn parse_layer_combi_name(name: &str) -> Vec<String> {
    name.split(LAYER_COMBI_SEPARATOR)
        .map(str::to_string)
        .collect()
}

/// A test name must survive a sheet-layer round trip as the TOTAL series.
pub fn validate_test_name(name: &str) -> Result<(), NamingError> {
    if name.trim().is_empty() {
        return Err(NamingError::EmptyTestName(name.to_string()));
    }
    if parse_sheet_layer(name).1 != LayerId::Total {
        return Err(NamingError::ReservedLayerSuffix {
            name: name.to_string(),
            separator: LAYER_SEPARATOR,
        });
    }
    Ok(())
}

fn join<S: AsRef<str>>(names: &[S], sep: &str) -> String {
    names
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn total_is_never_suffixed() {
        assert_eq!(make_sheet_layer("A", LayerId::Total), "A");
        assert_eq!(make_sheet_layer("A", LayerId::Layer(1)), "A_layer1");
    }

    #[test]
    fn parse_sheet_layer_ignores_non_numeric_suffix() {
        assert_eq!(
            parse_sheet_layer("A_layerX"),
            ("A_layerX".to_string(), LayerId::Total)
        );
        assert_eq!(
            parse_sheet_layer("A_layer"),
            ("A_layer".to_string(), LayerId::Total)
        );
        assert_eq!(
            parse_sheet_layer("A_layer_b_layer0"),
            ("A_layer_b".to_string(), LayerId::Layer(0))
        );
    }

    #[test]
    fn combi_names_join_with_plus_and_underscore() {
        assert_eq!(make_combi_name(&["A", "B", "C"]), "A+B+C");
        assert_eq!(make_layer_combi_name(&["BL", "EL"]), "BL_EL");
        assert_eq!(parse_layer_combi_name("BL_EL"), vec!["BL", "EL"]);
    }

    #[test]
    fn validate_rejects_reserved_suffix() {
        assert!(validate_test_name("SCAL_2X").is_ok());
        assert!(matches!(
            validate_test_name("foo_layer3"),
            Err(NamingError::ReservedLayerSuffix { .. })
        ));
        assert!(matches!(
            validate_test_name(" "),
            Err(NamingError::EmptyTestName(_))
        ));
    }

    mod property_tests {
        use super::*;

        proptest! {
            #[test]
            fn sheet_layer_round_trip(test in "[A-Za-z0-9 +/-]{1,24}", layer in any::<u32>()) {
                prop_assume!(!test.contains(LAYER_SEPARATOR));
                let name = make_sheet_layer(&test, LayerId::Layer(layer));
                prop_assert_eq!(parse_sheet_layer(&name), (test, LayerId::Layer(layer)));
            }

            #[test]
            fn total_round_trip(test in "[A-Za-z0-9 _+-]{1,24}") {
                prop_assume!(validate_test_name(&test).is_ok());
                let name = make_sheet_layer(&test, LayerId::Total);
                prop_assert_eq!(parse_sheet_layer(&name), (test, LayerId::Total));
            }

            #[test]
            fn combi_name_round_trip(names in prop::collection::vec("[A-Za-z0-9_-]{1,12}", 1..6)) {
                let joined = make_combi_name(&names);
                prop_assert_eq!(parse_combi_name(&joined), names);
            }
        }
    }
}
