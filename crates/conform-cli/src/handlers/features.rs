//! Features command handler

use crate::output::format_features;
use conform::FeatureSet;

/// Print the fixed feature set to stdout
pub fn execute_features() {
    println!("{}", format_features(&FeatureSet::conformance()));
}
