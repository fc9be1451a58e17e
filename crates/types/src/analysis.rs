use crate::payload::DataPayload;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// What a template needs from a payload, plus a payload that satisfies it.
///
/// Sets are ordered so that two analyses of the same content compare and
/// serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Scalar markers outside any loop body.
    pub variables: BTreeSet<String>,
    /// Names of all loop open markers.
    pub loops: BTreeSet<String>,
    /// Field markers found inside each well-formed loop body.
    pub loop_fields: BTreeMap<String, BTreeSet<String>>,
    pub sample_data: DataPayload,
}
