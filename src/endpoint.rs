//! Deterministic anchor identifiers for node inputs and outputs.
//!
//! Anchors are derived purely from a node key and an arity, so the importer and the live
//! diagram always compute the same identifiers and connections can be resolved by id.

use crate::library::NodeLibraryItem;
use serde::{Deserialize, Serialize};

/// Which side of a node an anchor sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorDirection {
    Input,
    Output,
}

impl AnchorDirection {
    pub fn prefix(&self) -> &'static str {
        match self {
            AnchorDirection::Input => "ip",
            AnchorDirection::Output => "op",
        }
    }

    /// Reads the direction back from an anchor id's prefix.
    pub fn of_anchor(anchor: &str) -> Option<Self> {
        match anchor.split('_').next() {
            Some("ip") => Some(AnchorDirection::Input),
            Some("op") => Some(AnchorDirection::Output),
            _ => None,
        }
    }
}

/// Produces `arity` anchor ids for `key` on the given side.
///
/// ```
/// use stackgraph::endpoint::{anchor_ids, AnchorDirection};
///
/// assert_eq!(anchor_ids("web", AnchorDirection::Input, 1), vec!["ip_web"]);
/// assert_eq!(
///     anchor_ids("web", AnchorDirection::Output, 2),
///     vec!["op_true_web", "op_false_web"]
/// );
/// assert_eq!(anchor_ids("web", AnchorDirection::Input, 3)[2], "ip_2_web");
/// ```
pub fn anchor_ids(key: &str, direction: AnchorDirection, arity: u32) -> Vec<String> {
    let dir = direction.prefix();
    match arity {
        0 => Vec::new(),
        1 => vec![format!("{dir}_{key}")],
        2 => [true, false]
            .iter()
            .map(|tag| format!("{dir}_{tag}_{key}"))
            .collect(),
        n => (0..n).map(|index| format!("{dir}_{index}_{key}")).collect(),
    }
}

/// Resolves an anchor id back to the key of the node that owns it.
pub fn node_key_from_anchor(anchor: &str) -> &str {
    match anchor.rfind('_') {
        Some(index) => &anchor[index + 1..],
        None => anchor,
    }
}

/// The full set of anchors of one node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchors {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl Anchors {
    pub fn for_node(key: &str, item: &NodeLibraryItem) -> Self {
        Self {
            inputs: anchor_ids(key, AnchorDirection::Input, item.no_inputs),
            outputs: anchor_ids(key, AnchorDirection::Output, item.no_outputs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_arity_is_empty() {
        assert!(anchor_ids("db", AnchorDirection::Input, 0).is_empty());
    }

    #[test]
    fn test_indexed_anchors_for_large_arity() {
        let ids = anchor_ids("k", AnchorDirection::Output, 4);
        assert_eq!(ids, vec!["op_0_k", "op_1_k", "op_2_k", "op_3_k"]);
    }

    #[test]
    fn test_node_key_resolution() {
        assert_eq!(node_key_from_anchor("ip_true_service-1"), "service-1");
        assert_eq!(node_key_from_anchor("op_service-1"), "service-1");
        assert_eq!(node_key_from_anchor("bare"), "bare");
    }

    #[test]
    fn test_direction_from_anchor() {
        assert_eq!(
            AnchorDirection::of_anchor("ip_0_a"),
            Some(AnchorDirection::Input)
        );
        assert_eq!(
            AnchorDirection::of_anchor("op_a"),
            Some(AnchorDirection::Output)
        );
        assert_eq!(AnchorDirection::of_anchor("xx_a"), None);
    }
}
