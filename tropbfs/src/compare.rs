//! Cross-checking distance vectors produced by different storage formats.

use serde_json::{json, Value};

/// One vertex whose distances disagree. `None` marks a vertex missing from
/// the shorter vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    pub vertex: usize,
    pub left: Option<u32>,
    pub right: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub len: usize,
    pub mismatches: Vec<Mismatch>,
}

impl Comparison {
    pub fn same(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// Report with at most `limit` mismatches spelled out.
    pub fn to_json(&self, limit: usize) -> Value {
        let shown: Vec<Value> = self
            .mismatches
            .iter()
            .take(limit)
            .map(|m| json!({"vertex": m.vertex, "left": m.left, "right": m.right}))
            .collect();
        json!({
            "same": self.same(),
            "compared": self.len,
            "nmismatches": self.mismatches.len(),
            "mismatches": shown,
        })
    }
}

/// Compares two distance vectors element by element.
pub fn compare(left: &[u32], right: &[u32]) -> Comparison {
    let len = left.len().max(right.len());
    let mismatches = (0..len)
        .map(|v| (v, left.get(v).copied(), right.get(v).copied()))
        .filter(|(_, l, r)| l != r)
        .map(|(vertex, left, right)| Mismatch {
            vertex,
            left,
            right,
        })
        .collect();
    Comparison { len, mismatches }
}
