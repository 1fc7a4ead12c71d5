//! Decision procedure selecting the segment that applies to a (reconstructed) input.
//!
//! The procedure is a binary tree of interval tests over fixed-point breakpoints. For segments
//! `0..m` with lower breakpoints `bp_i` it reads
//!
//! ```text
//! if sum < bp_0                 -> 0
//! else if bp_0 < sum <= up_0    -> 0
//! else if bp_1 < sum <= up_1    -> 1
//! ...
//! else if sum > bp_{m-1}        -> m - 1
//! else                          -> 0
//! ```
//!
//! The root is the only test using `<`, all lower bounds are strict `>`. A value equal to
//! `bp_0` therefore passes no test and ends in the final fallback leaf, while a value equal to
//! an inner breakpoint `bp_i` belongs to segment `i - 1`.
//!
//! Segment 0 gets its own interval test after the root, so its interior `(bp_0, up_0]` is
//! selected explicitly. Together with the fallback leaf this makes the tree `m + 1` tests deep
//! instead of the `m - 1` of a chain that starts at segment 1.
//!
//! Nodes live in a flat arena and refer to their children by [`NodeId`]. Children are always
//! stored before their parent, so the tree can be walked, measured and dropped without
//! recursion, and it serializes as a flat list.
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::errors::{ApproxError, ConfigError, OverflowError};
use crate::segment::FixedSegment;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Test {
    /// `sum < bp`
    Below(i128),
    /// `lower < sum <= upper`
    Within { lower: i128, upper: i128 },
    /// `sum > bp`
    Above(i128),
}

impl Test {
    pub fn holds(&self, sum: i128) -> bool {
        match *self {
            Test::Below(bp) => sum < bp,
            Test::Within { lower, upper } => lower < sum && sum <= upper,
            Test::Above(bp) => sum > bp,
        }
    }
}

/// Position of a node in the arena of a [`DecisionProcedure`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionNode {
    /// Selects the product of the segment with this index.
    Leaf(usize),
    Branch {
        test: Test,
        then: NodeId,
        otherwise: NodeId,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProcedureRepr")]
pub struct DecisionProcedure {
    nodes: Vec<DecisionNode>,
    root: NodeId,
    segment_count: usize,
    /// Lowest and highest breakpoint, used to detect saturation.
    domain: (i128, i128),
    correction: i128,
}

/// Unchecked form of a [`DecisionProcedure`] as it is read from a serialized representation.
#[derive(Deserialize)]
struct ProcedureRepr {
    nodes: Vec<DecisionNode>,
    root: NodeId,
    segment_count: usize,
    domain: (i128, i128),
    correction: i128,
}

impl TryFrom<ProcedureRepr> for DecisionProcedure {
    type Error = ApproxError;

    fn try_from(repr: ProcedureRepr) -> Result<Self, Self::Error> {
        for (idx, node) in repr.nodes.iter().enumerate() {
            let valid = match *node {
                DecisionNode::Leaf(segment) => segment < repr.segment_count,
                DecisionNode::Branch {
                    then, otherwise, ..
                } => then.0 < idx && otherwise.0 < idx,
            };
            if !valid {
                return Err(ApproxError::MalformedTree(idx));
            }
        }
        if repr.root.0 >= repr.nodes.len() {
            return Err(ApproxError::MalformedTree(repr.root.0));
        }
        Ok(Self {
            nodes: repr.nodes,
            root: repr.root,
            segment_count: repr.segment_count,
            domain: repr.domain,
            correction: repr.correction,
        })
    }
}

/// Appends nodes so that children always precede their parents.
#[derive(Default)]
struct Arena {
    nodes: Vec<DecisionNode>,
}

impl Arena {
    fn push(&mut self, node: DecisionNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    fn leaf(&mut self, segment: usize) -> NodeId {
        self.push(DecisionNode::Leaf(segment))
    }

    fn branch(&mut self, test: Test, then: NodeId, otherwise: NodeId) -> NodeId {
        self.push(DecisionNode::Branch {
            test,
            then,
            otherwise,
        })
    }
}

impl DecisionProcedure {
    /// Builds the decision tree for `segments`, which must have non-decreasing, contiguous
    /// breakpoints.
    #[tracing::instrument(level = "debug", skip(segments), fields(segments = segments.len()))]
    pub fn build(segments: &[FixedSegment], correction: i128) -> Result<Self, ApproxError> {
        let (first, last) = match (segments.first(), segments.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(ConfigError::SampleCount(segments.len() + 1).into()),
        };
        check_breakpoints(segments)?;

        let mut arena = Arena::default();
        let last_idx = segments.len() - 1;
        let (saturated, fallback) = (arena.leaf(last_idx), arena.leaf(0));
        let mut otherwise = arena.branch(Test::Above(last.lower), saturated, fallback);
        for (idx, seg) in segments[..last_idx].iter().enumerate().rev() {
            let then = arena.leaf(idx);
            let test = Test::Within {
                lower: seg.lower,
                upper: seg.upper,
            };
            otherwise = arena.branch(test, then, otherwise);
        }
        let below = arena.leaf(0);
        let root = arena.branch(Test::Below(first.lower), below, otherwise);
        let proc = Self {
            nodes: arena.nodes,
            root,
            segment_count: segments.len(),
            domain: (first.lower, last.upper),
            correction,
        };
        debug!(
            nodes = proc.nodes.len(),
            depth = proc.depth(),
            "Built decision procedure"
        );
        Ok(proc)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &DecisionNode {
        &self.nodes[id.0]
    }

    /// All nodes, children before parents.
    pub fn nodes(&self) -> &[DecisionNode] {
        &self.nodes
    }

    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    pub fn correction(&self) -> i128 {
        self.correction
    }

    /// Number of tests on the longest path from the root to a leaf.
    pub fn depth(&self) -> usize {
        let mut depths: Vec<usize> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let depth = match *node {
                DecisionNode::Leaf(_) => 0,
                DecisionNode::Branch {
                    then, otherwise, ..
                } => 1 + depths[then.0].max(depths[otherwise.0]),
            };
            depths.push(depth);
        }
        depths[self.root.0]
    }

    /// Index of the segment selected for `sum`.
    pub fn select(&self, sum: i128) -> usize {
        let (low, high) = self.domain;
        if sum < low || sum > high {
            trace!(sum, low, high, "Input outside of domain, saturating");
        }
        let mut id = self.root;
        loop {
            match *self.node(id) {
                DecisionNode::Leaf(idx) => return idx,
                DecisionNode::Branch {
                    test,
                    then,
                    otherwise,
                } => id = if test.holds(sum) { then } else { otherwise },
            }
        }
    }

    /// Selects the product for `sum` and removes the correction term from it.
    pub fn evaluate(&self, sum: i128, products: &[i128]) -> Result<i128, ApproxError> {
        if products.len() != self.segment_count {
            return Err(ApproxError::ProductCount {
                expected: self.segment_count,
                actual: products.len(),
            });
        }
        let selected = products[self.select(sum)];
        Ok(selected
            .checked_sub(self.correction)
            .ok_or(OverflowError {
                value: selected,
                bits: 128,
            })?)
    }

    /// Like [`evaluate`](Self::evaluate), for an input given as two additive shares.
    pub fn evaluate_shares(
        &self,
        x0: i128,
        x1: i128,
        products: &[i128],
    ) -> Result<i128, ApproxError> {
        let sum = x0.checked_add(x1).ok_or(OverflowError {
            value: x0,
            bits: 128,
        })?;
        self.evaluate(sum, products)
    }
}

fn check_breakpoints(segments: &[FixedSegment]) -> Result<(), ApproxError> {
    let mut previous = i128::MIN;
    for (index, seg) in segments.iter().enumerate() {
        if seg.lower < previous {
            return Err(ApproxError::NonMonotonic {
                index,
                previous,
                value: seg.lower,
            });
        }
        if seg.upper < seg.lower {
            return Err(ApproxError::NonMonotonic {
                index,
                previous: seg.lower,
                value: seg.upper,
            });
        }
        if index > 0 && seg.lower != previous {
            return Err(ApproxError::Gap {
                index,
                previous,
                value: seg.lower,
            });
        }
        previous = seg.upper;
    }
    Ok(())
}
