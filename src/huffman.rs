//! Huffman coding
//!
//! Classic bottom-up merge over a min-priority queue. Exact weight ties are
//! broken by insertion sequence number, so identical input always yields the
//! same tree shape.

use crate::code::{Code, CodeTable};
use crate::frequency::{FrequencyTable, ProbabilityModel, Symbol};
use num::BigRational;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::ops::Add;
use tracing::{debug, trace};

/// Node of the Huffman merge tree. Every internal node owns exactly two
/// children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeNode<W> {
    Leaf {
        symbol: Symbol,
        weight: W,
    },
    Internal {
        left: Box<MergeNode<W>>,
        right: Box<MergeNode<W>>,
        weight: W,
    },
}

impl<W> MergeNode<W> {
    pub fn weight(&self) -> &W {
        match self {
            MergeNode::Leaf { weight, .. } => weight,
            MergeNode::Internal { weight, .. } => weight,
        }
    }
}

struct Queued<W> {
    weight: W,
    sequence: u64,
    node: MergeNode<W>,
}

impl<W: Ord> Eq for Queued<W> {}
impl<W: Ord> PartialEq for Queued<W> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl<W: Ord> PartialOrd for Queued<W> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<W: Ord> Ord for Queued<W> {
    fn cmp(&self, other: &Self) -> Ordering {
        // min-heap on (weight, sequence)
        other
            .weight
            .cmp(&self.weight)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Merge leaves, given in insertion order, into a Huffman tree.
///
/// The first node popped becomes the left child. Returns `None` when there
/// are no leaves.
pub fn merge_tree<W, I>(leaves: I) -> Option<MergeNode<W>>
where
    W: Ord + Clone + Add<Output = W>,
    I: IntoIterator<Item = (Symbol, W)>,
{
    let mut heap = BinaryHeap::new();
    let mut sequence = 0u64;
    for (symbol, weight) in leaves {
        heap.push(Queued {
            weight: weight.clone(),
            sequence,
            node: MergeNode::Leaf { symbol, weight },
        });
        sequence += 1;
    }

    while heap.len() > 1 {
        let (Some(left), Some(right)) = (heap.pop(), heap.pop()) else {
            break;
        };
        let weight = left.weight.clone() + right.weight.clone();
        trace!(left = left.sequence, right = right.sequence, merged = sequence, "huffman merge");
        heap.push(Queued {
            weight: weight.clone(),
            sequence,
            node: MergeNode::Internal {
                left: Box::new(left.node),
                right: Box::new(right.node),
                weight,
            },
        });
        sequence += 1;
    }

    heap.pop().map(|queued| queued.node)
}

fn assign_codes<W>(node: &MergeNode<W>, prefix: Code, codes: &mut HashMap<Symbol, Code>) {
    match node {
        MergeNode::Leaf { symbol, .. } => {
            let code = if prefix.is_empty() {
                Code::from_bits(vec![false])
            } else {
                prefix
            };
            codes.insert(*symbol, code);
        }
        MergeNode::Internal { left, right, .. } => {
            let mut left_prefix = prefix.clone();
            left_prefix.push(false);
            assign_codes(left, left_prefix, codes);

            let mut right_prefix = prefix;
            right_prefix.push(true);
            assign_codes(right, right_prefix, codes);
        }
    }
}

fn codes_for<W>(
    leaves: Vec<(Symbol, W)>,
    order: impl IntoIterator<Item = Symbol>,
) -> CodeTable
where
    W: Ord + Clone + Add<Output = W>,
{
    let mut table = CodeTable::new();
    if leaves.len() == 1 {
        table.insert(leaves[0].0, Code::from_bits(vec![false]));
        return table;
    }

    let mut codes = HashMap::new();
    if let Some(root) = merge_tree(leaves) {
        assign_codes(&root, Code::new(), &mut codes);
    }
    for symbol in order {
        if let Some(code) = codes.remove(&symbol) {
            table.insert(symbol, code);
        }
    }
    table
}

/// Build a Huffman code table from counted frequencies.
///
/// Leaves enter the queue in the table's first-occurrence order; the
/// returned table lists symbols by descending count, then ascending symbol.
pub fn build(frequencies: &FrequencyTable) -> CodeTable {
    let leaves: Vec<(Symbol, u64)> = frequencies.iter().collect();
    let mut order = leaves.clone();
    order.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let table = codes_for(leaves, order.into_iter().map(|(s, _)| s));
    debug!(symbols = table.len(), "built huffman table");
    table
}

/// Build a Huffman code table from model probabilities, for models that
/// were not derived from counts. Leaves enter the queue in model order.
pub fn build_weighted(model: &ProbabilityModel) -> CodeTable {
    let leaves: Vec<(Symbol, BigRational)> = model
        .entries()
        .iter()
        .map(|e| (e.symbol, e.probability.clone()))
        .collect();
    let table = codes_for(leaves, model.entries().iter().map(|e| e.symbol));
    debug!(symbols = table.len(), "built weighted huffman table");
    table
}
