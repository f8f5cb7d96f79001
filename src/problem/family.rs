//! Canonical problem family used as the registry lookup key.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::Problem;
use crate::operation::OperationType;
use crate::tensor::DataType;

const INDEX_CHARS: &[u8] = b"ijklmnopqrstuvwxyzabcdefgh";

/// Everything about a problem's shape a solution is specialized on.
///
/// Sizes and strides are deliberately absent: one solution serves every
/// size of its family. Summation ids are relabelled in order of first
/// appearance in A, then B, so renaming summation indices consistently in
/// both operands yields the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FamilyKey {
    pub operation_type: OperationType,
    pub data_type_c: DataType,
    pub data_type_a: DataType,
    pub data_type_b: DataType,
    pub num_indices_free: usize,
    pub num_indices_batch: usize,
    pub num_indices_summation: usize,
    pub index_assignments_a: Vec<usize>,
    pub index_assignments_b: Vec<usize>,
}

impl FamilyKey {
    /// Derive the canonical key of `problem`.
    pub fn of(problem: &Problem) -> Self {
        let op = problem.operation();
        let (a, b) = canonical_assignments(
            &op.index_assignments_a,
            &op.index_assignments_b,
            op.num_indices_c(),
        );
        Self {
            operation_type: op.operation_type,
            data_type_c: problem.tensor_c().data_type(),
            data_type_a: problem.tensor_a().data_type(),
            data_type_b: problem.tensor_b().data_type(),
            num_indices_free: op.num_indices_free,
            num_indices_batch: op.num_indices_batch,
            num_indices_summation: op.num_indices_summation,
            index_assignments_a: a,
            index_assignments_b: b,
        }
    }

    /// Rebuild a key from its parts, canonicalizing the summation ids.
    pub fn new(
        operation_type: OperationType,
        data_types: [DataType; 3],
        counts: [usize; 3],
        index_assignments_a: &[usize],
        index_assignments_b: &[usize],
    ) -> Self {
        let [free, batch, summation] = counts;
        let (a, b) = canonical_assignments(index_assignments_a, index_assignments_b, free + batch);
        Self {
            operation_type,
            data_type_c: data_types[0],
            data_type_a: data_types[1],
            data_type_b: data_types[2],
            num_indices_free: free,
            num_indices_batch: batch,
            num_indices_summation: summation,
            index_assignments_a: a,
            index_assignments_b: b,
        }
    }

    #[inline]
    pub fn num_indices_c(&self) -> usize {
        self.num_indices_free + self.num_indices_batch
    }

    /// Short human-readable name, e.g. `Cij_Aik_Bkj_SSS`.
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FamilyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letters = |ids: &[usize]| -> String { ids.iter().map(|&i| index_char(i)).collect() };
        let c: Vec<usize> = (0..self.num_indices_c()).collect();
        if self.operation_type == OperationType::Convolution {
            write!(f, "Conv_")?;
        }
        write!(
            f,
            "C{}_A{}_B{}_{}{}{}",
            letters(&c),
            letters(&self.index_assignments_a),
            letters(&self.index_assignments_b),
            self.data_type_c.to_char(),
            self.data_type_a.to_char(),
            self.data_type_b.to_char(),
        )
    }
}

fn index_char(id: usize) -> char {
    INDEX_CHARS.get(id).map(|&c| c as char).unwrap_or('?')
}

/// Relabel summation ids (`>= rank_c`) by order of first appearance.
fn canonical_assignments(a: &[usize], b: &[usize], rank_c: usize) -> (Vec<usize>, Vec<usize>) {
    let mut relabel: HashMap<usize, usize> = HashMap::new();
    let mut next = rank_c;
    let mut map = |id: usize| -> usize {
        if id < rank_c {
            return id;
        }
        *relabel.entry(id).or_insert_with(|| {
            let label = next;
            next += 1;
            label
        })
    };
    let a: Vec<usize> = a.iter().map(|&id| map(id)).collect();
    let b: Vec<usize> = b.iter().map(|&id| map(id)).collect();
    (a, b)
}
