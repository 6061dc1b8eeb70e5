//! Exact k-nearest-neighbor index over binary ingredient vectors.
//!
//! A KD-tree specialised for 0/1 data: every internal node splits its rows on
//! one ingredient column, rows without the ingredient going left and rows with
//! it going right. The split column is the one whose presence count is
//! closest to half the node, so the tree stays as balanced as the data allows.
//! A column is never split twice on one path because both children have zero
//! spread on it.
//!
//! Distances are Euclidean. The search works on exact integer squared
//! distances, so equal distances compare equal and ties are broken by row
//! position: the earlier row in the corpus wins.

use crate::corpus::EncodedCorpus;
use crate::error::{RecommendError, Result};
use crate::recipe::RecipeId;
use crate::vector::squared_distance_unchecked;

/// Index construction parameters.
#[derive(Clone, Debug)]
pub struct IndexParams {
    /// Nodes with at most this many rows are not split further.
    pub leaf_size: usize,
}

impl Default for IndexParams {
    fn default() -> Self {
        Self { leaf_size: 40 }
    }
}

/// One search hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Neighbor {
    pub id: RecipeId,
    /// Number of ingredients present in exactly one of the two recipes.
    pub squared_distance: u32,
}

impl Neighbor {
    pub fn distance(&self) -> f32 {
        (self.squared_distance as f32).sqrt()
    }
}

enum KdNode {
    Split { axis: usize, absent: usize, present: usize },
    Leaf { rows: Vec<usize> },
}

/// Read-only KD-tree over a fixed set of `(id, vector)` pairs.
pub struct SpatialIndex {
    ids: Vec<RecipeId>,
    vectors: Vec<u8>,
    dimension: usize,
    nodes: Vec<KdNode>,
}

impl SpatialIndex {
    /// Builds the index over every recipe of `corpus`.
    pub fn from_corpus(corpus: &EncodedCorpus, params: &IndexParams) -> Result<Self> {
        Self::build(corpus.iter(), corpus.dimension(), params)
    }

    /// Builds the index over arbitrary `(id, vector)` pairs of width `dimension`.
    ///
    /// Fails with `EmptyCorpus` when no pairs are given, `DimensionMismatch`
    /// when a vector has the wrong width, and `InvalidArgument` when a cell is
    /// not 0 or 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use recipe_knn::{IndexParams, SpatialIndex};
    ///
    /// let rows = vec![(1, vec![1u8, 1, 0]), (2, vec![1, 1, 1]), (3, vec![0, 0, 1])];
    /// let pairs = rows.iter().map(|(id, v)| (*id, v.as_slice()));
    /// let index = SpatialIndex::build(pairs, 3, &IndexParams::default()).unwrap();
    ///
    /// let hits = index.query(&[1, 1, 0], 2).unwrap();
    /// assert_eq!(hits[0].id, 1);
    /// assert_eq!(hits[1].id, 2);
    /// assert_eq!(hits[1].squared_distance, 1);
    /// ```
    pub fn build<'v, I>(pairs: I, dimension: usize, params: &IndexParams) -> Result<Self>
    where
        I: IntoIterator<Item = (RecipeId, &'v [u8])>,
    {
        let mut ids = Vec::new();
        let mut vectors = Vec::new();

        for (id, vector) in pairs {
            if vector.len() != dimension {
                return Err(RecommendError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            if vector.iter().any(|&cell| cell > 1) {
                return Err(RecommendError::InvalidArgument(format!(
                    "vector for recipe {} is not binary",
                    id
                )));
            }
            ids.push(id);
            vectors.extend_from_slice(vector);
        }

        if ids.is_empty() {
            return Err(RecommendError::EmptyCorpus);
        }

        let mut index = SpatialIndex { ids, vectors, dimension, nodes: Vec::new() };
        index.nodes = index.build_nodes(params.leaf_size.max(1));
        Ok(index)
    }

    /// Returns the `m` nearest indexed vectors to `query`, nearest first.
    ///
    /// Returns fewer than `m` hits only when the index holds fewer vectors.
    /// Equal distances are ordered by row position.
    pub fn query(&self, query: &[u8], m: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(RecommendError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        if m == 0 {
            return Ok(Vec::new());
        }

        // (squared distance, row), kept sorted ascending and at most m long
        let mut best: Vec<(u32, usize)> = Vec::with_capacity(m.min(self.len()) + 1);
        // (node, lower bound on the squared distance of anything below it)
        let mut pending: Vec<(usize, u32)> = vec![(0, 0)];

        while let Some((node, bound)) = pending.pop() {
            if best.len() == m && bound > best[m - 1].0 {
                continue;
            }

            match &self.nodes[node] {
                KdNode::Leaf { rows } => {
                    for &row in rows {
                        let candidate = (squared_distance_unchecked(query, self.vector_at(row)), row);
                        if best.len() == m && candidate >= best[m - 1] {
                            continue;
                        }
                        let insert_index = best.partition_point(|&x| x < candidate);
                        best.insert(insert_index, candidate);
                        best.truncate(m);
                    }
                }
                KdNode::Split { axis, absent, present } => {
                    let value = query[*axis] as u32;
                    let absent_gap = value * value;
                    let present_gap = value.abs_diff(1).pow(2);

                    // Pushed last, popped first: descend into the closer side before the farther one.
                    if absent_gap <= present_gap {
                        pending.push((*present, bound + present_gap));
                        pending.push((*absent, bound + absent_gap));
                    } else {
                        pending.push((*absent, bound + absent_gap));
                        pending.push((*present, bound + present_gap));
                    }
                }
            }
        }

        Ok(best
            .into_iter()
            .map(|(squared_distance, row)| Neighbor { id: self.ids[row], squared_distance })
            .collect())
    }

    /// Returns the number of indexed vectors.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn vector_at(&self, row: usize) -> &[u8] {
        let start = row * self.dimension;
        &self.vectors[start..start + self.dimension]
    }

    /// Lays the tree out in a flat arena, root at 0, without recursion so a
    /// degenerate corpus cannot exhaust the stack.
    fn build_nodes(&self, leaf_size: usize) -> Vec<KdNode> {
        let mut nodes = vec![KdNode::Leaf { rows: Vec::new() }];
        let mut pending = vec![(0usize, (0..self.ids.len()).collect::<Vec<usize>>())];

        while let Some((slot, rows)) = pending.pop() {
            let axis = if rows.len() > leaf_size { self.split_axis(&rows) } else { None };

            let Some(axis) = axis else {
                nodes[slot] = KdNode::Leaf { rows };
                continue;
            };

            let (absent_rows, present_rows): (Vec<usize>, Vec<usize>) = rows
                .into_iter()
                .partition(|&row| self.vector_at(row)[axis] == 0);

            let absent = nodes.len();
            let present = absent + 1;
            nodes.push(KdNode::Leaf { rows: Vec::new() });
            nodes.push(KdNode::Leaf { rows: Vec::new() });
            nodes[slot] = KdNode::Split { axis, absent, present };

            pending.push((absent, absent_rows));
            pending.push((present, present_rows));
        }

        nodes
    }

    /// Column with the most balanced presence count among `rows`, lowest
    /// column on ties. `None` when every column is constant over `rows`.
    fn split_axis(&self, rows: &[usize]) -> Option<usize> {
        let mut present = vec![0usize; self.dimension];
        for &row in rows {
            for (count, &cell) in present.iter_mut().zip(self.vector_at(row)) {
                *count += cell as usize;
            }
        }

        let mut best: Option<(usize, usize)> = None;
        for (axis, &count) in present.iter().enumerate() {
            let balance = count.min(rows.len() - count);
            if balance > 0 && best.is_none_or(|(_, b)| balance > b) {
                best = Some((axis, balance));
            }
        }

        best.map(|(axis, _)| axis)
    }
}
