//! Sparse user x item interaction matrix.
//!
//! Stored in compressed sparse row (CSR) form: row `u` owns
//! `indices[indptr[u]..indptr[u + 1]]` (sorted column numbers) and the
//! matching slice of `data`. The matrix is built once per training run and
//! never mutated afterwards.
//!
//! A stored entry whose value is 0.0 still counts as an interaction: the
//! lowest raw weight normalizes to zero, and history exclusion must see it.

use crate::error::{EngineError, Result};
use crate::identity::IdentityMap;

/// Immutable CSR matrix of normalized interaction weights
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionMatrix {
    num_rows: usize,
    num_cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f32>,
}

/// Borrowed view of one matrix row
#[derive(Debug, Clone, Copy)]
pub struct MatrixRow<'a> {
    pub indices: &'a [usize],
    pub values: &'a [f32],
}

impl<'a> MatrixRow<'a> {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Whether column `col` holds a stored entry
    pub fn contains(&self, col: usize) -> bool {
        self.indices.binary_search(&col).is_ok()
    }

    pub fn iter(self) -> impl Iterator<Item = (usize, f32)> + 'a {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }
}

impl InteractionMatrix {
    /// Build from (row, col, value) triplets; duplicates are summed
    ///
    /// Fails with `ShapeMismatch` if a triplet lies outside the shape.
    pub fn from_triplets<I>(num_rows: usize, num_cols: usize, triplets: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize, f32)>,
    {
        let mut rows: Vec<Vec<(usize, f32)>> = vec![Vec::new(); num_rows];
        for (row, col, value) in triplets {
            if row >= num_rows || col >= num_cols {
                return Err(EngineError::ShapeMismatch(format!(
                    "entry ({}, {}) outside matrix of shape ({}, {})",
                    row, col, num_rows, num_cols
                )));
            }
            rows[row].push((col, value));
        }

        let mut indptr = Vec::with_capacity(num_rows + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);

        for mut entries in rows {
            entries.sort_by_key(|&(col, _)| col);
            let row_start = indices.len();
            for (col, value) in entries {
                if indices.len() > row_start && indices.last() == Some(&col) {
                    if let Some(last) = data.last_mut() {
                        *last += value;
                    }
                } else {
                    indices.push(col);
                    data.push(value);
                }
            }
            indptr.push(indices.len());
        }

        Ok(Self {
            num_rows,
            num_cols,
            indptr,
            indices,
            data,
        })
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.num_rows, self.num_cols)
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Row view; panics if `row` is out of range, like slice indexing
    pub fn row(&self, row: usize) -> MatrixRow<'_> {
        let range = self.indptr[row]..self.indptr[row + 1];
        MatrixRow {
            indices: &self.indices[range.clone()],
            values: &self.data[range],
        }
    }

    /// Checked row view
    pub fn get_row(&self, row: usize) -> Option<MatrixRow<'_>> {
        (row < self.num_rows).then(|| self.row(row))
    }

    /// Value stored at `(row, col)`, if any
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        let view = self.get_row(row)?;
        view.indices
            .binary_search(&col)
            .ok()
            .map(|pos| view.values[pos])
    }

    /// Column-major counterpart: the item x user matrix
    pub fn transpose(&self) -> Self {
        let mut indptr = vec![0usize; self.num_cols + 1];
        for &col in &self.indices {
            indptr[col + 1] += 1;
        }
        for col in 0..self.num_cols {
            indptr[col + 1] += indptr[col];
        }

        let mut next = indptr.clone();
        let mut indices = vec![0usize; self.nnz()];
        let mut data = vec![0f32; self.nnz()];
        // rows are visited in order, so each output row comes out sorted
        for row in 0..self.num_rows {
            for (col, value) in self.row(row).iter() {
                let pos = next[col];
                indices[pos] = row;
                data[pos] = value;
                next[col] += 1;
            }
        }

        Self {
            num_rows: self.num_cols,
            num_cols: self.num_rows,
            indptr,
            indices,
            data,
        }
    }
}

/// Assembles an [`InteractionMatrix`] whose shape comes from two identity maps
///
/// Rows and columns with no interactions are legal; the shape is always
/// `(users.len(), items.len())`.
pub struct InteractionMatrixBuilder<'a> {
    users: &'a IdentityMap,
    items: &'a IdentityMap,
    triplets: Vec<(usize, usize, f32)>,
}

impl<'a> InteractionMatrixBuilder<'a> {
    pub fn new(users: &'a IdentityMap, items: &'a IdentityMap) -> Self {
        Self {
            users,
            items,
            triplets: Vec::new(),
        }
    }

    /// Add an interaction by external IDs
    pub fn push(&mut self, user_id: &str, item_id: &str, weight: f32) -> Result<()> {
        let row = self.users.to_index(user_id)?;
        let col = self.items.to_index(item_id)?;
        self.triplets.push((row, col, weight));
        Ok(())
    }

    /// Add an interaction by dense indices
    pub fn push_indexed(&mut self, row: usize, col: usize, weight: f32) -> Result<()> {
        if row >= self.users.len() || col >= self.items.len() {
            return Err(EngineError::ShapeMismatch(format!(
                "entry ({}, {}) outside mapped range ({}, {})",
                row,
                col,
                self.users.len(),
                self.items.len()
            )));
        }
        self.triplets.push((row, col, weight));
        Ok(())
    }

    pub fn build(self) -> Result<InteractionMatrix> {
        InteractionMatrix::from_triplets(self.users.len(), self.items.len(), self.triplets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IdentityKind;

    fn maps() -> (IdentityMap, IdentityMap) {
        (
            IdentityMap::build(IdentityKind::User, ["u1", "u2", "u3"]),
            IdentityMap::build(IdentityKind::Item, ["i1", "i2", "i3", "i4"]),
        )
    }

    #[test]
    fn test_shape_comes_from_maps() {
        let (users, items) = maps();
        let mut builder = InteractionMatrixBuilder::new(&users, &items);
        builder.push("u1", "i1", 1.0).unwrap();

        let matrix = builder.build().unwrap();
        assert_eq!(matrix.shape(), (3, 4));
        assert_eq!(matrix.nnz(), 1);
        assert!(matrix.row(2).is_empty());
    }

    #[test]
    fn test_rows_are_sorted() {
        let matrix =
            InteractionMatrix::from_triplets(2, 5, vec![(0, 4, 0.4), (0, 1, 0.1), (1, 3, 0.3)])
                .unwrap();

        let row = matrix.row(0);
        assert_eq!(row.indices, &[1, 4]);
        assert_eq!(row.values, &[0.1, 0.4]);
        assert!(row.contains(4));
        assert!(!row.contains(3));
        assert_eq!(matrix.get(1, 3), Some(0.3));
        assert_eq!(matrix.get(1, 2), None);
    }

    #[test]
    fn test_duplicates_are_summed() {
        let matrix =
            InteractionMatrix::from_triplets(1, 2, vec![(0, 1, 0.25), (0, 1, 0.5)]).unwrap();
        assert_eq!(matrix.nnz(), 1);
        assert_eq!(matrix.get(0, 1), Some(0.75));
    }

    #[test]
    fn test_explicit_zero_is_stored() {
        let matrix = InteractionMatrix::from_triplets(1, 2, vec![(0, 0, 0.0)]).unwrap();
        assert!(matrix.row(0).contains(0));
    }

    #[test]
    fn test_out_of_range_is_shape_mismatch() {
        let (users, items) = maps();
        let mut builder = InteractionMatrixBuilder::new(&users, &items);
        assert!(matches!(
            builder.push_indexed(3, 0, 1.0),
            Err(EngineError::ShapeMismatch(_))
        ));
        assert!(matches!(
            InteractionMatrix::from_triplets(1, 1, vec![(0, 1, 1.0)]),
            Err(EngineError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_unknown_id_is_rejected() {
        let (users, items) = maps();
        let mut builder = InteractionMatrixBuilder::new(&users, &items);
        assert!(matches!(
            builder.push("ghost", "i1", 1.0),
            Err(EngineError::UnknownIdentity { .. })
        ));
    }

    #[test]
    fn test_transpose() {
        let matrix =
            InteractionMatrix::from_triplets(2, 3, vec![(0, 2, 0.5), (1, 0, 1.0), (1, 2, 0.2)])
                .unwrap();
        let t = matrix.transpose();

        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.get(2, 0), Some(0.5));
        assert_eq!(t.get(2, 1), Some(0.2));
        assert_eq!(t.get(0, 1), Some(1.0));
        assert!(t.row(1).is_empty());
    }
}
