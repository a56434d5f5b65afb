//! Minimum-cost bipartite assignment.
//!
//! Shortest augmenting paths with row and column potentials, `O(n²m)` for
//! `n` rows and `m ≥ n` columns. When there are more rows than columns the
//! solver pads with zero-cost columns and reports those rows as unassigned.

/// Costs above this are clamped so every entry stays finite.
const CLAMP: f64 = 1.0e18;

/// Dense row-major cost table built and consumed within one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl CostMatrix {
    /// A `rows × cols` matrix with every entry set to `fill`.
    #[must_use]
    pub fn new(rows: usize, cols: usize, fill: f64) -> Self {
        Self {
            rows,
            cols,
            data: vec![fill; rows * cols],
        }
    }

    /// Build from nested rows. Returns `None` if the rows are ragged.
    #[must_use]
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        Some(Self {
            rows: rows.len(),
            cols,
            data: rows.concat(),
        })
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Entry at `(row, col)`.
    #[must_use]
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    /// Overwrite the entry at `(row, col)`.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    /// Sum of the entries chosen by an assignment.
    #[must_use]
    pub fn total(&self, assignment: &[Option<usize>]) -> f64 {
        assignment
            .iter()
            .enumerate()
            .filter_map(|(row, col)| col.map(|c| self.get(row, c)))
            .sum()
    }

    fn entry(&self, row: usize, col: usize) -> f64 {
        if col >= self.cols {
            return 0.0;
        }
        let value = self.get(row, col);
        if value.is_nan() {
            CLAMP
        } else {
            value.clamp(-CLAMP, CLAMP)
        }
    }
}

/// Solve the assignment problem.
///
/// Returns, for each row, the column it is matched to. Every column is used
/// at most once. Rows only go unmatched when there are more rows than
/// columns.
#[must_use]
pub fn solve(matrix: &CostMatrix) -> Vec<Option<usize>> {
    let n = matrix.rows();
    if n == 0 {
        return Vec::new();
    }
    let m = matrix.cols().max(n);

    // 1-based potentials; p[j] is the row matched to column j, 0 for none.
    let mut u = vec![0.0_f64; n + 1];
    let mut v = vec![0.0_f64; m + 1];
    let mut p = vec![0_usize; m + 1];
    let mut way = vec![0_usize; m + 1];

    for row in 1..=n {
        p[0] = row;
        let mut j0 = 0;
        let mut minv = vec![f64::INFINITY; m + 1];
        let mut used = vec![false; m + 1];
        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0;
            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let reduced = matrix.entry(i0 - 1, j - 1) - u[i0] - v[j];
                if reduced < minv[j] {
                    minv[j] = reduced;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }
            for j in 0..=m {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }
            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![None; n];
    for j in 1..=m {
        if p[j] != 0 && j - 1 < matrix.cols() {
            assignment[p[j] - 1] = Some(j - 1);
        }
    }
    assignment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square() {
        let matrix = CostMatrix::from_rows(&[
            vec![4.0, 1.0, 3.0],
            vec![2.0, 0.0, 5.0],
            vec![3.0, 2.0, 2.0],
        ])
        .unwrap();
        let assignment = solve(&matrix);
        assert_eq!(assignment, vec![Some(1), Some(0), Some(2)]);
        assert!((matrix.total(&assignment) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_more_columns_than_rows() {
        let matrix = CostMatrix::from_rows(&[vec![9.0, 9.0, 1.0, 9.0], vec![9.0, 9.0, 2.0, 3.0]])
            .unwrap();
        let assignment = solve(&matrix);
        assert_eq!(assignment, vec![Some(2), Some(3)]);
    }

    #[test]
    fn test_more_rows_than_columns() {
        let matrix = CostMatrix::from_rows(&[vec![5.0], vec![1.0], vec![3.0]]).unwrap();
        let assignment = solve(&matrix);
        assert_eq!(assignment, vec![None, Some(0), None]);
    }

    #[test]
    fn test_sentinel_avoided_when_possible() {
        let big = 1.0e9;
        let matrix = CostMatrix::from_rows(&[vec![1.0, big], vec![2.0, big], vec![big, 7.0]])
            .unwrap();
        let assignment = solve(&matrix);
        assert_eq!(assignment[2], Some(1));
        assert_eq!(assignment.iter().filter(|a| a.is_some()).count(), 2);
    }

    #[test]
    fn test_nan_and_infinity_tolerated() {
        let matrix =
            CostMatrix::from_rows(&[vec![f64::NAN, 1.0], vec![f64::INFINITY, 2.0]]).unwrap();
        let assignment = solve(&matrix);
        assert_eq!(assignment.len(), 2);
        assert_ne!(assignment[0], assignment[1]);
    }

    #[test]
    fn test_empty() {
        assert!(solve(&CostMatrix::new(0, 3, 0.0)).is_empty());
        assert!(CostMatrix::from_rows(&[vec![1.0], vec![1.0, 2.0]]).is_none());
    }
}
