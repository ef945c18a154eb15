/// Relative pivot threshold below which a column is treated as collinear.
const ALIAS_TOLERANCE: f64 = 1e-9;

/// Solution of a symmetric positive semi-definite system.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Solution {
    /// `None` for aliased (linearly dependent) columns.
    pub coefficients: Vec<Option<f64>>,
    pub rank: usize,
}

/// Solves `gram · x = rhs` by a Cholesky factorisation that skips aliased columns.
///
/// Columns are processed in order; a column whose residual pivot falls below the
/// tolerance is dropped, exactly like pivoting off a later collinear regressor.
pub(crate) fn solve_normal_equations(gram: &[Vec<f64>], rhs: &[f64]) -> Solution {
    let p = rhs.len();
    let mut lower = vec![vec![0.0; p]; p];
    let mut active = vec![false; p];

    for j in 0..p {
        let mut pivot = gram[j][j];
        for k in 0..j {
            pivot -= lower[j][k] * lower[j][k];
        }

        let scale = gram[j][j].abs().max(f64::MIN_POSITIVE);
        if pivot.is_nan() || pivot <= ALIAS_TOLERANCE * scale {
            continue;
        }

        let diagonal = pivot.sqrt();
        lower[j][j] = diagonal;
        active[j] = true;

        for i in (j + 1)..p {
            let mut value = gram[i][j];
            for k in 0..j {
                value -= lower[i][k] * lower[j][k];
            }
            lower[i][j] = value / diagonal;
        }
    }

    // forward: L z = rhs
    let mut z = vec![0.0; p];
    for i in (0..p).filter(|&i| active[i]) {
        let mut value = rhs[i];
        for k in (0..i).filter(|&k| active[k]) {
            value -= lower[i][k] * z[k];
        }
        z[i] = value / lower[i][i];
    }

    // backward: L^T x = z
    let mut x = vec![0.0; p];
    for i in (0..p).rev().filter(|&i| active[i]) {
        let mut value = z[i];
        for k in ((i + 1)..p).filter(|&k| active[k]) {
            value -= lower[k][i] * x[k];
        }
        x[i] = value / lower[i][i];
    }

    Solution {
        coefficients: x
            .into_iter()
            .zip(&active)
            .map(|(value, &is_active)| is_active.then_some(value))
            .collect(),
        rank: active.iter().filter(|&&is_active| is_active).count(),
    }
}

/// Accumulates weighted `XᵀWX` and `XᵀWz` in row order.
pub(crate) fn weighted_cross_products(
    rows: &[Vec<f64>],
    weights: &[f64],
    response: &[f64],
) -> (Vec<Vec<f64>>, Vec<f64>) {
    let p = rows.first().map(Vec::len).unwrap_or(0);
    let mut gram = vec![vec![0.0; p]; p];
    let mut rhs = vec![0.0; p];

    for ((row, &weight), &target) in rows.iter().zip(weights).zip(response) {
        for i in 0..p {
            if row[i] == 0.0 {
                continue;
            }
            let scaled = weight * row[i];
            rhs[i] += scaled * target;
            for j in 0..=i {
                gram[i][j] += scaled * row[j];
            }
        }
    }

    for i in 0..p {
        for j in 0..i {
            gram[j][i] = gram[i][j];
        }
    }

    (gram, rhs)
}

pub(crate) fn dot(coefficients: &[Option<f64>], row: &[f64]) -> f64 {
    coefficients
        .iter()
        .zip(row)
        .map(|(coefficient, value)| coefficient.unwrap_or(0.0) * value)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_a_well_conditioned_system() {
        let gram = vec![vec![4.0, 2.0], vec![2.0, 3.0]];
        let solution = solve_normal_equations(&gram, &[10.0, 8.0]);
        assert_eq!(solution.rank, 2);
        let x = solution.coefficients;
        assert!((x[0].expect("active") - 1.75).abs() < 1e-12);
        assert!((x[1].expect("active") - 1.5).abs() < 1e-12);
    }

    #[test]
    fn drops_a_duplicated_column() {
        let rows = vec![
            vec![1.0, 1.0, 1.0],
            vec![1.0, 2.0, 2.0],
            vec![1.0, 3.0, 3.0],
            vec![1.0, 4.0, 4.0],
        ];
        let response = vec![3.0, 5.0, 7.0, 9.0];
        let (gram, rhs) = weighted_cross_products(&rows, &[1.0; 4], &response);
        let solution = solve_normal_equations(&gram, &rhs);

        assert_eq!(solution.rank, 2);
        assert_eq!(solution.coefficients[2], None);
        assert!((solution.coefficients[0].expect("intercept") - 1.0).abs() < 1e-9);
        assert!((solution.coefficients[1].expect("slope") - 2.0).abs() < 1e-9);
    }
}
