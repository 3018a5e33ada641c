// ============================================================
// Layer 5 — Singular Value Decomposition and Rank Policy
// ============================================================
// One-sided Jacobi SVD (Hestenes). For an m×n matrix A with
// m ≥ n we orthogonalise the columns of W = A by plane
// rotations, accumulating the same rotations into V:
//
//   for every column pair (p, q):
//     α = ‖w_p‖²   β = ‖w_q‖²   γ = w_p·w_q
//     ζ = (β − α) / 2γ
//     t = sign(ζ) / (|ζ| + √(1 + ζ²))
//     c = 1 / √(1 + t²),  s = c·t
//     rotate columns p, q of W and V by (c, s)
//
// until no pair is further from orthogonal than the tolerance.
// Then σ_j = ‖w_j‖ and u_j = w_j / σ_j, so A = U Σ Vᵀ.
// Wide matrices are handled through their transpose.
//
// Rank policy for compression:
//   r = smallest k with Σ_{i<k} σ_i ≥ keep_ratio · Σ σ_i
//   r is rounded UP to a multiple of aligned_size,
//   then capped at the natural rank min(m, n).
//
// Reference: Demmel & Veselić (1992) Jacobi's method is more
//            accurate than QR
//            Golub & Van Loan §8.6

use crate::ml::matrix::Matrix;

const MAX_SWEEPS: usize = 60;
const TOLERANCE: f64 = 1e-12;

/// Thin SVD: `u` is m×k, `singular` has k entries, `v` is n×k,
/// with k = min(m, n) and singular values in descending order.
#[derive(Debug, Clone)]
pub struct Svd {
    pub u:        Matrix,
    pub singular: Vec<f64>,
    pub v:        Matrix,
}

pub fn decompose(a: &Matrix) -> Svd {
    if a.rows() < a.cols() {
        let t = decompose_tall(&a.transpose());
        return Svd { u: t.v, singular: t.singular, v: t.u };
    }
    decompose_tall(a)
}

fn decompose_tall(a: &Matrix) -> Svd {
    let (m, n) = a.shape();
    let mut w = a.clone();
    let mut v = Matrix::identity(n);

    for sweep in 0..MAX_SWEEPS {
        let mut rotated = false;

        for p in 0..n {
            for q in (p + 1)..n {
                let (mut alpha, mut beta, mut gamma) = (0.0, 0.0, 0.0);
                for i in 0..m {
                    let wp = w.get(i, p);
                    let wq = w.get(i, q);
                    alpha += wp * wp;
                    beta  += wq * wq;
                    gamma += wp * wq;
                }
                if gamma.abs() <= TOLERANCE * (alpha * beta).sqrt() || gamma == 0.0 {
                    continue;
                }
                rotated = true;

                let zeta = (beta - alpha) / (2.0 * gamma);
                let t = zeta.signum() / (zeta.abs() + (1.0 + zeta * zeta).sqrt());
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = c * t;

                rotate_columns(&mut w, p, q, c, s);
                rotate_columns(&mut v, p, q, c, s);
            }
        }

        if !rotated {
            tracing::trace!("Jacobi SVD converged after {} sweeps", sweep + 1);
            break;
        }
    }

    // Column norms are the singular values
    let mut order: Vec<(usize, f64)> = (0..n)
        .map(|j| (j, w.column(j).iter().map(|x| x * x).sum::<f64>().sqrt()))
        .collect();
    order.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut u = Matrix::zeros(m, n);
    let mut v_sorted = Matrix::zeros(n, n);
    let mut singular = Vec::with_capacity(n);

    for (dst, &(src, sigma)) in order.iter().enumerate() {
        singular.push(sigma);
        for i in 0..m {
            let value = if sigma > 0.0 { w.get(i, src) / sigma } else { 0.0 };
            u.set(i, dst, value);
        }
        for i in 0..n {
            v_sorted.set(i, dst, v.get(i, src));
        }
    }

    Svd { u, singular, v: v_sorted }
}

fn rotate_columns(m: &mut Matrix, p: usize, q: usize, c: f64, s: f64) {
    let cols = m.cols();
    let data = m.as_mut_slice();
    for row in data.chunks_mut(cols) {
        let xp = row[p];
        let xq = row[q];
        row[p] = c * xp - s * xq;
        row[q] = s * xp + c * xq;
    }
}

/// Number of singular values to keep under the energy criterion.
pub fn select_rank(singular: &[f64], keep_ratio: f64, aligned_size: usize) -> usize {
    let natural = singular.len();
    if natural == 0 {
        return 0;
    }

    let total: f64 = singular.iter().sum();
    let target = keep_ratio * total;

    let mut energy = 0.0;
    let mut rank = natural;
    for (i, sigma) in singular.iter().enumerate() {
        energy += sigma;
        if energy >= target {
            rank = i + 1;
            break;
        }
    }

    if aligned_size > 1 && rank % aligned_size != 0 {
        rank = (rank / aligned_size + 1) * aligned_size;
    }
    rank.min(natural)
}

/// Fraction of singular-value energy carried by the first `rank` values.
pub fn retained_energy(singular: &[f64], rank: usize) -> f64 {
    let total: f64 = singular.iter().sum();
    if total <= 0.0 {
        return 1.0;
    }
    singular.iter().take(rank).sum::<f64>() / total
}

/// A ≈ left · right with left: rows×rank and right: rank×cols.
#[derive(Debug, Clone)]
pub struct Factorization {
    pub left:            Matrix,
    pub right:           Matrix,
    pub rank:            usize,
    pub natural_rank:    usize,
    pub retained_energy: f64,
}

/// Split √σ evenly between both factors.
pub fn factorize(a: &Matrix, keep_ratio: f64, aligned_size: usize) -> Factorization {
    let svd = decompose(a);
    let rank = select_rank(&svd.singular, keep_ratio, aligned_size);

    let mut left = svd.u.leading_columns(rank);
    let mut right = svd.v.leading_columns(rank).transpose();

    for k in 0..rank {
        let root = svd.singular[k].sqrt();
        for i in 0..left.rows() {
            left.set(i, k, left.get(i, k) * root);
        }
        for j in 0..right.cols() {
            right.set(k, j, right.get(k, j) * root);
        }
    }

    Factorization {
        left,
        right,
        rank,
        natural_rank: svd.singular.len(),
        retained_energy: retained_energy(&svd.singular, rank),
    }
}
