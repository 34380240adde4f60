//! Time-dependent forward-rate correlation.

use super::error::CoterminalError;
use super::evolution::EvolutionDescription;
use nalgebra::{DMatrix, SymmetricEigen};

/// Factor loadings of the forward rates at each evolution step.
///
/// `pseudo_root(step)` is `rates × factors`; rows of rates that reset before
/// `step` are zero and `Z·Zᵀ` is the instantaneous correlation of the alive
/// rates.
pub trait CorrelationStructure {
    /// Time grid the structure is defined on.
    fn evolution(&self) -> &EvolutionDescription;

    /// Number of driving factors.
    fn number_of_factors(&self) -> usize;

    /// Loadings at `step`.
    fn pseudo_root(&self, step: usize) -> &DMatrix<f64>;

    /// Number of forward rates.
    fn number_of_rates(&self) -> usize {
        self.evolution().number_of_rates()
    }

    /// Correlation of rates `i` and `j` during `step`.
    fn correlation(&self, step: usize, i: usize, j: usize) -> f64 {
        let root = self.pseudo_root(step);
        root.row(i).dot(&root.row(j))
    }
}

/// `ρ_ij = L + (1 − L)·exp(−β|t_i − t_j|)` over the rates alive in each
/// step, reduced to `factors` factors.
///
/// Each step keeps the largest eigenvalues of the alive block and rescales
/// every row of the loadings to unit length, so the diagonal of `Z·Zᵀ` stays
/// one after the rank reduction.
///
/// # Example
///
/// ```
/// use volcube_optimiser::market_model::{
///     CorrelationStructure, EvolutionDescription, ExponentialForwardCorrelation,
/// };
///
/// let evolution = EvolutionDescription::new(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let corr = ExponentialForwardCorrelation::new(evolution, 0.5, 0.2, 3).unwrap();
/// assert!((corr.correlation(0, 0, 0) - 1.0).abs() < 1e-12);
/// assert!((corr.correlation(0, 0, 1) - (0.5 + 0.5 * (-0.2_f64).exp())).abs() < 1e-12);
/// assert_eq!(corr.pseudo_root(2).row(0).norm(), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct ExponentialForwardCorrelation {
    evolution: EvolutionDescription,
    long_term_correlation: f64,
    beta: f64,
    factors: usize,
    pseudo_roots: Vec<DMatrix<f64>>,
}

impl ExponentialForwardCorrelation {
    /// Build the loadings for every step.
    ///
    /// # Errors
    ///
    /// `CoterminalError::InvalidInput` when `long_term_correlation` is
    /// outside `[0, 1]`, `beta` is negative, or `factors` is zero or more
    /// than the number of rates.
    pub fn new(
        evolution: EvolutionDescription,
        long_term_correlation: f64,
        beta: f64,
        factors: usize,
    ) -> Result<Self, CoterminalError> {
        if !(0.0..=1.0).contains(&long_term_correlation) {
            return Err(CoterminalError::InvalidInput(format!(
                "long-term correlation {long_term_correlation} outside [0, 1]"
            )));
        }
        if !(beta >= 0.0) {
            return Err(CoterminalError::InvalidInput(format!(
                "decay {beta} must be non-negative"
            )));
        }
        let n = evolution.number_of_rates();
        if factors == 0 || factors > n {
            return Err(CoterminalError::InvalidInput(format!(
                "{factors} factors for {n} rates"
            )));
        }

        let times = evolution.rate_times();
        let pseudo_roots = (0..evolution.number_of_steps())
            .map(|step| {
                let alive = evolution.first_alive_rate(step);
                let size = n - alive;
                let block = DMatrix::from_fn(size, size, |r, c| {
                    let dt = (times[alive + r] - times[alive + c]).abs();
                    long_term_correlation + (1.0 - long_term_correlation) * (-beta * dt).exp()
                });
                let reduced = rank_reduced_root(block, factors);
                let mut root = DMatrix::zeros(n, factors);
                root.view_mut((alive, 0), (size, factors)).copy_from(&reduced);
                root
            })
            .collect();

        Ok(Self {
            evolution,
            long_term_correlation,
            beta,
            factors,
            pseudo_roots,
        })
    }

    /// Asymptotic correlation `L`.
    pub fn long_term_correlation(&self) -> f64 {
        self.long_term_correlation
    }

    /// Decay rate `β`.
    pub fn beta(&self) -> f64 {
        self.beta
    }
}

impl CorrelationStructure for ExponentialForwardCorrelation {
    fn evolution(&self) -> &EvolutionDescription {
        &self.evolution
    }

    fn number_of_factors(&self) -> usize {
        self.factors
    }

    fn pseudo_root(&self, step: usize) -> &DMatrix<f64> {
        &self.pseudo_roots[step]
    }
}

/// `size × factors` loadings from the leading eigenpairs of `matrix`, rows
/// scaled to unit length. Columns beyond the block size stay zero.
fn rank_reduced_root(matrix: DMatrix<f64>, factors: usize) -> DMatrix<f64> {
    let size = matrix.nrows();
    let eigen = SymmetricEigen::new(matrix);
    let mut order: Vec<usize> = (0..size).collect();
    order.sort_by(|&x, &y| eigen.eigenvalues[y].total_cmp(&eigen.eigenvalues[x]));

    let mut root = DMatrix::zeros(size, factors);
    for (col, &k) in order.iter().take(factors).enumerate() {
        let scale = eigen.eigenvalues[k].max(0.0).sqrt();
        for r in 0..size {
            root[(r, col)] = eigen.eigenvectors[(r, k)] * scale;
        }
    }
    for mut row in root.row_iter_mut() {
        let norm = row.norm();
        if norm > 0.0 {
            row /= norm;
        }
    }
    root
}
