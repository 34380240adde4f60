//! Caplet-coterminal calibration of market-model pseudo-roots.
//!
//! Given the displaced variance each coterminal swap rate accumulates per
//! step, a correlation structure and a caplet volatility per rate, find
//! pseudo-roots that reprice the coterminal swaptions exactly and the
//! caplets as far as the recursion reaches.
//!
//! Rate `j`'s variance over step `k` is first tilted by `(1 + α_j·s_k)⁻²`
//! (`s_k` the step start) and renormalised to its original total, giving
//! the table `v[k][j]`. Rate `j` is then loaded with `a[j]·√v[k][j]` on the
//! steps before its reset and `b[j]·√v[j][j]` on its reset step. Each step
//! `i ≥ 1` solves a quadratic in `a[i]` so that caplet `i − 1` is matched,
//! then picks `b[i]` so the total variance of swap rate `i` is unchanged.

use super::correlation::CorrelationStructure;
use super::curve_state::CurveState;
use super::error::CoterminalError;
use super::variance::PiecewiseConstantVariance;
use nalgebra::DMatrix;
use tracing::{debug, error, info, warn};

/// Variance bookkeeping of a calibration run.
#[derive(Debug, Clone, PartialEq)]
pub struct VarianceDiagnostics {
    /// `v[k][j]`: tilted, renormalised variance of rate `j` over step `k`;
    /// zero for `j < k`.
    pub decayed_variances: Vec<Vec<f64>>,
    /// Total variance of each coterminal swap rate up to its reset.
    pub total_variances: Vec<f64>,
    /// `Σ_{k<i} v[k][i]`.
    pub almost_total_variances: Vec<f64>,
    /// `Σ_{k≤i−2} ρ_k(i−1, i)·√(v[k][i]·v[k][i−1])`; zero for `i < 2`.
    pub almost_total_covariances: Vec<f64>,
    /// `ρ_{i−1}(i−1, i)·√(v[i−1][i]·v[i−1][i−1])`; zero for `i = 0`.
    pub left_covariances: Vec<f64>,
}

/// Pseudo-roots and multipliers of a successful calibration.
#[derive(Debug, Clone, PartialEq)]
pub struct CoterminalSolution {
    /// One `rates × factors` matrix per step.
    pub pseudo_roots: Vec<DMatrix<f64>>,
    /// Multiplier of each rate before its reset step; `a[0]` is one.
    pub a: Vec<f64>,
    /// Multiplier of each rate on its reset step.
    pub b: Vec<f64>,
    /// Intermediate variances.
    pub diagnostics: VarianceDiagnostics,
}

impl CoterminalSolution {
    /// Variance of rate `rate` reconstructed from the multipliers.
    pub fn reconstructed_variance(&self, rate: usize) -> f64 {
        let v = &self.diagnostics.decayed_variances;
        (0..=rate)
            .map(|k| {
                let m = if k < rate { self.a[rate] } else { self.b[rate] };
                v[k][rate] * m * m
            })
            .sum()
    }
}

/// Outcome of [`caplet_coterminal_calibration`].
#[derive(Debug, Clone, PartialEq)]
pub enum CoterminalCalibration {
    /// Targets met.
    Calibrated(CoterminalSolution),
    /// Caplet and swaption targets are jointly unattainable.
    ///
    /// A negative `discriminant` means no real multiplier matches the
    /// caplet; a non-negative one means the matching multiplier leaves a
    /// negative residual variance for the resetting rate.
    Infeasible {
        /// Step at which the recursion failed.
        step: usize,
        /// Discriminant of the step's quadratic.
        discriminant: f64,
    },
}

impl CoterminalCalibration {
    /// Whether targets were met.
    pub fn is_calibrated(&self) -> bool {
        matches!(self, CoterminalCalibration::Calibrated(_))
    }

    /// The solution, if calibrated.
    pub fn solution(&self) -> Option<&CoterminalSolution> {
        match self {
            CoterminalCalibration::Calibrated(solution) => Some(solution),
            CoterminalCalibration::Infeasible { .. } => None,
        }
    }
}

/// Calibrate pseudo-roots to coterminal swaption variances and caplet
/// volatilities.
///
/// `displaced_swap_variances[j]` is the variance term structure of
/// coterminal swap rate `j` plus `displacements[j]`; `caplet_vols[j]` the
/// displaced Black volatility of forward `j` to its reset; `alpha[j]` the
/// time-tilt of rate `j`.
///
/// # Errors
///
/// * `CoterminalError::SizeMismatch` - an input not sized to the rates
/// * `CoterminalError::TimeMismatch` - variance or curve-state times differ
///   from the correlation's evolution
/// * `CoterminalError::InvalidInput` - a rate without variance on its reset
///   step, or a non-finite input
/// * `CoterminalError::NegativeRoot` - both multiplier roots negative
/// * `CoterminalError::DimensionMismatch` - a correlation pseudo-root of the
///   wrong shape
///
/// # Example
///
/// ```
/// use volcube_optimiser::market_model::{
///     caplet_coterminal_calibration, EvolutionDescription, ExponentialForwardCorrelation,
///     FlatVolatilityVariance, LmmCurveState,
/// };
///
/// let times = vec![1.0, 2.0, 3.0, 4.0];
/// let evolution = EvolutionDescription::new(times.clone()).unwrap();
/// let corr = ExponentialForwardCorrelation::new(evolution.clone(), 0.5, 0.2, 2).unwrap();
/// let state = LmmCurveState::new(times, vec![0.03, 0.03, 0.03]).unwrap();
/// let variances: Vec<_> = (0..3)
///     .map(|j| FlatVolatilityVariance::new(0.2, &evolution, j).unwrap())
///     .collect();
///
/// let result = caplet_coterminal_calibration(
///     &corr, &variances, &[0.3, 0.25, 0.25], &state, &[0.0; 3], &[0.0; 3],
/// )
/// .unwrap();
/// let solution = result.solution().unwrap();
/// assert_eq!(solution.pseudo_roots.len(), 3);
/// assert_eq!(solution.pseudo_roots[0].shape(), (3, 2));
/// ```
pub fn caplet_coterminal_calibration<C, V, S>(
    correlation: &C,
    displaced_swap_variances: &[V],
    caplet_vols: &[f64],
    curve_state: &S,
    displacements: &[f64],
    alpha: &[f64],
) -> Result<CoterminalCalibration, CoterminalError>
where
    C: CorrelationStructure + ?Sized,
    V: PiecewiseConstantVariance,
    S: CurveState + ?Sized,
{
    let evolution = correlation.evolution();
    let n = evolution.number_of_rates();
    let steps = evolution.number_of_steps();
    let factors = correlation.number_of_factors();

    check_len("displaced swap variances", displaced_swap_variances.len(), n)?;
    check_len("caplet volatilities", caplet_vols.len(), n)?;
    check_len("displacements", displacements.len(), n)?;
    check_len("alpha", alpha.len(), n)?;
    check_len("curve state rates", curve_state.number_of_rates(), n)?;
    check_len("evolution steps", steps, n)?;
    if curve_state.rate_times() != evolution.rate_times() {
        return Err(CoterminalError::TimeMismatch(
            "curve state rate times differ from the evolution".to_string(),
        ));
    }
    if evolution.evolution_times() != &evolution.rate_times()[..n] {
        return Err(CoterminalError::TimeMismatch(
            "evolution times must be the rate times without the last".to_string(),
        ));
    }
    for (j, var) in displaced_swap_variances.iter().enumerate() {
        if var.rate_times() != evolution.rate_times() {
            return Err(CoterminalError::TimeMismatch(format!(
                "variance {j} is on different rate times"
            )));
        }
        check_len("variance steps", var.variances().len(), steps)?;
        if !(var.variances()[j] > 0.0) {
            return Err(CoterminalError::InvalidInput(format!(
                "swap rate {j} has no variance on its reset step"
            )));
        }
        if j > 0 && !(var.variances()[..j].iter().sum::<f64>() > 0.0) {
            return Err(CoterminalError::InvalidInput(format!(
                "swap rate {j} has no variance before its reset step"
            )));
        }
    }
    if let Some(bad) = caplet_vols
        .iter()
        .chain(displacements)
        .chain(alpha)
        .find(|x| !x.is_finite())
    {
        return Err(CoterminalError::InvalidInput(format!("non-finite input {bad}")));
    }
    for step in 0..steps {
        let shape = correlation.pseudo_root(step).shape();
        if shape != (n, factors) {
            return Err(CoterminalError::DimensionMismatch {
                step,
                rows: n,
                cols: factors,
                got_rows: shape.0,
                got_cols: shape.1,
            });
        }
    }

    let diagnostics = variance_diagnostics(correlation, displaced_swap_variances, alpha);
    let v = &diagnostics.decayed_variances;

    let rate_times = curve_state.rate_times();
    let taus = curve_state.rate_taus();
    let swap_rates = curve_state.coterminal_swap_rates();
    let forwards = curve_state.forward_rates();

    let mut a = vec![1.0; n];
    let mut b = vec![0.0; n];
    b[0] = (diagnostics.total_variances[0] / v[0][0]).sqrt();

    for i in 1..n {
        let w_prev = curve_state.coterminal_swap_annuity(i, i - 1) / taus[i - 1];
        let w = curve_state.coterminal_swap_annuity(i, i) / taus[i - 1];
        let x = w_prev * (swap_rates[i - 1] + displacements[i - 1]);
        let y = w * (swap_rates[i] + displacements[i]);

        let caplet_forward = forwards[i - 1] + displacements[i - 1];
        let caplet_variance =
            caplet_forward * caplet_forward * caplet_vols[i - 1] * caplet_vols[i - 1] * rate_times[i - 1];

        let quadratic = y * y * diagnostics.almost_total_variances[i];
        let linear = -2.0
            * x
            * y
            * (a[i - 1] * diagnostics.almost_total_covariances[i]
                + b[i - 1] * diagnostics.left_covariances[i]);
        let constant = x * x * diagnostics.total_variances[i - 1] - caplet_variance;

        let discriminant = linear * linear - 4.0 * quadratic * constant;
        if discriminant < 0.0 {
            warn!(step = i, discriminant, "caplet-coterminal targets infeasible");
            return Ok(CoterminalCalibration::Infeasible { step: i, discriminant });
        }

        let sqrt_disc = discriminant.sqrt();
        let lower = (-linear - sqrt_disc) / (2.0 * quadratic);
        let root = if lower >= 0.0 {
            lower
        } else {
            let upper = (-linear + sqrt_disc) / (2.0 * quadratic);
            if !(upper >= 0.0) {
                error!(step = i, lower, upper, "both multiplier roots negative");
                return Err(CoterminalError::NegativeRoot { step: i });
            }
            upper
        };

        let residual = diagnostics.total_variances[i] - root * root * diagnostics.almost_total_variances[i];
        if residual < 0.0 {
            warn!(step = i, residual, "no variance left for the resetting rate");
            return Ok(CoterminalCalibration::Infeasible { step: i, discriminant });
        }
        a[i] = root;
        b[i] = (residual / v[i][i]).sqrt();
        debug!(step = i, a = a[i], b = b[i], "coterminal step solved");
    }

    let pseudo_roots = (0..steps)
        .map(|k| {
            let raw = correlation.pseudo_root(k);
            let mut root = DMatrix::zeros(n, factors);
            for j in k..n {
                let multiplier = if k < j { a[j] } else { b[j] };
                let scale = v[k][j].sqrt() * multiplier;
                root.set_row(j, &(raw.row(j) * scale));
            }
            root
        })
        .collect();

    info!(rates = n, factors, "caplet-coterminal calibration done");
    Ok(CoterminalCalibration::Calibrated(CoterminalSolution {
        pseudo_roots,
        a,
        b,
        diagnostics,
    }))
}

fn check_len(what: &'static str, got: usize, expected: usize) -> Result<(), CoterminalError> {
    if got != expected {
        return Err(CoterminalError::SizeMismatch { what, expected, got });
    }
    Ok(())
}

fn variance_diagnostics<C, V>(correlation: &C, variances: &[V], alpha: &[f64]) -> VarianceDiagnostics
where
    C: CorrelationStructure + ?Sized,
    V: PiecewiseConstantVariance,
{
    let evolution = correlation.evolution();
    let n = variances.len();

    let mut v = vec![vec![0.0; n]; n];
    let mut total_variances = vec![0.0; n];
    for (j, var) in variances.iter().enumerate() {
        let original = &var.variances()[..=j];
        let original_total: f64 = original.iter().sum();
        let mut tilted_total = 0.0;
        for (k, &vk) in original.iter().enumerate() {
            let decay = 1.0 + alpha[j] * evolution.step_start(k);
            v[k][j] = vk / (decay * decay);
            tilted_total += v[k][j];
        }
        if tilted_total > 0.0 {
            let scale = original_total / tilted_total;
            for row in v.iter_mut().take(j + 1) {
                row[j] *= scale;
            }
        }
        total_variances[j] = original_total;
    }

    let almost_total_variances = (0..n).map(|i| (0..i).map(|k| v[k][i]).sum::<f64>()).collect();
    let almost_total_covariances = (0..n)
        .map(|i| {
            if i < 2 {
                return 0.0;
            }
            (0..=i - 2)
                .map(|k| correlation.correlation(k, i - 1, i) * (v[k][i] * v[k][i - 1]).sqrt())
                .sum()
        })
        .collect();
    let left_covariances = (0..n)
        .map(|i| {
            if i == 0 {
                return 0.0;
            }
            correlation.correlation(i - 1, i - 1, i) * (v[i - 1][i] * v[i - 1][i - 1]).sqrt()
        })
        .collect();

    VarianceDiagnostics {
        decayed_variances: v,
        total_variances,
        almost_total_variances,
        almost_total_covariances,
        left_covariances,
    }
}

/// Covariance of the rates over steps `0..=last_step`, `Σ Z_k·Z_kᵀ`.
pub fn covariance_from_pseudo_roots(pseudo_roots: &[DMatrix<f64>], last_step: usize) -> Option<DMatrix<f64>> {
    let first = pseudo_roots.first()?;
    let n = first.nrows();
    Some(
        pseudo_roots
            .iter()
            .take(last_step + 1)
            .fold(DMatrix::zeros(n, n), |acc, z| acc + z * z.transpose()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_model::{EvolutionDescription, ExponentialForwardCorrelation, FlatVolatilityVariance, LmmCurveState};
    use approx::assert_relative_eq;

    fn setup(n: usize, factors: usize) -> (ExponentialForwardCorrelation, Vec<FlatVolatilityVariance>, LmmCurveState) {
        let times: Vec<f64> = (1..=n + 1).map(|i| i as f64).collect();
        let evolution = EvolutionDescription::new(times.clone()).unwrap();
        let corr = ExponentialForwardCorrelation::new(evolution.clone(), 0.4, 0.1, factors).unwrap();
        let variances = (0..n)
            .map(|j| FlatVolatilityVariance::new(0.2, &evolution, j).unwrap())
            .collect();
        let state = LmmCurveState::new(times, vec![0.03; n]).unwrap();
        (corr, variances, state)
    }

    /// Caplet vols implied by unit multipliers.
    fn consistent_caplet_vols(
        corr: &ExponentialForwardCorrelation,
        variances: &[FlatVolatilityVariance],
        state: &LmmCurveState,
        alpha: &[f64],
    ) -> Vec<f64> {
        let d = variance_diagnostics(corr, variances, alpha);
        let n = variances.len();
        let taus = state.rate_taus();
        let rates = state.coterminal_swap_rates();
        let mut vols = vec![0.2; n];
        for i in 1..n {
            let x = state.coterminal_swap_annuity(i, i - 1) / taus[i - 1] * rates[i - 1];
            let y = state.coterminal_swap_annuity(i, i) / taus[i - 1] * rates[i];
            let var = x * x * d.total_variances[i - 1]
                - 2.0 * x * y * (d.almost_total_covariances[i] + d.left_covariances[i])
                + y * y * d.almost_total_variances[i];
            let f = state.forward_rates()[i - 1];
            vols[i - 1] = (var / (f * f * state.rate_times()[i - 1])).sqrt();
        }
        vols
    }

    #[test]
    fn test_variance_conservation() {
        let (corr, variances, state) = setup(5, 3);
        let vols = consistent_caplet_vols(&corr, &variances, &state, &[0.1; 5]);
        let result =
            caplet_coterminal_calibration(&corr, &variances, &vols, &state, &[0.0; 5], &[0.1; 5])
                .unwrap();
        let solution = result.solution().unwrap();
        for i in 0..5 {
            assert_relative_eq!(
                solution.reconstructed_variance(i),
                solution.diagnostics.total_variances[i],
                epsilon = 1e-12
            );
        }
        let cov = covariance_from_pseudo_roots(&solution.pseudo_roots, 4).unwrap();
        for i in 0..5 {
            assert_relative_eq!(cov[(i, i)], solution.diagnostics.total_variances[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rows_of_reset_rates_are_zero() {
        let (corr, variances, state) = setup(4, 2);
        let vols = consistent_caplet_vols(&corr, &variances, &state, &[0.0; 4]);
        let result =
            caplet_coterminal_calibration(&corr, &variances, &vols, &state, &[0.0; 4], &[0.0; 4])
                .unwrap();
        let solution = result.solution().unwrap();
        for (k, root) in solution.pseudo_roots.iter().enumerate() {
            assert_eq!(root.shape(), (4, 2));
            for j in 0..k {
                assert_eq!(root.row(j).norm(), 0.0);
            }
        }
    }

    #[test]
    fn test_recovers_unit_multipliers() {
        let (corr, variances, state) = setup(4, 2);
        let vols = consistent_caplet_vols(&corr, &variances, &state, &[0.0; 4]);
        let result =
            caplet_coterminal_calibration(&corr, &variances, &vols, &state, &[0.0; 4], &[0.0; 4])
                .unwrap();
        let solution = result.solution().unwrap();
        for i in 0..4 {
            assert_relative_eq!(solution.a[i], 1.0, epsilon = 1e-8);
            assert_relative_eq!(solution.b[i], 1.0, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_unattainable_caplet_is_infeasible() {
        let (corr, variances, state) = setup(4, 2);
        let result =
            caplet_coterminal_calibration(&corr, &variances, &[0.01; 4], &state, &[0.0; 4], &[0.0; 4])
                .unwrap();
        assert!(matches!(
            result,
            CoterminalCalibration::Infeasible { step: 1, discriminant } if discriminant < 0.0
        ));
        assert!(result.solution().is_none());
    }

    /// One factor, neighbouring rates perfectly anti-correlated.
    struct Alternating {
        evolution: EvolutionDescription,
        roots: Vec<DMatrix<f64>>,
    }

    impl Alternating {
        fn new(evolution: EvolutionDescription) -> Self {
            let n = evolution.number_of_rates();
            let roots = (0..evolution.number_of_steps())
                .map(|k| {
                    DMatrix::from_fn(n, 1, |j, _| match j {
                        j if j < k => 0.0,
                        j if j % 2 == 0 => 1.0,
                        _ => -1.0,
                    })
                })
                .collect();
            Self { evolution, roots }
        }
    }

    impl CorrelationStructure for Alternating {
        fn evolution(&self) -> &EvolutionDescription {
            &self.evolution
        }

        fn number_of_factors(&self) -> usize {
            1
        }

        fn pseudo_root(&self, step: usize) -> &DMatrix<f64> {
            &self.roots[step]
        }
    }

    #[test]
    fn test_anti_correlated_rates_give_negative_roots() {
        let (corr, variances, state) = setup(3, 1);
        let alternating = Alternating::new(corr.evolution().clone());
        assert_eq!(alternating.correlation(0, 0, 1), -1.0);

        // below the swaption variance the caplet forces both roots negative
        let result =
            caplet_coterminal_calibration(&alternating, &variances, &[0.1; 3], &state, &[0.0; 3], &[0.0; 3]);
        assert!(matches!(result, Err(CoterminalError::NegativeRoot { step: 1 })));
    }

    #[test]
    fn test_single_step_skips_recursion() {
        let (corr, variances, state) = setup(1, 1);
        let result =
            caplet_coterminal_calibration(&corr, &variances, &[0.2], &state, &[0.0], &[0.0]).unwrap();
        let solution = result.solution().unwrap();
        assert_eq!(solution.pseudo_roots.len(), 1);
        assert_eq!(solution.pseudo_roots[0].shape(), (1, 1));
        assert_relative_eq!(solution.b[0], 1.0, epsilon = 1e-15);
        assert_relative_eq!(solution.pseudo_roots[0][(0, 0)].abs(), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_size_checks() {
        let (corr, variances, state) = setup(3, 2);
        assert!(matches!(
            caplet_coterminal_calibration(&corr, &variances, &[0.2; 2], &state, &[0.0; 3], &[0.0; 3]),
            Err(CoterminalError::SizeMismatch { what: "caplet volatilities", expected: 3, got: 2 })
        ));
        let other_state = LmmCurveState::new(vec![1.0, 2.0, 3.0, 4.5], vec![0.03; 3]).unwrap();
        assert!(matches!(
            caplet_coterminal_calibration(&corr, &variances, &[0.2; 3], &other_state, &[0.0; 3], &[0.0; 3]),
            Err(CoterminalError::TimeMismatch(_))
        ));
    }

    #[test]
    fn test_alpha_tilt_preserves_totals() {
        let (corr, variances, _) = setup(4, 2);
        let diagnostics = variance_diagnostics(&corr, &variances, &[0.5; 4]);
        for j in 0..4 {
            let total: f64 = (0..=j).map(|k| diagnostics.decayed_variances[k][j]).sum();
            assert_relative_eq!(total, diagnostics.total_variances[j], epsilon = 1e-15);
        }
        // later steps lose weight under a positive tilt
        assert!(diagnostics.decayed_variances[3][3] < diagnostics.decayed_variances[0][3]);
    }
}
