//! Coterminal command implementation
//!
//! Calibrates market-model pseudo-roots to coterminal swaption variances
//! and caplet volatilities read from a TOML file.

use serde::Serialize;
use tracing::{info, warn};
use volcube_optimiser::market_model::{
    caplet_coterminal_calibration, AbcdVariance, CoterminalCalibration, EvolutionDescription,
    ExponentialForwardCorrelation, FlatVolatilityVariance, LmmCurveState,
    PiecewiseConstantVariance,
};

use super::input::{self, CoterminalInput, VarianceInput};
use crate::config::OutputFormat;
use crate::{CliError, Result};

/// Output of the coterminal command.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CoterminalReport {
    /// Pseudo-roots found.
    Calibrated {
        a: Vec<f64>,
        b: Vec<f64>,
        total_variances: Vec<f64>,
        /// `pseudo_roots[k][i][f]`: loading of rate `i` on factor `f` over step `k`.
        pseudo_roots: Vec<Vec<Vec<f64>>>,
    },
    /// Caplet targets inconsistent with the swaption variances.
    Infeasible { step: usize, discriminant: f64 },
}

/// Run the coterminal command.
pub fn run(path: &str, format: OutputFormat) -> Result<()> {
    info!("Starting coterminal calibration...");
    info!("  Market data: {}", path);

    let market: CoterminalInput = input::load(path)?;
    let report = calibrate(&market)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => print_table(&report),
    }

    info!("Coterminal calibration complete");
    Ok(())
}

/// Build the market model described by `market` and calibrate it.
pub fn calibrate(market: &CoterminalInput) -> Result<CoterminalReport> {
    let evolution = EvolutionDescription::new(market.rate_times.clone())?;
    let correlation = ExponentialForwardCorrelation::new(
        evolution.clone(),
        market.correlation.long_term,
        market.correlation.beta,
        market.correlation.factors,
    )?;
    let state = LmmCurveState::new(market.rate_times.clone(), market.forward_rates.clone())?;
    let variances = swap_variances(&market.variance, &evolution)?;

    let outcome = caplet_coterminal_calibration(
        &correlation,
        &variances,
        &market.caplet_vols,
        &state,
        &market.displacements(),
        &market.alpha(),
    )?;

    Ok(match outcome {
        CoterminalCalibration::Calibrated(solution) => CoterminalReport::Calibrated {
            pseudo_roots: solution
                .pseudo_roots
                .iter()
                .map(|root| {
                    root.row_iter()
                        .map(|row| row.iter().copied().collect::<Vec<f64>>())
                        .collect::<Vec<_>>()
                })
                .collect(),
            total_variances: solution.diagnostics.total_variances,
            a: solution.a,
            b: solution.b,
        },
        CoterminalCalibration::Infeasible { step, discriminant } => {
            warn!(step, discriminant, "caplet targets are infeasible");
            CoterminalReport::Infeasible { step, discriminant }
        }
    })
}

fn swap_variances(
    variance: &VarianceInput,
    evolution: &EvolutionDescription,
) -> Result<Vec<Box<dyn PiecewiseConstantVariance>>> {
    let n = evolution.number_of_rates();
    match variance {
        VarianceInput::Flat { vols } => {
            if vols.len() != n {
                return Err(CliError::InvalidArgument(format!(
                    "expected {n} flat swaption vols, got {}",
                    vols.len()
                )));
            }
            vols.iter()
                .enumerate()
                .map(|(j, vol)| -> Result<Box<dyn PiecewiseConstantVariance>> {
                    Ok(Box::new(FlatVolatilityVariance::new(*vol, evolution, j)?))
                })
                .collect()
        }
        VarianceInput::Abcd { abcd } => (0..n)
            .map(|j| -> Result<Box<dyn PiecewiseConstantVariance>> {
                Ok(Box::new(AbcdVariance::new(*abcd, evolution, j)?))
            })
            .collect(),
    }
}

fn print_table(report: &CoterminalReport) {
    match report {
        CoterminalReport::Calibrated {
            a,
            b,
            total_variances,
            pseudo_roots,
        } => {
            println!("\nCoterminal calibration: calibrated");
            println!("{:<6} {:>12} {:>10} {:>10}", "Rate", "Variance", "a", "b");
            for (i, ((v, a), b)) in total_variances.iter().zip(a).zip(b).enumerate() {
                println!("{:<6} {:>12.6} {:>10.6} {:>10.6}", i, v, a, b);
            }
            for (k, root) in pseudo_roots.iter().enumerate() {
                println!("\nStep {k}");
                for (i, row) in root.iter().enumerate() {
                    let loadings: String = row.iter().map(|x| format!("{:>11.6}", x)).collect();
                    println!("{:<6}{}", i, loadings);
                }
            }
        }
        CoterminalReport::Infeasible { step, discriminant } => {
            println!("\nCoterminal calibration: infeasible at step {step}");
            println!("discriminant {discriminant:.6e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market(caplet_vols: &str) -> CoterminalInput {
        toml::from_str(&format!(
            r#"
            rate_times = [1.0, 2.0, 3.0, 4.0]
            forward_rates = [0.03, 0.03, 0.03]
            caplet_vols = {caplet_vols}

            [correlation]
            long_term = 0.5
            beta = 0.2
            factors = 2

            [variance]
            kind = "flat"
            vols = [0.2, 0.2, 0.2]
            "#
        ))
        .unwrap()
    }

    #[test]
    fn test_infeasible_targets_reported() {
        let report = calibrate(&market("[0.02, 0.02, 0.02]")).unwrap();
        assert!(matches!(report, CoterminalReport::Infeasible { step: 1, .. }));
    }

    #[test]
    fn test_calibrated_report_shapes() {
        let report = calibrate(&market("[0.3, 0.25, 0.25]")).unwrap();
        match report {
            CoterminalReport::Calibrated { pseudo_roots, b, .. } => {
                assert_eq!(pseudo_roots.len(), 3);
                assert_eq!(pseudo_roots[0].len(), 3);
                assert_eq!(pseudo_roots[0][0].len(), 2);
                assert_eq!(b.len(), 3);
            }
            other => panic!("Expected calibration, got {other:?}"),
        }
    }

    #[test]
    fn test_flat_vol_count_checked() {
        let mut input = market("[0.3, 0.25, 0.25]");
        input.variance = VarianceInput::Flat { vols: vec![0.2] };
        assert!(matches!(calibrate(&input), Err(CliError::InvalidArgument(_))));
    }

    #[test]
    fn test_displacement_size_checked() {
        let mut input = market("[0.3, 0.25, 0.25]");
        input.displacements = Some(vec![0.0]);
        assert!(matches!(calibrate(&input), Err(CliError::Coterminal(_))));
    }
}
