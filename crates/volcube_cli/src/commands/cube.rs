//! Cube command implementation
//!
//! Loads ATM vols and vol-spread quotes from a TOML market file, builds a
//! SABR or additive-spread cube and reports smiles at the query points.

use serde::Serialize;
use tracing::{debug, info};
use volcube_models::smile::SmileSection;
use volcube_optimiser::cube::{CubeConfig, SabrVolCube, SpreadVolCube};

use super::input::{self, CubeInput};
use crate::config::OutputFormat;
use crate::{CliError, Result};

/// Smile construction used by the cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CubeModel {
    /// SABR fit per quoted node, parameters interpolated.
    Sabr,
    /// ATM vol plus interpolated vol spreads.
    Spread,
}

/// SABR fit quality at one quoted node.
#[derive(Debug, Clone, Serialize)]
pub struct NodeFit {
    /// `"{option}x{swap}"`
    pub node: String,
    pub alpha: f64,
    pub beta: f64,
    pub nu: f64,
    pub rho: f64,
    pub rms_error: f64,
    pub max_error: f64,
    pub iterations: usize,
}

/// Smile at a query point.
#[derive(Debug, Clone, Serialize)]
pub struct SmileReport {
    /// `"{option}x{swap}"`
    pub point: String,
    pub option_time: f64,
    pub swap_length: f64,
    pub forward: f64,
    /// `(strike, volatility)` at each quoted strike spread.
    pub vols: Vec<(f64, f64)>,
}

/// Output of the cube command.
#[derive(Debug, Clone, Serialize)]
pub struct CubeReport {
    pub model: String,
    /// Empty for the spread model.
    pub fits: Vec<NodeFit>,
    pub smiles: Vec<SmileReport>,
}

/// Run the cube command.
pub fn run(path: &str, model: CubeModel, config: CubeConfig, format: OutputFormat) -> Result<()> {
    info!("Building volatility cube...");
    info!("  Market data: {}", path);
    info!("  Model: {:?}", model);

    let market: CubeInput = input::load(path)?;
    let report = build_report(&market, model, config)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => print_table(&report, &market.smile.strike_spreads),
    }

    info!("Cube complete");
    Ok(())
}

/// Calibrate the cube described by `market` and evaluate the query smiles.
pub fn build_report(market: &CubeInput, model: CubeModel, config: CubeConfig) -> Result<CubeReport> {
    let atm = market.atm_matrix()?;
    let swap_rates = market.swap_rates()?;
    let quotes = market.quotes()?;
    let points = market.query_points()?;
    let spreads = market.smile.strike_spreads.clone();

    match model {
        CubeModel::Sabr => {
            let mut cube = SabrVolCube::new(atm, swap_rates, quotes, config)?;
            let calibrated = cube.ensure_fresh()?;
            let labels = node_labels(market);
            let fits = calibrated
                .sparse_fits()
                .iter()
                .zip(labels)
                .map(|(fit, node)| NodeFit {
                    node,
                    alpha: fit.params.alpha,
                    beta: fit.params.beta,
                    nu: fit.params.nu,
                    rho: fit.params.rho,
                    rms_error: fit.rms_error,
                    max_error: fit.max_error,
                    iterations: fit.iterations,
                })
                .collect();
            let smiles = points
                .into_iter()
                .map(|(point, t, l)| -> Result<SmileReport> {
                    let smile = cube.smile_section(t, l)?;
                    smile_report(point, t, l, &smile, &spreads)
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(CubeReport {
                model: "sabr".to_string(),
                fits,
                smiles,
            })
        }
        CubeModel::Spread => {
            let mut cube = SpreadVolCube::new(atm, swap_rates, quotes);
            let smiles = points
                .into_iter()
                .map(|(point, t, l)| -> Result<SmileReport> {
                    let smile = cube.smile_section(t, l)?;
                    smile_report(point, t, l, &smile, &spreads)
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(CubeReport {
                model: "spread".to_string(),
                fits: Vec::new(),
                smiles,
            })
        }
    }
}

fn node_labels(market: &CubeInput) -> Vec<String> {
    market
        .smile
        .option_tenors
        .iter()
        .flat_map(|o| market.smile.swap_tenors.iter().map(move |s| format!("{o}x{s}")))
        .collect()
}

fn smile_report(
    point: String,
    option_time: f64,
    swap_length: f64,
    smile: &SmileSection,
    spreads: &[f64],
) -> Result<SmileReport> {
    let forward = smile.atm_level();
    let vols = spreads
        .iter()
        .map(|s| forward + s)
        .filter(|k| *k > 0.0)
        .map(|k| -> Result<(f64, f64)> { Ok((k, smile.volatility(k)?)) })
        .collect::<Result<Vec<_>>>()?;
    if vols.is_empty() {
        return Err(CliError::InvalidArgument(format!(
            "no positive strike at {point}"
        )));
    }
    debug!(point = %point, forward, strikes = vols.len(), "smile evaluated");
    Ok(SmileReport {
        point,
        option_time,
        swap_length,
        forward,
        vols,
    })
}

fn print_table(report: &CubeReport, spreads: &[f64]) {
    if !report.fits.is_empty() {
        println!("\nSABR fits");
        println!(
            "{:<10} {:>9} {:>6} {:>8} {:>8} {:>10} {:>10}",
            "Node", "Alpha", "Beta", "Nu", "Rho", "RMS", "Max"
        );
        for fit in &report.fits {
            println!(
                "{:<10} {:>9.5} {:>6.3} {:>8.4} {:>8.4} {:>10.2e} {:>10.2e}",
                fit.node, fit.alpha, fit.beta, fit.nu, fit.rho, fit.rms_error, fit.max_error
            );
        }
    }

    println!("\nSmiles ({} model)", report.model);
    let header: String = spreads
        .iter()
        .map(|s| format!("{:>9}", format!("{:+.0}bp", s * 1e4)))
        .collect();
    println!("{:<10} {:>9}{}", "Point", "Forward", header);
    for smile in &report.smiles {
        let row: String = smile
            .vols
            .iter()
            .map(|(_, v)| format!("{:>9.4}", v))
            .collect();
        println!("{:<10} {:>9.5}{}", smile.point, smile.forward, row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const MARKET: &str = r#"
        reference_date = "2024-01-15"
        flat_rate = 0.03

        [atm]
        option_tenors = ["1Y", "5Y"]
        swap_tenors = ["1Y", "10Y"]
        vols = [[0.25, 0.22], [0.20, 0.18]]

        [smile]
        option_tenors = ["1Y", "5Y"]
        swap_tenors = ["1Y", "10Y"]
        strike_spreads = [-0.01, 0.0, 0.01]
        spreads = [
            [0.02, 0.0, -0.005],
            [0.02, 0.0, -0.005],
            [0.015, 0.0, -0.004],
            [0.015, 0.0, -0.004],
        ]

        [[queries]]
        option_tenor = "1Y"
        swap_tenor = "1Y"

        [[queries]]
        option_tenor = "3Y"
        swap_tenor = "5Y"
    "#;

    fn market() -> CubeInput {
        toml::from_str(MARKET).unwrap()
    }

    #[test]
    fn test_spread_model_reproduces_quoted_node() {
        let report = build_report(&market(), CubeModel::Spread, CubeConfig::default()).unwrap();
        assert!(report.fits.is_empty());
        assert_eq!(report.smiles.len(), 2);

        let node = &report.smiles[0];
        assert_eq!(node.point, "1Yx1Y");
        let vols: Vec<f64> = node.vols.iter().map(|(_, v)| *v).collect();
        assert_relative_eq!(vols[0], 0.27, epsilon = 1e-12);
        assert_relative_eq!(vols[1], 0.25, epsilon = 1e-12);
        assert_relative_eq!(vols[2], 0.245, epsilon = 1e-12);
        assert_relative_eq!(node.vols[1].0, node.forward, epsilon = 1e-15);
    }

    #[test]
    fn test_sabr_model_reports_every_node() {
        let config = CubeConfig::default()
            .with_fixed_beta(0.5)
            .with_max_error_tolerance(0.01);
        let report = build_report(&market(), CubeModel::Sabr, config).unwrap();

        let nodes: Vec<&str> = report.fits.iter().map(|f| f.node.as_str()).collect();
        assert_eq!(nodes, vec!["1Yx1Y", "1Yx10Y", "5Yx1Y", "5Yx10Y"]);
        for fit in &report.fits {
            assert_eq!(fit.beta, 0.5);
            assert!(fit.rms_error <= 0.01);
        }
        // ATM recalibration pins the quoted ATM vol
        let node = &report.smiles[0];
        assert_relative_eq!(node.vols[1].1, 0.25, epsilon = 1e-10);
    }

    #[test]
    fn test_report_serialises() {
        let report = build_report(&market(), CubeModel::Spread, CubeConfig::default()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["model"], "spread");
        assert_eq!(json["smiles"][1]["point"], "3Yx5Y");
    }
}
