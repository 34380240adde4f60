//! Integration tests for smile sections and SABR smile fitting.

use approx::assert_relative_eq;
use volcube_models::analytical::OptionType;
use volcube_models::calibration::{FitError, SabrFitConfig, SabrSmileFitter};
use volcube_models::models::SabrParams;
use volcube_models::smile::SmileSection;

const FORWARD: f64 = 0.032;
const EXPIRY: f64 = 5.0;

fn spreads() -> Vec<f64> {
    vec![-0.02, -0.01, -0.005, 0.0, 0.005, 0.01, 0.02]
}

fn sabr_quoted_smile(truth: &SabrParams) -> SmileSection {
    let strikes: Vec<f64> = spreads().iter().map(|s| FORWARD + s).collect();
    let std_devs = strikes
        .iter()
        .map(|&k| truth.implied_vol(k, FORWARD, EXPIRY).unwrap() * EXPIRY.sqrt())
        .collect();
    SmileSection::quoted(EXPIRY, FORWARD, strikes, std_devs).unwrap()
}

// ========================================
// Quoted Smile → SABR Smile
// ========================================

#[test]
fn test_quoted_smile_refits_to_sabr() {
    let truth = SabrParams::new(0.04, 0.5, 0.3, -0.35).unwrap();
    let quoted = sabr_quoted_smile(&truth);
    let SmileSection::Quoted(section) = &quoted else {
        panic!("expected a quoted smile");
    };

    let fitter = SabrSmileFitter::new(SabrFitConfig::default().with_fixed_beta(0.5));
    let fit = fitter.fit_section(section).unwrap();
    let sabr = SmileSection::sabr(EXPIRY, FORWARD, fit.params).unwrap();

    for &k in section.strikes() {
        assert_relative_eq!(
            sabr.volatility(k).unwrap(),
            quoted.volatility(k).unwrap(),
            epsilon = 1e-6
        );
    }
    // prices agree through the same Black formula
    let k = FORWARD + 0.005;
    assert_relative_eq!(
        sabr.option_price(k, OptionType::Call, 0.85).unwrap(),
        quoted.option_price(k, OptionType::Call, 0.85).unwrap(),
        max_relative = 1e-4
    );
}

#[test]
fn test_free_beta_fit_reaches_tolerance() {
    let truth = SabrParams::new(0.04, 0.5, 0.3, -0.35).unwrap();
    let quoted = sabr_quoted_smile(&truth);
    let SmileSection::Quoted(section) = &quoted else {
        panic!("expected a quoted smile");
    };
    let fit = SabrSmileFitter::new(SabrFitConfig::default())
        .fit_section(section)
        .unwrap();
    assert!(fit.rms_error <= 0.002);
    assert!(fit.params.validate().is_ok());
}

#[test]
fn test_fit_rejects_too_few_strikes() {
    let quoted = SmileSection::quoted(1.0, 0.03, vec![0.03, 0.04], vec![0.2, 0.19]).unwrap();
    let SmileSection::Quoted(section) = &quoted else {
        panic!("expected a quoted smile");
    };
    let err = SabrSmileFitter::new(SabrFitConfig::default().with_fixed_beta(0.5))
        .fit_section(section)
        .unwrap_err();
    assert_eq!(err, FitError::InsufficientStrikes { got: 2, need: 3 });
}

// ========================================
// Section Consistency
// ========================================

#[test]
fn test_put_call_parity_across_variants() {
    let truth = SabrParams::new(0.04, 0.5, 0.3, -0.35).unwrap();
    let sections = [
        sabr_quoted_smile(&truth),
        SmileSection::sabr(EXPIRY, FORWARD, truth).unwrap(),
        SmileSection::spread(EXPIRY, FORWARD, vec![0.02, 0.04], vec![0.5, 0.45]).unwrap(),
    ];
    for smile in &sections {
        for k in [0.02, 0.03, 0.045] {
            let call = smile.option_price(k, OptionType::Call, 0.9).unwrap();
            let put = smile.option_price(k, OptionType::Put, 0.9).unwrap();
            assert_relative_eq!(call - put, 0.9 * (FORWARD - k), epsilon = 1e-8);
        }
    }
}
