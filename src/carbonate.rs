//! # Carbonate Chemistry
//!
//! Seawater carbonate-system equilibrium from total alkalinity and dissolved
//! inorganic carbon, reporting pH (total scale), carbonate ion concentration
//! and the aragonite saturation state Ω_ar.
//!
//! ## Constants
//! | Quantity | Source |
//! |----------|--------|
//! | K1, K2 (carbonic acid) | Lueker et al. (2000), total scale |
//! | KB (boric acid) | Dickson (1990), total scale |
//! | KW (water) | Millero (1995) |
//! | KS (bisulfate) | Dickson (1990), free scale |
//! | Total borate | Uppström (1974) |
//! | Total sulfate, calcium | Morris & Riley (1966), Riley & Tongudai (1967) |
//! | Ksp aragonite | Mucci (1983) |
//!
//! Surface pressure (0 dbar) is assumed; phosphate, silicate and fluoride
//! contributions to alkalinity are neglected.

use serde::Serialize;
use thiserror::Error;

const KELVIN: f64 = 273.15;
const MICRO: f64 = 1e-6;
const BISECTION_STEPS: usize = 200;

#[derive(Error, Debug, PartialEq)]
pub enum CarbonateError {
    #[error("invalid {name}: {value}")]
    InvalidInput { name: &'static str, value: f64 },

    #[error("alkalinity balance has no root between pH {lo} and {hi}")]
    NoConvergence { lo: f64, hi: f64 },
}

/// Measured seawater properties.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CarbonateInput {
    /// Total alkalinity (µmol/kg)
    pub alkalinity_umol_kg: f64,
    /// Dissolved inorganic carbon (µmol/kg)
    pub dic_umol_kg: f64,
    /// Temperature (°C)
    pub temperature_c: f64,
    /// Practical salinity
    pub salinity: f64,
}

impl Default for CarbonateInput {
    fn default() -> Self {
        Self {
            alkalinity_umol_kg: 2300.0,
            dic_umol_kg: 2000.0,
            temperature_c: 20.0,
            salinity: 35.0,
        }
    }
}

/// Solved carbonate system.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CarbonateState {
    pub ph_total: f64,
    /// Carbonate ion (µmol/kg)
    pub co3_umol_kg: f64,
    /// Bicarbonate ion (µmol/kg)
    pub hco3_umol_kg: f64,
    /// Dissolved CO2 (µmol/kg)
    pub co2_umol_kg: f64,
    pub omega_aragonite: f64,
}

/// Equilibrium constants and total concentrations at one T/S, in mol/kg.
#[derive(Clone, Copy, Debug)]
struct Constants {
    k1: f64,
    k2: f64,
    kb: f64,
    kw: f64,
    ks: f64,
    total_borate: f64,
    total_sulfate: f64,
    calcium: f64,
    ksp_aragonite: f64,
}

impl Constants {
    fn at(temperature_c: f64, salinity: f64) -> Self {
        let t = temperature_c + KELVIN;
        let ln_t = t.ln();
        let s = salinity;
        let sqrt_s = s.sqrt();

        let pk1 = 3633.86 / t - 61.2172 + 9.6777 * ln_t - 0.011555 * s + 0.0001152 * s * s;
        let pk2 = 471.78 / t + 25.9290 - 3.16967 * ln_t - 0.01781 * s + 0.0001122 * s * s;

        let ln_kb = (-8966.90 - 2890.53 * sqrt_s - 77.942 * s + 1.728 * s * sqrt_s
            - 0.0996 * s * s)
            / t
            + (148.0248 + 137.1942 * sqrt_s + 1.62142 * s)
            + (-24.4344 - 25.085 * sqrt_s - 0.2474 * s) * ln_t
            + 0.053105 * sqrt_s * t;

        let ln_kw = 148.9802 - 13847.26 / t - 23.6521 * ln_t
            + (-5.977 + 118.67 / t + 1.0495 * ln_t) * sqrt_s
            - 0.01615 * s;

        let ionic = 19.924 * s / (1000.0 - 1.005 * s);
        let ln_ks = -4276.1 / t + 141.328 - 23.093 * ln_t
            + (-13856.0 / t + 324.57 - 47.986 * ln_t) * ionic.sqrt()
            + (35474.0 / t - 771.54 + 114.723 * ln_t) * ionic
            - 2698.0 / t * ionic.powf(1.5)
            + 1776.0 / t * ionic * ionic
            + (1.0 - 0.001005 * s).ln();

        let log_ksp_ar = -171.945 - 0.077993 * t + 2903.293 / t + 71.595 * t.log10()
            + (-0.068393 + 0.0017276 * t + 88.135 / t) * sqrt_s
            - 0.10018 * s
            + 0.0059415 * s * sqrt_s;

        Constants {
            k1: 10f64.powf(-pk1),
            k2: 10f64.powf(-pk2),
            kb: ln_kb.exp(),
            kw: ln_kw.exp(),
            ks: ln_ks.exp(),
            total_borate: 0.0004157 * s / 35.0,
            total_sulfate: (0.14 / 96.062) * (s / 1.80655),
            calcium: (0.02128 / 40.087) * (s / 1.80655),
            ksp_aragonite: 10f64.powf(log_ksp_ar),
        }
    }

    /// Alkalinity implied by `dic` at total-scale hydrogen ion `h`.
    fn alkalinity(&self, dic: f64, h: f64) -> f64 {
        let denom = h * h + self.k1 * h + self.k1 * self.k2;
        let hco3 = dic * self.k1 * h / denom;
        let co3 = dic * self.k1 * self.k2 / denom;
        let borate = self.total_borate * self.kb / (self.kb + h);
        let hydroxide = self.kw / h;
        let h_free = h / (1.0 + self.total_sulfate / self.ks);
        let bisulfate = self.total_sulfate / (1.0 + self.ks / h_free);
        hco3 + 2.0 * co3 + borate + hydroxide - h_free - bisulfate
    }
}

fn check_range(name: &'static str, value: f64, lo: f64, hi: f64) -> Result<(), CarbonateError> {
    if value.is_finite() && value >= lo && value <= hi {
        Ok(())
    } else {
        Err(CarbonateError::InvalidInput { name, value })
    }
}

/// Solve the carbonate system for `input`.
///
/// pH is found by bisection on the alkalinity balance, which decreases
/// monotonically with hydrogen ion concentration.
pub fn solve(input: &CarbonateInput) -> Result<CarbonateState, CarbonateError> {
    check_range("total alkalinity", input.alkalinity_umol_kg, f64::MIN_POSITIVE, 1e5)?;
    check_range("dissolved inorganic carbon", input.dic_umol_kg, f64::MIN_POSITIVE, 1e5)?;
    check_range("temperature", input.temperature_c, -2.0, 40.0)?;
    check_range("salinity", input.salinity, f64::MIN_POSITIVE, 50.0)?;

    let c = Constants::at(input.temperature_c, input.salinity);
    let ta = input.alkalinity_umol_kg * MICRO;
    let dic = input.dic_umol_kg * MICRO;

    let residual = |ph: f64| c.alkalinity(dic, 10f64.powf(-ph)) - ta;

    let (mut lo, mut hi) = (0.0_f64, 14.0_f64);
    if residual(lo) > 0.0 || residual(hi) < 0.0 {
        return Err(CarbonateError::NoConvergence { lo, hi });
    }
    for _ in 0..BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        if residual(mid) > 0.0 {
            hi = mid;
        } else {
            lo = mid;
        }
        if hi - lo < 1e-12 {
            break;
        }
    }
    let ph_total = 0.5 * (lo + hi);

    let h = 10f64.powf(-ph_total);
    let denom = h * h + c.k1 * h + c.k1 * c.k2;
    let co2 = dic * h * h / denom;
    let hco3 = dic * c.k1 * h / denom;
    let co3 = dic * c.k1 * c.k2 / denom;
    let omega_aragonite = co3 * c.calcium / c.ksp_aragonite;

    tracing::debug!(ph_total, omega_aragonite, "carbonate system solved");

    Ok(CarbonateState {
        ph_total,
        co3_umol_kg: co3 / MICRO,
        hco3_umol_kg: hco3 / MICRO,
        co2_umol_kg: co2 / MICRO,
        omega_aragonite,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_match_published_values() {
        let c = Constants::at(25.0, 35.0);
        // Lueker 2000 at 25 °C, S = 35: pK1 ≈ 5.847, pK2 ≈ 8.966
        assert!((-c.k1.log10() - 5.847).abs() < 0.01);
        assert!((-c.k2.log10() - 8.966).abs() < 0.01);
        // Dickson 1990: pKB ≈ 8.597
        assert!((-c.kb.log10() - 8.597).abs() < 0.01);
        // Mucci 1983: pKsp(aragonite) ≈ 6.19
        assert!((-c.ksp_aragonite.log10() - 6.19).abs() < 0.01);
        assert!((c.calcium - 0.01028).abs() < 1e-4);
    }

    #[test]
    fn test_default_seawater() {
        let state = solve(&CarbonateInput::default()).unwrap();
        assert!((7.9..8.3).contains(&state.ph_total), "pH {}", state.ph_total);
        assert!(
            (2.8..4.3).contains(&state.omega_aragonite),
            "omega {}",
            state.omega_aragonite
        );
        let dic = state.co2_umol_kg + state.hco3_umol_kg + state.co3_umol_kg;
        assert!((dic - 2000.0).abs() < 1e-6);
    }

    #[test]
    fn test_more_carbon_lowers_saturation() {
        let base = solve(&CarbonateInput::default()).unwrap();
        let acidified = solve(&CarbonateInput {
            dic_umol_kg: 2150.0,
            ..CarbonateInput::default()
        })
        .unwrap();
        assert!(acidified.omega_aragonite < base.omega_aragonite);
        assert!(acidified.ph_total < base.ph_total);
    }

    #[test]
    fn test_warmer_water_is_more_saturated() {
        let cold = solve(&CarbonateInput {
            temperature_c: 5.0,
            ..CarbonateInput::default()
        })
        .unwrap();
        let warm = solve(&CarbonateInput {
            temperature_c: 28.0,
            ..CarbonateInput::default()
        })
        .unwrap();
        assert!(warm.omega_aragonite > cold.omega_aragonite);
    }

    #[test]
    fn test_invalid_inputs() {
        let bad = [
            CarbonateInput {
                alkalinity_umol_kg: 0.0,
                ..CarbonateInput::default()
            },
            CarbonateInput {
                dic_umol_kg: f64::NAN,
                ..CarbonateInput::default()
            },
            CarbonateInput {
                temperature_c: 60.0,
                ..CarbonateInput::default()
            },
            CarbonateInput {
                salinity: -1.0,
                ..CarbonateInput::default()
            },
        ];
        for input in bad {
            assert!(matches!(
                solve(&input),
                Err(CarbonateError::InvalidInput { .. })
            ));
        }
    }
}
