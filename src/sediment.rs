//! # Sediment Transport
//!
//! Bedload transport rate from depth-averaged flow velocity and median grain
//! size, using a Meyer-Peter–Müller style excess-stress law:
//!
//! ```text
//! τ   = ρ g D50 u
//! q_s = 8 (τ − 0.047 ρ g D50)^1.5
//! ```
//!
//! Below the threshold of motion the excess stress is not positive and no
//! sediment moves, so the rate is reported as zero.

use serde::Serialize;
use thiserror::Error;

/// Seawater density (kg/m³)
pub const SEAWATER_DENSITY: f64 = 1025.0;
/// Gravitational acceleration (m/s²)
pub const GRAVITY: f64 = 9.81;
/// Critical Shields parameter
pub const CRITICAL_SHIELDS: f64 = 0.047;
/// Transport coefficient
pub const TRANSPORT_COEFFICIENT: f64 = 8.0;

#[derive(Error, Debug, PartialEq)]
pub enum SedimentError {
    #[error("invalid {name}: {value}")]
    InvalidInput { name: &'static str, value: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SedimentInput {
    /// Flow velocity (m/s)
    pub velocity_m_s: f64,
    /// Median grain size D50 (mm)
    pub d50_mm: f64,
}

impl Default for SedimentInput {
    fn default() -> Self {
        Self {
            velocity_m_s: 1.0,
            d50_mm: 0.2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BedloadResult {
    /// Bed shear stress τ (Pa)
    pub shear_stress: f64,
    /// Critical stress 0.047 ρ g D50 (Pa)
    pub critical_stress: f64,
    /// Transport rate q_s (m³/s/m)
    pub transport_rate: f64,
}

impl BedloadResult {
    pub fn is_moving(&self) -> bool {
        self.shear_stress > self.critical_stress
    }
}

/// Bedload transport rate for `input`.
pub fn bedload_transport(input: &SedimentInput) -> Result<BedloadResult, SedimentError> {
    if !input.velocity_m_s.is_finite() {
        return Err(SedimentError::InvalidInput {
            name: "flow velocity",
            value: input.velocity_m_s,
        });
    }
    if !input.d50_mm.is_finite() || input.d50_mm < 0.0 {
        return Err(SedimentError::InvalidInput {
            name: "grain size D50",
            value: input.d50_mm,
        });
    }

    let d50_m = input.d50_mm / 1000.0;
    let weight = SEAWATER_DENSITY * GRAVITY * d50_m;
    let shear_stress = weight * input.velocity_m_s;
    let critical_stress = CRITICAL_SHIELDS * weight;
    let excess = shear_stress - critical_stress;

    let transport_rate = if excess > 0.0 {
        TRANSPORT_COEFFICIENT * excess.powf(1.5)
    } else {
        tracing::debug!(shear_stress, critical_stress, "below threshold of motion");
        0.0
    };

    Ok(BedloadResult {
        shear_stress,
        critical_stress,
        transport_rate,
    })
}
