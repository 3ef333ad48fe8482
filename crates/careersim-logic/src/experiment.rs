//! Superconductor synthesis experiment model.
//!
//! The materials-science lab lets the student choose five variables and
//! "run" a YBCO synthesis. Outputs are purity (%) and levitation height
//! (mm) over a magnet. This is a scoring table, not physics: each variable
//! adds or subtracts a fixed amount depending on which band it falls in.
//!
//! # Algorithm
//!
//! 1. Start from purity 50, levitation 2.0.
//! 2. Add each variable's contribution (see [`breakdown`]).
//! 3. Purity: add noise in ±5, clamp to 20–99.
//! 4. Levitation: add `(purity - 50) × 0.04` using the clamped purity,
//!    add noise in ±0.5, clamp to 0.5–8.0.
//!
//! Noise comes from a [`Noise`] source so tests can switch it off.
//!
//! ```
//! use careersim_logic::experiment::*;
//!
//! let out = run_experiment(&ExperimentVariables::optimal(), &mut NoNoise);
//! assert_eq!(out.purity, 99.0);
//! assert_eq!(out.levitation_height, 8.0);
//! ```

use serde::{Deserialize, Serialize};

pub const BASE_PURITY: f32 = 50.0;
pub const BASE_LEVITATION: f32 = 2.0;
pub const PURITY_RANGE: (f32, f32) = (20.0, 99.0);
pub const LEVITATION_RANGE: (f32, f32) = (0.5, 8.0);
pub const PURITY_NOISE: f32 = 5.0;
pub const LEVITATION_NOISE: f32 = 0.5;
/// Levitation gained per purity point above 50.
pub const PURITY_COUPLING: f32 = 0.04;

/// Runs allowed per lab session unless configured otherwise.
pub const DEFAULT_LAB_RUNS: u32 = 4;

/// Starting material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Precursor {
    YbcoPowder,
    OxideCarbonateMix,
    NitrateSolGel,
}

impl Precursor {
    pub const ALL: [Precursor; 3] = [
        Precursor::YbcoPowder,
        Precursor::OxideCarbonateMix,
        Precursor::NitrateSolGel,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Precursor::YbcoPowder => "YBa₂Cu₃O₇ powder",
            Precursor::OxideCarbonateMix => "Y₂O₃ + BaCO₃ + CuO mix",
            Precursor::NitrateSolGel => "Nitrate sol-gel precursor",
        }
    }

    fn effect(self) -> (f32, f32) {
        match self {
            Precursor::YbcoPowder => (30.0, 1.5),
            Precursor::OxideCarbonateMix => (15.0, 0.8),
            Precursor::NitrateSolGel => (5.0, 0.3),
        }
    }
}

/// How the sample is brought back to room temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoolingMethod {
    SlowCooling,
    FurnaceCooling,
    RapidQuench,
}

impl CoolingMethod {
    pub const ALL: [CoolingMethod; 3] = [
        CoolingMethod::SlowCooling,
        CoolingMethod::FurnaceCooling,
        CoolingMethod::RapidQuench,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CoolingMethod::SlowCooling => "Slow Cooling (5°C/min)",
            CoolingMethod::FurnaceCooling => "Furnace Cooling",
            CoolingMethod::RapidQuench => "Rapid Quench",
        }
    }

    fn effect(self) -> (f32, f32) {
        match self {
            CoolingMethod::SlowCooling => (15.0, 1.0),
            CoolingMethod::FurnaceCooling => (5.0, 0.3),
            CoolingMethod::RapidQuench => (-15.0, -1.0),
        }
    }
}

/// Dopant mixed into the sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Additive {
    SilverOxide,
    NoAdditive,
    PlatinumOxide,
    Graphite,
}

impl Additive {
    pub const ALL: [Additive; 4] = [
        Additive::SilverOxide,
        Additive::NoAdditive,
        Additive::PlatinumOxide,
        Additive::Graphite,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Additive::SilverOxide => "Silver Oxide",
            Additive::NoAdditive => "None",
            Additive::PlatinumOxide => "Platinum Oxide",
            Additive::Graphite => "Graphite",
        }
    }

    fn effect(self) -> (f32, f32) {
        match self {
            Additive::SilverOxide => (5.0, 0.5),
            Additive::NoAdditive => (0.0, 0.0),
            Additive::PlatinumOxide => (2.0, 0.2),
            Additive::Graphite => (-10.0, -0.5),
        }
    }
}

/// Snapshot of the chosen variables at run time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentVariables {
    pub precursor: Precursor,
    /// Sintering temperature in °C.
    pub temperature_c: f32,
    /// Sintering time in hours.
    pub time_hours: f32,
    pub cooling: CoolingMethod,
    pub additive: Additive,
}

impl ExperimentVariables {
    /// Best settings in every category.
    pub fn optimal() -> Self {
        Self {
            precursor: Precursor::YbcoPowder,
            temperature_c: 940.0,
            time_hours: 18.0,
            cooling: CoolingMethod::SlowCooling,
            additive: Additive::SilverOxide,
        }
    }
}

impl Default for ExperimentVariables {
    fn default() -> Self {
        Self {
            precursor: Precursor::OxideCarbonateMix,
            temperature_c: 900.0,
            time_hours: 12.0,
            cooling: CoolingMethod::FurnaceCooling,
            additive: Additive::NoAdditive,
        }
    }
}

/// Measured outputs of one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentOutput {
    pub purity: f32,
    pub levitation_height: f32,
}

/// One line of the scoring table applied to a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub variable: &'static str,
    pub purity: f32,
    pub levitation: f32,
    pub note: &'static str,
}

/// Source of bounded experimental variance.
pub trait Noise {
    /// A value in `[-amplitude, amplitude]`.
    fn sample(&mut self, amplitude: f32) -> f32;
}

/// Noise switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNoise;

impl Noise for NoNoise {
    fn sample(&mut self, _amplitude: f32) -> f32 {
        0.0
    }
}

/// Deterministic hash-based noise sequence.
#[derive(Debug, Clone, Copy)]
pub struct HashNoise {
    state: u32,
}

impl HashNoise {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }
}

impl Noise for HashNoise {
    fn sample(&mut self, amplitude: f32) -> f32 {
        self.state = self.state.wrapping_add(1);
        let hash = self.state.wrapping_mul(2654435761);
        // 0..=1000 mapped onto -1.0..=1.0
        let unit = (hash % 1001) as f32 / 500.0 - 1.0;
        unit * amplitude
    }
}

fn temperature_effect(t: f32) -> (f32, f32, &'static str) {
    if (930.0..=950.0).contains(&t) {
        (25.0, 1.5, "optimal sintering window")
    } else if (900.0..=980.0).contains(&t) {
        (10.0, 0.5, "near the sintering window")
    } else {
        (-20.0, -1.0, "outside the sintering window")
    }
}

fn time_effect(h: f32) -> (f32, f32, &'static str) {
    if (16.0..=20.0).contains(&h) {
        (20.0, 1.0, "full oxygen uptake")
    } else if (12.0..=24.0).contains(&h) {
        (8.0, 0.4, "partial oxygen uptake")
    } else {
        (-10.0, -0.5, "poor phase formation")
    }
}

/// Per-variable contributions for `vars`, in a fixed order.
pub fn breakdown(vars: &ExperimentVariables) -> Vec<Contribution> {
    let (pp, pl) = vars.precursor.effect();
    let (tp, tl, tnote) = temperature_effect(vars.temperature_c);
    let (hp, hl, hnote) = time_effect(vars.time_hours);
    let (cp, cl) = vars.cooling.effect();
    let (ap, al) = vars.additive.effect();

    vec![
        Contribution {
            variable: "precursor",
            purity: pp,
            levitation: pl,
            note: vars.precursor.label(),
        },
        Contribution {
            variable: "temperature",
            purity: tp,
            levitation: tl,
            note: tnote,
        },
        Contribution {
            variable: "time",
            purity: hp,
            levitation: hl,
            note: hnote,
        },
        Contribution {
            variable: "cooling",
            purity: cp,
            levitation: cl,
            note: vars.cooling.label(),
        },
        Contribution {
            variable: "additive",
            purity: ap,
            levitation: al,
            note: vars.additive.label(),
        },
    ]
}

/// Purity before noise and clamping.
pub fn raw_purity(vars: &ExperimentVariables) -> f32 {
    BASE_PURITY + breakdown(vars).iter().map(|c| c.purity).sum::<f32>()
}

/// Run the model once. Purity noise is drawn before levitation noise.
pub fn run_experiment(vars: &ExperimentVariables, noise: &mut impl Noise) -> ExperimentOutput {
    let parts = breakdown(vars);
    let purity_sum: f32 = parts.iter().map(|c| c.purity).sum();
    let lev_sum: f32 = parts.iter().map(|c| c.levitation).sum();

    let purity = (BASE_PURITY + purity_sum + noise.sample(PURITY_NOISE))
        .clamp(PURITY_RANGE.0, PURITY_RANGE.1);

    let levitation = BASE_LEVITATION
        + lev_sum
        + (purity - BASE_PURITY) * PURITY_COUPLING
        + noise.sample(LEVITATION_NOISE);

    ExperimentOutput {
        purity,
        levitation_height: levitation.clamp(LEVITATION_RANGE.0, LEVITATION_RANGE.1),
    }
}

/// Thresholds a run must reach to count as a working superconductor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExperimentGoal {
    pub min_purity: f32,
    pub min_levitation: f32,
}

impl Default for ExperimentGoal {
    fn default() -> Self {
        Self {
            min_purity: 90.0,
            min_levitation: 5.0,
        }
    }
}

/// Judge a run against the goal, producing feedback for the attempt history.
pub fn evaluate_run(
    output: &ExperimentOutput,
    goal: &ExperimentGoal,
) -> crate::scoring::Evaluation {
    use crate::scoring::Evaluation;

    let purity_ok = output.purity >= goal.min_purity;
    let lev_ok = output.levitation_height >= goal.min_levitation;
    let summary = format!(
        "Purity {:.1}%, levitation {:.2} mm.",
        output.purity, output.levitation_height
    );

    match (purity_ok, lev_ok) {
        (true, true) => Evaluation::pass(format!(
            "{} The sample levitates stably: superconducting phase achieved.",
            summary
        )),
        (false, true) => Evaluation::fail(format!(
            "{} Levitation is good but purity is below {:.0}%.",
            summary, goal.min_purity
        )),
        (true, false) => Evaluation::fail(format!(
            "{} Pure sample, but levitation is below {:.1} mm.",
            summary, goal.min_levitation
        )),
        (false, false) => Evaluation::fail(format!(
            "{} Neither purity nor levitation reached the target.",
            summary
        )),
    }
}

/// Problem with an entered variable.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableIssue {
    /// Temperature outside what the furnace can do.
    TemperatureOutOfRange(f32),
    /// Non-positive or excessive sintering time.
    TimeOutOfRange(f32),
}

/// Check furnace limits: 20–1200 °C, (0, 72] hours.
pub fn validate_variables(vars: &ExperimentVariables) -> Vec<VariableIssue> {
    let mut issues = Vec::new();
    if !vars.temperature_c.is_finite() || !(20.0..=1200.0).contains(&vars.temperature_c) {
        issues.push(VariableIssue::TemperatureOutOfRange(vars.temperature_c));
    }
    if !vars.time_hours.is_finite() || vars.time_hours <= 0.0 || vars.time_hours > 72.0 {
        issues.push(VariableIssue::TimeOutOfRange(vars.time_hours));
    }
    issues
}
