use log::{debug, warn};

use crate::{
    ancestry::{resolve_hard_parton, Ancestry},
    config::AnalysisConfig,
    cuts::FiducialCut,
    data::ParticleSource,
    isolation::FIRST_FINAL_STATE_INDEX,
    partons::{HardProcess, PartonSlot},
    utils::{
        enums::{Detector, PartonFlavor, Species},
        vectors::{phi_positive, Vec4},
    },
};

/// Value of a momentum ratio whose reference momentum is not positive.
pub const NO_RATIO: f64 = -1.0;
/// Lower edge (exclusive) of the back-to-back window, in degrees.
pub const GAMMA_JET_MIN_DPHI: f64 = 140.0;
/// Upper edge (exclusive) of the back-to-back window, in degrees.
pub const GAMMA_JET_MAX_DPHI: f64 = 220.0;
/// Upper (exclusive) bound on the away-side jet $`|\eta|`$.
pub const GAMMA_JET_MAX_ETA: f64 = 0.6;

/// `pt / reference`, or [`NO_RATIO`] when `reference` is not positive.
pub fn momentum_ratio(pt: f64, reference: f64) -> f64 {
    if reference > 0.0 {
        pt / reference
    } else {
        NO_RATIO
    }
}

/// Trigger momentum fractions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ZRatios {
    /// Relative to the hard-process scale.
    pub hard: f64,
    /// Relative to the near-side parton.
    pub parton: f64,
    /// Relative to the near-side jet.
    pub jet: f64,
}

/// Everything learned by relating a trigger to the hard process.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PartonCorrelation {
    /// The slot the trigger descends from.
    pub near: PartonSlot,
    /// Momentum fractions.
    pub z: ZRatios,
    /// Flavour of the near-side parton.
    pub near_flavor: PartonFlavor,
    /// Flavour of the away-side parton.
    pub away_flavor: PartonFlavor,
    /// $`|\phi_{trigger} - \phi_{away\ jet}|`$ in degrees, both in $`(-\pi, \pi]`$.
    pub away_jet_delta_phi: f64,
    /// Direct photon back-to-back with a central away-side jet.
    pub gamma_jet_accepted: bool,
}

/// Whether a trigger of `species` falls in the gamma-jet acceptance.
pub fn gamma_jet_accepted(species: Species, delta_phi_deg: f64, away_jet_eta: f64) -> bool {
    species == Species::DirectPhoton
        && delta_phi_deg > GAMMA_JET_MIN_DPHI
        && delta_phi_deg < GAMMA_JET_MAX_DPHI
        && away_jet_eta.abs() < GAMMA_JET_MAX_ETA
}

/// Relate a trigger descending from the parton in `near` to the hard process.
pub fn correlate_with_parton(
    trigger: &Vec4,
    species: Species,
    near: PartonSlot,
    process: &HardProcess,
) -> PartonCorrelation {
    let pt = trigger.pt();
    let away = near.other();
    let away_jet = process.jet(away);
    let away_jet_delta_phi = (trigger.phi() - away_jet.phi()).abs().to_degrees();
    PartonCorrelation {
        near,
        z: ZRatios {
            hard: momentum_ratio(pt, process.pt_hard),
            parton: momentum_ratio(pt, process.parton(near).pt()),
            jet: momentum_ratio(pt, process.jet(near).pt()),
        },
        near_flavor: process.parton(near).flavor(),
        away_flavor: process.parton(away).flavor(),
        away_jet_delta_phi,
        gamma_jet_accepted: gamma_jet_accepted(species, away_jet_delta_phi, away_jet.eta()),
    }
}

/// Which side of the event a hadron in the $`x_E`$ scan belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum XeSide {
    /// Descends from the parton recoiling against the trigger.
    AwayParton,
    /// Does not descend from the hard process.
    UnderlyingEvent,
}

/// One hadron of the $`x_E`$ scan.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct XeEntry {
    /// Position in the generator list.
    pub index: usize,
    /// $`x_E`$ value.
    pub xe: f64,
    /// Which histogram family the value goes to.
    pub side: XeSide,
}

/// $`x_E = -\frac{p_T}{p_T^{trig}} \cos(\phi - \phi_{trig})`$, with both azimuths in $`[0, 2\pi)`$.
pub fn x_e(pt: f64, phi: f64, trigger_pt: f64, trigger_phi: f64) -> f64 {
    -pt / trigger_pt * (phi_positive(phi) - phi_positive(trigger_phi)).cos()
}

/// Compute $`x_E`$ for the charged final-state hadrons and sort them by ancestry.
///
/// Hadrons from the trigger's own parton are left out, as are hadrons whose ancestry can not be
/// resolved.
pub fn collect_xe(
    source: &dyn ParticleSource,
    trigger_index: usize,
    trigger: &Vec4,
    near: PartonSlot,
    config: &AnalysisConfig,
    fiducial: &dyn FiducialCut,
) -> Vec<XeEntry> {
    let trigger_pt = trigger.pt();
    let trigger_phi = trigger.phi();
    let mut entries = Vec::new();
    for index in FIRST_FINAL_STATE_INDEX..source.n_primaries() {
        if index == trigger_index {
            continue;
        }
        let Some(particle) = source.particle(index) else {
            continue;
        };
        if !particle.is_final_state() || particle.charge().map_or(true, |q| q == 0.0) {
            continue;
        }
        let p4 = particle.p4();
        let pt = p4.pt();
        if pt < config.min_charged_pt
            || !fiducial.is_in_fiducial_cut(p4.eta(), p4.phi(), Detector::Cts)
        {
            continue;
        }
        let side = match resolve_hard_parton(source, index) {
            Ancestry::HardParton(slot) if slot != near => XeSide::AwayParton,
            Ancestry::HardParton(_) => continue,
            Ancestry::NotHardProcess(_) => XeSide::UnderlyingEvent,
            Ancestry::BrokenChain => {
                warn!("Broken mother chain for particle {index}, left out of the xE scan");
                continue;
            }
            Ancestry::TooFewPrimaries => continue,
        };
        entries.push(XeEntry {
            index,
            xe: x_e(pt, p4.phi(), trigger_pt, trigger_phi),
            side,
        });
    }
    debug!(
        "{} away-side and {} underlying-event hadrons for trigger {trigger_index}",
        entries.iter().filter(|e| e.side == XeSide::AwayParton).count(),
        entries.iter().filter(|e| e.side == XeSide::UnderlyingEvent).count()
    );
    entries
}
