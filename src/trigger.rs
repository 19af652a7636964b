use crate::{
    config::AnalysisConfig,
    cuts::FiducialCut,
    data::{McParticle, ParticleSource},
    isolation::FIRST_FINAL_STATE_INDEX,
    pdg,
    utils::{enums::Species, vectors::Vec4},
};

/// A particle accepted as trigger.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TriggerCandidate {
    /// Position in the generator list.
    pub index: usize,
    /// Assigned species.
    pub species: Species,
    /// Four-momentum.
    pub p4: Vec4,
}

fn is_candidate_code(particle: &dyn McParticle) -> bool {
    match particle.pdg() {
        pdg::PHOTON => particle.is_final_state(),
        pdg::PI0 | pdg::ETA => true,
        _ => false,
    }
}

/// Assign a [`Species`] to the photon, $`\pi^0`$ or $`\eta`$ at `index`.
///
/// Photons are direct when their mother sits before the first final-state index and decay
/// photons otherwise, labelled by the mother's code. Mesons only count when they decay into
/// exactly two photons. Anything else, including links pointing outside the list, is left
/// unclassified.
pub fn classify_species(source: &dyn ParticleSource, index: usize) -> Option<Species> {
    let particle = source.particle(index)?;
    match particle.pdg() {
        pdg::PHOTON => {
            let mother_index = particle.first_mother();
            if mother_index <= 0 {
                return None;
            }
            if mother_index < FIRST_FINAL_STATE_INDEX as i32 && particle.is_final_state() {
                return Some(Species::DirectPhoton);
            }
            let mother = source.particle_at(mother_index)?;
            match mother.pdg() {
                pdg::PI0 => Some(Species::Pi0DecayPhoton),
                pdg::ETA => Some(Species::EtaDecayPhoton),
                _ if mother.status() > 0 => Some(Species::OtherDecayPhoton),
                _ => None,
            }
        }
        code @ (pdg::PI0 | pdg::ETA) => {
            if particle.n_daughters() != 2 {
                return None;
            }
            let first = source.particle_at(particle.daughter(0))?;
            let second = source.particle_at(particle.daughter(1))?;
            if first.pdg() != pdg::PHOTON || second.pdg() != pdg::PHOTON {
                return None;
            }
            Some(if code == pdg::PI0 {
                Species::Pi0
            } else {
                Species::Eta
            })
        }
        _ => None,
    }
}

/// Apply the candidate code, minimum $`p_T`$ and trigger acceptance selections to the particle
/// at `index` and classify it.
pub fn select_trigger(
    source: &dyn ParticleSource,
    index: usize,
    config: &AnalysisConfig,
    trigger_fiducial: &dyn FiducialCut,
) -> Option<TriggerCandidate> {
    let particle = source.particle(index)?;
    if !is_candidate_code(particle) {
        return None;
    }
    let p4 = particle.p4();
    if p4.pt() < config.min_pt {
        return None;
    }
    if !trigger_fiducial.is_in_fiducial_cut(p4.eta(), p4.phi(), config.trigger_detector) {
        return None;
    }
    let species = classify_species(source, index)?;
    Some(TriggerCandidate { index, species, p4 })
}
