use log::debug;

use crate::{
    config::AnalysisConfig,
    cuts::{FiducialCut, IsolationCut},
    data::ParticleSource,
    pdg,
    utils::{
        enums::{Detector, NeutralVariant, VariantMap},
        vectors::{phi_positive, Vec4},
    },
};

/// First generator-list index after the hard partons.
pub const FIRST_FINAL_STATE_INDEX: usize = 8;

/// Outcome of the leading and isolation tests for one [`NeutralVariant`].
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct IsolationDecision {
    /// No particle with larger $`p_T`$ was found.
    pub leading: bool,
    /// The cone passed the configured isolation criterion.
    pub isolated: bool,
    /// Charged plus neutral $`p_T`$ summed over the cone.
    pub cone_sum_pt: f64,
}

/// Activity of one class of particles around the trigger.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ConeActivity {
    /// Largest $`p_T`$ anywhere in the acceptance.
    pub max_pt: f64,
    /// $`p_T`$ summed over the cone.
    pub cone_sum_pt: f64,
    /// Number of particles in the cone above the per-particle threshold.
    pub cone_count: usize,
}

impl ConeActivity {
    fn add(&mut self, pt: f64, in_cone: bool, pt_threshold: f64) {
        if pt > self.max_pt {
            self.max_pt = pt;
        }
        if in_cone {
            self.cone_sum_pt += pt;
            if pt > pt_threshold {
                self.cone_count += 1;
            }
        }
    }
}

/// The per-variant decisions together with the activity they were derived from.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct LeadingIsolation {
    /// Decision per neutral variant.
    pub decisions: VariantMap<IsolationDecision>,
    /// Charged activity, shared by all variants.
    pub charged: ConeActivity,
    /// Neutral activity per variant.
    pub neutral: VariantMap<ConeActivity>,
}

/// Scan the final-state particles of the event and decide, for every neutral variant, whether
/// the trigger at `trigger_index` is leading and isolated.
///
/// Particles enter the scan when they sit after the hard partons, are in the final state, are
/// not the trigger or one of its direct daughters, lie in the tracking acceptance and pass the
/// minimum charged or neutral $`p_T`$. Particles with an unknown charge are left out.
pub fn classify_leading_isolated(
    source: &dyn ParticleSource,
    trigger_index: usize,
    trigger: &Vec4,
    config: &AnalysisConfig,
    fiducial: &dyn FiducialCut,
) -> LeadingIsolation {
    let cut = &config.isolation;
    let trigger_pt = trigger.pt();
    let trigger_eta = trigger.eta();
    let trigger_phi = trigger.phi_positive();
    let trigger_link = i32::try_from(trigger_index).ok();

    let mut charged = ConeActivity::default();
    let mut neutral: VariantMap<ConeActivity> = VariantMap::default();

    for index in FIRST_FINAL_STATE_INDEX..source.n_primaries() {
        if index == trigger_index {
            continue;
        }
        let Some(particle) = source.particle(index) else {
            continue;
        };
        if !particle.is_final_state() || Some(particle.first_mother()) == trigger_link {
            continue;
        }
        let p4 = particle.p4();
        let (pt, eta, phi) = (p4.pt(), p4.eta(), p4.phi());
        if !fiducial.is_in_fiducial_cut(eta, phi, Detector::Cts) {
            continue;
        }
        let Some(charge) = particle.charge() else {
            debug!(
                "Particle {index} with unknown PDG code {} left out of the cone scan",
                particle.pdg()
            );
            continue;
        };
        let in_cone = cut.in_cone(IsolationCut::radius(
            trigger_eta,
            trigger_phi,
            eta,
            phi_positive(phi),
        ));
        if charge != 0.0 {
            if pt < config.min_charged_pt {
                continue;
            }
            charged.add(pt, in_cone, cut.pt_threshold);
        } else {
            if pt < config.min_neutral_pt {
                continue;
            }
            let photon_like = pdg::is_photon_like(particle.pdg());
            let in_calorimeter = fiducial.is_in_fiducial_cut(eta, phi, config.calorimeter);
            for variant in NeutralVariant::ALL {
                if (variant.photon_only() && !photon_like)
                    || (variant.requires_calorimeter() && !in_calorimeter)
                {
                    continue;
                }
                neutral[variant].add(pt, in_cone, cut.pt_threshold);
            }
        }
    }

    let decisions = VariantMap::from_fn(|variant| {
        let activity = &neutral[variant];
        let cone_sum_pt = charged.cone_sum_pt + activity.cone_sum_pt;
        IsolationDecision {
            leading: trigger_pt > charged.max_pt && trigger_pt > activity.max_pt,
            isolated: cut.is_isolated(charged.cone_count + activity.cone_count, cone_sum_pt),
            cone_sum_pt,
        }
    });
    LeadingIsolation {
        decisions,
        charged,
        neutral,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::{
        cuts::AcceptanceWindows,
        data::{test_event, StackParticle, FINAL_STATE},
        utils::enums::IsolationMethod,
    };

    const NEAR: f64 = 2.0943951023931953; // 120 degrees

    fn base() -> Vec<StackParticle> {
        test_event().stack.unwrap()
    }

    fn final_state(pdg: i32, mother: i32, pt: f64, eta: f64, phi: f64) -> StackParticle {
        StackParticle {
            pdg,
            status: FINAL_STATE,
            first_mother: mother,
            daughters: [-1, -1],
            p4: Vec4::from_pt_eta_phi_m(pt, eta, phi, 0.0),
        }
    }

    fn classify(particles: &Vec<StackParticle>, config: &AnalysisConfig) -> LeadingIsolation {
        let trigger = particles[8].p4;
        classify_leading_isolated(particles, 8, &trigger, config, &AcceptanceWindows::default())
    }

    #[test]
    fn test_lone_trigger_is_leading_and_isolated() {
        let result = classify(&base(), &AnalysisConfig::default());
        for (_, decision) in result.decisions.iter() {
            assert!(decision.leading);
            assert!(decision.isolated);
            assert_eq!(decision.cone_sum_pt, 0.0);
        }
    }

    #[test]
    fn test_harder_charged_particle_breaks_leading() {
        let mut particles = base();
        particles.push(final_state(211, 7, 6.0, 0.0, -1.0));
        let result = classify(&particles, &AnalysisConfig::default());
        for (_, decision) in result.decisions.iter() {
            assert!(!decision.leading);
            assert!(decision.isolated);
        }
        assert_relative_eq!(result.charged.max_pt, 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_neutral_variants() {
        let mut particles = base();
        // hard neutron far from the trigger, outside the calorimeter
        particles.push(final_state(2112, 7, 5.0, 0.0, -1.0));
        // hard photon in the calorimeter, outside the cone
        particles.push(final_state(22, 7, 4.5, 0.5, NEAR + 0.5));
        let result = classify(&particles, &AnalysisConfig::default());
        let d = &result.decisions;
        assert!(!d[NeutralVariant::AllNeutral].leading);
        assert!(!d[NeutralVariant::Calorimeter].leading);
        assert!(!d[NeutralVariant::Photon].leading);
        assert!(!d[NeutralVariant::CalorimeterPhoton].leading);
        assert_relative_eq!(
            result.neutral[NeutralVariant::AllNeutral].max_pt,
            5.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            result.neutral[NeutralVariant::Calorimeter].max_pt,
            4.5,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            result.neutral[NeutralVariant::Photon].max_pt,
            4.5,
            epsilon = 1e-12
        );

        let mut particles = base();
        particles.push(final_state(2112, 7, 5.0, 0.0, -1.0));
        let result = classify(&particles, &AnalysisConfig::default());
        let d = &result.decisions;
        assert!(!d[NeutralVariant::AllNeutral].leading);
        assert!(d[NeutralVariant::Calorimeter].leading);
        assert!(d[NeutralVariant::Photon].leading);
        assert!(d[NeutralVariant::CalorimeterPhoton].leading);
    }

    #[test]
    fn test_cone_activity_breaks_isolation() {
        let mut particles = base();
        particles.push(final_state(211, 3, 1.0, 0.1, NEAR + 0.1));
        particles.push(final_state(22, 3, 0.8, -0.1, NEAR - 0.1));
        let result = classify(&particles, &AnalysisConfig::default());
        for (_, decision) in result.decisions.iter() {
            assert!(decision.leading);
            assert!(!decision.isolated);
        }
        assert_eq!(result.charged.cone_count, 1);
        assert_relative_eq!(
            result.decisions[NeutralVariant::AllNeutral].cone_sum_pt,
            1.8,
            epsilon = 1e-12
        );

        let mut config = AnalysisConfig::default();
        config.isolation.method = IsolationMethod::SumPt;
        let result = classify(&particles, &config);
        assert!(result.decisions[NeutralVariant::CalorimeterPhoton].isolated);
        config.isolation.sum_pt_threshold = 1.5;
        let result = classify(&particles, &config);
        assert!(!result.decisions[NeutralVariant::CalorimeterPhoton].isolated);
    }

    #[test]
    fn test_sub_threshold_particles_count_in_sum_only() {
        let mut particles = base();
        particles.push(final_state(211, 3, 0.4, 0.1, NEAR));
        let result = classify(&particles, &AnalysisConfig::default());
        let decision = result.decisions[NeutralVariant::AllNeutral];
        assert!(decision.isolated);
        assert_relative_eq!(decision.cone_sum_pt, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_equal_pt_competitor_breaks_leading() {
        let mut particles = base();
        let t = particles[8].p4;
        particles.push(StackParticle {
            p4: Vec4::new(-t.x, -t.y, t.z, t.t),
            ..final_state(211, 7, 1.0, 0.0, 0.0)
        });
        let result = classify(&particles, &AnalysisConfig::default());
        assert_eq!(result.charged.max_pt, t.pt());
        for (_, decision) in result.decisions.iter() {
            assert!(!decision.leading);
            assert!(decision.isolated);
        }
    }

    #[test]
    fn test_particle_at_pt_threshold_is_not_counted() {
        let mut particles = base();
        particles.push(final_state(211, 3, 0.5, 0.1, NEAR));
        let mut config = AnalysisConfig::default();
        config.isolation.pt_threshold = particles[9].p4.pt();
        let result = classify(&particles, &config);
        assert_eq!(result.charged.cone_count, 0);
        let decision = result.decisions[NeutralVariant::AllNeutral];
        assert!(decision.isolated);
        assert_relative_eq!(decision.cone_sum_pt, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_skipped_particles() {
        let mut particles = base();
        // daughter of the trigger
        particles.push(final_state(211, 8, 9.0, 0.0, NEAR));
        // not final state
        particles.push(StackParticle {
            status: 2,
            ..final_state(211, 3, 9.0, 0.0, NEAR)
        });
        // outside the tracking acceptance
        particles.push(final_state(211, 3, 9.0, 1.5, NEAR));
        // below the minimum charged and neutral pT
        particles.push(final_state(211, 3, 0.1, 0.0, NEAR));
        particles.push(final_state(22, 3, 0.25, 0.0, NEAR));
        // unknown charge
        particles.push(final_state(0, 3, 9.0, 0.0, NEAR));
        let result = classify(&particles, &AnalysisConfig::default());
        for (_, decision) in result.decisions.iter() {
            assert!(decision.leading);
            assert!(decision.isolated);
            assert_eq!(decision.cone_sum_pt, 0.0);
        }
    }

    #[test]
    fn test_hard_partons_are_not_scanned() {
        let mut particles = base();
        particles[6].status = FINAL_STATE;
        particles[7].status = FINAL_STATE;
        let result = classify(&particles, &AnalysisConfig::default());
        assert!(result.decisions[NeutralVariant::AllNeutral].leading);
    }
}
