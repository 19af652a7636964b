use log::{debug, info, warn};

use crate::{
    ancestry::{resolve_hard_parton, Ancestry},
    config::AnalysisConfig,
    correlation::{collect_xe, correlate_with_parton},
    cuts::FiducialCut,
    data::{EventReader, ParticleSource},
    histograms::HistogramRegistry,
    isolation::classify_leading_isolated,
    output::OutputHistograms,
    partons::HardProcess,
    trigger::{select_trigger, TriggerCandidate},
    utils::enums::{Detector, SpeciesMap},
    GenKineResult,
};

/// What happened to the trigger candidates of one event.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct EventSummary {
    /// Length of the generator particle list.
    pub n_primaries: usize,
    /// Accepted trigger candidates per species.
    pub candidates: SpeciesMap<usize>,
    /// Candidates traced back to a hard-scattering parton.
    pub correlated: usize,
    /// Hadrons entering the $`x_E`$ histograms, summed over candidates.
    pub xe_hadrons: usize,
}

/// Totals over a run.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    /// Number of processed events.
    pub events: usize,
    /// Accepted trigger candidates per species.
    pub candidates: SpeciesMap<usize>,
    /// Candidates traced back to a hard-scattering parton.
    pub correlated: usize,
}

impl RunSummary {
    fn add(&mut self, event: &EventSummary) {
        self.events += 1;
        for (species, count) in event.candidates.iter() {
            self.candidates[species] += count;
        }
        self.correlated += event.correlated;
    }
}

/// Generator-level trigger isolation and parton/jet correlation analysis.
///
/// All histograms are booked at construction and filled additively by
/// [`GeneratorKineAnalysis::process_event`]. Nothing else is carried from one event to the next.
pub struct GeneratorKineAnalysis {
    config: AnalysisConfig,
    fiducial: Box<dyn FiducialCut>,
    trigger_fiducial: Box<dyn FiducialCut>,
    registry: HistogramRegistry,
    output: OutputHistograms,
}

impl GeneratorKineAnalysis {
    /// Set up the analysis with the acceptance windows from `config`.
    pub fn new(config: AnalysisConfig) -> GenKineResult<Self> {
        let fiducial = Box::new(config.fiducial.clone());
        let trigger_fiducial = Box::new(config.trigger_fiducial.clone());
        Self::with_fiducial_cuts(config, fiducial, trigger_fiducial)
    }

    /// Set up the analysis with custom acceptance policies for the cone and $`x_E`$ scans
    /// (`fiducial`) and for trigger candidates (`trigger_fiducial`).
    pub fn with_fiducial_cuts(
        config: AnalysisConfig,
        fiducial: Box<dyn FiducialCut>,
        trigger_fiducial: Box<dyn FiducialCut>,
    ) -> GenKineResult<Self> {
        config.validate()?;
        let mut registry = HistogramRegistry::new(&config.histogram_prefix);
        let output = OutputHistograms::book(&mut registry, &config.ranges)?;
        info!(
            "Booked {} histograms, trigger detector {}, calorimeter {}",
            registry.len(),
            config.trigger_detector,
            config.calorimeter
        );
        Ok(Self {
            config,
            fiducial,
            trigger_fiducial,
            registry,
            output,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Select the trigger detector by name (`EMCAL`, `PHOS`, `CTS`, `DCAL` or any name containing
    /// both `DCAL` and `PHOS`).
    ///
    /// # Errors
    ///
    /// Returns [`GenKineError::UnknownDetector`](crate::GenKineError::UnknownDetector) for other
    /// names, leaving the current detector unchanged.
    pub fn set_trigger_detector(&mut self, name: &str) -> GenKineResult<()> {
        let detector = name.parse::<Detector>()?;
        self.apply_trigger_detector(detector);
        Ok(())
    }

    /// Select the trigger detector by index (0 to 4, in the order of [`Detector::ALL`]).
    ///
    /// # Errors
    ///
    /// Returns [`GenKineError::UnknownDetector`](crate::GenKineError::UnknownDetector) for other
    /// indices, leaving the current detector unchanged.
    pub fn set_trigger_detector_index(&mut self, index: i32) -> GenKineResult<()> {
        let detector = Detector::try_from(index)?;
        self.apply_trigger_detector(detector);
        Ok(())
    }

    fn apply_trigger_detector(&mut self, detector: Detector) {
        info!("Trigger detector set to {detector}");
        self.config.trigger_detector = detector;
    }

    /// Run the analysis on one event.
    ///
    /// # Errors
    ///
    /// Fails when the event does not hold the particle container required by its reading mode.
    pub fn process_event<R: EventReader + ?Sized>(
        &mut self,
        event: &R,
    ) -> GenKineResult<EventSummary> {
        debug!("Start");
        let source = event.particles()?;
        let mut summary = EventSummary {
            n_primaries: source.n_primaries(),
            ..Default::default()
        };
        let process = HardProcess::from_event(
            source,
            event.generator_header(),
            self.config.max_match_radius,
        );
        self.output.fill_event(&mut self.registry, &process);

        for index in 0..source.n_primaries() {
            let Some(candidate) =
                select_trigger(source, index, &self.config, self.trigger_fiducial.as_ref())
            else {
                continue;
            };
            summary.candidates[candidate.species] += 1;
            if let Some(xe_hadrons) = self.process_candidate(source, &candidate, &process) {
                summary.correlated += 1;
                summary.xe_hadrons += xe_hadrons;
            }
        }
        debug!("End");
        Ok(summary)
    }

    /// Returns the number of $`x_E`$ hadrons if the candidate descends from a hard parton.
    fn process_candidate(
        &mut self,
        source: &dyn ParticleSource,
        candidate: &TriggerCandidate,
        process: &HardProcess,
    ) -> Option<usize> {
        let pt = candidate.p4.pt();
        let species = candidate.species;
        debug!(
            "Trigger {} ({species}): pT {pt:.2}, eta {:.2}, phi {:.2}",
            candidate.index,
            candidate.p4.eta(),
            candidate.p4.phi()
        );
        self.output.fill_candidate(&mut self.registry, species, pt);

        let decisions = classify_leading_isolated(
            source,
            candidate.index,
            &candidate.p4,
            &self.config,
            self.fiducial.as_ref(),
        )
        .decisions;
        self.output
            .fill_leading(&mut self.registry, species, pt, &decisions);

        let near = match resolve_hard_parton(source, candidate.index) {
            Ancestry::HardParton(slot) => slot,
            Ancestry::NotHardProcess(index) => {
                debug!(
                    "Trigger {} not from the hard process (ancestor {index})",
                    candidate.index
                );
                return None;
            }
            Ancestry::BrokenChain => {
                warn!(
                    "Negative or invalid mother index in the chain of trigger {}",
                    candidate.index
                );
                return None;
            }
            Ancestry::TooFewPrimaries => {
                debug!("Too few primaries to hold the hard partons");
                return None;
            }
        };
        let correlation = correlate_with_parton(&candidate.p4, species, near, process);
        self.output
            .fill_correlation(&mut self.registry, species, pt, &decisions, &correlation);

        let entries = collect_xe(
            source,
            candidate.index,
            &candidate.p4,
            near,
            &self.config,
            self.fiducial.as_ref(),
        );
        self.output
            .fill_xe(&mut self.registry, species, pt, &decisions, &entries);
        Some(entries.len())
    }

    /// Run the analysis over a sequence of events, stopping at the first error.
    pub fn run<'a, R: EventReader + 'a>(
        &mut self,
        events: impl IntoIterator<Item = &'a R>,
    ) -> GenKineResult<RunSummary> {
        let mut summary = RunSummary::default();
        for event in events {
            let event_summary = self.process_event(event)?;
            summary.add(&event_summary);
        }
        info!(
            "Processed {} events, {} trigger candidates, {} correlated",
            summary.events,
            summary.candidates.values().sum::<usize>(),
            summary.correlated
        );
        Ok(summary)
    }

    /// The filled histograms.
    pub fn histograms(&self) -> &HistogramRegistry {
        &self.registry
    }

    /// Consume the analysis and keep the filled histograms.
    pub fn into_histograms(self) -> HistogramRegistry {
        self.registry
    }

    /// Write the filled histograms with `bincode`. The path may contain `~` and environment
    /// variables.
    pub fn save_as(&self, file_path: &str) -> GenKineResult<()> {
        self.registry.save_as(file_path)?;
        info!("Saved {} histograms to {file_path}", self.registry.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::{
        cuts::AcceptanceWindows,
        data::{test_event, Event, GeneratorHeader, StackParticle, FINAL_STATE},
        utils::{
            enums::{ReadingMode, Species},
            vectors::Vec4,
        },
        GenKineError,
    };

    const AWAY: f64 = -1.0471975511965976; // -60 degrees

    fn charged_pion(mother: i32, pt: f64, phi: f64) -> StackParticle {
        StackParticle {
            pdg: 211,
            status: FINAL_STATE,
            first_mother: mother,
            daughters: [-1, -1],
            p4: Vec4::from_pt_eta_phi_m(pt, 0.0, phi, 0.13957),
        }
    }

    fn entries(analysis: &GeneratorKineAnalysis, name: &str) -> usize {
        analysis
            .histograms()
            .get(&format!("AnaGenKine_{name}"))
            .map(|h| h.entries())
            .unwrap_or_else(|| panic!("{name} is not booked"))
    }

    #[test]
    fn test_direct_photon_from_hard_process() {
        let mut analysis = GeneratorKineAnalysis::new(AnalysisConfig::default()).unwrap();
        analysis.process_event(&test_event()).unwrap();
        for suffix in ["", "_EMC", "_Photon", "_EMC_Photon"] {
            assert_eq!(entries(&analysis, &format!("hDirectPhotonPtLeading{suffix}")), 1);
            assert_eq!(entries(&analysis, &format!("hDirectPhotonPtLeadingIsolated{suffix}")), 1);
            assert_eq!(entries(&analysis, &format!("hDirectPhotonZHardLeading{suffix}")), 1);
            assert_eq!(entries(&analysis, &format!("hDirectPhotonZHardNotLeading{suffix}")), 0);
            assert_eq!(entries(&analysis, &format!("hPtAcceptedGammaJetLeading{suffix}")), 1);
        }
        assert_eq!(entries(&analysis, "hDirectPhotonPtPartonTypeNearLeadingIsolated"), 1);
        let z_hard = analysis
            .histograms()
            .get_2d("hDirectPhotonZHardLeading")
            .unwrap();
        assert_relative_eq!(z_hard.projection_y().iter().sum::<f64>(), 1.0);
        let near_type = analysis
            .histograms()
            .get_2d("hDirectPhotonPtPartonTypeNearLeading")
            .unwrap();
        assert_relative_eq!(near_type.projection_y()[0], 1.0);
        let away_type = analysis
            .histograms()
            .get_2d("hDirectPhotonPtPartonTypeAwayLeading")
            .unwrap();
        assert_relative_eq!(away_type.projection_y()[1], 1.0);
        assert_eq!(entries(&analysis, "hDirectPhotonXELeading"), 0);
        assert_eq!(entries(&analysis, "hPi0Pt"), 0);
    }

    #[test]
    fn test_trigger_outside_hard_process() {
        let mut event = test_event();
        if let Some(stack) = event.stack.as_mut() {
            stack[8].first_mother = 5;
        }
        let mut analysis = GeneratorKineAnalysis::new(AnalysisConfig::default()).unwrap();
        let summary = analysis.process_event(&event).unwrap();
        assert_eq!(summary.candidates[Species::DirectPhoton], 1);
        assert_eq!(summary.correlated, 0);
        assert_eq!(entries(&analysis, "hDirectPhotonPtLeading"), 1);
        assert_eq!(entries(&analysis, "hPtHard"), 1);
        let correlation_fills: usize = analysis
            .histograms()
            .iter()
            .filter(|h| h.name().contains("ZHard") || h.name().contains("GammaJet"))
            .map(|h| h.entries())
            .sum();
        assert_eq!(correlation_fills, 0);
    }

    #[test]
    fn test_xe_sides() {
        let mut event = test_event();
        if let Some(stack) = event.stack.as_mut() {
            stack.push(charged_pion(7, 2.0, AWAY)); // 9: away parton
            stack.push(charged_pion(3, 1.0, AWAY)); // 10: underlying event
            stack.push(charged_pion(6, 1.0, AWAY)); // 11: near parton, skipped
            stack.push(charged_pion(-1, 1.0, AWAY)); // 12: broken chain, skipped
        }
        let mut analysis = GeneratorKineAnalysis::new(AnalysisConfig::default()).unwrap();
        let summary = analysis.process_event(&event).unwrap();
        assert_eq!(summary.xe_hadrons, 2);
        assert_eq!(entries(&analysis, "hDirectPhotonXELeading"), 1);
        assert_eq!(entries(&analysis, "hDirectPhotonXELeadingIsolated"), 1);
        assert_eq!(entries(&analysis, "hDirectPhotonXEUELeading"), 1);
        assert_eq!(entries(&analysis, "hDirectPhotonXEUELeading_EMC_Photon"), 1);
        assert_eq!(entries(&analysis, "hDirectPhotonXENotLeading"), 0);
    }

    #[test]
    fn test_aod_matches_stack() {
        let mut stack = GeneratorKineAnalysis::new(AnalysisConfig::default()).unwrap();
        stack.process_event(&test_event()).unwrap();
        let mut aod = GeneratorKineAnalysis::new(AnalysisConfig::default()).unwrap();
        aod.process_event(&test_event().to_aod().unwrap()).unwrap();
        for (a, b) in stack.histograms().iter().zip(aod.histograms().iter()) {
            assert_eq!(a.name(), b.name());
            assert_eq!(a.entries(), b.entries());
        }
    }

    #[test]
    fn test_charged_nucleus_in_cone() {
        let mut event = test_event();
        if let Some(stack) = event.stack.as_mut() {
            stack.push(StackParticle {
                pdg: 1000010020,
                status: FINAL_STATE,
                first_mother: 3,
                daughters: [-1, -1],
                p4: Vec4::from_pt_eta_phi_m(2.0, 0.1, 2.0943951023931953, 1.8756),
            });
        }
        for event in [event.to_aod().unwrap(), event] {
            let mut analysis = GeneratorKineAnalysis::new(AnalysisConfig::default()).unwrap();
            analysis.process_event(&event).unwrap();
            for suffix in ["", "_EMC", "_Photon", "_EMC_Photon"] {
                assert_eq!(entries(&analysis, &format!("hDirectPhotonPtLeading{suffix}")), 1);
                assert_eq!(
                    entries(&analysis, &format!("hDirectPhotonPtLeadingIsolated{suffix}")),
                    0
                );
            }
        }
    }

    #[test]
    fn test_too_few_primaries() {
        let Event {
            stack: Some(mut stack),
            header,
            ..
        } = test_event()
        else {
            panic!("test event has no stack");
        };
        stack.truncate(5);
        stack.push(StackParticle {
            pdg: 22,
            status: FINAL_STATE,
            first_mother: 2,
            daughters: [-1, -1],
            p4: Vec4::from_pt_eta_phi_m(4.0, 0.0, 2.0943951023931953, 0.0),
        });
        let event = Event::from_stack(stack, header);
        let mut analysis = GeneratorKineAnalysis::new(AnalysisConfig::default()).unwrap();
        let summary = analysis.process_event(&event).unwrap();
        assert_eq!(summary.n_primaries, 6);
        assert_eq!(summary.candidates[Species::DirectPhoton], 1);
        assert_eq!(summary.correlated, 0);
        assert_eq!(entries(&analysis, "hDirectPhotonPt"), 1);
        let correlation_fills: usize = analysis
            .histograms()
            .iter()
            .filter(|h| {
                ["ZHard", "ZParton", "ZJet", "PartonType", "XE", "GammaJet"]
                    .iter()
                    .any(|quantity| h.name().contains(quantity))
            })
            .map(|h| h.entries())
            .sum();
        assert_eq!(correlation_fills, 0);
    }

    struct RejectAll;

    impl FiducialCut for RejectAll {
        fn is_in_fiducial_cut(&self, _eta: f64, _phi: f64, _detector: Detector) -> bool {
            false
        }
    }

    #[test]
    fn test_custom_trigger_acceptance() {
        let mut analysis = GeneratorKineAnalysis::with_fiducial_cuts(
            AnalysisConfig::default(),
            Box::new(AcceptanceWindows::default()),
            Box::new(RejectAll),
        )
        .unwrap();
        let summary = analysis.process_event(&test_event()).unwrap();
        assert_eq!(summary.candidates.values().sum::<usize>(), 0);
        assert_eq!(entries(&analysis, "hPtHard"), 1);
        assert_eq!(entries(&analysis, "hDirectPhotonPt"), 0);
    }

    #[test]
    fn test_save_histograms() {
        let mut analysis = GeneratorKineAnalysis::new(AnalysisConfig::default()).unwrap();
        analysis.process_event(&test_event()).unwrap();
        let path = std::env::temp_dir().join(format!("genkine_hists_{}.bin", fastrand::u64(..)));
        let path = path.to_string_lossy().to_string();
        analysis.save_as(&path).unwrap();
        let loaded = HistogramRegistry::load_from(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(&loaded, analysis.histograms());
    }

    #[test]
    fn test_detector_setters() {
        let mut analysis = GeneratorKineAnalysis::new(AnalysisConfig::default()).unwrap();
        analysis.set_trigger_detector("PHOS").unwrap();
        assert_eq!(analysis.config().trigger_detector, Detector::Phos);
        analysis.set_trigger_detector("DCAL+PHOS").unwrap();
        assert_eq!(analysis.config().trigger_detector, Detector::DcalPhos);
        analysis.set_trigger_detector_index(2).unwrap();
        assert_eq!(analysis.config().trigger_detector, Detector::Cts);
        assert!(matches!(
            analysis.set_trigger_detector("XYZ"),
            Err(GenKineError::UnknownDetector { .. })
        ));
        assert!(analysis.set_trigger_detector_index(7).is_err());
        assert_eq!(analysis.config().trigger_detector, Detector::Cts);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = AnalysisConfig::default();
        config.ranges.pt_bins = 0;
        assert!(GeneratorKineAnalysis::new(config).is_err());
    }

    #[test]
    fn test_summary() {
        let mut analysis = GeneratorKineAnalysis::new(AnalysisConfig::default()).unwrap();
        let summary = analysis.process_event(&test_event()).unwrap();
        assert_eq!(summary.n_primaries, 9);
        assert_eq!(summary.candidates[Species::DirectPhoton], 1);
        assert_eq!(summary.candidates.values().sum::<usize>(), 1);
        assert_eq!(summary.correlated, 1);
        assert_eq!(summary.xe_hadrons, 0);
    }

    #[test]
    fn test_missing_container_is_fatal() {
        let mut analysis = GeneratorKineAnalysis::new(AnalysisConfig::default()).unwrap();
        let event = Event {
            mode: ReadingMode::AodMc,
            ..test_event()
        };
        assert!(matches!(
            analysis.process_event(&event),
            Err(GenKineError::MissingTruthContainer { .. })
        ));
        let events = vec![test_event(), event, test_event()];
        assert!(analysis.run(events.iter()).is_err());
        assert_eq!(
            analysis
                .histograms()
                .get_1d("hDirectPhotonPt")
                .unwrap()
                .entries,
            1
        );
    }

    #[test]
    fn test_run_over_events() {
        let mut analysis = GeneratorKineAnalysis::new(AnalysisConfig::default()).unwrap();
        let events = vec![
            test_event(),
            test_event().to_aod().unwrap(),
            Event {
                header: GeneratorHeader::Missing,
                ..test_event()
            },
        ];
        let summary = analysis.run(events.iter()).unwrap();
        assert_eq!(summary.events, 3);
        assert_eq!(summary.candidates[Species::DirectPhoton], 3);
        assert_eq!(summary.correlated, 3);
        let histograms = analysis.into_histograms();
        assert_eq!(histograms.get_1d("hPtHard").unwrap().entries, 3);
        assert_eq!(
            histograms
                .get_2d("hPtAcceptedGammaJetLeading")
                .unwrap()
                .entries,
            2
        );
    }
}
