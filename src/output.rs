use crate::{
    config::HistogramRanges,
    correlation::{PartonCorrelation, XeEntry, XeSide},
    histograms::{Axis, Hist1DID, Hist2DID, HistogramRegistry},
    isolation::IsolationDecision,
    partons::{HardProcess, PartonSlot},
    utils::enums::{
        Leading, LeadingMap, NeutralVariant, PartonFlavor, Species, SpeciesMap, VariantMap,
    },
    GenKineResult,
};

fn ratio_axis(title: &str) -> Axis {
    Axis::new(200, 0.0, 2.0).with_title(title)
}

fn flavor_axis() -> Axis {
    Axis::new(3, 0.0, 3.0)
        .with_title("Parton type")
        .with_labels(PartonFlavor::labels())
}

/// Hard-process histograms filled once per event.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EventHistograms {
    /// $`\hat{p}_T`$.
    pub pt_hard: Hist1DID,
    /// $`p_T`$ of both hard partons.
    pub pt_parton: Hist1DID,
    /// $`p_T`$ of both matched jets.
    pub pt_jet: Hist1DID,
    /// Parton $`p_T / \hat{p}_T`$ against $`\hat{p}_T`$.
    pub parton_over_hard: Hist2DID,
    /// Jet $`p_T / \hat{p}_T`$ against $`\hat{p}_T`$.
    pub jet_over_hard: Hist2DID,
    /// Jet $`p_T`$ over parton $`p_T`$ against $`\hat{p}_T`$.
    pub jet_over_parton: Hist2DID,
}

impl EventHistograms {
    fn book(registry: &mut HistogramRegistry, ranges: &HistogramRanges) -> GenKineResult<Self> {
        let pt = |title: &str| ranges.pt_axis().with_title(title);
        let pt_hard_title = "p_{T}^{hard} (GeV/c)";
        Ok(Self {
            pt_hard: registry.book_1d("hPtHard", "pt hard", pt(pt_hard_title))?,
            pt_parton: registry.book_1d("hPtParton", "pt parton", pt("p_{T}^{parton} (GeV/c)"))?,
            pt_jet: registry.book_1d("hPtJet", "pt jet", pt("p_{T}^{jet} (GeV/c)"))?,
            parton_over_hard: registry.book_2d(
                "hPtPartonPtHard",
                "parton pt / pt hard",
                pt(pt_hard_title),
                ratio_axis("p_{T}^{parton}/p_{T}^{hard}"),
            )?,
            jet_over_hard: registry.book_2d(
                "hPtJetPtHard",
                "jet pt / pt hard",
                pt(pt_hard_title),
                ratio_axis("p_{T}^{jet}/p_{T}^{hard}"),
            )?,
            jet_over_parton: registry.book_2d(
                "hPtJetPtParton",
                "jet pt / parton pt",
                pt(pt_hard_title),
                ratio_axis("p_{T}^{jet}/p_{T}^{parton}"),
            )?,
        })
    }
}

/// A histogram together with its copy restricted to isolated triggers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IsolationPair {
    /// Every trigger.
    pub all: Hist2DID,
    /// Isolated triggers only.
    pub isolated: Hist2DID,
}

impl IsolationPair {
    fn fill(&self, registry: &mut HistogramRegistry, isolated: bool, x: f64, y: f64) {
        registry.fill_2d(self.all, x, y);
        if isolated {
            registry.fill_2d(self.isolated, x, y);
        }
    }
}

/// Trigger correlation histograms for one species, leading tag and neutral variant.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CorrelationHistograms {
    /// Near-side parton flavour.
    pub parton_type_near: IsolationPair,
    /// Away-side parton flavour.
    pub parton_type_away: IsolationPair,
    /// $`p_T / \hat{p}_T`$.
    pub z_hard: IsolationPair,
    /// $`p_T`$ over near-side parton $`p_T`$.
    pub z_parton: IsolationPair,
    /// $`p_T`$ over near-side jet $`p_T`$.
    pub z_jet: IsolationPair,
    /// $`x_E`$ of away-side hadrons.
    pub xe: IsolationPair,
    /// $`x_E`$ of underlying-event hadrons.
    pub xe_ue: IsolationPair,
}

impl CorrelationHistograms {
    fn book(
        registry: &mut HistogramRegistry,
        ranges: &HistogramRanges,
        species: Species,
        leading: Leading,
        variant: NeutralVariant,
    ) -> GenKineResult<Self> {
        let pt = ranges.pt_axis().with_title("p_{T}^{particle} (GeV/c)");
        let mut pair =
            |quantity: &str, description: &str, y: Axis| -> GenKineResult<IsolationPair> {
                let base = format!("h{}{}{}", species.name(), quantity, leading.tag());
                let title = format!(
                    "{}: {}, {}{}",
                    species.title(),
                    description,
                    leading.tag(),
                    variant.title()
                );
                Ok(IsolationPair {
                    all: registry.book_2d(
                        &format!("{base}{}", variant.suffix()),
                        &title,
                        pt.clone(),
                        y.clone(),
                    )?,
                    isolated: registry.book_2d(
                        &format!("{base}Isolated{}", variant.suffix()),
                        &format!("{title}, isolated"),
                        pt.clone(),
                        y,
                    )?,
                })
            };
        Ok(Self {
            parton_type_near: pair("PtPartonTypeNear", "near parton type", flavor_axis())?,
            parton_type_away: pair("PtPartonTypeAway", "away parton type", flavor_axis())?,
            z_hard: pair("ZHard", "z hard", ratio_axis("p_{T}^{particle}/p_{T}^{hard}"))?,
            z_parton: pair(
                "ZParton",
                "z parton",
                ratio_axis("p_{T}^{particle}/p_{T}^{parton}"),
            )?,
            z_jet: pair("ZJet", "z jet", ratio_axis("p_{T}^{particle}/p_{T}^{jet}"))?,
            xe: pair("XE", "x_{E}", ratio_axis("x_{E}"))?,
            xe_ue: pair("XEUE", "x_{E} underlying event", ratio_axis("x_{E}"))?,
        })
    }
}

/// Leading and isolation histograms for one species and neutral variant.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VariantHistograms {
    /// $`p_T`$ of leading triggers.
    pub pt_leading: Hist1DID,
    /// $`p_T`$ of leading and isolated triggers.
    pub pt_leading_isolated: Hist1DID,
    /// $`p_T`$ against cone $`\sum p_T`$ for leading triggers.
    pub pt_leading_sum_pt: Hist2DID,
    /// Correlation histograms per leading tag.
    pub correlation: LeadingMap<CorrelationHistograms>,
}

/// Every histogram of one trigger species.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpeciesHistograms {
    /// Candidate $`p_T`$ spectrum.
    pub pt: Hist1DID,
    /// Per neutral variant.
    pub variants: VariantMap<VariantHistograms>,
}

impl SpeciesHistograms {
    fn book(
        registry: &mut HistogramRegistry,
        ranges: &HistogramRanges,
        species: Species,
    ) -> GenKineResult<Self> {
        let name = species.name();
        let pt = registry.book_1d(
            &format!("h{name}Pt"),
            &format!("Input {} p_{{T}}", species.title()),
            ranges.pt_axis(),
        )?;
        let variants = VariantMap::try_from_fn(|variant| -> GenKineResult<VariantHistograms> {
            let suffix = variant.suffix();
            let title = format!("{}{}", species.title(), variant.title());
            Ok(VariantHistograms {
                pt_leading: registry.book_1d(
                    &format!("h{name}PtLeading{suffix}"),
                    &format!("Leading {title}"),
                    ranges.pt_axis(),
                )?,
                pt_leading_isolated: registry.book_1d(
                    &format!("h{name}PtLeadingIsolated{suffix}"),
                    &format!("Leading isolated {title}"),
                    ranges.pt_axis(),
                )?,
                pt_leading_sum_pt: registry.book_2d(
                    &format!("h{name}PtLeadingSumPt{suffix}"),
                    &format!("Leading {title} vs cone #Sigma p_{{T}}"),
                    ranges.pt_axis(),
                    ranges.pt_sum_axis(),
                )?,
                correlation: LeadingMap::try_from_fn(|leading| {
                    CorrelationHistograms::book(registry, ranges, species, leading, variant)
                })?,
            })
        })?;
        Ok(Self { pt, variants })
    }
}

/// The full set of booked histograms.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputHistograms {
    /// Hard-process histograms.
    pub event: EventHistograms,
    /// Accepted direct-photon triggers against the away-side parton flavour.
    pub gamma_jet: LeadingMap<VariantMap<Hist2DID>>,
    /// Per trigger species.
    pub species: SpeciesMap<SpeciesHistograms>,
}

impl OutputHistograms {
    /// Book every histogram in `registry`.
    ///
    /// # Errors
    ///
    /// Fails if a histogram name is already taken in `registry`.
    pub fn book(registry: &mut HistogramRegistry, ranges: &HistogramRanges) -> GenKineResult<Self> {
        let event = EventHistograms::book(registry, ranges)?;
        let gamma_jet = LeadingMap::try_from_fn(|leading| {
            VariantMap::try_from_fn(|variant| {
                registry.book_2d(
                    &format!("hPtAcceptedGammaJet{}{}", leading.tag(), variant.suffix()),
                    &format!(
                        "Direct #gamma back-to-back with a central jet, {}{}",
                        leading.tag(),
                        variant.title()
                    ),
                    ranges.pt_axis(),
                    flavor_axis(),
                )
            })
        })?;
        let species = SpeciesMap::try_from_fn(|species| {
            SpeciesHistograms::book(registry, ranges, species)
        })?;
        Ok(Self {
            event,
            gamma_jet,
            species,
        })
    }

    /// Fill the hard-process histograms.
    pub fn fill_event(&self, registry: &mut HistogramRegistry, process: &HardProcess) {
        let h = &self.event;
        let pt_hard = process.pt_hard;
        registry.fill_1d(h.pt_hard, pt_hard);
        for slot in PartonSlot::ALL {
            registry.fill_1d(h.pt_jet, process.jet(slot).pt());
        }
        for slot in PartonSlot::ALL {
            registry.fill_1d(h.pt_parton, process.parton(slot).pt());
        }
        if pt_hard > 0.0 {
            for slot in PartonSlot::ALL {
                registry.fill_2d(h.parton_over_hard, pt_hard, process.parton(slot).pt() / pt_hard);
            }
            for slot in PartonSlot::ALL {
                registry.fill_2d(h.jet_over_hard, pt_hard, process.jet(slot).pt() / pt_hard);
            }
        }
        for slot in PartonSlot::ALL {
            let parton_pt = process.parton(slot).pt();
            if parton_pt > 0.0 {
                registry.fill_2d(h.jet_over_parton, pt_hard, process.jet(slot).pt() / parton_pt);
            }
        }
    }

    /// Fill the candidate spectrum of `species`.
    pub fn fill_candidate(&self, registry: &mut HistogramRegistry, species: Species, pt: f64) {
        registry.fill_1d(self.species[species].pt, pt);
    }

    /// Fill the leading and isolation histograms of every variant.
    pub fn fill_leading(
        &self,
        registry: &mut HistogramRegistry,
        species: Species,
        pt: f64,
        decisions: &VariantMap<IsolationDecision>,
    ) {
        for (variant, decision) in decisions.iter() {
            if !decision.leading {
                continue;
            }
            let h = &self.species[species].variants[variant];
            registry.fill_1d(h.pt_leading, pt);
            registry.fill_2d(h.pt_leading_sum_pt, pt, decision.cone_sum_pt);
            if decision.isolated {
                registry.fill_1d(h.pt_leading_isolated, pt);
            }
        }
    }

    /// Fill the parton, jet and gamma-jet histograms of every variant.
    pub fn fill_correlation(
        &self,
        registry: &mut HistogramRegistry,
        species: Species,
        pt: f64,
        decisions: &VariantMap<IsolationDecision>,
        correlation: &PartonCorrelation,
    ) {
        for (variant, decision) in decisions.iter() {
            let leading = Leading::from(decision.leading);
            let h = &self.species[species].variants[variant].correlation[leading];
            let isolated = decision.isolated;
            h.parton_type_near
                .fill(registry, isolated, pt, correlation.near_flavor.code());
            h.parton_type_away
                .fill(registry, isolated, pt, correlation.away_flavor.code());
            h.z_hard.fill(registry, isolated, pt, correlation.z.hard);
            h.z_parton.fill(registry, isolated, pt, correlation.z.parton);
            h.z_jet.fill(registry, isolated, pt, correlation.z.jet);
            if correlation.gamma_jet_accepted {
                registry.fill_2d(
                    self.gamma_jet[leading][variant],
                    pt,
                    correlation.away_flavor.code(),
                );
            }
        }
    }

    /// Fill the $`x_E`$ histograms of every variant.
    pub fn fill_xe(
        &self,
        registry: &mut HistogramRegistry,
        species: Species,
        pt: f64,
        decisions: &VariantMap<IsolationDecision>,
        entries: &[XeEntry],
    ) {
        for entry in entries {
            for (variant, decision) in decisions.iter() {
                let leading = Leading::from(decision.leading);
                let h = &self.species[species].variants[variant].correlation[leading];
                let pair = match entry.side {
                    XeSide::AwayParton => &h.xe,
                    XeSide::UnderlyingEvent => &h.xe_ue,
                };
                pair.fill(registry, decision.isolated, pt, entry.xe);
            }
        }
    }
}
