use log::debug;

use crate::{
    cuts::IsolationCut,
    data::{GeneratorHeader, ParticleSource},
    utils::{
        enums::{enum_map, PartonFlavor},
        vectors::Vec4,
    },
};

/// Best radius a jet has to beat to be matched when no cap is configured.
pub const DEFAULT_MATCH_RADIUS: f64 = 100.0;
/// Pseudorapidity used for matching when a hard-parton slot is absent.
pub const ABSENT_PARTON_ETA: f64 = -10.0;
/// Azimuth used for matching when a hard-parton slot is absent.
pub const ABSENT_PARTON_PHI: f64 = -1.0;

/// One of the two hard-scattering parton positions in the generator list.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PartonSlot {
    /// Index `6`.
    Six,
    /// Index `7`.
    Seven,
}

impl PartonSlot {
    /// Both slots.
    pub const ALL: [PartonSlot; 2] = [PartonSlot::Six, PartonSlot::Seven];

    /// The position in the generator list.
    pub fn index(&self) -> i32 {
        match self {
            PartonSlot::Six => 6,
            PartonSlot::Seven => 7,
        }
    }

    /// The slot at a position in the generator list.
    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            6 => Some(PartonSlot::Six),
            7 => Some(PartonSlot::Seven),
            _ => None,
        }
    }

    /// The recoiling slot.
    pub fn other(&self) -> Self {
        match self {
            PartonSlot::Six => PartonSlot::Seven,
            PartonSlot::Seven => PartonSlot::Six,
        }
    }
}

enum_map!(
    /// One value per [`PartonSlot`].
    SlotMap,
    PartonSlot,
    2,
    [Six, Seven]
);

/// A hard-scattering parton read from its slot.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct HardParton {
    /// Four-momentum, zero when absent.
    pub p4: Vec4,
    /// PDG code, zero when absent.
    pub pdg: i32,
    /// Whether the generator list was long enough to hold this slot.
    pub present: bool,
}

impl HardParton {
    /// Transverse momentum, zero when absent.
    pub fn pt(&self) -> f64 {
        self.p4.pt()
    }

    /// $`(\eta, \phi)`$ used for jet matching, with $`\phi`$ in $`[0, 2\pi)`$.
    pub fn matching_direction(&self) -> (f64, f64) {
        if self.present {
            (self.p4.eta(), self.p4.phi_positive())
        } else {
            (ABSENT_PARTON_ETA, ABSENT_PARTON_PHI)
        }
    }

    /// The flavour class.
    pub fn flavor(&self) -> PartonFlavor {
        PartonFlavor::from_pdg(self.pdg)
    }
}

/// Read both hard-parton slots. A slot beyond the end of the list is absent.
pub fn read_hard_partons(source: &dyn ParticleSource) -> SlotMap<HardParton> {
    SlotMap::from_fn(|slot| {
        usize::try_from(slot.index())
            .ok()
            .and_then(|index| source.particle(index))
            .map_or_else(HardParton::default, |p| HardParton {
                p4: p.p4(),
                pdg: p.pdg(),
                present: true,
            })
    })
}

/// For each parton, the first jet whose radius is strictly smaller than every previous jet's and
/// than `initial_radius`. Unmatched slots get a zero four-momentum.
pub fn match_jets(
    partons: &SlotMap<HardParton>,
    jets: &[Vec4],
    initial_radius: f64,
) -> SlotMap<Vec4> {
    SlotMap::from_fn(|slot| {
        let (eta, phi) = partons[slot].matching_direction();
        let mut best_radius = initial_radius;
        let mut best = Vec4::default();
        for jet in jets {
            let radius = IsolationCut::radius(eta, phi, jet.eta(), jet.phi_positive());
            if radius < best_radius {
                best_radius = radius;
                best = *jet;
            }
        }
        best
    })
}

/// The per-event hard-process kinematics.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct HardProcess {
    /// Transverse momentum of the hard process, zero without a suitable header.
    pub pt_hard: f64,
    /// The partons at slots `6` and `7`.
    pub partons: SlotMap<HardParton>,
    /// The jet matched to each parton.
    pub jets: SlotMap<Vec4>,
}

impl HardProcess {
    /// Read the hard partons and match them to the jets of the generator header.
    ///
    /// With a `max_match_radius`, jets at or beyond that radius from a parton are never matched.
    pub fn from_event(
        source: &dyn ParticleSource,
        header: &GeneratorHeader,
        max_match_radius: Option<f64>,
    ) -> Self {
        let partons = read_hard_partons(source);
        let (pt_hard, jets) = match header.hard_process() {
            Some((pt_hard, trigger_jets)) => (
                pt_hard,
                match_jets(
                    &partons,
                    trigger_jets,
                    max_match_radius.unwrap_or(DEFAULT_MATCH_RADIUS),
                ),
            ),
            None => (0.0, SlotMap::default()),
        };
        let process = Self {
            pt_hard,
            partons,
            jets,
        };
        debug!(
            "pT hard {:.2}, parton 6 (pT {:.2}, pdg {}), parton 7 (pT {:.2}, pdg {}), \
             jets pT {:.2} / {:.2}",
            process.pt_hard,
            process.partons[PartonSlot::Six].pt(),
            process.partons[PartonSlot::Six].pdg,
            process.partons[PartonSlot::Seven].pt(),
            process.partons[PartonSlot::Seven].pdg,
            process.jets[PartonSlot::Six].pt(),
            process.jets[PartonSlot::Seven].pt(),
        );
        process
    }

    /// The parton in `slot`.
    pub fn parton(&self, slot: PartonSlot) -> &HardParton {
        &self.partons[slot]
    }

    /// The jet matched to the parton in `slot`.
    pub fn jet(&self, slot: PartonSlot) -> &Vec4 {
        &self.jets[slot]
    }
}
