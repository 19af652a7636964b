use crate::{data::ParticleSource, partons::PartonSlot};

/// Minimum list length for the hard-parton slots to be looked up.
pub const MIN_PRIMARIES: usize = 7;

/// Where the first-mother chain of a particle ends.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Ancestry {
    /// The chain reaches one of the hard-parton slots.
    HardParton(PartonSlot),
    /// The chain ends below the hard-parton slots at the given index.
    NotHardProcess(i32),
    /// A negative or out-of-range index was met, or the chain loops.
    BrokenChain,
    /// The particle list is too short to hold the hard partons.
    TooFewPrimaries,
}

impl Ancestry {
    /// The hard-parton slot, if the chain reached one.
    pub fn slot(&self) -> Option<PartonSlot> {
        match self {
            Ancestry::HardParton(slot) => Some(*slot),
            _ => None,
        }
    }
}

/// Follow first-mother links from the particle at `index` until the chain reaches an index of
/// at most 7.
pub fn resolve_hard_parton(source: &dyn ParticleSource, index: usize) -> Ancestry {
    let n = source.n_primaries();
    if n < MIN_PRIMARIES {
        return Ancestry::TooFewPrimaries;
    }
    let Some(particle) = source.particle(index) else {
        return Ancestry::BrokenChain;
    };
    let mut current = particle.first_mother();
    let mut steps = 0;
    while current > PartonSlot::Seven.index() {
        steps += 1;
        match source.particle_at(current) {
            Some(mother) if steps <= n => current = mother.first_mother(),
            _ => return Ancestry::BrokenChain,
        }
    }
    if current < 0 {
        return Ancestry::BrokenChain;
    }
    match PartonSlot::from_index(current) {
        Some(slot) => Ancestry::HardParton(slot),
        None => Ancestry::NotHardProcess(current),
    }
}
