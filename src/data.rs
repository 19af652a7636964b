use std::{fmt::Display, fs::File, io::BufReader, io::BufWriter, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    pdg,
    utils::{enums::ReadingMode, vectors::Vec4},
    GenKineError, GenKineResult,
};

/// Status code of particles which leave the generator (final state).
pub const FINAL_STATE: i32 = 1;

/// An event that can be used to test the analysis. It holds nine stack records: six beam and
/// initial-state entries, a photon hard parton at index `6` with $`p_T = 10`$, a gluon hard
/// parton at index `7` with $`p_T = 8`$ and a final-state photon at index `8` with
/// $`p_T = 4`$ whose first mother is the photon parton. The generator header carries
/// $`\hat{p}_T = 10`$ and one jet close to each parton.
pub fn test_event() -> Event {
    use crate::utils::vectors::*;
    let near = 120.0_f64.to_radians();
    let away = -60.0_f64.to_radians();
    let initial = |pdg: i32, mother: i32, pz: f64| StackParticle {
        pdg,
        status: 21,
        first_mother: mother,
        daughters: [-1, -1],
        p4: Vec3::new(0.0, 0.0, pz).with_mass(0.0),
    };
    Event::from_stack(
        vec![
            initial(2212, -1, 6500.0), // beam
            initial(2212, -1, -6500.0), // beam
            initial(21, 0, 40.0),
            initial(2, 1, -25.0),
            initial(21, 2, 38.0),
            initial(2, 3, -24.0),
            StackParticle {
                pdg: pdg::PHOTON,
                status: 21,
                first_mother: 4,
                daughters: [8, 8],
                p4: Vec4::from_pt_eta_phi_m(10.0, 0.0, near, 0.0),
            },
            StackParticle {
                pdg: pdg::GLUON,
                status: 21,
                first_mother: 5,
                daughters: [-1, -1],
                p4: Vec4::from_pt_eta_phi_m(8.0, 0.1, away, 0.0),
            },
            StackParticle {
                pdg: pdg::PHOTON,
                status: FINAL_STATE,
                first_mother: 6,
                daughters: [-1, -1],
                p4: Vec4::from_pt_eta_phi_m(4.0, 0.0, near, 0.0),
            },
        ],
        GeneratorHeader::Pythia {
            pt_hard: 10.0,
            trigger_jets: vec![
                Vec4::from_pt_eta_phi_m(9.0, 0.05, near + 0.05, 0.0),
                Vec4::from_pt_eta_phi_m(7.0, 0.1, away - 0.05, 0.0),
            ],
        },
    )
}

/// A read-only view of one generator particle.
pub trait McParticle {
    /// Particle Data Group code.
    fn pdg(&self) -> i32;
    /// Generator status code.
    fn status(&self) -> i32;
    /// Index of the first mother, negative when there is none.
    fn first_mother(&self) -> i32;
    /// Index of the first (`slot = 0`) or last (`slot = 1`) daughter, negative when absent.
    fn daughter(&self, slot: usize) -> i32;
    /// Number of daughters.
    fn n_daughters(&self) -> usize;
    /// Four-momentum.
    fn p4(&self) -> Vec4;
    /// Electric charge in units of $`e`$, [`None`] when it cannot be determined.
    fn charge(&self) -> Option<f64>;

    /// Whether the particle is in the final state.
    fn is_final_state(&self) -> bool {
        self.status() == FINAL_STATE
    }
}

fn count_daughters(daughters: &[i32; 2]) -> usize {
    match *daughters {
        [first, _] if first < 0 => 0,
        [_, last] if last < 0 => 1,
        [first, last] => usize::try_from(last - first + 1).unwrap_or(0),
    }
}

/// A full generator stack record. The charge is looked up from the PDG code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StackParticle {
    /// Particle Data Group code.
    pub pdg: i32,
    /// Generator status code.
    pub status: i32,
    /// Index of the first mother, negative when there is none.
    pub first_mother: i32,
    /// Indices of the first and last daughters, negative when absent.
    pub daughters: [i32; 2],
    /// Four-momentum.
    pub p4: Vec4,
}

impl McParticle for StackParticle {
    fn pdg(&self) -> i32 {
        self.pdg
    }
    fn status(&self) -> i32 {
        self.status
    }
    fn first_mother(&self) -> i32 {
        self.first_mother
    }
    fn daughter(&self, slot: usize) -> i32 {
        self.daughters.get(slot).copied().unwrap_or(-1)
    }
    fn n_daughters(&self) -> usize {
        count_daughters(&self.daughters)
    }
    fn p4(&self) -> Vec4 {
        self.p4
    }
    fn charge(&self) -> Option<f64> {
        pdg::charge(self.pdg)
    }
}

/// A reduced Monte-Carlo particle record. The charge is stored in units of $`e/3`$.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AodMcParticle {
    /// Particle Data Group code.
    pub pdg: i32,
    /// Generator status code.
    pub status: i32,
    /// Index of the mother, negative when there is none.
    pub mother: i32,
    /// Indices of the first and last daughters, negative when absent.
    pub daughters: [i32; 2],
    /// Four-momentum.
    pub p4: Vec4,
    /// Charge in units of $`e/3`$.
    pub charge: i16,
}

impl McParticle for AodMcParticle {
    fn pdg(&self) -> i32 {
        self.pdg
    }
    fn status(&self) -> i32 {
        self.status
    }
    fn first_mother(&self) -> i32 {
        self.mother
    }
    fn daughter(&self, slot: usize) -> i32 {
        self.daughters.get(slot).copied().unwrap_or(-1)
    }
    fn n_daughters(&self) -> usize {
        count_daughters(&self.daughters)
    }
    fn p4(&self) -> Vec4 {
        self.p4
    }
    fn charge(&self) -> Option<f64> {
        Some(f64::from(self.charge) / 3.0)
    }
}

impl TryFrom<&StackParticle> for AodMcParticle {
    type Error = GenKineError;

    /// The reduced record stores the charge, so the PDG code must have a known one.
    fn try_from(particle: &StackParticle) -> Result<Self, Self::Error> {
        let charge = particle
            .charge()
            .ok_or(GenKineError::UnknownCharge { pdg: particle.pdg })?;
        Ok(Self {
            pdg: particle.pdg,
            status: particle.status,
            mother: particle.first_mother,
            daughters: particle.daughters,
            p4: particle.p4,
            charge: (charge * 3.0).round() as i16,
        })
    }
}

/// Index-addressable access to the generator particles of one event.
pub trait ParticleSource {
    /// Number of particles.
    fn n_primaries(&self) -> usize;
    /// The particle at `index`, if it exists.
    fn particle(&self, index: usize) -> Option<&dyn McParticle>;

    /// The particle at a signed `index` as stored in mother/daughter links.
    fn particle_at(&self, index: i32) -> Option<&dyn McParticle> {
        usize::try_from(index).ok().and_then(|i| self.particle(i))
    }
}

impl<P: McParticle> ParticleSource for Vec<P> {
    fn n_primaries(&self) -> usize {
        self.len()
    }
    fn particle(&self, index: usize) -> Option<&dyn McParticle> {
        self.get(index).map(|p| p as &dyn McParticle)
    }
}

/// Generator-level information about the hard process.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum GeneratorHeader {
    /// A PYTHIA-type header with the hard-process scale and jets.
    Pythia {
        /// Transverse momentum of the hard process.
        pt_hard: f64,
        /// Jets reconstructed from the hard process.
        trigger_jets: Vec<Vec4>,
    },
    /// Any other generator.
    Other {
        /// Generator name.
        name: String,
    },
    /// No header available.
    #[default]
    Missing,
}

impl GeneratorHeader {
    /// The hard-process scale and jets, if this header carries them.
    pub fn hard_process(&self) -> Option<(f64, &[Vec4])> {
        match self {
            GeneratorHeader::Pythia {
                pt_hard,
                trigger_jets,
            } => Some((*pt_hard, trigger_jets.as_slice())),
            _ => None,
        }
    }
}

/// Access to the generator-level content of one event.
pub trait EventReader {
    /// Which container the analysis should read.
    fn mode(&self) -> ReadingMode;
    /// Full stack records, if available.
    fn stack(&self) -> Option<&Vec<StackParticle>>;
    /// Reduced Monte-Carlo records, if available.
    fn aod_mc_particles(&self) -> Option<&Vec<AodMcParticle>>;
    /// The generator header.
    fn generator_header(&self) -> &GeneratorHeader;

    /// Select the particle list matching [`EventReader::mode`].
    ///
    /// # Errors
    ///
    /// Returns [`GenKineError::MissingTruthContainer`] if the container for the mode is missing.
    fn particles(&self) -> GenKineResult<&dyn ParticleSource> {
        let mode = self.mode();
        let source = match mode {
            ReadingMode::Stack => self.stack().map(|s| s as &dyn ParticleSource),
            ReadingMode::AodMc => self.aod_mc_particles().map(|s| s as &dyn ParticleSource),
        };
        source.ok_or(GenKineError::MissingTruthContainer { mode })
    }
}

/// A self-contained generator-level event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Which container the analysis should read.
    pub mode: ReadingMode,
    /// Full stack records.
    pub stack: Option<Vec<StackParticle>>,
    /// Reduced Monte-Carlo records.
    pub aod_mc_particles: Option<Vec<AodMcParticle>>,
    /// The generator header.
    pub header: GeneratorHeader,
}

impl Event {
    /// An event read in [`ReadingMode::Stack`].
    pub fn from_stack(particles: Vec<StackParticle>, header: GeneratorHeader) -> Self {
        Self {
            mode: ReadingMode::Stack,
            stack: Some(particles),
            aod_mc_particles: None,
            header,
        }
    }

    /// Convert the stack records of this event into reduced records and read those instead.
    ///
    /// # Errors
    ///
    /// Returns [`GenKineError::UnknownCharge`] if a record has a PDG code without a known charge.
    pub fn to_aod(&self) -> GenKineResult<Self> {
        let aod_mc_particles = self
            .stack
            .as_ref()
            .map(|stack| {
                stack
                    .iter()
                    .map(AodMcParticle::try_from)
                    .collect::<GenKineResult<Vec<_>>>()
            })
            .transpose()?;
        Ok(Self {
            mode: ReadingMode::AodMc,
            stack: None,
            aod_mc_particles,
            header: self.header.clone(),
        })
    }
}

impl EventReader for Event {
    fn mode(&self) -> ReadingMode {
        self.mode
    }
    fn stack(&self) -> Option<&Vec<StackParticle>> {
        self.stack.as_ref()
    }
    fn aod_mc_particles(&self) -> Option<&Vec<AodMcParticle>> {
        self.aod_mc_particles.as_ref()
    }
    fn generator_header(&self) -> &GeneratorHeader {
        &self.header
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Event ({}):", self.mode)?;
        match self.particles() {
            Ok(particles) => {
                for i in 0..particles.n_primaries() {
                    if let Some(p) = particles.particle(i) {
                        writeln!(
                            f,
                            "  [{i}] pdg {} status {} mother {}: {}",
                            p.pdg(),
                            p.status(),
                            p.first_mother(),
                            p.p4().to_p4_string()
                        )?;
                    }
                }
            }
            Err(_) => writeln!(f, "  <no particles>")?,
        }
        Ok(())
    }
}

/// Read a list of events written by [`write_events`]. The path may contain `~` and environment
/// variables.
pub fn read_events(file_path: &str) -> GenKineResult<Vec<Event>> {
    let expanded_path = shellexpand::full(file_path)?;
    let file = File::open(Path::new(expanded_path.as_ref()))?;
    Ok(bincode::deserialize_from(BufReader::new(file))?)
}

/// Write a list of events with `bincode`. The path may contain `~` and environment variables.
pub fn write_events(file_path: &str, events: &[Event]) -> GenKineResult<()> {
    let expanded_path = shellexpand::full(file_path)?;
    let file = File::create(Path::new(expanded_path.as_ref()))?;
    bincode::serialize_into(BufWriter::new(file), events)?;
    Ok(())
}
