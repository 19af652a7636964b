//! # genkine
//!
//! Generator-level photon, $`\pi^0`$ and $`\eta`$ isolation studies with parton, jet and hadron
//! correlations.
//!
//! For every simulated event, the two hard-scattering partons (stored at fixed positions `6` and
//! `7` of the generator particle list) are matched to the closest hard-process jets. Every
//! final-state photon, $`\pi^0`$ or $`\eta`$ inside the trigger acceptance is then classified by
//! species, tested for being the leading particle of the event and for being isolated inside a
//! cone, traced back to its originating parton, and correlated with the parton, the matched jet
//! and the charged hadrons on the away side. The results are accumulated in a
//! [`HistogramRegistry`] which can be saved at the end of the run.
//!
//! ```ignore
//! use genkine::{AnalysisConfig, GeneratorKineAnalysis};
//!
//! let mut analysis = GeneratorKineAnalysis::new(AnalysisConfig::default())?;
//! analysis.set_trigger_detector("EMCAL")?;
//! analysis.run(events.iter())?;
//! analysis.save_as("~/genkine_histograms.bin")?;
//! ```
#![warn(clippy::perf, clippy::style)]
#![warn(missing_docs)]

use thiserror::Error;

/// The per-event driver which ties all of the analysis steps together.
pub mod analysis;
/// Walking mother links back to the hard-scattering partons.
pub mod ancestry;
/// Analysis configuration and histogram binning.
pub mod config;
/// Correlations of a trigger with its parton, its jet and the away-side hadrons.
pub mod correlation;
/// Detector acceptance and isolation cone policies.
pub mod cuts;
/// Generator particle records, particle lists and event readers.
pub mod data;
/// Binned accumulators and the registry which owns them.
pub mod histograms;
/// Leading-particle and isolation decisions.
pub mod isolation;
/// Booking and filling of the full set of output histograms.
pub mod output;
/// Hard-scattering partons and their matched jets.
pub mod partons;
/// Particle Data Group codes and charges.
pub mod pdg;
/// Selection and species classification of trigger candidates.
pub mod trigger;
/// Utility functions, enums, and kinematics.
pub mod utils;

pub use crate::analysis::{EventSummary, GeneratorKineAnalysis, RunSummary};
pub use crate::ancestry::{resolve_hard_parton, Ancestry};
pub use crate::config::{AnalysisConfig, HistogramRanges};
pub use crate::cuts::{AcceptanceWindow, AcceptanceWindows, FiducialCut, IsolationCut};
pub use crate::data::{
    read_events, write_events, AodMcParticle, Event, EventReader, GeneratorHeader, McParticle,
    ParticleSource, StackParticle,
};
pub use crate::histograms::{Histogram, Histogram1D, Histogram2D, HistogramRegistry};
pub use crate::partons::{HardParton, HardProcess, PartonSlot};
pub use crate::utils::enums::{
    Detector, IsolationMethod, Leading, NeutralVariant, PartonFlavor, ReadingMode, Species,
    VariantMap,
};
pub use crate::utils::vectors::{Vec3, Vec4};

/// Shorthand for results returned by fallible `genkine` methods.
pub type GenKineResult<T> = Result<T, GenKineError>;

/// The error type used by all `genkine` internal methods
///
/// Every variant is fatal for the run in which it occurs. Conditions which only affect a single
/// particle or trigger candidate (broken ancestry chains, too few primaries, acceptance
/// rejections) are not errors and never surface here.
#[derive(Error, Debug)]
pub enum GenKineError {
    /// An alias for [`std::io::Error`].
    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),
    /// An alias for [`serde_json::Error`].
    #[error("JSON Error: {0}")]
    JsonError(#[from] serde_json::Error),
    /// An alias for [`bincode::Error`].
    #[error("Serialization Error: {0}")]
    SerdeError(#[from] bincode::Error),
    /// An alias for [`shellexpand::LookupError`].
    #[error("Failed to expand path: {0}")]
    LookupError(#[from] shellexpand::LookupError<std::env::VarError>),
    /// An error which occurs when the user tries to parse an invalid string of text, typically
    /// into an enum variant.
    #[error("Failed to parse string: \"{name}\" does not correspond to a valid \"{object}\"!")]
    ParseError {
        /// The string which was parsed
        name: String,
        /// The name of the object it failed to parse into
        object: String,
    },
    /// A detector name or index outside of the known set of detectors.
    #[error("Detector < {name} > not known!")]
    UnknownDetector {
        /// The rejected name or index
        name: String,
    },
    /// The generator particle container required by the reading mode is not available.
    #[error("{mode} particles not available, is the MC handler called?")]
    MissingTruthContainer {
        /// The reading mode which required the container
        mode: ReadingMode,
    },
    /// A PDG code without a known charge, which a reduced record cannot store.
    #[error("No known charge for PDG code {pdg}!")]
    UnknownCharge {
        /// The code without a charge
        pdg: i32,
    },
    /// An error which occurs when two histograms are booked under the same name.
    #[error("A histogram by the name \"{name}\" is already booked!")]
    RegistrationError {
        /// Name of the histogram which is already booked
        name: String,
    },
    /// A configuration value which cannot be used.
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
    /// A custom fallback error for errors too complex or too infrequent to warrant their own error
    /// category.
    #[error("{0}")]
    Custom(String),
}
