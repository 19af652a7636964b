use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::GenKineError;

/// Generates a fixed-size map keyed by every variant of a fieldless enum.
///
/// The variants must be listed in declaration order so that `key as usize` is the array position.
macro_rules! enum_map {
    ($(#[$meta:meta])* $map:ident, $key:ident, $n:literal, [$($variant:ident),+ $(,)?]) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq)]
        pub struct $map<T>([T; $n]);

        impl<T> $map<T> {
            /// Build the map by evaluating `f` once per key.
            pub fn from_fn(mut f: impl FnMut($key) -> T) -> Self {
                Self([$(f($key::$variant)),+])
            }

            /// Build the map by evaluating a fallible `f` once per key, stopping at the first
            /// error.
            pub fn try_from_fn<E>(
                mut f: impl FnMut($key) -> Result<T, E>,
            ) -> Result<Self, E> {
                Ok(Self([$(f($key::$variant)?),+]))
            }

            /// Iterate over `(key, value)` pairs in key order.
            pub fn iter(&self) -> impl Iterator<Item = ($key, &T)> {
                [$($key::$variant),+].into_iter().zip(self.0.iter())
            }

            /// Iterate over the values in key order.
            pub fn values(&self) -> impl Iterator<Item = &T> {
                self.0.iter()
            }
        }

        impl<T: Default> Default for $map<T> {
            fn default() -> Self {
                Self::from_fn(|_| T::default())
            }
        }

        impl<T> ::std::ops::Index<$key> for $map<T> {
            type Output = T;
            fn index(&self, key: $key) -> &T {
                &self.0[key as usize]
            }
        }

        impl<T> ::std::ops::IndexMut<$key> for $map<T> {
            fn index_mut(&mut self, key: $key) -> &mut T {
                &mut self.0[key as usize]
            }
        }
    };
}
pub(crate) use enum_map;

/// The detectors which can define the trigger acceptance.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Detector {
    /// The electromagnetic calorimeter.
    #[default]
    Emcal,
    /// The photon spectrometer.
    Phos,
    /// The central tracking system.
    Cts,
    /// The di-jet calorimeter.
    Dcal,
    /// The di-jet calorimeter and the photon spectrometer together.
    DcalPhos,
}

impl Detector {
    /// All detectors, ordered by their numeric index.
    pub const ALL: [Detector; 5] = [
        Detector::Emcal,
        Detector::Phos,
        Detector::Cts,
        Detector::Dcal,
        Detector::DcalPhos,
    ];

    /// The numeric index used by the integer form of the detector selection.
    pub fn index(&self) -> i32 {
        *self as i32
    }
}

impl Display for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Detector::Emcal => write!(f, "EMCAL"),
            Detector::Phos => write!(f, "PHOS"),
            Detector::Cts => write!(f, "CTS"),
            Detector::Dcal => write!(f, "DCAL"),
            Detector::DcalPhos => write!(f, "DCAL_PHOS"),
        }
    }
}

impl FromStr for Detector {
    type Err = GenKineError;

    /// Exact upper-case names select a single detector. Any other name mentioning both `DCAL`
    /// and `PHOS` selects [`Detector::DcalPhos`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EMCAL" => Ok(Self::Emcal),
            "PHOS" => Ok(Self::Phos),
            "CTS" => Ok(Self::Cts),
            "DCAL" => Ok(Self::Dcal),
            _ if s.contains("DCAL") && s.contains("PHOS") => Ok(Self::DcalPhos),
            _ => Err(GenKineError::UnknownDetector {
                name: s.to_string(),
            }),
        }
    }
}

impl TryFrom<i32> for Detector {
    type Error = GenKineError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| GenKineError::UnknownDetector {
                name: value.to_string(),
            })
    }
}

/// How the cone activity around a trigger decides isolation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IsolationMethod {
    /// Isolated when no particle in the cone passes the $`p_T`$ threshold.
    #[default]
    PtThreshold,
    /// Isolated when the summed $`p_T`$ in the cone stays below the sum threshold.
    SumPt,
}

impl Display for IsolationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IsolationMethod::PtThreshold => write!(f, "pT threshold"),
            IsolationMethod::SumPt => write!(f, "sum pT"),
        }
    }
}

impl FromStr for IsolationMethod {
    type Err = GenKineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pt" | "ptthreshold" | "pt threshold" | "count" => Ok(Self::PtThreshold),
            "sum" | "sumpt" | "sum pt" => Ok(Self::SumPt),
            _ => Err(GenKineError::ParseError {
                name: s.to_string(),
                object: "IsolationMethod".to_string(),
            }),
        }
    }
}

/// The container the generator particles are read from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReadingMode {
    /// Full generator stack records.
    #[default]
    Stack,
    /// Reduced Monte-Carlo particle records as stored in analysis object data.
    AodMc,
}

impl Display for ReadingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadingMode::Stack => write!(f, "Stack"),
            ReadingMode::AodMc => write!(f, "AOD MC"),
        }
    }
}

impl FromStr for ReadingMode {
    type Err = GenKineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stack" | "esd" => Ok(Self::Stack),
            "aod" | "aodmc" | "aod mc" | "aod_mc" => Ok(Self::AodMc),
            _ => Err(GenKineError::ParseError {
                name: s.to_string(),
                object: "ReadingMode".to_string(),
            }),
        }
    }
}

/// The species assigned to a trigger candidate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Species {
    /// A photon produced directly in the hard process.
    DirectPhoton,
    /// A photon from a $`\pi^0`$ decay.
    Pi0DecayPhoton,
    /// A photon from an $`\eta`$ decay.
    EtaDecayPhoton,
    /// A photon from any other decay.
    OtherDecayPhoton,
    /// A $`\pi^0`$ decaying into two photons.
    Pi0,
    /// An $`\eta`$ decaying into two photons.
    Eta,
}

impl Species {
    /// All species, in histogram order.
    pub const ALL: [Species; 6] = [
        Species::DirectPhoton,
        Species::Pi0DecayPhoton,
        Species::EtaDecayPhoton,
        Species::OtherDecayPhoton,
        Species::Pi0,
        Species::Eta,
    ];

    /// The label used in histogram names.
    pub fn name(&self) -> &'static str {
        match self {
            Species::DirectPhoton => "DirectPhoton",
            Species::Pi0DecayPhoton => "Pi0DecayPhoton",
            Species::EtaDecayPhoton => "EtaDecayPhoton",
            Species::OtherDecayPhoton => "OtherDecayPhoton",
            Species::Pi0 => "Pi0",
            Species::Eta => "Eta",
        }
    }

    /// The label used in histogram titles.
    pub fn title(&self) -> &'static str {
        match self {
            Species::DirectPhoton => "direct #gamma",
            Species::Pi0DecayPhoton => "#gamma_{#pi decay}",
            Species::EtaDecayPhoton => "#gamma_{#eta decay}",
            Species::OtherDecayPhoton => "#gamma_{other decay}",
            Species::Pi0 => "#pi^{0}",
            Species::Eta => "#eta",
        }
    }
}

impl Display for Species {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Which neutral particles enter the leading and isolation tests alongside the charged ones.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NeutralVariant {
    /// All neutral particles.
    AllNeutral,
    /// Neutral particles inside the calorimeter acceptance.
    Calorimeter,
    /// Photons and $`\pi^0`$s only.
    Photon,
    /// Photons and $`\pi^0`$s inside the calorimeter acceptance.
    CalorimeterPhoton,
}

impl NeutralVariant {
    /// All variants, in histogram order.
    pub const ALL: [NeutralVariant; 4] = [
        NeutralVariant::AllNeutral,
        NeutralVariant::Calorimeter,
        NeutralVariant::Photon,
        NeutralVariant::CalorimeterPhoton,
    ];

    /// The suffix appended to histogram names.
    pub fn suffix(&self) -> &'static str {
        match self {
            NeutralVariant::AllNeutral => "",
            NeutralVariant::Calorimeter => "_EMC",
            NeutralVariant::Photon => "_Photon",
            NeutralVariant::CalorimeterPhoton => "_EMC_Photon",
        }
    }

    /// The description appended to histogram titles.
    pub fn title(&self) -> &'static str {
        match self {
            NeutralVariant::AllNeutral => "",
            NeutralVariant::Calorimeter => ", neutral in EMCal",
            NeutralVariant::Photon => ", neutral only #gamma-like",
            NeutralVariant::CalorimeterPhoton => ", neutral only #gamma-like in EMCal",
        }
    }

    /// Whether neutrals must lie in the calorimeter acceptance.
    pub fn requires_calorimeter(&self) -> bool {
        matches!(
            self,
            NeutralVariant::Calorimeter | NeutralVariant::CalorimeterPhoton
        )
    }

    /// Whether only photon-like neutrals count.
    pub fn photon_only(&self) -> bool {
        matches!(
            self,
            NeutralVariant::Photon | NeutralVariant::CalorimeterPhoton
        )
    }
}

impl Display for NeutralVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NeutralVariant::AllNeutral => write!(f, "all neutral"),
            _ => write!(f, "{}", &self.suffix()[1..]),
        }
    }
}

/// Whether the trigger was the leading particle of the event.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Leading {
    /// A particle with larger $`p_T`$ was found.
    NotLeading,
    /// No particle with larger $`p_T`$ was found.
    Leading,
}

impl Leading {
    /// Both tags, in histogram order.
    pub const ALL: [Leading; 2] = [Leading::NotLeading, Leading::Leading];

    /// The tag used in histogram names.
    pub fn tag(&self) -> &'static str {
        match self {
            Leading::NotLeading => "NotLeading",
            Leading::Leading => "Leading",
        }
    }
}

impl From<bool> for Leading {
    fn from(leading: bool) -> Self {
        if leading {
            Leading::Leading
        } else {
            Leading::NotLeading
        }
    }
}

/// The flavour class of a hard-scattering parton.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PartonFlavor {
    /// PDG code 22.
    Photon = 0,
    /// PDG code 21.
    Gluon = 1,
    /// Any other code.
    Quark = 2,
}

impl PartonFlavor {
    /// Classify a PDG code.
    pub fn from_pdg(pdg: i32) -> Self {
        match pdg {
            22 => PartonFlavor::Photon,
            21 => PartonFlavor::Gluon,
            _ => PartonFlavor::Quark,
        }
    }

    /// The value filled along the flavour axis of the parton-type histograms.
    pub fn code(&self) -> f64 {
        *self as i32 as f64
    }

    /// Bin labels for the flavour axis.
    pub fn labels() -> Vec<String> {
        vec!["#gamma".to_string(), "g".to_string(), "q".to_string()]
    }
}

impl Display for PartonFlavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartonFlavor::Photon => write!(f, "photon"),
            PartonFlavor::Gluon => write!(f, "gluon"),
            PartonFlavor::Quark => write!(f, "quark"),
        }
    }
}

enum_map!(
    /// One value per [`NeutralVariant`].
    VariantMap,
    NeutralVariant,
    4,
    [AllNeutral, Calorimeter, Photon, CalorimeterPhoton]
);

enum_map!(
    /// One value per [`Leading`] tag.
    LeadingMap,
    Leading,
    2,
    [NotLeading, Leading]
);

enum_map!(
    /// One value per trigger [`Species`].
    SpeciesMap,
    Species,
    6,
    [
        DirectPhoton,
        Pi0DecayPhoton,
        EtaDecayPhoton,
        OtherDecayPhoton,
        Pi0,
        Eta
    ]
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_displays() {
        assert_eq!(format!("{}", Detector::Emcal), "EMCAL");
        assert_eq!(format!("{}", Detector::DcalPhos), "DCAL_PHOS");
        assert_eq!(format!("{}", Species::Pi0DecayPhoton), "Pi0DecayPhoton");
        assert_eq!(format!("{}", NeutralVariant::AllNeutral), "all neutral");
        assert_eq!(format!("{}", NeutralVariant::CalorimeterPhoton), "EMC_Photon");
        assert_eq!(format!("{}", PartonFlavor::Gluon), "gluon");
        assert_eq!(format!("{}", ReadingMode::AodMc), "AOD MC");
    }

    #[test]
    fn test_detector_from_str() {
        assert_eq!("EMCAL".parse::<Detector>().unwrap(), Detector::Emcal);
        assert_eq!("PHOS".parse::<Detector>().unwrap(), Detector::Phos);
        assert_eq!("CTS".parse::<Detector>().unwrap(), Detector::Cts);
        assert_eq!("DCAL".parse::<Detector>().unwrap(), Detector::Dcal);
        assert_eq!("DCAL_PHOS".parse::<Detector>().unwrap(), Detector::DcalPhos);
        assert_eq!("PHOS+DCAL".parse::<Detector>().unwrap(), Detector::DcalPhos);
        assert!(matches!(
            "XYZ".parse::<Detector>(),
            Err(GenKineError::UnknownDetector { .. })
        ));
        assert!("EMCAL2".parse::<Detector>().is_err());
        for name in ["phos", "emcal", "Emcal", "dcal_phos", "cts "] {
            assert!(matches!(
                name.parse::<Detector>(),
                Err(GenKineError::UnknownDetector { .. })
            ));
        }
    }

    #[test]
    fn test_detector_from_index() {
        for detector in Detector::ALL {
            assert_eq!(Detector::try_from(detector.index()).unwrap(), detector);
            assert_eq!(
                detector.to_string().parse::<Detector>().unwrap(),
                detector
            );
        }
        assert_eq!(Detector::try_from(4).unwrap(), Detector::DcalPhos);
        assert!(Detector::try_from(5).is_err());
        assert!(Detector::try_from(-1).is_err());
    }

    #[test]
    fn test_other_parsers() {
        assert_eq!(
            "SumPt".parse::<IsolationMethod>().unwrap(),
            IsolationMethod::SumPt
        );
        assert_eq!(
            "count".parse::<IsolationMethod>().unwrap(),
            IsolationMethod::PtThreshold
        );
        assert!("median".parse::<IsolationMethod>().is_err());
        assert_eq!("aod".parse::<ReadingMode>().unwrap(), ReadingMode::AodMc);
        assert!("root".parse::<ReadingMode>().is_err());
    }

    #[test]
    fn test_parton_flavor() {
        assert_eq!(PartonFlavor::from_pdg(22), PartonFlavor::Photon);
        assert_eq!(PartonFlavor::from_pdg(21), PartonFlavor::Gluon);
        assert_eq!(PartonFlavor::from_pdg(2), PartonFlavor::Quark);
        assert_eq!(PartonFlavor::from_pdg(-5), PartonFlavor::Quark);
        assert_eq!(PartonFlavor::Quark.code(), 2.0);
        assert_eq!(PartonFlavor::labels().len(), 3);
    }

    #[test]
    fn test_variant_flags() {
        assert!(!NeutralVariant::AllNeutral.requires_calorimeter());
        assert!(!NeutralVariant::AllNeutral.photon_only());
        assert!(NeutralVariant::Calorimeter.requires_calorimeter());
        assert!(NeutralVariant::Photon.photon_only());
        assert!(NeutralVariant::CalorimeterPhoton.requires_calorimeter());
        assert!(NeutralVariant::CalorimeterPhoton.photon_only());
    }

    #[test]
    fn test_enum_maps() {
        let mut map = VariantMap::from_fn(|v| v.suffix().len());
        assert_eq!(map[NeutralVariant::AllNeutral], 0);
        assert_eq!(map[NeutralVariant::CalorimeterPhoton], 11);
        map[NeutralVariant::Photon] += 1;
        assert_eq!(map[NeutralVariant::Photon], 8);
        let keys: Vec<NeutralVariant> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, NeutralVariant::ALL.to_vec());

        let leading = LeadingMap::from_fn(|l| l.tag());
        assert_eq!(leading[Leading::from(true)], "Leading");
        assert_eq!(leading[Leading::from(false)], "NotLeading");

        let species: Result<SpeciesMap<&str>, String> = SpeciesMap::try_from_fn(|s| {
            if s == Species::Eta {
                Err(s.to_string())
            } else {
                Ok(s.name())
            }
        });
        assert_eq!(species.unwrap_err(), "Eta");
        let counts: SpeciesMap<usize> = SpeciesMap::default();
        assert_eq!(counts.values().sum::<usize>(), 0);
    }
}
