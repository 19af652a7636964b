use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::{
    cuts::{AcceptanceWindows, IsolationCut},
    histograms::Axis,
    utils::enums::Detector,
    GenKineError, GenKineResult,
};

/// Binning of the transverse-momentum axes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramRanges {
    /// Number of $`p_T`$ bins.
    pub pt_bins: usize,
    /// Lower $`p_T`$ edge.
    pub pt_min: f64,
    /// Upper $`p_T`$ edge.
    pub pt_max: f64,
    /// Number of cone-sum $`p_T`$ bins.
    pub pt_sum_bins: usize,
    /// Lower cone-sum $`p_T`$ edge.
    pub pt_sum_min: f64,
    /// Upper cone-sum $`p_T`$ edge.
    pub pt_sum_max: f64,
}

impl Default for HistogramRanges {
    fn default() -> Self {
        Self {
            pt_bins: 240,
            pt_min: 0.0,
            pt_max: 200.0,
            pt_sum_bins: 300,
            pt_sum_min: 0.0,
            pt_sum_max: 300.0,
        }
    }
}

impl HistogramRanges {
    /// The $`p_T`$ axis.
    pub fn pt_axis(&self) -> Axis {
        Axis::new(self.pt_bins, self.pt_min, self.pt_max).with_title("p_{T} (GeV/c)")
    }

    /// The cone-sum $`p_T`$ axis.
    pub fn pt_sum_axis(&self) -> Axis {
        Axis::new(self.pt_sum_bins, self.pt_sum_min, self.pt_sum_max)
            .with_title("#Sigma p_{T} (GeV/c)")
    }
}

/// Everything needed to set up a [`GeneratorKineAnalysis`](crate::GeneratorKineAnalysis).
///
/// Every field has a default, so a JSON configuration only needs to list what it changes:
///
/// ```json
/// { "trigger_detector": "PHOS", "isolation": { "method": "SumPt" } }
/// ```
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Detector whose acceptance trigger candidates must be in.
    #[serde_as(as = "DisplayFromStr")]
    pub trigger_detector: Detector,
    /// Calorimeter used for the calorimeter neutral variants.
    #[serde_as(as = "DisplayFromStr")]
    pub calorimeter: Detector,
    /// Minimum trigger candidate $`p_T`$.
    pub min_pt: f64,
    /// Minimum $`p_T`$ of charged particles in the isolation and $`x_E`$ scans.
    pub min_charged_pt: f64,
    /// Minimum $`p_T`$ of neutral particles in the isolation scan.
    pub min_neutral_pt: f64,
    /// Jets farther than this from a parton are never matched to it.
    pub max_match_radius: Option<f64>,
    /// Prefix of every histogram name.
    pub histogram_prefix: String,
    /// Histogram binning.
    pub ranges: HistogramRanges,
    /// Isolation cone parameters.
    pub isolation: IsolationCut,
    /// Acceptance windows for the isolation and $`x_E`$ scans.
    pub fiducial: AcceptanceWindows,
    /// Acceptance windows for trigger candidates.
    pub trigger_fiducial: AcceptanceWindows,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            trigger_detector: Detector::Emcal,
            calorimeter: Detector::Emcal,
            min_pt: 0.0,
            min_charged_pt: 0.2,
            min_neutral_pt: 0.3,
            max_match_radius: None,
            histogram_prefix: "AnaGenKine_".to_string(),
            ranges: HistogramRanges::default(),
            isolation: IsolationCut::default(),
            fiducial: AcceptanceWindows::default(),
            trigger_fiducial: AcceptanceWindows::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration from a JSON file. The path may contain `~` and environment variables.
    pub fn from_json_file(file_path: &str) -> GenKineResult<Self> {
        let expanded_path = shellexpand::full(file_path)?;
        let file = File::open(Path::new(expanded_path.as_ref()))?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> GenKineResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// The configuration as pretty-printed JSON.
    pub fn to_json_string(&self) -> GenKineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that the binning and cut values can be used.
    pub fn validate(&self) -> GenKineResult<()> {
        let ranges = &self.ranges;
        if ranges.pt_bins == 0 || ranges.pt_sum_bins == 0 {
            return Err(GenKineError::ConfigError(
                "histogram axes need at least one bin".to_string(),
            ));
        }
        if ranges.pt_max <= ranges.pt_min || ranges.pt_sum_max <= ranges.pt_sum_min {
            return Err(GenKineError::ConfigError(
                "histogram axis upper edges must exceed lower edges".to_string(),
            ));
        }
        if self.isolation.cone_size <= 0.0 {
            return Err(GenKineError::ConfigError(format!(
                "isolation cone size must be positive, got {}",
                self.isolation.cone_size
            )));
        }
        if let Some(radius) = self.max_match_radius {
            if radius <= 0.0 {
                return Err(GenKineError::ConfigError(format!(
                    "jet matching radius must be positive, got {radius}"
                )));
            }
        }
        Ok(())
    }
}
