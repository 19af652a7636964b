use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::utils::enums::{Detector, IsolationMethod};

/// Decides whether a direction lies inside the acceptance of a detector.
pub trait FiducialCut {
    /// `phi` may be given in $`(-\pi, \pi]`$ or $`[0, 2\pi)`$.
    fn is_in_fiducial_cut(&self, eta: f64, phi: f64, detector: Detector) -> bool;
}

/// A rectangular window in $`(\eta, \phi)`$, with $`\phi`$ in degrees.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceWindow {
    /// Lower pseudorapidity edge.
    pub eta_min: f64,
    /// Upper pseudorapidity edge.
    pub eta_max: f64,
    /// Lower azimuthal edge in degrees within $`[0, 360]`$.
    pub phi_min: f64,
    /// Upper azimuthal edge in degrees within $`[0, 360]`$.
    pub phi_max: f64,
}

impl AcceptanceWindow {
    /// A window symmetric in pseudorapidity.
    pub fn new(eta_max: f64, phi_min: f64, phi_max: f64) -> Self {
        Self {
            eta_min: -eta_max,
            eta_max,
            phi_min,
            phi_max,
        }
    }

    /// Whether `(eta, phi)` lies inside the window (edges included). `phi` is in radians.
    pub fn contains(&self, eta: f64, phi: f64) -> bool {
        let phi_deg = phi.to_degrees().rem_euclid(360.0);
        eta >= self.eta_min
            && eta <= self.eta_max
            && phi_deg >= self.phi_min
            && phi_deg <= self.phi_max
    }
}

/// Per-detector acceptance windows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcceptanceWindows {
    /// Central tracking system.
    pub cts: AcceptanceWindow,
    /// Electromagnetic calorimeter.
    pub emcal: AcceptanceWindow,
    /// Photon spectrometer.
    pub phos: AcceptanceWindow,
    /// Di-jet calorimeter.
    pub dcal: AcceptanceWindow,
    /// Region in front of the photon spectrometer excluded from the di-jet calorimeter.
    pub dcal_gap: Option<AcceptanceWindow>,
}

impl Default for AcceptanceWindows {
    fn default() -> Self {
        Self {
            cts: AcceptanceWindow::new(0.9, 0.0, 360.0),
            emcal: AcceptanceWindow::new(0.7, 80.0, 187.0),
            phos: AcceptanceWindow::new(0.12, 250.0, 320.0),
            dcal: AcceptanceWindow::new(0.7, 260.0, 327.0),
            dcal_gap: Some(AcceptanceWindow::new(0.22, 260.0, 320.0)),
        }
    }
}

impl AcceptanceWindows {
    fn in_dcal(&self, eta: f64, phi: f64) -> bool {
        self.dcal.contains(eta, phi)
            && !self.dcal_gap.is_some_and(|gap| gap.contains(eta, phi))
    }
}

impl FiducialCut for AcceptanceWindows {
    fn is_in_fiducial_cut(&self, eta: f64, phi: f64, detector: Detector) -> bool {
        match detector {
            Detector::Cts => self.cts.contains(eta, phi),
            Detector::Emcal => self.emcal.contains(eta, phi),
            Detector::Phos => self.phos.contains(eta, phi),
            Detector::Dcal => self.in_dcal(eta, phi),
            Detector::DcalPhos => self.in_dcal(eta, phi) || self.phos.contains(eta, phi),
        }
    }
}

/// Isolation cone parameters.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsolationCut {
    /// Cone radius in $`(\eta, \phi)`$.
    pub cone_size: f64,
    /// Particles in the cone above this $`p_T`$ break isolation for
    /// [`IsolationMethod::PtThreshold`].
    pub pt_threshold: f64,
    /// The summed cone $`p_T`$ must stay below this for [`IsolationMethod::SumPt`].
    pub sum_pt_threshold: f64,
    /// Which of the two criteria is used.
    pub method: IsolationMethod,
}

impl Default for IsolationCut {
    fn default() -> Self {
        Self {
            cone_size: 0.4,
            pt_threshold: 0.5,
            sum_pt_threshold: 2.0,
            method: IsolationMethod::PtThreshold,
        }
    }
}

impl IsolationCut {
    /// Angular distance $`\sqrt{\Delta\eta^2 + \Delta\phi^2}`$, with $`|\Delta\phi| \geq \pi`$
    /// folded to $`2\pi - |\Delta\phi|`$.
    pub fn radius(eta1: f64, phi1: f64, eta2: f64, phi2: f64) -> f64 {
        let d_eta = eta1 - eta2;
        let mut d_phi = phi1 - phi2;
        if d_phi.abs() >= PI {
            d_phi = 2.0 * PI - d_phi.abs();
        }
        d_eta.hypot(d_phi)
    }

    /// Whether a particle at `radius` from the cone axis is inside the cone.
    pub fn in_cone(&self, radius: f64) -> bool {
        radius < self.cone_size
    }

    /// Apply the configured criterion to the cone activity.
    pub fn is_isolated(&self, cone_count: usize, cone_sum_pt: f64) -> bool {
        match self.method {
            IsolationMethod::PtThreshold => cone_count == 0,
            IsolationMethod::SumPt => cone_sum_pt < self.sum_pt_threshold,
        }
    }
}
