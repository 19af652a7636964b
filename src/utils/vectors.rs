use std::{f64::consts::PI, fmt::Display};

use auto_ops::impl_op_ex_commutative;
use serde::{Deserialize, Serialize};

/// Pseudorapidity assigned to vectors which point exactly along the beam axis.
pub const BEAM_AXIS_ETA: f64 = 10e10;

/// Shift an azimuthal angle from $`(-\pi, \pi]`$ into $`[0, 2\pi)`$.
pub fn phi_positive(phi: f64) -> f64 {
    if phi < 0.0 {
        phi + 2.0 * PI
    } else {
        phi
    }
}

/// A three-vector of real numbers.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// The $`x`$-component.
    pub x: f64,
    /// The $`y`$-component.
    pub y: f64,
    /// The $`z`$-component.
    pub z: f64,
}

impl Vec3 {
    /// Create a new [`Vec3`] from its components.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Interpret this vector as a three-momentum and build the four-momentum of a particle with
    /// the given mass.
    pub fn with_mass(&self, mass: f64) -> Vec4 {
        let e = (mass.powi(2) + self.mag2()).sqrt();
        Vec4::new(self.x, self.y, self.z, e)
    }

    /// The dot product with another [`Vec3`].
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// The squared magnitude.
    pub fn mag2(&self) -> f64 {
        self.dot(self)
    }

    /// The magnitude.
    pub fn mag(&self) -> f64 {
        self.mag2().sqrt()
    }

    /// The magnitude of the component transverse to the beam ($`z`$) axis.
    pub fn pt(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// The cosine of the polar angle. The null vector has $`\cos\theta = 1`$.
    pub fn costheta(&self) -> f64 {
        let mag = self.mag();
        if mag == 0.0 {
            1.0
        } else {
            self.z / mag
        }
    }

    /// The polar angle.
    pub fn theta(&self) -> f64 {
        self.costheta().acos()
    }

    /// The azimuthal angle in $`(-\pi, \pi]`$.
    pub fn phi(&self) -> f64 {
        if self.x == 0.0 && self.y == 0.0 {
            0.0
        } else {
            self.y.atan2(self.x)
        }
    }

    /// The pseudorapidity $`\eta = -\ln\tan(\theta/2)`$.
    ///
    /// Vectors along the beam axis get $`\pm`$[`BEAM_AXIS_ETA`] and the null vector gets zero.
    pub fn eta(&self) -> f64 {
        let costheta = self.costheta();
        if costheta * costheta < 1.0 {
            -0.5 * ((1.0 - costheta) / (1.0 + costheta)).ln()
        } else if self.z == 0.0 {
            0.0
        } else if self.z > 0.0 {
            BEAM_AXIS_ETA
        } else {
            -BEAM_AXIS_ETA
        }
    }
}

impl_op_ex_commutative!(*|a: &Vec3, b: &f64| -> Vec3 { Vec3::new(a.x * b, a.y * b, a.z * b) });

/// A four-momentum $`(p_x, p_y, p_z, E)`$.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec4 {
    /// The $`x`$-component of the momentum.
    pub x: f64,
    /// The $`y`$-component of the momentum.
    pub y: f64,
    /// The $`z`$-component of the momentum.
    pub z: f64,
    /// The energy.
    pub t: f64,
}

impl Vec4 {
    /// Create a new [`Vec4`] from its components.
    pub fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self {
            x: px,
            y: py,
            z: pz,
            t: e,
        }
    }

    /// Build a four-momentum from transverse momentum, pseudorapidity, azimuth and mass.
    pub fn from_pt_eta_phi_m(pt: f64, eta: f64, phi: f64, mass: f64) -> Self {
        (pt * Vec3::new(phi.cos(), phi.sin(), eta.sinh())).with_mass(mass)
    }

    /// The $`x`$-component of the momentum.
    pub fn px(&self) -> f64 {
        self.x
    }

    /// The $`y`$-component of the momentum.
    pub fn py(&self) -> f64 {
        self.y
    }

    /// The $`z`$-component of the momentum.
    pub fn pz(&self) -> f64 {
        self.z
    }

    /// The energy.
    pub fn e(&self) -> f64 {
        self.t
    }

    /// The three-momentum.
    pub fn vec3(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// The squared invariant mass.
    pub fn m2(&self) -> f64 {
        self.t.powi(2) - self.vec3().mag2()
    }

    /// The invariant mass (negative for space-like vectors, following the usual convention).
    pub fn m(&self) -> f64 {
        let m2 = self.m2();
        if m2 < 0.0 {
            -(-m2).sqrt()
        } else {
            m2.sqrt()
        }
    }

    /// The transverse momentum.
    pub fn pt(&self) -> f64 {
        self.vec3().pt()
    }

    /// The pseudorapidity, see [`Vec3::eta`].
    pub fn eta(&self) -> f64 {
        self.vec3().eta()
    }

    /// The azimuthal angle in $`(-\pi, \pi]`$.
    pub fn phi(&self) -> f64 {
        self.vec3().phi()
    }

    /// The azimuthal angle in $`[0, 2\pi)`$.
    pub fn phi_positive(&self) -> f64 {
        phi_positive(self.phi())
    }

    /// A compact `[e, px, py, pz]` representation.
    pub fn to_p4_string(&self) -> String {
        format!("[e = {:.5}; p = ({:.5}, {:.5}, {:.5})]", self.t, self.x, self.y, self.z)
    }
}

impl Display for Vec4 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_p4_string())
    }
}


#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_three_momentum_basics() {
        let p = Vec3::new(3.0, 4.0, 5.0);
        assert_relative_eq!(p.mag2(), 50.0);
        assert_relative_eq!(p.mag(), 50.0_f64.sqrt());
        assert_relative_eq!(p.pt(), 5.0);
        assert_relative_eq!(p.costheta(), 5.0 / 50.0_f64.sqrt());
        assert_relative_eq!(p.theta(), (5.0 / 50.0_f64.sqrt()).acos());
        assert_relative_eq!(p.phi(), 4.0_f64.atan2(3.0));
        assert_relative_eq!(p.eta(), (1.0_f64).asinh());
    }

    #[test]
    fn test_four_momentum_basics() {
        let p = Vec4::new(3.0, 4.0, 5.0, 10.0);
        assert_eq!(p.px(), 3.0);
        assert_eq!(p.py(), 4.0);
        assert_eq!(p.pz(), 5.0);
        assert_eq!(p.e(), 10.0);
        assert_relative_eq!(p.m2(), 50.0);
        assert_relative_eq!(p.m(), 50.0_f64.sqrt());
        assert_relative_eq!(p.pt(), 5.0);
    }

    #[test]
    fn test_eta_along_beam_and_null_vector() {
        assert_eq!(Vec3::new(0.0, 0.0, 7.0).eta(), BEAM_AXIS_ETA);
        assert_eq!(Vec3::new(0.0, 0.0, -7.0).eta(), -BEAM_AXIS_ETA);
        assert_eq!(Vec4::default().eta(), 0.0);
        assert_eq!(Vec4::default().phi(), 0.0);
        assert_eq!(Vec4::default().pt(), 0.0);
    }

    #[test]
    fn test_phi_positive() {
        let p = Vec4::from_pt_eta_phi_m(1.0, 0.0, -PI / 2.0, 0.0);
        assert_relative_eq!(p.phi(), -PI / 2.0);
        assert_relative_eq!(p.phi_positive(), 3.0 * PI / 2.0);
        assert_relative_eq!(phi_positive(0.5), 0.5);
    }

    #[test]
    fn test_from_pt_eta_phi_m() {
        let p = Vec4::from_pt_eta_phi_m(4.0, 0.3, 2.0, 0.135);
        assert_relative_eq!(p.pt(), 4.0, epsilon = 1e-12);
        assert_relative_eq!(p.eta(), 0.3, epsilon = 1e-12);
        assert_relative_eq!(p.phi(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(p.m(), 0.135, epsilon = 1e-9);
    }

    #[test]
    fn test_scaling() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(p * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(2.0 * &p, p * 2.0);
    }
}
