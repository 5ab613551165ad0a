use nalgebra::Vector3;

use crate::{Error, Result};

/// Gravitational constant in simulation units.
pub const G: f64 = 1.;

/// Calculate the Newtonian acceleration of a point at `position1`
/// due to a mass `mass2` at `position2`.
///
/// Coincident positions exert no force.
pub fn acceleration(position1: Vector3<f64>, mass2: f64, position2: Vector3<f64>) -> Vector3<f64> {
    let r = position2 - position1;
    let r_square = r.norm_squared();
    if r_square == 0. {
        return Vector3::zeros();
    }
    r * (G * mass2 / (r_square * r_square.sqrt()))
}

/// Finite-range gravitational softening (Springel, Yoshida & White 2001).
///
/// Below the cutoff `r0` the separation is replaced by a softened distance
/// derived from a spline kernel with softening length `eps0`.
/// At or beyond `2.8 * eps0` (and beyond `r0`) the law is purely Newtonian.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Softening {
    eps0: f64,
    r0: f64,
}

impl Softening {
    pub fn new(eps0: f64, r0: f64) -> Result<Self> {
        if !(eps0.is_finite() && eps0 > 0. && r0.is_finite() && r0 > 0.) {
            return Err(Error::InvalidSoftening { eps0, r0 });
        }
        Ok(Self { eps0, r0 })
    }

    #[must_use]
    pub fn eps0(&self) -> f64 {
        self.eps0
    }

    #[must_use]
    pub fn r0(&self) -> f64 {
        self.r0
    }

    /// The distance that replaces `r` in the force law.
    #[must_use]
    pub fn softened_distance(&self, r: f64) -> f64 {
        if r >= self.r0 {
            return r;
        }
        let h = 2.8 * self.eps0;
        -h / kernel(r / h)
    }

    /// Softened counterpart of [`acceleration`].
    pub fn acceleration(
        &self,
        position1: Vector3<f64>,
        mass2: f64,
        position2: Vector3<f64>,
    ) -> Vector3<f64> {
        let r = position2 - position1;
        let r_norm = r.norm();
        if r_norm == 0. {
            return Vector3::zeros();
        }
        let soft = self.softened_distance(r_norm);
        r * (G * mass2 / soft.powi(3))
    }
}

/// Potential kernel W2 in units of the normalized radius `u`.
fn kernel(u: f64) -> f64 {
    if u < 0.5 {
        16. / 3. * u.powi(2) - 48. / 5. * u.powi(4) + 32. / 5. * u.powi(5) - 14. / 5.
    } else if u < 1. {
        1. / (15. * u) + 32. / 3. * u.powi(2) - 16. * u.powi(3) + 48. / 5. * u.powi(4)
            - 32. / 15. * u.powi(5)
            - 16. / 5.
    } else {
        -1. / u
    }
}
