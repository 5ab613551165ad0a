use nalgebra::Vector3;

use crate::{
    gravity::{self, Softening},
    Error, Result,
};

/// A point mass.
///
/// This is used both for the simulated particles
/// and for the superparticles summarizing the cells of the octree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointMass {
    pub mass: f64,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub acceleration: Vector3<f64>,
}

impl Default for PointMass {
    fn default() -> Self {
        Self::new(0., Vector3::zeros())
    }
}

impl PointMass {
    #[must_use]
    pub fn new(mass: f64, position: Vector3<f64>) -> Self {
        Self {
            mass,
            position,
            velocity: Vector3::zeros(),
            acceleration: Vector3::zeros(),
        }
    }

    #[must_use]
    pub fn with_velocity(mut self, velocity: Vector3<f64>) -> Self {
        self.velocity = velocity;
        self
    }

    #[must_use]
    pub fn distance_to(&self, other: &PointMass) -> f64 {
        (self.position - other.position).norm()
    }

    /// Merge `other` into `self`, leaving the total mass at the center of mass.
    ///
    /// A zero mass acts as the identity, so aggregation can start from
    /// [`PointMass::default`].
    pub fn combine(&mut self, other: &PointMass) {
        let mass = self.mass + other.mass;
        if mass == 0. {
            return;
        }
        self.position = (self.position * self.mass + other.position * other.mass) / mass;
        self.mass = mass;
    }

    /// Newtonian acceleration of `self` due to `other` (G = 1).
    ///
    /// Coincident points exert no force on each other.
    #[must_use]
    pub fn newton_accel(&self, other: &PointMass) -> Vector3<f64> {
        gravity::acceleration(self.position, other.mass, other.position)
    }

    /// Like [`PointMass::newton_accel`], but with finite-range softening.
    #[must_use]
    pub fn newton_accel_smooth(&self, other: &PointMass, softening: &Softening) -> Vector3<f64> {
        softening.acceleration(self.position, other.mass, other.position)
    }

    pub(crate) fn accel_from(
        &self,
        other: &PointMass,
        softening: Option<&Softening>,
    ) -> Vector3<f64> {
        match softening {
            Some(softening) => self.newton_accel_smooth(other, softening),
            None => self.newton_accel(other),
        }
    }
}

/// Reject inputs that would silently corrupt the aggregates.
pub(crate) fn validate(particles: &[PointMass]) -> Result<()> {
    if particles.is_empty() {
        return Err(Error::NoParticles);
    }
    for (index, particle) in particles.iter().enumerate() {
        if !(particle.mass.is_finite() && particle.mass > 0.) {
            return Err(Error::InvalidMass {
                index,
                mass: particle.mass,
            });
        }
        if !particle.position.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidPosition { index });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use super::*;

    #[test]
    fn combine_two() {
        let mut p1 = PointMass::new(2., Vector3::new(1., 2., 3.));
        let p2 = PointMass::new(3., Vector3::new(1., 1., 1.));
        p1.combine(&p2);

        assert_abs_diff_eq!(p1.mass, 5.);
        assert_abs_diff_eq!(p1.position, Vector3::new(1., 1.4, 1.8), epsilon = 1e-12);
    }

    #[test]
    fn combine_order_independent() {
        let a = PointMass::new(1., Vector3::new(-1., 1., 1.));
        let b = PointMass::new(2., Vector3::new(1., 1., 1.));
        let c = PointMass::new(3., Vector3::new(49., 49., 49.));

        let mut abc = a;
        abc.combine(&b);
        abc.combine(&c);

        let mut bc = b;
        bc.combine(&c);
        let mut a_bc = a;
        a_bc.combine(&bc);

        let mut cba = c;
        cba.combine(&b);
        cba.combine(&a);

        for other in [a_bc, cba] {
            assert_relative_eq!(abc.mass, other.mass);
            assert_relative_eq!(abc.position, other.position, max_relative = 1e-12);
        }
    }

    #[test]
    fn combine_with_identity() {
        let p = PointMass::new(4., Vector3::new(0.5, -2., 7.));

        let mut acc = PointMass::default();
        acc.combine(&p);
        assert_eq!(acc.mass, p.mass);
        assert_eq!(acc.position, p.position);

        let mut empty = PointMass::default();
        empty.combine(&PointMass::default());
        assert_eq!(empty.mass, 0.);
        assert!(empty.position.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn newton_accel_two_bodies() {
        let p1 = PointMass::new(2., Vector3::zeros());
        let p2 = PointMass::new(2., Vector3::new(1., 1., 1.));
        let a = p1.newton_accel(&p2);

        assert_relative_eq!(a.norm(), 2. / 3., max_relative = 1e-12);
        assert_relative_eq!(
            a.normalize(),
            Vector3::new(1., 1., 1.).normalize(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn self_interaction() {
        let p = PointMass::new(2., Vector3::new(1., 2., 3.));
        assert_eq!(p.newton_accel(&p), Vector3::zeros());
    }

    #[test]
    fn validation() {
        assert_eq!(validate(&[]), Err(Error::NoParticles));
        assert_eq!(
            validate(&[
                PointMass::new(1., Vector3::zeros()),
                PointMass::new(0., Vector3::x())
            ]),
            Err(Error::InvalidMass { index: 1, mass: 0. })
        );
        assert_eq!(
            validate(&[PointMass::new(1., Vector3::new(f64::NAN, 0., 0.))]),
            Err(Error::InvalidPosition { index: 0 })
        );
        assert!(validate(&[PointMass::new(1., Vector3::zeros())]).is_ok());
    }
}
