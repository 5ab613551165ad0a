use crate::PointMass;

/// A source of initial conditions.
pub trait ParticleCreator {
    fn create_particle(&mut self) -> PointMass;

    fn create_particles(&mut self, n: usize) -> Vec<PointMass> {
        (0..n).map(|_| self.create_particle()).collect()
    }
}

#[cfg(feature = "randomization")]
pub use random::*;

#[cfg(feature = "randomization")]
mod random {
    use std::f64::consts::PI;

    use nalgebra::Vector3;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use rand_distr::{Distribution, Uniform};

    use super::*;
    use crate::{Error, Result};

    fn check_positive(name: &'static str, value: f64) -> Result<()> {
        if value.is_finite() && value > 0. {
            Ok(())
        } else {
            Err(Error::InvalidParameter { name, value })
        }
    }

    /// Particles spread uniformly over an origin-centered cube,
    /// with masses uniform in `(0, max_mass]` and no initial velocity.
    #[derive(Clone, Debug)]
    pub struct UniformBoxCreator<R: Rng> {
        rng: R,
        max_mass: f64,
        position_distr: Uniform<f64>,
    }

    impl UniformBoxCreator<StdRng> {
        /// A reproducible creator seeded with `seed`.
        pub fn new(box_size: f64, max_mass: f64, seed: u64) -> Result<Self> {
            Self::rng(box_size, max_mass, StdRng::seed_from_u64(seed))
        }
    }

    impl<R: Rng> UniformBoxCreator<R> {
        pub fn rng(box_size: f64, max_mass: f64, rng: R) -> Result<Self> {
            if !(box_size.is_finite() && box_size > 0.) {
                return Err(Error::InvalidBoxSize(box_size));
            }
            check_positive("max_mass", max_mass)?;

            Ok(Self {
                rng,
                max_mass,
                position_distr: Uniform::new(-box_size / 2., box_size / 2.),
            })
        }
    }

    impl<R: Rng> ParticleCreator for UniformBoxCreator<R> {
        fn create_particle(&mut self) -> PointMass {
            let rng = &mut self.rng;

            // 1 - [0, 1) keeps the mass away from zero
            let mass = self.max_mass * (1. - rng.gen::<f64>());
            let position = Vector3::new(
                self.position_distr.sample(rng),
                self.position_distr.sample(rng),
                self.position_distr.sample(rng),
            );

            PointMass::new(mass, position)
        }
    }

    /// Equal-mass particles drawn from a Hernquist sphere
    /// with enclosed mass `M(r) = M r² / (r + a)²`.
    #[derive(Clone, Debug)]
    pub struct HernquistCreator<R: Rng> {
        rng: R,
        scale_length: f64,
        particle_mass: f64,
    }

    impl HernquistCreator<StdRng> {
        /// A reproducible creator for `num_particles` particles of
        /// combined mass `total_mass`.
        pub fn new(
            num_particles: usize,
            total_mass: f64,
            scale_length: f64,
            seed: u64,
        ) -> Result<Self> {
            Self::rng(num_particles, total_mass, scale_length, StdRng::seed_from_u64(seed))
        }
    }

    impl<R: Rng> HernquistCreator<R> {
        pub fn rng(
            num_particles: usize,
            total_mass: f64,
            scale_length: f64,
            rng: R,
        ) -> Result<Self> {
            if num_particles == 0 {
                return Err(Error::NoParticles);
            }
            check_positive("total_mass", total_mass)?;
            check_positive("scale_length", scale_length)?;

            Ok(Self {
                rng,
                scale_length,
                particle_mass: total_mass / num_particles as f64,
            })
        }

        /// Fraction of the total mass within radius `r`.
        #[must_use]
        pub fn enclosed_fraction(&self, r: f64) -> f64 {
            (r / (r + self.scale_length)).powi(2)
        }

        /// Inverse of [`HernquistCreator::enclosed_fraction`] for `fraction` in `[0, 1)`.
        #[must_use]
        pub fn radius(&self, fraction: f64) -> f64 {
            let s = fraction.sqrt();
            self.scale_length * s / (1. - s)
        }
    }

    impl<R: Rng> ParticleCreator for HernquistCreator<R> {
        fn create_particle(&mut self) -> PointMass {
            let fraction: f64 = self.rng.gen();
            let r = self.radius(fraction);

            // isotropic direction
            let cos_theta: f64 = self.rng.gen_range(-1.0..=1.0);
            let sin_theta = (1. - cos_theta.powi(2)).sqrt();
            let phi = self.rng.gen_range(0.0..2. * PI);
            let position =
                r * Vector3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta);

            PointMass::new(self.particle_mass, position)
        }
    }

}
