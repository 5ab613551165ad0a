use nalgebra::Vector3;

use crate::{
    execution::{update_accelerations, Execution},
    gravity::Softening,
    point_mass, Error, GravitySolver, PointMass, Result,
};

/// O(N²) summation over all particle pairs.
///
/// This is exact up to floating point errors and serves as the reference
/// for the Barnes-Hut solver.
#[derive(Copy, Clone, Debug, Default)]
pub struct DirectSummation {
    softening: Option<Softening>,
    execution: Execution,
}

impl DirectSummation {
    #[must_use]
    pub fn new() -> Self {
        Self {
            softening: None,
            execution: Execution::SingleThreaded,
        }
    }

    #[must_use]
    pub fn softening(mut self, softening: Softening) -> Self {
        self.softening = Some(softening);
        self
    }

    /// Calculate the forces with multiple threads,
    /// each summing the forces on its own chunk of the particles.
    #[must_use]
    pub fn multithreaded(mut self, num_threads: usize) -> Self {
        self.execution = Execution::Multithreaded { num_threads };
        self
    }

    /// Use Rayon to calculate the forces with multiple threads.
    #[cfg(feature = "rayon")]
    #[must_use]
    pub fn rayon_iter(mut self) -> Self {
        self.execution = Execution::RayonIter;
        self
    }

    #[must_use]
    pub fn execution(&self) -> Execution {
        self.execution
    }

    /// Calculate the acceleration of `particles[index]` due to all other particles.
    pub fn compute_accel(&self, particles: &[PointMass], index: usize) -> Result<Vector3<f64>> {
        point_mass::validate(particles)?;
        let particle = particles.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: particles.len(),
        })?;

        Ok(particles
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != index)
            .fold(Vector3::zeros(), |acc, (_, other)| {
                acc + self.pair_acceleration(particle, other)
            }))
    }

    fn pair_acceleration(&self, particle: &PointMass, other: &PointMass) -> Vector3<f64> {
        if particle.position == other.position {
            return Vector3::zeros();
        }
        particle.accel_from(other, self.softening.as_ref())
    }
}

impl GravitySolver for DirectSummation {
    fn compute_all_accels(&self, particles: &mut [PointMass]) -> Result<()> {
        point_mass::validate(particles)?;

        // Sources are read while the accelerations are written
        let sources = particles.to_vec();
        update_accelerations(particles, self.execution, |p| {
            sources.iter().fold(Vector3::zeros(), |acc, other| {
                acc + self.pair_acceleration(p, other)
            })
        })
    }
}
