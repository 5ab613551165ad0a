use std::thread;

use nalgebra::Vector3;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::{Error, PointMass, Result};

/// How the per-particle force queries of one pass are distributed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Execution {
    #[default]
    SingleThreaded,
    /// Split the particles into `num_threads` chunks, one scoped thread each.
    Multithreaded { num_threads: usize },
    /// Let Rayon split the particles.
    #[cfg(feature = "rayon")]
    RayonIter,
}

/// Overwrite the acceleration of every particle with `acceleration(particle)`.
///
/// `acceleration` must only read shared, frozen state.
pub(crate) fn update_accelerations<F>(
    particles: &mut [PointMass],
    execution: Execution,
    acceleration: F,
) -> Result<()>
where
    F: Fn(&PointMass) -> Vector3<f64> + Sync,
{
    match execution {
        Execution::SingleThreaded => {
            for particle in particles.iter_mut() {
                particle.acceleration = acceleration(particle);
            }
        }
        Execution::Multithreaded { num_threads } => {
            if num_threads == 0 {
                return Err(Error::InvalidThreadCount);
            }
            let chunk_size = particles.len().div_ceil(num_threads).max(1);
            let acceleration = &acceleration;

            thread::scope(|s| {
                for chunk in particles.chunks_mut(chunk_size) {
                    s.spawn(move || {
                        for particle in chunk {
                            particle.acceleration = acceleration(particle);
                        }
                    });
                }
            });
        }
        #[cfg(feature = "rayon")]
        Execution::RayonIter => {
            particles.par_iter_mut().for_each(|particle| {
                particle.acceleration = acceleration(particle);
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particles(n: usize) -> Vec<PointMass> {
        (0..n)
            .map(|i| PointMass::new(1., Vector3::new(i as f64, 0., 0.)))
            .collect()
    }

    fn double_position(p: &PointMass) -> Vector3<f64> {
        2. * p.position
    }

    #[test]
    fn multithreaded() {
        for num_threads in [1, 3, 8, 20] {
            let mut par = particles(10);
            update_accelerations(
                &mut par,
                Execution::Multithreaded { num_threads },
                double_position,
            )
            .unwrap();

            for (i, p) in par.iter().enumerate() {
                assert_eq!(p.acceleration, Vector3::new(2. * i as f64, 0., 0.));
            }
        }
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn rayon_iter() {
        let mut single = particles(50);
        let mut multi = single.clone();
        update_accelerations(&mut single, Execution::SingleThreaded, double_position).unwrap();
        update_accelerations(&mut multi, Execution::RayonIter, double_position).unwrap();

        assert_eq!(single, multi);
    }

    #[test]
    fn zero_threads() {
        let mut par = particles(2);
        assert_eq!(
            update_accelerations(
                &mut par,
                Execution::Multithreaded { num_threads: 0 },
                double_position
            ),
            Err(Error::InvalidThreadCount)
        );
    }
}
