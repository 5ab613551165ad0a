//! Newtonian gravity for N point masses (G = 1), approximated with the
//! Barnes-Hut octree or summed directly over all pairs.
//!
//! ```
//! use nalgebra::Vector3;
//! use octree_gravity::{BarnesHut, GravitySolver, PointMass};
//!
//! let mut particles = vec![
//!     PointMass::new(2., Vector3::zeros()),
//!     PointMass::new(2., Vector3::new(1., 1., 1.)),
//! ];
//! BarnesHut::new(0.5).compute_all_accels(&mut particles)?;
//! assert!((particles[0].acceleration.norm() - 2. / 3.).abs() < 1e-12);
//! # Ok::<(), octree_gravity::Error>(())
//! ```

pub mod barnes_hut;
pub mod direct_summation;
mod error;
mod execution;
pub mod gravity;
pub mod octree;
pub mod particle_creator;
pub mod point_mass;
pub mod simulation;

pub use barnes_hut::BarnesHut;
pub use direct_summation::DirectSummation;
pub use error::{Error, Result};
pub use execution::Execution;
pub use gravity::Softening;
pub use octree::Octree;
pub use point_mass::PointMass;
pub use simulation::{Integrator, Simulation};

/// A method to calculate the gravitational accelerations of all particles.
pub trait GravitySolver {
    /// Overwrite the `acceleration` of every particle with the acceleration
    /// due to all other particles at their current positions.
    fn compute_all_accels(&self, particles: &mut [PointMass]) -> Result<()>;
}
