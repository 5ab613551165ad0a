use crate::{
    execution::{update_accelerations, Execution},
    gravity::Softening,
    octree::{fitted_box_size, Octree, DEFAULT_MAX_DEPTH},
    GravitySolver, PointMass, Result,
};

/// The Barnes-Hut solver.
///
/// Every pass builds a fresh [`Octree`] over the current positions
/// and queries it for every particle.
#[derive(Clone, Copy, Debug)]
pub struct BarnesHut {
    open_angle: f64,
    box_size: Option<f64>,
    max_depth: usize,
    softening: Option<Softening>,
    execution: Execution,
}

impl BarnesHut {
    /// `open_angle` is the ratio of cell size to distance below which
    /// a cell is treated as a single superparticle.
    /// With `open_angle = 0` the result equals direct summation.
    #[must_use]
    pub fn new(open_angle: f64) -> Self {
        Self {
            open_angle,
            box_size: None,
            max_depth: DEFAULT_MAX_DEPTH,
            softening: None,
            execution: Execution::SingleThreaded,
        }
    }

    /// Use a fixed root cell of side `box_size` around the origin.
    ///
    /// By default the root cell is fitted to the particles in every pass.
    /// With a fixed cell, a pass fails with [`Error::OutsideRootCell`](crate::Error::OutsideRootCell)
    /// once a particle leaves it.
    #[must_use]
    pub fn box_size(mut self, box_size: f64) -> Self {
        self.box_size = Some(box_size);
        self
    }

    #[must_use]
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn softening(mut self, softening: Softening) -> Self {
        self.softening = Some(softening);
        self
    }

    /// Calculate the forces with multiple threads.
    ///
    /// All threads query the shared tree, each for its own chunk of the particles.
    #[must_use]
    pub fn multithreaded(mut self, num_threads: usize) -> Self {
        self.execution = Execution::Multithreaded { num_threads };
        self
    }

    /// Use Rayon to calculate the forces with multiple threads.
    ///
    /// All threads query the shared tree, splitting the particles.
    #[cfg(feature = "rayon")]
    #[must_use]
    pub fn rayon_iter(mut self) -> Self {
        self.execution = Execution::RayonIter;
        self
    }

    #[must_use]
    pub fn open_angle(&self) -> f64 {
        self.open_angle
    }

    #[must_use]
    pub fn execution(&self) -> Execution {
        self.execution
    }

    /// Build the octree for the current particle positions.
    pub fn octree(&self, particles: &[PointMass]) -> Result<Octree> {
        let box_size = self
            .box_size
            .unwrap_or_else(|| fitted_box_size(particles));
        let octree = Octree::build(particles, box_size, self.open_angle, self.max_depth)?;

        Ok(match self.softening {
            Some(softening) => octree.with_softening(softening),
            None => octree,
        })
    }
}

impl GravitySolver for BarnesHut {
    fn compute_all_accels(&self, particles: &mut [PointMass]) -> Result<()> {
        let octree = self.octree(particles)?;
        update_accelerations(particles, self.execution, |p| octree.compute_accel(p))
    }
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq, assert_ulps_eq};
    use nalgebra::Vector3;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;
    use crate::{DirectSummation, Error};

    fn generate_random_particles(n: usize) -> Vec<PointMass> {
        let mut rng = StdRng::seed_from_u64(0);
        (0..n)
            .map(|_| {
                let mass = rng.gen_range(1.0..100.0);
                let position = Vector3::from_fn(|_, _| rng.gen_range(-500.0..500.0));
                PointMass::new(mass, position)
            })
            .collect()
    }

    #[test]
    fn symmetry() {
        let mut particles = vec![
            PointMass::new(1e6, Vector3::new(1., 0., 0.)),
            PointMass::new(1e6, Vector3::new(-1., 0., 0.)),
        ];

        let bh = BarnesHut::new(0.);
        bh.compute_all_accels(&mut particles).unwrap();

        assert_abs_diff_eq!(particles[0].acceleration, -particles[1].acceleration);
        assert_relative_eq!(particles[0].acceleration, Vector3::new(-2.5e5, 0., 0.));
    }

    #[test]
    fn brute_force() {
        let mut bf = generate_random_particles(50);
        let mut bh = bf.clone();

        DirectSummation::new().compute_all_accels(&mut bf).unwrap();
        BarnesHut::new(0.).compute_all_accels(&mut bh).unwrap();

        for (s, m) in bf.iter().zip(&bh) {
            assert_relative_eq!(
                s.acceleration,
                m.acceleration,
                epsilon = 1e-12,
                max_relative = 1e-10
            );
        }
    }

    #[test]
    fn multithreaded() {
        let mut single = generate_random_particles(50);
        let mut multi = single.clone();

        let bh = BarnesHut::new(0.5);
        bh.compute_all_accels(&mut single).unwrap();
        bh.multithreaded(4).compute_all_accels(&mut multi).unwrap();

        for (s, m) in single.iter().zip(&multi) {
            assert_ulps_eq!(s.acceleration, m.acceleration);
        }
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn rayon() {
        let mut single = generate_random_particles(50);
        let mut multi = single.clone();

        let bh = BarnesHut::new(0.5);
        bh.compute_all_accels(&mut single).unwrap();
        bh.rayon_iter().compute_all_accels(&mut multi).unwrap();

        for (s, m) in single.iter().zip(&multi) {
            assert_ulps_eq!(s.acceleration, m.acceleration);
        }
    }

    #[test]
    fn fixed_box_matches_fitted_box() {
        let mut fitted = generate_random_particles(30);
        let mut fixed = fitted.clone();

        BarnesHut::new(0.).compute_all_accels(&mut fitted).unwrap();
        BarnesHut::new(0.)
            .box_size(4000.)
            .compute_all_accels(&mut fixed)
            .unwrap();

        for (a, b) in fitted.iter().zip(&fixed) {
            assert_relative_eq!(
                a.acceleration,
                b.acceleration,
                epsilon = 1e-12,
                max_relative = 1e-10
            );
        }
    }

    #[test]
    fn overwrites_stale_accelerations() {
        let mut particles = generate_random_particles(10);
        for p in &mut particles {
            p.acceleration = Vector3::repeat(f64::NAN);
        }
        BarnesHut::new(0.5).compute_all_accels(&mut particles).unwrap();

        assert!(particles
            .iter()
            .all(|p| p.acceleration.iter().all(|a| a.is_finite())));
    }

    #[test]
    fn errors() {
        let mut coincident = vec![PointMass::new(1., Vector3::zeros()); 2];
        assert_eq!(
            BarnesHut::new(0.5).compute_all_accels(&mut coincident),
            Err(Error::MaxDepthExceeded {
                index: 1,
                max_depth: DEFAULT_MAX_DEPTH
            })
        );

        let mut particles = generate_random_particles(4);
        assert_eq!(
            BarnesHut::new(0.5)
                .multithreaded(0)
                .compute_all_accels(&mut particles),
            Err(Error::InvalidThreadCount)
        );
        assert_eq!(
            BarnesHut::new(0.5).compute_all_accels(&mut []),
            Err(Error::NoParticles)
        );

        let mut escaped = vec![
            PointMass::new(1., Vector3::zeros()),
            PointMass::new(1., Vector3::new(-30., 0., 0.)),
        ];
        assert_eq!(
            BarnesHut::new(0.5)
                .box_size(50.)
                .compute_all_accels(&mut escaped),
            Err(Error::OutsideRootCell {
                index: 1,
                box_size: 50.
            })
        );
        assert!(BarnesHut::new(0.5).compute_all_accels(&mut escaped).is_ok());
    }
}
