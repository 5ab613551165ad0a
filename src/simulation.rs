use log::trace;
use nalgebra::{DMatrix, Vector3};

use crate::{Error, GravitySolver, PointMass, Result};

/// Time integration scheme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Integrator {
    /// x_(i + 1) = x_i + v_i dt, v_(i + 1) = v_i + a_i dt
    Euler,
    /// v_(i + 1) = v_i + a_i dt, x_(i + 1) = x_i + v_(i + 1) dt
    EulerCromer,
    /// Kick-drift-kick leapfrog.
    #[default]
    Leapfrog,
}

/// A time-stepping driver that owns the particles and lends them to
/// a [`GravitySolver`] once per force evaluation.
#[derive(Clone, Debug)]
pub struct Simulation<S: GravitySolver> {
    particles: Vec<PointMass>,
    solver: S,
    integrator: Integrator,
    time: f64,
    accelerations_current: bool,
}

impl<S: GravitySolver> Simulation<S> {
    pub fn new(particles: Vec<PointMass>, solver: S) -> Self {
        Self {
            particles,
            solver,
            integrator: Integrator::default(),
            time: 0.,
            accelerations_current: false,
        }
    }

    #[must_use]
    pub fn integrator(mut self, integrator: Integrator) -> Self {
        self.integrator = integrator;
        self
    }

    pub fn particles(&self) -> &[PointMass] {
        &self.particles
    }

    pub fn into_particles(self) -> Vec<PointMass> {
        self.particles
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Advance all particles by `time_step`.
    ///
    /// On error the positions, velocities and time are left as they were.
    pub fn step(&mut self, time_step: f64) -> Result<()> {
        if !(time_step.is_finite() && time_step > 0.) {
            return Err(Error::InvalidTimeStep(time_step));
        }
        if !self.accelerations_current {
            self.solver.compute_all_accels(&mut self.particles)?;
        }

        match self.integrator {
            Integrator::Euler => {
                for p in &mut self.particles {
                    p.position += p.velocity * time_step;
                    p.velocity += p.acceleration * time_step;
                }
                self.accelerations_current = false;
            }
            Integrator::EulerCromer => {
                for p in &mut self.particles {
                    p.velocity += p.acceleration * time_step;
                    p.position += p.velocity * time_step;
                }
                self.accelerations_current = false;
            }
            Integrator::Leapfrog => {
                /*
                 * v_(i + 1/2) = v_i + a_i dt / 2
                 * x_(i + 1) = x_i + v_(i + 1/2) dt
                 * v_(i + 1) = v_(i + 1/2) + a_(i + 1) dt / 2
                 */
                // committed only once the second force pass succeeds
                let mut stepped = self.particles.clone();
                for p in &mut stepped {
                    p.velocity += p.acceleration * (time_step / 2.);
                    p.position += p.velocity * time_step;
                }
                self.accelerations_current = false;
                self.solver.compute_all_accels(&mut stepped)?;
                for p in &mut stepped {
                    p.velocity += p.acceleration * (time_step / 2.);
                }
                self.particles = stepped;
                // a_(i + 1) is reused for the next kick
                self.accelerations_current = true;
            }
        }

        self.time += time_step;
        trace!("advanced {} particles to t = {}", self.particles.len(), self.time);

        Ok(())
    }

    /// Run `num_steps` steps and return the positions,
    /// one row per time (including the initial state) and one column per particle.
    ///
    /// Masses never change during a run, so they are not part of the history;
    /// read them from [`Simulation::particles`].
    pub fn simulate(&mut self, time_step: f64, num_steps: usize) -> Result<DMatrix<Vector3<f64>>> {
        let n = self.particles.len();
        let mut positions = DMatrix::from_element(num_steps + 1, n, Vector3::zeros());
        self.record(&mut positions, 0);

        for t in 0..num_steps {
            self.step(time_step)?;
            self.record(&mut positions, t + 1);
        }

        Ok(positions)
    }

    fn record(&self, positions: &mut DMatrix<Vector3<f64>>, row: usize) {
        for (i, p) in self.particles.iter().enumerate() {
            positions[(row, i)] = p.position;
        }
    }
}
