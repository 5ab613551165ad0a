use octree_gravity::{
    particle_creator::{HernquistCreator, ParticleCreator},
    BarnesHut, DirectSummation, GravitySolver, Integrator, Result, Simulation,
};

fn main() -> Result<()> {
    let num_pars = 10_000;
    let particles = HernquistCreator::new(num_pars, 10., 10., 0)?.create_particles(num_pars);

    let solver = BarnesHut::new(0.5).multithreaded(4);
    let mut bh = Simulation::new(particles, solver).integrator(Integrator::Leapfrog);

    let num_steps = 100;
    for t in 0..num_steps {
        if t % 10 == 0 {
            println!("{t} out of {num_steps} time steps done.");
        }

        bh.step(0.1)?;
    }

    // compare the final state against the exact forces
    let mut exact = bh.particles().to_vec();
    DirectSummation::new()
        .multithreaded(4)
        .compute_all_accels(&mut exact)?;
    let mean_error = bh
        .particles()
        .iter()
        .zip(&exact)
        .map(|(p, e)| (p.acceleration - e.acceleration).norm() / e.acceleration.norm())
        .sum::<f64>()
        / num_pars as f64;
    println!("mean relative force error at t = {}: {mean_error:.2e}", bh.time());

    Ok(())
}
