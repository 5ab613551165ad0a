use std::fmt;

use log::debug;
use nalgebra::Vector3;

use crate::{gravity::Softening, point_mass, Error, PointMass, Result};

/// Default bound on the number of subdivisions below the root cell.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// A particle stored in the tree: its index in the caller's collection
/// and a copy of its mass and position.
#[derive(Clone, Copy, Debug)]
struct Leaf {
    index: usize,
    particle: PointMass,
}

#[derive(Clone, Debug, Default)]
enum Slot {
    #[default]
    Empty,
    Leaf(Leaf),
    Internal(Box<Node>),
}

#[derive(Clone, Debug)]
struct Node {
    children: [Slot; 8],
    multipole: PointMass,
    side_length: f64,
    cell_center: Vector3<f64>,
}

/// A Barnes-Hut octree over a set of point masses.
///
/// The root cell is a cube centered at the origin. The tree is built and its
/// multipoles aggregated on construction; afterwards it is read-only, so
/// queries for different particles are independent.
#[derive(Clone, Debug)]
pub struct Octree {
    root: Slot,
    side_length: f64,
    cell_center: Vector3<f64>,
    open_angle: f64,
    softening: Option<Softening>,
    len: usize,
}

impl Octree {
    /// Build the tree in a cube of side `box_size` around the origin.
    pub fn new(particles: &[PointMass], box_size: f64, open_angle: f64) -> Result<Self> {
        Self::build(particles, box_size, open_angle, DEFAULT_MAX_DEPTH)
    }

    /// Build the tree in the smallest origin-centered cube containing all particles.
    pub fn fitted(particles: &[PointMass], open_angle: f64) -> Result<Self> {
        Self::build(particles, fitted_box_size(particles), open_angle, DEFAULT_MAX_DEPTH)
    }

    pub fn build(
        particles: &[PointMass],
        box_size: f64,
        open_angle: f64,
        max_depth: usize,
    ) -> Result<Self> {
        point_mass::validate(particles)?;
        if !(box_size.is_finite() && box_size > 0.) {
            return Err(Error::InvalidBoxSize(box_size));
        }
        if !(open_angle.is_finite() && open_angle >= 0.) {
            return Err(Error::InvalidOpenAngle(open_angle));
        }

        let cell_center: Vector3<f64> = Vector3::zeros();
        // the root cell is closed, particles on its faces belong to it
        if let Some(index) = particles
            .iter()
            .position(|p| (p.position - cell_center).amax() > box_size / 2.)
        {
            return Err(Error::OutsideRootCell { index, box_size });
        }

        let mut root = Slot::Empty;
        for (index, particle) in particles.iter().enumerate() {
            let leaf = Leaf {
                index,
                particle: PointMass::new(particle.mass, particle.position),
            };
            root.insert(leaf, cell_center, box_size, 0, max_depth)?;
        }
        root.sum_multipole();

        let octree = Self {
            root,
            side_length: box_size,
            cell_center,
            open_angle,
            softening: None,
            len: particles.len(),
        };
        debug!(
            "built octree over {} particles: {} leaves, depth {}",
            octree.len,
            octree.leaf_count(),
            octree.depth()
        );

        Ok(octree)
    }

    /// Use softened gravity for all queries against this tree.
    #[must_use]
    pub fn with_softening(mut self, softening: Softening) -> Self {
        self.softening = Some(softening);
        self
    }

    /// Number of particles the tree was built from.
    #[must_use]
    pub fn num_particles(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn open_angle(&self) -> f64 {
        self.open_angle
    }

    #[must_use]
    pub fn side_length(&self) -> f64 {
        self.side_length
    }

    #[must_use]
    pub fn cell_center(&self) -> Vector3<f64> {
        self.cell_center
    }

    /// The total mass and center of mass of all particles.
    #[must_use]
    pub fn multipole(&self) -> PointMass {
        self.root.multipole().unwrap_or_default()
    }

    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.root.leaf_count()
    }

    /// Number of subdivisions below the root on the deepest branch.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    /// Particle indices in depth-first order, i.e. sorted along the tree.
    #[must_use]
    pub fn depth_first_indices(&self) -> Vec<usize> {
        let mut indices = Vec::with_capacity(self.len);
        self.root.depth_first_search(&mut indices);
        indices
    }

    /// Calculate the acceleration of `particle` due to all particles in the tree.
    #[must_use]
    pub fn compute_accel(&self, particle: &PointMass) -> Vector3<f64> {
        self.root
            .calculate_acceleration(particle, self.open_angle, self.softening.as_ref())
    }

    /// Store the acceleration of every particle in its `acceleration` field.
    pub fn compute_all_accels(&self, particles: &mut [PointMass]) {
        for particle in particles.iter_mut() {
            particle.acceleration = self.compute_accel(particle);
        }
    }
}

/// One line per cell and particle in depth-first order, indented by depth.
impl fmt::Display for Octree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.root.fmt_tree(f, 0)
    }
}

struct Coords<'a>(&'a Vector3<f64>);

impl fmt::Display for Coords<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0.x, self.0.y, self.0.z)
    }
}

impl Slot {
    fn insert(
        &mut self,
        leaf: Leaf,
        cell_center: Vector3<f64>,
        side_length: f64,
        depth: usize,
        max_depth: usize,
    ) -> Result<()> {
        match self {
            Slot::Empty => *self = Slot::Leaf(leaf),
            Slot::Internal(node) => node.insert(leaf, depth, max_depth)?,
            // Second particle in this cell, subdivide
            Slot::Leaf(resident) => {
                if depth >= max_depth {
                    return Err(Error::MaxDepthExceeded {
                        index: leaf.index,
                        max_depth,
                    });
                }
                let resident = *resident;

                let mut node = Node::new(cell_center, side_length);
                node.insert(resident, depth, max_depth)?;
                node.insert(leaf, depth, max_depth)?;
                *self = Slot::Internal(Box::new(node));
            }
        }
        Ok(())
    }

    fn sum_multipole(&mut self) -> Option<PointMass> {
        match self {
            Slot::Empty => None,
            Slot::Leaf(leaf) => Some(leaf.particle),
            Slot::Internal(node) => Some(node.sum_multipole()),
        }
    }

    fn multipole(&self) -> Option<PointMass> {
        match self {
            Slot::Empty => None,
            Slot::Leaf(leaf) => Some(leaf.particle),
            Slot::Internal(node) => Some(node.multipole),
        }
    }

    fn calculate_acceleration(
        &self,
        particle: &PointMass,
        open_angle: f64,
        softening: Option<&Softening>,
    ) -> Vector3<f64> {
        match self {
            Slot::Empty => Vector3::zeros(),
            Slot::Leaf(leaf) => {
                if leaf.particle.position == particle.position {
                    return Vector3::zeros();
                }
                particle.accel_from(&leaf.particle, softening)
            }
            Slot::Internal(node) => node.calculate_acceleration(particle, open_angle, softening),
        }
    }

    fn leaf_count(&self) -> usize {
        match self {
            Slot::Empty => 0,
            Slot::Leaf(_) => 1,
            Slot::Internal(node) => node.children.iter().map(Slot::leaf_count).sum(),
        }
    }

    fn depth(&self) -> usize {
        match self {
            Slot::Empty | Slot::Leaf(_) => 0,
            Slot::Internal(node) => 1 + node.children.iter().map(Slot::depth).max().unwrap_or(0),
        }
    }

    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = depth * 2;
        match self {
            Slot::Empty => Ok(()),
            Slot::Leaf(leaf) => writeln!(
                f,
                "{:indent$}particle {}: mass {} at {}",
                "",
                leaf.index,
                leaf.particle.mass,
                Coords(&leaf.particle.position)
            ),
            Slot::Internal(node) => {
                writeln!(
                    f,
                    "{:indent$}cell of side {} at {}: mass {} at {}",
                    "",
                    node.side_length,
                    Coords(&node.cell_center),
                    node.multipole.mass,
                    Coords(&node.multipole.position)
                )?;
                for child in &node.children {
                    child.fmt_tree(f, depth + 1)?;
                }
                Ok(())
            }
        }
    }

    fn depth_first_search(&self, indices: &mut Vec<usize>) {
        match self {
            Slot::Empty => {}
            Slot::Leaf(leaf) => indices.push(leaf.index),
            Slot::Internal(node) => {
                for child in &node.children {
                    child.depth_first_search(indices);
                }
            }
        }
    }
}

impl Node {
    fn new(cell_center: Vector3<f64>, side_length: f64) -> Self {
        Self {
            children: Default::default(),
            multipole: PointMass::default(),
            side_length,
            cell_center,
        }
    }

    /// `depth` is the depth of `self`; its children live one level below.
    fn insert(&mut self, leaf: Leaf, depth: usize, max_depth: usize) -> Result<()> {
        let octant = choose_octant(&self.cell_center, &leaf.particle.position);
        let center = octant_center(self.side_length, self.cell_center, octant);
        self.children[octant].insert(leaf, center, self.side_length / 2., depth + 1, max_depth)
    }

    fn sum_multipole(&mut self) -> PointMass {
        let mut multipole = PointMass::default();
        for child in &mut self.children {
            if let Some(child_multipole) = child.sum_multipole() {
                multipole.combine(&child_multipole);
            }
        }
        self.multipole = multipole;
        multipole
    }

    fn calculate_acceleration(
        &self,
        particle: &PointMass,
        open_angle: f64,
        softening: Option<&Softening>,
    ) -> Vector3<f64> {
        let dist = particle.distance_to(&self.multipole);
        if dist == 0. {
            return Vector3::zeros();
        }

        if self.side_length < open_angle * dist {
            // node is far enough away
            particle.accel_from(&self.multipole, softening)
        } else {
            // near field forces, go deeper into tree
            self.children.iter().fold(Vector3::zeros(), |acc, child| {
                acc + child.calculate_acceleration(particle, open_angle, softening)
            })
        }
    }
}

/// Octant of `position` relative to `center`.
///
/// Bit 0, 1, 2 is set if the x, y, z coordinate lies strictly above the center;
/// coordinates equal to the center belong to the lower half.
fn choose_octant(center: &Vector3<f64>, position: &Vector3<f64>) -> usize {
    let mut octant = 0;
    for axis in 0..3 {
        if position[axis] > center[axis] {
            octant |= 1 << axis;
        }
    }
    octant
}

/// Center of the sub-cell `octant` of a cell with side `side_length`.
fn octant_center(side_length: f64, center: Vector3<f64>, octant: usize) -> Vector3<f64> {
    let step_size = side_length / 4.;
    let mut offset = Vector3::repeat(-step_size);
    for axis in 0..3 {
        if octant & (1 << axis) != 0 {
            offset[axis] = step_size;
        }
    }
    center + offset
}

/// Side length of the smallest origin-centered cube containing all particles.
pub(crate) fn fitted_box_size(particles: &[PointMass]) -> f64 {
    let half_width = particles
        .iter()
        .map(|p| p.position.amax())
        .fold(0., f64::max);
    if half_width > 0. {
        2. * half_width
    } else {
        1.
    }
}
