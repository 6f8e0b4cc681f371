//! Barnes-Hut quadtree over fixed-point coordinates.
//!
//! The tree aggregates the swarm into hierarchical point masses so the
//! per-agent force query is O(log n) instead of O(n). Nodes live in an arena
//! `Vec` and reference children by index; the arena is reused across ticks
//! because the tree is rebuilt from scratch every step.
//!
//! # Determinism
//!
//! Everything in here is scaled-integer arithmetic ([`FixedNum`]), so a build
//! over the same agent set produces bit-identical masses, centers and forces
//! on every platform.

use smallvec::SmallVec;

use super::fixed_math::{sqrt_fixed, FixedNum, FixedVec2};

/// A leaf subdivides once it holds more than this many agents.
pub const LEAF_CAPACITY: usize = 4;

/// Cells narrower than one world unit never subdivide, regardless of load.
const MIN_CELL_WIDTH: FixedNum = FixedNum::ONE;

type Held = SmallVec<[(u32, FixedVec2); LEAF_CAPACITY + 1]>;

/// Axis-aligned box covering a node, origin at the top-left corner.
#[derive(Clone, Copy, Debug)]
pub struct Aabb {
    pub x: FixedNum,
    pub y: FixedNum,
    pub w: FixedNum,
    pub h: FixedNum,
}

impl Aabb {
    /// Quadrant index for a point: bit 0 = right half, bit 1 = lower half.
    /// Points exactly on a midline go to the higher-index quadrant.
    fn quadrant(&self, p: FixedVec2) -> usize {
        let mid_x = self.x + (self.w >> 1);
        let mid_y = self.y + (self.h >> 1);
        (p.x >= mid_x) as usize + 2 * ((p.y >= mid_y) as usize)
    }

    /// The box of one quadrant, splitting both axes at the midpoint.
    fn child(&self, quadrant: usize) -> Self {
        let hw = self.w >> 1;
        let hh = self.h >> 1;
        Self {
            x: if quadrant & 1 != 0 { self.x + hw } else { self.x },
            y: if quadrant & 2 != 0 { self.y + hh } else { self.y },
            w: hw,
            h: hh,
        }
    }
}

/// Leaf/internal duality as a sum type: a node either holds agents directly
/// or owns exactly four children. There is no third state.
enum NodeKind {
    Leaf(Held),
    Internal([u32; 4]),
}

struct QuadNode {
    bounds: Aabb,
    kind: NodeKind,
    /// Number of agents in this subtree.
    mass: u32,
    /// Mass-weighted mean position of the subtree.
    center: FixedVec2,
}

impl QuadNode {
    fn leaf(bounds: Aabb) -> Self {
        Self {
            bounds,
            kind: NodeKind::Leaf(Held::new()),
            mass: 0,
            center: FixedVec2::ZERO,
        }
    }
}

/// Arena-allocated Barnes-Hut quadtree, rebuilt once per tick.
pub struct QuadTree {
    nodes: Vec<QuadNode>,
}

impl QuadTree {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Rebuilds the tree over the world box [0, width] x [0, height].
    ///
    /// The node arena is cleared and reused; no cross-tick state survives.
    pub fn rebuild<I>(&mut self, width: FixedNum, height: FixedNum, agents: I)
    where
        I: IntoIterator<Item = (u32, FixedVec2)>,
    {
        self.nodes.clear();
        self.nodes.push(QuadNode::leaf(Aabb {
            x: FixedNum::ZERO,
            y: FixedNum::ZERO,
            w: width,
            h: height,
        }));
        for (id, pos) in agents {
            self.insert_from(0, id, pos);
        }
        self.aggregate();
    }

    /// Total agent count seen by the last rebuild.
    pub fn root_mass(&self) -> u32 {
        self.nodes.first().map_or(0, |root| root.mass)
    }

    fn insert_from(&mut self, start: usize, id: u32, pos: FixedVec2) {
        let mut idx = start;
        loop {
            let bounds = self.nodes[idx].bounds;
            let quadrant = bounds.quadrant(pos);
            match &mut self.nodes[idx].kind {
                NodeKind::Internal(children) => {
                    idx = children[quadrant] as usize;
                }
                NodeKind::Leaf(held) => {
                    held.push((id, pos));
                    if held.len() > LEAF_CAPACITY && bounds.w > MIN_CELL_WIDTH {
                        self.subdivide(idx);
                    }
                    return;
                }
            }
        }
    }

    /// Splits a full leaf into four quadrant children and redistributes the
    /// held agents. Children are pushed after the parent, so a reverse arena
    /// sweep always visits children before parents.
    fn subdivide(&mut self, idx: usize) {
        let bounds = self.nodes[idx].bounds;
        let first_child = self.nodes.len() as u32;
        for quadrant in 0..4 {
            self.nodes.push(QuadNode::leaf(bounds.child(quadrant)));
        }
        let children = [first_child, first_child + 1, first_child + 2, first_child + 3];
        let held = match std::mem::replace(&mut self.nodes[idx].kind, NodeKind::Internal(children)) {
            NodeKind::Leaf(held) => held,
            NodeKind::Internal(prior) => {
                // Only leaves are ever subdivided; keep the prior children.
                self.nodes[idx].kind = NodeKind::Internal(prior);
                return;
            }
        };
        for (id, pos) in held {
            let quadrant = bounds.quadrant(pos);
            self.insert_from(children[quadrant] as usize, id, pos);
        }
    }

    /// Bottom-up mass and mass-center pass over the whole arena.
    fn aggregate(&mut self) {
        for idx in (0..self.nodes.len()).rev() {
            let (mass, center) = match &self.nodes[idx].kind {
                NodeKind::Leaf(held) => {
                    if held.is_empty() {
                        (0, FixedVec2::ZERO)
                    } else {
                        let mut sum = FixedVec2::ZERO;
                        for &(_, pos) in held.iter() {
                            sum = sum + pos;
                        }
                        let count = held.len() as u32;
                        (count, sum / FixedNum::from_num(count))
                    }
                }
                NodeKind::Internal(children) => {
                    let mut mass = 0u32;
                    let mut weighted = FixedVec2::ZERO;
                    for &child in children {
                        let child = &self.nodes[child as usize];
                        mass += child.mass;
                        weighted = weighted + child.center * FixedNum::from_num(child.mass);
                    }
                    if mass == 0 {
                        (0, FixedVec2::ZERO)
                    } else {
                        (mass, weighted / FixedNum::from_num(mass))
                    }
                }
            };
            self.nodes[idx].mass = mass;
            self.nodes[idx].center = center;
        }
    }

    /// Aggregate swarm force on a position.
    ///
    /// Walks the tree from the root. A subtree whose width is below
    /// `theta * distance` (or any leaf) is folded into one point mass pulling
    /// toward its mass-center with magnitude `min(mass / dist_sq, 1)`.
    /// Zero-mass nodes and positions inside the distance floor contribute
    /// nothing, so the query is total: no division by zero, no error path.
    pub fn force_at(&self, pos: FixedVec2, theta: FixedNum, floor_sq: FixedNum) -> FixedVec2 {
        if self.nodes.is_empty() {
            return FixedVec2::ZERO;
        }
        self.force_from(0, pos, theta, floor_sq)
    }

    fn force_from(&self, idx: usize, pos: FixedVec2, theta: FixedNum, floor_sq: FixedNum) -> FixedVec2 {
        let node = &self.nodes[idx];
        if node.mass == 0 {
            return FixedVec2::ZERO;
        }
        let diff = node.center - pos;
        let dist_sq = diff.length_squared();
        if dist_sq < floor_sq || dist_sq == FixedNum::ZERO {
            return FixedVec2::ZERO;
        }
        match &node.kind {
            NodeKind::Leaf(_) => point_mass_force(node.mass, diff, dist_sq),
            NodeKind::Internal(children) => {
                let dist = sqrt_fixed(dist_sq);
                if node.bounds.w < theta * dist {
                    return point_mass_force(node.mass, diff, dist_sq);
                }
                let mut total = FixedVec2::ZERO;
                for &child in children {
                    total = total + self.force_from(child as usize, pos, theta, floor_sq);
                }
                total
            }
        }
    }
}

impl Default for QuadTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Capped inverse-square attraction toward a point mass.
fn point_mass_force(mass: u32, diff: FixedVec2, dist_sq: FixedNum) -> FixedVec2 {
    let magnitude = (FixedNum::from_num(mass) / dist_sq).min(FixedNum::ONE);
    let dist = sqrt_fixed(dist_sq);
    diff / dist * magnitude
}
