//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! The tree lives in a flat arena of [`BvhNode`]s addressed by index, root
//! first. Construction is iterative: a work stack of leaf ranges is split by a
//! median on a randomly chosen axis until every range holds one entity.
//!
//! Nodes are laid out in depth-first pre-order, so a subtree over `n` leaves
//! occupies exactly `2n - 1` consecutive slots. That lets the builder record
//! both child indices of an interior node the moment it is created.

use lumen_ecs::{Entity, View, World};
use lumen_math::{Aabb, Interval, Ray};
use rand::RngCore;

use crate::random::gen_int;
use crate::Bounds;

/// Query over entities that take part in the BVH.
pub type BvhView = View<(Bounds,)>;

/// A node in the BVH arena.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BvhNode {
    /// Internal node with two children.
    Interior { bounds: Aabb, left: u32, right: u32 },
    /// Leaf node holding one entity.
    Leaf { bounds: Aabb, entity: Entity },
}

impl BvhNode {
    #[inline]
    pub fn bounds(&self) -> &Aabb {
        match self {
            BvhNode::Interior { bounds, .. } | BvhNode::Leaf { bounds, .. } => bounds,
        }
    }
}

/// Pending range of leaves and the arena slot its subtree root will occupy.
struct BuildTask {
    start: usize,
    end: usize,
    node: u32,
}

/// Flat binary BVH over entity bounds.
#[derive(Debug, Clone)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
}

impl Bvh {
    /// Build over every entity in the view.
    ///
    /// # Panics
    /// If the view is stale or empty.
    pub fn build(world: &World, view: &BvhView, rng: &mut dyn RngCore) -> Self {
        let leaves = view
            .iter(world)
            .map(|(entity, (bounds,))| (entity, bounds.world))
            .collect();
        Self::from_leaves(leaves, rng)
    }

    /// Build over explicit `(entity, bounds)` leaves.
    ///
    /// # Panics
    /// If `leaves` is empty.
    pub fn from_leaves(mut leaves: Vec<(Entity, Aabb)>, rng: &mut dyn RngCore) -> Self {
        assert!(!leaves.is_empty(), "cannot build a BVH over an empty scene");

        let mut nodes = Vec::with_capacity(2 * leaves.len() - 1);
        let mut work = vec![BuildTask {
            start: 0,
            end: leaves.len(),
            node: 0,
        }];

        while let Some(BuildTask { start, end, node }) = work.pop() {
            debug_assert_eq!(node as usize, nodes.len());

            let bounds = leaves[start..end]
                .iter()
                .fold(Aabb::EMPTY, |acc, (_, b)| Aabb::surrounding(&acc, b));

            if end - start == 1 {
                nodes.push(BvhNode::Leaf {
                    bounds,
                    entity: leaves[start].0,
                });
                continue;
            }

            let axis = gen_int(rng, 0, 2) as usize;
            let mid = start + (end - start) / 2;
            leaves[start..end].select_nth_unstable_by(mid - start, |a, b| {
                let a_mid = a.1.axis_interval(axis).midpoint();
                let b_mid = b.1.axis_interval(axis).midpoint();
                a_mid.total_cmp(&b_mid)
            });

            let left = node + 1;
            let right = node + 2 * (mid - start) as u32;
            nodes.push(BvhNode::Interior {
                bounds,
                left,
                right,
            });

            // Left is pushed last so it is built next, directly after its parent
            work.push(BuildTask {
                start: mid,
                end,
                node: right,
            });
            work.push(BuildTask {
                start,
                end: mid,
                node: left,
            });
        }

        let bvh = Self { nodes };
        log::info!(
            "built BVH: {} leaves, {} nodes, depth {}",
            leaves.len(),
            bvh.nodes.len(),
            bvh.depth()
        );
        bvh
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Bounds of the whole tree.
    pub fn root_bounds(&self) -> &Aabb {
        self.nodes[0].bounds()
    }

    pub fn leaf_count(&self) -> usize {
        (self.nodes.len() + 1) / 2
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(0u32, 1usize)];
        while let Some((index, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            if let BvhNode::Interior { left, right, .. } = self.nodes[index as usize] {
                stack.push((left, depth + 1));
                stack.push((right, depth + 1));
            }
        }
        deepest
    }

    /// Collect entities whose leaf bounds the ray crosses within `ray_t`.
    ///
    /// The result is unordered and may contain entities the ray misses; exact
    /// tests are left to the geometry.
    pub fn intersect<'t>(
        &self,
        ray: &Ray,
        ray_t: Interval,
        traversal: &'t mut Traversal,
    ) -> &'t [Entity] {
        let Traversal { stack, candidates } = traversal;
        stack.clear();
        candidates.clear();

        if !self.root_bounds().hit(ray, ray_t) {
            return candidates;
        }
        stack.push(0);

        while let Some(index) = stack.pop() {
            match self.nodes[index as usize] {
                BvhNode::Leaf { entity, .. } => candidates.push(entity),
                BvhNode::Interior { left, right, .. } => {
                    for child in [right, left] {
                        if self.nodes[child as usize].bounds().hit(ray, ray_t) {
                            stack.push(child);
                        }
                    }
                }
            }
        }

        candidates
    }

    /// Allocating convenience over [`Bvh::intersect`].
    pub fn candidates(&self, ray: &Ray, ray_t: Interval) -> Vec<Entity> {
        let mut traversal = Traversal::new();
        self.intersect(ray, ray_t, &mut traversal).to_vec()
    }
}

/// Reusable scratch space for BVH queries, one per worker.
#[derive(Debug, Default)]
pub struct Traversal {
    stack: Vec<u32>,
    candidates: Vec<Entity>,
}

impl Traversal {
    pub fn new() -> Self {
        Self::default()
    }
}
