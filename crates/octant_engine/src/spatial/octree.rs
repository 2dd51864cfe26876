//! Octree spatial partitioning structure
//!
//! Divides the volume of one collider mesh into hierarchical regions. Each
//! triangle lives in the deepest node whose bounds fully contain it, so a
//! triangle straddling an octant boundary stays in the parent. A leaf
//! subdivides into 8 octants once it holds more than
//! [`OctreeConfig::max_triangles_per_node`] triangles, until
//! [`OctreeConfig::max_depth`] is reached.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::error::{EngineError, EngineResult};
use crate::foundation::math::{Mat4, Vec3};
use crate::geometry::{Ray, Sphere, Triangle, AABB};

/// Configuration for octree behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Maximum triangles held by a leaf before it subdivides
    pub max_triangles_per_node: usize,

    /// Maximum subdivision depth (root = 0)
    pub max_depth: u32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_triangles_per_node: 8,
            max_depth: 6,
        }
    }
}

/// Single node in the octree hierarchy
#[derive(Debug, Clone)]
pub struct OctreeNode {
    /// Bounds of this node
    bounds: AABB,

    /// Indices into the owning octree's triangle list
    triangles: Vec<usize>,

    /// Child nodes (8 octants), None if this is a leaf
    children: Option<Box<[OctreeNode; 8]>>,

    /// Depth in the tree (0 = root)
    depth: u32,
}

impl OctreeNode {
    fn new(bounds: AABB, depth: u32) -> Self {
        Self {
            bounds,
            triangles: Vec::new(),
            children: None,
            depth,
        }
    }

    /// Bounds of this node
    pub fn bounds(&self) -> &AABB {
        &self.bounds
    }

    /// Depth in the tree (0 = root)
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Number of triangles stored directly in this node
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Child octants, if subdivided
    pub fn children(&self) -> Option<&[OctreeNode; 8]> {
        self.children.as_deref()
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    // Octant layout: bit 0 = +X, bit 1 = +Y, bit 2 = +Z
    fn octant_index(&self, position: Vec3) -> usize {
        let center = self.bounds.center();
        let x_bit = usize::from(position.x >= center.x);
        let y_bit = usize::from(position.y >= center.y);
        let z_bit = usize::from(position.z >= center.z);
        (z_bit << 2) | (y_bit << 1) | x_bit
    }

    fn subdivide(&mut self, triangles: &[Triangle], config: &OctreeConfig) {
        let center = self.bounds.center();
        let quarter_extents = self.bounds.extents() * 0.5;
        let depth = self.depth + 1;

        let children: [OctreeNode; 8] = std::array::from_fn(|octant| {
            let sign = |bit: usize| if octant & bit != 0 { 1.0 } else { -1.0 };
            let child_center = center + Vec3::new(
                quarter_extents.x * sign(1),
                quarter_extents.y * sign(2),
                quarter_extents.z * sign(4),
            );
            OctreeNode::new(AABB::from_center_extents(child_center, quarter_extents), depth)
        });
        self.children = Some(Box::new(children));

        log::trace!("Octree: subdividing node at depth {} holding {} triangles", self.depth, self.triangles.len());

        for index in std::mem::take(&mut self.triangles) {
            self.insert(index, triangles, config);
        }
    }

    fn insert(&mut self, index: usize, triangles: &[Triangle], config: &OctreeConfig) {
        let tri_bounds = triangles[index].aabb();

        if self.children.is_some() {
            let octant = self.octant_index(tri_bounds.center());
            if let Some(children) = self.children.as_mut() {
                if children[octant].bounds.contains_aabb(&tri_bounds) {
                    children[octant].insert(index, triangles, config);
                    return;
                }
            }
            self.triangles.push(index);
            return;
        }

        self.triangles.push(index);
        if self.triangles.len() > config.max_triangles_per_node && self.depth < config.max_depth {
            self.subdivide(triangles, config);
        }
    }

    /// Visit every node whose bounds pass `node_test`, then every stored
    /// triangle index passing `triangle_test`.
    fn collect<N, T>(&self, node_test: &N, triangle_test: &T, out: &mut Vec<usize>)
    where
        N: Fn(&AABB) -> bool,
        T: Fn(usize) -> bool,
    {
        if !node_test(&self.bounds) {
            return;
        }
        out.extend(self.triangles.iter().copied().filter(|&i| triangle_test(i)));
        if let Some(children) = &self.children {
            for child in children.iter() {
                child.collect(node_test, triangle_test, out);
            }
        }
    }

    fn visit<'a>(&'a self, nodes: &mut Vec<&'a OctreeNode>) {
        nodes.push(self);
        if let Some(children) = &self.children {
            for child in children.iter() {
                child.visit(nodes);
            }
        }
    }
}

/// Static octree over the triangles of one collider mesh
#[derive(Debug, Clone)]
pub struct Octree {
    /// Root node covering the collider volume
    root: OctreeNode,

    /// Every inserted triangle; nodes refer to them by index
    triangles: Vec<Triangle>,

    /// Root bounds grown by any triangle inserted outside of them
    content_bounds: AABB,

    /// Configuration
    config: OctreeConfig,
}

impl Octree {
    /// Create an empty octree around `origin` with the given half extent.
    ///
    /// Every half-extent component must be finite and strictly positive.
    pub fn new(origin: Vec3, half_extent: Vec3) -> EngineResult<Self> {
        Self::with_config(origin, half_extent, OctreeConfig::default())
    }

    /// Create an empty octree with explicit subdivision settings
    pub fn with_config(origin: Vec3, half_extent: Vec3, config: OctreeConfig) -> EngineResult<Self> {
        if half_extent.iter().any(|h| !h.is_finite() || *h <= 0.0) || !origin.iter().all(|o| o.is_finite()) {
            return Err(EngineError::DegenerateBounds { half_extent });
        }

        let bounds = AABB::from_center_extents(origin, half_extent);
        Ok(Self {
            root: OctreeNode::new(bounds, 0),
            triangles: Vec::new(),
            content_bounds: bounds,
            config,
        })
    }

    /// Insert a single triangle
    pub fn insert(&mut self, triangle: Triangle) {
        let tri_bounds = triangle.aabb();
        if !self.root.bounds.contains_aabb(&tri_bounds) {
            log::warn!("Octree: triangle {:?} lies outside the root bounds; stored at the root", triangle);
            self.content_bounds = self.content_bounds.union(&tri_bounds);
        }

        let index = self.triangles.len();
        self.triangles.push(triangle);

        if self.root.bounds.contains_aabb(&tri_bounds) {
            self.root.insert(index, &self.triangles, &self.config);
        } else {
            self.root.triangles.push(index);
        }
    }

    /// Insert every triangle in order
    pub fn insert_all<'a, I>(&mut self, triangles: I)
    where
        I: IntoIterator<Item = &'a Triangle>,
    {
        for triangle in triangles {
            self.insert(*triangle);
        }
        log::debug!(
            "Octree: {} triangles in {} nodes (depth {})",
            self.triangles.len(),
            self.node_count(),
            self.depth()
        );
    }

    /// Root node
    pub fn root(&self) -> &OctreeNode {
        &self.root
    }

    /// Bounds the tree was built with
    pub fn bounds(&self) -> &AABB {
        &self.root.bounds
    }

    /// Subdivision settings
    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// All triangles in insertion order
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Get total triangle count
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Number of nodes, root included
    pub fn node_count(&self) -> usize {
        self.nodes().len()
    }

    /// Deepest node depth
    pub fn depth(&self) -> u32 {
        self.nodes().iter().map(|node| node.depth).max().unwrap_or(0)
    }

    /// Every node in depth-first order (for debugging and visualization)
    pub fn nodes(&self) -> Vec<&OctreeNode> {
        let mut nodes = Vec::new();
        self.root.visit(&mut nodes);
        nodes
    }

    fn gather<N, T>(&self, node_test: N, triangle_test: T) -> Vec<usize>
    where
        N: Fn(&AABB) -> bool,
        T: Fn(usize) -> bool,
    {
        // The root is tested against its content bounds so triangles stored
        // outside the build volume are still reachable.
        if !node_test(&self.content_bounds) {
            return Vec::new();
        }

        let mut indices: Vec<usize> = self.root.triangles.iter().copied().filter(|&i| triangle_test(i)).collect();
        if let Some(children) = &self.root.children {
            for child in children.iter() {
                child.collect(&node_test, &triangle_test, &mut indices);
            }
        }
        indices.sort_unstable();
        indices
    }

    fn resolve(&self, indices: impl IntoIterator<Item = usize>) -> Vec<&Triangle> {
        indices.into_iter().map(|i| &self.triangles[i]).collect()
    }

    /// Triangles whose bounds might intersect `region`, in insertion order
    pub fn query_aabb(&self, region: &AABB) -> Vec<&Triangle> {
        let indices = self.gather(
            |bounds| bounds.intersects(region),
            |i| self.triangles[i].aabb().intersects(region),
        );
        self.resolve(indices)
    }

    /// Triangles whose bounds might intersect `sphere`, in insertion order
    pub fn query_sphere(&self, sphere: &Sphere) -> Vec<&Triangle> {
        let indices = self.gather(
            |bounds| sphere.intersects_aabb(bounds),
            |i| sphere.intersects_aabb(&self.triangles[i].aabb()),
        );
        self.resolve(indices)
    }

    /// Triangles of this tree that might touch any triangle of `other`.
    ///
    /// `other_to_self` maps the other tree's space into this tree's space.
    /// Each occupied node of `other` contributes the box around its own
    /// triangles, transformed conservatively.
    pub fn query_octree(&self, other: &Octree, other_to_self: &Mat4) -> Vec<&Triangle> {
        let mut hits = BTreeSet::new();
        for node in other.nodes() {
            let occupied = AABB::from_points(
                node.triangles
                    .iter()
                    .flat_map(|&i| other.triangles[i].vertices()),
            );
            if let Some(region) = occupied {
                let region = region.transformed(other_to_self);
                hits.extend(self.gather(
                    |bounds| bounds.intersects(&region),
                    |i| self.triangles[i].aabb().intersects(&region),
                ));
            }
        }
        self.resolve(hits)
    }

    /// Nearest triangle hit by `ray`, with its distance along the ray
    pub fn ray_intersection(&self, ray: &Ray) -> Option<(f32, &Triangle)> {
        self.gather(
            |bounds| bounds.intersect_ray(ray.origin, ray.direction).is_some(),
            |_| true,
        )
        .into_iter()
        .filter_map(|i| {
            let triangle = &self.triangles[i];
            triangle.intersect_ray(ray).map(|(t, _, _)| (t, triangle))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::make_translation;
    use approx::assert_relative_eq;

    fn slanted_triangle() -> Triangle {
        Triangle::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 1.0),
        )
    }

    fn single_triangle_tree() -> Octree {
        let triangle = slanted_triangle();
        let aabb = triangle.aabb();
        let mut octree = Octree::new(aabb.center(), aabb.extents()).unwrap();
        octree.insert_all([triangle].iter());
        octree
    }

    /// Grid of small triangles filling [0, n) on x and z at y = 0..0.5
    fn grid_tree(n: usize, config: OctreeConfig) -> Octree {
        let mut triangles = Vec::new();
        for x in 0..n {
            for z in 0..n {
                let base = Vec3::new(x as f32, 0.0, z as f32);
                triangles.push(Triangle::new(
                    base + Vec3::new(0.1, 0.0, 0.1),
                    base + Vec3::new(0.9, 0.0, 0.1),
                    base + Vec3::new(0.1, 0.5, 0.9),
                ));
            }
        }
        let half = n as f32 * 0.5;
        let mut octree = Octree::with_config(Vec3::new(half, 0.25, half), Vec3::new(half, 0.25, half), config).unwrap();
        octree.insert_all(&triangles);
        octree
    }

    #[test]
    fn test_degenerate_bounds_rejected() {
        let flat = Octree::new(Vec3::zeros(), Vec3::new(1.0, 0.0, 1.0));
        assert!(matches!(flat, Err(EngineError::DegenerateBounds { .. })));

        let negative = Octree::new(Vec3::zeros(), Vec3::new(1.0, -1.0, 1.0));
        assert!(negative.is_err());

        let nan = Octree::new(Vec3::zeros(), Vec3::new(f32::NAN, 1.0, 1.0));
        assert!(nan.is_err());
    }

    #[test]
    fn test_single_triangle_disjoint_query_is_empty() {
        let octree = single_triangle_tree();
        let far = AABB::new(Vec3::new(10.0, 10.0, 10.0), Vec3::new(11.0, 11.0, 11.0));
        assert!(octree.query_aabb(&far).is_empty());
        assert!(octree.query_sphere(&Sphere::new(Vec3::new(-5.0, 0.0, 0.0), 1.0)).is_empty());
    }

    #[test]
    fn test_single_triangle_containing_query_returns_it() {
        let octree = single_triangle_tree();
        let around = AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(2.0, 2.0, 2.0));

        let hits = octree.query_aabb(&around);
        assert_eq!(hits.len(), 1);
        assert_eq!(*hits[0], slanted_triangle());

        let hits = octree.query_sphere(&Sphere::new(Vec3::new(0.5, 0.5, 0.5), 3.0));
        assert_eq!(hits, vec![&slanted_triangle()]);
    }

    #[test]
    fn test_subdivision_respects_config() {
        let config = OctreeConfig { max_triangles_per_node: 4, max_depth: 3 };
        let octree = grid_tree(8, config);

        assert_eq!(octree.triangle_count(), 64);
        assert!(!octree.root().is_leaf());
        assert!(octree.depth() <= 3);
        let stored: usize = octree.nodes().iter().map(|node| node.triangle_count()).sum();
        assert_eq!(stored, 64);
    }

    #[test]
    fn test_query_is_conservative() {
        let octree = grid_tree(8, OctreeConfig { max_triangles_per_node: 2, max_depth: 5 });
        let region = AABB::new(Vec3::new(2.5, -1.0, 2.5), Vec3::new(4.2, 1.0, 3.2));

        let hits = octree.query_aabb(&region);
        let expected: Vec<_> = octree
            .triangles()
            .iter()
            .filter(|t| t.aabb().intersects(&region))
            .collect();
        assert_eq!(hits, expected);
        assert!(!hits.is_empty());
    }

    #[test]
    fn test_octree_vs_octree_query() {
        let a = grid_tree(4, OctreeConfig::default());
        let b = single_triangle_tree();

        let overlapping = a.query_octree(&b, &make_translation(&Vec3::new(1.0, 0.0, 1.0)));
        assert!(!overlapping.is_empty());

        let far = a.query_octree(&b, &make_translation(&Vec3::new(50.0, 0.0, 0.0)));
        assert!(far.is_empty());
    }

    #[test]
    fn test_ray_intersection_finds_nearest() {
        let octree = grid_tree(4, OctreeConfig { max_triangles_per_node: 1, max_depth: 4 });
        let ray = Ray::new(Vec3::new(1.3, 5.0, 1.2), Vec3::new(0.0, -1.0, 0.0));

        let (t, triangle) = octree.ray_intersection(&ray).unwrap();
        assert_relative_eq!(t, 4.9375, epsilon = 1e-4);
        assert!(triangle.aabb().contains_point(Vec3::new(1.3, 0.0, 1.2)));

        let miss = Ray::new(Vec3::new(-3.0, 5.0, -3.0), Vec3::new(0.0, -1.0, 0.0));
        assert!(octree.ray_intersection(&miss).is_none());
    }

    #[test]
    fn test_out_of_bounds_triangle_still_found() {
        let mut octree = Octree::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0)).unwrap();
        let outside = Triangle::new(
            Vec3::new(5.0, 5.0, 5.0),
            Vec3::new(6.0, 5.0, 5.0),
            Vec3::new(5.0, 6.0, 5.0),
        );
        octree.insert(outside);

        let region = AABB::new(Vec3::new(4.5, 4.5, 4.5), Vec3::new(5.5, 5.5, 5.5));
        assert_eq!(octree.query_aabb(&region).len(), 1);
    }
}
