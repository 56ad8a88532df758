//! 3D k-d tree for spatial neighbor queries
//!
//! Provides O(k log n) k-nearest-neighbor queries over cell coordinates.
//! The local metric engine queries with points that are themselves in the
//! tree, so a cell is always among its own nearest neighbors.
//!
//! Reference:
//! Bentley, J.L. (1975). Multidimensional binary search trees used
//! for associative searching. CACM, 18(9).

/// A k-d tree over 3D points.
#[derive(Debug)]
pub struct KdTree3 {
    nodes: Vec<KdNode>,
    points: Vec<[f64; 3]>,
}

#[derive(Debug)]
struct KdNode {
    /// Index into `points`
    point_idx: usize,
    /// Split dimension: 0 = x, 1 = y, 2 = z
    split_dim: u8,
    /// Left child index (None = leaf)
    left: Option<usize>,
    /// Right child index (None = leaf)
    right: Option<usize>,
}

/// One result of a k-nearest-neighbor query.
#[derive(Debug, Clone, Copy)]
pub struct Neighbor {
    /// Index of the point in the original slice passed to [`KdTree3::build`].
    pub index: usize,
    pub distance_sq: f64,
}

impl KdTree3 {
    /// Build a tree from points.
    ///
    /// Construction is O(n log n) using median-of-coordinate splitting.
    pub fn build(points: &[[f64; 3]]) -> Self {
        if points.is_empty() {
            return Self {
                nodes: Vec::new(),
                points: Vec::new(),
            };
        }

        let stored: Vec<[f64; 3]> = points.to_vec();
        let mut indices: Vec<usize> = (0..points.len()).collect();
        let mut nodes = Vec::with_capacity(points.len());

        build_recursive(&stored, &mut indices, 0, &mut nodes);

        Self {
            nodes,
            points: stored,
        }
    }

    /// Number of points in the tree.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Find the k nearest points to `q` (Euclidean distance).
    ///
    /// Returns up to k results sorted by ascending distance. When `q` is a
    /// point of the tree, it is its own first neighbor at distance 0.
    pub fn k_nearest(&self, q: [f64; 3], k: usize) -> Vec<Neighbor> {
        if self.nodes.is_empty() || k == 0 {
            return Vec::new();
        }

        // Bounded max-heap kept as a descending-sorted vec of size k
        let mut heap: Vec<(f64, usize)> = Vec::with_capacity(k + 1);

        self.knn_recursive(0, q, k, &mut heap);

        heap.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        heap.into_iter()
            .map(|(distance_sq, index)| Neighbor { index, distance_sq })
            .collect()
    }

    fn knn_recursive(&self, node_idx: usize, q: [f64; 3], k: usize, heap: &mut Vec<(f64, usize)>) {
        let node = &self.nodes[node_idx];
        let p = &self.points[node.point_idx];

        let delta = [q[0] - p[0], q[1] - p[1], q[2] - p[2]];
        let dist_sq = delta[0] * delta[0] + delta[1] * delta[1] + delta[2] * delta[2];

        let max_dist_sq = if heap.len() >= k { heap[0].0 } else { f64::MAX };

        if dist_sq < max_dist_sq || heap.len() < k {
            if heap.len() >= k {
                heap.remove(0);
            }
            let pos = heap
                .binary_search_by(|probe| {
                    probe
                        .0
                        .partial_cmp(&dist_sq)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .reverse()
                })
                .unwrap_or_else(|e| e);
            heap.insert(pos, (dist_sq, node.point_idx));
        }

        let diff = delta[node.split_dim as usize];
        let (first, second) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(child) = first {
            self.knn_recursive(child, q, k, heap);
        }

        let threshold = if heap.len() >= k { heap[0].0 } else { f64::MAX };

        if diff * diff < threshold {
            if let Some(child) = second {
                self.knn_recursive(child, q, k, heap);
            }
        }
    }
}

/// Recursively build the tree, cycling split dimensions by depth.
fn build_recursive(
    points: &[[f64; 3]],
    indices: &mut [usize],
    depth: usize,
    nodes: &mut Vec<KdNode>,
) -> usize {
    let n = indices.len();
    let split_dim = (depth % 3) as u8;

    indices.sort_by(|&a, &b| {
        points[a][split_dim as usize]
            .partial_cmp(&points[b][split_dim as usize])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let median = n / 2;
    let point_idx = indices[median];

    let node_idx = nodes.len();
    nodes.push(KdNode {
        point_idx,
        split_dim,
        left: None,
        right: None,
    });

    if median > 0 {
        let mut left_indices = indices[..median].to_vec();
        let left_idx = build_recursive(points, &mut left_indices, depth + 1, nodes);
        nodes[node_idx].left = Some(left_idx);
    }

    if median + 1 < n {
        let mut right_indices = indices[median + 1..].to_vec();
        let right_idx = build_recursive(points, &mut right_indices, depth + 1, nodes);
        nodes[node_idx].right = Some(right_idx);
    }

    node_idx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist_sq(a: [f64; 3], b: [f64; 3]) -> f64 {
        (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
    }

    fn sample_points() -> Vec<[f64; 3]> {
        vec![
            [2.0, 3.0, 1.0],
            [5.0, 4.0, 2.0],
            [9.0, 6.0, 3.0],
            [4.0, 7.0, 0.5],
            [8.0, 1.0, 4.0],
            [7.0, 2.0, 1.5],
            [1.0, 8.0, 2.5],
            [6.0, 5.0, 3.5],
        ]
    }

    #[test]
    fn build_and_size() {
        let tree = KdTree3::build(&sample_points());
        assert_eq!(tree.len(), 8);
        assert!(!tree.is_empty());
    }

    #[test]
    fn empty_tree() {
        let tree = KdTree3::build(&[]);
        assert!(tree.is_empty());
        assert!(tree.k_nearest([0.0, 0.0, 0.0], 3).is_empty());
    }

    #[test]
    fn query_point_is_own_first_neighbor() {
        let pts = sample_points();
        let tree = KdTree3::build(&pts);
        let results = tree.k_nearest(pts[3], 4);
        assert_eq!(results[0].index, 3);
        assert!(results[0].distance_sq < 1e-12);
    }

    #[test]
    fn k_nearest_matches_brute_force() {
        let pts = sample_points();
        let tree = KdTree3::build(&pts);

        for &q in &[[5.0, 5.0, 2.0], [0.0, 0.0, 0.0], [9.0, 9.0, 9.0]] {
            let results = tree.k_nearest(q, 3);
            assert_eq!(results.len(), 3);

            // ascending order
            for pair in results.windows(2) {
                assert!(pair[1].distance_sq >= pair[0].distance_sq);
            }

            let mut bf: Vec<f64> = pts.iter().map(|&p| dist_sq(q, p)).collect();
            bf.sort_by(|a, b| a.partial_cmp(b).unwrap());

            for (r, d) in results.iter().zip(&bf) {
                assert!((r.distance_sq - d).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn k_larger_than_point_count() {
        let pts = sample_points();
        let tree = KdTree3::build(&pts);
        let results = tree.k_nearest([5.0, 5.0, 5.0], 100);
        assert_eq!(results.len(), pts.len());
    }

    #[test]
    fn collinear_points() {
        let pts: Vec<[f64; 3]> = (0..10).map(|i| [i as f64, 0.0, 0.0]).collect();
        let tree = KdTree3::build(&pts);
        let results = tree.k_nearest([4.5, 0.0, 0.0], 2);
        assert_eq!(results.len(), 2);
        let found: Vec<usize> = results.iter().map(|r| r.index).collect();
        assert!(found.contains(&4) && found.contains(&5));
    }

    #[test]
    fn large_dataset_spot_check() {
        let pts: Vec<[f64; 3]> = (0..1000)
            .map(|i| {
                [
                    ((i * 7 + 13) % 100) as f64,
                    ((i * 11 + 37) % 100) as f64,
                    ((i * 17 + 5) % 100) as f64,
                ]
            })
            .collect();
        let tree = KdTree3::build(&pts);
        assert_eq!(tree.len(), 1000);

        let q = [50.0, 50.0, 50.0];
        let result = tree.k_nearest(q, 1)[0];
        let bf = pts.iter().map(|&p| dist_sq(q, p)).fold(f64::MAX, f64::min);
        assert!((result.distance_sq - bf).abs() < 1e-10);
    }
}
