// This file has code from https://github.com/LIHPC-Computational-Geometry/coupe
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator};
use rayon::iter::IntoParallelIterator;
use rayon::iter::ParallelIterator as _;
use std::iter::{Cloned, Zip};
use std::slice::Iter;
use ::sprs::CsMat;

/// Struct that represents a graph
#[derive(Debug, Clone)]
pub struct Graph {
    /// The CsMat (from sprs) is used to store the graph as a sparse matrix in CSR format
    pub graph_csr: CsMat<f64>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// Create a new graph
    pub fn new() -> Self {
        Self {
            graph_csr: CsMat::empty(sprs::CSR, 0),
        }
    }

    /// The number of vertices in the graph.
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.graph_csr.rows(), self.graph_csr.cols());
        self.graph_csr.rows()
    }

    /// Whether the graph has no vertices.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// An iterator over the neighbors of the given vertex.
    pub fn neighbors(&self, vertex: usize) -> Zip<Cloned<Iter<'_, usize>>, Cloned<Iter<'_, f64>>> {
        let (indices, data) = self
            .graph_csr
            .outer_view(vertex)
            .map(|view| view.into_raw_storage())
            .unwrap_or_default();
        indices.iter().cloned().zip(data.iter().cloned())
    }

    /// Insert an edge with two vertices on either ends.
    pub fn insert(&mut self, vertex1: usize, vertex2: usize, edge_weight: f64) {
        self.graph_csr.insert(vertex1, vertex2, edge_weight);
    }

    /// Get edge weight for a pair of vertices.
    pub fn get_edge_weight(&self, vertex1: usize, vertex2: usize) -> Option<f64> {
        self.graph_csr.get(vertex1, vertex2).cloned()
    }

    /// The edge cut of a partition: the total weight of the edges linking
    /// vertices of different parts. Each undirected edge is stored twice and
    /// counted once.
    pub fn edge_cut(&self, partition: &[usize]) -> f64 {
        debug_assert_eq!(self.len(), partition.len());

        self.lower_triangle_sum(|vertex, neighbor, edge_weight| {
            if partition[vertex] != partition[neighbor] {
                edge_weight
            } else {
                0.0
            }
        })
    }

    /// The edge cut of a relaxed partition `x` in `[0, 1]^n`:
    /// `sum_{i<j} w_ij (x_i + x_j - 2 x_i x_j)`.
    ///
    /// Agrees with [`edge_cut`](Graph::edge_cut) when every `x_i` is 0 or 1.
    pub fn relaxed_cut(&self, x: &[f64]) -> f64 {
        debug_assert_eq!(self.len(), x.len());

        self.lower_triangle_sum(|vertex, neighbor, edge_weight| {
            let (xi, xj) = (x[vertex], x[neighbor]);
            edge_weight * (xi + xj - 2.0 * xi * xj)
        })
    }

    /// Gradient of [`relaxed_cut`](Graph::relaxed_cut) for a symmetric
    /// adjacency: `g_i = sum_j w_ij (1 - 2 x_j)`.
    pub fn cut_gradient(&self, x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(self.len(), x.len());

        (0..self.len())
            .into_par_iter()
            .map(|vertex| {
                self.neighbors(vertex)
                    .map(|(neighbor, edge_weight)| edge_weight * (1.0 - 2.0 * x[neighbor]))
                    .sum::<f64>()
            })
            .collect()
    }

    // Sum `term` over the stored entries below the diagonal, one row per task.
    fn lower_triangle_sum<F>(&self, term: F) -> f64
    where
        F: Fn(usize, usize, f64) -> f64 + Sync,
    {
        let indptr = self.graph_csr.indptr().into_raw_storage();
        let indices = self.graph_csr.indices();
        let data = self.graph_csr.data();
        indptr
            .par_iter()
            .zip(&indptr[1..])
            .enumerate()
            .map(|(vertex, (start, end))| {
                let neighbors = &indices[*start..*end];
                let edge_weights = &data[*start..*end];
                neighbors
                    .iter()
                    .zip(edge_weights)
                    .take_while(|(neighbor, _edge_weight)| **neighbor < vertex)
                    .map(|(neighbor, edge_weight)| term(vertex, *neighbor, *edge_weight))
                    .sum::<f64>()
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use super::*;

    // 0 - 1 - 2 - 3 with weights 1, 2, 3.
    fn path_graph() -> Graph {
        let mut graph = Graph::new();
        for (u, v, w) in [(0, 1, 1.0), (1, 2, 2.0), (2, 3, 3.0)] {
            graph.insert(u, v, w);
            graph.insert(v, u, w);
        }
        graph
    }

    #[test]
    fn test_edge_cut() {
        // Arrange
        let graph = path_graph();

        // Act & Assert
        assert_eq!(graph.edge_cut(&[0, 0, 1, 1]), 2.0);
        assert_eq!(graph.edge_cut(&[0, 1, 0, 1]), 6.0);
        assert_eq!(graph.edge_cut(&[1, 1, 1, 1]), 0.0);
    }

    #[test]
    fn test_relaxed_cut_matches_edge_cut_on_binary_points() {
        // Arrange
        let graph = path_graph();
        let partition = [0, 1, 1, 0];
        let x: Vec<f64> = partition.iter().map(|&part| part as f64).collect();

        // Act
        let relaxed = graph.relaxed_cut(&x);

        // Assert
        assert_eq!(relaxed, graph.edge_cut(&partition));
    }

    #[test]
    fn test_relaxed_cut_at_half() {
        // Every edge contributes w * (0.5 + 0.5 - 0.5).
        let graph = path_graph();
        assert_relative_eq!(graph.relaxed_cut(&[0.5; 4]), 3.0);
    }

    #[test]
    fn test_cut_gradient() {
        // Arrange
        let graph = path_graph();
        let x = [0.0, 1.0, 0.5, 0.25];

        // Act
        let gradient = graph.cut_gradient(&x);

        // Assert
        // g_0 = 1 * (1 - 2), g_1 = 1 * 1 + 2 * 0, g_2 = 2 * (1 - 2) + 3 * 0.5, g_3 = 3 * 0.
        itertools::assert_equal(gradient, [-1.0, 1.0, -0.5, 0.0]);
    }

    #[test]
    fn test_cut_gradient_is_finite_difference_of_relaxed_cut() {
        // Arrange
        let graph = path_graph();
        let x = [0.1, 0.7, 0.4, 0.9];
        let h = 1e-6;

        // Act
        let gradient = graph.cut_gradient(&x);

        // Assert
        for vertex in 0..x.len() {
            let mut forward = x;
            let mut backward = x;
            forward[vertex] += h;
            backward[vertex] -= h;
            let estimate = (graph.relaxed_cut(&forward) - graph.relaxed_cut(&backward)) / (2.0 * h);
            assert_relative_eq!(gradient[vertex], estimate, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_neighbors_and_edge_weights() {
        let graph = path_graph();

        assert_eq!(graph.neighbors(0).collect::<Vec<_>>(), vec![(1, 1.0)]);
        assert_eq!(graph.get_edge_weight(2, 3), Some(3.0));
        assert_eq!(graph.get_edge_weight(0, 3), None);
        assert!(Graph::new().is_empty());
    }
}
