use std::fs::File;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;
use sprs::io::{read_matrix_market, IoError};
use sprs::{CsMat, TriMat};
use tracing::debug;
use crate::graph::Graph;

/// Read a matrix market file and output Graph struct.
///
/// The adjacency is sanitized on the way in: the matrix must be square,
/// self-loops are dropped and each edge gets the larger of its two stored
/// weights, so a file holding a single triangle still gives an undirected
/// graph.
pub fn read_matrix_market_as_graph(file_path: &Path) -> Result<Graph, IoError> {
    // Read the matrix market file as a TriMat with edge weights.
    let tri_matrix: TriMat<f64> = read_matrix_market(file_path)?;
    if tri_matrix.rows() != tri_matrix.cols() {
        return Err(IoError::from(std::io::Error::new(
            ErrorKind::InvalidData,
            format!(
                "adjacency matrix is not square ({} x {})",
                tri_matrix.rows(),
                tri_matrix.cols()
            ),
        )));
    }

    let graph = Graph {
        graph_csr: sanitize(&tri_matrix.to_csr()),
    };
    debug!(
        path = %file_path.display(),
        vertices = graph.len(),
        entries = graph.graph_csr.nnz(),
        "read graph"
    );
    Ok(graph)
}

// Drop the diagonal and symmetrize with max(a_ij, a_ji).
fn sanitize(matrix: &CsMat<f64>) -> CsMat<f64> {
    let n = matrix.rows();
    let mut symmetric = TriMat::with_capacity((n, n), 2 * matrix.nnz());
    for (&edge_weight, (row, col)) in matrix.iter() {
        if row == col {
            continue;
        }
        match matrix.get(col, row) {
            // Both halves are stored: each one emits its own entry.
            Some(&mirror_weight) => symmetric.add_triplet(row, col, edge_weight.max(mirror_weight)),
            None => {
                symmetric.add_triplet(row, col, edge_weight);
                symmetric.add_triplet(col, row, edge_weight);
            }
        }
    }
    symmetric.to_csr()
}

/// Write a relaxed partition to a file, one vertex per line.
pub fn write_projection_to_file(x: &[f64], file_path: &Path) -> std::io::Result<()> {
    let mut file = BufWriter::new(File::create(file_path)?);
    for (vertex_id, value) in x.iter().enumerate() {
        writeln!(file, "vertex {} => {}", vertex_id, value)?;
    }
    file.flush()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use std::fs::{self, File};
    use std::io::Write;
    use std::path::Path;
    use tempfile::tempdir;
    use crate::io::{read_matrix_market_as_graph, write_projection_to_file};

    fn create_mock_file(dir: &Path, filename: &str, content: &str) -> String {
        let file_path = dir.join(filename);
        let mut file = File::create(&file_path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file_path.to_str().unwrap().to_string()
    }

    #[test]
    fn test_read_matrix_market_for_real() -> Result<(), std::io::Error> {
        // Arrange
        let temp_dir = tempdir()?;
        let content = "%%MatrixMarket matrix coordinate real general\n%\n3 3 4\n1 2 1.5\n2 1 1.5\n2 3 0.5\n3 2 0.5\n";
        let matrix_file_path = create_mock_file(temp_dir.path(), "real_matrix.mtx", content);

        // Act
        let graph = read_matrix_market_as_graph(Path::new(&matrix_file_path)).unwrap();

        // Assert
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.graph_csr.nnz(), 4);
        assert_eq!(graph.get_edge_weight(0, 1), Some(1.5));
        assert_eq!(graph.get_edge_weight(2, 1), Some(0.5));

        Ok(())
    }

    #[test]
    fn test_read_matrix_market_drops_self_loops() -> Result<(), std::io::Error> {
        // Arrange
        let temp_dir = tempdir()?;
        let content = "%%MatrixMarket matrix coordinate real symmetric\n2 2 2\n1 1 4.0\n2 1 1.0\n";
        let matrix_file_path = create_mock_file(temp_dir.path(), "self_loop.mtx", content);

        // Act
        let graph = read_matrix_market_as_graph(Path::new(&matrix_file_path)).unwrap();

        // Assert
        assert_eq!(graph.graph_csr.nnz(), 2);
        assert_eq!(graph.get_edge_weight(0, 0), None);
        assert_eq!(graph.get_edge_weight(1, 0), Some(1.0));

        // The gradient is the derivative of the relaxed cut, with no loop term.
        let x = [0.3, 0.6];
        let h = 1e-6;
        let gradient = graph.cut_gradient(&x);
        let estimate = (graph.relaxed_cut(&[0.3 + h, 0.6]) - graph.relaxed_cut(&[0.3 - h, 0.6])) / (2.0 * h);
        assert_relative_eq!(gradient[0], -0.2, epsilon = 1e-12);
        assert_relative_eq!(gradient[0], estimate, epsilon = 1e-6);

        Ok(())
    }

    #[test]
    fn test_read_matrix_market_rejects_non_square() -> Result<(), std::io::Error> {
        // Arrange
        let temp_dir = tempdir()?;
        let content = "%%MatrixMarket matrix coordinate real general\n2 3 1\n1 3 1.0\n";
        let matrix_file_path = create_mock_file(temp_dir.path(), "non_square.mtx", content);

        // Act
        let result = read_matrix_market_as_graph(Path::new(&matrix_file_path));

        // Assert
        assert!(result.is_err());

        Ok(())
    }

    #[test]
    fn test_read_matrix_market_rejects_complex_and_dense() -> Result<(), std::io::Error> {
        let temp_dir = tempdir()?;
        let complex = "%%MatrixMarket matrix coordinate complex general\n2 2 1\n1 2 1.0 0.5\n";
        let dense = "%%MatrixMarket matrix array real general\n2 2\n0.0\n1.0\n1.0\n0.0\n";
        let complex_path = create_mock_file(temp_dir.path(), "complex.mtx", complex);
        let dense_path = create_mock_file(temp_dir.path(), "dense.mtx", dense);

        assert!(read_matrix_market_as_graph(Path::new(&complex_path)).is_err());
        assert!(read_matrix_market_as_graph(Path::new(&dense_path)).is_err());

        Ok(())
    }

    #[test]
    fn test_read_matrix_market_symmetrizes_one_triangle() -> Result<(), std::io::Error> {
        // Arrange
        let temp_dir = tempdir()?;
        let content = "%%MatrixMarket matrix coordinate real general\n3 3 3\n2 1 1.5\n3 2 0.5\n2 3 2.0\n";
        let matrix_file_path = create_mock_file(temp_dir.path(), "lower.mtx", content);

        // Act
        let graph = read_matrix_market_as_graph(Path::new(&matrix_file_path)).unwrap();

        // Assert
        assert_eq!(graph.graph_csr.nnz(), 4);
        assert_eq!(graph.get_edge_weight(0, 1), Some(1.5));
        assert_eq!(graph.get_edge_weight(1, 0), Some(1.5));
        // Both halves stored with different weights: the larger one wins.
        assert_eq!(graph.get_edge_weight(1, 2), Some(2.0));
        assert_eq!(graph.get_edge_weight(2, 1), Some(2.0));
        assert_eq!(graph.edge_cut(&[0, 1, 0]), 3.5);

        Ok(())
    }

    #[test]
    fn test_read_matrix_market_missing_file() {
        let temp_dir = tempdir().unwrap();
        assert!(read_matrix_market_as_graph(&temp_dir.path().join("missing.mtx")).is_err());
    }

    #[test]
    fn test_write_projection_to_file() -> Result<(), std::io::Error> {
        // Arrange
        let temp_dir = tempdir()?;
        let file_path = temp_dir.path().join("projection.txt");

        // Act
        write_projection_to_file(&[0.0, 0.25, 1.0], &file_path)?;

        // Assert
        let written = fs::read_to_string(&file_path)?;
        itertools::assert_equal(written.lines(), ["vertex 0 => 0", "vertex 1 => 0.25", "vertex 2 => 1"]);

        Ok(())
    }
}
