use glam::Vec3;

use super::primitive::PrimitiveAssetMode;

fn calculate_triangle_normal(positions: [Vec3; 3]) -> Vec3 {
    let vec_a = positions[1] - positions[0];
    let vec_b = positions[2] - positions[0];
    vec_a.cross(vec_b)
}

/// Vertex index triples of every triangle described by `mode`.
fn triangles(mode: PrimitiveAssetMode, indices: &[u32]) -> Vec<[usize; 3]> {
    let index = |i: usize| indices[i] as usize;
    match mode {
        PrimitiveAssetMode::TriangleList => indices
            .chunks_exact(3)
            .map(|triangle| [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize])
            .collect(),
        PrimitiveAssetMode::TriangleStrip => (2..indices.len())
            .map(|i| {
                // Every other triangle of a strip has flipped winding
                if i % 2 == 0 {
                    [index(i - 2), index(i - 1), index(i)]
                } else {
                    [index(i - 1), index(i - 2), index(i)]
                }
            })
            .collect(),
        PrimitiveAssetMode::TriangleFan => (2..indices.len())
            .map(|i| [index(0), index(i - 1), index(i)])
            .collect(),
        // Points and lines don't have a normal
        PrimitiveAssetMode::Points
        | PrimitiveAssetMode::LineList
        | PrimitiveAssetMode::LineLoop
        | PrimitiveAssetMode::LineStrip => Vec::new(),
    }
}

/// Synthesize smooth vertex normals by accumulating face normals.
///
/// Without an index buffer the vertices are taken in order. Triangles that
/// reference a vertex out of range are skipped, and vertices that belong to
/// no triangle get a zero normal.
pub fn calculate_normal(
    mode: PrimitiveAssetMode,
    positions: &[[f32; 3]],
    indices: Option<&[u32]>,
) -> Vec<[f32; 3]> {
    let sequential: Vec<u32>;
    let indices = match indices {
        Some(indices) => indices,
        None => {
            sequential = (0..positions.len() as u32).collect();
            &sequential
        }
    };

    let mut buffer = vec![Vec3::ZERO; positions.len()];
    for triangle in triangles(mode, indices) {
        if triangle.iter().any(|index| *index >= positions.len()) {
            continue;
        }
        let normal = calculate_triangle_normal(triangle.map(|index| Vec3::from(positions[index])));
        triangle.iter().for_each(|index| buffer[*index] += normal);
    }
    buffer
        .into_iter()
        .map(|normal| normal.normalize_or_zero().to_array())
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_flat_quad_normals() {
        let positions = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        let indices = [0, 1, 2, 0, 2, 3];
        let normals = calculate_normal(PrimitiveAssetMode::TriangleList, &positions, Some(&indices));
        assert_eq!(normals, vec![[0.0, 0.0, 1.0]; 4]);
    }

    #[test]
    fn test_unindexed_triangle() {
        let positions = [[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]];
        let normals = calculate_normal(PrimitiveAssetMode::TriangleList, &positions, None);
        assert_eq!(normals, vec![[0.0, 1.0, 0.0]; 3]);
    }

    #[test]
    fn test_strip_keeps_winding() {
        let positions = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
        ];
        let normals = calculate_normal(PrimitiveAssetMode::TriangleStrip, &positions, None);
        assert_eq!(normals, vec![[0.0, 0.0, 1.0]; 4]);
    }

    #[test]
    fn test_lines_have_no_normal() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let normals = calculate_normal(PrimitiveAssetMode::LineList, &positions, None);
        assert_eq!(normals, vec![[0.0, 0.0, 0.0]; 2]);
    }
}
