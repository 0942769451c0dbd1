//! Collapse a mesh along a cluster forest
//!
//! Every internal node of the forest folds its two children into one vertex
//! stored at the node's synthetic index. Nodes are visited in post-order, so
//! a parent always averages the already-averaged values of its children.
//! Triangles that referenced a child are rewritten to the parent; a triangle
//! that references both children of the same merge degenerates and is
//! removed. Once all roots are processed the folded slots are compacted away
//! and the surviving triangle indices are shifted to match.

use std::collections::{BTreeMap, BTreeSet};

use clustermesh_core::{
    Error, GrowableArray, Point3f, ResizeOptions, Result, TriangleMesh, Vector3f, VertexAttribute,
    UV,
};
use itertools::Itertools;
use tracing::{debug, info, trace};

use crate::dendrogram::ClusterForest;

/// Counters describing one collapse run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollapseStats {
    pub vertices_before: usize,
    pub vertices_after: usize,
    pub faces_before: usize,
    pub faces_after: usize,
    /// Triangles removed because a merge folded two of their corners together.
    pub degenerate_faces_removed: usize,
    pub merges_applied: usize,
}

/// Collapse `mesh` along `forest` and return the simplified mesh.
pub fn collapse(mesh: &TriangleMesh, forest: &ClusterForest) -> Result<TriangleMesh> {
    collapse_with_stats(mesh, forest).map(|(mesh, _)| mesh)
}

/// Like [`collapse`], also returning the run's counters.
pub fn collapse_with_stats(
    mesh: &TriangleMesh,
    forest: &ClusterForest,
) -> Result<(TriangleMesh, CollapseStats)> {
    mesh.validate()?;
    if forest.vertex_count() != mesh.vertex_count() {
        return Err(Error::Configuration(format!(
            "cluster forest covers {} vertices but the mesh has {}",
            forest.vertex_count(),
            mesh.vertex_count()
        )));
    }

    let mut state = CollapseState::new(mesh, forest.node_count());
    for (i, &root) in forest.roots().iter().enumerate() {
        trace!("Collapsing root {} ({}/{})", root, i + 1, forest.root_count());
        for index in forest.post_order(root) {
            let node = forest.node(index).ok_or_else(|| {
                Error::StructuralInvariant(format!("cluster {} missing from forest", index))
            })?;
            if let Some([left, right]) = node.children() {
                state.merge(index, left, right)?;
            }
        }
    }

    let faces_alive = state.faces.iter().flatten().count();
    debug!(
        "Merged {} clusters, compacting {} folded vertex slots",
        forest.merge_count(),
        state.folded.len()
    );

    let result = state.compact()?;
    let stats = CollapseStats {
        vertices_before: mesh.vertex_count(),
        vertices_after: result.vertex_count(),
        faces_before: mesh.face_count(),
        faces_after: result.face_count(),
        degenerate_faces_removed: mesh.face_count() - faces_alive,
        merges_applied: forest.merge_count(),
    };

    info!(
        "Collapsed mesh: {} -> {} vertices, {} -> {} faces ({} degenerate removed)",
        stats.vertices_before,
        stats.vertices_after,
        stats.faces_before,
        stats.faces_after,
        stats.degenerate_faces_removed
    );

    Ok((result, stats))
}

/// Mutable buffers threaded through one collapse run.
struct CollapseState {
    positions: GrowableArray<Point3f>,
    normals: Option<GrowableArray<Vector3f>>,
    uvs: Option<GrowableArray<UV>>,
    /// `None` marks a triangle removed as degenerate.
    faces: Vec<Option<[usize; 3]>>,
    /// Faces that referenced each cluster index when it was created.
    incidence: Vec<Vec<usize>>,
    /// Child indices folded into a parent; removed during compaction.
    folded: Vec<usize>,
}

impl CollapseState {
    fn new(mesh: &TriangleMesh, node_count: usize) -> Self {
        let mut incidence = vec![Vec::new(); node_count.max(mesh.vertex_count())];
        for (fi, face) in mesh.faces.iter().enumerate() {
            for (corner, &vi) in face.iter().enumerate() {
                // A corner repeated within the face is listed once
                if !face[..corner].contains(&vi) {
                    incidence[vi].push(fi);
                }
            }
        }

        Self {
            positions: GrowableArray::from_slice(&mesh.vertices),
            normals: mesh.normals.as_deref().map(GrowableArray::from_slice),
            uvs: mesh.uvs.as_deref().map(GrowableArray::from_slice),
            faces: mesh.faces.iter().copied().map(Some).collect(),
            incidence,
            folded: Vec::new(),
        }
    }

    /// Fold `left` and `right` into `parent`.
    fn merge(&mut self, parent: usize, left: usize, right: usize) -> Result<()> {
        // face -> child index it will be rewritten from
        let mut remap: BTreeMap<usize, usize> = BTreeMap::new();
        let mut doomed: BTreeSet<usize> = BTreeSet::new();

        for child in [left, right] {
            let incident = self.incidence.get(child).ok_or_else(|| {
                Error::StructuralInvariant(format!(
                    "cluster {} outside the forest index space",
                    child
                ))
            })?;
            for &fi in incident {
                if doomed.contains(&fi) {
                    continue;
                }
                let Some(face) = self.faces[fi] else {
                    continue;
                };
                if !face.contains(&child) {
                    continue;
                }
                if remap.contains_key(&fi) {
                    doomed.insert(fi);
                } else {
                    remap.insert(fi, child);
                }
            }
        }

        if self.positions.len() <= parent {
            let length = parent + 1;
            self.positions.resize(length, ResizeOptions::cleared());
            if let Some(normals) = self.normals.as_mut() {
                normals.resize(length, ResizeOptions::cleared());
            }
            if let Some(uvs) = self.uvs.as_mut() {
                uvs.resize(length, ResizeOptions::cleared());
            }
        }

        fold(&mut self.positions, parent, left, right)?;
        if let Some(normals) = self.normals.as_mut() {
            fold(normals, parent, left, right)?;
        }
        if let Some(uvs) = self.uvs.as_mut() {
            fold(uvs, parent, left, right)?;
        }
        self.folded.push(left);
        self.folded.push(right);

        for &fi in &doomed {
            self.faces[fi] = None;
        }
        let mut rewritten = Vec::with_capacity(remap.len());
        for (fi, child) in remap {
            if doomed.contains(&fi) {
                continue;
            }
            if let Some(face) = self.faces[fi].as_mut() {
                // Every matching corner is rewritten, not only the first, so an
                // input face repeating `child` never keeps a folded index.
                for corner in face.iter_mut().filter(|c| **c == child) {
                    *corner = parent;
                }
                rewritten.push(fi);
            }
        }
        self.incidence[parent] = rewritten;

        Ok(())
    }

    /// Drop the folded slots and renumber the surviving faces.
    fn compact(self) -> Result<TriangleMesh> {
        let CollapseState {
            mut positions,
            mut normals,
            mut uvs,
            faces,
            folded,
            ..
        } = self;

        let folded: Vec<usize> = folded.into_iter().sorted_unstable().dedup().collect();
        let slot_count = positions.len();

        // new_index[old] is None for folded slots
        let mut new_index = vec![None; slot_count];
        let mut pending = folded.iter().peekable();
        let mut next = 0;
        for (old, slot) in new_index.iter_mut().enumerate() {
            if pending.next_if_eq(&&old).is_some() {
                continue;
            }
            *slot = Some(next);
            next += 1;
        }

        positions.remove_sorted(&folded)?;
        if let Some(normals) = normals.as_mut() {
            normals.remove_sorted(&folded)?;
        }
        if let Some(uvs) = uvs.as_mut() {
            uvs.remove_sorted(&folded)?;
        }

        let mut compacted = Vec::with_capacity(faces.len());
        for (fi, face) in faces.into_iter().enumerate() {
            let Some(face) = face else {
                continue;
            };
            let mut renumbered = [0usize; 3];
            for (corner, &old) in face.iter().enumerate() {
                renumbered[corner] = new_index.get(old).copied().flatten().ok_or_else(|| {
                    Error::StructuralInvariant(format!(
                        "face {} still references folded or unknown vertex {}",
                        fi, old
                    ))
                })?;
            }
            compacted.push(renumbered);
        }

        let mut mesh = TriangleMesh::from_vertices_and_faces(positions.to_vec(), compacted);
        mesh.normals = normals.map(|n| n.to_vec());
        mesh.uvs = uvs.map(|u| u.to_vec());
        Ok(mesh)
    }
}

/// Store the mean of the `left` and `right` values at `parent`.
fn fold<T: VertexAttribute>(
    values: &mut GrowableArray<T>,
    parent: usize,
    left: usize,
    right: usize,
) -> Result<()> {
    let read = |values: &GrowableArray<T>, index: usize| {
        values.get(index).copied().ok_or_else(|| {
            Error::StructuralInvariant(format!(
                "cluster {} has no vertex slot (length {})",
                index,
                values.len()
            ))
        })
    };
    let children = [read(values, left)?, read(values, right)?];
    values[parent] = T::average(&children);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dendrogram::build_forest_from_str;
    use approx::assert_relative_eq;

    fn forest(vertex_count: usize, text: &str) -> ClusterForest {
        build_forest_from_str(vertex_count, text).unwrap()
    }

    fn make_quad() -> TriangleMesh {
        // 3---2
        // | / |
        // 0---1
        let mut mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(2.0, 0.0, 0.0),
                Point3f::new(2.0, 2.0, 0.0),
                Point3f::new(0.0, 2.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        );
        mesh.normals = Some(vec![
            Vector3f::new(0.0, 0.0, 1.0),
            Vector3f::new(0.0, 1.0, 0.0),
            Vector3f::new(0.0, 0.0, 1.0),
            Vector3f::new(1.0, 0.0, 0.0),
        ]);
        mesh.uvs = Some(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        mesh
    }

    #[test]
    fn test_two_vertices_average() {
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![Point3f::new(0.0, 0.0, 0.0), Point3f::new(2.0, 0.0, 0.0)],
            vec![],
        );
        let result = collapse(&mesh, &forest(2, "1\n0,1")).unwrap();
        assert_eq!(result.vertex_count(), 1);
        assert_relative_eq!(result.vertices[0], Point3f::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_degenerate_triangle_removed() {
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        let result = collapse(&mesh, &forest(3, "2\n0,1")).unwrap();
        assert_eq!(result.vertex_count(), 2);
        assert!(result.faces.is_empty());
        // Untouched vertex 2 keeps its slot ahead of the merged vertex
        assert_eq!(result.vertices[0], Point3f::new(0.0, 1.0, 0.0));
        assert_relative_eq!(result.vertices[1], Point3f::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn test_remap_and_compaction() {
        // Merge 1 and 2 of the quad: face [0,1,2] degenerates, [0,2,3] is rewritten
        let mesh = make_quad();
        let (result, stats) = collapse_with_stats(&mesh, &forest(4, "3\n1,2")).unwrap();

        assert_eq!(result.vertex_count(), 3);
        assert_eq!(result.faces, vec![[0, 2, 1]]);
        assert_relative_eq!(result.vertices[2], Point3f::new(2.0, 1.0, 0.0));

        let normals = result.normals.as_ref().unwrap();
        assert_relative_eq!(normals[2], Vector3f::new(0.0, 0.5, 0.5));
        let uvs = result.uvs.as_ref().unwrap();
        assert_relative_eq!(uvs[2][0], 1.0);
        assert_relative_eq!(uvs[2][1], 0.5);

        assert_eq!(stats.degenerate_faces_removed, 1);
        assert_eq!(stats.merges_applied, 1);
        assert_eq!(stats.vertices_after, 3);
    }

    #[test]
    fn test_no_merges_is_identity() {
        let mesh = make_quad();
        let result = collapse(&mesh, &ClusterForest::singletons(4)).unwrap();
        assert_eq!(result, mesh);

        let result = collapse(&mesh, &forest(4, "4\n0,1")).unwrap();
        assert_eq!(result, mesh);
    }

    #[test]
    fn test_nested_means_compose() {
        // ((0,1),2): grandparent is the mean of (mean(0,1), 2), not the flat mean
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(2.0, 0.0, 0.0),
                Point3f::new(4.0, 0.0, 0.0),
            ],
            vec![],
        );
        let result = collapse(&mesh, &forest(3, "1\n0,1\n3,2")).unwrap();
        assert_eq!(result.vertex_count(), 1);
        assert_relative_eq!(result.vertices[0], Point3f::new(2.5, 0.0, 0.0));
    }

    #[test]
    fn test_nested_means_compose_for_all_attributes() {
        // Same ((0,1),2) tree over the quad; vertex 3 stays single
        let mesh = make_quad();
        let (result, stats) = collapse_with_stats(&mesh, &forest(4, "2\n0,1\n4,2")).unwrap();

        assert_eq!(result.vertex_count(), 2);
        assert_eq!(result.normals.as_ref().map(Vec::len), Some(2));
        assert_eq!(result.uvs.as_ref().map(Vec::len), Some(2));
        assert!(result.validate().is_ok());
        assert_eq!(stats.merges_applied, 2);

        // Slot 0 is the untouched vertex 3, slot 1 the grandparent
        let normals = result.normals.as_ref().unwrap();
        assert_relative_eq!(normals[0], Vector3f::new(1.0, 0.0, 0.0));
        assert_relative_eq!(normals[1], Vector3f::new(0.0, 0.25, 0.75));

        let uvs = result.uvs.as_ref().unwrap();
        assert_eq!(uvs[0], [0.0, 1.0]);
        assert_relative_eq!(uvs[1][0], 0.75);
        assert_relative_eq!(uvs[1][1], 0.5);

        assert_relative_eq!(result.vertices[1], Point3f::new(1.5, 1.0, 0.0));
    }

    #[test]
    fn test_degeneracy_detected_across_depths() {
        // Tetra-like fan; vertices 0 and 1 meet only at the grandparent merge
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
                Point3f::new(0.0, 0.0, 1.0),
                Point3f::new(1.0, 1.0, 1.0),
            ],
            vec![[0, 1, 3], [2, 3, 4], [0, 4, 3]],
        );
        // 0+2 -> 5, 5+1 -> 6
        let result = collapse(&mesh, &forest(5, "3\n0,2\n5,1")).unwrap();
        assert_eq!(result.vertex_count(), 3);
        // [0,1,3] collapses at the second merge; the other two are rewritten
        assert_eq!(result.faces, vec![[2, 0, 1], [2, 1, 0]]);
    }

    #[test]
    fn test_two_roots() {
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(5.0, 0.0, 0.0),
                Point3f::new(6.0, 0.0, 0.0),
                Point3f::new(3.0, 3.0, 0.0),
            ],
            vec![[0, 2, 4], [1, 3, 4]],
        );
        // 0+1 -> 5, 2+3 -> 6; roots 4, 5, 6
        let result = collapse(&mesh, &forest(5, "3\n0,1\n2,3")).unwrap();
        assert_eq!(result.vertex_count(), 3);
        assert_eq!(result.vertices[0], Point3f::new(3.0, 3.0, 0.0));
        assert_relative_eq!(result.vertices[1], Point3f::new(0.5, 0.0, 0.0));
        assert_relative_eq!(result.vertices[2], Point3f::new(5.5, 0.0, 0.0));
        // Both faces become [5,6,4]; duplicates are not merged
        assert_eq!(result.faces, vec![[1, 2, 0], [1, 2, 0]]);
    }

    #[test]
    fn test_missing_attributes_stay_missing() {
        let mut mesh = make_quad();
        mesh.normals = None;
        mesh.uvs = None;
        let result = collapse(&mesh, &forest(4, "2\n0,1\n2,3")).unwrap();
        assert!(result.normals.is_none());
        assert!(result.uvs.is_none());
        assert_eq!(result.vertex_count(), 2);
        assert!(result.faces.is_empty());
    }

    #[test]
    fn test_vertex_count_mismatch() {
        let mesh = make_quad();
        assert!(matches!(
            collapse(&mesh, &ClusterForest::singletons(5)),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_invalid_mesh_rejected() {
        let mut mesh = make_quad();
        mesh.faces.push([0, 1, 7]);
        assert!(matches!(
            collapse(&mesh, &ClusterForest::singletons(4)),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_repeated_corner_in_input_face_is_fully_rewritten() {
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 0, 1]],
        );
        let result = collapse(&mesh, &forest(3, "2\n0,2")).unwrap();
        assert_eq!(result.vertex_count(), 2);
        assert_eq!(result.faces, vec![[1, 1, 0]]);
    }
}
