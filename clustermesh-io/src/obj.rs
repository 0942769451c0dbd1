//! OBJ format support
//!
//! Reading goes through `tobj` with triangulation and a single shared index
//! buffer, so positions, normals and texture coordinates line up per vertex.
//! Vertices are numbered in order of first use by a face; unreferenced `v`
//! records are dropped. All models of a file are merged into one mesh.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use clustermesh_core::{Error, Point3f, Result, TriangleMesh, Vector3f, UV};
use tracing::{debug, info, warn};

use crate::{MeshReader, MeshWriter};

pub struct ObjReader;
pub struct ObjWriter;

impl ObjReader {
    fn load_options() -> tobj::LoadOptions {
        tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        }
    }

    /// Read a mesh from OBJ text. Material libraries are not resolved.
    pub fn read_from<R: BufRead>(reader: &mut R) -> Result<TriangleMesh> {
        let (models, _materials) =
            tobj::load_obj_buf(reader, &Self::load_options(), |_| Ok(Default::default()))
                .map_err(|e| Error::InvalidData(format!("OBJ parse error: {}", e)))?;

        let mut vertices = Vec::new();
        let mut faces = Vec::new();
        let mut normals: Option<Vec<Vector3f>> = Some(Vec::new());
        let mut uvs: Option<Vec<UV>> = Some(Vec::new());

        for model in &models {
            let mesh = &model.mesh;
            let offset = vertices.len();
            let count = mesh.positions.len() / 3;
            debug!("OBJ model '{}': {} vertices", model.name, count);

            vertices.extend(
                mesh.positions
                    .chunks_exact(3)
                    .map(|c| Point3f::new(c[0], c[1], c[2])),
            );

            for chunk in mesh.indices.chunks_exact(3) {
                faces.push([
                    chunk[0] as usize + offset,
                    chunk[1] as usize + offset,
                    chunk[2] as usize + offset,
                ]);
            }

            // An attribute survives only if every model provides it for every vertex
            if mesh.normals.len() == count * 3 {
                if let Some(normals) = normals.as_mut() {
                    normals.extend(
                        mesh.normals
                            .chunks_exact(3)
                            .map(|c| Vector3f::new(c[0], c[1], c[2])),
                    );
                }
            } else {
                normals = None;
            }
            if mesh.texcoords.len() == count * 2 {
                if let Some(uvs) = uvs.as_mut() {
                    uvs.extend(mesh.texcoords.chunks_exact(2).map(|c| [c[0], c[1]]));
                }
            } else {
                uvs = None;
            }
        }

        if vertices.is_empty() {
            warn!("OBJ input contains no vertices");
            normals = None;
            uvs = None;
        }

        let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);
        mesh.normals = normals;
        mesh.uvs = uvs;
        mesh.validate()?;

        debug!(
            "OBJ loaded: {} vertices, {} faces from {} models (normals: {}, uvs: {})",
            mesh.vertex_count(),
            mesh.face_count(),
            models.len(),
            mesh.normals.is_some(),
            mesh.uvs.is_some()
        );
        Ok(mesh)
    }
}

impl MeshReader for ObjReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
        let path = path.as_ref();
        info!("Loading mesh from {:?}", path);
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }
}

impl ObjWriter {
    /// Write `mesh` as OBJ text.
    pub fn write_to<W: Write>(mesh: &TriangleMesh, writer: &mut W) -> Result<()> {
        mesh.validate()?;

        for v in &mesh.vertices {
            writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
        }
        if let Some(uvs) = &mesh.uvs {
            for uv in uvs {
                writeln!(writer, "vt {} {}", uv[0], uv[1])?;
            }
        }
        if let Some(normals) = &mesh.normals {
            for n in normals {
                writeln!(writer, "vn {} {} {}", n.x, n.y, n.z)?;
            }
        }

        let has_uvs = mesh.uvs.is_some();
        let has_normals = mesh.normals.is_some();
        for face in &mesh.faces {
            let corners: Vec<String> = face
                .iter()
                .map(|&i| face_corner(i + 1, has_uvs, has_normals))
                .collect();
            writeln!(writer, "f {}", corners.join(" "))?;
        }
        Ok(())
    }
}

fn face_corner(index: usize, has_uvs: bool, has_normals: bool) -> String {
    match (has_uvs, has_normals) {
        (true, true) => format!("{0}/{0}/{0}", index),
        (false, true) => format!("{0}//{0}", index),
        (true, false) => format!("{0}/{0}", index),
        (false, false) => index.to_string(),
    }
}

impl MeshWriter for ObjWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(mesh, &mut writer)?;
        writer.flush()?;
        info!(
            "Saved mesh to {:?}: {} vertices, {} faces",
            path,
            mesh.vertex_count(),
            mesh.face_count()
        );
        Ok(())
    }
}
