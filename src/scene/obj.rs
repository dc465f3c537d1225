use std::{fs, path::Path};

use thiserror::Error;
use wavefront_obj::obj::{ObjSet, Object, Primitive};

use super::{Scene, TriangleMesh};
use crate::geometry::{Triangle, WorldPoint};

impl Scene {
    /// Loads an OBJ file, every object becomes one triangle group.
    pub fn with_obj(p: impl AsRef<Path>) -> Result<Scene, ObjOpenError> {
        let content = fs::read_to_string(p)?;
        let parsed = wavefront_obj::obj::parse(content)?;
        Ok(Self::load_obj(parsed))
    }

    pub fn from_obj_str(content: &str) -> Result<Scene, ObjOpenError> {
        let parsed = wavefront_obj::obj::parse(content.to_owned())?;
        Ok(Self::load_obj(parsed))
    }

    fn load_obj(obj: ObjSet) -> Scene {
        let mut scene = Scene::new();
        for o in obj.objects {
            let mesh = object_mesh(o);
            log::debug!(
                "Loaded object with {} vertices and {} triangles",
                mesh.vertices.len(),
                mesh.triangles.len()
            );
            scene.add(mesh);
        }
        scene
    }
}

fn object_mesh(o: Object) -> TriangleMesh {
    let mut triangles = Vec::new();
    let mut skipped = 0usize;

    for geometry in &o.geometry {
        for shape in &geometry.shapes {
            let Primitive::Triangle(a, b, c) = &shape.primitive else {
                skipped += 1;
                continue;
            };
            triangles.push(Triangle::new(a.0 as u32, b.0 as u32, c.0 as u32));
        }
    }

    if skipped > 0 {
        log::warn!("Object {:?}: skipped {skipped} non-triangle primitives", o.name);
    }

    let vertices = o
        .vertices
        .iter()
        .map(|v| WorldPoint::new(v.x as f32, v.y as f32, v.z as f32))
        .collect();

    TriangleMesh::new(vertices, triangles)
}

#[derive(Debug, Error)]
pub enum ObjOpenError {
    #[error("Failed to read file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse file: {0}")]
    ParseError(#[from] wavefront_obj::ParseError),
}
