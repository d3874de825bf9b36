use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use thiserror::Error;

use crate::math::Vector3;
use crate::mesh::Mesh;

/// Normal assigned to a corner whose face token has no usable normal index.
pub const PLACEHOLDER_NORMAL: Vector3 = Vector3::UP;

/// Errors raised while ingesting an OBJ file.
#[derive(Debug, Error)]
pub enum ObjError {
    #[error("failed to open {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("line {line}: vertex index {index} is out of range for {count} positions")]
    IndexOutOfRange {
        line: usize,
        index: i64,
        count: usize,
    },
}

/// Knobs for [`load_obj`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Share one stored vertex between face corners that reference the same
    /// position and normal, so generated normals are smoothed across
    /// neighbouring triangles. Off by default: every corner gets its own
    /// vertex.
    pub weld: bool,
}

/// What the loader saw and which lenient fallbacks it took.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub positions: usize,
    pub normals: usize,
    pub faces: usize,
    /// Corners that received [`PLACEHOLDER_NORMAL`] although the file
    /// supplied normals.
    pub placeholder_normals: usize,
    /// Face tokens beyond the third, which are not triangulated.
    pub extra_corners_ignored: usize,
    /// Normals were generated from the geometry because the file had none.
    pub normals_generated: bool,
}

/// Result of a successful load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedObj {
    pub mesh: Mesh,
    pub stats: LoadStats,
}

/// Reads and parses an OBJ file from disk.
pub fn load_obj(path: impl AsRef<Path>, options: LoadOptions) -> Result<LoadedObj, ObjError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| ObjError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    // exporters put non-UTF-8 text in comments and names
    load_obj_from_str(&String::from_utf8_lossy(&bytes), options)
}

/// Parses OBJ text into a [`Mesh`].
///
/// Only `v`, `vn` and `f` lines are interpreted; faces must be triangles.
/// Face indices resolve against the positions and normals read so far.
pub fn load_obj_from_str(data: &str, options: LoadOptions) -> Result<LoadedObj, ObjError> {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut builder = MeshBuilder::new(options.weld);
    let mut stats = LoadStats::default();
    let mut corners_without_normal = 0;

    for (line_no, line) in data.lines().enumerate() {
        let line_no = line_no + 1;
        let mut parts = line.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };
        match tag {
            "v" => positions.push(parse_vec3(parts, line_no)?),
            "vn" => normals.push(parse_vec3(parts, line_no)?),
            "f" => {
                let tokens: Vec<&str> = parts.collect();
                if tokens.len() < 3 {
                    return Err(ObjError::Parse {
                        line: line_no,
                        message: format!("face has {} corners, expected 3", tokens.len()),
                    });
                }
                stats.extra_corners_ignored += tokens.len() - 3;
                for token in &tokens[..3] {
                    let corner = parse_corner(token, line_no)?;
                    let position = fix_index(corner.position, positions.len()).ok_or(
                        ObjError::IndexOutOfRange {
                            line: line_no,
                            index: corner.position,
                            count: positions.len(),
                        },
                    )?;
                    let normal = corner
                        .normal
                        .and_then(|index| fix_index(index, normals.len()));
                    if normal.is_none() {
                        corners_without_normal += 1;
                    }
                    builder.push(&positions, &normals, position, normal);
                }
                stats.faces += 1;
            }
            _ => {}
        }
    }

    stats.positions = positions.len();
    stats.normals = normals.len();
    if !normals.is_empty() {
        stats.placeholder_normals = corners_without_normal;
    }

    let mut mesh = builder.finish();
    if normals.is_empty() && !mesh.is_empty() {
        mesh.recompute_normals();
        stats.normals_generated = true;
    }

    if stats.placeholder_normals > 0 {
        warn!(
            "{} face corner(s) had no usable normal index; using {:?}",
            stats.placeholder_normals,
            PLACEHOLDER_NORMAL.to_array()
        );
    }
    if stats.extra_corners_ignored > 0 {
        warn!(
            "ignored {} corner(s) beyond the third; polygons are not triangulated",
            stats.extra_corners_ignored
        );
    }
    info!(
        "Loaded {} vertices and {} triangles",
        mesh.vertices.len(),
        mesh.triangle_count()
    );

    Ok(LoadedObj { mesh, stats })
}

fn parse_vec3<'a>(
    mut parts: impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<Vector3, ObjError> {
    let mut component = || -> Result<f32, ObjError> {
        let text = parts.next().ok_or_else(|| ObjError::Parse {
            line,
            message: "missing vector component".to_string(),
        })?;
        let value = text.parse::<f32>().map_err(|err| ObjError::Parse {
            line,
            message: format!("invalid number {text:?}: {err}"),
        })?;
        if !value.is_finite() {
            return Err(ObjError::Parse {
                line,
                message: format!("non-finite number {text:?}"),
            });
        }
        Ok(value)
    };
    let x = component()?;
    let y = component()?;
    let z = component()?;
    Ok(Vector3::new(x, y, z))
}

/// One `f` token: `v`, `v/vt`, `v/vt/vn` or `v//vn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Corner {
    position: i64,
    normal: Option<i64>,
}

fn parse_corner(token: &str, line: usize) -> Result<Corner, ObjError> {
    let mut segments = token.split('/');
    let position = parse_index(segments.next(), token, line)?.ok_or_else(|| ObjError::Parse {
        line,
        message: format!("face token {token:?} has no vertex index"),
    })?;
    // texture coordinates are validated and dropped
    parse_index(segments.next(), token, line)?;
    let normal = parse_index(segments.next(), token, line)?;
    Ok(Corner { position, normal })
}

fn parse_index(
    segment: Option<&str>,
    token: &str,
    line: usize,
) -> Result<Option<i64>, ObjError> {
    match segment {
        None | Some("") => Ok(None),
        Some(text) => text.parse::<i64>().map(Some).map_err(|err| ObjError::Parse {
            line,
            message: format!("invalid index in face token {token:?}: {err}"),
        }),
    }
}

/// Resolves a 1-based (or negative, end-relative) OBJ index.
fn fix_index(index: i64, len: usize) -> Option<usize> {
    if index > 0 {
        let zero_based = usize::try_from(index - 1).ok()?;
        (zero_based < len).then_some(zero_based)
    } else if index < 0 {
        let back = usize::try_from(index.unsigned_abs()).ok()?;
        (back <= len).then(|| len - back)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Key {
    position: usize,
    normal: Option<usize>,
}

/// Accumulates stored vertices, optionally sharing them between corners.
struct MeshBuilder {
    mesh: Mesh,
    lookup: Option<HashMap<Key, u32>>,
}

impl MeshBuilder {
    fn new(weld: bool) -> Self {
        Self {
            mesh: Mesh::new(),
            lookup: weld.then(HashMap::new),
        }
    }

    fn push(
        &mut self,
        positions: &[Vector3],
        normals: &[Vector3],
        position: usize,
        normal: Option<usize>,
    ) {
        let mesh = &mut self.mesh;
        let mut append = || {
            let index = mesh.vertices.len() as u32;
            mesh.vertices.push(positions[position]);
            mesh.normals.push(normal.map_or(PLACEHOLDER_NORMAL, |i| normals[i]));
            index
        };
        let index = match self.lookup.as_mut() {
            Some(lookup) => *lookup.entry(Key { position, normal }).or_insert_with(append),
            None => append(),
        };
        self.mesh.indices.push(index);
    }

    fn finish(self) -> Mesh {
        self.mesh
    }
}
