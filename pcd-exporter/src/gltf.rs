use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{ByteOrder as _, LittleEndian};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::buffers::RenderBuffers;
use crate::error::ExportError;
use crate::glb::Glb;

#[derive(Serialize_repr, Deserialize_repr, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ComponentType {
    UnsignedByte = 5121,
    UnsignedInt = 5125,
    Float = 5126,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorType {
    #[serde(rename = "SCALAR")]
    Scalar,
    #[serde(rename = "VEC3")]
    Vec3,
}

#[derive(Serialize_repr, Deserialize_repr, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PrimitiveMode {
    Points = 0,
    Triangles = 4,
}

#[derive(Serialize_repr, Deserialize_repr, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum BufferViewTarget {
    ArrayBuffer = 34962,
    ElementArrayBuffer = 34963,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
}

impl Default for Asset {
    fn default() -> Self {
        Self {
            version: "2.0".to_string(),
            generator: Some(concat!("geomesh ", env!("CARGO_PKG_VERSION")).to_string()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub nodes: Vec<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<[f64; 3]>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MeshPrimitive {
    pub attributes: BTreeMap<String, u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indices: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<u32>,
    pub mode: PrimitiveMode,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Mesh {
    pub primitives: Vec<MeshPrimitive>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PbrMetallicRoughness {
    pub metallic_factor: f32,
    pub roughness_factor: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub pbr_metallic_roughness: PbrMetallicRoughness,
    pub double_sided: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Accessor {
    pub buffer_view: u32,
    #[serde(default)]
    pub byte_offset: u32,
    pub component_type: ComponentType,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub normalized: bool,
    pub count: u32,
    #[serde(rename = "type")]
    pub type_: AccessorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<Vec<f64>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BufferView {
    pub buffer: u32,
    pub byte_offset: u32,
    pub byte_length: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_stride: Option<u8>,
    pub target: BufferViewTarget,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Buffer {
    pub byte_length: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Gltf {
    pub asset: Asset,
    pub scene: u32,
    pub scenes: Vec<Scene>,
    pub nodes: Vec<Node>,
    pub meshes: Vec<Mesh>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<Material>,
    pub accessors: Vec<Accessor>,
    pub buffer_views: Vec<BufferView>,
    pub buffers: Vec<Buffer>,
}

fn to_u32(len: usize) -> Result<u32, ExportError> {
    u32::try_from(len).map_err(|_| ExportError::TooLarge(len))
}

fn to_rgb8(color: &[f32]) -> [u8; 3] {
    let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
    [q(color[0]), q(color[1]), q(color[2])]
}

/// Encodes the buffers as a single-mesh binary glTF.
///
/// Vertices are interleaved as position (3 × f32), colour (3 × u8 + pad)
/// and, for meshes, normal (3 × f32). Point buffers become a POINTS
/// primitive and the node is translated back by the recentre origin.
pub fn generate_glb(buffers: &RenderBuffers) -> Result<Glb, ExportError> {
    buffers.validate()?;

    let normals = buffers.normals.as_deref();
    let byte_stride: usize = 12 + 4 + if normals.is_some() { 12 } else { 0 };
    let count = buffers.vertex_count();

    let mut bin = vec![0u8; count * byte_stride];
    for (i, vertex) in bin.chunks_exact_mut(byte_stride).enumerate() {
        let at = i * 3;
        LittleEndian::write_f32_into(&buffers.positions[at..at + 3], &mut vertex[0..12]);
        vertex[12..15].copy_from_slice(&to_rgb8(&buffers.colors[at..at + 3]));
        if let Some(normals) = normals {
            LittleEndian::write_f32_into(&normals[at..at + 3], &mut vertex[16..28]);
        }
    }

    let mut buffer_views = vec![BufferView {
        buffer: 0,
        byte_offset: 0,
        byte_length: to_u32(bin.len())?,
        byte_stride: Some(byte_stride as u8),
        target: BufferViewTarget::ArrayBuffer,
    }];

    let vertex_count = to_u32(count)?;
    let bounds = &buffers.bounding;
    let mut accessors = vec![
        Accessor {
            buffer_view: 0,
            byte_offset: 0,
            component_type: ComponentType::Float,
            normalized: false,
            count: vertex_count,
            type_: AccessorType::Vec3,
            min: Some(bounds.min.iter().map(|&v| v as f64).collect()),
            max: Some(bounds.max.iter().map(|&v| v as f64).collect()),
        },
        Accessor {
            buffer_view: 0,
            byte_offset: 12,
            component_type: ComponentType::UnsignedByte,
            normalized: true,
            count: vertex_count,
            type_: AccessorType::Vec3,
            min: None,
            max: None,
        },
    ];
    let mut attributes = BTreeMap::from([("POSITION".to_string(), 0), ("COLOR_0".to_string(), 1)]);
    if normals.is_some() {
        attributes.insert("NORMAL".to_string(), accessors.len() as u32);
        accessors.push(Accessor {
            buffer_view: 0,
            byte_offset: 16,
            component_type: ComponentType::Float,
            normalized: false,
            count: vertex_count,
            type_: AccessorType::Vec3,
            min: None,
            max: None,
        });
    }

    let mut primitive = MeshPrimitive {
        attributes,
        indices: None,
        material: None,
        mode: PrimitiveMode::Points,
    };
    let mut materials = Vec::new();
    if let Some(indices) = &buffers.indices {
        let byte_offset = to_u32(bin.len())?;
        for &index in indices {
            bin.extend_from_slice(&index.to_le_bytes());
        }
        buffer_views.push(BufferView {
            buffer: 0,
            byte_offset,
            byte_length: to_u32(indices.len() * 4)?,
            byte_stride: None,
            target: BufferViewTarget::ElementArrayBuffer,
        });
        primitive.indices = Some(accessors.len() as u32);
        accessors.push(Accessor {
            buffer_view: buffer_views.len() as u32 - 1,
            byte_offset: 0,
            component_type: ComponentType::UnsignedInt,
            normalized: false,
            count: to_u32(indices.len())?,
            type_: AccessorType::Scalar,
            min: None,
            max: None,
        });
        primitive.mode = PrimitiveMode::Triangles;
        // terrain triangles are wound clockwise seen from above
        primitive.material = Some(0);
        materials.push(Material {
            pbr_metallic_roughness: PbrMetallicRoughness {
                metallic_factor: 0.0,
                roughness_factor: 1.0,
            },
            double_sided: true,
        });
    }

    let translation = (bounds.origin != [0.0; 3]).then_some(bounds.origin);
    let gltf = Gltf {
        asset: Asset::default(),
        scene: 0,
        scenes: vec![Scene { nodes: vec![0] }],
        nodes: vec![Node {
            mesh: Some(0),
            translation,
        }],
        meshes: vec![Mesh {
            primitives: vec![primitive],
        }],
        materials,
        accessors,
        buffer_views,
        buffers: vec![Buffer {
            byte_length: to_u32(bin.len())?,
        }],
    };

    let glb = Glb {
        json: serde_json::to_vec(&gltf)?,
        bin: Some(bin),
    };
    if u32::try_from(glb.byte_length()).is_err() {
        return Err(ExportError::TooLarge(glb.byte_length()));
    }
    Ok(glb)
}

pub fn write_glb<W: Write>(buffers: &RenderBuffers, writer: W) -> Result<(), ExportError> {
    let glb = generate_glb(buffers)?;
    glb.to_writer(writer)?;
    Ok(())
}

pub fn write_glb_file<P: AsRef<Path>>(path: P, buffers: &RenderBuffers) -> Result<(), ExportError> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write_glb(buffers, &mut writer)?;
    writer.flush()?;
    log::info!(
        "Wrote {} ({} vertices, {})",
        path.display(),
        buffers.vertex_count(),
        if buffers.is_points() { "points" } else { "triangles" }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dem_mesh::TerrainMeshBuilder;
    use dem_parser::grid::{ElevationGrid, GeoBounds};
    use dem_parser::normalize::NoDataFilter;
    use pcd_core::pointcloud::decimation::decimator::DisplayedPointCloud;
    use pcd_core::pointcloud::point::PointBuffer;

    fn points() -> RenderBuffers {
        let mut buffer = PointBuffer::with_capacity(3);
        buffer.push([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        buffer.push([1.0, 2.0, 3.0], [0.0, 1.0, 0.0]);
        buffer.push([-1.0, -2.0, -3.0], [0.0, 0.0, 1.0]);
        let displayed = DisplayedPointCloud {
            buffer,
            stride: 1,
            source_count: 3,
        };
        RenderBuffers::from_points(&displayed, [100.0, 200.0, 5.0])
    }

    fn parse(glb: &Glb) -> Gltf {
        serde_json::from_slice(&glb.json).unwrap()
    }

    #[test]
    fn point_cloud_glb() {
        let glb = generate_glb(&points()).unwrap();
        let gltf = parse(&glb);

        assert_eq!(gltf.asset.version, "2.0");
        assert_eq!(gltf.meshes[0].primitives[0].mode, PrimitiveMode::Points);
        assert_eq!(gltf.meshes[0].primitives[0].indices, None);
        assert_eq!(gltf.nodes[0].translation, Some([100.0, 200.0, 5.0]));
        assert_eq!(gltf.buffer_views[0].byte_stride, Some(16));
        assert_eq!(gltf.accessors[0].min, Some(vec![-1.0, -2.0, -3.0]));
        assert_eq!(gltf.accessors[0].max, Some(vec![1.0, 2.0, 3.0]));
        assert!(gltf.materials.is_empty());

        let bin = glb.bin.unwrap();
        assert_eq!(bin.len(), 3 * 16);
        assert_eq!(LittleEndian::read_f32(&bin[16 + 8..16 + 12]), 3.0);
        assert_eq!(&bin[16 + 12..16 + 15], &[0, 255, 0]);
    }

    #[test]
    fn terrain_glb_has_indices_and_normals() {
        let grid = ElevationGrid::new(
            3,
            3,
            (1..=9).map(|v| v as f32).collect(),
            GeoBounds::pixel_span(3, 3),
        );
        let mesh = TerrainMeshBuilder::default()
            .build(&grid, &NoDataFilter::default())
            .unwrap();
        let buffers = RenderBuffers::from_terrain(&mesh);
        let glb = generate_glb(&buffers).unwrap();
        let gltf = parse(&glb);

        let primitive = &gltf.meshes[0].primitives[0];
        assert_eq!(primitive.mode, PrimitiveMode::Triangles);
        assert_eq!(primitive.attributes.get("NORMAL"), Some(&2));
        let indices = &gltf.accessors[primitive.indices.unwrap() as usize];
        assert_eq!(indices.count, 2 * 2 * 2 * 3);
        assert_eq!(indices.component_type, ComponentType::UnsignedInt);
        assert_eq!(gltf.nodes[0].translation, None);
        assert!(gltf.materials[0].double_sided);

        let bin = glb.bin.unwrap();
        assert_eq!(bin.len(), 9 * 28 + 24 * 4);
        assert_eq!(gltf.buffers[0].byte_length as usize, bin.len());
    }

    #[test]
    fn json_uses_gltf_field_names() {
        let json = String::from_utf8(generate_glb(&points()).unwrap().json).unwrap();
        assert!(json.contains("\"bufferViews\""));
        assert!(json.contains("\"componentType\":5126"));
        assert!(json.contains("\"type\":\"VEC3\""));
        assert!(json.contains("\"mode\":0"));
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.glb");
        write_glb_file(&path, &points()).unwrap();

        let data = std::fs::read(&path).unwrap();
        let glb = Glb::from_slice(&data).unwrap();
        assert_eq!(parse(&glb).accessors[0].count, 3);
    }

    #[test]
    fn invalid_buffers_are_rejected_before_encoding() {
        let mut buffers = points();
        buffers.colors.pop();
        assert!(generate_glb(&buffers).is_err());
    }
}
