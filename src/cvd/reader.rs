//! CVD 解码器
//!
//! 对字节流的无状态纯函数解码。解码期间折叠出全文件的动画总时长。

use std::io::{Read, Seek};

use glam::Vec3;

use crate::gamebox::{self, BlendFlag, Color, GbMaterial};
use crate::reader::{reserve_hint, ByteReader};
use crate::{AssetError, Result};

use super::keys::{
    parse_position_key, parse_rotation_key, parse_scale_key, KeyKind, POSITION_KEY_STRIDE,
    ROTATION_KEY_STRIDE, SCALE_KEY_STRIDE,
};
use super::{CvdFile, CvdGeometry, CvdGeometryNode, CvdMesh, CvdMeshSection, CvdVersion, CvdVertex};

/// 解码选项
#[derive(Debug, Clone)]
pub struct CvdDecodeOptions {
    /// 节点树递归深度上限，超过视为畸形数据
    pub max_depth: usize,
}

impl Default for CvdDecodeOptions {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

/// 按默认选项解码 CVD 文件
pub fn read(bytes: &[u8], codepage: u16) -> Result<CvdFile> {
    read_with_options(bytes, codepage, &CvdDecodeOptions::default())
}

pub fn read_with_options(
    bytes: &[u8],
    codepage: u16,
    options: &CvdDecodeOptions,
) -> Result<CvdFile> {
    let mut reader = ByteReader::from_bytes(bytes, codepage);

    let magic = reader.read_bytes(4)?;
    let version = match magic.as_slice() {
        b"cvdf" => CvdVersion::V0_4,
        b"cvds" => CvdVersion::V0_5,
        _ => {
            return Err(AssetError::InvalidFormat(
                "invalid CVD file: header != cvdf or cvds".to_string(),
            ))
        }
    };

    let root_count = read_count(&mut reader, "root node count")?;
    let mut animation_duration = 0f32;
    let mut root_nodes = Vec::with_capacity(reserve_hint(root_count));
    for _ in 0..root_count {
        root_nodes.push(read_node(
            &mut reader,
            version,
            &mut animation_duration,
            options,
            0,
        )?);
    }

    Ok(CvdFile {
        version,
        animation_duration,
        root_nodes,
    })
}

fn read_count<R: Read + Seek>(reader: &mut ByteReader<R>, what: &str) -> Result<usize> {
    let value = reader.read_i32()?;
    usize::try_from(value)
        .map_err(|_| AssetError::MalformedStructure(format!("negative {what}: {value}")))
}

fn read_node<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    version: CvdVersion,
    animation_duration: &mut f32,
    options: &CvdDecodeOptions,
    depth: usize,
) -> Result<CvdGeometryNode> {
    if depth > options.max_depth {
        return Err(AssetError::MalformedStructure(format!(
            "geometry node tree deeper than {}",
            options.max_depth
        )));
    }

    let has_geometry = reader.read_u8()?;
    let geometry = if has_geometry == 1 {
        Some(read_geometry(reader, version, animation_duration)?)
    } else {
        None
    };

    let child_count = read_count(reader, "child node count")?;
    let mut children = Vec::with_capacity(reserve_hint(child_count));
    for _ in 0..child_count {
        children.push(read_node(
            reader,
            version,
            animation_duration,
            options,
            depth + 1,
        )?);
    }

    Ok(CvdGeometryNode { geometry, children })
}

fn read_geometry<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    version: CvdVersion,
    animation_duration: &mut f32,
) -> Result<CvdGeometry> {
    let position_keys = read_track(reader, POSITION_KEY_STRIDE, parse_position_key)?;
    if let Some(last) = position_keys.last() {
        fold_duration(animation_duration, last.time());
    }

    let rotation_keys = read_track(reader, ROTATION_KEY_STRIDE, parse_rotation_key)?;
    if let Some(last) = rotation_keys.last() {
        fold_duration(animation_duration, last.time());
    }

    let scale_keys = read_track(reader, SCALE_KEY_STRIDE, parse_scale_key)?;
    if let Some(last) = scale_keys.last() {
        fold_duration(animation_duration, last.time());
    }

    let scale = reader.read_f32()?;

    let mesh = read_mesh(reader, version)?;
    if let Some(last) = mesh.animation_time_keys.last() {
        fold_duration(animation_duration, *last);
    }

    let transform = gamebox::read_affine_matrix(reader)?;

    Ok(CvdGeometry {
        position_keys,
        rotation_keys,
        scale_keys,
        scale,
        transform,
        mesh,
    })
}

fn fold_duration(animation_duration: &mut f32, time: f32) {
    if time > *animation_duration {
        *animation_duration = time;
    }
}

/// 读取一条关键帧轨道：数量 + 单个插值方式标签 + 定长原始记录
fn read_track<R, T>(
    reader: &mut ByteReader<R>,
    stride: usize,
    parse: impl Fn(KeyKind, &[u8]) -> Result<T>,
) -> Result<Vec<T>>
where
    R: Read + Seek,
{
    let count = read_count(reader, "animation key count")?;
    let kind = KeyKind::from_byte(reader.read_u8()?)?;

    let mut keys = Vec::with_capacity(reserve_hint(count));
    for _ in 0..count {
        let record = reader.read_bytes(stride)?;
        keys.push(parse(kind, &record)?);
    }
    Ok(keys)
}

/// 时间键归零基：所有键减去首键
fn rebase_time_keys(keys: &mut [f32]) {
    if let Some(&first) = keys.first() {
        for key in keys.iter_mut() {
            *key -= first;
        }
    }
}

fn read_mesh<R: Read + Seek>(reader: &mut ByteReader<R>, version: CvdVersion) -> Result<CvdMesh> {
    let frame_count = read_count(reader, "mesh frame count")?;
    let vertex_count = read_count(reader, "mesh vertex count")?;

    let mut frame_vertices = Vec::with_capacity(reserve_hint(frame_count));
    for _ in 0..frame_count {
        let mut vertices = Vec::with_capacity(reserve_hint(vertex_count));
        for _ in 0..vertex_count {
            let uv = reader.read_vec2()?;
            let mut normal = gamebox::to_engine_normal(reader.read_vec3()?);
            let position = gamebox::cvd_position(reader.read_vec3()?);

            // 修复缺失/损坏的法线
            if normal == Vec3::ZERO {
                normal = Vec3::Y;
            }

            vertices.push(CvdVertex {
                position,
                normal,
                uv,
            });
        }
        frame_vertices.push(vertices);
    }

    let mut animation_time_keys = reader.read_f32s(frame_count)?;
    rebase_time_keys(&mut animation_time_keys);

    let section_count = read_count(reader, "mesh section count")?;
    let mut sections = Vec::with_capacity(reserve_hint(section_count));
    for _ in 0..section_count {
        sections.push(read_section(reader, version, &frame_vertices, vertex_count)?);
    }

    Ok(CvdMesh {
        animation_time_keys,
        sections,
    })
}

fn read_material_base<R: Read + Seek>(reader: &mut ByteReader<R>) -> Result<GbMaterial> {
    Ok(GbMaterial {
        diffuse: Color::from_bytes(&reader.read_bytes(4)?),
        ambient: Color::from_bytes(&reader.read_bytes(4)?),
        specular: Color::from_bytes(&reader.read_bytes(4)?),
        emissive: Color::from_bytes(&reader.read_bytes(4)?),
        specular_power: reader.read_f32()?,
        texture_name: reader.read_string(64)?,
    })
}

fn read_material_animated<R: Read + Seek>(reader: &mut ByteReader<R>) -> Result<GbMaterial> {
    Ok(GbMaterial {
        diffuse: Color::from_f32s(&reader.read_f32s(4)?),
        ambient: Color::from_f32s(&reader.read_f32s(4)?),
        specular: Color::from_f32s(&reader.read_f32s(4)?),
        emissive: Color::from_f32s(&reader.read_f32s(4)?),
        specular_power: reader.read_f32()?,
        texture_name: String::new(),
    })
}

fn read_section<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    version: CvdVersion,
    all_frame_vertices: &[Vec<CvdVertex>],
    vertex_count: usize,
) -> Result<CvdMeshSection> {
    let blend_flag = BlendFlag::from_byte(reader.read_u8()?)?;
    let material = read_material_base(reader)?;

    let triangle_count = read_count(reader, "triangle index count")?;
    let mut indices = Vec::with_capacity(reserve_hint(triangle_count));
    for _ in 0..triangle_count {
        let x = reader.read_u16()?;
        let y = reader.read_u16()?;
        let z = reader.read_u16()?;
        for index in [x, y, z] {
            if index as usize >= vertex_count {
                return Err(AssetError::MalformedStructure(format!(
                    "triangle index {index} out of range (vertex count {vertex_count})"
                )));
            }
        }
        indices.push([x, y, z]);
    }

    let mut animation_time_keys = Vec::new();
    let mut animation_materials = Vec::new();
    if version == CvdVersion::V0_5 {
        let frame_count = read_count(reader, "material animation frame count")?;

        animation_time_keys = reader.read_f32s(frame_count)?;
        rebase_time_keys(&mut animation_time_keys);

        animation_materials.reserve(reserve_hint(frame_count));
        for _ in 0..frame_count {
            animation_materials.push(read_material_animated(reader)?);
        }
    }

    // 去索引展平：每个三角形贡献 3 个互不共享的输出顶点
    let mut index_buffer = Vec::with_capacity(triangle_count * 3);
    let mut triangles = Vec::with_capacity(triangle_count * 3);
    for triple in &indices {
        for &index in triple {
            triangles.push(index_buffer.len() as u32);
            index_buffer.push(index as usize);
        }
    }
    gamebox::reverse_winding(&mut triangles);

    let mut frame_vertices = Vec::with_capacity(all_frame_vertices.len());
    for source_frame in all_frame_vertices {
        let flattened: Vec<CvdVertex> = index_buffer
            .iter()
            .map(|&index| source_frame[index])
            .collect();
        frame_vertices.push(flattened);
    }

    Ok(CvdMeshSection {
        blend_flag,
        material,
        frame_vertices,
        triangles,
        animation_time_keys,
        animation_materials,
    })
}
