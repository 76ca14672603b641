//! MSH 解码器

use std::io::{Read, Seek};

use crate::gamebox;
use crate::reader::{reserve_hint, ByteReader};
use crate::{AssetError, Result};

use super::{BoneNode, MshFace, MshFile, MshMesh, MshVertex, ROOT_PARENT_ID};

const MSH_VERSION: i32 = 100;
const MAX_BONE_DEPTH: usize = 256;

/// 解码 MSH 文件
pub fn read(bytes: &[u8], codepage: u16) -> Result<MshFile> {
    let mut reader = ByteReader::from_bytes(bytes, codepage);

    let magic = reader.read_bytes(4)?;
    if &magic[..3] != b"msh" {
        return Err(AssetError::InvalidFormat(
            "invalid MSH file: header != msh".to_string(),
        ));
    }

    let version = reader.read_i32()?;
    if version != MSH_VERSION {
        return Err(AssetError::InvalidFormat(format!(
            "invalid MSH file: version {version} != {MSH_VERSION}"
        )));
    }

    let _skeleton_data_size = reader.read_u32()?;
    let _mesh_data_size = reader.read_u32()?;

    let root_count = read_count(&mut reader, "root bone count")?;
    let mut root_bones = Vec::with_capacity(reserve_hint(root_count));
    for _ in 0..root_count {
        root_bones.push(read_bone_node(&mut reader, ROOT_PARENT_ID, 0)?);
    }

    let sub_mesh_count = read_count(&mut reader, "sub mesh count")?;
    let mut sub_meshes = Vec::with_capacity(reserve_hint(sub_mesh_count));
    for _ in 0..sub_mesh_count {
        sub_meshes.push(read_sub_mesh(&mut reader)?);
    }

    Ok(MshFile {
        root_bones,
        sub_meshes,
    })
}

fn read_count<R: Read + Seek>(reader: &mut ByteReader<R>, what: &str) -> Result<usize> {
    let value = reader.read_i32()?;
    usize::try_from(value)
        .map_err(|_| AssetError::MalformedStructure(format!("negative {what}: {value}")))
}

fn read_bone_node<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    parent_id: i32,
    depth: usize,
) -> Result<BoneNode> {
    if depth > MAX_BONE_DEPTH {
        return Err(AssetError::MalformedStructure(format!(
            "bone tree deeper than {MAX_BONE_DEPTH}"
        )));
    }

    let node_type = reader.read_i32()?;
    let id = reader.read_i32()?;

    let name_length = read_count(reader, "bone name length")?;
    let name = reader.read_string(name_length)?;

    let translation = gamebox::to_engine_position(reader.read_vec3()?);
    let x = reader.read_f32()?;
    let y = reader.read_f32()?;
    let z = reader.read_f32()?;
    let w = reader.read_f32()?;
    let rotation = gamebox::msh_quaternion(x, y, z, w);

    let child_count = read_count(reader, "child bone count")?;
    let mut children = Vec::with_capacity(reserve_hint(child_count));
    for _ in 0..child_count {
        children.push(read_bone_node(reader, id, depth + 1)?);
    }

    Ok(BoneNode {
        node_type,
        id,
        name,
        parent_id,
        translation,
        rotation,
        children,
    })
}

fn read_sub_mesh<R: Read + Seek>(reader: &mut ByteReader<R>) -> Result<MshMesh> {
    let material_id = reader.read_i32()?;
    let vertex_count = read_count(reader, "vertex count")?;
    let face_count = read_count(reader, "face count")?;

    let mut vertices = Vec::with_capacity(reserve_hint(vertex_count));
    for _ in 0..vertex_count {
        let position = gamebox::to_engine_position(reader.read_vec3()?);
        let bone_id = reader.read_i32()?;
        vertices.push(MshVertex { position, bone_id });
    }

    let mut faces = Vec::with_capacity(reserve_hint(face_count));
    for _ in 0..face_count {
        let indices = [reader.read_u16()?, reader.read_u16()?, reader.read_u16()?];
        for index in indices {
            if index as usize >= vertex_count {
                return Err(AssetError::MalformedStructure(format!(
                    "face index {index} out of range (vertex count {vertex_count})"
                )));
            }
        }
        let mut uvs = [[0f32; 2]; 3];
        for uv in uvs.iter_mut() {
            uv[0] = reader.read_f32()?;
            uv[1] = reader.read_f32()?;
        }
        faces.push(MshFace { indices, uvs });
    }

    Ok(MshMesh {
        material_id,
        vertices,
        faces,
    })
}
