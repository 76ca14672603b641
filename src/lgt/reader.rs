//! LGT 解码器

use std::io::{Read, Seek};

use crate::gamebox::{self, Color};
use crate::reader::{reserve_hint, ByteReader};
use crate::{AssetError, Result};

use super::{LgtFile, LightDecayType, LightNode, LightShapeType, LightType};

/// 解码 LGT 文件
pub fn read(bytes: &[u8], codepage: u16) -> Result<LgtFile> {
    let mut reader = ByteReader::from_bytes(bytes, codepage);

    let node_count = reader.read_i32()?;
    let node_count = usize::try_from(node_count).map_err(|_| {
        AssetError::MalformedStructure(format!("negative light node count: {node_count}"))
    })?;

    let mut light_nodes = Vec::with_capacity(reserve_hint(node_count));
    for _ in 0..node_count {
        if let Some(node) = read_light_node(&mut reader)? {
            light_nodes.push(node);
        }
    }

    Ok(LgtFile { light_nodes })
}

/// 读取一个灯光节点；未知灯光/形状类型返回 None（节点被过滤，非错误）
fn read_light_node<R: Read + Seek>(reader: &mut ByteReader<R>) -> Result<Option<LightNode>> {
    let world_matrix = gamebox::read_affine_matrix(reader)?;

    let raw_light_type = reader.read_i32()?;
    let light_color = Color::from_f32s(&reader.read_f32s(4)?);
    let ambient_color = Color::from_f32s(&reader.read_f32s(4)?);
    let use_diffuse = reader.read_u8()? != 0;
    let use_specular = reader.read_u8()? != 0;
    let near_start = reader.read_f32()?;
    let near_end = reader.read_f32()?;
    let far_start = reader.read_f32()?;
    let far_end = reader.read_f32()?;
    let raw_decay_type = reader.read_i32()?;
    let decay_radius = reader.read_f32()?;
    let raw_shape_type = reader.read_i32()?;
    let size = reader.read_f32()?;
    let falloff = reader.read_f32()?;
    let aspect_ratio = reader.read_f32()?;

    let (Some(light_type), Some(shape_type)) = (
        LightType::from_i32(raw_light_type),
        LightShapeType::from_i32(raw_shape_type),
    ) else {
        log::debug!(
            "dropping light node with unknown type (light={raw_light_type}, shape={raw_shape_type})"
        );
        return Ok(None);
    };

    // 衰减类型未知时不丢弃节点，回退为无衰减
    let decay_type = LightDecayType::from_i32(raw_decay_type).unwrap_or_else(|| {
        log::debug!("unknown light decay type {raw_decay_type}, falling back to None");
        LightDecayType::None
    });

    Ok(Some(LightNode {
        world_matrix,
        light_type,
        light_color,
        ambient_color,
        use_diffuse,
        use_specular,
        near_start,
        near_end,
        far_start,
        far_end,
        decay_type,
        decay_radius,
        shape_type,
        size,
        falloff,
        aspect_ratio,
    }))
}
