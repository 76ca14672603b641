//! SCN 解码器
//!
//! 头部记录 NPC 表与物件表的绝对偏移，解码时按偏移定位。
//! 填充字节只为 4 字节对齐存在，读取后丢弃（NPC 记录中的两个填充
//! 字节随记录保留，与参考实现一致）。

use std::io::{Read, Seek};

use glam::Vec3;

use crate::gamebox;
use crate::reader::ByteReader;
use crate::{AssetError, Result};

use super::{
    Aabb, GbRect, ScnFile, ScnFormatVariant, ScnNpcInfo, ScnObjectInfo, ScnPath, ScnSceneInfo,
};

/// 解码 SCN 文件；两个构建变体的布局无法自辨，由调用方指定
pub fn read(bytes: &[u8], codepage: u16, variant: ScnFormatVariant) -> Result<ScnFile> {
    let mut reader = ByteReader::from_bytes(bytes, codepage);

    let magic = reader.read_bytes(4)?;
    if &magic[..3] != b"SCN" {
        return Err(AssetError::InvalidFormat(
            "invalid SCN file: header != SCN".to_string(),
        ));
    }

    let version = reader.read_i16()?;
    let npc_count = read_count16(&mut reader, "npc count")?;
    let npc_data_offset = reader.read_u32()?;
    let object_count = read_count16(&mut reader, "object count")?;
    let object_data_offset = reader.read_u32()?;

    let scene_info = ScnSceneInfo {
        city_name: reader.read_string(32)?,
        scene_name: reader.read_string(32)?,
        model: reader.read_string(32)?,
        scene_type: reader.read_i32()?,
        light_map: reader.read_i32()?,
        sky_box: reader.read_u32()?,
        reserved: to_array(reader.read_u32s(6)?),
    };

    reader.seek(npc_data_offset as u64)?;
    let mut npc_infos = Vec::with_capacity(npc_count);
    for _ in 0..npc_count {
        npc_infos.push(read_npc_info(&mut reader)?);
    }

    reader.seek(object_data_offset as u64)?;
    let mut object_infos = Vec::with_capacity(object_count);
    for _ in 0..object_count {
        object_infos.push(read_object_info(&mut reader, variant)?);
    }

    Ok(ScnFile {
        variant,
        version,
        scene_info,
        npc_infos,
        object_infos,
    })
}

fn read_count16<R: Read + Seek>(reader: &mut ByteReader<R>, what: &str) -> Result<usize> {
    let value = reader.read_i16()?;
    usize::try_from(value)
        .map_err(|_| AssetError::MalformedStructure(format!("negative {what}: {value}")))
}

fn to_array<const N: usize>(values: Vec<u32>) -> [u32; N] {
    let mut array = [0u32; N];
    array.copy_from_slice(&values);
    array
}

fn read_path<R: Read + Seek>(reader: &mut ByteReader<R>) -> Result<ScnPath> {
    let number_of_waypoints = reader.read_i32()?;
    let mut waypoints = [Vec3::ZERO; 16];
    for waypoint in waypoints.iter_mut() {
        *waypoint = reader.read_vec3()?;
    }
    Ok(ScnPath {
        number_of_waypoints,
        waypoints,
    })
}

fn read_npc_info<R: Read + Seek>(reader: &mut ByteReader<R>) -> Result<ScnNpcInfo> {
    Ok(ScnNpcInfo {
        id: reader.read_u8()?,
        actor_type: reader.read_u8()?,
        name: reader.read_string(32)?,
        texture: reader.read_string(34)?,
        facing_direction: reader.read_f32()?,
        layer_index: reader.read_i32()?,
        gamebox_x_position: reader.read_f32()?,
        gamebox_z_position: reader.read_f32()?,
        init_active: reader.read_i32()?,
        init_behaviour: reader.read_i32()?,
        script_id: reader.read_u32()?,
        gamebox_y_position: reader.read_f32()?,
        init_action: reader.read_string(16)?,
        monster_ids: to_array(reader.read_u32s(3)?),
        number_of_monsters: reader.read_u8()?,
        monster_can_respawn: reader.read_u8()?,
        padding_bytes: {
            let bytes = reader.read_bytes(2)?;
            [bytes[0], bytes[1]]
        },
        path: read_path(reader)?,
        no_turn: reader.read_u32()?,
        loop_action: reader.read_u32()?,
        gamebox_move_speed: reader.read_u32()?,
        reserved: to_array(reader.read_u32s(29)?),
    })
}

fn read_object_info<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    variant: ScnFormatVariant,
) -> Result<ScnObjectInfo> {
    let id = reader.read_u8()?;
    let init_active = reader.read_u8()?;
    let times = reader.read_u8()?;
    let switch_state = reader.read_u8()?;

    let name = reader.read_string(32)?;

    let trigger_type = reader.read_u8()?;
    let is_non_blocking = reader.read_u8()?;
    let _ = reader.read_bytes(2)?; // 4 字节对齐填充

    let gamebox_position = reader.read_vec3()?;
    let gamebox_y_rotation = reader.read_f32()?;

    let tile_map_trigger_rect = GbRect {
        left: reader.read_i32()?,
        top: reader.read_i32()?,
        right: reader.read_i32()?,
        bottom: reader.read_i32()?,
    };

    let object_type = reader.read_u8()?;
    let save_state = reader.read_u8()?;
    let layer_index = reader.read_u8()?;
    let element_type = reader.read_u8()?;

    let mut parameters = [0i32; 6];
    match variant {
        ScnFormatVariant::Base => {
            for parameter in parameters.iter_mut() {
                *parameter = reader.read_i32()?;
            }
        }
        ScnFormatVariant::Extended => {
            // 扩展变体把参数块存为浮点，取整保留
            for parameter in parameters.iter_mut() {
                *parameter = reader.read_f32()? as i32;
            }
        }
    }

    let not_used = match variant {
        ScnFormatVariant::Base => None,
        ScnFormatVariant::Extended => Some(reader.read_u32()?),
    };

    let require_special_action = reader.read_u8()?;
    let require_item = reader.read_u16()?;
    let _ = reader.read_u8()?; // 对齐填充

    let require_money = reader.read_u16()?;
    let require_level = reader.read_u16()?;

    let require_attack_value = reader.read_u16()?;
    let require_all_mechanisms_solved = reader.read_u8()?;
    let failed_message = reader.read_string(16)?;
    let _ = reader.read_u8()?; // 对齐填充

    let linked_object_group_id = match variant {
        ScnFormatVariant::Base => None,
        ScnFormatVariant::Extended => {
            let value = reader.read_u16()?;
            let _ = reader.read_bytes(2)?; // 对齐填充
            Some(value)
        }
    };

    let script_id = reader.read_u32()?;

    let path = read_path(reader)?;

    let linked_object_id = reader.read_u16()?;
    let dependent_scene_name = reader.read_string(32)?;
    let dependent_object_id = reader.read_u8()?;
    let _ = reader.read_u8()?; // 对齐填充

    let bounds = Aabb {
        min: gamebox::to_engine_position(reader.read_vec3()?),
        max: gamebox::to_engine_position(reader.read_vec3()?),
    };

    let gamebox_x_rotation = reader.read_f32()?;

    let gamebox_z_rotation = match variant {
        ScnFormatVariant::Base => None,
        ScnFormatVariant::Extended => Some(reader.read_f32()?),
    };

    let sfx_name = reader.read_string(8)?;

    let effect_model_type = reader.read_u32()?;

    let script_activated = reader.read_u32()?;
    let script_moved = reader.read_u32()?;

    let can_only_be_triggered_once = match variant {
        ScnFormatVariant::Base => None,
        ScnFormatVariant::Extended => Some(reader.read_u32()?),
    };

    let reserved_count = match variant {
        ScnFormatVariant::Base => 52,
        ScnFormatVariant::Extended => 44,
    };
    let reserved = reader.read_u32s(reserved_count)?;

    Ok(ScnObjectInfo {
        id,
        init_active,
        times,
        switch_state,
        name,
        trigger_type,
        is_non_blocking,
        gamebox_position,
        gamebox_y_rotation,
        tile_map_trigger_rect,
        object_type,
        save_state,
        layer_index,
        element_type,
        parameters,
        not_used,
        require_special_action,
        require_item,
        require_money,
        require_level,
        require_attack_value,
        require_all_mechanisms_solved,
        failed_message,
        linked_object_group_id,
        script_id,
        path,
        linked_object_id,
        dependent_scene_name,
        dependent_object_id,
        bounds,
        gamebox_x_rotation,
        gamebox_z_rotation,
        sfx_name,
        effect_model_type,
        script_activated,
        script_moved,
        can_only_be_triggered_once,
        reserved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_fixed_string(buf: &mut Vec<u8>, text: &str, width: usize) {
        let mut field = vec![0u8; width];
        field[..text.len()].copy_from_slice(text.as_bytes());
        buf.extend_from_slice(&field);
    }

    fn push_path(buf: &mut Vec<u8>, waypoint_count: i32) {
        buf.extend_from_slice(&waypoint_count.to_le_bytes());
        for _ in 0..16 * 3 {
            buf.extend_from_slice(&0.0f32.to_le_bytes());
        }
    }

    /// 头部 + 场景信息，NPC/物件偏移指向场景信息之后
    fn push_header(buf: &mut Vec<u8>, npc_count: i16, object_count: i16, npc_bytes: usize) {
        let header_len = 18usize;
        let scene_info_len = 32 * 3 + 4 + 4 + 4 + 6 * 4;
        let npc_offset = (header_len + scene_info_len) as u32;
        let object_offset = npc_offset + npc_bytes as u32;

        buf.extend_from_slice(b"SCN\0");
        buf.extend_from_slice(&1i16.to_le_bytes()); // version
        buf.extend_from_slice(&npc_count.to_le_bytes());
        buf.extend_from_slice(&npc_offset.to_le_bytes());
        buf.extend_from_slice(&object_count.to_le_bytes());
        buf.extend_from_slice(&object_offset.to_le_bytes());

        push_fixed_string(buf, "city", 32);
        push_fixed_string(buf, "scene", 32);
        push_fixed_string(buf, "model", 32);
        buf.extend_from_slice(&2i32.to_le_bytes()); // scene type
        buf.extend_from_slice(&7i32.to_le_bytes()); // light map
        buf.extend_from_slice(&3u32.to_le_bytes()); // sky box
        for i in 0..6u32 {
            buf.extend_from_slice(&i.to_le_bytes()); // reserved
        }
    }

    fn push_npc(buf: &mut Vec<u8>) {
        buf.push(5); // id
        buf.push(1); // actor type
        push_fixed_string(buf, "npc", 32);
        push_fixed_string(buf, "tex", 34);
        buf.extend_from_slice(&90.0f32.to_le_bytes()); // facing
        buf.extend_from_slice(&0i32.to_le_bytes()); // layer
        buf.extend_from_slice(&1.0f32.to_le_bytes()); // x
        buf.extend_from_slice(&2.0f32.to_le_bytes()); // z
        buf.extend_from_slice(&1i32.to_le_bytes()); // init active
        buf.extend_from_slice(&0i32.to_le_bytes()); // behaviour
        buf.extend_from_slice(&42u32.to_le_bytes()); // script id
        buf.extend_from_slice(&3.0f32.to_le_bytes()); // y
        push_fixed_string(buf, "idle", 16);
        for _ in 0..3 {
            buf.extend_from_slice(&0u32.to_le_bytes()); // monster ids
        }
        buf.push(0); // monster count
        buf.push(0); // respawn
        buf.extend_from_slice(&[0xAB, 0xCD]); // 填充（保留）
        push_path(buf, 2);
        buf.extend_from_slice(&0u32.to_le_bytes()); // no turn
        buf.extend_from_slice(&0u32.to_le_bytes()); // loop action
        buf.extend_from_slice(&0u32.to_le_bytes()); // move speed
        for _ in 0..29 {
            buf.extend_from_slice(&0u32.to_le_bytes());
        }
    }

    fn push_object(buf: &mut Vec<u8>, variant: ScnFormatVariant) {
        buf.extend_from_slice(&[9, 1, 0, 0]); // id / active / times / switch
        push_fixed_string(buf, "door", 32);
        buf.extend_from_slice(&[0, 0, 0, 0]); // trigger / blocking / pad
        for v in [10.0f32, 20.0, 30.0, 45.0] {
            buf.extend_from_slice(&v.to_le_bytes()); // position + y rotation
        }
        for v in [1i32, 2, 3, 4] {
            buf.extend_from_slice(&v.to_le_bytes()); // trigger rect
        }
        buf.extend_from_slice(&[2, 0, 0, 0]); // type / save / layer / element
        match variant {
            ScnFormatVariant::Base => {
                for v in [11i32, 12, 13, 14, 15, 16] {
                    buf.extend_from_slice(&v.to_le_bytes());
                }
            }
            ScnFormatVariant::Extended => {
                for v in [11.0f32, 12.0, 13.0, 14.0, 15.0, 16.0] {
                    buf.extend_from_slice(&v.to_le_bytes());
                }
                buf.extend_from_slice(&77u32.to_le_bytes()); // not used
            }
        }
        buf.push(0); // require special action
        buf.extend_from_slice(&100u16.to_le_bytes()); // require item
        buf.push(0); // 填充
        buf.extend_from_slice(&200u16.to_le_bytes()); // money
        buf.extend_from_slice(&5u16.to_le_bytes()); // level
        buf.extend_from_slice(&50u16.to_le_bytes()); // attack
        buf.push(0); // mechanisms solved
        push_fixed_string(buf, "fail", 16);
        buf.push(0); // 填充
        if variant == ScnFormatVariant::Extended {
            buf.extend_from_slice(&8u16.to_le_bytes()); // group id
            buf.extend_from_slice(&[0, 0]); // 填充
        }
        buf.extend_from_slice(&1234u32.to_le_bytes()); // script id
        push_path(buf, 0);
        buf.extend_from_slice(&6u16.to_le_bytes()); // linked object id
        push_fixed_string(buf, "dep", 32);
        buf.push(3); // dependent object id
        buf.push(0); // 填充
        for v in [0.0f32, 0.0, 0.0, 20.0, 20.0, 20.0] {
            buf.extend_from_slice(&v.to_le_bytes()); // bounds min/max
        }
        buf.extend_from_slice(&15.0f32.to_le_bytes()); // x rotation
        if variant == ScnFormatVariant::Extended {
            buf.extend_from_slice(&25.0f32.to_le_bytes()); // z rotation
        }
        push_fixed_string(buf, "sfx", 8);
        buf.extend_from_slice(&1u32.to_le_bytes()); // effect model
        buf.extend_from_slice(&2u32.to_le_bytes()); // script activated
        buf.extend_from_slice(&3u32.to_le_bytes()); // script moved
        if variant == ScnFormatVariant::Extended {
            buf.extend_from_slice(&1u32.to_le_bytes()); // triggered once
        }
        let reserved = match variant {
            ScnFormatVariant::Base => 52,
            ScnFormatVariant::Extended => 44,
        };
        for _ in 0..reserved {
            buf.extend_from_slice(&0u32.to_le_bytes());
        }
    }

    #[test]
    fn test_invalid_magic() {
        let err = read(b"ABC\0\0\0\0\0", 936, ScnFormatVariant::Base).unwrap_err();
        assert!(matches!(err, AssetError::InvalidFormat(_)));
    }

    #[test]
    fn test_empty_scene_decodes() {
        let mut buf = Vec::new();
        push_header(&mut buf, 0, 0, 0);
        let file = read(&buf, 936, ScnFormatVariant::Base).unwrap();
        assert!(file.npc_infos.is_empty());
        assert!(file.object_infos.is_empty());
        assert_eq!(file.scene_info.city_name, "city");
        assert_eq!(file.scene_info.scene_type, 2);
        assert_eq!(file.scene_info.reserved, [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_npc_record() {
        let mut npc_bytes = Vec::new();
        push_npc(&mut npc_bytes);
        let mut buf = Vec::new();
        push_header(&mut buf, 1, 0, npc_bytes.len());
        buf.extend_from_slice(&npc_bytes);

        let file = read(&buf, 936, ScnFormatVariant::Base).unwrap();
        let npc = &file.npc_infos[0];
        assert_eq!(npc.id, 5);
        assert_eq!(npc.name, "npc");
        assert_eq!(npc.init_action, "idle");
        assert_eq!(npc.script_id, 42);
        assert_eq!(npc.path.number_of_waypoints, 2);
        // 填充字节原样保留
        assert_eq!(npc.padding_bytes, [0xAB, 0xCD]);
    }

    #[test]
    fn test_object_record_base_variant() {
        let mut buf = Vec::new();
        push_header(&mut buf, 0, 1, 0);
        push_object(&mut buf, ScnFormatVariant::Base);

        let file = read(&buf, 936, ScnFormatVariant::Base).unwrap();
        let object = &file.object_infos[0];
        assert_eq!(object.name, "door");
        assert_eq!(object.parameters, [11, 12, 13, 14, 15, 16]);
        assert_eq!(object.not_used, None);
        assert_eq!(object.linked_object_group_id, None);
        assert_eq!(object.gamebox_z_rotation, None);
        assert_eq!(object.can_only_be_triggered_once, None);
        assert_eq!(object.reserved.len(), 52);
        assert_eq!(object.script_id, 1234);
        // 包围盒转换到引擎空间
        assert_eq!(object.bounds.max.y, 1.0);
    }

    #[test]
    fn test_object_record_extended_variant() {
        let mut buf = Vec::new();
        push_header(&mut buf, 0, 1, 0);
        push_object(&mut buf, ScnFormatVariant::Extended);

        let file = read(&buf, 936, ScnFormatVariant::Extended).unwrap();
        let object = &file.object_infos[0];
        // 浮点参数块取整
        assert_eq!(object.parameters, [11, 12, 13, 14, 15, 16]);
        assert_eq!(object.not_used, Some(77));
        assert_eq!(object.linked_object_group_id, Some(8));
        assert_eq!(object.gamebox_z_rotation, Some(25.0));
        assert_eq!(object.can_only_be_triggered_once, Some(1));
        assert_eq!(object.reserved.len(), 44);
    }
}
