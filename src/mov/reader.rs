//! MOV 解码器

use std::io::{Read, Seek};

use glam::Mat3;

use crate::gamebox;
use crate::reader::{reserve_hint, ByteReader};
use crate::{AssetError, Result};

use super::{MovAnimationEvent, MovBoneTrack, MovFile, MovKeyFrame};

const MOV_VERSION: i32 = 100;

/// 解码 MOV 文件
pub fn read(bytes: &[u8], codepage: u16) -> Result<MovFile> {
    let mut reader = ByteReader::from_bytes(bytes, codepage);

    let magic = reader.read_bytes(4)?;
    if &magic[..3] != b"anm" {
        return Err(AssetError::InvalidFormat(
            "invalid MOV file: header != anm".to_string(),
        ));
    }

    let version = reader.read_i32()?;
    if version != MOV_VERSION {
        return Err(AssetError::InvalidFormat(format!(
            "invalid MOV file: version {version} != {MOV_VERSION}"
        )));
    }

    let _header_duration = reader.read_f32()?; // 不可信，时长随后重新计算
    let track_count = read_count(&mut reader, "bone track count")?;
    let vertex_count = reader.read_i32()?;
    let event_count = read_count(&mut reader, "animation event count")?;

    let mut animation_events = Vec::with_capacity(reserve_hint(event_count));
    for _ in 0..event_count {
        animation_events.push(read_animation_event(&mut reader)?);
    }

    let mut bone_tracks = Vec::with_capacity(reserve_hint(track_count));
    for _ in 0..track_count {
        bone_tracks.push(read_bone_track(&mut reader)?);
    }

    let mut duration = 0u32;
    for track in &bone_tracks {
        if let Some(last) = track.key_frames.last() {
            if last.tick > duration {
                duration = last.tick;
            }
        }
    }

    Ok(MovFile {
        duration,
        bone_tracks,
        animation_events,
        vertex_count,
    })
}

fn read_count<R: Read + Seek>(reader: &mut ByteReader<R>, what: &str) -> Result<usize> {
    let value = reader.read_i32()?;
    usize::try_from(value)
        .map_err(|_| AssetError::MalformedStructure(format!("negative {what}: {value}")))
}

fn read_animation_event<R: Read + Seek>(reader: &mut ByteReader<R>) -> Result<MovAnimationEvent> {
    Ok(MovAnimationEvent {
        tick: gamebox::seconds_to_tick(reader.read_f32()?),
        name: reader.read_string(16)?,
    })
}

fn read_bone_track<R: Read + Seek>(reader: &mut ByteReader<R>) -> Result<MovBoneTrack> {
    let bone_id = reader.read_i32()?;

    let name_length = read_count(reader, "bone name length")?;
    let bone_name = reader.read_string(name_length)?;

    let key_frame_count = read_count(reader, "key frame count")?;
    let flags = reader.read_i32()?;

    let mut key_frames = Vec::with_capacity(reserve_hint(key_frame_count));
    for _ in 0..key_frame_count {
        let tick = gamebox::seconds_to_tick(reader.read_f32()?);
        let translation = gamebox::to_engine_position(reader.read_vec3()?);
        let x = reader.read_f32()?;
        let y = reader.read_f32()?;
        let z = reader.read_f32()?;
        let w = reader.read_f32()?;
        let rotation = gamebox::mov_quaternion(x, y, z, w);
        let scale = Mat3::from_cols_array(&[
            reader.read_f32()?,
            reader.read_f32()?,
            reader.read_f32()?,
            reader.read_f32()?,
            reader.read_f32()?,
            reader.read_f32()?,
            reader.read_f32()?,
            reader.read_f32()?,
            reader.read_f32()?,
        ]);

        key_frames.push(MovKeyFrame {
            tick,
            translation,
            rotation,
            scale,
        });
    }

    Ok(MovBoneTrack {
        bone_id,
        bone_name,
        flags,
        key_frames,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use glam::Vec3;

    pub(crate) fn push_key_frame(buf: &mut Vec<u8>, seconds: f32, translation: [f32; 3]) {
        buf.extend_from_slice(&seconds.to_le_bytes());
        for v in translation {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        for v in [0.0f32, 0.0, 0.0, -1.0] {
            buf.extend_from_slice(&v.to_le_bytes()); // 单位旋转（MOV 约定 w 取反）
        }
        for i in 0..9 {
            let v: f32 = if i % 4 == 0 { 1.0 } else { 0.0 }; // 单位缩放矩阵
            buf.extend_from_slice(&v.to_le_bytes());
        }
    }

    pub(crate) fn push_bone_track(
        buf: &mut Vec<u8>,
        bone_id: i32,
        name: &str,
        frames: &[(f32, [f32; 3])],
    ) {
        buf.extend_from_slice(&bone_id.to_le_bytes());
        buf.extend_from_slice(&(name.len() as i32).to_le_bytes());
        buf.extend_from_slice(name.as_bytes());
        buf.extend_from_slice(&(frames.len() as i32).to_le_bytes());
        buf.extend_from_slice(&0i32.to_le_bytes()); // flags
        for &(seconds, translation) in frames {
            push_key_frame(buf, seconds, translation);
        }
    }

    pub(crate) fn minimal_mov(tracks: &[(i32, &str, &[(f32, [f32; 3])])]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"anm\0");
        buf.extend_from_slice(&100i32.to_le_bytes());
        buf.extend_from_slice(&999.0f32.to_le_bytes()); // 头部时长（应被忽略）
        buf.extend_from_slice(&(tracks.len() as i32).to_le_bytes());
        buf.extend_from_slice(&0i32.to_le_bytes()); // vertex count
        buf.extend_from_slice(&0i32.to_le_bytes()); // event count
        for &(bone_id, name, frames) in tracks {
            push_bone_track(&mut buf, bone_id, name, frames);
        }
        buf
    }

    #[test]
    fn test_invalid_magic_no_partial_state() {
        let err = read(b"xxx\0\0\0\0\0", 936).unwrap_err();
        assert!(matches!(err, AssetError::InvalidFormat(_)));
    }

    #[test]
    fn test_invalid_version() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"anm\0");
        buf.extend_from_slice(&99i32.to_le_bytes());
        let err = read(&buf, 936).unwrap_err();
        assert!(matches!(err, AssetError::InvalidFormat(_)));
    }

    #[test]
    fn test_huge_track_count_is_malformed() {
        // 截断流里的天文数字计数：应在首条轨道读取时报错，而非预分配
        let mut buf = Vec::new();
        buf.extend_from_slice(b"anm\0");
        buf.extend_from_slice(&100i32.to_le_bytes());
        buf.extend_from_slice(&0.0f32.to_le_bytes());
        buf.extend_from_slice(&i32::MAX.to_le_bytes()); // track count
        buf.extend_from_slice(&0i32.to_le_bytes()); // vertex count
        buf.extend_from_slice(&0i32.to_le_bytes()); // event count
        let err = read(&buf, 936).unwrap_err();
        assert!(matches!(err, AssetError::MalformedStructure(_)));
    }

    #[test]
    fn test_duration_recomputed_from_tracks() {
        let frames_a: &[(f32, [f32; 3])] = &[(0.0, [0.0; 3]), (0.5, [0.0; 3])];
        let frames_b: &[(f32, [f32; 3])] = &[(0.0, [0.0; 3]), (1.0, [0.0; 3])];
        let bytes = minimal_mov(&[(0, "root", frames_a), (1, "child", frames_b)]);
        let file = read(&bytes, 936).unwrap();
        // 头部写的 999 秒被忽略，取所有轨道末键 tick 最大值
        assert_eq!(file.duration, gamebox::seconds_to_tick(1.0));
        assert_eq!(file.bone_tracks.len(), 2);
        assert_eq!(file.bone_tracks[1].bone_name, "child");
    }

    #[test]
    fn test_translation_converted_to_engine_space() {
        let frames: &[(f32, [f32; 3])] = &[(0.0, [20.0, 40.0, 60.0])];
        let bytes = minimal_mov(&[(0, "root", frames)]);
        let file = read(&bytes, 936).unwrap();
        let key = &file.bone_tracks[0].key_frames[0];
        assert_eq!(key.translation, Vec3::new(-1.0, 2.0, 3.0));
        // 单位旋转经 MOV 约定转换后仍为单位旋转
        assert!((key.rotation.w - 1.0).abs() < 1e-6);
    }
}
