//! CVD 动画关键帧
//!
//! 每条轨道在文件中只存一个插值方式标签，标签对轨道内所有关键帧生效。
//! 磁盘记录按三种布局中最大的那个定长存储，读取时始终前进固定步长，
//! 再按激活的插值方式把记录前缀重新解释为对应的关键帧变体。

use glam::{Quat, Vec3};

use crate::gamebox;
use crate::reader::ByteReader;
use crate::{AssetError, Result};

/// 基础关键帧头：时间 f32 + 标志 u32，共 8 字节
const ANIMATION_KEY_SIZE: usize = 8;
/// TCB 头：基础头 + tension/continuity/bias/ease_in/ease_out，共 28 字节
const TCB_KEY_SIZE: usize = ANIMATION_KEY_SIZE + 20;

/// 位置记录步长 = max(TCB 40, Bezier 44, Linear 20)
pub const POSITION_KEY_STRIDE: usize = ANIMATION_KEY_SIZE + 36;
/// 旋转记录步长 = max(TCB 44, Bezier 24, Linear 24)
pub const ROTATION_KEY_STRIDE: usize = TCB_KEY_SIZE + 16;
/// 缩放记录步长 = max(TCB 56, Bezier 60, Linear 36)
pub const SCALE_KEY_STRIDE: usize = ANIMATION_KEY_SIZE + 52;

/// 插值方式标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Tcb,
    Bezier,
    Linear,
}

impl KeyKind {
    pub fn from_byte(value: u8) -> Result<Self> {
        match value {
            1 => Ok(KeyKind::Tcb),
            2 => Ok(KeyKind::Bezier),
            3 => Ok(KeyKind::Linear),
            _ => Err(AssetError::UnsupportedVariant(format!(
                "unknown animation key type: {value}"
            ))),
        }
    }
}

/// TCB 插值参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TcbParams {
    pub tension: f32,
    pub continuity: f32,
    pub bias: f32,
    pub ease_in: f32,
    pub ease_out: f32,
}

/// 位置关键帧（位置已转换到引擎空间）
#[derive(Debug, Clone, PartialEq)]
pub enum PositionKey {
    Tcb {
        time: f32,
        tcb: TcbParams,
        position: Vec3,
    },
    /// 切线保留 GameBox 原始值
    Bezier {
        time: f32,
        tangent_in: Vec3,
        tangent_out: Vec3,
        position: Vec3,
    },
    Linear { time: f32, position: Vec3 },
}

impl PositionKey {
    pub fn time(&self) -> f32 {
        match self {
            PositionKey::Tcb { time, .. }
            | PositionKey::Bezier { time, .. }
            | PositionKey::Linear { time, .. } => *time,
        }
    }

    pub fn position(&self) -> Vec3 {
        match self {
            PositionKey::Tcb { position, .. }
            | PositionKey::Bezier { position, .. }
            | PositionKey::Linear { position, .. } => *position,
        }
    }
}

/// 旋转关键帧（旋转已转换为引擎空间四元数）
#[derive(Debug, Clone, PartialEq)]
pub enum RotationKey {
    /// 磁盘上为轴角表示，解码时转四元数
    Tcb {
        time: f32,
        tcb: TcbParams,
        rotation: Quat,
    },
    Bezier { time: f32, rotation: Quat },
    Linear { time: f32, rotation: Quat },
}

impl RotationKey {
    pub fn time(&self) -> f32 {
        match self {
            RotationKey::Tcb { time, .. }
            | RotationKey::Bezier { time, .. }
            | RotationKey::Linear { time, .. } => *time,
        }
    }

    pub fn rotation(&self) -> Quat {
        match self {
            RotationKey::Tcb { rotation, .. }
            | RotationKey::Bezier { rotation, .. }
            | RotationKey::Linear { rotation, .. } => *rotation,
        }
    }
}

/// 缩放关键帧（缩放值与朝向已转换到引擎空间）
#[derive(Debug, Clone, PartialEq)]
pub enum ScaleKey {
    Tcb {
        time: f32,
        tcb: TcbParams,
        scale: Vec3,
        rotation: Quat,
    },
    Bezier {
        time: f32,
        tangent_in: Vec3,
        tangent_out: Vec3,
        scale: Vec3,
        rotation: Quat,
    },
    Linear {
        time: f32,
        scale: Vec3,
        rotation: Quat,
    },
}

impl ScaleKey {
    pub fn time(&self) -> f32 {
        match self {
            ScaleKey::Tcb { time, .. }
            | ScaleKey::Bezier { time, .. }
            | ScaleKey::Linear { time, .. } => *time,
        }
    }

    pub fn scale(&self) -> Vec3 {
        match self {
            ScaleKey::Tcb { scale, .. }
            | ScaleKey::Bezier { scale, .. }
            | ScaleKey::Linear { scale, .. } => *scale,
        }
    }

    pub fn rotation(&self) -> Quat {
        match self {
            ScaleKey::Tcb { rotation, .. }
            | ScaleKey::Bezier { rotation, .. }
            | ScaleKey::Linear { rotation, .. } => *rotation,
        }
    }
}

fn read_tcb_params(reader: &mut ByteReader<std::io::Cursor<&[u8]>>) -> Result<TcbParams> {
    Ok(TcbParams {
        tension: reader.read_f32()?,
        continuity: reader.read_f32()?,
        bias: reader.read_f32()?,
        ease_in: reader.read_f32()?,
        ease_out: reader.read_f32()?,
    })
}

/// 把一条定长原始记录按激活的插值方式解释为位置关键帧
pub fn parse_position_key(kind: KeyKind, record: &[u8]) -> Result<PositionKey> {
    let mut r = ByteReader::from_bytes(record, 936);
    let time = r.read_f32()?;
    let _flags = r.read_u32()?;
    match kind {
        KeyKind::Tcb => {
            let tcb = read_tcb_params(&mut r)?;
            let position = gamebox::cvd_position(r.read_vec3()?);
            Ok(PositionKey::Tcb { time, tcb, position })
        }
        KeyKind::Bezier => {
            let tangent_in = r.read_vec3()?;
            let tangent_out = r.read_vec3()?;
            let position = gamebox::cvd_position(r.read_vec3()?);
            Ok(PositionKey::Bezier {
                time,
                tangent_in,
                tangent_out,
                position,
            })
        }
        KeyKind::Linear => {
            let position = gamebox::cvd_position(r.read_vec3()?);
            Ok(PositionKey::Linear { time, position })
        }
    }
}

fn read_cvd_quaternion(reader: &mut ByteReader<std::io::Cursor<&[u8]>>) -> Result<Quat> {
    let x = reader.read_f32()?;
    let y = reader.read_f32()?;
    let z = reader.read_f32()?;
    let w = reader.read_f32()?;
    Ok(gamebox::cvd_quaternion(x, y, z, w))
}

/// 把一条定长原始记录解释为旋转关键帧
pub fn parse_rotation_key(kind: KeyKind, record: &[u8]) -> Result<RotationKey> {
    let mut r = ByteReader::from_bytes(record, 936);
    let time = r.read_f32()?;
    let _flags = r.read_u32()?;
    match kind {
        KeyKind::Tcb => {
            let tcb = read_tcb_params(&mut r)?;
            let axis = r.read_vec3()?;
            let angle_degrees = r.read_f32()?;
            // 先在 GameBox 空间做轴角转四元数，再转换分量
            let q = Quat::from_axis_angle(
                axis.normalize_or_zero(),
                angle_degrees.to_radians(),
            );
            let rotation = gamebox::cvd_quaternion(q.x, q.y, q.z, q.w);
            Ok(RotationKey::Tcb { time, tcb, rotation })
        }
        KeyKind::Bezier => {
            let rotation = read_cvd_quaternion(&mut r)?;
            Ok(RotationKey::Bezier { time, rotation })
        }
        KeyKind::Linear => {
            let rotation = read_cvd_quaternion(&mut r)?;
            Ok(RotationKey::Linear { time, rotation })
        }
    }
}

/// 把一条定长原始记录解释为缩放关键帧
pub fn parse_scale_key(kind: KeyKind, record: &[u8]) -> Result<ScaleKey> {
    let mut r = ByteReader::from_bytes(record, 936);
    let time = r.read_f32()?;
    let _flags = r.read_u32()?;
    match kind {
        KeyKind::Tcb => {
            let tcb = read_tcb_params(&mut r)?;
            let scale = gamebox::cvd_scale(r.read_vec3()?);
            let rotation = read_cvd_quaternion(&mut r)?;
            Ok(ScaleKey::Tcb {
                time,
                tcb,
                scale,
                rotation,
            })
        }
        KeyKind::Bezier => {
            let tangent_in = r.read_vec3()?;
            let tangent_out = r.read_vec3()?;
            let scale = gamebox::cvd_scale(r.read_vec3()?);
            let rotation = read_cvd_quaternion(&mut r)?;
            Ok(ScaleKey::Bezier {
                time,
                tangent_in,
                tangent_out,
                scale,
                rotation,
            })
        }
        KeyKind::Linear => {
            let scale = gamebox::cvd_scale(r.read_vec3()?);
            let rotation = read_cvd_quaternion(&mut r)?;
            Ok(ScaleKey::Linear {
                time,
                scale,
                rotation,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_position_record(time: f32, pos: [f32; 3]) -> Vec<u8> {
        let mut record = Vec::new();
        record.extend_from_slice(&time.to_le_bytes());
        record.extend_from_slice(&0u32.to_le_bytes());
        for v in pos {
            record.extend_from_slice(&v.to_le_bytes());
        }
        record.resize(POSITION_KEY_STRIDE, 0);
        record
    }

    #[test]
    fn test_linear_position_key() {
        let record = linear_position_record(2.5, [20.0, 40.0, 60.0]);
        let key = parse_position_key(KeyKind::Linear, &record).unwrap();
        assert_eq!(key.time(), 2.5);
        // CVD 位置转换：(-x, z, -y) / 20
        assert_eq!(key.position(), Vec3::new(-1.0, 3.0, -2.0));
    }

    #[test]
    fn test_tcb_rotation_axis_angle() {
        let mut record = Vec::new();
        record.extend_from_slice(&1.0f32.to_le_bytes());
        record.extend_from_slice(&0u32.to_le_bytes());
        for _ in 0..5 {
            record.extend_from_slice(&0f32.to_le_bytes()); // TCB 参数
        }
        // 绕 Z 轴 180 度
        for v in [0.0f32, 0.0, 1.0, 180.0] {
            record.extend_from_slice(&v.to_le_bytes());
        }
        record.resize(ROTATION_KEY_STRIDE, 0);

        let key = parse_rotation_key(KeyKind::Tcb, &record).unwrap();
        let q = key.rotation();
        // GameBox 空间 (0,0,sin90,cos90) -> 引擎空间 (-0, sin90, 0, cos90)
        assert!((q.y - 1.0).abs() < 1e-6);
        assert!(q.w.abs() < 1e-6);
    }

    #[test]
    fn test_unknown_key_kind() {
        assert!(matches!(
            KeyKind::from_byte(7),
            Err(AssetError::UnsupportedVariant(_))
        ));
    }
}
