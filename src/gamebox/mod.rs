//! GameBox 引擎约定与目标引擎之间的换算
//!
//! GameBox 为左手坐标系，长度单位为 1/20 米，时间单位为 tick（每秒 4800）。
//! 所有解码器在读入原始数值后立即调用这里的转换函数，文档树中只保留
//! 目标引擎空间的值（SCN 场景记录除外，见 `scn` 模块）。

use std::io::{Read, Seek};

use glam::{Mat4, Quat, Vec3, Vec4};

use crate::reader::ByteReader;
use crate::{AssetError, Result};

/// GameBox 长度单位与米的比例
pub const GAMEBOX_UNITS_PER_METER: f32 = 20.0;

/// 引擎固定帧率时间单位：每秒 tick 数
pub const TICKS_PER_SECOND: u32 = 4800;

/// 秒转 tick
pub fn seconds_to_tick(seconds: f32) -> u32 {
    (seconds * TICKS_PER_SECOND as f32) as u32
}

/// tick 转秒
pub fn tick_to_seconds(tick: u32) -> f32 {
    tick as f32 / TICKS_PER_SECOND as f32
}

/// 普通位置转换：X 轴取反，单位换算为米
pub fn to_engine_position(v: Vec3) -> Vec3 {
    Vec3::new(
        -v.x / GAMEBOX_UNITS_PER_METER,
        v.y / GAMEBOX_UNITS_PER_METER,
        v.z / GAMEBOX_UNITS_PER_METER,
    )
}

/// CVD 位置转换：CVD 以 Z 轴为竖直方向存储
pub fn cvd_position(v: Vec3) -> Vec3 {
    Vec3::new(
        -v.x / GAMEBOX_UNITS_PER_METER,
        v.z / GAMEBOX_UNITS_PER_METER,
        -v.y / GAMEBOX_UNITS_PER_METER,
    )
}

/// CVD 缩放转换：交换 Y/Z，无单位换算
pub fn cvd_scale(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, v.y)
}

/// 法线转换：仅做轴翻转，不做单位换算
pub fn to_engine_normal(v: Vec3) -> Vec3 {
    Vec3::new(-v.x, v.y, v.z)
}

/// CVD 四元数转换
pub fn cvd_quaternion(x: f32, y: f32, z: f32, w: f32) -> Quat {
    Quat::from_xyzw(-x, z, y, w)
}

/// MOV 四元数转换
pub fn mov_quaternion(x: f32, y: f32, z: f32, w: f32) -> Quat {
    Quat::from_xyzw(-x, y, z, -w)
}

/// MSH 四元数转换（与 MOV 相同的约定）
pub fn msh_quaternion(x: f32, y: f32, z: f32, w: f32) -> Quat {
    mov_quaternion(x, y, z, w)
}

/// 反转三角形绕序，转换左右手坐标系
pub fn reverse_winding<T>(triangles: &mut [T]) {
    triangles.reverse();
}

/// 读取 16 个 f32 的行主序仿射矩阵并转换到引擎空间
///
/// 齐次分量强制归一（Tw = 1），行向量约定转置为列向量约定后沿 X 轴镜像，
/// 平移分量换算为米。
pub fn read_affine_matrix<R: Read + Seek>(reader: &mut ByteReader<R>) -> Result<Mat4> {
    let mut rows = [[0f32; 4]; 4];
    for row in rows.iter_mut() {
        for value in row.iter_mut() {
            *value = reader.read_f32()?;
        }
    }
    rows[3][3] = 1.0;

    let transposed = Mat4::from_cols_array_2d(&rows);
    let flip = Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0));
    let mut m = flip * transposed * flip;
    let t = m.w_axis;
    m.w_axis = Vec4::new(
        t.x / GAMEBOX_UNITS_PER_METER,
        t.y / GAMEBOX_UNITS_PER_METER,
        t.z / GAMEBOX_UNITS_PER_METER,
        1.0,
    );
    Ok(m)
}

/// 浮点 RGBA 颜色
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    pub fn from_f32s(values: &[f32]) -> Self {
        Self {
            r: values[0],
            g: values[1],
            b: values[2],
            a: values[3],
        }
    }

    /// 从 4 字节压缩颜色转换
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            r: bytes[0] as f32 / 255.0,
            g: bytes[1] as f32 / 255.0,
            b: bytes[2] as f32 / 255.0,
            a: bytes[3] as f32 / 255.0,
        }
    }
}

/// 材质混合模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFlag {
    Opaque,
    AlphaBlend,
    InvertColorBlend,
}

impl BlendFlag {
    pub fn from_byte(value: u8) -> Result<Self> {
        match value {
            0 => Ok(BlendFlag::Opaque),
            1 => Ok(BlendFlag::AlphaBlend),
            2 => Ok(BlendFlag::InvertColorBlend),
            _ => Err(AssetError::UnsupportedVariant(format!(
                "unknown blend flag: {value}"
            ))),
        }
    }
}

/// GameBox 材质：四组颜色 + 高光指数 + 纹理文件名
#[derive(Debug, Clone)]
pub struct GbMaterial {
    pub diffuse: Color,
    pub ambient: Color,
    pub specular: Color,
    pub emissive: Color,
    pub specular_power: f32,
    pub texture_name: String,
}
