//! LGT 灯光列表
//!
//! 无文件头，直接以灯光节点数量开始。未知灯光类型/形状类型的节点被
//! 静默丢弃（对前向兼容的灯光种类保持容忍），不是错误。

mod reader;

pub use reader::read;

use glam::Mat4;

use crate::gamebox::Color;

/// 灯光类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightType {
    Omni,
    Spot,
    Directional,
    Ambient,
}

impl LightType {
    pub(crate) fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(LightType::Omni),
            1 => Some(LightType::Spot),
            2 => Some(LightType::Directional),
            3 => Some(LightType::Ambient),
            _ => None,
        }
    }
}

/// 衰减类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightDecayType {
    None,
    Inverse,
    InverseSquare,
}

impl LightDecayType {
    pub(crate) fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(LightDecayType::None),
            1 => Some(LightDecayType::Inverse),
            2 => Some(LightDecayType::InverseSquare),
            _ => None,
        }
    }
}

/// 灯光形状类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightShapeType {
    Rectangle,
    Circle,
}

impl LightShapeType {
    pub(crate) fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(LightShapeType::Rectangle),
            1 => Some(LightShapeType::Circle),
            _ => None,
        }
    }
}

/// 单个灯光节点
#[derive(Debug, Clone)]
pub struct LightNode {
    /// 世界变换（引擎空间，仿射归一）
    pub world_matrix: Mat4,
    pub light_type: LightType,
    pub light_color: Color,
    pub ambient_color: Color,
    pub use_diffuse: bool,
    pub use_specular: bool,
    pub near_start: f32,
    pub near_end: f32,
    pub far_start: f32,
    pub far_end: f32,
    pub decay_type: LightDecayType,
    pub decay_radius: f32,
    pub shape_type: LightShapeType,
    pub size: f32,
    pub falloff: f32,
    pub aspect_ratio: f32,
}

/// 解码后的 LGT 文档
#[derive(Debug, Clone)]
pub struct LgtFile {
    pub light_nodes: Vec<LightNode>,
}
