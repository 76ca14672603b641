//! MOV 骨骼动画
//!
//! 逐骨骼的关键帧轨道，轨道内按 tick 非降序排列。文件头声明的总时长
//! 不被信任，解码时以所有轨道末键 tick 的最大值重新计算。

pub(crate) mod reader;

pub use reader::read;

use glam::{Mat3, Quat, Vec3};

/// 动画事件：tick + 定宽名称
#[derive(Debug, Clone)]
pub struct MovAnimationEvent {
    pub tick: u32,
    pub name: String,
}

/// 单个关键帧（平移/旋转已转换到引擎空间，缩放矩阵保留原始值）
#[derive(Debug, Clone, Copy)]
pub struct MovKeyFrame {
    pub tick: u32,
    pub translation: Vec3,
    pub rotation: Quat,
    /// 3×3 缩放/剪切矩阵，原始 9 个浮点
    pub scale: Mat3,
}

/// 一根骨骼的动画轨道，按骨骼 id 与骨骼层级匹配
#[derive(Debug, Clone)]
pub struct MovBoneTrack {
    pub bone_id: i32,
    pub bone_name: String,
    pub flags: i32,
    pub key_frames: Vec<MovKeyFrame>,
}

/// 解码后的 MOV 文档
#[derive(Debug, Clone)]
pub struct MovFile {
    /// 所有轨道末键 tick 的最大值
    pub duration: u32,
    pub bone_tracks: Vec<MovBoneTrack>,
    pub animation_events: Vec<MovAnimationEvent>,
    /// 文件头声明的顶点数
    pub vertex_count: i32,
}
