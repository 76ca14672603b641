//! CVD 动画模型
//!
//! CVD 是 GameBox 引擎的关键帧动画模型格式：一棵几何节点树，每个节点
//! 可携带位置/旋转/缩放三条关键帧轨道和一份多帧网格数据。

mod keys;
mod reader;

pub use keys::{
    KeyKind, PositionKey, RotationKey, ScaleKey, TcbParams, POSITION_KEY_STRIDE,
    ROTATION_KEY_STRIDE, SCALE_KEY_STRIDE,
};
pub use reader::{read, read_with_options, CvdDecodeOptions};

use glam::{Mat4, Vec2, Vec3};

use crate::gamebox::{BlendFlag, GbMaterial};

/// CVD 格式版本
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CvdVersion {
    /// 文件头 "cvdf"
    V0_4,
    /// 文件头 "cvds"，节（section）额外携带材质动画轨道
    V0_5,
}

/// 解码后的 CVD 文档
#[derive(Debug, Clone)]
pub struct CvdFile {
    pub version: CvdVersion,
    /// 全文件所有轨道与所有网格时间键的最大时间值
    pub animation_duration: f32,
    pub root_nodes: Vec<CvdGeometryNode>,
}

/// 几何节点树的一个节点；解码后不可变
#[derive(Debug, Clone, Default)]
pub struct CvdGeometryNode {
    /// 节点可以只作层级用途而不携带几何数据
    pub geometry: Option<CvdGeometry>,
    pub children: Vec<CvdGeometryNode>,
}

/// 节点携带的几何负载
#[derive(Debug, Clone)]
pub struct CvdGeometry {
    pub position_keys: Vec<PositionKey>,
    pub rotation_keys: Vec<RotationKey>,
    pub scale_keys: Vec<ScaleKey>,
    /// 统一缩放标量
    pub scale: f32,
    /// 仿射变换矩阵（齐次分量已归一，引擎空间）
    pub transform: Mat4,
    pub mesh: CvdMesh,
}

/// 顶点记录（引擎空间）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CvdVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

/// 多帧网格：所有帧共享一组时间键
#[derive(Debug, Clone)]
pub struct CvdMesh {
    /// 已归零基的时间键（首键恒为 0）
    pub animation_time_keys: Vec<f32>,
    pub sections: Vec<CvdMeshSection>,
}

/// 网格分节：材质 + 三角形 + 展平后的逐帧顶点缓冲
#[derive(Debug, Clone)]
pub struct CvdMeshSection {
    pub blend_flag: BlendFlag,
    pub material: GbMaterial,
    /// [帧][展平顶点]，每个三角形贡献 3 个互不共享的顶点
    pub frame_vertices: Vec<Vec<CvdVertex>>,
    /// 展平后的三角形索引，绕序已反转
    pub triangles: Vec<u32>,
    /// 材质动画时间键（仅 v0.5，已归零基）
    pub animation_time_keys: Vec<f32>,
    /// 逐帧材质（仅 v0.5，无纹理名）
    pub animation_materials: Vec<GbMaterial>,
}
