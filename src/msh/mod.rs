//! MSH 网格/骨骼层级
//!
//! 骨骼动画模型的静态部分：骨骼节点树 + 蒙皮子网格。
//! 每个顶点只绑定一根骨骼（刚性绑定，无混合权重）。

pub(crate) mod reader;

pub use reader::read;

use glam::{Quat, Vec3};

/// 根骨骼的父 id 哨兵值
pub const ROOT_PARENT_ID: i32 = -1;

/// 静态骨骼节点，从文件读出后不可变
#[derive(Debug, Clone)]
pub struct BoneNode {
    pub node_type: i32,
    pub id: i32,
    pub name: String,
    /// 父骨骼 id；根为 [`ROOT_PARENT_ID`]
    pub parent_id: i32,
    /// 本地平移（引擎空间）
    pub translation: Vec3,
    /// 本地旋转（引擎空间）
    pub rotation: Quat,
    pub children: Vec<BoneNode>,
}

/// 蒙皮顶点：绑定姿态位置 + 单一骨骼 id
#[derive(Debug, Clone, Copy)]
pub struct MshVertex {
    pub position: Vec3,
    pub bone_id: i32,
}

/// 三角面：顶点索引 + 逐角 UV
#[derive(Debug, Clone, Copy)]
pub struct MshFace {
    pub indices: [u16; 3],
    pub uvs: [[f32; 2]; 3],
}

/// 蒙皮子网格
#[derive(Debug, Clone)]
pub struct MshMesh {
    pub material_id: i32,
    pub vertices: Vec<MshVertex>,
    pub faces: Vec<MshFace>,
}

/// 解码后的 MSH 文档
#[derive(Debug, Clone)]
pub struct MshFile {
    pub root_bones: Vec<BoneNode>,
    pub sub_meshes: Vec<MshMesh>,
}
