//! 骨骼姿态求值与顶点蒙皮
//!
//! [`Skeleton`] 把 MSH 文件中的递归骨骼树压平为索引数组（arena），
//! 动画轨道按骨骼 id 绑定。姿态求值对绑定了轨道的骨骼做向下取整
//! 查找（不插值，沿用原实现的已知简化），矩阵沿树自上而下累乘。

pub mod skinning;

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};

use crate::mov::{MovBoneTrack, MovFile};
use crate::msh::{BoneNode, MshFile, ROOT_PARENT_ID};
use crate::{AssetError, Result};

/// arena 中的一根骨骼
#[derive(Debug, Clone)]
pub struct Bone {
    pub id: i32,
    pub name: String,
    /// 父骨骼的 arena 索引；根骨骼为 `None`
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// 绑定姿态本地平移（引擎空间）
    pub translation: Vec3,
    /// 绑定姿态本地旋转（引擎空间）
    pub rotation: Quat,
    /// 模型空间 → 骨骼空间（绑定姿态逆变换）
    pub bind_pose_model_to_bone: Mat4,
    /// 当前姿态：骨骼空间 → 模型空间
    pub current_pose: Mat4,
    /// 绑定的动画轨道；未绑定骨骼保持绑定姿态
    track: Option<MovBoneTrack>,
}

impl Bone {
    fn from_node(node: &BoneNode, parent: Option<usize>, parent_bind: Mat4) -> Self {
        // 绑定姿态逆变换自根向下累乘：inv(R) * inv(T) * parent_bind
        let bind = Mat4::from_quat(node.rotation.inverse())
            * Mat4::from_translation(-node.translation)
            * parent_bind;
        Bone {
            id: node.id,
            name: node.name.clone(),
            parent,
            children: Vec::new(),
            translation: node.translation,
            rotation: node.rotation,
            bind_pose_model_to_bone: bind,
            current_pose: Mat4::IDENTITY,
            track: None,
        }
    }
}

/// 压平的骨骼层级
#[derive(Debug, Clone)]
pub struct Skeleton {
    bones: Vec<Bone>,
    id_to_index: HashMap<i32, usize>,
    roots: Vec<usize>,
}

impl Skeleton {
    /// 从 MSH 骨骼树构建 arena，并校验网格顶点的骨骼绑定
    ///
    /// 骨骼 id 重复视为结构损坏；顶点引用不存在的骨骼 id 视为
    /// 播放契约违规。
    pub fn from_msh(msh: &MshFile) -> Result<Self> {
        let mut skeleton = Skeleton {
            bones: Vec::new(),
            id_to_index: HashMap::new(),
            roots: Vec::new(),
        };

        for root in &msh.root_bones {
            if root.parent_id != ROOT_PARENT_ID {
                return Err(AssetError::MalformedStructure(format!(
                    "root bone {} has parent id {}",
                    root.id, root.parent_id
                )));
            }
            let index = skeleton.insert_subtree(root, None, Mat4::IDENTITY)?;
            skeleton.roots.push(index);
        }

        for sub_mesh in &msh.sub_meshes {
            for vertex in &sub_mesh.vertices {
                if !skeleton.id_to_index.contains_key(&vertex.bone_id) {
                    return Err(AssetError::Animation(format!(
                        "vertex bound to unknown bone id {}",
                        vertex.bone_id
                    )));
                }
            }
        }

        Ok(skeleton)
    }

    fn insert_subtree(
        &mut self,
        node: &BoneNode,
        parent: Option<usize>,
        parent_bind: Mat4,
    ) -> Result<usize> {
        let index = self.bones.len();
        if self.id_to_index.insert(node.id, index).is_some() {
            return Err(AssetError::MalformedStructure(format!(
                "duplicate bone id {}",
                node.id
            )));
        }
        self.bones.push(Bone::from_node(node, parent, parent_bind));
        let bind = self.bones[index].bind_pose_model_to_bone;

        for child in &node.children {
            let child_index = self.insert_subtree(child, Some(index), bind)?;
            self.bones[index].children.push(child_index);
        }
        Ok(index)
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn bone_by_id(&self, id: i32) -> Option<&Bone> {
        self.id_to_index.get(&id).map(|&index| &self.bones[index])
    }

    /// 按骨骼 id 绑定动画轨道
    ///
    /// 重新绑定会先清掉旧轨道并把所有姿态矩阵复位为单位矩阵。
    /// 找不到对应骨骼的轨道跳过并记日志。
    pub fn bind_tracks(&mut self, mov: &MovFile) {
        for bone in self.bones.iter_mut() {
            bone.track = None;
            bone.current_pose = Mat4::IDENTITY;
        }
        for track in &mov.bone_tracks {
            match self.id_to_index.get(&track.bone_id) {
                Some(&index) => self.bones[index].track = Some(track.clone()),
                None => {
                    log::warn!(
                        "animation track for bone {} ({}) has no skeleton bone, skipped",
                        track.bone_id,
                        track.bone_name
                    );
                }
            }
        }
    }

    /// 求指定 tick 的姿态，深度优先自根向下
    pub fn update_pose(&mut self, tick: u32) {
        for i in 0..self.roots.len() {
            let root = self.roots[i];
            self.update_bone(root, tick, Mat4::IDENTITY);
        }
    }

    fn update_bone(&mut self, index: usize, tick: u32, parent_pose: Mat4) {
        let bone = &mut self.bones[index];

        let (translation, rotation) = match key_frame_at(bone.track.as_ref(), tick) {
            Some(frame) => frame,
            None => (bone.translation, bone.rotation),
        };
        let local = Mat4::from_translation(translation) * Mat4::from_quat(rotation);
        let pose = parent_pose * local;
        bone.current_pose = pose;

        // 子骨骼在自身之后更新，保证读到最新的父姿态
        let children = self.bones[index].children.clone();
        for child in children {
            self.update_bone(child, tick, pose);
        }
    }
}

/// 向下取整查找：时间不超过查询 tick 的最后一个关键帧
fn key_frame_at(track: Option<&MovBoneTrack>, tick: u32) -> Option<(Vec3, Quat)> {
    let track = track?;
    let mut found = None;
    for frame in &track.key_frames {
        if frame.tick > tick {
            break;
        }
        found = Some((frame.translation, frame.rotation));
    }
    found
}
