//! 刚性蒙皮
//!
//! 每个顶点只受一根骨骼影响：`p' = current_pose * bind * vec4(p, 1)`，
//! 再做透视除法。顶点级计算用 rayon 并行。输出为逐面展开的渲染缓冲，
//! 绕序已反转供外部渲染器直接使用。

use glam::{Mat4, Vec3, Vec4};
use rayon::prelude::*;

use crate::gamebox;
use crate::msh::MshMesh;
use crate::{AssetError, Result};

use super::Skeleton;

/// 逐面展开的渲染缓冲，长度均为 3 × 三角形数
#[derive(Debug, Clone, Default)]
pub struct RenderBuffers {
    pub positions: Vec<Vec3>,
    pub uvs: Vec<[f32; 2]>,
}

/// 用当前姿态对一个子网格蒙皮
///
/// 骨骼查不到时返回 `Animation` 错误（网格与骨架不配套）。
pub fn skin_mesh(skeleton: &Skeleton, mesh: &MshMesh) -> Result<RenderBuffers> {
    // 先算好每个顶点的 骨骼空间→模型空间 复合矩阵，蒙皮循环内零查找
    let matrices: Vec<Mat4> = mesh
        .vertices
        .iter()
        .map(|vertex| {
            skeleton
                .bone_by_id(vertex.bone_id)
                .map(|bone| bone.current_pose * bone.bind_pose_model_to_bone)
                .ok_or_else(|| {
                    AssetError::Animation(format!(
                        "vertex bound to unknown bone id {}",
                        vertex.bone_id
                    ))
                })
        })
        .collect::<Result<_>>()?;

    let skinned: Vec<Vec3> = mesh
        .vertices
        .par_iter()
        .zip(matrices.par_iter())
        .map(|(vertex, matrix)| {
            let p = *matrix * Vec4::new(vertex.position.x, vertex.position.y, vertex.position.z, 1.0);
            Vec3::new(p.x / p.w, p.y / p.w, p.z / p.w)
        })
        .collect();

    // 逐面展开并反转绕序
    let mut corners: Vec<(u16, [f32; 2])> = Vec::with_capacity(mesh.faces.len() * 3);
    for face in &mesh.faces {
        for corner in 0..3 {
            corners.push((face.indices[corner], face.uvs[corner]));
        }
    }
    gamebox::reverse_winding(&mut corners);

    let mut buffers = RenderBuffers {
        positions: Vec::with_capacity(corners.len()),
        uvs: Vec::with_capacity(corners.len()),
    };
    for (index, uv) in corners {
        buffers.positions.push(skinned[index as usize]);
        buffers.uvs.push(uv);
    }
    Ok(buffers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mov;
    use crate::msh;
    use crate::msh::reader::tests::{build_msh, BoneSpec};

    fn skinned_model() -> (Skeleton, msh::MshFile) {
        let root = BoneSpec {
            id: 0,
            name: "root",
            translation: [0.0; 3],
            children: vec![],
        };
        // 三个顶点全部绑定到根骨骼（GameBox 空间坐标）
        let msh = msh::read(
            &build_msh(
                &root,
                &[
                    ([20.0, 0.0, 0.0], 0),
                    ([0.0, 20.0, 0.0], 0),
                    ([0.0, 0.0, 20.0], 0),
                ],
            ),
            936,
        )
        .unwrap();
        let skeleton = Skeleton::from_msh(&msh).unwrap();
        (skeleton, msh)
    }

    #[test]
    fn test_bind_pose_skin_is_identity() {
        let (mut skeleton, msh) = skinned_model();
        skeleton.update_pose(0);
        let buffers = skin_mesh(&skeleton, &msh.sub_meshes[0]).unwrap();
        assert_eq!(buffers.positions.len(), 3);
        assert_eq!(buffers.uvs.len(), 3);
        // 无动画时蒙皮结果与绑定姿态位置一致；绕序反转后顶点顺序倒置
        let expected = [
            msh.sub_meshes[0].vertices[2].position,
            msh.sub_meshes[0].vertices[1].position,
            msh.sub_meshes[0].vertices[0].position,
        ];
        for (got, want) in buffers.positions.iter().zip(expected) {
            assert!((*got - want).length() < 1e-5);
        }
    }

    #[test]
    fn test_skin_follows_pose() {
        let (mut skeleton, msh) = skinned_model();
        // 根骨骼平移 (-1, 0, 0)（引擎空间，GameBox x=20）
        let frames: &[(f32, [f32; 3])] = &[(0.0, [20.0, 0.0, 0.0])];
        let mov_file = mov::read(&mov::reader::tests::minimal_mov(&[(0, "root", frames)]), 936)
            .unwrap();
        skeleton.bind_tracks(&mov_file);
        skeleton.update_pose(0);

        let buffers = skin_mesh(&skeleton, &msh.sub_meshes[0]).unwrap();
        let moved = msh.sub_meshes[0].vertices[0].position + Vec3::new(-1.0, 0.0, 0.0);
        assert!((buffers.positions[2] - moved).length() < 1e-5);
    }

    #[test]
    fn test_flattened_length_matches_faces() {
        let root = BoneSpec {
            id: 0,
            name: "root",
            translation: [0.0; 3],
            children: vec![],
        };
        let vertices: Vec<([f32; 3], i32)> = (0..6).map(|_| ([0.0; 3], 0)).collect();
        let msh = msh::read(&build_msh(&root, &vertices), 936).unwrap();
        let mut skeleton = Skeleton::from_msh(&msh).unwrap();
        skeleton.update_pose(0);
        let buffers = skin_mesh(&skeleton, &msh.sub_meshes[0]).unwrap();
        assert_eq!(msh.sub_meshes[0].faces.len(), 2);
        assert_eq!(buffers.positions.len(), 6);
    }
}
