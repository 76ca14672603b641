//! GameBox 资产引擎 - GameBox 二进制资产解码与骨骼动画运行时
//!
//! 功能：
//! - CVD 动画模型解析
//! - LGT 灯光列表解析
//! - MOV 骨骼动画解析
//! - MSH 网格/骨骼层级解析
//! - SCN 场景描述解析
//! - 骨骼姿态求值与顶点蒙皮
//! - 动画播放状态机

pub mod animation;
pub mod cvd;
pub mod gamebox;
pub mod lgt;
pub mod mov;
pub mod msh;
pub mod reader;
pub mod scn;
pub mod skeleton;

pub use animation::{AnimationPlayer, CancellationToken, LoopMode, PlaybackState};
pub use cvd::CvdFile;
pub use lgt::LgtFile;
pub use mov::MovFile;
pub use msh::MshFile;
pub use reader::ByteReader;
pub use scn::{ScnFile, ScnFormatVariant};
pub use skeleton::Skeleton;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 文件头或版本号不合法，整个解码中止
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// 计数、偏移或递归深度与数据不一致，整个解码中止
    #[error("malformed structure: {0}")]
    MalformedStructure(String),

    /// 枚举标签没有已知映射
    #[error("unsupported variant: {0}")]
    UnsupportedVariant(String),

    /// 姿态求值/播放契约违规（绑定缺失等）
    #[error("animation error: {0}")]
    Animation(String),
}

pub type Result<T> = std::result::Result<T, AssetError>;
