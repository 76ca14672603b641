//! 动画播放状态机
//!
//! [`AnimationPlayer`] 持有骨架与网格，由宿主每帧喂入时钟。取消令牌
//! 在每帧入口检查：已开始的一帧骨骼遍历完整执行，下一帧立即停止。

mod player;

pub use player::AnimationPlayer;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 循环模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// 无限循环，直到取消
    Infinite,
    /// 播放固定次数后停止
    Count(u32),
}

/// 播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// 尚未绑定动画
    Idle,
    Playing,
    /// 播放完成或被取消
    Stopped,
}

/// 协作式取消令牌，克隆共享同一状态
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
