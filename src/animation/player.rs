//! 骨骼动画播放器

use crate::gamebox;
use crate::mov::MovFile;
use crate::msh::MshFile;
use crate::skeleton::skinning::{self, RenderBuffers};
use crate::skeleton::Skeleton;
use crate::Result;

use super::{CancellationToken, LoopMode, PlaybackState};

/// 骨骼动画播放器
///
/// 持有骨架、网格与逐子网格的渲染缓冲。`play` 不可重入：再次调用
/// 先取消上一次播放再重新绑定。
pub struct AnimationPlayer {
    skeleton: Skeleton,
    mesh: MshFile,
    buffers: Vec<RenderBuffers>,
    motion: Option<MovFile>,
    token: CancellationToken,
    state: PlaybackState,
    loop_mode: LoopMode,
    /// Count 模式下剩余的迭代次数（含当前迭代）
    remaining_loops: u32,
    /// 当前迭代的起始时钟（秒）；首帧 update 时填入
    iteration_start: Option<f32>,
}

impl AnimationPlayer {
    /// 用 MSH 文档构建播放器，骨架与顶点绑定在此校验
    pub fn new(mesh: MshFile) -> Result<Self> {
        let skeleton = Skeleton::from_msh(&mesh)?;
        Ok(Self {
            skeleton,
            mesh,
            buffers: Vec::new(),
            motion: None,
            token: CancellationToken::new(),
            state: PlaybackState::Idle,
            loop_mode: LoopMode::Infinite,
            remaining_loops: 0,
            iteration_start: None,
        })
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// 当前取消令牌；宿主可克隆后在别处取消
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// 最近一次 `update` 产出的渲染缓冲，逐子网格
    pub fn render_buffers(&self) -> &[RenderBuffers] {
        &self.buffers
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// 开始播放；取消上一次播放并重新绑定轨道
    pub fn play(&mut self, motion: MovFile, loop_mode: LoopMode) {
        self.token.cancel();
        self.token = CancellationToken::new();

        self.skeleton.bind_tracks(&motion);
        self.motion = Some(motion);
        self.loop_mode = loop_mode;
        self.remaining_loops = match loop_mode {
            LoopMode::Infinite => 0,
            LoopMode::Count(n) => n,
        };
        self.iteration_start = None;
        self.state = if matches!(loop_mode, LoopMode::Count(0)) {
            PlaybackState::Stopped
        } else {
            PlaybackState::Playing
        };
    }

    /// 每帧调用一次，喂入宿主时钟（秒）
    ///
    /// 取消在每帧入口判定：已取消则直接停止，不再求值。tick 越过动画
    /// 时长即迭代结束，循环计数在边界判定，继续播放则时钟回到 tick 0。
    pub fn update(&mut self, now_seconds: f32) -> Result<()> {
        if self.state != PlaybackState::Playing {
            return Ok(());
        }
        if self.token.is_cancelled() {
            self.state = PlaybackState::Stopped;
            return Ok(());
        }
        let duration = match &self.motion {
            Some(motion) => motion.duration,
            None => return Ok(()),
        };

        let start = *self.iteration_start.get_or_insert(now_seconds);
        let mut tick = gamebox::seconds_to_tick(now_seconds - start);

        if tick >= duration {
            if !self.advance_loop() {
                self.state = PlaybackState::Stopped;
                return Ok(());
            }
            self.iteration_start = Some(now_seconds);
            tick = 0;
        }

        self.skeleton.update_pose(tick);
        self.buffers.clear();
        for sub_mesh in &self.mesh.sub_meshes {
            self.buffers.push(skinning::skin_mesh(&self.skeleton, sub_mesh)?);
        }
        Ok(())
    }

    /// 进入下一次迭代；返回 false 表示循环耗尽
    fn advance_loop(&mut self) -> bool {
        match self.loop_mode {
            LoopMode::Infinite => true,
            LoopMode::Count(_) => {
                self.remaining_loops = self.remaining_loops.saturating_sub(1);
                self.remaining_loops > 0
            }
        }
    }

    /// 停止播放并释放姿态相关状态
    pub fn dispose(&mut self) {
        // 先取消再清空缓冲，保证外部克隆的令牌观察到停止
        self.token.cancel();
        self.state = PlaybackState::Stopped;
        self.motion = None;
        self.buffers.clear();
    }
}

impl Drop for AnimationPlayer {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
