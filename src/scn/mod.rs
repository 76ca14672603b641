//! SCN 场景描述
//!
//! 平铺的定长记录：场景信息 + NPC 表 + 场景物件表。除包围盒外所有
//! 数值保留 GameBox 原始值，由场景组装层按需转换。
//!
//! 同一格式存在两个构建变体（物件记录字段存在性/宽度不同），两种布局
//! 无法从头部字节自辨，由调用方显式指定 [`ScnFormatVariant`]。

mod reader;

pub use reader::read;

use glam::Vec3;

/// 物件记录的构建变体
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScnFormatVariant {
    /// 参数块为 6 个 i32，无扩展字段
    Base,
    /// 参数块为 6 个 f32（取整存储），携带扩展字段
    Extended,
}

/// 路径点：固定容量 16，显式数量字段
#[derive(Debug, Clone)]
pub struct ScnPath {
    pub number_of_waypoints: i32,
    /// GameBox 原始坐标
    pub waypoints: [Vec3; 16],
}

/// 瓦片地图上的触发矩形
#[derive(Debug, Clone, Copy)]
pub struct GbRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// 轴对齐包围盒（引擎空间）
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

/// 场景信息记录
#[derive(Debug, Clone)]
pub struct ScnSceneInfo {
    pub city_name: String,
    pub scene_name: String,
    pub model: String,
    pub scene_type: i32,
    pub light_map: i32,
    pub sky_box: u32,
    pub reserved: [u32; 6],
}

/// NPC 记录，字段布局与磁盘一致
#[derive(Debug, Clone)]
pub struct ScnNpcInfo {
    pub id: u8,
    pub actor_type: u8,
    pub name: String,
    pub texture: String,
    pub facing_direction: f32,
    pub layer_index: i32,
    pub gamebox_x_position: f32,
    pub gamebox_z_position: f32,
    pub init_active: i32,
    pub init_behaviour: i32,
    pub script_id: u32,
    pub gamebox_y_position: f32,
    pub init_action: String,
    pub monster_ids: [u32; 3],
    pub number_of_monsters: u8,
    pub monster_can_respawn: u8,
    /// 对齐填充，原样保留以便逐字节回写
    pub padding_bytes: [u8; 2],
    pub path: ScnPath,
    pub no_turn: u32,
    pub loop_action: u32,
    pub gamebox_move_speed: u32,
    pub reserved: [u32; 29],
}

/// 场景物件记录；`Option` 字段仅在 Extended 变体存在
#[derive(Debug, Clone)]
pub struct ScnObjectInfo {
    pub id: u8,
    pub init_active: u8,
    pub times: u8,
    pub switch_state: u8,
    pub name: String,
    pub trigger_type: u8,
    pub is_non_blocking: u8,
    pub gamebox_position: Vec3,
    pub gamebox_y_rotation: f32,
    pub tile_map_trigger_rect: GbRect,
    pub object_type: u8,
    pub save_state: u8,
    pub layer_index: u8,
    pub element_type: u8,
    pub parameters: [i32; 6],
    pub not_used: Option<u32>,
    pub require_special_action: u8,
    pub require_item: u16,
    pub require_money: u16,
    pub require_level: u16,
    pub require_attack_value: u16,
    pub require_all_mechanisms_solved: u8,
    pub failed_message: String,
    pub linked_object_group_id: Option<u16>,
    pub script_id: u32,
    pub path: ScnPath,
    pub linked_object_id: u16,
    pub dependent_scene_name: String,
    pub dependent_object_id: u8,
    pub bounds: Aabb,
    pub gamebox_x_rotation: f32,
    pub gamebox_z_rotation: Option<f32>,
    pub sfx_name: String,
    pub effect_model_type: u32,
    pub script_activated: u32,
    pub script_moved: u32,
    pub can_only_be_triggered_once: Option<u32>,
    /// Base 变体 52 个，Extended 变体 44 个
    pub reserved: Vec<u32>,
}

/// 解码后的 SCN 文档
#[derive(Debug, Clone)]
pub struct ScnFile {
    pub variant: ScnFormatVariant,
    pub version: i16,
    pub scene_info: ScnSceneInfo,
    pub npc_infos: Vec<ScnNpcInfo>,
    pub object_infos: Vec<ScnObjectInfo>,
}
