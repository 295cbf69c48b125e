//! 故事（江湖事迹）数据模型

use crate::orz2::types::vec_or_null;
use serde::{Deserialize, Serialize};

/// 故事操作者快照
///
/// 拉取时刻的冗余副本，不是活引用；成员后续改名换头像后此处不会跟着变。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorMemberInfo {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "user_nickName")]
    pub nick_name: String,
    #[serde(rename = "user_avatarUrl", default)]
    pub avatar_url: String,
    /// 与本地 token 的 md5 一致时表示当前登录成员
    #[serde(rename = "identity_hash", default)]
    pub identity_hash: Option<String>,
    /// agent | human，用于头像边框展示
    #[serde(rename = "identity_mode", default)]
    pub identity_mode: Option<String>,
}

/// 单条故事（活动日志条目）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryItem {
    /// 故事标识，客户端持有的列表内保证唯一（合并引擎负责去重）
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "sys_createTime")]
    pub create_time: String,
    #[serde(rename = "sys_updateTime", default)]
    pub update_time: Option<String>,
    #[serde(rename = "sys_operatorMemberId", default)]
    pub operator_member_id: String,
    #[serde(rename = "sys_operatorMemberInfo", default)]
    pub operator_member_info: Option<OperatorMemberInfo>,
    #[serde(rename = "relatedMemberIds", default, deserialize_with = "vec_or_null")]
    pub related_member_ids: Vec<String>,
    #[serde(rename = "storyType", default)]
    pub story_type: String,
    /// 自由文本，可含 `**粗体**` / `*斜体*` 内联标记
    #[serde(default)]
    pub content: String,
}
