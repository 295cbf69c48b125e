//! 成员（侠客）数据模型

use crate::orz2::types::vec_or_null;
use serde::{Deserialize, Serialize};

/// 背包物品详情
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackpackItemDetail {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
}

/// 背包物品：纯字符串或详情对象两种写法并存
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BackpackItem {
    Plain(String),
    Detail(BackpackItemDetail),
}

/// 好友条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendItem {
    #[serde(rename = "nickName")]
    pub nick_name: String,
    #[serde(default)]
    pub friendliness: i64,
    #[serde(default)]
    pub description: Option<String>,
}

/// 成员列表条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberListItem {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "sys_createTime", default)]
    pub create_time: Option<String>,
    #[serde(rename = "sys_updateTime", default)]
    pub update_time: Option<String>,
    #[serde(rename = "user_nickName")]
    pub nick_name: String,
    #[serde(rename = "user_avatarUrl", default)]
    pub avatar_url: String,
    #[serde(rename = "user_level", default)]
    pub level: i64,
    #[serde(rename = "user_exp", default)]
    pub exp: Option<i64>,
    #[serde(rename = "user_title", default)]
    pub title: Option<String>,
    #[serde(rename = "user_introduction", default)]
    pub introduction: Option<String>,
    #[serde(rename = "user_soul", default)]
    pub soul: Option<String>,
    #[serde(rename = "user_memory", default)]
    pub memory: Option<String>,
    #[serde(rename = "user_personality", default)]
    pub personality: Option<String>,
    #[serde(rename = "user_health", default)]
    pub health: Option<i64>,
    #[serde(rename = "user_backpack", default, deserialize_with = "vec_or_null")]
    pub backpack: Vec<BackpackItem>,
    #[serde(rename = "user_friendsList", default, deserialize_with = "vec_or_null")]
    pub friends_list: Vec<FriendItem>,
    #[serde(rename = "user_city", default)]
    pub city: Option<String>,
    /// agent | human，用于头像边框展示
    #[serde(rename = "identity_mode", default)]
    pub identity_mode: Option<String>,
}

/// 成员详情（单查 / 注册返回，含私有令牌与指纹）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberInfo {
    #[serde(rename = "_id")]
    pub id: String,
    /// 私有访问令牌，仅注册 / token 查询时下发
    #[serde(rename = "identity_token", default)]
    pub identity_token: String,
    /// 令牌的 md5 摘要，用于与本地指纹做相等比较
    #[serde(rename = "identity_hash", default)]
    pub identity_hash: String,
    #[serde(rename = "sys_createTime", default)]
    pub create_time: Option<String>,
    #[serde(rename = "sys_updateTime", default)]
    pub update_time: Option<String>,
    #[serde(rename = "user_nickName")]
    pub nick_name: String,
    #[serde(rename = "user_avatarUrl", default)]
    pub avatar_url: String,
    #[serde(rename = "user_level", default)]
    pub level: i64,
    #[serde(rename = "user_exp", default)]
    pub exp: i64,
    #[serde(rename = "user_backpack", default, deserialize_with = "vec_or_null")]
    pub backpack: Vec<BackpackItem>,
    #[serde(rename = "user_introduction", default)]
    pub introduction: Option<String>,
    #[serde(rename = "user_soul", default)]
    pub soul: Option<String>,
    #[serde(rename = "user_memory", default)]
    pub memory: Option<String>,
    #[serde(rename = "user_personality", default)]
    pub personality: Option<String>,
    #[serde(rename = "user_health", default)]
    pub health: Option<i64>,
    #[serde(rename = "user_friendsList", default, deserialize_with = "vec_or_null")]
    pub friends_list: Vec<FriendItem>,
    #[serde(rename = "user_city", default)]
    pub city: Option<String>,
    #[serde(rename = "identity_mode", default)]
    pub identity_mode: Option<String>,
}

/// 排行榜条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopRankItem {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "user_nickName")]
    pub nick_name: String,
    #[serde(rename = "user_avatarUrl", default)]
    pub avatar_url: String,
    #[serde(rename = "user_level", default)]
    pub level: i64,
    #[serde(rename = "user_title", default)]
    pub title: Option<String>,
    #[serde(rename = "user_introduction", default)]
    pub introduction: Option<String>,
    #[serde(rename = "user_exp", default)]
    pub exp: Option<i64>,
    #[serde(rename = "identity_mode", default)]
    pub identity_mode: Option<String>,
    #[serde(rename = "identity_hash", default)]
    pub identity_hash: Option<String>,
}

/// 成员汇总信息 body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberSummaryBody {
    #[serde(rename = "totalCount", default)]
    pub total_count: u64,
    #[serde(rename = "topRankList", default, deserialize_with = "vec_or_null")]
    pub top_rank_list: Vec<TopRankItem>,
    #[serde(rename = "latestRegisterTime", default)]
    pub latest_register_time: Option<String>,
}

/// 注册（下山）响应 body
#[derive(Debug, Clone, Deserialize)]
pub struct LoginBody {
    #[serde(rename = "memberInfo", default)]
    pub member_info: Option<MemberInfo>,
    #[serde(rename = "memberUrl", default)]
    pub member_url: Option<String>,
    /// 注册同时落下的"初入江湖"故事
    #[serde(rename = "storyInfo", default)]
    pub story_info: Option<crate::orz2::story::models::StoryItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backpack_item_accepts_both_shapes() {
        let items: Vec<BackpackItem> =
            serde_json::from_str(r#"["铁剑", {"name": "丹药", "description": "回血"}]"#).unwrap();
        assert!(matches!(&items[0], BackpackItem::Plain(s) if s == "铁剑"));
        assert!(matches!(&items[1], BackpackItem::Detail(d) if d.name.as_deref() == Some("丹药")));
    }

    #[test]
    fn member_info_decodes_identity_fields() {
        let json = r#"{
            "_id": "m1",
            "identity_token": "tok-abc",
            "identity_hash": "900150983cd24fb0d6963f7d28e17f72",
            "user_nickName": "无名",
            "user_level": 3,
            "user_exp": 120,
            "user_backpack": null
        }"#;
        let info: MemberInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.identity_token, "tok-abc");
        assert!(info.backpack.is_empty());
        assert_eq!(info.level, 3);
    }
}
