//! 通用接口信封与分页类型
//!
//! 后端所有接口返回 `{ code, body }` 形式的 JSON 信封：HTTP 状态码恒为 200，
//! 业务成功与否由信封内 `code == 200` 表示。

use crate::orz2::error::Orz2Error;
use serde::{Deserialize, Deserializer};

/// 业务成功的信封码
pub const API_CODE_OK: i64 = 200;

/// 统一响应信封
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    pub code: i64,
    #[serde(default)]
    pub body: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// 拆开信封：业务码非 200 视为 [`Orz2Error::Api`]，body 缺失视为 [`Orz2Error::Malformed`]
    pub fn into_body(self) -> Result<T, Orz2Error> {
        if self.code != API_CODE_OK {
            return Err(Orz2Error::Api { code: self.code });
        }
        self.body
            .ok_or_else(|| Orz2Error::Malformed("响应中缺少 body 字段".to_string()))
    }
}

/// 分页响应 body（成员列表与故事列表共用）
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct PageBody<T> {
    #[serde(rename = "pageNum", default)]
    pub page_num: u32,
    #[serde(rename = "pageSize", default)]
    pub page_size: u32,
    #[serde(rename = "totalCount", default)]
    pub total_count: u64,
    #[serde(default, deserialize_with = "vec_or_null")]
    pub list: Vec<T>,
}

/// 将 `null` 的数组字段反序列化为空 Vec（后端在空结果时可能返回 null）
pub fn vec_or_null<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let opt: Option<Vec<T>> = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}
