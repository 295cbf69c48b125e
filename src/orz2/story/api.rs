//! 故事 HTTP API 客户端
//!
//! 负责故事列表的分页请求

use crate::orz2::error::Orz2Error;
use crate::orz2::story::models::StoryItem;
use crate::orz2::types::{ApiEnvelope, PageBody};
use async_trait::async_trait;
use tracing::{debug, error, info};
use uuid::Uuid;

/// 故事分页数据源
///
/// 控制器只依赖这个口子，测试里用脚本化实现替代真实 HTTP。
#[async_trait]
pub trait StoryPageSource: Send + Sync {
    /// 拉取一页故事，`member_id` 为可选的成员过滤键
    async fn fetch_page(
        &self,
        page_num: u32,
        page_size: u32,
        member_id: Option<&str>,
    ) -> Result<PageBody<StoryItem>, Orz2Error>;
}

/// 故事相关的 HTTP API 客户端
pub struct StoryApi {
    client: reqwest::Client,
    api_base_url: String,
}

impl StoryApi {
    pub fn new(client: reqwest::Client, api_base_url: String) -> Self {
        Self {
            client,
            api_base_url,
        }
    }
}

#[async_trait]
impl StoryPageSource for StoryApi {
    async fn fetch_page(
        &self,
        page_num: u32,
        page_size: u32,
        member_id: Option<&str>,
    ) -> Result<PageBody<StoryItem>, Orz2Error> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/story/getQueryStoryList", self.api_base_url);

        info!(
            "[StoryAPI] 📡 请求故事列表 pageNum={}, pageSize={}, memberId={:?}",
            page_num, page_size, member_id
        );
        debug!("[StoryAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let mut query: Vec<(&str, String)> = vec![
            ("pageNum", page_num.to_string()),
            ("pageSize", page_size.to_string()),
        ];
        if let Some(id) = member_id {
            query.push(("memberId", id.to_string()));
        }

        let response = self
            .client
            .get(&url)
            .header("operationID", &operation_id)
            .query(&query)
            .send()
            .await?;

        let envelope: ApiEnvelope<PageBody<StoryItem>> = response.json().await.map_err(|e| {
            error!("[StoryAPI] 故事列表响应解析失败: {:?}", e);
            Orz2Error::Malformed(format!("故事列表响应解析失败: {e}"))
        })?;

        let page = envelope.into_body().map_err(|e| {
            error!("[StoryAPI] 故事列表业务失败: {}", e);
            e
        })?;

        info!(
            "[StoryAPI] ✅ 故事列表响应 pageNum={}, 条目数: {}, totalCount={}",
            page.page_num,
            page.list.len(),
            page.total_count
        );
        Ok(page)
    }
}
