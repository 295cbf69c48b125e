//! 成员 HTTP API 客户端
//!
//! 负责成员汇总 / 列表 / 单查与注册（下山）的 HTTP 请求

use crate::orz2::error::Orz2Error;
use crate::orz2::member::models::{LoginBody, MemberInfo, MemberListItem, MemberSummaryBody};
use crate::orz2::types::{ApiEnvelope, PageBody};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, info};
use uuid::Uuid;

/// 成员分页数据源（名册控制器的注入点）
#[async_trait]
pub trait MemberPageSource: Send + Sync {
    async fn fetch_page(
        &self,
        page_num: u32,
        page_size: u32,
    ) -> Result<PageBody<MemberListItem>, Orz2Error>;
}

/// 成员目录（身份缓存的注入点：注册与按 token 单查）
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    /// 提交昵称注册（下山），token 埋在返回的 memberInfo 里
    async fn login_member(&self, nick_name: &str) -> Result<LoginBody, Orz2Error>;

    /// 按私有令牌查成员；令牌不再有效时返回 `Ok(None)`
    async fn member_by_token(&self, token: &str) -> Result<Option<MemberInfo>, Orz2Error>;
}

/// 成员相关的 HTTP API 客户端
pub struct MemberApi {
    client: reqwest::Client,
    api_base_url: String,
}

#[derive(Debug, Deserialize)]
struct MemberInfoBody {
    #[serde(rename = "memberInfo", default)]
    member_info: Option<MemberInfo>,
}

impl MemberApi {
    pub fn new(client: reqwest::Client, api_base_url: String) -> Self {
        Self {
            client,
            api_base_url,
        }
    }

    /// 获取成员汇总信息（总数、排行榜、最近注册时间）
    pub async fn get_member_summary(&self) -> Result<MemberSummaryBody, Orz2Error> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/member/getQueryMemberSummary", self.api_base_url);

        info!("[MemberAPI] 📡 请求成员汇总");
        debug!("[MemberAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .get(&url)
            .header("operationID", &operation_id)
            .send()
            .await?;

        let envelope: ApiEnvelope<MemberSummaryBody> = response.json().await.map_err(|e| {
            error!("[MemberAPI] 成员汇总响应解析失败: {:?}", e);
            Orz2Error::Malformed(format!("成员汇总响应解析失败: {e}"))
        })?;
        let body = envelope.into_body()?;

        info!(
            "[MemberAPI] ✅ 成员汇总响应 totalCount={}, 榜单条目: {}",
            body.total_count,
            body.top_rank_list.len()
        );
        Ok(body)
    }

    /// 按 id 查成员详情（不存在时返回 None）
    pub async fn get_member_info_by_id(&self, id: &str) -> Result<Option<MemberInfo>, Orz2Error> {
        self.get_member_info(&[("id", id)]).await
    }

    async fn get_member_info(
        &self,
        query: &[(&str, &str)],
    ) -> Result<Option<MemberInfo>, Orz2Error> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/member/getQueryMemberInfo", self.api_base_url);

        info!("[MemberAPI] 📡 请求成员详情");
        debug!("[MemberAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .get(&url)
            .header("operationID", &operation_id)
            .query(query)
            .send()
            .await?;

        let envelope: ApiEnvelope<MemberInfoBody> = response.json().await.map_err(|e| {
            error!("[MemberAPI] 成员详情响应解析失败: {:?}", e);
            Orz2Error::Malformed(format!("成员详情响应解析失败: {e}"))
        })?;

        // 单查允许 code != 200（如令牌失效），折叠为 None 交由上层处置
        match envelope.into_body() {
            Ok(body) => Ok(body.member_info),
            Err(Orz2Error::Api { code }) => {
                debug!("[MemberAPI] 成员详情业务码非 200: {}", code);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl MemberPageSource for MemberApi {
    async fn fetch_page(
        &self,
        page_num: u32,
        page_size: u32,
    ) -> Result<PageBody<MemberListItem>, Orz2Error> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/member/getQueryMemberList", self.api_base_url);

        info!(
            "[MemberAPI] 📡 请求成员列表 pageNum={}, pageSize={}",
            page_num, page_size
        );
        debug!("[MemberAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .get(&url)
            .header("operationID", &operation_id)
            .query(&[
                ("pageNum", page_num.to_string()),
                ("pageSize", page_size.to_string()),
            ])
            .send()
            .await?;

        let envelope: ApiEnvelope<PageBody<MemberListItem>> =
            response.json().await.map_err(|e| {
                error!("[MemberAPI] 成员列表响应解析失败: {:?}", e);
                Orz2Error::Malformed(format!("成员列表响应解析失败: {e}"))
            })?;
        let page = envelope.into_body()?;

        info!(
            "[MemberAPI] ✅ 成员列表响应 pageNum={}, 条目数: {}, totalCount={}",
            page.page_num,
            page.list.len(),
            page.total_count
        );
        Ok(page)
    }
}

#[async_trait]
impl MemberDirectory for MemberApi {
    async fn login_member(&self, nick_name: &str) -> Result<LoginBody, Orz2Error> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/member/postLoginMemberInfo", self.api_base_url);

        info!("[MemberAPI] 📡 提交注册（下山）nickName={}", nick_name);
        debug!("[MemberAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("operationID", &operation_id)
            .header("mode", "human")
            .json(&serde_json::json!({ "nickName": nick_name }))
            .send()
            .await?;

        let envelope: ApiEnvelope<LoginBody> = response.json().await.map_err(|e| {
            error!("[MemberAPI] 注册响应解析失败: {:?}", e);
            Orz2Error::Malformed(format!("注册响应解析失败: {e}"))
        })?;
        let body = envelope.into_body()?;

        info!("[MemberAPI] ✅ 注册成功，memberUrl={:?}", body.member_url);
        Ok(body)
    }

    async fn member_by_token(&self, token: &str) -> Result<Option<MemberInfo>, Orz2Error> {
        self.get_member_info(&[("token", token)]).await
    }
}
