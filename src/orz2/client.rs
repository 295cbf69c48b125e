//! Orz2 客户端门面
//!
//! 组装 HTTP 客户端、成员 / 故事 API、身份缓存，并负责创建各列表控制器。

use crate::orz2::error::Orz2Error;
use crate::orz2::identity::{FileTokenStore, IdentityVault};
use crate::orz2::member::api::{MemberApi, MemberDirectory};
use crate::orz2::member::models::{MemberInfo, MemberSummaryBody};
use crate::orz2::member::service::MemberRoster;
use crate::orz2::story::api::StoryApi;
use crate::orz2::story::listener::StoryFeedListener;
use crate::orz2::story::service::{
    StoryFeed, StoryFeedConfig, DEFAULT_LOAD_MORE_COOLDOWN, DEFAULT_PAGE_SIZE,
    DEFAULT_POLL_INTERVAL,
};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// 默认 API 根路径
pub const DEFAULT_API_BASE_URL: &str = "https://www.orz2.online/api/smart/v1";
/// 默认令牌落盘文件名（与 Web 端的 localStorage 键名保持一致）
pub const DEFAULT_TOKEN_FILE: &str = "orz2_member_token";

/// 客户端配置
#[derive(Clone, Debug)]
pub struct Orz2Config {
    /// API 根路径
    pub api_base_url: String,
    /// 列表每页条数
    pub page_size: u32,
    /// 故事流轮询间隔
    pub poll_interval: Duration,
    /// 加载更多冷却窗口
    pub load_more_cooldown: Duration,
    /// 身份令牌落盘路径
    pub token_path: PathBuf,
}

impl Default for Orz2Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            load_more_cooldown: DEFAULT_LOAD_MORE_COOLDOWN,
            token_path: PathBuf::from(DEFAULT_TOKEN_FILE),
        }
    }
}

/// Orz2 SDK 客户端
#[derive(Clone)]
pub struct Orz2Client {
    config: Orz2Config,
    member_api: Arc<MemberApi>,
    story_api: Arc<StoryApi>,
    identity: Arc<IdentityVault>,
}

impl Orz2Client {
    /// 创建客户端
    pub fn new(config: Orz2Config) -> Result<Self> {
        let http_client = reqwest::ClientBuilder::new()
            .build()
            .context("创建 HTTP 客户端失败")?;

        let member_api = Arc::new(MemberApi::new(
            http_client.clone(),
            config.api_base_url.clone(),
        ));
        let story_api = Arc::new(StoryApi::new(http_client, config.api_base_url.clone()));
        let identity = Arc::new(IdentityVault::new(
            Arc::new(FileTokenStore::new(config.token_path.clone())),
            member_api.clone() as Arc<dyn MemberDirectory>,
        ));

        info!("[Client] 🔗 Orz2 客户端就绪，API: {}", config.api_base_url);
        Ok(Self {
            config,
            member_api,
            story_api,
            identity,
        })
    }

    /// 身份缓存服务
    pub fn identity(&self) -> &IdentityVault {
        &self.identity
    }

    /// 获取成员汇总信息
    pub async fn member_summary(&self) -> Result<MemberSummaryBody, Orz2Error> {
        self.member_api.get_member_summary().await
    }

    /// 按 id 查成员详情
    pub async fn member_info(&self, id: &str) -> Result<Option<MemberInfo>, Orz2Error> {
        self.member_api.get_member_info_by_id(id).await
    }

    /// 创建故事流控制器（首页传 None，详情页传成员 ID）
    pub fn story_feed(&self, member_id: Option<String>) -> Arc<StoryFeed> {
        Arc::new(StoryFeed::new(
            self.story_api.clone(),
            self.feed_config(member_id),
        ))
    }

    /// 创建带监听器的故事流控制器
    pub fn story_feed_with_listener(
        &self,
        member_id: Option<String>,
        listener: Arc<dyn StoryFeedListener>,
    ) -> Arc<StoryFeed> {
        Arc::new(StoryFeed::with_listener(
            self.story_api.clone(),
            self.feed_config(member_id),
            listener,
        ))
    }

    /// 创建成员名册控制器
    pub fn member_roster(&self) -> Arc<MemberRoster> {
        Arc::new(MemberRoster::with_page_size(
            self.member_api.clone(),
            self.config.page_size,
        ))
    }

    fn feed_config(&self, member_id: Option<String>) -> StoryFeedConfig {
        StoryFeedConfig {
            page_size: self.config.page_size,
            poll_interval: self.config.poll_interval,
            load_more_cooldown: self.config.load_more_cooldown,
            member_id,
        }
    }
}
