//! 故事流控制器
//!
//! 每个列表实例一个控制器：持有页游标、总数与各类守卫，对外提供
//! 首载 / 轮询刷新（refresh）与加载更多（load_more）两条路径。
//! 刷新永远打第 0 页：首个成功响应整体替换列表（首屏），之后的响应走
//! 轮询前插合并；加载更多走尾部追加合并。两种合并都按 _id 去重，
//! 轮询与翻页允许同时在途，完成顺序不影响结果。

use crate::orz2::story::api::StoryPageSource;
use crate::orz2::story::listener::{EmptyStoryFeedListener, StoryFeedListener};
use crate::orz2::story::models::StoryItem;
use crate::orz2::sync::{merge_append, merge_prepend};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant};
use tracing::{debug, error, info, warn};

/// 默认分页大小
pub const DEFAULT_PAGE_SIZE: u32 = 15;
/// 默认轮询间隔
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
/// 加载更多冷却窗口，吸收触底哨兵的连续触发
pub const DEFAULT_LOAD_MORE_COOLDOWN: Duration = Duration::from_millis(600);

/// 故事流配置
#[derive(Clone, Debug)]
pub struct StoryFeedConfig {
    /// 每页条数
    pub page_size: u32,
    /// 轮询间隔
    pub poll_interval: Duration,
    /// 加载更多冷却窗口
    pub load_more_cooldown: Duration,
    /// 可选的成员过滤键（详情页传成员 ID，首页为 None）
    pub member_id: Option<String>,
}

impl Default for StoryFeedConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            load_more_cooldown: DEFAULT_LOAD_MORE_COOLDOWN,
            member_id: None,
        }
    }
}

/// 对渲染层暴露的只读快照
#[derive(Debug, Clone, Serialize)]
pub struct FeedSnapshot {
    pub items: Vec<StoryItem>,
    #[serde(rename = "totalCount")]
    pub total_count: u64,
    pub exhausted: bool,
    pub loading: bool,
    #[serde(rename = "loadingMore")]
    pub loading_more: bool,
    pub error: Option<String>,
}

/// 控制器内部状态，整体在一把锁下变更
struct FeedState {
    items: Vec<StoryItem>,
    page_num: u32,
    total_count: u64,
    exhausted: bool,
    /// 首屏一次性闩锁：区分"首次成功（整体替换）"与"后续轮询（前插合并）"
    initial_loaded: bool,
    loading: bool,
    loading_more: bool,
    last_load_more_done: Option<Instant>,
    error: Option<String>,
    member_id: Option<String>,
    /// 过滤键变更 / 复位的代际计数，在途响应回来后代际不符即丢弃
    epoch: u64,
}

impl FeedState {
    fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            items: self.items.clone(),
            total_count: self.total_count,
            exhausted: self.exhausted,
            loading: self.loading,
            loading_more: self.loading_more,
            error: self.error.clone(),
        }
    }
}

/// 故事流控制器
pub struct StoryFeed {
    config: StoryFeedConfig,
    source: Arc<dyn StoryPageSource>,
    listener: Arc<dyn StoryFeedListener>,
    state: Mutex<FeedState>,
    poll_handle: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl StoryFeed {
    /// 创建故事流控制器（使用默认空监听器）
    pub fn new(source: Arc<dyn StoryPageSource>, config: StoryFeedConfig) -> Self {
        Self::with_listener(source, config, Arc::new(EmptyStoryFeedListener))
    }

    /// 创建故事流控制器（带自定义监听器）
    pub fn with_listener(
        source: Arc<dyn StoryPageSource>,
        config: StoryFeedConfig,
        listener: Arc<dyn StoryFeedListener>,
    ) -> Self {
        let member_id = config.member_id.clone();
        Self {
            config,
            source,
            listener,
            state: Mutex::new(FeedState {
                items: Vec::new(),
                page_num: 0,
                total_count: 0,
                exhausted: false,
                initial_loaded: false,
                loading: false,
                loading_more: false,
                last_load_more_done: None,
                error: None,
                member_id,
                epoch: 0,
            }),
            poll_handle: std::sync::Mutex::new(None),
        }
    }

    /// 当前状态快照
    pub async fn snapshot(&self) -> FeedSnapshot {
        self.state.lock().await.snapshot()
    }

    /// 复位到新的过滤键：清空列表与游标，提升代际使在途响应作废
    pub async fn reset(&self, member_id: Option<String>) {
        let mut st = self.state.lock().await;
        st.epoch += 1;
        st.items.clear();
        st.page_num = 0;
        st.total_count = 0;
        st.exhausted = false;
        st.initial_loaded = false;
        st.loading = false;
        st.loading_more = false;
        st.last_load_more_done = None;
        st.error = None;
        st.member_id = member_id;
        info!("[StoryFeed] 🔄 已复位，memberId={:?}, epoch={}", st.member_id, st.epoch);
    }

    /// 刷新（首载与轮询共用）：拉第 0 页，首次成功整体替换，之后前插合并
    pub async fn refresh(&self) {
        let (epoch, member_id, first) = {
            let mut st = self.state.lock().await;
            let first = !st.initial_loaded;
            if first {
                st.loading = true;
            }
            (st.epoch, st.member_id.clone(), first)
        };

        debug!("[StoryFeed] 刷新 first={}, memberId={:?}", first, member_id);
        let result = self
            .source
            .fetch_page(0, self.config.page_size, member_id.as_deref())
            .await;

        let changed;
        let snapshot;
        {
            let mut st = self.state.lock().await;
            if st.epoch != epoch {
                debug!("[StoryFeed] 丢弃过期刷新响应 (epoch {} != {})", epoch, st.epoch);
                return;
            }
            match result {
                Ok(page) => {
                    let fetched = page.list.len();
                    if !st.initial_loaded {
                        st.initial_loaded = true;
                        st.items = page.list;
                        st.page_num = 0;
                        st.exhausted = fetched == 0 || fetched as u64 >= page.total_count;
                        st.error = None;
                        info!(
                            "[StoryFeed] ✅ 首载完成，条目数: {}, totalCount={}, exhausted={}",
                            fetched, page.total_count, st.exhausted
                        );
                    } else {
                        let existing = std::mem::take(&mut st.items);
                        let before = existing.len();
                        st.items = merge_prepend(existing, page.list, |s| s.id.clone());
                        let added = st.items.len() - before;
                        if added > 0 {
                            info!("[StoryFeed] 🆕 轮询合并新增 {} 条", added);
                        } else {
                            debug!("[StoryFeed] 轮询无新增");
                        }
                    }
                    st.total_count = page.total_count;
                    changed = true;
                }
                Err(e) => {
                    if !st.initial_loaded {
                        // 首载失败：清空并进入错误态，闩锁保持未置位，下个周期重试仍按首载处理
                        st.items.clear();
                        st.error = Some(e.to_string());
                        error!("[StoryFeed] ❌ 首载失败: {}", e);
                        changed = false;
                    } else {
                        // 轮询失败静默，等下个周期
                        warn!("[StoryFeed] 轮询失败（保持现有列表）: {}", e);
                        changed = false;
                    }
                }
            }
            st.loading = false;
            snapshot = st.snapshot();
        }

        if changed {
            if let Ok(json) = serde_json::to_string(&snapshot) {
                self.listener.on_feed_changed(json).await;
            }
        } else if let Some(msg) = snapshot.error {
            self.listener.on_feed_error(msg).await;
        }
    }

    /// 加载更多：游标 +1 拉下一页并尾部追加合并
    ///
    /// 已耗尽、已在途或处于冷却窗口内时直接返回，不发请求。
    pub async fn load_more(&self) {
        let (epoch, next_page, member_id) = {
            let mut st = self.state.lock().await;
            if !st.initial_loaded || st.exhausted || st.loading_more {
                debug!(
                    "[StoryFeed] 跳过加载更多 initial_loaded={}, exhausted={}, loading_more={}",
                    st.initial_loaded, st.exhausted, st.loading_more
                );
                return;
            }
            if let Some(done_at) = st.last_load_more_done {
                if done_at.elapsed() < self.config.load_more_cooldown {
                    debug!("[StoryFeed] 加载更多处于冷却窗口，忽略本次触发");
                    return;
                }
            }
            st.loading_more = true;
            (st.epoch, st.page_num + 1, st.member_id.clone())
        };

        info!("[StoryFeed] 📄 加载更多 pageNum={}", next_page);
        let result = self
            .source
            .fetch_page(next_page, self.config.page_size, member_id.as_deref())
            .await;

        let snapshot;
        let changed;
        {
            let mut st = self.state.lock().await;
            if st.epoch != epoch {
                debug!("[StoryFeed] 丢弃过期加载更多响应");
                return;
            }
            match result {
                Ok(page) => {
                    let fetched = page.list.len();
                    let existing = std::mem::take(&mut st.items);
                    st.items = merge_append(existing, page.list, |s| s.id.clone());
                    st.page_num = next_page;
                    st.total_count = page.total_count;
                    if fetched < self.config.page_size as usize
                        || fetched == 0
                        || page.total_count == 0
                    {
                        st.exhausted = true;
                        info!("[StoryFeed] ⏹ 已到末页，标记耗尽");
                    }
                    changed = true;
                }
                Err(e) => {
                    // 加载更多失败静默，保持现有列表，下次触发重试
                    warn!("[StoryFeed] 加载更多失败（保持现有列表）: {}", e);
                    changed = false;
                }
            }
            st.loading_more = false;
            st.last_load_more_done = Some(Instant::now());
            snapshot = st.snapshot();
        }

        if changed {
            if let Ok(json) = serde_json::to_string(&snapshot) {
                self.listener.on_feed_changed(json).await;
            }
        }
    }

    /// 启动轮询任务：立即刷新一次（首屏），之后按固定间隔刷新
    ///
    /// 轮询不受分页耗尽影响，新故事随时可能插到最前面。重复调用会先停掉旧任务。
    pub fn spawn_polling(self: &Arc<Self>) {
        self.stop_polling();
        let feed = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = interval(feed.config.poll_interval);
            loop {
                ticker.tick().await;
                feed.refresh().await;
            }
        });
        *self.poll_handle.lock().unwrap() = Some(handle);
        info!(
            "[StoryFeed] ⏰ 轮询已启动，间隔 {:?}",
            self.config.poll_interval
        );
    }

    /// 停止轮询任务（卸载时调用）
    pub fn stop_polling(&self) {
        if let Some(handle) = self.poll_handle.lock().unwrap().take() {
            handle.abort();
            info!("[StoryFeed] ⏹ 轮询已停止");
        }
    }
}

impl Drop for StoryFeed {
    fn drop(&mut self) {
        if let Some(handle) = self.poll_handle.lock().unwrap().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orz2::error::Orz2Error;
    use crate::orz2::types::PageBody;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn story(id: &str) -> StoryItem {
        StoryItem {
            id: id.to_string(),
            create_time: "2024-05-01T13:00:00+08:00".to_string(),
            update_time: None,
            operator_member_id: "m1".to_string(),
            operator_member_info: None,
            related_member_ids: Vec::new(),
            story_type: "WORLD_EXPLORE".to_string(),
            content: format!("故事 {id}"),
        }
    }

    fn page(ids: &[&str], total: u64) -> PageBody<StoryItem> {
        PageBody {
            page_num: 0,
            page_size: DEFAULT_PAGE_SIZE,
            total_count: total,
            list: ids.iter().map(|id| story(id)).collect(),
        }
    }

    fn ids(snapshot: &FeedSnapshot) -> Vec<String> {
        snapshot.items.iter().map(|s| s.id.clone()).collect()
    }

    /// 脚本化数据源：按调用顺序依次弹出预置响应，并计数
    struct ScriptedSource {
        responses: std::sync::Mutex<VecDeque<Result<PageBody<StoryItem>, Orz2Error>>>,
        calls: AtomicUsize,
        /// 置位时每次调用先等待放行，用于模拟在途请求
        gate: Option<Notify>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<PageBody<StoryItem>, Orz2Error>>) -> Arc<Self> {
            Arc::new(Self {
                responses: std::sync::Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
                gate: None,
            })
        }

        fn gated(responses: Vec<Result<PageBody<StoryItem>, Orz2Error>>) -> Arc<Self> {
            Arc::new(Self {
                responses: std::sync::Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
                gate: Some(Notify::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StoryPageSource for ScriptedSource {
        async fn fetch_page(
            &self,
            _page_num: u32,
            _page_size: u32,
            _member_id: Option<&str>,
        ) -> Result<PageBody<StoryItem>, Orz2Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(page(&[], 0)))
        }
    }

    fn ids_range(prefix: &str, from: usize, to: usize) -> Vec<String> {
        (from..to).map(|i| format!("{prefix}{i}")).collect()
    }

    fn page_of(ids: Vec<String>, total: u64) -> PageBody<StoryItem> {
        PageBody {
            page_num: 0,
            page_size: DEFAULT_PAGE_SIZE,
            total_count: total,
            list: ids.iter().map(|id| story(id)).collect(),
        }
    }

    #[tokio::test]
    async fn initial_load_replaces_list_and_records_total() {
        let source = ScriptedSource::new(vec![Ok(page_of(ids_range("s", 0, 15), 42))]);
        let feed = StoryFeed::new(source.clone(), StoryFeedConfig::default());

        feed.refresh().await;
        let snap = feed.snapshot().await;
        assert_eq!(snap.items.len(), 15);
        assert_eq!(snap.total_count, 42);
        assert!(!snap.exhausted);
        assert!(!snap.loading);
        assert!(snap.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn load_more_runs_to_exhaustion_on_short_page() {
        // 42 条：15 + 15 + 12，末页短于 pageSize 触发耗尽
        let source = ScriptedSource::new(vec![
            Ok(page_of(ids_range("s", 0, 15), 42)),
            Ok(page_of(ids_range("s", 15, 30), 42)),
            Ok(page_of(ids_range("s", 30, 42), 42)),
        ]);
        let feed = StoryFeed::new(source.clone(), StoryFeedConfig::default());

        feed.refresh().await;
        feed.load_more().await;
        assert_eq!(feed.snapshot().await.items.len(), 30);

        tokio::time::advance(Duration::from_millis(700)).await;
        feed.load_more().await;
        let snap = feed.snapshot().await;
        assert_eq!(snap.items.len(), 42);
        assert!(snap.exhausted);

        // 耗尽后再触发不再发请求
        tokio::time::advance(Duration::from_millis(700)).await;
        feed.load_more().await;
        assert_eq!(source.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn short_page_blocks_further_fetches() {
        // pageSize 15 只回 10 条，必须立即标记耗尽
        let source = ScriptedSource::new(vec![
            Ok(page_of(ids_range("s", 0, 15), 25)),
            Ok(page_of(ids_range("s", 15, 25), 25)),
        ]);
        let feed = StoryFeed::new(source.clone(), StoryFeedConfig::default());

        feed.refresh().await;
        feed.load_more().await;
        assert!(feed.snapshot().await.exhausted);

        tokio::time::advance(Duration::from_secs(1)).await;
        feed.load_more().await;
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_collapses_rapid_triggers_into_one_fetch() {
        let source = ScriptedSource::new(vec![
            Ok(page_of(ids_range("s", 0, 15), 60)),
            Ok(page_of(ids_range("s", 15, 30), 60)),
            Ok(page_of(ids_range("s", 30, 45), 60)),
        ]);
        let feed = StoryFeed::new(source.clone(), StoryFeedConfig::default());
        feed.refresh().await;

        // 冷却窗口内的第二次触发被吸收
        feed.load_more().await;
        feed.load_more().await;
        assert_eq!(source.call_count(), 2);
        assert_eq!(feed.snapshot().await.items.len(), 30);

        // 窗口过后恢复可用
        tokio::time::advance(Duration::from_millis(700)).await;
        feed.load_more().await;
        assert_eq!(source.call_count(), 3);
        assert_eq!(feed.snapshot().await.items.len(), 45);
    }

    #[tokio::test]
    async fn poll_merge_prepends_only_new_items() {
        let source = ScriptedSource::new(vec![
            Ok(page(&["1", "2", "3"], 3)),
            Ok(page(&["0", "1"], 4)),
        ]);
        let feed = StoryFeed::new(source.clone(), StoryFeedConfig::default());

        feed.refresh().await;
        feed.refresh().await;
        let snap = feed.snapshot().await;
        assert_eq!(ids(&snap), vec!["0", "1", "2", "3"]);
        assert_eq!(snap.total_count, 4);
    }

    #[tokio::test]
    async fn initial_failure_sets_error_then_next_tick_acts_as_first_load() {
        let source = ScriptedSource::new(vec![
            Err(Orz2Error::Api { code: 500 }),
            Ok(page(&["1", "2"], 2)),
        ]);
        let feed = StoryFeed::new(source.clone(), StoryFeedConfig::default());

        feed.refresh().await;
        let snap = feed.snapshot().await;
        assert!(snap.items.is_empty());
        assert!(snap.error.is_some());

        // 闩锁未置位，下个周期仍按首载整体替换
        feed.refresh().await;
        let snap = feed.snapshot().await;
        assert_eq!(snap.items.len(), 2);
        assert!(snap.error.is_none());
    }

    #[tokio::test]
    async fn poll_failure_leaves_existing_list_untouched() {
        let source = ScriptedSource::new(vec![
            Ok(page(&["1", "2", "3"], 3)),
            Err(Orz2Error::Api { code: 500 }),
        ]);
        let feed = StoryFeed::new(source.clone(), StoryFeedConfig::default());

        feed.refresh().await;
        feed.refresh().await;
        let snap = feed.snapshot().await;
        assert_eq!(snap.items.len(), 3);
        assert!(snap.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_discards_in_flight_response() {
        let source = ScriptedSource::gated(vec![Ok(page(&["1", "2", "3"], 3))]);
        let feed = Arc::new(StoryFeed::new(
            source.clone() as Arc<dyn StoryPageSource>,
            StoryFeedConfig::default(),
        ));

        let task = {
            let feed = Arc::clone(&feed);
            tokio::spawn(async move { feed.refresh().await })
        };
        tokio::task::yield_now().await;

        // 请求在途时切换过滤键，随后放行响应
        feed.reset(Some("m2".to_string())).await;
        source.gate.as_ref().unwrap().notify_one();
        task.await.unwrap();

        let snap = feed.snapshot().await;
        assert!(snap.items.is_empty(), "过期响应不得写入状态");
    }

    #[tokio::test]
    async fn load_more_before_first_load_is_a_noop() {
        let source = ScriptedSource::new(vec![]);
        let feed = StoryFeed::new(source.clone(), StoryFeedConfig::default());
        feed.load_more().await;
        assert_eq!(source.call_count(), 0);
    }
}
