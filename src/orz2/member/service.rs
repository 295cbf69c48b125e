//! 成员名册控制器
//!
//! 故事流控制器的无轮询版本：首载 + 触底加载更多，按 _id 去重追加。

use crate::orz2::member::api::MemberPageSource;
use crate::orz2::member::models::MemberListItem;
use crate::orz2::story::service::DEFAULT_PAGE_SIZE;
use crate::orz2::sync::merge_append;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// 名册快照
#[derive(Debug, Clone)]
pub struct RosterSnapshot {
    pub members: Vec<MemberListItem>,
    pub total_count: u64,
    pub loading: bool,
    pub loading_more: bool,
    pub error: Option<String>,
}

impl RosterSnapshot {
    /// 是否还有后续页
    pub fn has_more(&self) -> bool {
        (self.members.len() as u64) < self.total_count
    }
}

struct RosterState {
    members: Vec<MemberListItem>,
    page_num: u32,
    total_count: u64,
    loaded: bool,
    loading: bool,
    loading_more: bool,
    error: Option<String>,
    epoch: u64,
}

/// 成员名册控制器
pub struct MemberRoster {
    source: Arc<dyn MemberPageSource>,
    page_size: u32,
    state: Mutex<RosterState>,
}

impl MemberRoster {
    pub fn new(source: Arc<dyn MemberPageSource>) -> Self {
        Self::with_page_size(source, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(source: Arc<dyn MemberPageSource>, page_size: u32) -> Self {
        Self {
            source,
            page_size,
            state: Mutex::new(RosterState {
                members: Vec::new(),
                page_num: 0,
                total_count: 0,
                loaded: false,
                loading: false,
                loading_more: false,
                error: None,
                epoch: 0,
            }),
        }
    }

    pub async fn snapshot(&self) -> RosterSnapshot {
        let st = self.state.lock().await;
        RosterSnapshot {
            members: st.members.clone(),
            total_count: st.total_count,
            loading: st.loading,
            loading_more: st.loading_more,
            error: st.error.clone(),
        }
    }

    /// 首载（或重载）：丢弃现有列表重新拉第 0 页；失败清空并置错误
    pub async fn load_initial(&self) {
        let epoch = {
            let mut st = self.state.lock().await;
            st.epoch += 1;
            st.loading = true;
            st.error = None;
            st.epoch
        };

        debug!("[Roster] 首载成员名册");
        let result = self.source.fetch_page(0, self.page_size).await;

        let mut st = self.state.lock().await;
        if st.epoch != epoch {
            debug!("[Roster] 丢弃过期首载响应");
            return;
        }
        match result {
            Ok(page) => {
                info!(
                    "[Roster] ✅ 名册首载完成，条目数: {}, totalCount={}",
                    page.list.len(),
                    page.total_count
                );
                st.members = page.list;
                st.page_num = page.page_num;
                st.total_count = page.total_count;
                st.loaded = true;
            }
            Err(e) => {
                error!("[Roster] ❌ 名册首载失败: {}", e);
                st.members.clear();
                st.error = Some(e.to_string());
                st.loaded = false;
            }
        }
        st.loading = false;
    }

    /// 加载更多：游标 +1，去重后追加；失败静默维持当前列表
    pub async fn load_more(&self) {
        let (epoch, next_page) = {
            let mut st = self.state.lock().await;
            if !st.loaded || st.loading_more {
                return;
            }
            if (st.members.len() as u64) >= st.total_count {
                debug!("[Roster] 名册已全部加载");
                return;
            }
            st.loading_more = true;
            (st.epoch, st.page_num + 1)
        };

        info!("[Roster] 📄 名册加载更多 pageNum={}", next_page);
        let result = self.source.fetch_page(next_page, self.page_size).await;

        let mut st = self.state.lock().await;
        if st.epoch != epoch {
            // 守卫仍归本次在途请求所有（首载不清它），此处必须释放
            debug!("[Roster] 丢弃过期加载更多响应");
            st.loading_more = false;
            return;
        }
        match result {
            Ok(page) => {
                let existing = std::mem::take(&mut st.members);
                st.members = merge_append(existing, page.list, |m| m.id.clone());
                st.page_num = next_page;
                st.total_count = page.total_count;
            }
            Err(e) => {
                warn!("[Roster] 名册加载更多失败（维持当前列表）: {}", e);
            }
        }
        st.loading_more = false;
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

    fn member(id: &str) -> MemberListItem {
        serde_json::from_value(serde_json::json!({
            "_id": id,
            "user_nickName": format!("侠客{id}"),
            "user_avatarUrl": "",
            "user_level": 1
        }))
        .unwrap()
    }

    fn page(ids: &[&str], total: u64) -> PageBody<MemberListItem> {
        PageBody {
            page_num: 0,
            page_size: DEFAULT_PAGE_SIZE,
            total_count: total,
            list: ids.iter().map(|id| member(id)).collect(),
        }
    }

    struct ScriptedSource {
        responses: std::sync::Mutex<VecDeque<Result<PageBody<MemberListItem>, Orz2Error>>>,
        calls: AtomicUsize,
        /// 指定第 n 次（从 0 起）调用在放行前挂起，用于模拟在途请求
        gate_on_call: Option<usize>,
        gate: Notify,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<PageBody<MemberListItem>, Orz2Error>>) -> Arc<Self> {
            Arc::new(Self {
                responses: std::sync::Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
                gate_on_call: None,
                gate: Notify::new(),
            })
        }

        fn gated_on(
            call: usize,
            responses: Vec<Result<PageBody<MemberListItem>, Orz2Error>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                responses: std::sync::Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
                gate_on_call: Some(call),
                gate: Notify::new(),
            })
        }
    }

    #[async_trait]
    impl MemberPageSource for ScriptedSource {
        async fn fetch_page(
            &self,
            _page_num: u32,
            _page_size: u32,
        ) -> Result<PageBody<MemberListItem>, Orz2Error> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            // 先按调用顺序取走响应，再决定是否挂起，脚本顺序与调用顺序一致
            let response = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(page(&[], 0)));
            if self.gate_on_call == Some(call) {
                self.gate.notified().await;
            }
            response
        }
    }

    #[tokio::test]
    async fn initial_load_then_load_more_deduplicates() {
        // 第 1 页与第 0 页有一条重叠（后端翻页窗口漂移），合并后不得重复
        let source = ScriptedSource::new(vec![
            Ok(page(&["a", "b", "c"], 5)),
            Ok(page(&["c", "d", "e"], 5)),
        ]);
        let roster = MemberRoster::new(source.clone());

        roster.load_initial().await;
        roster.load_more().await;
        let snap = roster.snapshot().await;
        let ids: Vec<_> = snap.members.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
        assert!(!snap.has_more());
    }

    #[tokio::test]
    async fn load_more_stops_when_total_reached() {
        let source = ScriptedSource::new(vec![Ok(page(&["a", "b"], 2))]);
        let roster = MemberRoster::new(source.clone());

        roster.load_initial().await;
        roster.load_more().await;
        // 首载已覆盖 totalCount，加载更多不得发请求
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn initial_failure_clears_and_sets_error() {
        let source = ScriptedSource::new(vec![Err(Orz2Error::Api { code: 500 })]);
        let roster = MemberRoster::new(source.clone());

        roster.load_initial().await;
        let snap = roster.snapshot().await;
        assert!(snap.members.is_empty());
        assert!(snap.error.is_some());
        // 未完成首载前加载更多是 no-op
        roster.load_more().await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reload_racing_in_flight_load_more_releases_the_guard() {
        // 一次加载更多在途时重载名册：过期响应落地后被丢弃，
        // 但 loading_more 守卫必须随之释放，后续翻页照常可用
        let source = ScriptedSource::gated_on(
            1,
            vec![
                Ok(page(&["a", "b"], 10)),
                Ok(page(&["c", "d"], 10)),
                Ok(page(&["a", "b"], 10)),
                Ok(page(&["c", "d"], 10)),
            ],
        );
        let roster = Arc::new(MemberRoster::new(source.clone()));

        roster.load_initial().await;
        let in_flight = {
            let roster = Arc::clone(&roster);
            tokio::spawn(async move { roster.load_more().await })
        };
        tokio::task::yield_now().await;

        // 在途期间重载（代际提升），再放行过期响应
        roster.load_initial().await;
        source.gate.notify_one();
        in_flight.await.unwrap();

        roster.load_more().await;
        let snap = roster.snapshot().await;
        let ids: Vec<_> = snap.members.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(source.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn load_more_failure_keeps_current_list() {
        let source = ScriptedSource::new(vec![
            Ok(page(&["a", "b"], 4)),
            Err(Orz2Error::Api { code: 500 }),
        ]);
        let roster = MemberRoster::new(source.clone());

        roster.load_initial().await;
        roster.load_more().await;
        let snap = roster.snapshot().await;
        assert_eq!(snap.members.len(), 2);
        assert!(snap.error.is_none());
    }
}
