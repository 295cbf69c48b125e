//! 故事流监听器回调接口

use async_trait::async_trait;

/// 故事流监听器回调接口，渲染层据此刷新展示
#[async_trait]
pub trait StoryFeedListener: Send + Sync {
    /// 列表内容发生变更（首载、轮询合并或加载更多），参数为快照 JSON
    async fn on_feed_changed(&self, feed_json: String);

    /// 首载失败（列表被清空并进入错误态），参数为用户可见的失败原因
    async fn on_feed_error(&self, message: String);
}

/// 默认空实现（无操作）
pub struct EmptyStoryFeedListener;

#[async_trait]
impl StoryFeedListener for EmptyStoryFeedListener {
    async fn on_feed_changed(&self, _feed_json: String) {
        // 默认不做任何处理
    }

    async fn on_feed_error(&self, _message: String) {
        // 默认不做任何处理
    }
}
