//! 故事（江湖事迹）模块
//!
//! 故事流的拉取、合并与轮询控制

pub mod api;
pub mod listener;
pub mod markup;
pub mod models;
pub mod service;

// 重新导出主要类型和函数
pub use api::{StoryApi, StoryPageSource};
pub use listener::{EmptyStoryFeedListener, StoryFeedListener};
pub use markup::{format_story_time, render_markup, story_type_label};
pub use models::{OperatorMemberInfo, StoryItem};
pub use service::{FeedSnapshot, StoryFeed, StoryFeedConfig};
