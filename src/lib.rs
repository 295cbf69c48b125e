pub mod orz2;

// 重新导出常用类型和函数，方便外部使用
pub use orz2::{
    client::{Orz2Client, Orz2Config},
    error::Orz2Error,
    identity::{fingerprint, FileTokenStore, IdentityVault, MemoryTokenStore, TokenStore},
    member::{MemberInfo, MemberListItem, MemberRoster, MemberSummaryBody},
    story::{FeedSnapshot, StoryFeed, StoryFeedConfig, StoryFeedListener, StoryItem},
};
