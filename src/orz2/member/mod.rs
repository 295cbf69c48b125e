//! 成员（侠客）模块
//!
//! 成员名册的分页拉取与汇总 / 单查 / 注册接口

pub mod api;
pub mod models;
pub mod service;

// 重新导出主要类型和函数
pub use api::{MemberApi, MemberDirectory, MemberPageSource};
pub use models::{
    BackpackItem, FriendItem, LoginBody, MemberInfo, MemberListItem, MemberSummaryBody,
    TopRankItem,
};
pub use service::{MemberRoster, RosterSnapshot};
