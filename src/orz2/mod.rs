pub mod client;
pub mod error;
pub mod identity;
pub mod member;
pub mod story;
pub mod sync;
pub mod types;

// 重新导出常用类型
pub use client::{Orz2Client, Orz2Config};
pub use error::Orz2Error;
pub use identity::{fingerprint, FileTokenStore, IdentityVault, MemoryTokenStore, TokenStore};
pub use sync::{merge_append, merge_prepend};
