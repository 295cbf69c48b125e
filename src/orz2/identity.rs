//! 本地身份缓存
//!
//! 持久化一枚私有令牌（注册时下发），用 md5 指纹与服务端返回的 identity_hash
//! 做相等比较来识别"这条记录就是本地登录成员"。令牌本体除注册响应外不再上行，
//! 只有指纹参与比较。

use crate::orz2::error::Orz2Error;
use crate::orz2::member::api::MemberDirectory;
use crate::orz2::member::models::MemberInfo;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 令牌持久化抽象，身份缓存不关心落在哪里
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<String>;
    fn set(&self, token: &str) -> anyhow::Result<()>;
    fn delete(&self) -> anyhow::Result<()>;
}

/// 内存实现（测试用）
#[derive(Default)]
pub struct MemoryTokenStore {
    token: std::sync::Mutex<Option<String>>,
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    fn set(&self, token: &str) -> anyhow::Result<()> {
        *self.token.lock().unwrap() = Some(token.to_string());
        Ok(())
    }

    fn delete(&self) -> anyhow::Result<()> {
        *self.token.lock().unwrap() = None;
        Ok(())
    }
}

/// 单文件实现：令牌明文存在固定路径，无过期无版本
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(s) => {
                let token = s.trim().to_string();
                if token.is_empty() {
                    None
                } else {
                    Some(token)
                }
            }
            Err(_) => None,
        }
    }

    fn set(&self, token: &str) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, token)?;
        Ok(())
    }

    fn delete(&self) -> anyhow::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// 令牌指纹：十六进制 md5，与后端 identity_hash 的算法保持一致
pub fn fingerprint(token: &str) -> String {
    format!("{:x}", md5::compute(token))
}

/// 身份缓存服务
pub struct IdentityVault {
    store: Arc<dyn TokenStore>,
    directory: Arc<dyn MemberDirectory>,
}

impl IdentityVault {
    pub fn new(store: Arc<dyn TokenStore>, directory: Arc<dyn MemberDirectory>) -> Self {
        Self { store, directory }
    }

    /// 本地缓存令牌的指纹；未缓存时为 None
    pub fn current_fingerprint(&self) -> Option<String> {
        self.store.get().map(|token| fingerprint(&token))
    }

    /// 记录是否为本地登录成员：双方指纹都非空且逐字节相等才算
    pub fn is_self(&self, record_hash: Option<&str>) -> bool {
        match (self.current_fingerprint(), record_hash) {
            (Some(local), Some(remote)) => !local.is_empty() && !remote.is_empty() && local == remote,
            _ => false,
        }
    }

    /// 注册（下山）：昵称先行校验，成功后持久化令牌并返回成员详情
    ///
    /// 已有可解析的缓存令牌时不再注册，直接返回对应成员；缓存令牌已失效则先驱逐再走注册。
    pub async fn register(&self, nick_name: &str) -> Result<MemberInfo, Orz2Error> {
        if self.store.get().is_some() {
            match self.resolve_self().await? {
                Some(info) => {
                    info!("[Identity] 已有缓存身份，跳过注册: {}", info.nick_name);
                    return Ok(info);
                }
                None => debug!("[Identity] 缓存令牌已失效，继续走注册"),
            }
        }

        let trimmed = nick_name.trim();
        if trimmed.is_empty() {
            return Err(Orz2Error::EmptyNickName);
        }

        let body = self
            .directory
            .login_member(trimmed)
            .await
            .map_err(|e| Orz2Error::Registration(e.to_string()))?;
        let member = body
            .member_info
            .ok_or_else(|| Orz2Error::Registration("响应中缺少 memberInfo".to_string()))?;
        if member.identity_token.is_empty() {
            return Err(Orz2Error::Registration(
                "响应中缺少 identity_token".to_string(),
            ));
        }

        self.store
            .set(&member.identity_token)
            .map_err(|e| Orz2Error::Registration(format!("令牌持久化失败: {e}")))?;
        info!("[Identity] ✅ 注册成功并已缓存令牌: {}", member.nick_name);
        Ok(member)
    }

    /// 用缓存令牌严格解析本地成员
    ///
    /// 未缓存令牌返回 `Ok(None)`；令牌已无法解析到成员时驱逐缓存并返回
    /// [`Orz2Error::StaleIdentity`]，调用方据此区分"从未注册"与"身份刚刚失效"。
    /// 网络错误原样上抛，不触发驱逐（令牌可能仍然有效）。
    pub async fn resolve_self_strict(&self) -> Result<Option<MemberInfo>, Orz2Error> {
        let Some(token) = self.store.get() else {
            return Ok(None);
        };

        match self.directory.member_by_token(&token).await {
            Ok(Some(info)) => Ok(Some(info)),
            Ok(None) => {
                warn!("[Identity] 缓存令牌已无法解析到成员，驱逐本地缓存");
                if let Err(e) = self.store.delete() {
                    warn!("[Identity] 驱逐缓存失败: {}", e);
                }
                Err(Orz2Error::StaleIdentity)
            }
            Err(e) => Err(e),
        }
    }

    /// 宽松解析：失效令牌驱逐后降级为"无本地身份"，不作为硬错误上抛
    pub async fn resolve_self(&self) -> Result<Option<MemberInfo>, Orz2Error> {
        match self.resolve_self_strict().await {
            Err(Orz2Error::StaleIdentity) => Ok(None),
            other => other,
        }
    }
}
