//! SDK 错误类型定义
//!
//! 接口层统一使用 [`Orz2Error`] 分类错误；列表控制器对其中的读错误做失败降级，
//! 单查 / 注册路径则向调用方透出可读信息。

use thiserror::Error;

/// SDK 统一错误分类
#[derive(Debug, Error)]
pub enum Orz2Error {
    /// 传输层失败（请求未发出或未收到可用响应）
    #[error("网络请求失败: {0}")]
    Network(#[from] reqwest::Error),

    /// 响应已返回但信封内业务码非 200
    #[error("接口业务错误，code: {code}")]
    Api { code: i64 },

    /// 响应缺少 body 或结构不符合预期
    #[error("响应格式异常: {0}")]
    Malformed(String),

    /// 注册前置校验失败：昵称为空
    #[error("江湖名号不能为空")]
    EmptyNickName,

    /// 注册（下山）失败，附用户可见原因
    #[error("下山失败: {0}")]
    Registration(String),

    /// 本地缓存的身份令牌已无法解析到成员记录
    #[error("本地身份令牌已失效")]
    StaleIdentity,
}
