//! 错误定义模块

use thiserror::Error;

/// Aether系统统一错误类型
#[derive(Error, Debug)]
pub enum AetherError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("验证错误: {0}")]
    Validation(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("存储错误: {0}")]
    Storage(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("无效状态转换: 从 {from} 到 {event}")]
    InvalidStateTransition { from: String, event: String },
}

impl AetherError {
    /// 是否为调用方可忽略的拒绝（校验失败或引用不存在）
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AetherError::Validation(_)
                | AetherError::NotFound(_)
                | AetherError::InvalidStateTransition { .. }
        )
    }
}

/// Aether系统统一结果类型
pub type Result<T> = std::result::Result<T, AetherError>;
