use thiserror::Error;
use uuid::Uuid;

/// 统一错误类型
///
/// 领域冲突（NotFound/AlreadyExists）和输入校验错误是终态，
/// 不参与重试；基础设施类错误可由持久化执行路径按策略重试。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CrmError {
    #[error("字段校验失败: {field}: {message}")]
    Validation { field: String, message: String },
    #[error("用户不存在: id={id}")]
    UserNotFound { id: Uuid },
    #[error("邮箱已被占用: {email}")]
    EmailAlreadyExists { email: String },
    #[error("数据库操作失败: {0}")]
    DatabaseOperation(String),
    #[error("数据序列化错误: {0}")]
    Serialization(String),
    #[error("操作超时: {0}")]
    Timeout(String),
    #[error("配置错误: {0}")]
    Configuration(String),
    #[error("系统内部错误: {0}")]
    Internal(String),
}

pub type CrmResult<T> = Result<T, CrmError>;

impl CrmError {
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn user_not_found(id: Uuid) -> Self {
        Self::UserNotFound { id }
    }

    pub fn email_already_exists<S: Into<String>>(email: S) -> Self {
        Self::EmailAlreadyExists {
            email: email.into(),
        }
    }

    pub fn database_error<S: Into<String>>(msg: S) -> Self {
        Self::DatabaseOperation(msg.into())
    }

    /// 是否允许在持久化执行路径中重试
    ///
    /// 校验错误和领域冲突重试没有意义，必须原样返回给调用方。
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CrmError::DatabaseOperation(_) | CrmError::Timeout(_) | CrmError::Internal(_)
        )
    }
}

impl From<sqlx::Error> for CrmError {
    fn from(err: sqlx::Error) -> Self {
        CrmError::DatabaseOperation(err.to_string())
    }
}

impl From<serde_json::Error> for CrmError {
    fn from(err: serde_json::Error) -> Self {
        CrmError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(CrmError::database_error("connection reset").is_retryable());
        assert!(CrmError::Timeout("activity".into()).is_retryable());

        assert!(!CrmError::validation("email", "email is required").is_retryable());
        assert!(!CrmError::user_not_found(Uuid::new_v4()).is_retryable());
        assert!(!CrmError::email_already_exists("a@x.com").is_retryable());
    }
}
