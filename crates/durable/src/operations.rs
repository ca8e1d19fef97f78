//! 支持的操作枚举
//!
//! 编排器边界按名称注册/查找工作流，核心逻辑内部用显式枚举
//! 分发，避免字符串分发散落各处。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 系统支持的全部操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    AddClient,
    GetClient,
    CreateUser,
    UpdateUser,
    DeleteUser,
    GetUser,
    ListUsers,
}

impl Operation {
    /// 编排器边界可见的操作名，也是工作流标识的前缀
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::AddClient => "add-client",
            Operation::GetClient => "get-client",
            Operation::CreateUser => "create-user",
            Operation::UpdateUser => "update-user",
            Operation::DeleteUser => "delete-user",
            Operation::GetUser => "get-user",
            Operation::ListUsers => "list-users",
        }
    }

    pub fn all() -> [Operation; 7] {
        [
            Operation::AddClient,
            Operation::GetClient,
            Operation::CreateUser,
            Operation::UpdateUser,
            Operation::DeleteUser,
            Operation::GetUser,
            Operation::ListUsers,
        ]
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
