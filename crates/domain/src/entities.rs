//! 领域实体定义
//!
//! Client 以调用方提供的 UUID 为唯一键，持久化语义为幂等覆盖写；
//! User 由系统生成 UUID，并以邮箱作为二级唯一键。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 客户实体
///
/// 标识符由调用方在持久化之前设置。查询不存在的客户时返回
/// 仅携带该标识符的空实体，而不是 None，调用方据此分支。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub contact_email: String,
    pub phone_number: String,
}

impl Client {
    pub fn new(
        id: Uuid,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        contact_email: impl Into<String>,
        phone_number: impl Into<String>,
    ) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            contact_email: contact_email.into(),
            phone_number: phone_number.into(),
        }
    }

    /// 构造仅携带标识符的空实体
    pub fn empty(id: Uuid) -> Self {
        Self {
            id,
            first_name: String::new(),
            last_name: String::new(),
            contact_email: String::new(),
            phone_number: String::new(),
        }
    }

    /// 除标识符外是否没有任何属性数据
    pub fn is_empty(&self) -> bool {
        self.first_name.is_empty()
            && self.last_name.is_empty()
            && self.contact_email.is_empty()
            && self.phone_number.is_empty()
    }
}

/// 用户实体
///
/// 标识符在创建时由系统生成；邮箱在所有用户间唯一。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// 创建新用户，分配标识符并设置默认状态
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            role: role.into(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// 覆盖可变属性并刷新更新时间
    pub fn apply_update(
        &mut self,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        role: impl Into<String>,
    ) {
        self.email = email.into();
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self.role = role.into();
        self.updated_at = Utc::now();
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.updated_at = Utc::now();
    }
}
