use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crm_domain::{CrmError, CrmResult, User, UserRepository};

/// 内存用户仓储
///
/// 写入时在锁内做邮箱唯一性扫描，与主键检查一起保证两个
/// 唯一性不变量；`list` 按创建时间倒序。
#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().map(|users| users.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 清空所有用户（测试用）
    pub fn clear(&self) {
        if let Ok(mut users) = self.users.write() {
            users.clear();
        }
    }
}

fn lock_poisoned() -> CrmError {
    CrmError::Internal("user store lock poisoned".to_string())
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: &User) -> CrmResult<()> {
        let mut users = self.users.write().map_err(|_| lock_poisoned())?;

        if users.values().any(|u| u.email == user.email) {
            return Err(CrmError::email_already_exists(&user.email));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> CrmResult<()> {
        let mut users = self.users.write().map_err(|_| lock_poisoned())?;

        if !users.contains_key(&user.id) {
            return Err(CrmError::user_not_found(user.id));
        }
        if users
            .values()
            .any(|u| u.email == user.email && u.id != user.id)
        {
            return Err(CrmError::email_already_exists(&user.email));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> CrmResult<()> {
        let mut users = self.users.write().map_err(|_| lock_poisoned())?;
        if users.remove(&id).is_none() {
            return Err(CrmError::user_not_found(id));
        }
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> CrmResult<Option<User>> {
        let users = self.users.read().map_err(|_| lock_poisoned())?;
        Ok(users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> CrmResult<Option<User>> {
        let users = self.users.read().map_err(|_| lock_poisoned())?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> CrmResult<Vec<User>> {
        let users = self.users.read().map_err(|_| lock_poisoned())?;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }
}
