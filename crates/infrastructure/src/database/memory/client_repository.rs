use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crm_domain::{Client, ClientRepository, CrmError, CrmResult};

/// 内存客户仓储
///
/// 读写锁保护的哈希表：读可以并发，写与其他访问互斥。
/// 返回值是克隆副本，调用方无法改动仓储内部状态。
#[derive(Default)]
pub struct MemoryClientRepository {
    clients: RwLock<HashMap<Uuid, Client>>,
}

impl MemoryClientRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.clients.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock_poisoned() -> CrmError {
    CrmError::Internal("client store lock poisoned".to_string())
}

#[async_trait]
impl ClientRepository for MemoryClientRepository {
    async fn save(&self, client: &Client) -> CrmResult<()> {
        let mut clients = self.clients.write().map_err(|_| lock_poisoned())?;
        clients.insert(client.id, client.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> CrmResult<Option<Client>> {
        let clients = self.clients.read().map_err(|_| lock_poisoned())?;
        Ok(clients.get(&id).cloned())
    }
}
