//! 客户命令/查询处理器
//!
//! 客户写入是幂等覆盖写，处理器本身不区分新增和修改。

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crm_domain::{Client, ClientRepository, CrmError, CrmResult};

/// 客户服务
pub struct ClientService {
    client_repo: Arc<dyn ClientRepository>,
}

impl ClientService {
    pub fn new(client_repo: Arc<dyn ClientRepository>) -> Self {
        Self { client_repo }
    }

    /// 保存客户（新增或覆盖）
    ///
    /// 校验失败在任何仓储调用之前返回，不产生部分副作用。
    pub async fn add_client(&self, client: &Client) -> CrmResult<()> {
        validate_client(client)?;
        self.client_repo.save(client).await
    }

    /// 按标识符查询客户
    ///
    /// 不存在时返回仅携带标识符的空实体，调用方无需二次查询
    /// 即可区分新老客户。
    pub async fn get_client(&self, id: Uuid) -> CrmResult<Client> {
        if id.is_nil() {
            return Err(CrmError::validation("id", "client id is required"));
        }
        match self.client_repo.find_by_id(id).await? {
            Some(client) => Ok(client),
            None => {
                debug!(client_id = %id, "客户不存在，返回空实体");
                Ok(Client::empty(id))
            }
        }
    }
}

fn validate_client(client: &Client) -> CrmResult<()> {
    if client.id.is_nil() {
        return Err(CrmError::validation("id", "client id is required"));
    }
    if client.first_name.trim().is_empty() {
        return Err(CrmError::validation("firstName", "first name is required"));
    }
    if client.last_name.trim().is_empty() {
        return Err(CrmError::validation("lastName", "last name is required"));
    }
    if client.contact_email.trim().is_empty() {
        return Err(CrmError::validation(
            "contactEmail",
            "contact email is required",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crm_infrastructure::database::memory::MemoryClientRepository;

    fn service() -> ClientService {
        ClientService::new(Arc::new(MemoryClientRepository::new()))
    }

    #[tokio::test]
    async fn test_add_client_rejects_blank_fields() {
        let svc = service();
        let client = Client::new(Uuid::new_v4(), "", "Dupont", "j@x.com", "");
        let err = svc.add_client(&client).await.unwrap_err();
        assert!(matches!(err, CrmError::Validation { ref field, .. } if field == "firstName"));

        let nil = Client::new(Uuid::nil(), "Jean", "Dupont", "j@x.com", "");
        let err = svc.add_client(&nil).await.unwrap_err();
        assert!(matches!(err, CrmError::Validation { ref field, .. } if field == "id"));
    }

    #[tokio::test]
    async fn test_add_twice_overwrites_attributes() {
        let svc = service();
        let id = Uuid::new_v4();

        let first = Client::new(id, "J", "Dupont", "j@x.com", "");
        svc.add_client(&first).await.unwrap();
        let second = Client::new(id, "K", "Dupont", "j@x.com", "");
        svc.add_client(&second).await.unwrap();

        let stored = svc.get_client(id).await.unwrap();
        assert_eq!(stored.first_name, "K");
    }

    #[tokio::test]
    async fn test_get_missing_client_returns_empty_entity() {
        let svc = service();
        let id = Uuid::new_v4();
        let client = svc.get_client(id).await.unwrap();
        assert_eq!(client.id, id);
        assert!(client.is_empty());
    }
}
