pub mod memory;
pub mod postgres;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crm_domain::CrmResult;

use crate::config::DatabaseConfig;

/// 创建 PostgreSQL 连接池
pub async fn create_pool(config: &DatabaseConfig) -> CrmResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;
    Ok(pool)
}
