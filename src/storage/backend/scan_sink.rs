//! 扫码计数批量落库
//!
//! 一条 `UPDATE ... SET scan_count = CASE id WHEN .. THEN scan_count + n ..`，
//! 增量在数据库侧完成，多实例并发刷盘也不会丢计数。已删除的 id 不会命中任何行。

use async_trait::async_trait;
use sea_orm::sea_query::{CaseStatement, Expr, Query};
use sea_orm::{ConnectionTrait, ExprTrait};
use tracing::debug;

use super::{SeaOrmStorage, retry};
use crate::analytics::ScanSink;
use crate::errors::Result;

use migration::entities::qr_code;

impl SeaOrmStorage {
    pub(super) async fn add_scans_batch(&self, updates: &[(String, u64)]) -> Result<u64> {
        let updates: Vec<&(String, u64)> = updates.iter().filter(|(_, n)| *n > 0).collect();
        if updates.is_empty() {
            return Ok(0);
        }

        let mut case_stmt = CaseStatement::new();
        let mut ids: Vec<String> = Vec::with_capacity(updates.len());

        for (id, count) in &updates {
            case_stmt = case_stmt.case(
                Expr::col(qr_code::Column::Id).eq(Expr::val(id.as_str())),
                Expr::col(qr_code::Column::ScanCount).add(Expr::val(std::cmp::Ord::min(*count, i64::MAX as u64) as i64)),
            );
            ids.push(id.clone());
        }
        case_stmt = case_stmt.finally(Expr::col(qr_code::Column::ScanCount));

        let stmt = Query::update()
            .table(qr_code::Entity)
            .value(qr_code::Column::ScanCount, case_stmt)
            .and_where(Expr::col(qr_code::Column::Id).is_in(ids))
            .to_owned();

        let db = &self.db;
        let stmt_ref = &stmt;
        let result = retry::with_retry_timeout(
            "add_scans",
            self.retry_config,
            self.timeout_ms,
            || async { db.execute(stmt_ref).await },
        )
        .await?;

        debug!(
            "Scan counts flushed to {} database ({} codes, {} rows)",
            self.backend_name.to_uppercase(),
            updates.len(),
            result.rows_affected()
        );

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ScanSink for SeaOrmStorage {
    async fn flush_scans(&self, updates: Vec<(String, u64)>) -> anyhow::Result<()> {
        self.add_scans_batch(&updates)
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("Failed to flush scan counts: {}", e))
    }
}
