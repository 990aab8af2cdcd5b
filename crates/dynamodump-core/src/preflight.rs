//! Restore target checks.

use dynamodump_model::TableSummary;
use tracing::{info, warn};

use crate::backend::TableBackend;
use crate::error::{DumpError, DumpResult};

/// Refuse a restore into a table that is absent, not active, or already
/// holds items while `allow_append` is off.
pub async fn check_table_state<T: TableBackend>(
    table: &T,
    table_name: &str,
    allow_append: bool,
) -> DumpResult<TableSummary> {
    let summary = match table.describe_table(table_name).await {
        Ok(summary) => summary,
        Err(e) if e.is_not_found() => {
            return Err(DumpError::TableNotFound {
                table: table_name.to_owned(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    if !summary.status.is_writable() {
        return Err(DumpError::TableNotWritable {
            table: table_name.to_owned(),
            status: summary.status,
        });
    }

    if summary.item_count > 0 {
        if !allow_append {
            return Err(DumpError::TableNotEmpty {
                table: table_name.to_owned(),
                count: summary.item_count,
            });
        }
        warn!(
            table = %table_name,
            item_count = summary.item_count,
            "table is not empty, appending"
        );
    }

    info!(table = %table_name, status = %summary.status, "restore target ready");
    Ok(summary)
}
