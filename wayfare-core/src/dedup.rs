//! Resolve-or-create for reference data (legs, trips, vacations, persons).

use tracing::debug;

use crate::record::{Record, Row};
use crate::repository::BookingTransaction;
use crate::CoreResult;

/// Returns the id of the stored row whose business key equals `record`'s,
/// inserting `record` first when there is none. Matching is exact and field-wise
/// (no case or whitespace normalization). Runs inside the caller's transaction,
/// so a rollback also undoes the insert.
pub async fn resolve<R: Record>(tx: &mut dyn BookingTransaction, record: &R) -> CoreResult<i64> {
    let id = tx.resolve(Row::of(record)).await?;
    debug!(table = R::TABLE.name, id, "Resolved reference record");
    Ok(id)
}

/// Loads a record by id, `None` when the row does not exist.
pub async fn load<R: Record>(tx: &mut dyn BookingTransaction, id: i64) -> CoreResult<Option<R>> {
    match tx.fetch(R::TABLE, id).await? {
        Some(values) => Ok(Some(R::from_values(values)?)),
        None => Ok(None),
    }
}
