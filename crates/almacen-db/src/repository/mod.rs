//! # Repository Module
//!
//! One repository per entity, each holding a clone of the pool.
//!
//! ## Referential Actions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Delete Semantics                                     │
//! │                                                                         │
//! │  PROTECT (delete fails with DbError::ReferentialIntegrity)              │
//! │    Category  ◄── Product                                               │
//! │    Product   ◄── StockMovement, Transaction                            │
//! │    User      ◄── Transaction                                           │
//! │                                                                         │
//! │  SEVER (delete succeeds, dependent column becomes NULL)                │
//! │    Product   ◄── NfcTag.product_id                                     │
//! │    NfcTag    ◄── StockMovement.nfc_tag_id                              │
//! │                                                                         │
//! │  Protect checks run inside the delete's write transaction, so the     │
//! │  count and the DELETE see the same snapshot. The schema enforces both  │
//! │  actions as well (RESTRICT / SET NULL).                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`category::CategoryRepository`]
//! - [`product::ProductRepository`]
//! - [`user::UserRepository`]
//! - [`rfid::RfidTagRepository`]
//! - [`nfc::NfcTagRepository`] - creation books the automatic entrada
//! - [`transaction::TransactionRepository`] - append-only log
//! - [`stock::StockRepository`] - movements and derived stock

pub mod category;
pub mod nfc;
pub mod product;
pub mod rfid;
pub mod stock;
pub mod transaction;
pub mod user;

use sqlx::{Executor, Sqlite, SqlitePool, Transaction};

use crate::error::{DbError, DbResult};

/// Opens a transaction that takes SQLite's write lock up front.
///
/// Every write path reads (existence or protect checks) before it writes.
/// Under a deferred `BEGIN` that read-then-write upgrade fails at once with
/// "database is locked" if another writer committed in between; waiting
/// for the lock here goes through the busy timeout instead.
pub(crate) async fn begin_write(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// True when `table` has a row with primary key `id`.
pub(crate) async fn row_exists<'e, E>(executor: E, table: &str, id: &str) -> DbResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", table);
    let found: i64 = sqlx::query_scalar(&sql).bind(id).fetch_one(executor).await?;
    Ok(found != 0)
}

/// Fails with [`DbError::Reference`] unless the referenced row exists.
pub(crate) async fn ensure_exists<'e, E>(
    executor: E,
    table: &str,
    entity: &str,
    id: &str,
) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    if row_exists(executor, table, id).await? {
        Ok(())
    } else {
        Err(DbError::reference(entity, id))
    }
}

/// Number of rows in `table` whose `column` equals `id`.
pub(crate) async fn count_referencing<'e, E>(
    executor: E,
    table: &str,
    column: &str,
    id: &str,
) -> DbResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = ?1", table, column);
    let count: i64 = sqlx::query_scalar(&sql).bind(id).fetch_one(executor).await?;
    Ok(count)
}

// =============================================================================
// Test Fixtures
// =============================================================================
