//! Sequence token generation - per-category monotonic counters.
//!
//! Tokens look like `DEMO-042`: a fixed per-category prefix plus a
//! zero-padded sequence number. The counter row is created lazily on the
//! first submission of a category and afterwards only ever moves through a
//! single conditional `UPDATE .. SET count = count + 1` inside one database
//! transaction, so concurrent callers can never observe a duplicate. Tokens
//! may be issued out of arrival order but are never reused, and a failed call
//! leaves the counter untouched.

use crate::{
    entities::{SequenceCounter, sequence_counter},
    errors::{Error, Result},
};
use sea_orm::{
    DatabaseConnection, DbErr, Set, SqlErr, TransactionTrait, prelude::*, sea_query::Expr,
};
use tracing::{debug, instrument};

/// The fixed set of submission categories and their token prefixes.
pub const CATEGORIES: [(&str, &str); 3] = [
    ("demo", "DEMO"),
    ("inquiry", "INQ"),
    ("feedback", "FB"),
];

/// Attempts per call to create a missing counter row before giving up.
/// Two is enough: a second attempt only happens when a concurrent first
/// caller won the lazy-creation race, after which the row exists.
const LAZY_CREATE_ATTEMPTS: u32 = 2;

/// Returns the token prefix for a category, or None for an unknown category.
#[must_use]
pub fn prefix_for(category: &str) -> Option<&'static str> {
    CATEGORIES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, prefix)| *prefix)
}

/// Whether a category belongs to the fixed known set.
#[must_use]
pub fn is_known_category(category: &str) -> bool {
    prefix_for(category).is_some()
}

/// Formats a sequence number with its category prefix, zero-padded to width 3.
/// Values of 1000 and above are not re-padded, simply longer.
fn format_token(prefix: &str, count: i64) -> String {
    format!("{prefix}-{count:03}")
}

/// Issues the next sequence token for a category.
///
/// Atomically increments the category's counter (creating it with the first
/// value on first use) and returns the formatted token. Safe under any number
/// of concurrent callers: the increment is one conditional UPDATE and the
/// read-back happens in the same database transaction.
///
/// # Errors
/// Returns [`Error::InvalidCategory`] for a category outside the fixed set,
/// or a database error (with no counter movement) if the store fails.
#[instrument(skip(db))]
pub async fn next_token(db: &DatabaseConnection, category: &str) -> Result<String> {
    let prefix = prefix_for(category).ok_or_else(|| Error::InvalidCategory {
        category: category.to_string(),
    })?;

    for _ in 0..LAZY_CREATE_ATTEMPTS {
        let txn = db.begin().await?;

        let updated = SequenceCounter::update_many()
            .col_expr(
                sequence_counter::Column::Count,
                Expr::col(sequence_counter::Column::Count).add(1),
            )
            .filter(sequence_counter::Column::Category.eq(category))
            .exec(&txn)
            .await?;

        if updated.rows_affected == 0 {
            // First use of this category: create the counter already holding
            // the value we are about to hand out.
            let created = sequence_counter::ActiveModel {
                category: Set(category.to_string()),
                count: Set(1),
                prefix: Set(prefix.to_string()),
                ..Default::default()
            }
            .insert(&txn)
            .await;

            match created {
                Ok(counter) => {
                    txn.commit().await?;
                    debug!(category, count = counter.count, "Created sequence counter");
                    return Ok(format_token(prefix, counter.count));
                }
                Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    // A concurrent caller created the row between our UPDATE
                    // and INSERT; retry against the now-existing counter.
                    txn.rollback().await?;
                    continue;
                }
                Err(e) => {
                    txn.rollback().await?;
                    return Err(e.into());
                }
            }
        }

        // The UPDATE holds the write lock, so this read sees exactly the
        // value our increment produced.
        let counter = SequenceCounter::find()
            .filter(sequence_counter::Column::Category.eq(category))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                DbErr::RecordNotFound(format!("sequence counter for category {category}"))
            })?;
        txn.commit().await?;

        debug!(category, count = counter.count, "Issued sequence token");
        return Ok(format_token(prefix, counter.count));
    }

    Err(Error::Database(DbErr::Custom(format!(
        "sequence counter for {category} could not be created"
    ))))
}
