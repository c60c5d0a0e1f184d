//! Statement builders shared by the record-backed repositories.
//!
//! Table and column names come from the static `Table` descriptions in
//! `wayfare_core`, never from user input; every value is bound.

use sqlx::postgres::{PgQueryResult, PgRow};
use sqlx::query_builder::Separated;
use sqlx::{Postgres, QueryBuilder, Row as _};
use wayfare_core::record::{ColumnKind, Row, Table, Value};
use wayfare_core::repository::{RepoResult, UpdateOutcome};

fn push_value<'args>(separated: &mut Separated<'_, 'args, Postgres, &'static str>, value: &Value) {
    match value {
        Value::Text(s) => separated.push_bind(s.clone()),
        Value::Integer(i) => separated.push_bind(*i),
        Value::Real(f) => separated.push_bind(*f),
    };
}

fn push_value_unseparated<'args>(
    separated: &mut Separated<'_, 'args, Postgres, &'static str>,
    value: &Value,
) {
    match value {
        Value::Text(s) => separated.push_bind_unseparated(s.clone()),
        Value::Integer(i) => separated.push_bind_unseparated(*i),
        Value::Real(f) => separated.push_bind_unseparated(*f),
    };
}

fn key_list(table: &Table) -> String {
    table.key_columns().map(|c| c.name).collect::<Vec<_>>().join(", ")
}

fn column_list(table: &Table) -> String {
    table.columns.iter().map(|c| c.name).collect::<Vec<_>>().join(", ")
}

/// `INSERT ... ON CONFLICT (<business key>) DO NOTHING RETURNING id`.
/// Yields no row when a row with the same key already exists.
pub fn insert_unless_exists(row: &Row) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "INSERT INTO {} ({}) VALUES (",
        row.table.name,
        column_list(&row.table)
    ));
    {
        let mut values = qb.separated(", ");
        for value in &row.values {
            push_value(&mut values, value);
        }
    }
    qb.push(format!(
        ") ON CONFLICT ({}) DO NOTHING RETURNING id",
        key_list(&row.table)
    ));
    qb
}

/// `SELECT id FROM <table> WHERE <key column> = $n AND ...`.
pub fn select_id_by_key(row: &Row) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT id FROM {} WHERE ", row.table.name));
    {
        let mut conditions = qb.separated(" AND ");
        for (column, value) in row.key() {
            conditions.push(column.name);
            conditions.push_unseparated(" = ");
            push_value_unseparated(&mut conditions, value);
        }
    }
    qb
}

pub fn select_by_id(table: &Table, id: i64) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {} FROM {} WHERE id = ",
        column_list(table),
        table.name
    ));
    qb.push_bind(id);
    qb
}

/// `UPDATE <table> SET <every column> = $n WHERE id = $m`.
pub fn update_by_id(row: &Row, id: i64) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("UPDATE {} SET ", row.table.name));
    {
        let mut assignments = qb.separated(", ");
        for (column, value) in row.columns() {
            assignments.push(column.name);
            assignments.push_unseparated(" = ");
            push_value_unseparated(&mut assignments, value);
        }
    }
    qb.push(" WHERE id = ");
    qb.push_bind(id);
    qb
}

pub fn delete_by_id(table: &Table, id: i64) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("DELETE FROM {} WHERE id = ", table.name));
    qb.push_bind(id);
    qb
}

/// Classifies the result of an update by id. A unique violation means another
/// row already holds the new business key.
pub fn update_outcome(result: Result<PgQueryResult, sqlx::Error>) -> RepoResult<UpdateOutcome> {
    match result {
        Ok(done) if done.rows_affected() > 0 => Ok(UpdateOutcome::Updated),
        Ok(_) => Ok(UpdateOutcome::NotFound),
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => Ok(UpdateOutcome::KeyTaken),
        Err(err) => Err(err.into()),
    }
}

/// Decodes a row selected by [`select_by_id`] into values in column order.
pub fn decode_values(table: &Table, row: &PgRow) -> Result<Vec<Value>, sqlx::Error> {
    table
        .columns
        .iter()
        .map(|column| {
            Ok(match column.kind {
                ColumnKind::Text => Value::Text(row.try_get(column.name)?),
                ColumnKind::Integer => Value::Integer(row.try_get(column.name)?),
                ColumnKind::Real => Value::Real(row.try_get(column.name)?),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfare_core::models::{Leg, Vacation};
    use wayfare_core::record::{Record, Row};

    fn leg() -> Leg {
        Leg {
            leg_type: "trunk".to_string(),
            budget: "economy".to_string(),
            origin_city: "LIS".to_string(),
            destination_city: "JFK".to_string(),
            price: 310,
            distance_from_previous: 0.0,
            distance_to_next: 0.0,
        }
    }

    #[test]
    fn test_insert_targets_business_key() {
        let qb = insert_unless_exists(&Row::of(&leg()));
        assert_eq!(
            qb.sql(),
            "INSERT INTO legs (leg_type, budget, origin_city, destination_city, price, distance_from_previous, distance_to_next) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (leg_type, budget, origin_city, destination_city, price) DO NOTHING RETURNING id"
        );
    }

    #[test]
    fn test_select_by_key_skips_attributes() {
        let qb = select_id_by_key(&Row::of(&leg()));
        assert_eq!(
            qb.sql(),
            "SELECT id FROM legs WHERE leg_type = $1 AND budget = $2 AND origin_city = $3 \
             AND destination_city = $4 AND price = $5"
        );
    }

    #[test]
    fn test_update_sets_every_column() {
        let vacation = Vacation {
            city: "Boston".to_string(),
            hotel_budget: "mid".to_string(),
            sightseeing_budget: "low".to_string(),
            total_price: 600,
        };
        let qb = update_by_id(&Row::of(&vacation), 4);
        assert_eq!(
            qb.sql(),
            "UPDATE vacations SET city = $1, hotel_budget = $2, sightseeing_budget = $3, total_price = $4 WHERE id = $5"
        );

        let qb = select_by_id(&Vacation::TABLE, 4);
        assert_eq!(
            qb.sql(),
            "SELECT city, hotel_budget, sightseeing_budget, total_price FROM vacations WHERE id = $1"
        );
    }

    #[test]
    fn test_update_outcome_without_match() {
        let outcome = update_outcome(Ok(PgQueryResult::default())).unwrap();
        assert_eq!(outcome, UpdateOutcome::NotFound);

        assert!(update_outcome(Err(sqlx::Error::RowNotFound)).is_err());
    }
}
