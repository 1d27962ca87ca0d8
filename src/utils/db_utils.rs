use sqlx::MySqlPool;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    F64(f64),
    Bool(bool),
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Collects `column = ?` assignments for a partial update. Column names are
/// always compile-time constants supplied by the handler, never client input.
#[derive(Debug)]
pub struct UpdateBuilder {
    table: &'static str,
    sets: Vec<&'static str>,
    values: Vec<SqlValue>,
}

impl UpdateBuilder {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            sets: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn set(mut self, column: &'static str, value: Option<SqlValue>) -> Self {
        if let Some(value) = value {
            self.sets.push(column);
            self.values.push(value);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Builds `UPDATE .. SET .. WHERE id = ? AND tenant_id = ?`.
    /// Returns None when no column was set.
    pub fn build_for_tenant(self, id: u64, tenant_id: u64) -> Option<SqlUpdate> {
        self.build("id = ? AND tenant_id = ?", &[id, tenant_id])
    }

    /// Builds `UPDATE .. SET .. WHERE id = ?` for tables that are not
    /// tenant-scoped themselves.
    pub fn build_for_id(self, id: u64) -> Option<SqlUpdate> {
        self.build("id = ?", &[id])
    }

    fn build(self, where_clause: &str, keys: &[u64]) -> Option<SqlUpdate> {
        if self.sets.is_empty() {
            return None;
        }

        let set_clause = self
            .sets
            .iter()
            .map(|k| format!("{} = ?", k))
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!("UPDATE {} SET {} WHERE {}", self.table, set_clause, where_clause);

        let mut values = self.values;
        values.extend(keys.iter().map(|k| SqlValue::U64(*k)));

        Some(SqlUpdate { sql, values })
    }
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_only_present_columns() {
        let update = UpdateBuilder::new("locations")
            .set("name", Some(SqlValue::String("HQ".into())))
            .set("address", None)
            .set("radius_meters", Some(SqlValue::U64(150)))
            .build_for_tenant(9, 2)
            .unwrap();

        assert_eq!(
            update.sql,
            "UPDATE locations SET name = ?, radius_meters = ? WHERE id = ? AND tenant_id = ?"
        );
        assert_eq!(
            update.values,
            vec![
                SqlValue::String("HQ".into()),
                SqlValue::U64(150),
                SqlValue::U64(9),
                SqlValue::U64(2),
            ]
        );
    }

    #[test]
    fn builds_by_id_only() {
        let update = UpdateBuilder::new("tenants")
            .set("address", Some(SqlValue::String("1 Main St".into())))
            .build_for_id(4)
            .unwrap();

        assert_eq!(update.sql, "UPDATE tenants SET address = ? WHERE id = ?");
        assert_eq!(update.values.len(), 2);
    }

    #[test]
    fn empty_update_builds_nothing() {
        let builder = UpdateBuilder::new("users").set("name", None);
        assert!(builder.is_empty());
        assert!(builder.build_for_tenant(1, 1).is_none());
    }
}
