//! In-process table store for demo mode and tests.

use crate::tables::{Filter, Row, TableStore};
use crate::{SocialError, SocialResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Keeps a parent row's count column in step with a child table, the way
/// database triggers do for `likes_count` and `member_count`.
#[derive(Debug, Clone)]
struct CounterRule {
    child_table: &'static str,
    foreign_key: &'static str,
    parent_table: &'static str,
    column: &'static str,
}

const COUNTER_RULES: &[CounterRule] = &[
    CounterRule {
        child_table: "post_likes",
        foreign_key: "post_id",
        parent_table: "posts",
        column: "likes_count",
    },
    CounterRule {
        child_table: "group_members",
        foreign_key: "group_id",
        parent_table: "groups",
        column: "member_count",
    },
    CounterRule {
        child_table: "posts",
        foreign_key: "group_id",
        parent_table: "groups",
        column: "post_count",
    },
];

/// Column sets that must be unique per table, besides `id`.
const UNIQUE_KEYS: &[(&str, &[&str])] = &[
    ("group_members", &["group_id", "user_id"]),
    ("post_likes", &["post_id", "user_id"]),
];

#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<String, Vec<Row>>,
    next_id: HashMap<String, i64>,
}

/// Table store held entirely in memory.
///
/// Rows without an `id` get the next integer id for their table. Inserting
/// a duplicate key fails with status 409, as PostgREST does.
#[derive(Debug, Default)]
pub struct MemoryTables {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

impl MemoryTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with status 503 until turned back off.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Load rows as they are, leaving count columns untouched.
    pub fn seed(&self, table: &str, rows: Vec<Row>) {
        self.lock()
            .rows
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    /// All rows of `table` in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.lock().rows.get(table).cloned().unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn ensure_available(&self) -> SocialResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SocialError::Supabase {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

impl Tables {
    fn insert_row(&mut self, table: &str, mut row: Row) -> SocialResult<Row> {
        let existing = self.rows.entry(table.to_string()).or_default();

        let id = match row.get("id") {
            Some(id) if !id.is_null() => id.clone(),
            _ => {
                let next = self.next_id.entry(table.to_string()).or_insert(0);
                let max_existing = existing
                    .iter()
                    .filter_map(|r| r.get("id").and_then(Value::as_i64))
                    .max()
                    .unwrap_or(0);
                *next = (*next).max(max_existing) + 1;
                Value::from(*next)
            }
        };
        row.insert("id".to_string(), id.clone());

        let duplicate_id = existing.iter().any(|r| r.get("id") == Some(&id));
        let duplicate_key = UNIQUE_KEYS
            .iter()
            .filter(|(t, _)| *t == table)
            .any(|(_, columns)| {
                existing
                    .iter()
                    .any(|r| columns.iter().all(|c| r.get(*c) == row.get(*c)))
            });
        if duplicate_id || duplicate_key {
            return Err(SocialError::Supabase {
                status: 409,
                message: format!("duplicate key value violates unique constraint on {}", table),
            });
        }

        existing.push(row.clone());
        self.adjust_counters(table, &row, 1);
        Ok(row)
    }

    fn adjust_counters(&mut self, child_table: &str, child: &Row, delta: i64) {
        for rule in COUNTER_RULES.iter().filter(|r| r.child_table == child_table) {
            let Some(parent_id) = child.get(rule.foreign_key).filter(|v| !v.is_null()) else {
                continue;
            };
            let Some(parents) = self.rows.get_mut(rule.parent_table) else {
                continue;
            };
            let parent_filter = Filter::new().eq("id", parent_id.clone());
            for parent in parents.iter_mut().filter(|p| parent_filter.matches(p)) {
                let current = parent.get(rule.column).and_then(Value::as_i64).unwrap_or(0);
                parent.insert(rule.column.to_string(), Value::from((current + delta).max(0)));
            }
        }
    }
}

#[async_trait]
impl TableStore for MemoryTables {
    async fn select(&self, table: &str, filter: &Filter) -> SocialResult<Vec<Row>> {
        self.ensure_available()?;
        let tables = self.lock();
        let mut rows: Vec<Row> = tables
            .rows
            .get(table)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default();
        drop(tables);

        filter.sort(&mut rows);
        debug!(table = %table, rows = rows.len(), "Memory select");
        Ok(rows)
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> SocialResult<Vec<Row>> {
        self.ensure_available()?;
        let mut tables = self.lock();
        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            inserted.push(tables.insert_row(table, row)?);
        }
        debug!(table = %table, rows = inserted.len(), "Memory insert");
        Ok(inserted)
    }

    async fn delete(&self, table: &str, filter: &Filter) -> SocialResult<()> {
        self.ensure_available()?;
        if filter.is_unfiltered() {
            return Err(SocialError::Config(format!(
                "refusing unfiltered delete on {}",
                table
            )));
        }

        let mut tables = self.lock();
        let removed: Vec<Row> = match tables.rows.get_mut(table) {
            Some(rows) => {
                let (gone, kept): (Vec<Row>, Vec<Row>) =
                    rows.drain(..).partition(|r| filter.matches(r));
                *rows = kept;
                gone
            }
            None => Vec::new(),
        };
        for row in &removed {
            tables.adjust_counters(table, row, -1);
        }
        debug!(table = %table, rows = removed.len(), "Memory delete");
        Ok(())
    }
}
