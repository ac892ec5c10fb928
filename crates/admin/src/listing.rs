//! List requests: query args, filtering, search, sorting and paging.

use crate::{
    actions::HeadActions,
    error::AdminError,
    rbac::PermissionChecker,
    response::ListResponse,
};
use chrono::{DateTime, Utc};
use filter_engine::{
    FilterBackend, FilterSettings, LikePattern, RecordFilterBackend, SqlFilterBackend, TableSchema,
    evaluate,
};
use filter_syntax::parser::parse;
use model::{core::value::Value, records::row::Record};
use planner::query::{
    ast::{common::OrderDir, select::Select},
    dialect::Dialect,
    renderer::{Statement, render},
    value,
};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const PAGE_SIZE_CHOICES: [u64; 3] = [20, 50, 100];

/// Largest page or limit a request may ask for. SQL bind ints are signed.
const MAX_QUERY_INT: u64 = i64::MAX as u64;

const RESERVED_ARGS: [&str; 6] = ["page", "limit", "field", "desc", "search", "filterSos"];

/// Decoded query args of one list request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListArgs {
    /// 1-based.
    pub page: u64,
    /// 0 means the view's own page size.
    pub limit: u64,
    pub sort_field: Option<String>,
    pub sort_desc: bool,
    pub search: Option<String>,
    pub filter: Option<String>,
    /// Args the list machinery does not read, in request order.
    pub extra: Vec<(String, String)>,
}

impl ListArgs {
    pub fn from_query<I, K, V>(args: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut parsed = ListArgs {
            page: 1,
            ..ListArgs::default()
        };

        for (key, val) in args {
            let (key, val) = (key.as_ref(), val.as_ref());
            match key {
                "page" => parsed.page = int_arg(key, val).unwrap_or(1).clamp(1, MAX_QUERY_INT),
                "limit" => parsed.limit = int_arg(key, val).unwrap_or(0).min(MAX_QUERY_INT),
                "field" => parsed.sort_field = non_empty(val),
                "desc" => parsed.sort_desc = val.trim().parse::<i64>().is_ok_and(|d| d != 0),
                "search" => parsed.search = non_empty(val),
                "filterSos" => parsed.filter = non_empty(val),
                _ if key.starts_with("flt") => {}
                _ => parsed.extra.push((key.to_string(), val.to_string())),
            }
        }

        parsed
    }

    pub fn is_reserved(key: &str) -> bool {
        RESERVED_ARGS.contains(&key) || key.starts_with("flt")
    }
}

fn int_arg(key: &str, val: &str) -> Option<u64> {
    let parsed = val.trim().parse::<u64>().ok();
    if parsed.is_none() {
        debug!("Ignoring non-numeric list arg {}={:?}", key, val);
    }
    parsed
}

/// Rows skipped before `page`. Saturates instead of overflowing.
fn page_offset(page: u64, page_size: u64) -> u64 {
    page.max(1).saturating_sub(1).saturating_mul(page_size)
}

fn sql_int(n: u64) -> Value {
    Value::Int(i64::try_from(n).unwrap_or(i64::MAX))
}

fn non_empty(val: &str) -> Option<String> {
    let trimmed = val.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Page sizes offered by the table widget.
pub fn page_limits(page_size: u64, can_set_page_size: bool) -> Vec<u64> {
    if !can_set_page_size {
        return vec![page_size];
    }
    let mut limits = PAGE_SIZE_CHOICES.to_vec();
    if !limits.contains(&page_size) {
        limits.insert(0, page_size);
    }
    limits
}

/// Settings the table widget needs before its first request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableConfig {
    pub limit: u64,
    pub limits: Vec<u64>,
    pub actions: Vec<serde_json::Value>,
    pub column_display_checkbox: bool,
}

/// A list endpoint over one table.
#[derive(Debug, Clone)]
pub struct ListView {
    pub endpoint: String,
    pub schema: TableSchema,
    pub page_size: u64,
    pub can_set_page_size: bool,
    /// Fields matched by the free-text `search` arg.
    pub searchable: Vec<String>,
    /// Fields the list may be sorted by. Empty means every schema field.
    pub sortable: Vec<String>,
}

/// The queries for one page of a list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPlan {
    pub select: Select,
    pub count: Select,
    pub page: u64,
    pub page_size: u64,
}

impl ListPlan {
    /// Renders `(page query, count query)`.
    pub fn render(&self, dialect: &dyn Dialect) -> (Statement, Statement) {
        (render(&self.select, dialect), render(&self.count, dialect))
    }
}

impl ListView {
    pub fn new(endpoint: &str, schema: TableSchema) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            schema,
            page_size: DEFAULT_PAGE_SIZE,
            can_set_page_size: false,
            searchable: Vec::new(),
            sortable: Vec::new(),
        }
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_page_size_choice(mut self) -> Self {
        self.can_set_page_size = true;
        self
    }

    pub fn searchable(mut self, fields: &[&str]) -> Self {
        self.searchable = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn sortable(mut self, fields: &[&str]) -> Self {
        self.sortable = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn table_config(&self, head: &HeadActions) -> TableConfig {
        TableConfig {
            limit: self.page_size,
            limits: page_limits(self.page_size, self.can_set_page_size),
            actions: head.actions.iter().map(|a| a.to_json()).collect(),
            column_display_checkbox: head.display_checkbox,
        }
    }

    pub fn effective_page_size(&self, args: &ListArgs) -> u64 {
        if args.limit == 0 {
            self.page_size
        } else {
            args.limit
        }
    }

    /// Builds the page and count queries for `args`.
    pub fn plan(
        &self,
        args: &ListArgs,
        checker: &dyn PermissionChecker,
        now: DateTime<Utc>,
        settings: FilterSettings,
    ) -> Result<ListPlan, AdminError> {
        self.authorize(checker)?;

        let backend = SqlFilterBackend::new(&self.schema);
        let condition = self.condition(args, &backend, now, settings)?;
        let mut builder = self.schema.select().filter(condition);
        let count = builder.ast.to_count();

        if let Some((field, desc)) = self.sort_key(args) {
            let column = backend.resolve_field(field)?;
            let direction = if desc { OrderDir::Desc } else { OrderDir::Asc };
            builder = builder.order_by(column, Some(direction));
        }

        let page_size = self.effective_page_size(args);
        if page_size > 0 {
            let offset = page_offset(args.page, page_size);
            builder = builder
                .limit(value(sql_int(page_size)))
                .offset(value(sql_int(offset)));
        }

        debug!(
            "Planned list of '{}' page {} with page size {}",
            self.endpoint, args.page, page_size
        );

        Ok(ListPlan {
            select: builder.build(),
            count,
            page: args.page,
            page_size,
        })
    }

    /// Lists already loaded records the same way [`ListView::plan`] queries a
    /// table.
    pub fn list_records(
        &self,
        args: &ListArgs,
        records: &[Record],
        checker: &dyn PermissionChecker,
        now: DateTime<Utc>,
        settings: FilterSettings,
    ) -> Result<ListResponse, AdminError> {
        self.authorize(checker)?;

        let backend =
            RecordFilterBackend::new(self.schema.fields()).with_timezone(settings.timezone);
        let mut matched: Vec<&Record> = match self.condition(args, &backend, now, settings)? {
            Some(predicate) => predicate.filter(records),
            None => records.iter().collect(),
        };

        if let Some((field, desc)) = self.sort_key(args) {
            backend.resolve_field(field)?;
            matched.sort_by(|a, b| {
                let ord = a
                    .get_value(field)
                    .compare(&b.get_value(field))
                    .unwrap_or(Ordering::Equal);
                if desc { ord.reverse() } else { ord }
            });
        }

        let count = matched.len() as u64;
        let page_size = self.effective_page_size(args);
        let data = if page_size == 0 {
            matched.iter().map(|r| r.to_json()).collect()
        } else {
            matched
                .iter()
                .skip(usize::try_from(page_offset(args.page, page_size)).unwrap_or(usize::MAX))
                .take(usize::try_from(page_size).unwrap_or(usize::MAX))
                .map(|r| r.to_json())
                .collect()
        };

        Ok(ListResponse::new(count, args.page, page_size, data))
    }

    fn authorize(&self, checker: &dyn PermissionChecker) -> Result<(), AdminError> {
        let code = format!("{}.list", self.endpoint);
        if checker.has_permission(&code) {
            Ok(())
        } else {
            Err(AdminError::Forbidden(code))
        }
    }

    /// The `filterSos` tree ANDed with the search condition.
    fn condition<B: FilterBackend>(
        &self,
        args: &ListArgs,
        backend: &B,
        now: DateTime<Utc>,
        settings: FilterSettings,
    ) -> Result<Option<B::Condition>, AdminError> {
        let filtered = match &args.filter {
            Some(payload) => evaluate(&parse(payload)?, backend, now, settings)?,
            None => None,
        };
        let searched = match &args.search {
            Some(needle) => self.search(backend, needle)?,
            None => None,
        };

        Ok(match (filtered, searched) {
            (Some(f), Some(s)) => Some(backend.and(f, s)),
            (f, s) => f.or(s),
        })
    }

    fn search<B: FilterBackend>(
        &self,
        backend: &B,
        needle: &str,
    ) -> Result<Option<B::Condition>, AdminError> {
        let pattern = LikePattern::Contains(needle.to_string());
        let mut condition = None;
        for field in &self.searchable {
            let like = backend.like(&backend.resolve_field(field)?, &pattern);
            condition = Some(match condition {
                Some(acc) => backend.or(acc, like),
                None => like,
            });
        }
        Ok(condition)
    }

    /// Unknown or non-sortable fields leave the list unsorted.
    fn sort_key<'a>(&self, args: &'a ListArgs) -> Option<(&'a str, bool)> {
        let field = args.sort_field.as_deref()?;
        let allowed = if self.sortable.is_empty() {
            self.schema.column_for(field).is_some()
        } else {
            self.sortable.iter().any(|f| f == field)
        };
        if !allowed {
            debug!("Ignoring sort on '{}' for '{}'", field, self.endpoint);
            return None;
        }
        Some((field, args.sort_desc))
    }
}
