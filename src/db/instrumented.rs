//! Timed, logged wrappers around sqlx MySQL calls.
//!
//! Each wrapper times the driver call, forwards the query and arguments
//! unchanged, and emits exactly one telemetry event. Every function accepts any
//! sqlx executor, so the same calls serve a pool, a single connection or an
//! open transaction (`&mut *tx`).

use std::future::Future;
use std::sync::Arc;

use sqlx::mysql::{MySql, MySqlQueryResult, MySqlRow};
use sqlx::Executor;
use thiserror::Error;
use tokio::time::Instant;

use crate::context::{Done, RequestContext};
use crate::db::value::{bind_all, render_args, DbValue};
use crate::telemetry::event::DbCallEvent;
use crate::telemetry::sink::{emit, TelemetrySink, TracingSink};

pub const DB_EXEC_OPERATION: &str = "mysql.exec";
pub const DB_QUERY_OPERATION: &str = "mysql.query";
pub const DB_QUERY_ROW_OPERATION: &str = "mysql.query_row";

/// Errors from instrumented database calls.
#[derive(Debug, Error)]
pub enum DbError {
    /// Passed through from the driver.
    #[error("Database error: {0}")]
    Driver(#[from] sqlx::Error),

    #[error("database call cancelled")]
    Cancelled,

    #[error("database call deadline exceeded")]
    DeadlineExceeded,
}

impl From<Done> for DbError {
    fn from(done: Done) -> Self {
        match done {
            Done::Cancelled => DbError::Cancelled,
            Done::DeadlineExceeded => DbError::DeadlineExceeded,
        }
    }
}

/// Result of [`InstrumentedDb::query_row`]. Driver errors are reported when
/// the row is taken, not when the call is logged.
#[derive(Debug)]
pub struct DeferredRow {
    result: Result<Option<MySqlRow>, DbError>,
}

impl DeferredRow {
    /// The row, or `sqlx::Error::RowNotFound` if the query matched nothing.
    pub fn into_row(self) -> Result<MySqlRow, DbError> {
        self.result?
            .ok_or(DbError::Driver(sqlx::Error::RowNotFound))
    }

    /// The row if one matched.
    pub fn optional(self) -> Result<Option<MySqlRow>, DbError> {
        self.result
    }
}

/// Database call wrapper carrying the telemetry sink.
#[derive(Clone)]
pub struct InstrumentedDb {
    sink: Arc<dyn TelemetrySink>,
}

impl Default for InstrumentedDb {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

impl InstrumentedDb {
    pub fn new(sink: Arc<dyn TelemetrySink>) -> Self {
        Self { sink }
    }

    /// Execute a statement.
    pub async fn exec<'c, E>(
        &self,
        ctx: &RequestContext,
        executor: E,
        query: &str,
        args: &[DbValue],
    ) -> Result<MySqlQueryResult, DbError>
    where
        E: Executor<'c, Database = MySql>,
    {
        let start = Instant::now();
        let result = within(ctx, bind_all(sqlx::query(query), args).execute(executor)).await;
        self.finish(ctx, DB_EXEC_OPERATION, query, args, start, result.as_ref().err());
        result
    }

    /// Run a query and collect its result set.
    pub async fn query<'c, E>(
        &self,
        ctx: &RequestContext,
        executor: E,
        query: &str,
        args: &[DbValue],
    ) -> Result<Vec<MySqlRow>, DbError>
    where
        E: Executor<'c, Database = MySql>,
    {
        let start = Instant::now();
        let result = within(ctx, bind_all(sqlx::query(query), args).fetch_all(executor)).await;
        self.finish(ctx, DB_QUERY_OPERATION, query, args, start, result.as_ref().err());
        result
    }

    /// Run a query expected to return at most one row. Always logged as
    /// informational; the outcome is read from the returned [`DeferredRow`].
    pub async fn query_row<'c, E>(
        &self,
        ctx: &RequestContext,
        executor: E,
        query: &str,
        args: &[DbValue],
    ) -> DeferredRow
    where
        E: Executor<'c, Database = MySql>,
    {
        let start = Instant::now();
        let result = within(ctx, bind_all(sqlx::query(query), args).fetch_optional(executor)).await;
        self.finish(ctx, DB_QUERY_ROW_OPERATION, query, args, start, None);
        DeferredRow { result }
    }

    fn finish(
        &self,
        ctx: &RequestContext,
        operation: &'static str,
        query: &str,
        args: &[DbValue],
        start: Instant,
        error: Option<&DbError>,
    ) {
        let event = DbCallEvent {
            operation,
            query: query.to_string(),
            args: render_args(args),
            duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            error: error.map(ToString::to_string),
        }
        .into();
        emit(self.sink.as_ref(), ctx, &event);
    }
}

/// Race a driver future against the context.
async fn within<T, F>(ctx: &RequestContext, fut: F) -> Result<T, DbError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    if let Some(done) = ctx.check() {
        return Err(done.into());
    }
    tokio::select! {
        biased;
        done = ctx.done() => Err(done.into()),
        result = fut => result.map_err(DbError::Driver),
    }
}
