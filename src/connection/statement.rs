//! Statements bound to a connection.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::datum::Value;
use crate::error::{Error, Result};
use crate::executor::{ExecutionContext, execute_select};
use crate::sql::{self, SelectStmt, Statement as SqlStatement};

use super::registry::{ConnectionId, ConnectionRegistry, ConnectionState};
use super::result_set::ResultSet;

/// Parses `sql`, requiring exactly one statement.
fn parse_single(sql: &str) -> Result<Box<SelectStmt>> {
    let mut statements = sql::parse(sql)?;
    match statements.len() {
        0 => Err(Error::EmptySql),
        1 => match statements.remove(0) {
            SqlStatement::Select(select) => Ok(select),
        },
        _ => Err(Error::UseBatchOperation),
    }
}

/// Runs one SELECT on the connection's current settings.
///
/// The cancel flag is cleared once the execution finishes, so a cancel
/// request applies to the running execution or, if none runs, to the next.
fn run(
    state: &ConnectionState,
    select: &SelectStmt,
    params: &[Value],
    max_rows: usize,
    cancel: &AtomicBool,
) -> Result<ResultSet> {
    let info = state.info.read().clone();
    let mut ctx = ExecutionContext::new(&state.catalog, &info.schema, &info.warnings, cancel);
    ctx.decode = info.decode_options();
    ctx.functions = info.function_context();
    ctx.escape = info.escape;
    ctx.max_rows = max_rows;
    ctx.parallel = info.parallel;

    let result = execute_select(select, params, &ctx);
    cancel.store(false, Ordering::Relaxed);
    Ok(result?.into())
}

/// A statement executing ad-hoc SQL text.
#[derive(Debug)]
pub struct Statement {
    connection: ConnectionId,
    registry: Arc<ConnectionRegistry>,
    max_rows: usize,
    cancel: Arc<AtomicBool>,
    batch: Vec<Box<SelectStmt>>,
}

impl Statement {
    pub(crate) fn new(connection: ConnectionId, registry: Arc<ConnectionRegistry>, max_rows: usize) -> Self {
        Self {
            connection,
            registry,
            max_rows,
            cancel: Arc::new(AtomicBool::new(false)),
            batch: Vec::new(),
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    /// Limits the number of returned rows; 0 is unlimited.
    pub fn set_max_rows(&mut self, max_rows: usize) {
        self.max_rows = max_rows;
    }

    /// Flag that cancels the running execution when set.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Executes a single parameterless query.
    pub fn execute_query(&self, sql: &str) -> Result<ResultSet> {
        let state = self.registry.get(self.connection)?;
        let select = parse_single(sql)?;
        run(&state, &select, &[], self.max_rows, &self.cancel)
    }

    /// Queues every statement of `sql` for [`execute_batch`](Self::execute_batch).
    pub fn add_batch(&mut self, sql: &str) -> Result<()> {
        self.registry.get(self.connection)?;
        for statement in sql::parse(sql)? {
            let SqlStatement::Select(select) = statement;
            self.batch.push(select);
        }
        Ok(())
    }

    pub fn clear_batch(&mut self) {
        self.batch.clear();
    }

    /// Executes and drains the queued statements in order.
    pub fn execute_batch(&mut self) -> Result<Vec<ResultSet>> {
        let state = self.registry.get(self.connection)?;
        let batch = std::mem::take(&mut self.batch);
        batch
            .iter()
            .map(|select| run(&state, select, &[], self.max_rows, &self.cancel))
            .collect()
    }
}

/// A parsed statement with `?` parameters.
///
/// Further statements with the same parameter count can be added with
/// [`add_batch`](Self::add_batch); [`add_parameter_set`](Self::add_parameter_set)
/// records the current parameter values as one batch execution.
#[derive(Debug)]
pub struct PreparedStatement {
    connection: ConnectionId,
    registry: Arc<ConnectionRegistry>,
    /// The prepared statement first, then batch additions.
    statements: Vec<Box<SelectStmt>>,
    parameters: Vec<Option<Value>>,
    executions: Vec<Vec<Option<Value>>>,
    max_rows: usize,
    cancel: Arc<AtomicBool>,
}

impl PreparedStatement {
    pub(crate) fn new(
        connection: ConnectionId,
        registry: Arc<ConnectionRegistry>,
        sql: &str,
        max_rows: usize,
    ) -> Result<Self> {
        let select = parse_single(sql)?;
        debug!(connection = %connection, parameters = select.parameter_count, "prepared statement");
        Ok(Self {
            connection,
            registry,
            parameters: vec![None; select.parameter_count],
            statements: vec![select],
            executions: Vec::new(),
            max_rows,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection
    }

    /// Number of `?` placeholders.
    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// Binds `value` to the 1-based parameter `index`.
    pub fn set_parameter(&mut self, index: usize, value: impl Into<Value>) -> Result<()> {
        let slot = index
            .checked_sub(1)
            .and_then(|i| self.parameters.get_mut(i))
            .ok_or(Error::InvalidParameterIndex { index })?;
        *slot = Some(value.into());
        Ok(())
    }

    pub fn clear_parameters(&mut self) {
        self.parameters.iter_mut().for_each(|p| *p = None);
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    /// Limits the number of returned rows; 0 is unlimited.
    pub fn set_max_rows(&mut self, max_rows: usize) {
        self.max_rows = max_rows;
    }

    /// Flag that cancels the running execution when set.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Bound values up to the first unset parameter; the executor reports
    /// the unset one by position.
    fn bound(parameters: &[Option<Value>]) -> Vec<Value> {
        parameters.iter().map_while(|p| p.clone()).collect()
    }

    /// Executes the prepared statement with the current parameters.
    pub fn execute_query(&self) -> Result<ResultSet> {
        let state = self.registry.get(self.connection)?;
        let params = Self::bound(&self.parameters);
        run(&state, &self.statements[0], &params, self.max_rows, &self.cancel)
    }

    /// Adds the statements of `sql` to the batch. Each must take as many
    /// parameters as the prepared statement.
    pub fn add_batch(&mut self, sql: &str) -> Result<()> {
        let statements = sql::parse(sql)?;
        for statement in &statements {
            if statement.parameter_count() != self.parameters.len() {
                return Err(Error::InconsistentParameterList {
                    expected: self.parameters.len(),
                    found: statement.parameter_count(),
                });
            }
        }
        self.statements
            .extend(statements.into_iter().map(|SqlStatement::Select(select)| select));
        Ok(())
    }

    /// Records the current parameter values as one batch execution.
    pub fn add_parameter_set(&mut self) {
        self.executions.push(self.parameters.clone());
    }

    /// Drops batch statements and recorded parameter sets.
    pub fn clear_batch(&mut self) {
        self.statements.truncate(1);
        self.executions.clear();
    }

    /// Executes every statement once per recorded parameter set, or once
    /// with the current parameters when none was recorded.
    pub fn execute_batch(&mut self) -> Result<Vec<ResultSet>> {
        let state = self.registry.get(self.connection)?;
        let executions = if self.executions.is_empty() {
            vec![self.parameters.clone()]
        } else {
            std::mem::take(&mut self.executions)
        };
        let mut results = Vec::with_capacity(self.statements.len() * executions.len());
        for select in &self.statements {
            for parameters in &executions {
                let params = Self::bound(parameters);
                results.push(run(&state, select, &params, self.max_rows, &self.cancel)?);
            }
        }
        Ok(results)
    }
}
