use std::fmt::Debug;
use std::io;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::stream;
use futures::Sink;
use pgwire::api::auth::cleartext::CleartextPasswordAuthStartupHandler;
use pgwire::api::auth::{DefaultServerParameterProvider, StartupHandler};
use pgwire::api::copy::CopyHandler;
use pgwire::api::portal::{Format, Portal};
use pgwire::api::query::{ExtendedQueryHandler, SimpleQueryHandler};
use pgwire::api::results::{
    DataRowEncoder, DescribePortalResponse, DescribeStatementResponse, FieldInfo, QueryResponse,
    Response, Tag,
};
use pgwire::api::stmt::{QueryParser, StoredStatement};
use pgwire::api::store::PortalStore;
use pgwire::api::{ClientInfo, ClientPortalStore, NoopHandler, PgWireServerHandlers, Type};
use pgwire::error::{ErrorInfo, PgWireError, PgWireResult};
use pgwire::messages::PgWireBackendMessage;
use pgwire::tokio::TlsAcceptor;
use tokio::net::TcpStream;

use crate::auth::TablebookAuthSource;
use crate::engine::{AdmissionError, InvalidRangeError, ReservationStore};
use crate::model::*;
use crate::observability;
use crate::request::{self, RequestError};
use crate::sql::{self, Command, SqlError};

pub struct TablebookHandler {
    store: Arc<ReservationStore>,
    query_parser: Arc<TablebookQueryParser>,
}

impl TablebookHandler {
    pub fn new(store: Arc<ReservationStore>) -> Self {
        Self {
            store,
            query_parser: Arc::new(TablebookQueryParser),
        }
    }

    async fn execute_sql(&self, sql: &str, format: &Format) -> PgWireResult<Response> {
        let cmd = sql::parse_sql(sql).map_err(sql_err)?;
        let label = observability::command_label(&cmd);
        let started = Instant::now();
        let result = self.execute_command(cmd, format).await;
        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(observability::QUERIES_TOTAL, "command" => label, "status" => status)
            .increment(1);
        metrics::histogram!(observability::QUERY_DURATION_SECONDS, "command" => label)
            .record(started.elapsed().as_secs_f64());
        result
    }

    async fn execute_command(&self, cmd: Command, format: &Format) -> PgWireResult<Response> {
        let store = &self.store;
        match cmd {
            Command::InsertReservation { request } => {
                let draft = request.into_draft().map_err(request_err)?;
                let id = store.save(draft).await.map_err(admission_err)?;

                let schema = Arc::new(id_schema(format));
                let mut encoder = DataRowEncoder::new(schema.clone());
                encoder.encode_field(&id.to_string())?;
                let rows = vec![Ok(encoder.take_row())];
                Ok(Response::Query(QueryResponse::new(schema, stream::iter(rows))))
            }
            Command::DeleteReservation { id } => {
                let removed = store.delete(&id).await;
                Ok(Response::Execution(
                    Tag::new("DELETE").with_rows(usize::from(removed.is_some())),
                ))
            }
            Command::SelectAll => Ok(reservation_rows(store.get_all().await, format)),
            Command::SelectById { id } => {
                let found = store.get(&id).await.into_iter().collect();
                Ok(reservation_rows(found, format))
            }
            Command::SelectDay { date } => {
                let day = request::parse_day(date.as_deref()).map_err(request_err)?;
                Ok(reservation_rows(store.reservations_of_day(day).await, format))
            }
            Command::SelectBetween { start, end } => {
                let found = store
                    .reservations_between(start, end)
                    .await
                    .map_err(range_err)?;
                Ok(reservation_rows(found, format))
            }
            Command::SelectAvailability { date, time } => {
                let at = request::parse_instant(date.as_deref(), time.as_deref())
                    .map_err(request_err)?;
                let open = store.open_tables_at(at).await;

                let schema = Arc::new(availability_schema(format));
                let mut encoder = DataRowEncoder::new(schema.clone());
                encoder.encode_field(&request::format_date(at))?;
                encoder.encode_field(&request::format_time(at))?;
                encoder.encode_field(&i32::try_from(open).unwrap_or(i32::MAX))?;
                let rows = vec![Ok(encoder.take_row())];
                Ok(Response::Query(QueryResponse::new(schema, stream::iter(rows))))
            }
        }
    }
}

fn reservation_rows(reservations: Vec<Reservation>, format: &Format) -> Response {
    let schema = Arc::new(reservation_schema(format));
    let rows: Vec<PgWireResult<_>> = reservations
        .into_iter()
        .map(|r| {
            let mut encoder = DataRowEncoder::new(schema.clone());
            encoder.encode_field(&r.id.to_string())?;
            encoder.encode_field(&r.customer_name)?;
            encoder.encode_field(&i32::try_from(r.party_size).unwrap_or(i32::MAX))?;
            encoder.encode_field(&request::format_date(r.timestamp))?;
            encoder.encode_field(&request::format_time(r.timestamp))?;
            Ok(encoder.take_row())
        })
        .collect();
    Response::Query(QueryResponse::new(schema, stream::iter(rows)))
}

fn field(name: &str, ty: Type, format: &Format, idx: usize) -> FieldInfo {
    FieldInfo::new(name.into(), None, None, ty, format.format_for(idx))
}

fn id_schema(format: &Format) -> Vec<FieldInfo> {
    vec![field("id", Type::VARCHAR, format, 0)]
}

fn reservation_schema(format: &Format) -> Vec<FieldInfo> {
    vec![
        field("id", Type::VARCHAR, format, 0),
        field("customer_name", Type::VARCHAR, format, 1),
        field("party_size", Type::INT4, format, 2),
        field("date", Type::VARCHAR, format, 3),
        field("time", Type::VARCHAR, format, 4),
    ]
}

fn availability_schema(format: &Format) -> Vec<FieldInfo> {
    vec![
        field("date", Type::VARCHAR, format, 0),
        field("time", Type::VARCHAR, format, 1),
        field("open_tables", Type::INT4, format, 2),
    ]
}

/// Result columns for a statement, decided from its text so that statements
/// with unbound `$N` placeholders can still be described.
fn result_schema(sql: &str, format: &Format) -> Vec<FieldInfo> {
    let upper = sql.trim_start().to_uppercase();
    if upper.starts_with("INSERT") {
        id_schema(format)
    } else if upper.starts_with("SELECT") && upper.contains("AVAILABILITY") {
        availability_schema(format)
    } else if upper.starts_with("SELECT") {
        reservation_schema(format)
    } else {
        vec![]
    }
}

#[async_trait]
impl SimpleQueryHandler for TablebookHandler {
    async fn do_query<C>(
        &self,
        _client: &mut C,
        query: &str,
    ) -> PgWireResult<Vec<Response>>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        Ok(vec![self.execute_sql(query, &Format::UnifiedText).await?])
    }
}

// ── Extended Query Protocol ──────────────────────────────────────

#[derive(Debug)]
pub struct TablebookQueryParser;

#[async_trait]
impl QueryParser for TablebookQueryParser {
    type Statement = String;

    async fn parse_sql<C>(
        &self,
        _client: &C,
        sql: &str,
        _types: &[Option<Type>],
    ) -> PgWireResult<String>
    where
        C: ClientInfo + Unpin + Send + Sync,
    {
        Ok(sql.to_string())
    }

    fn get_parameter_types(&self, stmt: &String) -> PgWireResult<Vec<Type>> {
        Ok(vec![Type::VARCHAR; count_params(stmt)])
    }

    fn get_result_schema(
        &self,
        stmt: &String,
        column_format: Option<&Format>,
    ) -> PgWireResult<Vec<FieldInfo>> {
        Ok(result_schema(
            stmt,
            column_format.unwrap_or(&Format::UnifiedText),
        ))
    }
}

#[async_trait]
impl ExtendedQueryHandler for TablebookHandler {
    type Statement = String;
    type QueryParser = TablebookQueryParser;

    fn query_parser(&self) -> Arc<Self::QueryParser> {
        self.query_parser.clone()
    }

    async fn do_query<C>(
        &self,
        _client: &mut C,
        portal: &Portal<Self::Statement>,
        _max_rows: usize,
    ) -> PgWireResult<Response>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        let sql = substitute_params(portal);
        self.execute_sql(&sql, &portal.result_column_format).await
    }

    async fn do_describe_statement<C>(
        &self,
        _client: &mut C,
        target: &StoredStatement<Self::Statement>,
    ) -> PgWireResult<DescribeStatementResponse>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        let param_types = vec![Type::VARCHAR; count_params(&target.statement)];
        Ok(DescribeStatementResponse::new(
            param_types,
            result_schema(&target.statement, &Format::UnifiedText),
        ))
    }

    async fn do_describe_portal<C>(
        &self,
        _client: &mut C,
        target: &Portal<Self::Statement>,
    ) -> PgWireResult<DescribePortalResponse>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        Ok(DescribePortalResponse::new(result_schema(
            &target.statement.statement,
            &target.result_column_format,
        )))
    }
}

/// Highest `$N` placeholder in the statement.
fn count_params(sql: &str) -> usize {
    let mut max = 0;
    let mut rest = sql;
    while let Some(pos) = rest.find('$') {
        rest = &rest[pos + 1..];
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if let Ok(n) = rest[..digits].parse::<usize>() {
            max = max.max(n);
        }
        rest = &rest[digits..];
    }
    max
}

fn substitute_params(portal: &Portal<String>) -> String {
    let params: Vec<Option<&[u8]>> = portal.parameters.iter().map(|p| p.as_deref()).collect();
    bind_params(&portal.statement.statement, &params)
}

/// Inline bound text parameters as quoted literals in one pass over the
/// statement. `$N` inside quoted literals or identifiers is left alone, and
/// substituted values are never rescanned.
fn bind_params(sql: &str, params: &[Option<&[u8]>]) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut quote: Option<char> = None;
    let mut chars = sql.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
                out.push(c);
            }
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                out.push(c);
            }
            None if c == '$' => {
                let start = i + 1;
                let mut end = start;
                while let Some(&(j, d)) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    end = j + 1;
                    chars.next();
                }
                let bound = sql[start..end]
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|idx| params.get(idx));
                match bound {
                    Some(Some(bytes)) => {
                        out.push('\'');
                        out.push_str(&String::from_utf8_lossy(bytes).replace('\'', "''"));
                        out.push('\'');
                    }
                    Some(None) => out.push_str("NULL"),
                    None => out.push_str(&sql[i..end]),
                }
            }
            None => out.push(c),
        }
    }
    out
}

// ── Factory ──────────────────────────────────────────────────────

pub struct TablebookFactory {
    handler: Arc<TablebookHandler>,
    auth_handler: Arc<
        CleartextPasswordAuthStartupHandler<TablebookAuthSource, DefaultServerParameterProvider>,
    >,
    noop: Arc<NoopHandler>,
}

impl TablebookFactory {
    pub fn new(store: Arc<ReservationStore>, password: String) -> Self {
        let auth_source = TablebookAuthSource::new(password);
        let param_provider = DefaultServerParameterProvider::default();
        Self {
            handler: Arc::new(TablebookHandler::new(store)),
            auth_handler: Arc::new(CleartextPasswordAuthStartupHandler::new(
                auth_source,
                param_provider,
            )),
            noop: Arc::new(NoopHandler),
        }
    }
}

impl PgWireServerHandlers for TablebookFactory {
    fn simple_query_handler(&self) -> Arc<impl SimpleQueryHandler> {
        self.handler.clone()
    }

    fn extended_query_handler(&self) -> Arc<impl ExtendedQueryHandler> {
        self.handler.clone()
    }

    fn startup_handler(&self) -> Arc<impl StartupHandler> {
        self.auth_handler.clone()
    }

    fn copy_handler(&self) -> Arc<impl CopyHandler> {
        self.noop.clone()
    }
}

/// Serve one client until it disconnects.
pub async fn process_connection(
    socket: TcpStream,
    store: Arc<ReservationStore>,
    password: String,
    tls: Option<TlsAcceptor>,
) -> io::Result<()> {
    let factory = Arc::new(TablebookFactory::new(store, password));
    pgwire::tokio::process_socket(socket, tls, factory).await
}

// ── Errors ───────────────────────────────────────────────────────

fn user_error(code: &str, message: String) -> PgWireError {
    PgWireError::UserError(Box::new(ErrorInfo::new(
        "ERROR".into(),
        code.into(),
        message,
    )))
}

fn admission_err(e: AdmissionError) -> PgWireError {
    user_error("P0001", e.to_string())
}

fn range_err(e: InvalidRangeError) -> PgWireError {
    user_error("P0001", e.to_string())
}

fn request_err(e: RequestError) -> PgWireError {
    user_error("22023", e.to_string())
}

fn sql_err(e: SqlError) -> PgWireError {
    user_error("42601", e.to_string())
}
