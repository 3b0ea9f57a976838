//! Connection pooling for a libSQL database handle, on `deadpool`.
//!
//! Connections idle longer than the idle timeout fail recycling and are
//! replaced on the next checkout. A [`Checkout`] only goes back to the pool
//! when [`Checkout::release`] is called; dropping it any other way (error,
//! cancellation) closes the connection.

use std::future::Future;
use std::ops::Deref;
use std::time::Duration;

use deadpool::Runtime;
use deadpool::managed::{self, Metrics, Object, PoolError, RecycleError, RecycleResult};

use crate::error::DatabaseError;

/// Sizing and timing for a [`ConnectionPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    pub max_connections: usize,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_connections: 5,
            idle_timeout: Duration::from_secs(30),
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&gaze_config::DatabaseConfig> for PoolOptions {
    fn from(config: &gaze_config::DatabaseConfig) -> Self {
        Self {
            max_connections: config.max_connections,
            idle_timeout: config.idle_timeout(),
            acquire_timeout: config.acquire_timeout(),
        }
    }
}

/// `deadpool` manager that opens connections on one libSQL database.
pub struct LibsqlManager {
    db: libsql::Database,
    /// Set for local files so concurrent writers wait instead of failing
    /// with `SQLITE_BUSY`.
    busy_timeout: Option<Duration>,
    idle_timeout: Duration,
}

impl LibsqlManager {
    fn connect(&self) -> Result<libsql::Connection, libsql::Error> {
        let conn = self.db.connect()?;
        if let Some(timeout) = self.busy_timeout {
            conn.busy_timeout(timeout)?;
        }
        Ok(conn)
    }
}

impl managed::Manager for LibsqlManager {
    type Type = libsql::Connection;
    type Error = libsql::Error;

    fn create(&self) -> impl Future<Output = Result<Self::Type, Self::Error>> + Send {
        std::future::ready(self.connect())
    }

    fn recycle(
        &self,
        _conn: &mut Self::Type,
        metrics: &Metrics,
    ) -> impl Future<Output = RecycleResult<Self::Error>> + Send {
        let result = if metrics.last_used() >= self.idle_timeout {
            Err(RecycleError::Message("idle timeout elapsed".into()))
        } else {
            Ok(())
        };
        std::future::ready(result)
    }
}

pub struct ConnectionPool {
    inner: managed::Pool<LibsqlManager>,
    options: PoolOptions,
}

impl ConnectionPool {
    pub(crate) fn new(
        db: libsql::Database,
        options: PoolOptions,
        local: bool,
    ) -> Result<Self, DatabaseError> {
        let manager = LibsqlManager {
            db,
            busy_timeout: local.then_some(options.acquire_timeout),
            idle_timeout: options.idle_timeout,
        };
        let inner = managed::Pool::builder(manager)
            .max_size(options.max_connections)
            .wait_timeout(Some(options.acquire_timeout))
            .create_timeout(Some(options.acquire_timeout))
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| DatabaseError::InvalidState(format!("connection pool: {e}")))?;
        Ok(Self { inner, options })
    }

    /// Borrow a connection, waiting up to the acquire timeout for a free slot.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::PoolTimeout` when no slot frees up in time, or
    /// `DatabaseError::LibSql` if a fresh connection cannot be opened.
    pub async fn checkout(&self) -> Result<Checkout, DatabaseError> {
        let conn = self.inner.get().await.map_err(|e| match e {
            PoolError::Timeout(_) => DatabaseError::PoolTimeout(self.options.acquire_timeout),
            PoolError::Backend(e) => DatabaseError::LibSql(e),
            other => DatabaseError::InvalidState(format!("connection pool: {other}")),
        })?;
        Ok(Checkout {
            conn: Some(conn),
            released: false,
        })
    }

    pub fn status(&self) -> managed::Status {
        self.inner.status()
    }

    pub const fn options(&self) -> &PoolOptions {
        &self.options
    }
}

/// A connection borrowed from a [`ConnectionPool`].
///
/// Closed on drop unless [`Checkout::release`] was called first.
pub struct Checkout {
    conn: Option<Object<LibsqlManager>>,
    released: bool,
}

impl Checkout {
    /// Hand the connection back to the pool for reuse.
    pub fn release(mut self) {
        self.released = true;
    }
}

impl Deref for Checkout {
    type Target = libsql::Connection;

    fn deref(&self) -> &Self::Target {
        self.conn
            .as_deref()
            .unwrap_or_else(|| unreachable!("connection is only taken on drop"))
    }
}

impl Drop for Checkout {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Some(conn) = self.conn.take() {
            drop(Object::take(conn));
        }
    }
}
