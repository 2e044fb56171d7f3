//! Throwaway SQLite databases and unresponsive servers for tests.

use std::path::PathBuf;

use sqlx::{Connection, Executor, SqliteConnection};

/// A SQLite file seeded with the given statements, removed on drop.
pub struct SqliteFixture {
    path: PathBuf,
    connection_string: String,
}

impl SqliteFixture {
    pub async fn new(statements: &[&str]) -> Self {
        let path = std::env::temp_dir().join(format!("introspect-{}.db", uuid::Uuid::new_v4()));
        let mut conn = SqliteConnection::connect(&format!("sqlite://{}?mode=rwc", path.display()))
            .await
            .expect("create fixture database");
        for statement in statements {
            conn.execute(*statement).await.expect("seed fixture database");
        }
        conn.close().await.expect("close fixture database");

        let connection_string = format!("sqlite://{}", path.display());
        Self {
            path,
            connection_string,
        }
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }
}

impl Drop for SqliteFixture {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Binds a local port that accepts connections and never answers.
///
/// Returns the port. Accepted sockets stay open for the life of the runtime.
pub async fn silent_server() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind silent server");
    let port = listener.local_addr().expect("silent server address").port();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    port
}
