// src/mongo.rs
use crate::config::Settings;
use anyhow::{Context, Result};
use bson::{doc, Bson};
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use tracing::info;

/// The one connection a run uses. Cursors and sessions derived from it must
/// be dropped before [`Connection::close`], or shutdown waits on them.
#[derive(Debug)]
pub struct Connection {
    client: Client,
    database: Database,
}

/// Builds the client without touching the server.
pub async fn open(settings: &Settings) -> Result<Connection> {
    let mut client_options = ClientOptions::parse(&settings.uri)
        .await
        .context("failed to parse the MongoDB URI")?;
    if client_options.app_name.is_none() {
        client_options.app_name = settings.app_name.clone();
    }
    let client = Client::with_options(client_options).context("failed to build MongoDB client")?;
    let database = client.database(&settings.database);
    Ok(Connection { client, database })
}

/// Opens the connection and pings the server, so an unreachable server
/// fails here rather than in the first task.
pub async fn connect(settings: &Settings) -> Result<Connection> {
    let connection = open(settings).await?;
    connection
        .database
        .run_command(doc! { "ping": 1 })
        .await
        .context("failed to connect to MongoDB")?;
    info!(database = %settings.database, "connected");
    Ok(connection)
}

impl Connection {
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub async fn close(self) {
        self.client.shutdown().await;
        info!("connection closed");
    }
}

pub fn is_version_8_or_higher(version_str: &str) -> bool {
    let parts: Vec<u32> = version_str
        .split('.')
        .filter_map(|x| x.parse::<u32>().ok())
        .collect();
    matches!(parts.as_slice(), [major, ..] if *major >= 8)
}

/// Reads the server version from `buildInfo`.
pub async fn server_version(client: &Client) -> mongodb::error::Result<Option<String>> {
    let admin_db = client.database("admin");
    let result = admin_db.run_command(doc! { "buildInfo": 1 }).await?;
    match result.get("version") {
        Some(Bson::String(version_str)) => Ok(Some(version_str.clone())),
        _ => Ok(None),
    }
}
