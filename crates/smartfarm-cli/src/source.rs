//! Data source selection.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::info;

use smartfarm_core::{DemoSource, FirebaseClient, RealtimeSource};

use crate::config::Config;

/// How the binary should obtain readings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// Simulated readings, no database needed.
    Demo,
    /// A realtime database at this URL.
    Database(String),
}

/// Choose the source from the resolved settings.
pub fn select_source(demo: bool, database_url: Option<String>) -> Result<SourceKind> {
    if demo {
        return Ok(SourceKind::Demo);
    }
    match database_url {
        Some(url) => Ok(SourceKind::Database(url)),
        None => bail!(
            "No database URL configured.\n\n\
             Pass --database-url, set SMARTFARM_DATABASE_URL, add database_url to {},\n\
             or run with --demo for simulated readings.",
            Config::path().display()
        ),
    }
}

/// Construct the source, owned by the caller for the whole session.
pub fn open_source(kind: &SourceKind, timeout: Duration) -> Result<Arc<dyn RealtimeSource>> {
    match kind {
        SourceKind::Demo => {
            info!("Using simulated demo readings");
            Ok(Arc::new(DemoSource::default()))
        }
        SourceKind::Database(url) => {
            let client = FirebaseClient::new(url, timeout)
                .with_context(|| format!("Invalid database URL: {url}"))?;
            info!(url = %client.database_url(), "Using realtime database");
            Ok(Arc::new(client))
        }
    }
}
