//! Shared application state.

use std::sync::Arc;

use tokio::sync::Mutex;

use meetscan::config::Config;
use meetscan::email::{ImapClient, MailSource};
use meetscan::extractor::DateTimeExtractor;
use meetscan::{Database, IngestPipeline};

/// Creates a fresh, unconnected mail source for each cycle.
pub type SourceFactory = Arc<dyn Fn() -> Box<dyn MailSource> + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub pipeline: Arc<IngestPipeline>,
    pub source_factory: SourceFactory,
    /// Held for the duration of a cycle; at most one cycle runs at a time.
    pub cycle_lock: Arc<Mutex<()>>,
}

impl AppState {
    /// State backed by the configured IMAP mailbox.
    pub fn new(db: Database, config: Config) -> Self {
        let imap = config.imap.clone();
        let factory: SourceFactory =
            Arc::new(move || Box::new(ImapClient::new(imap.clone())) as Box<dyn MailSource>);
        Self::with_source_factory(db, config, factory)
    }

    pub fn with_source_factory(db: Database, config: Config, source_factory: SourceFactory) -> Self {
        let pipeline = IngestPipeline::new(
            db.clone(),
            DateTimeExtractor::default(),
            config.ingest.lookback(),
        );
        Self {
            db,
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            source_factory,
            cycle_lock: Arc::new(Mutex::new(())),
        }
    }
}
