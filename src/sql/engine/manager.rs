use super::{ConnectionHandle, Connector, Source};
use crate::common::constants::NO_CONNECTOR_MSG;
use crate::common::{Error, Observer, Result};
use crate::config::{Settings, SourceConfig};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

/// Lazily opens and caches one connection per source.
///
/// A connection is opened the first time its source is requested and reused
/// until `close_all`. The manager is the only owner that closes connections;
/// callers borrow handles for the duration of a call.
pub struct ConnectionManager {
    configs: BTreeMap<Source, SourceConfig>,
    connectors: BTreeMap<Source, Box<dyn Connector>>,
    handles: BTreeMap<Source, ConnectionHandle>,
    observer: Arc<dyn Observer>,
}

impl ConnectionManager {
    pub fn new(settings: &Settings, observer: Arc<dyn Observer>) -> Self {
        let configs = [Source::Snowflake, Source::BigQuery]
            .into_iter()
            .map(|source| (source, settings.source_config(source)))
            .collect();
        Self {
            configs,
            connectors: BTreeMap::new(),
            handles: BTreeMap::new(),
            observer,
        }
    }

    /// Registers the connector used to open connections to `source`,
    /// replacing any previous one. Does not connect.
    pub fn register(&mut self, source: Source, connector: Box<dyn Connector>) -> &mut Self {
        self.connectors.insert(source, connector);
        self
    }

    /// Returns the connection for `source`, opening it on first use.
    ///
    /// Connector errors are returned unchanged and nothing is cached, so a
    /// later call tries again.
    pub fn get_connection(&mut self, source: Source) -> Result<ConnectionHandle> {
        if let Some(handle) = self.handles.get(&source) {
            return Ok(Rc::clone(handle));
        }

        let connector = self
            .connectors
            .get(&source)
            .ok_or_else(|| Error::Connection(format!("{NO_CONNECTOR_MSG} {source}.")))?;
        let config = self
            .configs
            .get(&source)
            .ok_or_else(|| Error::Config(format!("no configuration for {source}")))?;

        self.observer
            .info(&format!("Initializing {source} connection..."));
        let connection = connector.connect(config)?;
        let handle: ConnectionHandle = Rc::new(RefCell::new(connection));
        self.handles.insert(source, Rc::clone(&handle));
        Ok(handle)
    }

    pub fn is_connected(&self, source: Source) -> bool {
        self.handles.contains_key(&source)
    }

    /// Closes every open connection. Does nothing when none are open.
    ///
    /// A failing close is reported and the remaining connections are still
    /// closed; the handle is dropped either way.
    pub fn close_all(&mut self) {
        for (source, handle) in std::mem::take(&mut self.handles) {
            self.observer.info(&format!("Closing {source} connection..."));
            if let Err(err) = handle.borrow_mut().close() {
                self.observer
                    .error(&format!("Error while closing {source} connection: {err}"));
            }
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.close_all();
    }
}
