use crate::{Config, ConfigEntry, Database};
use plinth_core::{Connection, Result};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;

/// Alias used by [`Registry::default_instance`].
pub const DEFAULT_INSTANCE: &str = "default";

/// Lazily connected databases, one per configuration alias.
///
/// ```rust,ignore
/// let registry = Registry::<SQLiteConnection>::new(Config::from_file("db.json")?);
/// let db = registry.default_instance().await?;
/// assert!(Arc::ptr_eq(&db, &registry.instance("default").await?));
/// ```
pub struct Registry<C: Connection> {
    config: Config,
    instances: Mutex<HashMap<String, Arc<Database<C>>>>,
}

impl<C: Connection> Registry<C> {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            instances: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The database for `name`, connected on first use and shared afterwards.
    pub async fn instance(&self, name: &str) -> Result<Arc<Database<C>>> {
        let mut instances = self.instances.lock().await;
        if let Some(database) = instances.get(name) {
            return Ok(database.clone());
        }
        let resolved = self.config.resolve(name)?;
        log::debug!("Connecting `{}` to database `{}`", name, resolved.db);
        let database = Arc::new(Database::connect(name, &resolved).await?);
        instances.insert(name.to_string(), database.clone());
        Ok(database)
    }

    pub async fn default_instance(&self) -> Result<Arc<Database<C>>> {
        self.instance(DEFAULT_INSTANCE).await
    }

    /// Connect an inline entry without caching it, aliases resolve against this registry.
    pub async fn connect_entry(&self, entry: &ConfigEntry) -> Result<Database<C>> {
        let resolved = self.config.resolve_entry(entry)?;
        let name = match entry {
            ConfigEntry::Alias(name) => name.as_str(),
            ConfigEntry::Params(..) => "",
        };
        Database::connect(name, &resolved).await
    }

    /// Whether `name` has already been connected.
    pub async fn is_connected(&self, name: &str) -> bool {
        self.instances.lock().await.contains_key(name)
    }
}
