use crate::Error;
use plinth_core::{Context, Result};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::{collections::BTreeMap, fs, path::Path};
use url::Url;

/// Maximum number of alias dereferences before the chain is considered cyclic.
pub const MAX_ALIAS_DEPTH: usize = 10;

/// Connection parameters of one configuration entry.
///
/// Every key besides the well known ones is kept in `vars` and is available to the DSN
/// template as `{{key}}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConnectionParams {
    #[serde(rename = "DSN", alias = "dsn")]
    pub dsn: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub db: String,
    #[serde(flatten)]
    pub vars: BTreeMap<String, JsonValue>,
}

/// Either the parameters themselves or the name of another entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ConfigEntry {
    Alias(String),
    Params(ConnectionParams),
}

impl From<ConnectionParams> for ConfigEntry {
    fn from(value: ConnectionParams) -> Self {
        ConfigEntry::Params(value)
    }
}

impl From<&str> for ConfigEntry {
    fn from(value: &str) -> Self {
        ConfigEntry::Alias(value.into())
    }
}

/// Configuration entry after alias resolution and template substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub dsn: String,
    pub user: String,
    pub password: String,
    pub db: String,
}

impl ResolvedConfig {
    /// The URL handed to the driver, with the credentials injected when the DSN does not
    /// carry its own.
    pub fn url(&self) -> Result<String> {
        if self.user.is_empty() {
            return Ok(self.dsn.clone());
        }
        let Ok(mut url) = Url::parse(&self.dsn) else {
            return Ok(self.dsn.clone());
        };
        if !url.username().is_empty() || !url.has_host() {
            return Ok(self.dsn.clone());
        }
        let context = || format!("While setting the credentials on `{}`", self.dsn);
        url.set_username(&self.user)
            .map_err(|_| Error::Configuration("cannot set the user".into()))
            .with_context(context)?;
        if !self.password.is_empty() {
            url.set_password(Some(&self.password))
                .map_err(|_| Error::Configuration("cannot set the password".into()))
                .with_context(context)?;
        }
        Ok(url.into())
    }
}

/// Named connection configurations, loaded once and shared by the registry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Config {
    entries: BTreeMap<String, ConfigEntry>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Configuration(e.to_string()).into())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("While reading the configuration `{}`", path.display()))?;
        Self::from_json(&json)
    }

    pub fn with_entry(mut self, name: impl Into<String>, entry: impl Into<ConfigEntry>) -> Self {
        self.insert(name, entry);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: impl Into<ConfigEntry>) {
        self.entries.insert(name.into(), entry.into());
    }

    pub fn get(&self, name: &str) -> Option<&ConfigEntry> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Resolve a named entry following its alias chain.
    pub fn resolve(&self, name: &str) -> Result<ResolvedConfig> {
        self.resolve_entry(&ConfigEntry::Alias(name.into()))
    }

    /// Resolve an inline entry, which may itself be an alias into this configuration.
    pub fn resolve_entry(&self, entry: &ConfigEntry) -> Result<ResolvedConfig> {
        let mut entry = entry;
        let mut depth = 0;
        let params = loop {
            match entry {
                ConfigEntry::Params(params) => break params,
                ConfigEntry::Alias(name) => {
                    depth += 1;
                    if depth > MAX_ALIAS_DEPTH {
                        let error = Error::Configuration(format!(
                            "alias chain starting from `{}` is deeper than {} hops",
                            name, MAX_ALIAS_DEPTH
                        ));
                        log::error!("{}", error);
                        return Err(error.into());
                    }
                    entry = self.entries.get(name).ok_or_else(|| {
                        let error =
                            Error::Configuration(format!("there is no entry named `{}`", name));
                        log::error!("{}", error);
                        error
                    })?;
                }
            }
        };
        Ok(ResolvedConfig {
            dsn: template(&params.dsn, params),
            user: params.user.clone(),
            password: params.password.clone(),
            db: params.db.clone(),
        })
    }
}

fn template(dsn: &str, params: &ConnectionParams) -> String {
    let mut result = dsn.to_string();
    let mut replace = |key: &str, value: &str| {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    };
    replace("user", &params.user);
    replace("password", &params.password);
    replace("db", &params.db);
    for (key, value) in &params.vars {
        match value {
            JsonValue::String(v) => replace(key, v),
            JsonValue::Number(v) => replace(key, &v.to_string()),
            JsonValue::Bool(v) => replace(key, &v.to_string()),
            JsonValue::Null => replace(key, ""),
            JsonValue::Array(..) | JsonValue::Object(..) => {}
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_skips_containers() {
        let params = ConnectionParams {
            dsn: "x://{{host}}:{{port}}/{{db}}?{{opts}}&{{flag}}".into(),
            db: "main".into(),
            vars: [
                ("host".to_string(), JsonValue::from("localhost")),
                ("port".to_string(), JsonValue::from(5432)),
                ("flag".to_string(), JsonValue::from(true)),
                ("opts".to_string(), serde_json::json!(["a", "b"])),
            ]
            .into_iter()
            .collect(),
            ..Default::default()
        };
        assert_eq!(
            template(&params.dsn, &params),
            "x://localhost:5432/main?{{opts}}&true"
        );
    }
}
