use std::collections::HashMap;

use futures::future::join_all;
use serde::{Serialize, Serializer};
use tracing::warn;

use crate::cache::NamespaceCache;
use crate::fetcher::FetchError;

/// Leading marker on a name that flags it as a translation key.
const KEY_SENTINEL: char = '#';

/// A parsed `#<namespace>.<rest>` key identifier.
///
/// The namespace is the segment before the first dot of the sentinel-stripped
/// name. The lookup key keeps the namespace prefix, because the backend's
/// flat format stores keys fully qualified:
/// `#clients_notifications.i2s.client.invite.title` looks up
/// `clients_notifications.i2s.client.invite.title` inside the
/// `clients_notifications` bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyIdentifier {
    pub namespace: String,
    pub lookup_key: String,
}

impl KeyIdentifier {
    /// Parse a sentinel-marked name; `None` if the sentinel is absent or the
    /// namespace segment is empty.
    pub fn parse(raw: &str) -> Option<Self> {
        let stripped = raw.strip_prefix(KEY_SENTINEL)?;

        let namespace = match stripped.find('.') {
            Some(dot) => &stripped[..dot],
            None => stripped,
        };
        if namespace.is_empty() {
            return None;
        }

        Some(Self {
            namespace: namespace.to_string(),
            lookup_key: stripped.to_string(),
        })
    }
}

/// Outcome of resolving one translation key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyResolution {
    /// The key was found in its namespace's bundle.
    Resolved(String),
    /// The bundle was fetched but does not contain the key, or the name was
    /// not a resolvable key identifier.
    Missing,
    /// The namespace's bundle could not be fetched.
    Failed(#[serde(serialize_with = "error_as_string")] FetchError),
}

fn error_as_string<S: Serializer>(error: &FetchError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

impl KeyResolution {
    /// The resolved value, if there is one.
    pub fn value(&self) -> Option<&str> {
        match self {
            KeyResolution::Resolved(value) => Some(value),
            _ => None,
        }
    }
}

/// Batch key resolution on top of the namespace cache.
pub struct KeyResolver {
    cache: NamespaceCache,
}

impl KeyResolver {
    pub fn new(cache: NamespaceCache) -> Self {
        Self { cache }
    }

    /// Resolve one sentinel-marked key identifier for a locale.
    pub async fn resolve_key(&self, key_identifier: &str, locale: &str) -> KeyResolution {
        match KeyIdentifier::parse(key_identifier) {
            Some(key) => self.resolve_parsed(&key, locale).await,
            None => {
                warn!(
                    "Ignoring name without translation-key sentinel: '{}'",
                    key_identifier
                );
                KeyResolution::Missing
            }
        }
    }

    /// Resolve a batch of key identifiers for one locale.
    ///
    /// All keys resolve concurrently; keys sharing a namespace are served by
    /// a single backend fetch thanks to the cache's coalescing. The result
    /// maps each sentinel-stripped identifier (or the raw name, when the
    /// sentinel was absent) to its outcome. One namespace failing does not
    /// block resolution of the others.
    pub async fn resolve_keys(
        &self,
        key_identifiers: &[String],
        locale: &str,
    ) -> HashMap<String, KeyResolution> {
        let lookups = key_identifiers.iter().map(|raw| async move {
            match KeyIdentifier::parse(raw) {
                Some(key) => {
                    let resolution = self.resolve_parsed(&key, locale).await;
                    (key.lookup_key, resolution)
                }
                None => {
                    warn!("Ignoring name without translation-key sentinel: '{}'", raw);
                    (raw.clone(), KeyResolution::Missing)
                }
            }
        });

        join_all(lookups).await.into_iter().collect()
    }

    async fn resolve_parsed(&self, key: &KeyIdentifier, locale: &str) -> KeyResolution {
        match self.cache.resolve_namespace(locale, &key.namespace).await {
            Ok(bundle) => match bundle.get(&key.lookup_key) {
                Some(value) => KeyResolution::Resolved(value.clone()),
                None => KeyResolution::Missing,
            },
            Err(e) => KeyResolution::Failed(e),
        }
    }
}
