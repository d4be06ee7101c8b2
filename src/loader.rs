//! Hostname-based adapter selection and lazy adapter registration
//!
//! Adapters are compiled into the crate but only become usable once an
//! [`AdapterSource`] has registered their factory in the
//! [`AdapterNamespace`]. The [`AdapterLoader`] decides which adapter a site
//! needs, loads it at most once even under concurrent requests, and always
//! keeps the universal adapter available as a fallback.

use crate::adapters::{builtin_factory, AdapterFactory, TextFieldAdapter};
use crate::config::PenConfig;
use crate::context::Platform;
use crate::error::{PenError, Result};
use async_trait::async_trait;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::OnceCell;

/// Name of the adapter that works on every page
pub const UNIVERSAL_ADAPTER: &str = "UniversalAdapter";

/// Exact hostnames, also used as containment tokens for subdomains
const HOST_ADAPTERS: &[(&str, &str)] = &[
    ("mail.google.com", "GmailAdapter"),
    ("linkedin.com", "LinkedInAdapter"),
    ("www.linkedin.com", "LinkedInAdapter"),
    ("notion.so", "NotionAdapter"),
    ("www.notion.so", "NotionAdapter"),
    ("docs.google.com", "GoogleDocsAdapter"),
];

/// Registry of adapter factories by name
#[derive(Default)]
pub struct AdapterNamespace {
    factories: RwLock<IndexMap<String, AdapterFactory>>,
}

impl AdapterNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, factory: AdapterFactory) {
        let name = name.into();
        log::debug!("Registering adapter {}", name);
        self.factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub fn factory(&self, name: &str) -> Option<AdapterFactory> {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
    }

    pub fn names(&self) -> Vec<String> {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

/// Something able to make an adapter available in the namespace
#[async_trait]
pub trait AdapterSource: Send + Sync {
    /// Register the adapter called `name` into `namespace`
    async fn inject(&self, name: &str, namespace: &AdapterNamespace) -> Result<()>;
}

/// Source handing out the adapters compiled into the crate
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledAdapterSource;

#[async_trait]
impl AdapterSource for BundledAdapterSource {
    async fn inject(&self, name: &str, namespace: &AdapterNamespace) -> Result<()> {
        let platform = Platform::from_adapter_name(name).ok_or_else(|| PenError::AdapterNotFound(name.to_string()))?;
        namespace.register(name, builtin_factory(platform));
        Ok(())
    }
}

/// Outcome of loading the adapters a site needs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteLoadReport {
    pub hostname: String,
    /// Adapter resolved for the hostname
    pub adapter: String,
    /// Why the resolved adapter could not be loaded, if it failed
    pub error: Option<String>,
    /// Whether the universal adapter is loaded
    pub universal_loaded: bool,
}

impl SiteLoadReport {
    /// Adapter to use on the site: the resolved one, or the universal fallback
    pub fn effective_adapter(&self) -> &str {
        if self.error.is_none() {
            &self.adapter
        } else {
            UNIVERSAL_ADAPTER
        }
    }
}

/// Result of a batch load; one failure does not stop the others
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PreloadReport {
    pub loaded: Vec<String>,
    pub failed: Vec<(String, String)>,
}

type InFlight = Arc<OnceCell<std::result::Result<(), PenError>>>;

/// Chooses, loads and instantiates adapters for pages
pub struct AdapterLoader {
    config: PenConfig,
    namespace: AdapterNamespace,
    source: Box<dyn AdapterSource>,
    loaded: Mutex<IndexSet<String>>,
    in_flight: Mutex<HashMap<String, InFlight>>,
}

impl AdapterLoader {
    /// Loader backed by the bundled adapters
    pub fn new(config: PenConfig) -> Self {
        Self::with_source(config, BundledAdapterSource)
    }

    pub fn with_source(config: PenConfig, source: impl AdapterSource + 'static) -> Self {
        Self {
            config,
            namespace: AdapterNamespace::new(),
            source: Box::new(source),
            loaded: Mutex::new(IndexSet::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &PenConfig {
        &self.config
    }

    pub fn namespace(&self) -> &AdapterNamespace {
        &self.namespace
    }

    /// Adapter name for a hostname
    ///
    /// Exact matches win over substring matches; configured extra hosts come
    /// after the built-in table. Unknown hosts get the universal adapter.
    pub fn resolve_adapter(&self, hostname: &str) -> String {
        let host = hostname.trim().to_ascii_lowercase();

        if let Some((_, name)) = HOST_ADAPTERS.iter().find(|(domain, _)| *domain == host) {
            return name.to_string();
        }
        if let Some((_, name)) = HOST_ADAPTERS.iter().find(|(domain, _)| host.contains(domain)) {
            return name.to_string();
        }
        if let Some((_, name)) = self.config.extra_hosts.iter().find(|(token, _)| host.contains(token.as_str())) {
            return name.clone();
        }
        UNIVERSAL_ADAPTER.to_string()
    }

    /// Load an adapter once
    ///
    /// Repeat calls return immediately; concurrent calls for the same name
    /// share a single injection. A failed load can be retried later.
    pub async fn load_adapter(&self, name: &str) -> Result<()> {
        if self.is_adapter_loaded(name) {
            return Ok(());
        }

        if self.namespace.contains(name) {
            log::debug!("Adapter {} already registered, marking loaded", name);
            self.mark_loaded(name);
            return Ok(());
        }

        let cell = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            in_flight.entry(name.to_string()).or_default().clone()
        };

        let outcome = cell.get_or_init(|| self.inject(name)).await.clone();

        if outcome.is_err() {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            if in_flight.get(name).is_some_and(|current| Arc::ptr_eq(current, &cell)) {
                in_flight.remove(name);
            }
        }
        outcome
    }

    async fn inject(&self, name: &str) -> Result<()> {
        log::info!("Loading adapter {}", name);
        self.source.inject(name, &self.namespace).await.map_err(|e| match e {
            PenError::AdapterNotFound(_) | PenError::AdapterLoadFailed { .. } => e,
            other => PenError::AdapterLoadFailed { name: name.to_string(), reason: other.to_string() },
        })?;

        if !self.namespace.contains(name) {
            return Err(PenError::AdapterNotRegistered(name.to_string()));
        }
        self.mark_loaded(name);
        log::info!("Adapter {} loaded", name);
        Ok(())
    }

    fn mark_loaded(&self, name: &str) {
        self.loaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string());
    }

    /// Load the adapter for `hostname` and, whatever happens, the universal one
    pub async fn load_adapters_for_current_site(&self, hostname: &str) -> SiteLoadReport {
        let adapter = self.resolve_adapter(hostname);
        log::info!("Site {} resolved to {}", hostname, adapter);

        let mut error = None;
        if adapter != UNIVERSAL_ADAPTER {
            if let Err(e) = self.load_adapter(&adapter).await {
                log::warn!("Falling back to {}: {}", UNIVERSAL_ADAPTER, e);
                error = Some(e.to_string());
            }
        }

        if let Err(e) = self.load_adapter(UNIVERSAL_ADAPTER).await {
            log::warn!("Failed to load {}: {}", UNIVERSAL_ADAPTER, e);
        }

        SiteLoadReport {
            hostname: hostname.to_string(),
            adapter,
            error,
            universal_loaded: self.is_adapter_loaded(UNIVERSAL_ADAPTER),
        }
    }

    /// Load several adapters, partitioning them into loaded and failed
    pub async fn preload_adapters<S: AsRef<str>>(&self, names: &[S]) -> PreloadReport {
        let mut report = PreloadReport::default();
        for name in names {
            let name = name.as_ref();
            match self.load_adapter(name).await {
                Ok(()) => report.loaded.push(name.to_string()),
                Err(e) => {
                    log::warn!("Preload of {} failed: {}", name, e);
                    report.failed.push((name.to_string(), e.to_string()));
                }
            }
        }
        report
    }

    /// Names of loaded adapters, in load order
    pub fn get_loaded_adapters(&self) -> Vec<String> {
        self.loaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn is_adapter_loaded(&self, name: &str) -> bool {
        self.loaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(name)
    }

    /// Instantiate a loaded adapter
    pub fn create_adapter(&self, name: &str) -> Result<Box<dyn TextFieldAdapter>> {
        if !self.is_adapter_loaded(name) {
            return Err(PenError::AdapterNotFound(format!("{} is not loaded", name)));
        }
        let factory = self
            .namespace
            .factory(name)
            .ok_or_else(|| PenError::AdapterNotRegistered(name.to_string()))?;
        Ok(factory(&self.config))
    }

    /// Best loaded adapter for a hostname, universal if the site's own is unavailable
    pub fn adapter_for_host(&self, hostname: &str) -> Result<Box<dyn TextFieldAdapter>> {
        let name = self.resolve_adapter(hostname);
        if self.is_adapter_loaded(&name) {
            return self.create_adapter(&name);
        }
        log::debug!("{} not loaded, using {}", name, UNIVERSAL_ADAPTER);
        self.create_adapter(UNIVERSAL_ADAPTER)
    }
}
