//! Backend plugin registry
//!
//! Maps backend names to factories so the host can pick one by name.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::backend::{Backend, BackendError, FluxBackend, LocalBackend};
use crate::config::ExecutorSettings;
use crate::error::{ExecutorError, Result};

/// Settings every backend plugin declares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommonSettings {
    /// Jobs run outside the host machine
    pub non_local_exec: bool,
}

/// Creates backends of one kind
#[async_trait]
pub trait BackendFactory: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn common_settings(&self) -> CommonSettings;

    /// Connects a backend; failures here are fatal and never retried
    async fn create(
        &self,
        settings: &ExecutorSettings,
    ) -> std::result::Result<Box<dyn Backend>, BackendError>;
}

/// Factory for [`FluxBackend`]
pub struct FluxFactory;

#[async_trait]
impl BackendFactory for FluxFactory {
    fn name(&self) -> &str {
        "flux"
    }

    fn description(&self) -> &str {
        "Submit jobs to a Flux instance through the flux command-line tools"
    }

    fn common_settings(&self) -> CommonSettings {
        CommonSettings {
            non_local_exec: true,
        }
    }

    async fn create(
        &self,
        settings: &ExecutorSettings,
    ) -> std::result::Result<Box<dyn Backend>, BackendError> {
        let backend = FluxBackend::with_program(settings.flux_program.clone()).await?;
        Ok(Box::new(backend))
    }
}

/// Factory for [`LocalBackend`]
pub struct LocalFactory;

#[async_trait]
impl BackendFactory for LocalFactory {
    fn name(&self) -> &str {
        "local"
    }

    fn description(&self) -> &str {
        "Run jobs as child processes of the host"
    }

    fn common_settings(&self) -> CommonSettings {
        CommonSettings {
            non_local_exec: false,
        }
    }

    async fn create(
        &self,
        _settings: &ExecutorSettings,
    ) -> std::result::Result<Box<dyn Backend>, BackendError> {
        Ok(Box::new(LocalBackend::new()))
    }
}

/// Registered backend factories, keyed by name
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    factories: BTreeMap<String, Arc<dyn BackendFactory>>,
}

impl ExecutorRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the `flux` and `local` backends
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(FluxFactory));
        registry.register(Arc::new(LocalFactory));
        registry
    }

    /// Registers a factory, replacing any factory with the same name
    pub fn register(&mut self, factory: Arc<dyn BackendFactory>) {
        self.factories.insert(factory.name().to_string(), factory);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn BackendFactory>> {
        self.factories.get(name)
    }

    /// Registered factories, sorted by name
    pub fn plugins(&self) -> impl Iterator<Item = &Arc<dyn BackendFactory>> {
        self.factories.values()
    }

    /// Creates the backend selected by `settings.backend`
    pub async fn create(&self, settings: &ExecutorSettings) -> Result<Box<dyn Backend>> {
        let factory = self
            .get(&settings.backend)
            .ok_or_else(|| ExecutorError::UnknownBackend(settings.backend.clone()))?;

        info!("Connecting to {} backend", factory.name());
        Ok(factory.create(settings).await?)
    }
}
