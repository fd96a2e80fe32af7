//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::models::Identifier;
use crate::sources::{RegistryRecord, Source, SourceError};

/// A mock source that returns a predefined record and records every lookup.
#[derive(Debug)]
pub struct MockSource {
    id: String,
    accepts_preprints: bool,
    response: Mutex<Result<RegistryRecord, String>>,
    calls: Mutex<Vec<Identifier>>,
}

impl MockSource {
    /// Mock standing in for the preprint service
    pub fn preprint() -> Self {
        Self::build("mock-preprint", true)
    }

    /// Mock standing in for the citation registry
    pub fn citation() -> Self {
        Self::build("mock-citation", false)
    }

    fn build(id: &str, accepts_preprints: bool) -> Self {
        Self {
            id: id.to_string(),
            accepts_preprints,
            response: Mutex::new(Ok(RegistryRecord::default())),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Set the record to return.
    pub fn with_record(self, record: RegistryRecord) -> Self {
        *self.response.lock().unwrap_or_else(|e| e.into_inner()) = Ok(record);
        self
    }

    /// Make every lookup fail with a network error.
    pub fn failing(self, message: &str) -> Self {
        *self.response.lock().unwrap_or_else(|e| e.into_inner()) = Err(message.to_string());
        self
    }

    /// Identifiers looked up so far
    pub fn calls(&self) -> Vec<Identifier> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    fn accepts(&self, identifier: &Identifier) -> bool {
        matches!(identifier, Identifier::Preprint(_)) == self.accepts_preprints
    }

    async fn lookup(&self, identifier: &Identifier) -> Result<RegistryRecord, SourceError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(identifier.clone());

        match &*self.response.lock().unwrap_or_else(|e| e.into_inner()) {
            Ok(record) => Ok(record.clone()),
            Err(message) => Err(SourceError::Network(message.clone())),
        }
    }
}
