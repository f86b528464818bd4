//! Mock email provider for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::email::{EmailMatch, EmailProvider, EmailProviderError, RoleQuery};

/// A recorded provider call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedLookup {
    Person {
        full_name: String,
        organization_or_domain: String,
    },
    Organization {
        domain: String,
    },
    Role {
        domain: String,
        role: String,
    },
    Profile {
        profile_url: String,
    },
}

type PersonResult = Result<EmailMatch, EmailProviderError>;
type ListResult = Result<Vec<EmailMatch>, EmailProviderError>;

/// Mock implementation of the EmailProvider trait.
///
/// Every lookup answers `NotFound` until scripted. Person responses can be
/// scripted per full name (case-insensitive) with a fallback for everyone
/// else.
///
/// # Example
///
/// ```rust,ignore
/// let primary = MockEmailProvider::new("primary");
/// primary
///     .add_person_response("Jane Doe", Ok(fixtures::verified("jane.doe@acme.com", 0.92)))
///     .await;
///
/// let calls = primary.recorded_calls().await;
/// ```
#[derive(Debug)]
pub struct MockEmailProvider {
    name: String,
    requires_domain: bool,
    person_responses: Arc<RwLock<HashMap<String, PersonResult>>>,
    default_person: Arc<RwLock<PersonResult>>,
    organization_response: Arc<RwLock<ListResult>>,
    role_response: Arc<RwLock<ListResult>>,
    profile_response: Arc<RwLock<PersonResult>>,
    /// Recorded calls in order.
    calls: Arc<RwLock<Vec<RecordedLookup>>>,
    /// Simulated latency per call.
    delay: Arc<RwLock<Option<Duration>>>,
}

impl MockEmailProvider {
    /// Create a provider that accepts free-text organization names.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            requires_domain: false,
            person_responses: Arc::new(RwLock::new(HashMap::new())),
            default_person: Arc::new(RwLock::new(Err(EmailProviderError::NotFound))),
            organization_response: Arc::new(RwLock::new(Err(EmailProviderError::NotFound))),
            role_response: Arc::new(RwLock::new(Err(EmailProviderError::NotFound))),
            profile_response: Arc::new(RwLock::new(Err(EmailProviderError::NotFound))),
            calls: Arc::new(RwLock::new(Vec::new())),
            delay: Arc::new(RwLock::new(None)),
        }
    }

    /// Create a provider that needs an apex domain.
    pub fn domain_only(name: &str) -> Self {
        Self {
            requires_domain: true,
            ..Self::new(name)
        }
    }

    /// Answer person lookups for `full_name` with `response`.
    pub async fn add_person_response(&self, full_name: &str, response: PersonResult) {
        self.person_responses
            .write()
            .await
            .insert(full_name.trim().to_lowercase(), response);
    }

    /// Answer person lookups for unscripted names with `response`.
    pub async fn set_person_response(&self, response: PersonResult) {
        *self.default_person.write().await = response;
    }

    pub async fn set_organization_response(&self, response: ListResult) {
        *self.organization_response.write().await = response;
    }

    pub async fn set_role_response(&self, response: ListResult) {
        *self.role_response.write().await = response;
    }

    pub async fn set_profile_response(&self, response: PersonResult) {
        *self.profile_response.write().await = response;
    }

    /// Delay every call by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Get recorded calls.
    pub async fn recorded_calls(&self) -> Vec<RecordedLookup> {
        self.calls.read().await.clone()
    }

    /// Get the number of calls made.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    async fn record(&self, call: RecordedLookup) {
        self.calls.write().await.push(call);
        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl EmailProvider for MockEmailProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn requires_domain(&self) -> bool {
        self.requires_domain
    }

    async fn find_person(
        &self,
        full_name: &str,
        organization_or_domain: &str,
    ) -> Result<EmailMatch, EmailProviderError> {
        self.record(RecordedLookup::Person {
            full_name: full_name.to_string(),
            organization_or_domain: organization_or_domain.to_string(),
        })
        .await;

        let scripted = self
            .person_responses
            .read()
            .await
            .get(&full_name.trim().to_lowercase())
            .cloned();
        match scripted {
            Some(response) => response,
            None => self.default_person.read().await.clone(),
        }
    }

    async fn find_at_organization(
        &self,
        domain: &str,
    ) -> Result<Vec<EmailMatch>, EmailProviderError> {
        self.record(RecordedLookup::Organization {
            domain: domain.to_string(),
        })
        .await;
        self.organization_response.read().await.clone()
    }

    async fn find_by_role(
        &self,
        domain: &str,
        role: &RoleQuery,
    ) -> Result<Vec<EmailMatch>, EmailProviderError> {
        self.record(RecordedLookup::Role {
            domain: domain.to_string(),
            role: role.text.clone(),
        })
        .await;
        self.role_response.read().await.clone()
    }

    async fn find_by_profile(&self, profile_url: &str) -> Result<EmailMatch, EmailProviderError> {
        self.record(RecordedLookup::Profile {
            profile_url: profile_url.to_string(),
        })
        .await;
        self.profile_response.read().await.clone()
    }
}
