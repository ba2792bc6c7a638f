//! # Template Persistence
//!
//! The engine does not own a database. [`TemplateStore`] is the seam a host
//! application implements; [`MemoryTemplateStore`] keeps templates in process
//! for tests and the CLI.
//!
//! Store errors are handed back to the caller as-is. There is no retry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::PersistenceError;
use crate::template::Template;

/// A template together with its storage identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTemplate {
    pub id: String,
    pub template: Template,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Catalogue entry, without the field list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    pub id: String,
    pub name: String,
    pub field_count: usize,
    pub updated_at: DateTime<Utc>,
}

impl From<&StoredTemplate> for TemplateSummary {
    fn from(stored: &StoredTemplate) -> Self {
        Self {
            id: stored.id.clone(),
            name: stored.template.name.clone(),
            field_count: stored.template.fields().len(),
            updated_at: stored.updated_at,
        }
    }
}

/// Template persistence backend.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn create_template(&self, template: &Template) -> Result<StoredTemplate, PersistenceError>;

    async fn update_template(
        &self,
        id: &str,
        template: &Template,
    ) -> Result<StoredTemplate, PersistenceError>;

    /// Catalogue, most recently updated first.
    async fn list_templates(&self) -> Result<Vec<TemplateSummary>, PersistenceError>;

    async fn get_template(&self, id: &str) -> Result<StoredTemplate, PersistenceError>;
}

/// In-process store.
#[derive(Debug, Clone, Default)]
pub struct MemoryTemplateStore {
    templates: Arc<RwLock<HashMap<String, StoredTemplate>>>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.templates.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.templates.read().await.is_empty()
    }
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    async fn create_template(&self, template: &Template) -> Result<StoredTemplate, PersistenceError> {
        let now = Utc::now();
        let stored = StoredTemplate {
            id: format!("tpl_{}", uuid::Uuid::new_v4().simple()),
            template: template.clone(),
            created_at: now,
            updated_at: now,
        };
        self.templates
            .write()
            .await
            .insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn update_template(
        &self,
        id: &str,
        template: &Template,
    ) -> Result<StoredTemplate, PersistenceError> {
        let mut templates = self.templates.write().await;
        let stored = templates
            .get_mut(id)
            .ok_or_else(|| PersistenceError::NotFound(id.to_string()))?;
        stored.template = template.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn list_templates(&self) -> Result<Vec<TemplateSummary>, PersistenceError> {
        let templates = self.templates.read().await;
        let mut summaries: Vec<TemplateSummary> =
            templates.values().map(TemplateSummary::from).collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        Ok(summaries)
    }

    async fn get_template(&self, id: &str) -> Result<StoredTemplate, PersistenceError> {
        self.templates
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| PersistenceError::NotFound(id.to_string()))
    }
}
