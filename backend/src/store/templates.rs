//! Join templates: named, saved join parameters.
//!
//! Templates are kept newest first. Saving beyond the limit drops the oldest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{retain_key_pairs, Store, TEMPLATES_KEY};
use crate::error::{StoreError, StoreResult};
use crate::models::{ColumnName, JoinSpec};

/// A stored join template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinTemplate {
    /// Unique identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub join: JoinSpec,
    pub has_header: bool,
}

impl JoinTemplate {
    pub fn new(name: impl Into<String>, join: JoinSpec, has_header: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            created_at: Utc::now(),
            join,
            has_header,
        }
    }

    /// The template's join spec, restricted to key pairs present in both
    /// headers. `None` when no pair survives.
    pub fn apply(&self, header_left: &[ColumnName], header_right: &[ColumnName]) -> Option<JoinSpec> {
        let (keys_left, keys_right) = retain_key_pairs(
            &self.join.keys_left,
            &self.join.keys_right,
            header_left,
            header_right,
        );
        if keys_left.is_empty() {
            return None;
        }
        Some(JoinSpec {
            keys_left,
            keys_right,
            ..self.join.clone()
        })
    }

    /// `id` or `name` refers to this template.
    fn matches(&self, id_or_name: &str) -> bool {
        self.id == id_or_name || self.name == id_or_name
    }
}

/// Template list stored under [`TEMPLATES_KEY`].
pub struct TemplateStore<'a> {
    store: &'a Store,
    limit: usize,
}

impl<'a> TemplateStore<'a> {
    pub fn new(store: &'a Store, limit: usize) -> Self {
        Self {
            store,
            limit: limit.max(1),
        }
    }

    /// All templates, newest first.
    pub fn list(&self) -> Vec<JoinTemplate> {
        self.store.load_or_default(TEMPLATES_KEY)
    }

    /// Look up by id, then by name.
    pub fn get(&self, id_or_name: &str) -> StoreResult<JoinTemplate> {
        self.list()
            .into_iter()
            .find(|t| t.matches(id_or_name))
            .ok_or_else(|| StoreError::NotFound(id_or_name.to_string()))
    }

    /// Store a template in front of the list.
    pub fn save(&self, template: JoinTemplate) -> StoreResult<JoinTemplate> {
        let mut templates = self.list();
        templates.retain(|t| t.id != template.id);
        templates.insert(0, template.clone());
        templates.truncate(self.limit);
        self.store.save(TEMPLATES_KEY, &templates)?;
        Ok(template)
    }

    pub fn delete(&self, id_or_name: &str) -> StoreResult<JoinTemplate> {
        let mut templates = self.list();
        let index = templates
            .iter()
            .position(|t| t.matches(id_or_name))
            .ok_or_else(|| StoreError::NotFound(id_or_name.to_string()))?;
        let removed = templates.remove(index);
        self.store.save(TEMPLATES_KEY, &templates)?;
        Ok(removed)
    }
}
