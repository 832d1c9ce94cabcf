//! Schema Registry
//!
//! Owns every model definition. All mutations run under one write lock and
//! flush the full model list through the persistence adapter before the
//! lock is released, so flushes land in mutation order.
//!
//! A failed flush does not roll back: the in-memory change is the commit
//! point and the error is returned to the caller, who may `flush` again.

use chrono::Utc;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::errors::{SchemaError, SchemaResult};
use super::types::{FieldDefinition, FieldPatch, ModelDefinition, ModelPatch, ModelSpec};
use crate::persistence::{MemoryAdapter, PersistenceAdapter, PersistenceResult};

/// Registry of model definitions, in insertion order
#[derive(Debug)]
pub struct SchemaRegistry {
    models: RwLock<Vec<ModelDefinition>>,
    adapter: Arc<dyn PersistenceAdapter>,
}

impl SchemaRegistry {
    /// Create a registry holding whatever the adapter has stored
    pub fn open(adapter: Arc<dyn PersistenceAdapter>) -> PersistenceResult<Self> {
        let models = adapter.load_models()?;
        debug!(models = models.len(), "schema registry loaded");
        Ok(Self {
            models: RwLock::new(models),
            adapter,
        })
    }

    /// Empty registry writing through `adapter`; nothing is loaded
    pub fn new(adapter: Arc<dyn PersistenceAdapter>) -> Self {
        Self {
            models: RwLock::new(Vec::new()),
            adapter,
        }
    }

    /// Empty registry over a fresh in-memory adapter
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryAdapter::new()))
    }

    /// Define a new model.
    ///
    /// # Errors
    ///
    /// - `DuplicateName` if another model already uses `spec.name`
    /// - `InvalidDefinition` if the model or a field breaks its invariants
    /// - `Persistence` if the flush failed (the model is still defined)
    pub fn define_model(&self, spec: ModelSpec) -> SchemaResult<ModelDefinition> {
        let mut models = self.models.write().map_err(|_| SchemaError::poisoned())?;

        if models.iter().any(|m| m.name == spec.name) {
            return Err(SchemaError::DuplicateName(spec.name));
        }

        let id = format!("model_{}", Uuid::new_v4().simple());
        let model = ModelDefinition::from_spec(id, spec, Utc::now());
        model
            .validate_structure()
            .map_err(SchemaError::InvalidDefinition)?;

        models.push(model.clone());
        info!(model_id = %model.id, name = %model.name, fields = model.fields.len(), "model defined");

        self.persist(&models)?;
        Ok(model)
    }

    /// Merge `patch` into an existing model and bump `updatedAt`.
    ///
    /// `id` and `createdAt` are never changed. Renaming onto another
    /// model's name fails with `DuplicateName`.
    pub fn update_model(&self, id: &str, patch: ModelPatch) -> SchemaResult<ModelDefinition> {
        self.modify(id, |_| Some(patch))
    }

    /// Remove a model definition. Returns whether it existed.
    ///
    /// Records of the model are left in place; see `RecordStore::purge_model`.
    pub fn delete_model(&self, id: &str) -> SchemaResult<bool> {
        let mut models = self.models.write().map_err(|_| SchemaError::poisoned())?;

        let Some(index) = models.iter().position(|m| m.id == id) else {
            return Ok(false);
        };
        let removed = models.remove(index);
        info!(model_id = %removed.id, name = %removed.name, "model deleted");

        self.persist(&models)?;
        Ok(true)
    }

    pub fn get_model(&self, id: &str) -> Option<ModelDefinition> {
        self.models
            .read()
            .ok()
            .and_then(|models| models.iter().find(|m| m.id == id).cloned())
    }

    pub fn get_model_by_name(&self, name: &str) -> Option<ModelDefinition> {
        self.models
            .read()
            .ok()
            .and_then(|models| models.iter().find(|m| m.name == name).cloned())
    }

    /// All models in insertion order
    pub fn list_models(&self) -> Vec<ModelDefinition> {
        self.models.read().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.models.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a field to a model
    pub fn add_field(&self, model_id: &str, field: FieldDefinition) -> SchemaResult<ModelDefinition> {
        self.modify(model_id, |model| {
            let mut fields = model.fields.clone();
            fields.push(field);
            Some(ModelPatch::new().fields(fields))
        })
    }

    /// Patch the field currently named `field_name`.
    ///
    /// Best-effort: if the model has no such field, the model is returned
    /// unchanged and nothing is written. Unknown `model_id` is `NotFound`.
    pub fn update_field(
        &self,
        model_id: &str,
        field_name: &str,
        patch: FieldPatch,
    ) -> SchemaResult<ModelDefinition> {
        self.modify(model_id, |model| {
            if !model.has_field(field_name) {
                debug!(model_id, field = field_name, "update_field: no such field");
                return None;
            }

            let fields: Vec<_> = model
                .fields
                .iter()
                .map(|f| if f.name == field_name { patch.apply(f) } else { f.clone() })
                .collect();

            let mut model_patch = ModelPatch::new().fields(fields);
            if let Some(new_name) = patch.name.as_ref().filter(|n| n.as_str() != field_name) {
                if model.display_field.as_deref() == Some(field_name) {
                    model_patch = model_patch.display_field(Some(new_name.clone()));
                }
                if model.order_by.as_deref() == Some(field_name) {
                    model_patch = model_patch.order_by(Some(new_name.clone()));
                }
            }
            Some(model_patch)
        })
    }

    /// Remove the field named `field_name`.
    ///
    /// Best-effort like `update_field`. A `displayField` or `orderBy`
    /// pointing at the removed field is cleared. Record values for the field
    /// are kept.
    pub fn delete_field(&self, model_id: &str, field_name: &str) -> SchemaResult<ModelDefinition> {
        self.modify(model_id, |model| {
            if !model.has_field(field_name) {
                debug!(model_id, field = field_name, "delete_field: no such field");
                return None;
            }

            let fields: Vec<_> = model
                .fields
                .iter()
                .filter(|f| f.name != field_name)
                .cloned()
                .collect();

            let mut model_patch = ModelPatch::new().fields(fields);
            if model.display_field.as_deref() == Some(field_name) {
                model_patch = model_patch.display_field(None);
            }
            if model.order_by.as_deref() == Some(field_name) {
                model_patch = model_patch.order_by(None);
            }
            Some(model_patch)
        })
    }

    /// Write the current model list again, e.g. after a reported flush failure
    pub fn flush(&self) -> SchemaResult<()> {
        let models = self.models.read().map_err(|_| SchemaError::poisoned())?;
        self.persist(&models)
    }

    /// Applies the patch built from the current model under one write lock.
    /// A `None` patch leaves the model untouched and skips the flush.
    fn modify<F>(&self, id: &str, build: F) -> SchemaResult<ModelDefinition>
    where
        F: FnOnce(&ModelDefinition) -> Option<ModelPatch>,
    {
        let mut models = self.models.write().map_err(|_| SchemaError::poisoned())?;

        let index = models
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| SchemaError::NotFound(id.to_string()))?;

        let Some(patch) = build(&models[index]) else {
            return Ok(models[index].clone());
        };

        if let Some(name) = &patch.name {
            if models.iter().any(|m| m.id != id && &m.name == name) {
                return Err(SchemaError::DuplicateName(name.clone()));
            }
        }

        let mut updated = patch.apply(&models[index]);
        updated.updated_at = Utc::now();
        updated
            .validate_structure()
            .map_err(SchemaError::InvalidDefinition)?;

        models[index] = updated.clone();
        info!(model_id = %updated.id, name = %updated.name, "model updated");

        self.persist(&models)?;
        Ok(updated)
    }

    fn persist(&self, models: &[ModelDefinition]) -> SchemaResult<()> {
        self.adapter.save_models(models).map_err(|e| {
            warn!(error = %e, "failed to persist models; in-memory state kept");
            SchemaError::from(e)
        })
    }
}
