//! Record Store
//!
//! Owns every record, grouped by model id in insertion order. Writes resolve
//! the model through the registry and validate the payload before anything
//! changes. Each mutation flushes the full record snapshot while the write
//! lock is held.
//!
//! The in-memory mutation is the commit point: a failed flush is reported
//! as `StoreError::Persistence` but not rolled back.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::errors::{StoreError, StoreResult};
use super::filters::{values_equal, RecordFilter};
use super::query::{QueryOptions, QueryResult};
use super::record::{ModelRecord, ModelStats, StaleRecord};
use super::sorter::RecordSorter;
use crate::persistence::{
    MemoryAdapter, PersistenceAdapter, PersistenceResult, RecordSnapshot,
};
use crate::schema::{
    validate_field, FieldDefinition, FieldValue, ModelDefinition, RecordData, RecordValidator,
    SchemaRegistry, ValidationResult,
};

/// Validated CRUD and queries over model records
#[derive(Debug)]
pub struct RecordStore {
    registry: Arc<SchemaRegistry>,
    records: RwLock<RecordSnapshot>,
    adapter: Arc<dyn PersistenceAdapter>,
}

impl RecordStore {
    /// Create a store holding whatever the adapter has stored.
    ///
    /// Loaded values are retagged to the field types of their model when
    /// the model is known to the registry.
    pub fn open(
        registry: Arc<SchemaRegistry>,
        adapter: Arc<dyn PersistenceAdapter>,
    ) -> PersistenceResult<Self> {
        let mut records = adapter.load_records()?;

        for (model_id, model_records) in records.iter_mut() {
            let Some(model) = registry.get_model(model_id) else {
                debug!(model_id = %model_id, records = model_records.len(), "records without a model");
                continue;
            };
            let validator = RecordValidator::new(&model);
            for record in model_records.iter_mut() {
                record.data = validator.conform(std::mem::take(&mut record.data));
            }
        }

        debug!(models = records.len(), "record store loaded");
        Ok(Self {
            registry,
            records: RwLock::new(records),
            adapter,
        })
    }

    /// Empty store writing through `adapter`; nothing is loaded
    pub fn new(registry: Arc<SchemaRegistry>, adapter: Arc<dyn PersistenceAdapter>) -> Self {
        Self {
            registry,
            records: RwLock::new(RecordSnapshot::new()),
            adapter,
        }
    }

    /// Empty store over a fresh in-memory adapter
    pub fn in_memory(registry: Arc<SchemaRegistry>) -> Self {
        Self::new(registry, Arc::new(MemoryAdapter::new()))
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Create a record.
    ///
    /// Absent fields with a default value are filled first. Every declared
    /// field is validated; all failures are returned together.
    ///
    /// # Errors
    ///
    /// - `ModelNotFound` if the model is not in the registry
    /// - `ValidationFailed` with one message per failing field
    /// - `Persistence` if the flush failed (the record is still stored)
    pub fn create(&self, model_id: &str, data: RecordData) -> StoreResult<ModelRecord> {
        let model = self.require_model(model_id)?;
        let validator = RecordValidator::new(&model);

        let mut data = data;
        validator.apply_defaults(&mut data);

        let mut records = self.records.write().map_err(|_| StoreError::poisoned())?;
        let existing = records.get(model_id).map(Vec::as_slice).unwrap_or(&[]);

        let failures = check_record(&model, &data, existing, None);
        if !failures.is_empty() {
            debug!(model_id, errors = failures.len(), "create rejected");
            return Err(validation_failed(failures));
        }

        let now = Utc::now();
        let record = ModelRecord {
            id: format!("record_{}", Uuid::new_v4().simple()),
            model_id: model_id.to_string(),
            data: validator.conform(data),
            created_at: now,
            updated_at: now,
        };

        records
            .entry(model_id.to_string())
            .or_default()
            .push(record.clone());
        info!(model_id, record_id = %record.id, "record created");

        self.persist(&records)?;
        Ok(record)
    }

    /// Overlay `partial` onto a record's data and re-validate the result.
    ///
    /// The merge is shallow: each key in `partial` replaces the stored value
    /// wholesale, keys not in `partial` are kept. Returns `Ok(None)` if the
    /// record does not exist.
    pub fn update(
        &self,
        model_id: &str,
        record_id: &str,
        partial: RecordData,
    ) -> StoreResult<Option<ModelRecord>> {
        let mut records = self.records.write().map_err(|_| StoreError::poisoned())?;

        let Some(index) = records
            .get(model_id)
            .and_then(|rs| rs.iter().position(|r| r.id == record_id))
        else {
            return Ok(None);
        };

        let model = self.require_model(model_id)?;
        let model_records = records.get(model_id).map(Vec::as_slice).unwrap_or(&[]);

        let mut merged = model_records[index].data.clone();
        merged.extend(partial);

        let failures = check_record(&model, &merged, model_records, Some(record_id));
        if !failures.is_empty() {
            debug!(model_id, record_id, errors = failures.len(), "update rejected");
            return Err(validation_failed(failures));
        }

        let merged = RecordValidator::new(&model).conform(merged);
        let updated = match records.get_mut(model_id).and_then(|rs| rs.get_mut(index)) {
            Some(record) => {
                record.data = merged;
                record.updated_at = Utc::now();
                record.clone()
            }
            None => return Ok(None),
        };
        info!(model_id, record_id, "record updated");

        self.persist(&records)?;
        Ok(Some(updated))
    }

    /// Remove one record. Returns whether it existed.
    pub fn delete(&self, model_id: &str, record_id: &str) -> StoreResult<bool> {
        let mut records = self.records.write().map_err(|_| StoreError::poisoned())?;

        let Some(model_records) = records.get_mut(model_id) else {
            return Ok(false);
        };
        let Some(index) = model_records.iter().position(|r| r.id == record_id) else {
            return Ok(false);
        };
        model_records.remove(index);
        info!(model_id, record_id, "record deleted");

        self.persist(&records)?;
        Ok(true)
    }

    /// Remove every record whose id is listed. Unknown ids are ignored.
    /// Returns how many records were removed.
    pub fn bulk_delete<S: AsRef<str>>(&self, model_id: &str, record_ids: &[S]) -> StoreResult<usize> {
        let ids: HashSet<&str> = record_ids.iter().map(|id| id.as_ref()).collect();
        let mut records = self.records.write().map_err(|_| StoreError::poisoned())?;

        let Some(model_records) = records.get_mut(model_id) else {
            return Ok(0);
        };
        let before = model_records.len();
        model_records.retain(|r| !ids.contains(r.id.as_str()));
        let removed = before - model_records.len();

        if removed > 0 {
            info!(model_id, removed, "records bulk deleted");
            self.persist(&records)?;
        }
        Ok(removed)
    }

    /// Remove every record of a model, e.g. after the model was deleted
    pub fn purge_model(&self, model_id: &str) -> StoreResult<usize> {
        let mut records = self.records.write().map_err(|_| StoreError::poisoned())?;

        let removed = records.remove(model_id).map(|rs| rs.len()).unwrap_or(0);
        if removed > 0 {
            info!(model_id, removed, "model records purged");
            self.persist(&records)?;
        }
        Ok(removed)
    }

    pub fn get(&self, model_id: &str, record_id: &str) -> Option<ModelRecord> {
        self.records.read().ok().and_then(|records| {
            records
                .get(model_id)
                .and_then(|rs| rs.iter().find(|r| r.id == record_id).cloned())
        })
    }

    /// Number of records stored for a model
    pub fn count(&self, model_id: &str) -> usize {
        self.records
            .read()
            .map(|records| records.get(model_id).map(Vec::len).unwrap_or(0))
            .unwrap_or(0)
    }

    /// Filter, sort, then paginate a model's records.
    ///
    /// Without `order_by` the model's own `orderBy` is used; without either
    /// the insertion order is kept. An unknown model yields no records.
    pub fn query(&self, model_id: &str, options: &QueryOptions) -> StoreResult<QueryResult> {
        let records = self.records.read().map_err(|_| StoreError::poisoned())?;
        let all = records.get(model_id).map(Vec::as_slice).unwrap_or(&[]);
        let total = all.len();

        let mut matched: Vec<ModelRecord> = all
            .iter()
            .filter(|r| RecordFilter::matches(r, &options.filter))
            .cloned()
            .collect();
        drop(records);

        let order_by = options.order_by.clone().or_else(|| {
            self.registry
                .get_model(model_id)
                .and_then(|m| m.order_by)
        });
        if let Some(field) = order_by {
            RecordSorter::sort(&mut matched, &field, options.order);
        }

        let records: Vec<ModelRecord> = matched
            .into_iter()
            .skip(options.offset.unwrap_or(0))
            .take(options.limit.unwrap_or(usize::MAX))
            .collect();

        debug!(model_id, total, returned = records.len(), "query");
        Ok(QueryResult { records, total })
    }

    pub fn model_stats(&self, model_id: &str) -> ModelStats {
        self.records
            .read()
            .ok()
            .and_then(|records| {
                records.get(model_id).map(|rs| ModelStats {
                    total_records: rs.len(),
                    last_updated: rs.iter().map(|r| r.updated_at).max(),
                })
            })
            .unwrap_or_default()
    }

    /// Re-validate a model's records against its current fields.
    ///
    /// Records are never re-checked when a schema changes; this reports the
    /// ones that would fail today. Uniqueness is not re-checked.
    pub fn find_stale_records(&self, model_id: &str) -> StoreResult<Vec<StaleRecord>> {
        let model = self.require_model(model_id)?;
        let validator = RecordValidator::new(&model);
        let records = self.records.read().map_err(|_| StoreError::poisoned())?;

        Ok(records
            .get(model_id)
            .map(|rs| {
                rs.iter()
                    .filter_map(|r| {
                        let errors = validator.validate(&r.data);
                        (!errors.is_empty()).then(|| StaleRecord {
                            record_id: r.id.clone(),
                            errors,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Fails with `StaleRecord` if the record no longer satisfies its model
    pub fn ensure_conforms(&self, model_id: &str, record_id: &str) -> StoreResult<()> {
        let model = self.require_model(model_id)?;
        let record = self
            .get(model_id, record_id)
            .ok_or_else(|| StoreError::RecordNotFound {
                model_id: model_id.to_string(),
                record_id: record_id.to_string(),
            })?;

        let errors = RecordValidator::new(&model).validate(&record.data);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(StoreError::StaleRecord {
                record_id: record.id,
                errors,
            })
        }
    }

    /// Write the current records again, e.g. after a reported flush failure
    pub fn flush(&self) -> StoreResult<()> {
        let records = self.records.read().map_err(|_| StoreError::poisoned())?;
        self.persist(&records)
    }

    fn require_model(&self, model_id: &str) -> StoreResult<ModelDefinition> {
        self.registry
            .get_model(model_id)
            .ok_or_else(|| StoreError::ModelNotFound(model_id.to_string()))
    }

    fn persist(&self, records: &RecordSnapshot) -> StoreResult<()> {
        self.adapter.save_records(records).map_err(|e| {
            warn!(error = %e, "failed to persist records; in-memory state kept");
            StoreError::from(e)
        })
    }
}

/// `(field name, message)` per failing declared field: field validation
/// first, then uniqueness against the other records of the model.
fn check_record(
    model: &ModelDefinition,
    data: &RecordData,
    existing: &[ModelRecord],
    exclude: Option<&str>,
) -> Vec<(String, String)> {
    model
        .fields
        .iter()
        .filter_map(|field| {
            let value = data.get(&field.name);
            let reason = match validate_field(field, value) {
                ValidationResult::Invalid(reason) => reason,
                ValidationResult::Valid => match value {
                    Some(v) if field.unique && is_taken(field, v, existing, exclude) => {
                        format!("{} must be unique", field.label)
                    }
                    _ => return None,
                },
            };
            Some((field.name.clone(), reason))
        })
        .collect()
}

fn validation_failed(failures: Vec<(String, String)>) -> StoreError {
    let (fields, errors) = failures.into_iter().unzip();
    StoreError::ValidationFailed { fields, errors }
}

fn is_taken(
    field: &FieldDefinition,
    value: &FieldValue,
    existing: &[ModelRecord],
    exclude: Option<&str>,
) -> bool {
    if value.is_blank() {
        return false;
    }
    let candidate = value.conform(field.field_type).unwrap_or_else(|_| value.clone());
    existing
        .iter()
        .filter(|r| Some(r.id.as_str()) != exclude)
        .filter_map(|r| r.get(&field.name))
        .any(|other| values_equal(other, &candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::schema::{data_from_json, FieldType, ModelSpec};
    use serde_json::json;

    fn setup() -> (Arc<SchemaRegistry>, RecordStore, String) {
        let registry = Arc::new(SchemaRegistry::in_memory());
        let model = registry
            .define_model(
                ModelSpec::new("product", "Product")
                    .field(FieldDefinition::new("name", FieldType::String, "Name").required())
                    .field(FieldDefinition::new("price", FieldType::Number, "Price").with_min(0.0))
                    .field(FieldDefinition::new("sku", FieldType::String, "SKU").unique())
                    .field(
                        FieldDefinition::new("in_stock", FieldType::Boolean, "In Stock")
                            .with_default(true),
                    ),
            )
            .unwrap();
        let store = RecordStore::in_memory(registry.clone());
        (registry, store, model.id)
    }

    #[test]
    fn test_create_and_get() {
        let (_registry, store, model_id) = setup();
        let record = store
            .create(&model_id, data_from_json(json!({"name": "Widget", "price": 10})))
            .unwrap();

        assert!(record.id.starts_with("record_"));
        assert_eq!(record.created_at, record.updated_at);
        assert_eq!(record.data["price"], FieldValue::from(10));
        assert_eq!(record.data["in_stock"], FieldValue::Boolean(true));
        assert_eq!(store.get(&model_id, &record.id), Some(record));
    }

    #[test]
    fn test_create_unknown_model() {
        let (_registry, store, _) = setup();
        let err = store.create("model_missing", RecordData::new()).unwrap_err();
        assert!(matches!(err, StoreError::ModelNotFound(_)));
    }

    #[test]
    fn test_unique_enforced() {
        let (_registry, store, model_id) = setup();
        store
            .create(&model_id, data_from_json(json!({"name": "A", "sku": "X-1"})))
            .unwrap();

        let err = store
            .create(&model_id, data_from_json(json!({"name": "B", "sku": "X-1"})))
            .unwrap_err();
        assert_eq!(err.messages(), ["SKU must be unique".to_string()]);
        assert_eq!(err.failed_fields(), ["sku".to_string()]);

        let ok = store
            .create(&model_id, data_from_json(json!({"name": "C", "sku": ""})))
            .unwrap();
        store
            .create(&model_id, data_from_json(json!({"name": "D", "sku": ""})))
            .unwrap();

        // updating a record with its own value is not a conflict
        store
            .update(&model_id, &ok.id, data_from_json(json!({"sku": "X-2"})))
            .unwrap();
        store
            .update(&model_id, &ok.id, data_from_json(json!({"sku": "X-2"})))
            .unwrap();
    }

    #[test]
    fn test_update_missing_record_is_none() {
        let (_registry, store, model_id) = setup();
        let result = store
            .update(&model_id, "record_missing", RecordData::new())
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_update_validates_merged_data() {
        let (_registry, store, model_id) = setup();
        let record = store
            .create(&model_id, data_from_json(json!({"name": "Widget", "price": 10})))
            .unwrap();

        let err = store
            .update(&model_id, &record.id, data_from_json(json!({"name": ""})))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
        assert_eq!(
            store.get(&model_id, &record.id).unwrap().data["name"],
            FieldValue::from("Widget")
        );
    }

    #[test]
    fn test_failed_flush_keeps_in_memory_change() {
        let registry = Arc::new(SchemaRegistry::in_memory());
        let model = registry
            .define_model(
                ModelSpec::new("note", "Note")
                    .field(FieldDefinition::new("body", FieldType::Text, "Body")),
            )
            .unwrap();
        let adapter = Arc::new(MemoryAdapter::new());
        let store = RecordStore::new(registry, adapter.clone());

        adapter.set_fail_writes(true);
        let err = store
            .create(&model.id, data_from_json(json!({"body": "hello"})))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert_eq!(store.count(&model.id), 1);
        assert!(adapter.load_records().unwrap().is_empty());

        adapter.set_fail_writes(false);
        store.flush().unwrap();
        assert_eq!(adapter.load_records().unwrap()[&model.id].len(), 1);
    }

    #[test]
    fn test_every_mutation_flushes() {
        let registry = Arc::new(SchemaRegistry::in_memory());
        let model = registry.define_model(ModelSpec::new("tag", "Tag")).unwrap();
        let adapter = Arc::new(MemoryAdapter::new());
        let store = RecordStore::new(registry, adapter.clone());

        let a = store.create(&model.id, RecordData::new()).unwrap();
        let b = store.create(&model.id, RecordData::new()).unwrap();
        store.update(&model.id, &a.id, RecordData::new()).unwrap();
        store.delete(&model.id, &a.id).unwrap();
        store.bulk_delete(&model.id, &[b.id.as_str()]).unwrap();
        assert_eq!(adapter.record_saves(), 5);

        // no-ops do not flush
        store.delete(&model.id, &a.id).unwrap();
        store.bulk_delete(&model.id, &["nope"]).unwrap();
        assert_eq!(adapter.record_saves(), 5);
    }
}
