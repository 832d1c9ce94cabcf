//! Schema Registry Invariant Tests
//!
//! - Model names are unique across the registry
//! - Model ids never change across updates
//! - Field names are unique within a model
//! - Field-level validation is pure and deterministic

use modeldb::error::ErrorKind;
use modeldb::schema::{validate_field, ModelPatch, RelationKind, ValidationResult};
use modeldb::{FieldDefinition, FieldType, FieldValue, ModelSpec, SchemaRegistry};
use serde_json::json;

// =============================================================================
// Model Definition Tests
// =============================================================================

/// A second model with the same name is rejected and nothing changes.
#[test]
fn test_duplicate_model_name() {
    let registry = SchemaRegistry::in_memory();

    registry.define_model(ModelSpec::new("x", "X")).unwrap();
    let err = registry.define_model(ModelSpec::new("x", "Other X")).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DuplicateName);
    let named_x: Vec<_> = registry
        .list_models()
        .into_iter()
        .filter(|m| m.name == "x")
        .collect();
    assert_eq!(named_x.len(), 1);
    assert_eq!(named_x[0].label, "X");
}

/// Updates keep the id and creation time and bump `updatedAt`.
#[test]
fn test_update_keeps_identity() {
    let registry = SchemaRegistry::in_memory();
    let model = registry
        .define_model(ModelSpec::new("article", "Article").description("Posts"))
        .unwrap();

    let updated = registry
        .update_model(&model.id, ModelPatch::new().label("Story").plural_label("Stories"))
        .unwrap();

    assert_eq!(updated.id, model.id);
    assert_eq!(updated.created_at, model.created_at);
    assert!(updated.updated_at >= model.updated_at);
    assert_eq!(updated.label, "Story");
    assert_eq!(updated.description.as_deref(), Some("Posts"));
    assert_eq!(registry.get_model_by_name("article"), Some(updated));
}

/// Lookup by id and by name, in insertion order.
#[test]
fn test_lookup() {
    let registry = SchemaRegistry::in_memory();
    let first = registry.define_model(ModelSpec::new("first", "First")).unwrap();
    let second = registry.define_model(ModelSpec::new("second", "Second")).unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(registry.get_model(&second.id), Some(second.clone()));
    assert_eq!(registry.get_model_by_name("first"), Some(first.clone()));
    assert!(registry.get_model("model_missing").is_none());
    assert_eq!(registry.list_models(), vec![first, second]);
}

/// Names must be identifier-safe and field names unique.
#[test]
fn test_invalid_definitions_rejected() {
    let registry = SchemaRegistry::in_memory();

    let bad_name = registry.define_model(ModelSpec::new("Blog Post", "Blog Post"));
    assert_eq!(bad_name.unwrap_err().kind(), ErrorKind::InvalidDefinition);

    let dup_fields = registry.define_model(
        ModelSpec::new("post", "Post")
            .field(FieldDefinition::new("title", FieldType::String, "Title"))
            .field(FieldDefinition::new("title", FieldType::Text, "Title again")),
    );
    assert_eq!(dup_fields.unwrap_err().kind(), ErrorKind::InvalidDefinition);

    let inverted = registry.define_model(
        ModelSpec::new("score", "Score").field(
            FieldDefinition::new("value", FieldType::Number, "Value")
                .with_min(10.0)
                .with_max(1.0),
        ),
    );
    assert_eq!(inverted.unwrap_err().kind(), ErrorKind::InvalidDefinition);

    assert!(registry.is_empty());
}

/// Field add, update and delete each bump `updatedAt` and keep order.
#[test]
fn test_field_operations() {
    let registry = SchemaRegistry::in_memory();
    let model = registry
        .define_model(
            ModelSpec::new("author", "Author")
                .field(FieldDefinition::new("name", FieldType::String, "Name").required()),
        )
        .unwrap();

    let with_email = registry
        .add_field(&model.id, FieldDefinition::new("email", FieldType::Email, "Email"))
        .unwrap();
    assert_eq!(with_email.fields.len(), 2);
    assert_eq!(with_email.fields[1].name, "email");

    let dup = registry.add_field(&model.id, FieldDefinition::new("email", FieldType::String, "E"));
    assert_eq!(dup.unwrap_err().kind(), ErrorKind::InvalidDefinition);

    let without_name = registry.delete_field(&model.id, "name").unwrap();
    assert_eq!(without_name.fields.len(), 1);
    assert_eq!(without_name.id, model.id);

    let err = registry.delete_field("model_missing", "name").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

/// Relation metadata is declarative and stored verbatim.
#[test]
fn test_relation_metadata_round_trips() {
    let registry = SchemaRegistry::in_memory();
    let author = registry.define_model(ModelSpec::new("author", "Author")).unwrap();
    let post = registry
        .define_model(ModelSpec::new("post", "Post").field(
            FieldDefinition::new("author", FieldType::Relation, "Author")
                .with_relation(
                    RelationKind::BelongsTo,
                    author.id.clone(),
                    Some("author_id".to_string()),
                )
                .with_help_text("Who wrote the post"),
        ))
        .unwrap();

    let doc = serde_json::to_value(&post).unwrap();
    assert_eq!(doc["fields"][0]["type"], json!("relation"));
    assert_eq!(doc["fields"][0]["relationKind"], json!("belongsTo"));
    assert_eq!(doc["fields"][0]["relatedModelId"], json!(author.id));
    assert_eq!(doc["fields"][0]["helpText"], json!("Who wrote the post"));
}

// =============================================================================
// Field Validation Tests
// =============================================================================

/// Required fields reject null, absent and empty string.
#[test]
fn test_required_rejects_empty() {
    let field = FieldDefinition::new("title", FieldType::String, "Title").required();

    for value in [None, Some(FieldValue::Null), Some(FieldValue::from(""))] {
        assert_eq!(
            validate_field(&field, value.as_ref()),
            ValidationResult::Invalid("Title is required".into())
        );
    }
    assert!(validate_field(&field, Some(&FieldValue::from("Hello"))).is_valid());
}

/// Numeric bounds accept exactly the closed interval.
#[test]
fn test_number_bounds_closed_interval() {
    let field = FieldDefinition::new("rating", FieldType::Number, "Rating")
        .with_min(1.0)
        .with_max(5.0);

    for accepted in [1.0, 2.5, 5.0] {
        assert!(validate_field(&field, Some(&FieldValue::from(accepted))).is_valid());
    }
    assert_eq!(
        validate_field(&field, Some(&FieldValue::from(0.99))).error(),
        Some("Value must be at least 1")
    );
    assert_eq!(
        validate_field(&field, Some(&FieldValue::from(5.01))).error(),
        Some("Value must be at most 5")
    );
}

/// Format checks only run when a value is present.
#[test]
fn test_formats() {
    let email = FieldDefinition::new("email", FieldType::Email, "Email");
    let url = FieldDefinition::new("site", FieldType::Url, "Site");
    let slug = FieldDefinition::new("slug", FieldType::String, "Slug").with_pattern("^[a-z-]+$");

    assert!(validate_field(&email, None).is_valid());
    assert!(validate_field(&email, Some(&"a@b.co".into())).is_valid());
    assert_eq!(
        validate_field(&email, Some(&"not-an-email".into())).error(),
        Some("Invalid email format")
    );

    assert!(validate_field(&url, Some(&"https://example.com/x".into())).is_valid());
    assert_eq!(
        validate_field(&url, Some(&"/relative/path".into())).error(),
        Some("Invalid URL format")
    );

    assert!(validate_field(&slug, Some(&"hello-world".into())).is_valid());
    assert_eq!(
        validate_field(&slug, Some(&"Hello World".into())).error(),
        Some("Value doesn't match required pattern")
    );
}

/// Options are checked after the pattern.
#[test]
fn test_options() {
    let status = FieldDefinition::new("status", FieldType::String, "Status")
        .with_options(["draft", "published"]);

    assert!(validate_field(&status, Some(&"draft".into())).is_valid());
    assert_eq!(
        validate_field(&status, Some(&"archived".into())).error(),
        Some("Value must be one of: draft, published")
    );
}
