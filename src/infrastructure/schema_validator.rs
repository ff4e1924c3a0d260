use anyhow::{anyhow, Result};
use jsonschema::{Draft, JSONSchema};
use once_cell::sync::Lazy;
use serde_json::Value;

static CATEGORY_GROUPING_SCHEMA: Lazy<JSONSchema> = Lazy::new(|| {
    let schema_content = include_str!("../schemas/category_grouping_schema.json");
    let schema: Value =
        serde_json::from_str(schema_content).expect("Invalid category grouping schema");
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema)
        .expect("Failed to compile category grouping schema")
});

/// Validate a grouping payload: an object of category name -> array of folder names.
pub fn validate_category_grouping(grouping: &Value) -> Result<()> {
    match CATEGORY_GROUPING_SCHEMA.validate(grouping) {
        Ok(()) => Ok(()),
        Err(errors) => {
            let error_list: Vec<String> = errors.map(|e| e.to_string()).collect();
            Err(anyhow!(
                "Category grouping validation failed:\n{}",
                error_list.join("\n")
            ))
        }
    }
}
