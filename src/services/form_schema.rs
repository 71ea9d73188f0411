use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use thiserror::Error;

use crate::models::FormFieldRow;

pub const SUPPORTED_TYPES: &[&str] = &["text", "select", "file"];

/// Field names injected for first-time registrants; an event-level field may
/// not shadow them.
pub const PROFILE_FIELD_NAMES: &[&str] = &["first_name", "last_name", "phone_number"];

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Select(Vec<String>),
    File,
}

#[derive(Debug, Clone)]
pub struct CompiledField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// The stored field list is organizer data, so a bad row is a configuration
/// defect rather than a submitter mistake; it fails compilation, not
/// validation.
#[derive(Debug, Error)]
pub enum SchemaCompileError {
    #[error("field '{field}' has unsupported type '{field_type}'")]
    UnsupportedType { field: String, field_type: String },

    #[error("field '{field}' has malformed options")]
    BadOptions { field: String },

    #[error("field '{field}' shadows a reserved profile field")]
    ReservedName { field: String },
}

/// Executable form of an event's field definitions. Compiled once from the
/// stored rows; validation itself never touches the database.
#[derive(Debug, Clone, Default)]
pub struct CompiledSchema {
    fields: Vec<CompiledField>,
}

impl CompiledSchema {
    pub fn compile(rows: &[FormFieldRow]) -> Result<Self, SchemaCompileError> {
        let mut fields = Vec::with_capacity(rows.len());
        for row in rows {
            let kind = match row.field_type.as_str() {
                "text" => FieldKind::Text,
                "file" => FieldKind::File,
                "select" => {
                    let options: Vec<String> = match row.options.as_deref() {
                        None | Some("") => Vec::new(),
                        Some(raw) => serde_json::from_str(raw).map_err(|_| {
                            SchemaCompileError::BadOptions {
                                field: row.name.clone(),
                            }
                        })?,
                    };
                    FieldKind::Select(options)
                }
                other => {
                    return Err(SchemaCompileError::UnsupportedType {
                        field: row.name.clone(),
                        field_type: other.to_string(),
                    })
                }
            };
            fields.push(CompiledField {
                name: row.name.clone(),
                label: row.label.clone(),
                kind,
                required: row.required != 0,
            });
        }
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[CompiledField] {
        &self.fields
    }

    /// Returns a new schema with the always-required profile fields merged
    /// ahead of the event-specific ones. The receiver is left untouched; the
    /// event-level definition never learns about the extension.
    pub fn with_profile_fields(&self) -> Result<Self, SchemaCompileError> {
        if let Some(field) = self
            .fields
            .iter()
            .find(|f| PROFILE_FIELD_NAMES.contains(&f.name.as_str()))
        {
            return Err(SchemaCompileError::ReservedName {
                field: field.name.clone(),
            });
        }

        let mut fields: Vec<CompiledField> = [
            ("first_name", "First name"),
            ("last_name", "Last name"),
            ("phone_number", "Phone number"),
        ]
        .iter()
        .map(|(name, label)| CompiledField {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Text,
            required: true,
        })
        .collect();
        fields.extend(self.fields.iter().cloned());
        Ok(Self { fields })
    }

    /// Validates a submitted value map. Pure and deterministic: the same
    /// inputs always produce the same normalized map or the same error list.
    pub fn validate(
        &self,
        values: &HashMap<String, String>,
    ) -> Result<BTreeMap<String, String>, Vec<FieldError>> {
        let mut errors = Vec::new();
        let mut normalized = BTreeMap::new();

        for field in &self.fields {
            let raw = values.get(&field.name).map(|v| v.trim());
            let present = raw.is_some_and(|v| !v.is_empty());

            if !present {
                if field.required {
                    errors.push(FieldError::new(
                        &field.name,
                        format!("{} is required", field.label),
                    ));
                }
                continue;
            }
            let value = raw.unwrap_or_default();

            match &field.kind {
                FieldKind::Text => {
                    normalized.insert(field.name.clone(), value.to_string());
                }
                // A select without configured options degrades to free text.
                FieldKind::Select(options) if options.is_empty() => {
                    normalized.insert(field.name.clone(), value.to_string());
                }
                FieldKind::Select(options) => {
                    if options.iter().any(|o| o == value) {
                        normalized.insert(field.name.clone(), value.to_string());
                    } else {
                        errors.push(FieldError::new(
                            &field.name,
                            "Choose an option from the list",
                        ));
                    }
                }
                // File values are opaque storage paths produced by the upload
                // collaborator; only presence matters here.
                FieldKind::File => {
                    normalized.insert(field.name.clone(), value.to_string());
                }
            }
        }

        // Responses must carry exactly the defined keys.
        let mut unknown: Vec<&String> = values
            .keys()
            .filter(|k| !self.fields.iter().any(|f| &f.name == *k))
            .collect();
        unknown.sort();
        for key in unknown {
            errors.push(FieldError::new(key, "Unknown field"));
        }

        if errors.is_empty() {
            Ok(normalized)
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, field_type: &str, required: bool, options: Option<&str>) -> FormFieldRow {
        FormFieldRow {
            id: 0,
            event_id: 1,
            name: name.to_string(),
            label: name.to_string(),
            field_type: field_type.to_string(),
            required: required as i64,
            options: options.map(|s| s.to_string()),
            position: 0,
        }
    }

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn required_text_rejects_whitespace_only() {
        let schema = CompiledSchema::compile(&[row("shirt_size", "text", true, None)]).unwrap();
        let errors = schema.validate(&values(&[("shirt_size", "   ")])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "shirt_size");
    }

    #[test]
    fn optional_text_accepts_absence_and_empty() {
        let schema = CompiledSchema::compile(&[row("company", "text", false, None)]).unwrap();
        assert!(schema.validate(&values(&[])).unwrap().is_empty());
        assert!(schema.validate(&values(&[("company", "")])).unwrap().is_empty());
    }

    #[test]
    fn select_rejects_value_outside_options_naming_the_field() {
        let schema = CompiledSchema::compile(&[row(
            "package",
            "select",
            true,
            Some(r#"["basic","full"]"#),
        )])
        .unwrap();

        let errors = schema.validate(&values(&[("package", "deluxe")])).unwrap_err();
        assert_eq!(errors[0].field, "package");

        let ok = schema.validate(&values(&[("package", "full")])).unwrap();
        assert_eq!(ok.get("package").map(String::as_str), Some("full"));
    }

    #[test]
    fn select_without_options_behaves_as_free_text() {
        let schema = CompiledSchema::compile(&[row("topic", "select", true, None)]).unwrap();
        let ok = schema.validate(&values(&[("topic", "anything")])).unwrap();
        assert_eq!(ok.get("topic").map(String::as_str), Some("anything"));
    }

    #[test]
    fn required_file_checks_presence_only() {
        let schema = CompiledSchema::compile(&[row("voucher", "file", true, None)]).unwrap();
        assert!(schema.validate(&values(&[])).is_err());
        let ok = schema
            .validate(&values(&[("voucher", "devfest-25/voucher/abc.png")]))
            .unwrap();
        assert!(ok.contains_key("voucher"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let schema = CompiledSchema::compile(&[row("company", "text", false, None)]).unwrap();
        let errors = schema.validate(&values(&[("surprise", "x")])).unwrap_err();
        assert_eq!(errors[0].field, "surprise");
    }

    #[test]
    fn unsupported_type_fails_compilation() {
        let err = CompiledSchema::compile(&[row("age", "number", true, None)]).unwrap_err();
        assert!(matches!(err, SchemaCompileError::UnsupportedType { .. }));
    }

    #[test]
    fn profile_extension_prepends_without_mutating_original() {
        let schema = CompiledSchema::compile(&[row("package", "text", true, None)]).unwrap();
        let extended = schema.with_profile_fields().unwrap();

        assert_eq!(extended.fields()[0].name, "first_name");
        assert_eq!(extended.fields()[3].name, "package");
        assert_eq!(schema.fields().len(), 1);

        let errors = extended.validate(&values(&[("package", "x")])).unwrap_err();
        let missing: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(missing, vec!["first_name", "last_name", "phone_number"]);
    }

    #[test]
    fn profile_extension_rejects_shadowed_names() {
        let schema = CompiledSchema::compile(&[row("first_name", "text", true, None)]).unwrap();
        assert!(matches!(
            schema.with_profile_fields().unwrap_err(),
            SchemaCompileError::ReservedName { .. }
        ));
    }

    #[test]
    fn validation_is_deterministic() {
        let schema = CompiledSchema::compile(&[
            row("package", "select", true, Some(r#"["basic","full"]"#)),
            row("company", "text", false, None),
        ])
        .unwrap();
        let input = values(&[("package", "deluxe"), ("zz_extra", "1"), ("aa_extra", "2")]);

        let first = schema.validate(&input).unwrap_err();
        let second = schema.validate(&input).unwrap_err();
        assert_eq!(first, second);
    }
}
