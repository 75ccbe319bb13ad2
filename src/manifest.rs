//! Multi-document YAML to [`CustomResourceInstance`] loading.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ManifestError;
use crate::resource::{CustomResourceInstance, ResourceKind};

/// Load every document with a recognized kind, in document order.
///
/// Documents of other kinds are skipped with a warning. Missing
/// `metadata.name` or `metadata.namespace` are tolerated.
pub fn resources_from_yaml(raw: &str) -> Result<Vec<CustomResourceInstance>, ManifestError> {
    load(raw, false)
}

/// Like [`resources_from_yaml`], but an unrecognized kind fails the whole load.
pub fn resources_from_yaml_strict(
    raw: &str,
) -> Result<Vec<CustomResourceInstance>, ManifestError> {
    load(raw, true)
}

fn load(raw: &str, strict: bool) -> Result<Vec<CustomResourceInstance>, ManifestError> {
    // Parse everything up front so a broken document anywhere yields no resources.
    let mut docs = Vec::new();
    for doc in serde_yaml::Deserializer::from_str(raw) {
        let mut value = serde_yaml::Value::deserialize(doc)?;
        value.apply_merge()?;
        docs.push(serde_json::to_value(value)?);
    }

    let mut resources = Vec::new();
    for (index, mut doc) in docs.into_iter().enumerate() {
        if doc.is_null() {
            continue;
        }

        let kind_name = doc.get("kind").and_then(Value::as_str).map(String::from);
        let kind = match kind_name.as_deref().and_then(ResourceKind::from_kind) {
            Some(kind) => kind,
            None if strict => {
                return Err(ManifestError::UnknownKind {
                    index,
                    kind: kind_name,
                })
            }
            None => {
                warn!("skipping document {} with unrecognized kind {:?}", index, kind_name);
                continue;
            }
        };

        let name = metadata_string(&mut doc, "/metadata/name");
        let namespace = metadata_string(&mut doc, "/metadata/namespace").unwrap_or_default();

        if kind.is_namespaced() == namespace.is_empty() {
            warn!(
                "{} {:?} namespace {:?} does not match the kind's scope",
                kind, name, namespace
            );
        }

        debug!("Loading resource: {}", doc);
        resources.push(CustomResourceInstance::new(kind, doc, name, namespace));
    }

    Ok(resources)
}

/// Reads a scalar metadata field as a string. Unquoted names such as `2048`
/// load as numbers; they are rewritten as strings in the document as well.
fn metadata_string(doc: &mut Value, pointer: &str) -> Option<String> {
    let field = doc.pointer_mut(pointer)?;
    let text = match field {
        Value::String(s) => return Some(s.clone()),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    *field = Value::String(text.clone());
    Some(text)
}
