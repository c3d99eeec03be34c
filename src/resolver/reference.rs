//! `$ref` resolution: file references, RFC 6901 fragments, shared
//! document caching, and cycle detection.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::error::TinctureError;

/// Parsed-document cache keyed by canonical absolute path.
///
/// Cloning shares the underlying map, so resolver instances constructed
/// from the same cache never read a file twice. Entries never expire
/// within a build; the build coordinator drops the cache on return.
#[derive(Debug, Clone, Default)]
pub struct DocumentCache {
    inner: Rc<RefCell<HashMap<PathBuf, Rc<Value>>>>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, path: &Path) -> Option<Rc<Value>> {
        self.inner.borrow().get(path).cloned()
    }

    fn insert(&self, path: PathBuf, doc: Rc<Value>) {
        self.inner.borrow_mut().insert(path, doc);
    }
}

/// A document together with the path it was loaded from, used as the
/// resolution context for fragment references inside it.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub value: Rc<Value>,
    pub path: Option<PathBuf>,
}

impl LoadedDocument {
    /// Wrap an inline (pathless) document.
    pub fn inline(value: Value) -> Self {
        Self {
            value: Rc::new(value),
            path: None,
        }
    }

    fn identity(&self) -> String {
        self.path
            .as_deref()
            .map_or_else(|| "<inline>".to_string(), |p| p.display().to_string())
    }
}

/// Resolves `$ref` values: fragments (`#/a/b/c`), relative/absolute file
/// paths with optional fragments, and `{$ref, …overrides}` objects.
#[derive(Debug)]
pub struct ReferenceResolver {
    base_dir: PathBuf,
    cache: DocumentCache,
}

impl ReferenceResolver {
    pub fn new(base_dir: impl Into<PathBuf>, cache: DocumentCache) -> Self {
        Self {
            base_dir: base_dir.into(),
            cache,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Read and parse a file through the cache.
    pub fn load_file(&self, path: &Path) -> Result<LoadedDocument, TinctureError> {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        };
        let canonical = std::fs::canonicalize(&joined).unwrap_or(joined);

        if let Some(cached) = self.cache.get(&canonical) {
            return Ok(LoadedDocument {
                value: cached,
                path: Some(canonical),
            });
        }

        tracing::debug!(path = %canonical.display(), "reading token document");
        let text = std::fs::read_to_string(&canonical).map_err(|source| {
            TinctureError::FileRead {
                path: canonical.display().to_string(),
                source,
            }
        })?;
        let parsed: Value =
            serde_json::from_str(&text).map_err(|error| TinctureError::FileParse {
                path: canonical.display().to_string(),
                message: error.to_string(),
            })?;
        let doc = Rc::new(parsed);
        self.cache.insert(canonical.clone(), Rc::clone(&doc));
        Ok(LoadedDocument {
            value: doc,
            path: Some(canonical),
        })
    }

    /// Resolve a reference: a string or a `{$ref, …overrides}` object.
    ///
    /// The visited set is cleared on every top-level entry regardless of
    /// outcome. Within one entry it acts as a stack of the reference
    /// chain currently being followed.
    pub fn resolve(
        &self,
        reference: &Value,
        current: Option<&LoadedDocument>,
    ) -> Result<Value, TinctureError> {
        let mut visited = Vec::new();
        let (value, _) = self.resolve_node(reference, current, &mut visited)?;
        Ok(value)
    }

    /// Recursively resolve every `$ref` node inside `node`.
    pub fn resolve_deep(
        &self,
        node: &Value,
        current: Option<&LoadedDocument>,
    ) -> Result<Value, TinctureError> {
        let mut visited = Vec::new();
        self.deep(node, current, &mut visited)
    }

    fn deep(
        &self,
        node: &Value,
        current: Option<&LoadedDocument>,
        visited: &mut Vec<String>,
    ) -> Result<Value, TinctureError> {
        match node {
            Value::Object(obj) if obj.contains_key("$ref") => {
                // Keep the chain on the stack while recursing into the
                // resolved content, so indirect cycles across documents
                // are caught; unwind once the subtree is done.
                let depth = visited.len();
                let (resolved, context) = self.resolve_node(node, current, visited)?;
                let result = self.deep(&resolved, context.as_ref().or(current), visited);
                visited.truncate(depth);
                result
            }
            Value::Object(obj) => {
                let mut out = Map::new();
                for (key, value) in obj {
                    out.insert(key.clone(), self.deep(value, current, visited)?);
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.deep(item, current, visited))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    /// Resolve one reference node, returning the value and the document
    /// context it came from (for nested fragment resolution).
    fn resolve_node(
        &self,
        reference: &Value,
        current: Option<&LoadedDocument>,
        visited: &mut Vec<String>,
    ) -> Result<(Value, Option<LoadedDocument>), TinctureError> {
        match reference {
            Value::String(s) => self.resolve_str(s, current, visited),
            Value::Object(obj) => {
                let Some(target) = obj.get("$ref").and_then(Value::as_str) else {
                    return Err(TinctureError::Validation {
                        message: format!("$ref must be a string, got {reference}"),
                    });
                };
                let (resolved, context) = self.resolve_str(target, current, visited)?;
                let overrides: Vec<(&String, &Value)> =
                    obj.iter().filter(|(key, _)| *key != "$ref").collect();
                if overrides.is_empty() {
                    return Ok((resolved, context));
                }
                let Value::Object(mut base) = resolved else {
                    return Err(TinctureError::Validation {
                        message: format!(
                            "cannot apply local overrides to non-object reference '{target}'"
                        ),
                    });
                };
                for (key, value) in overrides {
                    base.insert(key.clone(), value.clone());
                }
                Ok((Value::Object(base), context))
            }
            other => Err(TinctureError::Validation {
                message: format!("invalid reference: {other}"),
            }),
        }
    }

    fn resolve_str(
        &self,
        reference: &str,
        current: Option<&LoadedDocument>,
        visited: &mut Vec<String>,
    ) -> Result<(Value, Option<LoadedDocument>), TinctureError> {
        if let Some(fragment) = reference.strip_prefix('#') {
            let Some(doc) = current else {
                return Err(TinctureError::RefNoDocument {
                    reference: reference.to_string(),
                });
            };
            let canonical = format!("{}#{fragment}", doc.identity());
            self.enter(&canonical, visited)?;
            let target =
                doc.value
                    .pointer(fragment)
                    .ok_or_else(|| TinctureError::RefNotFound {
                        reference: reference.to_string(),
                    })?;
            let value = self.chase(target.clone(), Some(doc), visited)?;
            return Ok((value, Some(doc.clone())));
        }

        // File reference, optionally with a fragment.
        let (file_part, fragment) = match reference.split_once('#') {
            Some((file, frag)) => (file, Some(frag)),
            None => (reference, None),
        };
        let loaded = self.load_file(Path::new(file_part))?;
        let canonical = format!("{}#{}", loaded.identity(), fragment.unwrap_or(""));
        self.enter(&canonical, visited)?;

        let target = match fragment {
            Some(pointer) => loaded
                .value
                .pointer(pointer)
                .ok_or_else(|| TinctureError::RefNotFound {
                    reference: reference.to_string(),
                })?
                .clone(),
            None => (*loaded.value).clone(),
        };
        let value = self.chase(target, Some(&loaded), visited)?;
        Ok((value, Some(loaded)))
    }

    /// If the freshly resolved value is itself a `$ref` node, keep
    /// following the chain inside the current visited scope.
    fn chase(
        &self,
        value: Value,
        current: Option<&LoadedDocument>,
        visited: &mut Vec<String>,
    ) -> Result<Value, TinctureError> {
        if value.as_object().is_some_and(|obj| obj.contains_key("$ref")) {
            let (chased, _) = self.resolve_node(&value, current, visited)?;
            Ok(chased)
        } else {
            Ok(value)
        }
    }

    fn enter(&self, canonical: &str, visited: &mut Vec<String>) -> Result<(), TinctureError> {
        if visited.iter().any(|seen| seen == canonical) {
            let mut chain = visited.clone();
            chain.push(canonical.to_string());
            return Err(TinctureError::CircularReference {
                chain: chain.join(" -> "),
            });
        }
        visited.push(canonical.to_string());
        Ok(())
    }
}
