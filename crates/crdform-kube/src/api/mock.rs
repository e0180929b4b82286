//! In-memory resource API for testing
//!
//! Objects are kept per (apiVersion, plural, namespace, name). Apply replaces
//! the stored document and stamps the fields a real API server would add, so
//! adapters see `status` and server metadata they have to ignore.

use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{ApplyParams, ObjectRef, ResourceApi};
use crate::error::ApiError;

/// Operation a failure can be injected into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    Apply,
    Get,
    Delete,
}

/// In-memory resource API
#[derive(Clone, Default)]
pub struct MockResourceApi {
    objects: Arc<RwLock<HashMap<String, JsonValue>>>,
    /// Track operation counts for assertions
    operations: Arc<RwLock<OperationCounts>>,
    failures: Arc<RwLock<HashMap<MockOperation, ApiError>>>,
    last_apply: Arc<RwLock<Option<ApplyParams>>>,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationCounts {
    pub applies: usize,
    pub gets: usize,
    pub deletes: usize,
}

impl OperationCounts {
    pub fn total(&self) -> usize {
        self.applies + self.gets + self.deletes
    }
}

fn key(object: &ObjectRef) -> String {
    format!(
        "{}/{}/{}/{}",
        object.api_version(),
        object.plural,
        object.namespace.as_deref().unwrap_or(""),
        object.name
    )
}

impl MockResourceApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a pre-existing object
    pub fn with_object(object: &ObjectRef, document: JsonValue) -> Self {
        let api = Self::new();
        api.objects.write().unwrap().insert(key(object), document);
        api
    }

    /// Make every call of `operation` fail with `error`
    pub fn fail_with(&self, operation: MockOperation, error: ApiError) {
        self.failures.write().unwrap().insert(operation, error);
    }

    /// Stored document, if any
    pub fn object(&self, object: &ObjectRef) -> Option<JsonValue> {
        self.objects.read().unwrap().get(&key(object)).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.read().unwrap().len()
    }

    /// Parameters of the most recent apply
    pub fn last_apply_params(&self) -> Option<ApplyParams> {
        self.last_apply.read().unwrap().clone()
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.operations.read().unwrap().clone()
    }

    /// Reset operation counts
    pub fn reset_counts(&self) {
        let mut ops = self.operations.write().unwrap();
        *ops = OperationCounts::default();
    }

    fn injected_failure(&self, operation: MockOperation) -> Result<(), ApiError> {
        match self.failures.read().unwrap().get(&operation) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ResourceApi for MockResourceApi {
    async fn apply(
        &self,
        object: &ObjectRef,
        document: &JsonValue,
        params: &ApplyParams,
    ) -> Result<JsonValue, ApiError> {
        {
            let mut ops = self.operations.write().unwrap();
            ops.applies += 1;
        }
        *self.last_apply.write().unwrap() = Some(params.clone());
        self.injected_failure(MockOperation::Apply)?;

        let mut objects = self.objects.write().unwrap();
        let previous = objects.get(&key(object));
        let generation = previous
            .and_then(|p| p.pointer("/metadata/generation"))
            .and_then(JsonValue::as_i64)
            .unwrap_or(0)
            + 1;
        let uid = previous
            .and_then(|p| p.pointer("/metadata/uid"))
            .cloned()
            .unwrap_or_else(|| json!(format!("uid-{}", objects.len() + 1)));

        let mut stored = document.clone();
        if let Some(metadata) = stored
            .get_mut("metadata")
            .and_then(JsonValue::as_object_mut)
        {
            metadata.insert("uid".to_string(), uid);
            metadata.insert("generation".to_string(), json!(generation));
            metadata.insert("resourceVersion".to_string(), json!(generation.to_string()));
            metadata.insert(
                "managedFields".to_string(),
                json!([{ "manager": params.field_manager, "operation": "Apply" }]),
            );
        }
        if let Some(map) = stored.as_object_mut() {
            map.insert("status".to_string(), json!({ "observedGeneration": generation }));
        }

        objects.insert(key(object), stored.clone());
        Ok(stored)
    }

    async fn get(&self, object: &ObjectRef) -> Result<JsonValue, ApiError> {
        {
            let mut ops = self.operations.write().unwrap();
            ops.gets += 1;
        }
        self.injected_failure(MockOperation::Get)?;

        self.objects
            .read()
            .unwrap()
            .get(&key(object))
            .cloned()
            .ok_or_else(|| ApiError::not_found(&object.name))
    }

    async fn delete(&self, object: &ObjectRef) -> Result<(), ApiError> {
        {
            let mut ops = self.operations.write().unwrap();
            ops.deletes += 1;
        }
        self.injected_failure(MockOperation::Delete)?;

        self.objects
            .write()
            .unwrap()
            .remove(&key(object))
            .map(|_| ())
            .ok_or_else(|| ApiError::not_found(&object.name))
    }
}
