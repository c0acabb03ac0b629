//! Inbound object-store notification and the immutable reference derived from it.

use crate::errors::PipelineError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Envelope posted by the object store's webhook:
/// `{ "swiftObj": { "method": "PUT", "container": "images", ... } }`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TriggerPayload {
    #[serde(rename = "swiftObj")]
    pub swift_obj: SwiftObject,
}

/// The mutated object as described by the notification.
#[derive(Serialize, Deserialize, Clone)]
pub struct SwiftObject {
    /// HTTP verb that mutated the object (`PUT` or `DELETE`).
    pub method: String,
    pub container: String,
    pub object: String,
    /// Pre-issued token, forwarded verbatim as `X-Auth-Token`.
    pub token: String,
    /// Account endpoint, e.g. `https://store.example/v1/AUTH_test`.
    pub url: String,
}

impl fmt::Debug for SwiftObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwiftObject")
            .field("method", &self.method)
            .field("container", &self.container)
            .field("object", &self.object)
            .field("token", &"<redacted>")
            .field("url", &self.url)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Delete,
}

impl Operation {
    /// `PUT` creates or overwrites, `DELETE` removes. Methods are case-sensitive.
    pub fn from_method(method: &str) -> Result<Self, PipelineError> {
        match method {
            "PUT" => Ok(Operation::Create),
            "DELETE" => Ok(Operation::Delete),
            other => Err(PipelineError::InvalidOperation(other.to_string())),
        }
    }
}

/// Identifies the object that triggered a run.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceReference {
    endpoint_base: String,
    auth_token: String,
    container_name: String,
    object_name: String,
    operation: Operation,
}

impl SourceReference {
    pub fn new(
        endpoint_base: impl Into<String>,
        auth_token: impl Into<String>,
        container_name: impl Into<String>,
        object_name: impl Into<String>,
        operation: Operation,
    ) -> Self {
        let endpoint_base = endpoint_base.into();
        Self {
            endpoint_base: endpoint_base.trim_end_matches('/').to_string(),
            auth_token: auth_token.into(),
            container_name: container_name.into(),
            object_name: object_name.into(),
            operation,
        }
    }

    /// Fails with `InvalidOperation` when the method is neither `PUT` nor `DELETE`.
    pub fn from_event(event: &SwiftObject) -> Result<Self, PipelineError> {
        let operation = Operation::from_method(&event.method)?;
        Ok(Self::new(
            event.url.as_str(),
            event.token.as_str(),
            event.container.as_str(),
            event.object.as_str(),
            operation,
        ))
    }

    pub fn endpoint_base(&self) -> &str {
        &self.endpoint_base
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// `<container>/<object>`, as reported back to the caller.
    pub fn source_path(&self) -> String {
        format!("{}/{}", self.container_name, self.object_name)
    }
}

impl fmt::Debug for SourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceReference")
            .field("endpoint_base", &self.endpoint_base)
            .field("auth_token", &"<redacted>")
            .field("container_name", &self.container_name)
            .field("object_name", &self.object_name)
            .field("operation", &self.operation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(method: &str) -> SwiftObject {
        SwiftObject {
            method: method.into(),
            container: "images".into(),
            object: "600_0985.jpg".into(),
            token: "T".into(),
            url: "https://store.example/".into(),
        }
    }

    #[test]
    fn payload_uses_swift_obj_envelope() {
        let raw = r#"{"swiftObj":{"method":"PUT","container":"images","object":"600_0985.jpg","token":"T","url":"https://store.example"}}"#;
        let payload: TriggerPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(payload.swift_obj.container, "images");
        assert_eq!(payload.swift_obj.method, "PUT");
    }

    #[test]
    fn methods_map_to_operations() {
        assert_eq!(Operation::from_method("PUT").unwrap(), Operation::Create);
        assert_eq!(Operation::from_method("DELETE").unwrap(), Operation::Delete);
        assert_eq!(
            Operation::from_method("POST").unwrap_err(),
            PipelineError::InvalidOperation("POST".into())
        );
        assert!(Operation::from_method("put").is_err());
    }

    #[test]
    fn reference_trims_endpoint_and_hides_token() {
        let reference = SourceReference::from_event(&event("PUT")).unwrap();
        assert_eq!(reference.endpoint_base(), "https://store.example");
        assert_eq!(reference.source_path(), "images/600_0985.jpg");
        let debug = format!("{reference:?}");
        assert!(!debug.contains("\"T\""));
        assert!(debug.contains("<redacted>"));
    }
}
