//! Generic resource backed by a CRD descriptor

use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

use crate::adapters::manifest::{build_manifest, render};
use crate::catalog::ResourceDescriptor;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::metrics::prometheus::{OPERATIONS, OPERATION_ERRORS, RENDER_DURATION};
use crate::resources::clock::{Clock, IdStamp};
use crate::resources::model::{resource_schema, ResourceModel};
use crate::resources::{ApplyResponse, CreateRequest, Resource};
use crate::schema::{decode, Schema};
use crate::Error;

/// Resource type rendering one CRD version
#[derive(Debug)]
pub struct CrdResource {
    descriptor: ResourceDescriptor,
    schema: Schema,
    type_name: String,
    ids: IdStamp,
}

impl CrdResource {
    pub fn new(descriptor: ResourceDescriptor, prefix: &str, clock: Arc<dyn Clock>) -> Self {
        let schema = resource_schema(&descriptor);
        let type_name = descriptor.type_name(prefix);
        Self {
            descriptor,
            schema,
            type_name,
            ids: IdStamp::new(clock),
        }
    }

    /// Schema of the resource, computed once at construction
    pub fn describe_schema(&self) -> &Schema {
        &self.schema
    }

    /// Decode a configuration, stamp the computed attributes and render the manifest
    #[instrument(skip(self, config), fields(resource = %self.type_name))]
    pub fn apply(&self, config: &Value) -> Result<ResourceModel, Diagnostics> {
        let decoded = decode::decode(&self.schema, config)?;
        let mut model: ResourceModel = serde_json::from_value(decoded).map_err(|e| {
            Diagnostics::from(Diagnostic::from(&Error::DecodeError(e.to_string())))
        })?;

        model.id = Some(self.ids.next());
        model.api_version = Some(self.descriptor.api_version());
        model.kind = Some(self.descriptor.kind.clone());

        let start = Instant::now();
        let yaml = build_manifest(&self.descriptor, &model)
            .and_then(|manifest| render(&manifest))
            .map_err(|e| Diagnostics::from(Diagnostic::from(&e)))?;
        RENDER_DURATION
            .with_label_values(&[self.type_name.as_str()])
            .observe(start.elapsed().as_secs_f64());

        debug!("Rendered {} {}", model.kind.as_deref().unwrap_or_default(), model.metadata.name);
        model.yaml = Some(yaml);
        Ok(model)
    }

    fn record(&self, operation: &str, diagnostics: &Diagnostics) {
        OPERATIONS
            .with_label_values(&[self.type_name.as_str(), operation])
            .inc();
        if diagnostics.has_errors() {
            OPERATION_ERRORS
                .with_label_values(&[self.type_name.as_str(), operation])
                .inc();
            warn!("{} of {} failed: {}", operation, self.type_name, diagnostics);
        }
    }
}

impl Resource for CrdResource {
    fn metadata(&self) -> &str {
        &self.type_name
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn validate_config(&self, config: &Value) -> Diagnostics {
        let diagnostics = decode::validate(&self.schema, config);
        self.record("validate", &diagnostics);
        diagnostics
    }

    fn create(&self, request: CreateRequest) -> ApplyResponse {
        let mut diagnostics = decode::validate(&self.schema, &request.config);
        if self.descriptor.deprecated {
            diagnostics.push(Diagnostic::warning(
                "Deprecated Resource Version",
                format!(
                    "{} {} is deprecated; consider migrating to a newer version",
                    self.descriptor.api_version(),
                    self.descriptor.kind
                ),
            ));
        }
        let state = if diagnostics.has_errors() {
            None
        } else {
            match self.apply(&request.config) {
                Ok(model) => match serde_json::to_value(&model) {
                    Ok(state) => Some(state),
                    Err(e) => {
                        diagnostics.push(Diagnostic::from(&Error::from(e)));
                        None
                    }
                },
                Err(errors) => {
                    diagnostics.extend(errors);
                    None
                }
            }
        };
        self.record("apply", &diagnostics);
        ApplyResponse { state, diagnostics }
    }
}
