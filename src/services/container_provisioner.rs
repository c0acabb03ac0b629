//! Ensures `<container>_thumbnails` exists before a thumbnail is stored.
//!
//! Creation is idempotent on the store side: 201 means created, 202 means
//! the container was already there. Concurrent runs for the same source
//! container therefore never fail each other and need no locking.

use crate::{
    errors::PipelineError,
    models::{
        container::{DestinationContainer, Provisioned},
        event::SourceReference,
    },
    services::object_store_client::SwiftClient,
};
use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct ContainerProvisioner {
    client: SwiftClient,
    /// Reject status codes other than 201/202 instead of warning.
    strict: bool,
}

impl ContainerProvisioner {
    pub fn new(client: SwiftClient) -> Self {
        Self {
            client,
            strict: false,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Create the destination container if absent.
    ///
    /// Only a transport failure (or, in strict mode, an unexpected status)
    /// yields `ProvisioningError`.
    pub async fn ensure(
        &self,
        reference: &SourceReference,
    ) -> Result<DestinationContainer, PipelineError> {
        let name = DestinationContainer::name_for(reference.container_name());
        let status = self
            .client
            .create_container(reference, &name)
            .await
            .map_err(|err| {
                PipelineError::Provisioning(format!("creating container `{name}` failed: {err}"))
            })?;

        let provisioned = match status.as_u16() {
            201 => {
                info!(container = %name, "container created");
                Provisioned::Created
            }
            202 => {
                info!(container = %name, "container already exists");
                Provisioned::AlreadyExisted
            }
            code if self.strict => {
                return Err(PipelineError::Provisioning(format!(
                    "creating container `{name}` returned unexpected status {code}"
                )));
            }
            code => {
                warn!(
                    container = %name,
                    status = code,
                    "container request answered with unexpected status; continuing"
                );
                Provisioned::Unconfirmed(code)
            }
        };

        Ok(DestinationContainer::new(name, provisioned))
    }
}
