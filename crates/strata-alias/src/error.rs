use std::io;

use strata_core::Resource;

/// A failure to bring one alias back in sync with disk.
#[derive(Debug, thiserror::Error)]
pub enum AliasError {
    #[error("failed to refresh alias {resource}: {source}")]
    Refresh {
        resource: Resource,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove project {resource} whose location no longer exists: {source}")]
    DeleteProject {
        resource: Resource,
        #[source]
        source: io::Error,
    },
}

impl AliasError {
    pub fn resource(&self) -> &Resource {
        match self {
            AliasError::Refresh { resource, .. } | AliasError::DeleteProject { resource, .. } => {
                resource
            }
        }
    }
}

/// Every alias that could not be updated by one `update_aliases` call.
///
/// Aliases not listed here were processed successfully.
#[derive(Debug, thiserror::Error)]
#[error("failed to update {} alias(es) of {resource}", .failures.len())]
pub struct UpdateAliasesError {
    pub resource: Resource,
    pub failures: Vec<AliasError>,
}
