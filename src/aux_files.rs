//! Materializes auxiliary files (small scripts, response files,
//! configuration blobs) an invocation needs on disk before the plan runs
//! (spec.md §4.5).

use crate::collaborators::Filesystem;
use crate::error::CoreError;
use crate::invocation::{AuxiliaryFile, AuxiliaryPayload, Invocation};

/// For every invocation of a target, ensures each auxiliary file exists
/// with the correct contents and mode, before any build statements for that
/// target are emitted.
///
/// Failure at any step is fatal to the target's plan generation (spec.md
/// §4.5, §7).
pub fn materialize(fs: &dyn Filesystem, invocations: &[Invocation]) -> Result<(), CoreError> {
    for invocation in invocations {
        for aux in &invocation.auxiliary_files {
            materialize_one(fs, aux)?;
        }
    }
    Ok(())
}

fn materialize_one(fs: &dyn Filesystem, aux: &AuxiliaryFile) -> Result<(), CoreError> {
    if let Some(parent) = aux.destination.parent() {
        fs.create_directory(parent).map_err(|source| CoreError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    match &aux.payload {
        AuxiliaryPayload::Contents(bytes) => {
            fs.write(&aux.destination, bytes).map_err(|source| CoreError::Io {
                path: aux.destination.clone(),
                source,
            })?;
        }
        AuxiliaryPayload::CopyFrom(source_path) => {
            let contents = fs.read(source_path).map_err(|source| CoreError::Io {
                path: source_path.clone(),
                source,
            })?;
            fs.write(&aux.destination, &contents).map_err(|source| CoreError::Io {
                path: aux.destination.clone(),
                source,
            })?;
        }
    }

    if aux.executable && !fs.is_executable(&aux.destination) {
        fs.set_executable(&aux.destination).map_err(|source| CoreError::Io {
            path: aux.destination.clone(),
            source,
        })?;
    }

    Ok(())
}
