//! External interfaces the core consumes (spec.md §6): a filesystem facade,
//! the target graph, the phase-invocation builder, the status formatter,
//! and the build-parameters canonicalization facility.
//!
//! Everything in this module is a seam, not an implementation: parsing
//! project files, evaluating build settings, and compiling phases into
//! invocations all live outside the core (spec.md §1) and are reached only
//! through these traits.

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::CoreError;
use crate::invocation::Invocation;

/// Filesystem operations the core needs: existence checks, directory
/// creation, byte-level read/write, executable-bit queries, and executable
/// resolution against a search-path list.
pub trait Filesystem {
    fn exists(&self, path: &Utf8Path) -> bool;
    fn create_directory(&self, path: &Utf8Path) -> std::io::Result<()>;
    fn read(&self, path: &Utf8Path) -> std::io::Result<Vec<u8>>;
    fn write(&self, path: &Utf8Path, contents: &[u8]) -> std::io::Result<()>;
    fn is_executable(&self, path: &Utf8Path) -> bool;
    fn set_executable(&self, path: &Utf8Path) -> std::io::Result<()>;
    fn find_executable(&self, name: &str, search_paths: &[Utf8PathBuf]) -> Option<Utf8PathBuf>;
    fn current_directory(&self) -> std::io::Result<Utf8PathBuf>;
}

/// A resolved target directed graph: iteration over nodes and, for each
/// node, its direct dependencies.
pub trait TargetGraph<T> {
    fn nodes(&self) -> Vec<T>;
    fn dependencies(&self, node: &T) -> Vec<T>;
}

/// Per-target identity the orchestrator needs beyond the bare graph shape:
/// the name used to derive `begin-target-*`/`finish-target-*`, the target's
/// own temporary directory (where its subplan and depfiles live), and any
/// per-target configuration files that feed the self-regenerate rule's
/// input list (spec.md §4.8 step d's "per-target configuration files").
pub trait TargetIdentity {
    fn name(&self) -> &str;
    fn temp_dir(&self) -> Utf8PathBuf;
    fn configuration_files(&self) -> Vec<Utf8PathBuf> {
        Vec::new()
    }
}

/// Given a target environment, yields an ordered list of invocations. This
/// is the "phase compiler" spec.md §1 explicitly places out of scope.
pub trait PhaseInvocationBuilder<T> {
    fn invocations_for_target(&self, target: &T) -> Result<Vec<Invocation>, CoreError>;
}

/// Produces a human-readable status string for an invocation; only its
/// first line is used (spec.md §4.6c).
pub trait InvocationFormatter {
    fn begin_invocation_message(&self, invocation: &Invocation) -> String;
}

/// Canonicalization of build parameters: the arguments that would
/// reconstruct them on the CLI, and a single fingerprint string.
pub trait BuildParameters {
    fn canonical_arguments(&self) -> Vec<String>;
    fn canonical_hash(&self) -> String;
}

/// Production `Filesystem` backed by `std::fs`, reusing `cargo_util::paths`
/// for the atomic-write and directory-creation helpers the teacher already
/// depended on for the same purpose.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFilesystem;

impl Filesystem for RealFilesystem {
    fn exists(&self, path: &Utf8Path) -> bool {
        path.as_std_path().exists()
    }

    fn create_directory(&self, path: &Utf8Path) -> std::io::Result<()> {
        cargo_util::paths::create_dir_all(path.as_std_path())
    }

    fn read(&self, path: &Utf8Path) -> std::io::Result<Vec<u8>> {
        cargo_util::paths::read_bytes(path.as_std_path())
    }

    fn write(&self, path: &Utf8Path, contents: &[u8]) -> std::io::Result<()> {
        cargo_util::paths::write(path.as_std_path(), contents)
    }

    fn is_executable(&self, path: &Utf8Path) -> bool {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::metadata(path.as_std_path())
                .map(|m| m.permissions().mode() & 0o111 != 0)
                .unwrap_or(false)
        }
        #[cfg(not(unix))]
        {
            path.as_std_path().exists()
        }
    }

    fn set_executable(&self, path: &Utf8Path) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path.as_std_path(), std::fs::Permissions::from_mode(0o755))
        }
        #[cfg(not(unix))]
        {
            let _ = path;
            Ok(())
        }
    }

    fn find_executable(&self, name: &str, search_paths: &[Utf8PathBuf]) -> Option<Utf8PathBuf> {
        for dir in search_paths {
            let candidate = dir.join(name);
            if self.exists(&candidate) && self.is_executable(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    fn current_directory(&self) -> std::io::Result<Utf8PathBuf> {
        let cwd = std::env::current_dir()?;
        Utf8PathBuf::from_path_buf(cwd)
            .map_err(|p| std::io::Error::new(std::io::ErrorKind::InvalidData, format!("{p:?} is not UTF-8")))
    }
}
