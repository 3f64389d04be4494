//! The canonical, executor-independent description of one tool invocation.

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Prefix that marks an executable name as a builtin tool rather than a
/// name to resolve on disk.
pub const BUILTIN_PREFIX: &str = "builtin-";

/// The executable to run for an invocation.
///
/// A closed, three-case tagged variant: builtin tool, absolute path, or
/// (after resolution) an absolute path found by searching a list of
/// executable search paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Executable {
    /// A real binary at an absolute path.
    Absolute(Utf8PathBuf),
    /// A builtin tool, recognized by the `builtin-` prefix. `path` points at
    /// the driver-local standalone binary for the tool; `display_name` is
    /// the short builtin name without the prefix.
    Builtin {
        path: Utf8PathBuf,
        display_name: String,
    },
}

impl Executable {
    /// Resolves a raw executable string the way `spec.md` §4.4 describes:
    /// builtin prefix first, then absolute path, then a search through
    /// `search_paths` in order, falling back to the raw string unresolved.
    pub fn determine(raw: &str, search_paths: &[Utf8PathBuf], driver_dir: &Utf8Path) -> Executable {
        if let Some(name) = raw.strip_prefix(BUILTIN_PREFIX) {
            return Executable::Builtin {
                path: driver_dir.join(raw),
                display_name: name.to_string(),
            };
        }

        let candidate = Utf8Path::new(raw);
        if candidate.is_absolute() {
            return Executable::Absolute(candidate.to_path_buf());
        }

        for search_path in search_paths {
            let joined = search_path.join(raw);
            if joined.exists() {
                return Executable::Absolute(joined);
            }
        }

        Executable::Absolute(Utf8PathBuf::from(raw))
    }

    /// The path used to actually invoke the tool.
    pub fn path(&self) -> &Utf8Path {
        match self {
            Executable::Absolute(path) => path,
            Executable::Builtin { path, .. } => path,
        }
    }

    /// The user-facing name: the short builtin name for builtins, the path
    /// otherwise.
    pub fn display_name(&self) -> &str {
        match self {
            Executable::Absolute(path) => path.as_str(),
            Executable::Builtin { display_name, .. } => display_name,
        }
    }
}

/// One dependency-info descriptor: a tool-native format tag paired with the
/// path to the tool's own dependency output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyInfo {
    pub format: DependencyInfoFormat,
    pub path: Utf8PathBuf,
}

impl DependencyInfo {
    pub fn new(format: DependencyInfoFormat, path: impl Into<Utf8PathBuf>) -> Self {
        DependencyInfo {
            format,
            path: path.into(),
        }
    }
}

/// Closed enumeration of tool-native dependency-info formats the bridge (C7)
/// knows how to convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependencyInfoFormat {
    /// A Makefile-style depfile (`target: dep dep ...`).
    Makefile,
    /// Apple's binary dependency-info blob format.
    DependencyInfo,
    /// A plain newline-separated list of paths.
    PlainList,
}

impl DependencyInfoFormat {
    /// The canonical wire name used in `dependency-info-tool` arguments.
    pub fn name(&self) -> &'static str {
        match self {
            DependencyInfoFormat::Makefile => "makefile",
            DependencyInfoFormat::DependencyInfo => "dependency-info",
            DependencyInfoFormat::PlainList => "plain-list",
        }
    }
}

/// An auxiliary file an invocation needs materialized on disk before it can
/// run: a small script, response file, or configuration blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxiliaryFile {
    pub destination: Utf8PathBuf,
    pub payload: AuxiliaryPayload,
    pub executable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuxiliaryPayload {
    /// Inline byte content to write directly.
    Contents(Vec<u8>),
    /// A path to copy the contents from.
    CopyFrom(Utf8PathBuf),
}

/// An immutable-after-build description of one tool run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub executable: Executable,
    pub arguments: Vec<String>,
    /// Sorted by key so emitted `env` bindings are deterministic (spec.md
    /// §9's recommended resolution of the environment-ordering open
    /// question).
    pub environment: BTreeMap<String, String>,
    pub working_directory: Utf8PathBuf,

    pub inputs: Vec<Utf8PathBuf>,
    pub outputs: Vec<Utf8PathBuf>,
    /// Inputs that may or may not exist (e.g. user script inputs).
    pub phony_inputs: Vec<Utf8PathBuf>,

    /// Inputs that must exist and affect content (participate in staleness).
    pub input_dependencies: Vec<Utf8PathBuf>,
    /// Ordering-only edges; do not affect staleness.
    pub order_dependencies: Vec<Utf8PathBuf>,

    pub dependency_info: Vec<DependencyInfo>,
    pub auxiliary_files: Vec<AuxiliaryFile>,

    pub log_message: String,
    pub show_environment_in_log: bool,
    pub creates_product_structure: bool,
}

impl Invocation {
    /// A fresh invocation with no outputs and no extra edges, ready to be
    /// filled in by a phase compiler. `working_directory` and `executable`
    /// are required up front since every invocation needs them.
    pub fn new(executable: Executable, working_directory: Utf8PathBuf) -> Self {
        Invocation {
            executable,
            arguments: Vec::new(),
            environment: BTreeMap::new(),
            working_directory,
            inputs: Vec::new(),
            outputs: Vec::new(),
            phony_inputs: Vec::new(),
            input_dependencies: Vec::new(),
            order_dependencies: Vec::new(),
            dependency_info: Vec::new(),
            auxiliary_files: Vec::new(),
            log_message: String::new(),
            show_environment_in_log: false,
            creates_product_structure: false,
        }
    }

    /// Whether this invocation has a real, runnable executable. An empty
    /// path marks a placeholder invocation the target-plan builder should
    /// skip entirely (spec.md §4.6 step 3).
    pub fn has_executable(&self) -> bool {
        !self.executable.path().as_str().is_empty()
    }
}
