//! Command-line surface for the `xcninja` binary.

use camino::Utf8PathBuf;
use clap::Parser;

/// Long option names this CLI defines, used to normalize xcbuild-style
/// single-dash invocations (see [`normalize_single_dash_flags`]).
const LONG_FLAGS: &[&str] = &["objroot", "generate", "executor", "dry-run"];

/// Generate (and optionally run) a Ninja build plan for a resolved Xcode
/// target graph.
#[derive(Debug, Parser)]
#[command(name = "xcninja", version, about)]
pub struct Cli {
    /// Intermediates directory (OBJROOT) the top-level plan and fingerprint
    /// file are written under.
    #[arg(long)]
    pub objroot: Utf8PathBuf,

    /// Force regeneration even if the fingerprint file matches.
    #[arg(short = 'g', long)]
    pub generate: bool,

    /// External executor to prefer (falls back to `llbuild` if not found).
    #[arg(long, default_value = "ninja")]
    pub executor: String,

    /// Pass `-n` to the executor instead of actually building.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Build parameters (project, scheme, configuration, ...) forwarded
    /// verbatim into the configuration fingerprint and the self-regenerate
    /// command line. Parsing these into settings is out of scope for this
    /// core; here they are treated as an opaque, order-sensitive list.
    /// xcbuild-style parameters are themselves single-dash (`-project`,
    /// `-scheme`), so hyphen-prefixed values must be allowed through.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub parameters: Vec<String>,
}

/// Rewrites xcbuild-style single-dash long options (`-generate`, `-executor
/// ninja`) into the double-dash form clap's derived parser recognizes.
///
/// The self-regenerate rule (spec.md §4.8e) emits exactly
/// `<driver> -generate -executor ninja <canonical-arguments>`, matching the
/// single-dash convention of the xcbuild driver this crate models
/// (`NinjaExecutor.cpp`'s own option parsing). Clap's long options are
/// always double-dash, so without this normalization clap would read
/// `-generate` as a cluster of single-character short flags and fail
/// before the regenerate rule ever ran, breaking self-regenerate
/// idempotence (spec.md §8 property 9). Only tokens matching one of this
/// CLI's own long-option names are rewritten; trailing `parameters` such as
/// `-project` are left untouched and fall through to the catch-all.
fn normalize_single_dash_flags<I: IntoIterator<Item = String>>(args: I) -> Vec<String> {
    args.into_iter()
        .map(|arg| match arg.strip_prefix('-') {
            Some(rest) if !rest.starts_with('-') && LONG_FLAGS.contains(&rest) => format!("-{arg}"),
            _ => arg,
        })
        .collect()
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse_from(normalize_single_dash_flags(std::env::args()))
    }
}
