//! Converts tool-native dependency-info descriptors into a single
//! post-processing command the executor's native depfile format expects
//! (spec.md §4.7).

use camino::{Utf8Path, Utf8PathBuf};

use crate::fingerprint;
use crate::invocation::Invocation;
use crate::ninja::shell_escape;

/// The synthesized depfile path and post-processing command for one
/// invocation, when it carries dependency-info descriptors.
pub struct DependencyInfoCommand {
    pub depfile: Utf8PathBuf,
    /// Fully shell-escaped `dependency-info-tool ...` invocation.
    pub command: String,
}

/// Builds the dependency-info bridge command for `invocation`, given its
/// first output (the rule key the depfile must use) and the target's
/// temporary directory. Returns `None` when the invocation carries no
/// dependency-info descriptors — callers bind `depexec` to the literal
/// `true` in that case (spec.md §4.6e).
pub fn bridge_command(
    invocation: &Invocation,
    first_output: &str,
    target_temp_dir: &Utf8Path,
    dependency_info_tool: &Utf8Path,
) -> Option<DependencyInfoCommand> {
    if invocation.dependency_info.is_empty() {
        return None;
    }

    let depfile = target_temp_dir.join(format!(
        ".ninja-dependency-info-{}.d",
        fingerprint::hash(first_output)
    ));

    let mut command = shell_escape(dependency_info_tool.as_str());
    command.push(' ');
    command.push_str(&shell_escape("--name"));
    command.push(' ');
    command.push_str(&shell_escape(first_output));
    command.push(' ');
    command.push_str(&shell_escape("--output"));
    command.push(' ');
    command.push_str(&shell_escape(depfile.as_str()));
    for descriptor in &invocation.dependency_info {
        command.push(' ');
        command.push_str(&shell_escape(&format!(
            "{}:{}",
            descriptor.format.name(),
            descriptor.path
        )));
    }

    Some(DependencyInfoCommand { depfile, command })
}
