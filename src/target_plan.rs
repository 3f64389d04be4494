//! Translates one target's invocations into a per-target Ninja subplan
//! (spec.md §4.6, "C6 Target Subplan Builder").
//!
//! Writes the `invoke` build statement for every invocation and synthesizes
//! phony-input nodes, then returns the union of concrete invocation outputs.
//! `begin-target-*` and `finish-target-*` are emitted by the orchestrator
//! (§4.8) into the top-level plan instead of here, since both depend on
//! information only the orchestrator has (other targets' finish nodes, and
//! the aggregate output list across the whole call) — this mirrors
//! `NinjaExecutor::buildAction`, which writes both bookkeeping nodes to its
//! own top-level writer and leaves `buildTargetInvocations` (the per-target
//! pass) to emit only the `invoke` builds.

use std::collections::BTreeSet;

use camino::{Utf8Path, Utf8PathBuf};

use crate::aux_files;
use crate::collaborators::{Filesystem, InvocationFormatter};
use crate::depinfo;
use crate::error::CoreError;
use crate::fingerprint;
use crate::invocation::Invocation;
use crate::ninja::{shell_escape, Binding, Value, Writer};

const INVOKE_RULE: &str = "invoke";

/// Returns `.ninja-phony-output-<hash(exec-string)>` for an invocation with
/// no declared outputs, where `exec-string` is the executable path followed
/// by each raw (unescaped) argument, space-separated (spec.md §3, §4.6d).
pub fn phony_output_name(invocation: &Invocation) -> String {
    let mut key = invocation.executable.path().to_string();
    for arg in &invocation.arguments {
        key.push(' ');
        key.push_str(arg);
    }
    format!(".ninja-phony-output-{}", fingerprint::hash(&key))
}

fn invocation_outputs(invocation: &Invocation) -> Vec<Utf8PathBuf> {
    if invocation.outputs.is_empty() {
        vec![Utf8PathBuf::from(phony_output_name(invocation))]
    } else {
        invocation.outputs.clone()
    }
}

/// Builds and writes the subplan for target `target_name` to
/// `<target_temp_dir>/build.ninja`, returning the union of concrete output
/// paths across its invocations so the orchestrator can emit
/// `finish-target-<target_name>` in the top-level plan.
pub fn build_target_subplan(
    fs: &dyn Filesystem,
    formatter: &dyn InvocationFormatter,
    target_name: &str,
    invocations: &[Invocation],
    target_temp_dir: &Utf8Path,
    dependency_info_tool: &Utf8Path,
) -> Result<BTreeSet<Utf8PathBuf>, CoreError> {
    aux_files::materialize(fs, invocations)?;

    let mut writer = Writer::new();
    writer.comment("xcninja build plan");
    writer.comment(&format!("Target: {target_name}"));
    writer.newline();

    let begin_target = format!("begin-target-{target_name}");
    let mut concrete_outputs: BTreeSet<Utf8PathBuf> = BTreeSet::new();
    let mut invocation_output_union: BTreeSet<Utf8PathBuf> = BTreeSet::new();

    for invocation in invocations {
        if !invocation.has_executable() {
            continue;
        }

        let outputs = invocation_outputs(invocation);
        for output in &outputs {
            if !invocation.outputs.is_empty() && !concrete_outputs.insert(output.clone()) {
                return Err(CoreError::DuplicateOutput {
                    target: target_name.to_string(),
                    path: output.clone(),
                });
            }
        }
        invocation_output_union.extend(outputs.iter().cloned());

        let exec = build_exec_string(invocation);
        let env = build_env_string(invocation);
        let description = first_line(&formatter.begin_invocation_message(invocation));

        let first_output = outputs[0].to_string();
        let depinfo_command = depinfo::bridge_command(
            invocation,
            &first_output,
            target_temp_dir,
            dependency_info_tool,
        );
        let depexec = depinfo_command
            .as_ref()
            .map(|d| d.command.clone())
            .unwrap_or_else(|| "true".to_string());

        let mut bindings = vec![
            Binding::new("description", Value::literal(description)),
            Binding::new("dir", Value::literal(shell_escape(invocation.working_directory.as_str()))),
            Binding::new("exec", Value::literal(exec)),
        ];
        if !env.is_empty() {
            bindings.push(Binding::new("env", Value::literal(env)));
        }
        bindings.push(Binding::new("depexec", Value::literal(depexec)));
        if let Some(d) = &depinfo_command {
            bindings.push(Binding::new("depfile", Value::literal(d.depfile.to_string())));
        }

        let output_values: Vec<Value> = outputs.iter().map(|o| Value::literal(o.to_string())).collect();
        let input_values: Vec<Value> = invocation.inputs.iter().map(|i| Value::literal(i.to_string())).collect();
        let input_dep_values: Vec<Value> = invocation
            .input_dependencies
            .iter()
            .map(|i| Value::literal(i.to_string()))
            .collect();
        let mut order_dep_values: Vec<Value> = invocation
            .order_dependencies
            .iter()
            .map(|i| Value::literal(i.to_string()))
            .collect();
        order_dep_values.push(Value::literal(begin_target.clone()));

        writer.build(
            &output_values,
            INVOKE_RULE,
            &input_values,
            &input_dep_values,
            &order_dep_values,
            &bindings,
        );
    }

    for invocation in invocations {
        for phony_input in &invocation.phony_inputs {
            if !invocation_output_union.contains(phony_input) {
                writer.build(&[Value::literal(phony_input.to_string())], "phony", &[], &[], &[], &[]);
                // Avoid emitting the same phony-input build twice if
                // multiple invocations declare the same one.
                invocation_output_union.insert(phony_input.clone());
            }
        }
    }

    let subplan_path = target_temp_dir.join("build.ninja");
    let text = writer.finish();
    fs.create_directory(target_temp_dir).map_err(|source| CoreError::Io {
        path: target_temp_dir.to_path_buf(),
        source,
    })?;
    fs.write(&subplan_path, text.as_bytes())
        .map_err(|source| CoreError::Io { path: subplan_path, source })?;

    Ok(invocations
        .iter()
        .filter(|i| i.has_executable())
        .flat_map(invocation_outputs)
        .collect())
}

fn build_exec_string(invocation: &Invocation) -> String {
    let mut parts = vec![shell_escape(invocation.executable.path().as_str())];
    parts.extend(invocation.arguments.iter().map(|a| shell_escape(a)));
    parts.join(" ")
}

fn build_env_string(invocation: &Invocation) -> String {
    invocation
        .environment
        .iter()
        .map(|(k, v)| format!("{k}={}", shell_escape(v)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_line(s: &str) -> &str {
    match s.find('\n') {
        Some(idx) => &s[..idx],
        None => s,
    }
}
