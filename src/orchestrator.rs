//! Composes per-target subplans into one top-level Ninja plan, gates
//! regeneration on a configuration fingerprint, and launches the external
//! executor (spec.md §4.8, "C8 Build Orchestrator").

use std::collections::BTreeSet;
use std::process::Command;

use camino::{Utf8Path, Utf8PathBuf};

use crate::collaborators::{
    BuildParameters, Filesystem, InvocationFormatter, PhaseInvocationBuilder, TargetGraph, TargetIdentity,
};
use crate::error::CoreError;
use crate::ninja::{shell_escape, Binding, Value, Writer};
use crate::target_plan;

const FINGERPRINT_FILE_NAME: &str = ".ninja-configuration";
const TOP_LEVEL_PLAN_NAME: &str = "build.ninja";
const MASTER_RULE: &str = "invoke";
const REGENERATE_RULE: &str = "regenerate";
const PREFERRED_EXECUTOR: &str = "ninja";
const FALLBACK_EXECUTOR: &str = "llbuild";

/// Everything the orchestrator needs that isn't one of the generic
/// collaborator traits: the intermediates directory, the workspace's loaded
/// file list (spec.md §4.8 step c; [FULL] "loaded-file accumulation"), the
/// path to the currently-running driver binary (for self-regenerate), and
/// the dependency-info bridge helper's own path.
pub struct BuildContext {
    pub objroot: Utf8PathBuf,
    pub workspace_inputs: Vec<Utf8PathBuf>,
    pub driver_binary_path: Utf8PathBuf,
    pub dependency_info_tool: Utf8PathBuf,
}

/// Flags controlling one orchestrator run, mirroring the CLI surface
/// described informally in spec.md §4.8 steps 3-4.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub generate: bool,
    pub dry_run: bool,
    /// Preferred executor binary name to search for first (spec.md §4.8
    /// step 4). Falls back to `llbuild` when this one isn't found on PATH.
    /// Empty string means "use the built-in default" (`ninja`).
    pub executor: String,
}

/// Decides whether (re)generation is required (spec.md §4.8 step 2,
/// testable property 2). Reading the fingerprint file is tolerant of I/O
/// errors: any failure to read it is treated as a cache miss.
pub fn should_generate(fs: &dyn Filesystem, objroot: &Utf8Path, params: &dyn BuildParameters, force: bool) -> bool {
    if force {
        return true;
    }
    let plan_path = objroot.join(TOP_LEVEL_PLAN_NAME);
    if !fs.exists(&plan_path) {
        return true;
    }
    let fingerprint_path = objroot.join(FINGERPRINT_FILE_NAME);
    let existing = match fs.read(&fingerprint_path) {
        Ok(bytes) => bytes,
        Err(_) => return true,
    };
    match String::from_utf8(existing) {
        Ok(text) => text != params.canonical_hash(),
        Err(_) => true,
    }
}

/// Runs one orchestrator pass: regenerates the plan if needed, then (unless
/// `options.generate` suppresses it) execs the external executor.
pub fn run<T>(
    graph: &dyn TargetGraph<T>,
    phases: &dyn PhaseInvocationBuilder<T>,
    formatter: &dyn InvocationFormatter,
    params: &dyn BuildParameters,
    fs: &dyn Filesystem,
    ctx: &BuildContext,
    options: RunOptions,
) -> Result<(), CoreError>
where
    T: TargetIdentity + Clone,
{
    if should_generate(fs, &ctx.objroot, params, options.generate) {
        generate(graph, phases, formatter, params, fs, ctx)?;
    }

    if !options.generate {
        let preferred = if options.executor.is_empty() {
            PREFERRED_EXECUTOR
        } else {
            options.executor.as_str()
        };
        exec_executor(fs, &ctx.objroot, preferred, options.dry_run)?;
    }

    Ok(())
}

fn generate<T>(
    graph: &dyn TargetGraph<T>,
    phases: &dyn PhaseInvocationBuilder<T>,
    formatter: &dyn InvocationFormatter,
    params: &dyn BuildParameters,
    fs: &dyn Filesystem,
    ctx: &BuildContext,
) -> Result<(), CoreError>
where
    T: TargetIdentity + Clone,
{
    let mut writer = Writer::new();
    writer.comment("xcninja build plan");
    writer.comment(&format!("Configuration fingerprint: {}", params.canonical_hash()));
    writer.newline();
    writer.binding("builddir", &Value::literal(ctx.objroot.as_str()));
    writer.newline();
    writer.rule(
        MASTER_RULE,
        &[Binding::new("command", Value::expression("cd $dir && env -i $env $exec && $depexec"))],
    );
    writer.newline();

    let mut generator_inputs: Vec<Utf8PathBuf> = ctx.workspace_inputs.clone();
    let mut succeeded_any = false;
    let nodes = graph.nodes();

    for target in &nodes {
        let name = target.name().to_string();
        let env_result = phases.invocations_for_target(target);
        let invocations = match env_result {
            Ok(invocations) => invocations,
            Err(CoreError::Configuration { target, message }) => {
                tracing::warn!(target = %target, message = %message, "skipping target: configuration error");
                continue;
            }
            Err(other) => return Err(other),
        };

        let dependency_deps: Vec<Value> = graph
            .dependencies(target)
            .iter()
            .map(|dep| Value::literal(format!("finish-target-{}", dep.name())))
            .collect();
        writer.build(
            &[Value::literal(format!("begin-target-{name}"))],
            "phony",
            &dependency_deps,
            &[],
            &[],
            &[],
        );

        let target_temp_dir = target.temp_dir();
        let outputs = target_plan::build_target_subplan(
            fs,
            formatter,
            &name,
            &invocations,
            &target_temp_dir,
            &ctx.dependency_info_tool,
        )?;

        writer.subninja(&target_temp_dir.join("build.ninja"));

        let finish_deps: Vec<Value> = outputs.iter().map(|o| Value::literal(o.to_string())).collect();
        writer.build(
            &[Value::literal(format!("finish-target-{name}"))],
            "phony",
            &[],
            &[],
            &finish_deps,
            &[],
        );

        generator_inputs.extend(target.configuration_files());
        succeeded_any = true;
    }

    if !nodes.is_empty() && !succeeded_any {
        return Err(CoreError::NoTargetsSucceeded);
    }

    let cwd = fs.current_directory().map_err(CoreError::CurrentDirectory)?;
    emit_self_regenerate(&mut writer, ctx, params, &cwd, &generator_inputs);

    let plan_path = ctx.objroot.join(TOP_LEVEL_PLAN_NAME);
    let text = writer.finish();
    fs.create_directory(&ctx.objroot).map_err(|source| CoreError::Io {
        path: ctx.objroot.clone(),
        source,
    })?;
    fs.write(&plan_path, text.as_bytes())
        .map_err(|source| CoreError::Io { path: plan_path, source })?;

    let fingerprint_path = ctx.objroot.join(FINGERPRINT_FILE_NAME);
    fs.write(&fingerprint_path, params.canonical_hash().as_bytes())
        .map_err(|source| CoreError::Io { path: fingerprint_path, source })?;

    Ok(())
}

fn emit_self_regenerate(
    writer: &mut Writer,
    ctx: &BuildContext,
    params: &dyn BuildParameters,
    cwd: &Utf8Path,
    generator_inputs: &[Utf8PathBuf],
) {
    writer.newline();
    writer.rule(
        REGENERATE_RULE,
        &[
            Binding::new("command", Value::expression("cd $dir && $exec")),
            Binding::new("description", Value::literal("Regenerating build.ninja")),
            Binding::new("generator", Value::literal("1")),
            Binding::new("pool", Value::literal("console")),
        ],
    );

    let mut exec = shell_escape(ctx.driver_binary_path.as_str());
    exec.push(' ');
    exec.push_str(&shell_escape("-generate"));
    exec.push(' ');
    exec.push_str(&shell_escape("-executor"));
    exec.push(' ');
    exec.push_str(&shell_escape("ninja"));
    for arg in params.canonical_arguments() {
        exec.push(' ');
        exec.push_str(&shell_escape(&arg));
    }

    let mut inputs: Vec<Value> = vec![Value::literal(ctx.objroot.join(FINGERPRINT_FILE_NAME).to_string())];
    let deduped: BTreeSet<&Utf8PathBuf> = generator_inputs.iter().collect();
    inputs.extend(deduped.into_iter().map(|p| Value::literal(p.to_string())));

    writer.build(
        &[Value::literal(TOP_LEVEL_PLAN_NAME.to_string())],
        REGENERATE_RULE,
        &inputs,
        &[],
        &[],
        &[
            Binding::new("dir", Value::literal(shell_escape(cwd.as_str()))),
            Binding::new("exec", Value::literal(exec)),
        ],
    );
}

fn exec_executor(fs: &dyn Filesystem, objroot: &Utf8Path, preferred: &str, dry_run: bool) -> Result<(), CoreError> {
    let search_paths = path_search_dirs();
    let plan_path = objroot.join(TOP_LEVEL_PLAN_NAME);

    let (program, mut args) = if let Some(path) = fs.find_executable(preferred, &search_paths) {
        (path, Vec::new())
    } else if let Some(path) = fs.find_executable(FALLBACK_EXECUTOR, &search_paths) {
        (path, vec!["ninja".to_string(), "build".to_string()])
    } else {
        return Err(CoreError::ExecutorNotFound);
    };

    args.push("-f".to_string());
    args.push(plan_path.to_string());
    if dry_run {
        args.push("-n".to_string());
    }

    let status = Command::new(program.as_str())
        .args(&args)
        .current_dir(objroot.as_std_path())
        .status()
        .map_err(|source| CoreError::ExecutorLaunch {
            executor: program.to_string(),
            source,
        })?;

    if !status.success() {
        return Err(CoreError::ExecutorFailed(status));
    }
    Ok(())
}

fn path_search_dirs() -> Vec<Utf8PathBuf> {
    std::env::var_os("PATH")
        .map(|value| std::env::split_paths(&value).filter_map(|p| Utf8PathBuf::from_path_buf(p).ok()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::{Executable, Invocation};
    use crate::testing::InMemoryFilesystem;

    #[derive(Clone)]
    struct Target {
        name: String,
        deps: Vec<String>,
    }

    impl TargetIdentity for Target {
        fn name(&self) -> &str {
            &self.name
        }

        fn temp_dir(&self) -> Utf8PathBuf {
            Utf8PathBuf::from(format!("/tmp/target-{}", self.name))
        }
    }

    struct FixedGraph(Vec<Target>);
    impl TargetGraph<Target> for FixedGraph {
        fn nodes(&self) -> Vec<Target> {
            self.0.clone()
        }

        fn dependencies(&self, node: &Target) -> Vec<Target> {
            self.0.iter().filter(|t| node.deps.contains(&t.name)).cloned().collect()
        }
    }

    struct EmptyInvocations;
    impl PhaseInvocationBuilder<Target> for EmptyInvocations {
        fn invocations_for_target(&self, _target: &Target) -> Result<Vec<Invocation>, CoreError> {
            Ok(Vec::new())
        }
    }

    struct EchoInvocations;
    impl PhaseInvocationBuilder<Target> for EchoInvocations {
        fn invocations_for_target(&self, _target: &Target) -> Result<Vec<Invocation>, CoreError> {
            let mut inv = Invocation::new(Executable::Absolute(Utf8PathBuf::from("/bin/echo")), Utf8PathBuf::from("/tmp"));
            inv.arguments.push("hi".to_string());
            Ok(vec![inv])
        }
    }

    struct FixedFormatter;
    impl InvocationFormatter for FixedFormatter {
        fn begin_invocation_message(&self, invocation: &Invocation) -> String {
            format!("Running {}", invocation.executable.display_name())
        }
    }

    struct FixedParams(&'static str);
    impl BuildParameters for FixedParams {
        fn canonical_arguments(&self) -> Vec<String> {
            vec!["-project".to_string(), "App.xcodeproj".to_string()]
        }

        fn canonical_hash(&self) -> String {
            self.0.to_string()
        }
    }

    fn context() -> BuildContext {
        BuildContext {
            objroot: Utf8PathBuf::from("/tmp/objroot"),
            workspace_inputs: vec![Utf8PathBuf::from("/tmp/App.xcodeproj/project.pbxproj")],
            driver_binary_path: Utf8PathBuf::from("/usr/bin/xcninja"),
            dependency_info_tool: Utf8PathBuf::from("/usr/libexec/xcninja/dependency-info-tool"),
        }
    }

    #[test]
    fn s1_empty_target_top_level_plan() {
        let fs = InMemoryFilesystem::new();
        let graph = FixedGraph(vec![Target { name: "T1".to_string(), deps: Vec::new() }]);
        generate(&graph, &EmptyInvocations, &FixedFormatter, &FixedParams("A"), &fs, &context()).unwrap();

        let text = String::from_utf8(fs.read(Utf8Path::new("/tmp/objroot/build.ninja")).unwrap()).unwrap();
        assert!(text.contains("build begin-target-T1: phony\n"));
        assert!(text.contains("subninja /tmp/target-T1/build.ninja"));
        assert!(text.contains("build finish-target-T1: phony\n"));
        assert!(text.contains("rule regenerate"));
    }

    #[test]
    fn regenerate_dir_binding_is_cwd_not_objroot() {
        // spec.md §4.8e: the regenerate build statement's `dir` binding must
        // be the caller's current working directory, not OBJROOT, so a
        // relative canonical argument (e.g. a project path) still resolves
        // correctly when Ninja re-invokes the driver. `InMemoryFilesystem`
        // reports a fixed cwd of `/workspace`, distinct from the `/tmp/objroot`
        // fixture context, so the two can't be accidentally conflated here.
        let fs = InMemoryFilesystem::new();
        let graph = FixedGraph(vec![Target { name: "T1".to_string(), deps: Vec::new() }]);
        generate(&graph, &EmptyInvocations, &FixedFormatter, &FixedParams("A"), &fs, &context()).unwrap();

        let text = String::from_utf8(fs.read(Utf8Path::new("/tmp/objroot/build.ninja")).unwrap()).unwrap();
        let regenerate_build = text
            .split("build build.ninja: regenerate")
            .nth(1)
            .expect("regenerate build statement must be present");
        assert!(regenerate_build.contains("dir = /workspace"));
        assert!(!regenerate_build.contains("dir = /tmp/objroot"));
    }

    #[test]
    fn s5_target_dependency_ordering() {
        let fs = InMemoryFilesystem::new();
        let graph = FixedGraph(vec![
            Target { name: "T1".to_string(), deps: Vec::new() },
            Target { name: "T2".to_string(), deps: vec!["T1".to_string()] },
        ]);
        generate(&graph, &EmptyInvocations, &FixedFormatter, &FixedParams("A"), &fs, &context()).unwrap();

        let text = String::from_utf8(fs.read(Utf8Path::new("/tmp/objroot/build.ninja")).unwrap()).unwrap();
        assert!(text.contains("build begin-target-T2: phony finish-target-T1"));
    }

    #[test]
    fn s6_fingerprint_miss_triggers_regeneration() {
        let fs = InMemoryFilesystem::new();
        fs.write(Utf8Path::new("/tmp/objroot/build.ninja"), b"stale").unwrap();
        fs.write(Utf8Path::new("/tmp/objroot/.ninja-configuration"), b"A").unwrap();

        assert!(should_generate(&fs, Utf8Path::new("/tmp/objroot"), &FixedParams("B"), false));

        let graph = FixedGraph(vec![Target { name: "T1".to_string(), deps: Vec::new() }]);
        generate(&graph, &EmptyInvocations, &FixedFormatter, &FixedParams("B"), &fs, &context()).unwrap();
        let fingerprint = String::from_utf8(fs.read(Utf8Path::new("/tmp/objroot/.ninja-configuration")).unwrap()).unwrap();
        assert_eq!(fingerprint, "B");
    }

    #[test]
    fn fingerprint_match_skips_regeneration() {
        let fs = InMemoryFilesystem::new();
        fs.write(Utf8Path::new("/tmp/objroot/build.ninja"), b"existing").unwrap();
        fs.write(Utf8Path::new("/tmp/objroot/.ninja-configuration"), b"A").unwrap();
        assert!(!should_generate(&fs, Utf8Path::new("/tmp/objroot"), &FixedParams("A"), false));
    }

    #[test]
    fn generate_flag_forces_regeneration() {
        let fs = InMemoryFilesystem::new();
        fs.write(Utf8Path::new("/tmp/objroot/build.ninja"), b"existing").unwrap();
        fs.write(Utf8Path::new("/tmp/objroot/.ninja-configuration"), b"A").unwrap();
        assert!(should_generate(&fs, Utf8Path::new("/tmp/objroot"), &FixedParams("A"), true));
    }

    #[test]
    fn determinism_same_inputs_same_bytes() {
        let fs1 = InMemoryFilesystem::new();
        let fs2 = InMemoryFilesystem::new();
        let graph = FixedGraph(vec![Target { name: "T1".to_string(), deps: Vec::new() }]);
        generate(&graph, &EchoInvocations, &FixedFormatter, &FixedParams("A"), &fs1, &context()).unwrap();
        generate(&graph, &EchoInvocations, &FixedFormatter, &FixedParams("A"), &fs2, &context()).unwrap();
        assert_eq!(
            fs1.read(Utf8Path::new("/tmp/objroot/build.ninja")).unwrap(),
            fs2.read(Utf8Path::new("/tmp/objroot/build.ninja")).unwrap()
        );
    }

    #[test]
    fn configuration_error_skips_target_but_others_proceed() {
        struct MixedInvocations;
        impl PhaseInvocationBuilder<Target> for MixedInvocations {
            fn invocations_for_target(&self, target: &Target) -> Result<Vec<Invocation>, CoreError> {
                if target.name == "Bad" {
                    Err(CoreError::Configuration {
                        target: target.name.clone(),
                        message: "missing setting".to_string(),
                    })
                } else {
                    Ok(Vec::new())
                }
            }
        }

        let fs = InMemoryFilesystem::new();
        let graph = FixedGraph(vec![
            Target { name: "Bad".to_string(), deps: Vec::new() },
            Target { name: "Good".to_string(), deps: Vec::new() },
        ]);
        generate(&graph, &MixedInvocations, &FixedFormatter, &FixedParams("A"), &fs, &context()).unwrap();
        let text = String::from_utf8(fs.read(Utf8Path::new("/tmp/objroot/build.ninja")).unwrap()).unwrap();
        assert!(!text.contains("begin-target-Bad"));
        assert!(text.contains("begin-target-Good"));
    }

    #[test]
    fn all_targets_failing_is_fatal() {
        struct AlwaysFails;
        impl PhaseInvocationBuilder<Target> for AlwaysFails {
            fn invocations_for_target(&self, target: &Target) -> Result<Vec<Invocation>, CoreError> {
                Err(CoreError::Configuration {
                    target: target.name.clone(),
                    message: "missing setting".to_string(),
                })
            }
        }

        let fs = InMemoryFilesystem::new();
        let graph = FixedGraph(vec![Target { name: "T1".to_string(), deps: Vec::new() }]);
        let result = generate(&graph, &AlwaysFails, &FixedFormatter, &FixedParams("A"), &fs, &context());
        assert!(matches!(result, Err(CoreError::NoTargetsSucceeded)));
    }
}
