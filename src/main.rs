//! Thin binary entrypoint: parses CLI flags, installs logging, assembles a
//! small in-memory target graph (standing in for the project/scheme/phase
//! compiler this core treats as an external collaborator), and hands it to
//! the orchestrator.

mod cli;
mod logging;

use std::collections::BTreeMap;

use camino::Utf8PathBuf;
use xcninja::collaborators::{
    BuildParameters, InvocationFormatter, PhaseInvocationBuilder, RealFilesystem, TargetGraph, TargetIdentity,
};
use xcninja::error::CoreError;
use xcninja::fingerprint;
use xcninja::invocation::{Executable, Invocation};
use xcninja::orchestrator::{self, BuildContext, RunOptions};

/// One node of the demo target graph: a name, its direct dependencies, and
/// the invocations the (absent) phase compiler would have produced for it.
#[derive(Debug, Clone)]
struct DemoTarget {
    name: String,
    dependencies: Vec<String>,
    invocations: Vec<Invocation>,
}

impl TargetIdentity for DemoTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn temp_dir(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(format!("{}-target.build", self.name))
    }
}

struct DemoGraph(Vec<DemoTarget>);

impl TargetGraph<DemoTarget> for DemoGraph {
    fn nodes(&self) -> Vec<DemoTarget> {
        self.0.clone()
    }

    fn dependencies(&self, node: &DemoTarget) -> Vec<DemoTarget> {
        self.0
            .iter()
            .filter(|candidate| node.dependencies.contains(&candidate.name))
            .cloned()
            .collect()
    }
}

struct DemoPhaseCompiler;

impl PhaseInvocationBuilder<DemoTarget> for DemoPhaseCompiler {
    fn invocations_for_target(&self, target: &DemoTarget) -> Result<Vec<Invocation>, CoreError> {
        Ok(target.invocations.clone())
    }
}

struct DemoFormatter;

impl InvocationFormatter for DemoFormatter {
    fn begin_invocation_message(&self, invocation: &Invocation) -> String {
        format!("Invoking {}", invocation.executable.display_name())
    }
}

struct DemoParameters {
    parameters: Vec<String>,
}

impl BuildParameters for DemoParameters {
    fn canonical_arguments(&self) -> Vec<String> {
        self.parameters.clone()
    }

    fn canonical_hash(&self) -> String {
        fingerprint::hash(&self.parameters.join(" "))
    }
}

/// Two targets with a real dependency edge, so the self-regenerate rule,
/// cross-target ordering, and subninja composition all have something to
/// compose: `Core` compiles one object file, `App` links it and depends on
/// `Core` finishing first.
fn demo_graph() -> DemoGraph {
    let driver_dir = Utf8PathBuf::from("/usr/libexec/xcninja");

    let mut compile = Invocation::new(
        Executable::determine("/usr/bin/clang", &[], &driver_dir),
        Utf8PathBuf::from("/tmp/demo"),
    );
    compile.arguments = vec!["-c".to_string(), "core.c".to_string(), "-o".to_string(), "core.o".to_string()];
    compile.inputs.push(Utf8PathBuf::from("/tmp/demo/core.c"));
    compile.outputs.push(Utf8PathBuf::from("/tmp/demo/core.o"));

    let mut link = Invocation::new(
        Executable::determine("/usr/bin/clang", &[], &driver_dir),
        Utf8PathBuf::from("/tmp/demo"),
    );
    link.arguments = vec!["core.o".to_string(), "-o".to_string(), "App".to_string()];
    link.phony_inputs.push(Utf8PathBuf::from("/tmp/demo/core.o"));
    link.outputs.push(Utf8PathBuf::from("/tmp/demo/App"));
    link.environment = BTreeMap::from([("SDKROOT".to_string(), "/".to_string())]);

    DemoGraph(vec![
        DemoTarget {
            name: "Core".to_string(),
            dependencies: Vec::new(),
            invocations: vec![compile],
        },
        DemoTarget {
            name: "App".to_string(),
            dependencies: vec!["Core".to_string()],
            invocations: vec![link],
        },
    ])
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = cli::Cli::parse_args();

    let fs = RealFilesystem;
    let driver_binary_path = std::env::current_exe()
        .ok()
        .and_then(|p| Utf8PathBuf::from_path_buf(p).ok())
        .unwrap_or_else(|| Utf8PathBuf::from("xcninja"));

    let ctx = BuildContext {
        objroot: cli.objroot.clone(),
        workspace_inputs: vec![Utf8PathBuf::from("Demo.xcodeproj/project.pbxproj")],
        driver_binary_path,
        dependency_info_tool: Utf8PathBuf::from("/usr/libexec/xcninja/dependency-info-tool"),
    };
    let params = DemoParameters {
        parameters: cli.parameters.clone(),
    };
    let options = RunOptions {
        generate: cli.generate,
        dry_run: cli.dry_run,
        executor: cli.executor.clone(),
    };

    orchestrator::run(
        &demo_graph(),
        &DemoPhaseCompiler,
        &DemoFormatter,
        &params,
        &fs,
        &ctx,
        options,
    )?;

    Ok(())
}
