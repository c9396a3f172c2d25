//! Integration tests for BuildOrchestrator
//!
//! These tests drive the complete pipeline against a scratch documentation tree
//! with a recording tool runner, and verify stage order, fail-fast behaviour,
//! site-generator resolution and the produced artifacts.

use docbuild::orchestrator::StageOutcome;
use docbuild::{BuildError, BuildOrchestrator, BuildStage, DocBuildConfig, Invocation, ToolRunner};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const PDF_BYTES: &[u8] = b"%PDF-1.5\n% docbuild test cheatsheet\n";

/// Test double: records every invocation, optionally fails one stage, and
/// emulates the LaTeX compiler writing its PDF next to the source.
#[derive(Default)]
struct RecordingRunner {
    log: Vec<Invocation>,
    fail_stage: Option<(BuildStage, i32)>,
    skip_pdf: bool,
}

impl ToolRunner for RecordingRunner {
    fn run(&mut self, invocation: &Invocation) -> io::Result<i32> {
        self.log.push(invocation.clone());

        if let Some((stage, code)) = self.fail_stage {
            if stage == invocation.stage {
                return Ok(code);
            }
        }

        if invocation.stage == BuildStage::CompileCheatsheet && !self.skip_pdf {
            let tex = Path::new(&invocation.args[0]);
            let pdf = tex.with_extension("pdf");
            fs::write(invocation.cwd.join(pdf), PDF_BYTES)?;
        }
        Ok(0)
    }
}

/// Scratch repository with a `source/` tree and an empty tool directory.
struct DocTree {
    _temp: TempDir,
    root: PathBuf,
    bin: PathBuf,
}

impl DocTree {
    fn new() -> Self {
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        let root = temp.path().join("repo");
        let bin = temp.path().join("bin");
        fs::create_dir_all(root.join("source")).unwrap();
        fs::write(root.join("source/cheatsheet.tex"), "\\documentclass{article}").unwrap();
        fs::create_dir_all(&bin).unwrap();
        DocTree {
            _temp: temp,
            root,
            bin,
        }
    }

    #[cfg(unix)]
    fn install_tool(&self, name: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = self.bin.join(name);
        fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn orchestrator(&self, runner: RecordingRunner) -> BuildOrchestrator<RecordingRunner> {
        BuildOrchestrator::new(&self.root, DocBuildConfig::default(), runner)
            .with_search_path(self.bin.as_os_str())
    }
}

fn stages(log: &[Invocation]) -> Vec<BuildStage> {
    log.iter().map(|i| i.stage).collect()
}

#[cfg(unix)]
#[test]
fn test_end_to_end_with_stubbed_tools() {
    let tree = DocTree::new();
    let sphinx = tree.install_tool("sphinx-build");

    let mut orch = tree.orchestrator(RecordingRunner::default());
    orch.run().expect("pipeline should succeed");

    let static_pdf = tree.root.join("source/_static/cheatsheet.pdf");
    let download_pdf = tree.root.join("html/_downloads/cheatsheet.pdf");
    assert!(static_pdf.is_file());
    assert!(download_pdf.is_file());
    assert_eq!(fs::read(&static_pdf).unwrap(), fs::read(&download_pdf).unwrap());
    assert_eq!(fs::read(&static_pdf).unwrap(), PDF_BYTES);

    let log = &orch.runner().log;
    let site = log.last().expect("site generator invoked");
    assert_eq!(site.stage, BuildStage::GenerateSite);
    assert_eq!(PathBuf::from(&site.program), sphinx);
    assert_eq!(site.args, vec!["-b", "html", ".", "../html"]);
    assert_eq!(site.cwd, tree.root.join("source"));

    let state = orch.state();
    assert!(state.is_completed());
    assert_eq!(state.site_generator.as_deref(), Some(sphinx.as_path()));
    assert!(state.error.is_none());
}

#[cfg(unix)]
#[test]
fn test_stage_order_is_fixed() {
    let tree = DocTree::new();
    tree.install_tool("sphinx-build");

    let mut orch = tree.orchestrator(RecordingRunner::default());
    orch.run().unwrap();

    assert_eq!(orch.state().completed_stages(), BuildStage::PIPELINE.to_vec());
    assert_eq!(
        stages(&orch.runner().log),
        vec![
            BuildStage::GenerateCmaps,
            BuildStage::ListDependencies,
            BuildStage::CompileCheatsheet,
            BuildStage::GenerateSite,
        ]
    );

    let log = &orch.runner().log;
    assert_eq!(log[0].program, "./gen_cmaps.py");
    assert_eq!(log[0].cwd, tree.root);
    assert!(log[0].args.is_empty());
    assert_eq!(log[1].program, "./list_dependencies.py");
    assert_eq!(log[1].cwd, tree.root);
    assert_eq!(log[2].program, "pdflatex");
    assert_eq!(log[2].args, vec!["cheatsheet.tex"]);
    assert_eq!(log[2].cwd, tree.root.join("source"));
}

#[test]
fn test_latex_failure_halts_before_copy() {
    let tree = DocTree::new();
    let runner = RecordingRunner {
        fail_stage: Some((BuildStage::CompileCheatsheet, 1)),
        ..Default::default()
    };

    let mut orch = tree.orchestrator(runner);
    let err = orch.run().unwrap_err();

    match err {
        BuildError::ExternalStepFailure { stage, code, .. } => {
            assert_eq!(stage, BuildStage::CompileCheatsheet);
            assert_eq!(code, 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!tree.root.join("source/_static").exists());
    assert!(!tree.root.join("html").exists());
    assert_eq!(orch.runner().log.len(), 3);

    let state = orch.state();
    assert_eq!(state.stage, BuildStage::Failed);
    assert_eq!(state.failed_stage(), Some(BuildStage::CompileCheatsheet));
    assert!(!state.completed_stages().contains(&BuildStage::CopyCheatsheet));
}

#[test]
fn test_missing_pdf_is_missing_source_file() {
    let tree = DocTree::new();
    let runner = RecordingRunner {
        skip_pdf: true,
        ..Default::default()
    };

    let mut orch = tree.orchestrator(runner);
    let err = orch.run().unwrap_err();

    assert!(matches!(err, BuildError::MissingSourceFile(ref p) if p.ends_with("cheatsheet.pdf")));
    assert_eq!(err.exit_code(), 1);
    // The ensure stage ran before the copy failed and is not rolled back
    assert!(tree.root.join("source/_static").is_dir());
    assert!(!tree.root.join("html").exists());
}

#[test]
fn test_no_site_generator_is_tool_not_found() {
    let tree = DocTree::new();

    let mut orch = tree.orchestrator(RecordingRunner::default());
    let err = orch.run().unwrap_err();

    assert!(matches!(err, BuildError::ToolNotFound { .. }));
    assert_eq!(err.exit_code(), 127);
    assert!(!stages(&orch.runner().log).contains(&BuildStage::GenerateSite));
    assert_eq!(
        orch.state().failed_stage(),
        Some(BuildStage::ResolveSiteGenerator)
    );
    // Copies made before the failure stay in place
    assert!(tree.root.join("html/_downloads/cheatsheet.pdf").is_file());
}

#[cfg(unix)]
#[test]
fn test_first_candidate_invoked_when_both_present() {
    let tree = DocTree::new();
    tree.install_tool("sphinx-build3");
    let preferred = tree.install_tool("sphinx-build");

    let mut orch = tree.orchestrator(RecordingRunner::default());
    orch.run().unwrap();

    let site = orch.runner().log.last().unwrap();
    assert_eq!(PathBuf::from(&site.program), preferred);
}

#[cfg(unix)]
#[test]
fn test_fallback_candidate_invoked() {
    let tree = DocTree::new();
    let fallback = tree.install_tool("sphinx-build3");

    let mut orch = tree.orchestrator(RecordingRunner::default());
    orch.run().unwrap();

    let site = orch.runner().log.last().unwrap();
    assert_eq!(PathBuf::from(&site.program), fallback);
    let resolve = orch
        .state()
        .records
        .iter()
        .find(|r| r.stage == BuildStage::ResolveSiteGenerator)
        .unwrap();
    assert_eq!(resolve.detail.as_deref(), Some("sphinx-build3"));
}

#[cfg(unix)]
#[test]
fn test_rerun_is_idempotent_for_static_dir() {
    let tree = DocTree::new();
    tree.install_tool("sphinx-build");

    let mut first = tree.orchestrator(RecordingRunner::default());
    first.run().unwrap();
    let mut second = tree.orchestrator(RecordingRunner::default());
    second.run().unwrap();

    let ensure = second
        .state()
        .records
        .iter()
        .find(|r| r.stage == BuildStage::EnsureStaticDir)
        .unwrap();
    assert_eq!(ensure.outcome, StageOutcome::Succeeded);
    assert_eq!(ensure.detail.as_deref(), Some("already present"));

    let entries: Vec<_> = fs::read_dir(tree.root.join("source"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name() == "_static")
        .collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_dependency_lister_failure_is_fatal() {
    let tree = DocTree::new();
    let runner = RecordingRunner {
        fail_stage: Some((BuildStage::ListDependencies, 9)),
        ..Default::default()
    };

    let mut orch = tree.orchestrator(runner);
    let err = orch.run().unwrap_err();

    assert_eq!(err.exit_code(), 9);
    assert_eq!(
        stages(&orch.runner().log),
        vec![BuildStage::GenerateCmaps, BuildStage::ListDependencies]
    );
    assert_eq!(
        orch.state().completed_stages(),
        vec![BuildStage::Configure, BuildStage::GenerateCmaps]
    );
}

#[test]
fn test_custom_format_changes_output_tree() {
    let tree = DocTree::new();
    let mut config = DocBuildConfig::default();
    config.output_format = "singlehtml".to_string();
    config.site_generator_candidates = vec!["definitely-not-installed".to_string()];

    let mut orch = BuildOrchestrator::new(&tree.root, config, RecordingRunner::default())
        .with_search_path(tree.bin.as_os_str());
    assert!(orch.run().is_err());

    assert!(tree.root.join("singlehtml/_downloads/cheatsheet.pdf").is_file());
    assert!(!tree.root.join("html").exists());
}
