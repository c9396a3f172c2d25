//! Build Orchestration: ten-stage documentation pipeline
//! (Configure -> Cmaps -> Dependencies -> Enter source -> Cheatsheet -> Static dir
//! -> Copy -> Resolve generator -> Site -> Restore).

pub mod executor;
pub mod phases;
pub mod state;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub use executor::{run_step, Invocation, SystemRunner, ToolRunner};
pub use state::{BuildStage, OrchestrationState, StageOutcome, StageRecord};

use crate::config::DocBuildConfig;
use crate::error::Result;
use crate::log_parsed;
use crate::system::{resolve_executable, WorkdirContext};
use phases::{copy_artifact, ensure_dir, EnsureOutcome};

/// One line of the dry-run plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    pub stage: BuildStage,
    pub description: String,
}

/// Runs the documentation pipeline, strictly in sequence, failing fast.
pub struct BuildOrchestrator<R: ToolRunner> {
    /// Repository root; the pipeline starts and ends here
    root: PathBuf,

    config: DocBuildConfig,

    runner: R,

    /// Search path used to find the site generator (`None` = process `PATH`)
    search_path: Option<OsString>,

    state: OrchestrationState,
}

impl BuildOrchestrator<SystemRunner> {
    /// Orchestrator running real processes.
    pub fn with_system_runner(root: impl Into<PathBuf>, config: DocBuildConfig) -> Self {
        Self::new(root, config, SystemRunner)
    }
}

impl<R: ToolRunner> BuildOrchestrator<R> {
    /// A relative `root` is anchored to the process directory here: children run
    /// with `current_dir` set, so a relative program path must not stack on it.
    pub fn new(root: impl Into<PathBuf>, config: DocBuildConfig, runner: R) -> Self {
        let root = root.into();
        BuildOrchestrator {
            root: std::path::absolute(&root).unwrap_or(root),
            config,
            runner,
            search_path: None,
            state: OrchestrationState::new(),
        }
    }

    /// Search the given `PATH`-style list instead of the process `PATH`.
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &DocBuildConfig {
        &self.config
    }

    pub fn state(&self) -> &OrchestrationState {
        &self.state
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Consume the orchestrator, returning the final state.
    pub fn into_state(self) -> OrchestrationState {
        self.state
    }

    /// Describe what `run` will do, without touching anything.
    pub fn plan(&self) -> Vec<PlannedStep> {
        let cfg = &self.config;
        let source = self.root.join(&cfg.source_dir);
        let pdf = cfg.cheatsheet_pdf_name();
        let describe = |stage: BuildStage| -> String {
            match stage {
                BuildStage::Configure => format!(
                    "export {}={}, output format '{}'",
                    cfg.footprint_env, cfg.docstring_footprint, cfg.output_format
                ),
                BuildStage::GenerateCmaps => {
                    format!("{} (in {})", cfg.cmap_generator, self.root.display())
                }
                BuildStage::ListDependencies => {
                    format!("{} (in {})", cfg.dependency_lister, self.root.display())
                }
                BuildStage::EnterSource => format!("pushd {}", source.display()),
                BuildStage::CompileCheatsheet => {
                    format!("{} {}", cfg.latex_compiler, cfg.cheatsheet_source)
                }
                BuildStage::EnsureStaticDir => format!("mkdir -p {}", cfg.static_dir),
                BuildStage::CopyCheatsheet => format!(
                    "cp -f {pdf} {}/ and ../{}/{}/",
                    cfg.static_dir,
                    cfg.output_dir_name(),
                    cfg.downloads_dir
                ),
                BuildStage::ResolveSiteGenerator => format!(
                    "first of [{}] on the search path",
                    cfg.site_generator_candidates.join(", ")
                ),
                BuildStage::GenerateSite => {
                    format!("<site generator> {}", cfg.site_generator_args().join(" "))
                }
                BuildStage::RestoreWorkdir => format!("popd -> {}", self.root.display()),
                BuildStage::Pending | BuildStage::Completed | BuildStage::Failed => String::new(),
            }
        };

        BuildStage::PIPELINE
            .iter()
            .map(|&stage| PlannedStep {
                stage,
                description: describe(stage),
            })
            .collect()
    }

    /// Execute the whole pipeline.
    ///
    /// The first failing stage aborts everything after it; its error is
    /// recorded in the state and returned unchanged.
    pub fn run(&mut self) -> Result<()> {
        log_parsed!("Documentation build started in {}", self.root.display());

        match self.execute() {
            Ok(()) => {
                self.state.transition_to(BuildStage::Completed)?;
                log_parsed!("Documentation build completed");
                Ok(())
            }
            Err(e) => {
                let stage = self.state.stage;
                self.state.record_error(e.to_string());
                log_parsed!("Documentation build FAILED at stage '{}': {}", stage, e);
                Err(e)
            }
        }
    }

    fn execute(&mut self) -> Result<()> {
        let mut ctx = WorkdirContext::new(self.root.clone());

        self.begin(BuildStage::Configure)?;
        let env = self.config.child_env();
        log::info!(
            "[Build] [CONFIGURE] Child environment: {:?}, output format: {}",
            env,
            self.config.output_format
        );
        self.finish(None);

        // Failures here are fatal like every other external step
        self.begin(BuildStage::GenerateCmaps)?;
        let cmaps = Invocation::new(
            BuildStage::GenerateCmaps,
            self.config.cmap_generator.clone(),
            ctx.current(),
        )
        .envs(env.clone());
        self.invoke(&cmaps)?;
        self.finish(None);

        self.begin(BuildStage::ListDependencies)?;
        let deps = Invocation::new(
            BuildStage::ListDependencies,
            self.config.dependency_lister.clone(),
            ctx.current(),
        )
        .envs(env.clone());
        self.invoke(&deps)?;
        self.finish(None);

        self.begin(BuildStage::EnterSource)?;
        let source = ctx.enter(&self.config.source_dir)?;
        self.finish(Some(source.current().display().to_string()));

        self.build_in_source(&source, &env)?;

        self.begin(BuildStage::RestoreWorkdir)?;
        drop(source);
        log::info!("[Build] [RESTORE] Back in {}", ctx.current().display());
        self.finish(Some(ctx.current().display().to_string()));

        Ok(())
    }

    /// Stages 5 to 9, run with the source tree as current directory.
    fn build_in_source(&mut self, ctx: &WorkdirContext, env: &[(String, String)]) -> Result<()> {
        let pdf_name = self.config.cheatsheet_pdf_name();

        self.begin(BuildStage::CompileCheatsheet)?;
        let latex = Invocation::new(
            BuildStage::CompileCheatsheet,
            self.config.latex_compiler.clone(),
            ctx.current(),
        )
        .args([self.config.cheatsheet_source.clone()])
        .envs(env.to_vec());
        self.invoke(&latex)?;
        self.finish(None);

        self.begin(BuildStage::EnsureStaticDir)?;
        let static_dir = ctx.resolve(&self.config.static_dir);
        let outcome = ensure_dir(&static_dir)?;
        self.finish(Some(
            match outcome {
                EnsureOutcome::Created => "created",
                EnsureOutcome::AlreadyPresent => "already present",
            }
            .to_string(),
        ));

        self.begin(BuildStage::CopyCheatsheet)?;
        let downloads = ctx
            .resolve(Path::new("..").join(self.config.output_dir_name()))
            .join(&self.config.downloads_dir);
        let destinations = [static_dir.join(&pdf_name), downloads.join(&pdf_name)];
        let written = copy_artifact(&ctx.resolve(&pdf_name), &destinations)?;
        self.finish(Some(format!("{} copies", written.len())));

        self.begin(BuildStage::ResolveSiteGenerator)?;
        let tool = resolve_executable(
            &self.config.site_generator_candidates,
            self.search_path.as_ref(),
            ctx.current(),
        )?;
        self.state.site_generator = Some(tool.path.clone());
        self.finish(Some(tool.name.clone()));

        self.begin(BuildStage::GenerateSite)?;
        let site = Invocation::new(
            BuildStage::GenerateSite,
            tool.path.to_string_lossy().into_owned(),
            ctx.current(),
        )
        .args(self.config.site_generator_args())
        .envs(env.to_vec());
        self.invoke(&site)?;
        self.finish(None);

        Ok(())
    }

    fn begin(&mut self, stage: BuildStage) -> Result<()> {
        self.state.transition_to(stage)?;
        let position = BuildStage::PIPELINE
            .iter()
            .position(|s| *s == stage)
            .map(|i| i + 1)
            .unwrap_or(0);
        log_parsed!(
            "STAGE {}/{}: {}",
            position,
            BuildStage::PIPELINE.len(),
            stage
        );
        Ok(())
    }

    fn finish(&mut self, detail: Option<String>) {
        self.state.complete_stage(detail);
    }

    fn invoke(&mut self, invocation: &Invocation) -> Result<()> {
        self.state.record_invocation(invocation.clone());
        run_step(&mut self.runner, invocation)
    }
}
