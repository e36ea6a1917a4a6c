// tests/orchestrator_fake_executor.rs

mod common;
use crate::common::{init_tracing, FakeExecutor, RunConfigBuilder};

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use docci::config::RunConfig;
use docci::engine::{AggregatedResult, FailureKind, Orchestrator, RunError};
use docci::exec::{Environment, ExecutionOutcome, HookPhase, ProcessRegistry};
use docci::fs::mock::MockFileSystem;
use docci::tags::TagCatalog;
use docci::types::{ExecutionMode, FailureMode};

type TestResult = Result<(), Box<dyn Error>>;

const THREE_BLOCKS: &str = "\
# Guide

```bash
echo one
```

```bash
echo two
```

```bash
echo three
```
";

async fn run_with(
    config: RunConfig,
    fs: &MockFileSystem,
    executor: &FakeExecutor,
    cancel: CancellationToken,
) -> AggregatedResult {
    init_tracing();
    let orchestrator = Orchestrator::new(
        config,
        Arc::new(TagCatalog::builtin()),
        Arc::new(fs.clone()),
        executor.clone(),
        Arc::new(ProcessRegistry::new()),
        cancel,
    )
    .with_environment(Environment::new());
    orchestrator.run().await
}

fn blocks_of(executor: &FakeExecutor) -> Vec<(String, usize)> {
    executor
        .executed_blocks()
        .into_iter()
        .map(|(p, i)| (p.display().to_string(), i))
        .collect()
}

#[tokio::test]
async fn blocks_run_in_document_order_and_outputs_are_joined() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("README.md", THREE_BLOCKS);
    let executor = FakeExecutor::new();

    let config = RunConfigBuilder::new().path("README.md").build();
    let result = run_with(config, &fs, &executor, CancellationToken::new()).await;

    assert_eq!(
        blocks_of(&executor),
        vec![
            ("README.md".to_string(), 0),
            ("README.md".to_string(), 1),
            ("README.md".to_string(), 2)
        ]
    );
    assert_eq!(result.into_result()?, "echo one\necho two\necho three");
    Ok(())
}

#[tokio::test]
async fn first_failure_stops_the_run() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("docs/a.md", THREE_BLOCKS);
    fs.add_file("docs/b.md", THREE_BLOCKS);
    fs.add_file("later.md", THREE_BLOCKS);

    let executor = FakeExecutor::new().with_outcome(
        "docs/a.md",
        1,
        ExecutionOutcome::missing_output("FOO", "echo two"),
    );

    let config = RunConfigBuilder::new().path("docs").path("later.md").build();
    let result = run_with(config, &fs, &executor, CancellationToken::new()).await;

    assert_eq!(
        blocks_of(&executor),
        vec![("docs/a.md".to_string(), 0), ("docs/a.md".to_string(), 1)]
    );

    let failure = result.first_failure().cloned().ok_or("expected a failure")?;
    assert_eq!(failure.group, "docs");
    assert_eq!(failure.index, 1);
    assert_eq!(failure.kind, FailureKind::AssertionFailed);
    assert_eq!(
        failure.files,
        vec![PathBuf::from("docs/a.md"), PathBuf::from("docs/b.md")]
    );

    let err = result.into_result().unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error(docs,[docs/a.md, docs/b.md])[#1]: `FOO` is not found in output"
    );
    Ok(())
}

#[tokio::test]
async fn unreadable_group_does_not_stop_other_groups() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("b.md", "```bash\necho b\n```\n");
    let executor = FakeExecutor::new();

    let config = RunConfigBuilder::new().path("missing.md").path("b.md").build();
    let result = run_with(config, &fs, &executor, CancellationToken::new()).await;

    assert_eq!(blocks_of(&executor), vec![("b.md".to_string(), 0)]);
    assert_eq!(result.outputs, vec!["echo b".to_string()]);
    assert_eq!(result.group_failures.len(), 1);
    assert_eq!(result.group_failures[0].group, "missing.md");

    match result.into_result() {
        Err(RunError::Groups(groups)) => {
            assert!(groups[0].message.contains("missing.md"));
            assert!(groups[0].to_string().starts_with("Error(missing.md,[missing.md]): "));
        }
        other => return Err(format!("expected group failure, got {other:?}").into()),
    }
    Ok(())
}

#[tokio::test]
async fn invalid_tag_fails_its_group() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("bad.md", "```bash docci-not-real\nls\n```\n");
    fs.add_file("good.md", "```bash\necho ok\n```\n");
    let executor = FakeExecutor::new();

    let config = RunConfigBuilder::new().path("bad.md").path("good.md").build();
    let result = run_with(config, &fs, &executor, CancellationToken::new()).await;

    assert_eq!(blocks_of(&executor), vec![("good.md".to_string(), 0)]);
    assert!(result.group_failures[0].message.contains("docci-not-real"));
    Ok(())
}

#[tokio::test]
async fn ineligible_blocks_never_reach_the_executor() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file(
        "README.md",
        "```python\nprint(1)\n```\n```\nplain\n```\n```bash docci-ignore\nrm -rf /\n```\n```sh docci-session\na\nb\n```\n",
    );
    let executor = FakeExecutor::new();

    let config = RunConfigBuilder::new()
        .path("README.md")
        .languages(&["bash", "sh", "python"])
        .build();
    let result = run_with(config, &fs, &executor, CancellationToken::new()).await;

    assert_eq!(
        executor.calls(),
        vec![common::FakeCall::Block {
            file: PathBuf::from("README.md"),
            index: 3,
            mode: ExecutionMode::Session,
        }]
    );
    assert!(result.is_success());
    Ok(())
}

#[tokio::test]
async fn document_without_fences_succeeds_with_empty_output() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("README.md", "# Nothing to run\n\nJust `inline` code.\n");
    let executor = FakeExecutor::new();

    let config = RunConfigBuilder::new().path("README.md").build();
    let result = run_with(config, &fs, &executor, CancellationToken::new()).await;

    assert!(executor.executed_blocks().is_empty());
    assert_eq!(result.into_result()?, "");
    Ok(())
}

#[tokio::test]
async fn collect_mode_reports_every_failure_of_the_file() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("a.md", THREE_BLOCKS);
    fs.add_file("b.md", THREE_BLOCKS);

    let executor = FakeExecutor::new()
        .with_outcome("a.md", 0, ExecutionOutcome::command_failed("boom", "echo one"))
        .with_outcome("a.md", 2, ExecutionOutcome::command_failed("bang", "echo three"));

    let config = RunConfigBuilder::new()
        .path("a.md")
        .path("b.md")
        .failure_mode(FailureMode::CollectPerFile)
        .build();
    let result = run_with(config, &fs, &executor, CancellationToken::new()).await;

    assert_eq!(executor.executed_blocks().len(), 3);
    match result.into_result() {
        Err(RunError::Blocks(failures)) => {
            let indices: Vec<usize> = failures.iter().map(|f| f.index).collect();
            assert_eq!(indices, vec![0, 2]);
        }
        other => return Err(format!("expected block failures, got {other:?}").into()),
    }
    Ok(())
}

#[tokio::test]
async fn setup_env_and_configured_vars_reach_blocks() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("README.md", "```bash\necho $GREETING\n```\n");
    let executor = FakeExecutor::new()
        .exporting("GREETING", "from-setup")
        .exporting("OVERRIDDEN", "setup");

    let config = RunConfigBuilder::new()
        .path("README.md")
        .pre_cmd("export GREETING=from-setup")
        .env_var("OVERRIDDEN", "config")
        .build();
    run_with(config, &fs, &executor, CancellationToken::new()).await;

    let envs = executor.block_envs();
    assert_eq!(envs.len(), 1);
    assert_eq!(envs[0].get("GREETING"), Some("from-setup"));
    assert_eq!(envs[0].get("OVERRIDDEN"), Some("config"));
    assert_eq!(executor.hooks(HookPhase::Setup), vec!["export GREETING=from-setup"]);
    Ok(())
}

#[tokio::test]
async fn setup_failure_skips_blocks_but_still_cleans_up() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("README.md", THREE_BLOCKS);
    let executor = FakeExecutor::new().failing_hook("make build");

    let config = RunConfigBuilder::new()
        .path("README.md")
        .pre_cmd("make build")
        .cleanup_cmd("make clean")
        .build();
    let result = run_with(config, &fs, &executor, CancellationToken::new()).await;

    assert!(executor.executed_blocks().is_empty());
    assert_eq!(executor.hooks(HookPhase::Cleanup), vec!["make clean"]);
    assert_eq!(
        result.into_result(),
        Err(RunError::Setup("`make build` failed".to_string()))
    );
    Ok(())
}

#[tokio::test]
async fn teardown_runs_once_and_its_failures_do_not_mask_the_result() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("README.md", THREE_BLOCKS);
    let executor = FakeExecutor::new()
        .with_outcome("README.md", 0, ExecutionOutcome::command_failed("boom", "echo one"))
        .failing_hook("docker compose down");

    let config = RunConfigBuilder::new()
        .path("README.md")
        .cleanup_cmd("docker compose down")
        .cleanup_cmd("rm -rf tmp")
        .build();
    let result = run_with(config, &fs, &executor, CancellationToken::new()).await;

    assert_eq!(
        executor.hooks(HookPhase::Cleanup),
        vec!["docker compose down", "rm -rf tmp"]
    );
    let failure = result.first_failure().ok_or("expected failure")?;
    assert_eq!(failure.diagnostic, "boom");
    assert_eq!(failure.kind, FailureKind::CommandFailed);
    Ok(())
}

#[tokio::test]
async fn cancelled_run_reports_interrupt_and_tears_down() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("README.md", THREE_BLOCKS);
    let executor = FakeExecutor::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let config = RunConfigBuilder::new()
        .path("README.md")
        .cleanup_cmd("echo bye")
        .build();
    let result = run_with(config, &fs, &executor, cancel).await;

    assert!(executor.executed_blocks().is_empty());
    assert_eq!(executor.hooks(HookPhase::Cleanup), vec!["echo bye"]);
    assert_eq!(result.into_result(), Err(RunError::Interrupted));
    Ok(())
}

#[tokio::test]
async fn interrupted_block_stops_iteration() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("README.md", THREE_BLOCKS);
    let executor =
        FakeExecutor::new().with_outcome("README.md", 1, ExecutionOutcome::interrupted("echo two"));

    let config = RunConfigBuilder::new().path("README.md").build();
    let result = run_with(config, &fs, &executor, CancellationToken::new()).await;

    assert_eq!(executor.executed_blocks().len(), 2);
    assert_eq!(result.outputs, vec!["echo one".to_string()]);
    assert_eq!(result.into_result().unwrap_err().to_string(), "Interrupted by user");
    Ok(())
}
