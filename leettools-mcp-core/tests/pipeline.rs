// leettools-mcp-core/tests/pipeline.rs
//! End-to-end runs of the runner and dispatcher against fake `leet` scripts.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use serde_json::{Map, Value};
use tempfile::TempDir;

use leettools_mcp_core::operations::SEARCH_CITATIONS;
use leettools_mcp_core::{
    CommandOptions, Dispatcher, ErrorCode, LeetConfig, LeetError, Operation, Response, StdoutProcessor,
    run_process,
};

/// Parses `-o <file>` and leaves the path in `$out`.
const ARG_PARSER: &str = r#"
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; shift; fi
  shift
done
"#;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

struct Harness {
    _dir: TempDir,
    output_dir: PathBuf,
    dispatcher: Dispatcher,
}

fn harness(script_body: &str, tweak: impl FnOnce(&mut LeetConfig)) -> Harness {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "leet", script_body);
    let mut config = LeetConfig::with_output_dir(dir.path().join("mcp_outputs"));
    config.executable_override = Some(script);
    tweak(&mut config);
    config.ensure_output_dir().unwrap();
    Harness {
        output_dir: config.output_dir.clone(),
        dispatcher: Dispatcher::new(Arc::new(config)),
        _dir: dir,
    }
}

fn kb_search() -> Operation {
    Operation::SearchKnowledgeBase {
        query: "what is rust".into(),
        kb_name: "docs".into(),
    }
}

fn expect_success(response: Response) -> leettools_mcp_core::ProcessOutcome {
    match response {
        Response::Success(outcome) => outcome,
        Response::Error(envelope) => panic!("Expected success, got envelope: {}", envelope),
    }
}

fn expect_error(response: Response) -> leettools_mcp_core::ErrorEnvelope {
    match response {
        Response::Error(envelope) => envelope,
        Response::Success(outcome) => panic!("Expected envelope, got success: {:?}", outcome),
    }
}

#[tokio::test]
async fn test_runner_drains_both_streams_with_slow_stderr() -> Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    // Both streams exceed a pipe buffer; stderr keeps going long after stdout is done.
    let script = write_script(
        dir.path(),
        "noisy",
        r#"
i=0
while [ "$i" -lt 3000 ]; do echo "out $i padding padding padding padding"; i=$((i+1)); done
i=0
while [ "$i" -lt 2000 ]; do echo "err $i padding padding padding padding" >&2; i=$((i+1)); done
sleep 1
echo "late err" >&2
exit 0
"#,
    );
    let log_path = dir.path().join("noisy.log");
    let outcome = run_process(&script, &["-q".into(), "two words".into()], &log_path).await;

    assert!(outcome.success, "Run failed: {:?}", outcome.error);
    assert_eq!(outcome.exit_code, Some(0));

    let expected_stdout: Vec<String> = (0..3000)
        .map(|i| format!("out {} padding padding padding padding", i))
        .collect();
    let mut expected_stderr: Vec<String> = (0..2000)
        .map(|i| format!("err {} padding padding padding padding", i))
        .collect();
    expected_stderr.push("late err".into());

    let stdout = outcome.stdout.unwrap();
    let stderr = outcome.stderr.unwrap();
    assert_eq!(stdout.lines().collect::<Vec<_>>(), expected_stdout);
    assert_eq!(stderr.lines().collect::<Vec<_>>(), expected_stderr);

    let log = std::fs::read_to_string(&log_path)?;
    assert!(log.starts_with(&format!("Command: {} -q \"two words\"\n", script.display())));
    assert!(log.contains("\nTimestamp: "));
    assert!(log.contains("=== STDOUT & STDERR ===\n\n"));
    assert_eq!(log.lines().filter(|l| l.starts_with("STDOUT: ")).count(), 3000);
    assert_eq!(log.lines().filter(|l| l.starts_with("STDERR: ")).count(), 2001);
    assert!(log.contains("STDOUT: out 2999 padding padding padding padding\n"));
    assert!(log.contains("STDERR: late err\n"));
    assert!(log.ends_with("\nProcess exited with code: 0\n"), "Log tail: {:?}", &log[log.len() - 60..]);

    let stdout_in_log: Vec<&str> = log
        .lines()
        .filter_map(|l| l.strip_prefix("STDOUT: "))
        .collect();
    assert_eq!(stdout_in_log, expected_stdout);
    Ok(())
}

#[tokio::test]
async fn test_runner_reports_non_zero_exit() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let script = write_script(dir.path(), "fails", "echo partial\necho 'kb missing' >&2\nexit 7\n");
    let log_path = dir.path().join("fails.log");

    let outcome = run_process(&script, &[], &log_path).await;

    assert!(!outcome.success);
    assert_eq!(outcome.exit_code, Some(7));
    assert_eq!(outcome.stdout.as_deref(), Some("partial\n"));
    assert_eq!(outcome.stderr.as_deref(), Some("kb missing\n"));
    assert_eq!(outcome.log_path.as_deref(), Some(log_path.to_str().unwrap()));
    assert!(std::fs::read_to_string(&log_path)?.ends_with("Process exited with code: 7\n"));
    Ok(())
}

#[tokio::test]
async fn test_runner_converts_spawn_failure() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let not_executable = dir.path().join("plain.txt");
    std::fs::write(&not_executable, "not a program")?;

    let outcome = run_process(&not_executable, &[], &dir.path().join("plain.log")).await;

    assert!(!outcome.success);
    assert_eq!(outcome.code.as_deref(), Some(ErrorCode::CommandExecutionError.as_str()));
    assert!(outcome.error.is_some());
    let content = outcome.content.unwrap();
    assert!(content.contains("Error running LeetTools command"), "Unexpected content: {}", content);
    Ok(())
}

#[tokio::test]
async fn test_dispatcher_surfaces_configured_error_code() {
    let h = harness("echo 'kb docs does not exist' >&2\nexit 7\n", |_| {});
    let envelope = expect_error(h.dispatcher.execute(&kb_search()).await);

    assert!(envelope.error);
    assert_eq!(envelope.message, "Error running kb_search");
    assert_eq!(envelope.details, "kb docs does not exist\n");
    assert_eq!(envelope.code, "KB_SEARCH_FAILED");
}

#[tokio::test]
async fn test_dispatcher_missing_executable() {
    let h = harness("exit 0\n", |config| {
        config.executable_override = Some(PathBuf::from("/definitely/not/here/leet"));
    });
    let envelope = expect_error(h.dispatcher.execute(&Operation::ListKnowledgeBases).await);

    assert_eq!(envelope.code, ErrorCode::KbOperationFailed.as_str());
    assert_eq!(envelope.details, "LeetTools executable not found.");
}

#[tokio::test]
async fn test_dispatcher_reads_output_and_strips_streams() -> Result<()> {
    let body = format!(
        "{}echo 'searching...'\necho 'warn: slow' >&2\nprintf '# Answer\\n\\nRust is a language [1].\\n' > \"$out\"\n",
        ARG_PARSER
    );
    let h = harness(&body, |_| {});
    let json = h.dispatcher.execute_json(&kb_search()).await;

    let outcome = expect_success(Response::parse(&json)?);
    assert!(outcome.success);
    assert_eq!(outcome.content.as_deref(), Some("# Answer\n\nRust is a language [1].\n"));
    assert_eq!(outcome.instructions.as_deref(), Some(SEARCH_CITATIONS));
    assert_eq!(outcome.stdout, None);
    assert_eq!(outcome.stderr, None);

    let log_path = PathBuf::from(outcome.log_path.unwrap());
    assert!(log_path.starts_with(&h.output_dir));
    let log = std::fs::read_to_string(&log_path)?;
    assert!(log.contains(" -o "), "Output flag should be passed: {}", log);
    assert!(log.contains("-q \"what is rust\""));
    Ok(())
}

#[tokio::test]
async fn test_dispatcher_empty_output_is_no_results() {
    let body = format!("{}: > \"$out\"\n", ARG_PARSER);
    let h = harness(&body, |_| {});
    let envelope = expect_error(h.dispatcher.execute(&kb_search()).await);

    assert_eq!(envelope.code, "NO_KB_RESULTS");
    assert_eq!(envelope.message, "No knowledge base results found");
}

#[tokio::test]
async fn test_dispatcher_truncates_to_context_length() {
    let body = format!("{}printf '%0100d' 0 > \"$out\"\n", ARG_PARSER);
    let h = harness(&body, |config| config.context_length = Some(10));
    let outcome = expect_success(h.dispatcher.execute(&kb_search()).await);

    assert_eq!(outcome.content.as_deref(), Some("0000000000"));
}

#[tokio::test]
async fn test_concurrent_calls_use_distinct_files() -> Result<()> {
    let body = format!("{}echo result > \"$out\"\n", ARG_PARSER);
    let h = harness(&body, |_| {});
    let op = kb_search();

    let (first, second) = tokio::join!(h.dispatcher.execute_json(&op), h.dispatcher.execute_json(&op));
    let first = expect_success(Response::parse(&first)?);
    let second = expect_success(Response::parse(&second)?);
    assert_ne!(first.log_path, second.log_path);

    let mut outputs = 0;
    let mut logs = 0;
    for entry in std::fs::read_dir(&h.output_dir)? {
        match entry?.path().extension().and_then(|e| e.to_str()) {
            Some("md") => outputs += 1,
            Some("log") => logs += 1,
            _ => {}
        }
    }
    assert_eq!((outputs, logs), (2, 2));
    Ok(())
}

#[tokio::test]
async fn test_list_kb_parses_stdout() {
    let h = harness(
        "echo 'Org: org-default    KB: mcp_search    ID: 665a1'\necho 'Org: org-default    KB: notes    ID: 665a2'\n",
        |_| {},
    );
    let outcome = expect_success(h.dispatcher.execute(&Operation::ListKnowledgeBases).await);

    assert_eq!(outcome.stdout, None);
    let kbs = outcome.extra["knowledge_bases"].as_array().unwrap();
    assert_eq!(kbs.len(), 2);
    assert_eq!(kbs[1]["kb"], "notes");
    assert_eq!(kbs[1]["id"], "665a2");
}

struct FailingProcessor;

impl StdoutProcessor for FailingProcessor {
    fn process(&self, _stdout: &str) -> Result<Map<String, Value>, LeetError> {
        Err(LeetError::processor("unexpected listing format"))
    }
}

#[tokio::test]
async fn test_processor_errors_do_not_fail_the_call() -> Result<()> {
    let h = harness("echo garbage\n", |_| {});
    let options = CommandOptions::for_kb_operation("list_kb").with_stdout_processor(Arc::new(FailingProcessor));

    let json = h.dispatcher.perform("list_kb", vec!["kb".into(), "list".into()], &options).await;
    let outcome = expect_success(Response::parse(&json)?);
    assert!(outcome.success);
    assert!(outcome.extra.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_debug_logging_adds_log_level() -> Result<()> {
    let h = harness("echo \"$@\"\n", |config| config.debug_logging = true);
    let options = CommandOptions {
        no_stdout_return: false,
        ..CommandOptions::for_kb_operation("create_kb")
    };

    let args = vec!["kb".into(), "create".into(), "-k".into(), "notes".into()];
    let outcome = expect_success(h.dispatcher.perform_response("create_kb", args, &options).await);
    assert_eq!(outcome.stdout.as_deref(), Some("kb create -k notes -l DEBUG\n"));

    // add-local already carries its own level.
    let folder = tempfile::tempdir()?;
    let op = Operation::add_local_folder(folder.path(), Some("notes".into())).unwrap();
    let options = CommandOptions {
        no_stdout_return: false,
        ..op.options()
    };
    let outcome = expect_success(h.dispatcher.perform_response(op.tool_name(), op.args(), &options).await);
    let stdout = outcome.stdout.unwrap();
    assert_eq!(stdout.split_whitespace().filter(|arg| *arg == "-l").count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_unreadable_output_becomes_exception_envelope() -> Result<()> {
    // A self-referencing symlink makes reading the output file fail with ELOOP.
    let body = format!("{}ln -s \"$out\" \"$out\"\n", ARG_PARSER);
    let h = harness(&body, |_| {});

    let json = h.dispatcher.execute_json(&kb_search()).await;
    let envelope = expect_error(Response::parse(&json)?);
    assert!(envelope.error);
    assert_eq!(envelope.code, "KB_SEARCH_EXCEPTION");
    assert_eq!(envelope.message, "An error occurred performing kb_search");
    assert!(envelope.details.starts_with("I/O Error"), "Unexpected details: {}", envelope.details);
    Ok(())
}

#[tokio::test]
async fn test_kb_name_with_slash_stays_usable() -> Result<()> {
    let body = format!("{}echo found > \"$out\"\n", ARG_PARSER);
    let h = harness(&body, |_| {});
    let op = Operation::SearchKnowledgeBase {
        query: "roadmap".into(),
        kb_name: "team/notes".into(),
    };

    let outcome = expect_success(h.dispatcher.execute(&op).await);
    assert_eq!(outcome.content.as_deref(), Some("found\n"));

    let log_path = PathBuf::from(outcome.log_path.unwrap());
    assert_eq!(log_path.parent(), Some(h.output_dir.as_path()));
    let name = log_path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("kb_search_team_notes_"), "Unexpected name: {}", name);
    // The KB name itself is passed through to leet unchanged.
    assert!(std::fs::read_to_string(&log_path)?.contains("-k team/notes"));
    Ok(())
}
