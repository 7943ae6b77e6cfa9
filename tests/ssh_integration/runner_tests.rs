//! End-to-end script runs against a real sshd

use tokio::io::AsyncReadExt;

use deployfast::{
    DeployError, ExecutionOutcome, ExecutionPolicy, OutputStreams, ScriptJob, ScriptRunner,
};

use super::fixtures::{write_script, TestSshServer};

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_streamed_provision_prints_output_and_cleans_up() {
    let server = TestSshServer::start().await;
    let session = server.connect().await;
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "provision.sh", "echo hello\n");

    let (out_w, mut out_r) = tokio::io::duplex(64 * 1024);
    let (err_w, _err_r) = tokio::io::duplex(64 * 1024);

    let report = ScriptRunner::new(&session)
        .with_output(OutputStreams::new(Box::new(out_w), Box::new(err_w)))
        .run(
            &ScriptJob::new(&script, "/tmp/provision.sh"),
            ExecutionPolicy::Streamed,
        )
        .await
        .unwrap();

    assert!(matches!(report.outcome, ExecutionOutcome::Streamed { exit_code: 0 }));
    assert!(report.cleanup_warning.is_none());

    let mut stdout = String::new();
    out_r.read_to_string(&mut stdout).await.unwrap();
    assert!(stdout.lines().any(|l| l == "hello"), "stdout was {:?}", stdout);

    let exists = session.run("test -e /tmp/provision.sh").await;
    assert!(exists.unwrap_err().is_exec());

    session.close().await;
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_collected_falls_back_without_sudo() {
    let server = TestSshServer::start().await;
    let session = server.connect().await;
    let dir = tempfile::tempdir().unwrap();
    // The container user has no sudo rights, so only the plain run can succeed
    let script = write_script(dir.path(), "whoami.sh", "echo running as $(id -un)\n");

    let report = ScriptRunner::new(&session)
        .run(
            &ScriptJob::new(&script, "/tmp/whoami.sh"),
            ExecutionPolicy::Collected,
        )
        .await
        .unwrap();

    match report.outcome {
        ExecutionOutcome::Collected(output) => {
            assert!(output.stdout().contains("running as deploy"), "{:?}", output)
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    session.close().await;
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_failing_script_is_reported_and_removed() {
    let server = TestSshServer::start().await;
    let session = server.connect().await;
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "broken.sh", "echo about to fail\nexit 7\n");

    let err = ScriptRunner::new(&session)
        .run(
            &ScriptJob::new(&script, "/tmp/broken.sh"),
            ExecutionPolicy::Collected,
        )
        .await
        .unwrap_err();
    assert!(err.is_exec());

    assert!(session.run("test -e /tmp/broken.sh").await.is_err());
    session.close().await;
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_streamed_failure_reports_exit_code_and_routes_stderr() {
    let server = TestSshServer::start().await;
    let session = server.connect().await;
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "broken.sh",
        "echo before failing\necho disk full >&2\nexit 7\n",
    );

    let (out_w, mut out_r) = tokio::io::duplex(64 * 1024);
    let (err_w, mut err_r) = tokio::io::duplex(64 * 1024);

    let err = ScriptRunner::new(&session)
        .with_output(OutputStreams::new(Box::new(out_w), Box::new(err_w)))
        .run(
            &ScriptJob::new(&script, "/tmp/broken.sh"),
            ExecutionPolicy::Streamed,
        )
        .await
        .unwrap_err();

    // Without sudo rights both halves of `sudo bash || bash` run; the second
    // one's status is what the remote shell reports
    match err {
        DeployError::Exec { exit_code, .. } => assert_eq!(exit_code, Some(7)),
        other => panic!("expected exec error, got {:?}", other),
    }

    let mut stdout = String::new();
    out_r.read_to_string(&mut stdout).await.unwrap();
    let mut stderr = String::new();
    err_r.read_to_string(&mut stderr).await.unwrap();
    assert!(stderr.lines().any(|l| l == "disk full"), "stderr was {:?}", stderr);
    assert!(!stdout.contains("disk full"), "stdout was {:?}", stdout);
    assert!(stdout.lines().any(|l| l == "before failing"), "stdout was {:?}", stdout);

    assert!(session.run("test -e /tmp/broken.sh").await.is_err());
    session.close().await;
}
