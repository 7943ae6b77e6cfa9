//! Session primitive tests: connect, run, transfer

use deployfast::ssh::StaticCredential;
use deployfast::{DeployError, Session};

use super::fixtures::{write_script, TestSshServer, USERNAME};

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_connect_then_close() {
    let server = TestSshServer::start().await;
    let session = server.connect().await;
    assert_eq!(session.config().username, USERNAME);
    session.close().await;
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_wrong_password_is_auth_error() {
    let server = TestSshServer::start().await;
    // Make sure sshd is up before testing the rejection
    server.connect().await.close().await;

    let err = Session::connect(server.ssh_config(), &StaticCredential::new("wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, DeployError::Authentication(_)), "{:?}", err);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_run_echo() {
    let server = TestSshServer::start().await;
    let session = server.connect().await;

    for word in ["hello", "deployfast", "42"] {
        let output = session.run(&format!("echo {}", word)).await.unwrap();
        assert!(output.combined_output().contains(word));
        assert_eq!(output.exit_code, Some(0));
    }

    session.close().await;
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_run_non_zero_exit_is_exec_error() {
    let server = TestSshServer::start().await;
    let session = server.connect().await;

    let err = session.run("echo oops >&2; exit 3").await.unwrap_err();
    match err {
        DeployError::Exec {
            exit_code, output, ..
        } => {
            assert_eq!(exit_code, Some(3));
            assert!(output.contains("oops"));
        }
        other => panic!("expected exec error, got {:?}", other),
    }

    session.close().await;
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_transfer_overwrites_remote_file() {
    let server = TestSshServer::start().await;
    let session = server.connect().await;
    let dir = tempfile::tempdir().unwrap();

    let long = write_script(
        dir.path(),
        "long.txt",
        "a fairly long first version\nwith two lines\n",
    );
    let short = write_script(dir.path(), "short.txt", "short\n");

    for local in [&long, &short, &short] {
        let bytes = session.transfer(local, "/tmp/overwrite.txt").await.unwrap();
        let expected = std::fs::read_to_string(local).unwrap();
        assert_eq!(bytes, expected.len() as u64);

        let remote = session.run("cat /tmp/overwrite.txt").await.unwrap();
        assert_eq!(remote.stdout(), expected);
    }

    session.close().await;
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_transfer_missing_local_file() {
    let server = TestSshServer::start().await;
    let session = server.connect().await;

    let err = session
        .transfer(std::path::Path::new("/definitely/not/here.sh"), "/tmp/here.sh")
        .await
        .unwrap_err();
    assert!(matches!(err, DeployError::Io(_)), "{:?}", err);

    session.close().await;
}
