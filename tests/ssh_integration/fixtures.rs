//! Container-backed SSH test server

use std::path::Path;
use std::time::Duration;

use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use tokio::time::sleep;

use deployfast::ssh::{HostKeyPolicy, Session, SshConfig, StaticCredential};

pub const USERNAME: &str = "deploy";
pub const PASSWORD: &str = "deploypass123";

/// Port sshd listens on inside the linuxserver image
const SSHD_PORT: u16 = 2222;

/// A running OpenSSH server; the container stops when this is dropped
pub struct TestSshServer {
    _container: ContainerAsync<GenericImage>,
    pub host: String,
    pub port: u16,
}

impl TestSshServer {
    pub async fn start() -> Self {
        let container = GenericImage::new("lscr.io/linuxserver/openssh-server", "latest")
            .with_exposed_port(SSHD_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stdout("done."))
            .with_env_var("PASSWORD_ACCESS", "true")
            .with_env_var("USER_NAME", USERNAME)
            .with_env_var("USER_PASSWORD", PASSWORD)
            .start()
            .await
            .expect("Failed to start SSH container");

        let host = container
            .get_host()
            .await
            .expect("container host")
            .to_string();
        let port = container
            .get_host_port_ipv4(SSHD_PORT.tcp())
            .await
            .expect("mapped SSH port");

        Self {
            _container: container,
            host,
            port,
        }
    }

    pub fn ssh_config(&self) -> SshConfig {
        SshConfig::new(&self.host, USERNAME)
            .with_port(self.port)
            .with_host_key_policy(HostKeyPolicy::Insecure)
    }

    /// Connect, retrying while sshd finishes starting
    pub async fn connect(&self) -> Session {
        let credentials = StaticCredential::new(PASSWORD);
        let mut last_error = None;
        for _ in 0..20 {
            match Session::connect(self.ssh_config(), &credentials).await {
                Ok(session) => return session,
                Err(e) => {
                    last_error = Some(e);
                    sleep(Duration::from_millis(500)).await;
                }
            }
        }
        panic!("SSH server never became ready: {:?}", last_error);
    }
}

/// Write an executable-to-be script into `dir`
pub fn write_script(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).expect("write script");
    path
}
