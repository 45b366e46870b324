use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::channel::DirectoryEntry;

use super::{ClientError, ExternalDirectoryClient, ResolveMode, parse_locator};

/**
    Runs the external resolver as a subprocess.

    - bulk listing: `<program> [args..] --dump-channels`, JSON array on stdout
    - single resolve: `<program> [args..] <name> [--original-link]`

    The child is killed if the timeout elapses first.
*/
#[derive(Debug, Clone)]
pub struct ProcessDirectoryClient {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessDirectoryClient {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    async fn run(&self, extra: &[&str], timeout: Duration) -> Result<String, ClientError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .args(extra)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(timeout, command.output())
            .await
            .map_err(|_| ClientError::Timeout(timeout))?
            .map_err(ClientError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(
                program = ?self.program,
                stderr = %stderr.trim(),
                "resolver exited unsuccessfully"
            );
            return Err(ClientError::NonZeroExit(output.status.code().unwrap_or(-1)));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl ExternalDirectoryClient for ProcessDirectoryClient {
    async fn bulk_list(&self, timeout: Duration) -> Result<Vec<DirectoryEntry>, ClientError> {
        let stdout = self.run(&["--dump-channels"], timeout).await?;
        if stdout.trim().is_empty() {
            return Err(ClientError::EmptyOutput);
        }
        Ok(serde_json::from_str(&stdout)?)
    }

    async fn resolve_one(
        &self,
        name: &str,
        mode: ResolveMode,
        timeout: Duration,
    ) -> Result<String, ClientError> {
        let stdout = match mode {
            ResolveMode::Resolved => self.run(&[name], timeout).await?,
            ResolveMode::Original => self.run(&[name, "--original-link"], timeout).await?,
        };
        parse_locator(&stdout)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str) -> ProcessDirectoryClient {
        ProcessDirectoryClient::new("sh", vec!["-c".to_string(), script.to_string(), "sh".to_string()])
    }

    #[tokio::test]
    async fn test_bulk_list_parses_json() {
        let client = shell(
            r#"[ "$1" = "--dump-channels" ] && echo '[{"name":"Rai 1","url":"https://dir/rai1"},{"name":"Sky Uno","url":"https://dir/uno","aliases":["SKY UNO HD"]}]'"#,
        );
        let entries = client.bulk_list(Duration::from_secs(5)).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].aliases, vec!["SKY UNO HD".to_string()]);
    }

    #[tokio::test]
    async fn test_resolve_original_passes_flag() {
        let client = shell(r#"[ "$2" = "--original-link" ] && echo "https://orig/$1""#);
        let locator = client
            .resolve_one("rai1", ResolveMode::Original, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(locator, "https://orig/rai1");
    }

    #[tokio::test]
    async fn test_failures_are_errors() {
        let failing = shell("exit 3");
        assert!(matches!(
            failing
                .resolve_one("x", ResolveMode::Resolved, Duration::from_secs(5))
                .await,
            Err(ClientError::NonZeroExit(3))
        ));

        let silent = shell("true");
        assert!(matches!(
            silent
                .resolve_one("x", ResolveMode::Resolved, Duration::from_secs(5))
                .await,
            Err(ClientError::EmptyOutput)
        ));

        let garbage = shell("echo not-json");
        assert!(matches!(
            garbage.bulk_list(Duration::from_secs(5)).await,
            Err(ClientError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_timeout() {
        let slow = shell("sleep 5");
        let result = slow
            .resolve_one("x", ResolveMode::Resolved, Duration::from_millis(100))
            .await;
        assert!(matches!(result, Err(ClientError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let client = ProcessDirectoryClient::new("/nonexistent/resolver", Vec::new());
        assert!(matches!(
            client.bulk_list(Duration::from_secs(1)).await,
            Err(ClientError::Spawn(_))
        ));
    }
}
