//! Command execution and file access on the device, local or over SSH.
//!
//! Both variants implement the same blocking [`Transport`] trait so the
//! orchestrator never branches on where it is running. Long-running calls are
//! moved onto the blocking pool by the caller.

use crate::error::SlateError;
use serde::{Deserialize, Serialize};
use ssh2::Session;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;
use tracing::debug;

/// Fixed search path for device-side commands, regardless of the invoking
/// shell's environment.
pub const FIXED_PATH: &str = "/bin:/usr/bin:/sbin";

const SSH_USER: &str = "root";
const SSH_PORT: u16 = 22;

/// Captured result of one command execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmdOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CmdOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Uniform command-execution and file-access surface.
///
/// `run` blocks until the command exits (for the remote variant, on the
/// remote exit status, not the request dispatch). File access has
/// whole-document semantics; patch-then-rewrite is the caller's concern.
pub trait Transport: Send + Sync {
    fn run(&self, command: &str) -> Result<CmdOutput, SlateError>;
    fn read_file(&self, path: &str) -> Result<Vec<u8>, SlateError>;
    fn write_file(&self, path: &str, contents: &[u8]) -> Result<(), SlateError>;
}

/// Direct execution on the machine the tool runs on.
#[derive(Debug, Default)]
pub struct LocalTransport;

impl LocalTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for LocalTransport {
    fn run(&self, command: &str) -> Result<CmdOutput, SlateError> {
        debug!(%command, "local exec");
        let output = Command::new("/bin/sh")
            .arg("-c")
            .arg(command)
            .env_clear()
            .env("PATH", FIXED_PATH)
            .output()
            .map_err(|err| SlateError::Transport(format!("spawn '{}': {}", command, err)))?;

        Ok(CmdOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>, SlateError> {
        Ok(std::fs::read(path)?)
    }

    fn write_file(&self, path: &str, contents: &[u8]) -> Result<(), SlateError> {
        Ok(std::fs::write(path, contents)?)
    }
}

/// How to authenticate the SSH session.
#[derive(Debug, Clone)]
pub enum Credential {
    KeyFile(PathBuf),
    Password(String),
}

impl Credential {
    /// Interpret an operator-supplied string: an existing file is a key
    /// path, anything else a password.
    pub fn infer(raw: &str) -> Self {
        let path = Path::new(raw);
        if path.is_file() {
            Self::KeyFile(path.to_path_buf())
        } else {
            Self::Password(raw.to_string())
        }
    }
}

/// Execution on the tablet over an authenticated SSH session. Exec goes over
/// a channel per command, file access over SFTP. The session is owned by one
/// workflow invocation.
pub struct RemoteTransport {
    host: String,
    session: Mutex<Session>,
}

impl RemoteTransport {
    /// Connect and authenticate as root. Authentication rejection maps to
    /// [`SlateError::Authentication`] so callers can retry with another
    /// credential; everything else is terminal.
    pub fn connect(host: &str, credential: &Credential) -> Result<Self, SlateError> {
        debug!(%host, "opening ssh session");
        let tcp = TcpStream::connect((host, SSH_PORT)).map_err(|err| {
            SlateError::UnreachableNetwork(format!("{}:{}: {}", host, SSH_PORT, err))
        })?;

        let mut session = Session::new()?;
        session.set_tcp_stream(tcp);
        session.handshake()?;

        let auth = match credential {
            Credential::KeyFile(path) => {
                debug!(key = %path.display(), "authenticating with key file");
                session.userauth_pubkey_file(SSH_USER, None, path, None)
            }
            Credential::Password(password) => {
                debug!("authenticating with password");
                session.userauth_password(SSH_USER, password)
            }
        };

        if auth.is_err() || !session.authenticated() {
            return Err(SlateError::Authentication {
                host: host.to_string(),
            });
        }

        Ok(Self {
            host: host.to_string(),
            session: Mutex::new(session),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn session(&self) -> Result<std::sync::MutexGuard<'_, Session>, SlateError> {
        self.session
            .lock()
            .map_err(|_| SlateError::Transport("ssh session lock poisoned".to_string()))
    }
}

impl Transport for RemoteTransport {
    fn run(&self, command: &str) -> Result<CmdOutput, SlateError> {
        debug!(host = %self.host, %command, "remote exec");
        let session = self.session()?;
        let mut channel = session.channel_session()?;
        channel.exec(command)?;

        let mut stdout = String::new();
        channel.read_to_string(&mut stdout)?;
        let mut stderr = String::new();
        channel.stderr().read_to_string(&mut stderr)?;

        channel.wait_close()?;
        let exit_code = channel.exit_status()?;

        Ok(CmdOutput {
            exit_code,
            stdout,
            stderr,
        })
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>, SlateError> {
        let session = self.session()?;
        let sftp = session.sftp()?;
        let mut file = sftp.open(Path::new(path))?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        Ok(contents)
    }

    fn write_file(&self, path: &str, contents: &[u8]) -> Result<(), SlateError> {
        let session = self.session()?;
        let sftp = session.sftp()?;
        let mut file = sftp.create(Path::new(path))?;
        file.write_all(contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_run_captures_exit_and_output() {
        let transport = LocalTransport::new();
        let out = transport.run("echo hello && echo oops >&2").unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[test]
    fn local_run_reports_nonzero_exit() {
        let transport = LocalTransport::new();
        let out = transport.run("exit 3").unwrap();
        assert!(!out.success());
        assert_eq!(out.exit_code, 3);
    }

    #[test]
    fn local_run_uses_fixed_path() {
        let transport = LocalTransport::new();
        let out = transport.run("printf %s \"$PATH\"").unwrap();
        assert_eq!(out.stdout, FIXED_PATH);
    }

    #[test]
    fn local_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("update.conf");
        let path = path.to_str().unwrap();

        let transport = LocalTransport::new();
        transport.write_file(path, b"[General]\n").unwrap();
        assert_eq!(transport.read_file(path).unwrap(), b"[General]\n");
    }

    #[test]
    fn credential_inference_prefers_key_files() {
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().join("id_rsa");
        std::fs::write(&key, b"key material").unwrap();

        match Credential::infer(key.to_str().unwrap()) {
            Credential::KeyFile(path) => assert_eq!(path, key),
            other => panic!("expected key file, got {other:?}"),
        }
        assert!(matches!(
            Credential::infer("hunter2"),
            Credential::Password(_)
        ));
    }
}
