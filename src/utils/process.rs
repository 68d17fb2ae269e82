//! External tool invocation.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::debug;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Resolves `binary` to an existing path.
///
/// A value that already points at a file is used as-is; otherwise each
/// directory on `PATH` is searched.
pub fn resolve_binary(binary: &str) -> Option<PathBuf> {
    let direct = Path::new(binary);
    if direct.is_file() {
        return Some(direct.to_path_buf());
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}

/// Runs `binary` with `args`, writing `input` to its stdin.
///
/// Returns the trimmed stdout. `tool` names the program in error messages.
/// The child is killed if it outlives `timeout`.
///
/// # Errors
///
/// Fails when the process cannot be spawned, times out, exits non-zero
/// (stderr, else stdout, is included in the message) or prints nothing.
pub async fn run_with_input(
    tool: &str,
    binary: &Path,
    args: &[String],
    input: &str,
    timeout: Duration,
) -> Result<String> {
    debug!("Running {} {:?} with {} input bytes", binary.display(), args, input.len());
    let mut child = Command::new(binary)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("{tool} binary could not be executed"))?;

    let stdin = child.stdin.take();
    let payload = input.as_bytes().to_vec();
    let writer = async move {
        if let Some(mut stdin) = stdin {
            // The child may exit without reading its input.
            if let Err(e) = stdin.write_all(&payload).await {
                debug!("Failed to write {} stdin: {}", binary.display(), e);
            }
        }
    };

    let output = match tokio::time::timeout(timeout, async {
        let (_, output) = tokio::join!(writer, child.wait_with_output());
        output
    })
    .await
    {
        Ok(output) => output.with_context(|| format!("{tool} binary could not be executed"))?,
        Err(_) => bail!("{tool} timed out after {}s", timeout.as_secs()),
    };

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let details = [stderr, stdout]
            .into_iter()
            .find(|text| !text.is_empty())
            .unwrap_or_else(|| "no additional output".to_string());
        let code = output
            .status
            .code()
            .map_or_else(|| "signal".to_string(), |code| code.to_string());
        bail!("{tool} exited with code {code}: {details}");
    }
    if stdout.is_empty() {
        bail!("{tool} returned empty output");
    }
    Ok(stdout)
}
