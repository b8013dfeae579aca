use std::fs;
use std::io::Read;
use std::path::Path;
use std::process::Stdio;
use std::thread;
use std::time::Duration;

use crate::cancel::CancellationToken;
use crate::command::Invocation;
use crate::error::PairingError;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run one invocation to completion.
///
/// Refuses to start when `output` exists and `overwrite` is off. Succeeds only on exit
/// code 0 with `output` present afterwards. A cancelled token kills the running child.
/// A partial `output` left by a failed or interrupted run is removed unless it was
/// there before the tool started.
pub fn execute(
    invocation: &Invocation,
    output: &Path,
    overwrite: bool,
    cancel: Option<&CancellationToken>,
) -> Result<(), PairingError> {
    let cancelled = || cancel.map_or(false, |t| t.is_cancelled());

    let preexisting = output.exists();
    if !overwrite && preexisting {
        return Err(PairingError::OutputExists(output.to_path_buf()));
    }
    if cancelled() {
        return Err(PairingError::Interrupted);
    }

    let mut child = invocation
        .to_command()
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| PairingError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

    // drain stderr so a chatty tool cannot block on a full pipe
    let stderr = child.stderr.take();
    let reader = thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = stderr {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    });

    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if cancelled() {
            let _ = child.kill();
            let _ = child.wait();
            discard_partial(output, preexisting);
            return Err(PairingError::Interrupted);
        }
        thread::sleep(POLL_INTERVAL);
    };
    let stderr = reader.join().unwrap_or_default();

    if !status.success() {
        discard_partial(output, preexisting);
        // the terminal's SIGINT reaches the child too and may beat our poll
        if cancelled() {
            return Err(PairingError::Interrupted);
        }
        return Err(PairingError::ExternalToolFailure { status, stderr });
    }
    if !output.exists() {
        return Err(PairingError::OutputMissing(output.to_path_buf()));
    }
    Ok(())
}

fn discard_partial(output: &Path, preexisting: bool) {
    if preexisting || !output.exists() {
        return;
    }
    match fs::remove_file(output) {
        Ok(()) => tracing::debug!("Removed partial output {}", output.display()),
        Err(e) => tracing::warn!("Could not remove partial output {}: {}", output.display(), e),
    }
}
