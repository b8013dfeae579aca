use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use std::time::Duration;

const ETXTBSY: i32 = 26;

/// Write an executable stand-in for the external tool. `$last` holds the final argument
/// (the output path) when `body` runs.
pub(crate) fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    let script = format!(
        "#!/bin/sh\n[ -n \"$FAKE_TOOL_PROBE\" ] && exit 0\nfor last; do :; done\n{body}\n"
    );
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

    // another test thread may still hold the write fd across a fork; wait it out
    for _ in 0..100 {
        match Command::new(&path).env("FAKE_TOOL_PROBE", "1").status() {
            Err(e) if e.raw_os_error() == Some(ETXTBSY) => thread::sleep(Duration::from_millis(10)),
            _ => break,
        }
    }
    path
}
