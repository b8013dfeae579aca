use std::borrow::Cow;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::metadata::MetadataRecord;

pub const DEFAULT_TOOL: &str = "ffmpeg";

/// Containers whose muxer needs `use_metadata_tags` to keep arbitrary keys.
const MP4_FAMILY: &[&str] = &["m4a", "mp4", "mov"];

/// A fully built external-tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    /// Render as a single POSIX shell line, quoting where needed.
    pub fn to_shell_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|arg| shell_quote(&arg.to_string_lossy()).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn shell_quote(arg: &str) -> Cow<'_, str> {
    let safe = !arg.is_empty()
        && arg
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"@%+=:,./-_".contains(&b));
    if safe {
        Cow::Borrowed(arg)
    } else {
        Cow::Owned(format!("'{}'", arg.replace('\'', r"'\''")))
    }
}

/// `outdir/<stem><suffix>.<ext>` for an input file.
pub fn output_path(input: &Path, outdir: &Path, suffix: &str) -> PathBuf {
    let mut name = input.file_stem().unwrap_or_default().to_os_string();
    name.push(suffix);
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }
    outdir.join(name)
}

fn is_mp4_family(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| MP4_FAMILY.iter().any(|m| e.eq_ignore_ascii_case(m)))
}

/// Build the stream-copy tagging command for one pairing. Pure: same inputs, same command.
pub fn build_command(
    program: &Path,
    input: &Path,
    record: &MetadataRecord,
    artwork: Option<&Path>,
    output: &Path,
    overwrite: bool,
) -> Invocation {
    let mut args: Vec<OsString> = vec![
        "-hide_banner".into(),
        if overwrite { "-y" } else { "-n" }.into(),
        "-i".into(),
        input.into(),
    ];

    match artwork {
        Some(art) => {
            args.push("-i".into());
            args.push(art.into());
            // audio from the source, picture from the artwork input
            args.extend(
                ["-map", "0:a", "-map", "1", "-c", "copy", "-disposition:v:0", "attached_pic"]
                    .map(OsString::from),
            );
        }
        None => args.extend(["-map", "0:a", "-c", "copy"].map(OsString::from)),
    }

    // keep existing tags, override only the ones we set
    args.extend(["-map_metadata", "0"].map(OsString::from));

    for (key, value) in record.tags() {
        args.push("-metadata".into());
        args.push(format!("{key}={value}").into());
    }

    if is_mp4_family(output) {
        args.extend(["-movflags", "use_metadata_tags"].map(OsString::from));
    }

    args.push(output.into());

    Invocation {
        program: program.to_path_buf(),
        args,
    }
}
