use log::debug;
use serde::Deserialize;
use tokio::process::Command;

use crate::error::{Error, Result};

const SERVICE: &str = "transcript script";

#[derive(Debug, Deserialize)]
struct ScriptOutput {
    transcript: Option<String>,
    error: Option<String>,
}

/// Run an external transcript helper with the video id as its last argument.
///
/// The helper prints `{"transcript": "..."}` on success or `{"error": "..."}`.
pub async fn fetch(command: &[String], video_id: &str) -> Result<String> {
    let (program, args) = command
        .split_first()
        .ok_or(Error::MissingConfig("transcript script command"))?;

    debug!("Running transcript script: {program} {args:?} {video_id}");

    let output = match Command::new(program).args(args).arg(video_id).output().await {
        Ok(output) => output,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::upstream(SERVICE, format!("{program} not found")));
        }
        Err(e) => return Err(e.into()),
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: Option<ScriptOutput> = serde_json::from_str(stdout.trim()).ok();

    match parsed {
        Some(ScriptOutput {
            transcript: Some(text), ..
        }) if output.status.success() && !text.trim().is_empty() => Ok(text),
        Some(ScriptOutput { error: Some(msg), .. }) => Err(Error::upstream(SERVICE, msg)),
        _ if !output.status.success() => Err(Error::upstream(SERVICE, format!("exited with {}", output.status))),
        _ => Err(Error::upstream(SERVICE, "no transcript in script output")),
    }
}
