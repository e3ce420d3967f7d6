//! External OCR invocation.
//!
//! The OCR tool is an opaque executable called as
//! `<tool> <input_path> <output_dir> --method <id>`. Whatever it writes into
//! `output_dir` is accepted as-is; this module only launches it, waits, and
//! turns the exit status into a `Result`.
//!
//! Runs are never retried. Removing the output directory afterwards is the
//! job of [`crate::pipeline::input::OcrWorkspace`], not this module.

use crate::config::PipelineConfig;
use crate::error::DocQaError;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Captured streams of a successful OCR run.
#[derive(Debug, Clone, Default)]
pub struct OcrOutcome {
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

/// Run the OCR tool on `input_path`, writing artefacts into `output_dir`.
///
/// Blocks (asynchronously) until the process exits. Standard output and
/// standard error are drained concurrently, so a chatty tool can never fill a
/// pipe and stall.
///
/// # Errors
/// - [`DocQaError::OcrToolUnavailable`] — the executable could not be spawned
/// - [`DocQaError::OcrToolError`] — non-zero exit; `detail` is stderr verbatim
///   (stdout when stderr is empty)
pub async fn run_ocr(
    input_path: &Path,
    output_dir: &Path,
    config: &PipelineConfig,
) -> Result<OcrOutcome, DocQaError> {
    let start = Instant::now();

    let mut cmd = Command::new(&config.ocr_tool);
    cmd.arg(input_path)
        .arg(output_dir)
        .arg("--method")
        .arg(&config.ocr_method)
        .envs(config.ocr_env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    info!(
        "Running OCR: {} {} {} --method {}",
        config.ocr_tool,
        input_path.display(),
        output_dir.display(),
        config.ocr_method
    );

    let output = cmd
        .output()
        .await
        .map_err(|e| DocQaError::OcrToolUnavailable {
            tool: config.ocr_tool.clone(),
            reason: e.to_string(),
        })?;

    let duration_ms = start.elapsed().as_millis() as u64;
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        let code = output.status.code();
        warn!("OCR tool exited with {:?} after {}ms", code, duration_ms);
        let detail = if stderr.is_empty() { stdout } else { stderr };
        return Err(DocQaError::OcrToolError { code, detail });
    }

    debug!(
        "OCR finished in {}ms ({} bytes stdout, {} bytes stderr)",
        duration_ms,
        stdout.len(),
        stderr.len()
    );

    Ok(OcrOutcome {
        stdout,
        stderr,
        duration_ms,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn script(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn config_for(tool: String) -> PipelineConfig {
        PipelineConfig::builder().ocr_tool(tool).build().unwrap()
    }

    #[tokio::test]
    async fn passes_arguments_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();
        let tool = script(
            dir.path(),
            "ocr.sh",
            r#"printf '%s\n' "$1" "$2" "$3" "$4" "$OMP_NUM_THREADS" > "$2/args.txt""#,
        );
        let input = dir.path().join("input.pdf");
        std::fs::write(&input, b"%PDF").unwrap();

        run_ocr(&input, &out, &config_for(tool)).await.unwrap();

        let args = std::fs::read_to_string(out.join("args.txt")).unwrap();
        let lines: Vec<&str> = args.lines().collect();
        assert_eq!(lines[0], input.to_string_lossy());
        assert_eq!(lines[1], out.to_string_lossy());
        assert_eq!(lines[2], "--method");
        assert_eq!(lines[3], "hf");
        assert_eq!(lines[4], "1");
    }

    #[tokio::test]
    async fn non_zero_exit_carries_stderr_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(dir.path(), "fail.sh", "printf 'bad input' >&2\nexit 2");

        let err = run_ocr(dir.path(), dir.path(), &config_for(tool))
            .await
            .unwrap_err();
        match err {
            DocQaError::OcrToolError { code, detail } => {
                assert_eq!(code, Some(2));
                assert_eq!(detail, "bad input");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_stderr_falls_back_to_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(dir.path(), "fail.sh", "printf 'model download failed'\nexit 1");

        let err = run_ocr(dir.path(), dir.path(), &config_for(tool))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DocQaError::OcrToolError { ref detail, .. } if detail == "model download failed"
        ));
    }

    #[tokio::test]
    async fn missing_executable_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for("/definitely/not/an/ocr-tool".into());
        let err = run_ocr(dir.path(), dir.path(), &config).await.unwrap_err();
        assert!(matches!(err, DocQaError::OcrToolUnavailable { .. }));
    }

    #[tokio::test]
    async fn success_captures_streams() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(dir.path(), "ok.sh", "echo processing\necho warn >&2");
        let outcome = run_ocr(dir.path(), dir.path(), &config_for(tool))
            .await
            .unwrap();
        assert_eq!(outcome.stdout, "processing\n");
        assert_eq!(outcome.stderr, "warn\n");
    }
}
