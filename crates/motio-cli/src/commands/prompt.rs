use std::path::{Path, PathBuf};

use anyhow::Result;
use motio_application::Flow;
use motio_core::prompt::{DataUri, PromptRequest};
use motio_core::{MotioError, Notification};

use super::{login_required, signed_in_store};
use crate::bootstrap::AppBootstrap;
use crate::output::Outcome;

const DEFAULT_FILE_STEM: &str = "animation";

pub async fn improve(app: &AppBootstrap, prompt: String) -> Result<Outcome> {
    if signed_in_store(app).await?.is_none() {
        return Ok(login_required());
    }
    let workflow = app.prompt_workflow().await?;

    Ok(
        match workflow.improve_prompt(&PromptRequest::new(prompt)).await {
            Ok(output) => Outcome::from(Flow::Improve.success()).with_detail(output.improved_prompt),
            Err(e) => Flow::Improve.failure(&e).into(),
        },
    )
}

pub async fn animate(app: &AppBootstrap, prompt: String, out: Option<&Path>) -> Result<Outcome> {
    if signed_in_store(app).await?.is_none() {
        return Ok(login_required());
    }
    let workflow = app.prompt_workflow().await?;

    let output = match workflow
        .generate_animation(&PromptRequest::new(prompt))
        .await
    {
        Ok(output) => output,
        Err(e) => return Ok(Flow::Generate.failure(&e).into()),
    };

    let Some(out) = out else {
        return Ok(Outcome::from(Flow::Generate.success()).with_detail(output.animation_data_uri));
    };

    match save_animation(&output.animation_data_uri, out).await {
        Ok(path) => Ok(Outcome::from(Flow::Generate.success())
            .with_detail(format!("Saved to {}", path.display()))),
        Err(e) => Ok(Notification::failure("Error", &e, "Failed to save animation.").into()),
    }
}

async fn save_animation(data_uri: &str, out: &Path) -> motio_core::Result<PathBuf> {
    let uri = DataUri::parse(data_uri)?;
    let bytes = uri.decode();
    let path = output_path(out, uri.mime_type());

    tokio::fs::write(&path, &bytes).await.map_err(MotioError::from)?;
    tracing::info!("[CLI] Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(path)
}

/// `out` itself, or `out/animation.<ext>` when `out` is a directory.
fn output_path(out: &Path, mime_type: &str) -> PathBuf {
    if !out.is_dir() {
        return out.to_path_buf();
    }
    let extension = mime_guess::get_mime_extensions_str(mime_type)
        .and_then(|extensions| extensions.first())
        .copied()
        .unwrap_or("bin");
    out.join(format!("{DEFAULT_FILE_STEM}.{extension}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_for_file_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("clip.mp4");
        assert_eq!(output_path(&file, "image/gif"), file);
    }

    #[test]
    fn test_output_path_in_directory_uses_mime_extension() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            output_path(dir.path(), "image/gif"),
            dir.path().join("animation.gif")
        );
        assert_eq!(
            output_path(dir.path(), "application/x-motio-unknown"),
            dir.path().join("animation.bin")
        );
    }

    #[tokio::test]
    async fn test_save_animation_writes_decoded_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_animation("data:image/gif;base64,R0lGODlh", dir.path())
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("animation.gif"));
        assert_eq!(std::fs::read(path).unwrap(), b"GIF89a");
    }

    #[tokio::test]
    async fn test_save_animation_rejects_bad_uri() {
        let dir = tempfile::tempdir().unwrap();
        let err = save_animation("not a data uri", dir.path()).await.unwrap_err();
        assert!(err.is_validation());
    }
}
