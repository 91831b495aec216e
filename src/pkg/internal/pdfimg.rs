use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::conf::settings;
use crate::prelude::{Error, Result};

/// Renders resume previews by shelling out to poppler's pdftoppm. The
/// binary path and timeout come from settings so deployments can point at
/// a pinned poppler install.
#[derive(Debug, Clone)]
pub struct PdfImageRenderer {
    pub pdftoppm_path: String,
    pub timeout: Duration,
}

fn page_args() -> [&'static str; 8] {
    ["-png", "-f", "1", "-l", "1", "-r", "150", "-singlefile"]
}

impl PdfImageRenderer {
    pub fn from_settings() -> Self {
        PdfImageRenderer {
            pdftoppm_path: settings.pdftoppm_path.clone(),
            timeout: Duration::from_secs(settings.pdftoppm_timeout_secs),
        }
    }

    /// Renders page one of the PDF to a PNG and returns the image bytes.
    pub async fn render_first_page(&self, pdf_bytes: &[u8]) -> Result<Vec<u8>> {
        let temp_dir = tempfile::Builder::new()
            .prefix("resumind-pdf-")
            .tempdir()?;

        let input_path: PathBuf = temp_dir.path().join("resume.pdf");
        let output_prefix: PathBuf = temp_dir.path().join("preview");
        tokio::fs::write(&input_path, pdf_bytes).await?;

        let mut command = Command::new(&self.pdftoppm_path);
        command
            .args(page_args())
            .arg(&input_path)
            .arg(&output_prefix)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match timeout(self.timeout, command.output()).await {
            Ok(result) => result.map_err(|e| {
                tracing::warn!("failed to run pdftoppm: {e}");
                Error::Pdf("Failed to convert PDF to image".into())
            })?,
            Err(_) => {
                tracing::warn!("pdftoppm timed out after {:?}", self.timeout);
                return Err(Error::Pdf("Failed to convert PDF to image".into()));
            }
        };

        if !output.status.success() {
            tracing::warn!(
                "pdftoppm exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            );
            return Err(Error::Pdf("Failed to convert PDF to image".into()));
        }

        let rendered = output_prefix.with_extension("png");
        let png = tokio::fs::read(&rendered).await.map_err(|e| {
            tracing::warn!("pdftoppm produced no output file: {e}");
            Error::Pdf("Failed to convert PDF to image".into())
        })?;
        Ok(png)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_only_the_first_page_as_png() {
        let args = page_args();
        assert!(args.contains(&"-png"));
        assert!(args.contains(&"-singlefile"));
        let first = args.iter().position(|a| *a == "-f").unwrap();
        let last = args.iter().position(|a| *a == "-l").unwrap();
        assert_eq!(args[first + 1], "1");
        assert_eq!(args[last + 1], "1");
    }

    #[test]
    fn test_singlefile_output_name() {
        let prefix = PathBuf::from("/tmp/work/preview");
        assert_eq!(
            prefix.with_extension("png"),
            PathBuf::from("/tmp/work/preview.png")
        );
    }

    #[tokio::test]
    async fn test_missing_binary_maps_to_conversion_error() {
        let renderer = PdfImageRenderer {
            pdftoppm_path: "/nonexistent/pdftoppm".into(),
            timeout: Duration::from_secs(5),
        };
        let err = renderer.render_first_page(b"%PDF-1.4").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to convert PDF to image");
    }
}
