// sun.rs - Static Image Command
// Uploads <ASSETS_DIR>/sun.png as an attachment.

use async_trait::async_trait;
use log::warn;

use crate::context::{CommandContext, CommandOutput, CommandResult};
use crate::error::CommandError;
use crate::registry::CommandHandler;

pub const SUN_FILE: &str = "sun.png";

pub struct Sun;

#[async_trait]
impl CommandHandler for Sun {
    async fn run(&self, _args: &[String], ctx: &dyn CommandContext) -> CommandResult {
        let path = ctx.config().assets_dir.join(SUN_FILE);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(CommandOutput::file(SUN_FILE, data)),
            Err(e) => {
                warn!("[SUN] Failed to read {}: {}", path.display(), e);
                Err(CommandError::MissingFile(SUN_FILE.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::FakeContext;
    use std::path::PathBuf;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sunbot_{}_{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_uploads_file() {
        let dir = temp_dir("present");
        std::fs::write(dir.join(SUN_FILE), b"\x89PNG").unwrap();

        let mut ctx = FakeContext::new();
        ctx.config.assets_dir = dir.clone();
        let out = Sun.run(&[], &ctx).await.unwrap();

        assert!(out.text.is_empty());
        let attachment = out.attachment.unwrap();
        assert_eq!(attachment.filename, SUN_FILE);
        assert_eq!(attachment.data, b"\x89PNG");

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = temp_dir("missing");
        let mut ctx = FakeContext::new();
        ctx.config.assets_dir = dir.clone();
        let err = Sun.run(&[], &ctx).await.unwrap_err();
        assert!(matches!(err, CommandError::MissingFile(_)));

        std::fs::remove_dir_all(dir).ok();
    }
}
