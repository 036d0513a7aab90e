// exec.rs - Shell Command Module
// Runs the arguments as one `sh -c` invocation and posts the captured stdout.
// Only members holding a role with the administrator permission may use it.
//
// Used by: commands/mod.rs (registration)

use async_trait::async_trait;
use log::{info, warn};
use tokio::process::Command;

use crate::context::{CommandContext, CommandOutput, CommandResult};
use crate::error::CommandError;
use crate::registry::CommandHandler;

/// Room left for the code fence inside Discord's 2000 character limit
const MAX_OUTPUT_CHARS: usize = 1900;

pub struct Exec;

#[async_trait]
impl CommandHandler for Exec {
    async fn run(&self, args: &[String], ctx: &dyn CommandContext) -> CommandResult {
        if !ctx.author_is_admin().await? {
            warn!(
                "[EXEC] Refused shell access to {} ({})",
                ctx.author().username,
                ctx.author().id
            );
            return Err(CommandError::PermissionDenied);
        }

        let command_line = args.join(" ");
        if command_line.trim().is_empty() {
            return Err(CommandError::InvalidArgs("No command specified.".to_string()));
        }

        info!("[EXEC] {} ({}) running: {}", ctx.author().username, ctx.author().id, command_line);
        let stdout = run_shell(&command_line).await?;
        Ok(CommandOutput::text(code_block(&stdout)))
    }
}

/// Run through `sh -c`, returning stdout. A non-zero exit becomes an error carrying stderr.
pub async fn run_shell(command_line: &str) -> Result<String, CommandError> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(command_line)
        .output()
        .await
        .map_err(|e| CommandError::Execution(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let detail = if stderr.is_empty() {
            output.status.to_string()
        } else {
            truncate(&stderr, MAX_OUTPUT_CHARS)
        };
        return Err(CommandError::Execution(detail));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

/// Wrap output in a fixed-width block, keeping it inside one message
pub fn code_block(text: &str) -> String {
    // A stray fence in the output would close the block early
    let text = text.replace("```", "`\u{200b}``");
    format!("```\n{}\n```", truncate(&text, MAX_OUTPUT_CHARS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::FakeContext;
    use crate::error::ErrorKind;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_refuses_non_admins() {
        let ctx = FakeContext::new();
        let err = Exec.run(&args(&["echo", "hi"]), &ctx).await.unwrap_err();
        assert!(matches!(err, CommandError::PermissionDenied));
    }

    #[tokio::test]
    async fn test_runs_for_admins() {
        let mut ctx = FakeContext::new();
        ctx.admin = true;
        let out = Exec.run(&args(&["echo", "hello", "world"]), &ctx).await.unwrap();
        assert_eq!(out.text, "```\nhello world\n\n```");
    }

    #[tokio::test]
    async fn test_failing_command_is_an_error() {
        let mut ctx = FakeContext::new();
        ctx.admin = true;
        let err = Exec.run(&args(&["echo oops 1>&2;", "exit", "3"]), &ctx).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
        assert!(err.to_string().contains("oops"));
    }

    #[tokio::test]
    async fn test_empty_command() {
        let mut ctx = FakeContext::new();
        ctx.admin = true;
        let err = Exec.run(&[], &ctx).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn test_code_block_truncates() {
        let long = "x".repeat(5000);
        let block = code_block(&long);
        assert!(block.chars().count() < 2000);
        assert!(block.starts_with("```\n") && block.ends_with("\n```"));
    }
}
