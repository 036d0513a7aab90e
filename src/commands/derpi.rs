// derpi.rs - Derpibooru Search Command Module
// Searches Derpibooru for the given tags and posts one matching image at random.
//
// Key Features:
// - Requires at least one tag; nothing is sent to the network otherwise
// - Adds the "safe" tag unless the channel is marked NSFW
// - Uniform random pick among the results
//
// Used by: commands/mod.rs (registration)

use async_trait::async_trait;
use log::{debug, warn};
use rand::seq::SliceRandom;

use crate::context::{CommandContext, CommandOutput, CommandResult};
use crate::error::CommandError;
use crate::registry::CommandHandler;

pub const NO_TAGS: &str = "No tags specified.";
const SAFETY_TAG: &str = "safe";

pub struct Derpi;

/// Tag query for the given arguments; outside NSFW channels the safety tag is appended
pub fn build_query(args: &[String], nsfw: bool) -> String {
    let mut query = args.join(" ");
    if !nsfw {
        query.push_str(", ");
        query.push_str(SAFETY_TAG);
    }
    query
}

#[async_trait]
impl CommandHandler for Derpi {
    async fn run(&self, args: &[String], ctx: &dyn CommandContext) -> CommandResult {
        if args.iter().all(|arg| arg.trim().is_empty()) {
            return Err(CommandError::InvalidArgs(NO_TAGS.to_string()));
        }

        let query = build_query(args, ctx.channel().nsfw);
        let urls = ctx.image_board().search(&query).await.map_err(|e| {
            warn!("[DERPI] Search for '{}' failed: {}", query, e);
            CommandError::from(e)
        })?;

        let pick = {
            let mut rng = rand::thread_rng();
            urls.choose(&mut rng).cloned()
        };

        match pick {
            Some(url) => {
                debug!("[DERPI] Picked {} of {} results", url, urls.len());
                Ok(CommandOutput::text(url))
            }
            None => Err(CommandError::NoResults),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booru::testing::FakeBoard;
    use crate::context::testing::FakeContext;
    use crate::error::ErrorKind;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_query() {
        assert_eq!(build_query(&args(&["twilight", "sparkle"]), false), "twilight sparkle, safe");
        assert_eq!(build_query(&args(&["twilight"]), true), "twilight");
    }

    #[tokio::test]
    async fn test_no_tags_makes_no_request() {
        let ctx = FakeContext::new();
        let err = Derpi.run(&[], &ctx).await.unwrap_err();
        assert!(matches!(err, CommandError::InvalidArgs(ref m) if m == NO_TAGS));
        assert!(ctx.board.queries().is_empty());
    }

    #[tokio::test]
    async fn test_no_results() {
        let ctx = FakeContext::new();
        let err = Derpi.run(&args(&["nothing"]), &ctx).await.unwrap_err();
        assert!(matches!(err, CommandError::NoResults));
        assert_eq!(ctx.board.queries(), vec!["nothing, safe"]);
    }

    #[tokio::test]
    async fn test_picks_one_of_the_results() {
        let mut ctx = FakeContext::new();
        ctx.board = FakeBoard::with_results(&["a", "b", "c"]);
        ctx.channel.nsfw = true;

        for _ in 0..10 {
            let out = Derpi.run(&args(&["pony"]), &ctx).await.unwrap();
            assert!(["a", "b", "c"].contains(&out.text.as_str()));
        }
        assert!(ctx.board.queries().iter().all(|q| q == "pony"));
    }

    #[tokio::test]
    async fn test_board_failure_is_a_network_error() {
        let mut ctx = FakeContext::new();
        ctx.board.fail = true;
        let err = Derpi.run(&args(&["pony"]), &ctx).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }
}
