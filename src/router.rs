// router.rs - Message Router
// Decides whether a message is a command invocation and, if so, which one.
//
// A message is a candidate only if it starts with the prefix. Exactly one prefix is
// stripped, the rest is split on single spaces: the first token is the verb and the
// remaining tokens are positional arguments. No quoting, no escaping.
// Three prefixes in a row (e.g. "..." with prefix ".") never produce an
// "unknown command" reply so that ellipses don't trigger the bot.

use crate::registry::{Command, Registry};

#[derive(Debug)]
pub enum RouterDecision<'r> {
    NotACommand,
    /// `quiet` is set for the reserved triple-prefix sequence
    UnknownCommand { verb: String, quiet: bool },
    Command { command: &'r Command, args: Vec<String> },
}

/// Split a prefixed message into (verb, args). None if the prefix is absent.
pub fn parse_invocation<'t>(text: &'t str, prefix: &str) -> Option<(&'t str, Vec<&'t str>)> {
    if prefix.is_empty() {
        return None;
    }
    let rest = text.strip_prefix(prefix)?;
    let mut tokens = rest.split(' ');
    // split always yields at least one item
    let verb = tokens.next().unwrap_or_default();
    Some((verb, tokens.collect()))
}

pub fn route<'r>(text: &str, prefix: &str, registry: &'r Registry) -> RouterDecision<'r> {
    let Some((verb, args)) = parse_invocation(text, prefix) else {
        return RouterDecision::NotACommand;
    };

    match registry.resolve(verb) {
        Some(command) => RouterDecision::Command {
            command,
            args: args.into_iter().map(str::to_string).collect(),
        },
        None => RouterDecision::UnknownCommand {
            verb: verb.to_string(),
            quiet: text.starts_with(&prefix.repeat(3)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::testing::Reply;
    use crate::registry::Command;

    fn registry() -> Registry {
        Registry::register(vec![
            Command::new("Help", &["help", "commands"], Reply("help")),
            Command::new("Search", &["derpi"], Reply("search")),
        ])
        .unwrap()
    }

    #[test]
    fn test_not_a_command() {
        let registry = registry();
        for text in ["hello", "help", " .help", "", "!help"] {
            assert!(matches!(route(text, ".", &registry), RouterDecision::NotACommand), "{text}");
        }
    }

    #[test]
    fn test_command_with_args() {
        let registry = registry();
        match route(".derpi twilight sparkle", ".", &registry) {
            RouterDecision::Command { command, args } => {
                assert_eq!(command.name, "Search");
                assert_eq!(args, vec!["twilight", "sparkle"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_command_without_args() {
        let registry = registry();
        match route(".commands", ".", &registry) {
            RouterDecision::Command { command, args } => {
                assert_eq!(command.name, "Help");
                assert!(args.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_single_space_split_keeps_empty_tokens() {
        assert_eq!(parse_invocation(".help  a", "."), Some(("help", vec!["", "a"])));
        assert_eq!(parse_invocation(". help", "."), Some(("", vec!["help"])));
    }

    #[test]
    fn test_unknown_and_case_sensitive() {
        let registry = registry();
        match route(".HELP", ".", &registry) {
            RouterDecision::UnknownCommand { verb, quiet } => {
                assert_eq!(verb, "HELP");
                assert!(!quiet);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_triple_prefix_is_quiet() {
        let registry = registry();
        assert!(matches!(
            route("...", ".", &registry),
            RouterDecision::UnknownCommand { quiet: true, .. }
        ));
        assert!(matches!(
            route("...what", ".", &registry),
            RouterDecision::UnknownCommand { quiet: true, .. }
        ));
        assert!(matches!(
            route("..", ".", &registry),
            RouterDecision::UnknownCommand { quiet: false, .. }
        ));
    }

    #[test]
    fn test_multi_char_prefix() {
        let registry = registry();
        assert!(matches!(route("sb!help", "sb!", &registry), RouterDecision::Command { .. }));
        assert!(matches!(route("sb help", "sb!", &registry), RouterDecision::NotACommand));
        assert!(matches!(
            route("sb!sb!sb!", "sb!", &registry),
            RouterDecision::UnknownCommand { quiet: true, .. }
        ));
    }
}
