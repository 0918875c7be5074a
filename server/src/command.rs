/// A parsed `/name arg…` chat line. Parsing does not evaluate; dispatch
/// happens in the connection task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub source: String,
    pub source_id: u8,
    pub name: String,
    pub args: Vec<String>,
}

/// Permission stub; every command is allowed for now.
pub fn can_run(_source: &str, _command: &str) -> bool {
    true
}

/// Splits a '/'-prefixed chat line into a command name and arguments.
/// Returns `None` when the line is not a command.
pub fn parse(source: &str, source_id: u8, text: &str) -> Option<Command> {
    let rest = text.strip_prefix('/')?;

    let mut tokens = rest.split(' ');
    let name = tokens.next().unwrap_or_default().to_string();

    Some(Command {
        source: source.to_string(),
        source_id,
        name,
        args: tokens.map(str::to_string).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_name_and_args() {
        let command = parse("Alice", 2, "/kick Bob being rude").unwrap();

        assert_eq!(command.source, "Alice");
        assert_eq!(command.source_id, 2);
        assert_eq!(command.name, "kick");
        assert_eq!(command.args, vec!["Bob", "being", "rude"]);
    }

    #[test]
    fn no_args() {
        let command = parse("Alice", 0, "/help").unwrap();

        assert_eq!(command.name, "help");
        assert!(command.args.is_empty());
    }

    #[test]
    fn rejects_plain_chat() {
        assert!(parse("Alice", 0, "hello everyone").is_none());
    }

    #[test]
    fn anyone_can_run_anything_for_now() {
        assert!(can_run("Alice", "kick"));
        assert!(can_run("", "help"));
    }
}
