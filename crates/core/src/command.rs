// Host-callable commands, addressed by ordinal

/// Commands the host can dispatch to a player view.
///
/// The host invokes commands by ordinal, so declaration order is the wire
/// contract: never reorder these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    SetState,
    /// Declared for host parity; accepted and ignored on this platform
    RecreateView,
}

impl Command {
    /// Frozen command table, indexed by ordinal
    pub const ALL: [Command; 2] = [Command::SetState, Command::RecreateView];

    pub const fn ordinal(self) -> i32 {
        self as i32
    }

    pub const fn name(self) -> &'static str {
        match self {
            Command::SetState => "setState",
            Command::RecreateView => "recreateView",
        }
    }

    pub fn from_ordinal(ordinal: i32) -> Option<Command> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    pub fn from_name(name: &str) -> Option<Command> {
        Self::ALL.iter().copied().find(|command| command.name() == name)
    }

    /// Whether `ordinal` addresses `command`. Unknown ordinals are never a match.
    pub fn is(ordinal: i32, command: Command) -> bool {
        Self::from_ordinal(ordinal) == Some(command)
    }

    /// `(name, ordinal)` pairs for the host's command export
    pub fn commands_map() -> impl Iterator<Item = (&'static str, i32)> {
        let table: &'static [Command] = &Self::ALL;
        table.iter().map(|command| (command.name(), command.ordinal()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_follow_declaration_order() {
        for (index, command) in Command::ALL.iter().enumerate() {
            assert_eq!(command.ordinal(), index as i32);
            assert_eq!(Command::from_ordinal(index as i32), Some(*command));
        }
        assert_eq!(Command::SetState.ordinal(), 0);
        assert_eq!(Command::RecreateView.ordinal(), 1);
    }

    #[test]
    fn test_is() {
        assert!(Command::is(0, Command::SetState));
        assert!(!Command::is(0, Command::RecreateView));
        assert!(Command::is(1, Command::RecreateView));
        assert!(!Command::is(1, Command::SetState));
    }

    #[test]
    fn test_is_fails_closed_out_of_range() {
        for ordinal in [-1, 2, 3, 100, i32::MIN, i32::MAX] {
            assert!(!Command::is(ordinal, Command::SetState));
            assert!(!Command::is(ordinal, Command::RecreateView));
            assert_eq!(Command::from_ordinal(ordinal), None);
        }
    }

    #[test]
    fn test_commands_map() {
        let map: Vec<_> = Command::commands_map().collect();
        assert_eq!(map, vec![("setState", 0), ("recreateView", 1)]);
        assert_eq!(Command::from_name("recreateView"), Some(Command::RecreateView));
        assert_eq!(Command::from_name("play"), None);
    }
}
