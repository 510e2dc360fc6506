pub mod item {
    use serde_json::Value;

    /// A selectable entry: plain text, or a structured record carrying an
    /// explicit display string.
    ///
    /// The display string is derived once at ingestion and reused for every
    /// match pass, never re-derived per comparison.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Item {
        Text(String),
        Record { display: String, payload: Value },
    }

    impl Item {
        /// The string shown to the user and searched by the match engine.
        pub fn display(&self) -> &str {
            match self {
                Item::Text(text) => text,
                Item::Record { display, .. } => display,
            }
        }
    }

    impl From<String> for Item {
        fn from(text: String) -> Self {
            Item::Text(text)
        }
    }

    impl From<&str> for Item {
        fn from(text: &str) -> Self {
            Item::Text(text.to_string())
        }
    }
}

pub mod command {
    use crate::error::ConfigError;
    use nutype::nutype;

    /// External command program name. Must be non-empty after trimming.
    #[nutype(
        sanitize(trim),
        validate(not_empty),
        derive(Debug, Clone, Eq, PartialEq, Hash, Deref)
    )]
    pub struct Program(String);

    /// An external item-producing command: executable plus argument list.
    ///
    /// Arguments may contain the `{q}` placeholder. Its presence makes the
    /// source "live": every query change respawns the command with the
    /// current query substituted.
    #[derive(Debug, Clone)]
    pub struct CommandSpec {
        pub program: Program,
        pub args: Vec<String>,
    }

    impl CommandSpec {
        pub const QUERY_PLACEHOLDER: &str = "{q}";

        pub fn new(program: &str, args: Vec<String>) -> Result<Self, ConfigError> {
            let program = Program::try_new(program.to_string())
                .map_err(|err| ConfigError::InvalidSource(err.to_string()))?;
            Ok(Self { program, args })
        }

        /// True when the argument list references the query.
        pub fn is_live(&self) -> bool {
            self.args
                .iter()
                .any(|arg| arg.contains(Self::QUERY_PLACEHOLDER))
        }

        /// The argument list with the placeholder replaced by `query`.
        pub fn args_for(&self, query: &str) -> Vec<String> {
            self.args
                .iter()
                .map(|arg| arg.replace(Self::QUERY_PLACEHOLDER, query))
                .collect()
        }
    }
}

pub mod source {
    use super::command::CommandSpec;
    use super::item::Item;

    /// Where a session's items come from.
    ///
    /// Producer-style sources are not a variant: a producer simply calls
    /// `Session::set_items` asynchronously, zero or more times.
    pub enum ItemSource {
        /// Finite ordered collection supplied up front.
        List(Vec<Item>),
        /// External command; stdout lines become items.
        Command(CommandSpec),
    }
}

pub mod config {
    use crate::error::ConfigError;
    use serde::Deserialize;

    /// Case matching behavior for the match engine.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum CaseMatching {
        /// Always case sensitive.
        Sensitive,
        /// Always case insensitive.
        Insensitive,
        /// Case-insensitive unless the query contains uppercase.
        #[default]
        Smart,
    }

    /// Presentation order of the visible window.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Direction {
        #[default]
        TopDown,
        BottomUp,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(default, deny_unknown_fields)]
    pub struct PickerConfig {
        pub case_matching: CaseMatching,
        pub direction: Direction,
        /// Rows available to the rendering collaborator.
        pub window_size: usize,
        /// Wall-clock budget per `Session::tick` call, in milliseconds.
        pub tick_budget_ms: u64,
        /// Delay before the busy indicator becomes visible, in milliseconds.
        pub busy_delay_ms: u64,
        /// Distinct query strings whose match sets are cached. 0 disables.
        pub cache_size: usize,
    }

    impl Default for PickerConfig {
        fn default() -> Self {
            Self {
                case_matching: CaseMatching::default(),
                direction: Direction::default(),
                window_size: 10,
                tick_budget_ms: 10,
                busy_delay_ms: 200,
                cache_size: 64,
            }
        }
    }

    impl PickerConfig {
        pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
            toml::from_str(text).map_err(|err| ConfigError::MalformedOption(err.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::command::CommandSpec;
    use super::config::{CaseMatching, Direction, PickerConfig};
    use super::item::Item;
    use serde_json::json;

    #[test]
    fn test_item_display() {
        assert_eq!(Item::from("plain").display(), "plain");

        let record = Item::Record {
            display: "shown".to_string(),
            payload: json!({"path": "/tmp/shown"}),
        };
        assert_eq!(record.display(), "shown");
    }

    #[test]
    fn test_command_spec_rejects_empty_program() {
        assert!(CommandSpec::new("  ", vec![]).is_err());
    }

    #[test]
    fn test_program_derefs_to_trimmed_inner_string() {
        let spec = CommandSpec::new("  ls  ", vec![]).unwrap();
        assert_eq!(spec.program.as_str(), "ls");
    }

    #[test]
    fn test_command_spec_live_detection() {
        let fixed = CommandSpec::new("ls", vec!["-1".to_string()]).unwrap();
        assert!(!fixed.is_live());

        let live = CommandSpec::new("rg", vec!["--files".to_string(), "{q}".to_string()]).unwrap();
        assert!(live.is_live());
        assert_eq!(live.args_for("abc"), vec!["--files", "abc"]);
    }

    #[test]
    fn test_config_from_toml() {
        let config = PickerConfig::from_toml_str(
            r#"
            case_matching = "sensitive"
            direction = "bottom_up"
            window_size = 25
            "#,
        )
        .unwrap();

        assert_eq!(config.case_matching, CaseMatching::Sensitive);
        assert_eq!(config.direction, Direction::BottomUp);
        assert_eq!(config.window_size, 25);
        // Unspecified fields keep their defaults.
        assert_eq!(config.cache_size, PickerConfig::default().cache_size);
    }

    #[test]
    fn test_config_rejects_unknown_option() {
        assert!(PickerConfig::from_toml_str("window_sz = 3").is_err());
    }
}
