// Command catalog and registry.
//
// The full command set is a static table of descriptors. Each descriptor names
// the command, the permission it needs and how a denial is answered. The
// registry is built once at startup, validated, and then only read.
//
// Denials are intentionally not uniform: most moderation commands ignore
// unauthorised callers, while `purge` tells them off. Each descriptor carries
// its own `DenialPolicy` so that difference stays explicit.

use std::collections::HashMap;
use thiserror::Error;

/// Every command the bot understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Ban,
    Mute,
    Unmute,
    Unban,
    Warn,
    AddRole,
    Purge,
    ServerInfo,
    Mods,
    UserInfo,
    Dp,
    ServerDp,
    Ping,
    Stalk,
    Rank,
    Leaderboard,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Moderation,
    Information,
    Miscellaneous,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Moderation,
        Category::Information,
        Category::Miscellaneous,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Category::Moderation => "🛡️ Moderation Commands",
            Category::Information => "ℹ️ Information Commands",
            Category::Miscellaneous => "🎮 Miscellaneous Commands",
        }
    }
}

/// Permission a caller must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Everyone,
    Administrator,
    /// Manage-messages, or administrator which implies it.
    ManageMessages,
}

/// The permission bits of the invoking member that matter to the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActorPermissions {
    pub administrator: bool,
    pub manage_messages: bool,
}

impl Permission {
    pub fn allows(&self, actor: ActorPermissions) -> bool {
        match self {
            Permission::Everyone => true,
            Permission::Administrator => actor.administrator,
            Permission::ManageMessages => actor.manage_messages || actor.administrator,
        }
    }
}

/// How a command answers a caller lacking permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialPolicy {
    Silent,
    Reply(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub kind: CommandKind,
    pub name: &'static str,
    pub category: Category,
    pub permission: Permission,
    pub denial: DenialPolicy,
    pub usage: &'static str,
    pub description: &'static str,
}

const ADMIN_SILENT: (Permission, DenialPolicy) = (Permission::Administrator, DenialPolicy::Silent);
const OPEN: (Permission, DenialPolicy) = (Permission::Everyone, DenialPolicy::Silent);

const fn spec(
    kind: CommandKind,
    name: &'static str,
    category: Category,
    access: (Permission, DenialPolicy),
    usage: &'static str,
    description: &'static str,
) -> CommandSpec {
    CommandSpec {
        kind,
        name,
        category,
        permission: access.0,
        denial: access.1,
        usage,
        description,
    }
}

/// The static command table, in help-listing order.
pub const COMMANDS: &[CommandSpec] = &[
    spec(
        CommandKind::Ban,
        "ban",
        Category::Moderation,
        ADMIN_SILENT,
        "ban @user",
        "Bans a user",
    ),
    spec(
        CommandKind::Mute,
        "mute",
        Category::Moderation,
        ADMIN_SILENT,
        "mute @user [duration e.g. 30s, 10m, 2h]",
        "Mutes a user",
    ),
    spec(
        CommandKind::Unmute,
        "unmute",
        Category::Moderation,
        ADMIN_SILENT,
        "unmute @user",
        "Unmutes a user",
    ),
    spec(
        CommandKind::Unban,
        "unban",
        Category::Moderation,
        ADMIN_SILENT,
        "unban <user id>",
        "Unbans a user",
    ),
    spec(
        CommandKind::Warn,
        "warn",
        Category::Moderation,
        ADMIN_SILENT,
        "warn @user",
        "Issues a warning to a user",
    ),
    spec(
        CommandKind::AddRole,
        "addrole",
        Category::Moderation,
        ADMIN_SILENT,
        "addrole <role name> @user",
        "Adds a role to a user",
    ),
    spec(
        CommandKind::Purge,
        "purge",
        Category::Moderation,
        (
            Permission::ManageMessages,
            DenialPolicy::Reply("You do not have permission to use this command."),
        ),
        "purge <1-100>",
        "Deletes multiple messages",
    ),
    spec(
        CommandKind::ServerInfo,
        "serverinfo",
        Category::Information,
        OPEN,
        "serverinfo",
        "Displays server information",
    ),
    spec(
        CommandKind::Mods,
        "mods",
        Category::Information,
        OPEN,
        "mods",
        "Lists all moderators",
    ),
    spec(
        CommandKind::UserInfo,
        "userinfo",
        Category::Information,
        OPEN,
        "userinfo [@user]",
        "Displays information about a user",
    ),
    spec(
        CommandKind::Dp,
        "dp",
        Category::Information,
        OPEN,
        "dp [@user]",
        "Shows the user's profile picture",
    ),
    spec(
        CommandKind::ServerDp,
        "serverdp",
        Category::Information,
        OPEN,
        "serverdp",
        "Shows the server's profile picture",
    ),
    spec(
        CommandKind::Ping,
        "ping",
        Category::Information,
        OPEN,
        "ping",
        "Checks the bot's response time",
    ),
    spec(
        CommandKind::Stalk,
        "stalk",
        Category::Miscellaneous,
        OPEN,
        "stalk <user id>",
        "Shows the last deleted message of a user",
    ),
    spec(
        CommandKind::Rank,
        "rank",
        Category::Miscellaneous,
        OPEN,
        "rank [@user]",
        "Displays user rank and XP",
    ),
    spec(
        CommandKind::Leaderboard,
        "lb",
        Category::Miscellaneous,
        OPEN,
        "lb",
        "Displays the leaderboard",
    ),
    spec(
        CommandKind::Help,
        "help",
        Category::Miscellaneous,
        OPEN,
        "help [command]",
        "Shows this list",
    ),
];

// ============================================================================
// PARSING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Lowercased command name.
    pub name: String,
    pub args: Vec<String>,
}

/// Split `!name arg arg` into a lowercased name and whitespace-separated args.
/// Returns `None` when the content does not start with `prefix`.
pub fn parse_command(content: &str, prefix: &str) -> Option<ParsedCommand> {
    let body = content.strip_prefix(prefix)?;
    let mut tokens = body.split_whitespace();
    let name = tokens.next().unwrap_or_default().to_lowercase();

    Some(ParsedCommand {
        name,
        args: tokens.map(str::to_string).collect(),
    })
}

// ============================================================================
// REGISTRY
// ============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Command name is empty")]
    EmptyName,

    #[error("Command name `{0}` must be lowercase with no whitespace")]
    InvalidName(String),

    #[error("Command `{0}` is registered twice")]
    Duplicate(String),
}

/// Result of looking a command up on behalf of a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// No such command; callers ignore the message.
    Unknown,
    Denied(DenialPolicy),
    Allowed(CommandKind),
}

pub struct CommandRegistry {
    by_name: HashMap<&'static str, CommandSpec>,
    ordered: Vec<CommandSpec>,
}

impl CommandRegistry {
    pub fn new(specs: &[CommandSpec]) -> Result<Self, RegistryError> {
        let mut by_name = HashMap::with_capacity(specs.len());

        for spec in specs {
            if spec.name.is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if spec.name != spec.name.to_lowercase()
                || spec.name.chars().any(char::is_whitespace)
            {
                return Err(RegistryError::InvalidName(spec.name.to_string()));
            }
            if by_name.insert(spec.name, *spec).is_some() {
                return Err(RegistryError::Duplicate(spec.name.to_string()));
            }
        }

        Ok(Self {
            by_name,
            ordered: specs.to_vec(),
        })
    }

    /// The registry over the built-in command table.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::new(COMMANDS)
    }

    /// Case-insensitive lookup.
    pub fn lookup(&self, name: &str) -> Option<&CommandSpec> {
        self.by_name.get(name.to_lowercase().as_str())
    }

    pub fn resolve(&self, name: &str, actor: ActorPermissions) -> Resolution {
        match self.lookup(name) {
            None => Resolution::Unknown,
            Some(spec) if !spec.permission.allows(actor) => Resolution::Denied(spec.denial),
            Some(spec) => Resolution::Allowed(spec.kind),
        }
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &CommandSpec> {
        self.ordered.iter().filter(move |s| s.category == category)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: ActorPermissions = ActorPermissions {
        administrator: true,
        manage_messages: false,
    };
    const NOBODY: ActorPermissions = ActorPermissions {
        administrator: false,
        manage_messages: false,
    };

    #[test]
    fn builtin_catalog_is_valid() {
        let registry = CommandRegistry::builtin().unwrap();
        assert_eq!(registry.len(), COMMANDS.len());
    }

    #[test]
    fn parse_splits_name_and_args() {
        let parsed = parse_command("!MUTE <@1>   90s", "!").unwrap();
        assert_eq!(parsed.name, "mute");
        assert_eq!(parsed.args, vec!["<@1>", "90s"]);

        assert!(parse_command("hello !ban", "!").is_none());
        assert_eq!(parse_command("!", "!").unwrap().name, "");
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = CommandRegistry::builtin().unwrap();
        assert_eq!(registry.lookup("LB").unwrap().kind, CommandKind::Leaderboard);
        assert_eq!(registry.lookup("Rank").unwrap().kind, CommandKind::Rank);
    }

    #[test]
    fn unknown_commands_resolve_to_unknown() {
        let registry = CommandRegistry::builtin().unwrap();
        assert_eq!(registry.resolve("nope", ADMIN), Resolution::Unknown);
        assert_eq!(registry.resolve("", ADMIN), Resolution::Unknown);
    }

    #[test]
    fn moderation_denials_are_silent_except_purge() {
        let registry = CommandRegistry::builtin().unwrap();

        for name in ["ban", "mute", "unmute", "unban", "warn", "addrole"] {
            assert_eq!(
                registry.resolve(name, NOBODY),
                Resolution::Denied(DenialPolicy::Silent),
                "{name}"
            );
        }

        assert!(matches!(
            registry.resolve("purge", NOBODY),
            Resolution::Denied(DenialPolicy::Reply(_))
        ));
    }

    #[test]
    fn purge_accepts_manage_messages_or_admin() {
        let registry = CommandRegistry::builtin().unwrap();
        let manager = ActorPermissions {
            administrator: false,
            manage_messages: true,
        };

        assert_eq!(
            registry.resolve("purge", manager),
            Resolution::Allowed(CommandKind::Purge)
        );
        assert_eq!(
            registry.resolve("purge", ADMIN),
            Resolution::Allowed(CommandKind::Purge)
        );
        // manage-messages alone is not enough for ban
        assert_eq!(
            registry.resolve("ban", manager),
            Resolution::Denied(DenialPolicy::Silent)
        );
    }

    #[test]
    fn informational_commands_are_open() {
        let registry = CommandRegistry::builtin().unwrap();
        assert_eq!(
            registry.resolve("rank", NOBODY),
            Resolution::Allowed(CommandKind::Rank)
        );
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let specs = [COMMANDS[0], COMMANDS[0]];
        assert_eq!(
            CommandRegistry::new(&specs).err(),
            Some(RegistryError::Duplicate("ban".to_string()))
        );
    }

    #[test]
    fn invalid_names_are_rejected() {
        let mut bad = COMMANDS[0];
        bad.name = "Ban";
        assert!(matches!(
            CommandRegistry::new(&[bad]),
            Err(RegistryError::InvalidName(_))
        ));

        bad.name = "";
        assert_eq!(
            CommandRegistry::new(&[bad]).err(),
            Some(RegistryError::EmptyName)
        );
    }

    #[test]
    fn every_category_has_commands() {
        let registry = CommandRegistry::builtin().unwrap();
        for category in Category::ALL {
            assert!(registry.in_category(category).next().is_some());
        }
    }
}
