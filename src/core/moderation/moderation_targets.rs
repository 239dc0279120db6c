// Target resolution for moderation commands.
//
// Every moderation handler resolves its target through these checks before
// touching the platform. Each failure is a `TargetError` whose text is the
// reply the moderator gets, so an unresolvable target always answers.
//
// The helpers are generic over the mention type: the Discord layer passes
// `&User`, tests pass plain ids.

use super::moderation_models::PurgeError;
use thiserror::Error;

/// The moderation commands that act on a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationAction {
    Ban,
    Mute,
    Unmute,
    Unban,
    Warn,
    AddRole,
    Purge,
}

impl ModerationAction {
    fn verb(&self) -> &'static str {
        match self {
            ModerationAction::Ban => "ban",
            ModerationAction::Mute => "mute",
            ModerationAction::Unmute => "unmute",
            ModerationAction::Unban => "unban",
            ModerationAction::Warn => "warn",
            ModerationAction::AddRole => "add a role to",
            ModerationAction::Purge => "purge",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TargetError {
    #[error("Please mention a user to {0}.")]
    MissingMention(&'static str),

    #[error("That user is not a member of this guild.")]
    NotAMember,

    #[error("Mute role not found.")]
    MuteRoleMissing,

    #[error("Role not found.")]
    RoleMissing,

    #[error("Please provide a role name and mention a user.")]
    AddRoleUsage,

    #[error("Please provide the ID of the user to unban.")]
    MissingUserId,

    #[error("Please provide a valid user ID.")]
    InvalidUserId,

    #[error(transparent)]
    Purge(#[from] PurgeError),
}

pub fn require_mention<U>(
    action: ModerationAction,
    mention: Option<U>,
) -> Result<U, TargetError> {
    mention.ok_or(TargetError::MissingMention(action.verb()))
}

/// `addrole <role name> @user` needs both parts.
pub fn require_role_and_mention<'a, U>(
    role_name: Option<&'a str>,
    mention: Option<U>,
) -> Result<(&'a str, U), TargetError> {
    match (role_name, mention) {
        (Some(role_name), Some(user)) => Ok((role_name, user)),
        _ => Err(TargetError::AddRoleUsage),
    }
}

/// Raw user id for `unban`. Zero is not a valid id.
pub fn parse_user_id(arg: Option<&str>) -> Result<u64, TargetError> {
    let raw = arg.ok_or(TargetError::MissingUserId)?;
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .ok_or(TargetError::InvalidUserId)
}

/// Member lookup result; `None` means the user is not in the guild.
pub fn require_member<M>(member: Option<M>) -> Result<M, TargetError> {
    member.ok_or(TargetError::NotAMember)
}

pub fn require_mute_role<R>(role: Option<R>) -> Result<R, TargetError> {
    role.ok_or(TargetError::MuteRoleMissing)
}

pub fn require_role<R>(role: Option<R>) -> Result<R, TargetError> {
    role.ok_or(TargetError::RoleMissing)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::core::moderation::PurgeAmount;

    const ALL: [ModerationAction; 7] = [
        ModerationAction::Ban,
        ModerationAction::Mute,
        ModerationAction::Unmute,
        ModerationAction::Unban,
        ModerationAction::Warn,
        ModerationAction::AddRole,
        ModerationAction::Purge,
    ];

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    /// The argument checks each handler runs before any platform lookup, in order.
    fn check_arguments(
        action: ModerationAction,
        mention: Option<u64>,
        args: &[String],
    ) -> Result<(), TargetError> {
        let first = args.first().map(String::as_str);
        match action {
            ModerationAction::Ban
            | ModerationAction::Mute
            | ModerationAction::Unmute
            | ModerationAction::Warn => require_mention(action, mention).map(|_| ()),
            ModerationAction::Unban => parse_user_id(first).map(|_| ()),
            ModerationAction::AddRole => {
                require_role_and_mention(first, mention).map(|_| ())
            }
            ModerationAction::Purge => {
                PurgeAmount::parse(first).map(|_| ()).map_err(TargetError::from)
            }
        }
    }

    #[test]
    fn every_action_answers_an_empty_invocation() {
        for action in ALL {
            let err = check_arguments(action, None, &[])
                .expect_err("empty invocation must be refused");
            assert!(!err.to_string().is_empty(), "{:?} had no reply", action);
        }
    }

    #[test]
    fn mention_commands_name_themselves() {
        assert_eq!(
            check_arguments(ModerationAction::Ban, None, &[]),
            Err(TargetError::MissingMention("ban"))
        );
        assert_eq!(
            TargetError::MissingMention("mute").to_string(),
            "Please mention a user to mute."
        );
        assert!(check_arguments(ModerationAction::Warn, Some(7), &[]).is_ok());
        assert!(check_arguments(ModerationAction::Mute, Some(7), &args(&["<@7>", "10m"]))
            .is_ok());
    }

    #[test]
    fn addrole_needs_role_and_mention() {
        let with_role = args(&["Helper"]);
        assert_eq!(
            check_arguments(ModerationAction::AddRole, None, &with_role),
            Err(TargetError::AddRoleUsage)
        );
        assert_eq!(
            check_arguments(ModerationAction::AddRole, Some(7), &[]),
            Err(TargetError::AddRoleUsage)
        );
        assert_eq!(require_role_and_mention(Some("Helper"), Some(7)), Ok(("Helper", 7)));
    }

    #[test]
    fn unban_validates_the_raw_id() {
        assert_eq!(parse_user_id(None), Err(TargetError::MissingUserId));
        assert_eq!(parse_user_id(Some("abc")), Err(TargetError::InvalidUserId));
        assert_eq!(parse_user_id(Some("0")), Err(TargetError::InvalidUserId));
        assert_eq!(parse_user_id(Some("123456789")), Ok(123456789));
    }

    #[test]
    fn purge_refusal_carries_the_range_hint() {
        let err = check_arguments(ModerationAction::Purge, None, &args(&["500"]))
            .unwrap_err();
        assert_eq!(err.to_string(), "Please provide a number between 1 and 100.");
        assert!(check_arguments(ModerationAction::Purge, None, &args(&["5"]))
            .is_ok());
    }

    #[test]
    fn lookups_that_miss_have_replies() {
        assert_eq!(
            require_member::<u64>(None).unwrap_err().to_string(),
            "That user is not a member of this guild."
        );
        assert_eq!(
            require_mute_role::<u64>(None).unwrap_err().to_string(),
            "Mute role not found."
        );
        assert_eq!(require_role::<u64>(None).unwrap_err().to_string(), "Role not found.");
        assert_eq!(require_member(Some(3)), Ok(3));
    }
}
