//! Who may control the player without a vote.

use crate::config::Settings;

use super::player::UserKey;

/// What the guild knows about a member, reduced to what privilege depends on.
#[derive(Debug, Clone, Default)]
pub struct MemberAccess {
    pub user: UserKey,
    pub is_owner: bool,
    /// Holds ADMINISTRATOR or MANAGE_GUILD through any role.
    pub manages_guild: bool,
    pub roles: Vec<u64>,
}

/// Bot access users, guild managers, DJs and the only human in the channel
/// skip votes.
pub fn is_privileged(
    member: &MemberAccess,
    human_listeners: &[UserKey],
    settings: &Settings,
) -> bool {
    if settings.is_bot_access_user(member.user.0) || member.is_owner || member.manages_guild {
        return true;
    }

    if settings
        .dj_role
        .is_some_and(|role| member.roles.contains(&role))
    {
        return true;
    }

    matches!(human_listeners, [only] if *only == member.user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn member(user: u64) -> MemberAccess {
        MemberAccess {
            user: UserKey(user),
            ..Default::default()
        }
    }

    #[test]
    fn test_plain_member_with_company_is_not_privileged() {
        let listeners = [UserKey(1), UserKey(2)];
        assert!(!is_privileged(&member(1), &listeners, &Settings::default()));
    }

    #[test_case(MemberAccess { is_owner: true, ..member(1) } ; "owner")]
    #[test_case(MemberAccess { manages_guild: true, ..member(1) } ; "manager")]
    #[test_case(MemberAccess { roles: vec![77], ..member(1) } ; "dj")]
    fn test_elevated_members_are_privileged(access: MemberAccess) {
        let settings = Settings {
            dj_role: Some(77),
            ..Default::default()
        };
        let listeners = [UserKey(1), UserKey(2), UserKey(3)];
        assert!(is_privileged(&access, &listeners, &settings));
    }

    #[test]
    fn test_bot_access_user_is_privileged() {
        let settings = Settings {
            bot_access_user: vec![1],
            ..Default::default()
        };
        assert!(is_privileged(&member(1), &[UserKey(2)], &settings));
    }

    #[test]
    fn test_sole_listener_is_privileged() {
        assert!(is_privileged(&member(1), &[UserKey(1)], &Settings::default()));
        assert!(!is_privileged(&member(2), &[UserKey(1)], &Settings::default()));
    }

    #[test]
    fn test_dj_role_ignored_when_not_configured() {
        let access = MemberAccess {
            roles: vec![77],
            ..member(1)
        };
        assert!(!is_privileged(&access, &[UserKey(1), UserKey(2)], &Settings::default()));
    }
}
