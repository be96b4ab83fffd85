//! Vote bookkeeping for commands that non-privileged listeners may only pass
//! together.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::player::UserKey;

/// Commands that can be put to a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteKind {
    Back,
    Resume,
    Pause,
    Skip,
    Stop,
}

impl VoteKind {
    /// Leaving the channel is decided with the leave quorum.
    pub fn is_leave(self) -> bool {
        matches!(self, VoteKind::Stop)
    }

    /// Template announcing a recorded vote.
    pub fn vote_message(self) -> &'static str {
        match self {
            VoteKind::Back => "backVote",
            VoteKind::Resume => "resumeVote",
            VoteKind::Pause => "pauseVote",
            VoteKind::Skip => "skipVote",
            VoteKind::Stop => "leaveVote",
        }
    }

    /// Vote sets that lose their meaning once this command runs.
    pub fn invalidates(self) -> &'static [VoteKind] {
        match self {
            VoteKind::Pause | VoteKind::Resume => &[VoteKind::Pause, VoteKind::Resume],
            VoteKind::Back => &[VoteKind::Back],
            VoteKind::Skip => &[VoteKind::Skip],
            VoteKind::Stop => &[VoteKind::Stop],
        }
    }
}

/// Why a command was refused outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    MissingPermission,
}

/// Outcome of putting a command through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    VoteRecorded { count: usize, required: usize },
    AlreadyVoted,
    Denied(DenyReason),
}

/// One user's attempt to run a vote-gated command.
#[derive(Debug, Clone, Copy)]
pub struct Ballot {
    pub user: UserKey,
    pub kind: VoteKind,
    pub privileged: bool,
    pub quorum: usize,
    /// Requester of the track that is playing right now.
    pub requester: Option<UserKey>,
}

/// The vote sets of one player.
#[derive(Debug, Default)]
pub struct VoteSessions {
    sets: HashMap<VoteKind, HashSet<UserKey>>,
}

impl VoteSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decides a ballot. Every `Allowed` clears the vote set of the command and
    /// the sets it invalidates.
    pub fn authorize(&mut self, ballot: Ballot) -> Decision {
        let Ballot {
            user,
            kind,
            privileged,
            quorum,
            requester,
        } = ballot;

        if privileged || (kind == VoteKind::Skip && requester == Some(user)) {
            self.clear(kind);
            return Decision::Allowed;
        }

        let voters = self.sets.entry(kind).or_default();
        if !voters.insert(user) {
            return Decision::AlreadyVoted;
        }

        let count = voters.len();
        debug!("{:?} vote by {}: {}/{}", kind, user, count, quorum);
        if count >= quorum {
            self.clear(kind);
            Decision::Allowed
        } else {
            Decision::VoteRecorded {
                count,
                required: quorum,
            }
        }
    }

    /// Number of votes currently counted for `kind`.
    pub fn votes(&self, kind: VoteKind) -> usize {
        self.sets.get(&kind).map_or(0, HashSet::len)
    }

    pub fn has_voted(&self, kind: VoteKind, user: UserKey) -> bool {
        self.sets.get(&kind).is_some_and(|set| set.contains(&user))
    }

    /// Clears the set of `kind` and every set it invalidates.
    pub fn clear(&mut self, kind: VoteKind) {
        for invalidated in kind.invalidates() {
            self.sets.remove(invalidated);
        }
    }

    pub fn clear_all(&mut self) {
        self.sets.clear();
    }
}

/// Gate for commands without a vote: only privileged users pass.
pub fn privileged_only(privileged: bool) -> Decision {
    if privileged {
        Decision::Allowed
    } else {
        Decision::Denied(DenyReason::MissingPermission)
    }
}

/// Quorum for a voice channel with `channel_members` members, the bot included.
pub fn required_votes(channel_members: usize, leave: bool, vote_disabled: bool) -> usize {
    if vote_disabled {
        return 0;
    }

    if leave && channel_members == 3 {
        return 2;
    }

    // ceil(listeners / 2.5)
    let listeners = channel_members.saturating_sub(1);
    (listeners * 2).div_ceil(5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn ballot(user: u64, kind: VoteKind, quorum: usize) -> Ballot {
        Ballot {
            user: UserKey(user),
            kind,
            privileged: false,
            quorum,
            requester: None,
        }
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[case(5)]
    fn test_nth_unique_voter_passes_iff_quorum_reached(#[case] quorum: usize) {
        let mut votes = VoteSessions::new();

        for n in 1..quorum {
            assert_eq!(
                votes.authorize(ballot(n as u64, VoteKind::Skip, quorum)),
                Decision::VoteRecorded {
                    count: n,
                    required: quorum
                }
            );
        }

        assert_eq!(
            votes.authorize(ballot(quorum as u64, VoteKind::Skip, quorum)),
            Decision::Allowed
        );
        assert_eq!(votes.votes(VoteKind::Skip), 0);
    }

    #[test]
    fn test_duplicate_vote_never_counts() {
        let mut votes = VoteSessions::new();

        assert_eq!(
            votes.authorize(ballot(1, VoteKind::Back, 3)),
            Decision::VoteRecorded {
                count: 1,
                required: 3
            }
        );
        assert_eq!(votes.authorize(ballot(1, VoteKind::Back, 3)), Decision::AlreadyVoted);
        assert_eq!(votes.authorize(ballot(1, VoteKind::Back, 3)), Decision::AlreadyVoted);
        assert_eq!(votes.votes(VoteKind::Back), 1);
    }

    #[test]
    fn test_vote_sets_are_independent_per_kind() {
        let mut votes = VoteSessions::new();

        votes.authorize(ballot(1, VoteKind::Skip, 3));
        assert_eq!(
            votes.authorize(ballot(1, VoteKind::Stop, 3)),
            Decision::VoteRecorded {
                count: 1,
                required: 3
            }
        );
        assert!(votes.has_voted(VoteKind::Skip, UserKey(1)));
        assert!(votes.has_voted(VoteKind::Stop, UserKey(1)));
    }

    #[test]
    fn test_privileged_user_always_allowed_and_clears_set() {
        let mut votes = VoteSessions::new();
        votes.authorize(ballot(1, VoteKind::Skip, 5));
        votes.authorize(ballot(2, VoteKind::Skip, 5));

        let decision = votes.authorize(Ballot {
            privileged: true,
            ..ballot(3, VoteKind::Skip, 5)
        });

        assert_eq!(decision, Decision::Allowed);
        assert_eq!(votes.votes(VoteKind::Skip), 0);
    }

    #[test]
    fn test_privileged_user_allowed_even_after_voting() {
        let mut votes = VoteSessions::new();
        votes.authorize(ballot(1, VoteKind::Stop, 4));

        let decision = votes.authorize(Ballot {
            privileged: true,
            ..ballot(1, VoteKind::Stop, 4)
        });

        assert_eq!(decision, Decision::Allowed);
    }

    #[test]
    fn test_requester_skips_without_vote() {
        let mut votes = VoteSessions::new();

        let decision = votes.authorize(Ballot {
            requester: Some(UserKey(9)),
            ..ballot(9, VoteKind::Skip, 4)
        });

        assert_eq!(decision, Decision::Allowed);
        assert_eq!(votes.votes(VoteKind::Skip), 0);
    }

    #[test]
    fn test_requester_bypass_only_applies_to_skip() {
        let mut votes = VoteSessions::new();

        let decision = votes.authorize(Ballot {
            requester: Some(UserKey(9)),
            ..ballot(9, VoteKind::Back, 4)
        });

        assert_eq!(
            decision,
            Decision::VoteRecorded {
                count: 1,
                required: 4
            }
        );
    }

    #[test]
    fn test_pause_and_resume_invalidate_each_other() {
        let mut votes = VoteSessions::new();
        votes.authorize(ballot(1, VoteKind::Resume, 3));
        votes.authorize(ballot(2, VoteKind::Pause, 2));
        assert_eq!(votes.votes(VoteKind::Resume), 1);

        assert_eq!(votes.authorize(ballot(3, VoteKind::Pause, 2)), Decision::Allowed);

        assert_eq!(votes.votes(VoteKind::Pause), 0);
        assert_eq!(votes.votes(VoteKind::Resume), 0);
    }

    #[test]
    fn test_user_can_vote_again_after_clear() {
        let mut votes = VoteSessions::new();
        votes.authorize(ballot(1, VoteKind::Skip, 2));
        votes.clear_all();

        assert_eq!(
            votes.authorize(ballot(1, VoteKind::Skip, 2)),
            Decision::VoteRecorded {
                count: 1,
                required: 2
            }
        );
    }

    #[test]
    fn test_zero_quorum_passes_first_ballot() {
        let mut votes = VoteSessions::new();
        assert_eq!(votes.authorize(ballot(1, VoteKind::Back, 0)), Decision::Allowed);
    }

    #[test]
    fn test_privileged_only_gate() {
        assert_eq!(privileged_only(true), Decision::Allowed);
        assert_eq!(
            privileged_only(false),
            Decision::Denied(DenyReason::MissingPermission)
        );
    }

    #[rstest]
    #[case(1, false, 0)]
    #[case(2, false, 1)]
    #[case(3, false, 1)]
    #[case(3, true, 2)]
    #[case(4, false, 2)]
    #[case(4, true, 2)]
    #[case(6, false, 2)]
    #[case(7, false, 3)]
    #[case(11, false, 4)]
    fn test_required_votes(#[case] members: usize, #[case] leave: bool, #[case] expected: usize) {
        assert_eq!(required_votes(members, leave, false), expected);
    }

    #[test]
    fn test_vote_disable_forces_zero_quorum() {
        assert_eq!(required_votes(10, true, true), 0);
    }
}
