use thiserror::Error;

use super::phase::{GamePhase, PhaseAction};
use super::types::{ActionOn, Address, SeatIndex, TableSnapshot};
use crate::secret::commit_hash;

/// Minimum number of seated, non-sitting-out players for a hand to start.
pub const MIN_ACTIVE_SEATS: usize = 2;

/// The locally connected account, if any.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocalIdentity {
    pub address: Option<Address>,
}

impl LocalIdentity {
    pub fn connected(address: impl Into<Address>) -> Self {
        Self {
            address: Some(address.into()),
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }
}

/// True only when the ledger's action pointer names the local seat and address.
/// The deadline is ignored; expiring it is the ledger's job (`handle_timeout`).
pub fn can_act(
    action_on: Option<&ActionOn>,
    local_seat: Option<SeatIndex>,
    local_address: Option<&Address>,
) -> bool {
    match (action_on, local_seat, local_address) {
        (Some(on), Some(seat), Some(address)) => {
            on.seat_index == seat && on.player_address == *address
        }
        _ => false,
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GateRefusal {
    #[error("no wallet connected")]
    NotConnected,
    #[error("another action is still pending")]
    ActionPending,
    #[error("not available during the {} phase", .0.name())]
    WrongPhase(GamePhase),
    #[error("you are not seated at this table")]
    NotSeated,
    #[error("you are sitting out")]
    SittingOut,
    #[error("waiting for the acting player")]
    NotYourTurn,
    #[error("only the table admin may start a hand")]
    AdminOnly,
    #[error("table is paused")]
    Paused,
    #[error("need at least {} active players, found {}", MIN_ACTIVE_SEATS, .0)]
    NotEnoughPlayers(usize),
    #[error("enter or generate a secret first")]
    MissingSecret,
}

/// Which sit control is offered for the local seat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SitToggle {
    SitIn,
    SitOut,
}

/// Which leave control is offered for the local seat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeaveToggle {
    LeaveAfterHand,
    CancelLeave,
}

/// Everything the gate looks at for one evaluation.
#[derive(Clone, Copy, Debug)]
pub struct GateContext<'a> {
    pub snapshot: &'a TableSnapshot,
    pub identity: &'a LocalIdentity,
    pub secret: &'a str,
    pub action_pending: bool,
}

impl<'a> GateContext<'a> {
    fn address(&self) -> Result<&'a Address, GateRefusal> {
        self.identity
            .address
            .as_ref()
            .ok_or(GateRefusal::NotConnected)
    }

    pub fn local_seat(&self) -> Option<SeatIndex> {
        let address = self.identity.address.as_ref()?;
        self.snapshot.seat_of(address)
    }

    pub fn is_action_on_local(&self) -> bool {
        can_act(
            self.snapshot.game.action_on.as_ref(),
            self.local_seat(),
            self.identity.address.as_ref(),
        )
    }

    fn idle(&self) -> Result<(), GateRefusal> {
        if self.action_pending {
            Err(GateRefusal::ActionPending)
        } else {
            Ok(())
        }
    }

    fn phase(&self, action: PhaseAction) -> Result<(), GateRefusal> {
        let phase = self.snapshot.game.phase;
        if phase.allows(action) {
            Ok(())
        } else {
            Err(GateRefusal::WrongPhase(phase))
        }
    }

    fn seated_and_playing(&self) -> Result<SeatIndex, GateRefusal> {
        let seat = self.local_seat().ok_or(GateRefusal::NotSeated)?;
        match self.snapshot.seat(seat) {
            Some(info) if info.sitting_out => Err(GateRefusal::SittingOut),
            Some(_) => Ok(seat),
            None => Err(GateRefusal::NotSeated),
        }
    }

    pub fn check_start_hand(&self) -> Result<(), GateRefusal> {
        let address = self.address()?;
        self.idle()?;
        self.phase(PhaseAction::StartHand)?;
        if self.snapshot.paused {
            return Err(GateRefusal::Paused);
        }
        let active = self.snapshot.active_seat_count();
        if active < MIN_ACTIVE_SEATS {
            return Err(GateRefusal::NotEnoughPlayers(active));
        }
        if self.snapshot.is_admin(address) {
            return Ok(());
        }
        if self.snapshot.admin_only_start {
            return Err(GateRefusal::AdminOnly);
        }
        if !self.is_action_on_local() {
            return Err(GateRefusal::NotYourTurn);
        }
        Ok(())
    }

    pub fn check_commit(&self) -> Result<(), GateRefusal> {
        self.address()?;
        self.idle()?;
        self.phase(PhaseAction::Commit)?;
        self.seated_and_playing()?;
        if !self.is_action_on_local() {
            return Err(GateRefusal::NotYourTurn);
        }
        if commit_hash(self.secret).is_none() {
            return Err(GateRefusal::MissingSecret);
        }
        Ok(())
    }

    pub fn check_reveal(&self) -> Result<(), GateRefusal> {
        self.address()?;
        self.idle()?;
        self.phase(PhaseAction::Reveal)?;
        self.seated_and_playing()?;
        if !self.is_action_on_local() {
            return Err(GateRefusal::NotYourTurn);
        }
        if self.secret.is_empty() {
            return Err(GateRefusal::MissingSecret);
        }
        Ok(())
    }

    pub fn sit_toggle(&self) -> Result<SitToggle, GateRefusal> {
        self.address()?;
        self.idle()?;
        let seat = self.local_seat().ok_or(GateRefusal::NotSeated)?;
        let info = self.snapshot.seat(seat).ok_or(GateRefusal::NotSeated)?;
        Ok(if info.sitting_out {
            SitToggle::SitIn
        } else {
            SitToggle::SitOut
        })
    }

    pub fn leave_toggle(&self) -> Result<LeaveToggle, GateRefusal> {
        self.address()?;
        self.idle()?;
        let seat = self.local_seat().ok_or(GateRefusal::NotSeated)?;
        Ok(if self.snapshot.pending_leave(seat) {
            LeaveToggle::CancelLeave
        } else {
            LeaveToggle::LeaveAfterHand
        })
    }

    pub fn check_seated(&self) -> Result<(), GateRefusal> {
        self.address()?;
        self.idle()?;
        self.local_seat().map(|_| ()).ok_or(GateRefusal::NotSeated)
    }
}

/// Enabled state of every lifecycle control for one snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LifecycleLegals {
    pub may_start_hand: bool,
    pub may_commit: bool,
    pub may_reveal: bool,
    pub sit_toggle: Option<SitToggle>,
    pub leave_toggle: Option<LeaveToggle>,
    pub action_on_local: bool,
}

impl LifecycleLegals {
    pub fn evaluate(ctx: &GateContext<'_>) -> Self {
        Self {
            may_start_hand: ctx.check_start_hand().is_ok(),
            may_commit: ctx.check_commit().is_ok(),
            may_reveal: ctx.check_reveal().is_ok(),
            sit_toggle: ctx.sit_toggle().ok(),
            leave_toggle: ctx.leave_toggle().ok(),
            action_on_local: ctx.is_action_on_local(),
        }
    }
}
