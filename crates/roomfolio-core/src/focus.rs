//! Camera focus state machine
//!
//! The focus controller decides *which* camera move to start; the renderer
//! performs the move and reports completion with the ticket it was given.
//! Only the completion of the ticket the controller is waiting on can move
//! `Focusing` to `Focused`. A newer request supersedes the older move, whose
//! completion is never reported back.

use tracing::{debug, warn};

/// Observable focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusPhase {
    #[default]
    Default,
    /// Fit-to-volume move in flight
    Focusing,
    Focused,
}

/// Identifies one camera move issued by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransitionTicket(pub u64);

/// Camera moves the renderer knows how to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMove {
    /// Frame the focus volume's bounding box
    FitToVolume,
    /// Move the eye to the fixed follow-up position, keeping the target
    ApplyFollowUp,
    /// Return to the initial pose
    ResetToHome,
}

/// A camera move request with the ticket its completion must carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusCommand {
    pub ticket: TransitionTicket,
    pub movement: CameraMove,
}

/// Binary "seated" focus on one designated object
#[derive(Debug, Clone, Default)]
pub struct CameraFocus {
    phase: FocusPhase,
    awaiting: Option<TransitionTicket>,
    next_ticket: u64,
}

impl CameraFocus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> FocusPhase {
        self.phase
    }

    /// True while focusing or focused
    pub fn is_engaged(&self) -> bool {
        self.phase != FocusPhase::Default
    }

    /// Ticket of the fit move the controller is waiting on
    pub fn awaiting(&self) -> Option<TransitionTicket> {
        self.awaiting
    }

    /// Flip between default and focused framing (the chair click)
    ///
    /// `target_ready` is false while the focus volume is not mounted; the
    /// request is then dropped without a state change.
    pub fn toggle(&mut self, target_ready: bool) -> Option<FocusCommand> {
        if self.is_engaged() {
            self.deactivate()
        } else {
            self.activate(target_ready)
        }
    }

    /// Start focusing; no-op unless in `Default` with the target mounted
    pub fn activate(&mut self, target_ready: bool) -> Option<FocusCommand> {
        if self.is_engaged() {
            return None;
        }
        if !target_ready {
            warn!("Focus requested before the focus volume is mounted; ignoring");
            return None;
        }

        let command = self.issue(CameraMove::FitToVolume);
        self.phase = FocusPhase::Focusing;
        self.awaiting = Some(command.ticket);
        debug!("Focus: Default -> Focusing ({:?})", command.ticket);
        Some(command)
    }

    /// Return to the default pose (chair toggle or desk click); no-op in `Default`
    pub fn deactivate(&mut self) -> Option<FocusCommand> {
        if !self.is_engaged() {
            return None;
        }

        let from = self.phase;
        self.phase = FocusPhase::Default;
        self.awaiting = None;
        let command = self.issue(CameraMove::ResetToHome);
        debug!("Focus: {:?} -> Default ({:?})", from, command.ticket);
        Some(command)
    }

    /// Report that the camera move carrying `ticket` has finished
    pub fn transition_finished(&mut self, ticket: TransitionTicket) -> Option<FocusCommand> {
        if self.phase != FocusPhase::Focusing || self.awaiting != Some(ticket) {
            return None;
        }

        self.phase = FocusPhase::Focused;
        self.awaiting = None;
        let command = self.issue(CameraMove::ApplyFollowUp);
        debug!("Focus: Focusing -> Focused, follow-up {:?}", command.ticket);
        Some(command)
    }

    fn issue(&mut self, movement: CameraMove) -> FocusCommand {
        self.next_ticket += 1;
        FocusCommand {
            ticket: TransitionTicket(self.next_ticket),
            movement,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activate_then_deactivate_returns_to_default() {
        let mut focus = CameraFocus::new();

        let fit = focus.toggle(true).unwrap();
        assert_eq!(fit.movement, CameraMove::FitToVolume);
        assert_eq!(focus.phase(), FocusPhase::Focusing);

        let follow_up = focus.transition_finished(fit.ticket).unwrap();
        assert_eq!(follow_up.movement, CameraMove::ApplyFollowUp);
        assert_eq!(focus.phase(), FocusPhase::Focused);

        let reset = focus.toggle(true).unwrap();
        assert_eq!(reset.movement, CameraMove::ResetToHome);
        assert_eq!(focus.phase(), FocusPhase::Default);
    }

    #[test]
    fn test_deactivate_in_default_is_noop() {
        let mut focus = CameraFocus::new();
        assert!(focus.deactivate().is_none());
        assert_eq!(focus.phase(), FocusPhase::Default);
    }

    #[test]
    fn test_desk_click_exits_focus() {
        let mut focus = CameraFocus::new();
        let fit = focus.activate(true).unwrap();
        focus.transition_finished(fit.ticket);
        assert_eq!(focus.phase(), FocusPhase::Focused);

        // Secondary actuator
        let reset = focus.deactivate().unwrap();
        assert_eq!(reset.movement, CameraMove::ResetToHome);
        assert_eq!(focus.phase(), FocusPhase::Default);
    }

    #[test]
    fn test_missing_target_is_silent_noop() {
        let mut focus = CameraFocus::new();
        assert!(focus.toggle(false).is_none());
        assert_eq!(focus.phase(), FocusPhase::Default);
        assert!(focus.awaiting().is_none());
    }

    #[test]
    fn test_stale_fit_completion_is_ignored() {
        let mut focus = CameraFocus::new();

        let first_fit = focus.toggle(true).unwrap();
        // Toggled off again before the fit finished: last request wins
        focus.toggle(true).unwrap();
        assert_eq!(focus.phase(), FocusPhase::Default);

        assert!(focus.transition_finished(first_fit.ticket).is_none());
        assert_eq!(focus.phase(), FocusPhase::Default);

        // A fresh fit only accepts its own ticket
        let second_fit = focus.toggle(true).unwrap();
        assert!(focus.transition_finished(first_fit.ticket).is_none());
        assert_eq!(focus.phase(), FocusPhase::Focusing);
        assert!(focus.transition_finished(second_fit.ticket).is_some());
        assert_eq!(focus.phase(), FocusPhase::Focused);
    }

    #[test]
    fn test_follow_up_and_reset_completions_do_not_change_phase() {
        let mut focus = CameraFocus::new();
        let fit = focus.toggle(true).unwrap();
        let follow_up = focus.transition_finished(fit.ticket).unwrap();

        assert!(focus.transition_finished(follow_up.ticket).is_none());
        assert_eq!(focus.phase(), FocusPhase::Focused);

        let reset = focus.deactivate().unwrap();
        assert!(focus.transition_finished(reset.ticket).is_none());
        assert_eq!(focus.phase(), FocusPhase::Default);
    }

    #[test]
    fn test_tickets_are_unique() {
        let mut focus = CameraFocus::new();
        let a = focus.toggle(true).unwrap();
        let b = focus.toggle(true).unwrap();
        let c = focus.toggle(true).unwrap();
        assert_ne!(a.ticket, b.ticket);
        assert_ne!(b.ticket, c.ticket);
        assert_eq!(focus.awaiting(), Some(c.ticket));
    }
}
