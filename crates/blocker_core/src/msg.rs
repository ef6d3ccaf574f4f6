#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// New rule list, mode or blocked identities from the settings collaborator.
    SettingsChanged(crate::Settings),
    /// Records extracted from the tree by one detection pass.
    ScanCompleted(Vec<crate::Candidate>),
    /// Try to start the next queued entry.
    AdvanceQueue,
    /// The engine finished an effect that touched the tree.
    StepReported {
        action_id: crate::ActionId,
        report: crate::StepReport,
    },
    /// A timer started through `Effect::StartTimer` expired.
    TimerElapsed {
        action_id: crate::ActionId,
        timer: crate::Timer,
    },
    /// Confirmation surfaces observed leaving the tree.
    ConfirmationClosed { sheets: Vec<crate::NodeHandle> },
    NoOp,
}
