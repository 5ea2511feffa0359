//! Component lifecycle state machine.

/// Lifecycle state of a deployed component.
///
/// # State Transitions
///
/// ```text
/// Created → Starting → Running → Stopping → Stopped
///              ↓          ↓          ↓
///            Failed     Failed     Failed
/// ```
///
/// # Validation Rules
///
/// - Transitions are monotonic: no state is ever re-entered
/// - `Failed` is terminal and reachable from every non-terminal state
/// - Configuration validation happens inside `Starting`; a component whose
///   configuration is rejected goes `Starting → Failed` and never reaches
///   `Running`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentState {
    /// Instance constructed, deploy not yet requested.
    Created,

    /// Configuration gate and async-start hook in progress.
    Starting,

    /// Started successfully, processing work.
    Running,

    /// Stop hook in progress.
    Stopping,

    /// Stopped cleanly. Terminal.
    Stopped,

    /// Failed to start or failed at runtime. Terminal.
    Failed,
}

impl ComponentState {
    /// Check whether a transition to the next state is valid.
    pub fn can_transition_to(&self, next: ComponentState) -> bool {
        use ComponentState::*;
        if next == Failed {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Created, Starting) | (Starting, Running) | (Running, Stopping) | (Stopping, Stopped)
        )
    }

    /// Whether the component is serving.
    pub fn is_running(&self) -> bool {
        matches!(self, ComponentState::Running)
    }

    /// Whether this state admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ComponentState::Stopped | ComponentState::Failed)
    }
}
