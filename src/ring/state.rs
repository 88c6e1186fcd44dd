#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CycleState {
    Stopped,           // No cycle is live, nothing will fire
    Idle,              // Cycle just started, dark beat before the first slot
    Activating(usize), // Slots 1..=k are lit, the rest are dark
    AllOn,             // Every slot is lit
    Cleanup,           // All slots forced off, restart pending
}

impl CycleState {
    /// Number of leading slots lit in this state, given a sequence of `len` slots.
    pub fn lit(self, len: usize) -> usize {
        match self {
            CycleState::Activating(k) => k,
            CycleState::AllOn => len,
            CycleState::Stopped | CycleState::Idle | CycleState::Cleanup => 0,
        }
    }
}
