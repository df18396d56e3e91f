//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern, driven by mailbox events instead of ticks:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                    │
//! │  ┌─────────────────┬──────────┬─────────┬───────────────────┐  │
//! │  │ StateId         │ on_enter │ on_exit │ on_event          │  │
//! │  ├─────────────────┼──────────┼─────────┼───────────────────┤  │
//! │  │ Bootstrapping   │ -        │ -       │ fn(ctx,ev)->Opt<> │  │
//! │  │ ApActive        │ fn(ctx)  │ -       │ fn(ctx,ev)->Opt<> │  │
//! │  │ ServiceStarting │ fn(ctx)  │ -       │ fn(ctx,ev)->Opt<> │  │
//! │  │ StaIdle         │ -        │ -       │ fn(ctx,ev)->Opt<> │  │
//! │  │ StaConnecting   │ -        │ -       │ fn(ctx,ev)->Opt<> │  │
//! │  │ StaConnected    │ -        │ fn(ctx) │ fn(ctx,ev)->Opt<> │  │
//! │  └─────────────────┴──────────┴─────────┴───────────────────┘  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! For every event the engine calls `on_event` for the **current** state.
//! If it returns `Some(next_id)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next, and updates the current
//! pointer.  Handlers never perform I/O: they only mutate
//! [`FsmContext`] and append [`Command`](crate::app::commands::Command)s
//! to its outbox.

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;

use crate::app::events::OrchestratorEvent;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all connectivity states.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    /// Initial state, before the radio is touched.
    Bootstrapping = 0,
    /// Soft-AP configured, waiting for it to come up.
    ApActive = 1,
    /// Waiting for the HTTP facade to report readiness.
    ServiceStarting = 2,
    /// Service ready, no station attempt in progress.
    StaIdle = 3,
    /// Service ready, station associating / waiting for an address.
    StaConnecting = 4,
    /// Service ready, station has an address.
    StaConnected = 5,
}

impl StateId {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 6;

    /// Convert a table index back to `StateId`.  Returns `Bootstrapping` on
    /// out-of-range input in release builds.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Bootstrapping,
            1 => Self::ApActive,
            2 => Self::ServiceStarting,
            3 => Self::StaIdle,
            4 => Self::StaConnecting,
            5 => Self::StaConnected,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Bootstrapping
            }
        }
    }

    /// True in every `ServiceReady/*` sub-state.
    pub fn is_service_ready(self) -> bool {
        matches!(self, Self::StaIdle | Self::StaConnecting | Self::StaConnected)
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn = fn(&mut FsmContext);

/// Signature for the per-event handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateEventFn = fn(&mut FsmContext, &OrchestratorEvent) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_event: StateEventFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// Events handled since construction.
    event_count: u64,
    /// Event count at which the current state was entered.
    state_entry_event: u64,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            event_count: 0,
            state_entry_event: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Feed one event to the current state's handler and apply the
    /// transition it requests.
    pub fn handle(&mut self, event: &OrchestratorEvent, ctx: &mut FsmContext) {
        self.event_count += 1;

        let next = (self.table[self.current].on_event)(ctx, event);

        if let Some(next_id) = next {
            if next_id as usize != self.current {
                self.transition(next_id, ctx);
            }
        }
    }

    /// Force an immediate transition, bypassing `on_event`.  Used for the
    /// internal "init complete" step out of `Bootstrapping`.
    pub fn force_transition(&mut self, next: StateId, ctx: &mut FsmContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    /// Events handled since construction.
    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    /// How many events the FSM has handled in the current state.
    pub fn events_in_current_state(&self) -> u64 {
        self.event_count - self.state_entry_event
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut FsmContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.state_entry_event = self.event_count;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
