//! Alert coordinator: a two-state machine driven by a table of plain
//! function pointers.
//!
//! ```text
//!   StateId   on_enter      on_exit      on_update
//!   ───────   ───────────   ──────────   ────────────
//!   Idle      -             -            idle_update
//!   Alert     alert_enter   alert_exit   alert_update
//! ```
//!
//! [`Fsm::tick`] runs the current row's `on_update`. A returned
//! `Some(next)` leaves the row through `on_exit` and enters `next`
//! through its `on_enter`; the new state's `on_update` first runs on the
//! following tick. Handlers share one [`FsmContext`](context::FsmContext).

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Coordinator states. The discriminant is the row in the state table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Idle = 0,
    Alert = 1,
}

impl StateId {
    pub const COUNT: usize = 2;
}

/// Entry/exit action.
pub type StateActionFn = fn(&mut FsmContext);

/// Per-tick handler; `Some(next)` requests a transition.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<StateId>;

/// One row of the state table.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    table: [StateDescriptor; StateId::COUNT],
    current: StateId,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial,
        }
    }

    fn row(&self, id: StateId) -> &StateDescriptor {
        &self.table[id as usize]
    }

    /// Enter the initial state. Call once, before the first tick.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM: starting in {}", self.row(self.current).name);
        if let Some(enter) = self.row(self.current).on_enter {
            enter(ctx);
        }
    }

    /// Evaluate the current state once, transitioning if it asks to.
    pub fn tick(&mut self, ctx: &mut FsmContext) {
        if let Some(next) = (self.row(self.current).on_update)(ctx) {
            if next != self.current {
                self.transition(next, ctx);
            }
        }
    }

    pub fn current_state(&self) -> StateId {
        self.current
    }

    fn transition(&mut self, next: StateId, ctx: &mut FsmContext) {
        info!("FSM: {} -> {}", self.row(self.current).name, self.row(next).name);
        if let Some(exit) = self.row(self.current).on_exit {
            exit(ctx);
        }
        self.current = next;
        if let Some(enter) = self.row(next).on_enter {
            enter(ctx);
        }
    }
}
