//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers: no closures, no dynamic
//! dispatch.
//!
//! ```text
//!  IDLE ──[occupancy FULL]──▶ ALERT
//!    ▲                          │
//!    └──[GREEN + scan + soap]───┘
//!
//!  ALERT buzzer submode:
//!    OFF ◀──[scan]── GRACE ──[15 s, no scan]──▶ CONSTANT
//!     │                                            ▲
//!     └────[30 s after scan, FULL]─────────────────┘
//!     └────[60 s after scan, not GREEN]────────────┘
//! ```

use log::info;

use super::context::{AlertSession, FsmContext};
use super::{StateDescriptor, StateId};
use crate::protocol::{BuzzerMode, Message, Status};
use crate::sensors::presence::Occupancy;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0 — Idle
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: None,
            on_exit: None,
            on_update: idle_update,
        },
        // Index 1 — Alert
        StateDescriptor {
            id: StateId::Alert,
            name: "Alert",
            on_enter: Some(alert_enter),
            on_exit: Some(alert_exit),
            on_update: alert_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state
// ═══════════════════════════════════════════════════════════════════════════

fn idle_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.occupancy == Occupancy::Full {
        return Some(StateId::Alert);
    }
    ctx.announce_status(ctx.occupancy.status());
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ALERT state — sink blocked, waiting for someone to scan and clean
// ═══════════════════════════════════════════════════════════════════════════

fn alert_enter(ctx: &mut FsmContext) {
    ctx.session = Some(AlertSession::open(ctx.now_ms));
    ctx.resolution = None;
    ctx.push(Message::Buzzer(BuzzerMode::Grace));
    ctx.announce_status(ctx.occupancy.status());
    info!("ALERT: both zones blocked, grace period started");
}

fn alert_exit(ctx: &mut FsmContext) {
    ctx.session = None;
}

fn alert_update(ctx: &mut FsmContext) -> Option<StateId> {
    let Some(session) = ctx.session.as_ref() else {
        return Some(StateId::Idle);
    };

    let display = if session.buzzer == BuzzerMode::Constant {
        Status::Red
    } else {
        ctx.occupancy.status()
    };

    if display == Status::Green && session.is_resolvable() {
        info!("ALERT: resolved by {:?}", session.scanned);
        ctx.resolution = session.scanned.clone();
        return Some(StateId::Idle);
    }

    ctx.announce_status(display);
    evolve_buzzer(ctx, display);
    None
}

/// Advance the buzzer submode for one tick of an unresolved alert.
fn evolve_buzzer(ctx: &mut FsmContext, display: Status) {
    let now = ctx.now_ms;
    let full = ctx.occupancy == Occupancy::Full;
    let cfg = &ctx.config;
    let (grace, scan_grace, scan_timeout) = (
        u64::from(cfg.grace_period_ms),
        u64::from(cfg.scan_grace_ms),
        u64::from(cfg.scan_timeout_ms),
    );
    let Some(session) = ctx.session.as_mut() else {
        return;
    };

    if let Some(scan_ms) = session.scan_ms {
        let since_scan = now.saturating_sub(scan_ms);
        if since_scan < scan_grace {
            ctx.set_buzzer(BuzzerMode::Off);
        } else if since_scan < scan_timeout {
            if full {
                ctx.set_buzzer(BuzzerMode::Constant);
            }
        } else if display != Status::Green {
            ctx.set_buzzer(BuzzerMode::Constant);
        }
        return;
    }

    if session.buzzer == BuzzerMode::Constant {
        return;
    }

    let since_start = now.saturating_sub(session.start_ms);
    if since_start >= grace {
        info!("ALERT: grace period expired without a scan");
        ctx.set_buzzer(BuzzerMode::Constant);
    } else if full {
        ctx.set_buzzer(BuzzerMode::Grace);
    } else {
        // Obstruction cleared before grace ran out: restart the window.
        session.start_ms = now;
        ctx.set_buzzer(BuzzerMode::Off);
    }
}
