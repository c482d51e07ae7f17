//! Run-time state machine
//!
//! - States and hold origins ([`state`])
//! - Pure transition table with highest-first hold resolution ([`transitions`])
//! - The controller that owns all instrument state and runs one polling
//!   loop iteration per [`Controller::tick`] ([`controller`])
//! - Startup stability sampling ([`startup`]), menus ([`menu`]), debug view
//!   helpers ([`debug`]), and the display snapshot ([`view`])

pub mod controller;
pub mod debug;
pub mod menu;
pub mod startup;
pub mod state;
pub mod transitions;
pub mod view;

pub use controller::{Controller, Precondition};
pub use state::{DebugView, HoldOrigin, State};
pub use transitions::{Action, Event, HoldLevel, Transition};
pub use view::{Page, StatusView, StreamSummary};
