//! Canvas services used by the websocket and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! `history`, `undo` and `presence` are plain state containers. `dispatch`
//! composes them into the synchronization state machine, and `hub` runs that
//! machine on a single task and owns fan-out to connections.

pub mod dispatch;
pub mod history;
pub mod hub;
pub mod presence;
pub mod undo;
