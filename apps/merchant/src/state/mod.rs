//! # State Module
//!
//! Shared state for the merchant views. One focused type per concern, so a
//! command asks only for what it touches.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────────┐   │
//! │  │   RedeemState    │  │  RegisterState   │  │    SessionState      │   │
//! │  │                  │  │                  │  │                      │   │
//! │  │  Arc<Mutex<      │  │  Arc<Mutex<      │  │  Arc<dyn             │   │
//! │  │   Redemption     │  │   Registration   │  │   SessionStore>      │   │
//! │  │   Form>>         │  │   Form>>         │  │                      │   │
//! │  └──────────────────┘  └──────────────────┘  └──────────────────────┘   │
//! │                                                                         │
//! │  Locks are held only for pure form updates, never across an await.     │
//! │  The busy flag inside each form is what keeps a second submit out       │
//! │  while a gateway call is in flight.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod forms;
mod session;

pub use forms::{RedeemState, RegisterState};
pub use session::SessionState;
