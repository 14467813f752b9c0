#![allow(
    clippy::module_name_repetitions, // Aapcs32Position etc. read better than Position
    clippy::missing_errors_doc // error variants are documented on the Error enum
)]

//! Compile-time layout of guest call signatures over simulator ABIs.
//!
//! A layout walk seeds a position for an [`Abi`], then advances it through
//! the result type and each argument type of a signature in order. Each ABI
//! decides per (role, type) pair how far the position moves; pairs it does
//! not customize move it not at all.
//!
//! ```
//! use guest_abi::abi::{Aapcs32, GuestPtr};
//! use guest_abi::state::MachineState;
//! use guest_abi::{allocate_call, initialize_position};
//!
//! let state = MachineState::new().with_stack_pointer(0x8000);
//! let mut position = initialize_position::<Aapcs32>(&state);
//! allocate_call::<Aapcs32, fn(i32, GuestPtr, u32, i64) -> i32>(&state, &mut position);
//!
//! // r0-r2 for the words, r3 skipped, the i64 on the stack.
//! assert_eq!(position.ncrn(), 4);
//! assert_eq!(position.nsaa(), 0x8008);
//! ```

pub mod abi;
pub mod catalog;
pub mod definition;
pub mod error;
pub mod layout;
pub mod report;
pub mod state;

/// Test harness module for writing unit and integration tests.
///
/// This module is only available when running tests or when the
/// `test-harness` feature is enabled.
#[cfg(any(test, feature = "test-harness"))]
pub mod test_harness;

pub use definition::{Abi, Allocate, ArgumentRole, ResultRole, Role, RoleKind};
pub use error::{Error, Result};
pub use layout::{
    Arguments, DefaultPosition, InitPosition, LayoutObserver, Signature, Step, allocate,
    allocate_arguments, allocate_call, allocate_call_with, allocate_result, allocate_result_with,
    allocate_signature, allocate_signature_with, initialize_position,
};
pub use report::{LayoutReport, PositionUsage, StepLayout, describe};
pub use state::MachineState;
