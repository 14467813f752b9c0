//! Test harness for guest-abi unit and integration tests
//!
//! Provides a probe execution state that counts how often it is read, three
//! toy ABIs and an observer that logs steps. [`TwoRegisterAbi`] is
//! register-only with a default position, [`StackAbi`] is seeded from the
//! probe's stack pointer, and [`FrameAbi`] consults the machine's frame
//! register while allocating.
//!
//! # Example
//!
//! ```rust
//! use guest_abi::test_harness::*;
//! use guest_abi::{allocate_signature, initialize_position};
//!
//! let state = ProbeState::new(0x1000);
//! let mut position = initialize_position::<StackAbi>(&state);
//! allocate_signature::<StackAbi, i64, (i32,)>(&state, &mut position);
//! assert_eq!(position.offset, 0x1000 + 8 + 4);
//! ```

#![allow(
    clippy::must_use_candidate,
    clippy::missing_panics_doc,
    clippy::uninlined_format_args
)]

use std::cell::Cell;

use crate::abi::align_up;
use crate::definition::{Abi, Allocate, ArgumentRole, ResultRole};
use crate::layout::{DefaultPosition, InitPosition, LayoutObserver, Step};
use crate::state::MachineState;

/// Execution state exposing a stack pointer and counting reads of it.
#[derive(Debug, Default)]
pub struct ProbeState {
    stack_pointer: u64,
    reads: Cell<usize>,
}

impl ProbeState {
    pub fn new(stack_pointer: u64) -> Self {
        Self {
            stack_pointer,
            reads: Cell::new(0),
        }
    }

    pub fn stack_pointer(&self) -> u64 {
        self.reads.set(self.reads.get() + 1);
        self.stack_pointer
    }

    /// Number of times the stack pointer was read.
    pub fn reads(&self) -> usize {
        self.reads.get()
    }
}

/// Two-word aggregate: two registers as a result, one (by reference) as an
/// argument.
#[derive(Debug, Clone, Copy)]
pub struct Wide;

/// Registers a [`Wide`] result consumes under [`TwoRegisterAbi`].
pub const WIDE_RESULT_REGS: usize = 2;

/// Register file size of [`TwoRegisterAbi`].
pub const TWO_REGISTERS: usize = 2;

/// Register cursor that also records which argument landed where.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterCursor {
    pub used: usize,
    pub assigned: Vec<(&'static str, usize)>,
}

impl DefaultPosition for RegisterCursor {}

impl RegisterCursor {
    fn take(&mut self, name: &'static str) {
        self.assigned.push((name, self.used));
        self.used += 1;
    }
}

/// Register-only toy ABI with [`TWO_REGISTERS`] registers.
#[derive(Debug)]
pub enum TwoRegisterAbi {}

impl Abi for TwoRegisterAbi {
    const NAME: &'static str = "two-register";
    type State = ProbeState;
    type Position = RegisterCursor;
}

crate::default_allocation!(TwoRegisterAbi => ResultRole: (), i32, i64);

impl Allocate<ResultRole, Wide> for TwoRegisterAbi {
    fn allocate(_state: &ProbeState, position: &mut RegisterCursor) {
        position.used += WIDE_RESULT_REGS;
    }
}

impl Allocate<ArgumentRole, i32> for TwoRegisterAbi {
    fn allocate(_state: &ProbeState, position: &mut RegisterCursor) {
        position.take("i32");
    }
}

impl Allocate<ArgumentRole, i64> for TwoRegisterAbi {
    fn allocate(_state: &ProbeState, position: &mut RegisterCursor) {
        position.take("i64");
    }
}

impl Allocate<ArgumentRole, Wide> for TwoRegisterAbi {
    fn allocate(_state: &ProbeState, position: &mut RegisterCursor) {
        position.take("Wide");
    }
}

/// Stack cursor seeded from the probe's stack pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackCursor {
    pub offset: u64,
}

impl InitPosition<ProbeState> for StackCursor {
    fn init(state: &ProbeState) -> Self {
        Self {
            offset: state.stack_pointer(),
        }
    }
}

/// Stack-only toy ABI: everything is packed upwards from the stack pointer
/// with no padding, including an `i64` result.
#[derive(Debug)]
pub enum StackAbi {}

impl Abi for StackAbi {
    const NAME: &'static str = "stack";
    type State = ProbeState;
    type Position = StackCursor;
}

crate::default_allocation!(StackAbi => ResultRole: ());

impl Allocate<ResultRole, i64> for StackAbi {
    fn allocate(_state: &ProbeState, position: &mut StackCursor) {
        position.offset += 8;
    }
}

impl Allocate<ArgumentRole, i32> for StackAbi {
    fn allocate(_state: &ProbeState, position: &mut StackCursor) {
        position.offset += 4;
    }
}

impl Allocate<ArgumentRole, i64> for StackAbi {
    fn allocate(_state: &ProbeState, position: &mut StackCursor) {
        position.offset += 8;
    }
}

/// Register holding the frame address [`FrameAbi`] lays arguments out from.
pub const FRAME_REG: usize = 11;

/// Byte offset into the argument frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameCursor {
    pub offset: u64,
}

impl DefaultPosition for FrameCursor {}

/// Frame-based toy ABI. The position starts at offset zero without reading
/// state; `i64` arguments are aligned to 8 bytes against the absolute
/// address in [`FRAME_REG`], so their padding depends on the register file.
#[derive(Debug)]
pub enum FrameAbi {}

impl Abi for FrameAbi {
    const NAME: &'static str = "frame";
    type State = MachineState;
    type Position = FrameCursor;
}

crate::default_allocation!(FrameAbi => ResultRole: (), i32);

impl Allocate<ArgumentRole, i32> for FrameAbi {
    fn allocate(_state: &MachineState, position: &mut FrameCursor) {
        position.offset += 4;
    }
}

impl Allocate<ArgumentRole, i64> for FrameAbi {
    fn allocate(state: &MachineState, position: &mut FrameCursor) {
        let frame = state.register(FRAME_REG).unwrap_or(0);
        let slot = align_up(frame.wrapping_add(position.offset), 8);
        position.offset = slot.wrapping_sub(frame).wrapping_add(8);
    }
}

/// Observer recording every step and the full type name it allocated.
#[derive(Debug, Default)]
pub struct StepLog {
    pub steps: Vec<(Step, &'static str)>,
}

impl<A: Abi> LayoutObserver<A> for StepLog {
    fn observe(&mut self, step: Step, type_name: &'static str, _position: &A::Position) {
        self.steps.push((step, type_name));
    }
}
