//! 32-bit stack-only C convention.
//!
//! On entry the return address sits at the stack pointer, so arguments
//! start at `sp + 4` and each one occupies its size rounded up to 4 bytes.
//! Aggregate results too large for `edx:eax` are written through a hidden
//! pointer that the caller pushes ahead of the first argument.

use super::{Blob, GuestPtr, align_up};
use crate::definition::{Abi, Allocate, ArgumentRole, ResultRole};
use crate::layout::InitPosition;
use crate::report::PositionUsage;
use crate::state::MachineState;

/// Bytes of return address between the stack pointer and the arguments.
pub const RETURN_ADDRESS_SIZE: u64 = 4;

/// Stack slot granularity.
pub const SLOT_SIZE: u64 = 4;

/// Largest aggregate returned in `edx:eax`.
pub const MAX_REGISTER_AGGREGATE: usize = 8;

#[derive(Debug)]
pub enum Cdecl32 {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cdecl32Position {
    base: u64,
    next: u64,
}

impl InitPosition<MachineState> for Cdecl32Position {
    fn init(state: &MachineState) -> Self {
        let base = state.stack_pointer().wrapping_add(RETURN_ADDRESS_SIZE);
        Self { base, next: base }
    }
}

impl Cdecl32Position {
    /// Address of the first argument slot.
    #[must_use]
    pub const fn base(&self) -> u64 {
        self.base
    }

    /// Address of the next free argument slot.
    #[must_use]
    pub const fn next(&self) -> u64 {
        self.next
    }

    fn push(&mut self, size: u64) {
        self.next = self.next.wrapping_add(align_up(size, SLOT_SIZE));
    }
}

impl PositionUsage for Cdecl32Position {
    fn registers_used(&self) -> usize {
        0
    }

    fn stack_used(&self) -> u64 {
        self.next.wrapping_sub(self.base)
    }
}

impl Abi for Cdecl32 {
    const NAME: &'static str = "cdecl32";
    type State = MachineState;
    type Position = Cdecl32Position;
}

crate::default_allocation!(Cdecl32 => ResultRole: (), u8, u16, u32, i32, u64, i64, GuestPtr);

impl<const N: usize> Allocate<ResultRole, Blob<N>> for Cdecl32 {
    fn allocate(_state: &MachineState, position: &mut Cdecl32Position) {
        if N > MAX_REGISTER_AGGREGATE {
            position.push(SLOT_SIZE);
        }
    }
}

macro_rules! stack_argument {
    ($($ty:ty => $size:expr),+ $(,)?) => {
        $(
            impl Allocate<ArgumentRole, $ty> for Cdecl32 {
                fn allocate(_state: &MachineState, position: &mut Cdecl32Position) {
                    position.push($size);
                }
            }
        )+
    };
}

stack_argument!(
    u8 => 1,
    u16 => 2,
    u32 => 4,
    i32 => 4,
    GuestPtr => 4,
    u64 => 8,
    i64 => 8,
);

impl<const N: usize> Allocate<ArgumentRole, Blob<N>> for Cdecl32 {
    fn allocate(_state: &MachineState, position: &mut Cdecl32Position) {
        position.push(N as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{allocate_call, initialize_position};

    fn state() -> MachineState {
        MachineState::new().with_stack_pointer(0x1000)
    }

    #[test]
    fn test_position_skips_return_address() {
        let position = initialize_position::<Cdecl32>(&state());
        assert_eq!(position.base(), 0x1004);
        assert_eq!(position.next(), 0x1004);
        assert_eq!(position.stack_used(), 0);
    }

    #[test]
    fn test_small_arguments_are_promoted() {
        let state = state();
        let mut position = initialize_position::<Cdecl32>(&state);

        allocate_call::<Cdecl32, fn(u8, u16, i64, Blob<3>)>(&state, &mut position);

        assert_eq!(position.stack_used(), 4 + 4 + 8 + 4);
        assert_eq!(position.registers_used(), 0);
    }

    #[test]
    fn test_large_aggregate_result_takes_hidden_pointer() {
        let state = state();

        let mut position = initialize_position::<Cdecl32>(&state);
        allocate_call::<Cdecl32, fn(i32) -> Blob<16>>(&state, &mut position);
        assert_eq!(position.next(), 0x1004 + 4 + 4);

        let mut position = initialize_position::<Cdecl32>(&state);
        allocate_call::<Cdecl32, fn(i32) -> Blob<8>>(&state, &mut position);
        assert_eq!(position.next(), 0x1004 + 4);
    }

    #[test]
    fn test_wrapping_stack_pointer() {
        let state = MachineState::new().with_stack_pointer(u64::MAX - 1);
        let mut position = initialize_position::<Cdecl32>(&state);

        allocate_call::<Cdecl32, fn(i32, i32)>(&state, &mut position);

        assert_eq!(position.base(), 2);
        assert_eq!(position.stack_used(), 8);
    }
}
