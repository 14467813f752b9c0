//! 32-bit Arm procedure call convention (base variant, no VFP).
//!
//! Arguments are assigned to r0-r3 and then to the stack starting at the
//! stack pointer. The position tracks the next core register number (NCRN)
//! and the next stacked argument address (NSAA), so it has to be seeded from
//! the thread's stack pointer. An unaligned stack pointer is rounded up to a
//! word before the first argument is stacked.
//!
//! - Word-sized scalars take one register, or one 4-byte stack slot.
//! - 64-bit scalars take an even-aligned register pair. If the pair does not
//!   fit, the remaining core registers are abandoned and the value goes to an
//!   8-byte aligned stack slot.
//! - Aggregates are split between the remaining registers and the stack, as
//!   long as nothing has been stacked yet.
//! - Aggregate results larger than a word are returned in memory; the caller
//!   passes the address in r0, which the result step reserves.

// Word sizes and counts are small; casts between u64 and usize cannot truncate.
#![allow(clippy::cast_possible_truncation)]

use super::{Blob, GuestPtr, align_up};
use crate::definition::{Abi, Allocate, ArgumentRole, ResultRole};
use crate::layout::InitPosition;
use crate::report::PositionUsage;
use crate::state::MachineState;

/// Core argument registers r0-r3.
pub const ARG_REGS: [&str; 4] = ["r0", "r1", "r2", "r3"];

/// Stack slot size and alignment for word arguments.
pub const WORD_SIZE: u64 = 4;

/// Stack alignment for 64-bit arguments.
pub const DOUBLE_WORD_ALIGN: u64 = 8;

/// Largest aggregate returned in r0 rather than in memory.
pub const MAX_REGISTER_AGGREGATE: usize = 4;

#[derive(Debug)]
pub enum Aapcs32 {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aapcs32Position {
    ncrn: usize,
    nsaa: u64,
    stack_base: u64,
}

impl InitPosition<MachineState> for Aapcs32Position {
    fn init(state: &MachineState) -> Self {
        let base = align_up(state.stack_pointer(), WORD_SIZE);
        Self {
            ncrn: 0,
            nsaa: base,
            stack_base: base,
        }
    }
}

impl Aapcs32Position {
    /// Next core register number.
    #[must_use]
    pub const fn ncrn(&self) -> usize {
        self.ncrn
    }

    /// Next stacked argument address.
    #[must_use]
    pub const fn nsaa(&self) -> u64 {
        self.nsaa
    }

    /// Word-aligned stack pointer the position was seeded from.
    #[must_use]
    pub const fn stack_base(&self) -> u64 {
        self.stack_base
    }

    fn take_word(&mut self) {
        if self.ncrn < ARG_REGS.len() {
            self.ncrn += 1;
        } else {
            self.nsaa = align_up(self.nsaa, WORD_SIZE).wrapping_add(WORD_SIZE);
        }
    }

    fn take_double_word(&mut self) {
        let ncrn = self.ncrn.next_multiple_of(2);
        if ncrn + 2 <= ARG_REGS.len() {
            self.ncrn = ncrn + 2;
        } else {
            self.ncrn = ARG_REGS.len();
            self.nsaa = align_up(self.nsaa, DOUBLE_WORD_ALIGN).wrapping_add(DOUBLE_WORD_ALIGN);
        }
    }

    fn take_aggregate(&mut self, size: usize) {
        let words = size.div_ceil(WORD_SIZE as usize);
        if words == 0 {
            return;
        }

        if self.ncrn < ARG_REGS.len() && self.nsaa == self.stack_base {
            let in_regs = words.min(ARG_REGS.len() - self.ncrn);
            self.ncrn += in_regs;
            self.nsaa = self
                .nsaa
                .wrapping_add(((words - in_regs) as u64).wrapping_mul(WORD_SIZE));
        } else {
            self.ncrn = ARG_REGS.len();
            self.nsaa =
                align_up(self.nsaa, WORD_SIZE).wrapping_add((words as u64).wrapping_mul(WORD_SIZE));
        }
    }
}

impl PositionUsage for Aapcs32Position {
    fn registers_used(&self) -> usize {
        self.ncrn
    }

    fn stack_used(&self) -> u64 {
        self.nsaa.wrapping_sub(self.stack_base)
    }

    fn register_name(&self, index: usize) -> Option<&'static str> {
        ARG_REGS.get(index).copied()
    }
}

impl Abi for Aapcs32 {
    const NAME: &'static str = "aapcs32";
    type State = MachineState;
    type Position = Aapcs32Position;
}

// Scalars come back in r0 or r0:r1 and reserve nothing.
crate::default_allocation!(Aapcs32 => ResultRole: (), u8, u16, u32, i32, u64, i64, GuestPtr);

impl<const N: usize> Allocate<ResultRole, Blob<N>> for Aapcs32 {
    fn allocate(_state: &MachineState, position: &mut Aapcs32Position) {
        if N > MAX_REGISTER_AGGREGATE {
            position.take_word();
        }
    }
}

macro_rules! word_argument {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Allocate<ArgumentRole, $ty> for Aapcs32 {
                fn allocate(_state: &MachineState, position: &mut Aapcs32Position) {
                    position.take_word();
                }
            }
        )+
    };
}

word_argument!(u8, u16, u32, i32, GuestPtr);

impl Allocate<ArgumentRole, u64> for Aapcs32 {
    fn allocate(_state: &MachineState, position: &mut Aapcs32Position) {
        position.take_double_word();
    }
}

impl Allocate<ArgumentRole, i64> for Aapcs32 {
    fn allocate(_state: &MachineState, position: &mut Aapcs32Position) {
        position.take_double_word();
    }
}

impl<const N: usize> Allocate<ArgumentRole, Blob<N>> for Aapcs32 {
    fn allocate(_state: &MachineState, position: &mut Aapcs32Position) {
        position.take_aggregate(N);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{allocate, allocate_call, allocate_result, initialize_position};

    fn state() -> MachineState {
        MachineState::new().with_stack_pointer(0x8000)
    }

    #[test]
    fn test_position_seeded_from_stack_pointer() {
        let position = initialize_position::<Aapcs32>(&state());
        assert_eq!(position.ncrn(), 0);
        assert_eq!(position.nsaa(), 0x8000);
        assert_eq!(position.stack_base(), 0x8000);
    }

    #[test]
    fn test_unaligned_stack_pointer_rounds_up_to_word() {
        let state = MachineState::new().with_stack_pointer(0x8002);
        let mut position = initialize_position::<Aapcs32>(&state);
        assert_eq!(position.stack_base(), 0x8004);

        allocate_call::<Aapcs32, fn(i32, i32, i32, i32, i32)>(&state, &mut position);

        assert_eq!(position.nsaa(), 0x8008);
        assert_eq!(position.stack_used(), 4, "one stacked word is four bytes");
    }

    #[test]
    fn test_unaligned_stack_pointer_split_aggregate_stays_aligned() {
        let state = MachineState::new().with_stack_pointer(0x8001);
        let mut position = initialize_position::<Aapcs32>(&state);

        allocate_call::<Aapcs32, fn(Blob<12>, Blob<12>, i32)>(&state, &mut position);

        assert_eq!(position.nsaa() % WORD_SIZE, 0);
        assert_eq!(position.stack_used(), 8 + 4);
    }

    #[test]
    fn test_huge_aggregate_wraps_instead_of_overflowing() {
        let state = state();
        let mut position = initialize_position::<Aapcs32>(&state);

        position.take_aggregate(usize::MAX);

        assert_eq!(position.ncrn(), 4);
        let words = usize::MAX.div_ceil(4) as u64;
        let expected = 0x8000u64.wrapping_add((words - 4).wrapping_mul(WORD_SIZE));
        assert_eq!(position.nsaa(), expected);
    }

    #[test]
    fn test_words_fill_registers_then_stack() {
        let state = state();
        let mut position = initialize_position::<Aapcs32>(&state);

        allocate_call::<Aapcs32, fn(i32, u32, GuestPtr, u8, u16, i32)>(&state, &mut position);

        assert_eq!(position.ncrn(), 4);
        assert_eq!(position.nsaa(), 0x8008);
    }

    #[test]
    fn test_double_word_uses_even_pair() {
        let state = state();
        let mut position = initialize_position::<Aapcs32>(&state);

        // i32 in r0, r1 skipped, i64 in r2:r3.
        allocate_call::<Aapcs32, fn(i32, i64)>(&state, &mut position);

        assert_eq!(position.ncrn(), 4);
        assert_eq!(position.stack_used(), 0);
    }

    #[test]
    fn test_double_word_spills_aligned() {
        let state = state();
        let mut position = initialize_position::<Aapcs32>(&state);

        // r0-r2 taken, i64 cannot use r3 and goes to the stack.
        allocate_call::<Aapcs32, fn(i32, i32, i32, i64, i32)>(&state, &mut position);

        assert_eq!(position.ncrn(), 4);
        assert_eq!(position.nsaa(), 0x8000 + 8 + 4);
    }

    #[test]
    fn test_double_word_stack_alignment() {
        let state = state();
        let mut position = initialize_position::<Aapcs32>(&state);

        allocate_call::<Aapcs32, fn(i32, i32, i32, i32, i32, u64)>(&state, &mut position);

        // One word at 0x8000, the u64 aligned up to 0x8008.
        assert_eq!(position.nsaa(), 0x8010);
    }

    #[test]
    fn test_aggregate_split_across_registers_and_stack() {
        let state = state();
        let mut position = initialize_position::<Aapcs32>(&state);

        allocate_call::<Aapcs32, fn(Blob<12>, Blob<12>)>(&state, &mut position);

        // First in r0-r2, second in r3 plus 8 stack bytes.
        assert_eq!(position.ncrn(), 4);
        assert_eq!(position.stack_used(), 8);
    }

    #[test]
    fn test_aggregate_not_split_once_stacked() {
        let state = state();
        let mut position = initialize_position::<Aapcs32>(&state);

        // The i64 stacks while r3 is still free; the blob must not use r3.
        allocate_call::<Aapcs32, fn(i32, i32, i32, i64)>(&state, &mut position);
        allocate::<Aapcs32, ArgumentRole, Blob<6>>(&state, &mut position);

        assert_eq!(position.nsaa(), 0x8000 + 8 + 8);
    }

    #[test]
    fn test_large_aggregate_result_reserves_r0() {
        let state = state();

        let mut position = initialize_position::<Aapcs32>(&state);
        allocate_result::<Aapcs32, Blob<8>>(&state, &mut position);
        assert_eq!(position.ncrn(), 1);

        let mut position = initialize_position::<Aapcs32>(&state);
        allocate_result::<Aapcs32, Blob<4>>(&state, &mut position);
        assert_eq!(position.ncrn(), 0);

        let mut position = initialize_position::<Aapcs32>(&state);
        allocate_result::<Aapcs32, i64>(&state, &mut position);
        assert_eq!(position.ncrn(), 0);
    }

    #[test]
    fn test_result_and_argument_roles_differ() {
        let state = state();

        let mut as_result = initialize_position::<Aapcs32>(&state);
        allocate_result::<Aapcs32, Blob<8>>(&state, &mut as_result);

        let mut as_argument = initialize_position::<Aapcs32>(&state);
        allocate::<Aapcs32, ArgumentRole, Blob<8>>(&state, &mut as_argument);

        assert_eq!(as_result.ncrn(), 1);
        assert_eq!(as_argument.ncrn(), 2);
    }
}
