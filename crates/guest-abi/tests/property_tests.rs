//! Property-based tests for the layout walk.
//!
//! Uses `proptest` to generate execution states and verify invariants:
//! - Default positions never read the execution state
//! - Seeded positions start exactly where the state says
//! - A signature walk equals the sequence of its individual steps
//! - Cursors never move backwards across steps
//! - Stacked words stay word-sized for any stack pointer

use guest_abi::abi::{Aapcs32, Blob, Cdecl32, GuestPtr, Syscall64};
use guest_abi::catalog::{AbiKind, GUEST_CALLS, describe_call};
use guest_abi::test_harness::*;
use guest_abi::{
    ArgumentRole, MachineState, PositionUsage, allocate, allocate_call, allocate_result,
    allocate_signature, initialize_position,
};
use proptest::prelude::*;

fn stack_pointer() -> impl Strategy<Value = u64> {
    // Word-aligned 32-bit addresses, like a real guest stack.
    (0u64..=0xFFFF_FFFF).prop_map(|sp| sp & !3)
}

proptest! {
    #[test]
    fn default_position_never_reads_state(sp in any::<u64>()) {
        let state = ProbeState::new(sp);
        let position = initialize_position::<TwoRegisterAbi>(&state);

        prop_assert_eq!(position, RegisterCursor::default());
        prop_assert_eq!(state.reads(), 0);
    }

    #[test]
    fn seeded_position_starts_at_stack_pointer(sp in stack_pointer()) {
        let state = ProbeState::new(sp);
        let position = initialize_position::<StackAbi>(&state);

        prop_assert_eq!(position.offset, sp);
        prop_assert_eq!(state.reads(), 1);
    }

    #[test]
    fn result_step_advances_exactly(sp in stack_pointer()) {
        let state = ProbeState::new(sp);
        let mut position = initialize_position::<StackAbi>(&state);

        allocate_result::<StackAbi, ()>(&state, &mut position);
        prop_assert_eq!(position.offset, sp);

        allocate_result::<StackAbi, i64>(&state, &mut position);
        prop_assert_eq!(position.offset, sp + 8);
    }

    #[test]
    fn signature_equals_sequential_steps(sp in stack_pointer()) {
        let state = MachineState::new().with_stack_pointer(sp);

        let mut walked = initialize_position::<Aapcs32>(&state);
        allocate_signature::<Aapcs32, Blob<8>, (i32, i64, Blob<12>)>(&state, &mut walked);

        let mut stepped = initialize_position::<Aapcs32>(&state);
        allocate_result::<Aapcs32, Blob<8>>(&state, &mut stepped);
        allocate::<Aapcs32, ArgumentRole, i32>(&state, &mut stepped);
        allocate::<Aapcs32, ArgumentRole, i64>(&state, &mut stepped);
        allocate::<Aapcs32, ArgumentRole, Blob<12>>(&state, &mut stepped);

        prop_assert_eq!(walked, stepped);
    }

    #[test]
    fn zero_argument_signature_is_result_only(sp in stack_pointer()) {
        let state = MachineState::new().with_stack_pointer(sp);

        let mut walked = initialize_position::<Cdecl32>(&state);
        allocate_signature::<Cdecl32, Blob<24>, ()>(&state, &mut walked);

        let mut result_only = initialize_position::<Cdecl32>(&state);
        allocate_result::<Cdecl32, Blob<24>>(&state, &mut result_only);

        prop_assert_eq!(walked, result_only);
    }

    #[test]
    fn stack_layout_is_translation_invariant(sp in stack_pointer()) {
        let base = MachineState::new().with_stack_pointer(0x1000);
        let moved = MachineState::new().with_stack_pointer(sp);

        let mut at_base = initialize_position::<Cdecl32>(&base);
        allocate_call::<Cdecl32, fn(u8, GuestPtr, i64, Blob<5>) -> Blob<12>>(&base, &mut at_base);

        let mut at_sp = initialize_position::<Cdecl32>(&moved);
        allocate_call::<Cdecl32, fn(u8, GuestPtr, i64, Blob<5>) -> Blob<12>>(&moved, &mut at_sp);

        prop_assert_eq!(at_base.next() - at_base.base(), at_sp.next() - at_sp.base());
    }

    #[test]
    fn aapcs32_stacked_words_are_four_bytes(sp in 0u64..=0xFFFF_FFFF) {
        let state = MachineState::new().with_stack_pointer(sp);
        let mut position = initialize_position::<Aapcs32>(&state);
        allocate_call::<Aapcs32, fn(i32, i32, i32, i32, i32, Blob<12>)>(&state, &mut position);

        prop_assert_eq!(position.stack_base() % 4, 0);
        prop_assert!(position.stack_base() >= sp);
        prop_assert_eq!(position.stack_used(), 4 + 12);
    }

    #[test]
    fn catalog_cursors_never_rewind(sp in stack_pointer()) {
        let state = MachineState::new().with_stack_pointer(sp);
        for call in GUEST_CALLS {
            for abi in AbiKind::ALL {
                let report = describe_call(abi, call.name, &state).unwrap();
                let mut registers = 0;
                let mut stack = 0;
                for step in report.steps() {
                    prop_assert_eq!(step.registers.start, registers);
                    prop_assert_eq!(step.stack.start, stack);
                    prop_assert!(step.registers.start <= step.registers.end);
                    prop_assert!(step.stack.start <= step.stack.end);
                    registers = step.registers.end;
                    stack = step.stack.end;
                }
                prop_assert_eq!(report.registers_used(), registers);
                prop_assert_eq!(report.stack_used(), stack);
            }
        }
    }

    #[test]
    fn syscall_layout_ignores_state(sp in any::<u64>(), r0 in any::<u64>()) {
        let state = MachineState::new()
            .with_stack_pointer(sp)
            .with_register(0, r0)
            .unwrap();

        let mut position = initialize_position::<Syscall64>(&state);
        allocate_call::<Syscall64, fn(GuestPtr, u32, i32, i32, i32, i64) -> GuestPtr>(
            &state,
            &mut position,
        );

        prop_assert_eq!(position.next(), 6);
    }
}
