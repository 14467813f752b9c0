//! 64-bit register-only syscall convention.
//!
//! Arguments go in six fixed registers, one register per scalar. The result
//! comes back in `rax` and takes no argument storage, so every result type
//! uses the default allocation. The position needs no execution state.

use super::{Blob, GuestPtr};
use crate::definition::{Abi, Allocate, ArgumentRole, ResultRole};
use crate::layout::DefaultPosition;
use crate::report::PositionUsage;
use crate::state::MachineState;

/// Argument registers, in order.
pub const ARG_REGS: [&str; 6] = ["rdi", "rsi", "rdx", "r10", "r8", "r9"];

/// Size of one argument register in bytes.
pub const REG_SIZE: usize = 8;

#[derive(Debug)]
pub enum Syscall64 {}

/// Index of the next free argument register.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Syscall64Position {
    next: usize,
}

impl DefaultPosition for Syscall64Position {}

impl Syscall64Position {
    #[must_use]
    pub const fn next(&self) -> usize {
        self.next
    }

    /// More arguments were allocated than there are registers.
    #[must_use]
    pub const fn overflowed(&self) -> bool {
        self.next > ARG_REGS.len()
    }

    fn take(&mut self, count: usize) {
        let was_overflowed = self.overflowed();
        self.next += count;
        if self.overflowed() && !was_overflowed {
            tracing::warn!(
                registers = self.next,
                available = ARG_REGS.len(),
                "syscall arguments exceed the argument registers"
            );
        }
    }
}

impl PositionUsage for Syscall64Position {
    fn registers_used(&self) -> usize {
        self.next
    }

    fn stack_used(&self) -> u64 {
        0
    }

    fn register_name(&self, index: usize) -> Option<&'static str> {
        ARG_REGS.get(index).copied()
    }
}

impl Abi for Syscall64 {
    const NAME: &'static str = "syscall64";
    type State = MachineState;
    type Position = Syscall64Position;
}

crate::default_allocation!(Syscall64 => ResultRole: (), u8, u16, u32, i32, u64, i64, GuestPtr);

impl<const N: usize> Allocate<ResultRole, Blob<N>> for Syscall64 {}

macro_rules! one_register {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Allocate<ArgumentRole, $ty> for Syscall64 {
                fn allocate(_state: &MachineState, position: &mut Syscall64Position) {
                    position.take(1);
                }
            }
        )+
    };
}

one_register!(u8, u16, u32, i32, u64, i64, GuestPtr);

impl<const N: usize> Allocate<ArgumentRole, Blob<N>> for Syscall64 {
    fn allocate(_state: &MachineState, position: &mut Syscall64Position) {
        position.take(N.div_ceil(REG_SIZE));
    }
}
