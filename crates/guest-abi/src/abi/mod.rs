//! Reference guest ABIs and the guest-visible types they lay out.
//!
//! Each ABI plugs into the layout core exactly like an external one would:
//! an uninhabited enum implementing [`Abi`](crate::Abi), a position type and
//! one [`Allocate`](crate::Allocate) impl per (role, type) pair it marshals.
//!
//! ```text
//! ABI         Position seeded from   Argument storage
//! syscall64   nothing (default)      rdi rsi rdx r10 r8 r9
//! aapcs32     stack pointer          r0-r3, then stack at sp
//! cdecl32     stack pointer          stack at sp + 4
//! ```

mod aapcs32;
mod cdecl32;
mod syscall64;

pub use aapcs32::{Aapcs32, Aapcs32Position};
pub use cdecl32::{Cdecl32, Cdecl32Position};
pub use syscall64::{Syscall64, Syscall64Position};

/// Pointer-width guest value. Its size is the ABI's pointer size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GuestPtr(pub u64);

/// Opaque `N`-byte aggregate passed or returned by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Blob<const N: usize>(pub [u8; N]);

/// Round `value` up to a multiple of `align` (a power of two).
/// Guest address arithmetic wraps.
pub(crate) const fn align_up(value: u64, align: u64) -> u64 {
    value.wrapping_add(align - 1) & !(align - 1)
}
