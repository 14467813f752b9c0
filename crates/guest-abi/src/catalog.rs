//! Named guest calls and runtime selection of a reference ABI.
//!
//! Every call's signature is fixed at compile time; the table below expands
//! into one monomorphized layout walk per (call, ABI) pair, and a name lookup
//! just picks among them.

use std::fmt;
use std::str::FromStr;

use crate::abi::{Aapcs32, Blob, Cdecl32, GuestPtr, Syscall64};
use crate::report::{LayoutReport, describe};
use crate::state::MachineState;
use crate::{Abi, Error, Result};

/// The reference ABIs, selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbiKind {
    Syscall64,
    Aapcs32,
    Cdecl32,
}

impl AbiKind {
    pub const ALL: [AbiKind; 3] = [AbiKind::Syscall64, AbiKind::Aapcs32, AbiKind::Cdecl32];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            AbiKind::Syscall64 => Syscall64::NAME,
            AbiKind::Aapcs32 => Aapcs32::NAME,
            AbiKind::Cdecl32 => Cdecl32::NAME,
        }
    }
}

impl fmt::Display for AbiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AbiKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownAbi {
                name: s.to_string(),
                expected: Self::ALL.map(AbiKind::name).join(", "),
            })
    }
}

/// A catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuestCall {
    pub name: &'static str,
    pub summary: &'static str,
}

macro_rules! guest_calls {
    ($($name:literal => $sig:ty, $summary:literal;)+) => {
        /// Every call [`describe_call`] knows, in table order.
        pub const GUEST_CALLS: &[GuestCall] = &[
            $(GuestCall { name: $name, summary: $summary },)+
        ];

        /// Lay out the named call under `abi`, seeding the position from `state`.
        pub fn describe_call(abi: AbiKind, name: &str, state: &MachineState) -> Result<LayoutReport> {
            tracing::debug!(%abi, call = name, "describe guest call");
            match name {
                $(
                    $name => Ok(match abi {
                        AbiKind::Syscall64 => describe::<Syscall64, $sig>(state),
                        AbiKind::Aapcs32 => describe::<Aapcs32, $sig>(state),
                        AbiKind::Cdecl32 => describe::<Cdecl32, $sig>(state),
                    }),
                )+
                _ => Err(Error::UnknownCall(name.to_string())),
            }
        }
    };
}

guest_calls! {
    "exit" => fn(i32), "terminate the calling process";
    "read" => fn(i32, GuestPtr, u32) -> i32, "read from a file descriptor";
    "write" => fn(i32, GuestPtr, u32) -> i32, "write to a file descriptor";
    "lseek64" => fn(i32, i64, i32) -> i64, "reposition a file offset";
    "pread64" => fn(i32, GuestPtr, u32, i64) -> i32, "read at a file offset";
    "mmap" => fn(GuestPtr, u32, i32, i32, i32, i64) -> GuestPtr, "map memory";
    "div" => fn(i32, i32) -> Blob<8>, "quotient and remainder returned by value";
    "lldiv" => fn(i64, i64) -> Blob<16>, "64-bit quotient and remainder returned by value";
    "vec3_dot" => fn(Blob<12>, Blob<12>) -> i32, "dot product of two vectors passed by value";
}

/// Look up a catalog entry by name.
#[must_use]
pub fn find_call(name: &str) -> Option<&'static GuestCall> {
    GUEST_CALLS.iter().find(|call| call.name == name)
}
