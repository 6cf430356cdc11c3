//! Field flags stored in `/Ff`. Bit positions count from 1 in the reference,
//! so bit N is `1 << (N - 1)`.

/// REFERENCE: [Table 227 — Field flags common to all field types, p436]
pub mod common {
    pub const READ_ONLY: u32 = 1 << 0;
    pub const REQUIRED: u32 = 1 << 1;
    pub const NO_EXPORT: u32 = 1 << 2;
}

/// REFERENCE: [Table 229 — Field flags specific to button fields, p440]
pub mod button {
    pub const NO_TOGGLE_TO_OFF: u32 = 1 << 14;
    pub const RADIO: u32 = 1 << 15;
    pub const PUSH_BUTTON: u32 = 1 << 16;
    pub const RADIOS_IN_UNISON: u32 = 1 << 25;
}

/// REFERENCE: [Table 231 — Field flags specific to variable text fields, p444]
pub mod text {
    pub const MULTILINE: u32 = 1 << 12;
    pub const PASSWORD: u32 = 1 << 13;
    pub const FILE_SELECT: u32 = 1 << 20;
    pub const DO_NOT_SPELL_CHECK: u32 = 1 << 22;
    pub const DO_NOT_SCROLL: u32 = 1 << 23;
    pub const COMB: u32 = 1 << 24;
    pub const RICH_TEXT: u32 = 1 << 25;
}

/// REFERENCE: [Table 233 — Field flags specific to choice fields, p446]
pub mod choice {
    pub const COMBO: u32 = 1 << 17;
    pub const EDIT: u32 = 1 << 18;
    pub const SORT: u32 = 1 << 19;
    pub const MULTI_SELECT: u32 = 1 << 21;
    pub const DO_NOT_SPELL_CHECK: u32 = 1 << 22;
    pub const COMMIT_ON_SEL_CHANGE: u32 = 1 << 26;
}

pub(crate) fn is_set(flags: u32, flag: u32) -> bool {
    flags & flag != 0
}
