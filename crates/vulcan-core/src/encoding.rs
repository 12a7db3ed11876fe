/// Canonical opcodes, numbered by the six-bit opcode field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Opcode {
    Nop = 0,
    Add = 1,
    Sub = 2,
    Mul = 3,
    Div = 4,
    Mod = 5,
    Rand = 6,
    And = 7,
    Or = 8,
    Xor = 9,
    Not = 10,
    Gt = 11,
    Lt = 12,
    Agt = 13,
    Alt = 14,
    Lshift = 15,
    Rshift = 16,
    Arshift = 17,
    Pop = 18,
    Dup = 19,
    Swap = 20,
    Pick = 21,
    Rot = 22,
    Jmp = 23,
    Jmpr = 24,
    Call = 25,
    Ret = 26,
    Brz = 27,
    Brnz = 28,
    Hlt = 29,
    Load = 30,
    Loadw = 31,
    Store = 32,
    Storew = 33,
    Inton = 34,
    Intoff = 35,
    Setiv = 36,
    Sdp = 37,
    Setsdp = 38,
    Pushr = 39,
    Popr = 40,
    Peekr = 41,
    Debug = 42,
}

/// Single source-of-truth opcode table: field value, opcode, mnemonic.
///
/// Any six-bit value not present here is unassigned.
pub const OPCODE_TABLE: &[(u8, Opcode, &str)] = &[
    (0, Opcode::Nop, "nop"),
    (1, Opcode::Add, "add"),
    (2, Opcode::Sub, "sub"),
    (3, Opcode::Mul, "mul"),
    (4, Opcode::Div, "div"),
    (5, Opcode::Mod, "mod"),
    (6, Opcode::Rand, "rand"),
    (7, Opcode::And, "and"),
    (8, Opcode::Or, "or"),
    (9, Opcode::Xor, "xor"),
    (10, Opcode::Not, "not"),
    (11, Opcode::Gt, "gt"),
    (12, Opcode::Lt, "lt"),
    (13, Opcode::Agt, "agt"),
    (14, Opcode::Alt, "alt"),
    (15, Opcode::Lshift, "lshift"),
    (16, Opcode::Rshift, "rshift"),
    (17, Opcode::Arshift, "arshift"),
    (18, Opcode::Pop, "pop"),
    (19, Opcode::Dup, "dup"),
    (20, Opcode::Swap, "swap"),
    (21, Opcode::Pick, "pick"),
    (22, Opcode::Rot, "rot"),
    (23, Opcode::Jmp, "jmp"),
    (24, Opcode::Jmpr, "jmpr"),
    (25, Opcode::Call, "call"),
    (26, Opcode::Ret, "ret"),
    (27, Opcode::Brz, "brz"),
    (28, Opcode::Brnz, "brnz"),
    (29, Opcode::Hlt, "hlt"),
    (30, Opcode::Load, "load"),
    (31, Opcode::Loadw, "loadw"),
    (32, Opcode::Store, "store"),
    (33, Opcode::Storew, "storew"),
    (34, Opcode::Inton, "inton"),
    (35, Opcode::Intoff, "intoff"),
    (36, Opcode::Setiv, "setiv"),
    (37, Opcode::Sdp, "sdp"),
    (38, Opcode::Setsdp, "setsdp"),
    (39, Opcode::Pushr, "pushr"),
    (40, Opcode::Popr, "popr"),
    (41, Opcode::Peekr, "peekr"),
    (42, Opcode::Debug, "debug"),
];

/// Largest value the six-bit opcode field can hold.
pub const OPCODE_FIELD_MAX: u8 = 0x3F;

/// Largest inline literal length in bytes.
pub const MAX_ARG_LENGTH: u8 = 3;

impl Opcode {
    /// Resolves a six-bit opcode field to an assigned opcode.
    ///
    /// `None` means the value is unassigned.
    #[must_use]
    pub fn from_u6(value: u8) -> Option<Self> {
        if value > OPCODE_FIELD_MAX {
            return None;
        }

        OPCODE_TABLE
            .iter()
            .find_map(|(entry, opcode, _)| (*entry == value).then_some(*opcode))
    }

    /// Resolves a lowercase or uppercase mnemonic.
    #[must_use]
    pub fn from_mnemonic(name: &str) -> Option<Self> {
        OPCODE_TABLE
            .iter()
            .find_map(|(_, opcode, mnemonic)| {
                mnemonic.eq_ignore_ascii_case(name).then_some(*opcode)
            })
    }

    /// Returns the six-bit field value for this opcode.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns the lowercase mnemonic.
    #[must_use]
    pub fn mnemonic(self) -> &'static str {
        OPCODE_TABLE
            .iter()
            .find_map(|(_, opcode, mnemonic)| (*opcode == self).then_some(*mnemonic))
            .unwrap_or("???")
    }
}

/// Builds an instruction byte from an opcode and inline literal length.
///
/// `arg_length` is truncated to its two-bit field.
#[must_use]
pub const fn encode_instruction(opcode: Opcode, arg_length: u8) -> u8 {
    (opcode.as_u8() << 2) | (arg_length & MAX_ARG_LENGTH)
}

/// Splits an instruction byte into `(opcode field, arg_length)`.
#[must_use]
pub const fn split_instruction_byte(instruction: u8) -> (u8, u8) {
    (instruction >> 2, instruction & MAX_ARG_LENGTH)
}
