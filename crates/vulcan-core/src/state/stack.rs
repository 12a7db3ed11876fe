//! Two-stack discipline.
//!
//! The data stack grows upward from `dp`, the call stack downward from `sp`.
//! Both live in backing memory and bypass the device table. There are no
//! underflow or overflow guards; pointers only wrap through address masking.

use crate::fault::StackError;
use crate::memory::{read_word_raw, write_word_raw};
use crate::state::CpuState;
use crate::word::{mask_word, WORD_BYTES};

impl CpuState {
    /// Writes `word & 0xFFFFFF` at `dp`, then advances `dp` by one word.
    pub fn push_data(&mut self, word: u32) {
        let dp = self.regs.dp();
        write_word_raw(self.memory_mut(), dp, mask_word(word));
        self.regs.set_dp(dp.wrapping_add(WORD_BYTES));
    }

    /// Retreats `dp` by one word, then reads the word there.
    pub fn pop_data(&mut self) -> u32 {
        let dp = self.regs.dp().wrapping_sub(WORD_BYTES);
        self.regs.set_dp(dp);
        read_word_raw(self.memory(), dp)
    }

    /// Reads the data-stack word `depth` entries below the top (0 = top).
    #[must_use]
    pub fn peek_data(&self, depth: u32) -> u32 {
        let offset = depth.wrapping_add(1).wrapping_mul(WORD_BYTES);
        read_word_raw(self.memory(), self.regs.dp().wrapping_sub(offset))
    }

    /// Retreats `sp` by one word, then writes `word & 0xFFFFFF` there.
    pub fn push_call(&mut self, word: u32) {
        let sp = self.regs.sp().wrapping_sub(WORD_BYTES);
        self.regs.set_sp(sp);
        write_word_raw(self.memory_mut(), sp, mask_word(word));
    }

    /// Reads the word at `sp`, then advances `sp` by one word.
    pub fn pop_call(&mut self) -> u32 {
        let sp = self.regs.sp();
        let word = read_word_raw(self.memory(), sp);
        self.regs.set_sp(sp.wrapping_add(WORD_BYTES));
        word
    }

    /// Reads the top of the call stack without moving `sp`.
    #[must_use]
    pub fn peek_call(&self) -> u32 {
        read_word_raw(self.memory(), self.regs.sp())
    }

    /// Number of words above `bottom_dp`. Negative after underflow.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn data_stack_depth(&self) -> i32 {
        (self.regs.dp().wrapping_sub(self.regs.bottom_dp()) as i32) / WORD_BYTES as i32
    }

    /// Number of words below `top_sp`. Negative after underflow.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn return_stack_depth(&self) -> i32 {
        (self.regs.top_sp().wrapping_sub(self.regs.sp()) as i32) / WORD_BYTES as i32
    }

    /// Data-stack word at `index` from the top (0 = top).
    #[must_use]
    pub fn data_stack_value_at(&self, index: u32) -> u32 {
        self.peek_data(index)
    }

    /// Call-stack word at `index` from the top (0 = top).
    #[must_use]
    pub fn return_stack_value_at(&self, index: u32) -> u32 {
        let offset = index.wrapping_mul(WORD_BYTES);
        read_word_raw(self.memory(), self.regs.sp().wrapping_add(offset))
    }

    /// Data-stack contents from `bottom_dp` up to the top, with addresses.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::DataUnderflow`] when `dp` is below the base.
    pub fn data_stack_entries(&self) -> Result<Vec<(u32, u32)>, StackError> {
        let depth = self.data_stack_depth();
        if depth < 0 {
            return Err(StackError::DataUnderflow {
                words: depth.unsigned_abs(),
            });
        }
        let bottom = self.regs.bottom_dp();
        Ok((0..depth.unsigned_abs())
            .map(|n| {
                let addr = bottom.wrapping_add(n * WORD_BYTES);
                (addr, read_word_raw(self.memory(), addr))
            })
            .collect())
    }

    /// Data-stack words, bottom first.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::DataUnderflow`] when `dp` is below the base.
    pub fn data_stack(&self) -> Result<Vec<u32>, StackError> {
        let entries = self.data_stack_entries()?;
        Ok(entries.into_iter().map(|(_, word)| word).collect())
    }

    /// Call-stack words, oldest (nearest `top_sp`) first.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::ReturnUnderflow`] when `sp` is above the top.
    pub fn return_stack(&self) -> Result<Vec<u32>, StackError> {
        let depth = self.return_stack_depth();
        if depth < 0 {
            return Err(StackError::ReturnUnderflow {
                words: depth.unsigned_abs(),
            });
        }
        Ok((0..depth.unsigned_abs())
            .rev()
            .map(|index| self.return_stack_value_at(index))
            .collect())
    }
}
