//! Core virtual machine implementation.
//!
//! A [`Machine`] owns its [`Memory`], [`Cursor`] and [`Channel`] and runs a
//! fetch-decode-execute loop over them. Execution can be driven three ways:
//!
//! - [`Machine::run_to_completion`] runs until Halt and treats an empty inbound
//!   queue as fatal
//! - [`Machine::resume_until`] returns to the caller at the requested
//!   [`Interrupt`]s, which is what orchestrators use to interleave machines
//! - [`Machine::step`] and [`Machine::run_until`] give instruction-level control
//!
//! All arithmetic is checked 64-bit; an overflow is reported, never wrapped.

mod budget;
mod channel;
mod memory;

pub use budget::StepBudget;
pub use channel::{AsciiOutput, Channel, NEWLINE};
pub use memory::{DENSE_MEMORY_LIMIT, Memory};

use crate::debug;
use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::isa::Instruction;
use crate::virtual_machine::operand::Parameter;
use crate::virtual_machine::program::Program;
use std::ops::BitOr;

/// Execution position of a machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    /// Address of the next instruction cell.
    pub ip: i64,
    /// Base added to relative-mode parameters. Only `ARB` changes it.
    pub relative_base: i64,
}

/// Reason [`Machine::resume_until`] handed control back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Interrupt {
    /// The next instruction is Input and the inbound queue is empty. The
    /// cursor has not moved; push a value and resume to retry it.
    NeedsInput,
    /// An Output instruction just pushed a value.
    HasOutput,
    /// Halt executed, now or on an earlier call.
    Halted,
}

/// Set of interrupts a caller wants to be woken for.
///
/// [`Interrupt::Halted`] is always reported whether or not it is in the set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InterruptSet(u8);

impl InterruptSet {
    pub const HALTED: Self = Self(0b001);
    pub const NEEDS_INPUT: Self = Self(0b011);
    pub const HAS_OUTPUT: Self = Self(0b101);
    pub const ALL: Self = Self(0b111);

    const fn bit(interrupt: Interrupt) -> u8 {
        match interrupt {
            Interrupt::Halted => 0b001,
            Interrupt::NeedsInput => 0b010,
            Interrupt::HasOutput => 0b100,
        }
    }

    pub const fn contains(self, interrupt: Interrupt) -> bool {
        self.0 & Self::bit(interrupt) != 0
    }

    pub const fn with(self, interrupt: Interrupt) -> Self {
        Self(self.0 | Self::bit(interrupt))
    }
}

impl Default for InterruptSet {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for InterruptSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl From<Interrupt> for InterruptSet {
    fn from(interrupt: Interrupt) -> Self {
        Self::HALTED.with(interrupt)
    }
}

impl FromIterator<Interrupt> for InterruptSet {
    fn from_iter<T: IntoIterator<Item = Interrupt>>(iter: T) -> Self {
        iter.into_iter().fold(Self::HALTED, Self::with)
    }
}

/// Tunables for a single machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MachineConfig {
    /// Maximum number of instructions to execute; `None` runs unbounded.
    pub step_limit: Option<u64>,
}

/// What a single executed instruction did to control flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Continued,
    /// Input found the inbound queue empty and suspension was requested.
    Blocked,
    Output,
    Halted,
}

/// Intcode virtual machine.
///
/// Mutated only through its own execution entry points (plus [`Machine::poke`]
/// and channel access); once halted it stays halted.
#[derive(Clone, Debug)]
pub struct Machine {
    memory: Memory,
    cursor: Cursor,
    channel: Channel,
    halted: bool,
    budget: StepBudget,
}

impl Machine {
    /// Creates a machine whose memory is a copy of `program`.
    pub fn new(program: &Program) -> Self {
        Self::with_config(program, MachineConfig::default())
    }

    /// Creates a machine with `input` already queued on its inbound channel.
    pub fn with_input<I: IntoIterator<Item = i64>>(program: &Program, input: I) -> Self {
        let mut machine = Self::new(program);
        machine.channel.extend_input(input);
        machine
    }

    pub fn with_config(program: &Program, config: MachineConfig) -> Self {
        Self {
            memory: Memory::new(program.cells()),
            cursor: Cursor::default(),
            channel: Channel::new(),
            halted: false,
            budget: StepBudget::new(config.step_limit),
        }
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut Channel {
        &mut self.channel
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Instructions executed so far.
    pub fn steps(&self) -> u64 {
        self.budget.used()
    }

    /// Reads memory at `address`.
    pub fn peek(&self, address: i64) -> Result<i64, VMError> {
        self.memory.get(address)
    }

    /// Overwrites memory at `address`, typically before the first run.
    pub fn poke(&mut self, address: i64, value: i64) -> Result<(), VMError> {
        self.memory.set(address, value)
    }

    pub fn push_input(&mut self, value: i64) {
        self.channel.push_input(value);
    }

    pub fn extend_input<I: IntoIterator<Item = i64>>(&mut self, values: I) {
        self.channel.extend_input(values);
    }

    /// Queues `line` as ASCII codes followed by a newline.
    pub fn push_line(&mut self, line: &str) {
        self.channel.push_line(line);
    }

    pub fn pop_output(&mut self) -> Option<i64> {
        self.channel.pop_output()
    }

    pub fn take_output(&mut self) -> Vec<i64> {
        self.channel.take_output()
    }

    /// Appends `input` to the inbound queue and runs until Halt.
    ///
    /// Returns every value the program output (including any left over from
    /// earlier runs). An Input with nothing queued fails with
    /// [`VMError::ChannelUnderflow`].
    pub fn run_to_completion<I: IntoIterator<Item = i64>>(
        &mut self,
        input: I,
    ) -> Result<Vec<i64>, VMError> {
        self.channel.extend_input(input);
        while self.execute(false)? != Outcome::Halted {}
        Ok(self.channel.take_output())
    }

    /// Runs until one of `interrupts` (or Halt) occurs.
    ///
    /// With [`Interrupt::NeedsInput`] in the set, an Input on an empty queue
    /// suspends without touching memory or the cursor. Without it, the same
    /// situation fails with [`VMError::ChannelUnderflow`].
    pub fn resume_until(&mut self, interrupts: InterruptSet) -> Result<Interrupt, VMError> {
        let suspend_on_input = interrupts.contains(Interrupt::NeedsInput);
        loop {
            match self.execute(suspend_on_input)? {
                Outcome::Continued => {}
                Outcome::Blocked => return Ok(Interrupt::NeedsInput),
                Outcome::Output if interrupts.contains(Interrupt::HasOutput) => {
                    return Ok(Interrupt::HasOutput);
                }
                Outcome::Output => {}
                Outcome::Halted => return Ok(Interrupt::Halted),
            }
        }
    }

    /// Executes exactly one instruction and returns it.
    ///
    /// Returns `None` without doing anything if the machine already halted.
    /// Input on an empty queue fails as in [`Machine::run_to_completion`].
    pub fn step(&mut self) -> Result<Option<Instruction>, VMError> {
        if self.halted {
            return Ok(None);
        }
        let instruction = Instruction::decode(&self.memory, self.cursor.ip)?;
        self.budget.charge().inspect_err(|_| self.log_budget_exhausted())?;
        self.apply(instruction)?;
        Ok(Some(instruction))
    }

    /// Runs until Halt or until `done` returns true after an instruction.
    ///
    /// Returns whether the machine is halted.
    pub fn run_until<F: FnMut(&Machine) -> bool>(&mut self, mut done: F) -> Result<bool, VMError> {
        loop {
            if self.execute(false)? == Outcome::Halted {
                return Ok(true);
            }
            if done(self) {
                return Ok(false);
            }
        }
    }

    /// Fetches, decodes and executes the instruction at the cursor.
    fn execute(&mut self, suspend_on_input: bool) -> Result<Outcome, VMError> {
        if self.halted {
            return Ok(Outcome::Halted);
        }
        let instruction = Instruction::decode(&self.memory, self.cursor.ip)?;
        if suspend_on_input
            && matches!(instruction, Instruction::Input { .. })
            && !self.channel.has_input()
        {
            return Ok(Outcome::Blocked);
        }
        self.budget.charge().inspect_err(|_| self.log_budget_exhausted())?;
        self.apply(instruction)
    }

    fn log_budget_exhausted(&self) {
        debug!(
            "machine stopped at ip {} after {} steps: budget exhausted",
            self.cursor.ip,
            self.budget.used()
        );
    }

    fn read(&self, param: Parameter) -> Result<i64, VMError> {
        param.read(&self.memory, self.cursor.relative_base)
    }

    fn write(&mut self, param: Parameter, value: i64, instruction: &Instruction) -> Result<(), VMError> {
        param.write(
            &mut self.memory,
            self.cursor.relative_base,
            value,
            instruction.mnemonic(),
            self.cursor.ip,
        )
    }

    /// Moves the cursor past `instruction`.
    fn advance(&mut self, instruction: &Instruction) -> Result<(), VMError> {
        let length = instruction.length();
        self.cursor.ip = self
            .cursor
            .ip
            .checked_add(length)
            .ok_or(VMError::AddressOverflow {
                base: self.cursor.ip,
                offset: length,
            })?;
        Ok(())
    }

    fn jump(&mut self, taken: bool, target: Parameter, instruction: &Instruction) -> Result<(), VMError> {
        if taken {
            self.cursor.ip = self.read(target)?;
            Ok(())
        } else {
            self.advance(instruction)
        }
    }

    fn arithmetic(
        &mut self,
        instruction: &Instruction,
        lhs: Parameter,
        rhs: Parameter,
        dst: Parameter,
        op: fn(i64, i64) -> Option<i64>,
    ) -> Result<(), VMError> {
        let (a, b) = (self.read(lhs)?, self.read(rhs)?);
        let value = op(a, b).ok_or(VMError::ArithmeticOverflow {
            instruction: instruction.mnemonic(),
            lhs: a,
            rhs: b,
        })?;
        self.write(dst, value, instruction)?;
        self.advance(instruction)
    }

    fn compare(
        &mut self,
        instruction: &Instruction,
        lhs: Parameter,
        rhs: Parameter,
        dst: Parameter,
        op: fn(i64, i64) -> bool,
    ) -> Result<(), VMError> {
        let holds = op(self.read(lhs)?, self.read(rhs)?);
        self.write(dst, i64::from(holds), instruction)?;
        self.advance(instruction)
    }

    /// Applies a decoded instruction. Side effects already made stay made if a
    /// later part of the instruction fails.
    fn apply(&mut self, instruction: Instruction) -> Result<Outcome, VMError> {
        let instr = &instruction;
        match instruction {
            Instruction::Add { lhs, rhs, dst } => {
                self.arithmetic(instr, lhs, rhs, dst, i64::checked_add)?;
            }
            Instruction::Multiply { lhs, rhs, dst } => {
                self.arithmetic(instr, lhs, rhs, dst, i64::checked_mul)?;
            }
            Instruction::Input { dst } => {
                let value = self
                    .channel
                    .pop_input()
                    .ok_or(VMError::ChannelUnderflow { ip: self.cursor.ip })?;
                self.write(dst, value, instr)?;
                self.advance(instr)?;
            }
            Instruction::Output { src } => {
                let value = self.read(src)?;
                self.channel.push_output(value);
                self.advance(instr)?;
                return Ok(Outcome::Output);
            }
            Instruction::JumpIfTrue { cond, target } => {
                let taken = self.read(cond)? != 0;
                self.jump(taken, target, instr)?;
            }
            Instruction::JumpIfFalse { cond, target } => {
                let taken = self.read(cond)? == 0;
                self.jump(taken, target, instr)?;
            }
            Instruction::LessThan { lhs, rhs, dst } => {
                self.compare(instr, lhs, rhs, dst, |a, b| a < b)?;
            }
            Instruction::Equals { lhs, rhs, dst } => {
                self.compare(instr, lhs, rhs, dst, |a, b| a == b)?;
            }
            Instruction::AdjustRelativeBase { offset } => {
                let offset = self.read(offset)?;
                let base = self.cursor.relative_base;
                self.cursor.relative_base = base
                    .checked_add(offset)
                    .ok_or(VMError::AddressOverflow { base, offset })?;
                self.advance(instr)?;
            }
            Instruction::Halt {} => {
                self.halted = true;
                debug!(
                    "machine halted at ip {} after {} steps",
                    self.cursor.ip,
                    self.budget.used()
                );
                return Ok(Outcome::Halted);
            }
        }
        Ok(Outcome::Continued)
    }
}
