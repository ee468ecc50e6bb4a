use crate::virtual_machine::isa::InstrClass;

/// Number of step categories tracked by [`StepProfile`].
const STEP_CATEGORY_COUNT: usize = 5;

/// Categories of executed instructions.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum StepCategory {
    /// `ADD`, `ADDI`, `SUB`, `MUL`.
    Arithmetic = 0,
    /// `DIV`, `REM`.
    Division = 1,
    /// `JAL`.
    Jump = 2,
    /// Conditional branch that redirected the instruction pointer.
    BranchTaken = 3,
    /// Conditional branch that fell through.
    BranchNotTaken = 4,
}

impl StepCategory {
    pub const fn as_str(&self) -> &'static str {
        match self {
            StepCategory::Arithmetic => "Arithmetic",
            StepCategory::Division => "Division",
            StepCategory::Jump => "Jump",
            StepCategory::BranchTaken => "Branch Taken",
            StepCategory::BranchNotTaken => "Branch Not Taken",
        }
    }

    /// Category of an executed instruction of `class`; `jumped` is whether it redirected ip.
    pub const fn of(class: InstrClass, jumped: bool) -> Self {
        match class {
            InstrClass::Arithmetic => StepCategory::Arithmetic,
            InstrClass::Division => StepCategory::Division,
            InstrClass::Jump => StepCategory::Jump,
            InstrClass::Branch if jumped => StepCategory::BranchTaken,
            InstrClass::Branch => StepCategory::BranchNotTaken,
        }
    }

    /// All categories in discriminant order.
    const ALL: [StepCategory; STEP_CATEGORY_COUNT] = [
        StepCategory::Arithmetic,
        StepCategory::Division,
        StepCategory::Jump,
        StepCategory::BranchTaken,
        StepCategory::BranchNotTaken,
    ];
}

/// Per-category count of the instructions executed by the last run.
///
/// Backed by a flat array indexed by [`StepCategory`] discriminant.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StepProfile {
    counts: [u64; STEP_CATEGORY_COUNT],
}

impl StepProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one executed instruction.
    #[inline(always)]
    pub fn add(&mut self, category: StepCategory) {
        let slot = &mut self.counts[category as usize];
        *slot = slot.saturating_add(1);
    }

    pub fn get(&self, category: StepCategory) -> u64 {
        self.counts[category as usize]
    }

    /// Returns the total steps across all categories.
    pub fn total(&self) -> u64 {
        self.counts
            .iter()
            .fold(0u64, |acc, &v| acc.saturating_add(v))
    }

    /// Returns an iterator over all categories and their counts.
    pub fn iter(&self) -> impl Iterator<Item = (StepCategory, u64)> {
        StepCategory::ALL.into_iter().zip(self.counts)
    }
}
