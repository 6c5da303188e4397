// ProbabilityGate - Fire-or-sleep decision made once per step arrival
//
// The decision is memoized on the step (`armed`) so a step resolved ahead of
// time as the scheduler's lookahead keeps its outcome when it becomes current.

use rand::Rng;

use super::step::{COUNT_MAX, ProbabilityStrategy, Step};

/// Flags feeding one probability decision
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GateContext {
    /// Fill engaged (global input or per-track modifier)
    pub fill: bool,
    /// Pre flag of the previous track; always false for track 0
    pub pre: bool,
    /// Whether the step played before this one on the same track fired
    pub neighbor: bool,
    /// Wake the step whatever its strategy says
    pub force: bool,
    /// Put chance-driven steps to sleep
    pub kill: bool,
    /// Offset added to the Dice probability (-1..1)
    pub dice: f32,
}

pub struct ProbabilityGate;

impl ProbabilityGate {
    /// Decide whether `step` sleeps for the current arrival
    ///
    /// Returns the memoized outcome if the step is already armed. Otherwise
    /// evaluates its strategy, arms it, and, for active steps, stores into
    /// `pre_flag` whether it fired with a probabilistic strategy.
    pub fn resolve<R: Rng + ?Sized>(
        step: &mut Step,
        pre_flag: &mut bool,
        context: &GateContext,
        rng: &mut R,
    ) -> bool {
        if step.armed {
            return step.sleeping;
        }

        let sleeping = Self::evaluate(step, context, rng);
        step.sleeping = sleeping;
        step.armed = true;

        if step.active {
            *pre_flag = !sleeping && step.probability.is_probabilistic();
        }

        sleeping
    }

    /// Forget the memoized outcome and decide again
    pub fn rearm<R: Rng + ?Sized>(
        step: &mut Step,
        pre_flag: &mut bool,
        context: &GateContext,
        rng: &mut R,
    ) -> bool {
        step.clear_arrival();
        Self::resolve(step, pre_flag, context, rng)
    }

    fn evaluate<R: Rng + ?Sized>(step: &mut Step, context: &GateContext, rng: &mut R) -> bool {
        if context.force {
            return false;
        }

        match step.probability {
            ProbabilityStrategy::Fill => !context.fill,
            ProbabilityStrategy::NotFill => context.fill,
            ProbabilityStrategy::Pre => !context.pre,
            ProbabilityStrategy::NotPre => context.pre,
            _ if context.kill => true,
            ProbabilityStrategy::Dice => Self::dice_sleeps(step.count, context.dice, rng),
            ProbabilityStrategy::Count => Self::count_sleeps(step),
            ProbabilityStrategy::Neighbor => !context.neighbor,
            ProbabilityStrategy::NotNeighbor => context.neighbor,
        }
    }

    fn dice_sleeps<R: Rng + ?Sized>(count: u8, dice: f32, rng: &mut R) -> bool {
        if count >= COUNT_MAX {
            return false;
        }
        let dice = if dice.is_finite() { dice } else { 0.0 };
        let chance = (count as f32 / 100.0 + dice).clamp(0.0, 1.0);
        rng.gen_range(0.0f32..1.0) >= chance
    }

    fn count_sleeps(step: &mut Step) -> bool {
        if step.count_reset == 0 {
            return false;
        }
        let sleeping = step.in_count > step.count;
        step.in_count = if step.in_count >= step.count_reset {
            1
        } else {
            step.in_count + 1
        };
        sleeping
    }
}
