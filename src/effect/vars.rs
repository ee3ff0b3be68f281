//! Effects over the long-lived flag/number/timer store
//!
//! These are the variants whose unique-vs-duplicate distinction carries
//! real weight: rules commonly re-produce the same request every tick the
//! trigger holds, and only the first application may change state or
//! appear in history.

use crate::effect::{ApplyCtx, ApplyOutcome};

fn outcome(changed: bool) -> ApplyOutcome {
    if changed {
        ApplyOutcome::AppliedUnique
    } else {
        ApplyOutcome::AppliedDuplicate
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetFlag {
    pub name: String,
}

impl SetFlag {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn apply(&mut self, ctx: &mut ApplyCtx<'_>) -> ApplyOutcome {
        outcome(ctx.vars.set_flag(&self.name))
    }

    pub fn describe(&self) -> String {
        format!("set flag '{}'", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetFlag {
    pub name: String,
}

impl ResetFlag {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn apply(&mut self, ctx: &mut ApplyCtx<'_>) -> ApplyOutcome {
        outcome(ctx.vars.reset_flag(&self.name))
    }

    pub fn describe(&self) -> String {
        format!("reset flag '{}'", self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetNumber {
    pub name: String,
    pub value: f64,
}

impl SetNumber {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn apply(&mut self, ctx: &mut ApplyCtx<'_>) -> ApplyOutcome {
        outcome(ctx.vars.set_number(&self.name, self.value))
    }

    pub fn describe(&self) -> String {
        format!("set number '{}' to {}", self.name, self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetNumber {
    pub name: String,
}

impl ResetNumber {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn apply(&mut self, ctx: &mut ApplyCtx<'_>) -> ApplyOutcome {
        outcome(ctx.vars.reset_number(&self.name))
    }

    pub fn describe(&self) -> String {
        format!("reset number '{}'", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTimer {
    pub name: String,
}

impl StartTimer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn apply(&mut self, ctx: &mut ApplyCtx<'_>) -> ApplyOutcome {
        outcome(ctx.vars.start_timer(&self.name, ctx.now))
    }

    pub fn describe(&self) -> String {
        format!("started timer '{}'", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopTimer {
    pub name: String,
}

impl StopTimer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn apply(&mut self, ctx: &mut ApplyCtx<'_>) -> ApplyOutcome {
        outcome(ctx.vars.stop_timer(&self.name, ctx.now))
    }

    pub fn describe(&self) -> String {
        format!("stopped timer '{}'", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetTimer {
    pub name: String,
}

impl ResetTimer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn apply(&mut self, ctx: &mut ApplyCtx<'_>) -> ApplyOutcome {
        outcome(ctx.vars.reset_timer(&self.name))
    }

    pub fn describe(&self) -> String {
        format!("reset timer '{}'", self.name)
    }
}
