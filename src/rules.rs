//! Profiles, groups, and rule evaluation
//!
//! Rules arrive pre-compiled: each is an opaque producer from the tick's
//! facts to zero or more side effects. Evaluation walks the active
//! profile's groups in order and collects produced effects in (group,
//! rule, effect) order. A failing rule is contained at its own boundary;
//! it never stops the rest of the tick.

use serde::{Deserialize, Serialize};
use tracing::warn;

use std::time::Instant;

use crate::core::error::Result;
use crate::effect::SideEffect;
use crate::frame::FrameState;
use crate::snapshot::{AreaClass, Snapshot};
use crate::vars::VariableStore;

/// Read-only facts a rule may consult
///
/// The frame is the frame as left by the pre-evaluation application pass,
/// so rules can see e.g. whether the press slot is already claimed.
pub struct RuleCtx<'a> {
    pub snapshot: &'a Snapshot,
    pub frame: &'a FrameState,
    pub vars: &'a VariableStore,
    pub now: Instant,
}

type RuleFn = Box<dyn Fn(&RuleCtx<'_>) -> Result<Vec<SideEffect>>>;

/// A compiled rule: name plus producer function
pub struct Rule {
    pub name: String,
    producer: RuleFn,
}

impl Rule {
    pub fn new<F>(name: impl Into<String>, producer: F) -> Self
    where
        F: Fn(&RuleCtx<'_>) -> Result<Vec<SideEffect>> + 'static,
    {
        Self {
            name: name.into(),
            producer: Box::new(producer),
        }
    }

    pub fn evaluate(&self, ctx: &RuleCtx<'_>) -> Result<Vec<SideEffect>> {
        (self.producer)(ctx)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

/// Area classifications in which a group is allowed to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextFlags {
    pub town: bool,
    pub hideout: bool,
    pub peaceful: bool,
    pub map: bool,
}

impl ContextFlags {
    /// Run everywhere
    pub fn everywhere() -> Self {
        Self {
            town: true,
            hideout: true,
            peaceful: true,
            map: true,
        }
    }

    /// Run only where combat happens
    pub fn combat_only() -> Self {
        Self {
            town: false,
            hideout: false,
            peaceful: false,
            map: true,
        }
    }

    pub fn allows(&self, area: AreaClass) -> bool {
        match area {
            AreaClass::Town => self.town,
            AreaClass::Hideout => self.hideout,
            AreaClass::Peaceful => self.peaceful,
            AreaClass::Map => self.map,
        }
    }
}

impl Default for ContextFlags {
    fn default() -> Self {
        Self::everywhere()
    }
}

/// Named, orderable collection of rules with context gating
#[derive(Debug)]
pub struct Group {
    pub name: String,
    pub enabled: bool,
    pub contexts: ContextFlags,
    pub rules: Vec<Rule>,
}

impl Group {
    pub fn new(name: impl Into<String>, contexts: ContextFlags) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            contexts,
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    fn active_in(&self, area: AreaClass) -> bool {
        self.enabled && self.contexts.allows(area)
    }
}

/// Named collection of groups; the host keeps exactly one current
#[derive(Debug, Default)]
pub struct Profile {
    pub name: String,
    pub groups: Vec<Group>,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: Vec::new(),
        }
    }

    pub fn with_group(mut self, group: Group) -> Self {
        self.groups.push(group);
        self
    }
}

/// Evaluate every active group against this tick's facts
///
/// Returns the produced effects in deterministic (group, rule, effect)
/// order. Rule errors are logged here and do not propagate.
pub fn evaluate_groups(profile: &Profile, ctx: &RuleCtx<'_>) -> Vec<SideEffect> {
    let mut produced = Vec::new();

    for group in &profile.groups {
        if !group.active_in(ctx.snapshot.area) {
            continue;
        }

        for rule in &group.rules {
            match rule.evaluate(ctx) {
                Ok(effects) => produced.extend(effects),
                Err(error) => {
                    warn!(
                        group = %group.name,
                        rule = %rule.name,
                        %error,
                        "rule evaluation failed, skipping"
                    );
                }
            }
        }
    }

    produced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ReflexError;
    use crate::effect::vars::SetFlag;

    fn ctx_parts() -> (Snapshot, FrameState, VariableStore) {
        let snapshot = Snapshot {
            area: AreaClass::Map,
            ..Snapshot::default()
        };
        let frame = FrameState::rebuild(&snapshot, true);
        (snapshot, frame, VariableStore::new())
    }

    fn flag_rule(name: &str, flag: &'static str) -> Rule {
        Rule::new(name, move |_ctx| {
            Ok(vec![SideEffect::SetFlag(SetFlag::new(flag))])
        })
    }

    #[test]
    fn test_effects_collected_in_group_then_rule_order() {
        let (snapshot, frame, vars) = ctx_parts();
        let profile = Profile::new("test")
            .with_group(
                Group::new("first", ContextFlags::everywhere())
                    .with_rule(flag_rule("a", "a"))
                    .with_rule(flag_rule("b", "b")),
            )
            .with_group(Group::new("second", ContextFlags::everywhere()).with_rule(flag_rule("c", "c")));

        let ctx = RuleCtx {
            snapshot: &snapshot,
            frame: &frame,
            vars: &vars,
            now: Instant::now(),
        };
        let produced = evaluate_groups(&profile, &ctx);

        let names: Vec<_> = produced.iter().map(|e| e.describe()).collect();
        assert_eq!(
            names,
            vec!["set flag 'a'", "set flag 'b'", "set flag 'c'"],
            "order is group, then rule"
        );
    }

    #[test]
    fn test_context_flags_gate_groups() {
        let (mut snapshot, frame, vars) = ctx_parts();
        snapshot.area = AreaClass::Town;

        let profile = Profile::new("test")
            .with_group(Group::new("combat", ContextFlags::combat_only()).with_rule(flag_rule("x", "x")))
            .with_group(Group::new("anywhere", ContextFlags::everywhere()).with_rule(flag_rule("y", "y")));

        let ctx = RuleCtx {
            snapshot: &snapshot,
            frame: &frame,
            vars: &vars,
            now: Instant::now(),
        };
        let produced = evaluate_groups(&profile, &ctx);
        assert_eq!(produced.len(), 1);
        assert_eq!(produced[0].describe(), "set flag 'y'");
    }

    #[test]
    fn test_disabled_group_is_skipped() {
        let (snapshot, frame, vars) = ctx_parts();
        let profile = Profile::new("test").with_group(
            Group::new("off", ContextFlags::everywhere())
                .with_rule(flag_rule("x", "x"))
                .disabled(),
        );

        let ctx = RuleCtx {
            snapshot: &snapshot,
            frame: &frame,
            vars: &vars,
            now: Instant::now(),
        };
        assert!(evaluate_groups(&profile, &ctx).is_empty());
    }

    #[test]
    fn test_failing_rule_does_not_stop_the_rest() {
        let (snapshot, frame, vars) = ctx_parts();
        let profile = Profile::new("test").with_group(
            Group::new("mixed", ContextFlags::everywhere())
                .with_rule(Rule::new("broken", |_| {
                    Err(ReflexError::RuleEvaluation {
                        rule: "broken".into(),
                        message: "bad predicate".into(),
                    })
                }))
                .with_rule(flag_rule("ok", "ok")),
        );

        let ctx = RuleCtx {
            snapshot: &snapshot,
            frame: &frame,
            vars: &vars,
            now: Instant::now(),
        };
        let produced = evaluate_groups(&profile, &ctx);
        assert_eq!(produced.len(), 1, "rules after the failure still ran");
    }
}
