mod arith;
mod chain;

use crate::types::{
    CompareOp, CompileError, CompileOptions, Condition, FieldSize, MeasuredFormat, Requirement,
    RequirementType, TallyItem, Trigger, ValueExpr,
};

use arith::Comparison;
use chain::{flatten, Junction};

/// Maps script-side accessor names (`byte`, `bit3`, ...) to memory sizes.
pub trait AccessorResolver {
    fn resolve(&self, name: &str) -> Option<FieldSize>;
}

/// The accessor names understood by every runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardAccessors;

impl AccessorResolver for StandardAccessors {
    fn resolve(&self, name: &str) -> Option<FieldSize> {
        FieldSize::ALL
            .into_iter()
            .find(|size| size.accessor_name() == name)
    }
}

/// Compile a condition tree using the [`StandardAccessors`].
///
/// # Errors
///
/// Returns [`CompileError`] if the condition cannot be expressed as a trigger.
pub fn compile(condition: &Condition, options: &CompileOptions) -> Result<Trigger, CompileError> {
    compile_with(condition, &StandardAccessors, options)
}

/// Compile a condition tree, resolving memory accessors through `resolver`.
///
/// The result is optimized unless [`CompileOptions::optimize`] is off.
///
/// # Errors
///
/// Returns the first [`CompileError`] encountered; nothing is optimized when
/// lowering fails.
pub fn compile_with(
    condition: &Condition,
    resolver: &dyn AccessorResolver,
    options: &CompileOptions,
) -> Result<Trigger, CompileError> {
    let mut compiler = Compiler::new(resolver, options);
    let groups = compiler.lower(condition)?;
    let mut trigger = Trigger::new(groups.core, groups.alternates);

    if !trigger.requirements().any(is_truthy) {
        return Err(CompileError::NoTruthyConditions { location: None });
    }
    log::debug!(
        "lowered trigger: {} core rows, {} alternates",
        trigger.core.len(),
        trigger.alternates.len()
    );

    if options.optimize {
        trigger.optimize();
    }
    Ok(trigger)
}

fn is_truthy(requirement: &Requirement) -> bool {
    matches!(
        requirement.kind,
        RequirementType::None
            | RequirementType::Trigger
            | RequirementType::Measured
            | RequirementType::MeasuredPercent
    )
}

pub(crate) fn literal(value: bool) -> Requirement {
    if value {
        Requirement::always_true()
    } else {
        Requirement::always_false()
    }
}

/// Core rows plus alternate groups, before optimization.
#[derive(Debug, Default)]
struct Groups {
    core: Vec<Requirement>,
    alternates: Vec<Vec<Requirement>>,
}

impl Groups {
    fn core(core: Vec<Requirement>) -> Self {
        Self {
            core,
            alternates: Vec::new(),
        }
    }

    /// Every alternate as a full conjunction including the core.
    fn into_alternates(self) -> Vec<Vec<Requirement>> {
        if self.alternates.is_empty() {
            return vec![self.core];
        }
        let core = self.core;
        self.alternates
            .into_iter()
            .map(|alternate| core.iter().copied().chain(alternate).collect())
            .collect()
    }

    fn and(self, other: Groups) -> Self {
        match (self.alternates.is_empty(), other.alternates.is_empty()) {
            (true, true) => {
                let mut core = self.core;
                core.extend(other.core);
                Self::core(core)
            }
            (true, false) => distribute(&self.core, other.into_alternates()),
            (false, true) => distribute(&other.core, self.into_alternates()),
            (false, false) => {
                let right = other.into_alternates();
                let alternates = self
                    .into_alternates()
                    .into_iter()
                    .flat_map(|left| {
                        right
                            .iter()
                            .map(move |r| left.iter().chain(r).copied().collect())
                    })
                    .collect();
                Self {
                    core: Vec::new(),
                    alternates,
                }
            }
        }
    }

    fn or(self, other: Groups) -> Self {
        let mut alternates = self.into_alternates();
        alternates.extend(other.into_alternates());
        Self {
            core: Vec::new(),
            alternates,
        }
    }

    fn groups_mut(&mut self) -> impl Iterator<Item = &mut Vec<Requirement>> {
        std::iter::once(&mut self.core).chain(self.alternates.iter_mut())
    }
}

/// `core ++ alternate` for every alternate.
fn distribute(core: &[Requirement], alternates: Vec<Vec<Requirement>>) -> Groups {
    Groups {
        core: Vec::new(),
        alternates: alternates
            .into_iter()
            .map(|alternate| core.iter().copied().chain(alternate).collect())
            .collect(),
    }
}

pub(crate) struct Compiler<'a> {
    resolver: &'a dyn AccessorResolver,
    options: &'a CompileOptions,
    /// Target of the first measured condition seen.
    measured_target: Option<u32>,
}

impl<'a> Compiler<'a> {
    pub(crate) fn new(resolver: &'a dyn AccessorResolver, options: &'a CompileOptions) -> Self {
        Self {
            resolver,
            options,
            measured_target: None,
        }
    }

    fn lower(&mut self, condition: &Condition) -> Result<Groups, CompileError> {
        match condition {
            Condition::Located {
                location,
                condition,
            } => self.lower(condition).map_err(|err| err.located(*location)),
            Condition::Literal(value) => Ok(Groups::core(vec![literal(*value)])),
            Condition::Compare { left, op, right } => {
                Ok(Groups::core(self.compare_rows(left, *op, right)?))
            }
            Condition::And(a, b) => Ok(self.lower(a)?.and(self.lower(b)?)),
            Condition::Or(a, b) => Ok(self.lower(a)?.or(self.lower(b)?)),
            Condition::Repeated { count, condition } => {
                Ok(Groups::core(self.repeated(*count, condition)?))
            }
            Condition::ResetIf(inner) => {
                Ok(Groups::core(self.guard(inner, RequirementType::ResetIf)?))
            }
            Condition::PauseIf(inner) => {
                Ok(Groups::core(self.guard(inner, RequirementType::PauseIf)?))
            }
            Condition::Measured {
                condition,
                when,
                format,
            } => Ok(Groups::core(self.measured(
                condition,
                when.as_deref(),
                *format,
            )?)),
            Condition::Tally { count, items } => Ok(Groups::core(self.tally(*count, items)?)),
            Condition::TriggerWhen(inner) => {
                let mut groups = self.lower(inner)?;
                for group in groups.groups_mut() {
                    for row in group.iter_mut() {
                        if row.kind == RequirementType::None {
                            row.kind = RequirementType::Trigger;
                        }
                    }
                }
                Ok(groups)
            }
        }
    }

    /// Rows for a single comparison, or a literal row when it is constant and
    /// trivial results are allowed.
    fn compare_rows(
        &self,
        left: &ValueExpr,
        op: CompareOp,
        right: &ValueExpr,
    ) -> Result<Vec<Requirement>, CompileError> {
        match self.comparison(left, op, right)? {
            Comparison::Rows(rows) => Ok(rows),
            Comparison::Constant(value) if self.options.allow_trivial => Ok(vec![literal(value)]),
            Comparison::Constant(true) => Err(CompileError::AlwaysTrue { location: None }),
            Comparison::Constant(false) => Err(CompileError::NeverTrue { location: None }),
        }
    }

    /// `ResetIf` / `PauseIf`: one chain per disjunct.
    fn guard(
        &mut self,
        condition: &Condition,
        role: RequirementType,
    ) -> Result<Vec<Requirement>, CompileError> {
        let mut rows = Vec::new();
        for disjunct in flatten(condition, Junction::Or) {
            rows.extend(self.chain(disjunct, role)?);
        }
        Ok(rows)
    }

    fn repeated(
        &mut self,
        count: u32,
        condition: &Condition,
    ) -> Result<Vec<Requirement>, CompileError> {
        if count == 0 {
            return Err(CompileError::ZeroRepeatCount { location: None });
        }

        let mut rows = Vec::new();
        let mut counted = Vec::new();
        for conjunct in flatten(condition, Junction::And) {
            match conjunct.unlocated() {
                Condition::ResetIf(inner) => {
                    rows.extend(self.chain(inner, RequirementType::ResetNextIf)?);
                }
                _ => counted.push(conjunct),
            }
        }

        let mut counted_rows = match counted.as_slice() {
            [] => return Err(CompileError::NoTruthyConditions { location: None }),
            [single] if Junction::Or.matches(single) => {
                let disjuncts = flatten(single, Junction::Or);
                let last = disjuncts.len() - 1;
                let mut rows = Vec::new();
                for (index, disjunct) in disjuncts.into_iter().enumerate() {
                    let role = if index == last {
                        RequirementType::None
                    } else {
                        RequirementType::AddHits
                    };
                    rows.extend(self.chain(disjunct, role)?);
                }
                rows
            }
            [single] => self.chain(single, RequirementType::None)?,
            items => self.link_items(items, Junction::And)?,
        };
        if let Some(terminal) = counted_rows.last_mut() {
            terminal.hit_count = count;
        }
        rows.append(&mut counted_rows);
        Ok(rows)
    }

    fn measured(
        &mut self,
        condition: &Condition,
        when: Option<&Condition>,
        format: Option<MeasuredFormat>,
    ) -> Result<Vec<Requirement>, CompileError> {
        let role = match format.unwrap_or(self.options.measured_format) {
            MeasuredFormat::Raw => RequirementType::Measured,
            MeasuredFormat::Percent => RequirementType::MeasuredPercent,
        };
        let mut rows = self.chain(condition, role)?;

        let target = rows.last().and_then(|terminal| {
            if terminal.hit_count > 0 {
                Some(terminal.hit_count)
            } else if terminal.right.is_value() {
                Some(terminal.right.value)
            } else {
                None
            }
        });
        if let Some(target) = target {
            match self.measured_target {
                Some(first) if first != target => {
                    return Err(CompileError::MismatchedMeasuredTargets {
                        first,
                        second: target,
                        location: None,
                    });
                }
                Some(_) => {}
                None => self.measured_target = Some(target),
            }
        }

        if let Some(when) = when {
            for conjunct in flatten(when, Junction::And) {
                rows.extend(self.chain(conjunct, RequirementType::MeasuredIf)?);
            }
        }
        Ok(rows)
    }

    fn tally(&mut self, count: u32, items: &[TallyItem]) -> Result<Vec<Requirement>, CompileError> {
        if count == 0 {
            return Err(CompileError::ZeroRepeatCount { location: None });
        }
        if items.is_empty() {
            return Err(CompileError::EmptyTally { location: None });
        }
        let counted = items
            .iter()
            .rposition(|item| !item.deduct)
            .ok_or(CompileError::NoCountedTallyItem { location: None })?;

        let mut rows = Vec::new();
        for (index, item) in items.iter().enumerate() {
            if index == counted {
                continue;
            }
            let role = if item.deduct {
                RequirementType::SubHits
            } else {
                RequirementType::AddHits
            };
            rows.extend(self.chain(&item.condition, role)?);
        }
        let mut last = self.chain(&items[counted].condition, RequirementType::None)?;
        if let Some(terminal) = last.last_mut() {
            terminal.hit_count = count;
        }
        rows.append(&mut last);
        Ok(rows)
    }
}
