//! Rendering of compiled triggers back into script text.
//!
//! Each clause becomes one script condition: accumulator chains are written
//! as sums, `AddAddress` pointers as nested reads, hit targets as `once` /
//! `repeated` / `tally`, and flags as `never`, `unless`, `measured` or
//! `trigger_when`. Alternates are joined with ` || ` after the core.

use crate::serial::operator_symbol;
use crate::types::{
    Field, FieldKind, NumberFormat, RenderOptions, Requirement, RequirementClause,
    RequirementOperator, RequirementType, Trigger,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Junction {
    And,
    Or,
}

impl Junction {
    fn symbol(self) -> &'static str {
        match self {
            Junction::And => " && ",
            Junction::Or => " || ",
        }
    }
}

/// A rendered condition plus the junction at its top level, if any.
#[derive(Debug, Clone)]
struct Text {
    text: String,
    junction: Option<Junction>,
}

impl Text {
    fn atom(text: String) -> Self {
        Self {
            text,
            junction: None,
        }
    }

    /// Operand of `junction`, parenthesized when it binds differently.
    fn operand(&self, junction: Junction) -> String {
        match self.junction {
            Some(own) if own != junction => format!("({})", self.text),
            _ => self.text.clone(),
        }
    }

    fn join(self, junction: Junction, next: &Text) -> Self {
        Self {
            text: format!("{}{}{}", self.operand(junction), junction.symbol(), next.operand(junction)),
            junction: Some(junction),
        }
    }
}

struct Renderer<'a> {
    options: &'a RenderOptions,
}

impl Renderer<'_> {
    fn number(&self, value: u32) -> String {
        match self.options.number_format {
            NumberFormat::Decimal => value.to_string(),
            NumberFormat::Hex => format!("0x{value:X}"),
        }
    }

    fn field(&self, field: &Field, pointer: Option<&str>) -> String {
        let modifier = match field.kind {
            FieldKind::None => return String::new(),
            FieldKind::Value => return self.number(field.value),
            FieldKind::Memory => None,
            FieldKind::Delta => Some("prev"),
            FieldKind::Prior => Some("prior"),
            FieldKind::Bcd => Some("bcd"),
        };
        let address = match pointer {
            Some(pointer) if field.value == 0 => pointer.to_owned(),
            Some(pointer) => format!("{pointer} + 0x{:06X}", field.value),
            None => format!("0x{:06X}", field.value),
        };
        let read = format!("{}({address})", field.size.accessor_name());
        match modifier {
            Some(modifier) => format!("{modifier}({read})"),
            None => read,
        }
    }

    /// Left operand with its `*`, `/` or `&` modifier applied.
    fn value(&self, row: &Requirement, pointer: Option<&str>) -> String {
        let left = self.field(&row.left, pointer);
        if row.operator.is_modifier() {
            let right = self.field(&row.right, pointer);
            format!("{left} {} {right}", operator_symbol(row.operator))
        } else {
            left
        }
    }

    fn comparison(&self, row: &Requirement, terms: &[(bool, String)], pointer: Option<&str>) -> String {
        if terms.is_empty() {
            if row.is_always_true() {
                return "always_true()".to_owned();
            }
            if row.is_always_false() {
                return "always_false()".to_owned();
            }
        }
        let mut left = String::new();
        for (index, (subtract, term)) in terms.iter().enumerate() {
            match (index, subtract) {
                (0, false) => left.push_str(term),
                (0, true) => left.push_str(&format!("0 - {term}")),
                (_, false) => left.push_str(&format!(" + {term}")),
                (_, true) => left.push_str(&format!(" - {term}")),
            }
        }
        let own = self.field(&row.left, pointer);
        if left.is_empty() {
            left = own;
        } else {
            left.push_str(&format!(" + {own}"));
        }
        let symbol = match row.operator {
            RequirementOperator::Equal => "==",
            other => operator_symbol(other),
        };
        format!("{left} {symbol} {}", self.field(&row.right, pointer))
    }

    /// Render one clause. `MeasuredIf` clauses come back separately so the
    /// group can attach them to its measurement.
    fn clause(&self, clause: &RequirementClause) -> (Text, RequirementType) {
        let mut pointer: Option<String> = None;
        let mut terms: Vec<(bool, String)> = Vec::new();
        let mut chain: Option<(Text, Junction)> = None;
        let mut tally: Vec<String> = Vec::new();
        let mut reset_next: Option<String> = None;
        let mut result = Text::atom(String::new());

        for row in clause.requirements() {
            let current = pointer.take();
            match row.kind {
                RequirementType::AddAddress => {
                    pointer = Some(self.value(row, current.as_deref()));
                    continue;
                }
                RequirementType::AddSource | RequirementType::SubSource => {
                    let subtract = row.kind == RequirementType::SubSource;
                    terms.push((subtract, self.value(row, current.as_deref())));
                    continue;
                }
                _ => {}
            }

            let compared = if row.is_comparison() {
                self.comparison(row, &terms, current.as_deref())
            } else {
                self.value(row, current.as_deref())
            };
            terms.clear();
            let mut condition = Text::atom(compared);

            if row.kind == RequirementType::ResetNextIf {
                reset_next = Some(condition.text);
                continue;
            }
            if let Some((previous, junction)) = chain.take() {
                condition = previous.join(junction, &condition);
            }
            match row.kind {
                RequirementType::AndNext => {
                    chain = Some((condition, Junction::And));
                    continue;
                }
                RequirementType::OrNext => {
                    chain = Some((condition, Junction::Or));
                    continue;
                }
                _ => {}
            }
            if let Some(reset) = reset_next.take() {
                condition = condition.join(Junction::And, &Text::atom(format!("never({reset})")));
            }
            match row.kind {
                RequirementType::AddHits => {
                    tally.push(condition.text);
                    continue;
                }
                RequirementType::SubHits => {
                    tally.push(format!("deduct({})", condition.text));
                    continue;
                }
                _ => {}
            }
            condition = if !tally.is_empty() {
                tally.push(condition.text);
                Text::atom(format!("tally({}, {})", row.hit_count, tally.join(", ")))
            } else if row.hit_count == 1 {
                Text::atom(format!("once({})", condition.text))
            } else if row.hit_count > 1 {
                Text::atom(format!("repeated({}, {})", row.hit_count, condition.text))
            } else {
                condition
            };
            result = condition;
        }

        if let Some((dangling, _)) = chain {
            result = dangling;
        }
        let kind = clause.kind();
        let wrapped = match kind {
            RequirementType::ResetIf => Some(format!("never({})", result.text)),
            RequirementType::PauseIf => Some(format!("unless({})", result.text)),
            RequirementType::Trigger => Some(format!("trigger_when({})", result.text)),
            _ => None,
        };
        (wrapped.map_or(result, Text::atom), kind)
    }

    /// Conditions of one group, with `MeasuredIf` folded into the measurement.
    fn group(&self, rows: &[Requirement]) -> Vec<Text> {
        let rendered: Vec<(Text, RequirementType)> = RequirementClause::split(rows)
            .iter()
            .map(|clause| self.clause(clause))
            .collect();
        let guards: Vec<String> = rendered
            .iter()
            .filter(|(_, kind)| *kind == RequirementType::MeasuredIf)
            .map(|(text, _)| text.operand(Junction::And))
            .collect();
        let has_measured = rendered.iter().any(|(_, kind)| kind.is_measured());

        let mut conditions = Vec::with_capacity(rendered.len());
        for (text, kind) in rendered {
            let condition = match kind {
                RequirementType::Measured | RequirementType::MeasuredPercent => {
                    let mut call = format!("measured({}", text.text);
                    if !guards.is_empty() {
                        call.push_str(&format!(", when={}", guards.join(" && ")));
                    }
                    if kind == RequirementType::MeasuredPercent {
                        call.push_str(", format=\"percent\"");
                    }
                    call.push(')');
                    Text::atom(call)
                }
                RequirementType::MeasuredIf if has_measured => continue,
                RequirementType::MeasuredIf => Text::atom(format!("measured_if({})", text.text)),
                _ => text,
            };
            conditions.push(condition);
        }
        conditions
    }

    /// Top-level conjuncts: each core condition, then the alternation.
    fn segments(&self, trigger: &Trigger) -> Vec<String> {
        let mut segments: Vec<String> = self
            .group(&trigger.core)
            .iter()
            .map(|text| text.operand(Junction::And))
            .collect();
        if !trigger.alternates.is_empty() {
            let alternates: Vec<String> = trigger
                .alternates
                .iter()
                .map(|alternate| {
                    let conditions: Vec<String> = self
                        .group(alternate)
                        .iter()
                        .map(|text| text.operand(Junction::And))
                        .collect();
                    match conditions.as_slice() {
                        [] => "always_true()".to_owned(),
                        [single] => single.clone(),
                        _ => format!("({})", conditions.join(" && ")),
                    }
                })
                .collect();
            let alternation = alternates.join(" || ");
            if segments.is_empty() {
                segments.push(alternation);
            } else {
                segments.push(format!("({alternation})"));
            }
        }
        if segments.is_empty() {
            segments.push("always_true()".to_owned());
        }
        segments
    }
}

/// Render `trigger` as script text, wrapping at top-level ` && ` boundaries
/// when `options.width` is non-zero.
#[must_use]
pub fn render(trigger: &Trigger, options: &RenderOptions) -> String {
    let renderer = Renderer { options };
    let segments = renderer.segments(trigger);
    if options.width == 0 {
        return segments.join(" && ");
    }

    let indent = " ".repeat(options.indent);
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    for segment in segments {
        if line.is_empty() {
            line = if lines.is_empty() {
                segment
            } else {
                format!("{indent}{segment}")
            };
        } else if line.len() + " && ".len() + segment.len() > options.width {
            line.push_str(" &&");
            lines.push(std::mem::replace(&mut line, format!("{indent}{segment}")));
        } else {
            line.push_str(" && ");
            line.push_str(&segment);
        }
    }
    lines.push(line);
    lines.join("\n")
}
