use std::fmt;
use std::ops::{Add, BitAnd, Div, Mul, Sub};

/// Comparison operators supported in trigger expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    /// Operand swap: `a op b` holds exactly when `b op.reverse() a` holds.
    #[must_use]
    pub fn reverse(self) -> Self {
        match self {
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Gte => CompareOp::Lte,
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Lte => CompareOp::Gte,
            other => other,
        }
    }

    pub(crate) fn holds(self, left: i128, right: i128) -> bool {
        match self {
            CompareOp::Eq => left == right,
            CompareOp::Neq => left != right,
            CompareOp::Gt => left > right,
            CompareOp::Gte => left >= right,
            CompareOp::Lt => left < right,
            CompareOp::Lte => left <= right,
        }
    }
}

/// Source span attached to a condition by the front end.
///
/// The compiler never interprets it; it is copied onto any error raised while
/// lowering the located subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub start: usize,
    pub end: usize,
}

impl Location {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Arithmetic over memory reads and integer constants.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueExpr {
    Constant(i64),
    /// Memory read through a named accessor (`byte`, `word`, `bit3`, ...).
    Read {
        accessor: String,
        address: Box<ValueExpr>,
    },
    /// Value of a read as of the previous frame.
    Prev(Box<ValueExpr>),
    /// Last different value of a read.
    Prior(Box<ValueExpr>),
    /// Read decoded as binary-coded decimal.
    Bcd(Box<ValueExpr>),
    Add(Box<ValueExpr>, Box<ValueExpr>),
    Sub(Box<ValueExpr>, Box<ValueExpr>),
    Mul(Box<ValueExpr>, Box<ValueExpr>),
    Div(Box<ValueExpr>, Box<ValueExpr>),
    BitAnd(Box<ValueExpr>, Box<ValueExpr>),
}

/// Display format of a measured value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MeasuredFormat {
    #[default]
    Raw,
    Percent,
}

/// One contribution to a [`Condition::Tally`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TallyItem {
    pub condition: Condition,
    /// Hits of a deducted item subtract from the tally.
    pub deduct: bool,
}

impl From<Condition> for TallyItem {
    fn from(condition: Condition) -> Self {
        Self {
            condition,
            deduct: false,
        }
    }
}

/// Boolean expression tree handed to the compiler.
///
/// The tree is negation-free: the front end applies De Morgan before handing
/// it over, so there is no `Not` variant.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Condition {
    Compare {
        left: ValueExpr,
        op: CompareOp,
        right: ValueExpr,
    },
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Literal(bool),
    /// True once `condition` has been true for `count` frames.
    Repeated {
        count: u32,
        condition: Box<Condition>,
    },
    ResetIf(Box<Condition>),
    PauseIf(Box<Condition>),
    Measured {
        condition: Box<Condition>,
        when: Option<Box<Condition>>,
        /// `None` defers to [`CompileOptions::measured_format`](crate::CompileOptions).
        format: Option<MeasuredFormat>,
    },
    Tally {
        count: u32,
        items: Vec<TallyItem>,
    },
    TriggerWhen(Box<Condition>),
    Located {
        location: Location,
        condition: Box<Condition>,
    },
}

impl ValueExpr {
    fn compare(self, op: CompareOp, right: impl Into<ValueExpr>) -> Condition {
        Condition::Compare {
            left: self,
            op,
            right: right.into(),
        }
    }

    #[must_use]
    pub fn eq(self, right: impl Into<ValueExpr>) -> Condition {
        self.compare(CompareOp::Eq, right)
    }

    #[must_use]
    pub fn neq(self, right: impl Into<ValueExpr>) -> Condition {
        self.compare(CompareOp::Neq, right)
    }

    #[must_use]
    pub fn gt(self, right: impl Into<ValueExpr>) -> Condition {
        self.compare(CompareOp::Gt, right)
    }

    #[must_use]
    pub fn gte(self, right: impl Into<ValueExpr>) -> Condition {
        self.compare(CompareOp::Gte, right)
    }

    #[must_use]
    pub fn lt(self, right: impl Into<ValueExpr>) -> Condition {
        self.compare(CompareOp::Lt, right)
    }

    #[must_use]
    pub fn lte(self, right: impl Into<ValueExpr>) -> Condition {
        self.compare(CompareOp::Lte, right)
    }

    fn is_additive(&self) -> bool {
        matches!(self, ValueExpr::Add(..) | ValueExpr::Sub(..))
    }
}

impl From<i64> for ValueExpr {
    fn from(value: i64) -> Self {
        ValueExpr::Constant(value)
    }
}

impl From<i32> for ValueExpr {
    fn from(value: i32) -> Self {
        ValueExpr::Constant(i64::from(value))
    }
}

impl From<u32> for ValueExpr {
    fn from(value: u32) -> Self {
        ValueExpr::Constant(i64::from(value))
    }
}

macro_rules! value_expr_op {
    ($trait:ident, $method:ident, $variant:ident) => {
        impl<T: Into<ValueExpr>> $trait<T> for ValueExpr {
            type Output = ValueExpr;

            fn $method(self, rhs: T) -> ValueExpr {
                ValueExpr::$variant(Box::new(self), Box::new(rhs.into()))
            }
        }
    };
}

value_expr_op!(Add, add, Add);
value_expr_op!(Sub, sub, Sub);
value_expr_op!(Mul, mul, Mul);
value_expr_op!(Div, div, Div);
value_expr_op!(BitAnd, bitand, BitAnd);

impl Condition {
    #[must_use]
    pub fn and(self, other: Condition) -> Condition {
        Condition::And(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn or(self, other: Condition) -> Condition {
        Condition::Or(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn always_true() -> Condition {
        Condition::Literal(true)
    }

    #[must_use]
    pub fn always_false() -> Condition {
        Condition::Literal(false)
    }

    /// Attach a source span to this subtree.
    #[must_use]
    pub fn located(self, start: usize, end: usize) -> Condition {
        Condition::Located {
            location: Location::new(start, end),
            condition: Box::new(self),
        }
    }

    /// Strip any number of [`Condition::Located`] wrappers.
    #[must_use]
    pub fn unlocated(&self) -> &Condition {
        let mut condition = self;
        while let Condition::Located { condition: inner, .. } = condition {
            condition = inner;
        }
        condition
    }
}

/// Generic memory read through a named accessor.
#[must_use]
pub fn read(accessor: &str, address: impl Into<ValueExpr>) -> ValueExpr {
    ValueExpr::Read {
        accessor: accessor.to_owned(),
        address: Box::new(address.into()),
    }
}

macro_rules! accessor_fns {
    ($($name:ident),* $(,)?) => {
        $(
            #[must_use]
            pub fn $name(address: impl Into<ValueExpr>) -> ValueExpr {
                read(stringify!($name), address)
            }
        )*
    };
}

accessor_fns!(byte, word, tbyte, dword, low4, high4, word_be, tbyte_be, dword_be, bitcount);

/// Single-bit read; `index` is `0..=7`.
#[must_use]
pub fn bit(index: u8, address: impl Into<ValueExpr>) -> ValueExpr {
    read(&format!("bit{index}"), address)
}

#[must_use]
pub fn prev(value: ValueExpr) -> ValueExpr {
    ValueExpr::Prev(Box::new(value))
}

#[must_use]
pub fn prior(value: ValueExpr) -> ValueExpr {
    ValueExpr::Prior(Box::new(value))
}

#[must_use]
pub fn bcd(value: ValueExpr) -> ValueExpr {
    ValueExpr::Bcd(Box::new(value))
}

#[must_use]
pub fn once(condition: Condition) -> Condition {
    repeated(1, condition)
}

#[must_use]
pub fn repeated(count: u32, condition: Condition) -> Condition {
    Condition::Repeated {
        count,
        condition: Box::new(condition),
    }
}

/// Resets all hit counts while `condition` is true.
#[must_use]
pub fn never(condition: Condition) -> Condition {
    Condition::ResetIf(Box::new(condition))
}

/// Pauses the enclosing group while `condition` is true.
#[must_use]
pub fn unless(condition: Condition) -> Condition {
    Condition::PauseIf(Box::new(condition))
}

#[must_use]
pub fn measured(condition: Condition) -> Condition {
    Condition::Measured {
        condition: Box::new(condition),
        when: None,
        format: None,
    }
}

#[must_use]
pub fn measured_percent(condition: Condition) -> Condition {
    Condition::Measured {
        condition: Box::new(condition),
        when: None,
        format: Some(MeasuredFormat::Percent),
    }
}

/// A measured condition that only counts while `when` holds.
#[must_use]
pub fn measured_when(condition: Condition, when: Condition) -> Condition {
    Condition::Measured {
        condition: Box::new(condition),
        when: Some(Box::new(when)),
        format: None,
    }
}

#[must_use]
pub fn tally(count: u32, items: impl IntoIterator<Item = TallyItem>) -> Condition {
    Condition::Tally {
        count,
        items: items.into_iter().collect(),
    }
}

/// A tally item whose hits subtract from the total.
#[must_use]
pub fn deduct(condition: Condition) -> TallyItem {
    TallyItem {
        condition,
        deduct: true,
    }
}

#[must_use]
pub fn trigger_when(condition: Condition) -> Condition {
    Condition::TriggerWhen(Box::new(condition))
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::Neq => write!(f, "!="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Gte => write!(f, ">="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Lte => write!(f, "<="),
        }
    }
}

fn write_factor(f: &mut fmt::Formatter<'_>, value: &ValueExpr) -> fmt::Result {
    if value.is_additive() {
        write!(f, "({value})")
    } else {
        write!(f, "{value}")
    }
}

impl fmt::Display for ValueExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueExpr::Constant(value) => write!(f, "{value}"),
            ValueExpr::Read { accessor, address } => match address.as_ref() {
                ValueExpr::Constant(value) if *value >= 0 => {
                    write!(f, "{accessor}(0x{value:06X})")
                }
                other => write!(f, "{accessor}({other})"),
            },
            ValueExpr::Prev(inner) => write!(f, "prev({inner})"),
            ValueExpr::Prior(inner) => write!(f, "prior({inner})"),
            ValueExpr::Bcd(inner) => write!(f, "bcd({inner})"),
            ValueExpr::Add(a, b) => write!(f, "{a} + {b}"),
            ValueExpr::Sub(a, b) => {
                write!(f, "{a} - ")?;
                write_factor(f, b)
            }
            ValueExpr::Mul(a, b) | ValueExpr::Div(a, b) | ValueExpr::BitAnd(a, b) => {
                let symbol = match self {
                    ValueExpr::Mul(..) => '*',
                    ValueExpr::Div(..) => '/',
                    _ => '&',
                };
                write_factor(f, a)?;
                write!(f, " {symbol} ")?;
                write_factor(f, b)
            }
        }
    }
}

fn write_conjunct(f: &mut fmt::Formatter<'_>, condition: &Condition) -> fmt::Result {
    if matches!(condition.unlocated(), Condition::Or(..)) {
        write!(f, "({condition})")
    } else {
        write!(f, "{condition}")
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Compare { left, op, right } => write!(f, "{left} {op} {right}"),
            Condition::And(a, b) => {
                write_conjunct(f, a)?;
                write!(f, " && ")?;
                write_conjunct(f, b)
            }
            Condition::Or(a, b) => write!(f, "{a} || {b}"),
            Condition::Literal(true) => write!(f, "always_true()"),
            Condition::Literal(false) => write!(f, "always_false()"),
            Condition::Repeated {
                count: 1,
                condition,
            } => write!(f, "once({condition})"),
            Condition::Repeated { count, condition } => {
                write!(f, "repeated({count}, {condition})")
            }
            Condition::ResetIf(inner) => write!(f, "never({inner})"),
            Condition::PauseIf(inner) => write!(f, "unless({inner})"),
            Condition::Measured {
                condition,
                when,
                format,
            } => {
                write!(f, "measured({condition}")?;
                if let Some(when) = when {
                    write!(f, ", when={when}")?;
                }
                if *format == Some(MeasuredFormat::Percent) {
                    write!(f, ", format=\"percent\"")?;
                }
                write!(f, ")")
            }
            Condition::Tally { count, items } => {
                write!(f, "tally({count}")?;
                for item in items {
                    if item.deduct {
                        write!(f, ", deduct({})", item.condition)?;
                    } else {
                        write!(f, ", {}", item.condition)?;
                    }
                }
                write!(f, ")")
            }
            Condition::TriggerWhen(inner) => write!(f, "trigger_when({inner})"),
            Condition::Located { condition, .. } => write!(f, "{condition}"),
        }
    }
}
