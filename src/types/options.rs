use super::expr::MeasuredFormat;

/// Knobs for [`compile`](crate::compile()).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct CompileOptions {
    /// Emit `1=1`/`0=1` for comparisons that reduce to constants instead of
    /// failing with [`CompileError::AlwaysTrue`](crate::CompileError::AlwaysTrue)
    /// or [`CompileError::NeverTrue`](crate::CompileError::NeverTrue).
    pub allow_trivial: bool,
    /// Format used by measured conditions that do not pick one.
    pub measured_format: MeasuredFormat,
    /// Run the optimizer on the compiled trigger.
    pub optimize: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            allow_trivial: false,
            measured_format: MeasuredFormat::Raw,
            optimize: true,
        }
    }
}

impl CompileOptions {
    #[must_use]
    pub fn with_allow_trivial(self, allow_trivial: bool) -> Self {
        Self {
            allow_trivial,
            ..self
        }
    }

    #[must_use]
    pub fn with_measured_format(self, measured_format: MeasuredFormat) -> Self {
        Self {
            measured_format,
            ..self
        }
    }

    #[must_use]
    pub fn with_optimize(self, optimize: bool) -> Self {
        Self { optimize, ..self }
    }
}

/// How literal values are written by [`render`](crate::render::render).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NumberFormat {
    #[default]
    Decimal,
    Hex,
}

/// Layout of script text produced by [`render`](crate::render::render).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct RenderOptions {
    /// Maximum line width; 0 disables wrapping.
    pub width: usize,
    /// Spaces prefixed to continuation lines.
    pub indent: usize,
    pub number_format: NumberFormat,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 0,
            indent: 4,
            number_format: NumberFormat::Decimal,
        }
    }
}

impl RenderOptions {
    #[must_use]
    pub fn with_width(self, width: usize) -> Self {
        Self { width, ..self }
    }

    #[must_use]
    pub fn with_indent(self, indent: usize) -> Self {
        Self { indent, ..self }
    }

    #[must_use]
    pub fn with_number_format(self, number_format: NumberFormat) -> Self {
        Self {
            number_format,
            ..self
        }
    }
}
