use winnow::ascii::digit1;
use winnow::combinator::{alt, cut_err, delimited, opt, preceded, repeat, separated, terminated};
use winnow::error::{ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, one_of, take_while};

use crate::serial::{FLAGS, SIZES};
use crate::types::{
    Field, FieldKind, FieldSize, Requirement, RequirementOperator, RequirementType, Trigger,
};

fn expected(description: &'static str) -> StrContext {
    StrContext::Expected(StrContextValue::Description(description))
}

// -- Numbers ----------------------------------------------------------------

fn unsigned(input: &mut &str) -> ModalResult<u32> {
    digit1.try_map(str::parse::<u32>).parse_next(input)
}

fn hex_digits(input: &mut &str) -> ModalResult<u32> {
    take_while(1..=8, |c: char| c.is_ascii_hexdigit())
        .try_map(|digits: &str| u32::from_str_radix(digits, 16))
        .parse_next(input)
}

/// Decimal literal. Negative values wrap to their 32-bit two's complement.
fn decimal(input: &mut &str) -> ModalResult<u32> {
    let text = (opt('-'), digit1).take().parse_next(input)?;
    let value: i64 = text.parse().map_err(|_| ErrMode::from_input(input).cut())?;
    if value < i64::from(i32::MIN) || value > i64::from(u32::MAX) {
        return Err(ErrMode::from_input(input).cut());
    }
    u32::try_from(value.rem_euclid(1 << 32)).map_err(|_| ErrMode::from_input(input).cut())
}

// -- Operands ---------------------------------------------------------------

fn size(input: &mut &str) -> ModalResult<FieldSize> {
    let letter = opt(any.verify_map(|c: char| {
        let c = c.to_ascii_uppercase();
        SIZES
            .iter()
            .find(|(letter, _)| *letter == c)
            .map(|(_, size)| *size)
    }))
    .parse_next(input)?;
    Ok(letter.unwrap_or(FieldSize::Word))
}

fn memory(input: &mut &str) -> ModalResult<Field> {
    let kind = opt(one_of(['d', 'D', 'p', 'P', 'b', 'B']))
        .map(|prefix| match prefix.map(|c: char| c.to_ascii_lowercase()) {
            Some('d') => FieldKind::Delta,
            Some('p') => FieldKind::Prior,
            Some('b') => FieldKind::Bcd,
            _ => FieldKind::Memory,
        })
        .parse_next(input)?;
    alt(("0x", "0X")).parse_next(input)?;
    let size = size.parse_next(input)?;
    let address = cut_err(hex_digits)
        .context(expected("hex address"))
        .parse_next(input)?;
    Ok(Field {
        kind,
        size,
        value: address,
    })
}

fn operand(input: &mut &str) -> ModalResult<Field> {
    alt((
        memory,
        preceded(one_of(['h', 'H']), cut_err(hex_digits)).map(Field::value),
        decimal.map(Field::value),
    ))
    .context(expected("operand"))
    .parse_next(input)
}

fn operator(input: &mut &str) -> ModalResult<RequirementOperator> {
    alt((
        "==".value(RequirementOperator::Equal),
        "=".value(RequirementOperator::Equal),
        "!=".value(RequirementOperator::NotEqual),
        "<=".value(RequirementOperator::LessThanOrEqual),
        "<".value(RequirementOperator::LessThan),
        ">=".value(RequirementOperator::GreaterThanOrEqual),
        ">".value(RequirementOperator::GreaterThan),
        "*".value(RequirementOperator::Multiply),
        "/".value(RequirementOperator::Divide),
        "&".value(RequirementOperator::BitwiseAnd),
    ))
    .parse_next(input)
}

// -- Rows -------------------------------------------------------------------

fn flag(input: &mut &str) -> ModalResult<RequirementType> {
    terminated(
        any.verify_map(|c: char| {
            let c = c.to_ascii_uppercase();
            FLAGS
                .iter()
                .find(|(letter, _)| *letter == c)
                .map(|(_, kind)| *kind)
        }),
        ':',
    )
    .parse_next(input)
}

/// `.N.`, or the legacy `(N)`.
fn hits(input: &mut &str) -> ModalResult<u32> {
    alt((
        delimited('.', cut_err(unsigned), cut_err('.')),
        delimited('(', cut_err(unsigned), cut_err(')')),
    ))
    .context(expected("hit count"))
    .parse_next(input)
}

fn requirement(input: &mut &str) -> ModalResult<Requirement> {
    let kind = opt(flag).parse_next(input)?;
    let left = match kind {
        Some(_) => cut_err(operand).parse_next(input)?,
        None => operand.parse_next(input)?,
    };
    let (operator, right) = opt((operator, cut_err(operand)))
        .parse_next(input)?
        .unwrap_or_default();
    let hit_count = opt(hits).parse_next(input)?.unwrap_or(0);
    Ok(Requirement {
        left,
        operator,
        right,
        kind: kind.unwrap_or_default(),
        hit_count,
    })
}

fn group(input: &mut &str) -> ModalResult<Vec<Requirement>> {
    separated(1.., requirement, '_').parse_next(input)
}

// -- Top-level parser -------------------------------------------------------

pub fn parse_trigger(input: &mut &str) -> ModalResult<Trigger> {
    let core = opt(group).parse_next(input)?.unwrap_or_default();
    let alternates: Vec<Vec<Requirement>> = repeat(
        0..,
        preceded(one_of(['S', 's']), cut_err(group).context(expected("alternate group"))),
    )
    .parse_next(input)?;

    // `1=1` only anchors the alternates for older runtimes
    let core = if !alternates.is_empty() && core == [Requirement::always_true()] {
        Vec::new()
    } else {
        core
    };
    Ok(Trigger::new(core, alternates))
}
