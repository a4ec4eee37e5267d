use crate::types::{
    Field, FieldKind, FieldSize, Requirement, RequirementClause, RequirementOperator,
    RequirementType, Trigger,
};

use super::rewrite_groups;

/// Pass 8: fold equality tests on every bit of a nibble into one nibble test,
/// and a low/high nibble pair into one byte test.
pub(super) fn merge_bits(trigger: &mut Trigger) -> bool {
    rewrite_groups(trigger, |clauses| {
        while let Some((positions, merged)) = find_nibble(clauses).or_else(|| find_byte(clauses)) {
            log::trace!("merged {} bit tests into {merged}", positions.len());
            clauses[positions[0]] = RequirementClause::single(merged);
            for &position in positions[1..].iter().rev() {
                clauses.remove(position);
            }
        }
    })
}

/// Location of a single-row `size == value` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EqualityTest {
    kind: FieldKind,
    address: u32,
    size: FieldSize,
    value: u32,
}

fn equality_test(clause: &RequirementClause) -> Option<EqualityTest> {
    let row = clause.terminal();
    let simple = clause.prefix().is_empty()
        && row.kind == RequirementType::None
        && row.hit_count == 0
        && row.operator == RequirementOperator::Equal
        && row.right.is_value()
        && row.left.is_memory()
        && row.left.kind != FieldKind::Bcd;
    simple.then_some(EqualityTest {
        kind: row.left.kind,
        address: row.left.value,
        size: row.left.size,
        value: row.right.value,
    })
}

fn merged_row(kind: FieldKind, size: FieldSize, address: u32, value: u32) -> Requirement {
    Requirement::new(
        Field::memory(size, address).with_kind(kind),
        RequirementOperator::Equal,
        Field::value(value),
    )
}

/// Positions in ascending order plus the replacement row.
type Found = (Vec<usize>, Requirement);

fn find_nibble(clauses: &[RequirementClause]) -> Option<Found> {
    let tests: Vec<(usize, EqualityTest, u8)> = clauses
        .iter()
        .enumerate()
        .filter_map(|(position, clause)| {
            let test = equality_test(clause)?;
            let bit = test.size.bit_index()?;
            (test.value <= 1).then_some((position, test, bit))
        })
        .collect();

    for &(_, first, bit) in &tests {
        let base = bit - bit % 4;
        let mut positions = Vec::with_capacity(4);
        let mut value = 0;
        for offset in 0..4 {
            let mut matching = tests.iter().filter(|(_, test, other)| {
                *other == base + offset && test.kind == first.kind && test.address == first.address
            });
            let (Some((position, test, _)), None) = (matching.next(), matching.next()) else {
                positions.clear();
                break;
            };
            positions.push(*position);
            value |= test.value << offset;
        }
        if positions.len() == 4 {
            positions.sort_unstable();
            let size = if base == 0 {
                FieldSize::LowNibble
            } else {
                FieldSize::HighNibble
            };
            return Some((positions, merged_row(first.kind, size, first.address, value)));
        }
    }
    None
}

fn find_byte(clauses: &[RequirementClause]) -> Option<Found> {
    let tests: Vec<(usize, EqualityTest)> = clauses
        .iter()
        .enumerate()
        .filter_map(|(position, clause)| Some((position, equality_test(clause)?)))
        .filter(|(_, test)| {
            matches!(test.size, FieldSize::LowNibble | FieldSize::HighNibble) && test.value <= 0xF
        })
        .collect();

    for &(_, low) in tests.iter().filter(|(_, test)| test.size == FieldSize::LowNibble) {
        let same = |size: FieldSize| {
            let found: Vec<&(usize, EqualityTest)> = tests
                .iter()
                .filter(|(_, test)| {
                    test.size == size && test.kind == low.kind && test.address == low.address
                })
                .collect();
            match found.as_slice() {
                [(position, test)] => Some((*position, test.value)),
                _ => None,
            }
        };
        let (Some((low_position, low_value)), Some((high_position, high_value))) =
            (same(FieldSize::LowNibble), same(FieldSize::HighNibble))
        else {
            continue;
        };
        let mut positions = vec![low_position, high_position];
        positions.sort_unstable();
        let value = (high_value << 4) | low_value;
        return Some((positions, merged_row(low.kind, FieldSize::Byte, low.address, value)));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test(size: FieldSize, address: u32, value: u32) -> Requirement {
        Requirement::new(
            Field::memory(size, address),
            RequirementOperator::Equal,
            Field::value(value),
        )
    }

    fn merged(core: Vec<Requirement>) -> Vec<Requirement> {
        let mut trigger = Trigger::new(core, Vec::new());
        merge_bits(&mut trigger);
        trigger.core
    }

    #[test]
    fn four_bits_become_low_nibble() {
        let core = vec![
            test(FieldSize::Bit0, 0x10, 1),
            test(FieldSize::Byte, 0x20, 3),
            test(FieldSize::Bit1, 0x10, 0),
            test(FieldSize::Bit2, 0x10, 1),
            test(FieldSize::Bit3, 0x10, 1),
        ];
        assert_eq!(
            merged(core),
            vec![test(FieldSize::LowNibble, 0x10, 0b1101), test(FieldSize::Byte, 0x20, 3)]
        );
    }

    #[test]
    fn eight_bits_become_byte() {
        let core: Vec<Requirement> = (0..8u8)
            .map(|bit| {
                let size = FieldSize::bit(bit).unwrap();
                test(size, 0x10, u32::from(bit % 2))
            })
            .collect();
        assert_eq!(merged(core), vec![test(FieldSize::Byte, 0x10, 0xAA)]);
    }

    #[test]
    fn missing_bit_blocks_merge() {
        let core = vec![
            test(FieldSize::Bit4, 0x10, 1),
            test(FieldSize::Bit5, 0x10, 1),
            test(FieldSize::Bit6, 0x10, 1),
        ];
        assert_eq!(merged(core.clone()), core);
    }

    #[test]
    fn repeated_bit_blocks_merge() {
        let core = vec![
            test(FieldSize::Bit0, 0x10, 1),
            test(FieldSize::Bit0, 0x10, 0),
            test(FieldSize::Bit1, 0x10, 1),
            test(FieldSize::Bit2, 0x10, 1),
            test(FieldSize::Bit3, 0x10, 1),
        ];
        assert_eq!(merged(core.clone()), core);
    }

    #[test]
    fn different_addresses_stay_apart() {
        let core = vec![
            test(FieldSize::LowNibble, 0x10, 1),
            test(FieldSize::HighNibble, 0x11, 2),
        ];
        assert_eq!(merged(core.clone()), core);
    }

    #[test]
    fn nibbles_become_byte() {
        let core = vec![
            test(FieldSize::HighNibble, 0x10, 0x3),
            test(FieldSize::LowNibble, 0x10, 0xC),
        ];
        assert_eq!(merged(core), vec![test(FieldSize::Byte, 0x10, 0x3C)]);
    }
}
