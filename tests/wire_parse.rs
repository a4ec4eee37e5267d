use trigger_compiler::parse::{parse, ParseError};
use trigger_compiler::render::render;
use trigger_compiler::serial::serialize;
use trigger_compiler::{
    Field, FieldKind, FieldSize, NumberFormat, RenderOptions, Requirement, RequirementOperator,
    RequirementType, Trigger, TriggerError,
};

#[test]
fn real_world_trigger_round_trips() {
    let text = "0xH00a0b2=1_d0xH00a0b2=0_R:0xX001c10>=100_P:0xL0000ff=3S0xH000010=1.5.S0xM000010=1_0xN000010=0";
    let trigger = parse(text).unwrap();
    assert_eq!(trigger.core.len(), 4);
    assert_eq!(trigger.alternates.len(), 2);
    assert_eq!(trigger.core[1].left.kind, FieldKind::Delta);
    assert_eq!(trigger.core[2].kind, RequirementType::ResetIf);
    assert_eq!(trigger.alternates[0][0].hit_count, 5);
    assert_eq!(serialize(&trigger), text);
}

#[test]
fn legacy_forms_are_normalized_on_write() {
    let trigger: Trigger = "r:0xh000001==h10(3)_0x 000002!=-1".parse().unwrap();
    assert_eq!(serialize(&trigger), "R:0xH000001=16.3._0x 000002!=4294967295");
}

#[test]
fn word_without_size_letter() {
    let trigger = parse("0x001234=1").unwrap();
    assert_eq!(trigger.core[0].left, Field::memory(FieldSize::Word, 0x1234));
    assert_eq!(serialize(&trigger), "0x 001234=1");
}

#[test]
fn empty_core_is_anchored() {
    let trigger = parse("S0xH000001=1S0xH000002=1").unwrap();
    assert!(trigger.core.is_empty());
    assert_eq!(serialize(&trigger), "1=1S0xH000001=1S0xH000002=1");
    assert_eq!(parse(&serialize(&trigger)).unwrap(), trigger);
}

#[test]
fn every_flag_parses() {
    let text = "R:0xH000001=1_P:0xH000001=1_A:0xH000001_B:0xH000001_C:0xH000001=1_D:0xH000001=1_\
                N:0xH000001=1_O:0xH000001=1_M:0xH000001=1_G:0xH000001=1_Q:0xH000001=1_\
                I:0xH000001_T:0xH000001=1_Z:0xH000001=1";
    let kinds: Vec<RequirementType> = parse(text).unwrap().core.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            RequirementType::ResetIf,
            RequirementType::PauseIf,
            RequirementType::AddSource,
            RequirementType::SubSource,
            RequirementType::AddHits,
            RequirementType::SubHits,
            RequirementType::AndNext,
            RequirementType::OrNext,
            RequirementType::Measured,
            RequirementType::MeasuredPercent,
            RequirementType::MeasuredIf,
            RequirementType::AddAddress,
            RequirementType::Trigger,
            RequirementType::ResetNextIf,
        ]
    );
}

#[test]
fn memory_prefixes() {
    let trigger = parse("d0xH000001=p0xH000001_b0xH000002>1").unwrap();
    assert_eq!(trigger.core[0].left, Field::delta(FieldSize::Byte, 1));
    assert_eq!(trigger.core[0].right, Field::prior(FieldSize::Byte, 1));
    assert_eq!(trigger.core[1].left, Field::bcd(FieldSize::Byte, 2));
}

#[test]
fn parse_never_optimizes() {
    let text = "0xH000001>1_0xH000001>2_1=1";
    assert_eq!(serialize(&parse(text).unwrap()), text);
}

#[test]
fn error_offsets_point_at_the_problem() {
    let err = parse("0xH000001=1_0xH000002>").unwrap_err();
    assert_eq!(err.offset(), 22);
    assert!(err.to_string().starts_with("parse error at offset 22"));

    let err = parse("0xH000001=1_R:").unwrap_err();
    assert_eq!(err.offset(), 14);
}

#[test]
fn parse_error_converts_to_trigger_error() {
    let err: ParseError = parse("0xH00000g=1").unwrap_err();
    let wrapped = TriggerError::from(err.clone());
    assert_eq!(wrapped, TriggerError::Parse(err.clone()));
    assert_eq!(wrapped.to_string(), err.to_string());
}

#[test]
fn rendered_trigger_reads_as_script() {
    let trigger = parse("0xH001234=1_R:0xH000010=0_P:d0x 000020>=100S0xM000030=1S0xH000040=2.3.")
        .unwrap();
    assert_eq!(
        render(&trigger, &RenderOptions::default()),
        "byte(0x001234) == 1 && never(byte(0x000010) == 0) && unless(prev(word(0x000020)) >= 100) && \
         (bit0(0x000030) == 1 || repeated(3, byte(0x000040) == 2))"
    );
}

#[test]
fn rendered_trigger_wraps_at_width() {
    let trigger = parse("0xH001234=1_0xH001235=2_0xH001236=3").unwrap();
    let options = RenderOptions::default().with_width(50).with_indent(2);
    assert_eq!(
        render(&trigger, &options),
        "byte(0x001234) == 1 && byte(0x001235) == 2 &&\n  byte(0x001236) == 3"
    );
}

#[test]
fn rendered_hex_literals() {
    let trigger = Trigger::new(
        vec![Requirement::new(
            Field::memory(FieldSize::Word, 0x10),
            RequirementOperator::GreaterThan,
            Field::value(0x1F4),
        )],
        Vec::new(),
    );
    let options = RenderOptions::default().with_number_format(NumberFormat::Hex);
    assert_eq!(render(&trigger, &options), "word(0x000010) > 0x1F4");
}
