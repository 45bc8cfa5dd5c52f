use engine::checks::classify;
use engine::{CheckResult, Dice, SuccessLevel};

#[test]
fn classification_bands_for_skill_fifty() {
    let expect = [
        (1, SuccessLevel::Critical),
        (10, SuccessLevel::Extreme),
        (11, SuccessLevel::Hard),
        (25, SuccessLevel::Hard),
        (26, SuccessLevel::Regular),
        (50, SuccessLevel::Regular),
        (51, SuccessLevel::Failure),
        (99, SuccessLevel::Failure),
        (100, SuccessLevel::Fumble),
    ];
    for (value, level) in expect {
        assert_eq!(classify(value, 50), level, "roll {value}");
    }
    assert_eq!(classify(96, 49), SuccessLevel::Fumble);
    assert_eq!(classify(95, 49), SuccessLevel::Failure);
}

#[test]
fn bonus_dice_pull_rolls_down() {
    let mut dice = Dice::from_seed(2024);
    let bonus: u32 = (0..500).map(|_| dice.d100(2)).sum();
    let penalty: u32 = (0..500).map(|_| dice.d100(-2)).sum();
    assert!(bonus < penalty, "bonus {bonus} vs penalty {penalty}");
}

#[test]
fn seeded_check_is_reproducible() {
    let a = CheckResult::roll(&mut Dice::from_seed(5), 55, 1);
    let b = CheckResult::roll(&mut Dice::from_seed(5), 55, 1);
    assert_eq!(a, b);
    let value = a.value.unwrap();
    assert_eq!(a.level, classify(value, 55));
    assert_eq!(a.dice_modifier, 1);
}

#[test]
fn out_of_range_rolls_are_clamped() {
    let mut high = |_: i32| 250u32;
    let check = CheckResult::roll(&mut high, 40, 0);
    assert_eq!(check.value, Some(100));
    assert!(check.is_fumble());

    let mut low = |_: i32| 0u32;
    let check = CheckResult::roll(&mut low, 40, 0);
    assert_eq!(check.value, Some(1));
    assert!(check.is_critical());
}
