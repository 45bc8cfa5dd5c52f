use std::collections::HashMap;

pub fn builtin_scenarios() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        (
            "alley_brawl",
            include_str!("../content/scenarios/alley_brawl.json"),
        ),
        (
            "cult_ambush",
            include_str!("../content/scenarios/cult_ambush.json"),
        ),
        (
            "lone_swing",
            include_str!("../content/scenarios/lone_swing.json"),
        ),
    ])
}
