//! Parameter substitution of symbolic tokens in descriptive cells.

use std::collections::BTreeMap;

use tm_core::format_number;

use crate::inputs::TireInputs;

/// Symbolic token -> current user value.
///
/// Plain tokens are present only when the user entered a value, so a
/// blank input leaves its token visible in the matrix. Negation tokens are
/// always present and default to `"0"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterMap {
    values: BTreeMap<&'static str, String>,
}

fn negated(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format_number(-v.abs()),
        _ => "0".to_string(),
    }
}

impl ParameterMap {
    pub fn from_inputs(inputs: &TireInputs) -> Self {
        let plain = [
            ("P1", inputs.pressure1),
            ("P2", inputs.pressure1),
            ("L1", inputs.load1_kg),
            ("L2", inputs.load2_kg),
            ("L3", inputs.load3_kg),
            ("L4", inputs.load4_kg),
            ("L5", inputs.load5_kg),
            ("VEL", inputs.speed_kmph),
            ("IA", inputs.inclination_angle),
            ("SR", inputs.slip_ratio),
        ];

        let mut values = BTreeMap::new();
        for (token, value) in plain {
            if let Some(v) = value.filter(|v| v.is_finite()) {
                values.insert(token, format_number(v));
            }
        }
        values.insert("-IA", negated(inputs.inclination_angle));
        values.insert("-SR", negated(inputs.slip_ratio));

        Self { values }
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.values.get(token).map(String::as_str)
    }

    /// Clean a raw cell and substitute it when it is exactly a known token.
    pub fn substitute(&self, raw: &str) -> String {
        let cleaned = raw.trim().replace("\r\n", " ").replace('\n', " ");
        match self.get(&cleaned) {
            Some(value) => value.to_string(),
            None => cleaned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> TireInputs {
        TireInputs {
            pressure1: Some(35.0),
            load1_kg: Some(450.0),
            load2_kg: Some(520.5),
            speed_kmph: Some(80.0),
            inclination_angle: Some(2.5),
            ..Default::default()
        }
    }

    #[test]
    fn both_pressure_tokens_map_to_pressure1() {
        let map = ParameterMap::from_inputs(&inputs());
        assert_eq!(map.substitute("P1"), "35");
        assert_eq!(map.substitute(" P2 "), "35");
        assert_eq!(map.substitute("L2"), "520.5");
        assert_eq!(map.substitute("VEL"), "80");
    }

    #[test]
    fn negation_tokens() {
        let map = ParameterMap::from_inputs(&inputs());
        assert_eq!(map.substitute("-IA"), "-2.5");
        assert_eq!(map.substitute("-SR"), "0");
    }

    #[test]
    fn negation_of_negative_input_stays_negative() {
        let map = ParameterMap::from_inputs(&TireInputs {
            slip_ratio: Some(-4.0),
            ..Default::default()
        });
        assert_eq!(map.substitute("-SR"), "-4");
        assert_eq!(map.substitute("SR"), "-4");
    }

    #[test]
    fn blank_input_leaves_token_visible() {
        let map = ParameterMap::from_inputs(&inputs());
        assert_eq!(map.substitute("L3"), "L3");
    }

    #[test]
    fn literals_pass_through_cleaned() {
        let map = ParameterMap::from_inputs(&inputs());
        assert_eq!(map.substitute("  12.75 "), "12.75");
        assert_eq!(map.substitute("Flat\nRoad"), "Flat Road");
        assert_eq!(map.substitute("Line\r\nTwo"), "Line Two");
        assert_eq!(map.substitute("p1"), "p1");
        assert_eq!(map.substitute("P1 "), "35");
        assert_eq!(map.substitute("P1 x"), "P1 x");
    }

    proptest::proptest! {
        #[test]
        fn load_tokens_follow_their_input(
            loads in proptest::array::uniform5(proptest::option::of(1.0f64..5000.0))
        ) {
            let map = ParameterMap::from_inputs(&TireInputs {
                load1_kg: loads[0],
                load2_kg: loads[1],
                load3_kg: loads[2],
                load4_kg: loads[3],
                load5_kg: loads[4],
                ..Default::default()
            });
            for (i, load) in loads.iter().enumerate() {
                let token = format!("L{}", i + 1);
                let expected = load.map(format_number).unwrap_or_else(|| token.clone());
                proptest::prop_assert_eq!(map.substitute(&token), expected);
            }
        }
    }
}
