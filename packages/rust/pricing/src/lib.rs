//! Price tier engine: band multipliers plus psychological-ending rounding.
//!
//! An input price is multiplied by the tier it falls in, then rounded to the
//! nearest price carrying the configured ending pattern (ones digit plus
//! cents, e.g. `9.90` produces prices like `49.90` or `399.90`).

use contentforge_shared::PriceRule;

/// How the rounded price relates to the multiplied candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundingMode {
    /// Pick the nearest matching ending, above or below the candidate.
    #[default]
    Smart,
    /// Never round below the candidate.
    AlwaysUp,
}

/// Apply the tier multiplier and smart-round to the ending pattern.
pub fn adjust(input: f64, rules: &[PriceRule], ending: f64) -> f64 {
    adjust_with(input, rules, ending, RoundingMode::Smart)
}

/// Apply the tier multiplier and round with an explicit mode.
pub fn adjust_with(input: f64, rules: &[PriceRule], ending: f64, mode: RoundingMode) -> f64 {
    let multiplier = find_multiplier(input, rules);
    let candidate = input * multiplier;
    let adjusted = match mode {
        RoundingMode::Smart => smart_round(candidate, ending),
        RoundingMode::AlwaysUp => round_up(candidate, ending),
    };
    tracing::trace!(input, multiplier, candidate, adjusted, "price adjusted");
    adjusted
}

/// Find the multiplier for a price.
///
/// Bands are scanned in ascending `min_price` order and the first band
/// containing the price (half-open, `min <= p < max`) wins. A price above
/// every band falls back to the highest band's multiplier; an empty table
/// leaves the price unscaled.
pub fn find_multiplier(price: f64, rules: &[PriceRule]) -> f64 {
    if rules.is_empty() {
        return 1.0;
    }

    let mut sorted: Vec<&PriceRule> = rules.iter().collect();
    sorted.sort_by(|a, b| a.min_price.total_cmp(&b.min_price));

    for rule in &sorted {
        if rule.contains(price) {
            return rule.multiplier;
        }
    }
    sorted[sorted.len() - 1].multiplier
}

/// Round `candidate` to the nearest price ending in the pattern.
///
/// The pattern contributes a ones digit and a cents fraction. The matching
/// price in the candidate's tens bracket and the one in the bracket above
/// are compared and the closer wins, the lower winning ties. For candidates at 100 and above with
/// a `9` ones digit, the `x99` form is preferred when it lies within 15
/// units (`409.90` becomes `399.90`, `495.00` becomes `499.90`).
pub fn smart_round(candidate: f64, ending: f64) -> f64 {
    let ones = ending.floor().rem_euclid(10.0);
    let cents = ending - ending.floor();

    if candidate >= 100.0 && ones == 9.0 {
        let hundreds = (candidate / 100.0).floor() * 100.0;
        let below = hundreds - 1.0 + cents;
        let above = hundreds + 99.0 + cents;
        let mut forms = [below, above];
        forms.sort_by(|a, b| {
            (candidate - a).abs().total_cmp(&(candidate - b).abs())
        });
        for form in forms {
            if form > 0.0 && (candidate - form).abs() <= 15.0 {
                return round2(form);
            }
        }
    }

    let tens = (candidate / 10.0).floor() * 10.0;
    let down = tens + ones + cents;
    let up = tens + 10.0 + ones + cents;

    if down > 0.0 && (candidate - down).abs() <= (up - candidate).abs() {
        round2(down)
    } else {
        round2(up)
    }
}

/// Round `candidate` to the smallest price ending in the pattern that is not
/// below the candidate.
fn round_up(candidate: f64, ending: f64) -> f64 {
    let ones = ending.floor().rem_euclid(10.0);
    let cents = ending - ending.floor();
    let tens = (candidate / 10.0).floor() * 10.0;
    let down = tens + ones + cents;

    if down >= candidate {
        round2(down)
    } else {
        round2(tens + 10.0 + ones + cents)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_rules() -> Vec<PriceRule> {
        vec![
            PriceRule::new(0.0, 20.0, 4.0),
            PriceRule::new(20.0, 60.0, 2.5),
            PriceRule::new(60.0, 10_000.0, 2.0),
        ]
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{a} != {b}");
    }

    #[test]
    fn low_band_multiplies_and_rounds() {
        // 10 * 4 = 40, nearest x9.90 is 49.90
        assert_close(adjust(10.0, &default_rules(), 9.90), 49.90);
    }

    #[test]
    fn mid_band_multiplies_and_rounds() {
        // 31.76 * 2.5 = 79.40 -> 79.90
        assert_close(adjust(31.76, &default_rules(), 9.90), 79.90);
    }

    #[test]
    fn hundreds_prefer_x99_below() {
        // 204.95 * 2 = 409.90, within 15 of 399.90
        assert_close(smart_round(409.90, 9.90), 399.90);
    }

    #[test]
    fn hundreds_prefer_x99_above() {
        // 495 is within 15 of 499.90
        assert_close(smart_round(495.0, 9.90), 499.90);
    }

    #[test]
    fn hundreds_outside_tolerance_use_tens_bracket() {
        // 450 is ~50 away from both x99 forms; falls back to the tens bracket
        assert_close(smart_round(450.0, 9.90), 459.90);
    }

    #[test]
    fn adjusted_prices_carry_the_ending() {
        let rules = default_rules();
        for input in [3.0, 7.5, 12.0, 25.0, 44.44, 61.0, 150.0, 999.99] {
            let price = adjust(input, &rules, 9.90);
            let cents = (price * 100.0).round() as i64 % 100;
            assert_eq!(cents, 90, "price {price} for input {input}");
            let ones = ((price.floor()) as i64).rem_euclid(10);
            assert_eq!(ones, 9, "price {price} for input {input}");
            assert!(price > 0.0);
        }
    }

    #[test]
    fn price_above_all_bands_uses_highest_band() {
        assert_close(find_multiplier(20_000.0, &default_rules()), 2.0);
    }

    #[test]
    fn band_bounds_are_half_open() {
        let rules = default_rules();
        assert_close(find_multiplier(20.0, &rules), 2.5);
        assert_close(find_multiplier(19.999, &rules), 4.0);
        assert_close(find_multiplier(60.0, &rules), 2.0);
    }

    #[test]
    fn empty_table_leaves_price_unscaled() {
        assert_close(find_multiplier(42.0, &[]), 1.0);
        // Still rounds to the ending inside the tens bracket
        assert_close(adjust(42.0, &[], 9.90), 49.90);
    }

    #[test]
    fn unsorted_table_is_scanned_ascending() {
        let rules = vec![
            PriceRule::new(60.0, 10_000.0, 2.0),
            PriceRule::new(0.0, 20.0, 4.0),
            PriceRule::new(20.0, 60.0, 2.5),
        ];
        assert_close(find_multiplier(10.0, &rules), 4.0);
        assert_close(find_multiplier(30.0, &rules), 2.5);
    }

    #[test]
    fn always_up_never_rounds_down() {
        assert_close(round_up(40.0, 9.90), 49.90);
        assert_close(round_up(49.90, 9.90), 49.90);
        assert_close(round_up(49.91, 9.90), 59.90);
        assert_close(
            adjust_with(10.0, &default_rules(), 9.90, RoundingMode::AlwaysUp),
            49.90,
        );
    }

    #[test]
    fn tiny_candidates_stay_positive() {
        // tens bracket is 0; the down form 9.90 still applies
        assert_close(smart_round(2.0, 9.90), 9.90);
        assert_close(smart_round(0.5, 9.90), 9.90);
    }
}
