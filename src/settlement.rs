// src/settlement.rs

use crate::hand::Seat;
use crate::rule::ScoringRule;

/// `base × 2^(fan + fly − 1)`, exponent floored at zero, saturating, then capped.
pub fn calculate_score(fan: u32, rule: &ScoringRule) -> u32 {
    let exponent = fan.saturating_add(rule.fly_count).saturating_sub(1);
    let multiplier = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);
    let score = rule.base_score.saturating_mul(multiplier);
    match rule.score_cap {
        Some(cap) => score.min(cap),
        None => score,
    }
}

/// Per-seat deltas (index `seat - 1`): every other seat pays `score` to the winner.
///
/// The payment is clamped so the winner's total still fits in an `i32`; the deltas
/// always sum to zero.
pub fn settle_self_draw(winner: Seat, player_count: u8, score: u32) -> Vec<i32> {
    let losers = i32::from(player_count.saturating_sub(1)).max(1);
    let pay = i32::try_from(score).unwrap_or(i32::MAX).min(i32::MAX / losers);
    (1..=player_count)
        .map(|seat| if seat == winner { pay * losers } else { -pay })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(base: u32, cap: Option<u32>, fly: u32) -> ScoringRule {
        ScoringRule { base_score: base, score_cap: cap, fly_count: fly }
    }

    #[test]
    fn doubling_per_fan() {
        assert_eq!(calculate_score(3, &rule(1, None, 0)), 4);
        assert_eq!(calculate_score(1, &rule(5, None, 0)), 5);
        assert_eq!(calculate_score(2, &rule(1, None, 2)), 8);
        assert_eq!(calculate_score(0, &rule(2, None, 0)), 2);
    }

    #[test]
    fn cap_and_saturation() {
        assert_eq!(calculate_score(3, &rule(1, Some(3), 0)), 3);
        assert_eq!(calculate_score(40, &rule(1, None, 0)), u32::MAX);
        assert_eq!(calculate_score(40, &rule(10, Some(500), 0)), 500);
    }

    #[test]
    fn winner_collects_from_everyone() {
        assert_eq!(settle_self_draw(2, 4, 4), vec![-4, 12, -4, -4]);
        assert_eq!(settle_self_draw(1, 2, 3), vec![3, -3]);
        assert_eq!(settle_self_draw(3, 3, 3).iter().sum::<i32>(), 0);
    }

    #[test]
    fn saturated_score_stays_zero_sum() {
        let score = calculate_score(4, &rule(1, None, 40));
        assert_eq!(score, u32::MAX);
        for n in 2..=4u8 {
            let deltas = settle_self_draw(1, n, score);
            assert_eq!(deltas.iter().map(|&d| i64::from(d)).sum::<i64>(), 0);
            assert!(deltas[1] < 0);
        }
        let deltas = settle_self_draw(1, 4, score);
        assert_eq!(deltas[0], -3 * deltas[1]);
    }
}
