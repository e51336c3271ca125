use crate::roster::CardKind;
use crate::stats::StatKey;

pub const PENALTY_REASONS: [&str; 8] = [
    "Offside",
    "Ruck Infringement",
    "High Tackle",
    "Holding Down",
    "Not Back 10m",
    "Obstruction",
    "Lying On",
    "Dissent",
];

pub const ERROR_REASONS: [&str; 6] = [
    "Knock On",
    "Forward Pass",
    "Dropped Ball",
    "Kick Out On Full",
    "Play The Ball",
    "Stripped",
];

pub const CARD_REASONS: [&str; 6] = [
    "High Tackle",
    "Professional Foul",
    "Repeated Infringements",
    "Dangerous Tackle",
    "Fighting",
    "Dissent",
];

pub const BIG_PLAY_DESCRIPTIONS: [&str; 6] = [
    "Try Saver",
    "Forced Dropout",
    "Line Break Assist",
    "Charge Down",
    "Intercept",
    "Goal Line Hold",
];

pub fn reasons_for_stat(key: StatKey) -> &'static [&'static str] {
    match key {
        StatKey::Penalties => &PENALTY_REASONS,
        StatKey::Errors => &ERROR_REASONS,
        _ => &[],
    }
}

pub fn reasons_for_card(_kind: CardKind) -> &'static [&'static str] {
    &CARD_REASONS
}

/// Preset by 1-based index, as picked with number keys.
pub fn pick(presets: &[&'static str], one_based: usize) -> Option<&'static str> {
    one_based.checked_sub(1).and_then(|i| presets.get(i)).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_is_one_based() {
        assert_eq!(pick(&ERROR_REASONS, 1), Some("Knock On"));
        assert_eq!(pick(&ERROR_REASONS, 0), None);
        assert_eq!(pick(&ERROR_REASONS, 99), None);
    }
}
