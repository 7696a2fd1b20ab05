use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::config::HumanizeConfig;
use crate::profile::PersonalProfile;

/// Extra delay added before an uppercase character for reaching Shift.
const SHIFT_OVERHEAD_MS: f64 = 55.0;

/// Digraph multipliers: typing two keys with the same finger is slow,
/// alternating hands is fast.
const SAME_FINGER_MULTIPLIER: f64 = 1.3;
const DIFFERENT_HAND_MULTIPLIER: f64 = 0.85;

/// Burst words are typed noticeably faster than the base rate.
const BURST_MULTIPLIER: f64 = 0.7;

/// Short common words a practiced typist rattles off from muscle memory.
const DEFAULT_BURST_WORDS: &[&str] = &[
    "the", "and", "for", "you", "that", "with", "this", "are", "was", "have", "not", "but", "all",
    "can", "her", "his", "one", "our", "out", "they", "what", "when", "your",
];

/// Per-character delays are clamped into this window.
const MIN_DELAY_MS: f64 = 15.0;
const MAX_DELAY_MS: f64 = 1500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finger {
    Pinky,
    Ring,
    Middle,
    Index,
}

/// Hand and finger owning a key on a standard QWERTY touch-typing layout.
/// Defined for every lowercase letter.
pub fn qwerty_hand_finger(c: char) -> Option<(Hand, Finger)> {
    let assignment = match c.to_ascii_lowercase() {
        'q' | 'a' | 'z' => (Hand::Left, Finger::Pinky),
        'w' | 's' | 'x' => (Hand::Left, Finger::Ring),
        'e' | 'd' | 'c' => (Hand::Left, Finger::Middle),
        'r' | 'f' | 'v' | 't' | 'g' | 'b' => (Hand::Left, Finger::Index),
        'y' | 'h' | 'n' | 'u' | 'j' | 'm' => (Hand::Right, Finger::Index),
        'i' | 'k' => (Hand::Right, Finger::Middle),
        'o' | 'l' => (Hand::Right, Finger::Ring),
        'p' => (Hand::Right, Finger::Pinky),
        _ => return None,
    };
    Some(assignment)
}

/// Physical neighbors of a key on a QWERTY board. Defined for every
/// lowercase letter and digit.
pub fn qwerty_neighbors(c: char) -> Option<&'static [char]> {
    let neighbors: &[char] = match c.to_ascii_lowercase() {
        'a' => &['q', 'w', 's', 'z', 'x'],
        'b' => &['v', 'g', 'h', 'n'],
        'c' => &['x', 'd', 'f', 'v'],
        'd' => &['s', 'e', 'r', 'f', 'c', 'x'],
        'e' => &['w', 's', 'd', 'r'],
        'f' => &['d', 'r', 't', 'g', 'v', 'c'],
        'g' => &['f', 't', 'y', 'h', 'b', 'v'],
        'h' => &['g', 'y', 'u', 'j', 'n', 'b'],
        'i' => &['u', 'j', 'k', 'o'],
        'j' => &['h', 'u', 'i', 'k', 'm', 'n'],
        'k' => &['j', 'i', 'o', 'l', ',', 'm'],
        'l' => &['k', 'o', 'p', ';', '.'],
        'm' => &['n', 'j', 'k', ','],
        'n' => &['b', 'h', 'j', 'm'],
        'o' => &['i', 'k', 'l', 'p'],
        'p' => &['o', 'l', '['],
        'q' => &['w', 'a'],
        'r' => &['e', 'd', 'f', 't'],
        's' => &['a', 'w', 'e', 'd', 'x', 'z'],
        't' => &['r', 'f', 'g', 'y'],
        'u' => &['y', 'h', 'j', 'i'],
        'v' => &['c', 'f', 'g', 'b'],
        'w' => &['q', 'a', 's', 'e'],
        'x' => &['z', 's', 'd', 'c'],
        'y' => &['t', 'g', 'h', 'u'],
        'z' => &['a', 's', 'x'],
        '1' => &['2', 'q'],
        '2' => &['1', '3', 'q', 'w'],
        '3' => &['2', '4', 'w', 'e'],
        '4' => &['3', '5', 'e', 'r'],
        '5' => &['4', '6', 'r', 't'],
        '6' => &['5', '7', 't', 'y'],
        '7' => &['6', '8', 'y', 'u'],
        '8' => &['7', '9', 'u', 'i'],
        '9' => &['8', '0', 'i', 'o'],
        '0' => &['9', 'o', 'p'],
        _ => return None,
    };
    Some(neighbors)
}

/// Uniformly chosen physical neighbor of `c`, preserving case.
pub fn qwerty_adjacent_char(c: char, rng: &mut impl Rng) -> Option<char> {
    let neighbors = qwerty_neighbors(c)?;
    let chosen = neighbors[rng.gen_range(0..neighbors.len())];
    Some(if c.is_ascii_uppercase() {
        chosen.to_ascii_uppercase()
    } else {
        chosen
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DigraphKind {
    SameFinger,
    DifferentHand,
    Neutral,
}

fn digraph_kind(prev: char, current: char) -> DigraphKind {
    let (Some((prev_hand, prev_finger)), Some((hand, finger))) =
        (qwerty_hand_finger(prev), qwerty_hand_finger(current))
    else {
        return DigraphKind::Neutral;
    };

    if prev_hand != hand {
        DigraphKind::DifferentHand
    } else if prev_finger == finger {
        DigraphKind::SameFinger
    } else {
        DigraphKind::Neutral
    }
}

/// Timing and possible substitution for one keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyTiming {
    /// Delay before the key goes down.
    pub delay_ms: u64,
    /// What actually gets typed. Differs from the intent on a typo.
    pub typed: char,
    pub is_typo: bool,
}

/// Computes per-character typing delays and occasional typo substitutions.
/// Pure given an RNG; safe to share across threads.
#[derive(Debug, Clone)]
pub struct KeystrokeTimer {
    wpm: f64,
    variance: f64,
    typo_rate: f64,
    burst_words: Vec<String>,
}

impl KeystrokeTimer {
    pub fn from_config(config: &HumanizeConfig) -> Self {
        Self {
            wpm: config.base_wpm,
            variance: config.wpm_variance,
            typo_rate: config.typo_rate,
            burst_words: DEFAULT_BURST_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// Calibrate from a learned profile, keeping configured bounds.
    pub fn from_profile(profile: &PersonalProfile, config: &HumanizeConfig) -> Self {
        let mut timer = Self::from_config(config);
        if profile.wpm_mean > 0.0 {
            timer.wpm = profile.wpm_mean;
        }
        if profile.wpm_mean > 0.0 && profile.wpm_stddev > 0.0 {
            timer.variance = (profile.wpm_stddev / profile.wpm_mean).min(1.0);
        }
        if profile.typo_rate > 0.0 {
            timer.typo_rate = profile.typo_rate.min(0.25);
        }
        timer
    }

    pub fn wpm(&self) -> f64 {
        self.wpm
    }

    pub fn is_burst_word(&self, word: &str) -> bool {
        let lower = word.to_ascii_lowercase();
        self.burst_words.iter().any(|w| *w == lower)
    }

    /// Delay and (possibly substituted) character for typing `intended`
    /// after `prev`. `in_burst_word` marks membership in the burst list.
    pub fn plan_key(
        &self,
        intended: char,
        prev: Option<char>,
        in_burst_word: bool,
        rng: &mut impl Rng,
    ) -> KeyTiming {
        // 5 characters per word.
        let mut mean = 60_000.0 / (self.wpm * 5.0);

        if in_burst_word {
            mean *= BURST_MULTIPLIER;
        }

        if let Some(prev) = prev {
            match digraph_kind(prev, intended) {
                DigraphKind::SameFinger => mean *= SAME_FINGER_MULTIPLIER,
                DigraphKind::DifferentHand => mean *= DIFFERENT_HAND_MULTIPLIER,
                DigraphKind::Neutral => {}
            }
        }

        let stddev = (mean * self.variance).max(1.0);
        let dist = Normal::new(mean, stddev).expect("finite mean and positive stddev");
        let mut delay = dist.sample(rng);

        if intended.is_ascii_uppercase() {
            delay += SHIFT_OVERHEAD_MS;
        }

        let delay_ms = delay.clamp(MIN_DELAY_MS, MAX_DELAY_MS).round() as u64;

        let (typed, is_typo) = if rng.gen_bool(self.typo_rate) {
            match qwerty_adjacent_char(intended, rng) {
                Some(sub) => (sub, true),
                None => (intended, false),
            }
        } else {
            (intended, false)
        };

        KeyTiming {
            delay_ms,
            typed,
            is_typo,
        }
    }
}
