use rand::seq::SliceRandom;
use std::time::{Duration, Instant};

use crate::planet::Planet;
use crate::util::group_thousands;

/// How long a toast stays on screen before auto-dismissing.
pub const TOAST_DURATION: Duration = Duration::from_secs(8);

/// Everything a message template can mention about the just-committed
/// session.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub minutes: u64,
    pub km_traveled: f64,
    pub mood: String,
    pub percent: f64,
    pub planet: Planet,
}

/// Uniform random pick over the fixed template pool. Not security-sensitive.
pub fn pick_message(summary: &SessionSummary) -> String {
    let name = summary.planet.info().name;
    let km = group_thousands(summary.km_traveled.round() as u64);
    let mood_aside = if summary.mood.is_empty() {
        String::new()
    } else {
        format!(" Feeling {}? That's part of the journey.", summary.mood)
    };

    let messages = [
        format!(
            "Beautiful work, space traveler! {} km closer to {} — {:.1}% of the voyage behind you. ✨",
            km, name, summary.percent
        ),
        format!(
            "Another {} focused minutes on the books. You're {:.1}% of the way to {}. Keep going! 🚀",
            summary.minutes, summary.percent, name
        ),
        format!(
            "What a stellar session! {} km covered through the knowledge cosmos.{} 🌟",
            km, mood_aside
        ),
        format!(
            "Your dedication lights up the universe — {:.1}% of the journey to {} complete. 🌠",
            summary.percent, name
        ),
        format!(
            "{} more minutes logged! The path to {} gets brighter with every session. ✨",
            summary.minutes, name
        ),
    ];

    messages
        .choose(&mut rand::thread_rng())
        .cloned()
        .unwrap_or_default()
}

/// A congratulatory message with a single dismissal deadline. Showing a new
/// toast replaces the old value wholesale, so a stale deadline can never
/// retire a newer message.
#[derive(Debug, Clone)]
pub struct Toast {
    pub text: String,
    deadline: Instant,
}

impl Toast {
    pub fn new(text: String) -> Self {
        Self::with_duration(text, TOAST_DURATION)
    }

    pub fn with_duration(text: String, duration: Duration) -> Self {
        Self {
            text,
            deadline: Instant::now() + duration,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(mood: &str) -> SessionSummary {
        SessionSummary {
            minutes: 30,
            km_traveled: 300.0,
            mood: mood.to_string(),
            percent: 0.078,
            planet: Planet::Moon,
        }
    }

    #[test]
    fn messages_mention_the_session() {
        // Every template names at least one of the parameters, so any pick
        // must contain the minutes, the km figure, the percent, or the
        // destination name.
        for _ in 0..20 {
            let msg = pick_message(&summary("focused"));
            assert!(
                msg.contains("30") || msg.contains("300") || msg.contains("0.1") || msg.contains("Moon"),
                "template dropped its parameters: {}",
                msg
            );
        }
    }

    #[test]
    fn mood_aside_only_when_present() {
        // The mood template includes the aside only for a non-empty mood.
        for _ in 0..50 {
            let msg = pick_message(&summary(""));
            assert!(!msg.contains("Feeling"), "empty mood leaked: {}", msg);
        }
        let mut seen_mood = false;
        for _ in 0..200 {
            if pick_message(&summary("calm")).contains("Feeling calm?") {
                seen_mood = true;
                break;
            }
        }
        assert!(seen_mood, "mood template never selected in 200 draws");
    }

    #[test]
    fn km_figures_are_grouped() {
        let s = SessionSummary {
            minutes: 10,
            km_traveled: 35_000.0,
            mood: String::new(),
            percent: 0.0,
            planet: Planet::Saturn,
        };
        let mut seen_km = false;
        for _ in 0..200 {
            if pick_message(&s).contains("35,000") {
                seen_km = true;
                break;
            }
        }
        assert!(seen_km, "km template never selected in 200 draws");
    }

    #[test]
    fn fresh_toast_is_not_expired() {
        let toast = Toast::new("well done".into());
        assert!(!toast.is_expired());
        assert_eq!(toast.text, "well done");
    }

    #[test]
    fn zero_duration_toast_expires_immediately() {
        let toast = Toast::with_duration("gone".into(), Duration::ZERO);
        assert!(toast.is_expired());
    }

    #[test]
    fn newer_toast_supersedes_older() {
        // Replacement is by value: the old toast (and its deadline) is
        // dropped wholesale.
        let mut slot = Some(Toast::with_duration("old".into(), Duration::ZERO));
        slot = Some(Toast::new("new".into()));
        let toast = slot.unwrap();
        assert_eq!(toast.text, "new");
        assert!(!toast.is_expired());
    }
}
