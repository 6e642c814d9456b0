//! Transcript → actuator command classification.
//!
//! A classifier is an ordered list of [`Rule`]s evaluated first-match-wins.
//! The order of the built-in rule sets is part of their behavior: the bare
//! fallbacks overlap with the qualifiers of the compound rules above them, so
//! moving a rule changes which command a transcript produces.

use crate::domain::model::{Command, Transcript, Variant};

pub const ACK_OPEN_FULLY: &str = "Đã nhận được lệnh mở toàn bộ cửa";
pub const ACK_OPEN_HALF: &str = "Đã nhận được lệnh mở một nửa cửa";
pub const ACK_CLOSE_FULLY: &str = "Đã nhận được lệnh đóng cửa";
pub const ACK_OPEN: &str = "Đã nhận được lệnh mở rèm";
pub const ACK_CLOSE: &str = "Đã nhận được lệnh đóng rèm";

/// One language's way of saying a rule: any keyword, plus any qualifier when
/// the qualifier list is non-empty.
#[derive(Debug, Clone, Copy)]
pub struct Clause {
    pub keywords: &'static [&'static str],
    pub qualifiers: &'static [&'static str],
}

impl Clause {
    pub const fn any_of(keywords: &'static [&'static str]) -> Self {
        Self {
            keywords,
            qualifiers: &[],
        }
    }

    pub const fn with(
        keywords: &'static [&'static str],
        qualifiers: &'static [&'static str],
    ) -> Self {
        Self {
            keywords,
            qualifiers,
        }
    }

    /// `text` must already be case-folded.
    pub fn matches(&self, text: &str) -> bool {
        let contains_any = |words: &[&str]| words.iter().any(|w| text.contains(w));
        contains_any(self.keywords) && (self.qualifiers.is_empty() || contains_any(self.qualifiers))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub clauses: &'static [Clause],
    pub command: Command,
    pub ack: &'static str,
}

impl Rule {
    pub fn matches(&self, text: &str) -> bool {
        self.clauses.iter().any(|clause| clause.matches(text))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub command: Command,
    pub ack: &'static str,
    /// Name of the rule that fired.
    pub rule: &'static str,
}

const OPEN_VI: &[&str] = &["mở"];
const OPEN_EN: &[&str] = &["open"];

// "haft" and "tí" / "tý" are spelled the way the recognizer actually emits them.
pub const THREE_LEVEL_RULES: &[Rule] = &[
    Rule {
        name: "open-fully",
        clauses: &[
            Clause::with(OPEN_VI, &["toàn", "bộ", "cả", "hết"]),
            Clause::with(OPEN_EN, &["all"]),
        ],
        command: Command::OpenFully,
        ack: ACK_OPEN_FULLY,
    },
    Rule {
        name: "open-half",
        clauses: &[
            Clause::with(OPEN_VI, &["một", "hé", "tí", "nửa"]),
            Clause::with(OPEN_EN, &["haft"]),
        ],
        command: Command::OpenHalf,
        ack: ACK_OPEN_HALF,
    },
    Rule {
        name: "open",
        clauses: &[Clause::any_of(&["open", "mở", "toàn", "bộ", "cả", "hết"])],
        command: Command::OpenFully,
        ack: ACK_OPEN_FULLY,
    },
    Rule {
        name: "half",
        clauses: &[Clause::any_of(&["một", "one", "hé", "tý", "nửa", "half"])],
        command: Command::OpenHalf,
        ack: ACK_OPEN_HALF,
    },
    Rule {
        name: "close",
        clauses: &[Clause::any_of(&["close", "đóng"])],
        command: Command::CloseFully,
        ack: ACK_CLOSE_FULLY,
    },
];

pub const BINARY_RULES: &[Rule] = &[
    Rule {
        name: "open",
        clauses: &[Clause::any_of(&["open", "mở"])],
        command: Command::Open,
        ack: ACK_OPEN,
    },
    Rule {
        name: "close",
        clauses: &[Clause::any_of(&["close", "đóng"])],
        command: Command::Close,
        ack: ACK_CLOSE,
    },
];

#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<Rule>,
}

impl Classifier {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn three_level() -> Self {
        Self::new(THREE_LEVEL_RULES.to_vec())
    }

    pub fn binary() -> Self {
        Self::new(BINARY_RULES.to_vec())
    }

    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::ThreeLevel => Self::three_level(),
            Variant::Binary => Self::binary(),
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn classify(&self, transcript: &Transcript) -> Option<Classification> {
        let text = transcript.normalized();
        let rule = self.rules.iter().find(|rule| rule.matches(&text))?;

        tracing::debug!(rule = rule.name, command = %rule.command, "transcript classified");
        Some(Classification {
            command: rule.command,
            ack: rule.ack,
            rule: rule.name,
        })
    }

    /// Names of every rule the transcript satisfies, in evaluation order.
    /// Only the first one ever fires.
    pub fn explain(&self, transcript: &Transcript) -> Vec<&'static str> {
        let text = transcript.normalized();
        self.rules
            .iter()
            .filter(|rule| rule.matches(&text))
            .map(|rule| rule.name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> Option<Command> {
        Classifier::three_level()
            .classify(&Transcript::from(text))
            .map(|c| c.command)
    }

    #[test]
    fn test_compound_rules() {
        assert_eq!(classify("mở toàn bộ cửa"), Some(Command::OpenFully));
        assert_eq!(classify("Open all the curtains"), Some(Command::OpenFully));
        assert_eq!(classify("mở hé cửa ra"), Some(Command::OpenHalf));
        assert_eq!(classify("open haft"), Some(Command::OpenHalf));
    }

    #[test]
    fn test_clauses_are_paired_by_language() {
        // the English open clause only accepts "haft" as a half qualifier
        let classifier = Classifier::three_level();
        let result = classifier.classify(&Transcript::from("open một")).unwrap();
        assert_eq!(result.rule, "open");
        assert_eq!(result.command, Command::OpenFully);
    }

    #[test]
    fn test_tí_and_tý_are_distinct_keywords() {
        let classifier = Classifier::three_level();
        assert_eq!(
            classifier.classify(&Transcript::from("mở tí")).unwrap().rule,
            "open-half"
        );
        // "tí" alone is not in the bare half rule
        assert_eq!(classifier.classify(&Transcript::from("tí")), None);
        assert_eq!(
            classifier.classify(&Transcript::from("tý")).unwrap().rule,
            "half"
        );
    }

    #[test]
    fn test_ack_messages() {
        let classifier = Classifier::three_level();
        let close = classifier.classify(&Transcript::from("ĐÓNG")).unwrap();
        assert_eq!(close.command, Command::CloseFully);
        assert_eq!(close.ack, ACK_CLOSE_FULLY);

        let half = classifier.classify(&Transcript::from("half")).unwrap();
        assert_eq!(half.ack, ACK_OPEN_HALF);
    }

    #[test]
    fn test_explain_lists_every_matching_rule() {
        let classifier = Classifier::three_level();
        let matched = classifier.explain(&Transcript::from("mở hết rồi đóng"));
        assert_eq!(matched, vec!["open-fully", "open", "close"]);
    }

    #[test]
    fn test_binary_rules() {
        let classifier = Classifier::binary();
        let open = classifier.classify(&Transcript::from("Mở rèm")).unwrap();
        assert_eq!(open.command, Command::Open);
        assert_eq!(open.ack, ACK_OPEN);

        let close = classifier.classify(&Transcript::from("close it")).unwrap();
        assert_eq!(close.command, Command::Close);

        // the binary set has no half rule
        assert_eq!(classifier.classify(&Transcript::from("half")), None);
    }
}
