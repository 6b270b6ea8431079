use crate::model::Sentiment;

/// Keyword polarity tagger.
///
/// A class matches when any of its keywords occurs anywhere in the
/// case-folded text; word boundaries are not required. The positive class is
/// checked first, so text that hits both classes is positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentimentClassifier {
    positive: Vec<String>,
    negative: Vec<String>,
}

impl SentimentClassifier {
    pub fn new<S: AsRef<str>>(positive: &[S], negative: &[S]) -> Self {
        Self {
            positive: keyword_class(positive),
            negative: keyword_class(negative),
        }
    }

    pub fn positive(&self) -> &[String] {
        &self.positive
    }

    pub fn negative(&self) -> &[String] {
        &self.negative
    }

    /// Classify `message` and `location` together.
    pub fn classify_response(&self, message: &str, location: &str) -> Sentiment {
        self.classify(&format!("{} {}", message, location))
    }

    pub fn classify(&self, text: &str) -> Sentiment {
        let folded = text.to_lowercase();

        if matches_class(&self.positive, &folded) {
            Sentiment::Positive
        } else if matches_class(&self.negative, &folded) {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

fn matches_class(class: &[String], text: &str) -> bool {
    class.iter().any(|keyword| text.contains(keyword.as_str()))
}

fn keyword_class<S: AsRef<str>>(keywords: &[S]) -> Vec<String> {
    keywords
        .iter()
        .map(|keyword| keyword.as_ref().trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> SentimentClassifier {
        SentimentClassifier::new(
            &["good", "great", "success", "done", "completed", "excellent"],
            &["issue", "problem", "bad", "pending", "stuck", "poor"],
        )
    }

    #[test]
    fn positive_wins_when_both_classes_match() {
        assert_eq!(
            classifier().classify("great success but stuck issue"),
            Sentiment::Positive
        );
    }

    #[test]
    fn negative_and_neutral() {
        let c = classifier();
        assert_eq!(c.classify("Printing still PENDING"), Sentiment::Negative);
        assert_eq!(c.classify("visited three schools"), Sentiment::Neutral);
        assert_eq!(c.classify(""), Sentiment::Neutral);
    }

    #[test]
    fn location_text_counts_too() {
        assert_eq!(
            classifier().classify_response("", "Bad Road Junction"),
            Sentiment::Negative
        );
    }

    #[test]
    fn keywords_match_inside_words() {
        assert_eq!(classifier().classify("undone"), Sentiment::Positive);
    }

    #[test]
    fn blank_keywords_never_match() {
        let c = SentimentClassifier::new(&["", "  "], &["poor"]);
        assert_eq!(c.classify("anything"), Sentiment::Neutral);
        assert_eq!(c.classify("Poor turnout"), Sentiment::Negative);
    }
}
