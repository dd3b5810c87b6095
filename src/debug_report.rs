use aimlet::{MATCHES_ANYTHING, MatchDetails, TopicSearch, WildcardSet};

/// Terminal styling for the trace. Disabled palettes pass text through.
#[derive(Clone, Copy)]
enum Style {
    Heading,
    Hit,
    Warn,
    Topic,
    Muted,
}

impl Style {
    fn code(self) -> &'static str {
        match self {
            Style::Heading => "\x1b[1;36m",
            Style::Hit => "\x1b[1;32m",
            Style::Warn => "\x1b[33m",
            Style::Topic => "\x1b[34m",
            Style::Muted => "\x1b[2m",
        }
    }
}

struct Palette {
    enabled: bool,
}

impl Palette {
    fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn paint(&self, s: impl AsRef<str>, style: Style) -> String {
        if self.enabled { format!("{}{}\x1b[0m", style.code(), s.as_ref()) } else { s.as_ref().to_string() }
    }
}

pub fn print_loaded(path: &str, topics: usize, categories: usize, color: bool) {
    let palette = Palette::new(color);
    eprintln!(
        "{} {}  {} {}  {} {}",
        palette.paint("⚙  Loaded", Style::Heading),
        palette.paint(path, Style::Warn),
        palette.paint("topics:", Style::Muted),
        palette.paint(topics.to_string(), Style::Topic),
        palette.paint("categories:", Style::Muted),
        palette.paint(categories.to_string(), Style::Topic),
    );
}

pub fn print_match(input: &str, details: &MatchDetails, color: bool) {
    let palette = Palette::new(color);
    eprintln!("\n{}", palette.paint(format!("⚙  Matching: \"{}\"", input), Style::Heading));
    eprintln!("  {} {}", palette.paint("normalized:", Style::Muted), details.input);

    eprintln!("\n{}", palette.paint("━━━ Topics ━━━", Style::Muted));
    for search in &details.searches {
        eprintln!("  {}", fmt_search(search, &palette));
    }

    eprintln!("\n{}", palette.paint("━━━ Result ━━━", Style::Muted));
    match &details.topic {
        Some(topic) => {
            let wildcards = WildcardSet::of(&details.pattern);
            let kind = if wildcards.is_literal() { "literal".to_string() } else { format!("{:?}", wildcards) };
            eprintln!(
                "  {} {} {} {}",
                palette.paint(&details.pattern, Style::Hit),
                palette.paint("│ topic:", Style::Muted),
                palette.paint(topic, Style::Topic),
                palette.paint(format!("│ {kind}"), Style::Muted),
            );
        }
        None => {
            eprintln!("  {}", palette.paint(format!("No pattern matched, falling back to \"{}\"", MATCHES_ANYTHING), Style::Muted));
            eprintln!("\n{}", palette.paint("Possible reasons:", Style::Warn));
            eprintln!("  • Patterns are expected in uppercase");
            eprintln!("  • The rule lives in a topic that is not active");
            eprintln!("  • The pattern failed to translate (see warnings)");
        }
    }

    eprintln!("\n{}", palette.paint("━━━ Timing ━━━", Style::Muted));
    eprintln!("  Total: {}", palette.paint(format!("{:?}", details.total), Style::Hit));
    eprintln!();
}

fn fmt_search(search: &TopicSearch, palette: &Palette) -> String {
    let outcome = match &search.matched {
        Some(pattern) => palette.paint(format!("✓ {}", pattern), Style::Hit),
        None => palette.paint("✗ no match", Style::Muted),
    };
    let skipped = if search.skipped > 0 {
        palette.paint(format!(" ({} skipped)", search.skipped), Style::Warn)
    } else {
        String::new()
    };
    format!(
        "{} {} {}{}  {}",
        palette.paint(format!("{}:", search.topic), Style::Topic),
        outcome,
        palette.paint(format!("tried {}", search.tried), Style::Muted),
        skipped,
        palette.paint(format!("{:?}", search.elapsed), Style::Muted),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_palette_passes_text_through() {
        assert_eq!(Palette::new(false).paint("HELLO *", Style::Hit), "HELLO *");
    }

    #[test]
    fn enabled_palette_wraps_and_resets() {
        let painted = Palette::new(true).paint("FOOD:", Style::Topic);
        assert_eq!(painted, "\x1b[34mFOOD:\x1b[0m");
    }
}
