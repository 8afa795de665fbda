//! Message classification helpers.
//!
//! A direct mention is a message that opens by addressing an account, either
//! in the escaped `<@U024BE7LH>` form (optionally `<@U024BE7LH|name>`) or the
//! plain `@name` form, optionally followed by `:` or `,`. The mention must be
//! the very first thing in the text.

use chatmux_core::Event;

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Splits a leading mention off `text`.
///
/// Returns the addressed identity and the remainder of the text (untrimmed),
/// or `None` if the text does not open with a mention.
pub fn parse_direct_mention(text: &str) -> Option<(&str, &str)> {
    let (id, rest) = if let Some(inner) = text.strip_prefix("<@") {
        let close = inner.find('>')?;
        let id = inner[..close].split('|').next().unwrap_or_default();
        (id, &inner[close + 1..])
    } else if let Some(inner) = text.strip_prefix('@') {
        let end = inner.find(|c: char| !is_id_char(c)).unwrap_or(inner.len());
        (&inner[..end], &inner[end..])
    } else {
        return None;
    };

    if id.is_empty() || !id.chars().all(is_id_char) {
        return None;
    }

    let rest = rest.strip_prefix([':', ',']).unwrap_or(rest);
    Some((id, rest))
}

/// Removes a leading mention and the whitespace following it.
///
/// Text without a mention is returned unchanged.
pub fn strip_direct_mention(text: &str) -> &str {
    match parse_direct_mention(text) {
        Some((_, rest)) => rest.trim_start(),
        None => text,
    }
}

/// Returns `true` if the event arrived through a private one-to-one channel.
pub fn is_direct_message(event: &dyn Event) -> bool {
    event.channel_kind().is_private()
}

/// Returns `true` if the event opens by addressing `bot_id` in a shared channel.
pub fn is_direct_mention(event: &dyn Event, bot_id: &str) -> bool {
    if bot_id.is_empty() || event.channel_kind().is_private() {
        return false;
    }
    parse_direct_mention(event.text()).is_some_and(|(id, _)| id == bot_id)
}

/// Returns `true` if `bot_id` is mentioned anywhere in the event text.
pub fn is_mentioned(event: &dyn Event, bot_id: &str) -> bool {
    if bot_id.is_empty() {
        return false;
    }

    let text = event.text();
    if text.contains(&format!("<@{bot_id}>")) || text.contains(&format!("<@{bot_id}|")) {
        return true;
    }

    let needle = format!("@{bot_id}");
    text.match_indices(&needle).any(|(start, _)| {
        let before_ok = text[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !is_id_char(c) && c != '<');
        let after_ok = text[start + needle.len()..]
            .chars()
            .next()
            .is_none_or(|c| !is_id_char(c));
        before_ok && after_ok
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatmux_core::{ChannelKind, MessageEvent};

    #[test]
    fn test_parse_escaped_mention() {
        assert_eq!(
            parse_direct_mention("<@U024BE7LH>: hello"),
            Some(("U024BE7LH", " hello"))
        );
        assert_eq!(
            parse_direct_mention("<@U024BE7LH|bob> hi"),
            Some(("U024BE7LH", " hi"))
        );
        assert_eq!(parse_direct_mention("<@U024BE7LH"), None);
    }

    #[test]
    fn test_parse_plain_mention() {
        assert_eq!(parse_direct_mention("@bot hello"), Some(("bot", " hello")));
        assert_eq!(parse_direct_mention("@bot, hi"), Some(("bot", " hi")));
        assert_eq!(parse_direct_mention("  @bot hi"), None);
        assert_eq!(parse_direct_mention("@bot"), Some(("bot", "")));
        assert_eq!(parse_direct_mention("@ hello"), None);
        assert_eq!(parse_direct_mention("hello @bot"), None);
    }

    #[test]
    fn test_strip_direct_mention() {
        assert_eq!(strip_direct_mention("@bot hello"), "hello");
        assert_eq!(strip_direct_mention("<@U1>:   hello there "), "hello there ");
        assert_eq!(strip_direct_mention("@bot"), "");
    }

    #[test]
    fn test_strip_leaves_unaddressed_text_alone() {
        assert_eq!(strip_direct_mention(" hello "), " hello ");
        assert_eq!(strip_direct_mention("ping "), "ping ");
        assert_eq!(strip_direct_mention("  @bot hi"), "  @bot hi");
    }

    #[test]
    fn test_is_direct_message() {
        assert!(is_direct_message(&MessageEvent::new("D1", "U1", "hi")));
        assert!(!is_direct_message(&MessageEvent::new("C1", "U1", "hi")));
    }

    #[test]
    fn test_is_direct_mention() {
        let shared = MessageEvent::new("C1", "U1", "@bot anything");
        assert!(is_direct_mention(&shared, "bot"));
        assert!(!is_direct_mention(&shared, "other"));
        assert!(!is_direct_mention(&shared, ""));

        let private = shared.clone().with_kind(ChannelKind::Private);
        assert!(!is_direct_mention(&private, "bot"));

        let trailing = MessageEvent::new("C1", "U1", "hey @bot");
        assert!(!is_direct_mention(&trailing, "bot"));

        let indented = MessageEvent::new("C1", "U1", "  @bot hi");
        assert!(!is_direct_mention(&indented, "bot"));
    }

    #[test]
    fn test_is_mentioned() {
        assert!(is_mentioned(&MessageEvent::new("C1", "U1", "hey @bot, hi"), "bot"));
        assert!(is_mentioned(&MessageEvent::new("C1", "U1", "ping <@UB>"), "UB"));
        assert!(is_mentioned(&MessageEvent::new("C1", "U1", "<@UB|bob> yo"), "UB"));
        assert!(!is_mentioned(&MessageEvent::new("C1", "U1", "hey @bottle"), "bot"));
        assert!(!is_mentioned(&MessageEvent::new("C1", "U1", "mail a@bot"), "bot"));
        assert!(!is_mentioned(&MessageEvent::new("C1", "U1", "@bot"), ""));
    }
}
