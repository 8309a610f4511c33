//! MarkdownV2 message rendering for each change event.

use crate::store::diff::Event;

/// Punctuation Telegram's MarkdownV2 parser treats as markup.
const RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Backslash-escape MarkdownV2 reserved characters.
///
/// Applied exactly once per user-derived field (name, price) before it
/// is embedded; escaping an already-escaped string double-escapes, and
/// the URL half of an inline link must stay unescaped.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if RESERVED.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Render the outgoing message for one event.
pub fn render(event: &Event) -> String {
    match event {
        Event::New(record) => format!(
            "🚨 *NEW DROP* 🚨\n\n\
             👕 *Product*: {}\n\
             💰 *Price*: {}\n\n\
             🔗 *Check it out*:\n[{}]({})",
            escape_markdown(&record.name),
            escape_markdown(&record.price),
            escape_markdown("Click here to view"),
            record.link,
        ),
        Event::PriceChanged { record, old_price } => format!(
            "💸 *PRICE CHANGE DETECTED* 💸\n\n\
             👕 *Product*: {}\n\
             📉 *Old Price*: {}\n\
             📈 *New Price*: {}\n\n\
             🔗 *Check it out*:\n[{}]({})",
            escape_markdown(&record.name),
            escape_markdown(old_price),
            escape_markdown(&record.price),
            escape_markdown("Click here to view"),
            record.link,
        ),
        Event::Removed(record) => format!(
            "❌ *PRODUCT REMOVED OR SOLD OUT* ❌\n\n\
             👕 *Product*: {}\n\n\
             This item is no longer listed on the page\\.",
            escape_markdown(&record.name),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::ProductRecord;

    fn record(name: &str, price: &str) -> ProductRecord {
        ProductRecord {
            link: "https://shop.example/products/tee".to_string(),
            name: name.to_string(),
            price: price.to_string(),
        }
    }

    #[test]
    fn every_reserved_char_gets_one_backslash() {
        for &ch in RESERVED {
            let escaped = escape_markdown(&format!("a{ch}b"));
            assert_eq!(escaped, format!("a\\{ch}b"), "char {ch:?}");
        }
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(escape_markdown("Graphic Tee 2"), "Graphic Tee 2");
    }

    #[test]
    fn escaping_twice_double_escapes() {
        // documents why render escapes each field exactly once
        let once = escape_markdown("R$ 9.90");
        let twice = escape_markdown(&once);
        assert_eq!(once, "R$ 9\\.90");
        assert_eq!(twice, "R$ 9\\\\.90");
    }

    #[test]
    fn new_message_escapes_fields_but_not_link() {
        let message = render(&Event::New(record("Tee (v2)", "R$ 9.90")));

        assert!(message.contains("Tee \\(v2\\)"));
        assert!(message.contains("R$ 9\\.90"));
        assert!(message.contains("(https://shop.example/products/tee)"));
    }

    #[test]
    fn price_change_message_carries_both_prices() {
        let message = render(&Event::PriceChanged {
            record: record("Tee", "R$ 79,90"),
            old_price: "R$ 99,90".to_string(),
        });

        assert!(message.contains("*Old Price*: R$ 99,90"));
        assert!(message.contains("*New Price*: R$ 79,90"));
    }

    #[test]
    fn removed_message_has_no_link() {
        let message = render(&Event::Removed(record("Tee", "R$ 79,90")));

        assert!(message.contains("REMOVED OR SOLD OUT"));
        assert!(!message.contains("https://shop.example"));
    }
}
