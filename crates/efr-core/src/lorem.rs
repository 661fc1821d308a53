//! Placeholder text for drafting report layouts

use rand::seq::IndexedRandom;
use rand::Rng;

/// Sentences placeholder paragraphs are built from
pub const SENTENCES: [&str; 5] = [
    "Lorem ipsum dolor sit amet, consectetur adipiscing elit.",
    "Sed do eiusmod tempor incididunt ut labore et dolore magna aliqua.",
    "Ut enim ad minim veniam, quis nostrud exercitation ullamco laboris nisi ut aliquip ex ea commodo consequat.",
    "Duis aute irure dolor in reprehenderit in voluptate velit esse cillum dolore eu fugiat nulla pariatur.",
    "Excepteur sint occaecat cupidatat non proident, sunt in culpa qui officia deserunt mollit anim id est laborum.",
];

const SENTENCES_PER_PARAGRAPH: usize = 3;

/// `count` paragraphs of three random sentences, separated by blank lines
pub fn paragraphs(count: usize) -> String {
    paragraphs_with(&mut rand::rng(), count)
}

pub fn paragraphs_with<R: Rng + ?Sized>(rng: &mut R, count: usize) -> String {
    let mut text = String::new();
    for i in 0..count {
        if i > 0 {
            text.push_str("\n\n");
        }
        let mut sentences = Vec::with_capacity(SENTENCES_PER_PARAGRAPH);
        for _ in 0..SENTENCES_PER_PARAGRAPH {
            if let Some(sentence) = SENTENCES.choose(rng) {
                sentences.push(*sentence);
            }
        }
        text.push_str(&sentences.join(" "));
    }
    text
}
