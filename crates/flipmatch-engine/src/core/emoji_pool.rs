/// Default symbol pool for card faces.
///
/// Every symbol is distinct. The largest standard level needs 39 pairs.
pub const EMOJI_POOL: &[&str] = &[
    // Animals
    "🐶", "🐱", "🐭", "🐹", "🐰", "🦊", "🐻", "🐼", "🐨", "🐯",
    "🦁", "🐮", "🐷", "🐸", "🐵", "🐔", "🐧", "🐦", "🐤", "🦆",
    "🦅", "🦉", "🦇", "🐺", "🐴", "🦄", "🐝", "🐛", "🦋", "🐌",
    "🐞", "🐜", "🦂", "🐢", "🐍", "🦎", "🐙", "🦑", "🦐", "🦞",
    "🦀", "🐡", "🐠", "🐟", "🐬", "🐳", "🐋", "🦈", "🐊", "🦓",
    "🦍", "🐘", "🦛", "🦏", "🐪", "🦒",
    // Food
    "🍏", "🍎", "🍐", "🍊", "🍋", "🍌", "🍉", "🍇", "🍓", "🍈",
    "🍒", "🍑", "🥭", "🍍", "🥥", "🥝", "🍅", "🥑", "🍆", "🥔",
    "🥕", "🌽", "🥒", "🥬", "🥦", "🧄", "🧅", "🍄", "🥜", "🌰",
    "🍞", "🥐", "🥖", "🥨", "🥯", "🥞", "🧇", "🧀", "🍖", "🍗",
    "🥩", "🥓", "🍔", "🍟", "🍕", "🌭", "🥪", "🌮", "🌯", "🥙",
    "🥚", "🍳", "🥘", "🍲", "🥗", "🍿", "🍱", "🍙", "🍚", "🍛",
    "🍜", "🍝", "🍣", "🍤", "🍩", "🍪", "🍦", "🍰",
    // Objects
    "🏆", "🎲", "🎯", "🎮", "🎸", "📚", "📌", "📎", "🔑", "🧭",
    "🔥", "💡", "🌈", "⚡", "🪐", "🚀", "🚗", "💰", "🎨", "🎤",
    "🎧", "🎳", "🚲", "⛵", "🚂", "🌙",
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_pool_symbols_are_distinct() {
        let unique = EMOJI_POOL.iter().collect::<HashSet<_>>();
        assert_eq!(unique.len(), EMOJI_POOL.len());
    }

    #[test]
    fn test_pool_covers_largest_level() {
        assert!(EMOJI_POOL.len() * 2 >= 78);
    }
}
