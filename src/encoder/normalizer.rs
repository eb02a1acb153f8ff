/// Pre-tokenization text clean-up.
///
/// Splits run-together words such as `"OnePunchMan"` so the tokenizer sees
/// them as separate terms.
pub struct TextNormalizer;

impl TextNormalizer {
    /// Inserts a space wherever a lowercase letter is directly followed by an
    /// uppercase letter.
    ///
    /// # Examples
    ///
    /// ```
    /// use mangenre::encoder::TextNormalizer;
    ///
    /// assert_eq!(TextNormalizer::split_camel_case("OnePunchMan"), "One Punch Man");
    /// assert_eq!(TextNormalizer::split_camel_case("NASA rocket"), "NASA rocket");
    /// assert_eq!(TextNormalizer::split_camel_case("iPhone"), "i Phone");
    /// ```
    #[must_use]
    pub fn split_camel_case(text: &str) -> String {
        let mut out = String::with_capacity(text.len() + 8);
        let mut prev_lower = false;
        for c in text.chars() {
            if prev_lower && c.is_uppercase() {
                out.push(' ');
            }
            out.push(c);
            prev_lower = c.is_lowercase();
        }
        out
    }
}
