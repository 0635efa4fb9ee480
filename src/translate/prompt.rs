use crate::translate::translator::BatchRequest;

/// Instructions sent ahead of every batch.
fn build_system_prompt(language: &str, locale: &str) -> String {
    format!(
        r#"You are a professional software localizer. Translate user interface strings from English to {language} ({locale}).

## Translation Rules

### DO NOT translate:
- Interpolation placeholders such as {{name}}, {{{{count}}}}, %s and %d
- ICU plural and select syntax keywords (plural, select, one, other)
- HTML or JSX tags and their attributes
- URLs, email addresses and file names
- Brand names, product names and currency codes
- Acronyms (API, URL, KYC, NFT, etc.)

### DO translate:
- Button labels, headings, messages and descriptions
- Text between tags, keeping the tags in place

### Formatting:
- Preserve leading and trailing whitespace and punctuation
- Preserve line breaks
- Keep roughly the same length; UI space is limited

### Tone:
- Use the conventions of modern software interfaces in {language}
- If a term has no good translation, keep the English term

## Output

Respond with a JSON array of strings only: one translation per input string, in the same order and with the same length as the input array. No comments, no explanations."#
    )
}

/// Full prompt written to the translator's stdin for one batch.
pub fn build_batch_prompt(request: &BatchRequest) -> String {
    // Serializing a slice of strings cannot fail
    let input = serde_json::to_string_pretty(&request.texts).unwrap_or_default();
    let mut prompt = build_system_prompt(&request.language, &request.locale);
    if !request.context.is_empty() {
        prompt.push_str("\n\nThese strings come from keys such as: ");
        prompt.push_str(&request.context);
    }
    prompt.push_str(&format!(
        "\n\nTranslate these {} strings:\n\n{}\n",
        request.texts.len(),
        input
    ));
    prompt
}
