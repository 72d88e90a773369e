use papersearch_core::tokenizer::tokenize;

#[test]
fn it_handles_empty_input() {
    assert!(tokenize("").is_empty());
    assert!(tokenize("   \t\n").is_empty());
}

#[test]
fn it_lowercases_and_drops_short_tokens() {
    let words = tokenize("Deep Q-Learning in an RL setting");
    assert_eq!(words, vec!["deep", "q-learning", "setting"]);
}

#[test]
fn it_treats_punctuation_as_separator() {
    let words = tokenize("encoder/decoder (seq2seq): self_attention.");
    assert_eq!(words, vec!["encoder", "decoder", "seq2seq", "self_attention"]);
}

#[test]
fn it_counts_characters_not_bytes() {
    // "été" is three characters but six bytes.
    assert_eq!(tokenize("été à"), vec!["été"]);
}

#[test]
fn it_is_idempotent_on_tokenized_input() {
    let first = tokenize("Attention Is All You Need: Transformer architecture!");
    let second = tokenize(&first.join(" "));
    assert_eq!(first, second);
}
