//! Query expansion from casual vocabulary to academic terminology.
//!
//! Matching is plain case-insensitive substring containment against the raw
//! query. Expanded terms are never fed back into the tables.

use std::collections::HashSet;

type Table = &'static [(&'static str, &'static [&'static str])];

/// Casual term -> academic terms.
static CASUAL_TERMS: Table = &[
    ("ai", &["artificial intelligence", "machine learning", "deep learning", "neural network"]),
    ("robot", &["robotics", "autonomous", "control system", "manipulation"]),
    ("picture", &["image", "computer vision", "visual", "photo"]),
    ("video", &["video processing", "temporal", "sequence", "motion"]),
    ("language", &["natural language processing", "NLP", "text", "linguistic", "language model"]),
    ("chat", &["chatbot", "conversational", "dialogue", "language model", "LLM"]),
    ("gpt", &["language model", "transformer", "LLM", "generative", "GPT"]),
    ("llm", &["large language model", "language model", "transformer", "GPT"]),
    ("face", &["facial recognition", "face detection", "biometric", "portrait"]),
    ("object", &["object detection", "instance segmentation", "recognition"]),
    ("self driving", &["autonomous vehicle", "self-driving", "autonomous driving", "vehicle control"]),
    ("car", &["vehicle", "autonomous driving", "automotive"]),
    ("learn", &["learning", "training", "optimization", "gradient"]),
    ("train", &["training", "learning", "optimization", "supervised"]),
    ("predict", &["prediction", "forecasting", "regression", "inference"]),
    ("classify", &["classification", "categorization", "recognition"]),
    ("data", &["dataset", "data mining", "data analysis", "training data"]),
    ("big data", &["large-scale", "distributed", "scalable", "big data"]),
    ("database", &["data management", "storage", "query", "index"]),
    ("hack", &["security", "vulnerability", "exploit", "cybersecurity", "attack"]),
    ("secure", &["security", "cryptography", "authentication", "privacy"]),
    ("crypto", &["cryptography", "encryption", "blockchain", "security"]),
    ("web", &["web application", "internet", "HTTP", "browser"]),
    ("internet", &["network", "web", "online", "distributed"]),
    ("cloud", &["cloud computing", "distributed", "scalable", "serverless"]),
    ("faster", &["efficient", "optimization", "speed", "performance"]),
    ("better", &["improved", "enhanced", "optimized", "superior"]),
    ("new", &["novel", "recent", "emerging", "state-of-art"]),
    ("best", &["optimal", "superior", "state-of-art", "benchmark"]),
    ("medical", &["healthcare", "clinical", "diagnosis", "medical imaging", "biomedical"]),
    ("health", &["healthcare", "medical", "clinical", "wellness"]),
    ("money", &["financial", "economic", "market", "trading"]),
    ("game", &["gaming", "game theory", "reinforcement learning", "strategy"]),
    ("music", &["audio", "sound", "acoustic", "music generation"]),
    ("art", &["generative art", "creative", "style transfer", "GAN"]),
    ("transformer", &["attention", "BERT", "GPT", "self-attention", "encoder-decoder"]),
    ("bert", &["language model", "transformer", "pre-training", "bidirectional"]),
    ("gan", &["generative adversarial", "generator", "discriminator", "synthesis"]),
    ("cnn", &["convolutional", "convnet", "image processing", "feature extraction"]),
    ("rnn", &["recurrent", "LSTM", "GRU", "sequence", "temporal"]),
    ("lstm", &["recurrent", "long short-term memory", "sequence modeling"]),
    ("research", &["study", "investigation", "analysis", "experiment"]),
    ("survey", &["review", "overview", "systematic review", "literature"]),
    ("tutorial", &["introduction", "guide", "primer", "overview"]),
    ("benchmark", &["evaluation", "comparison", "performance", "dataset"]),
];

/// Academic term -> related terms.
static ACADEMIC_TERMS: Table = &[
    ("neural network", &["deep learning", "backpropagation", "activation"]),
    ("machine learning", &["supervised", "unsupervised", "reinforcement"]),
    ("deep learning", &["neural network", "CNN", "RNN", "transformer"]),
    ("reinforcement learning", &["Q-learning", "policy", "reward", "agent"]),
    ("computer vision", &["image processing", "object detection", "segmentation"]),
    ("natural language processing", &["NLP", "text mining", "language model"]),
    ("optimization", &["gradient descent", "convergence", "loss function"]),
];

static POPULAR_SEARCHES: &[&str] = &[
    "transformer neural networks",
    "deep learning computer vision",
    "reinforcement learning agents",
    "natural language processing",
    "generative adversarial networks",
    "object detection real-time",
    "medical image analysis",
    "autonomous driving perception",
    "graph neural networks",
    "federated learning privacy",
    "explainable AI interpretability",
    "zero-shot learning",
    "few-shot learning meta-learning",
    "self-supervised learning",
    "multimodal learning vision language",
];

pub const MAX_SUGGESTIONS: usize = 5;
const TERMS_PER_SUGGESTION: usize = 3;

fn matching(table: Table, lowered: &str) -> impl Iterator<Item = &'static [&'static str]> + '_ {
    table.iter().filter(move |(key, _)| lowered.contains(*key)).map(|(_, terms)| *terms)
}

/// Expand a raw query into the set of strings to search for.
///
/// The raw query always comes first; mapped terms follow in table order with
/// duplicates removed.
pub fn expand(raw: &str) -> Vec<String> {
    let lowered = raw.to_lowercase();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = vec![raw.to_string()];
    seen.insert(raw);
    let mapped = matching(CASUAL_TERMS, &lowered).chain(matching(ACADEMIC_TERMS, &lowered));
    for terms in mapped {
        for term in terms.iter().copied() {
            if seen.insert(term) {
                out.push(term.to_string());
            }
        }
    }
    out
}

/// Suggest refined queries for a partial query, at most [`MAX_SUGGESTIONS`].
pub fn suggest(partial: &str) -> Vec<String> {
    let lowered = partial.to_lowercase();
    matching(CASUAL_TERMS, &lowered)
        .flat_map(|terms| terms.iter().take(TERMS_PER_SUGGESTION))
        .map(|term| format!("{partial} {term}"))
        .take(MAX_SUGGESTIONS)
        .collect()
}

pub fn popular_searches() -> &'static [&'static str] {
    POPULAR_SEARCHES
}
