use rand::seq::SliceRandom;

const THINKING_MESSAGES: &[&str] = &[
    "Reading the ranking code",
    "Following the candidate pipeline",
    "Scoring heavy rankers",
    "Tracing the home mixer",
    "Counting likes and retweets",
    "Searching the repository",
    "Consulting the feature store",
    "Unrolling the timeline",
];

pub fn get_random_thinking_message() -> &'static str {
    THINKING_MESSAGES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Thinking")
}
