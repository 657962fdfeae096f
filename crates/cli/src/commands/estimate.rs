//! `nightjar estimate`: print the token estimate of a text.

use nightjar_agent::estimate_tokens;

pub fn run(text: &str) {
    println!("{}", estimate_tokens(text));
}
