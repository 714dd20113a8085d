pub mod crossword;
pub mod matching;
pub mod profile;
pub mod progress;
pub mod random;
pub mod timer;
pub mod trivia;
