//! FIFO frontier
//!
//! Breadth-first queue of URLs waiting to be processed. Membership is not
//! deduplicated here; the crawl loop checks the visited set on push and again
//! on pop.

use std::collections::VecDeque;
use url::Url;

#[derive(Debug, Clone, Default)]
pub struct Frontier {
    queue: VecDeque<Url>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A frontier holding only `seed`
    pub fn with_seed(seed: Url) -> Self {
        let mut frontier = Self::new();
        frontier.push(seed);
        frontier
    }

    pub fn push(&mut self, url: Url) {
        self.queue.push_back(url);
    }

    /// Removes the oldest URL
    pub fn pop(&mut self) -> Option<Url> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Url> {
        self.queue.iter()
    }
}
