//! Text animators: typewriter reveal and score count-up.
//!
//! Both are keyed by their input. Setting the same input again is a no-op;
//! setting a different one restarts the animation from zero.

/// Reveals `text` one character every `per_char_ms`.
pub struct TypingEffect {
    text: String,
    per_char_ms: u64,
    elapsed: u64,
}

impl TypingEffect {
    pub fn new(per_char_ms: u64) -> Self {
        TypingEffect { text: String::new(), per_char_ms: per_char_ms.max(1), elapsed: 0 }
    }

    /// Point the effect at `text`; restarts only if the text changed.
    pub fn set(&mut self, text: &str) {
        if self.text != text {
            self.text = text.to_string();
            self.elapsed = 0;
        }
    }

    fn shown_chars(&self) -> usize {
        ((self.elapsed / self.per_char_ms) as usize).min(self.text.chars().count())
    }

    /// Advance the clock. Returns how many non-space characters appeared,
    /// so the caller can tick a typing sound.
    pub fn advance(&mut self, dt: u64) -> usize {
        let before = self.shown_chars();
        self.elapsed = self.elapsed.saturating_add(dt);
        let after = self.shown_chars();
        self.text
            .chars()
            .skip(before)
            .take(after - before)
            .filter(|c| !c.is_whitespace())
            .count()
    }

    pub fn visible(&self) -> &str {
        let n = self.shown_chars();
        match self.text.char_indices().nth(n) {
            Some((byte, _)) => &self.text[..byte],
            None => &self.text,
        }
    }

    #[cfg(test)]
    pub fn is_done(&self) -> bool {
        self.shown_chars() == self.text.chars().count()
    }
}

/// 1 - 2^(-10t), pinned to exactly 1 at t = 1.
pub fn ease_out_expo(t: f32) -> f32 {
    if t >= 1.0 {
        1.0
    } else {
        1.0 - 2f32.powf(-10.0 * t)
    }
}

/// Counts from 0 up to `target` over `duration_ms` with ease-out-expo.
pub struct CountUp {
    target: u32,
    duration_ms: u64,
    elapsed: u64,
}

impl CountUp {
    pub fn new(duration_ms: u64) -> Self {
        CountUp { target: 0, duration_ms, elapsed: 0 }
    }

    pub fn set_target(&mut self, target: u32) {
        if self.target != target {
            self.target = target;
            self.elapsed = 0;
        }
    }

    pub fn advance(&mut self, dt: u64) {
        self.elapsed = self.elapsed.saturating_add(dt).min(self.duration_ms);
    }

    pub fn value(&self) -> u32 {
        if self.duration_ms == 0 || self.elapsed >= self.duration_ms {
            return self.target;
        }
        let t = self.elapsed as f32 / self.duration_ms as f32;
        (ease_out_expo(t) * self.target as f32).floor() as u32
    }
}
