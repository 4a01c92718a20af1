#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Editable, targeting the current snippet.
    Practicing,
    /// Read-only view of an already reached snippet.
    Reviewing(usize),
}

/// Which snippet is being practiced and which, if any, is being reviewed.
///
/// Invariants: `current < len` for the store this navigator indexes, and
/// `viewed <= current` whenever set. Rejected transitions return `false` and
/// leave both indices untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Navigator {
    current: usize,
    viewed: Option<usize>,
}

impl Navigator {
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn viewed(&self) -> Option<usize> {
        self.viewed
    }

    pub fn mode(&self) -> Mode {
        match self.viewed {
            Some(i) => Mode::Reviewing(i),
            None => Mode::Practicing,
        }
    }

    /// Index of the snippet the editor targets in the current mode.
    pub fn active(&self) -> usize {
        self.viewed.unwrap_or(self.current)
    }

    pub fn is_at_start(&self) -> bool {
        self.current == 0
    }

    pub fn is_at_end(&self, len: usize) -> bool {
        self.current + 1 >= len
    }

    pub fn select_history(&mut self, index: usize) -> bool {
        if index > self.current {
            return false;
        }
        self.viewed = Some(index);
        true
    }

    pub fn return_to_practice(&mut self) -> bool {
        self.viewed.take().is_some()
    }

    pub fn advance(&mut self, len: usize) -> bool {
        if self.viewed.is_some() || self.is_at_end(len) {
            return false;
        }
        self.current += 1;
        true
    }

    pub fn retreat(&mut self) -> bool {
        if self.viewed.is_some() || self.is_at_start() {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Jump to a freshly appended snippet, leaving review mode.
    pub fn jump_to_last(&mut self, len: usize) {
        self.current = len.saturating_sub(1);
        self.viewed = None;
    }
}
