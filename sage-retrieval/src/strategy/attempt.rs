//! Bounded retry bookkeeping for selection loops.

/// Tracks one selection stage: a fixed try budget and the errors collected
/// so far. Callers drive the loop with [`Attempt::next`] and replay the
/// errors into the next prompt via [`Attempt::notice`].
#[derive(Debug)]
pub struct Attempt {
    budget: usize,
    used: usize,
    errors: Vec<String>,
}

impl Attempt {
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            used: 0,
            errors: Vec::new(),
        }
    }

    /// Consume one try. False once the budget is spent.
    pub fn next(&mut self) -> bool {
        if self.used < self.budget {
            self.used += 1;
            true
        } else {
            false
        }
    }

    pub fn record(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.errors.last().map(String::as_str)
    }

    /// All recorded errors as a prompt block, empty when the stage is clean.
    pub fn notice(&self) -> String {
        if self.errors.is_empty() {
            String::new()
        } else {
            format!("\n请注意:\n{}", self.errors.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_bounds_the_loop() {
        let mut attempt = Attempt::new(3);
        let mut rounds = 0;
        while attempt.next() {
            rounds += 1;
        }
        assert_eq!(rounds, 3);
        assert!(!attempt.next());
    }

    #[test]
    fn notice_lists_errors_in_order() {
        let mut attempt = Attempt::new(5);
        assert_eq!(attempt.notice(), "");
        attempt.record("不存在表[db.x];");
        attempt.record("JSON解析失败: eof");
        assert_eq!(
            attempt.notice(),
            "\n请注意:\n不存在表[db.x];\nJSON解析失败: eof"
        );
        assert_eq!(attempt.last_error(), Some("JSON解析失败: eof"));
    }
}
