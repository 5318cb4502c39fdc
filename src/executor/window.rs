//! Offset/limit window over an ordered result

/// Skip `offset` results, then keep at most `limit` (0 keeps all)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    pub offset: usize,
    pub limit: usize,
}

impl Window {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// The whole result
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.offset == 0 && self.limit == 0
    }

    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        if self.is_unbounded() {
            return items;
        }
        let take = if self.limit == 0 { usize::MAX } else { self.limit };
        items.into_iter().skip(self.offset).take(take).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window() {
        let items: Vec<u64> = (1..=10).collect();
        assert_eq!(Window::new(1, 2).apply(items.clone()), vec![2, 3]);
        assert_eq!(Window::new(8, 0).apply(items.clone()), vec![9, 10]);
        assert!(Window::new(20, 5).apply(items.clone()).is_empty());
        assert_eq!(Window::all().apply(items.clone()), items);
    }
}
