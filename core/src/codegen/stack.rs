/// Compile-time operand stack.
///
/// Mirrors the bytecode's runtime stack while a chunk is lowered, holding the
/// backend values that are not yet consumed. Every removal is checked: running
/// out of operands returns `None` so the caller can report the offending
/// instruction.
///
/// # Examples
///
/// ```ignore
/// let mut stack = OperandStack::new();
/// stack.push(1);
/// stack.push(2);
/// assert_eq!(stack.pop_n::<2>(), Some([1, 2]));
/// assert_eq!(stack.pop_n::<1>(), None);
/// ```
#[derive(Debug, Clone)]
pub struct OperandStack<T> {
    items: Vec<T>,
    /// Deepest the stack has been.
    max_depth: usize,
}

impl<T: Copy> OperandStack<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            max_depth: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, value: T) {
        self.items.push(value);
        self.max_depth = self.max_depth.max(self.items.len());
    }

    /// Removes the top `N` values, returned bottom-first.
    ///
    /// For `[..., a, b]`, `pop_n::<2>()` yields `[a, b]`. The stack is left
    /// unchanged when it holds fewer than `N` values.
    pub fn pop_n<const N: usize>(&mut self) -> Option<[T; N]> {
        let start = self.items.len().checked_sub(N)?;
        let popped = <[T; N]>::try_from(&self.items[start..]).ok()?;
        self.items.truncate(start);
        Some(popped)
    }

    /// Pushes a copy of the top value.
    pub fn dup(&mut self) -> Option<()> {
        let top = *self.items.last()?;
        self.push(top);
        Some(())
    }

    /// Moves the value `n - 1` slots below the top up to the top.
    ///
    /// `rotate(2)` swaps the top two; `rotate(3)` turns `[a, b, c]` into `[b, c, a]`.
    pub fn rotate(&mut self, n: usize) -> Option<()> {
        let start = self.items.len().checked_sub(n)?;
        self.items[start..].rotate_left(1);
        Some(())
    }

    #[inline]
    pub fn peek(&self) -> Option<&T> {
        self.items.last()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Remaining values, bottom-first.
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: Copy> Default for OperandStack<T> {
    fn default() -> Self {
        Self::new()
    }
}
