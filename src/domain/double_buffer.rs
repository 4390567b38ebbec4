/// Two buffers playing the "current" and "next" roles.
///
/// Roles are swapped by toggling an index; the data is never copied.
#[derive(Clone, Debug)]
pub struct DoubleBuffer<T> {
    slots: [T; 2],
    current: usize,
}

impl<T> DoubleBuffer<T> {
    pub fn new(current: T, next: T) -> Self {
        Self { slots: [current, next], current: 0 }
    }

    pub fn current(&self) -> &T {
        &self.slots[self.current]
    }

    pub fn current_mut(&mut self) -> &mut T {
        &mut self.slots[self.current]
    }

    pub fn next(&self) -> &T {
        &self.slots[1 - self.current]
    }

    /// Read access to the current buffer alongside write access to the next.
    pub fn split_mut(&mut self) -> (&T, &mut T) {
        let [a, b] = &mut self.slots;
        if self.current == 0 { (a, b) } else { (b, a) }
    }

    /// Both buffers, for operations that must keep them in lockstep.
    pub fn both_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut()
    }

    /// Make "next" the new "current".
    pub fn swap(&mut self) {
        self.current = 1 - self.current;
    }
}
