/// Fixed-capacity entity storage. Slot indices are stable for an entity's
/// lifetime and the capacity is part of the type.
#[derive(Debug, Clone, PartialEq)]
pub struct Slots<T, const N: usize> {
    slots: [Option<T>; N],
}

impl<T, const N: usize> Default for Slots<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Slots<T, N> {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Places `value` in the first free slot, handing it back when full.
    pub fn insert(&mut self, value: T) -> Result<usize, T> {
        match self.slots.iter().position(Option::is_none) {
            Some(index) => {
                self.slots[index] = Some(value);
                Ok(index)
            }
            None => Err(value),
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<T> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    /// Every slot in index order, empty ones included.
    pub fn slots(&self) -> &[Option<T>; N] {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut [Option<T>; N] {
        &mut self.slots
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|value| (index, value)))
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&mut T) -> bool) {
        for slot in &mut self.slots {
            if slot.as_mut().is_some_and(|value| !keep(value)) {
                *slot = None;
            }
        }
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_fills_the_first_hole() {
        let mut slots = Slots::<char, 3>::new();
        assert_eq!(slots.insert('a'), Ok(0));
        assert_eq!(slots.insert('b'), Ok(1));
        assert_eq!(slots.insert('c'), Ok(2));
        assert_eq!(slots.insert('d'), Err('d'));
        assert!(slots.is_full());

        assert_eq!(slots.remove(1), Some('b'));
        assert_eq!(slots.insert('e'), Ok(1));
        assert_eq!(slots.capacity(), 3);
    }

    #[test]
    fn iter_skips_empty_slots() {
        let mut slots = Slots::<u8, 4>::new();
        slots.insert(10).unwrap();
        slots.insert(20).unwrap();
        slots.insert(30).unwrap();
        slots.remove(0);

        let occupied: Vec<_> = slots.iter().collect();
        assert_eq!(occupied, vec![(1, &20), (2, &30)]);
        assert_eq!(slots.len(), 2);
    }

    #[test]
    fn retain_frees_rejected_slots() {
        let mut slots = Slots::<u8, 4>::new();
        for ttl in [3, 0, 2, 0] {
            slots.insert(ttl).unwrap();
        }
        slots.retain(|ttl| *ttl > 0);
        assert_eq!(slots.slots(), &[Some(3), None, Some(2), None]);

        slots.clear();
        assert!(slots.is_empty());
    }

    #[test]
    fn out_of_range_access_is_none() {
        let mut slots: Slots<u8, 2> = Slots::new();
        assert_eq!(slots.get(5), None);
        assert_eq!(slots.remove(5), None);
        assert!(slots.get_mut(5).is_none());
    }
}
