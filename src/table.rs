use crate::utils::MyHash;

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    next: usize,
}

impl<T> Entry<T> {
    /// Create a new cell with the given value.
    fn new(value: T) -> Self {
        Self { value, next: 0 }
    }
}

/// Append-only hash-consing table.
///
/// Values are stored once; [`put`][Table::put] returns the index of an
/// existing equal value instead of adding a duplicate.
/// Index 0 is never handed out, so it can serve as a "none" marker.
#[derive(Debug, Clone)]
pub struct Table<T> {
    /// `data[i]` holds the value with index `i + 1`.
    data: Vec<Entry<T>>,

    buckets: Vec<usize>,
    bitmask: u64,
}

impl<T> Table<T> {
    /// Create a new table with `2^bits` buckets.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 24, "Bucket bits should be in the range 0..=24");

        let buckets_size = 1 << bits;
        Self {
            data: Vec::with_capacity(buckets_size),
            buckets: vec![0; buckets_size],
            bitmask: (buckets_size - 1) as u64,
        }
    }

    /// Get the number of stored values.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Get the reference to the value at the given index.
    pub fn value(&self, index: usize) -> &T {
        assert_ne!(index, 0, "Index is 0");
        match self.data.get(index - 1) {
            Some(entry) => &entry.value,
            None => panic!("Index {} is out of bounds (size = {})", index, self.size()),
        }
    }

    /// Get the index of the next cell in the same bucket.
    fn next(&self, index: usize) -> usize {
        self.data[index - 1].next
    }

    /// Set the index of the next cell in the same bucket.
    fn set_next(&mut self, index: usize, next: usize) {
        self.data[index - 1].next = next;
    }

    /// Add a new value to the table and return its index.
    fn add(&mut self, value: T) -> usize {
        self.data.push(Entry::new(value));
        self.data.len()
    }
}

impl<T> Table<T>
where
    T: MyHash,
{
    fn bucket_index(&self, value: &T) -> usize {
        (value.hash() & self.bitmask) as usize
    }

    /// Put a new value into the table and return its index.
    pub fn put(&mut self, value: T) -> usize
    where
        T: Eq,
    {
        let bucket_index = self.bucket_index(&value);
        let mut index = self.buckets[bucket_index];

        if index == 0 {
            // Create new value and put it into the bucket.
            let i = self.add(value);
            self.buckets[bucket_index] = i;
            return i;
        }

        loop {
            assert!(index > 0);

            if &value == self.value(index) {
                // The value already exists.
                return index;
            }

            let next = self.next(index);

            if next == 0 {
                // Create new value and append it to the bucket.
                let i = self.add(value);
                self.set_next(index, i);
                return i;
            } else {
                // Go to the next value in the bucket.
                index = next;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    struct Item(i32);

    impl MyHash for Item {
        fn hash(&self) -> u64 {
            self.0.unsigned_abs() as u64
        }
    }

    #[test]
    fn test_put_dedup() {
        let mut table = Table::new(2);
        let index1 = table.put(Item(5));
        let index2 = table.put(Item(5));
        assert_eq!(index1, 1);
        assert_eq!(index1, index2);
        assert_eq!(table.size(), 1);
    }

    #[test]
    fn test_put_collision() {
        let mut table = Table::new(2);
        let index1 = table.put(Item(5));
        let index2 = table.put(Item(-5));
        assert_ne!(index1, index2);
        assert_eq!(table.value(index1), &Item(5));
        assert_eq!(table.value(index2), &Item(-5));
        assert_eq!(table.next(index1), index2);
        assert_eq!(table.put(Item(-5)), index2);
    }

    #[test]
    fn test_single_bucket_chain() {
        let mut table = Table::new(0);
        let index1 = table.put(Item(1));
        let index2 = table.put(Item(2));
        let index3 = table.put(Item(3));
        assert_eq!(table.next(index1), index2);
        assert_eq!(table.next(index2), index3);
        assert_eq!(table.put(Item(2)), index2);
        assert_eq!(table.size(), 3);
    }

    #[test]
    #[should_panic(expected = "Index is 0")]
    fn test_zero_index() {
        let table = Table::<Item>::new(2);
        table.value(0);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_out_of_bounds() {
        let mut table = Table::new(2);
        table.put(Item(1));
        table.value(2);
    }
}
