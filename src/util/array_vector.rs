//! Fixed-capacity array with an explicit logical length.
//!
//! Mirrors the hardware limits of the fixed-function pipeline: storage for
//! `N` slots always exists, but only the first `len` are logically present.

use std::fmt;
use std::ops::{Deref, DerefMut};

use super::{Error, Result};

/// Array of `N` slots of which the first `len()` are active.
#[derive(Clone, Copy)]
pub struct ArrayVector<T, const N: usize> {
    items: [T; N],
    len: usize,
}

impl<T: Default, const N: usize> ArrayVector<T, N> {
    /// Empty vector with default-filled backing storage.
    pub fn new() -> Self {
        Self {
            items: std::array::from_fn(|_| T::default()),
            len: 0,
        }
    }

    /// Build from a slice, failing if it exceeds the capacity.
    pub fn from_slice(values: &[T]) -> Result<Self>
    where
        T: Clone,
    {
        let mut out = Self::new();
        for v in values {
            out.push(v.clone())?;
        }
        Ok(out)
    }

    /// Deactivate the last slot and reset it to its default.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(std::mem::take(&mut self.items[self.len]))
    }

    /// Deactivate every slot.
    pub fn clear(&mut self) {
        while self.pop().is_some() {}
    }
}

impl<T, const N: usize> ArrayVector<T, N> {
    /// Maximum number of active slots.
    pub const CAPACITY: usize = N;

    /// Activate the next slot.
    pub fn push(&mut self, value: T) -> Result<()> {
        if self.len == N {
            return Err(Error::invalid(format!("array capacity {N} exceeded")));
        }
        self.items[self.len] = value;
        self.len += 1;
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == N
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.items[..self.len]
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items[..self.len]
    }
}

impl<T: Default, const N: usize> Default for ArrayVector<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Deref for ArrayVector<T, N> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, const N: usize> DerefMut for ArrayVector<T, N> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

/// Inactive slots never take part in comparisons.
impl<T: PartialEq, const N: usize> PartialEq for ArrayVector<T, N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: fmt::Debug, const N: usize> fmt::Debug for ArrayVector<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<'a, T, const N: usize> IntoIterator for &'a ArrayVector<T, N> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_until_full() {
        let mut v: ArrayVector<u8, 2> = ArrayVector::new();
        assert!(v.is_empty());
        v.push(1).unwrap();
        v.push(2).unwrap();
        assert!(v.is_full());
        assert!(v.push(3).is_err());
        assert_eq!(v.as_slice(), &[1, 2]);
    }

    #[test]
    fn test_inactive_slots_ignored_by_eq() {
        let mut a: ArrayVector<u32, 4> = ArrayVector::new();
        let mut b: ArrayVector<u32, 4> = ArrayVector::new();
        a.push(7).unwrap();
        a.push(9).unwrap();
        a.pop();
        b.push(7).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn test_deref_iter() {
        let v: ArrayVector<i32, 8> = ArrayVector::from_slice(&[3, 4, 5]).unwrap();
        assert_eq!(v.iter().sum::<i32>(), 12);
        assert_eq!(v[1], 4);
        assert!(ArrayVector::<i32, 2>::from_slice(&[1, 2, 3]).is_err());
    }
}
